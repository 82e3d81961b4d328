//! Weekly timetable construction as a constraint-optimization problem.
//!
//! Session requirements (group × subject × teacher × weekly hours) are
//! expanded into session instances, each owning a slot and a room decision
//! variable. Hard constraints rule out group/teacher/room clashes and
//! room-type mismatches; the objective minimizes "windows" (idle slots
//! sandwiched between occupied ones) for every group and every declared
//! teacher. The search itself runs behind [`solver::SolverBackend`];
//! [`solver::HighsBackend`] lowers the model to an ILP for HiGHS.

pub mod builder;
pub mod data;
pub mod error;
pub mod model;
pub mod report;
pub mod schedule;
pub mod server;
pub mod solver;
pub mod windows;
