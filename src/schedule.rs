//! One-shot solve pipeline: expand requirements, build the constraint
//! model, attach the window objective, hand the model to the backend and
//! extract the result. Each call builds an independent model from an
//! immutable input snapshot; nothing is shared between runs.

use crate::builder::build_model;
use crate::data::{expand_requirements, SlotGrid, SolveRequest, SolveResponse};
use crate::error::SolveError;
use crate::report::{extract_schedule, infeasibility_diagnostic};
use crate::solver::{SolverBackend, SolverOutcome};
use crate::windows::add_window_objective;
use log::{info, warn};

/// Runs the full pipeline. `Ok(Infeasible)` is a fully handled terminal
/// state; `Err` covers configuration problems, backend failures and the
/// window-count cross-check.
pub fn solve_timetable(
    request: &SolveRequest,
    backend: &impl SolverBackend,
) -> Result<SolveResponse, SolveError> {
    if request.slots_per_day == 0 {
        return Err(SolveError::Configuration(
            "slotsPerDay must be a positive integer".to_string(),
        ));
    }
    if request.days.is_empty() {
        return Err(SolveError::Configuration(
            "at least one day label is required".to_string(),
        ));
    }
    let grid = SlotGrid {
        slots_per_day: request.slots_per_day,
        days: request.days.len() as u32,
    };

    let requirements = expand_requirements(&request.groups, &request.subjects, grid)?;
    let mut schedule = build_model(&requirements, &request.teachers, &request.rooms, grid)?;

    add_window_objective(&mut schedule.model, grid, &schedule.slots_by_group);
    add_window_objective(
        &mut schedule.model,
        grid,
        &schedule.slots_by_teacher[..schedule.tracked_teachers],
    );

    let assignment = match backend.solve(&schedule.model, request.strategy)? {
        SolverOutcome::Optimal(assignment) => assignment,
        SolverOutcome::Feasible(assignment) => {
            info!("Accepting a feasible but not proven-optimal assignment");
            assignment
        }
        SolverOutcome::Infeasible => {
            warn!("No feasible timetable exists for this input");
            return Ok(SolveResponse::Infeasible {
                diagnostic: infeasibility_diagnostic(),
            });
        }
    };

    let extracted = extract_schedule(
        &schedule,
        &requirements,
        &request.rooms,
        &request.days,
        &assignment,
    )?;
    Ok(SolveResponse::Solved {
        groups: extracted.groups,
        teachers: extracted.teachers,
        total_windows: extracted.total_windows,
        report: extracted.report,
    })
}
