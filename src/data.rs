use crate::error::SolveError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Weekday labels used when a request does not supply its own.
pub const DEFAULT_DAYS: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];

/// One subject a group must attend: taught by `teacher`, `hours` sessions
/// per week.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubjectDemand {
    pub name: String,
    pub teacher: String,
    pub hours: u32,
}

/// A student group with its weekly subject demands.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupSpec {
    pub name: String,
    pub subjects: Vec<SubjectDemand>,
}

/// A teacher. Only the name matters to the core; declared teachers are the
/// ones whose schedule fragmentation is tracked by the objective.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeacherSpec {
    pub name: String,
}

/// A subject and the room type it needs. An absent or empty type matches
/// any room.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubjectSpec {
    pub name: String,
    #[serde(default, rename = "type")]
    pub room_type: String,
}

/// A room with its type tag.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoomSpec {
    pub name: String,
    #[serde(default, rename = "type")]
    pub room_type: String,
}

/// Search configuration forwarded to the solver backend. `Random` uses a
/// fixed seed so reruns stay reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    #[default]
    Default,
    Random,
}

/// The complete input for one timetable run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    pub groups: Vec<GroupSpec>,
    pub teachers: Vec<TeacherSpec>,
    pub subjects: Vec<SubjectSpec>,
    pub rooms: Vec<RoomSpec>,
    pub slots_per_day: u32,
    #[serde(default = "default_days")]
    pub days: Vec<String>,
    #[serde(default)]
    pub strategy: SearchStrategy,
}

fn default_days() -> Vec<String> {
    DEFAULT_DAYS.iter().map(|d| d.to_string()).collect()
}

/// The weekly slot grid. A slot is a single integer over the whole week and
/// decomposes into a day and a position within that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    pub slots_per_day: u32,
    pub days: u32,
}

impl SlotGrid {
    pub fn total_slots(&self) -> u32 {
        self.slots_per_day * self.days
    }

    pub fn day_of(&self, slot: u32) -> u32 {
        slot / self.slots_per_day
    }

    pub fn position_of(&self, slot: u32) -> u32 {
        slot % self.slots_per_day
    }

    pub fn slot_at(&self, day: u32, position: u32) -> u32 {
        day * self.slots_per_day + position
    }
}

/// One expanded requirement: `hours` session instances of `subject` for
/// `group`, taught by `teacher`, in a room tagged `room_type` (empty =
/// any room).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequirement {
    pub group: String,
    pub subject: String,
    pub teacher: String,
    pub hours: u32,
    pub room_type: String,
}

/// Expands group demands into session requirements, resolving each
/// subject's room type (subjects absent from the subject list fall back to
/// the wildcard type). A demand asking for more weekly hours than the grid
/// has slots is a configuration error, not a solver failure.
pub fn expand_requirements(
    groups: &[GroupSpec],
    subjects: &[SubjectSpec],
    grid: SlotGrid,
) -> Result<Vec<SessionRequirement>, SolveError> {
    let subject_types: HashMap<&str, &str> = subjects
        .iter()
        .map(|s| (s.name.as_str(), s.room_type.as_str()))
        .collect();
    let total_slots = grid.total_slots();

    let mut requirements = Vec::new();
    for group in groups {
        for demand in &group.subjects {
            if demand.hours > total_slots {
                return Err(SolveError::Configuration(format!(
                    "subject '{}' for group '{}' requires {} weekly sessions but the grid only has {} slots",
                    demand.name, group.name, demand.hours, total_slots
                )));
            }
            requirements.push(SessionRequirement {
                group: group.name.clone(),
                subject: demand.name.clone(),
                teacher: demand.teacher.clone(),
                hours: demand.hours,
                room_type: subject_types
                    .get(demand.name.as_str())
                    .copied()
                    .unwrap_or("")
                    .to_string(),
            });
        }
    }
    Ok(requirements)
}

/// One scheduled session as seen from one side of the timetable: the
/// counterpart is the teacher in a group's view and the group in a
/// teacher's view. Positions are zero-based within the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEntry {
    pub position: u32,
    pub subject: String,
    pub counterpart: String,
    pub room: String,
}

/// One day of an entity's schedule, entries ordered by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub day: String,
    pub entries: Vec<ScheduledEntry>,
}

/// Entity name → day-by-day schedule, one [`DaySchedule`] per configured
/// day in week order.
pub type Timetable = BTreeMap<String, Vec<DaySchedule>>;

/// Terminal outcome of a run. Infeasibility is a first-class result with
/// advisory remediation text, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum SolveResponse {
    Solved {
        groups: Timetable,
        teachers: Timetable,
        total_windows: u32,
        report: String,
    },
    Infeasible {
        diagnostic: String,
    },
}
