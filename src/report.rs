//! Solution extraction and fragmentation reporting.
//!
//! Reads the bound assignment back into group- and teacher-indexed
//! timetables, recounts windows from the extracted entries independently of
//! the solver objective, and renders the textual report. The recount must
//! match the objective; a mismatch is a modeling defect and is surfaced as
//! an error.

use crate::builder::ScheduleModel;
use crate::data::{DaySchedule, RoomSpec, ScheduledEntry, SessionRequirement, Timetable};
use crate::error::SolveError;
use crate::model::Assignment;
use itertools::{Itertools, MinMaxResult};
use log::info;
use std::fmt::Write as _;

/// Everything a solved run hands to its consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSchedule {
    pub groups: Timetable,
    pub teachers: Timetable,
    pub total_windows: u32,
    pub report: String,
}

/// Rebuilds both timetables from the assignment and cross-checks the
/// window count. Pure with respect to its inputs: extracting the same
/// solved model twice yields identical structures.
pub fn extract_schedule(
    schedule: &ScheduleModel,
    requirements: &[SessionRequirement],
    rooms: &[RoomSpec],
    days: &[String],
    assignment: &Assignment,
) -> Result<ExtractedSchedule, SolveError> {
    let grid = schedule.grid;
    let num_days = grid.days as usize;
    let positions = grid.slots_per_day as usize;

    let mut group_entries: Vec<Vec<Vec<ScheduledEntry>>> =
        vec![vec![Vec::new(); num_days]; schedule.groups.len()];
    let mut teacher_entries: Vec<Vec<Vec<ScheduledEntry>>> =
        vec![vec![Vec::new(); num_days]; schedule.teachers.len()];

    for instance in &schedule.instances {
        let req = &requirements[instance.requirement];
        let slot = assignment.value(instance.slot) as u32;
        let room = &rooms[assignment.value(instance.room) as usize];
        let day = grid.day_of(slot) as usize;
        let position = grid.position_of(slot);

        let g = schedule.groups.index_of(&req.group).ok_or_else(|| {
            SolveError::Solver(format!("group '{}' missing from the model arena", req.group))
        })?;
        let t = schedule.teachers.index_of(&req.teacher).ok_or_else(|| {
            SolveError::Solver(format!(
                "teacher '{}' missing from the model arena",
                req.teacher
            ))
        })?;

        group_entries[g][day].push(ScheduledEntry {
            position,
            subject: req.subject.clone(),
            counterpart: req.teacher.clone(),
            room: room.name.clone(),
        });
        teacher_entries[t][day].push(ScheduledEntry {
            position,
            subject: req.subject.clone(),
            counterpart: req.group.clone(),
            room: room.name.clone(),
        });
    }
    for day_lists in group_entries.iter_mut().chain(teacher_entries.iter_mut()) {
        for entries in day_lists.iter_mut() {
            entries.sort_by_key(|entry| entry.position);
        }
    }

    // independent window recount over groups and window-tracked teachers
    let mut report = String::from("--- Fragmentation report ---\n");
    let mut total_windows = 0u32;
    for (g, day_lists) in group_entries.iter().enumerate() {
        total_windows += recount_entity(
            &mut report,
            "Group",
            schedule.groups.name(g),
            day_lists,
            days,
            positions,
        );
    }
    for (t, day_lists) in teacher_entries
        .iter()
        .enumerate()
        .take(schedule.tracked_teachers)
    {
        total_windows += recount_entity(
            &mut report,
            "Teacher",
            schedule.teachers.name(t),
            day_lists,
            days,
            positions,
        );
    }

    let objective = assignment.objective_value(&schedule.model);
    if i64::from(total_windows) != objective {
        return Err(SolveError::Inconsistency {
            objective,
            recount: i64::from(total_windows),
        });
    }
    info!(
        "Extracted schedule for {} groups and {} teachers; {} window(s) confirmed",
        schedule.groups.len(),
        schedule.tracked_teachers,
        total_windows
    );

    let _ = writeln!(report, "\nTotal windows (solver objective): {}", objective);
    let _ = writeln!(report, "Total windows (recounted from schedule): {}", total_windows);
    if total_windows == 0 {
        report.push_str("\nThe timetable contains no windows between sessions.\n");
    } else {
        let _ = writeln!(
            report,
            "\n{} window(s) remain and cannot be avoided under the given hard constraints.",
            total_windows
        );
    }

    Ok(ExtractedSchedule {
        groups: to_timetable(&group_entries, schedule.groups.names(), days),
        teachers: to_timetable(&teacher_entries, schedule.teachers.names(), days),
        total_windows,
        report,
    })
}

/// Recounts one entity's windows day by day and appends its report lines.
/// Returns the entity's window total.
fn recount_entity(
    report: &mut String,
    label: &str,
    name: &str,
    day_lists: &[Vec<ScheduledEntry>],
    days: &[String],
    positions: usize,
) -> u32 {
    let mut total = 0u32;
    for (day, entries) in day_lists.iter().enumerate() {
        if entries.is_empty() {
            let _ = writeln!(report, "{} {}, {}: no classes.", label, name, days[day]);
            continue;
        }
        let mut occupied = vec![false; positions];
        for entry in entries {
            occupied[entry.position as usize] = true;
        }
        let windows = count_windows(&occupied);
        total += windows;
        let _ = writeln!(
            report,
            "{} {}, {}: {} window(s). Occupancy: {}",
            label,
            name,
            days[day],
            windows,
            occupancy_string(&occupied)
        );
    }
    total
}

/// Windows on one day: free positions strictly between the first and last
/// occupied ones. Zero or one occupied position means zero windows.
pub fn count_windows(occupied: &[bool]) -> u32 {
    let (first, last) = match occupied.iter().positions(|&o| o).minmax() {
        MinMaxResult::NoElements | MinMaxResult::OneElement(_) => return 0,
        MinMaxResult::MinMax(first, last) => (first, last),
    };
    occupied[first + 1..last].iter().filter(|&&o| !o).count() as u32
}

fn occupancy_string(occupied: &[bool]) -> String {
    occupied.iter().map(|&o| if o { 'X' } else { 'O' }).collect()
}

fn to_timetable(
    entries: &[Vec<Vec<ScheduledEntry>>],
    names: &[String],
    days: &[String],
) -> Timetable {
    names
        .iter()
        .zip(entries)
        .map(|(name, day_lists)| {
            let schedule = days
                .iter()
                .zip(day_lists)
                .map(|(day, entries)| DaySchedule {
                    day: day.clone(),
                    entries: entries.clone(),
                })
                .collect();
            (name.clone(), schedule)
        })
        .collect()
}

/// Advisory text for the infeasible outcome. Plausible root causes only;
/// no root-cause analysis is attempted.
pub fn infeasibility_diagnostic() -> String {
    "No feasible timetable exists for the given input.\n\
     Possible causes:\n\
     - a group is overloaded (too many sessions per week)\n\
     - rooms are insufficient in number or of the wrong type\n\
     - one teacher is committed to too many groups\n\
     - every group meets at the same time and rooms run out\n\
     Review the groups, teachers, subjects and rooms inputs.\n"
        .to_string()
}
