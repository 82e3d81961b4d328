//! Expands session requirements into a constraint model.
//!
//! Every session instance owns a `slot` and a `room` integer variable plus
//! one combined `slot * numRooms + room` key. The key is what the no-clash
//! and room-occupancy rules are phrased over: distinct keys per group,
//! per teacher and globally.

use crate::data::{RoomSpec, SessionRequirement, SlotGrid, TeacherSpec};
use crate::error::SolveError;
use crate::model::{BoolVar, Constraint, ConstraintModel, IntVar};
use itertools::Itertools;
use log::{debug, info};
use std::collections::HashMap;

/// One concrete weekly occurrence of a requirement. Its variables stay
/// unbound until the backend returns a feasible assignment.
#[derive(Debug, Clone, Copy)]
pub struct SessionInstance {
    /// Index into the requirement list this instance was expanded from.
    pub requirement: usize,
    pub slot: IntVar,
    pub room: IntVar,
}

/// Dense name → index arena so per-entity tables are plain vectors instead
/// of lazily grown name-keyed maps.
#[derive(Debug, Default)]
pub struct EntityArena {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl EntityArena {
    pub fn insert(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The assembled model plus the bookkeeping the objective builder and the
/// extractor need: instances, entity arenas and per-entity slot variables.
#[derive(Debug)]
pub struct ScheduleModel {
    pub model: ConstraintModel,
    pub grid: SlotGrid,
    pub instances: Vec<SessionInstance>,
    pub groups: EntityArena,
    /// Declared teachers first, then teachers only referenced by a
    /// requirement. Only the declared prefix is window-tracked.
    pub teachers: EntityArena,
    pub tracked_teachers: usize,
    pub slots_by_group: Vec<Vec<IntVar>>,
    pub slots_by_teacher: Vec<Vec<IntVar>>,
}

/// Builds the hard-constraint model. Fails with a configuration error
/// before any variable is created if the room list or the slot grid is
/// empty.
pub fn build_model(
    requirements: &[SessionRequirement],
    declared_teachers: &[TeacherSpec],
    rooms: &[RoomSpec],
    grid: SlotGrid,
) -> Result<ScheduleModel, SolveError> {
    if rooms.is_empty() {
        return Err(SolveError::Configuration(
            "at least one room is required".to_string(),
        ));
    }
    let total_slots = grid.total_slots();
    if total_slots == 0 {
        return Err(SolveError::Configuration(
            "the slot grid is empty (zero days or zero slots per day)".to_string(),
        ));
    }
    let num_rooms = rooms.len() as i64;

    let mut groups = EntityArena::default();
    let mut teachers = EntityArena::default();
    for teacher in declared_teachers {
        teachers.insert(&teacher.name);
    }
    let tracked_teachers = teachers.len();
    for req in requirements {
        groups.insert(&req.group);
        teachers.insert(&req.teacher);
    }

    // room indices each requirement must avoid; an empty subject tag
    // matches every room
    let forbidden_rooms: Vec<Vec<usize>> = requirements
        .iter()
        .map(|req| {
            if req.room_type.is_empty() {
                Vec::new()
            } else {
                rooms
                    .iter()
                    .positions(|room| room.room_type != req.room_type)
                    .collect()
            }
        })
        .collect();

    let session_count: u32 = requirements.iter().map(|req| req.hours).sum();
    info!(
        "Building model with {} session instances, {} groups, {} teachers, {} rooms, {} slots",
        session_count,
        groups.len(),
        teachers.len(),
        rooms.len(),
        total_slots
    );

    let mut model = ConstraintModel::new();
    let mut instances = Vec::with_capacity(session_count as usize);
    let mut slots_by_group: Vec<Vec<IntVar>> = vec![Vec::new(); groups.len()];
    let mut slots_by_teacher: Vec<Vec<IntVar>> = vec![Vec::new(); teachers.len()];
    let mut keys_by_group: Vec<Vec<IntVar>> = vec![Vec::new(); groups.len()];
    let mut keys_by_teacher: Vec<Vec<IntVar>> = vec![Vec::new(); teachers.len()];
    let mut all_keys: Vec<IntVar> = Vec::with_capacity(session_count as usize);
    // day membership indicators per group, for the per-day quota
    let mut day_members: Vec<Vec<Vec<BoolVar>>> =
        vec![vec![Vec::new(); grid.days as usize]; groups.len()];

    for (req_idx, req) in requirements.iter().enumerate() {
        // idempotent re-insert returns the index assigned above
        let g = groups.insert(&req.group);
        let t = teachers.insert(&req.teacher);

        for _ in 0..req.hours {
            let slot = model.new_int(0, total_slots as i64 - 1);
            let room = model.new_int(0, num_rooms - 1);

            // combined (slot, room) key; one variable shared by the
            // per-group, per-teacher and global distinctness rules
            let key = model.new_int(0, total_slots as i64 * num_rooms - 1);
            model.add(Constraint::LinearEq {
                terms: vec![(1, key), (-num_rooms, slot), (-1, room)],
                constant: 0,
            });

            // room-type compatibility as an unconditional exclusion
            for &room_idx in &forbidden_rooms[req_idx] {
                model.add(Constraint::Exclude {
                    var: room,
                    value: room_idx as i64,
                });
            }

            for day in 0..grid.days {
                let in_day = model.new_bool();
                model.add(Constraint::ExistsValue {
                    result: in_day,
                    any_of: (0..grid.slots_per_day)
                        .map(|pos| (slot, grid.slot_at(day, pos) as i64))
                        .collect(),
                });
                day_members[g][day as usize].push(in_day);
            }

            slots_by_group[g].push(slot);
            slots_by_teacher[t].push(slot);
            keys_by_group[g].push(key);
            keys_by_teacher[t].push(key);
            all_keys.push(key);
            instances.push(SessionInstance {
                requirement: req_idx,
                slot,
                room,
            });
        }
    }

    // no-clash: distinct (slot, room) keys per group and per teacher
    for keys in keys_by_group.iter().chain(keys_by_teacher.iter()) {
        if keys.len() > 1 {
            model.add(Constraint::AllDifferent(keys.clone()));
        }
    }

    // Raw slot distinctness per group/teacher. With single-occupancy rooms
    // this is implied by the key form above plus the global room-occupancy
    // rule; it is kept as the explicit statement of the no-clash invariant.
    for slots in slots_by_group.iter().chain(slots_by_teacher.iter()) {
        if slots.len() > 1 {
            model.add(Constraint::AllDifferent(slots.clone()));
        }
    }

    // room occupancy: no two instances anywhere share a (slot, room) pair
    if all_keys.len() > 1 {
        model.add(Constraint::AllDifferent(all_keys));
    }

    // Per-day quota per group. Implied by slot distinctness and the day
    // partition of the grid, asserted explicitly as well.
    for group_days in &day_members {
        for members in group_days {
            if !members.is_empty() {
                model.add(Constraint::AtMostSum {
                    terms: members.clone(),
                    bound: grid.slots_per_day as i64,
                });
            }
        }
    }

    debug!(
        "Model built: {} int vars, {} bool vars, {} constraints",
        model.int_count(),
        model.bool_count(),
        model.constraints().len()
    );

    Ok(ScheduleModel {
        model,
        grid,
        instances,
        groups,
        teachers,
        tracked_teachers,
        slots_by_group,
        slots_by_teacher,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(group: &str, subject: &str, teacher: &str, hours: u32, room_type: &str) -> SessionRequirement {
        SessionRequirement {
            group: group.into(),
            subject: subject.into(),
            teacher: teacher.into(),
            hours,
            room_type: room_type.into(),
        }
    }

    fn rooms(specs: &[(&str, &str)]) -> Vec<RoomSpec> {
        specs
            .iter()
            .map(|(name, room_type)| RoomSpec {
                name: (*name).into(),
                room_type: (*room_type).into(),
            })
            .collect()
    }

    #[test]
    fn instances_are_created_one_per_hour() {
        let grid = SlotGrid {
            slots_per_day: 5,
            days: 5,
        };
        let reqs = vec![req("G1", "Math", "Petrov", 3, ""), req("G1", "Physics", "Sydorov", 2, "")];
        let built = build_model(&reqs, &[], &rooms(&[("R1", "")]), grid).unwrap();

        assert_eq!(built.instances.len(), 5);
        assert_eq!(built.groups.len(), 1);
        assert_eq!(built.teachers.len(), 2);
        assert_eq!(built.tracked_teachers, 0);
        assert_eq!(built.slots_by_group[0].len(), 5);
        for instance in &built.instances {
            assert_eq!(built.model.domain(instance.slot), (0, 24));
            assert_eq!(built.model.domain(instance.room), (0, 0));
        }
    }

    #[test]
    fn declared_teachers_precede_referenced_ones() {
        let grid = SlotGrid {
            slots_per_day: 2,
            days: 2,
        };
        let declared = vec![TeacherSpec {
            name: "Petrov".into(),
        }];
        let reqs = vec![req("G1", "Math", "Undeclared", 1, "")];
        let built = build_model(&reqs, &declared, &rooms(&[("R1", "")]), grid).unwrap();

        assert_eq!(built.teachers.name(0), "Petrov");
        assert_eq!(built.teachers.name(1), "Undeclared");
        assert_eq!(built.tracked_teachers, 1);
    }

    #[test]
    fn zero_rooms_is_a_configuration_error() {
        let grid = SlotGrid {
            slots_per_day: 5,
            days: 5,
        };
        let err = build_model(&[req("G1", "Math", "Petrov", 1, "")], &[], &[], grid).unwrap_err();
        assert!(matches!(err, SolveError::Configuration(_)));
    }

    #[test]
    fn mismatched_rooms_are_excluded_unconditionally() {
        let grid = SlotGrid {
            slots_per_day: 2,
            days: 1,
        };
        let reqs = vec![req("G1", "Math", "Petrov", 1, "lecture")];
        let built = build_model(
            &reqs,
            &[],
            &rooms(&[("Lab", "lab"), ("Aud", "lecture")]),
            grid,
        )
        .unwrap();

        let excluded: Vec<i64> = built
            .model
            .constraints()
            .iter()
            .filter_map(|c| match c {
                Constraint::Exclude { value, .. } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(excluded, vec![0]);
    }
}
