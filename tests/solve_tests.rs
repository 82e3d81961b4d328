use std::collections::HashSet;

use timetable_solver::builder::build_model;
use timetable_solver::data::{
    expand_requirements, GroupSpec, RoomSpec, SearchStrategy, SlotGrid, SolveRequest,
    SolveResponse, SubjectDemand, SubjectSpec, TeacherSpec, Timetable, DEFAULT_DAYS,
};
use timetable_solver::error::SolveError;
use timetable_solver::report::extract_schedule;
use timetable_solver::schedule::solve_timetable;
use timetable_solver::solver::{HighsBackend, SolverBackend, SolverOutcome};
use timetable_solver::windows::add_window_objective;

fn group(name: &str, subjects: &[(&str, &str, u32)]) -> GroupSpec {
    GroupSpec {
        name: name.into(),
        subjects: subjects
            .iter()
            .map(|(subject, teacher, hours)| SubjectDemand {
                name: (*subject).into(),
                teacher: (*teacher).into(),
                hours: *hours,
            })
            .collect(),
    }
}

fn request(
    groups: Vec<GroupSpec>,
    teachers: &[&str],
    subjects: &[(&str, &str)],
    rooms: &[(&str, &str)],
    slots_per_day: u32,
    days: usize,
) -> SolveRequest {
    SolveRequest {
        groups,
        teachers: teachers
            .iter()
            .map(|name| TeacherSpec {
                name: (*name).into(),
            })
            .collect(),
        subjects: subjects
            .iter()
            .map(|(name, room_type)| SubjectSpec {
                name: (*name).into(),
                room_type: (*room_type).into(),
            })
            .collect(),
        rooms: rooms
            .iter()
            .map(|(name, room_type)| RoomSpec {
                name: (*name).into(),
                room_type: (*room_type).into(),
            })
            .collect(),
        slots_per_day,
        days: DEFAULT_DAYS[..days].iter().map(|d| d.to_string()).collect(),
        strategy: SearchStrategy::Default,
    }
}

/// All (day index, position) pairs of one entity, in timetable order.
fn occupied_slots(timetable: &Timetable, name: &str) -> Vec<(usize, u32)> {
    timetable[name]
        .iter()
        .enumerate()
        .flat_map(|(day, schedule)| schedule.entries.iter().map(move |e| (day, e.position)))
        .collect()
}

fn assert_no_entity_clash(timetable: &Timetable) {
    for name in timetable.keys() {
        let slots = occupied_slots(timetable, name);
        let distinct: HashSet<_> = slots.iter().collect();
        assert_eq!(
            distinct.len(),
            slots.len(),
            "entity '{name}' is double-booked: {slots:?}"
        );
    }
}

fn assert_no_room_clash(groups: &Timetable) {
    let mut seen = HashSet::new();
    for schedules in groups.values() {
        for (day, schedule) in schedules.iter().enumerate() {
            for entry in &schedule.entries {
                assert!(
                    seen.insert((day, entry.position, entry.room.clone())),
                    "room '{}' hosts two sessions at day {day} position {}",
                    entry.room,
                    entry.position
                );
            }
        }
    }
}

#[test]
fn packed_week_solves_with_zero_windows() {
    // scenario: one group, one subject twice a week, two matching rooms
    let req = request(
        vec![group("G1", &[("Math", "Petrov", 2)])],
        &["Petrov"],
        &[("Math", "lecture")],
        &[("R1", "lecture"), ("R2", "lecture")],
        5,
        5,
    );

    match solve_timetable(&req, &HighsBackend).unwrap() {
        SolveResponse::Solved {
            groups,
            teachers,
            total_windows,
            report,
        } => {
            assert_eq!(total_windows, 0);
            assert!(report.contains("no windows between sessions"));
            assert_eq!(occupied_slots(&groups, "G1").len(), 2);
            assert_eq!(occupied_slots(&teachers, "Petrov").len(), 2);
        }
        other => panic!("expected a solved timetable, got {other:?}"),
    }
}

#[test]
fn overcommitted_teacher_is_infeasible() {
    // two subjects, each consuming every slot of the week, same teacher
    let req = request(
        vec![group("G1", &[("Math", "Petrov", 4), ("Physics", "Petrov", 4)])],
        &["Petrov"],
        &[],
        &[("R1", ""), ("R2", "")],
        2,
        2,
    );

    match solve_timetable(&req, &HighsBackend).unwrap() {
        SolveResponse::Infeasible { diagnostic } => {
            assert!(diagnostic.contains("No feasible timetable"));
            assert!(diagnostic.contains("too many groups"));
        }
        other => panic!("expected infeasible, got {other:?}"),
    }
}

#[test]
fn unmatchable_room_type_is_infeasible() {
    let req = request(
        vec![group("G1", &[("Math", "Petrov", 1)])],
        &["Petrov"],
        &[("Math", "lecture")],
        &[("Lab", "lab")],
        2,
        1,
    );

    assert!(matches!(
        solve_timetable(&req, &HighsBackend).unwrap(),
        SolveResponse::Infeasible { .. }
    ));
}

#[test]
fn feasible_solutions_respect_all_hard_constraints() {
    // two groups sharing both teachers; chemistry is lab-bound
    let req = request(
        vec![
            group("G1", &[("Chem", "T1", 2), ("Lit", "T2", 2)]),
            group("G2", &[("Chem", "T1", 2), ("Lit", "T2", 2)]),
        ],
        &["T1", "T2"],
        &[("Chem", "lab")],
        &[("Lab", "lab"), ("Aud", "")],
        4,
        3,
    );

    match solve_timetable(&req, &HighsBackend).unwrap() {
        SolveResponse::Solved {
            groups, teachers, ..
        } => {
            assert_no_entity_clash(&groups);
            assert_no_entity_clash(&teachers);
            assert_no_room_clash(&groups);
            for schedules in groups.values() {
                for schedule in schedules {
                    for entry in &schedule.entries {
                        if entry.subject == "Chem" {
                            assert_eq!(entry.room, "Lab", "lab-bound subject left the lab");
                        }
                    }
                }
            }
        }
        other => panic!("expected a solved timetable, got {other:?}"),
    }
}

#[test]
fn generated_small_inputs_keep_invariants() {
    for group_count in [1usize, 2] {
        for hours in [1u32, 2] {
            for room_count in [1usize, 2] {
                let groups: Vec<GroupSpec> = (0..group_count)
                    .map(|g| group(&format!("G{g}"), &[("Math", "Shared", hours)]))
                    .collect();
                let rooms: Vec<(String, &str)> =
                    (0..room_count).map(|r| (format!("R{r}"), "")).collect();
                let rooms: Vec<(&str, &str)> =
                    rooms.iter().map(|(n, t)| (n.as_str(), *t)).collect();
                let req = request(groups, &["Shared"], &[], &rooms, 3, 2);

                match solve_timetable(&req, &HighsBackend).unwrap() {
                    SolveResponse::Solved {
                        groups, teachers, ..
                    } => {
                        assert_no_entity_clash(&groups);
                        assert_no_entity_clash(&teachers);
                        assert_no_room_clash(&groups);
                        assert_eq!(
                            occupied_slots(&teachers, "Shared").len(),
                            group_count * hours as usize
                        );
                    }
                    other => panic!(
                        "expected solved for {group_count} groups / {hours}h / {room_count} rooms, got {other:?}"
                    ),
                }
            }
        }
    }
}

#[test]
fn hours_filling_the_whole_week_are_accepted() {
    let req = request(
        vec![group("G1", &[("Math", "Petrov", 4)])],
        &["Petrov"],
        &[],
        &[("R1", "")],
        2,
        2,
    );

    match solve_timetable(&req, &HighsBackend).unwrap() {
        SolveResponse::Solved { total_windows, .. } => assert_eq!(total_windows, 0),
        other => panic!("expected a solved timetable, got {other:?}"),
    }
}

#[test]
fn hours_beyond_the_week_are_a_configuration_error() {
    let req = request(
        vec![group("G1", &[("Math", "Petrov", 5)])],
        &["Petrov"],
        &[],
        &[("R1", "")],
        2,
        2,
    );

    assert!(matches!(
        solve_timetable(&req, &HighsBackend),
        Err(SolveError::Configuration(_))
    ));
}

#[test]
fn zero_slots_or_rooms_never_reach_the_solver() {
    let mut req = request(
        vec![group("G1", &[("Math", "Petrov", 1)])],
        &["Petrov"],
        &[],
        &[("R1", "")],
        0,
        2,
    );
    assert!(matches!(
        solve_timetable(&req, &HighsBackend),
        Err(SolveError::Configuration(_))
    ));

    req.slots_per_day = 2;
    req.rooms.clear();
    assert!(matches!(
        solve_timetable(&req, &HighsBackend),
        Err(SolveError::Configuration(_))
    ));
}

#[test]
fn idle_declared_teacher_appears_with_no_classes() {
    let req = request(
        vec![group("G1", &[("Math", "Petrov", 1)])],
        &["Petrov", "Idle"],
        &[],
        &[("R1", "")],
        2,
        1,
    );

    match solve_timetable(&req, &HighsBackend).unwrap() {
        SolveResponse::Solved { report, .. } => {
            assert!(report.contains("Teacher Idle, Mon: no classes."));
        }
        other => panic!("expected a solved timetable, got {other:?}"),
    }
}

#[test]
fn undeclared_teacher_is_scheduled_but_not_window_tracked() {
    let req = request(
        vec![group("G1", &[("Math", "Ghost", 1)])],
        &[],
        &[],
        &[("R1", "")],
        2,
        1,
    );

    match solve_timetable(&req, &HighsBackend).unwrap() {
        SolveResponse::Solved {
            teachers, report, ..
        } => {
            assert!(teachers.contains_key("Ghost"));
            assert!(!report.contains("Teacher Ghost"));
        }
        other => panic!("expected a solved timetable, got {other:?}"),
    }
}

#[test]
fn extraction_is_idempotent_for_one_solved_model() {
    let req = request(
        vec![group("G1", &[("Math", "Petrov", 2), ("Lit", "Sydorov", 1)])],
        &["Petrov", "Sydorov"],
        &[],
        &[("R1", ""), ("R2", "")],
        3,
        2,
    );
    let grid = SlotGrid {
        slots_per_day: req.slots_per_day,
        days: req.days.len() as u32,
    };
    let requirements = expand_requirements(&req.groups, &req.subjects, grid).unwrap();
    let mut schedule = build_model(&requirements, &req.teachers, &req.rooms, grid).unwrap();
    add_window_objective(&mut schedule.model, grid, &schedule.slots_by_group);
    add_window_objective(
        &mut schedule.model,
        grid,
        &schedule.slots_by_teacher[..schedule.tracked_teachers],
    );

    let assignment = match HighsBackend
        .solve(&schedule.model, SearchStrategy::Default)
        .unwrap()
    {
        SolverOutcome::Optimal(assignment) => assignment,
        other => panic!("expected an optimal assignment, got {other:?}"),
    };

    let first =
        extract_schedule(&schedule, &requirements, &req.rooms, &req.days, &assignment).unwrap();
    let second =
        extract_schedule(&schedule, &requirements, &req.rooms, &req.days, &assignment).unwrap();
    assert_eq!(first, second);
}

#[test]
fn random_strategy_is_reproducible() {
    let mut req = request(
        vec![group("G1", &[("Math", "Petrov", 2)])],
        &["Petrov"],
        &[],
        &[("R1", "")],
        3,
        2,
    );
    req.strategy = SearchStrategy::Random;

    let first = solve_timetable(&req, &HighsBackend).unwrap();
    let second = solve_timetable(&req, &HighsBackend).unwrap();
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}
