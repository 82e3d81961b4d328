//! Window-minimization objective.
//!
//! A window is a free position strictly between two occupied positions of
//! the same entity on the same day. One routine builds the occupancy
//! indicators and window terms for any entity kind; groups and teachers
//! share it, feeding a single objective collector.

use crate::data::SlotGrid;
use crate::model::{Constraint, ConstraintModel, IntVar};
use log::debug;

/// Adds one window indicator per entity, day and position to the model's
/// minimized objective. `entity_slots` holds, per tracked entity, the slot
/// variables of every session instance belonging to it; an entity with no
/// instances gets indicators forced false and contributes nothing.
pub fn add_window_objective(
    model: &mut ConstraintModel,
    grid: SlotGrid,
    entity_slots: &[Vec<IntVar>],
) {
    let positions = grid.slots_per_day as usize;

    for slots in entity_slots {
        for day in 0..grid.days {
            let occupied: Vec<_> = (0..grid.slots_per_day)
                .map(|pos| {
                    let indicator = model.new_bool();
                    model.add(Constraint::ExistsValue {
                        result: indicator,
                        any_of: slots
                            .iter()
                            .map(|&slot| (slot, grid.slot_at(day, pos) as i64))
                            .collect(),
                    });
                    indicator
                })
                .collect();

            for pos in 0..positions {
                let has_earlier = model.new_bool();
                model.add(Constraint::AnyOf {
                    result: has_earlier,
                    of: occupied[..pos].to_vec(),
                });
                let has_later = model.new_bool();
                model.add(Constraint::AnyOf {
                    result: has_later,
                    of: occupied[pos + 1..].to_vec(),
                });

                // free, with occupied positions on both sides
                let window = model.new_bool();
                model.add(Constraint::Conjunction {
                    result: window,
                    all_of: vec![has_earlier, has_later],
                    none_of: vec![occupied[pos]],
                });
                model.minimize(window);
            }
        }
    }

    debug!(
        "Window objective now carries {} terms",
        model.objective_terms().len()
    );
}
