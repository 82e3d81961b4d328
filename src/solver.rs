//! Solver adapter.
//!
//! The core hands a [`ConstraintModel`] to a [`SolverBackend`] and blocks
//! for one of three outcomes. [`HighsBackend`] lowers the model to a 0/1
//! ILP for the HiGHS solver behind `good_lp`: every integer variable
//! becomes a row of value indicators with an exactly-one constraint, and
//! the higher-level constraints become linear rows over those indicators.

use crate::data::SearchStrategy;
use crate::error::SolveError;
use crate::model::{Assignment, Constraint, ConstraintModel, IntVar};
use good_lp::variable;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    default_solver,
};
use log::{info, trace};
use std::time::Instant;

/// Terminal statuses of one solve call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverOutcome {
    /// Objective value proven minimal.
    Optimal(Assignment),
    /// Valid assignment, optimality not proven (backends running under a
    /// time or iteration budget).
    Feasible(Assignment),
    /// No assignment satisfies the hard constraints.
    Infeasible,
}

/// Narrow boundary to the external search engine: submit a model and a
/// search strategy, receive a terminal status with bound values. Swapping
/// the engine must not touch the model builder or the reporter.
pub trait SolverBackend {
    fn solve(
        &self,
        model: &ConstraintModel,
        strategy: SearchStrategy,
    ) -> Result<SolverOutcome, SolveError>;
}

/// HiGHS ILP backend. Always single-threaded; HiGHS solves MIPs to proven
/// optimality, so successful runs report [`SolverOutcome::Optimal`].
pub struct HighsBackend;

impl SolverBackend for HighsBackend {
    fn solve(
        &self,
        model: &ConstraintModel,
        strategy: SearchStrategy,
    ) -> Result<SolverOutcome, SolveError> {
        let start_time = Instant::now();
        let mut problem = ProblemVariables::new();

        // one indicator per (integer variable, domain value)
        let indicators: Vec<Vec<Variable>> = (0..model.int_count())
            .map(|i| {
                let (lo, hi) = model.domain(IntVar::from_index(i));
                problem.add_vector(variable().binary(), (hi - lo + 1) as usize)
            })
            .collect();
        let bools: Vec<Variable> = (0..model.bool_count())
            .map(|_| problem.add(variable().binary()))
            .collect();
        trace!(
            "Lowered {} integer and {} boolean variables to {} binaries",
            model.int_count(),
            model.bool_count(),
            indicators.iter().map(Vec::len).sum::<usize>() + bools.len()
        );

        let indicator_of = |var: IntVar, value: i64| -> Option<Variable> {
            let (lo, hi) = model.domain(var);
            if value < lo || value > hi {
                return None;
            }
            Some(indicators[var.index()][(value - lo) as usize])
        };
        let value_expr = |var: IntVar| -> Expression {
            let (lo, _) = model.domain(var);
            indicators[var.index()]
                .iter()
                .enumerate()
                .map(|(offset, v)| (lo + offset as i64) as f64 * Expression::from(*v))
                .sum()
        };

        let objective: Expression = model
            .objective_terms()
            .iter()
            .map(|term| bools[term.index()])
            .sum();

        let mut ilp = problem
            .minimise(objective)
            .using(default_solver)
            .set_option("threads", 1); // single-threaded for reproducibility
        if strategy == SearchStrategy::Random {
            ilp = ilp.set_option("random_seed", 42);
        }

        // every integer variable takes exactly one value
        for row in &indicators {
            let chosen: Expression = row.iter().map(|v| Expression::from(*v)).sum();
            ilp.add_constraint(constraint!(chosen == 1));
        }

        for c in model.constraints() {
            match c {
                Constraint::AllDifferent(vars) => {
                    let (lo, hi) = vars.iter().fold((i64::MAX, i64::MIN), |(lo, hi), v| {
                        let (l, h) = model.domain(*v);
                        (lo.min(l), hi.max(h))
                    });
                    for value in lo..=hi {
                        let at_value: Vec<Variable> = vars
                            .iter()
                            .filter_map(|v| indicator_of(*v, value))
                            .collect();
                        if at_value.len() > 1 {
                            let used: Expression =
                                at_value.iter().map(|v| Expression::from(*v)).sum();
                            ilp.add_constraint(constraint!(used <= 1));
                        }
                    }
                }
                Constraint::LinearEq { terms, constant } => {
                    let lhs: Expression = terms
                        .iter()
                        .map(|(coef, var)| *coef as f64 * value_expr(*var))
                        .sum();
                    ilp.add_constraint(constraint!(lhs == *constant as f64));
                }
                Constraint::Exclude { var, value } => {
                    if let Some(ind) = indicator_of(*var, *value) {
                        ilp.add_constraint(constraint!(ind == 0));
                    }
                }
                Constraint::ExistsValue { result, any_of } => {
                    let result = bools[result.index()];
                    let candidates: Vec<Variable> = any_of
                        .iter()
                        .filter_map(|(var, value)| indicator_of(*var, *value))
                        .collect();
                    if candidates.is_empty() {
                        ilp.add_constraint(constraint!(result == 0));
                    } else {
                        for ind in &candidates {
                            ilp.add_constraint(constraint!(result >= *ind));
                        }
                        let any: Expression =
                            candidates.iter().map(|v| Expression::from(*v)).sum();
                        ilp.add_constraint(constraint!(result <= any));
                    }
                }
                Constraint::AnyOf { result, of } => {
                    let result = bools[result.index()];
                    if of.is_empty() {
                        ilp.add_constraint(constraint!(result == 0));
                    } else {
                        for term in of {
                            ilp.add_constraint(constraint!(result >= bools[term.index()]));
                        }
                        let any: Expression =
                            of.iter().map(|b| Expression::from(bools[b.index()])).sum();
                        ilp.add_constraint(constraint!(result <= any));
                    }
                }
                Constraint::Conjunction {
                    result,
                    all_of,
                    none_of,
                } => {
                    let result = bools[result.index()];
                    let mut satisfied = Expression::default();
                    for term in all_of {
                        let term = bools[term.index()];
                        ilp.add_constraint(constraint!(result <= term));
                        satisfied += Expression::from(term);
                    }
                    for term in none_of {
                        let term = bools[term.index()];
                        ilp.add_constraint(constraint!(result + term <= 1));
                        satisfied = satisfied + 1.0 - Expression::from(term);
                    }
                    let literal_count = (all_of.len() + none_of.len()) as f64;
                    // result >= satisfied - (k - 1): true once every literal holds
                    let threshold = satisfied + (1.0 - literal_count);
                    ilp.add_constraint(constraint!(result >= threshold));
                }
                Constraint::AtMostSum { terms, bound } => {
                    let total: Expression =
                        terms.iter().map(|b| Expression::from(bools[b.index()])).sum();
                    ilp.add_constraint(constraint!(total <= *bound as f64));
                }
            }
        }

        info!("Starting ILP solve ({:?} strategy)...", strategy);
        let solution = match ilp.solve() {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => {
                info!("Solver proved the model infeasible in {:.2?}", start_time.elapsed());
                return Ok(SolverOutcome::Infeasible);
            }
            Err(other) => return Err(SolveError::Solver(other.to_string())),
        };
        info!("Solution found in {:.2?}", start_time.elapsed());

        let mut ints = Vec::with_capacity(model.int_count());
        for (i, row) in indicators.iter().enumerate() {
            let (lo, _) = model.domain(IntVar::from_index(i));
            let chosen = row
                .iter()
                .position(|v| solution.value(*v) > 0.5)
                .ok_or_else(|| {
                    SolveError::Solver(format!("integer variable {i} left unbound by the solver"))
                })?;
            ints.push(lo + chosen as i64);
        }
        let bound_bools = bools.iter().map(|v| solution.value(*v) > 0.5).collect();

        Ok(SolverOutcome::Optimal(Assignment::new(ints, bound_bools)))
    }
}
