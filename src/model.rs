//! Solver-agnostic constraint model.
//!
//! The model builder and the window objective builder describe the problem
//! in terms of integer/boolean variables and a small constraint vocabulary;
//! a [`crate::solver::SolverBackend`] is responsible for translating it to
//! whatever engine it wraps. Nothing here knows about groups, teachers or
//! rooms.

/// Handle to an integer decision variable with an inclusive domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntVar(usize);

/// Handle to a 0/1 decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoolVar(usize);

impl IntVar {
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        IntVar(index)
    }
}

impl BoolVar {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum Constraint {
    /// The variables take pairwise distinct values.
    AllDifferent(Vec<IntVar>),
    /// `sum(coef * var) == constant`.
    LinearEq {
        terms: Vec<(i64, IntVar)>,
        constant: i64,
    },
    /// `var != value`, unconditionally.
    Exclude { var: IntVar, value: i64 },
    /// `result <=> exists (var, value) in any_of with var == value`.
    /// An empty candidate list forces `result` false.
    ExistsValue {
        result: BoolVar,
        any_of: Vec<(IntVar, i64)>,
    },
    /// `result <=> OR(of)`. An empty list forces `result` false.
    AnyOf { result: BoolVar, of: Vec<BoolVar> },
    /// `result <=> AND(all_of) AND AND(NOT none_of)`, fully reified in both
    /// directions.
    Conjunction {
        result: BoolVar,
        all_of: Vec<BoolVar>,
        none_of: Vec<BoolVar>,
    },
    /// `sum(terms) <= bound`.
    AtMostSum { terms: Vec<BoolVar>, bound: i64 },
}

/// A bag of variables, constraints and a minimize-sum-of-booleans
/// objective, built once per run and handed to the backend.
#[derive(Debug, Default)]
pub struct ConstraintModel {
    domains: Vec<(i64, i64)>,
    bool_count: usize,
    constraints: Vec<Constraint>,
    objective: Vec<BoolVar>,
}

impl ConstraintModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_int(&mut self, lo: i64, hi: i64) -> IntVar {
        debug_assert!(lo <= hi, "empty integer domain [{lo}, {hi}]");
        self.domains.push((lo, hi));
        IntVar(self.domains.len() - 1)
    }

    pub fn new_bool(&mut self) -> BoolVar {
        self.bool_count += 1;
        BoolVar(self.bool_count - 1)
    }

    pub fn add(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Adds `term` to the minimized objective sum.
    pub fn minimize(&mut self, term: BoolVar) {
        self.objective.push(term);
    }

    pub fn domain(&self, var: IntVar) -> (i64, i64) {
        self.domains[var.0]
    }

    pub fn int_count(&self) -> usize {
        self.domains.len()
    }

    pub fn bool_count(&self) -> usize {
        self.bool_count
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective_terms(&self) -> &[BoolVar] {
        &self.objective
    }
}

/// A complete variable binding returned by a backend for a feasible model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    ints: Vec<i64>,
    bools: Vec<bool>,
}

impl Assignment {
    pub fn new(ints: Vec<i64>, bools: Vec<bool>) -> Self {
        Self { ints, bools }
    }

    pub fn value(&self, var: IntVar) -> i64 {
        self.ints[var.0]
    }

    pub fn is_true(&self, var: BoolVar) -> bool {
        self.bools[var.0]
    }

    /// The objective value implied by this assignment.
    pub fn objective_value(&self, model: &ConstraintModel) -> i64 {
        model
            .objective_terms()
            .iter()
            .filter(|term| self.is_true(**term))
            .count() as i64
    }
}
