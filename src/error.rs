use std::error::Error;
use std::fmt;

/// Terminal failures of a solve run. A proven-infeasible model is *not* an
/// error; it is reported through [`crate::data::SolveResponse::Infeasible`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// Malformed or internally inconsistent input, detected before any
    /// decision variable is created. The message names the offending entity.
    Configuration(String),
    /// The backend failed for a reason other than proven infeasibility
    /// (e.g. an unbounded relaxation or an internal solver error).
    Solver(String),
    /// The window count recomputed from the extracted schedule disagrees
    /// with the objective value of the solver assignment. Indicates a
    /// modeling bug and must never be silently reconciled.
    Inconsistency { objective: i64, recount: i64 },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            SolveError::Solver(msg) => write!(f, "solver error: {}", msg),
            SolveError::Inconsistency { objective, recount } => write!(
                f,
                "internal inconsistency: solver objective reports {} windows but the extracted schedule contains {}",
                objective, recount
            ),
        }
    }
}

impl Error for SolveError {}
