//! Crate-level error type.
//!
//! Only two conditions are errors: calling an operation in a state that
//! forbids it, and handing the treatment engine nothing to score. Everything
//! else that can go wrong mid-simulation (incomplete selection, starved
//! clue pools) is reported as data, not raised.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClinicError {
    /// The operation is not valid in the current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// The remedy batch contained no complete entries.
    #[error("remedy batch has no complete entries")]
    DataIncomplete,
}
