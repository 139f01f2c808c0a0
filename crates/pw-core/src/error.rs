//! Error shared by the plant crates at their lowest layer.
//!
//! Domain crates keep their own enums and fold into [`PwError`] when a
//! failure has to cross into code that only knows about the core.

use thiserror::Error;

pub type PwResult<T> = Result<T, PwError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PwError {
    /// NaN or infinity reached a quantity that feeds the plant state.
    #[error("{what} is not a finite number ({value})")]
    NonFinite { what: &'static str, value: f64 },

    #[error("bad input: {what}")]
    InvalidArg { what: &'static str },

    /// Value outside the band the correlations or geometry accept.
    #[error("{what} = {value} lies outside [{min}, {max}]")]
    OutOfRange {
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A physical relation that must always hold was broken.
    #[error("plant relation broken: {what}")]
    Invariant { what: &'static str },
}
