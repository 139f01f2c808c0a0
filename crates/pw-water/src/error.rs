//! Water property errors.

use pw_core::PwError;
use thiserror::Error;

/// Result type for water property operations.
pub type WaterResult<T> = Result<T, WaterError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaterError {
    /// Non-finite input (NaN or infinity).
    #[error("Non-finite value for {what}")]
    NonFinite { what: &'static str },

    /// Input outside the correlation range.
    #[error("Value out of range for {what}: {value}")]
    OutOfRange { what: &'static str, value: f64 },

    /// Inverse lookup did not converge.
    #[error("Convergence failed for {what}")]
    ConvergenceFailed { what: &'static str },
}

impl From<WaterError> for PwError {
    fn from(err: WaterError) -> Self {
        match err {
            WaterError::NonFinite { what } => PwError::NonFinite {
                what,
                value: f64::NAN,
            },
            WaterError::OutOfRange { what, .. } => PwError::InvalidArg { what },
            WaterError::ConvergenceFailed { what } => PwError::Invariant { what },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WaterError::OutOfRange {
            what: "temperature",
            value: 900.0,
        };
        assert!(err.to_string().contains("temperature"));
        assert!(err.to_string().contains("900"));
    }

    #[test]
    fn error_to_pw_error() {
        let err: PwError = WaterError::ConvergenceFailed { what: "T(u)" }.into();
        assert!(matches!(err, PwError::Invariant { .. }));
    }
}
