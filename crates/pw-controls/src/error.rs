use pw_core::PwError;
use thiserror::Error;

pub type ControlResult<T> = Result<T, ControlError>;

/// Rejected controller or actuator tuning.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    #[error("bad control tuning: {what}")]
    InvalidArg { what: &'static str },
}

impl From<ControlError> for PwError {
    fn from(e: ControlError) -> Self {
        let ControlError::InvalidArg { what } = e;
        PwError::InvalidArg { what }
    }
}
