//! Error types for plant construction and configuration.
//!
//! Physics anomalies during a tick are not errors: they are alarms
//! (see `alarms`) recorded in the event log and forensics.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error("Boundary flow rejected: {message}")]
    Ledger { message: String },

    #[error("Forensics storage error: {message}")]
    Forensics { message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

/// A boundary delta the ledger refused to apply.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum LedgerError {
    #[error("Non-finite {origin} delta")]
    NonFinite { origin: &'static str },

    #[error("{origin} delta of {delta_lb} lb has the wrong sign")]
    WrongSign { origin: &'static str, delta_lb: f64 },
}

/// A regime change that would leave the plant in an illegal mode.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("Invariant violation: {from} -> {to} rejected ({reason})")]
pub struct InvariantViolation {
    pub from: crate::regime::PlantMode,
    pub to: crate::regime::PlantMode,
    pub reason: &'static str,
}

impl From<pw_solver::SolverError> for SimError {
    fn from(e: pw_solver::SolverError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<pw_water::WaterError> for SimError {
    fn from(e: pw_water::WaterError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<pw_controls::ControlError> for SimError {
    fn from(e: pw_controls::ControlError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<pw_core::PwError> for SimError {
    fn from(e: pw_core::PwError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Forensics {
            message: e.to_string(),
        }
    }
}

impl From<LedgerError> for SimError {
    fn from(e: LedgerError) -> Self {
        SimError::Ledger {
            message: e.to_string(),
        }
    }
}
