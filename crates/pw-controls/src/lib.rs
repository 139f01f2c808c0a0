//! Control primitives for the plant collaborators.
//!
//! - PI controllers with anti-windup for CVCS flow and heater demand
//! - First-order rate-limited actuators (heater banks, spray valve)
//! - Sample clocks for lower-rate work such as telemetry publishing
//!
//! Controllers are value types updated functionally: `update` takes the old
//! state and returns the new one, so a tick can work on a copy and discard
//! it wholesale if the tick is rolled back.

pub mod actuator;
pub mod controller;
pub mod error;
pub mod sampled;

pub use actuator::{ActuatorState, FirstOrderActuator};
pub use controller::{Action, PIController, PIControllerState};
pub use error::{ControlError, ControlResult};
pub use sampled::{SampleClock, SampleConfig};
