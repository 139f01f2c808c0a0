//! pw-core: shared foundation for the primary heat-up engine.
//!
//! Contains:
//! - units (uom types + US customary constructors and conversions)
//! - numeric (Real + tolerances + compensated summation)
//! - error (shared error types)
//! - timing (opt-in tick phase timing)

pub mod error;
pub mod numeric;
pub mod timing;
pub mod units;

pub use error::{PwError, PwResult};
pub use numeric::*;
pub use units::*;
