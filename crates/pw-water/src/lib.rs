//! pw-water: light-water properties for the primary heat-up engine.
//!
//! Provides:
//! - Saturation line P(T) and T(P) (IAPWS-IF97 region 4)
//! - Saturated liquid/vapor specific volume, enthalpy and internal energy
//!   (IAPWS auxiliary equations for the saturation boundary)
//! - Compressed liquid density with an isothermal compressibility correction
//! - Liquid temperature from specific internal energy
//!
//! # Architecture
//!
//! The rest of the workspace talks to the `WaterProperties` trait. The hot
//! path (called many times per closure iteration) takes plain `f64` in US
//! customary units and clamps into the valid range; the checked API takes
//! `uom` quantities and reports range violations.
//!
//! ```
//! use pw_water::{SteamTables, WaterProperties};
//!
//! let water = SteamTables::new();
//! let sat = water.sat_at_pressure(365.0);
//! assert!((sat.t_f - 435.76).abs() < 0.1);
//! ```

pub mod error;
pub mod liquid;
pub mod model;
pub mod saturation;

pub use error::{WaterError, WaterResult};
pub use model::{SteamTables, WaterProperties};
pub use saturation::SaturationProps;

/// Lowest temperature the correlations are used at [°F].
pub const T_MIN_F: f64 = 32.0;
/// Highest temperature the correlations are used at [°F].
pub const T_MAX_F: f64 = 700.0;
/// Lowest pressure the correlations are used at [psia].
pub const P_MIN_PSIA: f64 = 0.09;
/// Highest pressure the correlations are used at [psia].
pub const P_MAX_PSIA: f64 = 3_000.0;
