//! Water property model trait and the steam-table implementation.

use crate::error::{WaterError, WaterResult};
use crate::saturation::{self, SaturationProps};
use crate::{P_MAX_PSIA, P_MIN_PSIA, T_MAX_F, T_MIN_F, liquid};
use pw_core::units::{Density, Pressure, Temperature, degf, lbm_per_ft3, psia, to_degf, to_psia};

/// Trait for water property models.
///
/// Implementations must be thread-safe (Send + Sync). Hot-path methods take
/// US customary `f64` values and clamp into the valid range so that a solver
/// probing slightly outside it still gets a finite answer.
pub trait WaterProperties: Send + Sync {
    /// Model name (for logging).
    fn name(&self) -> &str;

    /// Saturation temperature [°F] at pressure [psia].
    fn sat_temperature(&self, p_psia: f64) -> f64;

    /// Saturation pressure [psia] at temperature [°F].
    fn sat_pressure(&self, t_f: f64) -> f64;

    /// Saturation pack at pressure [psia].
    fn sat_at_pressure(&self, p_psia: f64) -> SaturationProps;

    /// Saturation pack at temperature [°F].
    fn sat_at_temperature(&self, t_f: f64) -> SaturationProps;

    /// Liquid density [lb/ft³] at temperature [°F] and pressure [psia].
    fn liquid_density(&self, t_f: f64, p_psia: f64) -> f64;

    /// Liquid specific internal energy [BTU/lb] at temperature [°F].
    fn liquid_internal_energy(&self, t_f: f64) -> f64;

    /// Liquid du/dT [BTU/lb·°F].
    fn liquid_specific_heat(&self, t_f: f64) -> f64;

    /// Liquid temperature [°F] from specific internal energy [BTU/lb].
    fn liquid_temperature(&self, u_btu_per_lb: f64, guess_f: f64) -> f64;

    /// Checked saturation temperature.
    fn saturation_temperature(&self, p: Pressure) -> WaterResult<Temperature> {
        let p_psia = check_pressure(to_psia(p))?;
        Ok(degf(self.sat_temperature(p_psia)))
    }

    /// Checked saturation pressure.
    fn saturation_pressure(&self, t: Temperature) -> WaterResult<Pressure> {
        let t_f = check_temperature(to_degf(t))?;
        Ok(psia(self.sat_pressure(t_f)))
    }

    /// Checked compressed-liquid density.
    fn density(&self, t: Temperature, p: Pressure) -> WaterResult<Density> {
        let t_f = check_temperature(to_degf(t))?;
        let p_psia = check_pressure(to_psia(p))?;
        let rho = self.liquid_density(t_f, p_psia);
        if rho.is_finite() && rho > 0.0 {
            Ok(lbm_per_ft3(rho))
        } else {
            Err(WaterError::OutOfRange {
                what: "liquid density",
                value: rho,
            })
        }
    }

    /// Checked temperature from internal energy.
    fn temperature_from_energy(&self, u_btu_per_lb: f64) -> WaterResult<Temperature> {
        if !u_btu_per_lb.is_finite() {
            return Err(WaterError::NonFinite {
                what: "internal energy",
            });
        }
        let lo = self.liquid_internal_energy(T_MIN_F);
        let hi = self.liquid_internal_energy(T_MAX_F);
        if u_btu_per_lb < lo || u_btu_per_lb > hi {
            return Err(WaterError::OutOfRange {
                what: "internal energy",
                value: u_btu_per_lb,
            });
        }
        let inv = liquid::temperature_from_energy(u_btu_per_lb, 200.0);
        if inv.converged {
            Ok(degf(inv.t_f))
        } else {
            Err(WaterError::ConvergenceFailed {
                what: "temperature from internal energy",
            })
        }
    }
}

fn check_temperature(t_f: f64) -> WaterResult<f64> {
    if !t_f.is_finite() {
        return Err(WaterError::NonFinite {
            what: "temperature",
        });
    }
    if !(T_MIN_F..=T_MAX_F).contains(&t_f) {
        return Err(WaterError::OutOfRange {
            what: "temperature",
            value: t_f,
        });
    }
    Ok(t_f)
}

fn check_pressure(p_psia: f64) -> WaterResult<f64> {
    if !p_psia.is_finite() {
        return Err(WaterError::NonFinite { what: "pressure" });
    }
    if !(P_MIN_PSIA..=P_MAX_PSIA).contains(&p_psia) {
        return Err(WaterError::OutOfRange {
            what: "pressure",
            value: p_psia,
        });
    }
    Ok(p_psia)
}

#[inline]
fn clamp_t(t_f: f64) -> f64 {
    if t_f.is_nan() {
        T_MIN_F
    } else {
        t_f.clamp(T_MIN_F, T_MAX_F)
    }
}

#[inline]
fn clamp_p(p_psia: f64) -> f64 {
    if p_psia.is_nan() {
        P_MIN_PSIA
    } else {
        p_psia.clamp(P_MIN_PSIA, P_MAX_PSIA)
    }
}

/// Correlation-based light water properties.
#[derive(Clone, Copy, Debug, Default)]
pub struct SteamTables;

impl SteamTables {
    pub fn new() -> Self {
        Self
    }
}

impl WaterProperties for SteamTables {
    fn name(&self) -> &str {
        "IF97 region 4 + IAPWS auxiliary"
    }

    fn sat_temperature(&self, p_psia: f64) -> f64 {
        saturation::tsat_f(clamp_p(p_psia))
    }

    fn sat_pressure(&self, t_f: f64) -> f64 {
        saturation::psat_psia(clamp_t(t_f))
    }

    fn sat_at_pressure(&self, p_psia: f64) -> SaturationProps {
        saturation::at_pressure(clamp_p(p_psia))
    }

    fn sat_at_temperature(&self, t_f: f64) -> SaturationProps {
        saturation::at_temperature(clamp_t(t_f))
    }

    fn liquid_density(&self, t_f: f64, p_psia: f64) -> f64 {
        liquid::density(clamp_t(t_f), clamp_p(p_psia))
    }

    fn liquid_internal_energy(&self, t_f: f64) -> f64 {
        liquid::internal_energy(clamp_t(t_f))
    }

    fn liquid_specific_heat(&self, t_f: f64) -> f64 {
        liquid::specific_heat(clamp_t(t_f))
    }

    fn liquid_temperature(&self, u_btu_per_lb: f64, guess_f: f64) -> f64 {
        liquid::temperature_from_energy(u_btu_per_lb, guess_f).t_f
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pw_core::units::to_lbm_per_ft3;

    #[test]
    fn hot_path_clamps_instead_of_failing() {
        let w = SteamTables::new();
        let t = w.sat_temperature(5_000.0);
        assert!(t.is_finite());
        assert!((t - w.sat_temperature(P_MAX_PSIA)).abs() < 1e-12);
        assert!(w.liquid_density(f64::NAN, 100.0).is_finite());
    }

    #[test]
    fn checked_api_reports_range() {
        let w = SteamTables::new();
        assert!(matches!(
            w.saturation_temperature(psia(5_000.0)),
            Err(WaterError::OutOfRange { what: "pressure", .. })
        ));
        assert!(matches!(
            w.saturation_pressure(degf(f64::NAN)),
            Err(WaterError::NonFinite { .. })
        ));
    }

    #[test]
    fn checked_density_in_si_round_trips() {
        let w = SteamTables::new();
        let rho = w.density(degf(100.0), psia(14.7)).unwrap();
        assert!((to_lbm_per_ft3(rho) - 61.99).abs() < 0.05);
    }

    #[test]
    fn checked_inverse() {
        let w = SteamTables::new();
        let u = w.liquid_internal_energy(300.0);
        let t = w.temperature_from_energy(u).unwrap();
        assert!((to_degf(t) - 300.0).abs() < 1e-6);
        assert!(w.temperature_from_energy(5_000.0).is_err());
    }

    #[test]
    fn trait_object_usable() {
        let w: Box<dyn WaterProperties> = Box::new(SteamTables::new());
        assert!(w.name().contains("IF97"));
        assert!(w.liquid_specific_heat(200.0) > 0.9);
    }
}
