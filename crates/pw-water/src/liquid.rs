//! Subcooled and compressed liquid.
//!
//! Density is the saturated-liquid density at T corrected by an isothermal
//! compressibility fitted to the steam tables between 32 and 700 °F; the
//! specific internal energy of compressed liquid is taken as the
//! saturated-liquid value at the same temperature.

use crate::saturation;
use crate::{T_MAX_F, T_MIN_F};

const KAPPA_BASE_PER_PSI: f64 = 3.0e-6;
const KAPPA_RISE_PER_PSI: f64 = 1.2e-5;
const KAPPA_SPAN_F: f64 = 540.0;
const DERIV_STEP_F: f64 = 0.01;
const MAX_INVERSE_ITERS: usize = 30;

/// Isothermal compressibility [1/psi].
pub fn kappa(t_f: f64) -> f64 {
    let x = (t_f - T_MIN_F).max(0.0) / KAPPA_SPAN_F;
    KAPPA_BASE_PER_PSI + KAPPA_RISE_PER_PSI * x.powi(4)
}

/// Liquid density [lb/ft³] at temperature [°F] and pressure [psia].
pub fn density(t_f: f64, p_psia: f64) -> f64 {
    let sat = saturation::at_temperature(t_f);
    sat.rho_f() * (1.0 + kappa(t_f) * (p_psia - sat.p_psia))
}

/// Liquid specific internal energy [BTU/lb].
pub fn internal_energy(t_f: f64) -> f64 {
    saturation::at_temperature(t_f).uf
}

/// du/dT of the liquid [BTU/lb·°F].
pub fn specific_heat(t_f: f64) -> f64 {
    let lo = (t_f - DERIV_STEP_F).max(T_MIN_F);
    let hi = (t_f + DERIV_STEP_F).min(T_MAX_F);
    (internal_energy(hi) - internal_energy(lo)) / (hi - lo)
}

/// Outcome of the temperature-from-energy inversion.
#[derive(Clone, Copy, Debug)]
pub struct Inversion {
    pub t_f: f64,
    pub converged: bool,
}

/// Temperature [°F] whose liquid internal energy equals `u` [BTU/lb].
///
/// Newton iteration from `guess`, clamped to the correlation range.
pub fn temperature_from_energy(u: f64, guess: f64) -> Inversion {
    let mut t = if guess.is_finite() {
        guess.clamp(T_MIN_F, T_MAX_F)
    } else {
        200.0
    };
    for _ in 0..MAX_INVERSE_ITERS {
        let f = internal_energy(t) - u;
        let slope = specific_heat(t);
        if !slope.is_finite() || slope <= 0.0 {
            return Inversion {
                t_f: t,
                converged: false,
            };
        }
        let step = -f / slope;
        let next = (t + step).clamp(T_MIN_F, T_MAX_F);
        let moved = (next - t).abs();
        t = next;
        if moved < 1e-9 {
            return Inversion {
                t_f: t,
                converged: true,
            };
        }
    }
    Inversion {
        t_f: t,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_water_density() {
        // 100 °F at one atmosphere is about 62.0 lb/ft³
        assert!((density(100.0, 14.7) - 61.99).abs() < 0.05);
    }

    #[test]
    fn hot_leg_density_at_full_pressure() {
        assert!((density(557.0, 2_250.0) - 46.2).abs() < 0.4);
    }

    #[test]
    fn compression_raises_density() {
        assert!(density(300.0, 1_000.0) > density(300.0, 100.0));
    }

    #[test]
    fn cold_water_internal_energy() {
        assert!((internal_energy(100.0) - 68.0).abs() < 0.2);
    }

    #[test]
    fn inversion_recovers_temperature() {
        for t in [60.0, 212.0, 435.0, 557.0, 650.0] {
            let u = internal_energy(t);
            let inv = temperature_from_energy(u, 150.0);
            assert!(inv.converged);
            assert!((inv.t_f - t).abs() < 1e-6, "t={t} got {}", inv.t_f);
        }
    }

    #[test]
    fn inversion_clamps_out_of_range_energy() {
        let inv = temperature_from_energy(-50.0, 100.0);
        assert_eq!(inv.t_f, T_MIN_F);
    }
}
