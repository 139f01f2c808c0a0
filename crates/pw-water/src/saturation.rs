//! Saturation boundary.
//!
//! Pressure/temperature relation from IAPWS-IF97 region 4; saturated
//! densities and enthalpies from the IAPWS auxiliary equations (Wagner and
//! Pruss). Internally SI (K, MPa, kg/m³, kJ/kg); the public pack is in US
//! customary units.

use pw_core::units::constants::{
    KJ_PER_KG_TO_BTU_PER_LB, M3_PER_KG_TO_FT3_PER_LB, PSI_PA, PSIA_FT3_TO_BTU,
};
use pw_core::units::{degf, psia, to_degf, to_kelvin, to_mpa};
use uom::si::f64::ThermodynamicTemperature;
use uom::si::thermodynamic_temperature::kelvin;

const N: [f64; 10] = [
    0.116_705_214_527_67e4,
    -0.724_213_167_032_06e6,
    -0.170_738_469_400_92e2,
    0.120_208_247_024_70e5,
    -0.323_255_503_223_33e7,
    0.149_151_086_135_30e2,
    -0.482_326_573_615_91e4,
    0.405_113_405_420_57e6,
    -0.238_555_575_678_49,
    0.650_175_348_447_98e3,
];

const T_CRIT_K: f64 = 647.096;
const RHO_CRIT: f64 = 322.0;
const P_CRIT_MPA: f64 = 22.064;

const A: [f64; 6] = [
    -7.859_517_83,
    1.844_082_59,
    -11.786_649_7,
    22.680_741_1,
    -15.961_871_9,
    1.801_225_02,
];
const B: [f64; 6] = [
    1.992_740_64,
    1.099_653_42,
    -0.510_839_303,
    -1.754_934_79,
    -45.517_035_2,
    -6.746_944_50e5,
];
const C: [f64; 6] = [
    -2.031_502_40,
    -2.683_029_40,
    -5.386_264_92,
    -17.299_160_5,
    -44.758_658_1,
    -63.920_106_3,
];
const D: [f64; 5] = [
    -5.651_349_98e-8,
    2_690.666_31,
    127.287_297,
    -135.003_439,
    0.981_825_814,
];
const D_ALPHA: f64 = -1_135.905_627_715;

/// Properties on the saturation line at one pressure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SaturationProps {
    /// Saturation pressure [psia]
    pub p_psia: f64,
    /// Saturation temperature [°F]
    pub t_f: f64,
    /// Saturated liquid specific volume [ft³/lb]
    pub vf: f64,
    /// Saturated vapor specific volume [ft³/lb]
    pub vg: f64,
    /// Saturated liquid enthalpy [BTU/lb]
    pub hf: f64,
    /// Saturated vapor enthalpy [BTU/lb]
    pub hg: f64,
    /// Saturated liquid internal energy [BTU/lb]
    pub uf: f64,
    /// Saturated vapor internal energy [BTU/lb]
    pub ug: f64,
}

impl SaturationProps {
    pub fn hfg(&self) -> f64 {
        self.hg - self.hf
    }

    pub fn ufg(&self) -> f64 {
        self.ug - self.uf
    }

    pub fn vfg(&self) -> f64 {
        self.vg - self.vf
    }

    /// Saturated liquid density [lb/ft³]
    pub fn rho_f(&self) -> f64 {
        1.0 / self.vf
    }
}

/// Saturation pressure [MPa] at temperature [K].
pub fn psat_mpa(t_k: f64) -> f64 {
    let theta = t_k + N[8] / (t_k - N[9]);
    let a = theta * theta + N[0] * theta + N[1];
    let b = N[2] * theta * theta + N[3] * theta + N[4];
    let c = N[5] * theta * theta + N[6] * theta + N[7];
    (2.0 * c / (-b + (b * b - 4.0 * a * c).sqrt())).powi(4)
}

/// Saturation temperature [K] at pressure [MPa].
pub fn tsat_k(p_mpa: f64) -> f64 {
    let beta = p_mpa.powf(0.25);
    let e = beta * beta + N[2] * beta + N[5];
    let f = N[0] * beta * beta + N[3] * beta + N[6];
    let g = N[1] * beta * beta + N[4] * beta + N[7];
    let d = 2.0 * g / (-f - (f * f - 4.0 * e * g).sqrt());
    let s = N[9] + d;
    (s - (s * s - 4.0 * (N[8] + N[9] * d)).sqrt()) / 2.0
}

/// Saturation pressure [psia] at temperature [°F].
pub fn psat_psia(t_f: f64) -> f64 {
    psat_mpa(to_kelvin(degf(t_f))) * 1.0e6 / PSI_PA
}

/// Saturation temperature [°F] at pressure [psia].
pub fn tsat_f(p_psia: f64) -> f64 {
    let t_k = tsat_k(to_mpa(psia(p_psia)));
    to_degf(ThermodynamicTemperature::new::<kelvin>(t_k))
}

struct Boundary {
    rho_liq: f64,
    rho_vap: f64,
    h_liq: f64,
    h_vap: f64,
}

/// Saturated densities [kg/m³] and enthalpies [kJ/kg] at `t_k`.
fn boundary(t_k: f64) -> Boundary {
    let tau = 1.0 - t_k / T_CRIT_K;
    let ln_ratio = A[0] * tau
        + A[1] * tau.powf(1.5)
        + A[2] * tau.powi(3)
        + A[3] * tau.powf(3.5)
        + A[4] * tau.powi(4)
        + A[5] * tau.powf(7.5);
    let d_ln_ratio = A[0]
        + 1.5 * A[1] * tau.sqrt()
        + 3.0 * A[2] * tau.powi(2)
        + 3.5 * A[3] * tau.powf(2.5)
        + 4.0 * A[4] * tau.powi(3)
        + 7.5 * A[5] * tau.powf(6.5);
    let p = P_CRIT_MPA * 1.0e6 * (T_CRIT_K / t_k * ln_ratio).exp();
    let dp_dt = p * (-T_CRIT_K / (t_k * t_k) * ln_ratio - d_ln_ratio / t_k);

    let rho_liq = RHO_CRIT
        * (1.0
            + B[0] * tau.powf(1.0 / 3.0)
            + B[1] * tau.powf(2.0 / 3.0)
            + B[2] * tau.powf(5.0 / 3.0)
            + B[3] * tau.powf(16.0 / 3.0)
            + B[4] * tau.powf(43.0 / 3.0)
            + B[5] * tau.powf(110.0 / 3.0));
    let rho_vap = RHO_CRIT
        * (C[0] * tau.powf(2.0 / 6.0)
            + C[1] * tau.powf(4.0 / 6.0)
            + C[2] * tau.powf(8.0 / 6.0)
            + C[3] * tau.powf(18.0 / 6.0)
            + C[4] * tau.powf(37.0 / 6.0)
            + C[5] * tau.powf(71.0 / 6.0))
        .exp();

    let theta = t_k / T_CRIT_K;
    let alpha = 1_000.0
        * (D_ALPHA
            + D[0] * theta.powi(-19)
            + D[1] * theta
            + D[2] * theta.powf(4.5)
            + D[3] * theta.powi(5)
            + D[4] * theta.powf(54.5));

    // h = alpha + T/rho * dp/dT, in J/kg
    Boundary {
        rho_liq,
        rho_vap,
        h_liq: (alpha + t_k / rho_liq * dp_dt) / 1_000.0,
        h_vap: (alpha + t_k / rho_vap * dp_dt) / 1_000.0,
    }
}

/// Saturation pack at a known (temperature, pressure) pair on the line.
fn pack(t_f: f64, p_psia: f64) -> SaturationProps {
    let b = boundary(to_kelvin(degf(t_f)));
    let vf = M3_PER_KG_TO_FT3_PER_LB / b.rho_liq;
    let vg = M3_PER_KG_TO_FT3_PER_LB / b.rho_vap;
    let hf = b.h_liq * KJ_PER_KG_TO_BTU_PER_LB;
    let hg = b.h_vap * KJ_PER_KG_TO_BTU_PER_LB;
    SaturationProps {
        p_psia,
        t_f,
        vf,
        vg,
        hf,
        hg,
        uf: hf - p_psia * vf * PSIA_FT3_TO_BTU,
        ug: hg - p_psia * vg * PSIA_FT3_TO_BTU,
    }
}

pub fn at_temperature(t_f: f64) -> SaturationProps {
    pack(t_f, psat_psia(t_f))
}

pub fn at_pressure(p_psia: f64) -> SaturationProps {
    pack(tsat_f(p_psia), p_psia)
}
