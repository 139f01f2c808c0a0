// pw-core/src/units.rs
//
// The plant models work in US customary units (lbm, °F, psia, ft³, BTU)
// because every setpoint the operator sees is in those units. The typed
// quantities below are the boundary to SI.

use uom::si::f64::{
    Energy as UomEnergy, Mass as UomMass, MassDensity as UomMassDensity,
    MassRate as UomMassRate, Power as UomPower, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
    Volume as UomVolume,
};

pub type Energy = UomEnergy;
pub type Mass = UomMass;
pub type Density = UomMassDensity;
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;
pub type Volume = UomVolume;

#[inline]
pub fn lbm(v: f64) -> Mass {
    use uom::si::mass::pound;
    Mass::new::<pound>(v)
}

#[inline]
pub fn lbm_per_s(v: f64) -> MassRate {
    use uom::si::mass_rate::pound_per_second;
    MassRate::new::<pound_per_second>(v)
}

#[inline]
pub fn degf(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_fahrenheit;
    Temperature::new::<degree_fahrenheit>(v)
}

#[inline]
pub fn psia(v: f64) -> Pressure {
    use uom::si::pressure::pound_force_per_square_inch;
    Pressure::new::<pound_force_per_square_inch>(v)
}

#[inline]
pub fn cubic_feet(v: f64) -> Volume {
    use uom::si::volume::cubic_foot;
    Volume::new::<cubic_foot>(v)
}

#[inline]
pub fn lbm_per_ft3(v: f64) -> Density {
    use uom::si::mass_density::pound_per_cubic_foot;
    Density::new::<pound_per_cubic_foot>(v)
}

#[inline]
pub fn btu(v: f64) -> Energy {
    use uom::si::energy::btu_it;
    Energy::new::<btu_it>(v)
}

#[inline]
pub fn megawatts(v: f64) -> Power {
    use uom::si::power::megawatt;
    Power::new::<megawatt>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn to_degf(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::degree_fahrenheit;
    t.get::<degree_fahrenheit>()
}

#[inline]
pub fn to_kelvin(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

#[inline]
pub fn to_psia(p: Pressure) -> f64 {
    use uom::si::pressure::pound_force_per_square_inch;
    p.get::<pound_force_per_square_inch>()
}

#[inline]
pub fn to_mpa(p: Pressure) -> f64 {
    use uom::si::pressure::megapascal;
    p.get::<megapascal>()
}

#[inline]
pub fn to_btu(e: Energy) -> f64 {
    use uom::si::energy::btu_it;
    e.get::<btu_it>()
}

#[inline]
pub fn to_lbm_per_ft3(d: Density) -> f64 {
    use uom::si::mass_density::pound_per_cubic_foot;
    d.get::<pound_per_cubic_foot>()
}

/// BTU delivered per second by a heat rate given in MW.
#[inline]
pub fn mw_to_btu_per_s(mw: f64) -> f64 {
    use uom::si::power::watt;
    megawatts(mw).get::<watt>() / constants::BTU_IT_J
}

#[inline]
pub fn btu_per_s_to_mw(q: f64) -> f64 {
    use uom::si::power::{megawatt, watt};
    Power::new::<watt>(q * constants::BTU_IT_J).get::<megawatt>()
}

pub mod constants {
    /// International Table BTU in joules.
    pub const BTU_IT_J: f64 = 1_055.055_852_62;
    /// 1 psi in pascals.
    pub const PSI_PA: f64 = 6_894.757_293_168;
    /// 1 m³/kg expressed in ft³/lb.
    pub const M3_PER_KG_TO_FT3_PER_LB: f64 = 16.018_463_373_960_138;
    /// 1 kJ/kg expressed in BTU/lb.
    pub const KJ_PER_KG_TO_BTU_PER_LB: f64 = 1.0 / 2.326;
    /// psia·ft³/lb to BTU/lb (144 in²/ft² over 778.17 ft·lbf/BTU).
    pub const PSIA_FT3_TO_BTU: f64 = 144.0 / 778.169_262_265_965_2;
    pub const ATMOSPHERIC_PSIA: f64 = 14.696;
    pub const SECONDS_PER_HOUR: f64 = 3_600.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _m = lbm(800_000.0);
        let _mdot = lbm_per_s(10.0);
        let _v = cubic_feet(1_800.0);
        let _rho = lbm_per_ft3(62.0);
        let _e = btu(1.0);
        let _dt = s(0.5);
    }

    #[test]
    fn temperature_round_trip_through_kelvin() {
        let t = degf(212.0);
        assert!((to_kelvin(t) - 373.15).abs() < 1e-9);
        assert!((to_degf(t) - 212.0).abs() < 1e-9);
    }

    #[test]
    fn pressure_conversions_agree_with_constant() {
        let p = psia(1.0);
        assert!((to_mpa(p) * 1.0e6 - constants::PSI_PA).abs() < 1e-3);
        assert!((to_psia(psia(2250.0)) - 2250.0).abs() < 1e-9);
    }

    #[test]
    fn one_megawatt_in_btu_per_second() {
        let q = mw_to_btu_per_s(1.0);
        assert!((q - 1.0e6 / constants::BTU_IT_J).abs() < 1e-3);
        assert!((btu_per_s_to_mw(q) - 1.0).abs() < 1e-12);
    }
}
