//! Unit-carrying quantity newtypes for values crossing the public API.
//!
//! Little-h is carried symbolically in the unit convention: masses are
//! `Msun/h`, radii `Mpc/h`, gas densities `Msun h^2 / kpc^3` and electron
//! pressures `keV h^2 / cm^3`. Conversions between conventions are explicit
//! named methods; arithmetic that would change the dimension is not provided.

use serde::{Deserialize, Serialize};

use super::constants::{KEV_J, KPC_M, MPC_M};

/// Halo mass in `Msun/h`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mass(f64);

impl Mass {
    pub const fn from_msun_h(value: f64) -> Self {
        Self(value)
    }

    pub fn from_log10_msun_h(log10_value: f64) -> Self {
        Self(10f64.powf(log10_value))
    }

    pub const fn msun_h(self) -> f64 {
        self.0
    }

    pub fn is_positive_finite(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }
}

/// Radial distance in `Mpc/h`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radius(f64);

impl Radius {
    pub const fn from_mpc_h(value: f64) -> Self {
        Self(value)
    }

    pub const fn mpc_h(self) -> f64 {
        self.0
    }

    pub fn meters_per_h(self) -> f64 {
        self.0 * MPC_M
    }

    pub fn is_positive_finite(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }
}

/// Bound-gas mass density in `Msun h^2 / kpc^3`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GasDensity(f64);

impl GasDensity {
    pub const fn from_msun_h2_kpc3(value: f64) -> Self {
        Self(value)
    }

    /// Internal normalization arithmetic runs in `Msun h^2 / Mpc^3`.
    pub fn from_msun_h2_mpc3(value: f64) -> Self {
        Self(value * (KPC_M / MPC_M).powi(3))
    }

    pub const fn msun_h2_kpc3(self) -> f64 {
        self.0
    }

    pub fn msun_h2_mpc3(self) -> f64 {
        self.0 * (MPC_M / KPC_M).powi(3)
    }
}

/// Gas temperature in Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Temperature(f64);

impl Temperature {
    pub const fn from_kelvin(value: f64) -> Self {
        Self(value)
    }

    pub const fn kelvin(self) -> f64 {
        self.0
    }
}

/// Electron pressure in `keV h^2 / cm^3`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElectronPressure(f64);

impl ElectronPressure {
    pub const fn from_kev_h2_cm3(value: f64) -> Self {
        Self(value)
    }

    pub fn from_si_h2(value_j_h2_m3: f64) -> Self {
        Self(value_j_h2_m3 / KEV_J / 1.0e6)
    }

    pub const fn kev_h2_cm3(self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{ElectronPressure, GasDensity, Mass, Radius};

    #[test]
    fn mass_log10_shorthand_matches_power_of_ten() {
        let mass = Mass::from_log10_msun_h(14.0);
        assert!((mass.msun_h() - 1.0e14).abs() / 1.0e14 <= 1.0e-12);
    }

    #[test]
    fn density_round_trips_between_kpc_and_mpc_conventions() {
        let density = GasDensity::from_msun_h2_mpc3(2.7554e11);
        assert!((density.msun_h2_kpc3() - 2.7554e11 * 1.0e-9).abs() <= 1.0e-3);
        assert!((density.msun_h2_mpc3() - 2.7554e11).abs() / 2.7554e11 <= 1.0e-12);
    }

    #[test]
    fn pressure_si_conversion_matches_kev_per_cm3() {
        // 1 keV/cm^3 = KEV_J * 1e6 J/m^3.
        let pressure = ElectronPressure::from_si_h2(1.602_176_634e-16 * 1.0e6);
        assert!((pressure.kev_h2_cm3() - 1.0).abs() <= 1.0e-12);
    }

    #[test]
    fn positivity_guards_reject_bad_values() {
        assert!(Mass::from_msun_h(1.0e14).is_positive_finite());
        assert!(!Mass::from_msun_h(-1.0).is_positive_finite());
        assert!(!Radius::from_mpc_h(f64::NAN).is_positive_finite());
    }
}
