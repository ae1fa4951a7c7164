//! Parameter space of the halo gas model.
//!
//! The shape-family and concentration-relation selectors are sum types so
//! each family carries exactly its own parameters, and parameter updates go
//! through one typed entry point (`ParamName`) instead of string-keyed
//! attribute assignment.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::constants::{RHO_CRIT, WMAP7_LITTLE_H, WMAP7_OMEGA_B, WMAP7_OMEGA_M};
use crate::common::units::Mass;
use crate::domain::{HaloError, HaloResult};

/// Mass pivot of the e-GNFW mass scalings [Msun/h].
pub const EGNFW_MASS_PIVOT: f64 = 1.0e13;

/// Background cosmology: flat, matter + Lambda.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cosmology {
    pub omega_m: f64,
    pub omega_b: f64,
    pub h: f64,
}

impl Default for Cosmology {
    fn default() -> Self {
        Self {
            omega_m: WMAP7_OMEGA_M,
            omega_b: WMAP7_OMEGA_B,
            h: WMAP7_LITTLE_H,
        }
    }
}

impl Cosmology {
    pub fn validate(&self) -> HaloResult<()> {
        let physical = self.omega_b > 0.0
            && self.omega_b < self.omega_m
            && self.omega_m < 1.0
            && self.h > 0.0
            && self.omega_m.is_finite()
            && self.omega_b.is_finite()
            && self.h.is_finite();
        if !physical {
            return Err(HaloError::InvalidCosmology {
                omega_m: self.omega_m,
                omega_b: self.omega_b,
                h: self.h,
            });
        }
        Ok(())
    }

    /// Universal baryon fraction Omega_b / Omega_m.
    pub fn baryon_fraction(&self) -> f64 {
        self.omega_b / self.omega_m
    }

    /// Matter density fraction at redshift `z` for a flat universe.
    pub fn omega_m_at(&self, z: f64) -> f64 {
        let grown = self.omega_m * (1.0 + z).powi(3);
        grown / (grown + 1.0 - self.omega_m)
    }

    /// Spherical-collapse virial overdensity Delta_v(z) relative to the mean
    /// matter density.
    pub fn virial_overdensity(&self, z: f64) -> f64 {
        let omega_z = self.omega_m_at(z);
        let x = 1.0 - omega_z;
        (18.0 * std::f64::consts::PI * std::f64::consts::PI - 82.0 * x - 39.0 * x * x) / omega_z
    }

    /// Mean matter density [Msun h^2 / Mpc^3].
    pub fn mean_matter_density(&self) -> f64 {
        self.omega_m * RHO_CRIT
    }
}

/// Bound-gas density shape family; each variant owns its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GasShape {
    /// HMCode polytropic shape: (ln(1+x)/x)^(1/(gamma-1)).
    Polytropic { gamma: f64 },
    /// Polytropic shape with mass-scaled index gamma * M^a.
    MassScaledPolytropic { gamma: f64, a: f64 },
    /// e-GNFW placeholder with mass-dependent inner/outer slopes.
    EGnfw {
        gamma_0: f64,
        gamma_1: f64,
        beta_0: f64,
        beta_1: f64,
        eta: f64,
    },
}

impl GasShape {
    pub fn selector(&self) -> u8 {
        match self {
            Self::Polytropic { .. } => 0,
            Self::MassScaledPolytropic { .. } => 1,
            Self::EGnfw { .. } => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Polytropic { .. } => "default HMCode",
            Self::MassScaledPolytropic { .. } => "mass dependent gamma",
            Self::EGnfw { .. } => "e-GNFW",
        }
    }

    /// Un-normalized density shape at x = r / r_s.
    pub fn evaluate(&self, x: f64, mass_msun_h: f64, concentration: f64) -> f64 {
        match *self {
            Self::Polytropic { gamma } => polytropic_shape(x, gamma),
            Self::MassScaledPolytropic { gamma, a } => {
                polytropic_shape(x, gamma * mass_msun_h.powf(a))
            }
            Self::EGnfw {
                gamma_0,
                gamma_1,
                beta_0,
                beta_1,
                eta,
            } => {
                let m = mass_msun_h / EGNFW_MASS_PIVOT;
                let inner = gamma_0 * m.powf(gamma_1);
                let outer = (beta_0 * m.powf(beta_1) - inner) / eta;
                let c = concentration;
                let numerator = c.powf(inner) * (1.0 + c.powf(eta)).powf(outer);
                let denominator = (c * x).powf(inner) * (1.0 + (c * x).powf(eta)).powf(outer);
                numerator / denominator
            }
        }
    }

    /// The e-GNFW family keeps the gas isothermal; the polytropic families
    /// share the Komatsu-Seljak temperature falloff.
    pub fn is_isothermal(&self) -> bool {
        matches!(self, Self::EGnfw { .. })
    }
}

fn polytropic_shape(x: f64, gamma: f64) -> f64 {
    (x.ln_1p() / x).powf(1.0 / (gamma - 1.0))
}

/// Concentration-mass relation selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MassConcentration {
    /// Duffy et al. 2008 power law.
    Duffy08,
    /// Ragagnin et al. 2021 fit (Magneticum).
    Ragagnin21,
    /// Concentration held fixed as a free parameter.
    Fixed { concentration: f64 },
}

impl MassConcentration {
    pub fn selector(&self) -> u8 {
        match self {
            Self::Duffy08 => 0,
            Self::Ragagnin21 => 1,
            Self::Fixed { .. } => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Duffy08 => "Duffy 2008",
            Self::Ragagnin21 => "Ragagnin 2021",
            Self::Fixed { .. } => "fixed",
        }
    }
}

/// Global (shape-independent) model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalParams {
    /// Hydrogen mass fraction.
    pub f_h: f64,
    /// Virial-temperature normalization.
    pub alpha: f64,
    /// Temperature-profile polytropic index.
    pub gamma_t: f64,
    /// Characteristic mass of the baryon-fraction logistic [Msun/h].
    pub m0: Mass,
    /// Baryon-fraction logistic slope.
    pub beta: f64,
    /// Concentration modification, low-mass term: eps1(z) = eps1_0 + eps1_1 z.
    pub eps1_0: f64,
    pub eps1_1: f64,
    /// Concentration modification, high-mass term: eps2(z) = eps2_0 + eps2_1 z.
    pub eps2_0: f64,
    pub eps2_1: f64,
    /// Overall concentration rescaling.
    pub rescale_a: f64,
    /// Non-thermal pressure-support amplitude and slope.
    pub alpha_nt: f64,
    pub n_nt: f64,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            f_h: 0.76,
            alpha: 0.8471,
            gamma_t: 2.0,
            m0: Mass::from_log10_msun_h(13.5937),
            beta: 0.6,
            eps1_0: -0.1065,
            eps1_1: -0.1073,
            eps2_0: 0.0,
            eps2_1: 0.0,
            rescale_a: 1.0,
            alpha_nt: 0.0,
            n_nt: 0.0,
        }
    }
}

/// Mean molecular weights per electron and per proton, functions of f_H only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MolecularWeights {
    pub mu_e: f64,
    pub mu_p: f64,
}

impl MolecularWeights {
    pub fn from_hydrogen_fraction(f_h: f64) -> Self {
        Self {
            mu_e: 2.0 / (1.0 + f_h),
            mu_p: 4.0 / (3.0 + 5.0 * f_h),
        }
    }
}

/// Every updatable model parameter; `FromStr` serves the fit driver's
/// string-keyed interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamName {
    FH,
    Alpha,
    GammaT,
    M0,
    Log10M0,
    Beta,
    Eps1_0,
    Eps1_1,
    Eps2_0,
    Eps2_1,
    RescaleA,
    AlphaNt,
    NNt,
    Gamma,
    A,
    Gamma0,
    Gamma1,
    Beta0,
    Beta1,
    Eta,
    ConcParam,
}

impl ParamName {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FH => "f_H",
            Self::Alpha => "alpha",
            Self::GammaT => "gamma_T",
            Self::M0 => "M0",
            Self::Log10M0 => "log10_M0",
            Self::Beta => "beta",
            Self::Eps1_0 => "eps1_0",
            Self::Eps1_1 => "eps1_1",
            Self::Eps2_0 => "eps2_0",
            Self::Eps2_1 => "eps2_1",
            Self::RescaleA => "rescale_A",
            Self::AlphaNt => "alpha_nt",
            Self::NNt => "n_nt",
            Self::Gamma => "gamma",
            Self::A => "a",
            Self::Gamma0 => "gamma_0",
            Self::Gamma1 => "gamma_1",
            Self::Beta0 => "beta_0",
            Self::Beta1 => "beta_1",
            Self::Eta => "eta",
            Self::ConcParam => "conc_param",
        }
    }
}

impl Display for ParamName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamName {
    type Err = HaloError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "f_H" => Ok(Self::FH),
            "alpha" => Ok(Self::Alpha),
            "gamma_T" => Ok(Self::GammaT),
            "M0" => Ok(Self::M0),
            "log10_M0" => Ok(Self::Log10M0),
            "beta" => Ok(Self::Beta),
            "eps1_0" => Ok(Self::Eps1_0),
            "eps1_1" => Ok(Self::Eps1_1),
            "eps2_0" => Ok(Self::Eps2_0),
            "eps2_1" => Ok(Self::Eps2_1),
            "rescale_A" => Ok(Self::RescaleA),
            "alpha_nt" => Ok(Self::AlphaNt),
            "n_nt" => Ok(Self::NNt),
            "gamma" => Ok(Self::Gamma),
            "a" => Ok(Self::A),
            "gamma_0" => Ok(Self::Gamma0),
            "gamma_1" => Ok(Self::Gamma1),
            "beta_0" => Ok(Self::Beta0),
            "beta_1" => Ok(Self::Beta1),
            "eta" => Ok(Self::Eta),
            "conc_param" => Ok(Self::ConcParam),
            _ => Err(HaloError::UnknownParameter {
                name: name.to_string(),
            }),
        }
    }
}

/// Interpolation-cache settings: whether the cache is built, its redshift
/// list, mass range, and accuracy tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolationSettings {
    pub enabled: bool,
    pub zs: Vec<f64>,
    /// Mass range of the cache [Msun/h].
    pub mmin: f64,
    pub mmax: f64,
    /// Mean-fractional-deviation tolerance of the accuracy gate.
    pub error_tol: f64,
}

impl Default for InterpolationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            zs: vec![0.0],
            mmin: 1.0e13,
            mmax: 1.0e16,
            error_tol: 1.0e-3,
        }
    }
}

/// Constructor configuration for `HaloProfileModel`.
///
/// `irho` and `imass_conc` keep integer selectors at the configuration
/// boundary and map onto the typed families internally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HaloModelConfig {
    pub omega_m: f64,
    pub omega_b: f64,
    pub h: f64,
    pub irho: u8,
    pub imass_conc: u8,
    pub conc_param: f64,
    pub f_h: f64,
    pub alpha: f64,
    pub gamma: f64,
    pub gamma_t: f64,
    pub a: f64,
    pub gamma_0: f64,
    pub gamma_1: f64,
    pub beta_0: f64,
    pub beta_1: f64,
    pub eta: f64,
    pub log10_m0: f64,
    pub beta: f64,
    pub eps1_0: f64,
    pub eps1_1: f64,
    pub eps2_0: f64,
    pub eps2_1: f64,
    pub rescale_a: f64,
    pub alpha_nt: f64,
    pub n_nt: f64,
    pub use_interp: bool,
    pub zs: Vec<f64>,
    pub mmin: f64,
    pub mmax: f64,
    pub interp_error_tol: f64,
}

impl Default for HaloModelConfig {
    fn default() -> Self {
        let globals = GlobalParams::default();
        let interp = InterpolationSettings::default();
        Self {
            omega_m: WMAP7_OMEGA_M,
            omega_b: WMAP7_OMEGA_B,
            h: WMAP7_LITTLE_H,
            irho: 0,
            imass_conc: 0,
            conc_param: 8.0,
            f_h: globals.f_h,
            alpha: globals.alpha,
            gamma: 1.177,
            gamma_t: globals.gamma_t,
            a: 0.0,
            gamma_0: 0.5,
            gamma_1: -0.05,
            beta_0: 4.7,
            beta_1: 0.05,
            eta: 1.3,
            log10_m0: 13.5937,
            beta: globals.beta,
            eps1_0: globals.eps1_0,
            eps1_1: globals.eps1_1,
            eps2_0: globals.eps2_0,
            eps2_1: globals.eps2_1,
            rescale_a: globals.rescale_a,
            alpha_nt: globals.alpha_nt,
            n_nt: globals.n_nt,
            use_interp: interp.enabled,
            zs: interp.zs,
            mmin: interp.mmin,
            mmax: interp.mmax,
            interp_error_tol: interp.error_tol,
        }
    }
}

impl HaloModelConfig {
    pub fn cosmology(&self) -> Cosmology {
        Cosmology {
            omega_m: self.omega_m,
            omega_b: self.omega_b,
            h: self.h,
        }
    }

    pub fn gas_shape(&self) -> HaloResult<GasShape> {
        match self.irho {
            0 => Ok(GasShape::Polytropic { gamma: self.gamma }),
            1 => Ok(GasShape::MassScaledPolytropic {
                gamma: self.gamma,
                a: self.a,
            }),
            2 => Ok(GasShape::EGnfw {
                gamma_0: self.gamma_0,
                gamma_1: self.gamma_1,
                beta_0: self.beta_0,
                beta_1: self.beta_1,
                eta: self.eta,
            }),
            other => Err(HaloError::InvalidParameterValue {
                name: "irho",
                value: f64::from(other),
                reason: "shape-family selector must be 0, 1 or 2",
            }),
        }
    }

    pub fn mass_concentration(&self) -> HaloResult<MassConcentration> {
        match self.imass_conc {
            0 => Ok(MassConcentration::Duffy08),
            1 => Ok(MassConcentration::Ragagnin21),
            2 => Ok(MassConcentration::Fixed {
                concentration: self.conc_param,
            }),
            other => Err(HaloError::InvalidParameterValue {
                name: "imass_conc",
                value: f64::from(other),
                reason: "concentration-relation selector must be 0, 1 or 2",
            }),
        }
    }

    pub fn global_params(&self) -> GlobalParams {
        GlobalParams {
            f_h: self.f_h,
            alpha: self.alpha,
            gamma_t: self.gamma_t,
            m0: Mass::from_log10_msun_h(self.log10_m0),
            beta: self.beta,
            eps1_0: self.eps1_0,
            eps1_1: self.eps1_1,
            eps2_0: self.eps2_0,
            eps2_1: self.eps2_1,
            rescale_a: self.rescale_a,
            alpha_nt: self.alpha_nt,
            n_nt: self.n_nt,
        }
    }

    pub fn interpolation(&self) -> InterpolationSettings {
        InterpolationSettings {
            enabled: self.use_interp,
            zs: self.zs.clone(),
            mmin: self.mmin,
            mmax: self.mmax,
            error_tol: self.interp_error_tol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cosmology, GasShape, HaloModelConfig, MassConcentration, ParamName};
    use std::str::FromStr;

    #[test]
    fn cosmology_validation_enforces_density_ordering() {
        assert!(Cosmology::default().validate().is_ok());

        let inverted = Cosmology {
            omega_m: 0.04,
            omega_b: 0.27,
            h: 0.7,
        };
        assert!(inverted.validate().is_err());

        let negative_h = Cosmology {
            h: -1.0,
            ..Cosmology::default()
        };
        assert!(negative_h.validate().is_err());
    }

    #[test]
    fn omega_m_grows_towards_one_at_high_redshift() {
        let cosmology = Cosmology::default();
        assert!((cosmology.omega_m_at(0.0) - cosmology.omega_m).abs() <= 1.0e-12);
        assert!(cosmology.omega_m_at(5.0) > 0.98);
    }

    #[test]
    fn virial_overdensity_approaches_the_einstein_de_sitter_limit() {
        let cosmology = Cosmology::default();
        let eds = 18.0 * std::f64::consts::PI * std::f64::consts::PI;
        assert!(cosmology.virial_overdensity(0.0) > eds);
        assert!((cosmology.virial_overdensity(20.0) - eds).abs() / eds <= 0.02);
    }

    #[test]
    fn polytropic_shape_matches_closed_form() {
        let shape = GasShape::Polytropic { gamma: 1.177 };
        for x in [0.05_f64, 0.3, 1.0, 4.0] {
            let expected = ((1.0 + x).ln() / x).powf(1.0 / (1.177 - 1.0));
            assert!((shape.evaluate(x, 1.0e14, 5.0) - expected).abs() <= 1.0e-12);
        }
    }

    #[test]
    fn mass_scaled_shape_reduces_to_polytropic_at_zero_slope() {
        let plain = GasShape::Polytropic { gamma: 1.3 };
        let scaled = GasShape::MassScaledPolytropic { gamma: 1.3, a: 0.0 };
        assert!((plain.evaluate(0.7, 2.0e14, 6.0) - scaled.evaluate(0.7, 2.0e14, 6.0)).abs()
            <= 1.0e-14);
    }

    #[test]
    fn egnfw_shape_is_finite_positive_and_unity_at_the_scale_radius() {
        let shape = GasShape::EGnfw {
            gamma_0: 0.5,
            gamma_1: -0.05,
            beta_0: 4.7,
            beta_1: 0.05,
            eta: 1.3,
        };

        for x in [1.0e-3, 0.1, 0.5, 1.0, 3.0, 8.0] {
            let value = shape.evaluate(x, 5.0e14, 6.0);
            assert!(value.is_finite());
            assert!(value > 0.0);
        }

        // x = 1 makes numerator and denominator identical.
        assert!((shape.evaluate(1.0, 5.0e14, 6.0) - 1.0).abs() <= 1.0e-12);
    }

    #[test]
    fn param_names_round_trip_through_strings() {
        for name in [
            ParamName::FH,
            ParamName::Alpha,
            ParamName::GammaT,
            ParamName::M0,
            ParamName::Log10M0,
            ParamName::Beta,
            ParamName::Eps1_0,
            ParamName::RescaleA,
            ParamName::Gamma,
            ParamName::Eta,
            ParamName::ConcParam,
        ] {
            assert_eq!(ParamName::from_str(name.as_str()).expect("parse"), name);
        }

        assert!(ParamName::from_str("sigma8").is_err());
    }

    #[test]
    fn config_selectors_map_onto_typed_families() {
        let mut config = HaloModelConfig::default();
        assert_eq!(
            config.gas_shape().expect("shape"),
            GasShape::Polytropic { gamma: 1.177 }
        );
        assert_eq!(
            config.mass_concentration().expect("relation"),
            MassConcentration::Duffy08
        );

        config.imass_conc = 2;
        config.conc_param = 6.5;
        assert_eq!(
            config.mass_concentration().expect("relation"),
            MassConcentration::Fixed { concentration: 6.5 }
        );

        config.irho = 3;
        assert!(config.gas_shape().is_err());
    }
}
