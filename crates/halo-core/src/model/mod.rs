//! The analytic halo gas-profile model.
//!
//! Maps (halo mass, redshift, radius) onto bound-gas density, gas temperature
//! and electron pressure following the Mead et al. HMCode gas parameterization:
//! an NFW-like shape raised to a polytropic exponent, normalized so the
//! enclosed gas mass matches the logistic baryon fraction, with a virial
//! temperature set by hydrostatic scaling.

pub mod params;

use std::f64::consts::PI;
use std::str::FromStr;

use tracing::debug;

use crate::common::constants::{G_SI, K_B_SI, M_PROTON_SI, MPC_M, MSUN_KG};
use crate::common::units::{ElectronPressure, GasDensity, Mass, Radius, Temperature};
use crate::domain::{HaloError, HaloResult};
use crate::interp::{InterpolatedProfiles, ProfileCache};
use crate::numerics::{integrate_simpson, linear_grid, log_grid};

pub use params::{
    Cosmology, GasShape, GlobalParams, HaloModelConfig, InterpolationSettings, MassConcentration,
    MolecularWeights, ParamName, EGNFW_MASS_PIVOT,
};

/// Sample count of the normalization integral (2000 equal-width panels).
const NORM_SAMPLES: usize = 2001;
/// Inner cutoff of the normalization integral [Mpc/h].
const NORM_INNER_RADIUS: f64 = 1.0e-6;
/// Default radial sampling of profile evaluations, in fractions of Rvir.
const PROFILE_BINS: usize = 200;
const PROFILE_RMIN: f64 = 0.1;
const PROFILE_RMAX: f64 = 1.0;

/// Radial profile of one halo: shared radius fractions plus per-field arrays.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GasProfile {
    /// Radii as fractions of the virial radius.
    pub r_fractions: Vec<f64>,
    pub electron_pressure: Vec<ElectronPressure>,
    pub gas_density: Vec<GasDensity>,
    pub temperature: Vec<Temperature>,
}

pub struct HaloProfileModel {
    cosmology: Cosmology,
    globals: GlobalParams,
    shape: GasShape,
    relation: MassConcentration,
    weights: MolecularWeights,
    interp: InterpolationSettings,
    cache: Option<ProfileCache>,
}

impl HaloProfileModel {
    pub fn new(config: &HaloModelConfig) -> HaloResult<Self> {
        let cosmology = config.cosmology();
        cosmology.validate()?;

        let mut model = Self {
            cosmology,
            globals: config.global_params(),
            shape: config.gas_shape()?,
            relation: config.mass_concentration()?,
            weights: MolecularWeights::from_hydrogen_fraction(config.f_h),
            interp: config.interpolation(),
            cache: None,
        };
        model.validate_globals()?;

        if model.interp.enabled {
            model.rebuild_cache()?;
        }

        Ok(model)
    }

    pub fn with_defaults() -> HaloResult<Self> {
        Self::new(&HaloModelConfig::default())
    }

    pub fn cosmology(&self) -> &Cosmology {
        &self.cosmology
    }

    pub fn global_params(&self) -> &GlobalParams {
        &self.globals
    }

    pub fn gas_shape(&self) -> &GasShape {
        &self.shape
    }

    pub fn mass_concentration(&self) -> &MassConcentration {
        &self.relation
    }

    pub fn molecular_weights(&self) -> MolecularWeights {
        self.weights
    }

    pub fn interpolation(&self) -> &InterpolationSettings {
        &self.interp
    }

    pub fn default_radius_fractions() -> Vec<f64> {
        log_grid(PROFILE_RMIN, PROFILE_RMAX, PROFILE_BINS)
            .expect("profile bin constants form a valid log grid")
    }

    /// Bulk parameter update: assigns every pair, recomputes the derived
    /// molecular weights, then rebuilds the interpolation cache iff it was
    /// enabled at construction. On error the entries preceding the failing
    /// one stay assigned and no rebuild happens; callers treat the model as
    /// poisoned for that evaluation.
    pub fn update_param(&mut self, updates: &[(ParamName, f64)]) -> HaloResult<()> {
        for (name, value) in updates {
            self.apply_update(*name, *value)?;
        }

        self.weights = MolecularWeights::from_hydrogen_fraction(self.globals.f_h);
        debug!(
            updates = updates.len(),
            mu_e = self.weights.mu_e,
            mu_p = self.weights.mu_p,
            "model parameters updated"
        );

        if self.interp.enabled {
            self.rebuild_cache()?;
        }

        Ok(())
    }

    /// String-keyed update for the fit driver; unknown names are a typed
    /// configuration error.
    pub fn update_param_by_name(&mut self, updates: &[(&str, f64)]) -> HaloResult<()> {
        let parsed = updates
            .iter()
            .map(|(name, value)| ParamName::from_str(name).map(|parsed| (parsed, *value)))
            .collect::<HaloResult<Vec<_>>>()?;
        self.update_param(&parsed)
    }

    fn apply_update(&mut self, name: ParamName, value: f64) -> HaloResult<()> {
        let invalid = |reason: &'static str| HaloError::InvalidParameterValue {
            name: name.as_str(),
            value,
            reason,
        };

        if !value.is_finite() {
            return Err(invalid("must be finite"));
        }

        match name {
            ParamName::FH => {
                if value <= 0.0 || value >= 1.0 {
                    return Err(invalid("hydrogen mass fraction must lie in (0, 1)"));
                }
                self.globals.f_h = value;
            }
            ParamName::Alpha => {
                if value <= 0.0 {
                    return Err(invalid("temperature normalization must be positive"));
                }
                self.globals.alpha = value;
            }
            ParamName::GammaT => {
                if value <= 1.0 {
                    return Err(invalid("temperature polytropic index must exceed 1"));
                }
                self.globals.gamma_t = value;
            }
            ParamName::M0 => {
                if value <= 0.0 {
                    return Err(invalid("characteristic mass must be positive"));
                }
                self.globals.m0 = Mass::from_msun_h(value);
            }
            ParamName::Log10M0 => {
                self.globals.m0 = Mass::from_log10_msun_h(value);
            }
            ParamName::Beta => self.globals.beta = value,
            ParamName::Eps1_0 => self.globals.eps1_0 = value,
            ParamName::Eps1_1 => self.globals.eps1_1 = value,
            ParamName::Eps2_0 => self.globals.eps2_0 = value,
            ParamName::Eps2_1 => self.globals.eps2_1 = value,
            ParamName::RescaleA => {
                if value <= 0.0 {
                    return Err(invalid("concentration rescaling must be positive"));
                }
                self.globals.rescale_a = value;
            }
            ParamName::AlphaNt => {
                if value < 0.0 {
                    return Err(invalid("non-thermal amplitude must be non-negative"));
                }
                self.globals.alpha_nt = value;
            }
            ParamName::NNt => self.globals.n_nt = value,
            ParamName::Gamma => match &mut self.shape {
                GasShape::Polytropic { gamma } | GasShape::MassScaledPolytropic { gamma, .. } => {
                    if value <= 1.0 {
                        return Err(invalid("polytropic index must exceed 1"));
                    }
                    *gamma = value;
                }
                GasShape::EGnfw { .. } => {
                    return Err(invalid("not a parameter of the active shape family"));
                }
            },
            ParamName::A => match &mut self.shape {
                GasShape::MassScaledPolytropic { a, .. } => *a = value,
                _ => return Err(invalid("not a parameter of the active shape family")),
            },
            ParamName::Gamma0 => match &mut self.shape {
                GasShape::EGnfw { gamma_0, .. } => *gamma_0 = value,
                _ => return Err(invalid("not a parameter of the active shape family")),
            },
            ParamName::Gamma1 => match &mut self.shape {
                GasShape::EGnfw { gamma_1, .. } => *gamma_1 = value,
                _ => return Err(invalid("not a parameter of the active shape family")),
            },
            ParamName::Beta0 => match &mut self.shape {
                GasShape::EGnfw { beta_0, .. } => *beta_0 = value,
                _ => return Err(invalid("not a parameter of the active shape family")),
            },
            ParamName::Beta1 => match &mut self.shape {
                GasShape::EGnfw { beta_1, .. } => *beta_1 = value,
                _ => return Err(invalid("not a parameter of the active shape family")),
            },
            ParamName::Eta => match &mut self.shape {
                GasShape::EGnfw { eta, .. } => {
                    if value <= 0.0 {
                        return Err(invalid("transition sharpness must be positive"));
                    }
                    *eta = value;
                }
                _ => return Err(invalid("not a parameter of the active shape family")),
            },
            ParamName::ConcParam => match &mut self.relation {
                MassConcentration::Fixed { concentration } => {
                    if value <= 0.0 {
                        return Err(invalid("fixed concentration must be positive"));
                    }
                    *concentration = value;
                }
                _ => {
                    return Err(invalid(
                        "only meaningful for the fixed concentration relation",
                    ));
                }
            },
        }

        Ok(())
    }

    fn validate_globals(&self) -> HaloResult<()> {
        // Route the construction-time numbers through the same validators
        // the update path uses.
        let globals = self.globals;
        let checks: [(ParamName, f64); 6] = [
            (ParamName::FH, globals.f_h),
            (ParamName::Alpha, globals.alpha),
            (ParamName::GammaT, globals.gamma_t),
            (ParamName::M0, globals.m0.msun_h()),
            (ParamName::RescaleA, globals.rescale_a),
            (ParamName::AlphaNt, globals.alpha_nt),
        ];

        for (name, value) in checks {
            let invalid = !value.is_finite()
                || match name {
                    ParamName::FH => value <= 0.0 || value >= 1.0,
                    ParamName::Alpha | ParamName::M0 | ParamName::RescaleA => value <= 0.0,
                    ParamName::GammaT => value <= 1.0,
                    ParamName::AlphaNt => value < 0.0,
                    _ => false,
                };
            if invalid {
                return Err(HaloError::InvalidParameterValue {
                    name: name.as_str(),
                    value,
                    reason: "rejected at construction",
                });
            }
        }

        match self.shape {
            GasShape::Polytropic { gamma } | GasShape::MassScaledPolytropic { gamma, .. }
                if gamma <= 1.0 =>
            {
                Err(HaloError::InvalidParameterValue {
                    name: ParamName::Gamma.as_str(),
                    value: gamma,
                    reason: "polytropic index must exceed 1",
                })
            }
            _ => Ok(()),
        }
    }

    /// Virial radius from the spherical-collapse overdensity [Mpc/h].
    pub fn virial_radius(&self, mass: Mass, z: f64) -> HaloResult<Radius> {
        self.require_mass(mass)?;

        let delta_v = self.cosmology.virial_overdensity(z);
        let rho_m = self.cosmology.mean_matter_density();
        let volume = mass.msun_h() / (4.0 / 3.0 * PI * delta_v * rho_m);
        Ok(Radius::from_mpc_h(volume.cbrt()))
    }

    /// Concentration-mass relation with the baryon-fraction modification.
    pub fn concentration(&self, mass: Mass, z: f64) -> HaloResult<f64> {
        self.require_mass(mass)?;

        let m = mass.msun_h();
        let base = match self.relation {
            MassConcentration::Duffy08 => {
                7.85 * (m / 2.0e12).powf(-0.081) * (1.0 + z).powf(-0.71)
            }
            MassConcentration::Ragagnin21 => {
                let scale_factor = 1.0 / (1.0 + z);
                1.5f64.exp()
                    * (m / (19.9e13 * 0.704)).powf(-0.04)
                    * (scale_factor / 0.877).powf(-0.52)
            }
            // The free-parameter relation bypasses the baryon-fraction
            // modification and the rescaling entirely.
            MassConcentration::Fixed { concentration } => return Ok(concentration),
        };

        let eps1 = self.globals.eps1_0 + self.globals.eps1_1 * z;
        let eps2 = self.globals.eps2_0 + self.globals.eps2_1 * z;
        if eps1 <= -1.0 {
            return Err(HaloError::ConcentrationUndefined {
                index: 1,
                z,
                value: eps1,
            });
        }
        if eps2 <= -1.0 {
            return Err(HaloError::ConcentrationUndefined {
                index: 2,
                z,
                value: eps2,
            });
        }

        let relative_fraction =
            self.bound_fraction_unchecked(mass) / self.cosmology.baryon_fraction();
        let modified = base * (1.0 + eps1 + (eps2 - eps1) * relative_fraction);
        Ok(modified * self.globals.rescale_a)
    }

    /// Logistic bound-gas fraction; asymptotes to Omega_b/Omega_m.
    pub fn bound_fraction(&self, mass: Mass) -> HaloResult<f64> {
        self.require_mass(mass)?;
        Ok(self.bound_fraction_unchecked(mass))
    }

    fn bound_fraction_unchecked(&self, mass: Mass) -> f64 {
        let ratio = (mass.msun_h() / self.globals.m0.msun_h()).powf(self.globals.beta);
        self.cosmology.baryon_fraction() * ratio / (1.0 + ratio)
    }

    /// Normalized bound-gas density at radius `r`.
    pub fn bound_gas_density(&self, mass: Mass, r: Radius, z: f64) -> HaloResult<GasDensity> {
        self.require_mass(mass)?;
        self.require_radius(r)?;

        let r_virial = self.virial_radius(mass, z)?;
        let concentration = self.concentration(mass, z)?;
        let norm = self.normalization(mass, r_virial, concentration)?;
        Ok(self.density_with(mass, r, r_virial, concentration, norm))
    }

    /// Gas temperature at radius `r`.
    pub fn gas_temperature(&self, mass: Mass, r: Radius, z: f64) -> HaloResult<Temperature> {
        self.require_mass(mass)?;
        self.require_radius(r)?;

        let r_virial = self.virial_radius(mass, z)?;
        let concentration = self.concentration(mass, z)?;
        Ok(self.temperature_with(mass, r, r_virial, concentration, z))
    }

    /// Electron pressure at radius `r`, including non-thermal suppression.
    pub fn electron_pressure(&self, mass: Mass, r: Radius, z: f64) -> HaloResult<ElectronPressure> {
        self.require_mass(mass)?;
        self.require_radius(r)?;

        let r_virial = self.virial_radius(mass, z)?;
        let concentration = self.concentration(mass, z)?;
        let norm = self.normalization(mass, r_virial, concentration)?;
        let density = self.density_with(mass, r, r_virial, concentration, norm);
        let temperature = self.temperature_with(mass, r, r_virial, concentration, z);
        let factor = self.nonthermal_factor(r, r_virial);
        Ok(self.pressure_from(density, temperature, factor))
    }

    /// Full radial profile at the given fractions of the virial radius.
    /// The expensive normalization integral is evaluated once per call.
    pub fn profile(&self, mass: Mass, z: f64, r_fractions: &[f64]) -> HaloResult<GasProfile> {
        self.require_mass(mass)?;
        for fraction in r_fractions {
            if !fraction.is_finite() || *fraction <= 0.0 {
                return Err(HaloError::NonPositiveRadius { value: *fraction });
            }
        }

        let r_virial = self.virial_radius(mass, z)?;
        let concentration = self.concentration(mass, z)?;
        let norm = self.normalization(mass, r_virial, concentration)?;

        let mut electron_pressure = Vec::with_capacity(r_fractions.len());
        let mut gas_density = Vec::with_capacity(r_fractions.len());
        let mut temperature = Vec::with_capacity(r_fractions.len());
        for fraction in r_fractions {
            let r = Radius::from_mpc_h(fraction * r_virial.mpc_h());
            let density = self.density_with(mass, r, r_virial, concentration, norm);
            let temp = self.temperature_with(mass, r, r_virial, concentration, z);
            let factor = self.nonthermal_factor(r, r_virial);
            electron_pressure.push(self.pressure_from(density, temp, factor));
            gas_density.push(density);
            temperature.push(temp);
        }

        Ok(GasProfile {
            r_fractions: r_fractions.to_vec(),
            electron_pressure,
            gas_density,
            temperature,
        })
    }

    /// Electron-pressure profile on the default 200-bin grid over
    /// [0.1, 1] Rvir; returns the profile and the radius fractions.
    pub fn pe_profile(&self, mass: Mass, z: f64) -> HaloResult<GasProfile> {
        self.profile(mass, z, &Self::default_radius_fractions())
    }

    /// Interpolated profiles for a batch of masses, replacing the direct
    /// evaluation inside fitting loops. Requires the cache built for `z`.
    pub fn pe_profile_interpolated(
        &self,
        masses: &[Mass],
        z: f64,
        r_fractions: Option<&[f64]>,
    ) -> HaloResult<InterpolatedProfiles> {
        for mass in masses {
            self.require_mass(*mass)?;
        }

        let cache = self
            .cache
            .as_ref()
            .ok_or(HaloError::InterpolatorNotInitialized { z })?;
        let fractions = match r_fractions {
            Some(fractions) => fractions.to_vec(),
            None => Self::default_radius_fractions(),
        };
        cache.eval(masses, z, &fractions)
    }

    /// Rebuild the per-redshift interpolation tables from the current
    /// parameters.
    pub fn rebuild_cache(&mut self) -> HaloResult<()> {
        let settings = self.interp.clone();
        let cache = ProfileCache::build(self, &settings)?;
        debug!(
            redshifts = settings.zs.len(),
            mmin = settings.mmin,
            mmax = settings.mmax,
            "interpolation cache rebuilt"
        );
        self.cache = Some(cache);
        Ok(())
    }

    /// Accuracy gate: compares interpolated against directly computed
    /// profiles for a deterministic validation sample and fails with an
    /// accuracy error when the mean fractional deviation exceeds the
    /// configured tolerance.
    pub fn validate_interpolation(&self, sample_count: usize) -> HaloResult<()> {
        let cache = self
            .cache
            .as_ref()
            .ok_or(HaloError::InterpolatorNotInitialized {
                z: self.interp.zs.first().copied().unwrap_or(0.0),
            })?;
        cache.validate(self, sample_count, self.interp.error_tol)
    }

    fn require_mass(&self, mass: Mass) -> HaloResult<()> {
        if !mass.is_positive_finite() {
            return Err(HaloError::NonPositiveMass {
                value: mass.msun_h(),
            });
        }
        Ok(())
    }

    fn require_radius(&self, r: Radius) -> HaloResult<()> {
        if !r.is_positive_finite() {
            return Err(HaloError::NonPositiveRadius { value: r.mpc_h() });
        }
        Ok(())
    }

    /// Enclosed-shape integral: 4 pi r^2 shape(r/r_s) over [~0, Rvir],
    /// composite Simpson on a dense linear grid. This is the expensive step
    /// the interpolation layer amortizes.
    fn normalization(&self, mass: Mass, r_virial: Radius, concentration: f64) -> HaloResult<f64> {
        let r_scale = r_virial.mpc_h() / concentration;
        let grid = linear_grid(NORM_INNER_RADIUS, r_virial.mpc_h(), NORM_SAMPLES)
            .expect("normalization sample count is a fixed odd constant");
        let integrand: Vec<f64> = grid
            .iter()
            .map(|r| {
                4.0 * PI * r * r * self.shape.evaluate(r / r_scale, mass.msun_h(), concentration)
            })
            .collect();

        let norm = integrate_simpson(&grid, &integrand)?;
        Ok(norm)
    }

    fn density_with(
        &self,
        mass: Mass,
        r: Radius,
        r_virial: Radius,
        concentration: f64,
        norm: f64,
    ) -> GasDensity {
        let x = r.mpc_h() / (r_virial.mpc_h() / concentration);
        let shape = self.shape.evaluate(x, mass.msun_h(), concentration);
        let rho_mpc3 = shape * self.bound_fraction_unchecked(mass) * mass.msun_h() / norm;
        GasDensity::from_msun_h2_mpc3(rho_mpc3)
    }

    /// Virial temperature: alpha G m_p mu_p (1+z) M / (Rvir 3/2 k_B).
    /// Little-h cancels between mass and radius.
    fn virial_temperature(&self, mass: Mass, r_virial: Radius, z: f64) -> Temperature {
        let mass_kg = mass.msun_h() * MSUN_KG;
        let radius_m = r_virial.mpc_h() * MPC_M;
        let kelvin = self.globals.alpha * G_SI * M_PROTON_SI * self.weights.mu_p * (1.0 + z)
            * mass_kg
            / (radius_m * 1.5 * K_B_SI);
        Temperature::from_kelvin(kelvin)
    }

    fn temperature_with(
        &self,
        mass: Mass,
        r: Radius,
        r_virial: Radius,
        concentration: f64,
        z: f64,
    ) -> Temperature {
        let virial = self.virial_temperature(mass, r_virial, z);
        if self.shape.is_isothermal() {
            return virial;
        }

        let x = r.mpc_h() / (r_virial.mpc_h() / concentration);
        let falloff = (x.ln_1p() / x).powf(1.0 / (self.globals.gamma_t - 1.0));
        Temperature::from_kelvin(virial.kelvin() * falloff)
    }

    fn nonthermal_factor(&self, r: Radius, r_virial: Radius) -> f64 {
        let suppressed = self.globals.alpha_nt * (r.mpc_h() / r_virial.mpc_h()).powf(self.globals.n_nt);
        (1.0 - suppressed).max(0.0)
    }

    /// P_e = rho k_B T / (m_p mu_e), reported in keV h^2 / cm^3.
    fn pressure_from(
        &self,
        density: GasDensity,
        temperature: Temperature,
        nonthermal: f64,
    ) -> ElectronPressure {
        let rho_si_h2 = density.msun_h2_mpc3() * MSUN_KG / (MPC_M * MPC_M * MPC_M);
        let pressure_si_h2 =
            rho_si_h2 / (M_PROTON_SI * self.weights.mu_e) * K_B_SI * temperature.kelvin();
        ElectronPressure::from_si_h2(pressure_si_h2 * nonthermal)
    }
}
