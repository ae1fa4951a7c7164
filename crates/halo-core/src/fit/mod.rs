//! Contract with the external fit driver.
//!
//! The driver hands an ensemble sampler a log-likelihood closure built from
//! measured halo profiles and this module's pieces: `ObservedProfile` records
//! the per-halo measurements, `ParamBounds` encodes the sampler's prior box,
//! and `GaussianLogLikelihood` performs one likelihood evaluation against the
//! interpolated model. Out-of-bounds parameter vectors map to `-inf` (the
//! prior); every other failure propagates as an error rather than being
//! silently converted.

use serde::{Deserialize, Serialize};

use crate::common::units::{Mass, Radius};
use crate::domain::HaloResult;
use crate::interp::ProfileField;
use crate::model::{HaloProfileModel, ParamName};

/// One measured field of one halo: value, radius-bin and particle-count
/// arrays of equal length, radii expressed as fractions of the virial radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldObservation {
    pub values: Vec<f64>,
    pub radius_fractions: Vec<f64>,
    pub particle_counts: Vec<f64>,
}

impl FieldObservation {
    /// Poisson scatter of the log profile: sigma_ln = 1 / sqrt(N).
    pub fn sigma_ln(&self) -> Vec<f64> {
        self.particle_counts
            .iter()
            .map(|count| 1.0 / count.sqrt())
            .collect()
    }
}

/// Per-halo measurements consumed by the likelihood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedProfile {
    pub mvir: Mass,
    pub rvir: Radius,
    pub electron_pressure: Option<FieldObservation>,
    pub gas_density: Option<FieldObservation>,
    pub temperature: Option<FieldObservation>,
}

impl ObservedProfile {
    pub fn field(&self, field: ProfileField) -> Option<&FieldObservation> {
        match field {
            ProfileField::ElectronPressure => self.electron_pressure.as_ref(),
            ProfileField::GasDensity => self.gas_density.as_ref(),
            ProfileField::Temperature => self.temperature.as_ref(),
        }
    }
}

/// The sampler's prior box: inclusive [lower, upper] per parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBounds {
    entries: Vec<(ParamName, [f64; 2])>,
}

impl ParamBounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: ParamName, lower: f64, upper: f64) -> Self {
        self.set(name, lower, upper);
        self
    }

    pub fn set(&mut self, name: ParamName, lower: f64, upper: f64) {
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = [lower, upper];
        } else {
            self.entries.push((name, [lower, upper]));
        }
    }

    pub fn range(&self, name: ParamName) -> Option<[f64; 2]> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, range)| *range)
    }

    /// A value with no configured range is unconstrained.
    pub fn contains(&self, name: ParamName, value: f64) -> bool {
        match self.range(name) {
            Some([lower, upper]) => value >= lower && value <= upper,
            None => true,
        }
    }

    pub fn all_within(&self, params: &[(ParamName, f64)]) -> bool {
        params
            .iter()
            .all(|(name, value)| self.contains(*name, *value))
    }
}

/// Intrinsic log-scatter per field, threaded explicitly through the
/// likelihood instead of living in process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicScatter {
    pub electron_pressure: f64,
    pub gas_density: f64,
    pub temperature: f64,
}

impl IntrinsicScatter {
    pub fn for_field(&self, field: ProfileField) -> f64 {
        match field {
            ProfileField::ElectronPressure => self.electron_pressure,
            ProfileField::GasDensity => self.gas_density,
            ProfileField::Temperature => self.temperature,
        }
    }
}

/// One Gaussian log-likelihood over a halo sample at a single redshift.
#[derive(Debug, Clone)]
pub struct GaussianLogLikelihood {
    pub halos: Vec<ObservedProfile>,
    pub fields: Vec<ProfileField>,
    pub bounds: ParamBounds,
    pub scatter: IntrinsicScatter,
    pub z: f64,
}

impl GaussianLogLikelihood {
    /// Evaluate ln L for a parameter vector. Returns `-inf` iff the vector
    /// leaves the prior box; model failures propagate as errors.
    pub fn evaluate(
        &self,
        model: &mut HaloProfileModel,
        params: &[(ParamName, f64)],
    ) -> HaloResult<f64> {
        if !self.bounds.all_within(params) {
            return Ok(f64::NEG_INFINITY);
        }

        model.update_param(params)?;

        let mut log_likelihood = 0.0;
        for halo in &self.halos {
            for &field in &self.fields {
                let Some(observation) = halo.field(field) else {
                    continue;
                };

                let interpolated = model.pe_profile_interpolated(
                    &[halo.mvir],
                    self.z,
                    Some(&observation.radius_fractions),
                )?;
                let theory: Vec<f64> = match field {
                    ProfileField::ElectronPressure => interpolated.electron_pressure[0]
                        .iter()
                        .map(|pe| pe.kev_h2_cm3())
                        .collect(),
                    ProfileField::GasDensity => interpolated.gas_density[0]
                        .iter()
                        .map(|rho| rho.msun_h2_kpc3())
                        .collect(),
                    ProfileField::Temperature => interpolated.temperature[0]
                        .iter()
                        .map(|t| t.kelvin())
                        .collect(),
                };

                let sigma_ln = observation.sigma_ln();
                let intrinsic = self.scatter.for_field(field);
                for ((observed, predicted), sigma) in observation
                    .values
                    .iter()
                    .zip(theory.iter())
                    .zip(sigma_ln.iter())
                {
                    // Empty bins (zero or non-finite measurements) carry no
                    // information.
                    if !(observed.is_finite() && *observed > 0.0) {
                        continue;
                    }

                    let residual = (observed / predicted).ln();
                    let variance = sigma * sigma + intrinsic * intrinsic;
                    log_likelihood -= 0.5 * residual * residual / variance;
                }
            }
        }

        Ok(log_likelihood)
    }
}
