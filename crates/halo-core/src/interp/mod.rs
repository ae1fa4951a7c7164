//! Cached mass-by-radius interpolation of halo profiles.
//!
//! A `ProfileInterpolator` holds one field (electron pressure, gas density or
//! temperature) at one redshift as a dense table of log10 values on a
//! log-spaced mass grid times a log-spaced radius-fraction grid, with natural
//! cubic splines along both axes. The `ProfileCache` owns one interpolator
//! per (field, redshift) and is rebuilt wholesale whenever the model's
//! parameters change.

use faer::Mat;
use tracing::debug;

use crate::common::units::{ElectronPressure, GasDensity, Mass, Temperature};
use crate::domain::{HaloError, HaloResult};
use crate::model::{HaloProfileModel, InterpolationSettings};
use crate::numerics::{log_grid, CubicSpline, SplineError};

/// Dense profile table: mass rows by radius columns.
pub type ProfileTable = Mat<f64>;

/// Mass samples per table.
const TABLE_MASS_SAMPLES: usize = 50;
/// Radius samples per table, log-spaced on [0.009, 1] r/Rvir.
const TABLE_RADIUS_BINS: usize = 200;
const TABLE_RMIN: f64 = 0.009;
const TABLE_RMAX: f64 = 1.0;
/// Radius subset used by the accuracy gate.
const VALIDATION_RADIUS_BINS: usize = 50;
const VALIDATION_RMIN: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    ElectronPressure,
    GasDensity,
    Temperature,
}

impl ProfileField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ElectronPressure => "electron_pressure",
            Self::GasDensity => "gas_density",
            Self::Temperature => "temperature",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error(
        "table shape mismatch: {rows}x{cols} values for {masses} masses and {radii} radius bins"
    )]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        masses: usize,
        radii: usize,
    },
    #[error("table values must be positive and finite, index ({row}, {col}) got {value}")]
    NonPositiveValue { row: usize, col: usize, value: f64 },
    #[error("table mass grid must be positive and strictly increasing at index {index}")]
    InvalidMassGrid { index: usize },
    #[error("table radius grid must be positive and strictly increasing at index {index}")]
    InvalidRadiusGrid { index: usize },
    #[error(transparent)]
    Spline(#[from] SplineError),
}

/// One field at one redshift: spline-interpolated log10 values over
/// (log10 mass, log10 radius fraction).
#[derive(Debug, Clone)]
pub struct ProfileInterpolator {
    log10_masses: Vec<f64>,
    log10_fractions: Vec<f64>,
    /// One spline per stored radius column, along the mass axis.
    mass_splines: Vec<CubicSpline>,
}

impl ProfileInterpolator {
    /// Build from a dense table of positive field values, one row per mass.
    pub fn build(
        mass_grid: &[f64],
        radius_fractions: &[f64],
        values: &ProfileTable,
    ) -> Result<Self, TableError> {
        validate_axis(mass_grid).map_err(|index| TableError::InvalidMassGrid { index })?;
        validate_axis(radius_fractions).map_err(|index| TableError::InvalidRadiusGrid { index })?;
        if values.nrows() != mass_grid.len() || values.ncols() != radius_fractions.len() {
            return Err(TableError::ShapeMismatch {
                rows: values.nrows(),
                cols: values.ncols(),
                masses: mass_grid.len(),
                radii: radius_fractions.len(),
            });
        }

        let log10_masses: Vec<f64> = mass_grid.iter().map(|m| m.log10()).collect();
        let log10_fractions: Vec<f64> = radius_fractions.iter().map(|r| r.log10()).collect();

        let mut mass_splines = Vec::with_capacity(radius_fractions.len());
        let mut column = vec![0.0; mass_grid.len()];
        for col in 0..radius_fractions.len() {
            for (row, slot) in column.iter_mut().enumerate() {
                let value = values[(row, col)];
                if !value.is_finite() || value <= 0.0 {
                    return Err(TableError::NonPositiveValue { row, col, value });
                }
                *slot = value.log10();
            }
            mass_splines.push(CubicSpline::fit(&log10_masses, &column)?);
        }

        Ok(Self {
            log10_masses,
            log10_fractions,
            mass_splines,
        })
    }

    /// Mass range of the table [Msun/h].
    pub fn mass_range(&self) -> (f64, f64) {
        (
            10f64.powf(self.log10_masses[0]),
            10f64.powf(self.log10_masses[self.log10_masses.len() - 1]),
        )
    }

    /// Interpolate at one mass over arbitrary radius fractions. Out-of-range
    /// masses clamp to the boundary spline segment; they never panic.
    pub fn eval_mass(&self, mass: Mass, r_fractions: &[f64]) -> Result<Vec<f64>, TableError> {
        let log10_mass = mass.msun_h().log10();
        let stored_row: Vec<f64> = self
            .mass_splines
            .iter()
            .map(|spline| spline.eval(log10_mass))
            .collect();

        let radius_spline = CubicSpline::fit(&self.log10_fractions, &stored_row)?;
        Ok(r_fractions
            .iter()
            .map(|fraction| 10f64.powf(radius_spline.eval(fraction.log10())))
            .collect())
    }

    /// Interpolate for a batch of masses; one output row per input mass.
    pub fn eval(&self, masses: &[Mass], r_fractions: &[f64]) -> Result<Vec<Vec<f64>>, TableError> {
        masses
            .iter()
            .map(|mass| self.eval_mass(*mass, r_fractions))
            .collect()
    }
}

fn validate_axis(grid: &[f64]) -> Result<(), usize> {
    for (index, value) in grid.iter().copied().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(index);
        }
        if index > 0 && value <= grid[index - 1] {
            return Err(index);
        }
    }
    if grid.len() < 3 {
        return Err(grid.len());
    }
    Ok(())
}

/// Interpolated profiles for a batch of masses: shared radius fractions plus
/// one row per mass and field.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedProfiles {
    pub r_fractions: Vec<f64>,
    pub electron_pressure: Vec<Vec<ElectronPressure>>,
    pub gas_density: Vec<Vec<GasDensity>>,
    pub temperature: Vec<Vec<Temperature>>,
}

struct RedshiftEntry {
    z: f64,
    pressure: ProfileInterpolator,
    density: ProfileInterpolator,
    temperature: ProfileInterpolator,
}

/// The model-owned interpolator set: one entry per configured redshift.
pub struct ProfileCache {
    entries: Vec<RedshiftEntry>,
}

impl ProfileCache {
    /// Build tables for every configured redshift from direct model
    /// evaluations.
    pub fn build(model: &HaloProfileModel, settings: &InterpolationSettings) -> HaloResult<Self> {
        if !(settings.mmin.is_finite() && settings.mmin > 0.0 && settings.mmax > settings.mmin) {
            return Err(HaloError::InvalidParameterValue {
                name: "mmin/mmax",
                value: settings.mmin,
                reason: "cache mass range must satisfy 0 < mmin < mmax",
            });
        }

        let mass_grid = log_grid(settings.mmin, settings.mmax, TABLE_MASS_SAMPLES)
            .expect("cache mass range was validated above");
        let fractions = log_grid(TABLE_RMIN, TABLE_RMAX, TABLE_RADIUS_BINS)
            .expect("table radius constants form a valid log grid");

        let mut entries = Vec::with_capacity(settings.zs.len());
        for &z in &settings.zs {
            let mut pressure = ProfileTable::zeros(TABLE_MASS_SAMPLES, TABLE_RADIUS_BINS);
            let mut density = ProfileTable::zeros(TABLE_MASS_SAMPLES, TABLE_RADIUS_BINS);
            let mut temperature = ProfileTable::zeros(TABLE_MASS_SAMPLES, TABLE_RADIUS_BINS);

            for (row, mass) in mass_grid.iter().enumerate() {
                let profile = model.profile(Mass::from_msun_h(*mass), z, &fractions)?;
                for col in 0..TABLE_RADIUS_BINS {
                    pressure[(row, col)] = profile.electron_pressure[col].kev_h2_cm3();
                    density[(row, col)] = profile.gas_density[col].msun_h2_kpc3();
                    temperature[(row, col)] = profile.temperature[col].kelvin();
                }
            }

            entries.push(RedshiftEntry {
                z,
                pressure: ProfileInterpolator::build(&mass_grid, &fractions, &pressure)
                    .map_err(HaloError::TableConstruction)?,
                density: ProfileInterpolator::build(&mass_grid, &fractions, &density)
                    .map_err(HaloError::TableConstruction)?,
                temperature: ProfileInterpolator::build(&mass_grid, &fractions, &temperature)
                    .map_err(HaloError::TableConstruction)?,
            });
            debug!(z, masses = TABLE_MASS_SAMPLES, radii = TABLE_RADIUS_BINS, "profile tables built");
        }

        Ok(Self { entries })
    }

    pub fn redshifts(&self) -> Vec<f64> {
        self.entries.iter().map(|entry| entry.z).collect()
    }

    /// Evaluate all three fields for a batch of masses at redshift `z`.
    pub fn eval(
        &self,
        masses: &[Mass],
        z: f64,
        r_fractions: &[f64],
    ) -> HaloResult<InterpolatedProfiles> {
        let entry = self
            .entry_for(z)
            .ok_or(HaloError::InterpolatorNotInitialized { z })?;

        let wrap = HaloError::TableConstruction;
        let pressure = entry
            .pressure
            .eval(masses, r_fractions)
            .map_err(wrap)?
            .into_iter()
            .map(|row| row.into_iter().map(ElectronPressure::from_kev_h2_cm3).collect())
            .collect();
        let density = entry
            .density
            .eval(masses, r_fractions)
            .map_err(wrap)?
            .into_iter()
            .map(|row| row.into_iter().map(GasDensity::from_msun_h2_kpc3).collect())
            .collect();
        let temperature = entry
            .temperature
            .eval(masses, r_fractions)
            .map_err(wrap)?
            .into_iter()
            .map(|row| row.into_iter().map(Temperature::from_kelvin).collect())
            .collect();

        Ok(InterpolatedProfiles {
            r_fractions: r_fractions.to_vec(),
            electron_pressure: pressure,
            gas_density: density,
            temperature,
        })
    }

    /// Accuracy gate: mean fractional deviation between interpolated and
    /// directly computed profiles over a deterministic mass sample must stay
    /// within `tolerance` for every field and redshift.
    pub fn validate(
        &self,
        model: &HaloProfileModel,
        sample_count: usize,
        tolerance: f64,
    ) -> HaloResult<()> {
        let probe_fractions = log_grid(VALIDATION_RMIN, TABLE_RMAX, VALIDATION_RADIUS_BINS)
            .expect("validation radius constants form a valid log grid");

        for entry in &self.entries {
            let (mmin, mmax) = entry.pressure.mass_range();
            let masses = validation_masses(sample_count, mmin.log10(), mmax.log10());

            let mut deviations = [0.0f64; 3];
            let mut samples = 0usize;
            for mass in &masses {
                let mass = Mass::from_msun_h(*mass);
                let direct = model.profile(mass, entry.z, &probe_fractions)?;
                let interpolated = self.eval(&[mass], entry.z, &probe_fractions)?;

                for col in 0..probe_fractions.len() {
                    deviations[0] += (interpolated.electron_pressure[0][col].kev_h2_cm3()
                        / direct.electron_pressure[col].kev_h2_cm3()
                        - 1.0)
                        .abs();
                    deviations[1] += (interpolated.gas_density[0][col].msun_h2_kpc3()
                        / direct.gas_density[col].msun_h2_kpc3()
                        - 1.0)
                        .abs();
                    deviations[2] += (interpolated.temperature[0][col].kelvin()
                        / direct.temperature[col].kelvin()
                        - 1.0)
                        .abs();
                }
                samples += probe_fractions.len();
            }

            let fields = [
                ProfileField::ElectronPressure,
                ProfileField::GasDensity,
                ProfileField::Temperature,
            ];
            for (field, total) in fields.iter().zip(deviations.iter()) {
                let measured = total / samples as f64;
                debug!(z = entry.z, field = field.as_str(), measured, "interpolation accuracy");
                if measured > tolerance {
                    return Err(HaloError::InterpolationAccuracy {
                        field: field.as_str(),
                        measured,
                        tolerance,
                    });
                }
            }
        }

        Ok(())
    }

    fn entry_for(&self, z: f64) -> Option<&RedshiftEntry> {
        self.entries.iter().find(|entry| (entry.z - z).abs() <= 1.0e-9)
    }
}

/// Deterministic log-uniform mass sample (splitmix-style LCG) so accuracy
/// failures reproduce across runs.
fn validation_masses(count: usize, log10_min: f64, log10_max: f64) -> Vec<f64> {
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let unit = ((state >> 11) as f64) / ((1u64 << 53) as f64);
            10f64.powf(log10_min + unit * (log10_max - log10_min))
        })
        .collect()
}
