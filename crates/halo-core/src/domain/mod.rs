//! Shared error taxonomy for the profile engine.
//!
//! Four categories cover every failure the core can produce: configuration
//! problems at parameter-update time, physical-domain violations, use of the
//! interpolation cache before it exists, and interpolation-accuracy failures.
//! Domain and accuracy errors are never caught and suppressed inside the
//! core; only the fit layer's explicit out-of-bounds check maps to a `-inf`
//! likelihood instead of an error.

pub type HaloResult<T> = Result<T, HaloError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HaloError {
    #[error("unknown model parameter '{name}'")]
    UnknownParameter { name: String },
    #[error("invalid value {value} for parameter '{name}': {reason}")]
    InvalidParameterValue {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error(
        "cosmology violates 0 < omega_b < omega_m < 1 with h > 0: \
         omega_m={omega_m}, omega_b={omega_b}, h={h}"
    )]
    InvalidCosmology { omega_m: f64, omega_b: f64, h: f64 },
    #[error("concentration undefined: eps{index}(z={z}) = {value} <= -1")]
    ConcentrationUndefined { index: u8, z: f64, value: f64 },
    #[error("halo mass must be positive and finite, got {value} Msun/h")]
    NonPositiveMass { value: f64 },
    #[error("radius must be positive and finite, got {value} Mpc/h")]
    NonPositiveRadius { value: f64 },
    #[error("profile normalization integral failed: {0}")]
    Normalization(#[from] crate::numerics::integrate::SimpsonError),
    #[error("interpolation table construction failed: {0}")]
    TableConstruction(#[from] crate::interp::TableError),
    #[error(
        "interpolation cache not initialized for z={z}; \
         construct the model with `use_interp` and a matching redshift list"
    )]
    InterpolatorNotInitialized { z: f64 },
    #[error(
        "interpolation accuracy check failed for {field}: mean fractional \
         deviation {measured:.6} exceeds tolerance {tolerance:.6}"
    )]
    InterpolationAccuracy {
        field: &'static str,
        measured: f64,
        tolerance: f64,
    },
}

impl HaloError {
    /// True for configuration problems at parameter-update time.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownParameter { .. } | Self::InvalidParameterValue { .. }
        )
    }

    /// True when a physical precondition was violated.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::InvalidCosmology { .. }
                | Self::ConcentrationUndefined { .. }
                | Self::NonPositiveMass { .. }
                | Self::NonPositiveRadius { .. }
                | Self::Normalization(_)
                | Self::TableConstruction(_)
        )
    }

    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::InterpolatorNotInitialized { .. })
    }

    pub fn is_accuracy(&self) -> bool {
        matches!(self, Self::InterpolationAccuracy { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::HaloError;

    #[test]
    fn categories_partition_the_taxonomy() {
        let configuration = HaloError::UnknownParameter {
            name: "gamma_x".to_string(),
        };
        let domain = HaloError::ConcentrationUndefined {
            index: 1,
            z: 0.0,
            value: -1.0,
        };
        let not_initialized = HaloError::InterpolatorNotInitialized { z: 0.0 };
        let accuracy = HaloError::InterpolationAccuracy {
            field: "electron_pressure",
            measured: 0.01,
            tolerance: 0.001,
        };

        assert!(configuration.is_configuration() && !configuration.is_domain());
        assert!(domain.is_domain() && !domain.is_configuration());
        assert!(not_initialized.is_not_initialized());
        assert!(accuracy.is_accuracy());
    }

    #[test]
    fn messages_carry_the_offending_values() {
        let error = HaloError::ConcentrationUndefined {
            index: 2,
            z: 1.5,
            value: -1.2,
        };
        let rendered = error.to_string();
        assert!(rendered.contains("eps2"));
        assert!(rendered.contains("-1.2"));
    }
}
