//! Analytic halo gas-profile engine.
//!
//! Implements the Mead et al. HMCode bound-gas model: the radial distribution
//! of gas density, electron pressure and temperature inside dark-matter halos,
//! together with a cached mass-by-radius interpolation layer that makes the
//! model cheap enough to evaluate inside a sampler's likelihood loop.

pub mod common;
pub mod domain;
pub mod fit;
pub mod interp;
pub mod model;
pub mod numerics;

pub use common::units::{ElectronPressure, GasDensity, Mass, Radius, Temperature};
pub use domain::{HaloError, HaloResult};
pub use interp::{InterpolatedProfiles, ProfileField, ProfileInterpolator};
pub use model::{
    Cosmology, GasProfile, GasShape, HaloModelConfig, HaloProfileModel, InterpolationSettings,
    MassConcentration, ParamName,
};
