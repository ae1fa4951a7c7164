pub mod constants;
pub mod units;

pub use units::{ElectronPressure, GasDensity, Mass, Radius, Temperature};
