//! Physical constants and unit-conversion factors shared across the model.
//!
//! SI values follow CODATA 2018 / the IAU nominal solar mass; the critical
//! density is the fixed `Msun h^2 / Mpc^3` literal the profile normalization
//! is calibrated against.

/// Newtonian gravitational constant [m^3 kg^-1 s^-2].
pub const G_SI: f64 = 6.674_30e-11;
/// Boltzmann constant [J K^-1].
pub const K_B_SI: f64 = 1.380_649e-23;
/// Proton mass [kg].
pub const M_PROTON_SI: f64 = 1.672_621_923_69e-27;

/// Solar mass [kg].
pub const MSUN_KG: f64 = 1.988_409_87e30;
/// Megaparsec [m].
pub const MPC_M: f64 = 3.085_677_581_491_367_3e22;
/// Kiloparsec [m].
pub const KPC_M: f64 = 3.085_677_581_491_367_3e19;
/// Kilo-electronvolt [J].
pub const KEV_J: f64 = 1.602_176_634e-16;

/// Critical density of the universe [Msun h^2 / Mpc^3].
pub const RHO_CRIT: f64 = 2.7554e11;

/// WMAP7 matter density fraction.
pub const WMAP7_OMEGA_M: f64 = 0.272;
/// WMAP7 baryon density fraction.
pub const WMAP7_OMEGA_B: f64 = 0.0456;
/// WMAP7 dimensionless Hubble parameter.
pub const WMAP7_LITTLE_H: f64 = 0.704;
