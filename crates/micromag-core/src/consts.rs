//! Physical constants.

use std::f64::consts::PI;

/// Magnetic constant (N/A^2).
pub const MU0: f64 = 4.0 * PI * 1e-7;

/// Elementary charge (C).
pub const E: f64 = 1.6021766208e-19;

/// Electron mass (kg).
pub const ME: f64 = 9.1093835611e-31;

/// Boltzmann constant (J/K).
pub const KB: f64 = 1.3806485279e-23;

/// Planck constant (Js).
pub const H: f64 = 6.62607004081e-34;

/// Lande g-factor.
pub const G: f64 = 2.00231930436182;

/// Reduced Planck constant (Js).
pub const HBAR: f64 = H / (2.0 * PI);

/// Gyrotropic ratio (C/kg).
pub const GAMMA: f64 = G * E / (2.0 * ME);

/// Bohr magneton (J/T).
pub const MU_B: f64 = E * HBAR / (2.0 * ME);

/// LLG precession term gamma (m/As).
pub const GAMMA0: f64 = GAMMA * MU0;
