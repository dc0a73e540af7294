//! Conversions between physical similarity numbers and lattice parameters.

use crate::{C_S, C_S_SQ};

/// Relaxation time τ = ν/cs² + 1/2.
pub fn tau_from_viscosity(nu: f64) -> f64 {
    nu / C_S_SQ + 0.5
}

/// Kinematic viscosity ν = cs² (1/ω - 1/2).
pub fn viscosity_from_omega(omega: f64) -> f64 {
    C_S_SQ * (1.0 / omega - 0.5)
}

/// Relaxation frequency ω = 1/τ for a given viscosity.
pub fn omega_from_viscosity(nu: f64) -> f64 {
    1.0 / tau_from_viscosity(nu)
}

/// Lattice velocity for a Mach number, `u = Ma cs`.
pub fn velocity_from_mach(mach: f64) -> f64 {
    mach * C_S
}

/// Relaxation frequency for a flow at Mach `mach` and Reynolds `reynolds`
/// around an obstacle of `length` cells: τ = 1/2 + u L / (Re cs²).
pub fn omega_from_reynolds(mach: f64, reynolds: f64, length: f64) -> f64 {
    let u = velocity_from_mach(mach);
    omega_from_viscosity(u * length / reynolds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_viscosity_round_trip() {
        for omega in [0.6, 1.0, 1.9] {
            assert_relative_eq!(
                omega_from_viscosity(viscosity_from_omega(omega)),
                omega,
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn test_matches_tau_formula() {
        // τ = 3ν + 0.5 on the standard lattices
        assert_relative_eq!(tau_from_viscosity(0.1), 0.8, epsilon = 1e-15);
    }

    #[test]
    fn test_square_cylinder_setup() {
        // Re 150, Ma 0.2 around a 24-cell square.
        let omega = omega_from_reynolds(0.2, 150.0, 24.0);
        let u = 0.2 / 3f64.sqrt();
        let tau = 0.5 + u * 24.0 / (150.0 / 3.0);
        assert_relative_eq!(omega, 1.0 / tau, epsilon = 1e-14);
        assert!(omega > 0.0 && omega < 2.0);
    }
}
