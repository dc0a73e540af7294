//! D3Q19 velocity set.
//!
//! Nineteen velocity directions on 3D cubic lattice:
//! - 1 rest (0)
//! - 6 face-centered (±x, ±y, ±z)
//! - 12 edge-centered (±x±y, ±x±z, ±y±z)
//!
//! Moment basis after d'Humières et al. (2002).

use std::sync::OnceLock;

use crate::descriptor::{Descriptor, MomentBasis};

/// D3Q19 descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct D3Q19;

/// D3Q19 discrete velocities: [vx, vy, vz]
const E: [[i32; 3]; 19] = [
    [0, 0, 0], // 0: rest
    [1, 0, 0], // 1-6: face
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
    [1, 1, 0], // 7-18: edge
    [-1, -1, 0],
    [1, -1, 0],
    [-1, 1, 0],
    [1, 0, 1],
    [-1, 0, -1],
    [1, 0, -1],
    [-1, 0, 1],
    [0, 1, 1],
    [0, -1, -1],
    [0, 1, -1],
    [0, -1, 1],
];

/// D3Q19 weights
const W: [f64; 19] = [
    1.0 / 3.0,  // 0: rest
    1.0 / 18.0, // 1-6: face
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 36.0, // 7-18: edge
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

/// Opposite direction indices for bounce-back
const OPP: [usize; 19] = [
    0, 2, 1, 4, 3, 6, 5, 8, 7, 10, 9, 12, 11, 14, 13, 16, 15, 18, 17,
];

/// Rates of the non-hydrodynamic moments.
///
/// Order: rho, e, eps, jx, qx, jy, qy, jz, qz, 3pxx, 3pixx, pww, piww,
/// pxy, pyz, pxz, mx, my, mz.
const RATES: [f64; 19] = [
    0.0, 1.19, 1.4, 0.0, 1.2, 0.0, 1.2, 0.0, 1.2, 0.0, 1.4, 0.0, 1.4, 0.0, 0.0, 0.0, 1.98, 1.98,
    1.98,
];

impl Descriptor for D3Q19 {
    const NAME: &'static str = "D3Q19";
    const D: usize = 3;
    const Q: usize = 19;
    const C: &'static [[i32; 3]] = &E;
    const W: &'static [f64] = &W;
    const OPP: &'static [usize] = &OPP;
    const MRT_RATES: &'static [f64] = &RATES;
    const SHEAR_MOMENTS: &'static [usize] = &[9, 11, 13, 14, 15];

    type Pops = [f64; 19];
    type Vect = [f64; 3];

    fn moment_polynomial(k: usize, c: [f64; 3]) -> f64 {
        let [x, y, z] = c;
        let c2 = x * x + y * y + z * z;
        match k {
            0 => 1.0,
            1 => 19.0 * c2 - 30.0,
            2 => (21.0 * c2 * c2 - 53.0 * c2 + 24.0) / 2.0,
            3 => x,
            4 => (5.0 * c2 - 9.0) * x,
            5 => y,
            6 => (5.0 * c2 - 9.0) * y,
            7 => z,
            8 => (5.0 * c2 - 9.0) * z,
            9 => 3.0 * x * x - c2,
            10 => (3.0 * c2 - 5.0) * (3.0 * x * x - c2),
            11 => y * y - z * z,
            12 => (3.0 * c2 - 5.0) * (y * y - z * z),
            13 => x * y,
            14 => y * z,
            15 => x * z,
            16 => (y * y - z * z) * x,
            17 => (z * z - x * x) * y,
            18 => (x * x - y * y) * z,
            _ => 0.0,
        }
    }

    fn moment_basis() -> &'static MomentBasis {
        static BASIS: OnceLock<MomentBasis> = OnceLock::new();
        BASIS.get_or_init(MomentBasis::build::<D3Q19>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    #[test]
    fn test_weights_sum_to_one() {
        let sum: f64 = W.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_opposites() {
        for (i, &o) in OPP.iter().enumerate() {
            for a in 0..3 {
                assert_eq!(E[i][a], -E[o][a]);
            }
        }
    }

    #[test]
    fn test_second_moment_isotropy() {
        for a in 0..3 {
            for b in 0..3 {
                let m2: f64 = (0..19)
                    .map(|i| W[i] * (E[i][a] * E[i][b]) as f64)
                    .sum();
                let expected = if a == b { D3Q19::CS2 } else { 0.0 };
                assert_relative_eq!(m2, expected, epsilon = 1e-15);
            }
        }
    }

    #[test]
    fn test_moment_basis_orthogonal() {
        let basis = D3Q19::moment_basis();
        let gram = basis.matrix() * basis.matrix().transpose();
        for k in 0..19 {
            for l in 0..19 {
                if k != l {
                    assert!(gram[(k, l)].abs() < 1e-12, "rows {k} and {l} overlap");
                }
            }
        }
        let product = basis.matrix() * basis.inverse();
        assert!((product - DMatrix::<f64>::identity(19, 19)).abs().max() < 1e-12);
    }

    #[test]
    fn test_shear_rows_are_relaxed_by_omega() {
        for &k in D3Q19::SHEAR_MOMENTS {
            assert_eq!(RATES[k], 0.0);
        }
    }
}
