//! D2Q9 velocity set.
//!
//! Nine velocity directions on 2D square lattice:
//! ```text
//!   6   2   5
//!    \  |  /
//!   3 - 0 - 1
//!    /  |  \
//!   7   4   8
//! ```
//!
//! The moment basis is the one of Lallemand & Luo (2000):
//! `rho, e, eps, jx, qx, jy, qy, pxx, pxy`.

use std::sync::OnceLock;

use crate::descriptor::{Descriptor, MomentBasis};

/// D2Q9 descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct D2Q9;

/// D2Q9 discrete velocities: [vx, vy, 0]
const E: [[i32; 3]; 9] = [
    [0, 0, 0],   // 0: rest
    [1, 0, 0],   // 1: east
    [0, 1, 0],   // 2: north
    [-1, 0, 0],  // 3: west
    [0, -1, 0],  // 4: south
    [1, 1, 0],   // 5: northeast
    [-1, 1, 0],  // 6: northwest
    [-1, -1, 0], // 7: southwest
    [1, -1, 0],  // 8: southeast
];

/// D2Q9 weights
const W: [f64; 9] = [
    4.0 / 9.0, // 0: rest
    1.0 / 9.0, // 1-4: cardinal
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 36.0, // 5-8: diagonal
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

/// Opposite direction indices for bounce-back
const OPP: [usize; 9] = [0, 3, 4, 1, 2, 7, 8, 5, 6];

/// Energy, energy-square and heat-flux rates; 0 on rho, jx, jy.
const RATES: [f64; 9] = [0.0, 1.1, 1.1, 0.0, 1.1, 0.0, 1.1, 0.0, 0.0];

impl Descriptor for D2Q9 {
    const NAME: &'static str = "D2Q9";
    const D: usize = 2;
    const Q: usize = 9;
    const C: &'static [[i32; 3]] = &E;
    const W: &'static [f64] = &W;
    const OPP: &'static [usize] = &OPP;
    const MRT_RATES: &'static [f64] = &RATES;
    const SHEAR_MOMENTS: &'static [usize] = &[7, 8];

    type Pops = [f64; 9];
    type Vect = [f64; 2];

    fn moment_polynomial(k: usize, c: [f64; 3]) -> f64 {
        let [x, y, _] = c;
        let c2 = x * x + y * y;
        match k {
            0 => 1.0,
            1 => -4.0 + 3.0 * c2,
            2 => 4.0 - 10.5 * c2 + 4.5 * c2 * c2,
            3 => x,
            4 => (-5.0 + 3.0 * c2) * x,
            5 => y,
            6 => (-5.0 + 3.0 * c2) * y,
            7 => x * x - y * y,
            8 => x * y,
            _ => 0.0,
        }
    }

    fn moment_basis() -> &'static MomentBasis {
        static BASIS: OnceLock<MomentBasis> = OnceLock::new();
        BASIS.get_or_init(MomentBasis::build::<D2Q9>)
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
            assert_eq!(OPP[o], i);
        }
    }

    #[test]
    fn test_second_moment_isotropy() {
        for a in 0..2 {
            for b in 0..2 {
                let m2: f64 = (0..9)
                    .map(|i| W[i] * (E[i][a] * E[i][b]) as f64)
                    .sum();
                let expected = if a == b { D2Q9::CS2 } else { 0.0 };
                assert_relative_eq!(m2, expected, epsilon = 1e-15);
            }
        }
    }

    #[test]
    fn test_moment_basis_inverse() {
        let basis = D2Q9::moment_basis();
        let product = basis.matrix() * basis.inverse();
        let identity = DMatrix::<f64>::identity(9, 9);
        assert!((product - identity).abs().max() < 1e-13);
    }

    #[test]
    fn test_moment_rows() {
        let basis = D2Q9::moment_basis();
        // Row norms of the Lallemand & Luo basis.
        let norms = [9.0, 36.0, 36.0, 6.0, 12.0, 6.0, 12.0, 4.0, 4.0];
        for (k, norm) in norms.iter().enumerate() {
            assert_relative_eq!(basis.matrix().row(k).norm_squared(), norm);
        }
    }
}
