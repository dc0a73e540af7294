//! Second-order equilibrium distribution.
//!
//! For offset populations:
//!
//! ```text
//! f_i^eq = w_i [ rhoBar + (c_i.j)/cs² + 1/(2 cs² rho) ((c_i.j)²/cs² - j²) ]
//! ```
//!
//! With `rho = 1 + rhoBar` and `j = rho u` this is the familiar
//! `w_i rho [1 + 3 c.u + 9/2 (c.u)² - 3/2 u²]` minus the rest weight.

use crate::descriptor::Descriptor;
use crate::moments::c_dot;

/// Equilibrium value of population `i`.
///
/// `inv_rho` is the density the nonlinear term is divided by: the local
/// density for compressible models, a fixed reference for incompressible
/// ones.
#[inline]
pub fn second_order<L: Descriptor>(
    i: usize,
    rho_bar: f64,
    inv_rho: f64,
    j: &L::Vect,
    j_sqr: f64,
) -> f64 {
    let c_j = c_dot::<L>(i, j.as_ref());
    L::W[i]
        * (rho_bar
            + L::INV_CS2 * c_j
            + 0.5 * inv_rho * L::INV_CS2 * (L::INV_CS2 * c_j * c_j - j_sqr))
}

/// All equilibrium populations at once.
#[inline]
pub fn populations<L: Descriptor>(rho_bar: f64, inv_rho: f64, j: &L::Vect, j_sqr: f64) -> L::Pops {
    let mut feq = L::Pops::default();
    for (i, f) in feq.as_mut().iter_mut().enumerate() {
        *f = second_order::<L>(i, rho_bar, inv_rho, j, j_sqr);
    }
    feq
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::d2q9::D2Q9;
    use crate::d3q19::D3Q19;
    use crate::moments::{full_rho, norm_sqr};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn check_conservation<L: Descriptor>(rho_bar: f64, j: L::Vect) {
        let j_sqr = norm_sqr(j.as_ref());
        let feq = populations::<L>(rho_bar, 1.0 / full_rho(rho_bar), &j, j_sqr);

        let sum: f64 = feq.as_ref().iter().sum();
        assert_relative_eq!(sum, rho_bar, epsilon = 1e-14);

        for a in 0..L::D {
            let j_a: f64 = feq
                .as_ref()
                .iter()
                .enumerate()
                .map(|(i, f)| L::C[i][a] as f64 * f)
                .sum();
            assert_relative_eq!(j_a, j.as_ref()[a], epsilon = 1e-14);
        }
    }

    #[test]
    fn test_equilibrium_rest() {
        let j = [0.0, 0.0];
        for i in 0..9 {
            assert_eq!(second_order::<D2Q9>(i, 0.0, 1.0, &j, 0.0), 0.0);
        }
        // Full population at rest is the weight.
        let feq = second_order::<D2Q9>(0, 0.0, 1.0, &j, 0.0) + D2Q9::W[0];
        assert!((feq - 4.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_d2q9_conservation() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let rho_bar = rng.random_range(-0.05..0.05);
            let j = [rng.random_range(-0.1..0.1), rng.random_range(-0.1..0.1)];
            check_conservation::<D2Q9>(rho_bar, j);
        }
    }

    #[test]
    fn test_d3q19_conservation() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..50 {
            let rho_bar = rng.random_range(-0.05..0.05);
            let j = [
                rng.random_range(-0.1..0.1),
                rng.random_range(-0.1..0.1),
                rng.random_range(-0.1..0.1),
            ];
            check_conservation::<D3Q19>(rho_bar, j);
        }
    }

    #[test]
    fn test_matches_velocity_form() {
        // w_i rho (1 + 3 e.u + 4.5 (e.u)^2 - 1.5 u.u), minus the weight.
        let rho: f64 = 1.02;
        let u = [0.04, -0.03];
        let j = [rho * u[0], rho * u[1]];
        let j_sqr = norm_sqr(&j);
        for i in 0..9 {
            let e = D2Q9::C[i];
            let eu = e[0] as f64 * u[0] + e[1] as f64 * u[1];
            let uu = u[0] * u[0] + u[1] * u[1];
            let expected =
                D2Q9::W[i] * rho * (1.0 + 3.0 * eu + 4.5 * eu * eu - 1.5 * uu) - D2Q9::W[i];
            let got = second_order::<D2Q9>(i, rho - 1.0, 1.0 / rho, &j, j_sqr);
            assert_relative_eq!(got, expected, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_second_moment_is_maxwellian() {
        // Pi_ab = rho cs2 delta_ab + j_a j_b / rho (without the offset).
        let rho: f64 = 1.01;
        let j = [0.02, 0.01, -0.015];
        let feq = populations::<D3Q19>(rho - 1.0, 1.0 / rho, &j, norm_sqr(&j));
        for a in 0..3 {
            for b in 0..3 {
                let pi: f64 = (0..19)
                    .map(|i| {
                        let c = D3Q19::C[i];
                        (feq[i] + D3Q19::W[i]) * (c[a] * c[b]) as f64
                    })
                    .sum();
                let iso = if a == b { rho / 3.0 } else { 0.0 };
                assert_relative_eq!(pi, iso + j[a] * j[b] / rho, epsilon = 1e-14);
            }
        }
    }
}
