//! Macroscopic moments of the populations.

use crate::cell::Cell;
use crate::descriptor::Descriptor;

/// Full density from the density offset.
#[inline]
pub fn full_rho(rho_bar: f64) -> f64 {
    rho_bar + 1.0
}

/// Density offset from the full density.
#[inline]
pub fn rho_bar(rho: f64) -> f64 {
    rho - 1.0
}

/// Inverse of the full density.
#[inline]
pub fn inv_rho(rho_bar: f64) -> f64 {
    1.0 / full_rho(rho_bar)
}

/// Squared Euclidean norm.
#[inline]
pub fn norm_sqr(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// Scalar product `c_i . v`.
#[inline]
pub fn c_dot<L: Descriptor>(i: usize, v: &[f64]) -> f64 {
    v.iter()
        .zip(L::C[i].iter())
        .map(|(v, &c)| v * c as f64)
        .sum()
}

/// Density offset: the sum of the offset populations.
#[inline]
pub fn get_rho_bar<L: Descriptor>(cell: &Cell<L>) -> f64 {
    cell.populations().as_ref().iter().sum()
}

/// Momentum `j = sum_i c_i f_i`.
#[inline]
pub fn get_j<L: Descriptor>(cell: &Cell<L>) -> L::Vect {
    let mut j = L::Vect::default();
    for (i, f) in cell.populations().as_ref().iter().enumerate() {
        for (a, j_a) in j.as_mut().iter_mut().enumerate() {
            *j_a += L::C[i][a] as f64 * f;
        }
    }
    j
}

/// Density offset and momentum in a single sweep.
#[inline]
pub fn get_rho_bar_j<L: Descriptor>(cell: &Cell<L>) -> (f64, L::Vect) {
    let mut rho_bar = 0.0;
    let mut j = L::Vect::default();
    for (i, f) in cell.populations().as_ref().iter().enumerate() {
        rho_bar += f;
        for (a, j_a) in j.as_mut().iter_mut().enumerate() {
            *j_a += L::C[i][a] as f64 * f;
        }
    }
    (rho_bar, j)
}

/// `v * factor`, componentwise.
#[inline]
pub fn scaled<V: crate::descriptor::LatticeArray>(v: &V, factor: f64) -> V {
    let mut out = *v;
    for x in out.as_mut() {
        *x *= factor;
    }
    out
}
