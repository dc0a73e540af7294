//! Static description of a discrete velocity set.
//!
//! A descriptor is a zero-sized marker type carrying the lattice constants
//! (velocities, weights, opposites) and the orthogonal moment basis used by
//! the multi-relaxation-time collision. Everything here is immutable and
//! shared by all cells and threads.

use std::fmt::Debug;
use std::ops::{Index, IndexMut};

use nalgebra::DMatrix;

/// Fixed-size array of reals that the generic kernels can treat as a slice.
pub trait LatticeArray:
    Copy
    + Debug
    + Default
    + PartialEq
    + Send
    + Sync
    + AsRef<[f64]>
    + AsMut<[f64]>
    + Index<usize, Output = f64>
    + IndexMut<usize>
    + 'static
{
}

impl<T> LatticeArray for T where
    T: Copy
        + Debug
        + Default
        + PartialEq
        + Send
        + Sync
        + AsRef<[f64]>
        + AsMut<[f64]>
        + Index<usize, Output = f64>
        + IndexMut<usize>
        + 'static
{
}

/// Discrete velocity set DdQq.
///
/// Velocities are always stored with three components; 2D descriptors keep
/// the z component at zero so that the lattice code is shared.
pub trait Descriptor: Copy + Debug + Default + PartialEq + Send + Sync + 'static {
    /// Short name, e.g. `"D2Q9"`.
    const NAME: &'static str;
    /// Spatial dimension.
    const D: usize;
    /// Number of populations.
    const Q: usize;
    /// Discrete velocities.
    const C: &'static [[i32; 3]];
    /// Lattice weights.
    const W: &'static [f64];
    /// Index of the opposite velocity, for bounce-back.
    const OPP: &'static [usize];
    /// Lattice speed of sound squared.
    const CS2: f64 = 1.0 / 3.0;
    /// Inverse of the speed of sound squared.
    const INV_CS2: f64 = 3.0;
    /// Relaxation rates of the moment basis rows. Conserved rows are 0,
    /// shear rows are overwritten by `omega`.
    const MRT_RATES: &'static [f64];
    /// Rows of the moment basis carrying the traceless stress.
    const SHEAR_MOMENTS: &'static [usize];

    /// Population array, `[f64; Q]`.
    type Pops: LatticeArray;
    /// Spatial vector, `[f64; D]`.
    type Vect: LatticeArray;

    /// Row `k` of the moment basis evaluated at velocity `c`.
    fn moment_polynomial(k: usize, c: [f64; 3]) -> f64;

    /// Moment basis, built on first use.
    fn moment_basis() -> &'static MomentBasis;
}

/// Orthogonal moment basis `M` and its inverse.
///
/// The rows of `M` are mutually orthogonal, so `M^-1 = M^T diag(1 / |M_k|^2)`
/// and no numerical inversion is needed.
#[derive(Debug, Clone)]
pub struct MomentBasis {
    m: DMatrix<f64>,
    m_inv: DMatrix<f64>,
}

impl MomentBasis {
    /// Evaluate the moment polynomials of `L` on its velocity set.
    pub fn build<L: Descriptor>() -> Self {
        let m = DMatrix::from_fn(L::Q, L::Q, |k, i| {
            let c = L::C[i];
            L::moment_polynomial(k, [c[0] as f64, c[1] as f64, c[2] as f64])
        });
        let norms: Vec<f64> = m.row_iter().map(|row| row.norm_squared()).collect();
        let m_inv = DMatrix::from_fn(L::Q, L::Q, |i, k| m[(k, i)] / norms[k]);
        Self { m, m_inv }
    }

    /// The forward transform, populations to moments.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.m
    }

    /// The backward transform, moments to populations.
    pub fn inverse(&self) -> &DMatrix<f64> {
        &self.m_inv
    }

    /// Project populations onto the moment basis.
    #[inline]
    pub fn to_moments<P: LatticeArray>(&self, f: &P) -> P {
        let f = f.as_ref();
        let mut out = P::default();
        for (k, m_k) in out.as_mut().iter_mut().enumerate() {
            *m_k = f.iter().enumerate().map(|(i, fi)| self.m[(k, i)] * fi).sum();
        }
        out
    }

    /// Reconstruct populations from moments.
    #[inline]
    pub fn to_populations<P: LatticeArray>(&self, moments: &P) -> P {
        let moments = moments.as_ref();
        let mut out = P::default();
        for (i, f_i) in out.as_mut().iter_mut().enumerate() {
            *f_i = moments
                .iter()
                .enumerate()
                .map(|(k, m_k)| self.m_inv[(i, k)] * m_k)
                .sum();
        }
        out
    }
}
