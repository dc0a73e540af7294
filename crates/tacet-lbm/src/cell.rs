//! A single lattice site.

use std::ops::{Index, IndexMut};

use crate::descriptor::Descriptor;

/// Populations of one lattice site.
///
/// Populations are stored as offsets from the rest state of unit density,
/// `fbar_i = f_i - w_i`, so that a quiescent fluid is exactly zero and
/// small acoustic perturbations keep their significant digits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell<L: Descriptor> {
    f: L::Pops,
}

impl<L: Descriptor> Cell<L> {
    /// Cell at rest with unit density.
    pub fn new() -> Self {
        Self {
            f: L::Pops::default(),
        }
    }

    /// Cell from offset populations.
    pub fn from_populations(f: L::Pops) -> Self {
        Self { f }
    }

    /// Offset populations.
    #[inline]
    pub fn populations(&self) -> &L::Pops {
        &self.f
    }

    /// Mutable offset populations.
    #[inline]
    pub fn populations_mut(&mut self) -> &mut L::Pops {
        &mut self.f
    }

    /// Overwrite all populations.
    #[inline]
    pub fn set_populations(&mut self, f: L::Pops) {
        self.f = f;
    }

    /// Full (non-offset) population `i`.
    pub fn full_population(&self, i: usize) -> f64 {
        self.f[i] + L::W[i]
    }

    /// Swap every population with its opposite.
    pub fn revert(&mut self) {
        let f = self.f;
        for (i, fi) in self.f.as_mut().iter_mut().enumerate() {
            *fi = f[L::OPP[i]];
        }
    }

    /// True if every population is a finite number.
    pub fn is_finite(&self) -> bool {
        self.f.as_ref().iter().all(|f| f.is_finite())
    }
}

impl<L: Descriptor> Default for Cell<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Descriptor> Index<usize> for Cell<L> {
    type Output = f64;

    #[inline]
    fn index(&self, i: usize) -> &f64 {
        &self.f[i]
    }
}

impl<L: Descriptor> IndexMut<usize> for Cell<L> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.f[i]
    }
}
