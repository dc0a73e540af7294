//! Per-cell collision models.
//!
//! A [`Dynamics`] transforms the populations of one cell in place. The
//! lattice stores one handle per cell; bulk regions share a single
//! instance, boundary layers own one instance per cell.

use std::fmt;

use crate::cell::Cell;
use crate::descriptor::Descriptor;
use crate::equilibrium;
use crate::error::{LbmError, Result};
use crate::moments::{self, full_rho, inv_rho, norm_sqr};
use crate::mrt::AnechoicMrtDynamics;
use crate::statistics::BlockStatistics;

/// Stable identifier of a collision model, for checkpointing and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicsKind {
    NoDynamics,
    BounceBack,
    Bgk,
    Mrt,
    IncMrt,
    AnechoicMrt,
}

impl DynamicsKind {
    /// Numeric id, never reused between variants.
    pub const fn id(self) -> u32 {
        match self {
            Self::NoDynamics => 0,
            Self::BounceBack => 1,
            Self::Bgk => 2,
            Self::Mrt => 3,
            Self::IncMrt => 4,
            Self::AnechoicMrt => 5,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::NoDynamics => "no_dynamics",
            Self::BounceBack => "bounce_back",
            Self::Bgk => "bgk",
            Self::Mrt => "mrt",
            Self::IncMrt => "inc_mrt",
            Self::AnechoicMrt => "anechoic_mrt",
        }
    }

    /// Inverse of [`DynamicsKind::id`].
    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::NoDynamics),
            1 => Some(Self::BounceBack),
            2 => Some(Self::Bgk),
            3 => Some(Self::Mrt),
            4 => Some(Self::IncMrt),
            5 => Some(Self::AnechoicMrt),
            _ => None,
        }
    }
}

impl fmt::Display for DynamicsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Check that `omega` lies in the linearly stable range (0, 2).
pub fn check_omega(omega: f64) -> Result<f64> {
    if omega > 0.0 && omega < 2.0 {
        Ok(omega)
    } else {
        Err(LbmError::InvalidOmega(omega))
    }
}

/// Collision model of a single cell.
///
/// `collide` is the hot path: it must not allocate, log or fail.
pub trait Dynamics<L: Descriptor>: fmt::Debug + Send + Sync {
    /// Variant tag.
    fn kind(&self) -> DynamicsKind;

    /// Numeric id of the variant.
    fn id(&self) -> u32 {
        self.kind().id()
    }

    /// Independent copy with identical parameters.
    fn clone_dynamics(&self) -> Box<dyn Dynamics<L>>;

    /// Collide using the moments of the cell itself.
    fn collide(&self, cell: &mut Cell<L>, stats: &mut BlockStatistics);

    /// Collide with imposed macroscopic variables. Only the populations are
    /// written; `rho_bar`, `j` and `theta_bar` are read-only inputs.
    fn collide_external(
        &self,
        cell: &mut Cell<L>,
        rho_bar: f64,
        j: &L::Vect,
        theta_bar: f64,
        stats: &mut BlockStatistics,
    );

    /// Equilibrium of population `i`. Isothermal models ignore `theta_bar`.
    fn compute_equilibrium(&self, i: usize, rho_bar: f64, j: &L::Vect, j_sqr: f64, theta_bar: f64)
        -> f64;

    /// Relaxation frequency of the shear modes.
    fn omega(&self) -> f64;

    fn set_omega(&mut self, omega: f64);

    /// True if [`Dynamics::compute_velocity`] reports momentum over a fixed
    /// density instead of the local one.
    fn vel_is_j(&self) -> bool {
        false
    }

    /// False for cells that carry no fluid state (walls, switched-off cells).
    fn has_moments(&self) -> bool {
        true
    }

    fn compute_rho_bar_j(&self, cell: &Cell<L>) -> (f64, L::Vect) {
        moments::get_rho_bar_j(cell)
    }

    fn compute_density(&self, cell: &Cell<L>) -> f64 {
        full_rho(moments::get_rho_bar(cell))
    }

    fn compute_velocity(&self, cell: &Cell<L>) -> L::Vect {
        let (rho_bar, j) = self.compute_rho_bar_j(cell);
        moments::scaled(&j, inv_rho(rho_bar))
    }

    /// Downcast hook for the anechoic boundary manager.
    fn as_anechoic(&self) -> Option<&AnechoicMrtDynamics<L>> {
        None
    }

    fn as_anechoic_mut(&mut self) -> Option<&mut AnechoicMrtDynamics<L>> {
        None
    }
}

impl<L: Descriptor> Clone for Box<dyn Dynamics<L>> {
    fn clone(&self) -> Self {
        self.clone_dynamics()
    }
}

/// Single-relaxation-time (BGK) collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BgkDynamics {
    omega: f64,
}

impl BgkDynamics {
    /// BGK with relaxation frequency `omega`.
    pub fn new(omega: f64) -> Self {
        debug_assert!(omega > 0.0 && omega < 2.0, "omega = {omega}");
        Self { omega }
    }

    /// Checked version of [`BgkDynamics::new`].
    pub fn try_new(omega: f64) -> Result<Self> {
        check_omega(omega).map(Self::new)
    }

    #[inline]
    fn relax<L: Descriptor>(&self, cell: &mut Cell<L>, rho_bar: f64, j: &L::Vect, j_sqr: f64) {
        let inv_rho = inv_rho(rho_bar);
        for (i, f) in cell.populations_mut().as_mut().iter_mut().enumerate() {
            let feq = equilibrium::second_order::<L>(i, rho_bar, inv_rho, j, j_sqr);
            *f -= self.omega * (*f - feq);
        }
    }
}

impl<L: Descriptor> Dynamics<L> for BgkDynamics {
    fn kind(&self) -> DynamicsKind {
        DynamicsKind::Bgk
    }

    fn clone_dynamics(&self) -> Box<dyn Dynamics<L>> {
        Box::new(*self)
    }

    fn collide(&self, cell: &mut Cell<L>, stats: &mut BlockStatistics) {
        let (rho_bar, j) = moments::get_rho_bar_j(cell);
        let j_sqr = norm_sqr(j.as_ref());
        self.relax(cell, rho_bar, &j, j_sqr);
        let inv_rho = inv_rho(rho_bar);
        stats.gather(rho_bar, j_sqr * inv_rho * inv_rho);
    }

    fn collide_external(
        &self,
        cell: &mut Cell<L>,
        rho_bar: f64,
        j: &L::Vect,
        _theta_bar: f64,
        stats: &mut BlockStatistics,
    ) {
        let j_sqr = norm_sqr(j.as_ref());
        self.relax(cell, rho_bar, j, j_sqr);
        let inv_rho = inv_rho(rho_bar);
        stats.gather(rho_bar, j_sqr * inv_rho * inv_rho);
    }

    fn compute_equilibrium(
        &self,
        i: usize,
        rho_bar: f64,
        j: &L::Vect,
        j_sqr: f64,
        _theta_bar: f64,
    ) -> f64 {
        equilibrium::second_order::<L>(i, rho_bar, inv_rho(rho_bar), j, j_sqr)
    }

    fn omega(&self) -> f64 {
        self.omega
    }

    fn set_omega(&mut self, omega: f64) {
        self.omega = omega;
    }
}

/// Full-way bounce-back: every population is sent back where it came from.
///
/// The cell is a wall; it reports a fixed density and zero velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceBackDynamics {
    rho: f64,
}

impl BounceBackDynamics {
    /// Bounce-back reporting unit density.
    pub fn new() -> Self {
        Self { rho: 1.0 }
    }

    /// Bounce-back reporting `rho` as its density.
    pub fn with_density(rho: f64) -> Self {
        Self { rho }
    }
}

impl Default for BounceBackDynamics {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Descriptor> Dynamics<L> for BounceBackDynamics {
    fn kind(&self) -> DynamicsKind {
        DynamicsKind::BounceBack
    }

    fn clone_dynamics(&self) -> Box<dyn Dynamics<L>> {
        Box::new(*self)
    }

    fn collide(&self, cell: &mut Cell<L>, _stats: &mut BlockStatistics) {
        cell.revert();
    }

    fn collide_external(
        &self,
        cell: &mut Cell<L>,
        _rho_bar: f64,
        _j: &L::Vect,
        _theta_bar: f64,
        _stats: &mut BlockStatistics,
    ) {
        cell.revert();
    }

    fn compute_equilibrium(
        &self,
        _i: usize,
        _rho_bar: f64,
        _j: &L::Vect,
        _j_sqr: f64,
        _theta_bar: f64,
    ) -> f64 {
        0.0
    }

    fn omega(&self) -> f64 {
        0.0
    }

    fn set_omega(&mut self, _omega: f64) {}

    fn has_moments(&self) -> bool {
        false
    }

    fn compute_rho_bar_j(&self, _cell: &Cell<L>) -> (f64, L::Vect) {
        (moments::rho_bar(self.rho), L::Vect::default())
    }

    fn compute_density(&self, _cell: &Cell<L>) -> f64 {
        self.rho
    }

    fn compute_velocity(&self, _cell: &Cell<L>) -> L::Vect {
        L::Vect::default()
    }
}

/// Switched-off cell: populations are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoDynamics;

impl<L: Descriptor> Dynamics<L> for NoDynamics {
    fn kind(&self) -> DynamicsKind {
        DynamicsKind::NoDynamics
    }

    fn clone_dynamics(&self) -> Box<dyn Dynamics<L>> {
        Box::new(*self)
    }

    fn collide(&self, _cell: &mut Cell<L>, _stats: &mut BlockStatistics) {}

    fn collide_external(
        &self,
        _cell: &mut Cell<L>,
        _rho_bar: f64,
        _j: &L::Vect,
        _theta_bar: f64,
        _stats: &mut BlockStatistics,
    ) {
    }

    fn compute_equilibrium(
        &self,
        _i: usize,
        _rho_bar: f64,
        _j: &L::Vect,
        _j_sqr: f64,
        _theta_bar: f64,
    ) -> f64 {
        0.0
    }

    fn omega(&self) -> f64 {
        0.0
    }

    fn set_omega(&mut self, _omega: f64) {}

    fn has_moments(&self) -> bool {
        false
    }

    fn compute_rho_bar_j(&self, _cell: &Cell<L>) -> (f64, L::Vect) {
        (0.0, L::Vect::default())
    }

    fn compute_density(&self, _cell: &Cell<L>) -> f64 {
        1.0
    }

    fn compute_velocity(&self, _cell: &Cell<L>) -> L::Vect {
        L::Vect::default()
    }
}
