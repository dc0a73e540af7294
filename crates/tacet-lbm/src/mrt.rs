//! Multi-relaxation-time collision models.
//!
//! The non-equilibrium part of the populations is projected onto the
//! orthogonal moment basis of the descriptor, every mode is relaxed at its
//! own rate, and the result is projected back:
//!
//! ```text
//! f <- f - M^-1 S M (f - f^eq)
//! ```
//!
//! Density and momentum rows have a zero rate and are never touched. The
//! shear rows relax at `omega`, which sets the viscosity; the remaining
//! rows use the fixed rates of the descriptor.

use crate::cell::Cell;
use crate::descriptor::{Descriptor, MomentBasis};
use crate::dynamics::{check_omega, Dynamics, DynamicsKind};
use crate::equilibrium;
use crate::error::{LbmError, Result};
use crate::moments::{self, inv_rho, norm_sqr};
use crate::statistics::BlockStatistics;

/// Standard MRT collision.
#[derive(Debug, Clone, Copy)]
pub struct MrtDynamics<L: Descriptor> {
    omega: f64,
    rates: L::Pops,
    basis: &'static MomentBasis,
}

impl<L: Descriptor> MrtDynamics<L> {
    /// MRT with shear rate `omega` and the descriptor's default rates for
    /// the other modes.
    pub fn new(omega: f64) -> Self {
        debug_assert!(omega > 0.0 && omega < 2.0, "omega = {omega}");
        let mut rates = L::Pops::default();
        rates.as_mut().copy_from_slice(L::MRT_RATES);
        let mut mrt = Self {
            omega,
            rates,
            basis: L::moment_basis(),
        };
        mrt.apply_shear_rate();
        mrt
    }

    /// Checked version of [`MrtDynamics::new`].
    pub fn try_new(omega: f64) -> Result<Self> {
        check_omega(omega).map(Self::new)
    }

    /// Override the rate of a non-conserved, non-shear mode.
    ///
    /// Conserved modes keep a zero rate and shear modes follow `omega`;
    /// requests for those rows are ignored.
    pub fn with_rate(mut self, k: usize, rate: f64) -> Self {
        if L::MRT_RATES[k] != 0.0 {
            self.rates[k] = rate;
        }
        self
    }

    /// Per-mode relaxation rates.
    pub fn rates(&self) -> &L::Pops {
        &self.rates
    }

    fn apply_shear_rate(&mut self) {
        for &k in L::SHEAR_MOMENTS {
            self.rates[k] = self.omega;
        }
    }

    /// Relax `cell` toward the equilibrium of (`rho_bar`, `j`).
    ///
    /// `inv_rho` divides the nonlinear equilibrium term.
    #[inline]
    pub(crate) fn relax(
        &self,
        cell: &mut Cell<L>,
        rho_bar: f64,
        inv_rho: f64,
        j: &L::Vect,
        j_sqr: f64,
    ) {
        let f = cell.populations_mut();
        let mut f_neq = *f;
        for (i, x) in f_neq.as_mut().iter_mut().enumerate() {
            *x -= equilibrium::second_order::<L>(i, rho_bar, inv_rho, j, j_sqr);
        }

        let mut m_neq = self.basis.to_moments(&f_neq);
        for (m, s) in m_neq.as_mut().iter_mut().zip(self.rates.as_ref()) {
            *m *= s;
        }
        let correction = self.basis.to_populations(&m_neq);

        for (x, dx) in f.as_mut().iter_mut().zip(correction.as_ref()) {
            *x -= dx;
        }
    }
}

impl<L: Descriptor> Dynamics<L> for MrtDynamics<L> {
    fn kind(&self) -> DynamicsKind {
        DynamicsKind::Mrt
    }

    fn clone_dynamics(&self) -> Box<dyn Dynamics<L>> {
        Box::new(*self)
    }

    fn collide(&self, cell: &mut Cell<L>, stats: &mut BlockStatistics) {
        let (rho_bar, j) = moments::get_rho_bar_j(cell);
        let j_sqr = norm_sqr(j.as_ref());
        let inv_rho = inv_rho(rho_bar);
        self.relax(cell, rho_bar, inv_rho, &j, j_sqr);
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
        let inv_rho = inv_rho(rho_bar);
        self.relax(cell, rho_bar, inv_rho, j, j_sqr);
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
        self.apply_shear_rate();
    }
}

/// Incompressible MRT.
///
/// The nonlinear equilibrium term is divided by the fixed reference density
/// `rho0` instead of the local one, and the reported velocity is `j / rho0`.
#[derive(Debug, Clone, Copy)]
pub struct IncMrtDynamics<L: Descriptor> {
    mrt: MrtDynamics<L>,
    rho0: f64,
}

impl<L: Descriptor> IncMrtDynamics<L> {
    /// Incompressible MRT around the unit reference density.
    pub fn new(omega: f64) -> Self {
        Self::with_reference_density(omega, 1.0)
    }

    /// Incompressible MRT around the reference density `rho0`.
    pub fn with_reference_density(omega: f64, rho0: f64) -> Self {
        debug_assert!(rho0 > 0.0, "rho0 = {rho0}");
        Self {
            mrt: MrtDynamics::new(omega),
            rho0,
        }
    }

    /// Checked version of [`IncMrtDynamics::with_reference_density`].
    pub fn try_new(omega: f64, rho0: f64) -> Result<Self> {
        check_omega(omega)?;
        if !(rho0.is_finite() && rho0 > 0.0) {
            return Err(LbmError::InvalidDensity(rho0));
        }
        Ok(Self::with_reference_density(omega, rho0))
    }

    /// Reference density `rho0`.
    pub fn reference_density(&self) -> f64 {
        self.rho0
    }

    /// Per-mode relaxation rates.
    pub fn rates(&self) -> &L::Pops {
        self.mrt.rates()
    }
}

impl<L: Descriptor> Dynamics<L> for IncMrtDynamics<L> {
    fn kind(&self) -> DynamicsKind {
        DynamicsKind::IncMrt
    }

    fn clone_dynamics(&self) -> Box<dyn Dynamics<L>> {
        Box::new(*self)
    }

    fn collide(&self, cell: &mut Cell<L>, stats: &mut BlockStatistics) {
        let (rho_bar, j) = moments::get_rho_bar_j(cell);
        let j_sqr = norm_sqr(j.as_ref());
        let inv_rho0 = 1.0 / self.rho0;
        self.mrt.relax(cell, rho_bar, inv_rho0, &j, j_sqr);
        stats.gather(rho_bar, j_sqr * inv_rho0 * inv_rho0);
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
        let inv_rho0 = 1.0 / self.rho0;
        self.mrt.relax(cell, rho_bar, inv_rho0, j, j_sqr);
        stats.gather(rho_bar, j_sqr * inv_rho0 * inv_rho0);
    }

    fn compute_equilibrium(
        &self,
        i: usize,
        rho_bar: f64,
        j: &L::Vect,
        j_sqr: f64,
        _theta_bar: f64,
    ) -> f64 {
        equilibrium::second_order::<L>(i, rho_bar, 1.0 / self.rho0, j, j_sqr)
    }

    fn omega(&self) -> f64 {
        self.mrt.omega
    }

    fn set_omega(&mut self, omega: f64) {
        self.mrt.set_omega(omega);
    }

    fn vel_is_j(&self) -> bool {
        true
    }

    fn compute_velocity(&self, cell: &Cell<L>) -> L::Vect {
        let j = moments::get_j(cell);
        let mut u = j;
        for u_a in u.as_mut() {
            *u_a /= self.rho0;
        }
        u
    }
}

/// Far-field state an absorbing cell is pulled toward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnechoicTarget<L: Descriptor> {
    pub rho_bar: f64,
    pub j: L::Vect,
}

impl<L: Descriptor> AnechoicTarget<L> {
    /// Target from a density offset and a momentum.
    pub fn new(rho_bar: f64, j: L::Vect) -> Self {
        Self { rho_bar, j }
    }

    /// Fluid at rest at the reference density.
    pub fn at_rest() -> Self {
        Self {
            rho_bar: 0.0,
            j: L::Vect::default(),
        }
    }

    /// Target for a fluid of density `rho` moving at velocity `u`.
    pub fn from_velocity(rho: f64, u: L::Vect) -> Self {
        Self {
            rho_bar: moments::rho_bar(rho),
            j: moments::scaled(&u, rho),
        }
    }

    /// Equilibrium populations of the target state.
    pub fn equilibrium(&self) -> L::Pops {
        equilibrium::populations::<L>(
            self.rho_bar,
            inv_rho(self.rho_bar),
            &self.j,
            norm_sqr(self.j.as_ref()),
        )
    }
}

impl<L: Descriptor> Default for AnechoicTarget<L> {
    fn default() -> Self {
        Self::at_rest()
    }
}

/// MRT collision blended toward a target equilibrium:
///
/// ```text
/// f <- (1 - delta) f_mrt + delta f^eq(target)
/// ```
///
/// `delta = 0` is plain MRT; `delta = 1` pins the cell to the target state.
#[derive(Debug, Clone, Copy)]
pub struct AnechoicMrtDynamics<L: Descriptor> {
    mrt: MrtDynamics<L>,
    delta: f64,
    target: AnechoicTarget<L>,
    target_eq: L::Pops,
}

impl<L: Descriptor> AnechoicMrtDynamics<L> {
    /// Absorbing MRT with coefficient `delta` toward `target`.
    pub fn new(omega: f64, delta: f64, target: AnechoicTarget<L>) -> Self {
        debug_assert!((0.0..=1.0).contains(&delta), "delta = {delta}");
        Self {
            mrt: MrtDynamics::new(omega),
            delta,
            target,
            target_eq: target.equilibrium(),
        }
    }

    /// Checked version of [`AnechoicMrtDynamics::new`].
    pub fn try_new(omega: f64, delta: f64, target: AnechoicTarget<L>) -> Result<Self> {
        check_omega(omega)?;
        check_delta(delta)?;
        Ok(Self::new(omega, delta, target))
    }

    /// Absorption coefficient.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Change the absorption coefficient.
    pub fn set_delta(&mut self, delta: f64) {
        debug_assert!((0.0..=1.0).contains(&delta), "delta = {delta}");
        self.delta = delta;
    }

    /// Far-field state.
    pub fn target(&self) -> &AnechoicTarget<L> {
        &self.target
    }

    /// Change the far-field state and refresh its equilibrium.
    pub fn set_target(&mut self, target: AnechoicTarget<L>) {
        self.target = target;
        self.target_eq = target.equilibrium();
    }

    /// Density offset of the target.
    pub fn rho_bar_target(&self) -> f64 {
        self.target.rho_bar
    }

    /// Change the target density offset.
    pub fn set_rho_bar_target(&mut self, rho_bar: f64) {
        self.set_target(AnechoicTarget::new(rho_bar, self.target.j));
    }

    /// Momentum of the target.
    pub fn j_target(&self) -> &L::Vect {
        &self.target.j
    }

    /// Change the target momentum.
    pub fn set_j_target(&mut self, j: L::Vect) {
        self.set_target(AnechoicTarget::new(self.target.rho_bar, j));
    }

    #[inline]
    fn blend(&self, cell: &mut Cell<L>) {
        let keep = 1.0 - self.delta;
        for (f, feq) in cell
            .populations_mut()
            .as_mut()
            .iter_mut()
            .zip(self.target_eq.as_ref())
        {
            *f = keep * *f + self.delta * feq;
        }
    }
}

/// Check that an absorption coefficient lies in [0, 1].
pub fn check_delta(delta: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&delta) {
        Ok(delta)
    } else {
        Err(LbmError::InvalidDelta(delta))
    }
}

impl<L: Descriptor> Dynamics<L> for AnechoicMrtDynamics<L> {
    fn kind(&self) -> DynamicsKind {
        DynamicsKind::AnechoicMrt
    }

    fn clone_dynamics(&self) -> Box<dyn Dynamics<L>> {
        Box::new(*self)
    }

    fn collide(&self, cell: &mut Cell<L>, stats: &mut BlockStatistics) {
        self.mrt.collide(cell, stats);
        self.blend(cell);
    }

    fn collide_external(
        &self,
        cell: &mut Cell<L>,
        rho_bar: f64,
        j: &L::Vect,
        theta_bar: f64,
        stats: &mut BlockStatistics,
    ) {
        self.mrt.collide_external(cell, rho_bar, j, theta_bar, stats);
        self.blend(cell);
    }

    fn compute_equilibrium(
        &self,
        i: usize,
        rho_bar: f64,
        j: &L::Vect,
        j_sqr: f64,
        theta_bar: f64,
    ) -> f64 {
        self.mrt.compute_equilibrium(i, rho_bar, j, j_sqr, theta_bar)
    }

    fn omega(&self) -> f64 {
        self.mrt.omega
    }

    fn set_omega(&mut self, omega: f64) {
        self.mrt.set_omega(omega);
    }

    fn as_anechoic(&self) -> Option<&AnechoicMrtDynamics<L>> {
        Some(self)
    }

    fn as_anechoic_mut(&mut self) -> Option<&mut AnechoicMrtDynamics<L>> {
        Some(self)
    }
}
