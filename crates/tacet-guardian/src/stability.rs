//! Run health checks between time steps.
//!
//! The collision loop never signals errors; blow-up is caught here, outside
//! the hot path, by looking at the statistics of the last collision pass
//! and at the conservation totals.

use tracing::{debug, warn};

use tacet_lbm::{C_S, Descriptor, Lattice};

use crate::conservation::{ConservationMonitor, ConservationState};
use crate::error::GuardianError;

/// Grade of a run based on an error relative to a tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityQuality {
    /// Error < 0.01 * tolerance
    Excellent,
    /// 0.01 * tolerance < error < 0.1 * tolerance
    Good,
    /// 0.1 * tolerance < error < tolerance
    Marginal,
    /// tolerance < error < 10 * tolerance
    Poor,
    /// error > 10 * tolerance, or not a number
    Critical,
}

impl StabilityQuality {
    pub fn assess(error: f64, tolerance: f64) -> Self {
        let ratio = error / tolerance;

        if ratio < 0.01 {
            Self::Excellent
        } else if ratio < 0.1 {
            Self::Good
        } else if ratio < 1.0 {
            Self::Marginal
        } else if ratio < 10.0 {
            Self::Poor
        } else {
            Self::Critical
        }
    }

    /// Excellent, Good or Marginal.
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Self::Excellent | Self::Good | Self::Marginal)
    }
}

/// Snapshot of a healthy run.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityReport {
    pub iteration: u64,
    pub average_density: f64,
    pub average_energy: f64,
    pub max_velocity: f64,
    pub conservation: ConservationMonitor,
}

impl StabilityReport {
    /// Mach number of the fastest cell.
    pub fn max_mach(&self) -> f64 {
        self.max_velocity / C_S
    }

    /// Grade of the mass drift against `tolerance`.
    pub fn quality(&self, tolerance: f64) -> StabilityQuality {
        StabilityQuality::assess(self.conservation.mass_error, tolerance)
    }
}

/// Checks a lattice against a baseline taken before the time loop.
#[derive(Debug, Clone)]
pub struct StabilityMonitor {
    baseline: ConservationState,
    /// Largest tolerated velocity, in lattice units.
    pub velocity_limit: f64,
    /// Largest tolerated relative mass drift; `None` for open domains.
    pub mass_tolerance: Option<f64>,
    /// Check every `interval` iterations.
    pub interval: u64,
}

impl StabilityMonitor {
    /// Monitor with a Mach 0.5 velocity limit and no mass check.
    pub fn new<L: Descriptor>(lattice: &Lattice<L>) -> Self {
        Self {
            baseline: ConservationState::new(lattice),
            velocity_limit: 0.5 * C_S,
            mass_tolerance: None,
            interval: 1,
        }
    }

    pub fn with_velocity_limit(mut self, limit: f64) -> Self {
        self.velocity_limit = limit;
        self
    }

    pub fn with_mass_tolerance(mut self, tolerance: f64) -> Self {
        self.mass_tolerance = Some(tolerance);
        self
    }

    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    pub fn baseline(&self) -> &ConservationState {
        &self.baseline
    }

    /// True if `iteration` is due for a check.
    pub fn is_due(&self, iteration: u64) -> bool {
        iteration % self.interval == 0
    }

    /// Inspect the current state of `lattice`.
    pub fn check<L: Descriptor>(
        &self,
        lattice: &Lattice<L>,
    ) -> Result<StabilityReport, GuardianError> {
        let iteration = lattice.iteration();
        let stats = lattice.statistics();

        if !stats.is_finite() || !lattice.is_finite() {
            warn!(iteration, "Non-finite populations");
            return Err(GuardianError::NonFinite { iteration });
        }

        let velocity = stats.max_velocity().max(lattice.max_velocity());
        if velocity > self.velocity_limit {
            warn!(iteration, velocity, limit = self.velocity_limit, "Velocity limit exceeded");
            return Err(GuardianError::VelocityLimit {
                iteration,
                velocity,
                limit: self.velocity_limit,
            });
        }

        let conservation = ConservationMonitor::check(&self.baseline, lattice);
        if let Some(tolerance) = self.mass_tolerance {
            if conservation.mass_error > tolerance {
                warn!(iteration, drift = conservation.mass_error, tolerance, "Mass drift");
                return Err(GuardianError::MassDrift {
                    iteration,
                    drift: conservation.mass_error,
                    tolerance,
                });
            }
        }

        let report = StabilityReport {
            iteration,
            average_density: stats.average_density(),
            average_energy: stats.average_energy(),
            max_velocity: velocity,
            conservation,
        };
        debug!(
            iteration,
            average_density = report.average_density,
            max_velocity = report.max_velocity,
            mass_error = report.conservation.mass_error,
            "Stability check"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacet_lbm::{D2Q9, MrtDynamics, Region};

    fn lattice() -> Lattice<D2Q9> {
        let mut lattice = Lattice::new_2d(16, 16, MrtDynamics::new(1.2));
        lattice
            .initialize_at_equilibrium(Region::new_2d(6, 9, 6, 9), 1.005, [0.01, 0.0])
            .unwrap();
        lattice.initialize();
        lattice
    }

    #[test]
    fn test_quality_grades() {
        assert_eq!(StabilityQuality::assess(1e-5, 1e-2), StabilityQuality::Excellent);
        assert_eq!(StabilityQuality::assess(5e-3, 1e-2), StabilityQuality::Marginal);
        assert_eq!(StabilityQuality::assess(5e-2, 1e-2), StabilityQuality::Poor);
        assert_eq!(StabilityQuality::assess(f64::NAN, 1e-2), StabilityQuality::Critical);
        assert!(!StabilityQuality::Poor.is_acceptable());
    }

    #[test]
    fn test_healthy_run_passes() {
        let mut lattice = lattice();
        let monitor = StabilityMonitor::new(&lattice).with_mass_tolerance(1e-12);
        for _ in 0..50 {
            lattice.collide_and_stream();
        }
        let report = monitor.check(&lattice).unwrap();
        assert_eq!(report.iteration, 50);
        assert!(report.max_mach() < 0.1);
        assert!(report.quality(1e-12).is_acceptable());
    }

    #[test]
    fn test_nan_is_caught() {
        let mut lattice = lattice();
        let monitor = StabilityMonitor::new(&lattice);
        lattice.cell_mut([3, 4, 0])[2] = f64::NAN;
        lattice.collide_and_stream();
        assert!(matches!(
            monitor.check(&lattice),
            Err(GuardianError::NonFinite { iteration: 1 })
        ));
    }

    #[test]
    fn test_velocity_limit() {
        let lattice = lattice();
        let monitor = StabilityMonitor::new(&lattice).with_velocity_limit(0.005);
        assert!(matches!(
            monitor.check(&lattice),
            Err(GuardianError::VelocityLimit { .. })
        ));
    }

    #[test]
    fn test_mass_drift() {
        let mut lattice = lattice();
        let monitor = StabilityMonitor::new(&lattice).with_mass_tolerance(1e-6);
        lattice.cell_mut([0, 0, 0])[0] += 0.01;
        let err = monitor.check(&lattice).unwrap_err();
        assert!(matches!(err, GuardianError::MassDrift { .. }));
        assert!(err.to_string().contains("mass drift"));
    }

    #[test]
    fn test_interval() {
        let monitor = StabilityMonitor::new(&lattice()).with_interval(10);
        assert!(monitor.is_due(0));
        assert!(!monitor.is_due(5));
        assert!(monitor.is_due(20));
    }
}
