//! tacet: lattice Boltzmann acoustics with non-reflecting boundaries.
//!
//! This is the umbrella crate that provides the [`Simulation`] driver and
//! re-exports core types from sub-crates.

use std::ops::ControlFlow;

use tracing::info;

pub use tacet_format::{self, FormatError, SimulationConfig, SimulationContext};
pub use tacet_guardian::{self, GuardianError, StabilityMonitor, StabilityReport};
pub use tacet_lbm::{
    self, AbsorptionProfile, AnechoicBoundary, AnechoicEdge, AnechoicMrtDynamics, AnechoicTarget,
    BgkDynamics, BounceBackDynamics, Cell, D2Q9, D3Q19, Descriptor, Dynamics, DynamicsKind,
    IncMrtDynamics, Lattice, Lattice2D, Lattice3D, LbmError, MrtDynamics, NoDynamics, Orientation,
    Region, define_anechoic_edge,
};

/// Time loop around a lattice: steps it, checks its health every
/// `monitor.interval` iterations and times the work.
pub struct Simulation<L: Descriptor> {
    lattice: Lattice<L>,
    monitor: StabilityMonitor,
    context: SimulationContext,
}

impl<L: Descriptor> Simulation<L> {
    /// Drive `lattice`, taking its current state as the monitoring baseline.
    pub fn new(lattice: Lattice<L>) -> Self {
        let monitor = StabilityMonitor::new(&lattice);
        Self {
            lattice,
            monitor,
            context: SimulationContext::new("output"),
        }
    }

    /// Build the lattice described by `config`.
    pub fn from_config(config: &SimulationConfig) -> tacet_format::Result<Self> {
        let lattice = config.build::<L>()?;
        let monitor = StabilityMonitor::new(&lattice).with_interval(config.run.output_interval);
        Ok(Self {
            lattice,
            monitor,
            context: SimulationContext::from_run_config(&config.run),
        })
    }

    pub fn with_monitor(mut self, monitor: StabilityMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_context(mut self, context: SimulationContext) -> Self {
        self.context = context;
        self
    }

    pub fn lattice(&self) -> &Lattice<L> {
        &self.lattice
    }

    pub fn lattice_mut(&mut self) -> &mut Lattice<L> {
        &mut self.lattice
    }

    pub fn monitor(&self) -> &StabilityMonitor {
        &self.monitor
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    /// Advance by one time step.
    pub fn step(&mut self) {
        self.context.start_timer("collide_and_stream");
        self.lattice.collide_and_stream();
        self.context.stop_timer("collide_and_stream");
    }

    /// Run `steps` time steps.
    ///
    /// `on_check` sees the lattice and the report of every health check and
    /// may stop the loop early. Returns the last report, or the first
    /// failure.
    pub fn run<F>(
        &mut self,
        steps: u64,
        mut on_check: F,
    ) -> Result<Option<StabilityReport>, GuardianError>
    where
        F: FnMut(&Lattice<L>, &StabilityReport) -> ControlFlow<()>,
    {
        info!(steps, start = self.lattice.iteration(), "Running");
        let mut last = None;
        for _ in 0..steps {
            self.step();
            if self.monitor.is_due(self.lattice.iteration()) {
                let report = self.monitor.check(&self.lattice)?;
                let flow = on_check(&self.lattice, &report);
                last = Some(report);
                if flow.is_break() {
                    info!(iteration = self.lattice.iteration(), "Stopped by caller");
                    break;
                }
            }
        }
        self.context.log_timers();
        Ok(last)
    }
}
