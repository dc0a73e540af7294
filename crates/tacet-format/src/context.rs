//! Per-run context: where output goes and how long things take.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::RunConfig;
use crate::error::Result;

/// Accumulating stopwatch.
#[derive(Debug, Clone, Default)]
struct Timer {
    started: Option<Instant>,
    total: Duration,
    laps: u32,
}

/// Output directory and named timers of one simulation run.
///
/// Passed explicitly to whatever needs it; there is no process-wide
/// instance.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    output_dir: PathBuf,
    timers: BTreeMap<String, Timer>,
}

impl SimulationContext {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            timers: BTreeMap::new(),
        }
    }

    /// Context writing to the output directory of `run`.
    pub fn from_run_config(run: &RunConfig) -> Self {
        Self::new(&run.output_dir)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of `file_name` inside the output directory.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Create the output directory and its parents.
    pub fn create_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        info!(dir = %self.output_dir.display(), "Output directory ready");
        Ok(())
    }

    /// Start (or restart) timer `name`.
    pub fn start_timer(&mut self, name: &str) {
        self.timers.entry(name.to_string()).or_default().started = Some(Instant::now());
    }

    /// Stop timer `name` and return the length of this lap.
    pub fn stop_timer(&mut self, name: &str) -> Option<Duration> {
        let timer = self.timers.get_mut(name)?;
        let lap = timer.started.take()?.elapsed();
        timer.total += lap;
        timer.laps += 1;
        Some(lap)
    }

    /// Total time on `name`, including a running lap.
    pub fn elapsed(&self, name: &str) -> Option<Duration> {
        let timer = self.timers.get(name)?;
        let running = timer.started.map(|t| t.elapsed()).unwrap_or_default();
        Some(timer.total + running)
    }

    /// Number of completed laps on `name`.
    pub fn laps(&self, name: &str) -> u32 {
        self.timers.get(name).map_or(0, |t| t.laps)
    }

    pub fn timer_names(&self) -> impl Iterator<Item = &str> {
        self.timers.keys().map(String::as_str)
    }

    /// Log the total of every timer.
    pub fn log_timers(&self) {
        for (name, timer) in &self.timers {
            debug!(timer = %name, seconds = timer.total.as_secs_f64(), laps = timer.laps, "Timer");
        }
    }
}
