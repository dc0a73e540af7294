//! JSON simulation setup and run context for tacet.
//!
//! A setup file describes the lattice (descriptor, shape, periodicity), the
//! bulk collision model and its relaxation, the initial state, bounce-back
//! obstacles and the anechoic buffers. [`SimulationConfig::build_2d`] and
//! [`SimulationConfig::build_3d`] turn it into a ready lattice.

pub mod config;
pub mod context;
pub mod error;

pub use config::{
    AnechoicConfig, BulkModel, DescriptorName, InitialConfig, InitialRegion, LatticeConfig,
    ProfileSpec, Relaxation, RegionSpec, RunConfig, Side, SimulationConfig,
};
pub use context::SimulationContext;
pub use error::{FormatError, Result};
