//! Stability and conservation monitoring for lattice simulations.
//!
//! This crate provides:
//! - Conservation tracking (total mass and momentum against a baseline)
//! - Blow-up detection (non-finite populations, velocities beyond the
//!   low-Mach range)
//! - A quality grade of the run relative to a tolerance

pub mod conservation;
pub mod error;
pub mod stability;

pub use conservation::{ConservationMonitor, ConservationState};
pub use error::GuardianError;
pub use stability::{StabilityMonitor, StabilityQuality, StabilityReport};
