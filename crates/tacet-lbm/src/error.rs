//! Setup-time errors.
//!
//! The collision and streaming passes never fail; these errors come from
//! the checked constructors used while a lattice is being configured.

use thiserror::Error;

use crate::anechoic::Orientation;
use crate::region::Region;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LbmError {
    #[error("Relaxation frequency {0} outside the stable range (0, 2)")]
    InvalidOmega(f64),

    #[error("Absorption coefficient {0} outside [0, 1]")]
    InvalidDelta(f64),

    #[error("Reference density must be positive and finite, got {0}")]
    InvalidDensity(f64),

    #[error("Inverted region bounds: {0:?}")]
    InvertedRegion(Region),

    #[error("Region {region:?} does not fit inside {domain:?}")]
    RegionOutOfBounds { region: Region, domain: Region },

    #[error("Absorption profile exponent must be positive and finite, got {0}")]
    InvalidProfile(f64),

    #[error("Anechoic buffer of thickness {thickness} does not fit an extent of {extent}")]
    InvalidBuffer { thickness: usize, extent: usize },

    #[error("Orientation {orientation:?} does not exist on a {dim}D lattice")]
    UnsupportedOrientation { orientation: Orientation, dim: usize },

    #[error("Invalid lattice shape {shape:?} for {descriptor}")]
    InvalidShape {
        shape: [usize; 3],
        descriptor: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, LbmError>;
