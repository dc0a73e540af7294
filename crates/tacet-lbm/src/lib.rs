//! Lattice Boltzmann collision dynamics with anechoic (absorbing) boundaries.
//!
//! Implements D2Q9 (2D) and D3Q19 (3D) descriptors, the second-order
//! equilibrium, and a family of per-cell collision models: BGK, standard and
//! incompressible multi-relaxation-time (MRT), and an absorbing MRT variant
//! used to build non-reflecting buffer layers at the domain edges.
//!
//! Populations are stored as offsets from the rest state, `f_i - w_i`, so
//! the small acoustic perturbations this crate is meant for keep their
//! precision.
//!
//! # Example
//!
//! ```
//! use tacet_lbm::{AnechoicBoundary, Lattice2D, MrtDynamics, Region};
//!
//! // 64x64 box of fluid at rest, open on all sides
//! let mut lattice = Lattice2D::new_2d(64, 64, MrtDynamics::new(1.0));
//! lattice.toggle_all_periodic(false);
//! AnechoicBoundary::new(16, 1.0).apply(&mut lattice).unwrap();
//!
//! // Small density bump in the middle
//! lattice
//!     .initialize_at_equilibrium(Region::new_2d(31, 32, 31, 32), 1.001, [0.0, 0.0])
//!     .unwrap();
//! lattice.initialize();
//!
//! for _ in 0..100 {
//!     lattice.collide_and_stream();
//! }
//!
//! println!("Kinetic energy: {:.3e}", lattice.kinetic_energy());
//! ```

pub mod anechoic;
pub mod cell;
pub mod d2q9;
pub mod d3q19;
pub mod descriptor;
pub mod dynamics;
pub mod equilibrium;
pub mod error;
pub mod lattice;
pub mod moments;
pub mod mrt;
pub mod region;
pub mod statistics;
pub mod units;

pub use anechoic::{
    define_anechoic_edge, AbsorptionProfile, AnechoicBoundary, AnechoicEdge, Orientation,
};
pub use cell::Cell;
pub use d2q9::D2Q9;
pub use d3q19::D3Q19;
pub use descriptor::{Descriptor, LatticeArray, MomentBasis};
pub use dynamics::{BgkDynamics, BounceBackDynamics, Dynamics, DynamicsKind, NoDynamics};
pub use error::{LbmError, Result};
pub use lattice::Lattice;
pub use mrt::{AnechoicMrtDynamics, AnechoicTarget, IncMrtDynamics, MrtDynamics};
pub use region::Region;
pub use statistics::BlockStatistics;

/// 2D lattice on the D2Q9 velocity set.
pub type Lattice2D = Lattice<D2Q9>;

/// 3D lattice on the D3Q19 velocity set.
pub type Lattice3D = Lattice<D3Q19>;

/// Lattice sound speed: c_s = 1/sqrt(3)
pub const C_S: f64 = 0.577350269189626;

/// Lattice sound speed squared
pub const C_S_SQ: f64 = 1.0 / 3.0;
