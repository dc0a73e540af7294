//! Absorbing (anechoic) buffer layers.
//!
//! A buffer of `thickness` cells along a face of the domain gets
//! [`AnechoicMrtDynamics`] with an absorption coefficient that grows from
//! the inner edge of the buffer toward the face:
//!
//! ```text
//! delta(k) = delta_max * profile((thickness - k) / thickness),  k < thickness
//! ```
//!
//! where `k` is the distance of the cell from the face (0 on the face). The
//! first buffer cell next to the bulk therefore already absorbs a little,
//! and the outermost layer absorbs `delta_max`.
//!
//! Where buffers overlap (corners, edges in 3D), the larger coefficient
//! wins. Every buffer cell owns its own dynamics instance.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::descriptor::Descriptor;
use crate::dynamics::{check_omega, Dynamics};
use crate::error::{LbmError, Result};
use crate::lattice::Lattice;
use crate::mrt::{check_delta, AnechoicMrtDynamics, AnechoicTarget};
use crate::region::Region;

/// Face of a box, named by its outward normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// -x
    West,
    /// +x
    East,
    /// -y
    South,
    /// +y
    North,
    /// -z
    Back,
    /// +z
    Front,
}

impl Orientation {
    pub const ALL_2D: [Orientation; 4] = [Self::West, Self::East, Self::South, Self::North];
    pub const ALL_3D: [Orientation; 6] = [
        Self::West,
        Self::East,
        Self::South,
        Self::North,
        Self::Back,
        Self::Front,
    ];

    /// Normal axis.
    pub const fn axis(self) -> usize {
        match self {
            Self::West | Self::East => 0,
            Self::South | Self::North => 1,
            Self::Back | Self::Front => 2,
        }
    }

    /// True for the face at the maximum coordinate.
    pub const fn is_upper(self) -> bool {
        matches!(self, Self::East | Self::North | Self::Front)
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::West => Self::East,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::North => Self::South,
            Self::Back => Self::Front,
            Self::Front => Self::Back,
        }
    }

    /// All faces of a `dim`-dimensional box.
    pub fn all(dim: usize) -> &'static [Orientation] {
        if dim == 2 {
            &Self::ALL_2D
        } else {
            &Self::ALL_3D
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::West => "west",
            Self::East => "east",
            Self::South => "south",
            Self::North => "north",
            Self::Back => "back",
            Self::Front => "front",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of the absorption ramp across the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AbsorptionProfile {
    #[default]
    Linear,
    /// `s^p`; `p > 1` keeps the inner part of the buffer gentler.
    Power(f64),
}

impl AbsorptionProfile {
    /// Absorption coefficient at distance `depth` from the face of a buffer
    /// of `thickness` cells. Zero outside the buffer.
    pub fn delta(&self, depth: usize, thickness: usize, delta_max: f64) -> f64 {
        if depth >= thickness {
            return 0.0;
        }
        let s = (thickness - depth) as f64 / thickness as f64;
        let shape = match *self {
            Self::Linear => s,
            Self::Power(p) => s.powf(p),
        };
        delta_max * shape
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Linear => Ok(()),
            Self::Power(p) if p.is_finite() && p > 0.0 => Ok(()),
            Self::Power(p) => Err(LbmError::InvalidProfile(p)),
        }
    }
}

/// Absorbing buffer along one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnechoicEdge<L: Descriptor> {
    pub orientation: Orientation,
    pub thickness: usize,
    pub omega: f64,
    pub target: AnechoicTarget<L>,
    pub profile: AbsorptionProfile,
    pub delta_max: f64,
    /// Box whose face carries the buffer; the whole lattice if `None`.
    pub within: Option<Region>,
    /// `(start, length)` restriction on the tangential axes.
    pub span: Option<(usize, usize)>,
}

impl<L: Descriptor> AnechoicEdge<L> {
    /// Linear buffer absorbing toward fluid at rest, full strength on the face.
    pub fn new(orientation: Orientation, thickness: usize, omega: f64) -> Self {
        Self {
            orientation,
            thickness,
            omega,
            target: AnechoicTarget::at_rest(),
            profile: AbsorptionProfile::Linear,
            delta_max: 1.0,
            within: None,
            span: None,
        }
    }

    pub fn with_target(mut self, target: AnechoicTarget<L>) -> Self {
        self.target = target;
        self
    }

    pub fn with_profile(mut self, profile: AbsorptionProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_delta_max(mut self, delta_max: f64) -> Self {
        self.delta_max = delta_max;
        self
    }

    /// Put the buffer on the face of `region` instead of the lattice.
    pub fn within(mut self, region: Region) -> Self {
        self.within = Some(region);
        self
    }

    /// Restrict the buffer to `length` cells from `start` on every
    /// tangential axis.
    pub fn along(mut self, start: usize, length: usize) -> Self {
        self.span = Some((start, length));
        self
    }

    /// Check the parameters against `domain` and return the enclosing box
    /// and the buffer slab.
    pub fn validate(&self, domain: &Region, dim: usize) -> Result<(Region, Region)> {
        check_omega(self.omega)?;
        check_delta(self.delta_max)?;
        self.profile.validate()?;

        let axis = self.orientation.axis();
        if axis >= dim {
            return Err(LbmError::UnsupportedOrientation {
                orientation: self.orientation,
                dim,
            });
        }

        let outer = self.within.unwrap_or(*domain).checked_within(domain)?;
        let extent = outer.extent(axis);
        if self.thickness == 0 || self.thickness > extent {
            return Err(LbmError::InvalidBuffer {
                thickness: self.thickness,
                extent,
            });
        }

        let mut slab = outer;
        if self.orientation.is_upper() {
            slab.min[axis] = outer.max[axis] + 1 - self.thickness;
        } else {
            slab.max[axis] = outer.min[axis] + self.thickness - 1;
        }

        if let Some((start, length)) = self.span {
            if length == 0 {
                let empty = Region::new([start; 3], [start.saturating_sub(1); 3]);
                return Err(LbmError::InvertedRegion(empty));
            }
            let Some(last) = start.checked_add(length - 1) else {
                return Err(LbmError::RegionOutOfBounds {
                    region: Region::new([start; 3], [usize::MAX; 3]),
                    domain: outer,
                });
            };
            let span = Region::new([start; 3], [last; 3]);
            for t in (0..dim).filter(|&t| t != axis) {
                slab.min[t] = slab.min[t].max(span.min[t]);
                slab.max[t] = slab.max[t].min(span.max[t]);
            }
            if !slab.is_ordered() {
                return Err(LbmError::RegionOutOfBounds {
                    region: span,
                    domain: outer,
                });
            }
        }

        Ok((outer, slab))
    }

    /// Distance of `pos` from the face of `outer`.
    fn depth(&self, outer: &Region, pos: [usize; 3]) -> usize {
        let axis = self.orientation.axis();
        if self.orientation.is_upper() {
            outer.max[axis] - pos[axis]
        } else {
            pos[axis] - outer.min[axis]
        }
    }
}

/// Install an absorbing buffer along one face.
///
/// Cells that already carry a stronger absorption keep it. Returns the
/// number of cells in the buffer.
pub fn define_anechoic_edge<L: Descriptor>(
    lattice: &mut Lattice<L>,
    edge: &AnechoicEdge<L>,
) -> Result<usize> {
    let (outer, slab) = edge.validate(&lattice.bounding_box(), L::D)?;

    for pos in slab.iter() {
        let depth = edge.depth(&outer, pos);
        let graded = edge.profile.delta(depth, edge.thickness, edge.delta_max);
        let stronger = match lattice.anechoic(pos) {
            Some(existing) if existing.delta() >= graded => {
                Some((existing.omega(), existing.delta(), *existing.target()))
            }
            _ => None,
        };
        let (omega, delta, target) = stronger.unwrap_or((edge.omega, graded, edge.target));
        let dynamics = AnechoicMrtDynamics::new(omega, delta, target);
        lattice.attach_dynamics(pos, Arc::new(dynamics));
    }

    let count = slab.volume();
    debug!(
        orientation = %edge.orientation,
        thickness = edge.thickness,
        ?slab,
        count,
        "Defined anechoic edge"
    );
    Ok(count)
}

/// Absorbing buffers on several faces of a box, one target per face.
#[derive(Debug, Clone)]
pub struct AnechoicBoundary<L: Descriptor> {
    thickness: usize,
    omega: f64,
    profile: AbsorptionProfile,
    delta_max: f64,
    within: Option<Region>,
    sides: Vec<(Orientation, AnechoicTarget<L>)>,
}

impl<L: Descriptor> AnechoicBoundary<L> {
    /// Buffers on every face of the lattice, absorbing toward rest.
    pub fn new(thickness: usize, omega: f64) -> Self {
        let sides = Orientation::all(L::D)
            .iter()
            .map(|&o| (o, AnechoicTarget::at_rest()))
            .collect();
        Self {
            thickness,
            omega,
            profile: AbsorptionProfile::Linear,
            delta_max: 1.0,
            within: None,
            sides,
        }
    }

    /// Only the given faces.
    pub fn sides(mut self, sides: &[Orientation]) -> Self {
        self.sides = sides.iter().map(|&o| (o, AnechoicTarget::at_rest())).collect();
        self
    }

    /// Same target on every face.
    pub fn with_target(mut self, target: AnechoicTarget<L>) -> Self {
        for side in &mut self.sides {
            side.1 = target;
        }
        self
    }

    /// Target for one face, adding the face if missing.
    pub fn with_side_target(mut self, orientation: Orientation, target: AnechoicTarget<L>) -> Self {
        match self.sides.iter_mut().find(|(o, _)| *o == orientation) {
            Some(side) => side.1 = target,
            None => self.sides.push((orientation, target)),
        }
        self
    }

    pub fn with_profile(mut self, profile: AbsorptionProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_delta_max(mut self, delta_max: f64) -> Self {
        self.delta_max = delta_max;
        self
    }

    pub fn within(mut self, region: Region) -> Self {
        self.within = Some(region);
        self
    }

    /// One edge description per face.
    pub fn edges(&self) -> impl Iterator<Item = AnechoicEdge<L>> + '_ {
        self.sides.iter().map(|&(orientation, target)| AnechoicEdge {
            orientation,
            thickness: self.thickness,
            omega: self.omega,
            target,
            profile: self.profile,
            delta_max: self.delta_max,
            within: self.within,
            span: None,
        })
    }

    /// Install all buffers. Returns the number of distinct absorbing cells.
    ///
    /// Every face is validated before the lattice is touched.
    pub fn apply(&self, lattice: &mut Lattice<L>) -> Result<usize> {
        let domain = lattice.bounding_box();
        for edge in self.edges() {
            edge.validate(&domain, L::D)?;
        }
        for edge in self.edges() {
            define_anechoic_edge(lattice, &edge)?;
        }

        let outer = self.within.unwrap_or(domain);
        let count = outer.iter().filter(|&pos| lattice.anechoic(pos).is_some()).count();
        info!(
            sides = self.sides.len(),
            thickness = self.thickness,
            count,
            "Anechoic boundary installed"
        );
        Ok(count)
    }
}
