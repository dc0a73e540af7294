//! Simulation setup file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use tacet_lbm::dynamics::check_omega;
use tacet_lbm::mrt::check_delta;
use tacet_lbm::{
    AbsorptionProfile, AnechoicBoundary, AnechoicTarget, BgkDynamics, BounceBackDynamics, D2Q9,
    D3Q19, Descriptor, IncMrtDynamics, Lattice, LbmError, MrtDynamics, Orientation, Region,
    units,
};

use crate::error::{FormatError, Result};

/// Top-level setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Run name, used in logs.
    #[serde(default)]
    pub name: String,
    pub lattice: LatticeConfig,
    pub relaxation: Relaxation,
    #[serde(default)]
    pub bulk: BulkModel,
    #[serde(default)]
    pub initial: InitialConfig,
    /// Bounce-back boxes.
    #[serde(default)]
    pub obstacles: Vec<RegionSpec>,
    #[serde(default)]
    pub anechoic: Option<AnechoicConfig>,
    #[serde(default)]
    pub run: RunConfig,
}

/// Velocity set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorName {
    D2Q9,
    D3Q19,
}

impl DescriptorName {
    pub fn dimension(self) -> usize {
        match self {
            Self::D2Q9 => 2,
            Self::D3Q19 => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::D2Q9 => D2Q9::NAME,
            Self::D3Q19 => D3Q19::NAME,
        }
    }
}

/// Lattice geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    pub descriptor: DescriptorName,
    /// `[nx, ny]` or `[nx, ny, nz]`.
    pub shape: Vec<usize>,
    /// Periodicity per axis; all periodic if absent.
    #[serde(default)]
    pub periodic: Option<Vec<bool>>,
}

/// How the shear relaxation frequency is given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relaxation {
    /// Relaxation frequency directly.
    Omega(f64),
    /// Kinematic viscosity in lattice units.
    Viscosity(f64),
    /// Flow at Mach `mach` and Reynolds `reynolds` around an object of
    /// `length` cells.
    Reynolds {
        mach: f64,
        reynolds: f64,
        length: f64,
    },
}

impl Relaxation {
    /// Relaxation frequency.
    pub fn omega(&self) -> Result<f64> {
        let omega = match *self {
            Self::Omega(omega) => omega,
            Self::Viscosity(nu) => {
                if !(nu > 0.0) {
                    return Err(FormatError::InvalidParameter(format!(
                        "viscosity must be positive, got {nu}"
                    )));
                }
                units::omega_from_viscosity(nu)
            }
            Self::Reynolds {
                mach,
                reynolds,
                length,
            } => {
                if !(mach > 0.0 && reynolds > 0.0 && length > 0.0) {
                    return Err(FormatError::InvalidParameter(format!(
                        "mach, reynolds and length must be positive: {mach}, {reynolds}, {length}"
                    )));
                }
                units::omega_from_reynolds(mach, reynolds, length)
            }
        };
        Ok(check_omega(omega)?)
    }
}

/// Collision model of the bulk fluid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum BulkModel {
    #[default]
    Mrt,
    IncMrt {
        #[serde(default = "default_one")]
        rho0: f64,
    },
    Bgk,
}

/// Axis-aligned box, inclusive, with 2 or 3 coordinates per corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub min: Vec<usize>,
    pub max: Vec<usize>,
}

impl RegionSpec {
    pub fn to_region(&self, dim: usize) -> Result<Region> {
        Ok(Region::new(pad(&self.min, dim, "region min")?, pad(&self.max, dim, "region max")?))
    }
}

/// Initial state: uniform equilibrium plus optional boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialConfig {
    #[serde(default = "default_one")]
    pub rho: f64,
    /// Empty for fluid at rest.
    #[serde(default)]
    pub velocity: Vec<f64>,
    #[serde(default)]
    pub regions: Vec<InitialRegion>,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            rho: 1.0,
            velocity: Vec::new(),
            regions: Vec::new(),
        }
    }
}

/// Box set to equilibrium at its own density and velocity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialRegion {
    pub region: RegionSpec,
    pub rho: f64,
    #[serde(default)]
    pub velocity: Vec<f64>,
}

/// Face name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    West,
    East,
    South,
    North,
    Back,
    Front,
}

impl From<Side> for Orientation {
    fn from(side: Side) -> Self {
        match side {
            Side::West => Orientation::West,
            Side::East => Orientation::East,
            Side::South => Orientation::South,
            Side::North => Orientation::North,
            Side::Back => Orientation::Back,
            Side::Front => Orientation::Front,
        }
    }
}

/// Absorption ramp.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileSpec {
    #[default]
    Linear,
    Power {
        exponent: f64,
    },
}

impl From<ProfileSpec> for AbsorptionProfile {
    fn from(spec: ProfileSpec) -> Self {
        match spec {
            ProfileSpec::Linear => AbsorptionProfile::Linear,
            ProfileSpec::Power { exponent } => AbsorptionProfile::Power(exponent),
        }
    }
}

/// Absorbing buffers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnechoicConfig {
    pub thickness: usize,
    /// Relaxation of the buffer cells; the bulk value if absent.
    #[serde(default)]
    pub omega: Option<f64>,
    #[serde(default)]
    pub profile: ProfileSpec,
    #[serde(default = "default_one")]
    pub delta_max: f64,
    /// Faces to cover; all faces if absent.
    #[serde(default)]
    pub sides: Option<Vec<Side>>,
    #[serde(default = "default_one")]
    pub target_rho: f64,
    #[serde(default)]
    pub target_velocity: Vec<f64>,
    /// Box whose faces carry the buffers; the whole lattice if absent.
    #[serde(default)]
    pub within: Option<RegionSpec>,
}

/// Time loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub steps: u64,
    #[serde(default = "default_output_interval")]
    pub output_interval: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 0,
            output_interval: default_output_interval(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_one() -> f64 {
    1.0
}

fn default_output_interval() -> u64 {
    100
}

fn default_output_dir() -> String {
    "output".to_string()
}

/// Pad a 2- or 3-component coordinate to three, rejecting other lengths.
fn pad(coords: &[usize], dim: usize, what: &str) -> Result<[usize; 3]> {
    match coords {
        [x, y] if dim == 2 => Ok([*x, *y, 0]),
        [x, y, 0] if dim == 2 => Ok([*x, *y, 0]),
        [x, y, z] if dim == 3 => Ok([*x, *y, *z]),
        _ => Err(FormatError::InvalidParameter(format!(
            "{what} needs {dim} coordinates, got {coords:?}"
        ))),
    }
}

/// Vector of `L::D` components; empty means zero.
fn vect<L: Descriptor>(v: &[f64], what: &str) -> Result<L::Vect> {
    let mut out = L::Vect::default();
    if v.is_empty() {
        return Ok(out);
    }
    if v.len() != L::D || v.iter().any(|x| !x.is_finite()) {
        return Err(FormatError::InvalidParameter(format!(
            "{what} needs {} finite components, got {v:?}",
            L::D
        )));
    }
    out.as_mut().copy_from_slice(v);
    Ok(out)
}

impl SimulationConfig {
    /// Parse a setup from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a setup file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Spatial dimension of the descriptor.
    pub fn dimension(&self) -> usize {
        self.lattice.descriptor.dimension()
    }

    /// Lattice shape with `nz = 1` for 2D.
    pub fn shape(&self) -> Result<[usize; 3]> {
        let dim = self.dimension();
        let shape = match self.lattice.shape.as_slice() {
            [nx, ny] if dim == 2 => [*nx, *ny, 1],
            [nx, ny, 1] if dim == 2 => [*nx, *ny, 1],
            [nx, ny, nz] if dim == 3 => [*nx, *ny, *nz],
            other => {
                return Err(FormatError::InvalidParameter(format!(
                    "shape {other:?} does not match {}",
                    self.lattice.descriptor.name()
                )));
            }
        };
        if shape.contains(&0) {
            return Err(LbmError::InvalidShape {
                shape,
                descriptor: self.lattice.descriptor.name(),
            }
            .into());
        }
        Ok(shape)
    }

    /// Shear relaxation frequency of the bulk.
    pub fn omega(&self) -> Result<f64> {
        self.relaxation.omega()
    }

    /// Check every parameter without building anything.
    pub fn validate(&self) -> Result<()> {
        match self.lattice.descriptor {
            DescriptorName::D2Q9 => self.validate_for::<D2Q9>(),
            DescriptorName::D3Q19 => self.validate_for::<D3Q19>(),
        }
    }

    fn validate_for<L: Descriptor>(&self) -> Result<()> {
        let shape = self.shape()?;
        let domain = Region::from_shape(shape);
        let omega = self.omega()?;

        if let Some(periodic) = &self.lattice.periodic {
            if periodic.len() != L::D {
                return Err(FormatError::InvalidParameter(format!(
                    "periodic needs {} flags, got {}",
                    L::D,
                    periodic.len()
                )));
            }
        }

        if let BulkModel::IncMrt { rho0 } = self.bulk {
            if !(rho0.is_finite() && rho0 > 0.0) {
                return Err(LbmError::InvalidDensity(rho0).into());
            }
        }

        check_density(self.initial.rho)?;
        vect::<L>(&self.initial.velocity, "initial velocity")?;
        for region in &self.initial.regions {
            region.region.to_region(L::D)?.checked_within(&domain)?;
            check_density(region.rho)?;
            vect::<L>(&region.velocity, "region velocity")?;
        }

        for obstacle in &self.obstacles {
            obstacle.to_region(L::D)?.checked_within(&domain)?;
        }

        if let Some(anechoic) = &self.anechoic {
            let boundary = self.anechoic_boundary::<L>(anechoic, omega)?;
            for edge in boundary.edges() {
                edge.validate(&domain, L::D)?;
            }
        }

        Ok(())
    }

    fn anechoic_boundary<L: Descriptor>(
        &self,
        config: &AnechoicConfig,
        bulk_omega: f64,
    ) -> Result<AnechoicBoundary<L>> {
        let omega = check_omega(config.omega.unwrap_or(bulk_omega))?;
        check_delta(config.delta_max)?;
        check_density(config.target_rho)?;
        let u = vect::<L>(&config.target_velocity, "anechoic target velocity")?;

        let mut boundary = AnechoicBoundary::<L>::new(config.thickness, omega)
            .with_profile(config.profile.into())
            .with_delta_max(config.delta_max);
        if let Some(sides) = &config.sides {
            let sides: Vec<Orientation> = sides.iter().map(|&s| s.into()).collect();
            boundary = boundary.sides(&sides);
        }
        if let Some(within) = &config.within {
            boundary = boundary.within(within.to_region(L::D)?);
        }
        Ok(boundary.with_target(AnechoicTarget::from_velocity(config.target_rho, u)))
    }

    /// Build a D2Q9 lattice.
    pub fn build_2d(&self) -> Result<Lattice<D2Q9>> {
        self.build()
    }

    /// Build a D3Q19 lattice.
    pub fn build_3d(&self) -> Result<Lattice<D3Q19>> {
        self.build()
    }

    /// Build a lattice for descriptor `L`, which must match the setup.
    pub fn build<L: Descriptor>(&self) -> Result<Lattice<L>> {
        if self.lattice.descriptor.name() != L::NAME {
            return Err(FormatError::UnsupportedDescriptor(format!(
                "setup is {}, requested {}",
                self.lattice.descriptor.name(),
                L::NAME
            )));
        }
        self.validate_for::<L>()?;

        let shape = self.shape()?;
        let omega = self.omega()?;
        info!(
            name = %self.name,
            descriptor = L::NAME,
            omega,
            bulk = ?self.bulk,
            "Building lattice from setup"
        );

        let mut lattice = match self.bulk {
            BulkModel::Mrt => Lattice::try_new(shape, MrtDynamics::<L>::try_new(omega)?)?,
            BulkModel::IncMrt { rho0 } => {
                Lattice::try_new(shape, IncMrtDynamics::<L>::try_new(omega, rho0)?)?
            }
            BulkModel::Bgk => Lattice::try_new(shape, BgkDynamics::try_new(omega)?)?,
        };

        if let Some(periodic) = &self.lattice.periodic {
            for (axis, &p) in periodic.iter().enumerate() {
                lattice.set_periodic(axis, p);
            }
        }

        if let Some(anechoic) = &self.anechoic {
            self.anechoic_boundary::<L>(anechoic, omega)?.apply(&mut lattice)?;
        }

        for obstacle in &self.obstacles {
            lattice.define_dynamics(obstacle.to_region(L::D)?, BounceBackDynamics::new());
        }

        let bbox = lattice.bounding_box();
        let u = vect::<L>(&self.initial.velocity, "initial velocity")?;
        lattice.initialize_at_equilibrium(bbox, self.initial.rho, u)?;
        for region in &self.initial.regions {
            let u = vect::<L>(&region.velocity, "region velocity")?;
            lattice.initialize_at_equilibrium(region.region.to_region(L::D)?, region.rho, u)?;
        }

        lattice.initialize();
        Ok(lattice)
    }
}

fn check_density(rho: f64) -> Result<()> {
    if rho.is_finite() && rho > 0.0 {
        Ok(())
    } else {
        Err(LbmError::InvalidDensity(rho).into())
    }
}
