use crate::error::ConfigError;
use crate::geometry::Aabb;
use crate::interpolation::InterpolationKernel;
use crate::julia::JuliaParameters;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Explicit field bounds replacing the ones stored with the distance field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldBoundsOverride {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl FieldBoundsOverride {
    /// The unit cube centred on the origin.
    pub fn unit() -> Self {
        Self {
            min: [-0.5; 3],
            max: [0.5; 3],
        }
    }

    pub fn to_aabb(&self) -> Result<Aabb, ConfigError> {
        Ok(Aabb::new(Point3::from(self.min), Point3::from(self.max))?)
    }
}

/// Parameters of one generation run. Every field has a default so partial
/// TOML files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParameters {
    pub versor_octaves: usize,
    pub versor_scale: f64,
    /// Output samples per axis.
    pub resolution: usize,
    pub alpha: f64,
    pub beta: f64,
    /// Outer Julia set, the one whose surface is extracted.
    pub julia: JuliaParameters,
    /// Inner set deciding where portals place copies of the shape.
    pub mask_julia: JuliaParameters,
    /// Let the outer Julia orbit pass through the portals at every step.
    pub recursive_portals: bool,
    pub kernel: InterpolationKernel,
    pub noise_seed: u32,
    /// Added to the max corner of the field bounds to form the simulation bounds.
    pub bounds_padding: f64,
    pub field_bounds: Option<FieldBoundsOverride>,
    /// Prefill the voxel cache on the rayon pool before marching.
    pub parallel: bool,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            versor_octaves: 4,
            versor_scale: 1.0,
            resolution: 128,
            alpha: 1.0,
            beta: 0.0,
            julia: JuliaParameters::default(),
            mask_julia: JuliaParameters {
                max_iterations: 4,
                escape_radius: 10.0,
            },
            recursive_portals: false,
            kernel: InterpolationKernel::Linear,
            noise_seed: 0,
            bounds_padding: 0.25,
            field_bounds: None,
            parallel: false,
        }
    }
}

impl RunParameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution < 2 {
            return Err(ConfigError::OutOfRange {
                key: "resolution",
                reason: format!("need at least 2 samples per axis, got {}", self.resolution),
            });
        }
        // Edge keys in the extractor span three slots per voxel.
        if self
            .resolution
            .checked_pow(3)
            .and_then(|voxels| voxels.checked_mul(3))
            .is_none()
        {
            return Err(ConfigError::OutOfRange {
                key: "resolution",
                reason: format!("{}^3 voxels do not fit in memory indices", self.resolution),
            });
        }
        for (key, value) in [
            ("versor_scale", self.versor_scale),
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("bounds_padding", self.bounds_padding),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { key, value });
            }
        }
        if self.bounds_padding < 0.0 {
            return Err(ConfigError::OutOfRange {
                key: "bounds_padding",
                reason: format!("must not be negative, got {}", self.bounds_padding),
            });
        }
        self.julia.validate()?;
        self.mask_julia
            .validate_as("mask_julia.max_iterations", "mask_julia.escape_radius")?;
        if let Some(bounds) = &self.field_bounds {
            bounds.to_aabb()?;
        }
        Ok(())
    }
}
