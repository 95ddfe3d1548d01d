//! Affine mapping between voxel-index space and field (world) space.
//!
//! Sample `v` along an axis with `n` samples sits at the centre of cell `v`:
//! `min + (v + 0.5) * spacing` with `spacing = (max - min) / n`. Fractional
//! indices map the same way, so marching-cubes vertices produced in index
//! space land exactly between the samples they were interpolated from.

use crate::error::FieldError;
use crate::geometry::Aabb;
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    bounds: Aabb,
    resolution: [usize; 3],
    spacing: Vector3<f64>,
}

impl CoordinateMapper {
    pub fn new(resolution: [usize; 3], bounds: Aabb) -> Result<Self, FieldError> {
        if resolution.iter().any(|&n| n == 0) || sample_count(resolution).is_none() {
            return Err(FieldError::InvalidResolution(
                resolution[0] as i64,
                resolution[1] as i64,
                resolution[2] as i64,
            ));
        }
        let extent = bounds.extent();
        let spacing = Vector3::new(
            extent.x / resolution[0] as f64,
            extent.y / resolution[1] as f64,
            extent.z / resolution[2] as f64,
        );
        Ok(Self {
            bounds,
            resolution,
            spacing,
        })
    }

    /// Total number of samples; never overflows once the mapper exists.
    pub fn sample_count(&self) -> usize {
        self.resolution.iter().product()
    }

    /// Same resolution on every axis.
    pub fn cubic(resolution: usize, bounds: Aabb) -> Result<Self, FieldError> {
        Self::new([resolution; 3], bounds)
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    pub fn spacing(&self) -> &Vector3<f64> {
        &self.spacing
    }

    pub fn grid_to_field(&self, grid: &Point3<f64>) -> Point3<f64> {
        let min = self.bounds.min();
        Point3::new(
            min.x + (grid.x + 0.5) * self.spacing.x,
            min.y + (grid.y + 0.5) * self.spacing.y,
            min.z + (grid.z + 0.5) * self.spacing.z,
        )
    }

    pub fn field_to_grid(&self, field: &Point3<f64>) -> Point3<f64> {
        let min = self.bounds.min();
        Point3::new(
            (field.x - min.x) / self.spacing.x - 0.5,
            (field.y - min.y) / self.spacing.y - 0.5,
            (field.z - min.z) / self.spacing.z - 0.5,
        )
    }

    /// World position of the sample at integer index (i, j, k).
    pub fn voxel_center(&self, i: usize, j: usize, k: usize) -> Point3<f64> {
        self.grid_to_field(&Point3::new(i as f64, j as f64, k as f64))
    }

    /// Carries a grid-space normal into field space (inverse transpose of the
    /// affine map). Length is not preserved.
    pub fn grid_to_field_normal(&self, normal: &Vector3<f64>) -> Vector3<f64> {
        normal.component_div(&self.spacing)
    }
}

/// `x * y * z`, or `None` when it does not fit in `usize`.
pub fn sample_count(resolution: [usize; 3]) -> Option<usize> {
    resolution
        .iter()
        .try_fold(1usize, |count, &n| count.checked_mul(n))
}
