use crate::error::FieldError;
use nalgebra::{Point3, Vector3};

/// Axis-aligned bounding box with `min < max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Aabb {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Result<Self, FieldError> {
        let finite = min.iter().chain(max.iter()).all(|v| v.is_finite());
        let ordered = (0..3).all(|axis| min[axis] < max[axis]);
        if !finite || !ordered {
            return Err(FieldError::DegenerateBounds {
                min: [min.x, min.y, min.z],
                max: [max.x, max.y, max.z],
            });
        }
        Ok(Self { min, max })
    }

    pub fn from_center_lengths(
        center: Point3<f64>,
        lengths: Vector3<f64>,
    ) -> Result<Self, FieldError> {
        let half = lengths * 0.5;
        Self::new(center - half, center + half)
    }

    /// The unit cube centred on the origin.
    pub fn unit() -> Self {
        Self {
            min: Point3::new(-0.5, -0.5, -0.5),
            max: Point3::new(0.5, 0.5, 0.5),
        }
    }

    pub fn min(&self) -> &Point3<f64> {
        &self.min
    }

    pub fn max(&self) -> &Point3<f64> {
        &self.max
    }

    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    pub fn clamp(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
            point.z.clamp(self.min.z, self.max.z),
        )
    }

    /// Grows the max corner by `padding` on every axis, leaving min fixed.
    pub fn pad_max(&self, padding: f64) -> Result<Self, FieldError> {
        Self::new(self.min, self.max + Vector3::repeat(padding))
    }
}
