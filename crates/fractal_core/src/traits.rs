use crate::noise_versor::Versor;
use nalgebra::Point3;
use std::sync::Arc;

/// A field that assigns a scalar to every point of space.
/// Negative values are inside the surface, positive values outside.
/// Must be Sync so voxel evaluation can be spread across threads.
pub trait ScalarField: Send + Sync {
    /// Evaluates the field at a world-space point.
    fn evaluate(&self, point: &Point3<f64>) -> f64;
}

/// Rotation and modulus sampled together at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VersorModulus {
    pub versor: Versor,
    pub modulus: f64,
}

/// A field that supplies both a rotation and a modulus at every point.
pub trait VersorModulusField: Send + Sync {
    fn sample(&self, point: &Point3<f64>) -> VersorModulus;
}

impl<T: VersorModulusField + ?Sized> VersorModulusField for Arc<T> {
    fn sample(&self, point: &Point3<f64>) -> VersorModulus {
        (**self).sample(point)
    }
}

/// Integer-indexed cubic lattice of scalar samples consumed by marching cubes.
pub trait VoxelSource {
    /// Number of samples along each axis.
    fn resolution(&self) -> usize;

    /// Sample at lattice index (i, j, k), each in `0..resolution`.
    fn value_at(&self, i: usize, j: usize, k: usize) -> f64;
}

/// Adapts a closure into a `ScalarField`.
#[derive(Debug, Clone, Copy)]
pub struct FnField<F>(pub F);

impl<F> ScalarField for FnField<F>
where
    F: Fn(&Point3<f64>) -> f64 + Send + Sync,
{
    fn evaluate(&self, point: &Point3<f64>) -> f64 {
        (self.0)(point)
    }
}
