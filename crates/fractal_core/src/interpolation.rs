use crate::distance_field::ScalarGrid3D;
use crate::traits::ScalarField;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Reconstruction kernel used between coarse samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationKernel {
    /// Trilinear blend of the 8 enclosing samples.
    #[default]
    Linear,
    /// Quadratic B-spline over the 27 nearest samples. Smoother, slightly shrinks features.
    Quadratic,
}

/// Continuous view of a coarse distance grid.
///
/// Points outside the grid's box are clamped onto it before sampling, so
/// evaluation near the boundary of the simulation box never fails.
#[derive(Debug, Clone)]
pub struct InterpolationGrid {
    grid: ScalarGrid3D,
    kernel: InterpolationKernel,
}

impl InterpolationGrid {
    pub fn new(grid: ScalarGrid3D, kernel: InterpolationKernel) -> Self {
        Self { grid, kernel }
    }

    pub fn grid(&self) -> &ScalarGrid3D {
        &self.grid
    }

    pub fn kernel(&self) -> InterpolationKernel {
        self.kernel
    }

    pub fn sample(&self, point: &Point3<f64>) -> f64 {
        let clamped = self.grid.bounds().clamp(point);
        let g = self.grid.mapper().field_to_grid(&clamped);
        let [nx, ny, nz] = self.grid.resolution();
        match self.kernel {
            InterpolationKernel::Linear => {
                let (x0, x1, tx) = linear_taps(g.x, nx);
                let (y0, y1, ty) = linear_taps(g.y, ny);
                let (z0, z1, tz) = linear_taps(g.z, nz);

                let c00 = lerp(self.grid.get(x0, y0, z0), self.grid.get(x1, y0, z0), tx);
                let c10 = lerp(self.grid.get(x0, y1, z0), self.grid.get(x1, y1, z0), tx);
                let c01 = lerp(self.grid.get(x0, y0, z1), self.grid.get(x1, y0, z1), tx);
                let c11 = lerp(self.grid.get(x0, y1, z1), self.grid.get(x1, y1, z1), tx);
                lerp(lerp(c00, c10, ty), lerp(c01, c11, ty), tz)
            }
            InterpolationKernel::Quadratic => {
                let wx = quadratic_taps(g.x, nx);
                let wy = quadratic_taps(g.y, ny);
                let wz = quadratic_taps(g.z, nz);
                let mut value = 0.0;
                for &(k, w_k) in &wz {
                    for &(j, w_j) in &wy {
                        for &(i, w_i) in &wx {
                            value += w_i * w_j * w_k * self.grid.get(i, j, k);
                        }
                    }
                }
                value
            }
        }
    }
}

impl ScalarField for InterpolationGrid {
    fn evaluate(&self, point: &Point3<f64>) -> f64 {
        self.sample(point)
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Lower index, upper index and blend factor along one axis.
fn linear_taps(g: f64, n: usize) -> (usize, usize, f64) {
    if n == 1 {
        return (0, 0, 0.0);
    }
    let g = g.clamp(0.0, (n - 1) as f64);
    let lower = (g.floor() as usize).min(n - 2);
    (lower, lower + 1, g - lower as f64)
}

/// Three clamped indices with quadratic B-spline weights summing to one.
fn quadratic_taps(g: f64, n: usize) -> [(usize, f64); 3] {
    let g = g.clamp(0.0, (n - 1) as f64);
    let center = g.round();
    let t = g - center;
    let center = center as i64;
    let last = (n - 1) as i64;
    let index = |offset: i64| (center + offset).clamp(0, last) as usize;
    [
        (index(-1), 0.5 * (0.5 - t) * (0.5 - t)),
        (index(0), 0.75 - t * t),
        (index(1), 0.5 * (0.5 + t) * (0.5 + t)),
    ]
}

#[cfg(test)]
mod tests {
    use super::{linear_taps, quadratic_taps, InterpolationGrid, InterpolationKernel};
    use crate::distance_field::ScalarGrid3D;
    use crate::geometry::Aabb;
    use nalgebra::Point3;

    fn affine_grid() -> ScalarGrid3D {
        ScalarGrid3D::from_fn([8, 8, 8], Aabb::unit(), |p| 2.0 * p.x - p.y + 0.5 * p.z + 0.1)
            .expect("grid should build")
    }

    #[test]
    fn linear_reproduces_affine_fields_inside_sample_hull() {
        let field = InterpolationGrid::new(affine_grid(), InterpolationKernel::Linear);
        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.21, -0.33, 0.4),
            Point3::new(-0.43, 0.43, -0.1),
        ] {
            let expected = 2.0 * p.x - p.y + 0.5 * p.z + 0.1;
            let value = field.sample(&p);
            assert!(
                (value - expected).abs() < 1e-9,
                "expected {expected} at {p:?}, got {value}"
            );
        }
    }

    #[test]
    fn linear_hits_samples_exactly_at_cell_centers() {
        let grid = affine_grid();
        let center = grid.mapper().voxel_center(3, 5, 2);
        let expected = grid.get(3, 5, 2);
        let field = InterpolationGrid::new(grid, InterpolationKernel::Linear);
        assert!((field.sample(&center) - expected).abs() < 1e-12);
    }

    #[test]
    fn outside_points_clamp_to_the_box() {
        let field = InterpolationGrid::new(affine_grid(), InterpolationKernel::Linear);
        let far = field.sample(&Point3::new(5.0, 0.0, 0.0));
        let edge = field.sample(&Point3::new(0.5, 0.0, 0.0));
        assert!((far - edge).abs() < 1e-12);
        assert!(far.is_finite());
    }

    #[test]
    fn quadratic_weights_partition_unity_and_preserve_constants() {
        for g in [0.0, 0.3, 2.5, 3.49, 7.0] {
            let taps = quadratic_taps(g, 8);
            let sum: f64 = taps.iter().map(|(_, w)| w).sum();
            assert!((sum - 1.0).abs() < 1e-12, "weights at {g} sum to {sum}");
        }
        let constant = ScalarGrid3D::from_fn([5, 5, 5], Aabb::unit(), |_| 0.7).expect("grid");
        let field = InterpolationGrid::new(constant, InterpolationKernel::Quadratic);
        let value = field.sample(&Point3::new(0.11, -0.27, 0.49));
        assert!((value - 0.7).abs() < 1e-12);
    }

    #[test]
    fn single_sample_axes_are_supported() {
        assert_eq!(linear_taps(0.0, 1), (0, 0, 0.0));
        let flat = ScalarGrid3D::from_fn([1, 1, 1], Aabb::unit(), |_| -2.0).expect("grid");
        let field = InterpolationGrid::new(flat, InterpolationKernel::Linear);
        assert_eq!(field.sample(&Point3::new(0.3, 0.1, -0.2)), -2.0);
    }
}
