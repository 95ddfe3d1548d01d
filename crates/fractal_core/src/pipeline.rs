//! Assembles the field chain from run parameters and extracts its surface.
//!
//! distance grid -> interpolation -> shape modulus + noise versor
//! -> (portal routing, masked by an inner Julia set) -> quaternion Julia
//! -> portal map -> voxel cache -> marching cubes.
use crate::config::RunParameters;
use crate::distance_field::ScalarGrid3D;
use crate::geometry::Aabb;
use crate::interpolation::InterpolationGrid;
use crate::julia::QuaternionJulia;
use crate::marching_cubes::march_cubes;
use crate::mesh::Mesh;
use crate::modulus::ShapeModulus;
use crate::noise_versor::NoiseVersor;
use crate::portal::{load_portals, PortalMap, PortalSpec, PortalVersorMap};
use crate::timing::Timings;
use crate::traits::ScalarField;
use crate::versor_modulus::VersorModulusMap;
use crate::virtual_grid::VirtualGridCache;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Noise versor paired with the shape modulus of the smoothed distance grid.
pub type BaseMap = VersorModulusMap<InterpolationGrid>;

/// Julia set over the base map, used as the portal mask.
pub type MaskField = QuaternionJulia<Arc<BaseMap>>;

/// The complete implicit field sampled by the extractor.
pub type FractalField = PortalMap<QuaternionJulia<PortalVersorMap<Arc<BaseMap>, MaskField>>>;

pub struct FractalPipeline {
    field: FractalField,
    simulation_bounds: Aabb,
    resolution: usize,
    parallel: bool,
}

impl FractalPipeline {
    pub fn new(
        grid: ScalarGrid3D,
        portals: Vec<PortalSpec>,
        params: &RunParameters,
    ) -> Result<Self> {
        params.validate().context("Invalid run parameters.")?;
        let grid = match &params.field_bounds {
            Some(bounds) => grid.with_bounds(bounds.to_aabb()?)?,
            None => grid,
        };
        let simulation_bounds = grid
            .bounds()
            .pad_max(params.bounds_padding)
            .context("Failed to build simulation bounds.")?;

        let distance = InterpolationGrid::new(grid, params.kernel);
        let versor = NoiseVersor::new(params.versor_octaves, params.versor_scale, params.noise_seed);
        let modulus = ShapeModulus::new(distance, params.alpha, params.beta);
        let base = Arc::new(VersorModulusMap::new(versor, modulus));
        let mask = QuaternionJulia::new(Arc::clone(&base), params.mask_julia);
        let routed_portals = if params.recursive_portals {
            portals.clone()
        } else {
            Vec::new()
        };
        let routed = PortalVersorMap::new(base, mask, routed_portals);
        let julia = QuaternionJulia::new(routed, params.julia);
        let field = PortalMap::new(julia, portals);

        info!(
            resolution = params.resolution,
            alpha = params.alpha,
            beta = params.beta,
            versor_octaves = params.versor_octaves,
            versor_scale = params.versor_scale,
            portals = field.portals().len(),
            recursive_portals = params.recursive_portals,
            min = ?simulation_bounds.min(),
            max = ?simulation_bounds.max(),
            "field pipeline ready"
        );
        Ok(Self {
            field,
            simulation_bounds,
            resolution: params.resolution,
            parallel: params.parallel,
        })
    }

    pub fn field(&self) -> &FractalField {
        &self.field
    }

    pub fn simulation_bounds(&self) -> &Aabb {
        &self.simulation_bounds
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn extract(&self, timings: &Timings) -> Result<Mesh> {
        extract_isosurface(
            &self.field,
            self.resolution,
            self.simulation_bounds,
            self.parallel,
            timings,
        )
    }
}

/// Samples `field` on a `resolution`^3 lattice over `bounds` and returns its
/// zero level set in field coordinates.
pub fn extract_isosurface<F: ScalarField + ?Sized>(
    field: &F,
    resolution: usize,
    bounds: Aabb,
    parallel: bool,
    timings: &Timings,
) -> Result<Mesh> {
    let cache = VirtualGridCache::new(field, resolution, bounds)
        .context("Failed to set up the voxel cache.")?;
    if parallel {
        let _scope = timings.scope("cache prefill");
        cache.prefill();
    }
    let march = timings.scope("marching cubes");
    let mut mesh = march_cubes(&cache);
    debug!(seconds = march.stop().as_secs_f64(), "marching cubes timed");
    {
        let _scope = timings.scope("grid to field");
        mesh.map_to_field(cache.mapper());
    }
    info!(
        evaluations = cache.evaluations(),
        cached_voxels = cache.filled(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "surface extracted"
    );
    Ok(mesh)
}

/// Loads the inputs, extracts the surface and writes it as OBJ.
pub fn generate(
    distance_field: &Path,
    portals: &Path,
    output: &Path,
    params: &RunParameters,
    timings: &Timings,
) -> Result<Mesh> {
    let (grid, portals) = {
        let _scope = timings.scope("load inputs");
        (ScalarGrid3D::load(distance_field)?, load_portals(portals)?)
    };
    let pipeline = FractalPipeline::new(grid, portals, params)?;
    let mesh = pipeline.extract(timings)?;
    {
        let _scope = timings.scope("write mesh");
        mesh.save_obj(output)?;
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::{extract_isosurface, generate, FractalPipeline};
    use crate::config::{FieldBoundsOverride, RunParameters};
    use crate::distance_field::ScalarGrid3D;
    use crate::geometry::Aabb;
    use crate::portal::PortalSpec;
    use crate::timing::Timings;
    use crate::traits::{FnField, ScalarField};
    use nalgebra::{Point3, Vector3};

    fn sphere_grid() -> ScalarGrid3D {
        ScalarGrid3D::from_fn([12, 12, 12], Aabb::unit(), |p| p.coords.norm() - 0.3)
            .expect("sphere grid")
    }

    fn test_params() -> RunParameters {
        RunParameters {
            resolution: 14,
            alpha: 6.0,
            beta: 0.0,
            versor_octaves: 2,
            versor_scale: 2.0,
            ..RunParameters::default()
        }
    }

    #[test]
    fn sphere_seed_produces_a_closed_valid_mesh() {
        let pipeline =
            FractalPipeline::new(sphere_grid(), Vec::new(), &test_params()).expect("pipeline");
        let timings = Timings::new();
        let mesh = pipeline.extract(&timings).expect("extraction");
        assert!(!mesh.is_empty(), "no surface found");
        assert!(mesh.has_valid_indices());
        let bounds = pipeline.simulation_bounds();
        assert!(mesh.vertices.iter().all(|v| bounds.contains(v)));
        assert!(timings.get("marching cubes").is_some());
    }

    #[test]
    fn simulation_bounds_are_padded_field_bounds() {
        let params = RunParameters {
            field_bounds: Some(FieldBoundsOverride {
                min: [-1.0; 3],
                max: [1.0; 3],
            }),
            ..test_params()
        };
        let pipeline = FractalPipeline::new(sphere_grid(), Vec::new(), &params).expect("pipeline");
        assert_eq!(*pipeline.simulation_bounds().min(), Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(*pipeline.simulation_bounds().max(), Point3::new(1.25, 1.25, 1.25));
    }

    #[test]
    fn invalid_parameters_fail_before_extraction() {
        let params = RunParameters {
            resolution: 0,
            ..test_params()
        };
        assert!(FractalPipeline::new(sphere_grid(), Vec::new(), &params).is_err());
    }

    #[test]
    fn parallel_prefill_matches_sequential_extraction() {
        let sequential =
            FractalPipeline::new(sphere_grid(), Vec::new(), &test_params()).expect("pipeline");
        let parallel = FractalPipeline::new(
            sphere_grid(),
            Vec::new(),
            &RunParameters {
                parallel: true,
                ..test_params()
            },
        )
        .expect("pipeline");
        let timings = Timings::new();
        let a = sequential.extract(&timings).expect("sequential");
        let b = parallel.extract(&timings).expect("parallel");
        assert_eq!(a, b);
        assert!(timings.get("cache prefill").is_some());
    }

    #[test]
    fn portals_leave_distant_points_untouched() {
        let portal = PortalSpec::new(
            Point3::new(0.4, 0.4, 0.4),
            Vector3::x_axis(),
            0.5,
            0.1,
            0.5,
        );
        let bare = FractalPipeline::new(sphere_grid(), Vec::new(), &test_params()).expect("bare");
        let folded =
            FractalPipeline::new(sphere_grid(), vec![portal], &test_params()).expect("folded");
        let far = Point3::new(-0.2, 0.1, 0.0);
        assert_eq!(bare.field().evaluate(&far), folded.field().evaluate(&far));
        let near = Point3::new(0.45, 0.4, 0.4);
        assert_eq!(
            folded.field().evaluate(&near),
            bare.field().evaluate(&portal.to_local(&near))
        );
    }

    #[test]
    fn recursive_portals_route_the_outer_orbit() {
        let portal = PortalSpec::new(
            Point3::new(0.3, 0.0, 0.0),
            Vector3::z_axis(),
            0.5,
            0.15,
            0.5,
        );
        let flat = FractalPipeline::new(sphere_grid(), vec![portal], &test_params()).expect("flat");
        assert!(flat.field().inner().map().portals().is_empty());

        let params = RunParameters {
            recursive_portals: true,
            ..test_params()
        };
        let recursive = FractalPipeline::new(sphere_grid(), vec![portal], &params).expect("recursive");
        let routed = recursive.field().inner().map();
        assert_eq!(routed.portals(), &[portal]);
        assert_eq!(routed.mask().params().max_iterations, 4);

        let mesh = recursive.extract(&Timings::new()).expect("extraction");
        assert!(!mesh.is_empty() && mesh.has_valid_indices());
    }

    #[test]
    fn extracted_sphere_lands_in_world_space() {
        let field = FnField(|p: &Point3<f64>| (p - Point3::new(1.0, 2.0, 3.0)).norm() - 0.5);
        let bounds = Aabb::new(Point3::new(0.0, 1.0, 2.0), Point3::new(2.0, 3.0, 4.0))
            .expect("bounds");
        let mesh = extract_isosurface(&field, 20, bounds, false, &Timings::new()).expect("mesh");
        for (vertex, normal) in mesh.vertices.iter().zip(&mesh.normals) {
            let offset = vertex - Point3::new(1.0, 2.0, 3.0);
            assert!((offset.norm() - 0.5).abs() < 0.05, "vertex {vertex:?}");
            assert!(normal.dot(&offset) > 0.0, "inward normal at {vertex:?}");
        }
    }

    #[test]
    fn generate_writes_an_obj_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let sdf = dir.path().join("sphere.f3d");
        let portals = dir.path().join("portals.txt");
        let output = dir.path().join("out.obj");
        sphere_grid().save(&sdf).expect("save sdf");
        std::fs::write(
            &portals,
            "portals radius: 0.1\nportals scale: 0.5\nportal location: 0.3 0 0\nportal rotation: 0.5 0 0 1\n",
        )
        .expect("write portals");
        let timings = Timings::new();
        let mesh = generate(&sdf, &portals, &output, &test_params(), &timings).expect("generate");
        let text = std::fs::read_to_string(&output).expect("read obj");
        let faces = text.lines().filter(|line| line.starts_with("f ")).count();
        assert_eq!(faces, mesh.triangle_count());
        assert!(timings.get("load inputs").is_some());
    }
}
