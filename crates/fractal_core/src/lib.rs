//! The `fractal_core` crate turns a coarse signed distance field into a mesh of a
//! self-similar quaternion Julia set.
//!
//! Key components:
//! - **Fields**: `InterpolationGrid` (smoothed distance), `NoiseVersor`, `ShapeModulus`,
//!   `VersorModulusMap`, `PortalVersorMap`, `QuaternionJulia` and `PortalMap`, chained by ownership.
//! - **Traits**: `ScalarField`, `VersorModulusField` and `VoxelSource` capabilities.
//! - **Discretization**: `CoordinateMapper` and the lazily filled `VirtualGridCache`.
//! - **Extraction**: marching cubes with shared-edge vertices and accumulated normals.
//! - **Pipeline**: `FractalPipeline` wires the chain from `RunParameters` and a portal list.
pub mod config;
pub mod coords;
pub mod distance_field;
pub mod error;
pub mod geometry;
pub mod interpolation;
pub mod julia;
pub mod marching_cubes;
pub mod mesh;
pub mod modulus;
pub mod noise_versor;
pub mod pipeline;
pub mod portal;
pub mod timing;
pub mod traits;
pub mod versor_modulus;
pub mod virtual_grid;

pub use config::{FieldBoundsOverride, RunParameters};
pub use distance_field::ScalarGrid3D;
pub use error::{ConfigError, FieldError, PortalParseError};
pub use geometry::Aabb;
pub use julia::JuliaParameters;
pub use mesh::Mesh;
pub use pipeline::FractalPipeline;
pub use portal::PortalSpec;
pub use timing::Timings;
