//! Indexed triangle mesh produced by the extractor, and its OBJ writer.
use crate::coords::CoordinateMapper;
use anyhow::{Context, Result};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Vertices and normals are index-aligned. Normals are accumulated face
/// normals and are only normalized on output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3<f64>>,
    pub normals: Vec<Vector3<f64>>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Appends a vertex with a zero normal and returns its index.
    pub fn push_vertex(&mut self, position: Point3<f64>) -> u32 {
        let index = vertex_index(self.vertices.len());
        self.vertices.push(position);
        self.normals.push(Vector3::zeros());
        index
    }

    /// Appends a triangle and adds its unnormalized face normal to each corner.
    pub fn push_triangle(&mut self, triangle: [u32; 3]) {
        let [a, b, c] = triangle.map(|index| index as usize);
        let p0 = self.vertices[a];
        let face = (self.vertices[b] - p0).cross(&(self.vertices[c] - p0));
        for index in [a, b, c] {
            self.normals[index] += face;
        }
        self.triangles.push(triangle);
    }

    pub fn has_valid_indices(&self) -> bool {
        let count = self.vertices.len();
        self.normals.len() == count
            && self
                .triangles
                .iter()
                .all(|triangle| triangle.iter().all(|&index| (index as usize) < count))
    }

    /// Unit normals; vertices whose accumulation is degenerate get zero.
    pub fn normalized_normals(&self) -> Vec<Vector3<f64>> {
        self.normals
            .iter()
            .map(|n| n.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros))
            .collect()
    }

    /// Moves a mesh built in voxel-index space into field space. Normals use
    /// the inverse-transpose of the same affine map.
    pub fn map_to_field(&mut self, mapper: &CoordinateMapper) {
        for vertex in &mut self.vertices {
            *vertex = mapper.grid_to_field(vertex);
        }
        for normal in &mut self.normals {
            *normal = mapper.grid_to_field_normal(normal);
        }
    }

    pub fn write_obj<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(
            writer,
            "# {} vertices, {} triangles",
            self.vertices.len(),
            self.triangles.len()
        )?;
        for v in &self.vertices {
            writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
        }
        for n in self.normalized_normals() {
            writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
        }
        for [a, b, c] in &self.triangles {
            let (a, b, c) = (a + 1, b + 1, c + 1);
            writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
        }
        writer.flush()
    }

    pub fn save_obj(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create mesh file {}.", path.display()))?;
        self.write_obj(BufWriter::new(file))
            .with_context(|| format!("Failed to write mesh file {}.", path.display()))?;
        info!(
            path = %path.display(),
            vertices = self.vertices.len(),
            triangles = self.triangles.len(),
            "mesh written"
        );
        Ok(())
    }
}

/// Triangle indices are `u32`; more vertices than that is a defect.
fn vertex_index(position: usize) -> u32 {
    match u32::try_from(position) {
        Ok(index) => index,
        Err(_) => panic!("vertex {position} does not fit a u32 triangle index"),
    }
}
