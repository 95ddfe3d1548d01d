//! Coarse signed distance grid and its `.f3d` file format.
//!
//! Layout (little endian): `i32` resolution x, y, z; `f64` center x, y, z;
//! `f64` lengths x, y, z; then `x * y * z` `f64` samples, x fastest.

use crate::coords::{sample_count, CoordinateMapper};
use crate::error::FieldError;
use crate::geometry::Aabb;
use anyhow::{Context, Result};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Immutable 3D grid of scalar samples spread over a world-space box.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid3D {
    mapper: CoordinateMapper,
    data: Vec<f64>,
}

impl ScalarGrid3D {
    pub fn new(resolution: [usize; 3], data: Vec<f64>, bounds: Aabb) -> Result<Self, FieldError> {
        let mapper = CoordinateMapper::new(resolution, bounds)?;
        let expected = mapper.sample_count();
        if data.len() != expected {
            return Err(FieldError::SampleCountMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { mapper, data })
    }

    /// Samples `f` at every cell centre of a grid covering `bounds`.
    pub fn from_fn(
        resolution: [usize; 3],
        bounds: Aabb,
        f: impl Fn(&Point3<f64>) -> f64,
    ) -> Result<Self, FieldError> {
        let mapper = CoordinateMapper::new(resolution, bounds)?;
        let [nx, ny, nz] = resolution;
        let mut data = Vec::with_capacity(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    data.push(f(&mapper.voxel_center(i, j, k)));
                }
            }
        }
        Self::new(resolution, data, bounds)
    }

    pub fn read_f3d<R: Read>(mut reader: R) -> Result<Self, FieldError> {
        let mut res = [0i64; 3];
        for slot in res.iter_mut() {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            *slot = i32::from_le_bytes(buf) as i64;
        }
        if res.iter().any(|&n| n <= 0) {
            return Err(FieldError::InvalidResolution(res[0], res[1], res[2]));
        }

        let center = read_vector(&mut reader, "center")?;
        let lengths = read_vector(&mut reader, "lengths")?;
        let bounds = Aabb::from_center_lengths(Point3::from(center), lengths)?;

        let resolution = [res[0] as usize, res[1] as usize, res[2] as usize];
        let byte_count = sample_count(resolution)
            .and_then(|count| count.checked_mul(8))
            .ok_or(FieldError::InvalidResolution(res[0], res[1], res[2]))?;
        // Header sizes are untrusted; the buffer grows only with bytes actually read.
        let mut bytes = Vec::new();
        reader.take(byte_count as u64).read_to_end(&mut bytes)?;
        if bytes.len() != byte_count {
            return Err(FieldError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("expected {byte_count} sample bytes, found {}", bytes.len()),
            )));
        }
        let data = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word.copy_from_slice(chunk);
                f64::from_le_bytes(word)
            })
            .collect();

        Self::new(resolution, data, bounds)
    }

    pub fn write_f3d<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for n in self.resolution() {
            writer.write_all(&(n as i32).to_le_bytes())?;
        }
        let center = self.bounds().center();
        let lengths = self.bounds().extent();
        for value in center.iter().chain(lengths.iter()) {
            writer.write_all(&value.to_le_bytes())?;
        }
        for value in &self.data {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.flush()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open distance field {}.", path.display()))?;
        let grid = Self::read_f3d(BufReader::new(file))
            .with_context(|| format!("Failed to parse distance field {}.", path.display()))?;
        let (lo, hi) = grid.value_range();
        tracing::info!(
            path = %path.display(),
            resolution = ?grid.resolution(),
            min = ?grid.bounds().min(),
            max = ?grid.bounds().max(),
            "loaded distance field with values in [{lo:.4}, {hi:.4}]"
        );
        Ok(grid)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}.", path.display()))?;
        self.write_f3d(BufWriter::new(file))
            .with_context(|| format!("Failed to write distance field {}.", path.display()))
    }

    /// Replaces the world-space box while keeping the samples.
    pub fn with_bounds(self, bounds: Aabb) -> Result<Self, FieldError> {
        let mapper = CoordinateMapper::new(self.resolution(), bounds)?;
        Ok(Self {
            mapper,
            data: self.data,
        })
    }

    pub fn resolution(&self) -> [usize; 3] {
        self.mapper.resolution()
    }

    pub fn bounds(&self) -> &Aabb {
        self.mapper.bounds()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        let [nx, ny, nz] = self.resolution();
        debug_assert!(i < nx && j < ny && k < nz, "sample ({i}, {j}, {k}) out of range");
        self.data[i + j * nx + k * nx * ny]
    }

    /// Smallest and largest sample.
    pub fn value_range(&self) -> (f64, f64) {
        self.data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

fn read_vector<R: Read>(reader: &mut R, name: &'static str) -> Result<Vector3<f64>, FieldError> {
    let mut values = [0.0; 3];
    for slot in values.iter_mut() {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        *slot = f64::from_le_bytes(buf);
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(FieldError::NonFiniteHeader { name });
    }
    Ok(Vector3::from(values))
}
