//! Lazily evaluated voxel lattice over a continuous field.
use crate::coords::CoordinateMapper;
use crate::error::FieldError;
use crate::geometry::Aabb;
use crate::traits::{ScalarField, VoxelSource};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use tracing::debug;

/// Caches one field value per voxel, evaluated on first access.
///
/// Every cell is a `OnceLock`, so an index is evaluated at most once even when
/// `prefill` and `value_at` race across threads. Entries are never invalidated;
/// the cache is meant to live for a single extraction pass.
pub struct VirtualGridCache<'f, F: ?Sized> {
    field: &'f F,
    mapper: CoordinateMapper,
    cells: Vec<OnceLock<f64>>,
    evaluations: AtomicUsize,
}

impl<'f, F: ScalarField + ?Sized> VirtualGridCache<'f, F> {
    pub fn new(field: &'f F, resolution: usize, bounds: Aabb) -> Result<Self, FieldError> {
        let mapper = CoordinateMapper::cubic(resolution, bounds)?;
        let cells = (0..mapper.sample_count()).map(|_| OnceLock::new()).collect();
        Ok(Self {
            field,
            mapper,
            cells,
            evaluations: AtomicUsize::new(0),
        })
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Number of field evaluations performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|cell| cell.get().is_some()).count()
    }

    /// Evaluates every voxel up front using the rayon thread pool.
    pub fn prefill(&self) {
        let n = self.mapper.resolution()[0];
        self.cells.par_iter().enumerate().for_each(|(index, cell)| {
            let (i, j, k) = (index % n, (index / n) % n, index / (n * n));
            self.fill(cell, i, j, k);
        });
        debug!(voxels = self.cells.len(), evaluations = self.evaluations(), "cache prefilled");
    }

    fn fill(&self, cell: &OnceLock<f64>, i: usize, j: usize, k: usize) -> f64 {
        *cell.get_or_init(|| {
            self.evaluations.fetch_add(1, Ordering::Relaxed);
            self.field.evaluate(&self.mapper.voxel_center(i, j, k))
        })
    }
}

impl<F: ScalarField + ?Sized> VoxelSource for VirtualGridCache<'_, F> {
    fn resolution(&self) -> usize {
        self.mapper.resolution()[0]
    }

    fn value_at(&self, i: usize, j: usize, k: usize) -> f64 {
        let n = self.resolution();
        assert!(
            i < n && j < n && k < n,
            "voxel ({i}, {j}, {k}) outside a {n}^3 grid"
        );
        self.fill(&self.cells[i + n * (j + n * k)], i, j, k)
    }
}
