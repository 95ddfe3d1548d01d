//! Spatially varying rotations driven by fractal Perlin noise.
//!
//! Three independent fBm channels produce a vector `v` per point; its
//! direction is the rotation axis and `pi * |v|` the angle.
use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use std::f64::consts::PI;

const NOISE_LACUNARITY: f64 = 2.0;
const NOISE_PERSISTENCE: f64 = 0.5;
const MAX_OCTAVES: usize = 32;
const ZERO_VECTOR_EPS: f64 = 1e-12;

/// Axis-angle rotation sampled from the noise field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Versor {
    pub axis: Unit<Vector3<f64>>,
    pub angle: f64,
}

impl Versor {
    pub fn identity() -> Self {
        Self {
            axis: Vector3::z_axis(),
            angle: 0.0,
        }
    }

    pub fn to_quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&self.axis, self.angle)
    }
}

/// Deterministic versor field. Octaves and scale are fixed at construction.
#[derive(Debug, Clone)]
pub struct NoiseVersor {
    channels: Option<[Fbm<Perlin>; 3]>,
    octaves: usize,
    scale: f64,
    seed: u32,
}

impl NoiseVersor {
    /// Zero octaves disables the field; every sample is then the identity rotation.
    pub fn new(octaves: usize, scale: f64, seed: u32) -> Self {
        let octaves = octaves.min(MAX_OCTAVES);
        let channels = (octaves > 0).then(|| {
            [0u32, 1, 2].map(|offset| {
                Fbm::<Perlin>::new(seed.wrapping_add(offset))
                    .set_octaves(octaves)
                    .set_lacunarity(NOISE_LACUNARITY)
                    .set_persistence(NOISE_PERSISTENCE)
            })
        });
        Self {
            channels,
            octaves,
            scale,
            seed,
        }
    }

    pub fn octaves(&self) -> usize {
        self.octaves
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn sample(&self, point: &Point3<f64>) -> Versor {
        let Some(channels) = &self.channels else {
            return Versor::identity();
        };
        let p = [
            point.x * self.scale,
            point.y * self.scale,
            point.z * self.scale,
        ];
        let v = Vector3::new(channels[0].get(p), channels[1].get(p), channels[2].get(p));
        match Unit::try_new_and_get(v, ZERO_VECTOR_EPS) {
            Some((axis, norm)) => Versor {
                axis,
                angle: PI * norm,
            },
            None => Versor::identity(),
        }
    }
}
