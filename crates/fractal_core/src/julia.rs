//! Quaternion Julia evaluator driven by a versor-modulus field.
//!
//! Each step resamples the rotation and modulus at the current iterate,
//! so the dynamics vary across space instead of using fixed constants.
use crate::error::ConfigError;
use crate::traits::{ScalarField, VersorModulusField};
use nalgebra::{Point3, Quaternion};
use serde::{Deserialize, Serialize};

/// Smallest magnitude reported for points that never escape.
const INSIDE_EPS: f64 = 1e-9;
const MIN_NORM: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JuliaParameters {
    pub max_iterations: usize,
    pub escape_radius: f64,
}

impl Default for JuliaParameters {
    fn default() -> Self {
        Self {
            max_iterations: 7,
            escape_radius: 10.0,
        }
    }
}

impl JuliaParameters {
    pub fn new(max_iterations: usize, escape_radius: f64) -> Result<Self, ConfigError> {
        let params = Self {
            max_iterations,
            escape_radius,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_as("julia.max_iterations", "julia.escape_radius")
    }

    /// Validates with the configuration keys the parameters were read from.
    pub fn validate_as(
        &self,
        iterations_key: &'static str,
        radius_key: &'static str,
    ) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::OutOfRange {
                key: iterations_key,
                reason: "at least one iteration is required".to_string(),
            });
        }
        if !self.escape_radius.is_finite() {
            return Err(ConfigError::NonFinite {
                key: radius_key,
                value: self.escape_radius,
            });
        }
        if self.escape_radius <= 0.0 {
            return Err(ConfigError::OutOfRange {
                key: radius_key,
                reason: format!("must be positive, got {}", self.escape_radius),
            });
        }
        Ok(())
    }
}

/// Scalar field whose sign tells whether the orbit of a point escapes.
///
/// The orbit starts at the pure quaternion `(0, p)` and steps
/// `q <- m(x) * (r(x) q)` with `x = Im(q)`. Escaping points return
/// `ln(|q| / escape_radius) > 0`; points that stay bounded for the whole
/// budget return a strictly negative value.
#[derive(Debug, Clone)]
pub struct QuaternionJulia<M> {
    map: M,
    params: JuliaParameters,
}

impl<M: VersorModulusField> QuaternionJulia<M> {
    pub fn new(map: M, params: JuliaParameters) -> Self {
        Self { map, params }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn params(&self) -> &JuliaParameters {
        &self.params
    }

    pub fn potential(&self, point: &Point3<f64>) -> f64 {
        let escape = self.params.escape_radius;
        let mut q = Quaternion::from_imag(point.coords);
        for _ in 0..self.params.max_iterations {
            let norm = q.norm();
            if norm > escape {
                return escape_value(norm, escape);
            }
            let sample = self.map.sample(&Point3::from(q.imag()));
            q = (sample.versor.to_quaternion().into_inner() * q) * sample.modulus;
        }
        let norm = q.norm();
        if norm > escape {
            escape_value(norm, escape)
        } else {
            (norm.max(MIN_NORM) / escape).ln().min(-INSIDE_EPS)
        }
    }
}

fn escape_value(norm: f64, escape: f64) -> f64 {
    (norm / escape).ln().min(f64::MAX)
}

impl<M: VersorModulusField> ScalarField for QuaternionJulia<M> {
    fn evaluate(&self, point: &Point3<f64>) -> f64 {
        self.potential(point)
    }
}

#[cfg(test)]
mod tests {
    use super::{JuliaParameters, QuaternionJulia};
    use crate::modulus::ShapeModulus;
    use crate::noise_versor::{NoiseVersor, Versor};
    use crate::traits::{FnField, ScalarField, VersorModulus, VersorModulusField};
    use crate::versor_modulus::VersorModulusMap;
    use nalgebra::Point3;

    /// Pure scaling map with a fixed modulus.
    struct ConstantModulus(f64);

    impl VersorModulusField for ConstantModulus {
        fn sample(&self, _point: &Point3<f64>) -> VersorModulus {
            VersorModulus {
                versor: Versor::identity(),
                modulus: self.0,
            }
        }
    }

    #[test]
    fn defaults_match_outer_julia_set() {
        let params = JuliaParameters::default();
        assert_eq!(params.max_iterations, 7);
        assert_eq!(params.escape_radius, 10.0);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(JuliaParameters::new(0, 10.0).is_err());
        assert!(JuliaParameters::new(4, 0.0).is_err());
        assert!(JuliaParameters::new(4, f64::NAN).is_err());
        assert!(JuliaParameters::new(4, 10.0).is_ok());
    }

    #[test]
    fn contracting_orbits_are_strictly_inside() {
        let julia = QuaternionJulia::new(ConstantModulus(0.5), JuliaParameters::default());
        let value = julia.evaluate(&Point3::new(1.0, 1.0, 1.0));
        assert!(value < 0.0, "bounded orbit produced {value}");
        let origin = julia.evaluate(&Point3::origin());
        assert!(origin < 0.0 && origin.is_finite(), "origin produced {origin}");
    }

    #[test]
    fn expanding_orbits_escape_with_positive_potential() {
        let julia = QuaternionJulia::new(ConstantModulus(3.0), JuliaParameters::default());
        let value = julia.evaluate(&Point3::new(1.0, 0.0, 0.0));
        assert!(value > 0.0, "escaping orbit produced {value}");
        let far = julia.evaluate(&Point3::new(50.0, 0.0, 0.0));
        assert!((far - 5.0f64.ln()).abs() < 1e-12, "far point produced {far}");
    }

    #[test]
    fn sign_follows_distance_field_for_full_chain() {
        let distance = FnField(|p: &Point3<f64>| p.coords.norm() - 0.4);
        let map = VersorModulusMap::new(
            NoiseVersor::new(3, 2.0, 1),
            ShapeModulus::new(distance, 8.0, 0.0),
        );
        let julia = QuaternionJulia::new(map, JuliaParameters::new(10, 2.0).expect("valid params"));
        assert!(julia.evaluate(&Point3::new(0.05, 0.0, 0.0)) < 0.0);
        assert!(julia.evaluate(&Point3::new(1.5, 0.0, 0.0)) > 0.0);
    }
}
