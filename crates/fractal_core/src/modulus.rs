use crate::traits::ScalarField;
use nalgebra::Point3;

/// Exponents above this would overflow `f64::exp`.
const MAX_EXPONENT: f64 = 700.0;

/// Spatially varying modulus `exp(alpha * (d(p) - beta))` over a distance field `d`.
///
/// Inside the `beta`-offset surface the modulus is below one and iterates
/// contract; outside it grows with distance.
#[derive(Debug, Clone)]
pub struct ShapeModulus<D> {
    distance: D,
    alpha: f64,
    beta: f64,
}

impl<D: ScalarField> ShapeModulus<D> {
    pub fn new(distance: D, alpha: f64, beta: f64) -> Self {
        Self {
            distance,
            alpha,
            beta,
        }
    }

    pub fn distance(&self) -> &D {
        &self.distance
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn modulus(&self, point: &Point3<f64>) -> f64 {
        let d = self.distance.evaluate(point);
        (self.alpha * (d - self.beta)).min(MAX_EXPONENT).exp()
    }
}

impl<D: ScalarField> ScalarField for ShapeModulus<D> {
    fn evaluate(&self, point: &Point3<f64>) -> f64 {
        self.modulus(point)
    }
}

#[cfg(test)]
mod tests {
    use super::ShapeModulus;
    use crate::traits::FnField;
    use nalgebra::Point3;

    fn radial() -> FnField<fn(&Point3<f64>) -> f64> {
        FnField(|p: &Point3<f64>| p.coords.norm() - 0.3)
    }

    #[test]
    fn modulus_is_one_on_the_offset_surface() {
        let modulus = ShapeModulus::new(radial(), 4.0, 0.1);
        let on_surface = Point3::new(0.4, 0.0, 0.0);
        assert!((modulus.modulus(&on_surface) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn modulus_contracts_inside_and_expands_outside() {
        let modulus = ShapeModulus::new(radial(), 4.0, 0.0);
        let inside = modulus.modulus(&Point3::origin());
        let outside = modulus.modulus(&Point3::new(0.0, 0.9, 0.0));
        assert!(inside < 1.0, "inside modulus {inside}");
        assert!(outside > 1.0, "outside modulus {outside}");
    }

    #[test]
    fn huge_exponents_stay_finite() {
        let modulus = ShapeModulus::new(radial(), 1e9, 0.0);
        assert!(modulus.modulus(&Point3::new(10.0, 0.0, 0.0)).is_finite());
    }
}
