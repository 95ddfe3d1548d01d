use crate::modulus::ShapeModulus;
use crate::noise_versor::NoiseVersor;
use crate::traits::{ScalarField, VersorModulus, VersorModulusField};
use nalgebra::Point3;

/// Pairs the noise versor with the shape modulus at each point.
#[derive(Debug, Clone)]
pub struct VersorModulusMap<D> {
    versor: NoiseVersor,
    modulus: ShapeModulus<D>,
}

impl<D: ScalarField> VersorModulusMap<D> {
    pub fn new(versor: NoiseVersor, modulus: ShapeModulus<D>) -> Self {
        Self { versor, modulus }
    }

    pub fn versor(&self) -> &NoiseVersor {
        &self.versor
    }

    pub fn modulus(&self) -> &ShapeModulus<D> {
        &self.modulus
    }
}

impl<D: ScalarField> VersorModulusField for VersorModulusMap<D> {
    fn sample(&self, point: &Point3<f64>) -> VersorModulus {
        VersorModulus {
            versor: self.versor.sample(point),
            modulus: self.modulus.modulus(point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VersorModulusMap;
    use crate::modulus::ShapeModulus;
    use crate::noise_versor::NoiseVersor;
    use crate::traits::{FnField, VersorModulusField};
    use nalgebra::Point3;

    #[test]
    fn sample_pairs_both_components() {
        let noise = NoiseVersor::new(3, 2.0, 5);
        let modulus = ShapeModulus::new(FnField(|p: &Point3<f64>| p.x), 2.0, 0.0);
        let map = VersorModulusMap::new(noise.clone(), modulus);
        let p = Point3::new(0.25, -0.1, 0.4);
        let sample = map.sample(&p);
        assert_eq!(sample.versor, noise.sample(&p));
        assert!((sample.modulus - (2.0f64 * 0.25).exp()).abs() < 1e-12);
    }
}
