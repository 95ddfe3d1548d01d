//! Portals fold space around their centres so the wrapped field repeats at
//! each portal, rotated and scaled.
//!
//! A portal description is a line-oriented `key: value` text file:
//!
//! ```text
//! # comment
//! portals radius: 0.5
//! portals scale: 2.0
//! portal location: 0.1 0.2 0.3
//! portal rotation: 1.0 0 1 0
//! ```
//!
//! Keys are case-insensitive. Each location/rotation pair appends one portal
//! with the radius and scale most recently declared.
use crate::error::PortalParseError;
use crate::traits::{ScalarField, VersorModulus, VersorModulusField};
use anyhow::{Context, Result};
use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use std::path::Path;
use tracing::{debug, info, warn};

const AXIS_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalSpec {
    pub center: Point3<f64>,
    pub axis: Unit<Vector3<f64>>,
    pub angle: f64,
    pub radius: f64,
    pub scale: f64,
}

impl PortalSpec {
    pub fn new(
        center: Point3<f64>,
        axis: Unit<Vector3<f64>>,
        angle: f64,
        radius: f64,
        scale: f64,
    ) -> Self {
        Self {
            center,
            axis,
            angle,
            radius,
            scale,
        }
    }

    pub fn rotation(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&self.axis, self.angle)
    }

    /// True when `point` lies in the closed ball of `radius` around the centre.
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (point - self.center).norm() <= self.radius
    }

    /// Maps `point` into the portal frame: `R^-1 (p - c) / scale`.
    pub fn to_local(&self, point: &Point3<f64>) -> Point3<f64> {
        let offset = self.rotation().inverse_transform_vector(&(point - self.center));
        Point3::from(offset / self.scale)
    }

    pub fn overlaps(&self, other: &PortalSpec) -> bool {
        (self.center - other.center).norm() < self.radius + other.radius
    }
}

/// Wraps a field with a list of portals; the first declared portal containing
/// a point wins, otherwise the wrapped field is sampled unchanged.
#[derive(Debug, Clone)]
pub struct PortalMap<F> {
    inner: F,
    portals: Vec<PortalSpec>,
}

impl<F: ScalarField> PortalMap<F> {
    pub fn new(inner: F, portals: Vec<PortalSpec>) -> Self {
        let map = Self { inner, portals };
        for (a, b) in map.overlapping_pairs() {
            warn!(
                first = a,
                second = b,
                "portals overlap; points in both resolve to the first declared"
            );
        }
        map
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn portals(&self) -> &[PortalSpec] {
        &self.portals
    }

    /// Index pairs `(a, b)` with `a < b` of portals whose balls intersect.
    pub fn overlapping_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (a, first) in self.portals.iter().enumerate() {
            for (b, second) in self.portals.iter().enumerate().skip(a + 1) {
                if first.overlaps(second) {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }

    /// Point the wrapped field is sampled at for a query at `point`.
    pub fn fold(&self, point: &Point3<f64>) -> Point3<f64> {
        first_containing(&self.portals, point).map_or(*point, |portal| portal.to_local(point))
    }
}

fn first_containing<'a>(portals: &'a [PortalSpec], point: &Point3<f64>) -> Option<&'a PortalSpec> {
    portals.iter().find(|portal| portal.contains(point))
}

impl<F: ScalarField> ScalarField for PortalMap<F> {
    fn evaluate(&self, point: &Point3<f64>) -> f64 {
        self.inner.evaluate(&self.fold(point))
    }
}

/// Versor-modulus source seen through the portals.
///
/// A point inside a portal is moved into the portal frame, and the base map is
/// sampled there when the moved point lies inside the `mask` set (negative
/// value). Otherwise the base map is sampled at the point itself. A Julia set
/// iterating this map grows copies of the masked shape at every portal the
/// orbit visits.
#[derive(Debug, Clone)]
pub struct PortalVersorMap<M, K> {
    base: M,
    mask: K,
    portals: Vec<PortalSpec>,
}

impl<M: VersorModulusField, K: ScalarField> PortalVersorMap<M, K> {
    pub fn new(base: M, mask: K, portals: Vec<PortalSpec>) -> Self {
        Self {
            base,
            mask,
            portals,
        }
    }

    pub fn portals(&self) -> &[PortalSpec] {
        &self.portals
    }

    pub fn mask(&self) -> &K {
        &self.mask
    }

    /// Point the base map is sampled at for a query at `point`.
    pub fn route(&self, point: &Point3<f64>) -> Point3<f64> {
        match first_containing(&self.portals, point) {
            Some(portal) => {
                let local = portal.to_local(point);
                if self.mask.evaluate(&local) < 0.0 {
                    local
                } else {
                    *point
                }
            }
            None => *point,
        }
    }
}

impl<M: VersorModulusField, K: ScalarField> VersorModulusField for PortalVersorMap<M, K> {
    fn sample(&self, point: &Point3<f64>) -> VersorModulus {
        self.base.sample(&self.route(point))
    }
}

pub fn load_portals(path: &Path) -> Result<Vec<PortalSpec>> {
    let text = std::fs::read_to_string(path)
        .map_err(PortalParseError::from)
        .with_context(|| format!("Failed to read portal file {}.", path.display()))?;
    let portals =
        parse_portals(&text).with_context(|| format!("Invalid portal file {}.", path.display()))?;
    info!(path = %path.display(), count = portals.len(), "loaded portals");
    Ok(portals)
}

/// Pending half of a portal declaration.
#[derive(Default)]
struct PortalBuilder {
    radius: Option<f64>,
    scale: Option<f64>,
    location: Option<(usize, Point3<f64>)>,
    rotation: Option<(usize, f64, Unit<Vector3<f64>>)>,
}

impl PortalBuilder {
    fn try_complete(&mut self, line: usize) -> Result<Option<PortalSpec>, PortalParseError> {
        if self.location.is_none() || self.rotation.is_none() {
            return Ok(None);
        }
        let radius = self.radius.ok_or(PortalParseError::MissingValue {
            line,
            key: "portals radius",
        })?;
        let scale = self.scale.ok_or(PortalParseError::MissingValue {
            line,
            key: "portals scale",
        })?;
        match (self.location.take(), self.rotation.take()) {
            (Some((_, center)), Some((_, angle, axis))) => {
                Ok(Some(PortalSpec::new(center, axis, angle, radius, scale)))
            }
            _ => Ok(None),
        }
    }
}

pub fn parse_portals(text: &str) -> Result<Vec<PortalSpec>, PortalParseError> {
    let mut builder = PortalBuilder::default();
    let mut portals = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            return Err(PortalParseError::MalformedLine {
                line,
                text: trimmed.to_string(),
            });
        };
        let key = normalize_key(key);
        match key.as_str() {
            "portals radius" => {
                let [radius] = parse_numbers::<1>(line, "portals radius", value)?;
                builder.radius = Some(positive(line, "portals radius", radius)?);
            }
            "portals scale" => {
                let [scale] = parse_numbers::<1>(line, "portals scale", value)?;
                builder.scale = Some(positive(line, "portals scale", scale)?);
            }
            "portal location" => {
                let [x, y, z] = parse_numbers::<3>(line, "portal location", value)?;
                if builder.location.is_some() {
                    warn!(line, "portal location redeclared before its rotation");
                }
                builder.location = Some((line, Point3::new(x, y, z)));
            }
            "portal rotation" => {
                let [angle, x, y, z] = parse_numbers::<4>(line, "portal rotation", value)?;
                let axis = Unit::try_new(Vector3::new(x, y, z), AXIS_EPS)
                    .ok_or(PortalParseError::ZeroAxis { line })?;
                if builder.rotation.is_some() {
                    warn!(line, "portal rotation redeclared before its location");
                }
                builder.rotation = Some((line, angle, axis));
            }
            other => {
                warn!(line, key = other, "ignoring unknown portal key");
                continue;
            }
        }
        if let Some(portal) = builder.try_complete(line)? {
            debug!(line, ?portal, "portal declared");
            portals.push(portal);
        }
    }

    if let Some((line, _)) = builder.location {
        warn!(line, "portal location without a rotation ignored");
    }
    if let Some((line, _, _)) = builder.rotation {
        warn!(line, "portal rotation without a location ignored");
    }
    Ok(portals)
}

fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_numbers<const N: usize>(
    line: usize,
    key: &'static str,
    value: &str,
) -> Result<[f64; N], PortalParseError> {
    let bad_value = || PortalParseError::BadValue {
        line,
        key,
        expected: N,
        value: value.trim().to_string(),
    };
    let mut numbers = [0.0; N];
    let mut count = 0;
    for token in value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
    {
        if count == N {
            return Err(bad_value());
        }
        let number: f64 = token.parse().map_err(|_| bad_value())?;
        if !number.is_finite() {
            return Err(bad_value());
        }
        numbers[count] = number;
        count += 1;
    }
    if count != N {
        return Err(bad_value());
    }
    Ok(numbers)
}

fn positive(line: usize, key: &'static str, value: f64) -> Result<f64, PortalParseError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(PortalParseError::NonPositive { line, key, value })
    }
}
