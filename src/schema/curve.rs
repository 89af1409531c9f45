/// Control curves — piecewise-linear tuning curves and range mapping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    #[error("invalid curve: {0}")]
    InvalidCurve(String),
}

/// A single break point of a control curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub position: f64,
    pub value: f64,
}

/// An ordered, validated set of break points in the unit square.
///
/// Positions are strictly increasing and start at `0.0`; values lie in
/// `[0, 1]`. Once constructed the curve cannot be changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "Vec<(f64, f64)>")]
pub struct ControlCurve {
    points: Vec<CurvePoint>,
}

impl ControlCurve {
    /// Build a curve from `(position, value)` pairs.
    pub fn new(pairs: &[(f64, f64)]) -> Result<ControlCurve, CurveError> {
        let points: Vec<CurvePoint> = pairs
            .iter()
            .map(|&(position, value)| CurvePoint { position, value })
            .collect();
        Self::from_points(points)
    }

    pub fn from_points(points: Vec<CurvePoint>) -> Result<ControlCurve, CurveError> {
        let first = points
            .first()
            .ok_or_else(|| CurveError::InvalidCurve("curve has no points".to_string()))?;
        if first.position != 0.0 {
            return Err(CurveError::InvalidCurve(format!(
                "first position must be 0.0, got {}",
                first.position
            )));
        }

        for (i, p) in points.iter().enumerate() {
            if !(0.0..=1.0).contains(&p.position) || !(0.0..=1.0).contains(&p.value) {
                return Err(CurveError::InvalidCurve(format!(
                    "point {} ({}, {}) lies outside [0, 1]",
                    i, p.position, p.value
                )));
            }
        }

        for pair in points.windows(2) {
            if pair[1].position <= pair[0].position {
                return Err(CurveError::InvalidCurve(format!(
                    "positions must be strictly increasing ({} then {})",
                    pair[0].position, pair[1].position
                )));
            }
        }

        Ok(ControlCurve { points })
    }

    /// Build a curve from literal pairs known to satisfy the invariants.
    pub(crate) fn from_pairs_unchecked(pairs: &[(f64, f64)]) -> ControlCurve {
        ControlCurve {
            points: pairs
                .iter()
                .map(|&(position, value)| CurvePoint { position, value })
                .collect(),
        }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Evaluate the curve at normalized abscissa `t`.
    ///
    /// Flat below the first point and above the last; linear between
    /// break points. A zero-width segment contributes its left value.
    pub fn sample(&self, t: f64) -> f64 {
        let first = self.points[0];
        if t <= first.position {
            return first.value;
        }

        for pair in self.points.windows(2) {
            let (p0, p1) = (pair[0], pair[1]);
            if t <= p1.position {
                let span = p1.position - p0.position;
                let u = if span != 0.0 {
                    (t - p0.position) / span
                } else {
                    0.0
                };
                return p0.value + (p1.value - p0.value) * u;
            }
        }

        self.points[self.points.len() - 1].value
    }

    /// True if values never decrease along the curve.
    pub fn is_monotone(&self) -> bool {
        self.points.windows(2).all(|w| w[1].value >= w[0].value)
    }
}

impl From<ControlCurve> for Vec<(f64, f64)> {
    fn from(curve: ControlCurve) -> Self {
        curve.points.iter().map(|p| (p.position, p.value)).collect()
    }
}

impl<'de> Deserialize<'de> for ControlCurve {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let pairs: Vec<(f64, f64)> = Vec::deserialize(deserializer)?;
        ControlCurve::new(&pairs).map_err(serde::de::Error::custom)
    }
}

/// Affinely rescale a normalized value into `[low, high]`.
///
/// No clamping: callers pass values already bounded to `[0, 1]`.
pub fn map_range(value: f64, low: f64, high: f64) -> f64 {
    low + (high - low) * value
}
