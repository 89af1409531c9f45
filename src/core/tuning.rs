/// Tuning configuration — loading, validation, and the injection seam used
/// by the simulation builder.

use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::core::timeline::{PhaseSegment, Timeline};
use crate::schema::category::{CategoryTuning, EventCategory, Range};
use crate::schema::curve::{ControlCurve, CurveError};

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),
    #[error(transparent)]
    InvalidCurve(#[from] CurveError),
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Fully validated tuning for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuningConfig {
    /// Clock advance per tick, in simulated seconds.
    pub step: f64,
    /// The run stops once the clock passes this value.
    pub horizon: f64,
    /// Category evaluation order within a tick.
    pub order: Vec<EventCategory>,
    pub timeline: Timeline,
    pub categories: Vec<CategoryTuning>,
}

/// Anything that can hand the simulation a validated tuning.
pub trait TuningSource {
    fn load_tuning(&self) -> Result<TuningConfig, TuningError>;
}

/// A RON tuning document on disk.
#[derive(Debug, Clone)]
pub struct RonTuningFile(pub PathBuf);

/// A RON tuning document held in memory.
#[derive(Debug, Clone)]
pub struct RonTuningText(pub String);

impl TuningSource for RonTuningFile {
    fn load_tuning(&self) -> Result<TuningConfig, TuningError> {
        TuningConfig::load_from_ron(&self.0)
    }
}

impl TuningSource for RonTuningText {
    fn load_tuning(&self) -> Result<TuningConfig, TuningError> {
        TuningConfig::parse_ron(&self.0)
    }
}

impl TuningSource for TuningConfig {
    fn load_tuning(&self) -> Result<TuningConfig, TuningError> {
        self.validate()?;
        Ok(self.clone())
    }
}

// RON deserialization helpers. Every field is optional on the wire so a
// missing one can be reported by name instead of as a parse error.
// Parsing enables `implicit_some`, so documents never spell out `Some(..)`.

#[derive(Debug, Deserialize)]
#[serde(rename = "Tuning")]
struct RonTuning {
    step: Option<f64>,
    horizon: Option<f64>,
    order: Option<Vec<EventCategory>>,
    timeline: Option<Vec<PhaseSegment>>,
    #[serde(default)]
    categories: Vec<RonCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Category")]
struct RonCategory {
    kind: Option<EventCategory>,
    volume_curve: Option<Vec<(f64, f64)>>,
    pitch_curve: Option<Vec<(f64, f64)>>,
    decibel_range: Option<(f64, f64)>,
    pitch_range: Option<(f64, f64)>,
    interval_range: Option<(f64, f64)>,
    bias: Option<f64>,
    bias_scale: Option<f64>,
    shrink_floor: Option<f64>,
    emitters: Option<Vec<String>>,
}

fn required<T>(value: Option<T>, path: &str) -> Result<T, TuningError> {
    value.ok_or_else(|| TuningError::ConfigurationMissing(path.to_string()))
}

impl RonCategory {
    fn into_tuning(self, index: usize) -> Result<CategoryTuning, TuningError> {
        let kind = required(self.kind, &format!("categories[{}].kind", index))?;
        let field = |name: &str| format!("{}.{}", kind.name(), name);

        Ok(CategoryTuning {
            kind,
            volume_curve: ControlCurve::new(&required(self.volume_curve, &field("volume_curve"))?)?,
            pitch_curve: ControlCurve::new(&required(self.pitch_curve, &field("pitch_curve"))?)?,
            decibel_range: required(self.decibel_range, &field("decibel_range"))?.into(),
            pitch_range: required(self.pitch_range, &field("pitch_range"))?.into(),
            interval_range: required(self.interval_range, &field("interval_range"))?.into(),
            bias: required(self.bias, &field("bias"))?,
            bias_scale: required(self.bias_scale, &field("bias_scale"))?,
            shrink_floor: required(self.shrink_floor, &field("shrink_floor"))?,
            emitters: required(self.emitters, &field("emitters"))?,
        })
    }
}

impl TuningConfig {
    /// Load a tuning from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<TuningConfig, TuningError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse_ron(&contents)?;
        info!(path = %path.display(), categories = config.categories.len(), "tuning loaded");
        Ok(config)
    }

    /// Parse and validate a tuning from a RON string.
    pub fn parse_ron(input: &str) -> Result<TuningConfig, TuningError> {
        let raw: RonTuning = ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(input)?;

        let timeline = match raw.timeline {
            Some(segments) => Timeline::new(segments).map_err(TuningError::InvalidValue)?,
            None => Timeline::default(),
        };

        let mut categories = Vec::with_capacity(raw.categories.len());
        for (i, cat) in raw.categories.into_iter().enumerate() {
            categories.push(cat.into_tuning(i)?);
        }

        let config = TuningConfig {
            step: raw.step.unwrap_or(1.0),
            horizon: raw.horizon.unwrap_or(120.0),
            order: required(raw.order, "order")?,
            timeline,
            categories,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reference tuning for the Ashveil creature ambience.
    pub fn ashveil_default() -> TuningConfig {
        let curve = ControlCurve::from_pairs_unchecked;

        let roar = CategoryTuning {
            kind: EventCategory::Roar,
            volume_curve: curve(&[(0.0, 0.0), (0.5, 0.12), (0.75, 0.6), (0.9, 0.7), (1.0, 1.0)]),
            pitch_curve: curve(&[(0.0, 0.0), (0.5, 0.48), (1.0, 1.0)]),
            decibel_range: Range::new(-20.0, -9.0),
            pitch_range: Range::new(0.8, 1.05),
            interval_range: Range::new(22.0, 55.0),
            bias: 0.35,
            bias_scale: 1.0,
            shrink_floor: 0.2,
            emitters: vec!["CollapsePlayer1".to_string()],
        };

        let creak = CategoryTuning {
            kind: EventCategory::Creak,
            volume_curve: curve(&[(0.0, 0.0), (0.4, 0.35), (0.7, 0.75), (1.0, 1.0)]),
            pitch_curve: curve(&[(0.0, 0.0), (0.8, 0.03), (1.0, 0.12)]),
            decibel_range: Range::new(-20.0, -10.0),
            pitch_range: Range::new(0.95, 1.05),
            interval_range: Range::new(6.0, 14.0),
            bias: 0.35,
            bias_scale: 0.5,
            shrink_floor: 0.3,
            emitters: vec!["MidPlayer1".to_string(), "MidPlayer2".to_string()],
        };

        TuningConfig {
            step: 1.0,
            horizon: 120.0,
            order: vec![EventCategory::Creak, EventCategory::Roar],
            timeline: Timeline::default(),
            categories: vec![roar, creak],
        }
    }

    /// Look up the tuning for a category.
    pub fn category(&self, kind: EventCategory) -> Option<&CategoryTuning> {
        self.categories.iter().find(|c| c.kind == kind)
    }

    /// Check cross-field constraints that deserialization cannot express.
    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |msg: String| -> Result<(), TuningError> { Err(TuningError::InvalidValue(msg)) };

        if !(self.step > 0.0 && self.step.is_finite()) {
            return invalid(format!("step must be positive and finite, got {}", self.step));
        }
        if !(self.horizon > 0.0 && self.horizon.is_finite()) {
            return invalid(format!("horizon must be positive and finite, got {}", self.horizon));
        }
        if self.order.is_empty() {
            return Err(TuningError::ConfigurationMissing("order".to_string()));
        }

        for (i, kind) in self.order.iter().enumerate() {
            if self.order[..i].contains(kind) {
                return invalid(format!("category {:?} appears twice in order", kind));
            }
            if self.category(*kind).is_none() {
                return Err(TuningError::ConfigurationMissing(format!(
                    "categories.{}",
                    kind.name()
                )));
            }
        }

        for (i, cat) in self.categories.iter().enumerate() {
            let name = cat.kind.name();
            if self.categories[..i].iter().any(|c| c.kind == cat.kind) {
                return invalid(format!("category {} is defined twice", name));
            }
            for (label, range) in [
                ("decibel_range", cat.decibel_range),
                ("pitch_range", cat.pitch_range),
                ("interval_range", cat.interval_range),
            ] {
                if !range.min.is_finite() || !range.max.is_finite() {
                    return invalid(format!(
                        "{}.{} must be finite ({}, {})",
                        name, label, range.min, range.max
                    ));
                }
                if range.min > range.max {
                    return invalid(format!(
                        "{}.{} is inverted ({}, {})",
                        name, label, range.min, range.max
                    ));
                }
            }
            if !(cat.interval_range.min > 0.0) {
                return invalid(format!("{}.interval_range minimum must be positive", name));
            }
            if !(cat.shrink_floor > 0.0 && cat.shrink_floor <= 1.0) {
                return invalid(format!("{}.shrink_floor must lie in (0, 1]", name));
            }
            for (label, value) in [("bias", cat.bias), ("bias_scale", cat.bias_scale)] {
                if !value.is_finite() {
                    return invalid(format!("{}.{} must be finite, got {}", name, label, value));
                }
            }
            if cat.bias < 0.0 || cat.bias_scale < 0.0 {
                return invalid(format!("{}.bias and bias_scale must not be negative", name));
            }
            if cat.emitters.is_empty() {
                return invalid(format!("{}.emitters is empty", name));
            }
        }

        Ok(())
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self::ashveil_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        (
            order: [Creak],
            categories: [
                (
                    kind: Creak,
                    volume_curve: [(0.0, 0.0), (1.0, 1.0)],
                    pitch_curve: [(0.0, 0.0), (1.0, 1.0)],
                    decibel_range: (-20.0, -10.0),
                    pitch_range: (0.95, 1.05),
                    interval_range: (6.0, 14.0),
                    bias: 0.35,
                    bias_scale: 0.5,
                    shrink_floor: 0.3,
                    emitters: ["MidPlayer1"],
                ),
            ],
        )
    "#;

    #[test]
    fn default_tuning_is_valid() {
        let t = TuningConfig::ashveil_default();
        t.validate().unwrap();
        assert_eq!(t.order, vec![EventCategory::Creak, EventCategory::Roar]);
        assert_eq!(t.category(EventCategory::Roar).unwrap().shrink_floor, 0.2);
        assert_eq!(t.category(EventCategory::Creak).unwrap().emitters.len(), 2);
    }

    #[test]
    fn default_curves_pass_curve_validation() {
        for cat in &TuningConfig::ashveil_default().categories {
            for curve in [&cat.volume_curve, &cat.pitch_curve] {
                let pairs: Vec<(f64, f64)> = curve.clone().into();
                assert_eq!(ControlCurve::new(&pairs).as_ref(), Ok(curve));
            }
        }
    }

    #[test]
    fn parse_minimal_ron_applies_defaults() {
        let t = TuningConfig::parse_ron(MINIMAL).unwrap();
        assert_eq!(t.step, 1.0);
        assert_eq!(t.horizon, 120.0);
        assert_eq!(t.timeline, Timeline::default());
        assert_eq!(t.categories.len(), 1);
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let input = MINIMAL.replace("bias_scale: 0.5,", "");
        match TuningConfig::parse_ron(&input) {
            Err(TuningError::ConfigurationMissing(field)) => {
                assert_eq!(field, "creak.bias_scale")
            }
            other => panic!("expected ConfigurationMissing, got {:?}", other),
        }
    }

    #[test]
    fn missing_order_is_reported() {
        let input = MINIMAL.replace("order: [Creak],", "");
        assert!(matches!(
            TuningConfig::parse_ron(&input),
            Err(TuningError::ConfigurationMissing(f)) if f == "order"
        ));
    }

    #[test]
    fn ordered_category_without_definition() {
        let input = MINIMAL.replace("order: [Creak]", "order: [Creak, Roar]");
        assert!(matches!(
            TuningConfig::parse_ron(&input),
            Err(TuningError::ConfigurationMissing(f)) if f == "categories.roar"
        ));
    }

    #[test]
    fn bad_curve_aborts_setup() {
        let input = MINIMAL.replace(
            "volume_curve: [(0.0, 0.0), (1.0, 1.0)]",
            "volume_curve: [(0.0, 0.0), (0.5, 0.3), (0.2, 1.0)]",
        );
        assert!(matches!(
            TuningConfig::parse_ron(&input),
            Err(TuningError::InvalidCurve(_))
        ));
    }

    #[test]
    fn inverted_interval_rejected() {
        let input = MINIMAL.replace("(6.0, 14.0)", "(14.0, 6.0)");
        assert!(matches!(
            TuningConfig::parse_ron(&input),
            Err(TuningError::InvalidValue(_))
        ));
    }

    #[test]
    fn zero_floor_rejected() {
        let mut t = TuningConfig::ashveil_default();
        t.categories[0].shrink_floor = 0.0;
        assert!(t.validate().is_err());
    }

    #[test]
    fn infinite_interval_bound_rejected() {
        let input = MINIMAL.replace("(6.0, 14.0)", "(6.0, inf)");
        match TuningConfig::parse_ron(&input) {
            Err(TuningError::InvalidValue(msg)) => assert!(msg.contains("creak.interval_range")),
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn infinite_horizon_rejected() {
        let input = MINIMAL.replacen("(", "(\n            horizon: inf,", 1);
        assert!(matches!(
            TuningConfig::parse_ron(&input),
            Err(TuningError::InvalidValue(_))
        ));
    }

    #[test]
    fn nan_values_rejected() {
        let cases: [fn(&mut TuningConfig); 6] = [
            |t| t.step = f64::NAN,
            |t| t.horizon = f64::NAN,
            |t| t.categories[0].decibel_range.min = f64::NAN,
            |t| t.categories[1].pitch_range.max = f64::NAN,
            |t| t.categories[0].bias = f64::NAN,
            |t| t.categories[1].bias_scale = f64::INFINITY,
        ];
        for (i, apply) in cases.iter().enumerate() {
            let mut t = TuningConfig::ashveil_default();
            apply(&mut t);
            assert!(
                matches!(t.validate(), Err(TuningError::InvalidValue(_))),
                "case {} validated",
                i
            );
        }
        let mut t = TuningConfig::ashveil_default();
        t.categories[0].shrink_floor = f64::NAN;
        assert!(matches!(t.validate(), Err(TuningError::InvalidValue(_))));
    }

    #[test]
    fn duplicate_order_rejected() {
        let mut t = TuningConfig::ashveil_default();
        t.order.push(EventCategory::Creak);
        assert!(matches!(t.validate(), Err(TuningError::InvalidValue(_))));
    }

    #[test]
    fn in_memory_config_is_a_source() {
        let t = TuningConfig::ashveil_default();
        assert_eq!(t.load_tuning().unwrap(), t);
        let text = RonTuningText(MINIMAL.to_string());
        assert_eq!(text.load_tuning().unwrap().order, vec![EventCategory::Creak]);
    }

    #[test]
    fn load_fixture_file() {
        let source = RonTuningFile(PathBuf::from("tests/fixtures/ashveil_tuning.ron"));
        let t = source.load_tuning().unwrap();
        assert_eq!(t, TuningConfig::ashveil_default());
    }
}
