use serde::{Deserialize, Serialize};

use super::curve::{map_range, ControlCurve};

/// The closed set of ambient event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventCategory {
    Roar,
    Creak,
}

impl EventCategory {
    pub const ALL: [EventCategory; 2] = [EventCategory::Roar, EventCategory::Creak];

    /// Returns the report tag for this category (e.g., "ROAR").
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Roar => "ROAR",
            Self::Creak => "CREAK",
        }
    }

    /// Returns the lowercase name used in configuration paths.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Roar => "roar",
            Self::Creak => "creak",
        }
    }
}

/// An inclusive `(min, max)` range of physical values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn map(&self, normalized: f64) -> f64 {
        map_range(normalized, self.min, self.max)
    }

    pub fn scaled(&self, factor: f64) -> Range {
        Range::new(self.min * factor, self.max * factor)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl From<(f64, f64)> for Range {
    fn from((min, max): (f64, f64)) -> Self {
        Range::new(min, max)
    }
}

/// Validated tuning for one event category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTuning {
    pub kind: EventCategory,
    pub volume_curve: ControlCurve,
    pub pitch_curve: ControlCurve,
    /// Output level in decibels.
    pub decibel_range: Range,
    /// Playback-rate multiplier.
    pub pitch_range: Range,
    /// Base retrigger interval in simulated seconds.
    pub interval_range: Range,
    /// How strongly intensity shortens the retrigger interval.
    pub bias: f64,
    pub bias_scale: f64,
    /// Lower bound of the shrink factor.
    pub shrink_floor: f64,
    pub emitters: Vec<String>,
}

impl CategoryTuning {
    /// Interval multiplier at the given intensity, never below `shrink_floor`.
    pub fn shrink_factor(&self, intensity: f64) -> f64 {
        (1.0 - intensity * self.bias * self.bias_scale).max(self.shrink_floor)
    }

    /// Interval range to draw from after an event fired at `intensity`.
    pub fn shrunk_interval(&self, intensity: f64) -> Range {
        self.interval_range.scaled(self.shrink_factor(intensity))
    }

    /// Smallest interval this category can ever be rescheduled with.
    pub fn min_interval(&self) -> f64 {
        self.interval_range.min * self.shrink_floor
    }

    pub fn decibels_at(&self, intensity: f64) -> f64 {
        self.decibel_range.map(self.volume_curve.sample(intensity))
    }

    pub fn pitch_at(&self, intensity: f64) -> f64 {
        self.pitch_range.map(self.pitch_curve.sample(intensity))
    }
}
