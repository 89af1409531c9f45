/// Intensity timeline — the shared phase table and the intensity signal.
///
/// The same table drives both the intensity value at a given time and the
/// phase an event is reported under, so the two can never disagree.

use serde::{Deserialize, Serialize};

/// How a phase produces its intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PhaseShape {
    /// Holds a fixed value for the whole phase.
    Constant(f64),
    /// Moves linearly from `from` at the phase start to `to` at the next
    /// phase start.
    Ramp { from: f64, to: f64 },
}

/// One contiguous phase, starting at `start` and running until the next
/// segment's start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSegment {
    pub name: String,
    pub start: f64,
    pub shape: PhaseShape,
}

/// Ordered phase table over simulated time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PhaseSegment>", into = "Vec<PhaseSegment>")]
pub struct Timeline {
    segments: Vec<PhaseSegment>,
}

impl Timeline {
    /// Build a timeline, checking that it starts at zero, that starts are
    /// finite and strictly increasing, that values stay in `[0, 1]` and
    /// that the final segment is open-ended (constant).
    pub fn new(segments: Vec<PhaseSegment>) -> Result<Timeline, String> {
        let first = segments.first().ok_or("timeline has no phases")?;
        if first.start != 0.0 {
            return Err(format!("first phase must start at 0.0, got {}", first.start));
        }
        if let Some(seg) = segments.iter().find(|s| !s.start.is_finite()) {
            return Err(format!("phase '{}' has a non-finite start", seg.name));
        }
        for pair in segments.windows(2) {
            if pair[1].start <= pair[0].start {
                return Err(format!(
                    "phase '{}' must start after phase '{}'",
                    pair[1].name, pair[0].name
                ));
            }
        }
        for seg in &segments {
            let values = match seg.shape {
                PhaseShape::Constant(v) => [v, v],
                PhaseShape::Ramp { from, to } => [from, to],
            };
            if values.iter().any(|v| !(0.0..=1.0).contains(v)) {
                return Err(format!("phase '{}' leaves [0, 1]", seg.name));
            }
        }
        if let Some(last) = segments.last() {
            if matches!(last.shape, PhaseShape::Ramp { .. }) {
                return Err(format!("final phase '{}' must be constant", last.name));
            }
        }
        Ok(Timeline { segments })
    }

    /// The default timeline: quiet, rising, sustained peak, decaying, then
    /// a quiet tail reported under the same name as the opening phase.
    pub fn ashveil_default() -> Timeline {
        let seg = |name: &str, start: f64, shape: PhaseShape| PhaseSegment {
            name: name.to_string(),
            start,
            shape,
        };
        Timeline {
            segments: vec![
                seg("low", 0.0, PhaseShape::Constant(0.1)),
                seg("ramp", 20.0, PhaseShape::Ramp { from: 0.1, to: 0.8 }),
                seg("hold", 40.0, PhaseShape::Constant(0.9)),
                seg("decay", 80.0, PhaseShape::Ramp { from: 0.9, to: 0.2 }),
                seg("low", 110.0, PhaseShape::Constant(0.2)),
            ],
        }
    }

    pub fn segments(&self) -> &[PhaseSegment] {
        &self.segments
    }

    /// Distinct phase names in first-appearance order.
    pub fn phase_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for seg in &self.segments {
            if !names.contains(&seg.name.as_str()) {
                names.push(&seg.name);
            }
        }
        names
    }

    fn segment_index(&self, t: f64) -> usize {
        // Times before zero fall into the first phase.
        self.segments
            .iter()
            .rposition(|seg| t >= seg.start)
            .unwrap_or(0)
    }

    /// Name of the phase containing time `t`.
    pub fn phase_at(&self, t: f64) -> &str {
        &self.segments[self.segment_index(t)].name
    }

    /// Intensity at simulated time `t`.
    pub fn intensity_at(&self, t: f64) -> f64 {
        let i = self.segment_index(t);
        let seg = &self.segments[i];
        match seg.shape {
            PhaseShape::Constant(v) => v,
            PhaseShape::Ramp { from, to } => {
                // Validation guarantees a ramp is never the last segment.
                let end = self.segments[i + 1].start;
                from + (t - seg.start) / (end - seg.start) * (to - from)
            }
        }
    }
}

impl TryFrom<Vec<PhaseSegment>> for Timeline {
    type Error = String;

    fn try_from(segments: Vec<PhaseSegment>) -> Result<Self, Self::Error> {
        Timeline::new(segments)
    }
}

impl From<Timeline> for Vec<PhaseSegment> {
    fn from(timeline: Timeline) -> Self {
        timeline.segments
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::ashveil_default()
    }
}
