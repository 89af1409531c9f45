use serde::{Deserialize, Serialize};

use super::category::EventCategory;

/// A fired ambient event. Values are kept at full precision;
/// rounding happens only when a report is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedEvent {
    /// Simulated seconds since the start of the run.
    pub time: f64,
    pub category: EventCategory,
    pub emitter: String,
    pub decibels: f64,
    pub pitch_ratio: f64,
    pub intensity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_creation() {
        let event = SimulatedEvent {
            time: 14.0,
            category: EventCategory::Creak,
            emitter: "MidPlayer2".to_string(),
            decibels: -16.5,
            pitch_ratio: 0.953,
            intensity: 0.1,
        };
        assert_eq!(event.category, EventCategory::Creak);
        assert_eq!(event.emitter, "MidPlayer2");
        assert_eq!(event.clone(), event);
    }
}
