/// Event log — the ordered record of fired events and per-phase counts.

use rustc_hash::FxHashMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::core::timeline::Timeline;
use crate::schema::category::EventCategory;
use crate::schema::event::SimulatedEvent;

/// Events in firing order. Append-only while the simulation runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<SimulatedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn append(&mut self, event: SimulatedEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SimulatedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimulatedEvent> {
        self.events.iter()
    }

    /// Events of a single category, in firing order.
    pub fn of_category(&self, category: EventCategory) -> impl Iterator<Item = &SimulatedEvent> {
        self.events.iter().filter(move |e| e.category == category)
    }

    /// Bucket every event into the timeline phase containing its time.
    ///
    /// Every phase name in the table is present in the result, even when
    /// no event landed in it.
    pub fn count_by_phase(&self, timeline: &Timeline) -> PhaseCounts {
        let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
        for event in &self.events {
            *counts.entry(timeline.phase_at(event.time)).or_insert(0) += 1;
        }

        PhaseCounts {
            counts: timeline
                .phase_names()
                .into_iter()
                .map(|name| (name.to_string(), counts.get(name).copied().unwrap_or(0)))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a SimulatedEvent;
    type IntoIter = std::slice::Iter<'a, SimulatedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Phase name to event count, in timeline order.
///
/// Serializes as a map keyed by phase name, keeping the timeline order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseCounts {
    counts: Vec<(String, usize)>,
}

impl PhaseCounts {
    pub fn get(&self, phase: &str) -> usize {
        self.counts
            .iter()
            .find(|(name, _)| name == phase)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(name, n)| (name.as_str(), *n))
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

impl Serialize for PhaseCounts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (name, count) in &self.counts {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

struct PhaseCountsVisitor;

impl<'de> Visitor<'de> for PhaseCountsVisitor {
    type Value = PhaseCounts;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of phase name to event count")
    }

    fn visit_map<A>(self, mut access: A) -> Result<PhaseCounts, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut counts = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, count)) = access.next_entry::<String, usize>()? {
            counts.push((name, count));
        }
        Ok(PhaseCounts { counts })
    }
}

impl<'de> Deserialize<'de> for PhaseCounts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(PhaseCountsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_at(time: f64, category: EventCategory) -> SimulatedEvent {
        SimulatedEvent {
            time,
            category,
            emitter: "MidPlayer1".to_string(),
            decibels: -15.0,
            pitch_ratio: 1.0,
            intensity: 0.5,
        }
    }

    #[test]
    fn append_preserves_order() {
        let mut log = EventLog::new();
        assert!(log.is_empty());
        log.append(event_at(3.0, EventCategory::Creak));
        log.append(event_at(3.0, EventCategory::Roar));
        log.append(event_at(9.0, EventCategory::Creak));
        assert_eq!(log.len(), 3);
        assert_eq!(log.events()[1].category, EventCategory::Roar);
        assert_eq!(log.of_category(EventCategory::Creak).count(), 2);
    }

    #[test]
    fn count_by_default_phases() {
        let mut log = EventLog::new();
        for t in [5.0, 19.0, 20.0, 45.0, 79.0, 80.0, 109.0, 110.0, 118.0] {
            log.append(event_at(t, EventCategory::Creak));
        }
        let counts = log.count_by_phase(&Timeline::default());
        assert_eq!(counts.get("low"), 4);
        assert_eq!(counts.get("ramp"), 1);
        assert_eq!(counts.get("hold"), 2);
        assert_eq!(counts.get("decay"), 2);
        assert_eq!(counts.total(), log.len());
    }

    #[test]
    fn empty_log_lists_every_phase() {
        let counts = EventLog::new().count_by_phase(&Timeline::default());
        let names: Vec<&str> = counts.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["low", "ramp", "hold", "decay"]);
        assert_eq!(counts.total(), 0);
        assert_eq!(counts.get("missing"), 0);
    }

    #[test]
    fn phase_counts_serialize_as_ordered_map() {
        let mut log = EventLog::new();
        for t in [5.0, 45.0, 46.0, 90.0] {
            log.append(event_at(t, EventCategory::Creak));
        }
        let counts = log.count_by_phase(&Timeline::default());
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"low":1,"ramp":0,"hold":2,"decay":1}"#);

        let back: PhaseCounts = serde_json::from_str(&json).unwrap();
        assert_eq!(back, counts);
    }
}
