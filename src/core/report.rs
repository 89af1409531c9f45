/// Reporting — rounded event records, phase summary, and text/JSON output.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::core::bindings::{display_name, EmitterResolver};
use crate::core::log::{EventLog, PhaseCounts};
use crate::core::scheduler::AmbienceSimulation;
use crate::schema::event::SimulatedEvent;

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// A report line for one event, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub time: f64,
    pub category: String,
    pub emitter: String,
    pub decibels: f64,
    pub pitch_ratio: f64,
    pub intensity: f64,
}

impl From<&SimulatedEvent> for EventRecord {
    fn from(event: &SimulatedEvent) -> Self {
        Self {
            time: round_to(event.time, 2),
            category: event.category.tag().to_string(),
            emitter: event.emitter.clone(),
            decibels: round_to(event.decibels, 2),
            pitch_ratio: round_to(event.pitch_ratio, 3),
            intensity: round_to(event.intensity, 3),
        }
    }
}

/// One emitter and where it is routed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingLine {
    pub emitter: String,
    pub target: Option<String>,
}

/// Everything a finished run reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub events: Vec<EventRecord>,
    pub phase_counts: PhaseCounts,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<BindingLine>,
}

impl SimulationReport {
    pub fn new(seed: u64, log: &EventLog, phase_counts: PhaseCounts) -> Self {
        Self {
            seed,
            events: log.iter().map(EventRecord::from).collect(),
            phase_counts,
            bindings: Vec::new(),
        }
    }

    /// Report for a simulation that has already run.
    pub fn from_simulation(sim: &AmbienceSimulation) -> Self {
        Self::new(sim.seed(), sim.log(), sim.phase_counts())
    }

    /// Attach the routing of every emitter that appears in the events, or
    /// of every listed name when `emitters` is given.
    pub fn with_bindings(mut self, resolver: &dyn EmitterResolver, emitters: &[&str]) -> Self {
        let mut names: Vec<&str> = if emitters.is_empty() {
            self.events.iter().map(|e| e.emitter.as_str()).collect()
        } else {
            emitters.to_vec()
        };
        names.sort_unstable();
        names.dedup();

        self.bindings = names
            .into_iter()
            .map(|name| BindingLine {
                emitter: name.to_string(),
                target: resolver.resolve(name).map(|p| display_name(p).to_string()),
            })
            .collect();
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering: one line per event, then the phase summary
    /// and any bindings.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Simulated events (seed {}):", self.seed);
        for e in &self.events {
            let _ = writeln!(
                out,
                "  t={:>6.2}  {:<5}  {:<16} db={:>7.2}  pitch={:.3}  intensity={:.3}",
                e.time, e.category, e.emitter, e.decibels, e.pitch_ratio, e.intensity
            );
        }

        let _ = writeln!(out, "\nEvent counts by phase:");
        for (phase, count) in self.phase_counts.iter() {
            let _ = writeln!(out, "  {:<8} {}", phase, count);
        }
        let _ = writeln!(out, "  {:<8} {}", "total", self.phase_counts.total());

        if !self.bindings.is_empty() {
            let _ = writeln!(out, "\nBindings used:");
            for b in &self.bindings {
                let target = b.target.as_deref().unwrap_or("<unbound>");
                let _ = writeln!(out, "  {} -> {}", b.emitter, target);
            }
        }
        out
    }
}
