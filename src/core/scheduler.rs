/// The event scheduler: fixed-step clock, per-category due times, and the
/// intensity feedback that shortens retrigger intervals under tension.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::log::{EventLog, PhaseCounts};
use crate::core::tuning::{TuningConfig, TuningError, TuningSource};
use crate::schema::category::{CategoryTuning, EventCategory};
use crate::schema::event::SimulatedEvent;

/// A category is due once the clock is within this distance of its due time.
pub const DUE_TOLERANCE: f64 = 1e-6;

const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("tuning error: {0}")]
    Tuning(#[from] TuningError),
}

/// When the next event of one category is due.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleState {
    pub category: EventCategory,
    pub due: f64,
    tuning_index: usize,
}

/// Draw the next retrigger interval for a category that just fired at
/// `intensity`.
pub fn next_interval<R: Rng>(tuning: &CategoryTuning, intensity: f64, rng: &mut R) -> f64 {
    let range = tuning.shrunk_interval(intensity);
    rng.gen_range(range.min..=range.max)
}

/// A single seeded simulation run. Built via `AmbienceSimulation::builder()`.
pub struct AmbienceSimulation {
    tuning: TuningConfig,
    rng: StdRng,
    seed: u64,
    clock: f64,
    schedule: Vec<ScheduleState>,
    log: EventLog,
}

/// Builder for constructing an `AmbienceSimulation`.
pub struct AmbienceSimulationBuilder {
    seed: u64,
    /// Directly provided tuning.
    tuning: Option<TuningConfig>,
    /// Deferred tuning, loaded at build time.
    source: Option<Box<dyn TuningSource>>,
}

impl AmbienceSimulation {
    pub fn builder() -> AmbienceSimulationBuilder {
        AmbienceSimulationBuilder {
            seed: DEFAULT_SEED,
            tuning: None,
            source: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn tuning(&self) -> &TuningConfig {
        &self.tuning
    }

    /// Due times in evaluation order.
    pub fn schedule(&self) -> &[ScheduleState] {
        &self.schedule
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn into_log(self) -> EventLog {
        self.log
    }

    pub fn is_finished(&self) -> bool {
        self.clock > self.tuning.horizon
    }

    pub fn phase_counts(&self) -> PhaseCounts {
        self.log.count_by_phase(&self.tuning.timeline)
    }

    /// Advance one step: fire every due category in order, then move the
    /// clock forward.
    pub fn tick(&mut self) {
        for slot in 0..self.schedule.len() {
            if self.clock >= self.schedule[slot].due - DUE_TOLERANCE {
                self.fire(slot);
            }
        }
        self.clock += self.tuning.step;
    }

    /// Run until the clock passes the horizon.
    pub fn run(&mut self) -> &EventLog {
        while !self.is_finished() {
            self.tick();
        }
        info!(
            seed = self.seed,
            events = self.log.len(),
            clock = self.clock,
            "simulation finished"
        );
        &self.log
    }

    fn fire(&mut self, slot: usize) {
        let clock = self.clock;
        let intensity = self.tuning.timeline.intensity_at(clock);
        let state = self.schedule[slot];
        let cat = &self.tuning.categories[state.tuning_index];

        let emitter = cat.emitters.choose(&mut self.rng).cloned().unwrap_or_default();
        let event = SimulatedEvent {
            time: clock,
            category: cat.kind,
            emitter,
            decibels: cat.decibels_at(intensity),
            pitch_ratio: cat.pitch_at(intensity),
            intensity,
        };
        debug!(
            time = event.time,
            category = event.category.tag(),
            emitter = %event.emitter,
            decibels = event.decibels,
            pitch = event.pitch_ratio,
            intensity,
            "event fired"
        );
        self.log.append(event);

        let interval = next_interval(cat, intensity, &mut self.rng);
        self.schedule[slot].due = clock + interval;
    }
}

impl AmbienceSimulationBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Provide a tuning directly.
    pub fn with_tuning(mut self, tuning: TuningConfig) -> Self {
        self.tuning = Some(tuning);
        self
    }

    /// Provide a source the tuning is loaded from at build time.
    pub fn tuning_source(mut self, source: impl TuningSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Validate the tuning, seed the generator and draw the initial due
    /// times. All setup failures surface here; `run` cannot fail.
    pub fn build(self) -> Result<AmbienceSimulation, SimulationError> {
        let tuning = match (self.tuning, self.source) {
            (Some(tuning), _) => tuning.load_tuning()?,
            (None, Some(source)) => source.load_tuning()?,
            (None, None) => TuningConfig::ashveil_default(),
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut schedule = Vec::with_capacity(tuning.order.len());
        for &category in &tuning.order {
            let tuning_index = tuning
                .categories
                .iter()
                .position(|c| c.kind == category)
                .ok_or_else(|| {
                    TuningError::ConfigurationMissing(format!("categories.{}", category.name()))
                })?;
            let base = tuning.categories[tuning_index].interval_range;
            schedule.push(ScheduleState {
                category,
                due: rng.gen_range(base.min..=base.max),
                tuning_index,
            });
        }

        info!(
            seed = self.seed,
            categories = schedule.len(),
            step = tuning.step,
            horizon = tuning.horizon,
            "simulation ready"
        );

        Ok(AmbienceSimulation {
            tuning,
            rng,
            seed: self.seed,
            clock: 0.0,
            schedule,
            log: EventLog::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeline::{PhaseSegment, PhaseShape, Timeline};

    fn run_default(seed: u64) -> AmbienceSimulation {
        let mut sim = AmbienceSimulation::builder().seed(seed).build().unwrap();
        sim.run();
        sim
    }

    fn flat_timeline(value: f64) -> Timeline {
        Timeline::new(vec![PhaseSegment {
            name: "flat".to_string(),
            start: 0.0,
            shape: PhaseShape::Constant(value),
        }])
        .unwrap()
    }

    #[test]
    fn same_seed_same_log() {
        let a = run_default(42);
        let b = run_default(42);
        assert!(!a.log().is_empty());
        assert_eq!(a.log(), b.log());
    }

    #[test]
    fn different_seed_different_log() {
        assert_ne!(run_default(42).log(), run_default(7).log());
    }

    #[test]
    fn initial_due_times_drawn_from_base_range() {
        let sim = AmbienceSimulation::builder().build().unwrap();
        assert_eq!(sim.seed(), 42);
        assert_eq!(sim.clock(), 0.0);
        let kinds: Vec<EventCategory> = sim.schedule().iter().map(|s| s.category).collect();
        assert_eq!(kinds, vec![EventCategory::Creak, EventCategory::Roar]);
        for state in sim.schedule() {
            let base = sim.tuning().category(state.category).unwrap().interval_range;
            assert!(base.contains(state.due));
        }
    }

    #[test]
    fn due_times_move_past_clock_after_firing() {
        let mut sim = AmbienceSimulation::builder().seed(3).build().unwrap();
        while !sim.is_finished() {
            let clock = sim.clock();
            let before = sim.log().len();
            sim.tick();
            if sim.log().len() > before {
                for state in sim.schedule() {
                    assert!(state.due > clock);
                }
            }
        }
    }

    #[test]
    fn run_stops_past_horizon() {
        let sim = run_default(42);
        assert!(sim.is_finished());
        assert_eq!(sim.clock(), 121.0);
        assert!(sim.log().iter().all(|e| e.time <= 120.0));
    }

    #[test]
    fn same_tick_events_follow_order() {
        let sim = run_default(42);
        let events = sim.log().events();
        for pair in events.windows(2) {
            assert!(pair[1].time >= pair[0].time);
            if pair[1].time == pair[0].time {
                assert_eq!(pair[0].category, EventCategory::Creak);
                assert_eq!(pair[1].category, EventCategory::Roar);
            }
        }
    }

    #[test]
    fn next_interval_respects_floor() {
        let tuning = TuningConfig::ashveil_default();
        let mut rng = StdRng::seed_from_u64(1);
        for cat in &tuning.categories {
            for i in 0..=20 {
                let intensity = i as f64 / 20.0;
                for _ in 0..50 {
                    let interval = next_interval(cat, intensity, &mut rng);
                    assert!(interval >= cat.min_interval());
                    assert!(interval >= cat.interval_range.min * cat.shrink_factor(intensity));
                    assert!(interval <= cat.interval_range.max);
                }
            }
        }
    }

    #[test]
    fn silent_timeline_pins_roar_to_floor() {
        let mut tuning = TuningConfig::ashveil_default();
        tuning.timeline = flat_timeline(0.0);
        let mut sim = AmbienceSimulation::builder().with_tuning(tuning).build().unwrap();
        sim.run();
        let roars: Vec<&SimulatedEvent> = sim.log().of_category(EventCategory::Roar).collect();
        assert!(!roars.is_empty());
        for e in roars {
            assert_eq!(e.decibels, -20.0);
            assert_eq!(e.pitch_ratio, 0.8);
        }
    }

    #[test]
    fn invalid_tuning_fails_build() {
        let mut tuning = TuningConfig::ashveil_default();
        tuning.categories.retain(|c| c.kind != EventCategory::Roar);
        let result = AmbienceSimulation::builder().with_tuning(tuning).build();
        assert!(matches!(
            result,
            Err(SimulationError::Tuning(TuningError::ConfigurationMissing(_)))
        ));
    }

    #[test]
    fn emitters_come_from_candidates() {
        let sim = run_default(42);
        for e in sim.log() {
            let cat = sim.tuning().category(e.category).unwrap();
            assert!(cat.emitters.contains(&e.emitter));
        }
    }
}
