//! Wind gust generator
//!
//! Two-state timer process: `Calm` waits a random interval, then a `Gusting`
//! period with random direction, strength and duration. Time only moves when
//! the owner calls [`WindGenerator::advance`], so a paused session simply stops
//! advancing it.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{Side, Wind};
use super::timer::Countdown;
use crate::tuning::{Span, Tuning};

/// Generator phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindPhase {
    Calm { timer: Countdown },
    Gusting {
        timer: Countdown,
        direction: Side,
        strength: f32,
    },
}

/// Transition emitted by the generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindEvent {
    GustStarted {
        direction: Side,
        strength: f32,
        /// Calm time that preceded this gust
        waited_ms: u64,
        /// Sampled gust length
        duration_ms: u64,
    },
    GustEnded {
        lasted_ms: u64,
    },
}

/// Randomized gust process
#[derive(Debug, Clone)]
pub struct WindGenerator {
    phase: WindPhase,
    rng: Pcg32,
    wait_ms: Span<u64>,
    duration_ms: Span<u64>,
    strength: Span<f32>,
}

impl WindGenerator {
    /// Start in `Calm` with a freshly sampled wait
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let wait = rng.random_range(tuning.wind_wait_ms.range());
        Self {
            phase: WindPhase::Calm {
                timer: Countdown::new(wait),
            },
            rng,
            wait_ms: tuning.wind_wait_ms,
            duration_ms: tuning.gust_duration_ms,
            strength: tuning.wind_strength,
        }
    }

    pub fn phase(&self) -> WindPhase {
        self.phase
    }

    /// Wind currently applied to the chicken
    pub fn wind(&self) -> Wind {
        match self.phase {
            WindPhase::Calm { .. } => Wind::CALM,
            WindPhase::Gusting {
                direction,
                strength,
                ..
            } => Wind::gust(direction, strength),
        }
    }

    /// Advance by `elapsed_ms` of simulated time, returning transitions in order
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<WindEvent> {
        let mut events = Vec::new();
        let mut budget = elapsed_ms;

        loop {
            let timer = match &mut self.phase {
                WindPhase::Calm { timer } | WindPhase::Gusting { timer, .. } => timer,
            };
            let overflow = match timer.advance(budget) {
                Some(overflow) => overflow,
                None => break,
            };
            budget = overflow;

            let event = self.transition();
            log::debug!("Wind: {:?}", event);
            events.push(event);
        }

        events
    }

    fn transition(&mut self) -> WindEvent {
        match self.phase {
            WindPhase::Calm { timer } => {
                let direction = Side::from_bool(self.rng.random_bool(0.5));
                let strength = self.rng.random_range(self.strength.range());
                let duration_ms = self.rng.random_range(self.duration_ms.range());
                self.phase = WindPhase::Gusting {
                    timer: Countdown::new(duration_ms),
                    direction,
                    strength,
                };
                WindEvent::GustStarted {
                    direction,
                    strength,
                    waited_ms: timer.duration_ms(),
                    duration_ms,
                }
            }
            WindPhase::Gusting { timer, .. } => {
                let wait = self.rng.random_range(self.wait_ms.range());
                self.phase = WindPhase::Calm {
                    timer: Countdown::new(wait),
                };
                WindEvent::GustEnded {
                    lasted_ms: timer.duration_ms(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_calm() {
        let wind = WindGenerator::new(7, &Tuning::default());
        assert!(matches!(wind.phase(), WindPhase::Calm { .. }));
        assert_eq!(wind.wind(), Wind::CALM);
    }

    #[test]
    fn test_no_gust_before_min_wait() {
        let mut wind = WindGenerator::new(1, &Tuning::default());
        assert!(wind.advance(3999).is_empty());
        assert!(!wind.wind().active);
    }

    #[test]
    fn test_same_seed_same_gusts() {
        let tuning = Tuning::default();
        let mut a = WindGenerator::new(42, &tuning);
        let mut b = WindGenerator::new(42, &tuning);
        for _ in 0..500 {
            assert_eq!(a.advance(100), b.advance(100));
        }
    }

    #[test]
    fn test_gust_applies_until_expiry() {
        let tuning = Tuning::default();
        let mut wind = WindGenerator::new(3, &tuning);
        let mut started = None;
        for _ in 0..100 {
            if let Some(WindEvent::GustStarted { duration_ms, .. }) = wind.advance(100).first() {
                started = Some(*duration_ms);
                break;
            }
        }
        let duration = started.expect("gust within 10s");
        let current = wind.wind();
        assert!(current.active);
        assert!(tuning.wind_strength.contains(current.strength));
        assert!(current.direction.is_some());

        // Large elapsed budgets cross the end of the gust in one call
        let events = wind.advance(duration);
        assert!(matches!(events.first(), Some(WindEvent::GustEnded { .. })));
        assert_eq!(wind.wind(), Wind::CALM);
    }

    proptest! {
        #[test]
        fn prop_intervals_within_bounds(seed in any::<u64>(), step in 1u64..400) {
            let tuning = Tuning::default();
            let mut wind = WindGenerator::new(seed, &tuning);
            for _ in 0..(120_000 / step) {
                for event in wind.advance(step) {
                    match event {
                        WindEvent::GustStarted { waited_ms, duration_ms, strength, .. } => {
                            prop_assert!((4000..=9000).contains(&waited_ms));
                            prop_assert!((2500..=4000).contains(&duration_ms));
                            prop_assert!(tuning.wind_strength.contains(strength));
                        }
                        WindEvent::GustEnded { lasted_ms } => {
                            prop_assert!((2500..=4000).contains(&lasted_ms));
                        }
                    }
                }
            }
        }
    }
}
