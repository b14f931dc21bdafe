//! Ambient falling leaves
//!
//! Purely cosmetic. Leaves spawn in small batches on a random interval, fall
//! at their own speed, spin, and drift sideways with the wind.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{LeafParticle, Wind};
use super::timer::Countdown;
use crate::consts::{LEAF_DESPAWN_Y, LEAF_SPAWN_Y, LEAF_WIND_FACTOR};
use crate::tuning::{Span, Tuning};

/// Random-interval leaf spawner
#[derive(Debug, Clone)]
pub struct LeafSpawner {
    timer: Countdown,
    rng: Pcg32,
    interval_ms: Span<u64>,
    batch: Span<u32>,
    speed: Span<f32>,
}

impl LeafSpawner {
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let first = rng.random_range(tuning.leaf_spawn_ms.range());
        Self {
            timer: Countdown::new(first),
            rng,
            interval_ms: tuning.leaf_spawn_ms,
            batch: tuning.leaf_batch,
            speed: tuning.leaf_speed,
        }
    }

    /// Time until the next batch
    pub fn remaining_ms(&self) -> u64 {
        self.timer.remaining_ms()
    }

    /// Advance by `elapsed_ms`, returning any newly spawned leaves
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<LeafParticle> {
        let mut spawned = Vec::new();
        let mut budget = elapsed_ms;
        while let Some(overflow) = self.timer.advance(budget) {
            budget = overflow;
            self.spawn_batch(&mut spawned);
            let next = self.rng.random_range(self.interval_ms.range());
            self.timer = Countdown::new(next);
        }
        if !spawned.is_empty() {
            log::debug!("Spawned {} leaves", spawned.len());
        }
        spawned
    }

    fn spawn_batch(&mut self, out: &mut Vec<LeafParticle>) {
        let count = self.rng.random_range(self.batch.range());
        for _ in 0..count {
            out.push(LeafParticle {
                pos: Vec2::new(self.rng.random::<f32>(), LEAF_SPAWN_Y),
                speed: self.rng.random_range(self.speed.range()),
                rotation: self.rng.random::<f32>() * 360.0,
            });
        }
    }
}

/// Move every leaf by `dt_secs`, dropping those that left the screen
pub fn update_leaves(leaves: &[LeafParticle], wind: Wind, dt_secs: f32) -> Vec<LeafParticle> {
    let wind_dx = if wind.active {
        wind.force() * LEAF_WIND_FACTOR
    } else {
        0.0
    };

    leaves
        .iter()
        .filter_map(|leaf| {
            let y = leaf.pos.y + leaf.speed * dt_secs;
            if y > LEAF_DESPAWN_Y {
                return None;
            }
            Some(LeafParticle {
                pos: Vec2::new(leaf.pos.x + wind_dx * dt_secs, y),
                speed: leaf.speed,
                rotation: (leaf.rotation + leaf.speed * 360.0 * dt_secs).rem_euclid(360.0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Side;

    #[test]
    fn test_spawns_batches_within_bounds() {
        let tuning = Tuning::default();
        let mut spawner = LeafSpawner::new(9, &tuning);
        assert!(spawner.advance(2999).is_empty());

        let mut batches = 0;
        for _ in 0..600 {
            let leaves = spawner.advance(100);
            if !leaves.is_empty() {
                batches += 1;
                assert!((1..=3).contains(&leaves.len()));
                for leaf in &leaves {
                    assert!((0.0..1.0).contains(&leaf.pos.x));
                    assert_eq!(leaf.pos.y, LEAF_SPAWN_Y);
                    assert!(tuning.leaf_speed.contains(leaf.speed));
                }
            }
        }
        // 60s of time at most 8s apart
        assert!(batches >= 7);
    }

    #[test]
    fn test_leaves_fall_and_expire() {
        let leaf = LeafParticle {
            pos: Vec2::new(0.5, 1.0),
            speed: 0.25,
            rotation: 350.0,
        };
        let moved = update_leaves(&[leaf], Wind::CALM, 0.2);
        assert_eq!(moved.len(), 1);
        assert!((moved[0].pos.y - 1.05).abs() < 1e-6);
        assert_eq!(moved[0].pos.x, 0.5);
        assert!(moved[0].rotation < 360.0);

        let gone = update_leaves(&moved, Wind::CALM, 0.4);
        assert!(gone.is_empty());
    }

    #[test]
    fn test_wind_pushes_leaves_sideways() {
        let leaf = LeafParticle {
            pos: Vec2::new(0.5, 0.0),
            speed: 0.2,
            rotation: 0.0,
        };
        let left = update_leaves(&[leaf], Wind::gust(Side::Left, 24.0), 0.1);
        let right = update_leaves(&[leaf], Wind::gust(Side::Right, 24.0), 0.1);
        assert!(left[0].pos.x < 0.5);
        assert!(right[0].pos.x > 0.5);
    }
}
