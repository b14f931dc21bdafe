//! Scoring
//!
//! Points are a pure function of survival time. At game over the run is
//! folded into the lifetime totals, in memory first and then through the
//! persistence collaborator.

use crate::persistence::Persistence;
use crate::sim::SessionState;

/// Points earned for a survival time (`floor(ms / interval)`)
#[inline]
pub fn session_points(survival_time_ms: u64, points_interval_ms: u64) -> u32 {
    let points = survival_time_ms / points_interval_ms.max(1);
    u32::try_from(points).unwrap_or(u32::MAX)
}

/// Outcome of folding a finished run into the lifetime totals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalScore {
    pub survival_time_ms: u64,
    pub session_points: u32,
    /// `max(previous best, survival time)`
    pub best_time_ms: u64,
    /// Lifetime points including this run
    pub total_points: u32,
    pub new_best: bool,
    /// Whether both persistence writes succeeded
    pub persisted: bool,
}

/// Compute the final totals and push them to the store
///
/// Both writes are attempted even if the first one fails. The returned totals
/// come from `state` and are authoritative regardless of storage outcome.
pub fn finalize<P: Persistence + ?Sized>(store: &mut P, state: &SessionState) -> FinalScore {
    let survival = state.survival_time_ms;
    let points = state.session_points;

    let best_write = store.set_best_time_if_greater(survival);
    if let Err(e) = &best_write {
        log::warn!("Failed to store best time {}ms: {}", survival, e);
    }
    let points_write = store.add_points(points);
    if let Err(e) = &points_write {
        log::warn!("Failed to add {} points: {}", points, e);
    }

    FinalScore {
        survival_time_ms: survival,
        session_points: points,
        best_time_ms: state.best_time_ms.max(survival),
        total_points: state.total_points.saturating_add(points),
        new_best: survival > state.best_time_ms,
        persisted: best_write.is_ok() && points_write.is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{
        MemoryStore, PlayerProfile, ProfileBackend, ProfileOp, StoreError,
    };
    use proptest::prelude::*;

    /// Store whose best-time writes always fail
    struct BrokenBestTime {
        profile: PlayerProfile,
        attempts: Vec<ProfileOp>,
    }

    impl ProfileBackend for BrokenBestTime {
        fn current(&self) -> &PlayerProfile {
            &self.profile
        }

        fn commit(&mut self, op: ProfileOp) -> Result<bool, StoreError> {
            self.attempts.push(op);
            if matches!(op, ProfileOp::BestTime(_)) {
                return Err(StoreError::Unavailable("disk full".into()));
            }
            Ok(op.apply(&mut self.profile))
        }
    }

    fn finished(survival_time_ms: u64, best_time_ms: u64, total_points: u32) -> SessionState {
        SessionState {
            survival_time_ms,
            session_points: session_points(survival_time_ms, 500),
            best_time_ms,
            total_points,
            ..Default::default()
        }
    }

    #[test]
    fn test_points_examples() {
        assert_eq!(session_points(0, 500), 0);
        assert_eq!(session_points(499, 500), 0);
        assert_eq!(session_points(500, 500), 1);
        assert_eq!(session_points(8342, 500), 16);
    }

    #[test]
    fn test_finalize_updates_store() {
        let mut store = MemoryStore::new();
        let score = finalize(&mut store, &finished(8342, 5000, 100));
        assert_eq!(score.session_points, 16);
        assert_eq!(score.best_time_ms, 8342);
        assert_eq!(score.total_points, 116);
        assert!(score.new_best);
        assert!(score.persisted);
        assert_eq!(store.points(), 16);
        assert_eq!(store.best_time_ms(), 8342);
    }

    #[test]
    fn test_finalize_keeps_best() {
        let mut store = MemoryStore::new();
        store.set_best_time_if_greater(20_000).unwrap();
        let score = finalize(&mut store, &finished(3000, 20_000, 0));
        assert_eq!(score.best_time_ms, 20_000);
        assert!(!score.new_best);
        assert_eq!(store.best_time_ms(), 20_000);
    }

    #[test]
    fn test_points_written_even_if_best_time_fails() {
        let mut store = BrokenBestTime {
            profile: PlayerProfile::default(),
            attempts: Vec::new(),
        };
        let score = finalize(&mut store, &finished(8342, 0, 0));
        assert!(!score.persisted);
        assert_eq!(score.total_points, 16);
        assert_eq!(
            store.attempts,
            vec![ProfileOp::BestTime(8342), ProfileOp::AddPoints(16)]
        );
        assert_eq!(store.profile.points, 16);
    }

    proptest! {
        #[test]
        fn prop_points_are_floor_division(ms in 0u64..10_000_000) {
            let points = session_points(ms, 500);
            prop_assert_eq!(points as u64, ms / 500);
            prop_assert!(points as u64 * 500 <= ms);
            prop_assert!((points as u64 + 1) * 500 > ms);
        }
    }
}
