//! Snapshot fan-out
//!
//! Every published [`SessionState`] goes into one bounded broadcast buffer.
//! A reader that falls behind loses the oldest frames and carries on from the
//! oldest one still buffered, so a slow view never grows memory.

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use crate::sim::SessionState;

/// Snapshots kept for readers that fall behind
pub const SNAPSHOT_BUFFER: usize = 64;

/// Publishing side, owned by the session
pub(crate) struct SnapshotFeed {
    tx: broadcast::Sender<SessionState>,
}

impl SnapshotFeed {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(SNAPSHOT_BUFFER);
        Self { tx }
    }

    pub(crate) fn publish(&self, state: &SessionState) {
        // Fails only when nobody is subscribed
        let _ = self.tx.send(state.clone());
    }

    pub(crate) fn subscribe(&self, current: &SessionState) -> Subscription {
        Subscription {
            current: Some(current.clone()),
            rx: self.tx.subscribe(),
        }
    }
}

/// Reader of a session's snapshot stream
///
/// Yields the state current at subscription time first, then every
/// published snapshot. Ends once the session is dropped.
pub struct Subscription {
    current: Option<SessionState>,
    rx: broadcast::Receiver<SessionState>,
}

impl Subscription {
    /// Block until the next snapshot; `None` once the session is gone
    ///
    /// Must not be called from inside an async runtime.
    pub fn recv(&mut self) -> Option<SessionState> {
        if let Some(state) = self.current.take() {
            return Some(state);
        }
        loop {
            match self.rx.blocking_recv() {
                Ok(state) => return Some(state),
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("Snapshot reader skipped {} frames", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered snapshot, without blocking
    pub fn try_recv(&mut self) -> Option<SessionState> {
        if let Some(state) = self.current.take() {
            return Some(state);
        }
        loop {
            match self.rx.try_recv() {
                Ok(state) => return Some(state),
                Err(TryRecvError::Lagged(skipped)) => {
                    log::debug!("Snapshot reader skipped {} frames", skipped);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain the buffer and keep only the newest snapshot
    pub fn latest(&mut self) -> Option<SessionState> {
        let mut latest = None;
        while let Some(state) = self.try_recv() {
            latest = Some(state);
        }
        latest
    }
}

impl Iterator for Subscription {
    type Item = SessionState;

    fn next(&mut self) -> Option<SessionState> {
        self.recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_tick(tick: u64) -> SessionState {
        SessionState {
            tick,
            ..Default::default()
        }
    }

    #[test]
    fn test_current_state_comes_first() {
        let feed = SnapshotFeed::new();
        let mut sub = feed.subscribe(&at_tick(7));
        feed.publish(&at_tick(8));
        assert_eq!(sub.try_recv().map(|s| s.tick), Some(7));
        assert_eq!(sub.try_recv().map(|s| s.tick), Some(8));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn test_slow_reader_is_bounded() {
        let feed = SnapshotFeed::new();
        let mut sub = feed.subscribe(&at_tick(0));
        let published = SNAPSHOT_BUFFER as u64 * 10;
        for tick in 1..=published {
            feed.publish(&at_tick(tick));
        }

        let received: Vec<u64> = std::iter::from_fn(|| sub.try_recv()).map(|s| s.tick).collect();
        // Initial state plus at most one buffer's worth, ending at the newest
        assert!(received.len() <= SNAPSHOT_BUFFER + 1);
        assert_eq!(received.first(), Some(&0));
        assert_eq!(received.last(), Some(&published));
        assert!(received.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_stream_ends_with_feed() {
        let feed = SnapshotFeed::new();
        let mut sub = feed.subscribe(&at_tick(1));
        drop(feed);
        assert_eq!(sub.next().map(|s| s.tick), Some(1));
        assert_eq!(sub.next(), None);
    }
}
