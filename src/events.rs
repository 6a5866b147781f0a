//! Typed engine events
//!
//! Analysis and Auto-DJ decisions are announced as [`EngineEvent`] values on
//! an [`EventBus`]. Each subscriber owns an unbounded
//! `crossbeam_channel::Receiver`; publishing never blocks and subscribers
//! whose receiver was dropped are pruned on the next publish.
//!
//! # Example
//!
//! ```
//! use segue_dsp::events::{EngineEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let rx = bus.subscribe();
//! bus.publish(EngineEvent::CacheHit { key: "path:/a.wav".to_string() });
//! assert!(matches!(rx.try_recv(), Ok(EngineEvent::CacheHit { .. })));
//! ```

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything the engine announces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// DSP pipeline started for a cache key
    AnalysisStarted {
        /// Display form of the cache key
        key: String,
    },
    /// DSP pipeline finished with a full analysis
    AnalysisCompleted {
        /// Display form of the cache key
        key: String,
        /// Detected BPM
        bpm: f32,
        /// Camelot code, if a key was found
        camelot_key: Option<String>,
    },
    /// DSP pipeline produced the fallback result
    AnalysisFallback {
        /// Display form of the cache key
        key: String,
        /// Why the analysis fell back
        reason: String,
    },
    /// Result served from the cache
    CacheHit {
        /// Display form of the cache key
        key: String,
    },
    /// Auto-DJ picked the next track
    NextTrackSelected {
        /// Currently playing track
        from: String,
        /// Chosen track
        to: String,
        /// Compatibility total
        score: f32,
        /// True when chosen by the fallback path
        fallback: bool,
    },
    /// A transition was (re)scheduled, replacing any earlier one
    TransitionScheduled {
        /// Monotonic schedule generation
        generation: u64,
        /// Incoming track
        next: String,
        /// Playback position of the outgoing track at which to start
        start_at_secs: f32,
        /// Crossfade length
        crossfade_secs: f32,
    },
    /// The playback controller reported a finished transition
    TransitionCompleted {
        /// Outgoing track
        from: String,
        /// Incoming track
        to: String,
        /// Controller/user verdict
        success: bool,
    },
    /// The user replaced the automatic choice
    NextTrackOverridden {
        /// Manually chosen track
        track: String,
        /// Compatibility total of the manual choice
        score: f32,
    },
}

/// Fan-out publisher of [`EngineEvent`]s
///
/// Cloning shares the subscriber list.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<EngineEvent>>>>,
}

impl EventBus {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Send an event to every live subscriber
    pub fn publish(&self, event: EngineEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers as of the last publish
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.publish(EngineEvent::AnalysisStarted { key: "k".to_string() });
        assert_eq!(a.try_recv(), Ok(EngineEvent::AnalysisStarted { key: "k".to_string() }));
        assert_eq!(b.try_recv(), Ok(EngineEvent::AnalysisStarted { key: "k".to_string() }));
    }

    #[test]
    fn test_dropped_subscriber_pruned() {
        let bus = EventBus::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);
        bus.publish(EngineEvent::CacheHit { key: "k".to_string() });
        assert_eq!(bus.subscriber_count(), 1);
        assert!(keep.try_recv().is_ok());
    }

    #[test]
    fn test_clone_shares_subscribers() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let other = bus.clone();
        other.publish(EngineEvent::NextTrackOverridden {
            track: "t".to_string(),
            score: 0.1,
        });
        assert!(rx.try_recv().is_ok());
    }
}
