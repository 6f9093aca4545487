//! Group-level events and their fan-out bus
//!
//! The sync group re-emits what happens to the logical transport as
//! [`GroupEvent`]s. Subscribers each get their own crossbeam receiver;
//! publishing never blocks the sync loop.

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::types::{BufferingEvent, Origin};

/// Something that happened to the group as a whole
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupEvent {
    Play { origin: Origin },
    Pause { origin: Origin },
    Seeking { current_time: f64, origin: Origin },
    RateChange { playback_rate: f64, origin: Origin },
    /// Playback stalled on a track; the group paused itself
    Waiting,
    /// The main track reached its end
    Ended,
    /// The group readiness level changed
    Buffering(BufferingEvent),
}

impl GroupEvent {
    /// Host-style event name
    pub fn name(&self) -> &'static str {
        match self {
            GroupEvent::Play { .. } => "play",
            GroupEvent::Pause { .. } => "pause",
            GroupEvent::Seeking { .. } => "seeking",
            GroupEvent::RateChange { .. } => "ratechange",
            GroupEvent::Waiting => "waiting",
            GroupEvent::Ended => "ended",
            GroupEvent::Buffering(event) => event.name(),
        }
    }
}

/// Fan-out channel: every subscriber receives every event
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<GroupEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a receiver for subscribing to events
    pub fn subscribe(&mut self) -> Receiver<GroupEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Publish an event to all live subscribers
    ///
    /// Subscribers whose receiver has been dropped are pruned.
    pub fn publish(&mut self, event: GroupEvent) {
        log::trace!("publish: {:?}", event);
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
