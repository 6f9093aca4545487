//! Host boundary - media elements, audio graph and native event delivery
//!
//! The sync engine never decodes or renders media itself. Everything it
//! needs from the host is expressed by two traits:
//!
//! - [`MediaElement`]: one playable element (transport state + commands)
//! - [`AudioGraph`]: the shared audio routing graph
//!
//! Native events travel the other way through an [`EventSink`]:
//!
//! ```text
//! Host element ──emit()──► EventSink ──crossbeam──► SyncGroup inbox
//!                                                     │
//!                                           TrackFacade::observe()
//! ```
//!
//! A host adapter must emit the echo of every mutation it performs
//! (`seeking` after `set_current_time`, `play` after a successful `play`,
//! and so on), exactly as a browser media element would.

pub mod sim;

use crossbeam::channel::Sender;

use crate::error::MediaResult;
use crate::types::{BufferingEvent, TrackId};

/// A native event raised by a host media element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeEvent {
    /// A seek started; carries the target position in seconds
    Seeking { current_time: f64 },
    Play,
    Pause,
    /// Playback rate changed; carries the new rate
    RateChange { playback_rate: f64 },
    /// Playback stalled waiting for data
    Waiting,
    /// Playback reached the end of the media
    Ended,
    /// One of the five readiness events
    Buffering(BufferingEvent),
}

/// A native event tagged with the track that raised it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeSignal {
    pub track: TrackId,
    pub event: NativeEvent,
}

/// Sending half handed to a media element at registration
///
/// Cheap to clone. Emitting after the group has been dropped is a no-op.
#[derive(Debug, Clone)]
pub struct EventSink {
    track: TrackId,
    sender: Sender<NativeSignal>,
}

impl EventSink {
    pub fn new(track: TrackId, sender: Sender<NativeSignal>) -> Self {
        Self { track, sender }
    }

    /// The track this sink reports for
    pub fn track(&self) -> TrackId {
        self.track
    }

    /// Deliver a native event to the group inbox
    pub fn emit(&self, event: NativeEvent) {
        if self
            .sender
            .send(NativeSignal {
                track: self.track,
                event,
            })
            .is_err()
        {
            log::trace!("emit: group inbox closed, dropping {:?} from {}", event, self.track);
        }
    }
}

/// A host media element (audio or video)
///
/// Times are in seconds. `duration` is `NaN` until metadata is known.
pub trait MediaElement {
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, time: f64);
    fn duration(&self) -> f64;
    fn paused(&self) -> bool;
    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&mut self, rate: f64);
    /// Host readiness, 0 (nothing) to 4 (enough data)
    fn ready_state(&self) -> u8;
    /// Start playback; the host may refuse (autoplay policy)
    fn play(&mut self) -> MediaResult<()>;
    fn pause(&mut self);
    fn looping(&self) -> bool;
    fn set_looping(&mut self, looping: bool);
    /// Register the sink the element must emit its native events to
    fn attach(&mut self, sink: EventSink);
    /// Stop emitting native events
    fn detach(&mut self) {}
    /// Human readable name for logs
    fn label(&self) -> String {
        "media".to_string()
    }
}

/// Handle to a node in the host audio graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// The host's shared audio graph
///
/// All tracks route into the same `destination`; connecting or
/// disconnecting one track never affects the others.
pub trait AudioGraph {
    /// Create the source node for a track's element
    fn create_media_element_source(&mut self, track: TrackId) -> MediaResult<NodeId>;
    fn create_gain(&mut self) -> MediaResult<NodeId>;
    /// The shared sink every track ultimately feeds
    fn destination(&self) -> NodeId;
    fn connect(&mut self, from: NodeId, to: NodeId) -> MediaResult<()>;
    /// Remove every outgoing connection of `node`
    fn disconnect(&mut self, node: NodeId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_tags_track() {
        let (tx, rx) = crossbeam::channel::unbounded();
        let sink = EventSink::new(TrackId(3), tx);
        sink.emit(NativeEvent::Play);

        let signal = rx.try_recv().unwrap();
        assert_eq!(signal.track, TrackId(3));
        assert_eq!(signal.event, NativeEvent::Play);
    }

    #[test]
    fn test_sink_after_receiver_dropped() {
        let (tx, rx) = crossbeam::channel::unbounded();
        let sink = EventSink::new(TrackId(0), tx);
        drop(rx);
        // Must not panic
        sink.emit(NativeEvent::Pause);
    }
}
