//! Simulated host - in-memory media elements and audio graph
//!
//! Behaves like a browser media element closely enough to exercise the
//! sync engine without a real host:
//!
//! - Every mutation emits its native echo through the attached sink
//! - Autoplay can be blocked, making `play()` reject
//! - `advance()` moves the playhead and raises `pause` + `ended` at the end
//!
//! Handles are cheap clones sharing one state, so a test can keep a handle
//! while the group owns another. Methods prefixed `user_` model a person
//! using the element's native controls and are not counted as calls.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::error::{MediaError, MediaResult};
use crate::types::{ReadinessLevel, TrackId};

use super::{AudioGraph, EventSink, MediaElement, NativeEvent, NodeId};

/// Shared state behind a [`SimMediaElement`]
#[derive(Debug)]
struct SimState {
    label: String,
    current_time: f64,
    duration: f64,
    paused: bool,
    playback_rate: f64,
    ready_state: ReadinessLevel,
    looping: bool,
    autoplay_blocked: bool,
    sink: Option<EventSink>,
    // Calls made through the MediaElement trait
    play_calls: usize,
    pause_calls: usize,
    seek_calls: Vec<f64>,
    rate_calls: Vec<f64>,
}

/// In-memory media element
#[derive(Debug, Clone)]
pub struct SimMediaElement {
    state: Rc<RefCell<SimState>>,
}

impl SimMediaElement {
    /// Create a paused element with enough data buffered
    pub fn new(label: &str, duration: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState {
                label: label.to_string(),
                current_time: 0.0,
                duration,
                paused: true,
                playback_rate: 1.0,
                ready_state: ReadinessLevel::EnoughData,
                looping: false,
                autoplay_blocked: false,
                sink: None,
                play_calls: 0,
                pause_calls: 0,
                seek_calls: Vec::new(),
                rate_calls: Vec::new(),
            })),
        }
    }

    /// Builder-style initial readiness
    pub fn with_ready_state(self, level: ReadinessLevel) -> Self {
        self.state.borrow_mut().ready_state = level;
        self
    }

    fn emit(&self, event: NativeEvent) {
        // Clone the sink first so no borrow is held while the event is queued
        let sink = self.state.borrow().sink.clone();
        if let Some(sink) = sink {
            sink.emit(event);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Native controls (user interaction)
    // ─────────────────────────────────────────────────────────────

    /// Press the element's own play button
    pub fn user_play(&self) {
        let changed = {
            let mut s = self.state.borrow_mut();
            let was_paused = s.paused;
            s.paused = false;
            was_paused
        };
        if changed {
            self.emit(NativeEvent::Play);
        }
    }

    /// Press the element's own pause button
    pub fn user_pause(&self) {
        let changed = {
            let mut s = self.state.borrow_mut();
            let was_playing = !s.paused;
            s.paused = true;
            was_playing
        };
        if changed {
            self.emit(NativeEvent::Pause);
        }
    }

    /// Drag the element's own scrubber
    pub fn user_seek(&self, time: f64) {
        let current_time = {
            let mut s = self.state.borrow_mut();
            s.current_time = clamp_to_duration(time, s.duration);
            s.current_time
        };
        self.emit(NativeEvent::Seeking { current_time });
    }

    /// Change speed from the element's own menu
    pub fn user_set_rate(&self, rate: f64) {
        self.state.borrow_mut().playback_rate = rate;
        self.emit(NativeEvent::RateChange { playback_rate: rate });
    }

    // ─────────────────────────────────────────────────────────────
    // Host simulation
    // ─────────────────────────────────────────────────────────────

    /// Change buffered readiness and raise the matching buffering event
    pub fn set_ready_state(&self, level: ReadinessLevel) {
        self.state.borrow_mut().ready_state = level;
        self.emit(NativeEvent::Buffering(level.event()));
    }

    /// Run out of buffered data mid-playback
    pub fn stall(&self) {
        self.state.borrow_mut().ready_state = ReadinessLevel::CurrentData;
        self.emit(NativeEvent::Waiting);
    }

    /// Make subsequent `play()` calls reject
    pub fn block_autoplay(&self, blocked: bool) {
        self.state.borrow_mut().autoplay_blocked = blocked;
    }

    /// Move the playhead without raising any event (injects drift)
    pub fn set_position(&self, time: f64) {
        self.state.borrow_mut().current_time = time;
    }

    /// Advance playback by `secs` of wall time
    pub fn advance(&self, secs: f64) {
        let mut events = Vec::new();
        {
            let mut s = self.state.borrow_mut();
            if s.paused {
                return;
            }
            s.current_time += secs * s.playback_rate;
            if s.duration.is_finite() && s.current_time >= s.duration {
                if s.looping {
                    s.current_time = 0.0;
                    events.push(NativeEvent::Seeking { current_time: 0.0 });
                } else {
                    s.current_time = s.duration;
                    s.paused = true;
                    events.push(NativeEvent::Pause);
                    events.push(NativeEvent::Ended);
                }
            }
        }
        for event in events {
            self.emit(event);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────

    pub fn play_calls(&self) -> usize {
        self.state.borrow().play_calls
    }

    pub fn pause_calls(&self) -> usize {
        self.state.borrow().pause_calls
    }

    /// Targets passed to `set_current_time`, oldest first
    pub fn seek_calls(&self) -> Vec<f64> {
        self.state.borrow().seek_calls.clone()
    }

    pub fn rate_calls(&self) -> Vec<f64> {
        self.state.borrow().rate_calls.clone()
    }

    pub fn reset_calls(&self) {
        let mut s = self.state.borrow_mut();
        s.play_calls = 0;
        s.pause_calls = 0;
        s.seek_calls.clear();
        s.rate_calls.clear();
    }

    pub fn is_attached(&self) -> bool {
        self.state.borrow().sink.is_some()
    }
}

fn clamp_to_duration(time: f64, duration: f64) -> f64 {
    if duration.is_finite() {
        time.clamp(0.0, duration)
    } else {
        time.max(0.0)
    }
}

impl MediaElement for SimMediaElement {
    fn current_time(&self) -> f64 {
        self.state.borrow().current_time
    }

    fn set_current_time(&mut self, time: f64) {
        let current_time = {
            let mut s = self.state.borrow_mut();
            s.seek_calls.push(time);
            s.current_time = clamp_to_duration(time, s.duration);
            s.current_time
        };
        self.emit(NativeEvent::Seeking { current_time });
    }

    fn duration(&self) -> f64 {
        self.state.borrow().duration
    }

    fn paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn playback_rate(&self) -> f64 {
        self.state.borrow().playback_rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        {
            let mut s = self.state.borrow_mut();
            s.rate_calls.push(rate);
            s.playback_rate = rate;
        }
        self.emit(NativeEvent::RateChange { playback_rate: rate });
    }

    fn ready_state(&self) -> u8 {
        self.state.borrow().ready_state.as_ready_state()
    }

    fn play(&mut self) -> MediaResult<()> {
        let started = {
            let mut s = self.state.borrow_mut();
            s.play_calls += 1;
            if s.autoplay_blocked {
                return Err(MediaError::PlaybackRejected(format!(
                    "NotAllowedError: autoplay blocked for {}",
                    s.label
                )));
            }
            let was_paused = s.paused;
            s.paused = false;
            was_paused
        };
        if started {
            self.emit(NativeEvent::Play);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let stopped = {
            let mut s = self.state.borrow_mut();
            s.pause_calls += 1;
            let was_playing = !s.paused;
            s.paused = true;
            was_playing
        };
        if stopped {
            self.emit(NativeEvent::Pause);
        }
    }

    fn looping(&self) -> bool {
        self.state.borrow().looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.state.borrow_mut().looping = looping;
    }

    fn attach(&mut self, sink: EventSink) {
        self.state.borrow_mut().sink = Some(sink);
    }

    fn detach(&mut self) {
        self.state.borrow_mut().sink = None;
    }

    fn label(&self) -> String {
        self.state.borrow().label.clone()
    }
}

/// Destination node of every [`SimAudioGraph`]
pub const SIM_DESTINATION: NodeId = NodeId(0);

#[derive(Debug, Default)]
struct GraphState {
    next_id: u64,
    nodes: HashSet<NodeId>,
    edges: Vec<(NodeId, NodeId)>,
    sources: Vec<(TrackId, NodeId)>,
    fail_gain: bool,
    fail_connect: bool,
}

/// In-memory audio graph recording nodes and connections
#[derive(Debug, Clone)]
pub struct SimAudioGraph {
    state: Rc<RefCell<GraphState>>,
}

impl Default for SimAudioGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SimAudioGraph {
    pub fn new() -> Self {
        let mut state = GraphState {
            next_id: 1,
            ..Default::default()
        };
        state.nodes.insert(SIM_DESTINATION);
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    fn alloc(&self) -> NodeId {
        let mut s = self.state.borrow_mut();
        let id = NodeId(s.next_id);
        s.next_id += 1;
        s.nodes.insert(id);
        id
    }

    /// Make `create_gain` fail
    pub fn fail_gain_creation(&self, fail: bool) {
        self.state.borrow_mut().fail_gain = fail;
    }

    /// Make `connect` fail
    pub fn fail_connections(&self, fail: bool) {
        self.state.borrow_mut().fail_connect = fail;
    }

    /// Current connections (from, to)
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.state.borrow().edges.clone()
    }

    /// Number of source nodes created for `track`
    pub fn sources_for(&self, track: TrackId) -> usize {
        self.state
            .borrow()
            .sources
            .iter()
            .filter(|(t, _)| *t == track)
            .count()
    }

    /// Whether `track`'s source reaches the destination through one gain node
    pub fn is_routed(&self, track: TrackId) -> bool {
        let s = self.state.borrow();
        s.sources
            .iter()
            .filter(|(t, _)| *t == track)
            .any(|(_, source)| {
                s.edges.iter().any(|(from, gain)| {
                    from == source
                        && s
                            .edges
                            .iter()
                            .any(|(g, to)| g == gain && *to == SIM_DESTINATION)
                })
            })
    }
}

impl AudioGraph for SimAudioGraph {
    fn create_media_element_source(&mut self, track: TrackId) -> MediaResult<NodeId> {
        let id = self.alloc();
        self.state.borrow_mut().sources.push((track, id));
        Ok(id)
    }

    fn create_gain(&mut self) -> MediaResult<NodeId> {
        if self.state.borrow().fail_gain {
            return Err(MediaError::GraphConnection("gain node unavailable".into()));
        }
        Ok(self.alloc())
    }

    fn destination(&self) -> NodeId {
        SIM_DESTINATION
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> MediaResult<()> {
        let mut s = self.state.borrow_mut();
        if s.fail_connect {
            return Err(MediaError::GraphConnection(format!(
                "cannot connect {:?} -> {:?}",
                from, to
            )));
        }
        if !s.nodes.contains(&from) {
            return Err(MediaError::UnknownNode(from.0));
        }
        if !s.nodes.contains(&to) {
            return Err(MediaError::UnknownNode(to.0));
        }
        s.edges.push((from, to));
        Ok(())
    }

    fn disconnect(&mut self, node: NodeId) {
        self.state.borrow_mut().edges.retain(|(from, _)| *from != node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached(element: &mut SimMediaElement) -> crossbeam::channel::Receiver<crate::host::NativeSignal> {
        let (tx, rx) = crossbeam::channel::unbounded();
        element.attach(EventSink::new(TrackId(0), tx));
        rx
    }

    #[test]
    fn test_program_play_counts_and_echoes() {
        let mut element = SimMediaElement::new("alto", 10.0);
        let rx = attached(&mut element);

        element.play().unwrap();
        assert!(!element.paused());
        assert_eq!(element.play_calls(), 1);
        assert_eq!(rx.try_recv().unwrap().event, NativeEvent::Play);

        // Already playing: counted, no second echo
        element.play().unwrap();
        assert_eq!(element.play_calls(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_user_controls_are_not_counted() {
        let mut element = SimMediaElement::new("bass", 10.0);
        let rx = attached(&mut element);

        element.user_play();
        element.user_seek(4.0);
        assert_eq!(element.play_calls(), 0);
        assert!(element.seek_calls().is_empty());
        assert_eq!(rx.try_recv().unwrap().event, NativeEvent::Play);
        assert_eq!(
            rx.try_recv().unwrap().event,
            NativeEvent::Seeking { current_time: 4.0 }
        );
    }

    #[test]
    fn test_blocked_autoplay_rejects() {
        let mut element = SimMediaElement::new("tenor", 10.0);
        element.block_autoplay(true);
        assert!(matches!(element.play(), Err(MediaError::PlaybackRejected(_))));
        assert!(element.paused());
    }

    #[test]
    fn test_advance_to_end() {
        let mut element = SimMediaElement::new("soprano", 2.0);
        let rx = attached(&mut element);
        element.user_play();
        let _ = rx.try_recv();

        element.advance(1.5);
        assert!((element.current_time() - 1.5).abs() < 1e-9);

        element.advance(1.0);
        assert_eq!(element.current_time(), 2.0);
        assert!(element.paused());
        assert_eq!(rx.try_recv().unwrap().event, NativeEvent::Pause);
        assert_eq!(rx.try_recv().unwrap().event, NativeEvent::Ended);
    }

    #[test]
    fn test_graph_routing() {
        let mut graph = SimAudioGraph::new();
        let source = graph.create_media_element_source(TrackId(1)).unwrap();
        let gain = graph.create_gain().unwrap();
        graph.connect(source, gain).unwrap();
        graph.connect(gain, graph.destination()).unwrap();
        assert!(graph.is_routed(TrackId(1)));

        graph.disconnect(gain);
        assert!(!graph.is_routed(TrackId(1)));
    }
}
