//! Track facade - one host media element with sync bookkeeping
//!
//! The facade normalizes an element's transport state and turns its native
//! events into [`SemanticEvent`]s for the group:
//!
//! - Each gated kind (`seeking`, `play`, `pause`, `ratechange`, `waiting`)
//!   passes through the track's [`EventGates`]; a closed gate swallows the
//!   event after its state has been observed
//! - Buffering events and `ended` always pass
//! - `seeking` bursts are debounced: the facade asks the group to arm a
//!   timer and only the newest seek of the burst is emitted
//! - Every event carries an [`Origin`]. Actions the group performs pass
//!   `Origin::Program`, which labels the echo they produce; anything else
//!   came from the user through the host
//!
//! The facade also owns the track's route through the shared audio graph.

use crate::drift::TrackPosition;
use crate::error::MediaResult;
use crate::gate::EventGates;
use crate::host::{AudioGraph, MediaElement, NativeEvent, NodeId};
use crate::types::{
    BufferingEvent, EventKind, Origin, ReadinessLevel, TrackId, TrackRole, END_CLAMP_MARGIN_SECS,
    ENDED_EPSILON_SECS,
};

/// A native event after relabelling
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SemanticEvent {
    Seeking { current_time: f64, origin: Origin },
    Play { origin: Origin },
    Pause { origin: Origin },
    RateChange { playback_rate: f64, origin: Origin },
    Waiting,
    Ended,
    Buffering(BufferingEvent),
}

/// What the facade made of one native event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// Relay to the group now
    Emit(SemanticEvent),
    /// A seek burst started or continued; flush `generation` after the debounce window
    Debounce { generation: u64 },
    /// Swallowed by a closed gate
    Suppressed(EventKind),
}

#[derive(Debug, Clone, Copy)]
struct PendingSeek {
    current_time: f64,
    origin: Origin,
    generation: u64,
}

/// Nodes routing this track into the shared audio graph
#[derive(Debug, Default)]
struct AudioRoute {
    /// Hosts allow one source per element, so it outlives disconnects
    source: Option<NodeId>,
    gain: Option<NodeId>,
}

/// One participating media element
pub struct TrackFacade {
    id: TrackId,
    role: TrackRole,
    element: Box<dyn MediaElement>,
    gates: EventGates,
    /// Program actions whose native echo has not been observed yet
    pending_program: [bool; EventKind::COUNT],
    pending_seek: Option<PendingSeek>,
    seek_generation: u64,
    /// Secondary reached its end and the host paused it there
    finished: bool,
    audio: AudioRoute,
    ended_epsilon: f64,
    end_clamp_margin: f64,
}

impl std::fmt::Debug for TrackFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackFacade")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("label", &self.element.label())
            .field("gates", &self.gates)
            .finish()
    }
}

impl TrackFacade {
    pub fn new(id: TrackId, role: TrackRole, element: Box<dyn MediaElement>) -> Self {
        let mut facade = Self {
            id,
            role,
            element,
            gates: EventGates::new(),
            pending_program: [false; EventKind::COUNT],
            pending_seek: None,
            seek_generation: 0,
            finished: false,
            audio: AudioRoute::default(),
            ended_epsilon: ENDED_EPSILON_SECS,
            end_clamp_margin: END_CLAMP_MARGIN_SECS,
        };
        if !role.is_main() && facade.element.looping() {
            log::warn!("{}: secondary tracks cannot loop, disabling", facade.id);
            facade.element.set_looping(false);
        }
        facade
    }

    /// Override the end-of-media tolerances
    pub fn with_end_tolerances(mut self, ended_epsilon: f64, end_clamp_margin: f64) -> Self {
        self.ended_epsilon = ended_epsilon;
        self.end_clamp_margin = end_clamp_margin;
        self
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn role(&self) -> TrackRole {
        self.role
    }

    pub fn is_main(&self) -> bool {
        self.role.is_main()
    }

    pub fn label(&self) -> String {
        self.element.label()
    }

    // ─────────────────────────────────────────────────────────────
    // Normalized state
    // ─────────────────────────────────────────────────────────────

    pub fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    pub fn duration(&self) -> f64 {
        self.element.duration()
    }

    pub fn playback_rate(&self) -> f64 {
        self.element.playback_rate()
    }

    pub fn paused(&self) -> bool {
        self.element.paused()
    }

    /// Whether the playhead sits at the end of this track's own media
    pub fn ended(&self) -> bool {
        let duration = self.duration();
        duration.is_finite() && (self.current_time() - duration).abs() < self.ended_epsilon
    }

    pub fn readiness(&self) -> ReadinessLevel {
        ReadinessLevel::from_ready_state(self.element.ready_state())
    }

    pub fn looping(&self) -> bool {
        self.element.looping()
    }

    /// Enable looping; only the main track may loop
    ///
    /// Returns whether the request was applied.
    pub fn set_looping(&mut self, looping: bool) -> bool {
        if looping && !self.is_main() {
            log::warn!("set_looping: rejected on secondary {}", self.id);
            return false;
        }
        self.element.set_looping(looping);
        true
    }

    pub fn position(&self) -> TrackPosition {
        TrackPosition {
            track: self.id,
            current_time: self.current_time(),
            ended: self.ended(),
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────

    /// Seek, keeping the target short of the end of this track's media
    ///
    /// Returns the position actually requested from the host.
    pub fn set_current_time(&mut self, time: f64, origin: Origin) -> f64 {
        let target = self.clamp_target(time);
        self.mark(EventKind::Seeking, origin);
        self.element.set_current_time(target);
        target
    }

    fn clamp_target(&self, time: f64) -> f64 {
        let duration = self.duration();
        if duration.is_finite() && time >= duration {
            (duration - self.end_clamp_margin).max(0.0)
        } else {
            time.max(0.0)
        }
    }

    pub fn set_playback_rate(&mut self, rate: f64, origin: Origin) {
        if (self.playback_rate() - rate).abs() > f64::EPSILON {
            self.mark(EventKind::RateChange, origin);
        }
        self.element.set_playback_rate(rate);
    }

    /// Start playback; a host rejection is logged and swallowed
    pub fn play(&mut self, origin: Origin) {
        self.finished = false;
        let was_paused = self.paused();
        if was_paused {
            self.mark(EventKind::Play, origin);
        }
        if let Err(e) = self.element.play() {
            log::warn!("play: {} ({}) did not start: {}", self.id, self.label(), e);
            self.pending_program[EventKind::Play.index()] = false;
        }
    }

    pub fn pause(&mut self, origin: Origin) {
        if !self.paused() {
            self.mark(EventKind::Pause, origin);
        }
        self.element.pause();
    }

    fn mark(&mut self, kind: EventKind, origin: Origin) {
        if origin == Origin::Program {
            self.pending_program[kind.index()] = true;
        }
    }

    fn take_origin(&mut self, kind: EventKind) -> Origin {
        if std::mem::take(&mut self.pending_program[kind.index()]) {
            Origin::Program
        } else {
            Origin::User
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Suppression
    // ─────────────────────────────────────────────────────────────

    pub fn suppress(&mut self, kind: EventKind) {
        self.gates.suppress(kind);
    }

    pub fn enable(&mut self, kind: EventKind) {
        self.gates.enable(kind);
    }

    pub fn is_enabled(&self, kind: EventKind) -> bool {
        self.gates.is_open(kind)
    }

    // ─────────────────────────────────────────────────────────────
    // Native events
    // ─────────────────────────────────────────────────────────────

    /// Relabel one native event
    pub fn observe(&mut self, event: NativeEvent) -> Observation {
        match event {
            NativeEvent::Seeking { current_time } => {
                let origin = self.take_origin(EventKind::Seeking);
                if !self.gates.is_open(EventKind::Seeking) {
                    return Observation::Suppressed(EventKind::Seeking);
                }
                self.seek_generation += 1;
                self.pending_seek = Some(PendingSeek {
                    current_time,
                    origin,
                    generation: self.seek_generation,
                });
                Observation::Debounce {
                    generation: self.seek_generation,
                }
            }
            NativeEvent::Play => {
                self.finished = false;
                let origin = self.take_origin(EventKind::Play);
                self.gated(EventKind::Play, SemanticEvent::Play { origin })
            }
            NativeEvent::Pause => {
                let origin = self.take_origin(EventKind::Pause);
                self.gated(EventKind::Pause, SemanticEvent::Pause { origin })
            }
            NativeEvent::RateChange { playback_rate } => {
                let origin = self.take_origin(EventKind::RateChange);
                self.gated(
                    EventKind::RateChange,
                    SemanticEvent::RateChange {
                        playback_rate,
                        origin,
                    },
                )
            }
            NativeEvent::Waiting => self.gated(EventKind::Waiting, SemanticEvent::Waiting),
            NativeEvent::Ended => {
                if !self.is_main() {
                    self.finished = true;
                }
                Observation::Emit(SemanticEvent::Ended)
            }
            NativeEvent::Buffering(event) => Observation::Emit(SemanticEvent::Buffering(event)),
        }
    }

    fn gated(&self, kind: EventKind, event: SemanticEvent) -> Observation {
        if self.gates.is_open(kind) {
            Observation::Emit(event)
        } else {
            Observation::Suppressed(kind)
        }
    }

    /// A native seek is waiting for its debounce window to close
    pub fn has_pending_seek(&self) -> bool {
        self.pending_seek.is_some()
    }

    /// Secondary left paused at its end that has since been moved back
    /// before it
    pub fn needs_rejoin(&self) -> bool {
        self.finished && self.paused() && !self.ended()
    }

    /// Close a debounce window; emits the newest seek of the burst
    ///
    /// Stale generations (superseded by a later seek) emit nothing.
    pub fn flush_seek(&mut self, generation: u64) -> Option<SemanticEvent> {
        match self.pending_seek {
            Some(pending) if pending.generation == generation => {
                self.pending_seek = None;
                if !self.gates.is_open(EventKind::Seeking) {
                    return None;
                }
                Some(SemanticEvent::Seeking {
                    current_time: pending.current_time,
                    origin: pending.origin,
                })
            }
            _ => None,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Audio graph
    // ─────────────────────────────────────────────────────────────

    pub fn is_audio_connected(&self) -> bool {
        self.audio.gain.is_some()
    }

    /// Route source → gain → destination; a no-op when already routed
    ///
    /// On failure every partial connection is undone and `false` returned.
    pub fn connect_audio(&mut self, graph: &mut dyn AudioGraph) -> bool {
        if self.is_audio_connected() {
            return true;
        }
        match self.try_connect_audio(graph) {
            Ok(gain) => {
                self.audio.gain = Some(gain);
                log::debug!("connect_audio: {} routed through gain {:?}", self.id, gain);
                true
            }
            Err(e) => {
                log::warn!("connect_audio: {} stays unrouted: {}", self.id, e);
                false
            }
        }
    }

    fn try_connect_audio(&mut self, graph: &mut dyn AudioGraph) -> MediaResult<NodeId> {
        let source = match self.audio.source {
            Some(source) => source,
            None => {
                let source = graph.create_media_element_source(self.id)?;
                self.audio.source = Some(source);
                source
            }
        };
        let gain = graph.create_gain()?;
        graph.connect(source, gain)?;
        let destination = graph.destination();
        if let Err(e) = graph.connect(gain, destination) {
            graph.disconnect(source);
            return Err(e);
        }
        Ok(gain)
    }

    /// Remove this track's route; other tracks are unaffected
    pub fn disconnect_audio(&mut self, graph: &mut dyn AudioGraph) {
        if let Some(gain) = self.audio.gain.take() {
            if let Some(source) = self.audio.source {
                graph.disconnect(source);
            }
            graph.disconnect(gain);
            log::debug!("disconnect_audio: {} unrouted", self.id);
        }
    }

    /// Stop listening to the element and open every gate
    pub fn detach(&mut self) {
        self.element.detach();
        self.gates.reset_all();
        self.pending_seek = None;
        self.finished = false;
        self.pending_program = [false; EventKind::COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::sim::{SimAudioGraph, SimMediaElement};

    fn facade(role: TrackRole, duration: f64) -> (TrackFacade, SimMediaElement) {
        let sim = SimMediaElement::new("part", duration);
        (TrackFacade::new(TrackId(1), role, Box::new(sim.clone())), sim)
    }

    #[test]
    fn test_clamps_seek_past_end() {
        let (mut track, sim) = facade(TrackRole::Secondary, 60.0);
        let target = track.set_current_time(80.0, Origin::Program);

        assert!((target - 59.95).abs() < 1e-9);
        assert_eq!(sim.seek_calls(), vec![target]);
        assert!(track.ended());
    }

    #[test]
    fn test_unknown_duration_is_not_clamped() {
        let (mut track, _sim) = facade(TrackRole::Main, f64::NAN);
        assert_eq!(track.set_current_time(80.0, Origin::Program), 80.0);
        assert!(!track.ended());
    }

    #[test]
    fn test_ended_epsilon() {
        let (track, sim) = facade(TrackRole::Main, 10.0);
        sim.set_position(9.95);
        assert!(track.ended());
        sim.set_position(9.85);
        assert!(!track.ended());
    }

    #[test]
    fn test_suppressed_event_not_emitted() {
        let (mut track, _sim) = facade(TrackRole::Main, 10.0);
        track.suppress(EventKind::Play);
        assert_eq!(track.observe(NativeEvent::Play), Observation::Suppressed(EventKind::Play));

        track.enable(EventKind::Play);
        assert_eq!(
            track.observe(NativeEvent::Play),
            Observation::Emit(SemanticEvent::Play { origin: Origin::User })
        );
    }

    #[test]
    fn test_buffering_and_ended_never_gated() {
        let (mut track, _sim) = facade(TrackRole::Main, 10.0);
        for kind in EventKind::ALL {
            track.suppress(kind);
        }
        for event in BufferingEvent::ALL {
            assert_eq!(
                track.observe(NativeEvent::Buffering(event)),
                Observation::Emit(SemanticEvent::Buffering(event))
            );
        }
        assert_eq!(track.observe(NativeEvent::Ended), Observation::Emit(SemanticEvent::Ended));
    }

    #[test]
    fn test_program_origin_labels_echo() {
        let (mut track, _sim) = facade(TrackRole::Main, 10.0);
        track.play(Origin::Program);
        assert_eq!(
            track.observe(NativeEvent::Play),
            Observation::Emit(SemanticEvent::Play { origin: Origin::Program })
        );
        // Mark consumed: the next play is the user's
        assert_eq!(
            track.observe(NativeEvent::Play),
            Observation::Emit(SemanticEvent::Play { origin: Origin::User })
        );
    }

    #[test]
    fn test_rejected_play_is_swallowed() {
        let (mut track, sim) = facade(TrackRole::Main, 10.0);
        sim.block_autoplay(true);
        track.play(Origin::Program);
        assert!(track.paused());
        assert_eq!(sim.play_calls(), 1);
    }

    #[test]
    fn test_seek_debounce_keeps_last() {
        let (mut track, _sim) = facade(TrackRole::Main, 100.0);
        let mut last = 0;
        for t in [0.0, 10.0, 20.0, 30.0, 40.0] {
            match track.observe(NativeEvent::Seeking { current_time: t }) {
                Observation::Debounce { generation } => last = generation,
                other => panic!("unexpected {:?}", other),
            }
        }
        // Older windows closing emit nothing
        assert_eq!(track.flush_seek(last - 1), None);
        assert_eq!(
            track.flush_seek(last),
            Some(SemanticEvent::Seeking {
                current_time: 40.0,
                origin: Origin::User
            })
        );
        assert_eq!(track.flush_seek(last), None);
    }

    #[test]
    fn test_pending_seek_until_window_closes() {
        let (mut track, _sim) = facade(TrackRole::Secondary, 100.0);
        assert!(!track.has_pending_seek());

        let Observation::Debounce { generation } =
            track.observe(NativeEvent::Seeking { current_time: 40.0 })
        else {
            panic!("seek should be debounced");
        };
        assert!(track.has_pending_seek());

        track.flush_seek(generation);
        assert!(!track.has_pending_seek());
    }

    #[test]
    fn test_finished_secondary_needs_rejoin_after_seek_back() {
        let (mut track, sim) = facade(TrackRole::Secondary, 60.0);
        sim.user_play();
        sim.advance(61.0);
        assert!(sim.paused());
        track.observe(NativeEvent::Ended);

        // Still sitting at its end
        assert!(!track.needs_rejoin());

        track.set_current_time(10.0, Origin::Program);
        assert!(track.needs_rejoin());

        track.play(Origin::Program);
        assert!(!track.needs_rejoin());
        assert!(!track.paused());
    }

    #[test]
    fn test_main_never_needs_rejoin() {
        let (mut track, sim) = facade(TrackRole::Main, 60.0);
        sim.user_play();
        sim.advance(61.0);
        track.observe(NativeEvent::Ended);
        track.set_current_time(10.0, Origin::Program);
        assert!(!track.needs_rejoin());
    }

    #[test]
    fn test_secondary_cannot_loop() {
        let (mut track, sim) = facade(TrackRole::Secondary, 10.0);
        assert!(!track.set_looping(true));
        assert!(!sim.looping());

        let (mut main, main_sim) = facade(TrackRole::Main, 10.0);
        assert!(main.set_looping(true));
        assert!(main_sim.looping());
    }

    #[test]
    fn test_audio_connect_idempotent() {
        let (mut track, _sim) = facade(TrackRole::Main, 10.0);
        let mut graph = SimAudioGraph::new();

        assert!(track.connect_audio(&mut graph));
        assert!(track.connect_audio(&mut graph));
        assert_eq!(graph.sources_for(TrackId(1)), 1);
        assert_eq!(graph.edges().len(), 2);
        assert!(graph.is_routed(TrackId(1)));

        track.disconnect_audio(&mut graph);
        track.disconnect_audio(&mut graph);
        assert!(!track.is_audio_connected());
        assert!(graph.edges().is_empty());

        // Reconnecting reuses the element source
        assert!(track.connect_audio(&mut graph));
        assert_eq!(graph.sources_for(TrackId(1)), 1);
    }

    #[test]
    fn test_audio_connect_failure_rolls_back() {
        let (mut track, _sim) = facade(TrackRole::Main, 10.0);
        let mut graph = SimAudioGraph::new();
        graph.fail_connections(true);

        assert!(!track.connect_audio(&mut graph));
        assert!(!track.is_audio_connected());
        assert!(graph.edges().is_empty());

        graph.fail_connections(false);
        assert!(track.connect_audio(&mut graph));
    }
}
