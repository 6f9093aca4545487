//! Sync group - the coordinator behind one logical transport
//!
//! A [`SyncGroup`] owns the track facades, the designated main track, the
//! drift engine and the readiness aggregator, and exposes the transport API
//! (play, pause, seek, rate, loop, disabled).
//!
//! # Event loop
//!
//! The group is single-threaded and cooperative. Native events arrive in an
//! inbox (one [`EventSink`] per element); timers live in a [`Scheduler`].
//! The host drives everything through [`SyncGroup::run_until`]:
//!
//! ```text
//! loop {
//!     drain inbox        ── facade relabels, propagation rules run
//!     fire next due timer ── re-enables, seek flush/settle, drift ticks
//! }
//! ```
//!
//! The inbox is always drained before a timer fires, so the echo of a
//! mirrored action is observed while its gate is still closed, even with a
//! zero re-enable delay.
//!
//! # Propagation
//!
//! Every mirrored action follows the same bracket:
//!
//! ```text
//! suppress(kind) on targets → act on targets → schedule enable(kind)
//! ```
//!
//! The gate is closed before the action runs and before control returns to
//! the loop; otherwise the echo could be observed with the gate open and
//! bounce between the tracks forever.

use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::command::TransportCommand;
use crate::config::{OverlappingSeekPolicy, SyncConfig};
use crate::drift::{self, DriftCorrection, DriftEngine, DriftSample, HostProfile, TrackPosition};
use crate::error::{GroupError, GroupResult};
use crate::events::{EventBus, GroupEvent};
use crate::host::{AudioGraph, EventSink, MediaElement, NativeEvent, NativeSignal};
use crate::readiness::ReadinessAggregator;
use crate::scheduler::{Scheduler, TimerId};
use crate::track::{Observation, SemanticEvent, TrackFacade};
use crate::types::{EventKind, Origin, ReadinessLevel, TrackId, TrackRole};

/// Work queued on the group's timer queue
#[derive(Debug)]
enum TimerTask {
    /// Close a suppression bracket
    Reenable { tracks: Vec<TrackId>, kind: EventKind },
    /// Close a seek debounce window
    SeekFlush { track: TrackId, generation: u64 },
    /// A seek sync has settled: lift the in-flight guard and the `seeking` gates
    SeekSettled { tracks: Vec<TrackId> },
    DriftSample,
    DriftCorrect,
}

/// Coordinator keeping a set of media tracks in lockstep
pub struct SyncGroup {
    config: SyncConfig,
    profile: HostProfile,
    tracks: Vec<TrackFacade>,
    main: Option<usize>,
    disabled: bool,
    /// A seek sync is in flight
    syncing_seek: bool,
    /// Newest seek that arrived during a sync (`ApplyLast` policy)
    queued_seek: Option<f64>,
    readiness: ReadinessAggregator,
    drift: DriftEngine,
    scheduler: Scheduler<TimerTask>,
    /// Host time the loop has reached
    now: Duration,
    inbox_tx: Sender<NativeSignal>,
    inbox_rx: Receiver<NativeSignal>,
    bus: EventBus,
    audio_graph: Option<Box<dyn AudioGraph>>,
}

impl std::fmt::Debug for SyncGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncGroup")
            .field("tracks", &self.tracks)
            .field("main", &self.main)
            .field("disabled", &self.disabled)
            .field("syncing_seek", &self.syncing_seek)
            .field("now", &self.now)
            .finish()
    }
}

impl Default for SyncGroup {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

impl SyncGroup {
    /// Create an empty group; call [`initialize`](Self::initialize) to add tracks
    pub fn new(config: SyncConfig) -> Self {
        let (inbox_tx, inbox_rx) = unbounded();
        Self {
            profile: config.drift.profile,
            config,
            tracks: Vec::new(),
            main: None,
            disabled: false,
            syncing_seek: false,
            queued_seek: None,
            readiness: ReadinessAggregator::new(),
            drift: DriftEngine::new(),
            scheduler: Scheduler::new(),
            now: Duration::ZERO,
            inbox_tx,
            inbox_rx,
            bus: EventBus::new(),
            audio_graph: None,
        }
    }

    /// Route every track through a shared audio graph while playing
    pub fn with_audio_graph(mut self, graph: Box<dyn AudioGraph>) -> Self {
        self.audio_graph = Some(graph);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn host_profile(&self) -> HostProfile {
        self.profile
    }

    /// Swap the drift threshold policy for this host
    pub fn set_host_profile(&mut self, profile: HostProfile) {
        log::info!("set_host_profile: {:?}", profile);
        self.profile = profile;
    }

    /// Receive every group event published from now on
    pub fn subscribe(&mut self) -> Receiver<GroupEvent> {
        self.bus.subscribe()
    }

    // ─────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────

    /// Register media elements in order; the first one becomes main
    pub fn initialize(&mut self, elements: Vec<Box<dyn MediaElement>>) -> GroupResult<()> {
        let with_roles = elements
            .into_iter()
            .enumerate()
            .map(|(i, element)| {
                let role = if i == 0 {
                    TrackRole::Main
                } else {
                    TrackRole::Secondary
                };
                (element, role)
            })
            .collect();
        self.initialize_with_roles(with_roles)
    }

    /// Register media elements with explicit roles
    ///
    /// Exactly one element must be [`TrackRole::Main`]. An empty list is a
    /// logged no-op. Re-initializing tears the previous tracks down first.
    pub fn initialize_with_roles(
        &mut self,
        elements: Vec<(Box<dyn MediaElement>, TrackRole)>,
    ) -> GroupResult<()> {
        if elements.is_empty() {
            log::warn!("initialize: no media elements given, nothing to synchronize");
            return Ok(());
        }

        let mains = elements.iter().filter(|(_, role)| role.is_main()).count();
        if mains != 1 {
            return Err(GroupError::MainTrackCount { found: mains });
        }

        if !self.tracks.is_empty() {
            self.teardown();
        }

        let track_config = self.config.track.clone();
        for (index, (mut element, role)) in elements.into_iter().enumerate() {
            let id = TrackId::new(index);
            element.attach(EventSink::new(id, self.inbox_tx.clone()));
            let facade = TrackFacade::new(id, role, element).with_end_tolerances(
                track_config.ended_epsilon_secs,
                track_config.end_clamp_margin_secs,
            );
            if role.is_main() {
                self.main = Some(index);
            }
            log::debug!("initialize: {} ({}) as {:?}", id, facade.label(), role);
            self.tracks.push(facade);
        }

        log::info!("initialize: synchronizing {} tracks", self.tracks.len());
        self.refresh_readiness();
        Ok(())
    }

    /// Stop drift timers, disconnect audio and release every track
    ///
    /// The drift log is kept for inspection.
    pub fn teardown(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        log::info!("teardown: releasing {} tracks", self.tracks.len());

        self.stop_drift();
        self.disconnect_audio_graph();
        for track in &mut self.tracks {
            track.detach();
        }
        self.tracks.clear();
        self.main = None;
        self.scheduler.clear();
        while self.inbox_rx.try_recv().is_ok() {}
        self.readiness.reset();
        self.syncing_seek = false;
        self.queued_seek = None;
    }

    // ─────────────────────────────────────────────────────────────
    // Event loop
    // ─────────────────────────────────────────────────────────────

    /// Host time the loop has reached
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Process queued native events and every timer due up to `now`
    pub fn run_until(&mut self, now: Duration) {
        let target = now.max(self.now);
        loop {
            self.drain_inbox();
            match self.scheduler.pop_due(target) {
                Some((deadline, id, task)) => {
                    self.now = self.now.max(deadline);
                    self.run_timer(id, task);
                }
                None => break,
            }
        }
        self.now = target;
    }

    /// When the loop next has work: now if events are queued, otherwise the
    /// earliest timer deadline
    pub fn next_deadline(&mut self) -> Option<Duration> {
        if !self.inbox_rx.is_empty() {
            return Some(self.now);
        }
        self.scheduler.next_deadline()
    }

    /// Advance host time by `elapsed`
    pub fn advance(&mut self, elapsed: Duration) {
        self.run_until(self.now + elapsed);
    }

    /// Process what is already due without advancing time
    pub fn pump(&mut self) {
        self.run_until(self.now);
    }

    /// Queue a native event for `track`, for hosts that do not use sinks
    pub fn dispatch(&self, track: TrackId, event: NativeEvent) {
        EventSink::new(track, self.inbox_tx.clone()).emit(event);
    }

    /// Apply every queued transport command
    pub fn process_commands(&mut self, commands: &mut rtrb::Consumer<TransportCommand>) {
        while let Ok(command) = commands.pop() {
            log::debug!("process_commands: {:?}", command);
            match command {
                TransportCommand::Play => self.play(),
                TransportCommand::Pause => self.pause(),
                TransportCommand::Seek(time) => self.set_current_time(time),
                TransportCommand::SetPlaybackRate(rate) => self.set_playback_rate(rate),
                TransportCommand::SetLoop(looping) => self.set_looping(looping),
                TransportCommand::SetDisabled(disabled) => self.set_disabled(disabled),
            }
        }
    }

    fn drain_inbox(&mut self) {
        while let Ok(signal) = self.inbox_rx.try_recv() {
            self.handle_native(signal);
        }
    }

    fn handle_native(&mut self, signal: NativeSignal) {
        let Some(index) = self.index_of(signal.track) else {
            log::trace!("handle_native: {:?} from unknown {}", signal.event, signal.track);
            return;
        };

        let observation = self.tracks[index].observe(signal.event);

        // Echoed plays still count towards "everyone is playing"
        if signal.event == NativeEvent::Play {
            self.maybe_start_drift();
        }

        match observation {
            Observation::Emit(event) => self.on_track_event(index, event),
            Observation::Debounce { generation } => {
                // A scrub in progress is a seek in flight for the drift engine
                self.stop_drift();
                let at = self.now + self.config.timeouts.seek_debounce();
                self.scheduler.schedule(
                    at,
                    TimerTask::SeekFlush {
                        track: signal.track,
                        generation,
                    },
                );
            }
            Observation::Suppressed(kind) => {
                log::trace!("handle_native: {} echo on {} suppressed", kind, signal.track);
            }
        }
    }

    fn run_timer(&mut self, id: TimerId, task: TimerTask) {
        match task {
            TimerTask::Reenable { tracks, kind } => {
                for track in tracks {
                    if let Some(index) = self.index_of(track) {
                        self.tracks[index].enable(kind);
                    }
                }
            }
            TimerTask::SeekFlush { track, generation } => {
                if let Some(index) = self.index_of(track) {
                    if let Some(event) = self.tracks[index].flush_seek(generation) {
                        self.on_track_event(index, event);
                    }
                }
                // No-op when the flush started a sync or another window is open
                self.maybe_start_drift();
            }
            TimerTask::SeekSettled { tracks } => self.settle_seek(tracks),
            TimerTask::DriftSample => {
                if self.drift.is_sampler(id) {
                    self.sample_drift();
                    let next = self.scheduler.schedule(
                        self.now + self.config.drift.sample_interval(),
                        TimerTask::DriftSample,
                    );
                    self.drift.set_sampler(next);
                }
            }
            TimerTask::DriftCorrect => {
                if self.drift.is_corrector(id) {
                    self.correct_drift();
                    // A correction seek stops the engine; only reschedule if still running
                    if self.drift.is_corrector(id) {
                        let next = self.scheduler.schedule(
                            self.now + self.config.drift.correct_interval(),
                            TimerTask::DriftCorrect,
                        );
                        self.drift.set_corrector(next);
                    }
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Propagation rules
    // ─────────────────────────────────────────────────────────────

    fn on_track_event(&mut self, index: usize, event: SemanticEvent) {
        if self.disabled {
            if let SemanticEvent::Buffering(_) = event {
                self.refresh_readiness();
            } else {
                log::trace!("on_track_event: disabled, ignoring {:?}", event);
            }
            return;
        }

        match event {
            SemanticEvent::Play { origin } => self.on_track_play(index, origin),
            SemanticEvent::Pause { origin } => self.on_track_pause(index, origin),
            SemanticEvent::Seeking {
                current_time,
                origin,
            } => self.on_track_seeking(index, current_time, origin),
            SemanticEvent::RateChange {
                playback_rate,
                origin,
            } => self.on_track_ratechange(index, playback_rate, origin),
            SemanticEvent::Waiting => self.on_track_waiting(index),
            SemanticEvent::Ended => self.on_track_ended(index),
            SemanticEvent::Buffering(_) => {
                self.refresh_readiness();
                self.resume_if_ready();
            }
        }
    }

    fn on_track_play(&mut self, index: usize, origin: Origin) {
        let level = self.ready_state();
        if level < ReadinessLevel::EnoughData {
            log::info!(
                "play: {} started before the group buffered enough ({:?}), holding it",
                self.tracks[index].id(),
                level
            );
            self.readiness.set_waiting_for_data(true);
            self.mirror(&[index], EventKind::Pause, |t| t.pause(Origin::Program));
            return;
        }

        let others = self.others(index);
        self.mirror(&others, EventKind::Play, |t| t.play(Origin::Program));
        self.bus.publish(GroupEvent::Play { origin });
        self.maybe_start_drift();
    }

    fn on_track_pause(&mut self, index: usize, origin: Origin) {
        if self.tracks[index].ended() {
            log::debug!(
                "pause: {} reached its own end, not pausing the others",
                self.tracks[index].id()
            );
            return;
        }

        self.readiness.set_waiting_for_data(false);
        self.stop_drift();
        let others = self.others(index);
        self.mirror(&others, EventKind::Pause, |t| t.pause(Origin::Program));
        self.bus.publish(GroupEvent::Pause { origin });
    }

    fn on_track_seeking(&mut self, index: usize, time: f64, origin: Origin) {
        if self.syncing_seek {
            self.overlapping_seek(time);
            return;
        }
        self.bus.publish(GroupEvent::Seeking {
            current_time: time,
            origin,
        });
        let others = self.others(index);
        self.sync_seek(&others, time);
    }

    fn on_track_ratechange(&mut self, index: usize, rate: f64, origin: Origin) {
        let others = self.others(index);
        self.mirror(&others, EventKind::RateChange, |t| {
            t.set_playback_rate(rate, Origin::Program)
        });
        self.bus.publish(GroupEvent::RateChange {
            playback_rate: rate,
            origin,
        });
    }

    fn on_track_waiting(&mut self, index: usize) {
        log::info!(
            "waiting: {} ran out of data, pausing the group",
            self.tracks[index].id()
        );
        self.readiness.set_waiting_for_data(true);
        self.stop_drift();
        let all = self.all_indices();
        self.mirror(&all, EventKind::Pause, |t| t.pause(Origin::Program));
        self.bus.publish(GroupEvent::Waiting);
        self.refresh_readiness();
    }

    fn on_track_ended(&mut self, index: usize) {
        if !self.tracks[index].is_main() {
            log::debug!(
                "ended: secondary {} finished early, leaving it paused",
                self.tracks[index].id()
            );
            return;
        }

        self.readiness.set_waiting_for_data(false);
        self.stop_drift();
        let others = self.others(index);
        self.mirror(&others, EventKind::Pause, |t| t.pause(Origin::Program));
        self.bus.publish(GroupEvent::Ended);
    }

    /// Bracket `action` on `indices` with a suppression of `kind`
    fn mirror<F>(&mut self, indices: &[usize], kind: EventKind, mut action: F)
    where
        F: FnMut(&mut TrackFacade),
    {
        if indices.is_empty() {
            return;
        }
        for &i in indices {
            self.tracks[i].suppress(kind);
        }
        for &i in indices {
            action(&mut self.tracks[i]);
        }
        let tracks = indices.iter().map(|&i| self.tracks[i].id()).collect();
        let at = self.now + self.config.timeouts.reenable_after(kind);
        self.scheduler.schedule(at, TimerTask::Reenable { tracks, kind });
    }

    /// Seek `indices` to `time` with the in-flight guard raised
    fn sync_seek(&mut self, indices: &[usize], time: f64) {
        self.stop_drift();
        self.syncing_seek = true;

        for &i in indices {
            self.tracks[i].suppress(EventKind::Seeking);
        }
        for &i in indices {
            let target = self.tracks[i].set_current_time(time, Origin::Program);
            if target != time {
                log::debug!(
                    "seek: {} clamped {:.3}s -> {:.3}s",
                    self.tracks[i].id(),
                    time,
                    target
                );
            }
        }

        let tracks = indices.iter().map(|&i| self.tracks[i].id()).collect();
        let at = self.now + self.config.timeouts.reenable_after(EventKind::Seeking);
        self.scheduler.schedule(at, TimerTask::SeekSettled { tracks });

        self.rejoin_finished();
    }

    /// Restart secondaries the host paused at their end once a seek moved
    /// them back, if the group is playing
    fn rejoin_finished(&mut self) {
        if self.disabled || self.main_track().map_or(true, TrackFacade::paused) {
            return;
        }
        let rejoining: Vec<usize> = (0..self.tracks.len())
            .filter(|&i| self.tracks[i].needs_rejoin())
            .collect();
        if rejoining.is_empty() {
            return;
        }
        log::debug!("seek: {} finished track(s) rejoin playback", rejoining.len());
        self.mirror(&rejoining, EventKind::Play, |t| t.play(Origin::Program));
    }

    fn settle_seek(&mut self, tracks: Vec<TrackId>) {
        for track in tracks {
            if let Some(index) = self.index_of(track) {
                self.tracks[index].enable(EventKind::Seeking);
            }
        }
        self.syncing_seek = false;

        if let Some(time) = self.queued_seek.take() {
            if !self.disabled && !self.tracks.is_empty() {
                log::debug!("seek: applying deferred seek to {:.3}s", time);
                self.bus.publish(GroupEvent::Seeking {
                    current_time: time,
                    origin: Origin::Program,
                });
                let all = self.all_indices();
                self.sync_seek(&all, time);
                return;
            }
        }
        self.maybe_start_drift();
    }

    fn overlapping_seek(&mut self, time: f64) {
        match self.config.overlapping_seeks {
            OverlappingSeekPolicy::Drop => {
                log::debug!("seek: sync in flight, dropping seek to {:.3}s", time);
            }
            OverlappingSeekPolicy::ApplyLast => {
                log::debug!("seek: sync in flight, deferring seek to {:.3}s", time);
                self.queued_seek = Some(time);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Readiness
    // ─────────────────────────────────────────────────────────────

    fn refresh_readiness(&mut self) {
        let changed = self
            .readiness
            .recompute(self.tracks.iter().map(TrackFacade::readiness));
        if let Some(event) = changed {
            self.bus.publish(GroupEvent::Buffering(event));
        }
    }

    fn resume_if_ready(&mut self) {
        if self.readiness.is_waiting_for_data()
            && self.ready_state() == ReadinessLevel::EnoughData
        {
            log::info!("readiness: enough data buffered, resuming playback");
            self.readiness.set_waiting_for_data(false);
            self.play_all(Origin::Program);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Drift engine
    // ─────────────────────────────────────────────────────────────

    /// Every track plays, except secondaries that already finished their media
    fn all_playing(&self) -> bool {
        let Some(main) = self.main_track() else {
            return false;
        };
        !main.paused()
            && self
                .tracks
                .iter()
                .all(|t| !t.paused() || (!t.is_main() && t.ended()))
    }

    fn seek_pending(&self) -> bool {
        self.syncing_seek || self.tracks.iter().any(TrackFacade::has_pending_seek)
    }

    fn maybe_start_drift(&mut self) {
        if self.disabled || self.seek_pending() || self.drift.is_running() || !self.all_playing() {
            return;
        }
        self.connect_audio_graph();

        let sampler = self.scheduler.schedule(
            self.now + self.config.drift.sample_interval(),
            TimerTask::DriftSample,
        );
        let corrector = self.scheduler.schedule(
            self.now + self.config.drift.correct_interval(),
            TimerTask::DriftCorrect,
        );
        self.drift.started(sampler, corrector);
        log::debug!("drift: engine started");
    }

    fn stop_drift(&mut self) {
        let timers = self.drift.stop();
        if !timers.is_empty() {
            log::debug!("drift: engine stopped");
        }
        for id in timers {
            self.scheduler.cancel(id);
        }
    }

    fn positions(&self) -> Vec<TrackPosition> {
        self.tracks.iter().map(TrackFacade::position).collect()
    }

    fn sample_drift(&mut self) {
        let Some(main) = self.main_track() else {
            return;
        };
        if self.disabled || main.paused() {
            return;
        }
        let sample = drift::sample(main.current_time(), &self.positions());
        self.drift.record_sample(sample);
    }

    fn correct_drift(&mut self) {
        let Some(main) = self.main_track() else {
            return;
        };
        if self.disabled || main.paused() || self.seek_pending() {
            return;
        }
        let main_time = main.current_time();
        let threshold = self.profile.threshold_ms(&self.config.drift);

        let Some(correction) = drift::plan_correction(main_time, &self.positions(), threshold) else {
            return;
        };

        let targets: Vec<usize> = correction
            .corrected()
            .filter_map(|id| self.index_of(id))
            .collect();
        let deltas: Vec<String> = targets
            .iter()
            .map(|&i| {
                let track = &self.tracks[i];
                format!("{}={}ms", track.id(), drift::delta_ms(track.current_time(), main_time))
            })
            .collect();
        log::debug!(
            "drift: correcting [{}] to {:.3}s (threshold {}ms)",
            deltas.join(", "),
            main_time,
            threshold
        );
        self.drift.record_correction(correction);
        self.sync_seek(&targets, main_time);
    }

    pub fn is_drift_running(&self) -> bool {
        self.drift.is_running()
    }

    pub fn drift_samples(&self) -> &[DriftSample] {
        self.drift.samples()
    }

    pub fn drift_corrections(&self) -> &[DriftCorrection] {
        self.drift.corrections()
    }

    pub fn clear_drift_log(&mut self) {
        self.drift.clear_log();
    }

    // ─────────────────────────────────────────────────────────────
    // Audio graph
    // ─────────────────────────────────────────────────────────────

    fn connect_audio_graph(&mut self) {
        if self.disabled {
            return;
        }
        if let Some(graph) = self.audio_graph.as_mut() {
            for track in &mut self.tracks {
                track.connect_audio(graph.as_mut());
            }
        }
    }

    fn disconnect_audio_graph(&mut self) {
        if let Some(graph) = self.audio_graph.as_mut() {
            for track in &mut self.tracks {
                track.disconnect_audio(graph.as_mut());
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Public transport API
    // ─────────────────────────────────────────────────────────────

    fn is_inert(&self, operation: &str) -> bool {
        if self.disabled {
            log::debug!("{}: group disabled, ignoring", operation);
            return true;
        }
        if self.tracks.is_empty() {
            log::debug!("{}: no tracks registered, ignoring", operation);
            return true;
        }
        false
    }

    /// Start every track; held until the group has enough data buffered
    pub fn play(&mut self) {
        if self.is_inert("play") {
            return;
        }
        self.play_all(Origin::Program);
    }

    fn play_all(&mut self, origin: Origin) {
        let level = self.ready_state();
        if level < ReadinessLevel::EnoughData {
            log::info!("play: group readiness {:?}, will start once buffered", level);
            self.readiness.set_waiting_for_data(true);
            return;
        }
        let all = self.all_indices();
        self.mirror(&all, EventKind::Play, |t| t.play(Origin::Program));
        self.bus.publish(GroupEvent::Play { origin });
        self.maybe_start_drift();
    }

    pub fn pause(&mut self) {
        if self.is_inert("pause") {
            return;
        }
        self.readiness.set_waiting_for_data(false);
        self.stop_drift();
        let all = self.all_indices();
        self.mirror(&all, EventKind::Pause, |t| t.pause(Origin::Program));
        self.bus.publish(GroupEvent::Pause {
            origin: Origin::Program,
        });
    }

    /// Main track position in seconds
    pub fn current_time(&self) -> f64 {
        self.main_track().map_or(0.0, TrackFacade::current_time)
    }

    /// Seek every track; tracks shorter than `time` stop just before their end
    pub fn set_current_time(&mut self, time: f64) {
        if self.is_inert("set_current_time") {
            return;
        }
        if self.syncing_seek {
            self.overlapping_seek(time);
            return;
        }
        self.bus.publish(GroupEvent::Seeking {
            current_time: time,
            origin: Origin::Program,
        });
        let all = self.all_indices();
        self.sync_seek(&all, time);
    }

    pub fn playback_rate(&self) -> f64 {
        self.main_track().map_or(1.0, TrackFacade::playback_rate)
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        if self.is_inert("set_playback_rate") {
            return;
        }
        let all = self.all_indices();
        self.mirror(&all, EventKind::RateChange, |t| {
            t.set_playback_rate(rate, Origin::Program)
        });
        self.bus.publish(GroupEvent::RateChange {
            playback_rate: rate,
            origin: Origin::Program,
        });
    }

    /// Main track duration; `NaN` while unknown
    pub fn duration(&self) -> f64 {
        self.main_track().map_or(f64::NAN, TrackFacade::duration)
    }

    pub fn paused(&self) -> bool {
        self.main_track().map_or(true, TrackFacade::paused)
    }

    pub fn ended(&self) -> bool {
        self.main_track().is_some_and(TrackFacade::ended)
    }

    /// Group readiness: the minimum over all tracks
    pub fn ready_state(&self) -> ReadinessLevel {
        ReadinessAggregator::aggregate(self.tracks.iter().map(TrackFacade::readiness))
    }

    pub fn is_waiting_for_data(&self) -> bool {
        self.readiness.is_waiting_for_data()
    }

    pub fn is_syncing_seek(&self) -> bool {
        self.syncing_seek
    }

    pub fn looping(&self) -> bool {
        self.main_track().is_some_and(TrackFacade::looping)
    }

    /// Loop the main track; secondaries never loop
    pub fn set_looping(&mut self, looping: bool) {
        if let Some(main) = self.main {
            self.tracks[main].set_looping(looping);
        }
    }

    pub fn disabled(&self) -> bool {
        self.disabled
    }

    /// Bypass (or restore) all synchronization
    pub fn set_disabled(&mut self, disabled: bool) {
        if self.disabled == disabled {
            return;
        }
        self.disabled = disabled;
        if disabled {
            log::info!("set_disabled: synchronization bypassed");
            self.stop_drift();
            self.disconnect_audio_graph();
        } else {
            log::info!("set_disabled: synchronization restored");
            self.maybe_start_drift();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Tracks
    // ─────────────────────────────────────────────────────────────

    pub fn tracks(&self) -> &[TrackFacade] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&TrackFacade> {
        self.index_of(id).map(|i| &self.tracks[i])
    }

    pub fn main_track(&self) -> Option<&TrackFacade> {
        self.main.map(|i| &self.tracks[i])
    }

    fn index_of(&self, id: TrackId) -> Option<usize> {
        self.tracks
            .get(id.index())
            .filter(|t| t.id() == id)
            .map(|_| id.index())
    }

    fn others(&self, index: usize) -> Vec<usize> {
        (0..self.tracks.len()).filter(|&i| i != index).collect()
    }

    fn all_indices(&self) -> Vec<usize> {
        (0..self.tracks.len()).collect()
    }
}

impl Drop for SyncGroup {
    fn drop(&mut self) {
        self.teardown();
    }
}
