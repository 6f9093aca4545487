//! Drift engine - sampling and correcting divergence from the main track
//!
//! Two periodic processes run while the whole group plays:
//!
//! - **Sampler**: records every track's offset from the main track
//! - **Corrector**: re-seeks tracks whose offset exceeds the host threshold
//!
//! Offsets are `round((track − main) × 1000)` milliseconds. A track that has
//! individually reached its end is reported as ended instead of with an
//! offset, and is never corrected: it cannot be caught up past its own
//! duration.
//!
//! This module holds the pure computations and the record log. Timer
//! scheduling and gating live in the sync group, which owns the loop.

use serde::{Deserialize, Serialize};

use crate::config::DriftConfig;
use crate::scheduler::TimerId;
use crate::types::TrackId;

/// How precisely a host can hold tracks together
///
/// Some engines buffer media in coarse chunks and cannot reliably hold
/// sub-30 ms sync; correcting them at the standard threshold only produces
/// audible seek churn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostProfile {
    #[default]
    Standard,
    Buffered,
}

impl HostProfile {
    /// Guess the profile from a browser user-agent string
    ///
    /// Gecko-based browsers buffer differently from Blink and WebKit.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("firefox/") || (ua.contains("gecko/") && !ua.contains("like gecko")) {
            HostProfile::Buffered
        } else {
            HostProfile::Standard
        }
    }

    /// Correction threshold in milliseconds for this profile
    pub fn threshold_ms(&self, config: &DriftConfig) -> u64 {
        match self {
            HostProfile::Standard => config.threshold_ms,
            HostProfile::Buffered => config.buffered_threshold_ms,
        }
    }
}

/// Offset of one track at sampling time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackDrift {
    /// Offset from the main track in milliseconds (positive = ahead)
    Delta(i64),
    /// The track has reached its own end
    Ended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledTrack {
    pub track: TrackId,
    pub drift: TrackDrift,
}

/// One sampler tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftSample {
    pub main_current_time: f64,
    pub per_track: Vec<SampledTrack>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedTrack {
    pub track: TrackId,
    pub was_corrected: bool,
}

/// One corrector tick that found at least one track over threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftCorrection {
    pub main_current_time: f64,
    pub per_track: Vec<CorrectedTrack>,
}

impl DriftCorrection {
    /// Tracks that were re-seeked
    pub fn corrected(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.per_track
            .iter()
            .filter(|t| t.was_corrected)
            .map(|t| t.track)
    }
}

/// Position of a track as seen by the drift computations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPosition {
    pub track: TrackId,
    pub current_time: f64,
    pub ended: bool,
}

/// Offset of `track_time` from `main_time`, in whole milliseconds
pub fn delta_ms(track_time: f64, main_time: f64) -> i64 {
    ((track_time - main_time) * 1000.0).round() as i64
}

/// Build a sample for every track
pub fn sample(main_time: f64, positions: &[TrackPosition]) -> DriftSample {
    DriftSample {
        main_current_time: main_time,
        per_track: positions
            .iter()
            .map(|p| SampledTrack {
                track: p.track,
                drift: if p.ended {
                    TrackDrift::Ended
                } else {
                    TrackDrift::Delta(delta_ms(p.current_time, main_time))
                },
            })
            .collect(),
    }
}

/// Decide which non-ended tracks need re-seeking
///
/// Returns `None` when every track is within `threshold_ms`.
pub fn plan_correction(
    main_time: f64,
    positions: &[TrackPosition],
    threshold_ms: u64,
) -> Option<DriftCorrection> {
    let per_track: Vec<CorrectedTrack> = positions
        .iter()
        .filter(|p| !p.ended)
        .map(|p| CorrectedTrack {
            track: p.track,
            was_corrected: delta_ms(p.current_time, main_time).unsigned_abs() > threshold_ms,
        })
        .collect();

    if per_track.iter().any(|t| t.was_corrected) {
        Some(DriftCorrection {
            main_current_time: main_time,
            per_track,
        })
    } else {
        None
    }
}

/// Timer handles and record log of the drift engine
#[derive(Debug, Default)]
pub struct DriftEngine {
    sampler: Option<TimerId>,
    corrector: Option<TimerId>,
    samples: Vec<DriftSample>,
    corrections: Vec<DriftCorrection>,
}

impl DriftEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.sampler.is_some() || self.corrector.is_some()
    }

    /// Remember the freshly scheduled interval timers
    pub fn started(&mut self, sampler: TimerId, corrector: TimerId) {
        self.sampler = Some(sampler);
        self.corrector = Some(corrector);
    }

    /// Forget the interval timers, returning them for cancellation
    pub fn stop(&mut self) -> Vec<TimerId> {
        self.sampler.take().into_iter().chain(self.corrector.take()).collect()
    }

    /// Whether `id` is the live sampler timer
    pub fn is_sampler(&self, id: TimerId) -> bool {
        self.sampler == Some(id)
    }

    pub fn is_corrector(&self, id: TimerId) -> bool {
        self.corrector == Some(id)
    }

    /// Replace the sampler handle after rescheduling
    pub fn set_sampler(&mut self, id: TimerId) {
        self.sampler = Some(id);
    }

    pub fn set_corrector(&mut self, id: TimerId) {
        self.corrector = Some(id);
    }

    pub fn record_sample(&mut self, sample: DriftSample) {
        self.samples.push(sample);
    }

    pub fn record_correction(&mut self, correction: DriftCorrection) {
        self.corrections.push(correction);
    }

    pub fn samples(&self) -> &[DriftSample] {
        &self.samples
    }

    pub fn corrections(&self) -> &[DriftCorrection] {
        &self.corrections
    }

    pub fn clear_log(&mut self) {
        self.samples.clear();
        self.corrections.clear();
    }
}
