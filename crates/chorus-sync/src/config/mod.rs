//! Sync group configuration
//!
//! Configuration is stored as YAML. Every section uses `#[serde(default)]`
//! so a partial file only overrides what it names.
//!
//! # Timeouts
//!
//! Each suppression timeout must exceed the worst observed latency between
//! performing an action on the host and the host firing the matching native
//! event. Too short and the echo slips through the reopened gate and gets
//! propagated again; too long and a genuine user action right after a
//! mirrored one is swallowed.
//!
//! ```yaml
//! timeouts:
//!   play_ms: 1
//!   pause_ms: 0
//!   seek_ms: 100
//!   rate_ms: 10
//!   seek_debounce_ms: 10
//! drift:
//!   sample_interval_ms: 100
//!   correct_interval_ms: 200
//!   threshold_ms: 30
//!   buffered_threshold_ms: 150
//!   profile: standard
//! overlapping_seeks: drop
//! ```

mod io;
mod paths;

pub use io::{load_config, read_config, save_config};
pub use paths::{default_config_dir, default_config_path};

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::drift::HostProfile;
use crate::types::{EventKind, END_CLAMP_MARGIN_SECS, ENDED_EPSILON_SECS};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Suppression and debounce timeouts
    pub timeouts: TimeoutConfig,
    /// Drift sampling and correction
    pub drift: DriftConfig,
    /// Per-track end-of-media handling
    pub track: TrackConfig,
    /// What to do with a seek arriving while another one is being synced
    pub overlapping_seeks: OverlappingSeekPolicy,
}

/// Per-action timeouts, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Re-enable `play` after mirroring a play
    pub play_ms: u64,
    /// Re-enable `pause` after mirroring a pause
    pub pause_ms: u64,
    /// Settle window after a seek sync: the in-flight guard and the
    /// `seeking` gates stay up this long to cover the host's own seek
    pub seek_ms: u64,
    /// Re-enable `ratechange` after mirroring a rate change
    pub rate_ms: u64,
    /// Collapse bursts of `seeking` events closer than this
    pub seek_debounce_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            play_ms: 1,
            pause_ms: 0,
            seek_ms: 100,
            rate_ms: 10,
            seek_debounce_ms: 10,
        }
    }
}

impl TimeoutConfig {
    /// Re-enable delay for a mirrored action of `kind`
    pub fn reenable_after(&self, kind: EventKind) -> Duration {
        let ms = match kind {
            EventKind::Play => self.play_ms,
            EventKind::Pause => self.pause_ms,
            EventKind::Seeking => self.seek_ms,
            EventKind::RateChange => self.rate_ms,
            // Waiting is never mirrored; reuse the pause window
            EventKind::Waiting => self.pause_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn seek_debounce(&self) -> Duration {
        Duration::from_millis(self.seek_debounce_ms)
    }
}

/// Drift engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Sampler period
    pub sample_interval_ms: u64,
    /// Corrector period
    pub correct_interval_ms: u64,
    /// Correction threshold under the standard profile
    pub threshold_ms: u64,
    /// Correction threshold for hosts that buffer media coarsely
    pub buffered_threshold_ms: u64,
    /// Which threshold applies on this host
    pub profile: HostProfile,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 100,
            correct_interval_ms: 200,
            threshold_ms: 30,
            buffered_threshold_ms: 150,
            profile: HostProfile::Standard,
        }
    }
}

impl DriftConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn correct_interval(&self) -> Duration {
        Duration::from_millis(self.correct_interval_ms)
    }
}

/// End-of-media handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// A track within this many seconds of its duration reads as ended
    pub ended_epsilon_secs: f64,
    /// Seeks at or past the duration land this far before the end
    pub end_clamp_margin_secs: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            ended_epsilon_secs: ENDED_EPSILON_SECS,
            end_clamp_margin_secs: END_CLAMP_MARGIN_SECS,
        }
    }
}

/// Handling of a seek that arrives while a seek sync is in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlappingSeekPolicy {
    /// Discard it
    #[default]
    Drop,
    /// Remember the newest one and apply it once the in-flight sync settles
    ApplyLast,
}
