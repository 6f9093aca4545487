//! Common types for chorus-sync
//!
//! Identifiers, roles and the small enums shared by the track facade,
//! the drift engine and the sync group.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A track counts as ended when it sits within this many seconds of its duration
pub const ENDED_EPSILON_SECS: f64 = 0.1;

/// Seeks at or past a track's duration land this far before the end instead
///
/// Must stay below [`ENDED_EPSILON_SECS`] so a clamped track still reads as ended.
pub const END_CLAMP_MARGIN_SECS: f64 = 0.05;

/// Opaque track identifier, unique within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub usize);

impl TrackId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Index into the group's track list
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track#{}", self.0)
    }
}

/// Role of a track within its group
///
/// Exactly one track per group is `Main`: its time, rate and duration are
/// authoritative for the whole group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackRole {
    Main,
    Secondary,
}

impl TrackRole {
    pub fn is_main(&self) -> bool {
        matches!(self, TrackRole::Main)
    }
}

/// Whether an action was started by the user (through the host) or by code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Origin {
    #[default]
    User,
    Program,
}

/// Buffering sufficiency of a track, totally ordered
///
/// Values mirror the host's `readyState` (0–4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReadinessLevel {
    #[default]
    Nothing = 0,
    Metadata = 1,
    CurrentData = 2,
    FutureData = 3,
    EnoughData = 4,
}

impl ReadinessLevel {
    /// All levels in ascending order
    pub const ALL: [ReadinessLevel; 5] = [
        ReadinessLevel::Nothing,
        ReadinessLevel::Metadata,
        ReadinessLevel::CurrentData,
        ReadinessLevel::FutureData,
        ReadinessLevel::EnoughData,
    ];

    /// Convert a host `readyState` value; anything above 4 saturates
    pub fn from_ready_state(value: u8) -> Self {
        match value {
            0 => ReadinessLevel::Nothing,
            1 => ReadinessLevel::Metadata,
            2 => ReadinessLevel::CurrentData,
            3 => ReadinessLevel::FutureData,
            _ => ReadinessLevel::EnoughData,
        }
    }

    pub fn as_ready_state(&self) -> u8 {
        *self as u8
    }

    /// The buffering event announcing a transition to this level
    pub fn event(&self) -> BufferingEvent {
        match self {
            ReadinessLevel::Nothing => BufferingEvent::Emptied,
            ReadinessLevel::Metadata => BufferingEvent::LoadedMetadata,
            ReadinessLevel::CurrentData => BufferingEvent::LoadedData,
            ReadinessLevel::FutureData => BufferingEvent::CanPlay,
            ReadinessLevel::EnoughData => BufferingEvent::CanPlayThrough,
        }
    }
}

/// Buffering-related host events; never gated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferingEvent {
    Emptied,
    LoadedMetadata,
    LoadedData,
    CanPlay,
    CanPlayThrough,
}

impl BufferingEvent {
    pub const ALL: [BufferingEvent; 5] = [
        BufferingEvent::Emptied,
        BufferingEvent::LoadedMetadata,
        BufferingEvent::LoadedData,
        BufferingEvent::CanPlay,
        BufferingEvent::CanPlayThrough,
    ];

    /// Host event name
    pub fn name(&self) -> &'static str {
        match self {
            BufferingEvent::Emptied => "emptied",
            BufferingEvent::LoadedMetadata => "loadedmetadata",
            BufferingEvent::LoadedData => "loadeddata",
            BufferingEvent::CanPlay => "canplay",
            BufferingEvent::CanPlayThrough => "canplaythrough",
        }
    }

    /// The readiness level this event announces
    pub fn level(&self) -> ReadinessLevel {
        match self {
            BufferingEvent::Emptied => ReadinessLevel::Nothing,
            BufferingEvent::LoadedMetadata => ReadinessLevel::Metadata,
            BufferingEvent::LoadedData => ReadinessLevel::CurrentData,
            BufferingEvent::CanPlay => ReadinessLevel::FutureData,
            BufferingEvent::CanPlayThrough => ReadinessLevel::EnoughData,
        }
    }
}

/// Event kinds that pass through a per-track suppression gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum EventKind {
    Seeking = 0,
    Play = 1,
    Pause = 2,
    RateChange = 3,
    Waiting = 4,
}

impl EventKind {
    /// Number of gated kinds
    pub const COUNT: usize = 5;

    pub const ALL: [EventKind; EventKind::COUNT] = [
        EventKind::Seeking,
        EventKind::Play,
        EventKind::Pause,
        EventKind::RateChange,
        EventKind::Waiting,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Host event name
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Seeking => "seeking",
            EventKind::Play => "play",
            EventKind::Pause => "pause",
            EventKind::RateChange => "ratechange",
            EventKind::Waiting => "waiting",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
