//! Chorus Sync - keeps independent media tracks playing as one transport
//!
//! A song split into parts (stems, a click track, a guide vocal) is loaded
//! into several host media elements. A [`SyncGroup`] makes them behave like
//! a single player: any play, pause, seek or rate change on one track is
//! mirrored onto the others, playback waits until every track has buffered
//! enough, and a drift engine periodically pulls secondaries back onto the
//! main track's clock.
//!
//! ```text
//!   host element ──native event──▶ EventSink ──▶ inbox
//!                                                  │
//!                       ┌──────────────────────────┘
//!                       ▼
//!   TrackFacade (gates, debounce, origin) ──▶ SyncGroup ──▶ GroupEvent bus
//!                                               │
//!                       mirrored actions ◀──────┤
//!                       drift timers     ◀──────┘ Scheduler
//! ```

pub mod command;
pub mod config;
pub mod drift;
pub mod error;
pub mod events;
pub mod gate;
pub mod group;
pub mod host;
pub mod readiness;
pub mod scheduler;
pub mod track;
pub mod types;

pub use command::{command_channel, TransportCommand};
pub use config::SyncConfig;
pub use drift::{DriftCorrection, DriftSample, HostProfile};
pub use error::{GroupError, GroupResult, MediaError, MediaResult};
pub use events::GroupEvent;
pub use group::SyncGroup;
pub use host::{AudioGraph, EventSink, MediaElement, NativeEvent};
pub use types::*;
