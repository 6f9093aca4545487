//! Readiness aggregation - the group is only as ready as its slowest track
//!
//! The group level is the minimum of all track levels. Group buffering
//! events are edge-triggered: a recompute that lands on the recorded level
//! emits nothing, a recompute that moves it emits exactly one event for the
//! new level.

use crate::types::{BufferingEvent, ReadinessLevel};

/// Edge-triggered minimum over track readiness levels
#[derive(Debug, Default)]
pub struct ReadinessAggregator {
    last_level: ReadinessLevel,
    waiting_for_data: bool,
}

impl ReadinessAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum of `levels`; `Nothing` for an empty group
    pub fn aggregate<I>(levels: I) -> ReadinessLevel
    where
        I: IntoIterator<Item = ReadinessLevel>,
    {
        levels.into_iter().min().unwrap_or(ReadinessLevel::Nothing)
    }

    /// Recompute from the current track levels
    ///
    /// Returns the event to announce when the group level changed.
    pub fn recompute<I>(&mut self, levels: I) -> Option<BufferingEvent>
    where
        I: IntoIterator<Item = ReadinessLevel>,
    {
        let level = Self::aggregate(levels);
        if level == self.last_level {
            return None;
        }
        log::debug!("readiness: group level {:?} -> {:?}", self.last_level, level);
        self.last_level = level;
        Some(level.event())
    }

    /// Last level announced
    pub fn last_level(&self) -> ReadinessLevel {
        self.last_level
    }

    pub fn is_waiting_for_data(&self) -> bool {
        self.waiting_for_data
    }

    pub fn set_waiting_for_data(&mut self, waiting: bool) {
        self.waiting_for_data = waiting;
    }

    /// Forget everything (group torn down)
    pub fn reset(&mut self) {
        self.last_level = ReadinessLevel::Nothing;
        self.waiting_for_data = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReadinessLevel::*;

    #[test]
    fn test_aggregate_is_minimum() {
        assert_eq!(ReadinessAggregator::aggregate([EnoughData, CurrentData, FutureData]), CurrentData);
        assert_eq!(ReadinessAggregator::aggregate(std::iter::empty()), Nothing);
    }

    #[test]
    fn test_edge_triggered() {
        let mut agg = ReadinessAggregator::new();

        assert_eq!(agg.recompute([EnoughData, EnoughData]), Some(BufferingEvent::CanPlayThrough));
        // Same level again: silent
        assert_eq!(agg.recompute([EnoughData, EnoughData]), None);

        assert_eq!(agg.recompute([EnoughData, CurrentData]), Some(BufferingEvent::LoadedData));
        assert_eq!(agg.last_level(), CurrentData);

        assert_eq!(agg.recompute([EnoughData, EnoughData]), Some(BufferingEvent::CanPlayThrough));
        assert_eq!(agg.recompute([EnoughData, EnoughData]), None);
    }

    #[test]
    fn test_initial_nothing_is_silent() {
        let mut agg = ReadinessAggregator::new();
        assert_eq!(agg.recompute([Nothing, Metadata]), None);
        assert_eq!(agg.recompute([Metadata, Metadata]), Some(BufferingEvent::LoadedMetadata));
    }

    #[test]
    fn test_waiting_flag() {
        let mut agg = ReadinessAggregator::new();
        agg.set_waiting_for_data(true);
        assert!(agg.is_waiting_for_data());
        agg.reset();
        assert!(!agg.is_waiting_for_data());
    }
}
