//! Shared helpers for the scenario tests

#![allow(dead_code)]

use crossbeam::channel::Receiver;

use chorus_sync::host::sim::SimMediaElement;
use chorus_sync::{GroupEvent, MediaElement, SyncConfig, SyncGroup};

pub fn boxed(sim: &SimMediaElement) -> Box<dyn MediaElement> {
    Box::new(sim.clone())
}

/// One simulated part per duration; the first one is main
pub fn group_with(config: SyncConfig, durations: &[f64]) -> (SyncGroup, Vec<SimMediaElement>) {
    let sims: Vec<SimMediaElement> = durations
        .iter()
        .enumerate()
        .map(|(i, duration)| SimMediaElement::new(&format!("part{}", i), *duration))
        .collect();
    let mut group = SyncGroup::new(config);
    group.initialize(sims.iter().map(boxed).collect()).unwrap();
    (group, sims)
}

pub fn group_of(durations: &[f64]) -> (SyncGroup, Vec<SimMediaElement>) {
    group_with(SyncConfig::default(), durations)
}

/// Everything published since the last drain
pub fn drain(events: &Receiver<GroupEvent>) -> Vec<GroupEvent> {
    events.try_iter().collect()
}
