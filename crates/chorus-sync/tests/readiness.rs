//! Group readiness, buffering holds and waiting recovery

mod common;

use std::time::Duration;

use chorus_sync::{BufferingEvent, GroupEvent, MediaElement, Origin, ReadinessLevel};
use chorus_sync::host::sim::SimMediaElement;
use chorus_sync::SyncGroup;
use common::{boxed, drain, group_of};

#[test]
fn test_group_level_is_the_slowest_track() {
    let (mut group, sims) = group_of(&[30.0, 30.0, 30.0]);
    assert_eq!(group.ready_state(), ReadinessLevel::EnoughData);
    let events = group.subscribe();

    sims[1].set_ready_state(ReadinessLevel::CurrentData);
    group.pump();
    assert_eq!(group.ready_state(), ReadinessLevel::CurrentData);
    assert_eq!(
        drain(&events),
        vec![GroupEvent::Buffering(BufferingEvent::LoadedData)]
    );

    sims[1].set_ready_state(ReadinessLevel::EnoughData);
    group.pump();
    assert_eq!(group.ready_state(), ReadinessLevel::EnoughData);
    assert_eq!(
        drain(&events),
        vec![GroupEvent::Buffering(BufferingEvent::CanPlayThrough)]
    );

    // Re-announcing the same level stays silent
    sims[2].set_ready_state(ReadinessLevel::EnoughData);
    group.pump();
    assert!(drain(&events).is_empty());
}

#[test]
fn test_play_is_held_until_everyone_buffered() {
    let (mut group, sims) = group_of(&[30.0, 30.0]);
    sims[1].set_ready_state(ReadinessLevel::Metadata);
    group.pump();
    let events = group.subscribe();

    sims[0].user_play();
    group.pump();

    assert!(sims[0].paused());
    assert_eq!(sims[0].pause_calls(), 1);
    assert_eq!(sims[1].play_calls(), 0);
    assert!(group.is_waiting_for_data());
    assert!(!drain(&events).iter().any(|e| matches!(e, GroupEvent::Play { .. })));

    sims[1].set_ready_state(ReadinessLevel::EnoughData);
    group.pump();

    assert!(!group.is_waiting_for_data());
    assert!(sims.iter().all(|s| !s.paused()));
    assert!(group.is_drift_running());
    assert!(drain(&events).contains(&GroupEvent::Play {
        origin: Origin::Program
    }));
}

#[test]
fn test_stall_pauses_and_resumes_group() {
    let (mut group, sims) = group_of(&[30.0, 30.0]);
    group.play();
    group.advance(Duration::from_millis(10));
    let events = group.subscribe();

    sims[1].stall();
    group.pump();

    assert!(sims.iter().all(|s| s.paused()));
    assert!(group.is_waiting_for_data());
    assert!(!group.is_drift_running());
    assert_eq!(group.ready_state(), ReadinessLevel::CurrentData);
    assert_eq!(
        drain(&events),
        vec![
            GroupEvent::Waiting,
            GroupEvent::Buffering(BufferingEvent::LoadedData)
        ]
    );

    sims[1].set_ready_state(ReadinessLevel::EnoughData);
    group.pump();

    assert!(sims.iter().all(|s| !s.paused()));
    assert!(!group.is_waiting_for_data());
    assert!(group.is_drift_running());
}

#[test]
fn test_explicit_pause_cancels_resume() {
    let (mut group, sims) = group_of(&[30.0, 30.0]);
    group.play();
    group.advance(Duration::from_millis(10));

    sims[0].stall();
    group.pump();
    group.pause();

    sims[0].set_ready_state(ReadinessLevel::EnoughData);
    group.pump();

    assert!(group.paused());
    assert!(sims.iter().all(|s| s.paused()));
}

#[test]
fn test_buffering_is_tracked_while_disabled() {
    let (mut group, sims) = group_of(&[30.0, 30.0]);
    group.set_disabled(true);

    sims[1].set_ready_state(ReadinessLevel::FutureData);
    group.pump();
    assert_eq!(group.ready_state(), ReadinessLevel::FutureData);
    assert_eq!(sims[1].ready_state(), ReadinessLevel::FutureData.as_ready_state());
}

#[test]
fn test_initialize_announces_starting_level() {
    let a = SimMediaElement::new("a", 30.0).with_ready_state(ReadinessLevel::Metadata);
    let b = SimMediaElement::new("b", 30.0);
    let mut group = SyncGroup::default();
    let events = group.subscribe();

    group.initialize(vec![boxed(&a), boxed(&b)]).unwrap();

    assert_eq!(group.ready_state(), ReadinessLevel::Metadata);
    assert_eq!(
        drain(&events),
        vec![GroupEvent::Buffering(BufferingEvent::LoadedMetadata)]
    );
}
