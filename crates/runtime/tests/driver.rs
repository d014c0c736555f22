mod common;

use agent_core::{AgentError, AgentId, EntityId, ErrorSeverity, Point, TargetIndex};
use agent_runtime::{
    AgentEvent, Broadcast, DriverError, FaultEvent, LifecycleEvent, Request, TickOutcome,
};
use behavior_fsm::{Collision, DriverPhase, RegistryError, StateKey};
use common::{PREY, Peer, Switches, pump};

fn transition(name: &str, seed: i32) -> Broadcast {
    Broadcast::Transition {
        agent: AgentId(1),
        name: name.to_owned(),
        seed,
    }
}

#[test]
fn starts_in_exactly_one_initial_state() {
    let switches = Switches::default();
    let mut peer = Peer::new(&switches, true);

    assert_eq!(peer.driver.active_state(), Some(StateKey("IdleState")));
    assert_eq!(peer.driver.phase(), DriverPhase::Active);
    assert_eq!(peer.journal.count("attach"), 1);
    assert_eq!(peer.journal.count("enter"), 1);

    let entered: Vec<_> = peer
        .driver
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, AgentEvent::Lifecycle(LifecycleEvent::Entered { .. })))
        .collect();
    assert_eq!(entered.len(), 1);
}

#[test]
fn authority_waits_for_its_own_echo() {
    let switches = Switches::default();
    let mut peer = Peer::new(&switches, true);
    Switches::set(&switches.roam, true);

    assert_eq!(
        peer.driver.tick().unwrap(),
        TickOutcome::Requested("RoamTransition")
    );
    assert_eq!(peer.driver.active_state(), Some(StateKey("IdleState")));
    assert_eq!(peer.driver.tick().unwrap(), TickOutcome::AwaitingEcho);
    assert!(peer.driver.is_busy());

    pump(&mut peer, &mut []);

    assert_eq!(peer.driver.active_state(), Some(StateKey("RoamState")));
    assert!(!peer.driver.is_busy());
}

#[test]
fn global_transitions_win_over_local_ones() {
    let switches = Switches::default();
    let mut peer = Peer::new(&switches, true);
    Switches::set(&switches.roam, true);
    Switches::set(&switches.panic, true);

    assert_eq!(
        peer.driver.tick().unwrap(),
        TickOutcome::Requested("PanicTransition")
    );
    pump(&mut peer, &mut []);

    assert_eq!(peer.driver.active_state(), Some(StateKey("PanicState")));
    assert!(!peer.driver.accepts_collision_damage());
}

#[test]
fn peers_replaying_the_same_broadcasts_agree() {
    let switches = Switches::default();
    let mut authority = Peer::new(&switches, true);
    let mut first = Peer::new(&switches, false);
    let mut second = Peer::new(&switches, false);

    Switches::set(&switches.roam, true);
    authority.driver.tick().unwrap();
    first.driver.tick().unwrap();
    second.driver.tick().unwrap();
    pump(&mut authority, &mut [&mut first, &mut second]);

    Switches::set(&switches.roam, false);
    Switches::set(&switches.panic, true);
    authority.driver.tick().unwrap();
    pump(&mut authority, &mut [&mut first, &mut second]);

    for peer in [&authority, &first, &second] {
        assert_eq!(peer.driver.active_state(), Some(StateKey("PanicState")));
        assert_eq!(peer.driver.target(), Some(PREY));
    }
    assert_eq!(first.journal.lines(), second.journal.lines());
    assert_eq!(authority.journal.lines(), first.journal.lines());
    assert_eq!(
        authority.driver.rng().clone().next_u32(),
        second.driver.rng().clone().next_u32()
    );
}

#[test]
fn transition_into_the_active_state_changes_nothing() {
    let switches = Switches::default();
    let mut peer = Peer::new(&switches, true);
    Switches::set(&switches.roam, true);
    peer.driver.tick().unwrap();
    pump(&mut peer, &mut []);
    Switches::set(&switches.roam, false);
    let before = peer.journal.lines();
    let seed = peer.driver.snapshot().seed;
    peer.driver.drain_events();

    Switches::set(&switches.stay, true);
    assert_eq!(
        peer.driver.tick().unwrap(),
        TickOutcome::Requested("StayTransition")
    );
    pump(&mut peer, &mut []);

    assert_eq!(peer.journal.lines(), before);
    assert_eq!(peer.driver.snapshot().seed, seed);
    assert!(!peer.driver.is_busy());
    assert!(peer.driver.drain_events().iter().any(|e| matches!(
        e,
        AgentEvent::Lifecycle(LifecycleEvent::Unchanged { state, .. }) if state == "RoamState"
    )));
}

#[test]
fn target_is_replicated_before_the_transition_and_only_once() {
    let switches = Switches::default();
    let mut peer = Peer::new(&switches, true);
    Switches::set(&switches.roam, true);

    peer.driver.tick().unwrap();
    let outbox = peer.driver.drain_outbox();

    assert!(matches!(
        outbox.as_slice(),
        [
            Request::Target { index: TargetIndex(9), .. },
            Request::Transition { name, .. },
        ] if name == "RoamTransition"
    ));

    peer.driver.set_target(Some(PREY)).unwrap();
    assert!(peer.driver.drain_outbox().is_empty());

    peer.driver.set_target(None).unwrap();
    assert_eq!(
        peer.driver.drain_outbox(),
        vec![Request::Target {
            agent: AgentId(1),
            index: TargetIndex::NONE
        }]
    );
}

#[test]
fn replicated_target_outside_the_roster_is_ignored() {
    let switches = Switches::default();
    let mut observer = Peer::new(&switches, false);

    observer
        .driver
        .receive(Broadcast::Target {
            agent: AgentId(1),
            index: TargetIndex(9),
        })
        .unwrap();
    observer
        .driver
        .receive(Broadcast::Target {
            agent: AgentId(1),
            index: TargetIndex(4),
        })
        .unwrap();

    assert_eq!(observer.driver.target(), Some(EntityId(9)));
    assert!(observer.driver.drain_events().iter().any(|e| matches!(
        e,
        AgentEvent::Fault(FaultEvent::BroadcastRejected { .. })
    )));
}

#[test]
fn override_during_suspended_exit_is_rejected() {
    let switches = Switches::default();
    switches.exit_frames.store(3, std::sync::atomic::Ordering::SeqCst);
    let mut peer = Peer::new(&switches, true);

    peer.driver.override_state("RoamState").unwrap();
    let err = peer.driver.override_state("PanicState").unwrap_err();
    assert!(matches!(err, DriverError::TransitionBusy(AgentId(1))));

    pump(&mut peer, &mut []);
    assert_eq!(peer.driver.phase(), DriverPhase::Exiting);

    let err = peer.driver.override_state("PanicState").unwrap_err();
    assert!(matches!(err, DriverError::TransitionBusy(_)));
    assert_eq!(err.severity(), ErrorSeverity::Recoverable);

    for _ in 0..3 {
        assert_eq!(peer.driver.tick().unwrap(), TickOutcome::InFlight);
    }
    assert_eq!(peer.driver.active_state(), Some(StateKey("RoamState")));
    assert_eq!(peer.driver.phase(), DriverPhase::Active);

    peer.driver.override_state("PanicState").unwrap();
}

#[test]
fn broadcasts_received_in_flight_apply_in_order() {
    let switches = Switches::default();
    switches.exit_frames.store(2, std::sync::atomic::Ordering::SeqCst);
    let mut observer = Peer::new(&switches, false);

    observer.driver.receive(transition("RoamState", 11)).unwrap();
    assert_eq!(observer.driver.phase(), DriverPhase::Exiting);
    observer.driver.receive(transition("PanicState", 12)).unwrap();
    observer
        .driver
        .receive(Broadcast::Target {
            agent: AgentId(1),
            index: TargetIndex(9),
        })
        .unwrap();
    assert_eq!(observer.driver.snapshot().queued, 2);

    observer.driver.tick().unwrap();
    observer.driver.tick().unwrap();

    let lines = observer.journal.lines();
    let roam = lines.iter().position(|l| l.starts_with("enter RoamState"));
    let panic = lines.iter().position(|l| l.starts_with("enter PanicState"));
    assert!(roam.is_some() && roam < panic);
    assert_eq!(observer.driver.active_state(), Some(StateKey("PanicState")));
    assert_eq!(observer.driver.target(), Some(PREY));
    assert_eq!(observer.driver.snapshot().queued, 0);
}

#[test]
fn unknown_name_leaves_the_agent_in_place() {
    let switches = Switches::default();
    let mut peer = Peer::new(&switches, false);

    let err = peer.driver.receive(transition("NoSuchState", 1)).unwrap_err();

    assert!(matches!(
        err,
        DriverError::Registry(RegistryError::Unknown { ref name, .. }) if name == "NoSuchState"
    ));
    assert_eq!(peer.driver.active_state(), Some(StateKey("IdleState")));
    assert_eq!(peer.driver.phase(), DriverPhase::Active);
}

#[test]
fn failing_hook_halts_the_agent() {
    let switches = Switches::default();
    let mut peer = Peer::new(&switches, true);
    peer.driver.override_state("RoamState").unwrap();
    pump(&mut peer, &mut []);
    peer.driver.drain_events();

    Switches::set(&switches.fail_update, true);
    let err = peer.driver.tick().unwrap_err();

    assert!(matches!(
        err,
        DriverError::Hook {
            state: Some(StateKey("RoamState")),
            ..
        }
    ));
    assert!(peer.driver.is_halted());
    assert_eq!(peer.driver.active_state(), None);
    assert!(matches!(
        peer.driver.tick(),
        Err(DriverError::AgentHalted(AgentId(1)))
    ));
    assert!(peer.driver.drain_events().iter().any(|e| matches!(
        e,
        AgentEvent::Fault(FaultEvent::HookFailed { .. })
    )));
}

#[test]
fn observers_cannot_decide() {
    let switches = Switches::default();
    let mut observer = Peer::new(&switches, false);
    Switches::set(&switches.roam, true);

    assert_eq!(observer.driver.tick().unwrap(), TickOutcome::Updated);
    assert!(observer.driver.drain_outbox().is_empty());
    assert!(matches!(
        observer.driver.override_state("RoamState"),
        Err(DriverError::NotAuthority(_))
    ));
}

#[test]
fn overriding_to_a_transition_name_is_rejected() {
    let switches = Switches::default();
    let mut peer = Peer::new(&switches, true);

    let err = peer.driver.override_state("RoamTransition").unwrap_err();

    assert!(matches!(
        err,
        DriverError::Registry(RegistryError::NotAState { name: "RoamTransition" })
    ));
    assert!(!peer.driver.is_busy());
}

#[test]
fn halting_skips_the_exit_hook() {
    let switches = Switches::default();
    let mut peer = Peer::new(&switches, true);

    peer.driver.halt();

    assert_eq!(peer.journal.count("exit"), 0);
    assert!(peer.driver.snapshot().halted);
    assert!(matches!(
        peer.driver.override_state("RoamState"),
        Err(DriverError::AgentHalted(_))
    ));
}

#[test]
fn collisions_reach_state_and_transitions_while_in_flight() {
    let switches = Switches::default();
    switches.exit_frames.store(5, std::sync::atomic::Ordering::SeqCst);
    let mut peer = Peer::new(&switches, true);
    peer.driver.override_state("RoamState").unwrap();
    pump(&mut peer, &mut []);
    assert!(peer.driver.phase().is_in_flight());

    peer.driver
        .collide(Collision {
            other: PREY,
            point: Point::ORIGIN,
        })
        .unwrap();

    // IdleState itself plus the global PanicTransition.
    assert_eq!(switches.collisions.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[test]
fn misrouted_broadcasts_are_refused() {
    let switches = Switches::default();
    let mut peer = Peer::new(&switches, false);

    let err = peer
        .driver
        .receive(Broadcast::Transition {
            agent: AgentId(2),
            name: "RoamState".into(),
            seed: 0,
        })
        .unwrap_err();

    assert!(matches!(err, DriverError::Misrouted { .. }));
}

fn bump(peer: &mut Peer) {
    peer.driver
        .collide(Collision {
            other: PREY,
            point: Point::ORIGIN,
        })
        .unwrap();
}

#[test]
fn hook_override_during_exit_is_dropped_like_an_external_one() {
    let switches = Switches::default();
    switches.exit_frames.store(3, std::sync::atomic::Ordering::SeqCst);
    *switches.override_on_collision.lock().unwrap() = Some("PanicState");
    let mut peer = Peer::new(&switches, true);

    peer.driver.override_state("RoamState").unwrap();
    pump(&mut peer, &mut []);
    assert_eq!(peer.driver.phase(), DriverPhase::Exiting);
    peer.driver.drain_events();

    bump(&mut peer);
    assert!(matches!(
        peer.driver.override_state("PanicState"),
        Err(DriverError::TransitionBusy(AgentId(1)))
    ));
    assert!(peer.driver.drain_events().iter().any(|e| matches!(
        e,
        AgentEvent::Fault(FaultEvent::OverrideRejected { state, .. }) if state == "PanicState"
    )));

    for _ in 0..3 {
        assert_eq!(peer.driver.tick().unwrap(), TickOutcome::InFlight);
    }
    assert_eq!(peer.driver.active_state(), Some(StateKey("RoamState")));

    assert_eq!(peer.driver.tick().unwrap(), TickOutcome::Updated);
    assert!(peer.driver.drain_outbox().is_empty());
    assert_eq!(peer.driver.active_state(), Some(StateKey("RoamState")));
}

#[test]
fn hook_override_while_awaiting_echo_is_dropped() {
    let switches = Switches::default();
    *switches.override_on_collision.lock().unwrap() = Some("PanicState");
    let mut peer = Peer::new(&switches, true);

    peer.driver.override_state("RoamState").unwrap();
    bump(&mut peer);
    pump(&mut peer, &mut []);

    assert_eq!(peer.driver.active_state(), Some(StateKey("RoamState")));
    assert_eq!(peer.driver.tick().unwrap(), TickOutcome::Updated);
    assert!(peer.driver.drain_outbox().is_empty());
}

#[test]
fn hook_override_goes_out_on_the_next_frame() {
    let switches = Switches::default();
    *switches.override_on_collision.lock().unwrap() = Some("PanicState");
    let mut peer = Peer::new(&switches, true);

    bump(&mut peer);

    assert_eq!(
        peer.driver.tick().unwrap(),
        TickOutcome::Requested("PanicState")
    );
    pump(&mut peer, &mut []);
    assert_eq!(peer.driver.active_state(), Some(StateKey("PanicState")));
}

#[test]
fn hook_override_to_a_transition_name_is_rejected() {
    let switches = Switches::default();
    *switches.override_on_collision.lock().unwrap() = Some("RoamTransition");
    let mut peer = Peer::new(&switches, true);
    peer.driver.drain_events();

    bump(&mut peer);

    assert_eq!(peer.driver.tick().unwrap(), TickOutcome::Updated);
    assert!(peer.driver.drain_outbox().is_empty());
    assert!(!peer.driver.is_busy());
    assert!(peer.driver.drain_events().iter().any(|e| matches!(
        e,
        AgentEvent::Fault(FaultEvent::OverrideRejected { state, .. }) if state == "RoamTransition"
    )));
}

#[test]
fn interval_is_suppressed_while_a_transition_is_in_flight() {
    let switches = Switches::default();
    switches.exit_frames.store(2, std::sync::atomic::Ordering::SeqCst);
    switches.enter_frames.store(2, std::sync::atomic::Ordering::SeqCst);
    let mut peer = Peer::new(&switches, true);

    assert!(peer.driver.interval().unwrap());

    peer.driver.override_state("RoamState").unwrap();
    assert!(!peer.driver.interval().unwrap());
    assert_eq!(peer.driver.tick().unwrap(), TickOutcome::AwaitingEcho);

    pump(&mut peer, &mut []);
    assert_eq!(peer.driver.phase(), DriverPhase::Exiting);
    while peer.driver.phase() == DriverPhase::Exiting {
        assert!(!peer.driver.interval().unwrap());
        peer.driver.tick().unwrap();
    }
    assert_eq!(peer.driver.phase(), DriverPhase::Entering);
    while peer.driver.phase() == DriverPhase::Entering {
        assert!(!peer.driver.interval().unwrap());
        peer.driver.tick().unwrap();
    }

    assert_eq!(peer.driver.active_state(), Some(StateKey("RoamState")));
    assert!(peer.driver.interval().unwrap());
    assert_eq!(
        switches.hooks.lines(),
        vec!["interval IdleState", "interval RoamState"]
    );
}

#[test]
fn late_update_follows_update_and_skips_in_flight_frames() {
    let switches = Switches::default();
    switches.exit_frames.store(1, std::sync::atomic::Ordering::SeqCst);
    let mut peer = Peer::new(&switches, true);

    assert_eq!(peer.driver.tick().unwrap(), TickOutcome::Updated);
    assert_eq!(
        switches.hooks.lines(),
        vec!["update IdleState", "late IdleState"]
    );

    peer.driver.override_state("RoamState").unwrap();
    assert_eq!(peer.driver.tick().unwrap(), TickOutcome::AwaitingEcho);
    pump(&mut peer, &mut []);
    assert_eq!(peer.driver.tick().unwrap(), TickOutcome::InFlight);
    assert_eq!(switches.hooks.lines().len(), 2);

    assert_eq!(peer.driver.tick().unwrap(), TickOutcome::Updated);
    assert_eq!(
        switches.hooks.lines(),
        vec!["update IdleState", "late IdleState", "update RoamState"]
    );
}

#[test]
fn lost_request_frees_the_agent_to_decide_again() {
    let switches = Switches::default();
    let mut peer = Peer::new(&switches, true);
    peer.driver.drain_events();

    peer.driver.override_state("PanicState").unwrap();
    assert_eq!(peer.driver.drain_outbox().len(), 1);
    assert_eq!(peer.driver.tick().unwrap(), TickOutcome::AwaitingEcho);

    peer.driver.request_lost("PanicState", "replication relay is closed");

    assert!(!peer.driver.is_busy());
    assert!(peer.driver.drain_events().iter().any(|e| matches!(
        e,
        AgentEvent::Fault(FaultEvent::RequestLost { name, .. }) if name == "PanicState"
    )));
    Switches::set(&switches.roam, true);
    assert_eq!(
        peer.driver.tick().unwrap(),
        TickOutcome::Requested("RoamTransition")
    );
}
