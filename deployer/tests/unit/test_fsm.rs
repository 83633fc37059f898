//! FSM unit tests

use kdeploy::deploy::fsm::{ReleaseEvent, ReleaseFsm, ReleasePath, ReleaseState};

#[test]
fn test_fsm_initial_state() {
    let fsm = ReleaseFsm::new(ReleasePath::Forward);
    assert_eq!(fsm.state(), ReleaseState::Idle);
    assert!(fsm.error().is_none());
    assert!(fsm.completed().is_empty());
}

#[test]
fn test_fsm_forward_success_flow() {
    let mut fsm = ReleaseFsm::new(ReleasePath::Forward);

    fsm.process(ReleaseEvent::Start).unwrap();
    assert_eq!(fsm.state(), ReleaseState::SyncingSource);

    for _ in ReleasePath::Forward.steps() {
        fsm.process(ReleaseEvent::StepSucceeded).unwrap();
    }
    assert_eq!(fsm.state(), ReleaseState::Done);
    assert_eq!(fsm.completed(), ReleasePath::Forward.steps());
    assert!(fsm.touched_live_dir());
}

#[test]
fn test_fsm_rollback_order() {
    let mut fsm = ReleaseFsm::new(ReleasePath::Rollback);

    fsm.process(ReleaseEvent::Start).unwrap();
    assert_eq!(fsm.state(), ReleaseState::ResolvingArchive);
    fsm.process(ReleaseEvent::StepSucceeded).unwrap();
    assert_eq!(fsm.state(), ReleaseState::CheckingValidity);
    fsm.process(ReleaseEvent::StepSucceeded).unwrap();
    assert_eq!(fsm.state(), ReleaseState::ClearingLiveDir);
}

#[test]
fn test_fsm_failure_stops_before_live_dir() {
    let mut fsm = ReleaseFsm::new(ReleasePath::Forward);

    fsm.process(ReleaseEvent::Start).unwrap();
    fsm.process(ReleaseEvent::StepSucceeded).unwrap();
    fsm.process(ReleaseEvent::StepSucceeded).unwrap();
    fsm.process(ReleaseEvent::StepFailed("grunt production".to_string()))
        .unwrap();

    assert_eq!(fsm.state(), ReleaseState::Failed);
    assert_eq!(fsm.failed_at(), Some(ReleaseState::Building));
    assert_eq!(fsm.error(), Some("grunt production"));
    assert!(!fsm.touched_live_dir());
}

#[test]
fn test_fsm_failed_attempt_is_final() {
    let mut fsm = ReleaseFsm::new(ReleasePath::Rollback);

    fsm.process(ReleaseEvent::Start).unwrap();
    fsm.process(ReleaseEvent::StepFailed("no archive".to_string()))
        .unwrap();

    assert!(fsm.process(ReleaseEvent::StepSucceeded).is_err());
    assert!(fsm.process(ReleaseEvent::Start).is_err());
}

#[test]
fn test_fsm_invalid_transition() {
    let mut fsm = ReleaseFsm::new(ReleasePath::Forward);

    // Nothing to finish before the attempt starts
    let result = fsm.process(ReleaseEvent::StepSucceeded);
    assert!(result.is_err());
}
