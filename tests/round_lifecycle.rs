//! Controller-level scenarios: timer expiry, pause, replay, settlement

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use token_rush::input::InputAdapter;
use token_rush::replay::ReplayFrame;
use token_rush::settlement::Settlement;
use token_rush::sim::{GameEvent, Reward, SimulationState, TickInput, tick};
use token_rush::{
    DeviceProfile, FrameStatus, LoopHandle, Outcome, OutcomeReport, RoundController, RoundError, RoundPhase,
    RoundRequest, SettlementError, SimulationConfig,
};

/// Slightly over one tick so every frame runs exactly one tick
const FRAME_MS: f64 = 1000.0 / 60.0 + 0.01;

#[derive(Clone, Default)]
struct SharedSettlement {
    reports: Rc<RefCell<Vec<OutcomeReport>>>,
    failing: Rc<RefCell<bool>>,
    /// Accepted, then failed later (a dropped HTTP request)
    dropped: Rc<RefCell<Vec<OutcomeReport>>>,
}

impl Settlement for SharedSettlement {
    fn submit(&mut self, report: &OutcomeReport) -> Result<(), SettlementError> {
        if *self.failing.borrow() {
            return Err(SettlementError::Unavailable("offline".into()));
        }
        self.reports.borrow_mut().push(report.clone());
        Ok(())
    }

    fn poll_failures(&mut self) -> Vec<OutcomeReport> {
        std::mem::take(&mut *self.dropped.borrow_mut())
    }
}

fn quiet_request(duration_secs: f32) -> RoundRequest {
    RoundRequest {
        duration_secs: Some(duration_secs),
        countdown_secs: 3,
        tuning: Some(SimulationConfig {
            hazard_count: 0,
            reward_drift: 0.0,
            reward_jitter: 0.0,
            ..Default::default()
        }),
        ..RoundRequest::new(DeviceProfile::Desktop, 800.0, 600.0, 7)
    }
}

/// Start a round and run the countdown out; returns the handle and clock
fn start_active(rounds: &mut RoundController, input: &mut InputAdapter, request: &RoundRequest) -> (LoopHandle, f64) {
    let handle = rounds.start_round(request).unwrap();
    assert_eq!(rounds.frame(handle, 0.0, input), FrameStatus::Continue);
    let now = request.countdown_secs as f64 * 1000.0;
    assert_eq!(rounds.frame(handle, now, input), FrameStatus::Continue);
    assert_eq!(rounds.phase(), RoundPhase::Active);
    (handle, now)
}

/// Frames until the round ends
fn run_to_end(rounds: &mut RoundController, input: &mut InputAdapter, handle: LoopHandle, mut now: f64) -> (OutcomeReport, f64) {
    loop {
        now += FRAME_MS;
        match rounds.frame(handle, now, input) {
            FrameStatus::Continue => {}
            FrameStatus::Finished(report) => return (report, now),
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[test]
fn test_single_reward_on_spawn_wins_first_tick() {
    let mut state = SimulationState::new(SimulationConfig {
        hazard_count: 0,
        ..Default::default()
    });
    state.rewards.push(Reward {
        pos: Vec2::new(400.0, 300.0),
        vel: Vec2::ZERO,
        radius: 8.0,
        collected: false,
        jitter_ticks: 100,
    });
    assert_eq!(tick(&mut state, &TickInput::default()), Some(Outcome::Win));
    assert!(state.rewards[0].collected);
}

#[test]
fn test_timer_expiry_loses_regardless_of_ticks() {
    let mut rounds = RoundController::new(Box::new(SharedSettlement::default()));
    let mut input = InputAdapter::new();
    let (handle, now) = start_active(&mut rounds, &mut input, &quiet_request(30.0));

    // One 30 s gap: the tab was suspended
    let status = rounds.frame(handle, now + 30_000.0, &mut input);
    let FrameStatus::Finished(report) = status else {
        panic!("expected the round to end, got {:?}", status);
    };
    assert_eq!(report.outcome, Outcome::Lose);
    assert_eq!(report.ticks_elapsed, 0);
    assert_eq!(rounds.phase(), RoundPhase::Terminal(Outcome::Lose));
    assert_eq!(rounds.drain_events(), vec![GameEvent::TimeExpired]);
    assert_eq!(rounds.frame(handle, now + 31_000.0, &mut input), FrameStatus::Stopped);
}

#[test]
fn test_timer_runs_on_wall_clock() {
    let mut rounds = RoundController::new(Box::new(SharedSettlement::default()));
    let mut input = InputAdapter::new();
    let (handle, start) = start_active(&mut rounds, &mut input, &quiet_request(2.0));

    let (report, end) = run_to_end(&mut rounds, &mut input, handle, start);
    assert_eq!(report.outcome, Outcome::Lose);
    let elapsed = end - start;
    assert!(elapsed >= 2000.0 - 1e-6, "ended early at {elapsed}");
    assert!(elapsed < 2000.0 + FRAME_MS);
    // Timer checked before ticks: the expiring frame runs none
    assert!((118..=120).contains(&report.ticks_elapsed));
}

#[test]
fn test_pause_freezes_timer_and_entities() {
    let mut rounds = RoundController::new(Box::new(SharedSettlement::default()));
    let mut input = InputAdapter::new();
    let (handle, mut now) = start_active(&mut rounds, &mut input, &quiet_request(30.0));

    for _ in 0..30 {
        now += FRAME_MS;
        input.pointer_moved(Vec2::new(700.0, 500.0));
        rounds.frame(handle, now, &mut input);
    }
    rounds.pause().unwrap();
    let frozen_timer = rounds.timer_remaining().unwrap();
    let frozen = ReplayFrame::capture(rounds.state().unwrap());
    let frozen_ticks = rounds.round().unwrap().ticks;
    assert!(rounds.round().unwrap().paused);

    for _ in 0..5 {
        now += 10_000.0;
        assert_eq!(rounds.frame(handle, now, &mut input), FrameStatus::Continue);
    }
    assert_eq!(rounds.timer_remaining(), Some(frozen_timer));
    assert_eq!(ReplayFrame::capture(rounds.state().unwrap()), frozen);
    assert_eq!(rounds.round().unwrap().ticks, frozen_ticks);

    rounds.resume().unwrap();
    now += 60_000.0;
    rounds.frame(handle, now, &mut input);
    // First frame after resume only re-anchors the clock
    assert_eq!(rounds.timer_remaining(), Some(frozen_timer));
    now += 100.0;
    rounds.frame(handle, now, &mut input);
    let remaining = rounds.timer_remaining().unwrap();
    assert!((frozen_timer - remaining - 0.1).abs() < 1e-9);

    // Nothing was recorded while paused
    let (report, _) = run_to_end(&mut rounds, &mut input, handle, now);
    let replay = rounds.replay().unwrap();
    assert_eq!(replay.len() as u64, report.ticks_elapsed);
    assert_eq!(replay.frame(frozen_ticks as usize - 1), Some(&frozen));
}

#[test]
fn test_replay_matches_recording_and_cancels() {
    let mut rounds = RoundController::new(Box::new(SharedSettlement::default()));
    let mut input = InputAdapter::new();
    let (handle, start) = start_active(&mut rounds, &mut input, &quiet_request(1.0));
    let (report, mut now) = run_to_end(&mut rounds, &mut input, handle, start);

    let replay = rounds.replay().cloned().unwrap();
    assert_eq!(replay.len() as u64, report.ticks_elapsed);
    assert_eq!(replay.digest(), report.replay_digest);
    assert!(replay.len() > 21);

    let replay_handle = rounds.start_replay().unwrap().unwrap();
    assert_eq!(rounds.phase(), RoundPhase::Replaying);
    assert_eq!(rounds.frame(handle, now, &mut input), FrameStatus::Stale);

    while rounds.replay_position() != Some(20) {
        now += FRAME_MS;
        assert_eq!(rounds.frame(replay_handle, now, &mut input), FrameStatus::Continue);
    }
    rounds.cancel_replay().unwrap();
    assert_eq!(rounds.phase(), RoundPhase::Idle);
    assert_eq!(
        ReplayFrame::capture(rounds.state().unwrap()),
        replay.frame(20).cloned().unwrap()
    );
    assert_eq!(rounds.frame(replay_handle, now + FRAME_MS, &mut input), FrameStatus::Stale);
    // Still available to watch again
    assert_eq!(rounds.replay(), Some(&replay));
}

#[test]
fn test_replay_twice_is_identical() {
    let mut rounds = RoundController::new(Box::new(SharedSettlement::default()));
    let mut input = InputAdapter::new();
    let request = RoundRequest {
        tuning: None,
        duration_secs: Some(1.0),
        countdown_secs: 3,
        ..RoundRequest::new(DeviceProfile::Desktop, 800.0, 600.0, 11)
    };
    let (handle, start) = start_active(&mut rounds, &mut input, &request);
    let (_, mut now) = run_to_end(&mut rounds, &mut input, handle, start);

    let mut runs = Vec::new();
    for _ in 0..2 {
        let handle = rounds.start_replay().unwrap().unwrap();
        let mut positions = Vec::new();
        loop {
            now += FRAME_MS;
            let status = rounds.frame(handle, now, &mut input);
            let state = rounds.state().unwrap();
            positions.push((state.player.pos, state.hazards.iter().map(|h| h.pos).collect::<Vec<_>>()));
            if status == FrameStatus::Stopped {
                break;
            }
        }
        assert_eq!(rounds.phase(), RoundPhase::Idle);
        runs.push(positions);
    }
    assert_eq!(runs[0], runs[1]);
}

#[test]
fn test_unvalidated_stake_never_starts() {
    let settlement = SharedSettlement::default();
    let mut rounds = RoundController::new(Box::new(settlement.clone()));
    let request = RoundRequest {
        stake_validated: false,
        ..quiet_request(10.0)
    };
    assert_eq!(rounds.start_round(&request), Err(RoundError::StakeNotValidated));
    assert_eq!(rounds.phase(), RoundPhase::Idle);
    assert!(rounds.state().is_none());
    assert!(settlement.reports.borrow().is_empty());
}

#[test]
fn test_exactly_one_report_per_round() {
    let settlement = SharedSettlement::default();
    let mut rounds = RoundController::new(Box::new(settlement.clone()));
    let mut input = InputAdapter::new();
    let (handle, now) = start_active(&mut rounds, &mut input, &quiet_request(0.5));
    let (report, now) = run_to_end(&mut rounds, &mut input, handle, now);
    for i in 1..10 {
        assert_eq!(rounds.frame(handle, now + i as f64 * 100.0, &mut input), FrameStatus::Stopped);
    }
    assert_eq!(*settlement.reports.borrow(), vec![report.clone()]);
    assert_eq!(rounds.last_report(), Some(&report));
}

#[test]
fn test_settlement_failure_keeps_outcome_for_retry() {
    let settlement = SharedSettlement::default();
    *settlement.failing.borrow_mut() = true;
    let mut rounds = RoundController::new(Box::new(settlement.clone()));
    let mut input = InputAdapter::new();
    let (handle, now) = start_active(&mut rounds, &mut input, &quiet_request(0.5));
    let (report, _) = run_to_end(&mut rounds, &mut input, handle, now);

    // Local result stands
    assert_eq!(rounds.phase(), RoundPhase::Terminal(report.outcome));
    assert_eq!(rounds.unsettled_reports(), &[report.clone()]);
    assert!(rounds.retry_settlement().is_err());
    assert_eq!(rounds.unsettled_reports(), &[report.clone()]);

    // Next round may start while settlement is outstanding
    rounds.start_round(&quiet_request(0.5)).unwrap();
    assert_eq!(rounds.phase(), RoundPhase::Countdown);

    *settlement.failing.borrow_mut() = false;
    assert_eq!(rounds.retry_settlement(), Ok(()));
    assert!(rounds.unsettled_reports().is_empty());
    assert_eq!(*settlement.reports.borrow(), vec![report]);
    assert_eq!(rounds.retry_settlement(), Ok(()));
}

#[test]
fn test_later_success_does_not_drop_earlier_failure() {
    let settlement = SharedSettlement::default();
    let mut rounds = RoundController::new(Box::new(settlement.clone()));
    let mut input = InputAdapter::new();

    *settlement.failing.borrow_mut() = true;
    let (handle, now) = start_active(&mut rounds, &mut input, &quiet_request(0.5));
    let (first, _) = run_to_end(&mut rounds, &mut input, handle, now);

    *settlement.failing.borrow_mut() = false;
    let (handle, now) = start_active(&mut rounds, &mut input, &quiet_request(0.6));
    let (second, _) = run_to_end(&mut rounds, &mut input, handle, now);
    assert_ne!(first, second);

    assert_eq!(*settlement.reports.borrow(), vec![second.clone()]);
    assert_eq!(rounds.unsettled_reports(), &[first.clone()]);
    assert_eq!(rounds.retry_settlement(), Ok(()));
    assert_eq!(*settlement.reports.borrow(), vec![second, first]);
    assert!(rounds.unsettled_reports().is_empty());
}

#[test]
fn test_failed_reports_retry_oldest_first() {
    let settlement = SharedSettlement::default();
    *settlement.failing.borrow_mut() = true;
    let mut rounds = RoundController::new(Box::new(settlement.clone()));
    let mut input = InputAdapter::new();

    let mut failed = Vec::new();
    for duration in [0.5, 0.6, 0.7] {
        let (handle, now) = start_active(&mut rounds, &mut input, &quiet_request(duration));
        failed.push(run_to_end(&mut rounds, &mut input, handle, now).0);
    }
    assert_eq!(rounds.unsettled_reports().iter().cloned().collect::<Vec<_>>(), failed);

    *settlement.failing.borrow_mut() = false;
    assert_eq!(rounds.retry_settlement(), Ok(()));
    assert_eq!(*settlement.reports.borrow(), failed);
}

#[test]
fn test_failure_after_dispatch_reaches_retry() {
    let settlement = SharedSettlement::default();
    let mut rounds = RoundController::new(Box::new(settlement.clone()));
    let mut input = InputAdapter::new();
    let (handle, now) = start_active(&mut rounds, &mut input, &quiet_request(0.5));
    let (report, _) = run_to_end(&mut rounds, &mut input, handle, now);
    assert!(rounds.unsettled_reports().is_empty());

    // The request was accepted, then the network dropped it
    settlement.reports.borrow_mut().clear();
    settlement.dropped.borrow_mut().push(report.clone());
    assert_eq!(rounds.poll_settlement(), 1);
    assert_eq!(rounds.unsettled_reports(), &[report.clone()]);
    assert_eq!(rounds.poll_settlement(), 0);

    assert_eq!(rounds.retry_settlement(), Ok(()));
    assert_eq!(*settlement.reports.borrow(), vec![report]);
    assert!(rounds.unsettled_reports().is_empty());
}

#[test]
fn test_dismiss_returns_to_idle() {
    let mut rounds = RoundController::new(Box::new(SharedSettlement::default()));
    let mut input = InputAdapter::new();
    let (handle, now) = start_active(&mut rounds, &mut input, &quiet_request(0.5));
    run_to_end(&mut rounds, &mut input, handle, now);
    rounds.dismiss().unwrap();
    assert_eq!(rounds.phase(), RoundPhase::Idle);
    assert!(rounds.dismiss().is_err());
    assert_eq!(rounds.frame(handle, now, &mut input), FrameStatus::Stale);
}

#[test]
fn test_new_round_discards_old_replay() {
    let mut rounds = RoundController::new(Box::new(SharedSettlement::default()));
    let mut input = InputAdapter::new();
    let (handle, now) = start_active(&mut rounds, &mut input, &quiet_request(0.5));
    run_to_end(&mut rounds, &mut input, handle, now);
    assert!(rounds.replay().is_some());
    rounds.start_round(&quiet_request(0.5)).unwrap();
    assert!(rounds.replay().is_none());
    assert_eq!(rounds.start_replay(), Err(RoundError::InvalidPhase {
        operation: "start a replay",
        phase: "counting down",
    }));
}
