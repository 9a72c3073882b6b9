//! Round lifecycle controller
//!
//! Idle -> Countdown -> Active <-> Paused -> Terminal -> Replaying -> Idle.
//!
//! The host calls `frame` once per animation frame with the `LoopHandle` it
//! was given when the loop started. Every transition that starts a new loop
//! bumps the generation, so a callback left over from an earlier loop is
//! rejected before it can touch the entity state.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::{DeviceProfile, SimulationConfig};
use crate::consts::*;
use crate::error::{ConfigError, RoundError, SettlementError};
use crate::input::InputAdapter;
use crate::replay::{Replay, ReplayPlayer, ReplayRecorder};
use crate::settlement::Settlement;
use crate::sim::{GameEvent, LossReason, SimulationState, initialize_round, tick};

pub use crate::sim::Outcome;

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Idle,
    Countdown,
    Active,
    Paused,
    Terminal(Outcome),
    Replaying,
}

impl RoundPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundPhase::Idle => "idle",
            RoundPhase::Countdown => "counting down",
            RoundPhase::Active => "active",
            RoundPhase::Paused => "paused",
            RoundPhase::Terminal(_) => "finished",
            RoundPhase::Replaying => "replaying",
        }
    }
}

/// Timer and bookkeeping for the current round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundState {
    /// Total round length (seconds)
    pub duration: f64,
    /// Seconds left; depleted by wall-clock time while active
    pub timer_remaining: f64,
    pub running: bool,
    pub paused: bool,
    /// Active ticks simulated so far
    pub ticks: u64,
    /// `None` while the round is pending
    pub outcome: Option<Outcome>,
}

impl RoundState {
    fn new(duration: f64) -> Self {
        Self {
            duration,
            timer_remaining: duration,
            running: false,
            paused: false,
            ticks: 0,
            outcome: None,
        }
    }
}

/// Everything the caller supplies to start a round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundRequest {
    /// Set by the surrounding application once the stake cleared
    pub stake_validated: bool,
    pub device: DeviceProfile,
    pub arena_width: f32,
    pub arena_height: f32,
    pub seed: u64,
    /// Overrides the device default round length
    pub duration_secs: Option<f32>,
    pub countdown_secs: u32,
    /// Full tuning override; arena size and seed still come from the request
    pub tuning: Option<SimulationConfig>,
}

impl RoundRequest {
    pub fn new(device: DeviceProfile, arena_width: f32, arena_height: f32, seed: u64) -> Self {
        Self {
            stake_validated: true,
            device,
            arena_width,
            arena_height,
            seed,
            duration_secs: None,
            countdown_secs: COUNTDOWN_SECS,
            tuning: None,
        }
    }

    /// Resolve the simulation config for this round
    pub fn simulation_config(&self) -> SimulationConfig {
        match &self.tuning {
            Some(tuning) => SimulationConfig {
                arena_width: self.arena_width,
                arena_height: self.arena_height,
                seed: self.seed,
                ..tuning.clone()
            },
            None => SimulationConfig::for_device(self.device, self.arena_width, self.arena_height, self.seed),
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration_secs.unwrap_or_else(|| self.device.round_duration_secs())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(3..=5).contains(&self.countdown_secs) {
            return Err(ConfigError::Countdown(self.countdown_secs));
        }
        let duration = self.duration();
        if !(duration > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "duration_secs",
                value: duration,
            });
        }
        Ok(())
    }
}

/// The single terminal event handed to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeReport {
    pub outcome: Outcome,
    pub ticks_elapsed: u64,
    /// SHA-256 of the recorded replay
    pub replay_digest: String,
}

/// Identifies one scheduled frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopHandle {
    generation: u64,
}

/// What the host should do after a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    /// Schedule another frame
    Continue,
    /// The round ended on this frame; the report was already submitted
    Finished(OutcomeReport),
    /// This loop is done (terminal, replay over, idle)
    Stopped,
    /// The handle belongs to a loop that was replaced; nothing was touched
    Stale,
}

/// Fixed-step accumulator fed by wall-clock timestamps
#[derive(Debug, Clone, Default)]
struct FrameClock {
    last_ms: Option<f64>,
    accumulator: f32,
}

impl FrameClock {
    /// Forget the previous timestamp; the next frame has zero delta
    fn reset(&mut self) {
        self.last_ms = None;
        self.accumulator = 0.0;
    }

    fn restart_at(&mut self, now_ms: f64) {
        self.last_ms = Some(now_ms);
        self.accumulator = 0.0;
    }

    /// Raw wall-clock seconds since the previous frame
    fn advance(&mut self, now_ms: f64) -> f64 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        dt
    }

    /// Ticks to run for this frame's delta
    fn ticks_due(&mut self, dt: f64) -> u32 {
        if dt > MAX_FRAME_DT as f64 {
            log::warn!("Frame stalled for {:.3}s, clamping simulation step", dt);
        }
        self.accumulator += (dt as f32).min(MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop the backlog instead of catching up later
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }
}

/// Owns the simulation state and drives it through the round lifecycle
pub struct RoundController {
    phase: RoundPhase,
    generation: u64,
    state: Option<SimulationState>,
    round: Option<RoundState>,
    countdown_remaining: f64,
    clock: FrameClock,
    recorder: ReplayRecorder,
    replay: Option<Replay>,
    player: Option<ReplayPlayer>,
    last_report: Option<OutcomeReport>,
    /// Oldest first
    unsettled: VecDeque<OutcomeReport>,
    settlement: Box<dyn Settlement>,
    events: Vec<GameEvent>,
}

impl RoundController {
    pub fn new(settlement: Box<dyn Settlement>) -> Self {
        Self {
            phase: RoundPhase::Idle,
            generation: 0,
            state: None,
            round: None,
            countdown_remaining: 0.0,
            clock: FrameClock::default(),
            recorder: ReplayRecorder::new(),
            replay: None,
            player: None,
            last_report: None,
            unsettled: VecDeque::new(),
            settlement,
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn state(&self) -> Option<&SimulationState> {
        self.state.as_ref()
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn replay(&self) -> Option<&Replay> {
        self.replay.as_ref()
    }

    pub fn last_report(&self) -> Option<&OutcomeReport> {
        self.last_report.as_ref()
    }

    /// Reports whose settlement failed and await `retry_settlement`, oldest first
    pub fn unsettled_reports(&self) -> &VecDeque<OutcomeReport> {
        &self.unsettled
    }

    /// Queue reports the settlement collaborator failed to deliver after
    /// accepting them; returns how many arrived
    pub fn poll_settlement(&mut self) -> usize {
        let failed = self.settlement.poll_failures();
        let count = failed.len();
        for report in failed {
            log::warn!(
                "Settlement of a {} round ({} ticks) failed in flight, queued for retry",
                report.outcome.as_str(),
                report.ticks_elapsed
            );
            self.unsettled.push_back(report);
        }
        count
    }

    /// Handle for the loop the host should currently be running
    pub fn loop_handle(&self) -> LoopHandle {
        LoopHandle {
            generation: self.generation,
        }
    }

    /// Whole seconds left in the countdown, while counting down
    pub fn countdown_display(&self) -> Option<u32> {
        (self.phase == RoundPhase::Countdown).then(|| self.countdown_remaining.ceil().max(1.0) as u32)
    }

    /// Seconds left on the round timer
    pub fn timer_remaining(&self) -> Option<f64> {
        self.round.as_ref().map(|r| r.timer_remaining.max(0.0))
    }

    /// Index of the frame being shown during playback
    pub fn replay_position(&self) -> Option<usize> {
        self.player.as_ref().and_then(|p| p.position())
    }

    /// Gameplay events since the last drain (effects, audio)
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin a round: validate, build the arena, enter the countdown
    ///
    /// On error nothing changes; the previous phase and state stay as they were.
    pub fn start_round(&mut self, request: &RoundRequest) -> Result<LoopHandle, RoundError> {
        if !matches!(self.phase, RoundPhase::Idle | RoundPhase::Terminal(_)) {
            return Err(self.invalid("start a round"));
        }
        if !request.stake_validated {
            log::warn!("Refusing to start a round without a validated stake");
            return Err(RoundError::StakeNotValidated);
        }
        request.validate()?;
        let state = initialize_round(request.simulation_config())?;

        let duration = request.duration() as f64;
        log::info!(
            "Round starting: {} profile, {:.0}x{:.0}, {:.1}s, seed {}",
            request.device.as_str(),
            request.arena_width,
            request.arena_height,
            duration,
            request.seed
        );

        self.state = Some(state);
        self.round = Some(RoundState::new(duration));
        self.countdown_remaining = request.countdown_secs as f64;
        self.clock.reset();
        self.recorder = ReplayRecorder::new();
        self.replay = None;
        self.player = None;
        self.last_report = None;
        self.events.clear();
        self.phase = RoundPhase::Countdown;
        Ok(self.next_loop())
    }

    /// Advance by one animation frame
    pub fn frame(&mut self, handle: LoopHandle, now_ms: f64, input: &mut InputAdapter) -> FrameStatus {
        if handle != self.loop_handle() {
            return FrameStatus::Stale;
        }
        match self.phase {
            RoundPhase::Idle | RoundPhase::Terminal(_) => FrameStatus::Stopped,
            RoundPhase::Paused => FrameStatus::Continue,
            RoundPhase::Countdown => self.countdown_frame(now_ms, input),
            RoundPhase::Active => self.active_frame(now_ms, input),
            RoundPhase::Replaying => self.replay_frame(now_ms),
        }
    }

    fn countdown_frame(&mut self, now_ms: f64, input: &mut InputAdapter) -> FrameStatus {
        let dt = self.clock.advance(now_ms);
        self.countdown_remaining -= dt;
        if self.countdown_remaining <= 0.0 {
            self.countdown_remaining = 0.0;
            self.clock.restart_at(now_ms);
            self.recorder.begin();
            input.reset();
            if let Some(round) = self.round.as_mut() {
                round.running = true;
            }
            self.phase = RoundPhase::Active;
            log::info!("Round active");
        }
        FrameStatus::Continue
    }

    fn active_frame(&mut self, now_ms: f64, input: &mut InputAdapter) -> FrameStatus {
        let dt = self.clock.advance(now_ms);

        // Timer runs on wall-clock time and is checked before any tick
        let expired = match self.round.as_mut() {
            Some(round) => {
                round.timer_remaining -= dt;
                round.timer_remaining <= 0.0
            }
            None => false,
        };
        if expired {
            self.events.push(GameEvent::TimeExpired);
            return self.finish(Outcome::Lose, Some(LossReason::TimeExpired));
        }

        let steps = self.clock.ticks_due(dt);
        for _ in 0..steps {
            let Some(state) = self.state.as_mut() else {
                return FrameStatus::Stopped;
            };
            let tick_input = input.next_tick();
            let outcome = tick(state, &tick_input);
            self.recorder.record(state);
            self.events.extend(state.drain_events());
            if let Some(round) = self.round.as_mut() {
                round.ticks += 1;
            }
            if let Some(outcome) = outcome {
                let reason = (outcome == Outcome::Lose).then_some(LossReason::HazardContact);
                return self.finish(outcome, reason);
            }
        }
        FrameStatus::Continue
    }

    fn replay_frame(&mut self, now_ms: f64) -> FrameStatus {
        let dt = self.clock.advance(now_ms);
        let steps = self.clock.ticks_due(dt);
        let (Some(player), Some(state)) = (self.player.as_mut(), self.state.as_mut()) else {
            return FrameStatus::Stopped;
        };
        for _ in 0..steps {
            if player.step(state).is_none() {
                break;
            }
        }
        if player.is_finished() {
            log::info!("Replay finished");
            self.end_replay();
            return FrameStatus::Stopped;
        }
        FrameStatus::Continue
    }

    fn finish(&mut self, outcome: Outcome, reason: Option<LossReason>) -> FrameStatus {
        let ticks_elapsed = match self.round.as_mut() {
            Some(round) => {
                round.outcome = Some(outcome);
                round.running = false;
                round.ticks
            }
            None => 0,
        };
        let replay = self.recorder.finish();
        let report = OutcomeReport {
            outcome,
            ticks_elapsed,
            replay_digest: replay.digest(),
        };
        match reason {
            Some(reason) => log::info!("Round lost ({:?}) after {} ticks", reason, ticks_elapsed),
            None => log::info!("Round won after {} ticks", ticks_elapsed),
        }

        self.replay = Some(replay);
        self.phase = RoundPhase::Terminal(outcome);
        self.last_report = Some(report.clone());
        self.submit(report.clone());
        FrameStatus::Finished(report)
    }

    fn submit(&mut self, report: OutcomeReport) {
        if let Err(err) = self.settlement.submit(&report) {
            log::warn!("Settlement failed, keeping report for retry: {}", err);
            self.unsettled.push_back(report);
        }
    }

    /// Re-submit every report whose settlement failed, oldest first
    ///
    /// Stops at the first failure; that report and everything after it stay
    /// queued in order. A no-op when nothing is pending.
    pub fn retry_settlement(&mut self) -> Result<(), SettlementError> {
        self.poll_settlement();
        while let Some(report) = self.unsettled.pop_front() {
            if let Err(err) = self.settlement.submit(&report) {
                log::warn!("Settlement retry failed, {} report(s) pending: {}", self.unsettled.len() + 1, err);
                self.unsettled.push_front(report);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Freeze the simulation and timer
    pub fn pause(&mut self) -> Result<(), RoundError> {
        if self.phase != RoundPhase::Active {
            return Err(self.invalid("pause"));
        }
        self.recorder.suspend();
        if let Some(round) = self.round.as_mut() {
            round.paused = true;
        }
        self.phase = RoundPhase::Paused;
        log::info!("Round paused");
        Ok(())
    }

    /// Continue from the frozen timer value
    pub fn resume(&mut self) -> Result<(), RoundError> {
        if self.phase != RoundPhase::Paused {
            return Err(self.invalid("resume"));
        }
        // The paused gap must not reach the timer
        self.clock.reset();
        self.recorder.resume();
        if let Some(round) = self.round.as_mut() {
            round.paused = false;
        }
        self.phase = RoundPhase::Active;
        log::info!("Round resumed");
        Ok(())
    }

    /// Play the last round back; `Ok(None)` when there is nothing to play
    pub fn start_replay(&mut self) -> Result<Option<LoopHandle>, RoundError> {
        if !matches!(self.phase, RoundPhase::Idle | RoundPhase::Terminal(_)) {
            return Err(self.invalid("start a replay"));
        }
        let replay = match self.replay.take() {
            Some(replay) if !replay.is_empty() && self.state.is_some() => replay,
            other => {
                self.replay = other;
                log::info!("No replay to play");
                return Ok(None);
            }
        };
        log::info!("Replaying {} frames", replay.len());
        self.player = Some(ReplayPlayer::new(replay));
        self.clock.reset();
        self.phase = RoundPhase::Replaying;
        Ok(Some(self.next_loop()))
    }

    /// Stop playback early; the last restored frame stays on screen
    pub fn cancel_replay(&mut self) -> Result<(), RoundError> {
        if self.phase != RoundPhase::Replaying {
            return Err(self.invalid("cancel a replay"));
        }
        if let Some(player) = self.player.as_mut() {
            player.cancel();
            log::info!("Replay cancelled at frame {:?}", player.position());
        }
        self.end_replay();
        Ok(())
    }

    /// Leave the result screen
    pub fn dismiss(&mut self) -> Result<(), RoundError> {
        if !matches!(self.phase, RoundPhase::Terminal(_)) {
            return Err(self.invalid("dismiss"));
        }
        self.phase = RoundPhase::Idle;
        self.next_loop();
        Ok(())
    }

    fn end_replay(&mut self) {
        if let Some(player) = self.player.take() {
            self.replay = Some(player.into_replay());
        }
        self.phase = RoundPhase::Idle;
        self.next_loop();
    }

    fn next_loop(&mut self) -> LoopHandle {
        self.generation += 1;
        self.loop_handle()
    }

    fn invalid(&self, operation: &'static str) -> RoundError {
        RoundError::InvalidPhase {
            operation,
            phase: self.phase.as_str(),
        }
    }
}
