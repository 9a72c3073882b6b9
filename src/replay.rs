//! Replay recording and playback
//!
//! The recorder copies entity sets once per active tick; the player restores
//! them verbatim at the same cadence without running any physics.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::sim::{Hazard, Player, Reward, SimulationState};

/// Identifies the byte layout fed into `Replay::digest`
pub const REPLAY_DIGEST_ALGO_ID: &str = "replay-v1-sha256-le-f32canon";

/// Snapshot of every entity at one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub player: Player,
    pub rewards: Vec<Reward>,
    pub hazards: Vec<Hazard>,
}

impl ReplayFrame {
    /// Deep copy of the entity sets; later ticks cannot alter it
    pub fn capture(state: &SimulationState) -> Self {
        Self {
            player: state.player.clone(),
            rewards: state.rewards.clone(),
            hazards: state.hazards.clone(),
        }
    }

    /// Overwrite the state's entity sets with this frame
    pub fn restore(&self, state: &mut SimulationState) {
        state.player.clone_from(&self.player);
        state.rewards.clone_from(&self.rewards);
        state.hazards.clone_from(&self.hazards);
    }
}

/// Ordered frames of one completed round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    frames: Vec<ReplayFrame>,
}

impl Replay {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[ReplayFrame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&ReplayFrame> {
        self.frames.get(index)
    }

    /// SHA-256 over a canonical little-endian encoding of every frame
    ///
    /// Lets the settlement side bind a reported outcome to the trace that
    /// produced it.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(REPLAY_DIGEST_ALGO_ID.as_bytes());
        hasher.update((self.frames.len() as u64).to_le_bytes());
        for frame in &self.frames {
            let p = &frame.player;
            for v in [p.pos.x, p.pos.y, p.vel.x, p.vel.y, p.radius] {
                hasher.update(canonicalize_f32(v).to_le_bytes());
            }
            hasher.update((frame.rewards.len() as u32).to_le_bytes());
            for r in &frame.rewards {
                for v in [r.pos.x, r.pos.y, r.radius] {
                    hasher.update(canonicalize_f32(v).to_le_bytes());
                }
                hasher.update([r.collected as u8]);
            }
            hasher.update((frame.hazards.len() as u32).to_le_bytes());
            for h in &frame.hazards {
                for v in [h.pos.x, h.pos.y, h.radius] {
                    hasher.update(canonicalize_f32(v).to_le_bytes());
                }
                hasher.update([h.chasing as u8]);
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// `-0.0` hashes as `+0.0`, every NaN as the quiet NaN pattern
fn canonicalize_f32(value: f32) -> u32 {
    const QUIET_NAN_BITS: u32 = 0x7fc0_0000;
    if value.is_nan() {
        QUIET_NAN_BITS
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

/// Collects one frame per active tick
#[derive(Debug, Clone, Default)]
pub struct ReplayRecorder {
    frames: Vec<ReplayFrame>,
    recording: bool,
}

impl ReplayRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh recording, dropping anything captured before
    pub fn begin(&mut self) {
        self.frames.clear();
        self.recording = true;
    }

    /// Suspend capture without discarding frames (pause)
    pub fn suspend(&mut self) {
        self.recording = false;
    }

    pub fn resume(&mut self) {
        self.recording = true;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Capture the post-tick state; ignored unless recording
    pub fn record(&mut self, state: &SimulationState) {
        if self.recording {
            self.frames.push(ReplayFrame::capture(state));
        }
    }

    /// Stop recording and hand over the finished replay
    pub fn finish(&mut self) -> Replay {
        self.recording = false;
        Replay {
            frames: std::mem::take(&mut self.frames),
        }
    }
}

/// Plays a replay back one frame per tick
#[derive(Debug, Clone)]
pub struct ReplayPlayer {
    replay: Replay,
    next: usize,
    cancelled: bool,
}

impl ReplayPlayer {
    pub fn new(replay: Replay) -> Self {
        Self {
            replay,
            next: 0,
            cancelled: false,
        }
    }

    /// Restore the next frame into `state`; returns its index, or `None`
    /// once the sequence is exhausted or playback was cancelled
    pub fn step(&mut self, state: &mut SimulationState) -> Option<usize> {
        if self.cancelled {
            return None;
        }
        let index = self.next;
        let frame = self.replay.frame(index)?;
        frame.restore(state);
        self.next += 1;
        Some(index)
    }

    /// Index of the frame currently shown, if any
    pub fn position(&self) -> Option<usize> {
        self.next.checked_sub(1)
    }

    pub fn is_finished(&self) -> bool {
        self.cancelled || self.next >= self.replay.len()
    }

    /// Stop early; the last restored frame stays in place
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn into_replay(self) -> Replay {
        self.replay
    }
}
