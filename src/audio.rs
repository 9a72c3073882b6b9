//! Audio cues using the Web Audio API
//!
//! Procedurally generated tones, no sample files. Cue selection is plain
//! data so it can be tested natively; playback only exists on wasm32.

use crate::sim::GameEvent;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One scheduled oscillator burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    /// Hz
    pub freq: f32,
    /// Offset from the cue start (seconds)
    pub start: f32,
    pub duration: f32,
    pub gain: f32,
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Reward picked up; pitch climbs with the combo
    Pickup { combo: u32 },
    /// Extra flourish for combos 3 to 5
    ComboJingle { combo: u32 },
    /// Player touched a hazard
    HazardHit,
    /// Rising arpeggio
    Win,
    /// Falling arpeggio (timer ran out)
    Lose,
}

impl SoundEffect {
    pub fn tones(&self) -> Vec<Tone> {
        match *self {
            SoundEffect::Pickup { combo } => vec![Tone {
                waveform: Waveform::Triangle,
                freq: 800.0 + combo as f32 * 20.0,
                start: 0.0,
                duration: 0.15,
                gain: 0.1,
            }],
            SoundEffect::ComboJingle { combo } => vec![Tone {
                waveform: Waveform::Square,
                freq: 600.0 + combo as f32 * 50.0,
                start: 0.0,
                duration: 0.3,
                gain: 0.15,
            }],
            SoundEffect::HazardHit => vec![Tone {
                waveform: Waveform::Sawtooth,
                freq: 200.0,
                start: 0.0,
                duration: 0.15,
                gain: 0.15,
            }],
            SoundEffect::Win => arpeggio(8, 300.0, 40.0, 0.45),
            SoundEffect::Lose => arpeggio(10, 700.0, -40.0, 0.5),
        }
    }
}

fn arpeggio(notes: u32, base: f32, step: f32, spacing: f32) -> Vec<Tone> {
    (0..notes)
        .map(|i| Tone {
            waveform: Waveform::Sine,
            freq: base + i as f32 * step,
            start: i as f32 * spacing,
            duration: 0.4,
            gain: 0.12,
        })
        .collect()
}

/// Cues triggered by one gameplay event
pub fn cues_for(event: &GameEvent) -> Vec<SoundEffect> {
    match *event {
        GameEvent::RewardCollected { combo, .. } => {
            let mut cues = vec![SoundEffect::Pickup { combo }];
            if (3..=5).contains(&combo) {
                cues.push(SoundEffect::ComboJingle { combo });
            }
            cues
        }
        GameEvent::HazardContact { .. } => vec![SoundEffect::HazardHit],
        GameEvent::AllCollected => vec![SoundEffect::Win],
        GameEvent::TimeExpired => vec![SoundEffect::Lose],
        GameEvent::ChaseStarted { .. } | GameEvent::ChaseEnded { .. } => Vec::new(),
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, OscillatorType};

    use super::{SoundEffect, Tone, Waveform};

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                sfx_volume: 1.0,
                muted: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn set_master_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_sfx_volume(&mut self, vol: f32) {
            self.sfx_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn effective_volume(&self) -> f32 {
            if self.muted {
                0.0
            } else {
                self.master_volume * self.sfx_volume
            }
        }

        pub fn play(&self, effect: SoundEffect) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let now = ctx.current_time();
            for tone in effect.tones() {
                play_tone(ctx, &tone, now, vol);
            }
        }
    }

    fn play_tone(ctx: &AudioContext, tone: &Tone, now: f64, vol: f32) -> Option<()> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(match tone.waveform {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Square => OscillatorType::Square,
            Waveform::Triangle => OscillatorType::Triangle,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
        });
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        let t = now + tone.start as f64;
        osc.frequency().set_value_at_time(tone.freq, t).ok()?;
        gain.gain().set_value_at_time(tone.gain * vol, t).ok()?;
        osc.start_with_when(t).ok()?;
        osc.stop_with_when(t + tone.duration as f64).ok()?;
        Some(())
    }
}
