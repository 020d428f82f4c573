//! Hit cues using the Web Audio API
//!
//! Each cue is a single oscillator sweep; no audio files are loaded.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::feedback::Cue;

const VOLUME: f32 = 0.8;

/// Plays hit cues; silent when no AudioContext could be created
pub struct AudioManager {
    ctx: Option<AudioContext>,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            muted: false,
        }
    }

    /// Resume the context (browsers require a user gesture first)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Flip mute; returns true when now muted
    pub fn toggle_muted(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    pub fn play(&self, cue: Cue) {
        if self.muted {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        // (type, start Hz, end Hz, peak gain, duration s)
        let (osc_type, from, to, peak, duration) = match cue {
            Cue::Catch => (OscillatorType::Sine, 600.0, 900.0, 0.25, 0.1),
            Cue::Perfect => (OscillatorType::Sine, 800.0, 1200.0, 0.3, 0.15),
            Cue::Malus => (OscillatorType::Sawtooth, 300.0, 100.0, 0.2, 0.2),
            Cue::Miss => (OscillatorType::Sine, 200.0, 100.0, 0.15, 0.15),
        };
        self.sweep(ctx, osc_type, from, to, peak * VOLUME, duration);
    }

    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// One oscillator gliding `from` -> `to` with a decaying envelope
    fn sweep(&self, ctx: &AudioContext, osc_type: OscillatorType, from: f32, to: f32, peak: f32, duration: f64) {
        let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(peak, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + duration)
            .ok();
        osc.frequency().set_value_at_time(from, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(to, t + duration)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + duration + 0.02).ok();
    }
}
