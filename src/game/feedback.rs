//! Audio and haptic cues for game events. Disabled outputs simply yield nothing.

use super::events::GameEvent;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tone {
    pub frequency: f64,
    pub duration_ms: u32,
    pub waveform: Waveform,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    pub tone: Option<Tone>,
    pub vibrate: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedbackPrefs {
    pub sound: bool,
    pub haptics: bool,
}

fn tone(frequency: f64, duration_ms: u32, waveform: Waveform, volume: f64) -> Tone {
    Tone {
        frequency,
        duration_ms,
        waveform,
        volume,
    }
}

fn raw_cue(event: &GameEvent) -> Option<(Tone, Vec<u32>)> {
    let cue = match event {
        GameEvent::FoodEaten { .. } => (tone(540.0, 90, Waveform::Triangle, 0.05), vec![18]),
        GameEvent::GameOver { .. } => (tone(160.0, 220, Waveform::Sawtooth, 0.08), vec![50]),
        GameEvent::NewBest { .. } => (tone(880.0, 160, Waveform::Sine, 0.05), vec![12, 40, 12]),
        GameEvent::TotemCollected { .. } => (tone(720.0, 120, Waveform::Sine, 0.05), vec![24]),
        GameEvent::GateUsed { .. } => (tone(660.0, 140, Waveform::Square, 0.04), vec![20, 30, 20]),
        GameEvent::Overheated { .. } => (tone(220.0, 180, Waveform::Sawtooth, 0.05), vec![35]),
        GameEvent::StormStarted { .. } => (tone(120.0, 400, Waveform::Sine, 0.04), vec![]),
        _ => return None,
    };
    Some(cue)
}

pub fn cue_for(event: &GameEvent, prefs: FeedbackPrefs) -> Option<Cue> {
    let (tone, pattern) = raw_cue(event)?;
    let cue = Cue {
        tone: prefs.sound.then_some(tone),
        vibrate: (prefs.haptics && !pattern.is_empty()).then_some(pattern),
    };
    if cue.tone.is_none() && cue.vibrate.is_none() {
        return None;
    }
    Some(cue)
}
