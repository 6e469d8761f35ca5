//! Time-windowed modifiers layered over the base movement rules.
//!
//! Storm and totem cycle through the same shape: waiting for `next_*_at`, then
//! active until an expiry, then waiting again with a freshly rolled trigger
//! time. Gate charges, overheat windows and the trail simply run out.

use super::config::GameConfig;
use super::constants::{
    OVERHEAT_STEP_FACTOR, STORM_DURATION_MS, STORM_STEP_FACTOR, STORM_WINDOW_MS,
    TOTEM_FIRST_WINDOW_MS, TOTEM_LIFETIME_MS, TOTEM_WINDOW_MS,
};
use super::events::GameEvent;
use super::geometry::{place_clear, random_between};
use super::types::{Cell, GameState, Totem};
use rand::Rng;

pub fn roll_window<R: Rng + ?Sized>(rng: &mut R, window: (u32, u32)) -> f64 {
    random_between(rng, window.0, window.1) as f64
}

/// Arms the first storm and totem triggers of a run.
pub fn schedule_initial<R: Rng + ?Sized>(
    state: &mut GameState,
    config: &GameConfig,
    now: f64,
    rng: &mut R,
) {
    if !config.hazards {
        return;
    }
    state.next_storm_at = now + roll_window(rng, STORM_WINDOW_MS);
    state.next_totem_at = now + roll_window(rng, TOTEM_FIRST_WINDOW_MS);
}

/// Runs once per unpaused frame, before any movement step of that frame.
pub fn update_hazards<R: Rng + ?Sized>(
    state: &mut GameState,
    config: &GameConfig,
    now: f64,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) {
    if !config.hazards {
        return;
    }
    update_storm(state, now, rng, events);
    update_totem(state, config, now, rng, events);

    if state.gate_charge > 0 && now >= state.gate_expires_at {
        state.gate_charge = 0;
        state.gate_expires_at = 0.0;
        events.push(GameEvent::GateExpired);
    }
    if state.overheat_until > 0.0 && now >= state.overheat_until {
        state.overheat_until = 0.0;
    }
    decay_trail(state, now);
}

fn update_storm<R: Rng + ?Sized>(
    state: &mut GameState,
    now: f64,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) {
    if state.storm_active_until > 0.0 {
        if now >= state.storm_active_until {
            state.storm_active_until = 0.0;
            state.next_storm_at = now + roll_window(rng, STORM_WINDOW_MS);
            events.push(GameEvent::StormEnded);
        }
        return;
    }
    if state.next_storm_at > 0.0 && now >= state.next_storm_at {
        state.storm_active_until = now + STORM_DURATION_MS;
        state.next_storm_at = state.storm_active_until + roll_window(rng, STORM_WINDOW_MS);
        events.push(GameEvent::StormStarted {
            until: state.storm_active_until,
        });
    }
}

fn update_totem<R: Rng + ?Sized>(
    state: &mut GameState,
    config: &GameConfig,
    now: f64,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) {
    if let Some(totem) = state.totem {
        if now >= totem.expires_at {
            state.totem = None;
            state.next_totem_at = now + roll_window(rng, TOTEM_WINDOW_MS);
            events.push(GameEvent::TotemExpired);
        }
        return;
    }
    if state.next_totem_at > 0.0 && now >= state.next_totem_at {
        let mut blocked: Vec<Cell> = state.snake.clone();
        blocked.push(state.food);
        blocked.extend(state.hot_trail(now));
        let cell = place_clear(rng, config, &blocked);
        let expires_at = now + TOTEM_LIFETIME_MS;
        state.totem = Some(Totem { cell, expires_at });
        state.next_totem_at = expires_at + roll_window(rng, TOTEM_WINDOW_MS);
        events.push(GameEvent::TotemSpawned { cell });
    }
}

pub fn decay_trail(state: &mut GameState, now: f64) {
    state.trail.retain(|mark| mark.expires_at > now);
}

/// Product of every active pace modifier.
pub fn step_factor(state: &GameState, config: &GameConfig, now: f64) -> f64 {
    if !config.hazards {
        return 1.0;
    }
    let mut factor = 1.0;
    if state.storm_active(now) {
        factor *= STORM_STEP_FACTOR;
    }
    if state.overheated(now) {
        factor *= OVERHEAT_STEP_FACTOR;
    }
    factor
}

pub fn step_duration(state: &GameState, config: &GameConfig, now: f64) -> f64 {
    config.base_step_duration(state.score) * step_factor(state, config, now)
}
