//! One grid tick.

use super::config::GameConfig;
use super::constants::{
    FOOD_REWARD, GATE_CHARGE_MS, MAX_SCORE, OVERHEAT_DURATION_MS, TRAIL_LIFETIME_MS,
    TRAIL_MAX_LEN, TRAIL_PENALTY_COOLDOWN_MS, TOTEM_WINDOW_MS,
};
use super::events::{Collision, GameEvent};
use super::geometry::{place_clear, positions_equal, wrap};
use super::hazards::roll_window;
use super::sanitize::random_emoji;
use super::types::{Cell, GameState, TrailMark};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Ate,
    GameOver(Collision),
}

pub fn step<R: Rng + ?Sized>(
    state: &mut GameState,
    config: &GameConfig,
    now: f64,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> StepOutcome {
    state.direction = state.queued_direction;
    let Some(head) = state.head() else {
        return game_over(state, Collision::SelfBody, events);
    };
    let mut next = head.offset(state.direction);

    if !config.in_grid(next) {
        if !state.gate_ready(now) {
            return game_over(state, Collision::Wall, events);
        }
        let wrapped = wrap(next, config.grid_size);
        state.gate_charge = 0;
        state.gate_expires_at = 0.0;
        events.push(GameEvent::GateUsed {
            from: head,
            to: wrapped,
        });
        next = wrapped;
    }

    if state
        .snake
        .iter()
        .skip(1)
        .any(|segment| positions_equal(*segment, next))
    {
        return game_over(state, Collision::SelfBody, events);
    }

    if config.hazards {
        touch_trail(state, next, now, events);
        state.trail.push(TrailMark {
            cell: head,
            left_at: now,
            expires_at: now + TRAIL_LIFETIME_MS,
        });
        if state.trail.len() > TRAIL_MAX_LEN {
            let excess = state.trail.len() - TRAIL_MAX_LEN;
            state.trail.drain(0..excess);
        }
    }

    state.snake.insert(0, next);

    if let Some(totem) = state.totem {
        if positions_equal(totem.cell, next) {
            state.totem = None;
            state.gate_charge = 1;
            state.gate_expires_at = now + GATE_CHARGE_MS;
            state.next_totem_at = now + roll_window(rng, TOTEM_WINDOW_MS);
            events.push(GameEvent::TotemCollected { cell: next });
        }
    }

    if positions_equal(next, state.food) {
        state.score = (state.score + FOOD_REWARD).min(MAX_SCORE);
        events.push(GameEvent::FoodEaten {
            cell: next,
            score: state.score,
        });
        let mut blocked: Vec<Cell> = state.snake.clone();
        blocked.extend(state.hot_trail(now));
        if let Some(totem) = state.totem {
            blocked.push(totem.cell);
        }
        state.food = place_clear(rng, config, &blocked);
        state.food_emoji = random_emoji(rng);
        return StepOutcome::Ate;
    }

    state.snake.pop();
    StepOutcome::Moved
}

/// Stepping onto a hot trail cell overheats the snake, at most once per cooldown.
fn touch_trail(state: &mut GameState, next: Cell, now: f64, events: &mut Vec<GameEvent>) {
    let burning = state.hot_trail(now).any(|cell| positions_equal(cell, next));
    if !burning {
        return;
    }
    let cooled = state
        .last_trail_penalty_at
        .map_or(true, |at| now - at >= TRAIL_PENALTY_COOLDOWN_MS);
    if !cooled {
        return;
    }
    state.overheat_until = now + OVERHEAT_DURATION_MS;
    state.last_trail_penalty_at = Some(now);
    events.push(GameEvent::Overheated {
        until: state.overheat_until,
    });
}

fn game_over(state: &mut GameState, cause: Collision, events: &mut Vec<GameEvent>) -> StepOutcome {
    state.running = false;
    events.push(GameEvent::GameOver {
        cause,
        score: state.score,
    });
    StepOutcome::GameOver(cause)
}
