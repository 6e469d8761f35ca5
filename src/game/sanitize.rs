//! Turns whatever a save slot held into a state that can start immediately.
//!
//! Snapshots carry a schema `version`. Payloads without one are version 1 and
//! are migrated before the field checks run. Nothing here fails: every bad
//! field degrades to its default.

use super::config::GameConfig;
use super::constants::{FALLBACK_CELL, FOOD_EMOJIS, MAX_SCORE};
use super::geometry::place_clear;
use super::types::{Cell, Direction, GameState};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Value};

pub const SNAPSHOT_VERSION: u32 = 2;

pub fn random_emoji<R: Rng + ?Sized>(rng: &mut R) -> String {
    FOOD_EMOJIS
        .choose(rng)
        .copied()
        .unwrap_or(FOOD_EMOJIS[0])
        .to_string()
}

pub fn default_state<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> GameState {
    let snake = config.start_snake.clone();
    let food = place_clear(rng, config, &snake);
    GameState {
        snake,
        direction: config.start_direction,
        queued_direction: config.start_direction,
        food,
        food_emoji: random_emoji(rng),
        score: 0,
        running: false,
        paused: false,
        countdown: false,
        trail: Vec::new(),
        overheat_until: 0.0,
        last_trail_penalty_at: None,
        gate_charge: 0,
        gate_expires_at: 0.0,
        storm_active_until: 0.0,
        next_storm_at: 0.0,
        totem: None,
        next_totem_at: 0.0,
        new_best_achieved: false,
        start_time: 0.0,
        min_step_ms: config.base_step_ms,
    }
}

/// Brings an older snapshot layout up to [`SNAPSHOT_VERSION`].
pub fn migrate(snapshot: Value) -> Map<String, Value> {
    let mut fields = match snapshot {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    let version = fields.get("version").and_then(Value::as_u64).unwrap_or(1);
    if version < 2 {
        if !fields.contains_key("direction") {
            if let Some(dir) = fields.remove("dir") {
                fields.insert("direction".to_string(), dir);
            }
        }
        if !fields.contains_key("queuedDirection") {
            if let Some(next) = fields.remove("nextDir") {
                fields.insert("queuedDirection".to_string(), next);
            }
        }
        for key in ["direction", "queuedDirection"] {
            if let Some(Value::Object(vector)) = fields.get_mut(key) {
                rename_field(vector, "dx", "x");
                rename_field(vector, "dy", "y");
            }
        }
    }
    fields.insert("version".to_string(), Value::from(SNAPSHOT_VERSION));
    fields
}

fn rename_field(fields: &mut Map<String, Value>, from: &str, to: &str) {
    if fields.contains_key(to) {
        return;
    }
    if let Some(value) = fields.remove(from) {
        fields.insert(to.to_string(), value);
    }
}

/// Loose numeric read: numbers and numeric strings both count.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

/// Strict cell read: coordinates must be JSON integers.
fn parse_cell(value: &Value) -> Option<Cell> {
    let x = value.get("x").and_then(Value::as_f64).and_then(integral)?;
    let y = value.get("y").and_then(Value::as_f64).and_then(integral)?;
    Some(Cell {
        x: i32::try_from(x).ok()?,
        y: i32::try_from(y).ok()?,
    })
}

fn parse_direction(value: &Value) -> Option<Direction> {
    let x = value.get("x").and_then(coerce_number).unwrap_or(0.0);
    let y = value.get("y").and_then(coerce_number).unwrap_or(0.0);
    Direction::from_components(integral(x)?, integral(y)?)
}

fn parse_snake(value: Option<&Value>, config: &GameConfig) -> Option<Vec<Cell>> {
    let cells = value?.as_array()?;
    if cells.is_empty() {
        return None;
    }
    cells
        .iter()
        .map(|cell| parse_cell(cell).filter(|cell| config.in_grid(*cell)))
        .collect()
}

pub fn sanitize_for_start<R: Rng + ?Sized>(
    snapshot: &Value,
    config: &GameConfig,
    rng: &mut R,
) -> GameState {
    let fields = migrate(snapshot.clone());
    let mut state = default_state(config, rng);

    state.snake = parse_snake(fields.get("snake"), config).unwrap_or_else(|| vec![FALLBACK_CELL]);

    state.direction = fields
        .get("direction")
        .and_then(parse_direction)
        .unwrap_or(Direction::RIGHT);
    state.queued_direction = fields
        .get("queuedDirection")
        .and_then(parse_direction)
        .filter(|queued| *queued != state.direction.reversed())
        .unwrap_or(state.direction);

    let saved_food = fields
        .get("food")
        .and_then(parse_cell)
        .filter(|food| config.in_margin(*food))
        .filter(|food| !state.occupies(*food));
    state.food = match saved_food {
        Some(food) => food,
        None => place_clear(rng, config, &state.snake),
    };

    if let Some(emoji) = fields
        .get("foodEmoji")
        .and_then(Value::as_str)
        .filter(|emoji| !emoji.is_empty())
    {
        state.food_emoji = emoji.to_string();
    }

    state.score = fields
        .get("score")
        .and_then(Value::as_f64)
        .filter(|score| score.is_finite() && *score >= 0.0)
        .map(|score| score.floor().min(MAX_SCORE as f64) as u32)
        .unwrap_or(0);

    state.clear_hazards();
    state.running = true;
    state.paused = false;
    state.countdown = false;
    state
}
