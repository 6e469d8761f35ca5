//! Tuning for the game variants. The variants differ only in numbers and
//! feature switches, so one [`GameConfig`] drives every code path.

use super::types::{Cell, Direction};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Classic,
    Rainbow,
    #[default]
    Neon,
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "classic" | "basic" => Ok(Variant::Classic),
            "rainbow" => Ok(Variant::Rainbow),
            "neon" | "neon-dust" => Ok(Variant::Neon),
            other => Err(format!("unknown game variant `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub variant: Variant,
    pub grid_size: i32,
    pub food_margin: i32,
    pub base_step_ms: f64,
    pub min_step_ms: f64,
    pub ramp_per_point: f64,
    pub countdown_step_ms: f64,
    pub start_snake: Vec<Cell>,
    pub start_direction: Direction,
    pub save_key: &'static str,
    pub rainbow_body: bool,
    pub hazards: bool,
}

impl GameConfig {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Classic => Self {
                variant,
                grid_size: 16,
                food_margin: 1,
                base_step_ms: 220.0,
                min_step_ms: 120.0,
                ramp_per_point: 2.0,
                countdown_step_ms: 250.0,
                start_snake: vec![Cell::new(7, 8), Cell::new(6, 8), Cell::new(5, 8)],
                start_direction: Direction::RIGHT,
                save_key: "snake-save",
                rainbow_body: false,
                hazards: false,
            },
            Variant::Rainbow => Self {
                variant,
                grid_size: 18,
                food_margin: 2,
                base_step_ms: 285.0,
                min_step_ms: 135.0,
                ramp_per_point: 2.4,
                countdown_step_ms: 250.0,
                start_snake: vec![Cell::new(8, 9), Cell::new(7, 9), Cell::new(6, 9)],
                start_direction: Direction::RIGHT,
                save_key: "rainbow-snake-save",
                rainbow_body: true,
                hazards: false,
            },
            Variant::Neon => Self {
                variant,
                grid_size: 20,
                food_margin: 1,
                base_step_ms: 240.0,
                min_step_ms: 110.0,
                ramp_per_point: 2.8,
                countdown_step_ms: 400.0,
                start_snake: vec![Cell::new(9, 10), Cell::new(8, 10), Cell::new(7, 10)],
                start_direction: Direction::RIGHT,
                save_key: "neon-snake-save",
                rainbow_body: false,
                hazards: true,
            },
        }
    }

    pub fn in_grid(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.grid_size && cell.y >= 0 && cell.y < self.grid_size
    }

    /// Food may only appear inside the margin band.
    pub fn in_margin(&self, cell: Cell) -> bool {
        let min = self.food_margin;
        let max = self.grid_size - self.food_margin;
        cell.x >= min && cell.x < max && cell.y >= min && cell.y < max
    }

    /// Score-driven pace before hazard modifiers.
    pub fn base_step_duration(&self, score: u32) -> f64 {
        let points = score as f64 / 10.0;
        (self.base_step_ms - points * self.ramp_per_point).max(self.min_step_ms)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::for_variant(Variant::default())
    }
}
