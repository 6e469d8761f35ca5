use super::types::Cell;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Collision {
  Wall,
  SelfBody,
}

/// Everything a renderer or the audio/haptics layer may want to react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
  CountdownTick { label: &'static str },
  CountdownFinished,
  FoodEaten { cell: Cell, score: u32 },
  NewBest { score: u32 },
  TotemSpawned { cell: Cell },
  TotemExpired,
  TotemCollected { cell: Cell },
  GateUsed { from: Cell, to: Cell },
  GateExpired,
  Overheated { until: f64 },
  StormStarted { until: f64 },
  StormEnded,
  GameOver { cause: Collision, score: u32 },
}
