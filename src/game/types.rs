use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
  pub x: i32,
  pub y: i32,
}

impl Cell {
  pub const fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }

  pub fn offset(self, direction: Direction) -> Self {
    Self {
      x: self.x + direction.x,
      y: self.y + direction.y,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direction {
  pub x: i32,
  pub y: i32,
}

impl Direction {
  pub const UP: Direction = Direction { x: 0, y: -1 };
  pub const DOWN: Direction = Direction { x: 0, y: 1 };
  pub const LEFT: Direction = Direction { x: -1, y: 0 };
  pub const RIGHT: Direction = Direction { x: 1, y: 0 };

  /// Accepts only unit vectors along one axis.
  pub fn from_components(x: i64, y: i64) -> Option<Self> {
    if !matches!((x, y), (0, 1) | (0, -1) | (1, 0) | (-1, 0)) {
      return None;
    }
    Some(Self {
      x: x as i32,
      y: y as i32,
    })
  }

  pub fn reversed(self) -> Self {
    Self {
      x: -self.x,
      y: -self.y,
    }
  }
}

impl Default for Direction {
  fn default() -> Self {
    Self::RIGHT
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailMark {
  pub cell: Cell,
  pub left_at: f64,
  pub expires_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totem {
  pub cell: Cell,
  pub expires_at: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
  pub snake: Vec<Cell>,
  pub direction: Direction,
  pub queued_direction: Direction,
  pub food: Cell,
  pub food_emoji: String,
  pub score: u32,
  pub running: bool,
  pub paused: bool,
  pub countdown: bool,
  pub trail: Vec<TrailMark>,
  pub overheat_until: f64,
  pub last_trail_penalty_at: Option<f64>,
  pub gate_charge: u8,
  pub gate_expires_at: f64,
  pub storm_active_until: f64,
  pub next_storm_at: f64,
  pub totem: Option<Totem>,
  pub next_totem_at: f64,
  pub new_best_achieved: bool,
  pub start_time: f64,
  pub min_step_ms: f64,
}

impl GameState {
  pub fn head(&self) -> Option<Cell> {
    self.snake.first().copied()
  }

  pub fn occupies(&self, cell: Cell) -> bool {
    self.snake.contains(&cell)
  }

  pub fn storm_active(&self, now: f64) -> bool {
    now < self.storm_active_until
  }

  pub fn overheated(&self, now: f64) -> bool {
    now < self.overheat_until
  }

  pub fn gate_ready(&self, now: f64) -> bool {
    self.gate_charge > 0 && now < self.gate_expires_at
  }

  /// Trail cells that still burn at `now`.
  pub fn hot_trail(&self, now: f64) -> impl Iterator<Item = Cell> + '_ {
    self
      .trail
      .iter()
      .filter(move |mark| mark.expires_at > now)
      .map(|mark| mark.cell)
  }

  /// Clears every time-windowed modifier so play restarts without an active hazard.
  pub fn clear_hazards(&mut self) {
    self.trail.clear();
    self.overheat_until = 0.0;
    self.last_trail_penalty_at = None;
    self.gate_charge = 0;
    self.gate_expires_at = 0.0;
    self.storm_active_until = 0.0;
    self.next_storm_at = 0.0;
    self.totem = None;
    self.next_totem_at = 0.0;
  }
}

/// The persisted part of a game; timers and trails are never saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGame {
  pub version: u32,
  pub snake: Vec<Cell>,
  pub direction: Direction,
  pub queued_direction: Direction,
  pub food: Cell,
  pub score: u32,
  pub food_emoji: String,
}

impl SavedGame {
  pub fn from_state(state: &GameState) -> Self {
    Self {
      version: super::sanitize::SNAPSHOT_VERSION,
      snake: state.snake.clone(),
      direction: state.direction,
      queued_direction: state.queued_direction,
      food: state.food,
      score: state.score,
      food_emoji: state.food_emoji.clone(),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardView {
  pub storm: bool,
  pub overheat: bool,
  pub gate_charge: u8,
  pub totem: Option<Cell>,
  pub trail: Vec<Cell>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
  pub snake: Vec<Cell>,
  pub colors: Vec<&'static str>,
  /// Head colour as `"r, g, b"` for translucent glows.
  pub glow: String,
  pub direction: Direction,
  pub food: Cell,
  pub food_emoji: String,
  pub score: u32,
  pub best_score: u32,
  pub running: bool,
  pub paused: bool,
  pub countdown: Option<&'static str>,
  pub elapsed: String,
  pub step_ms: f64,
  pub hazards: HazardView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
  pub score: u32,
  pub best_score: u32,
  pub new_best: bool,
  pub elapsed_ms: f64,
  pub elapsed: String,
  pub intensity: f64,
}
