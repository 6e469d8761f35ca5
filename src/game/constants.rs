use super::types::Cell;

pub const VERSION: &str = "0.8";
pub const FOOD_REWARD: u32 = 10;
pub const MAX_SCORE: u32 = 1_000_000;
pub const FALLBACK_CELL: Cell = Cell::new(5, 5);
pub const FRAME_MS: u64 = 16;
pub const SWIPE_THRESHOLD: f64 = 24.0;
pub const COUNTDOWN_STEPS: [&str; 4] = ["3", "2", "1", "GO"];
pub const TOAST_MS: f64 = 1800.0;
pub const MAX_PLACEMENT_ATTEMPTS: usize = 64;

pub const STORM_STEP_FACTOR: f64 = 1.35;
pub const STORM_DURATION_MS: f64 = 6000.0;
pub const STORM_WINDOW_MS: (u32, u32) = (20_000, 35_000);

pub const OVERHEAT_STEP_FACTOR: f64 = 0.7;
pub const OVERHEAT_DURATION_MS: f64 = 2500.0;
pub const TRAIL_PENALTY_COOLDOWN_MS: f64 = 1500.0;
pub const TRAIL_LIFETIME_MS: f64 = 2400.0;
pub const TRAIL_MAX_LEN: usize = 64;

pub const TOTEM_LIFETIME_MS: f64 = 7000.0;
pub const TOTEM_FIRST_WINDOW_MS: (u32, u32) = (12_000, 22_000);
pub const TOTEM_WINDOW_MS: (u32, u32) = (15_000, 25_000);
pub const GATE_CHARGE_MS: f64 = 8000.0;

pub const FOOD_EMOJIS: [&str; 10] = [
  "\u{1F352}",
  "\u{1F347}",
  "\u{1F349}",
  "\u{1F353}",
  "\u{1F34D}",
  "\u{1F34C}",
  "\u{1F351}",
  "\u{1F95D}",
  "\u{1F36A}",
  "\u{1F9C1}",
];

pub const RAINBOW: [&str; 8] = [
  "#ff4d4d",
  "#ff944d",
  "#ffd24d",
  "#a3ff4d",
  "#4dffcf",
  "#4d9dff",
  "#7b4dff",
  "#c44dff",
];

pub const NEON_BODY: &str = "#3de7ff";
pub const CLASSIC_BODY: &str = "#4caf50";
