use super::config::GameConfig;
use super::constants::{COUNTDOWN_STEPS, TOAST_MS};
use super::display::{format_time, hex_to_rgb, segment_color};
use super::events::GameEvent;
use super::feedback::FeedbackPrefs;
use super::geometry::is_opposite;
use super::hazards::{schedule_initial, step_duration, update_hazards};
use super::sanitize::{default_state, sanitize_for_start};
use super::scheduler::{Scheduler, TaskId};
use super::step::{step, StepOutcome};
use super::types::{Direction, GameState, GameSummary, GameView, HazardView, SavedGame};
use crate::storage::ProfileStorage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionTask {
  CountdownTick,
  DismissToast(u64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
  pub id: u64,
  pub text: &'static str,
}

#[derive(Debug, Default)]
pub struct FrameReport {
  pub steps: u32,
  pub events: Vec<GameEvent>,
  pub toasts_changed: bool,
}

impl FrameReport {
  pub fn is_quiet(&self) -> bool {
    self.steps == 0 && self.events.is_empty() && !self.toasts_changed
  }
}

/// One player's game: state, frame clock, countdown and toasts. Every timestamp
/// passed in must come from the same monotonic clock.
pub struct GameSession {
  config: GameConfig,
  storage: ProfileStorage,
  rng: StdRng,
  state: Option<GameState>,
  last_time: f64,
  accumulator: f64,
  countdown_index: Option<usize>,
  countdown_task: Option<TaskId>,
  scheduler: Scheduler<SessionTask>,
  toasts: Vec<Toast>,
  next_toast_id: u64,
  best_score: u32,
  summary: Option<GameSummary>,
}

impl GameSession {
  pub fn new(config: GameConfig, storage: ProfileStorage) -> Self {
    Self::with_rng(config, storage, StdRng::from_entropy())
  }

  pub fn with_rng(config: GameConfig, storage: ProfileStorage, rng: StdRng) -> Self {
    let best_score = storage.best_score();
    Self {
      config,
      storage,
      rng,
      state: None,
      last_time: 0.0,
      accumulator: 0.0,
      countdown_index: None,
      countdown_task: None,
      scheduler: Scheduler::new(),
      toasts: Vec::new(),
      next_toast_id: 1,
      best_score,
      summary: None,
    }
  }

  pub fn config(&self) -> &GameConfig {
    &self.config
  }

  pub fn storage(&self) -> &ProfileStorage {
    &self.storage
  }

  pub fn state(&self) -> Option<&GameState> {
    self.state.as_ref()
  }

  pub fn summary(&self) -> Option<&GameSummary> {
    self.summary.as_ref()
  }

  pub fn best_score(&self) -> u32 {
    self.best_score
  }

  pub fn toasts(&self) -> &[Toast] {
    &self.toasts
  }

  pub fn is_running(&self) -> bool {
    self.state.as_ref().map_or(false, |state| state.running)
  }

  pub fn can_resume(&self) -> bool {
    self.storage.has_saved_game()
  }

  pub fn feedback_prefs(&self) -> FeedbackPrefs {
    FeedbackPrefs {
      sound: self.storage.sound_enabled(),
      haptics: self.storage.haptics_enabled(),
    }
  }

  pub fn countdown_label(&self) -> Option<&'static str> {
    self.countdown_index.and_then(|index| COUNTDOWN_STEPS.get(index).copied())
  }

  /// Fresh run; any saved game is discarded.
  pub fn start_new(&mut self, now: f64) {
    self.storage.clear_game();
    let mut state = default_state(&self.config, &mut self.rng);
    state.running = true;
    self.begin(state, now);
  }

  /// Starts from the saved snapshot. Returns false when there is nothing to resume.
  pub fn resume(&mut self, now: f64) -> bool {
    let Some(saved) = self.storage.load_game() else { return false };
    self.start_from_snapshot(&saved, now);
    true
  }

  pub fn start_from_snapshot(&mut self, snapshot: &Value, now: f64) {
    let state = sanitize_for_start(snapshot, &self.config, &mut self.rng);
    self.begin(state, now);
  }

  fn begin(&mut self, mut state: GameState, now: f64) {
    self.cancel_countdown();
    state.start_time = now;
    state.new_best_achieved = false;
    state.min_step_ms = self.config.base_step_duration(state.score);
    tracing::debug!(profile = self.storage.profile(), score = state.score, "game started");
    self.state = Some(state);
    self.last_time = now;
    self.accumulator = 0.0;
    self.summary = None;
    self.start_countdown(now);
  }

  fn start_countdown(&mut self, now: f64) {
    let Some(state) = self.state.as_mut() else { return };
    state.countdown = true;
    self.countdown_index = Some(0);
    self.countdown_task = Some(
      self
        .scheduler
        .schedule(now + self.config.countdown_step_ms, SessionTask::CountdownTick),
    );
  }

  fn cancel_countdown(&mut self) {
    if let Some(task) = self.countdown_task.take() {
      self.scheduler.cancel(task);
    }
    self.countdown_index = None;
  }

  /// Returns true once the last label has been shown and play begins.
  fn tick_countdown(&mut self, now: f64, report: &mut FrameReport) -> bool {
    self.countdown_task = None;
    let Some(index) = self.countdown_index else { return false };
    let next = index + 1;
    if next >= COUNTDOWN_STEPS.len() {
      self.countdown_index = None;
      // Run clock and hazard windows start with play, not with the countdown.
      if let Some(state) = self.state.as_mut() {
        state.countdown = false;
        state.start_time = now;
        schedule_initial(state, &self.config, now, &mut self.rng);
      }
      self.last_time = now;
      self.accumulator = 0.0;
      report.events.push(GameEvent::CountdownFinished);
      return true;
    }
    self.countdown_index = Some(next);
    report.events.push(GameEvent::CountdownTick {
      label: COUNTDOWN_STEPS[next],
    });
    self.countdown_task = Some(
      self
        .scheduler
        .schedule(now + self.config.countdown_step_ms, SessionTask::CountdownTick),
    );
    false
  }

  /// Queues a turn for the next tick. Reversals are dropped silently.
  pub fn set_direction(&mut self, next: Direction) -> bool {
    let Some(state) = self.state.as_mut() else { return false };
    if !state.running || is_opposite(state.direction, next) {
      return false;
    }
    state.queued_direction = next;
    true
  }

  pub fn set_paused(&mut self, paused: bool, now: f64) -> bool {
    let Some(state) = self.state.as_mut() else { return false };
    if !state.running || state.countdown {
      return false;
    }
    state.paused = paused;
    if !paused {
      self.last_time = now;
      self.accumulator = 0.0;
    }
    true
  }

  pub fn toggle_pause(&mut self, now: f64) -> bool {
    let paused = self.state.as_ref().map_or(false, |state| state.paused);
    self.set_paused(!paused, now)
  }

  /// Leaves the game without a game over, optionally keeping it resumable.
  pub fn stop(&mut self, save: bool) {
    self.cancel_countdown();
    let Some(state) = self.state.as_mut() else { return };
    if save && state.running {
      self.storage.save_game(&SavedGame::from_state(state));
    }
    state.running = false;
    state.paused = false;
    state.countdown = false;
  }

  /// Frame handler: fires due timers, runs hazards, then drains the accumulator
  /// in whole steps.
  pub fn advance(&mut self, now: f64) -> FrameReport {
    let mut report = FrameReport::default();

    let mut countdown_finished = false;
    for task in self.scheduler.drain_due(now) {
      match task {
        SessionTask::CountdownTick => {
          countdown_finished |= self.tick_countdown(now, &mut report);
        }
        SessionTask::DismissToast(id) => {
          self.toasts.retain(|toast| toast.id != id);
          report.toasts_changed = true;
        }
      }
    }

    if !self.is_running() {
      return report;
    }

    let delta = (now - self.last_time).max(0.0);
    self.last_time = now;

    let mut game_over = false;
    {
      let Some(state) = self.state.as_mut() else { return report };
      if state.paused || state.countdown || countdown_finished {
        self.accumulator = 0.0;
        return report;
      }

      update_hazards(state, &self.config, now, &mut self.rng, &mut report.events);
      self.accumulator += delta;

      loop {
        let duration = step_duration(state, &self.config, now);
        if self.accumulator < duration {
          break;
        }
        state.min_step_ms = state.min_step_ms.min(duration);
        let outcome = step(state, &self.config, now, &mut self.rng, &mut report.events);
        self.accumulator -= duration;
        report.steps += 1;

        if let StepOutcome::GameOver(_) = outcome {
          game_over = true;
          break;
        }
        if outcome == StepOutcome::Ate
          && self.best_score > 0
          && state.score > self.best_score
          && !state.new_best_achieved
        {
          state.new_best_achieved = true;
          report.events.push(GameEvent::NewBest { score: state.score });
        }
        self.storage.save_game(&SavedGame::from_state(state));
      }
    }

    if game_over {
      self.end_game(now);
      self.accumulator = 0.0;
    }

    for event in &report.events {
      if let Some(text) = toast_text(event) {
        self.push_toast(text, now);
        report.toasts_changed = true;
      }
    }
    report
  }

  fn end_game(&mut self, now: f64) {
    self.cancel_countdown();
    let Some(state) = self.state.as_mut() else { return };
    state.running = false;
    state.paused = false;

    let previous_best = self.best_score;
    let new_best = state.score > previous_best;
    if new_best {
      self.best_score = state.score;
      self.storage.set_best_score(state.score);
    }
    self.storage.clear_game();

    let elapsed_ms = (now - state.start_time).max(0.0);
    let intensity = if state.min_step_ms > 0.0 {
      (self.config.base_step_ms / state.min_step_ms * 100.0).round() / 100.0
    } else {
      1.0
    };
    tracing::debug!(
      profile = self.storage.profile(),
      score = state.score,
      new_best,
      "game over"
    );
    self.summary = Some(GameSummary {
      score: state.score,
      best_score: self.best_score,
      new_best,
      elapsed_ms,
      elapsed: format_time(elapsed_ms),
      intensity,
    });
  }

  fn push_toast(&mut self, text: &'static str, now: f64) {
    let id = self.next_toast_id;
    self.next_toast_id += 1;
    self.toasts.push(Toast { id, text });
    self.scheduler.schedule(now + TOAST_MS, SessionTask::DismissToast(id));
  }

  pub fn view(&self, now: f64) -> Option<GameView> {
    let state = self.state.as_ref()?;
    let trail = state.hot_trail(now).collect();
    Some(GameView {
      colors: (0..state.snake.len())
        .map(|index| segment_color(&self.config, index))
        .collect(),
      glow: hex_to_rgb(segment_color(&self.config, 0)),
      snake: state.snake.clone(),
      direction: state.direction,
      food: state.food,
      food_emoji: state.food_emoji.clone(),
      score: state.score,
      best_score: self.best_score.max(state.score),
      running: state.running,
      paused: state.paused,
      countdown: self.countdown_label(),
      elapsed: format_time(now - state.start_time),
      step_ms: step_duration(state, &self.config, now),
      hazards: HazardView {
        storm: state.storm_active(now),
        overheat: state.overheated(now),
        gate_charge: state.gate_charge,
        totem: state.totem.map(|totem| totem.cell),
        trail,
      },
    })
  }
}

fn toast_text(event: &GameEvent) -> Option<&'static str> {
  let text = match event {
    GameEvent::NewBest { .. } => "New best!",
    GameEvent::StormStarted { .. } => "Dust storm!",
    GameEvent::StormEnded => "Storm cleared",
    GameEvent::TotemSpawned { .. } => "Totem rising",
    GameEvent::TotemCollected { .. } => "Gate charged",
    GameEvent::GateUsed { .. } => "Gate jump!",
    GameEvent::GateExpired => "Gate faded",
    GameEvent::Overheated { .. } => "Overheat!",
    _ => return None,
  };
  Some(text)
}
