//! Save slot and preference persistence over a plain key/value store.

use crate::game::types::SavedGame;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const BEST_SCORE_KEY: &str = "snakeBestScore";
pub const SOUND_KEY: &str = "snakeSoundEnabled";
pub const HAPTICS_KEY: &str = "snakeHapticsEnabled";
pub const USERNAME_KEY: &str = "snakeUsername";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// In-process store shared by every connection. Keys are `profile:name`; profiles
/// are tracked by when they were last seen so idle ones can be forgotten.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
    last_seen: DashMap<String, Instant>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn touch(&self, profile: &str) {
        self.touch_at(profile, Instant::now());
    }

    pub fn touch_at(&self, profile: &str, at: Instant) {
        self.last_seen.insert(profile.to_string(), at);
    }

    /// Drops every key belonging to `profile`.
    pub fn forget(&self, profile: &str) {
        let prefix = format!("{profile}:");
        self.entries.retain(|key, _| !key.starts_with(&prefix));
        self.last_seen.remove(profile);
    }

    /// Forgets profiles unseen for longer than `idle` unless `in_use` claims them.
    /// Returns how many were dropped.
    pub fn sweep_idle_at(&self, idle: Duration, now: Instant, in_use: impl Fn(&str) -> bool) -> usize {
        let stale: Vec<String> = self
            .last_seen
            .iter()
            .filter(|entry| now.saturating_duration_since(*entry.value()) > idle)
            .map(|entry| entry.key().clone())
            .collect();
        let mut removed = 0;
        for profile in stale.iter().filter(|profile| !in_use(profile.as_str())) {
            self.forget(profile);
            removed += 1;
        }
        removed
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// One profile's view of the store: every key is prefixed with the profile id.
#[derive(Clone)]
pub struct ProfileStorage {
    store: Arc<dyn KeyValueStore>,
    profile: String,
    save_key: &'static str,
}

impl ProfileStorage {
    pub fn new(store: Arc<dyn KeyValueStore>, profile: impl Into<String>, save_key: &'static str) -> Self {
        Self {
            store,
            profile: profile.into(),
            save_key,
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    fn key(&self, name: &str) -> String {
        format!("{}:{}", self.profile, name)
    }

    /// Raw snapshot, still to be sanitized. Unparsable JSON reads as no save.
    pub fn load_game(&self) -> Option<Value> {
        let raw = self.store.get(&self.key(self.save_key))?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(profile = %self.profile, %error, "discarding unreadable save");
                None
            }
        }
    }

    pub fn has_saved_game(&self) -> bool {
        self.load_game().is_some()
    }

    pub fn save_game(&self, game: &SavedGame) {
        match serde_json::to_string(game) {
            Ok(raw) => self.store.set(&self.key(self.save_key), raw),
            Err(error) => tracing::warn!(profile = %self.profile, %error, "failed to encode save"),
        }
    }

    pub fn clear_game(&self) {
        self.store.remove(&self.key(self.save_key));
    }

    pub fn best_score(&self) -> u32 {
        self.store
            .get(&self.key(BEST_SCORE_KEY))
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(0)
    }

    pub fn set_best_score(&self, score: u32) {
        self.store.set(&self.key(BEST_SCORE_KEY), score.to_string());
    }

    /// Anything but the literal `"false"` counts as enabled.
    fn flag(&self, name: &str) -> bool {
        self.store.get(&self.key(name)).as_deref() != Some("false")
    }

    pub fn sound_enabled(&self) -> bool {
        self.flag(SOUND_KEY)
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.store.set(&self.key(SOUND_KEY), enabled.to_string());
    }

    pub fn haptics_enabled(&self) -> bool {
        self.flag(HAPTICS_KEY)
    }

    pub fn set_haptics_enabled(&self, enabled: bool) {
        self.store.set(&self.key(HAPTICS_KEY), enabled.to_string());
    }

    pub fn username(&self) -> Option<String> {
        self.store.get(&self.key(USERNAME_KEY))
    }

    pub fn set_username(&self, username: &str) {
        self.store.set(&self.key(USERNAME_KEY), username.to_string());
    }
}
