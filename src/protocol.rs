use crate::game::config::Variant;
use crate::game::events::GameEvent;
use crate::game::feedback::Cue;
use crate::game::session::Toast;
use crate::game::types::{GameSummary, GameView};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
  Hello {
    #[serde(rename = "profileId")]
    profile_id: Option<String>,
  },
  Start,
  Resume,
  Turn {
    direction: String,
  },
  Key {
    key: String,
  },
  Swipe {
    dx: f64,
    dy: f64,
  },
  Pause {
    paused: Option<bool>,
  },
  Menu,
  Quit,
  Preferences {
    sound: Option<bool>,
    haptics: Option<bool>,
    username: Option<String>,
  },
}

pub fn decode_client_message(text: &str) -> Option<ClientMessage> {
  serde_json::from_str(text).ok()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preferences {
  pub sound: bool,
  pub haptics: bool,
  pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
  #[serde(rename_all = "camelCase")]
  Welcome {
    profile_id: String,
    variant: Variant,
    grid_size: i32,
    best_score: u32,
    can_resume: bool,
    preferences: Preferences,
  },
  Frame {
    view: Option<GameView>,
    toasts: Vec<Toast>,
    events: Vec<GameEvent>,
    cues: Vec<Cue>,
  },
  GameOver {
    summary: GameSummary,
  },
}

pub fn encode_server_message(message: &ServerMessage) -> Option<String> {
  match serde_json::to_string(message) {
    Ok(text) => Some(text),
    Err(error) => {
      tracing::warn!(%error, "failed to encode server message");
      None
    }
  }
}
