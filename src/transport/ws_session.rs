use super::outbound::{LatestFrame, Outbound, MESSAGE_QUEUE};
use crate::app::AppState;
use crate::game::constants::FRAME_MS;
use crate::game::feedback::cue_for;
use crate::game::input::{parse_direction_name, parse_key, parse_swipe, KeyAction};
use crate::game::session::{FrameReport, GameSession};
use crate::protocol::{decode_client_message, encode_server_message, ClientMessage, Preferences, ServerMessage};
use crate::shared::names::{normalize_username, sanitize_profile_id};
use crate::storage::ProfileStorage;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (messages_tx, mut messages_rx) = mpsc::channel::<String>(MESSAGE_QUEUE);
    let latest_frame = Arc::new(LatestFrame::new());
    let outbound_frame = Arc::clone(&latest_frame);

    let send_task = tokio::spawn(async move {
        let mut pending: VecDeque<String> = VecDeque::new();

        loop {
            tokio::select! {
                Some(payload) = messages_rx.recv() => {
                    pending.push_back(payload);
                }
                _ = outbound_frame.wait_for_update() => {}
            }

            while let Ok(payload) = messages_rx.try_recv() {
                pending.push_back(payload);
            }
            while let Some(payload) = pending.pop_front() {
                if sender.send(Message::Text(payload)).await.is_err() {
                    return;
                }
            }
            if let Some(payload) = outbound_frame.take_latest() {
                if sender.send(Message::Text(payload)).await.is_err() {
                    return;
                }
            }
        }
    });

    let clock = Instant::now();
    let now = || clock.elapsed().as_secs_f64() * 1000.0;
    let mut connection = Connection::new(Arc::clone(&state), Outbound::new(messages_tx, latest_frame));
    let mut frames = tokio::time::interval(Duration::from_millis(FRAME_MS));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let Some(Ok(message)) = incoming else { break };
                match message {
                    Message::Text(text) => {
                        if !connection.handle_text(&text, now()) {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            _ = frames.tick() => {
                if !connection.tick(now()) {
                    break;
                }
            }
        }
    }

    connection.close();
    send_task.abort();
}

/// Game state owned by one socket. Timestamps are milliseconds since the socket opened.
struct Connection {
    id: Uuid,
    state: Arc<AppState>,
    outbound: Outbound,
    session: Option<GameSession>,
    /// The profile id was minted here rather than sent by the client.
    anonymous: bool,
}

impl Connection {
    fn new(state: Arc<AppState>, outbound: Outbound) -> Self {
        Self {
            id: Uuid::new_v4(),
            state,
            outbound,
            session: None,
            anonymous: false,
        }
    }

    fn send(&self, message: &ServerMessage) -> bool {
        let Some(payload) = encode_server_message(message) else { return true };
        self.outbound.message(payload)
    }

    /// Returns false when the connection should close.
    fn handle_text(&mut self, text: &str, now: f64) -> bool {
        let Some(message) = decode_client_message(text) else {
            tracing::debug!(connection = %self.id, "ignoring unreadable message");
            return true;
        };
        if let ClientMessage::Hello { profile_id } = message {
            return self.hello(profile_id);
        }
        if self.session.is_none() && !self.hello(None) {
            return false;
        }
        let Some(session) = self.session.as_mut() else { return true };

        match message {
            ClientMessage::Hello { .. } => {}
            ClientMessage::Start => session.start_new(now),
            ClientMessage::Resume => {
                if !session.resume(now) {
                    tracing::debug!(connection = %self.id, "nothing to resume");
                }
            }
            ClientMessage::Turn { direction } => {
                if let Some(direction) = parse_direction_name(&direction) {
                    session.set_direction(direction);
                }
            }
            ClientMessage::Key { key } => match parse_key(&key) {
                Some(KeyAction::Turn(direction)) => {
                    session.set_direction(direction);
                }
                Some(KeyAction::TogglePause) => {
                    session.toggle_pause(now);
                }
                None => {}
            },
            ClientMessage::Swipe { dx, dy } => {
                if let Some(direction) = parse_swipe(dx, dy) {
                    session.set_direction(direction);
                }
            }
            ClientMessage::Pause { paused } => {
                match paused {
                    Some(paused) => session.set_paused(paused, now),
                    None => session.toggle_pause(now),
                };
            }
            ClientMessage::Menu => session.stop(true),
            ClientMessage::Quit => {
                session.stop(false);
                session.storage().clear_game();
            }
            ClientMessage::Preferences {
                sound,
                haptics,
                username,
            } => {
                let storage = session.storage();
                if let Some(sound) = sound {
                    storage.set_sound_enabled(sound);
                }
                if let Some(haptics) = haptics {
                    storage.set_haptics_enabled(haptics);
                }
                if let Some(username) = username.as_deref().and_then(normalize_username) {
                    storage.set_username(&username);
                }
            }
        }

        self.send_frame(FrameReport::default(), now)
    }

    fn hello(&mut self, profile_id: Option<String>) -> bool {
        let requested = profile_id
            .map(|value| sanitize_profile_id(&value))
            .filter(|value| !value.is_empty());
        self.release_session();
        self.anonymous = requested.is_none();
        let profile = requested.unwrap_or_else(|| Uuid::new_v4().to_string());
        self.state.profiles.touch(&profile);

        let game = self.state.game.clone();
        let storage = ProfileStorage::new(self.state.profiles.clone(), profile.clone(), game.save_key);
        let session = GameSession::new(game, storage);
        self.state.sessions.insert(self.id, profile.clone());
        tracing::debug!(connection = %self.id, %profile, "game session opened");

        let storage = session.storage();
        let welcome = ServerMessage::Welcome {
            profile_id: profile,
            variant: session.config().variant,
            grid_size: session.config().grid_size,
            best_score: session.best_score(),
            can_resume: session.can_resume(),
            preferences: Preferences {
                sound: storage.sound_enabled(),
                haptics: storage.haptics_enabled(),
                username: storage.username(),
            },
        };
        self.session = Some(session);
        self.send(&welcome)
    }

    /// Returns false when the connection should close.
    fn tick(&mut self, now: f64) -> bool {
        let Some(session) = self.session.as_mut() else { return true };
        let was_running = session.is_running();
        let report = session.advance(now);
        let ended = was_running && !session.is_running() && session.summary().is_some();
        if (!report.is_quiet() || session.is_running()) && !self.send_frame(report, now) {
            return false;
        }
        if ended {
            let summary = self.session.as_ref().and_then(|session| session.summary().cloned());
            if let Some(summary) = summary {
                return self.send(&ServerMessage::GameOver { summary });
            }
        }
        true
    }

    fn send_frame(&self, report: FrameReport, now: f64) -> bool {
        let Some(session) = self.session.as_ref() else { return true };
        let prefs = session.feedback_prefs();
        let cues = report
            .events
            .iter()
            .filter_map(|event| cue_for(event, prefs))
            .collect();
        let frame = ServerMessage::Frame {
            view: session.view(now),
            toasts: session.toasts().to_vec(),
            events: report.events,
            cues,
        };
        let Some(payload) = encode_server_message(&frame) else { return true };
        self.outbound.frame(payload)
    }

    /// Stops the current game, keeping it resumable. Profiles minted for this
    /// connection are forgotten since nobody can come back to them.
    fn release_session(&mut self) {
        let Some(mut session) = self.session.take() else { return };
        session.stop(true);
        let profile = session.storage().profile();
        if self.anonymous {
            self.state.profiles.forget(profile);
        } else {
            self.state.profiles.touch(profile);
        }
    }

    fn close(&mut self) {
        self.release_session();
        self.state.sessions.remove(&self.id);
        tracing::debug!(connection = %self.id, "game session closed");
    }
}

#[cfg(test)]
mod tests;
