use super::*;
use crate::app::config::ServerConfig;
use serde_json::Value;

struct Harness {
    state: Arc<AppState>,
    connection: Connection,
    messages: mpsc::Receiver<String>,
    frame: Arc<LatestFrame>,
}

fn harness() -> Harness {
    let state = Arc::new(AppState::new(ServerConfig::default(), None));
    let (tx, messages) = mpsc::channel(MESSAGE_QUEUE);
    let frame = Arc::new(LatestFrame::new());
    let connection = Connection::new(Arc::clone(&state), Outbound::new(tx, Arc::clone(&frame)));
    Harness {
        state,
        connection,
        messages,
        frame,
    }
}

impl Harness {
    fn send(&mut self, text: &str, now: f64) {
        assert!(self.connection.handle_text(text, now), "{text}");
    }

    fn drain(&mut self) -> Vec<Value> {
        let mut received = Vec::new();
        while let Ok(payload) = self.messages.try_recv() {
            received.push(serde_json::from_str(&payload).expect("server messages are json"));
        }
        received
    }

    fn latest_frame(&self) -> Option<Value> {
        self.frame
            .take_latest()
            .map(|payload| serde_json::from_str(&payload).expect("frames are json"))
    }

    fn storage(&self, profile: &str) -> ProfileStorage {
        ProfileStorage::new(self.state.profiles.clone(), profile, self.state.game.save_key)
    }

    fn profile(&self) -> Option<String> {
        self.state
            .sessions
            .get(&self.connection.id)
            .map(|entry| entry.value().clone())
    }
}

fn types(messages: &[Value]) -> Vec<&str> {
    messages
        .iter()
        .filter_map(|message| message["type"].as_str())
        .collect()
}

#[test]
fn first_message_without_hello_opens_a_session() {
    let mut harness = harness();
    harness.send(r#"{"type":"start"}"#, 0.0);

    let messages = harness.drain();
    assert_eq!(types(&messages), vec!["welcome"]);
    let profile = messages[0]["profileId"].as_str().expect("profile id");
    assert!(Uuid::parse_str(profile).is_ok());
    assert_eq!(harness.profile().as_deref(), Some(profile));

    let frame = harness.latest_frame().expect("frame after start");
    assert_eq!(frame["view"]["countdown"], "3");
    assert_eq!(frame["view"]["running"], true);
}

#[test]
fn menu_keeps_the_save_and_quit_discards_it() {
    let mut harness = harness();
    harness.send(r#"{"type":"hello","profileId":"p1"}"#, 0.0);
    harness.send(r#"{"type":"start"}"#, 0.0);
    harness.send(r#"{"type":"menu"}"#, 10.0);
    assert!(harness.storage("p1").has_saved_game());

    harness.send(r#"{"type":"resume"}"#, 20.0);
    let frame = harness.latest_frame().expect("frame after resume");
    assert_eq!(frame["view"]["running"], true);

    harness.send(r#"{"type":"quit"}"#, 30.0);
    assert!(!harness.storage("p1").has_saved_game());
    let frame = harness.latest_frame().expect("frame after quit");
    assert_eq!(frame["view"]["running"], false);
}

#[test]
fn second_hello_saves_and_replaces_the_session() {
    let mut harness = harness();
    harness.send(r#"{"type":"hello","profileId":"p1"}"#, 0.0);
    harness.send(r#"{"type":"start"}"#, 0.0);
    harness.send(r#"{"type":"hello","profileId":"p2"}"#, 50.0);

    assert!(harness.storage("p1").has_saved_game());
    assert!(!harness.storage("p2").has_saved_game());
    assert_eq!(harness.profile().as_deref(), Some("p2"));
    assert_eq!(harness.state.sessions.len(), 1);

    let messages = harness.drain();
    assert_eq!(types(&messages), vec!["welcome", "frame", "welcome"]);
    assert_eq!(messages[2]["profileId"], "p2");
    assert_eq!(messages[2]["canResume"], false);

    harness.send(r#"{"type":"hello","profileId":"p1"}"#, 60.0);
    let messages = harness.drain();
    assert_eq!(messages.last().map(|message| &message["canResume"]), Some(&Value::Bool(true)));
}

#[test]
fn preferences_store_only_normalized_usernames() {
    let mut harness = harness();
    harness.send(r#"{"type":"hello","profileId":"p1"}"#, 0.0);
    harness.send(
        r#"{"type":"preferences","username":"  ada   lovelace ","sound":false}"#,
        0.0,
    );
    let storage = harness.storage("p1");
    assert_eq!(storage.username().as_deref(), Some("ada lovelace"));
    assert!(!storage.sound_enabled());
    assert!(storage.haptics_enabled());

    harness.send(r#"{"type":"preferences","username":"bad\u0007name"}"#, 0.0);
    harness.send(r#"{"type":"preferences","username":"   "}"#, 0.0);
    assert_eq!(storage.username().as_deref(), Some("ada lovelace"));

    harness.send(r#"{"type":"hello","profileId":"p1"}"#, 0.0);
    let messages = harness.drain();
    let welcome = messages.last().expect("welcome");
    assert_eq!(welcome["preferences"]["username"], "ada lovelace");
    assert_eq!(welcome["preferences"]["sound"], false);
}

#[test]
fn game_over_is_sent_once() {
    let mut harness = harness();
    harness.send(r#"{"type":"hello","profileId":"p1"}"#, 0.0);
    harness.send(r#"{"type":"start"}"#, 0.0);
    for tick in 1..=400 {
        assert!(harness.connection.tick(tick as f64 * 50.0));
    }

    let messages = harness.drain();
    let kinds = types(&messages);
    assert_eq!(kinds.iter().filter(|kind| **kind == "gameOver").count(), 1);
    assert_eq!(kinds.last(), Some(&"gameOver"));
    assert_eq!(kinds[kinds.len() - 2], "frame");

    let summary = &messages[messages.len() - 1]["summary"];
    assert!(summary["score"].is_number());
    assert!(!harness.storage("p1").has_saved_game());
}

#[test]
fn unread_frames_do_not_pile_up() {
    let mut harness = harness();
    harness.send(r#"{"type":"hello","profileId":"p1"}"#, 0.0);
    harness.send(r#"{"type":"start"}"#, 0.0);
    for tick in 1..=150 {
        assert!(harness.connection.tick(tick as f64 * 16.0));
    }

    assert_eq!(types(&harness.drain()), vec!["welcome"]);
    let frame = harness.latest_frame().expect("latest frame");
    assert_eq!(frame["view"]["running"], true);
    assert!(harness.latest_frame().is_none());
}

#[test]
fn closing_forgets_anonymous_profiles_only() {
    let mut anonymous = harness();
    anonymous.send(r#"{"type":"start"}"#, 0.0);
    anonymous.send(r#"{"type":"preferences","sound":false}"#, 0.0);
    assert!(anonymous.state.profiles.len() > 0);
    anonymous.connection.close();
    assert_eq!(anonymous.state.profiles.len(), 0);
    assert!(anonymous.state.sessions.is_empty());

    let mut named = harness();
    named.send(r#"{"type":"hello","profileId":"p1"}"#, 0.0);
    named.send(r#"{"type":"start"}"#, 0.0);
    named.connection.close();
    assert!(named.storage("p1").has_saved_game());
    assert!(named.state.sessions.is_empty());
}

#[test]
fn closed_socket_stops_the_connection() {
    let mut harness = harness();
    harness.send(r#"{"type":"hello","profileId":"p1"}"#, 0.0);
    harness.messages.close();
    assert!(!harness.connection.handle_text(r#"{"type":"start"}"#, 0.0));
    assert!(!harness.connection.tick(16.0));
}
