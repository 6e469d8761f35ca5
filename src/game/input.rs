use super::constants::SWIPE_THRESHOLD;
use super::types::Direction;

pub fn parse_direction_name(value: &str) -> Option<Direction> {
    match value.trim().to_ascii_lowercase().as_str() {
        "up" => Some(Direction::UP),
        "down" => Some(Direction::DOWN),
        "left" => Some(Direction::LEFT),
        "right" => Some(Direction::RIGHT),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Turn(Direction),
    TogglePause,
}

pub fn parse_key(key: &str) -> Option<KeyAction> {
    match key {
        "ArrowUp" => Some(KeyAction::Turn(Direction::UP)),
        "ArrowDown" => Some(KeyAction::Turn(Direction::DOWN)),
        "ArrowLeft" => Some(KeyAction::Turn(Direction::LEFT)),
        "ArrowRight" => Some(KeyAction::Turn(Direction::RIGHT)),
        " " => Some(KeyAction::TogglePause),
        _ => None,
    }
}

/// Dominant axis wins; short or non-finite swipes are ignored.
pub fn parse_swipe(dx: f64, dy: f64) -> Option<Direction> {
    if !dx.is_finite() || !dy.is_finite() {
        return None;
    }
    if dx.abs() < SWIPE_THRESHOLD && dy.abs() < SWIPE_THRESHOLD {
        return None;
    }
    let direction = if dx.abs() > dy.abs() {
        if dx > 0.0 {
            Direction::RIGHT
        } else {
            Direction::LEFT
        }
    } else if dy > 0.0 {
        Direction::DOWN
    } else {
        Direction::UP
    };
    Some(direction)
}
