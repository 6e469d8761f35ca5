use super::config::GameConfig;
use super::constants::{CLASSIC_BODY, NEON_BODY, RAINBOW};
use super::config::Variant;

/// `m:ss`, minutes unbounded.
pub fn format_time(ms: f64) -> String {
    let total_seconds = (ms.max(0.0) / 1000.0).floor() as u64;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes}:{seconds:02}")
}

/// `#rrggbb` to `"r, g, b"` for rgba() strings. Unparsable channels read as 0.
pub fn hex_to_rgb(hex: &str) -> String {
    let digits = hex.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .unwrap_or(0)
    };
    format!("{}, {}, {}", channel(0..2), channel(2..4), channel(4..6))
}

pub fn segment_color(config: &GameConfig, index: usize) -> &'static str {
    if config.rainbow_body {
        return RAINBOW[index % RAINBOW.len()];
    }
    match config.variant {
        Variant::Neon => NEON_BODY,
        _ => CLASSIC_BODY,
    }
}
