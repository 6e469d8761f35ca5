pub const MAX_USERNAME_LENGTH: usize = 24;
pub const MAX_PROFILE_ID_LENGTH: usize = 64;

/// Keeps ASCII alphanumerics, `-` and `_`, capped at [`MAX_PROFILE_ID_LENGTH`].
pub fn sanitize_profile_id(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_')
        .take(MAX_PROFILE_ID_LENGTH)
        .collect()
}

/// Collapses whitespace runs and trims. Returns `None` when the result is empty,
/// longer than [`MAX_USERNAME_LENGTH`] or carries control characters.
pub fn normalize_username(name: &str) -> Option<String> {
    let cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ");
    let length = cleaned.chars().count();
    if length == 0 || length > MAX_USERNAME_LENGTH {
        return None;
    }
    if cleaned.chars().any(|ch| ch <= '\u{1F}' || ch == '\u{7F}') {
        return None;
    }
    Some(cleaned)
}
