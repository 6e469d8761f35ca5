use super::names::normalize_username;
use crate::game::constants::MAX_SCORE;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreError {
    #[error("username must be 1-24 characters without control characters")]
    InvalidUsername,
    #[error("score must be an integer")]
    NotAnInteger,
    #[error("score must be between 0 and 1000000")]
    OutOfRange,
    #[error("submission must be a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub username: String,
    pub score: u32,
}

/// Accepts JSON numbers and numeric strings. Blank strings are rejected rather
/// than read as zero.
pub fn coerce_score(value: &Value) -> Result<u32, ScoreError> {
    let number = match value {
        Value::Number(number) => number.as_f64().ok_or(ScoreError::NotAnInteger)?,
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(ScoreError::NotAnInteger);
            }
            text.parse::<f64>().map_err(|_| ScoreError::NotAnInteger)?
        }
        _ => return Err(ScoreError::NotAnInteger),
    };
    if !number.is_finite() || number.fract() != 0.0 {
        return Err(ScoreError::NotAnInteger);
    }
    if number < 0.0 || number > MAX_SCORE as f64 {
        return Err(ScoreError::OutOfRange);
    }
    Ok(number as u32)
}

pub fn validate_submission(body: &Value) -> Result<Submission, ScoreError> {
    let Some(fields) = body.as_object() else { return Err(ScoreError::NotAnObject) };
    let username = fields
        .get("username")
        .and_then(Value::as_str)
        .and_then(normalize_username)
        .ok_or(ScoreError::InvalidUsername)?;
    let score = coerce_score(fields.get("score").unwrap_or(&Value::Null))?;
    Ok(Submission { username, score })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_valid_submission() {
        let submission = validate_submission(&json!({ "username": "player1", "score": 100 })).unwrap();
        assert_eq!(
            submission,
            Submission {
                username: "player1".to_string(),
                score: 100
            }
        );
    }

    #[test]
    fn score_bounds_are_inclusive() {
        assert_eq!(coerce_score(&json!(0)), Ok(0));
        assert_eq!(coerce_score(&json!(1_000_000)), Ok(1_000_000));
        assert_eq!(coerce_score(&json!(1_000_001)), Err(ScoreError::OutOfRange));
        assert_eq!(coerce_score(&json!(-10)), Err(ScoreError::OutOfRange));
    }

    #[test]
    fn numeric_strings_are_coerced() {
        assert_eq!(coerce_score(&json!("42")), Ok(42));
        assert_eq!(coerce_score(&json!(" 7 ")), Ok(7));
        assert_eq!(coerce_score(&json!("abc")), Err(ScoreError::NotAnInteger));
        assert_eq!(coerce_score(&json!("")), Err(ScoreError::NotAnInteger));
    }

    #[test]
    fn fractions_and_other_types_are_rejected() {
        assert_eq!(coerce_score(&json!(42.5)), Err(ScoreError::NotAnInteger));
        assert_eq!(coerce_score(&json!(true)), Err(ScoreError::NotAnInteger));
        assert_eq!(coerce_score(&json!(null)), Err(ScoreError::NotAnInteger));
    }

    #[test]
    fn username_is_normalized() {
        let submission = validate_submission(&json!({ "username": "  player  ", "score": 10 })).unwrap();
        assert_eq!(submission.username, "player");
        assert_eq!(
            validate_submission(&json!({ "username": "   ", "score": 10 })),
            Err(ScoreError::InvalidUsername)
        );
        assert_eq!(
            validate_submission(&json!({ "username": "player\u{0000}", "score": 10 })),
            Err(ScoreError::InvalidUsername)
        );
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert!(validate_submission(&json!({})).is_err());
        assert!(validate_submission(&json!({ "username": "p1" })).is_err());
        assert!(validate_submission(&json!({ "score": 10 })).is_err());
        assert_eq!(validate_submission(&json!([1, 2])), Err(ScoreError::NotAnObject));
    }
}
