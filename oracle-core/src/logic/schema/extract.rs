//! JSON extraction from free-form model text.
//!
//! Models wrap JSON in prose or fenced code blocks; the candidate object is
//! recovered before validation. Anything that cannot be recovered is
//! `malformed_json`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::SchemaError;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("static regex"));

/// Recover the candidate score object from model text.
pub fn extract_json(text: &str) -> Result<Value, SchemaError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SchemaError::MalformedJson("empty response".to_string()));
    }

    let direct_err = match serde_json::from_str::<Value>(trimmed) {
        Ok(value @ Value::Object(_)) => return Ok(value),
        Ok(_) => "top-level value is not an object".to_string(),
        Err(e) => e.to_string(),
    };

    if let Some(caps) = FENCED_BLOCK.captures(trimmed) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&caps[1]) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(SchemaError::MalformedJson(direct_err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let v = extract_json(r#"{"score": 10}"#).unwrap();
        assert_eq!(v["score"], 10);
    }

    #[test]
    fn test_fenced_and_prose_wrapped() {
        let fenced = "Here you go:\n```json\n{\"score\": 55}\n```\nThanks";
        assert_eq!(extract_json(fenced).unwrap()["score"], 55);

        let prose = "The result is {\"score\": 7, \"breakdown\": {}} as requested.";
        assert_eq!(extract_json(prose).unwrap()["score"], 7);
    }

    #[test]
    fn test_unrecoverable() {
        assert!(matches!(extract_json(""), Err(SchemaError::MalformedJson(_))));
        assert!(matches!(extract_json("score: 50"), Err(SchemaError::MalformedJson(_))));
        assert!(matches!(extract_json("[1, 2, 3]"), Err(SchemaError::MalformedJson(_))));
        assert!(matches!(extract_json("{\"score\": 5,"), Err(SchemaError::MalformedJson(_))));
    }
}
