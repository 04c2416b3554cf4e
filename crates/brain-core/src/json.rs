//! Helpers for models asked to "respond in JSON only".
//!
//! Replies often wrap the object in prose or code fences, so the span from the
//! first `{` to the last `}` is taken as the object.

use serde::de::DeserializeOwned;

use crate::error::BrainError;

/// Return the span from the first `{` to the last `}`, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Extract and deserialize the JSON object embedded in a reply.
pub fn parse_json_object<T: DeserializeOwned>(text: &str) -> Result<T, BrainError> {
    let object = extract_json_object(text)
        .ok_or_else(|| BrainError::InvalidResponse("no JSON object in reply".to_string()))?;
    serde_json::from_str(object).map_err(|e| BrainError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Score {
        score: i64,
        tier: String,
    }

    #[test]
    fn test_extract_from_prose() {
        let text = "Here you go:\n```json\n{\"score\": 82, \"tier\": \"A\"}\n```\nThanks";
        assert_eq!(
            extract_json_object(text),
            Some("{\"score\": 82, \"tier\": \"A\"}")
        );
    }

    #[test]
    fn test_extract_spans_nested_objects() {
        let text = r#"{"a": {"b": 1}} trailing"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": 1}}"#));
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_json_object() {
        let parsed: Score = parse_json_object("Result: {\"score\": 40, \"tier\": \"C\"}").unwrap();
        assert_eq!(
            parsed,
            Score {
                score: 40,
                tier: "C".to_string()
            }
        );

        let err = parse_json_object::<Score>("{\"score\": \"high\"}").unwrap_err();
        assert!(matches!(err, BrainError::InvalidResponse(_)));
        let err = parse_json_object::<Score>("nothing").unwrap_err();
        assert!(matches!(err, BrainError::InvalidResponse(_)));
    }
}
