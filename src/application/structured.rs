use serde::de::DeserializeOwned;

use crate::domain::{ports::LlmService, DomainError};

/// Decodes a model reply into `T`, tolerating a surrounding markdown fence.
///
/// Anything that does not match the schema (bad JSON, missing required
/// field, wrong type) is a validation error.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, DomainError> {
    let text = strip_json_fences(raw);
    serde_json::from_str(text)
        .map_err(|e| DomainError::validation(format!("Malformed model output: {e}")))
}

/// Completes and decodes in one go.
pub async fn complete_structured<T: DeserializeOwned>(
    llm: &dyn LlmService,
    system: &str,
    prompt: &str,
) -> Result<T, DomainError> {
    let raw = llm.complete_with_system(system, prompt).await?;
    decode(&raw)
}

fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));

    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(str::trim)
                .unwrap_or(stripped)
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        critique: Option<String>,
        artifact: String,
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_decode_accepts_null_and_missing_optional() {
        let with_null: Reply = decode(r#"{"critique": null, "artifact": "ok"}"#).unwrap();
        let without: Reply = decode(r#"{"artifact": "ok"}"#).unwrap();
        assert_eq!(with_null, without);
    }

    #[test]
    fn test_decode_missing_required_field_is_validation_error() {
        let err = decode::<Reply>(r#"{"critique": "shorter"}"#).unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref m) if m.contains("artifact")));
    }

    #[test]
    fn test_decode_prose_is_validation_error() {
        let err = decode::<Reply>("Looks great to me!").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
