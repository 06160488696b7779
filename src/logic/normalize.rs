use crate::error::MalformedReferenceError;
use crate::model::Id;
use serde_json::Value;

/// Reduce a relation reference to its canonical entity ID.
///
/// Accepts a plain ID (`"01FGC8"`), an IRI whose last path segment is the ID
/// (`"/v1/playlists/01FGC8"`), or an embedded object carrying `@id` (or `id`).
pub fn canonical_id(reference: &Value) -> Result<Id, MalformedReferenceError> {
    match reference {
        Value::String(text) => canonical_id_str(text)
            .ok_or_else(|| MalformedReferenceError::new(reference.to_string())),
        Value::Object(object) => object
            .get("@id")
            .or_else(|| object.get("id"))
            .and_then(Value::as_str)
            .and_then(canonical_id_str)
            .ok_or_else(|| MalformedReferenceError::new(reference.to_string())),
        _ => Err(MalformedReferenceError::new(reference.to_string())),
    }
}

fn canonical_id_str(text: &str) -> Option<Id> {
    let text = text.trim();
    if !text.contains('/') {
        return is_valid_id(text).then(|| text.to_string());
    }

    let path = text.split(['?', '#']).next().unwrap_or_default();
    let last = path.rsplit('/').next()?;
    is_valid_id(last).then(|| last.to_string())
}

fn is_valid_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
