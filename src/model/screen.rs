use crate::model::Id;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A screen as served by the signage API and as held in an edit draft.
///
/// Relation fields (`regions`, playlist entries, group memberships) stay as raw
/// JSON because the API mixes IRI strings and embedded objects; they are reduced
/// to IDs by the relation normalizer when a save is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub iri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub modified_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub layout: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub regions: Vec<Value>,
    /// `None` when the snapshot carries no playlist list at all, which is
    /// different from an explicitly empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlists: Option<Vec<PlaylistEntry>>,
    /// Either an array of group references (once edited) or a collection IRI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_screen_groups: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One playlist placed in one region of a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    #[serde(rename = "@id", default)]
    pub playlist: Value,
    #[serde(default)]
    pub region: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlaylistEntry {
    pub fn new(playlist: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            playlist: Value::String(playlist.into()),
            region: Value::String(region.into()),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Dimensions {
    #[serde(default)]
    pub width: DimensionValue,
    #[serde(default)]
    pub height: DimensionValue,
}

/// Width/height are integers on the wire but free text while a form edits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Missing(()),
}

impl Default for DimensionValue {
    fn default() -> Self {
        DimensionValue::Missing(())
    }
}

impl DimensionValue {
    /// Leading-integer coercion: `"1920px"` is 1920, `12.9` is 12, and text
    /// without leading digits has no value.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            DimensionValue::Integer(value) => Some(*value),
            DimensionValue::Float(value) if value.is_finite() => Some(value.trunc() as i64),
            DimensionValue::Float(_) => None,
            DimensionValue::Text(text) => parse_leading_integer(text),
            DimensionValue::Missing(()) => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DimensionValue::Integer(value) => value.to_string(),
            DimensionValue::Float(value) => value.to_string(),
            DimensionValue::Text(text) => format!("\"{}\"", text),
            DimensionValue::Missing(()) => "null".to_string(),
        }
    }
}

fn parse_leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// A screen group, edited on its own through the group form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScreenGroup {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub iri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub modified_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Form inputs may hand over numbers or booleans for text fields
/// (`size=65`); those are kept as their text.
fn lenient_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "invalid type: {}, expected text",
            other
        ))),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_text(deserializer)?.unwrap_or_default())
}
