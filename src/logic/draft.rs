use crate::error::DraftError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// The in-progress edit of an entity, including UI-only fields the API never sees.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft(Value);

impl Draft {
    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn from_snapshot<T: Serialize>(snapshot: &T) -> Result<Self, DraftError> {
        serde_json::to_value(snapshot)
            .map(Self)
            .map_err(|e| DraftError::InvalidShape {
                field: "<root>".to_string(),
                reason: e.to_string(),
            })
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Read the draft back as a typed entity.
    pub fn to_entity<T: DeserializeOwned>(&self) -> Result<T, DraftError> {
        serde_json::from_value(self.0.clone()).map_err(|e| DraftError::InvalidShape {
            field: "<root>".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl Default for Draft {
    fn default() -> Self {
        Self::empty()
    }
}

/// Holds the draft of one editing session.
///
/// Every `set_field` swaps in a fresh copy, so a handle returned by an earlier
/// `get` keeps seeing the snapshot it was taken from.
#[derive(Debug, Default)]
pub struct DraftStore {
    current: Arc<Draft>,
    dirty: bool,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Arc<Draft> {
        Arc::clone(&self.current)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the draft with a loaded snapshot. Refused once local edits exist.
    pub fn hydrate(&mut self, snapshot: Draft) -> Result<(), DraftError> {
        if self.dirty {
            return Err(DraftError::HydrateAfterEdit);
        }
        self.current = Arc::new(snapshot);
        Ok(())
    }

    /// Discard local edits and take the freshly loaded snapshot.
    pub fn reload(&mut self, snapshot: Draft) {
        self.current = Arc::new(snapshot);
        self.dirty = false;
    }

    pub fn set_field(&mut self, path: &str, value: Value) -> Result<(), DraftError> {
        let segments = parse_path(path)?;
        let mut next = (*self.current).clone();
        assign(&mut next.0, path, &segments, value)?;
        self.current = Arc::new(next);
        self.dirty = true;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathSegment {
    Key(String),
    Index(usize),
    /// Digit-only dot segment: an index into arrays, a verbatim key in objects.
    Numeric(String),
}

/// How far past the end of an array an index may reach.
const MAX_INDEX_PADDING: usize = 10_000;

/// Parse `a.b[0]["@id"].2` style paths.
pub(crate) fn parse_path(path: &str) -> Result<Vec<PathSegment>, DraftError> {
    let invalid = |reason: &str| DraftError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = Vec::new();
    let mut chars = path.chars().peekable();
    let mut word = String::new();
    // true right after a closing bracket, where only '.', '[' or the end may follow
    let mut after_bracket = false;

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !after_bracket {
                    if word.is_empty() {
                        return Err(invalid("empty segment"));
                    }
                    segments.push(word_segment(std::mem::take(&mut word)));
                }
                after_bracket = false;
                if chars.peek().is_none() {
                    return Err(invalid("trailing '.'"));
                }
            }
            '[' => {
                if !word.is_empty() {
                    segments.push(word_segment(std::mem::take(&mut word)));
                }
                let segment = match chars.peek() {
                    Some(&quote) if quote == '"' || quote == '\'' => {
                        chars.next();
                        let mut key = String::new();
                        loop {
                            match chars.next() {
                                Some(ch) if ch == quote => break,
                                Some(ch) => key.push(ch),
                                None => return Err(invalid("unterminated quoted key")),
                            }
                        }
                        PathSegment::Key(key)
                    }
                    _ => {
                        let mut digits = String::new();
                        while let Some(&ch) = chars.peek() {
                            if ch == ']' {
                                break;
                            }
                            digits.push(ch);
                            chars.next();
                        }
                        let index = digits
                            .trim()
                            .parse::<usize>()
                            .map_err(|_| invalid("bracket index is not a non-negative integer"))?;
                        PathSegment::Index(index)
                    }
                };
                if chars.next() != Some(']') {
                    return Err(invalid("missing ']'"));
                }
                segments.push(segment);
                after_bracket = true;
            }
            ']' => return Err(invalid("unexpected ']'")),
            _ => {
                if after_bracket {
                    return Err(invalid("expected '.' or '[' after ']'"));
                }
                word.push(c);
            }
        }
    }

    if !word.is_empty() {
        segments.push(word_segment(word));
    }
    if segments.is_empty() {
        return Err(invalid("empty path"));
    }
    Ok(segments)
}

fn word_segment(word: String) -> PathSegment {
    if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
        return PathSegment::Numeric(word);
    }
    PathSegment::Key(word)
}

fn assign(
    target: &mut Value,
    path: &str,
    segments: &[PathSegment],
    value: Value,
) -> Result<(), DraftError> {
    let Some((segment, rest)) = segments.split_first() else {
        *target = value;
        return Ok(());
    };

    if !target.is_object() && !target.is_array() {
        *target = match segment {
            PathSegment::Index(_) | PathSegment::Numeric(_) => Value::Array(Vec::new()),
            PathSegment::Key(_) => Value::Object(Map::new()),
        };
    }

    let out_of_range = || DraftError::InvalidPath {
        path: path.to_string(),
        reason: "index out of range".to_string(),
    };

    let slot = match (target, segment) {
        (Value::Object(map), PathSegment::Key(key) | PathSegment::Numeric(key)) => {
            map.entry(key.clone()).or_insert(Value::Null)
        }
        (Value::Object(map), PathSegment::Index(index)) => {
            map.entry(index.to_string()).or_insert(Value::Null)
        }
        (Value::Array(items), PathSegment::Index(_) | PathSegment::Numeric(_)) => {
            let index = match segment {
                PathSegment::Numeric(text) => text.parse::<usize>().map_err(|_| out_of_range())?,
                PathSegment::Index(index) => *index,
                PathSegment::Key(_) => unreachable!("matched above"),
            };
            if index >= items.len() {
                if index - items.len() > MAX_INDEX_PADDING {
                    return Err(out_of_range());
                }
                let len = index.checked_add(1).ok_or_else(out_of_range)?;
                items.resize(len, Value::Null);
            }
            &mut items[index]
        }
        (Value::Array(_), PathSegment::Key(key)) => {
            return Err(DraftError::PathConflict {
                path: path.to_string(),
                segment: key.clone(),
            })
        }
        _ => unreachable!("target was coerced to a container above"),
    };

    assign(slot, path, rest, value)
}
