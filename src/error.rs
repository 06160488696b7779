use crate::model::{ErrorDetail, Id};

/// A relation reference that could not be reduced to a canonical entity ID.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed relation reference: {reference}")]
pub struct MalformedReferenceError {
    /// The offending reference, rendered as JSON text.
    pub reference: String,
}

impl MalformedReferenceError {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

/// Structural errors raised by the draft store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    #[error("invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A key segment was applied to an array.
    #[error("field path '{path}' addresses key '{segment}' inside an array")]
    PathConflict { path: String, segment: String },

    #[error("draft has local edits; use reload to discard them")]
    HydrateAfterEdit,

    #[error("draft field '{field}' has an unexpected shape: {reason}")]
    InvalidShape { field: String, reason: String },
}

/// Errors raised by `submit` before any write is issued.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    #[error("a save is already in progress")]
    SaveInProgress,

    #[error(transparent)]
    MalformedReference(#[from] MalformedReferenceError),

    #[error("dimension '{field}' is not an integer: {value}")]
    InvalidDimension { field: String, value: String },

    #[error(transparent)]
    Draft(#[from] DraftError),
}

/// Terminal failure of one write channel within a save cycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SaveError {
    #[error("screen save failed: {0}")]
    PrimaryWrite(ErrorDetail),

    #[error("group save failed: {0}")]
    GroupWrite(ErrorDetail),

    #[error("playlist save for region {region_id} failed: {detail}")]
    PlaylistWrite { region_id: Id, detail: ErrorDetail },
}

/// Failure of a single-write screen group save.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GroupSaveError {
    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("screen group save failed: {0}")]
    Write(ErrorDetail),
}
