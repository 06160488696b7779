use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Failure object returned by a write or read.
///
/// Mirrors the shapes the API client produces: an HTTP error with a JSON-LD
/// body (`hydra:description`), or a transport failure carrying only `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(
        rename = "hydra:description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorDetail {
    /// A transport-level failure with no response body.
    pub fn transport(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// An HTTP failure with the decoded response body.
    pub fn http(status: u16, data: Option<Value>) -> Self {
        Self {
            status: Some(status),
            data,
            ..Default::default()
        }
    }

    /// The human-readable part of the failure, if any.
    ///
    /// A transport `error` wins over the body's `hydra:description` (or
    /// `message`), which wins over a top-level description.
    pub fn message(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        if let Some(data) = &self.data {
            let from_body = data
                .get("hydra:description")
                .or_else(|| data.get("message"))
                .and_then(Value::as_str);
            if let Some(text) = from_body {
                return Some(text.to_string());
            }
        }
        self.description.clone()
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.message(), self.status) {
            (Some(message), _) => f.write_str(&message),
            (None, Some(status)) => write!(f, "HTTP {}", status),
            (None, None) => f.write_str("unknown error"),
        }
    }
}

impl std::error::Error for ErrorDetail {}

/// Keys of the user-facing messages the save flows emit. Text lookup by
/// locale belongs to the presentation layer; `default_text` is the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKey {
    LoadingScreen,
    SavingScreen,
    SavingGroups,
    SavingPlaylists,
    SavedScreen,
    SavedGroups,
    SavedPlaylists,
    SaveScreenError,
    SaveGroupsError,
    SavePlaylistsError,
    LoadScreenError,
    LoadingGroup,
    SavingGroup,
    SavedGroup,
    SaveGroupError,
    LoadGroupError,
}

impl MessageKey {
    pub fn key(&self) -> &'static str {
        match self {
            MessageKey::LoadingScreen => "loading-messages.loading-screen",
            MessageKey::SavingScreen => "loading-messages.saving-screen",
            MessageKey::SavingGroups => "loading-messages.saving-groups",
            MessageKey::SavingPlaylists => "loading-messages.saving-playlists",
            MessageKey::SavedScreen => "success-messages.saved-screen",
            MessageKey::SavedGroups => "success-messages.saved-groups",
            MessageKey::SavedPlaylists => "success-messages.saved-playlists",
            MessageKey::SaveScreenError => "error-messages.save-screen-error",
            MessageKey::SaveGroupsError => "error-messages.save-groups-error",
            MessageKey::SavePlaylistsError => "error-messages.save-playlists-error",
            MessageKey::LoadScreenError => "error-messages.load-screen-error",
            MessageKey::LoadingGroup => "loading-messages.loading-group",
            MessageKey::SavingGroup => "loading-messages.saving-group",
            MessageKey::SavedGroup => "success-messages.saved-group",
            MessageKey::SaveGroupError => "error-messages.save-group-error",
            MessageKey::LoadGroupError => "error-messages.load-group-error",
        }
    }

    pub fn default_text(&self) -> &'static str {
        match self {
            MessageKey::LoadingScreen => "Loading screen...",
            MessageKey::SavingScreen => "Saving screen...",
            MessageKey::SavingGroups => "Saving groups...",
            MessageKey::SavingPlaylists => "Saving playlists...",
            MessageKey::SavedScreen => "Screen saved",
            MessageKey::SavedGroups => "Groups saved",
            MessageKey::SavedPlaylists => "Playlists saved",
            MessageKey::SaveScreenError => "An error occurred saving the screen:",
            MessageKey::SaveGroupsError => "An error occurred saving the groups:",
            MessageKey::SavePlaylistsError => "An error occurred saving the playlists:",
            MessageKey::LoadScreenError => "An error occurred loading the screen:",
            MessageKey::LoadingGroup => "Loading group...",
            MessageKey::SavingGroup => "Saving group...",
            MessageKey::SavedGroup => "Group saved",
            MessageKey::SaveGroupError => "An error occurred saving the group:",
            MessageKey::LoadGroupError => "An error occurred loading the group:",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_text())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// One terminal outcome to surface to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: MessageKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ErrorDetail>,
    pub at: DateTime<Local>,
}

impl Notification {
    pub fn success(message: MessageKey) -> Self {
        Self {
            level: NotificationLevel::Success,
            message,
            detail: None,
            at: Local::now(),
        }
    }

    pub fn error(message: MessageKey, detail: ErrorDetail) -> Self {
        Self {
            level: NotificationLevel::Error,
            message,
            detail: Some(detail),
            at: Local::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }

    pub fn render(&self) -> String {
        format_toast(self.message.default_text(), self.detail.as_ref(), self.at)
    }
}

/// Toast text: message, error detail (if any), then a `HH:MM:SS` stamp.
pub fn format_toast(message: &str, detail: Option<&ErrorDetail>, at: DateTime<Local>) -> String {
    let time = at.format("%H:%M:%S");
    match detail.and_then(ErrorDetail::message) {
        Some(detail) => format!("{} {} {}", message, detail, time),
        None => format!("{} {}", message, time),
    }
}
