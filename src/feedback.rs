use crate::model::{format_toast, ErrorDetail, NotificationLevel};
use chrono::Local;
use parking_lot::Mutex;

/// Where user-facing success and error messages go.
pub trait FeedbackReporter: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str, detail: &ErrorDetail);
}

/// Writes notifications to the log, formatted like the console's toasts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl FeedbackReporter for LogReporter {
    fn notify_success(&self, message: &str) {
        log::info!("{}", format_toast(message, None, Local::now()));
    }

    fn notify_error(&self, message: &str, detail: &ErrorDetail) {
        log::error!("{}", format_toast(message, Some(detail), Local::now()));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reported {
    pub level: NotificationLevel,
    pub message: String,
    pub detail: Option<ErrorDetail>,
}

/// Keeps every notification in arrival order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reported: Mutex<Vec<Reported>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reported(&self) -> Vec<Reported> {
        self.reported.lock().clone()
    }

    pub fn errors(&self) -> Vec<Reported> {
        self.reported
            .lock()
            .iter()
            .filter(|r| r.level == NotificationLevel::Error)
            .cloned()
            .collect()
    }
}

impl FeedbackReporter for RecordingReporter {
    fn notify_success(&self, message: &str) {
        self.reported.lock().push(Reported {
            level: NotificationLevel::Success,
            message: message.to_string(),
            detail: None,
        });
    }

    fn notify_error(&self, message: &str, detail: &ErrorDetail) {
        self.reported.lock().push(Reported {
            level: NotificationLevel::Error,
            message: message.to_string(),
            detail: Some(detail.clone()),
        });
    }
}
