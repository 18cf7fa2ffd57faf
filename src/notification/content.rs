//! Notification content for interval completion.

use serde::{Deserialize, Serialize};

use crate::types::Mode;

/// Title and body of a desktop notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

impl NotificationContent {
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Builds the notification shown when `completed` ends and `next` begins.
#[must_use]
pub fn completion_content(completed: Mode, next: Mode) -> NotificationContent {
    match completed {
        Mode::Work => {
            let body = if next == Mode::LongBreak {
                "Time for a long break."
            } else {
                "Time for a short break."
            };
            NotificationContent::new("Focus session done", body)
        }
        Mode::ShortBreak => NotificationContent::new("Break is over", "Ready to focus again?"),
        Mode::LongBreak => NotificationContent::new("Long break is over", "Ready to focus again?"),
    }
}
