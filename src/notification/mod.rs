//! Desktop notification support.
//!
//! Notifications go through `notify-rust`, which talks to the freedesktop
//! notification server on Linux/BSD and Notification Center on macOS.
//! Everything here is best-effort: a missing notification server is logged
//! and ignored.
//!
//! # Example
//!
//! ```rust,no_run
//! use pomofocus::notification::{completion_content, DesktopNotifier, Notifier};
//! use pomofocus::types::Mode;
//!
//! let notifier = DesktopNotifier::new(true);
//! if notifier.is_permitted() {
//!     let _ = notifier.raise(&completion_content(Mode::Work, Mode::ShortBreak));
//! }
//! ```

mod content;
pub mod error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

pub use self::content::{completion_content, NotificationContent};
pub use self::error::NotificationError;

/// Application name shown by the notification server.
pub const APP_NAME: &str = "pomofocus";

/// A capability that can raise desktop notifications.
pub trait Notifier: Send {
    /// Returns true if the user allowed notifications.
    fn is_permitted(&self) -> bool;

    /// Raises a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if notifications are not permitted or delivery fails.
    fn raise(&self, content: &NotificationContent) -> Result<(), NotificationError>;
}

impl<T: Notifier + Sync + ?Sized> Notifier for Arc<T> {
    fn is_permitted(&self) -> bool {
        (**self).is_permitted()
    }

    fn raise(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        (**self).raise(content)
    }
}

/// Notifier backed by the platform notification server.
#[derive(Debug, Clone, Copy)]
pub struct DesktopNotifier {
    permitted: bool,
}

impl DesktopNotifier {
    /// Creates a notifier. `permitted` is the user's consent; without it
    /// nothing is ever sent.
    #[must_use]
    pub fn new(permitted: bool) -> Self {
        Self { permitted }
    }
}

impl Notifier for DesktopNotifier {
    fn is_permitted(&self) -> bool {
        self.permitted
    }

    fn raise(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        if !self.permitted {
            return Err(NotificationError::PermissionDenied);
        }

        notify_rust::Notification::new()
            .appname(APP_NAME)
            .summary(&content.title)
            .body(&content.body)
            .show()
            .map(|_| ())
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        debug!(title = %content.title, "Notification raised");
        Ok(())
    }
}

/// Mock notifier for testing.
#[derive(Debug)]
pub struct MockNotifier {
    raised: Mutex<Vec<NotificationContent>>,
    permitted: AtomicBool,
    should_fail: AtomicBool,
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            raised: Mutex::new(Vec::new()),
            permitted: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_permitted(&self, permitted: bool) {
        self.permitted.store(permitted, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get_notifications(&self) -> Vec<NotificationContent> {
        self.recorded().clone()
    }

    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.recorded().len()
    }

    fn recorded(&self) -> std::sync::MutexGuard<'_, Vec<NotificationContent>> {
        self.raised
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for MockNotifier {
    fn is_permitted(&self) -> bool {
        self.permitted.load(Ordering::SeqCst)
    }

    fn raise(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        if !self.is_permitted() {
            return Err(NotificationError::PermissionDenied);
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("Mock failure".to_string()));
        }
        self.recorded().push(content.clone());
        Ok(())
    }
}
