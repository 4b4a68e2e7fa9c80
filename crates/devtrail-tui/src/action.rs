//! Actions: the only way state changes in the dashboard.

use crate::screen::ScreenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

/// A transient toast shown above the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    SwitchScreen(ScreenId),
    GoBack,
    ToggleHelp,

    /// Bind a grid screen to a resource path and show it.
    OpenGrid {
        screen: ScreenId,
        path: String,
        subtitle: Option<String>,
    },

    Notify(Notification),
    DismissNotification,

    /// Result of a background credential check.
    AuthStatus(bool),
}
