use std::cell::RefCell;
use std::fmt;

use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Connected {
        version: Option<String>,
    },
    /// The server could not be reached at all.
    Disconnected(String),
    /// The server answered with an error.
    Error(String),
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Unknown => write!(f, "unknown"),
            ConnectionStatus::Connected { version: Some(v) } => write!(f, "connected (v{})", v),
            ConnectionStatus::Connected { version: None } => write!(f, "connected"),
            ConnectionStatus::Disconnected(reason) => write!(f, "disconnected: {}", reason),
            ConnectionStatus::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Short-lived, non-blocking status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

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
}

pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

/// Sends notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Error => error!("{}", notification.message),
            _ => info!("{}", notification.message),
        }
    }
}

/// Keeps every notification, newest last.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    seen: RefCell<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.borrow().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.seen.borrow().last().cloned()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: &Notification) {
        self.seen.borrow_mut().push(notification.clone());
    }
}

/// The persistent connection indicator.
#[derive(Debug, Default)]
pub struct StatusBoard {
    connection: RefCell<ConnectionStatus>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection.borrow().clone()
    }

    pub fn set_connection(&self, status: ConnectionStatus) {
        let mut current = self.connection.borrow_mut();
        if *current != status {
            info!(status = %status, "connection status changed");
            *current = status;
        }
    }

    /// Marks the server as reachable without losing a known version.
    pub fn mark_connected(&self) {
        let already = matches!(*self.connection.borrow(), ConnectionStatus::Connected { .. });
        if !already {
            self.set_connection(ConnectionStatus::Connected { version: None });
        }
    }
}
