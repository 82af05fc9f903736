//! Notifier adapters.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::domain::ports::{Notification, NotificationLevel, Notifier};

/// Writes one line per notification to a terminal stream.
#[derive(Debug)]
pub struct TerminalNotifier<W> {
    sink: Mutex<W>,
}

impl TerminalNotifier<io::Stderr> {
    /// Notifier writing to standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> TerminalNotifier<W> {
    /// Notifier writing to `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Recover the sink.
    pub fn into_inner(self) -> W {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

fn label(level: NotificationLevel) -> &'static str {
    match level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Warning => "warning",
        NotificationLevel::Error => "error",
    }
}

impl<W: Write + Send> Notifier for TerminalNotifier<W> {
    fn notify(&self, notification: &Notification) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let written = writeln!(
            sink,
            "{}: {}",
            label(notification.level),
            notification.message
        );
        if let Err(err) = written {
            warn!(error = %err, "failed to write notification");
        }
    }
}
