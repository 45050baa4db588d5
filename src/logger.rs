use tracing::{error, info};

use crate::types::{LogEvent, LogLevel};

/// Observer invoked synchronously after every append, with the full history.
pub type LogListener = Box<dyn FnMut(&[LogEvent]) + Send>;

/// Append-only event log for a single pipeline run.
///
/// Every append is echoed to `tracing` at the matching level and then pushed to
/// the listener, if one is installed. Appends never fail; there is no
/// filtering, buffering, or persistence.
#[derive(Default)]
pub struct EventLogger {
    events: Vec<LogEvent>,
    listener: Option<LogListener>,
}

impl EventLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the single observer slot, replacing any previous listener.
    pub fn set_listener(&mut self, listener: LogListener) {
        self.listener = Some(listener);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.append(LogLevel::Info, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.append(LogLevel::Error, message.into());
    }

    /// All events appended so far, in append order.
    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    fn append(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => info!("{message}"),
            LogLevel::Error => error!("{message}"),
        }
        self.events.push(LogEvent { level, message });
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.events);
        }
    }
}
