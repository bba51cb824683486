//! Desktop notifications. Best effort only: the caller discards the outcome.

use std::io;
use std::process::{Command, Stdio};
use std::thread;

pub trait Notifier {
    fn notify(&self, title: &str, body: &str) -> io::Result<()>;
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn notify(&self, title: &str, body: &str) -> io::Result<()> {
        (**self).notify(title, body)
    }
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn notify(&self, title: &str, body: &str) -> io::Result<()> {
        (**self).notify(title, body)
    }
}

/// Shows a notification through the freedesktop `notify-send` tool.
///
/// Fire and forget: `notify` returns once the program has started, and a
/// background thread reaps it. Only a failure to start is reported.
#[derive(Debug, Clone)]
pub struct NotifySend {
    program: String,
}

impl NotifySend {
    pub fn new() -> Self {
        Self::with_program("notify-send")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NotifySend {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotifySend {
    fn notify(&self, title: &str, body: &str) -> io::Result<()> {
        // Arguments are passed directly, never through a shell.
        let mut child = Command::new(&self.program)
            .arg(title)
            .arg(body)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        let program = self.program.clone();
        thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                tracing::debug!(program = %program, %status, "notification program failed")
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(program = %program, error = %e, "failed to reap notification program"),
        });
        Ok(())
    }
}

/// Used when notifications are disabled in the config.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _title: &str, _body: &str) -> io::Result<()> {
        Ok(())
    }
}
