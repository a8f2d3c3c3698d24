//! Toast notifications.
//!
//! Every `show` call renders one independent banner; banners never replace
//! each other. The terminal notifier prints to stderr so toasts do not mix
//! with command output on stdout.

use std::fmt;
use std::io::Write;
use std::time::Duration;

/// Default time a toast stays on screen.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ToastKind::Info => "info",
            ToastKind::Success => "ok",
            ToastKind::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
    pub duration: Duration,
}

impl Toast {
    pub fn new(title: impl Into<String>, message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            duration: DEFAULT_TOAST_DURATION,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, ToastKind::Info)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, ToastKind::Success)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, ToastKind::Error)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.title, self.message)
    }
}

/// Sink for toasts. Implementations must tolerate calls from several tasks at once.
pub trait Notifier: Send + Sync {
    fn show(&self, toast: Toast);
}

/// Prints each toast as one line on stderr. Terminal lines do not expire, so
/// `Toast::duration` is not used here.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn show(&self, toast: Toast) {
        // One locked write per toast keeps concurrent banners on separate lines.
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", toast);
    }
}
