use std::fmt;
use std::time::{Duration, Instant};

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// A transient notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub text: String,
    pub severity: Severity,
    pub duration: Duration,
    pub shown_at: Instant,
}

impl Toast {
    /// Fraction of the display time already elapsed, for the progress strip.
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (now.saturating_duration_since(self.shown_at).as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// Holds the single visible toast. Hiding is driven by the session's
/// `ToastHide` timer so a new toast always restarts the countdown.
#[derive(Debug)]
pub struct Toaster {
    current: Option<Toast>,
    default_duration: Duration,
}

impl Toaster {
    pub fn new(default_duration: Duration) -> Self {
        Self {
            current: None,
            default_duration,
        }
    }

    /// Replace whatever is visible. Returns how long the new toast should stay up.
    pub fn show(&mut self, text: impl Into<String>, severity: Severity, duration: Option<Duration>) -> Duration {
        let duration = duration.unwrap_or(self.default_duration);
        let text = text.into();
        debug!("Toast [{}] {} ({}ms)", severity, text, duration.as_millis());
        self.current = Some(Toast {
            text,
            severity,
            duration,
            shown_at: Instant::now(),
        });
        duration
    }

    pub fn hide(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }
}
