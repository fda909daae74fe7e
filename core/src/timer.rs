use std::time::{Duration, Instant};

/// Timers owned by a watch session. Each kind has at most one pending deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Waiting for the player component to come up.
    ComponentWait,
    /// Waiting for playback to actually start once the component is up.
    Startup,
    /// Auto-hide of the visible toast.
    ToastHide,
    /// Same-context navigation after an external launch may have been blocked.
    LaunchFallback,
}

#[derive(Debug, Default)]
pub struct Timers {
    entries: Vec<(TimerKind, Instant)>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire `after` from now, replacing any pending deadline of that kind.
    pub fn schedule(&mut self, kind: TimerKind, after: Duration) {
        self.schedule_at(kind, Instant::now() + after);
    }

    pub fn schedule_at(&mut self, kind: TimerKind, deadline: Instant) {
        self.cancel(kind);
        self.entries.push((kind, deadline));
    }

    /// Returns true if a pending timer was removed.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| *k != kind);
        self.entries.len() != before
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.entries.iter().any(|(k, _)| *k == kind)
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.entries.iter().find(|(k, _)| *k == kind).map(|(_, at)| *at)
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut due: Vec<(TimerKind, Instant)> = Vec::new();
        self.entries.retain(|entry| {
            if entry.1 <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(_, at)| *at);
        due.into_iter().map(|(kind, _)| kind).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
