use std::time::Duration;

/// Delay ladder for polling the chain tip: start at the base, double after
/// every empty poll, stop at the cap, reset on progress.
pub(crate) struct Backoff {
    base: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    pub(crate) fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            next: base,
        }
    }

    /// The delay to sleep now. The following one is twice as long, up to the
    /// cap.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }

    pub(crate) fn reset(&mut self) {
        self.next = self.base;
    }
}
