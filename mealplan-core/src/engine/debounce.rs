use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Quiet period after the last edit before the plan is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// A cancellable one-shot deadline.
///
/// The timer does not run anything itself. Whoever drives the engine waits
/// on [`DebounceTimer::expired`] (or polls [`DebounceTimer::is_due`]) and
/// then tells the engine the timer fired.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arms the timer, replacing any pending deadline.
    pub fn schedule(&mut self) -> Instant {
        let deadline = Instant::now() + self.delay;
        self.deadline = Some(deadline);
        deadline
    }

    /// Disarms the timer. Returns whether it was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves at the current deadline; never resolves if disarmed.
    ///
    /// The future does not borrow the timer, so it can sit in a
    /// `tokio::select!` next to code that edits the plan.
    pub fn expired(&self) -> impl Future<Output = ()> + Send + 'static {
        let deadline = self.deadline;
        async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        }
    }
}

impl Default for DebounceTimer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
