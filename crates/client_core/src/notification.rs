//! Transient status banner. One banner at a time; a newer one replaces the
//! current one and restarts the expiry clock for its own kind.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::debug;

pub const SUCCESS_TTL: Duration = Duration::from_millis(3000);
pub const ERROR_TTL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

impl NotificationKind {
    pub const fn ttl(self) -> Duration {
        match self {
            Self::Success => SUCCESS_TTL,
            Self::Error => ERROR_TTL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: NotificationKind,
    pub message: String,
    pub expires_at: Instant,
    generation: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Notification {
    #[default]
    Idle,
    Showing(Banner),
}

impl Notification {
    pub fn banner(&self) -> Option<&Banner> {
        match self {
            Self::Idle => None,
            Self::Showing(banner) => Some(banner),
        }
    }
}

#[derive(Default)]
struct ExpiryTimer {
    handle: Option<JoinHandle<()>>,
}

impl ExpiryTimer {
    fn schedule<F>(&mut self, deadline: Instant, on_expiry: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            on_expiry();
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct NotificationController {
    state: Arc<watch::Sender<Notification>>,
    timer: Mutex<ExpiryTimer>,
    generation: AtomicU64,
}

impl Default for NotificationController {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationController {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Notification::Idle);
        Self {
            state: Arc::new(state),
            timer: Mutex::new(ExpiryTimer::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(NotificationKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(NotificationKind::Error, message);
    }

    /// Must be called from within a tokio runtime.
    pub fn show(&self, kind: NotificationKind, message: impl Into<String>) {
        let message = message.into();
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        timer.cancel();

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let expires_at = Instant::now() + kind.ttl();
        debug!(?kind, %message, generation, "showing notification");
        self.state.send_replace(Notification::Showing(Banner {
            kind,
            message,
            expires_at,
            generation,
        }));

        let state = Arc::clone(&self.state);
        timer.schedule(expires_at, move || {
            // A superseded timer that already fired must not clear the newer banner.
            state.send_if_modified(|current| match current {
                Notification::Showing(banner) if banner.generation == generation => {
                    *current = Notification::Idle;
                    true
                }
                _ => false,
            });
        });
    }

    pub fn current(&self) -> Notification {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Notification> {
        self.state.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/notification_tests.rs"]
mod tests;
