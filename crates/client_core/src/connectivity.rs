use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::TaskApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    #[default]
    Checking,
    Connected,
    Disconnected,
}

impl Connectivity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Checking => "Checking Connection...",
            Self::Connected => "Backend Connected",
            Self::Disconnected => "Backend Disconnected",
        }
    }
}

pub struct ConnectivityMonitor {
    state: watch::Sender<Connectivity>,
    probed: AtomicBool,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityMonitor {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Connectivity::Checking);
        Self {
            state,
            probed: AtomicBool::new(false),
        }
    }

    /// Issues the health check once. Later calls return the current state
    /// without touching the network.
    pub async fn probe(&self, api: &dyn TaskApi) -> Connectivity {
        if self.probed.swap(true, Ordering::AcqRel) {
            return self.current();
        }

        let settled = match api.health_check().await {
            Ok(health) => {
                info!(status = %health.status, "backend reachable");
                Connectivity::Connected
            }
            Err(err) if err.is_network_unavailable() => {
                warn!(error = ?err, "backend unreachable");
                Connectivity::Disconnected
            }
            Err(err) => {
                warn!(error = %err, status = ?err.status(), "backend reachable but unhealthy");
                Connectivity::Disconnected
            }
        };
        self.state.send_replace(settled);
        settled
    }

    pub fn current(&self) -> Connectivity {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.state.subscribe()
    }
}
