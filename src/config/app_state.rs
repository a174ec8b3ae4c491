use std::sync::Arc;

use crate::config::PathsConfig;
use crate::queue::QueueRegistry;
use crate::services::{FileService, NotificationHub, PluginService, SubscriptionService};

/// Everything a request handler needs, built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// Queues and their runners, fixed at startup
    pub registry: Arc<QueueRegistry>,
    /// Join/leave/publish of job status pushes
    pub subscriptions: SubscriptionService,
    pub files: Arc<FileService>,
    pub plugins: Arc<PluginService>,
    /// Default directories offered to clients
    pub paths: Arc<PathsConfig>,
}

impl AppState {
    pub fn new(
        registry: Arc<QueueRegistry>,
        subscriptions: SubscriptionService,
        files: FileService,
        plugins: PluginService,
        paths: PathsConfig,
    ) -> Self {
        Self {
            registry,
            subscriptions,
            files: Arc::new(files),
            plugins: Arc::new(plugins),
            paths: Arc::new(paths),
        }
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        self.subscriptions.hub()
    }
}
