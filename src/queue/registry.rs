use std::collections::HashMap;
use std::sync::Arc;

use crate::config::QueueDefinition;
use crate::interceptors::AppError;

use super::factory::RunnerFactory;
use super::runner::JobRunner;

struct Queue {
    name: String,
    runner: Arc<dyn JobRunner>,
}

/// The named queues of this server, fixed at startup.
///
/// Nothing is added or removed after construction, so the registry is shared
/// behind an `Arc` without locking.
pub struct QueueRegistry {
    queues: Vec<Queue>,
    index: HashMap<String, usize>,
}

impl QueueRegistry {
    /// Build one runner per queue definition, in configuration order.
    pub fn from_config(definitions: &[QueueDefinition], factory: &RunnerFactory) -> Result<Self, AppError> {
        let mut runners = Vec::with_capacity(definitions.len());

        for definition in definitions {
            let runner = factory.build(definition.runner, &definition.parameters).map_err(|e| {
                AppError::ConfigError(format!("queue '{}': {}", definition.name, e))
            })?;

            tracing::info!(queue = %definition.name, runner = %definition.runner, "Queue runner created");
            runners.push((definition.name.clone(), runner));
        }

        Self::from_runners(runners)
    }

    /// Build a registry from ready-made runners.
    pub fn from_runners<I>(runners: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (String, Arc<dyn JobRunner>)>,
    {
        let mut queues = Vec::new();
        let mut index = HashMap::new();

        for (name, runner) in runners {
            if name.trim().is_empty() {
                return Err(AppError::ConfigError("queue name must not be empty".to_string()));
            }
            if index.contains_key(&name) {
                return Err(AppError::ConfigError(format!("queue '{}' is defined more than once", name)));
            }

            index.insert(name.clone(), queues.len());
            queues.push(Queue { name, runner });
        }

        Ok(Self { queues, index })
    }

    pub fn resolve(&self, queue_name: &str) -> Result<Arc<dyn JobRunner>, AppError> {
        self.index
            .get(queue_name)
            .map(|&i| self.queues[i].runner.clone())
            .ok_or_else(|| AppError::NotFound(format!("Queue '{}' does not exist", queue_name)))
    }

    pub fn all_queues(&self) -> impl Iterator<Item = (&str, &Arc<dyn JobRunner>)> {
        self.queues.iter().map(|q| (q.name.as_str(), &q.runner))
    }

    pub fn names(&self) -> Vec<String> {
        self.queues.iter().map(|q| q.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Close every runner. Failures are logged and do not stop the rest.
    pub async fn close_all(&self) {
        for queue in &self.queues {
            match queue.runner.close().await {
                Ok(()) => tracing::info!(queue = %queue.name, "Queue runner closed"),
                Err(e) => tracing::warn!(queue = %queue.name, "Failed to close queue runner: {}", e),
            }
        }
    }
}
