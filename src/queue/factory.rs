use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::runner::{JobRunner, RunnerError};
use super::runners::{LocalRunner, SimulatedRunner};

/// Runner types that can be named in the queue configuration.
///
/// Unknown names are rejected when the configuration is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerKind {
    Local,
    Simulated,
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerKind::Local => write!(f, "local"),
            RunnerKind::Simulated => write!(f, "simulated"),
        }
    }
}

pub type RunnerConstructor = fn(&Value) -> Result<Arc<dyn JobRunner>, RunnerError>;

/// Maps a runner kind to the function that builds it from its parameters.
pub struct RunnerFactory {
    constructors: HashMap<RunnerKind, RunnerConstructor>,
}

impl RunnerFactory {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Factory with every runner shipped in this crate registered.
    pub fn with_builtin() -> Self {
        let mut factory = Self::new();
        factory.register(RunnerKind::Local, |params| {
            Ok(Arc::new(LocalRunner::from_parameters(params)?) as Arc<dyn JobRunner>)
        });
        factory.register(RunnerKind::Simulated, |params| {
            Ok(Arc::new(SimulatedRunner::from_parameters(params)?) as Arc<dyn JobRunner>)
        });
        factory
    }

    pub fn register(&mut self, kind: RunnerKind, constructor: RunnerConstructor) {
        self.constructors.insert(kind, constructor);
    }

    pub fn build(&self, kind: RunnerKind, parameters: &Value) -> Result<Arc<dyn JobRunner>, RunnerError> {
        let constructor = self
            .constructors
            .get(&kind)
            .ok_or_else(|| RunnerError::InvalidInput(format!("runner type '{}' is not registered", kind)))?;

        constructor(parameters)
    }
}

impl Default for RunnerFactory {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Parse runner parameters, treating a missing table as an empty one.
pub(crate) fn parse_parameters<T>(parameters: &Value) -> Result<T, RunnerError>
where
    T: for<'de> Deserialize<'de>,
{
    let parameters = match parameters {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };

    serde_json::from_value(parameters)
        .map_err(|e| RunnerError::InvalidInput(format!("invalid runner parameters: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_runner_kind_is_rejected() {
        let parsed: Result<RunnerKind, _> = serde_json::from_value(json!("cluster"));
        assert!(parsed.is_err());
        assert_eq!(serde_json::from_value::<RunnerKind>(json!("local")).unwrap(), RunnerKind::Local);
    }

    #[tokio::test]
    async fn builds_builtin_runners() {
        let factory = RunnerFactory::with_builtin();

        let runner = factory.build(RunnerKind::Simulated, &Value::Null).unwrap();
        assert!(runner.list_job_ids().await.unwrap().is_empty());

        let runner = factory
            .build(RunnerKind::Local, &json!({ "program": "/bin/true" }))
            .unwrap();
        assert!(runner.list_job_ids().await.unwrap().is_empty());
    }

    #[test]
    fn local_runner_requires_a_program() {
        let factory = RunnerFactory::with_builtin();
        let err = factory.build(RunnerKind::Local, &json!({})).err().unwrap();
        assert!(matches!(err, RunnerError::InvalidInput(_)));
    }

    #[test]
    fn unregistered_kind_fails_to_build() {
        let factory = RunnerFactory::new();
        assert!(factory.build(RunnerKind::Simulated, &Value::Null).is_err());
    }
}
