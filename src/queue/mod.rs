mod factory;
mod job;
mod poller;
mod registry;
pub(crate) mod runner;
pub mod runners;
mod topic;

pub use factory::{RunnerConstructor, RunnerFactory, RunnerKind};
pub use job::{JobId, JobRequest, JobSnapshot, JobStatus};
pub use poller::{spawn_pollers, StatusPoller};
pub use registry::QueueRegistry;
pub use runner::{JobRunner, RunnerError};
pub use topic::TopicKey;
