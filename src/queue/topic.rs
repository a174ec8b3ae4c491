use std::fmt;

/// Routing key for status pushes about one job: `"<queue_name>/<job_id>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicKey(String);

impl TopicKey {
    pub fn new(queue_name: &str, job_id: &str) -> Self {
        Self(format!("{}/{}", queue_name, job_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
