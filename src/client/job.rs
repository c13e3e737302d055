use super::history::ImageRef;
use crate::workflow::ExecutionGraph;
use std::fmt;

/// Lifecycle of a submitted job. Only polling moves a job between states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Failed(String),
    TimedOut,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Complete => write!(f, "complete"),
            JobStatus::Failed(reason) => write!(f, "failed: {}", reason),
            JobStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// A job accepted by the generation service.
#[derive(Debug, Clone)]
pub struct Job {
    /// Opaque identifier issued by the service.
    pub id: String,
    pub submitted_graph: ExecutionGraph,
    pub status: JobStatus,
}

impl Job {
    pub fn new(id: impl Into<String>, submitted_graph: ExecutionGraph) -> Self {
        Self {
            id: id.into(),
            submitted_graph,
            status: JobStatus::Pending,
        }
    }
}

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The job produced outputs. Holds every image it reported, possibly none.
    Complete(Vec<ImageRef>),
    /// The attempt budget ran out before any outputs appeared.
    TimedOut,
    /// The service reported the job as failed.
    Failed(String),
}
