//! Submits execution graphs to the generation service and polls them to completion.
//!
//! One job is driven at a time and every call blocks. A job's outputs are only
//! retrieved after the history for that exact job id reports non-empty outputs.
use crate::config::GeneratorConfig;
use crate::error::ClientError;
use crate::workflow::ExecutionGraph;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

mod artifact;
mod history;
mod job;
mod service;

pub use artifact::ArtifactSource;
pub use history::{HistoryEntry, HistoryStatus, ImageRef, NodeOutput};
pub use job::{Job, JobStatus, PollOutcome};
pub use service::{GenerationService, HttpService};

/// Drives jobs on a [`GenerationService`].
pub struct JobClient<S: GenerationService> {
    service: S,
    poll_interval: Duration,
    max_poll_attempts: u32,
    artifact_source: ArtifactSource,
}

impl<S: GenerationService> JobClient<S> {
    pub fn new(service: S, poll_interval: Duration, max_poll_attempts: u32) -> Self {
        Self {
            service,
            poll_interval,
            max_poll_attempts,
            artifact_source: ArtifactSource::default(),
        }
    }

    pub fn from_config(service: S, config: &GeneratorConfig) -> Self {
        Self::new(service, config.poll_interval(), config.max_poll_attempts)
            .with_artifact_source(config.artifact_source.clone())
    }

    pub fn with_artifact_source(mut self, artifact_source: ArtifactSource) -> Self {
        self.artifact_source = artifact_source;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn max_poll_attempts(&self) -> u32 {
        self.max_poll_attempts
    }

    /// Submits `graph`. A rejected submission creates no job.
    pub fn submit(&self, graph: ExecutionGraph) -> Result<Job, ClientError> {
        let prompt_id = self.service.submit(&graph)?;
        info!(prompt_id = %prompt_id, "Workflow submitted");
        Ok(Job::new(prompt_id, graph))
    }

    /// Polls the service until `job` reports outputs, fails, or the attempt budget runs out.
    ///
    /// Failed or malformed status queries count as attempts that saw no outputs.
    pub fn poll(&self, job: &mut Job) -> PollOutcome {
        job.status = JobStatus::Running;

        for attempt in 1..=self.max_poll_attempts {
            match self.service.history(&job.id) {
                Ok(Some(entry)) => {
                    if let Some(reason) = entry.failure() {
                        warn!(prompt_id = %job.id, reason = %reason, "Job failed on the service");
                        job.status = JobStatus::Failed(reason.clone());
                        return PollOutcome::Failed(reason);
                    }
                    if entry.is_complete() {
                        debug!(prompt_id = %job.id, attempt, "Job complete");
                        job.status = JobStatus::Complete;
                        return PollOutcome::Complete(entry.images());
                    }
                    debug!(prompt_id = %job.id, attempt, "Job has no outputs yet");
                }
                Ok(None) => debug!(prompt_id = %job.id, attempt, "Job not in history yet"),
                Err(e) => debug!(prompt_id = %job.id, attempt, error = %e, "Status query failed"),
            }

            if attempt < self.max_poll_attempts {
                thread::sleep(self.poll_interval);
            }
        }

        warn!(
            prompt_id = %job.id,
            attempts = self.max_poll_attempts,
            "Timed out waiting for job outputs"
        );
        job.status = JobStatus::TimedOut;
        PollOutcome::TimedOut
    }

    /// Copies the first of `images` verbatim to `destination`.
    pub fn retrieve(&self, images: &[ImageRef], destination: &Path) -> Result<(), ClientError> {
        let Some(image) = images.first() else {
            return Err(ClientError::ArtifactIo {
                path: destination.display().to_string(),
                message: "no artifact to retrieve".to_string(),
            });
        };
        let bytes = self.artifact_source.read(&self.service, image)?;
        artifact::write_artifact(destination, &bytes)?;
        info!(
            filename = %image.filename,
            path = %destination.display(),
            size = bytes.len(),
            "Retrieved artifact"
        );
        Ok(())
    }

    /// Copies every image into `directory` under its service-assigned filename.
    pub fn retrieve_all(
        &self,
        images: &[ImageRef],
        directory: &Path,
    ) -> Result<Vec<PathBuf>, ClientError> {
        images
            .iter()
            .map(|image| {
                let destination = artifact::contained_path(directory, "", &image.filename)?;
                let bytes = self.artifact_source.read(&self.service, image)?;
                artifact::write_artifact(&destination, &bytes)?;
                Ok(destination)
            })
            .collect()
    }

    /// Submits `graph`, waits for it, and writes its first image to `destination`.
    pub fn generate(&self, graph: ExecutionGraph, destination: &Path) -> Result<Job, ClientError> {
        let mut job = self.submit(graph)?;

        match self.poll(&mut job) {
            PollOutcome::Complete(images) => {
                if images.is_empty() {
                    return Err(ClientError::NoArtifacts { prompt_id: job.id });
                }
                self.retrieve(&images, destination)?;
                Ok(job)
            }
            PollOutcome::TimedOut => Err(ClientError::Timeout {
                prompt_id: job.id,
                attempts: self.max_poll_attempts,
            }),
            PollOutcome::Failed(reason) => Err(ClientError::JobFailed {
                prompt_id: job.id,
                reason,
            }),
        }
    }
}

impl JobClient<HttpService> {
    /// An HTTP-backed client configured from `config`.
    pub fn http(config: &GeneratorConfig) -> Result<Self, ClientError> {
        let service = HttpService::new(&config.server_url, config.request_timeout())?;
        Ok(Self::from_config(service, config))
    }
}
