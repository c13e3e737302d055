use crate::client::{GenerationService, JobClient};
use crate::error::BatchError;
use crate::prompts::ScenePrompt;
use crate::selector::{inject_prompt, TEXT_ENCODE_TYPE};
use crate::workflow::ExecutionGraph;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// What happened to one scene of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneOutcome {
    pub prompt: ScenePrompt,
    /// Path of the written image, or why the scene failed.
    pub result: Result<PathBuf, BatchError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub generated: usize,
    pub failed: usize,
    pub outcomes: Vec<SceneOutcome>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.generated + self.failed
    }
}

/// Generates one image per scene prompt, strictly one job at a time.
pub struct BatchRunner<S: GenerationService> {
    client: JobClient<S>,
    template: ExecutionGraph,
    text_encode_type: String,
    inter_job_delay: Duration,
    limit: Option<usize>,
}

impl<S: GenerationService> BatchRunner<S> {
    /// `template` is the converted workflow; each job gets its own copy with the prompt injected.
    pub fn new(client: JobClient<S>, template: ExecutionGraph) -> Self {
        Self {
            client,
            template,
            text_encode_type: TEXT_ENCODE_TYPE.to_string(),
            inter_job_delay: Duration::from_secs(1),
            limit: None,
        }
    }

    pub fn with_text_encode_type(mut self, text_encode_type: impl Into<String>) -> Self {
        self.text_encode_type = text_encode_type.into();
        self
    }

    pub fn with_inter_job_delay(mut self, delay: Duration) -> Self {
        self.inter_job_delay = delay;
        self
    }

    /// Only process the first `limit` prompts.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn client(&self) -> &JobClient<S> {
        &self.client
    }

    /// Runs every prompt, writing `images_dir/episode-<E>-scene-<S>.png`.
    ///
    /// A failing scene is recorded and the batch moves on; only an unusable
    /// output directory aborts the run.
    pub fn run(&self, prompts: &[ScenePrompt], images_dir: &Path) -> Result<BatchSummary, BatchError> {
        fs::create_dir_all(images_dir).map_err(|e| BatchError::OutputDir {
            path: images_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let selected = &prompts[..self.limit.map_or(prompts.len(), |l| l.min(prompts.len()))];
        let mut summary = BatchSummary::default();

        for (index, prompt) in selected.iter().enumerate() {
            if index > 0 && !self.inter_job_delay.is_zero() {
                thread::sleep(self.inter_job_delay);
            }

            info!(
                progress = %format!("{}/{}", index + 1, selected.len()),
                episode = prompt.episode,
                scene = prompt.scene,
                "Generating scene"
            );

            let destination = images_dir.join(prompt.image_file_name());
            let result = self.generate_scene(prompt, &destination);
            match &result {
                Ok(path) => {
                    summary.generated += 1;
                    info!(path = %path.display(), "Scene generated");
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        episode = prompt.episode,
                        scene = prompt.scene,
                        error = %e,
                        "Scene generation failed"
                    );
                }
            }
            summary.outcomes.push(SceneOutcome {
                prompt: prompt.clone(),
                result,
            });
        }

        info!(
            generated = summary.generated,
            failed = summary.failed,
            "Batch finished"
        );
        Ok(summary)
    }

    fn generate_scene(&self, prompt: &ScenePrompt, destination: &Path) -> Result<PathBuf, BatchError> {
        let mut graph = self.template.clone();
        inject_prompt(&mut graph, &self.text_encode_type, &prompt.prompt)?;
        self.client.generate(graph, destination)?;
        Ok(destination.to_path_buf())
    }
}
