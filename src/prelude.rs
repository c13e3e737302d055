//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the broll crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use broll::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let workflow_json = std::fs::read_to_string("path/to/workflow.json")?;
//! let editor = EditorGraph::from_json(&workflow_json)?;
//! let mut graph = convert(&editor);
//! inject_prompt(&mut graph, TEXT_ENCODE_TYPE, "a lighthouse at dusk")?;
//!
//! let config = GeneratorConfig::default();
//! let client = JobClient::http(&config)?;
//! let job = client.generate(graph, Path::new("out/lighthouse.png"))?;
//! println!("Job {} is {}", job.id, job.status);
//! # Ok(())
//! # }
//! ```

// Conversion
pub use crate::converter::{convert, Conversion, Converter, WidgetMapping, WidgetRegistry};
pub use crate::editor::{EditorGraph, EditorInput, EditorNode, Link, WidgetValues};
pub use crate::selector::{inject_prompt, select_positive_text_node, PromptTarget, TEXT_ENCODE_TYPE};
pub use crate::workflow::{ExecutionGraph, ExecutionNode, InputValue, NodeMeta, NodeRef, WorkflowDocument};

// Job submission and polling
pub use crate::client::{
    ArtifactSource, GenerationService, HistoryEntry, HttpService, ImageRef, Job, JobClient,
    JobStatus, PollOutcome,
};

// Batch driving
pub use crate::batch::{BatchRunner, BatchSummary, SceneOutcome};
pub use crate::config::GeneratorConfig;
pub use crate::prompts::{parse_scene_prompts, ScenePrompt};

// Error types
pub use crate::error::{BatchError, ClientError, ConfigError, ConversionError, ConversionWarning};

pub use std::path::Path;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
