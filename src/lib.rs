//! # broll - Workflow Conversion and Generation Client
//!
//! **broll** turns node-graph image workflows authored in a visual editor into the
//! flat request format a remote generation service executes, submits them, and
//! polls until the produced images can be copied to local storage.
//!
//! ## Core Workflow
//!
//! 1.  **Load the Workflow**: Parse an editor export with [`editor::EditorGraph::from_json`]
//!     (or let [`workflow::WorkflowDocument`] detect which format a file is in).
//! 2.  **Convert**: A [`converter::Converter`] maps positional widget values to named
//!     inputs through an extensible lookup table and resolves links into node
//!     references. Inputs whose link cannot be resolved are skipped and reported.
//! 3.  **Inject a Prompt**: [`selector::inject_prompt`] writes prompt text into the
//!     first text-encoding node whose title is not "negative".
//! 4.  **Generate**: A [`client::JobClient`] submits the graph, polls the job's
//!     history on a fixed interval with a bounded attempt budget, and copies the
//!     first produced image to the destination.
//!
//! [`batch::BatchRunner`] repeats steps 3 and 4 for every scene prompt parsed from a
//! b-roll markdown file, one job at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use broll::prelude::*;
//! use std::time::Duration;
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let config = GeneratorConfig::default();
//!
//!     // 1. Load the editor workflow
//!     let workflow_json = std::fs::read_to_string("workflow.json")?;
//!     let editor = EditorGraph::from_json(&workflow_json)?;
//!
//!     // 2. Convert it, teaching the converter about a custom node on the way
//!     let converter = Converter::builder()
//!         .with_widget_mapping("MyPromptNode", &["text", "_", "seed"])
//!         .build();
//!     let conversion = converter.convert(&editor);
//!     for warning in &conversion.warnings {
//!         eprintln!("warning: {}", warning);
//!     }
//!
//!     // 3. Collect prompts and generate
//!     let markdown = std::fs::read_to_string("story/broll-prompts.md")?;
//!     let prompts = parse_scene_prompts(&markdown);
//!
//!     let client = JobClient::http(&config)?;
//!     let runner = BatchRunner::new(client, conversion.graph)
//!         .with_inter_job_delay(Duration::from_secs(1));
//!     let summary = runner.run(&prompts, Path::new("story/images"))?;
//!
//!     println!("Generated {}/{} images", summary.generated, summary.total());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod client;
pub mod config;
pub mod converter;
pub mod editor;
pub mod error;
pub mod prelude;
pub mod prompts;
pub mod selector;
pub mod workflow;
