//! Common test utilities: workflow fixtures and a scripted generation service.
use ahash::AHashMap;
use broll::prelude::*;
use std::cell::{Cell, RefCell};

/// A text-to-image workflow as exported by the visual editor.
///
/// Nodes: 4 checkpoint loader, 5 empty latent, 6 positive prompt, 7 negative
/// prompt, 3 sampler, 8 VAE decode, 9 save image.
#[allow(dead_code)]
pub const EDITOR_WORKFLOW_JSON: &str = r#"{
  "last_node_id": 9,
  "last_link_id": 9,
  "nodes": [
    {
      "id": 7, "type": "CLIPTextEncode", "pos": [413, 389], "size": [425, 180],
      "title": "CLIP Text Encode (Negative)",
      "inputs": [{"name": "clip", "type": "CLIP", "link": 5}],
      "outputs": [{"name": "CONDITIONING", "type": "CONDITIONING", "links": [6], "slot_index": 0}],
      "widgets_values": ["blurry, low quality, text, watermark"]
    },
    {
      "id": 6, "type": "CLIPTextEncode", "pos": [415, 186], "size": [422, 164],
      "title": "CLIP Text Encode (Positive)",
      "inputs": [{"name": "clip", "type": "CLIP", "link": 3}],
      "outputs": [{"name": "CONDITIONING", "type": "CONDITIONING", "links": [4], "slot_index": 0}],
      "widgets_values": ["a beautiful landscape"]
    },
    {
      "id": 5, "type": "EmptyLatentImage", "pos": [473, 609],
      "inputs": [],
      "widgets_values": [1024, 1024, 1]
    },
    {
      "id": 3, "type": "KSampler", "pos": [863, 186],
      "inputs": [
        {"name": "model", "type": "MODEL", "link": 1},
        {"name": "positive", "type": "CONDITIONING", "link": 4},
        {"name": "negative", "type": "CONDITIONING", "link": 6},
        {"name": "latent_image", "type": "LATENT", "link": 2}
      ],
      "widgets_values": [123456, "randomize", 20, 8, "euler", "normal", 1]
    },
    {
      "id": 8, "type": "VAEDecode", "pos": [1209, 188],
      "inputs": [
        {"name": "samples", "type": "LATENT", "link": 7},
        {"name": "vae", "type": "VAE", "link": 8}
      ]
    },
    {
      "id": 9, "type": "SaveImage", "pos": [1451, 189],
      "inputs": [{"name": "images", "type": "IMAGE", "link": 9}],
      "widgets_values": ["broll"]
    },
    {
      "id": 4, "type": "CheckpointLoaderSimple", "pos": [26, 474],
      "title": "Load Checkpoint",
      "outputs": [
        {"name": "MODEL", "type": "MODEL", "links": [1]},
        {"name": "CLIP", "type": "CLIP", "links": [3, 5]},
        {"name": "VAE", "type": "VAE", "links": [8]}
      ],
      "widgets_values": ["flux1-dev-fp8.safetensors"]
    }
  ],
  "links": [
    [1, 4, 0, 3, 0, "MODEL"],
    [2, 5, 0, 3, 3, "LATENT"],
    [3, 4, 1, 6, 0, "CLIP"],
    [4, 6, 0, 3, 1, "CONDITIONING"],
    [5, 4, 1, 7, 0, "CLIP"],
    [6, 7, 0, 3, 2, "CONDITIONING"],
    [7, 3, 0, 8, 0, "LATENT"],
    [8, 4, 2, 8, 1, "VAE"],
    [9, 8, 0, 9, 0, "IMAGE"]
  ],
  "groups": [],
  "config": {},
  "extra": {},
  "version": 0.4
}"#;

#[allow(dead_code)]
pub fn editor_workflow() -> EditorGraph {
    EditorGraph::from_json(EDITOR_WORKFLOW_JSON).expect("fixture workflow parses")
}

#[allow(dead_code)]
pub fn converted_workflow() -> ExecutionGraph {
    convert(&editor_workflow())
}

/// Builds an editor node of `node_type` with positional widgets and linked inputs.
#[allow(dead_code)]
pub fn editor_node(
    id: i64,
    node_type: &str,
    title: Option<&str>,
    widgets: Vec<serde_json::Value>,
    inputs: &[(&str, Option<i64>)],
) -> EditorNode {
    EditorNode {
        id,
        node_type: node_type.to_string(),
        title: title.map(str::to_string),
        widgets_values: if widgets.is_empty() {
            None
        } else {
            Some(WidgetValues::Positional(widgets))
        },
        inputs: inputs
            .iter()
            .map(|(name, link)| EditorInput {
                name: name.to_string(),
                link: *link,
            })
            .collect(),
    }
}

#[allow(dead_code)]
pub fn link(id: i64, source_node_id: i64, source_output_slot: u32) -> Link {
    Link {
        id,
        source_node_id,
        source_output_slot,
    }
}

/// A history entry reporting one saved image from node 9.
#[allow(dead_code)]
pub fn completed_entry(filename: &str) -> HistoryEntry {
    serde_json::from_value(serde_json::json!({
        "prompt": [0, "ignored", {}, {}, ["9"]],
        "outputs": {
            "9": {"images": [{"filename": filename, "subfolder": "", "type": "output"}]}
        },
        "status": {"status_str": "success", "completed": true, "messages": []}
    }))
    .expect("valid history entry")
}

/// A history entry for a job the service has accepted but not finished.
#[allow(dead_code)]
pub fn pending_entry() -> HistoryEntry {
    serde_json::from_value(serde_json::json!({
        "outputs": {},
        "status": {"status_str": "running", "completed": false, "messages": []}
    }))
    .expect("valid history entry")
}

#[allow(dead_code)]
pub fn failed_entry(message: &str) -> HistoryEntry {
    serde_json::from_value(serde_json::json!({
        "outputs": {},
        "status": {
            "status_str": "error",
            "completed": false,
            "messages": [["execution_error", {"exception_message": message}]]
        }
    }))
    .expect("valid history entry")
}

/// How the scripted service answers status queries.
#[allow(dead_code)]
#[derive(Clone)]
pub enum Script {
    /// Outputs appear on the given attempt (1-based) for every job.
    CompleteOnAttempt(u32),
    /// The job never reports outputs.
    NeverComplete,
    /// The service reports the job as failed.
    Fail(String),
    /// Outputs appear at once but contain no images.
    CompleteWithoutImages,
    /// Status queries fail with a transport error this many times, then the job completes.
    UnreachableThenComplete(u32),
}

/// An in-memory generation service that records every call.
#[allow(dead_code)]
pub struct FakeService {
    pub script: Script,
    /// Submissions whose positive prompt contains this text are rejected with status 400.
    pub reject_prompt_containing: Option<String>,
    pub image_bytes: Vec<u8>,
    pub submissions: RefCell<Vec<ExecutionGraph>>,
    pub history_queries: RefCell<Vec<String>>,
    pub fetches: Cell<u32>,
    attempts: RefCell<AHashMap<String, u32>>,
}

#[allow(dead_code)]
impl FakeService {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            reject_prompt_containing: None,
            image_bytes: b"\x89PNG\r\n\x1a\nfake image".to_vec(),
            submissions: RefCell::new(Vec::new()),
            history_queries: RefCell::new(Vec::new()),
            fetches: Cell::new(0),
            attempts: RefCell::new(AHashMap::new()),
        }
    }

    pub fn rejecting(mut self, text: &str) -> Self {
        self.reject_prompt_containing = Some(text.to_string());
        self
    }

    pub fn history_calls(&self) -> usize {
        self.history_queries.borrow().len()
    }
}

impl GenerationService for FakeService {
    fn submit(&self, graph: &ExecutionGraph) -> std::result::Result<String, ClientError> {
        if let Some(needle) = &self.reject_prompt_containing {
            let rejected = graph.iter().any(|(_, node)| {
                node.inputs
                    .get("text")
                    .and_then(|v| v.as_literal())
                    .and_then(|v| v.as_str())
                    .is_some_and(|text| text.contains(needle.as_str()))
            });
            if rejected {
                return Err(ClientError::Submission {
                    status: 400,
                    body: r#"{"error": {"type": "prompt_outputs_failed_validation"}}"#.to_string(),
                });
            }
        }

        let mut submissions = self.submissions.borrow_mut();
        submissions.push(graph.clone());
        Ok(format!("prompt-{}", submissions.len()))
    }

    fn history(&self, prompt_id: &str) -> std::result::Result<Option<HistoryEntry>, ClientError> {
        self.history_queries.borrow_mut().push(prompt_id.to_string());

        let known = self.submissions.borrow().len();
        let is_known = prompt_id
            .strip_prefix("prompt-")
            .and_then(|n| n.parse::<usize>().ok())
            .is_some_and(|n| n >= 1 && n <= known);
        if !is_known {
            return Ok(None);
        }

        let mut attempts = self.attempts.borrow_mut();
        let attempt = attempts.entry(prompt_id.to_string()).or_insert(0);
        *attempt += 1;

        if let Script::UnreachableThenComplete(failures) = &self.script {
            if *attempt <= *failures {
                return Err(ClientError::Transport {
                    url: format!("http://fake/history/{}", prompt_id),
                    message: "connection refused".to_string(),
                });
            }
        }

        let entry = match &self.script {
            Script::CompleteOnAttempt(n) if *attempt >= *n => {
                completed_entry(&format!("{}_00001_.png", prompt_id))
            }
            Script::UnreachableThenComplete(_) => completed_entry(&format!("{}_00001_.png", prompt_id)),
            Script::CompleteOnAttempt(_) | Script::NeverComplete => pending_entry(),
            Script::Fail(message) => failed_entry(message),
            Script::CompleteWithoutImages => serde_json::from_value(serde_json::json!({
                "outputs": {"12": {"text": ["caption only"]}}
            }))
            .expect("valid history entry"),
        };
        Ok(Some(entry))
    }

    fn fetch_artifact(&self, _image: &ImageRef) -> std::result::Result<Vec<u8>, ClientError> {
        self.fetches.set(self.fetches.get() + 1);
        Ok(self.image_bytes.clone())
    }
}

/// A client over `service` that polls without sleeping.
#[allow(dead_code)]
pub fn fast_client(service: FakeService, max_attempts: u32) -> JobClient<FakeService> {
    JobClient::new(service, std::time::Duration::ZERO, max_attempts)
}
