use thiserror::Error;

/// Errors that can occur while loading or converting a workflow document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Failed to parse workflow JSON: {0}")]
    Json(String),

    #[error("Workflow document is neither an editor graph nor an execution graph")]
    UnrecognizedFormat,

    #[error("No '{text_encode_type}' node without a negative title was found in the workflow")]
    NoPositiveTextNode { text_encode_type: String },
}

/// Problems found during conversion that only affect a single input.
///
/// The offending input is left out of the execution graph and conversion
/// carries on with the remaining inputs and nodes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionWarning {
    #[error("Input '{input}' of node '{node_id}' refers to link {link_id}, which is not in the link table")]
    MissingLink {
        node_id: String,
        input: String,
        link_id: i64,
    },

    #[error(
        "Input '{input}' of node '{node_id}' is linked to node '{source_node_id}', which is not in the graph"
    )]
    DanglingSource {
        node_id: String,
        input: String,
        source_node_id: String,
    },

    #[error("Node id '{node_id}' appears more than once; only the first occurrence was converted")]
    DuplicateNode { node_id: String },
}

/// Errors raised while talking to the generation service or handling its artifacts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Submission rejected with status {status}: {body}")]
    Submission { status: u16, body: String },

    #[error("Request to '{url}' failed: {message}")]
    Transport { url: String, message: String },

    #[error("Unexpected status {status} from '{url}': {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response from generation service: {0}")]
    InvalidResponse(String),

    #[error("Job '{prompt_id}' did not complete within {attempts} polling attempts")]
    Timeout { prompt_id: String, attempts: u32 },

    #[error("Job '{prompt_id}' failed: {reason}")]
    JobFailed { prompt_id: String, reason: String },

    #[error("Job '{prompt_id}' completed without producing any images")]
    NoArtifacts { prompt_id: String },

    #[error("Artifact I/O error at '{path}': {message}")]
    ArtifactIo { path: String, message: String },
}

/// Errors that can occur while loading generator configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors surfaced by the batch driver for a whole run or a single scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    #[error("Could not read prompt file '{path}': {message}")]
    Prompts { path: String, message: String },

    #[error("Could not prepare output directory '{path}': {message}")]
    OutputDir { path: String, message: String },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Client(#[from] ClientError),
}
