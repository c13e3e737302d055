use super::definition::ExecutionGraph;
use crate::converter::{Conversion, Converter};
use crate::editor::EditorGraph;
use crate::error::ConversionError;

/// A workflow file in either of the two formats the service ecosystem produces.
///
/// Editor exports carry a `nodes` array and a `links` table. Execution exports
/// are an object keyed by node id where every value has a `class_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowDocument {
    Editor(EditorGraph),
    Execution(ExecutionGraph),
}

impl WorkflowDocument {
    /// Detects the format of `json` and parses it accordingly.
    pub fn from_json(json: &str) -> Result<Self, ConversionError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ConversionError::Json(e.to_string()))?;
        let object = value
            .as_object()
            .ok_or(ConversionError::UnrecognizedFormat)?;

        if object.get("nodes").is_some_and(|n| n.is_array()) {
            return EditorGraph::from_json(json).map(WorkflowDocument::Editor);
        }

        let is_execution = !object.is_empty()
            && object
                .values()
                .all(|node| node.get("class_type").is_some_and(|t| t.is_string()));
        if is_execution {
            // Re-parse from text: the intermediate `Value` does not keep document order.
            return serde_json::from_str(json)
                .map(WorkflowDocument::Execution)
                .map_err(|e| ConversionError::Json(e.to_string()));
        }

        Err(ConversionError::UnrecognizedFormat)
    }

    /// Produces an execution graph, converting editor documents with `converter`.
    pub fn into_execution(self, converter: &Converter) -> Conversion {
        match self {
            WorkflowDocument::Editor(editor) => converter.convert(&editor),
            WorkflowDocument::Execution(graph) => Conversion {
                graph,
                warnings: Vec::new(),
            },
        }
    }
}
