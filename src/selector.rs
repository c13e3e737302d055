//! Picks the node that receives caller-supplied prompt text.
//!
//! The choice is a heuristic: among nodes of the text-encoding operation type,
//! the first one (in graph order) whose title does not contain "negative"
//! (case-insensitive) is taken. Untitled nodes count as positive, so a graph
//! with several untitled text-encoding nodes resolves to the first of them.
use crate::editor::{EditorGraph, WidgetValues};
use crate::error::ConversionError;
use crate::workflow::ExecutionGraph;

/// Default text-encoding operation type.
pub const TEXT_ENCODE_TYPE: &str = "CLIPTextEncode";

/// A graph whose text-encoding nodes can be listed and rewritten.
pub trait PromptTarget {
    /// `(node id, title)` for every node of `text_encode_type`, in graph order.
    fn text_nodes(&self, text_encode_type: &str) -> Vec<(String, Option<&str>)>;

    /// Overwrites the literal text of `node_id`. Returns `false` if the node does not exist.
    fn set_prompt_text(&mut self, node_id: &str, text: &str) -> bool;
}

impl PromptTarget for ExecutionGraph {
    fn text_nodes(&self, text_encode_type: &str) -> Vec<(String, Option<&str>)> {
        self.iter()
            .filter(|(_, node)| node.operation_type == text_encode_type)
            .map(|(id, node)| (id.to_string(), node.title()))
            .collect()
    }

    fn set_prompt_text(&mut self, node_id: &str, text: &str) -> bool {
        match self.get_mut(node_id) {
            Some(node) => {
                node.set_literal("text", serde_json::Value::String(text.to_string()));
                true
            }
            None => false,
        }
    }
}

impl PromptTarget for EditorGraph {
    fn text_nodes(&self, text_encode_type: &str) -> Vec<(String, Option<&str>)> {
        self.nodes
            .iter()
            .filter(|node| node.node_type == text_encode_type)
            .map(|node| (node.id.to_string(), node.title.as_deref()))
            .collect()
    }

    fn set_prompt_text(&mut self, node_id: &str, text: &str) -> bool {
        let Ok(id) = node_id.parse::<i64>() else {
            return false;
        };
        match self.node_mut(id) {
            Some(node) => {
                let prompt = serde_json::Value::String(text.to_string());
                match &mut node.widgets_values {
                    Some(WidgetValues::Positional(values)) if !values.is_empty() => {
                        values[0] = prompt;
                    }
                    Some(WidgetValues::Named(values)) => {
                        values.insert("text".to_string(), prompt);
                    }
                    other => *other = Some(WidgetValues::Positional(vec![prompt])),
                }
                true
            }
            None => false,
        }
    }
}

fn is_negative(title: Option<&str>) -> bool {
    title.is_some_and(|t| t.to_lowercase().contains("negative"))
}

/// Returns the id of the first positive text-encoding node of `graph`.
pub fn select_positive_text_node<G: PromptTarget>(
    graph: &G,
    text_encode_type: &str,
) -> Option<String> {
    graph
        .text_nodes(text_encode_type)
        .into_iter()
        .find(|(_, title)| !is_negative(*title))
        .map(|(id, _)| id)
}

/// Writes `text` into the positive text-encoding node and returns that node's id.
pub fn inject_prompt<G: PromptTarget>(
    graph: &mut G,
    text_encode_type: &str,
    text: &str,
) -> Result<String, ConversionError> {
    let node_id = select_positive_text_node(&*graph, text_encode_type).ok_or_else(|| {
        ConversionError::NoPositiveTextNode {
            text_encode_type: text_encode_type.to_string(),
        }
    })?;
    graph.set_prompt_text(&node_id, text);
    tracing::debug!(node_id = %node_id, "Injected prompt text");
    Ok(node_id)
}
