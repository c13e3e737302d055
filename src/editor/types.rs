use crate::error::ConversionError;
use serde::{Deserialize, Deserializer};

/// Widget values of an editor node.
///
/// Most nodes store them positionally and the meaning of each slot depends on
/// the node type. Some custom nodes store them as an object keyed by widget name.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum WidgetValues {
    Positional(Vec<serde_json::Value>),
    Named(serde_json::Map<String, serde_json::Value>),
}

/// An input slot on an editor node. `link` is set when the slot is wired.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EditorInput {
    pub name: String,
    #[serde(default)]
    pub link: Option<i64>,
}

/// A node as authored in the visual editor.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EditorNode {
    pub id: i64,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub widgets_values: Option<WidgetValues>,
    #[serde(default)]
    pub inputs: Vec<EditorInput>,
}

/// An entry of the editor graph's global link table.
///
/// Serialized either as an array `[id, source_node, source_slot, target_node, target_slot, type]`
/// or as an object with `id`, `origin_id` and `origin_slot`. Only the first three
/// fields are needed to resolve a consuming input.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "RawLink")]
pub struct Link {
    pub id: i64,
    pub source_node_id: i64,
    pub source_output_slot: u32,
}

/// Complete editor-format workflow.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct EditorGraph {
    #[serde(default)]
    pub nodes: Vec<EditorNode>,
    #[serde(default, deserialize_with = "deserialize_links")]
    pub links: Vec<Link>,
}

impl EditorGraph {
    /// Parses an editor-format workflow from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConversionError> {
        serde_json::from_str(json).map_err(|e| ConversionError::Json(e.to_string()))
    }

    pub fn node(&self, id: i64) -> Option<&EditorNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: i64) -> Option<&mut EditorNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }
}

/// The two serialized shapes of a link table entry.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLink {
    /// `[id, source_node, source_slot, target_node, target_slot, type]`
    Array(Vec<serde_json::Value>),
    Object {
        id: i64,
        origin_id: i64,
        origin_slot: u32,
    },
}

impl TryFrom<RawLink> for Link {
    type Error = String;

    fn try_from(raw: RawLink) -> Result<Self, Self::Error> {
        match raw {
            RawLink::Object {
                id,
                origin_id,
                origin_slot,
            } => Ok(Link {
                id,
                source_node_id: origin_id,
                source_output_slot: origin_slot,
            }),
            RawLink::Array(fields) => {
                let field = |i: usize| fields.get(i).and_then(|v| v.as_i64());
                match (field(0), field(1), field(2)) {
                    (Some(id), Some(source_node_id), Some(slot)) => Ok(Link {
                        id,
                        source_node_id,
                        source_output_slot: u32::try_from(slot)
                            .map_err(|_| format!("link {} has invalid output slot {}", id, slot))?,
                    }),
                    _ => Err(format!(
                        "link array must start with [id, source_node, source_slot], got {:?}",
                        fields
                    )),
                }
            }
        }
    }
}

/// Reads the link table, dropping entries that do not parse.
///
/// Inputs wired through a dropped entry are reported during conversion as
/// referring to a missing link.
fn deserialize_links<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Link>, D::Error> {
    let entries = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Link>(entry) {
            Ok(link) => Some(link),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed link table entry");
                None
            }
        })
        .collect())
}
