use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A produced image as reported by the service, addressed by filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default = "default_image_kind")]
    pub kind: String,
}

fn default_image_kind() -> String {
    "output".to_string()
}

impl ImageRef {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            subfolder: String::new(),
            kind: default_image_kind(),
        }
    }
}

/// Everything one node produced.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeOutput {
    /// Images with a usable filename. Entries without one are dropped.
    #[serde(default, deserialize_with = "deserialize_images")]
    pub images: Vec<ImageRef>,
    /// Non-image outputs (text, gifs, ...), kept so they count towards completion.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl NodeOutput {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.other.values().all(value_is_empty)
    }
}

fn deserialize_images<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ImageRef>, D::Error> {
    let entries = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<ImageRef>(entry) {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring image output without a filename");
                None
            }
        })
        .collect())
}

fn value_is_empty(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryStatus {
    #[serde(default)]
    pub status_str: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

/// The service's record for one submitted job.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub outputs: BTreeMap<String, NodeOutput>,
    #[serde(default)]
    pub status: Option<HistoryStatus>,
}

impl HistoryEntry {
    /// A job is complete once at least one node reports non-empty outputs.
    pub fn is_complete(&self) -> bool {
        self.outputs.values().any(|output| !output.is_empty())
    }

    /// The service-reported failure, if the job ended in error.
    pub fn failure(&self) -> Option<String> {
        let status = self.status.as_ref()?;
        if status.status_str != "error" {
            return None;
        }
        if status.messages.is_empty() {
            Some("service reported an error".to_string())
        } else {
            Some(status.messages.iter().join("; "))
        }
    }

    /// All produced images, in node id order.
    pub fn images(&self) -> Vec<ImageRef> {
        self.outputs
            .values()
            .flat_map(|output| output.images.iter().cloned())
            .collect()
    }
}
