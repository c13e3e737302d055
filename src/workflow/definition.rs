use ahash::AHashMap;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A reference to one output slot of another node in the same execution graph.
///
/// Serialized in the service's wire form `["<node id>", <slot>]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, u32)", into = "(String, u32)")]
pub struct NodeRef {
    pub source_node_id: String,
    pub source_output_slot: u32,
}

impl NodeRef {
    pub fn new(source_node_id: impl Into<String>, source_output_slot: u32) -> Self {
        Self {
            source_node_id: source_node_id.into(),
            source_output_slot,
        }
    }
}

impl From<(String, u32)> for NodeRef {
    fn from((source_node_id, source_output_slot): (String, u32)) -> Self {
        Self {
            source_node_id,
            source_output_slot,
        }
    }
}

impl From<NodeRef> for (String, u32) {
    fn from(node_ref: NodeRef) -> Self {
        (node_ref.source_node_id, node_ref.source_output_slot)
    }
}

/// A resolved node input: either a literal value or a reference to another node's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Reference(NodeRef),
    Literal(serde_json::Value),
}

impl InputValue {
    pub fn as_reference(&self) -> Option<&NodeRef> {
        match self {
            InputValue::Reference(node_ref) => Some(node_ref),
            InputValue::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&serde_json::Value> {
        match self {
            InputValue::Literal(value) => Some(value),
            InputValue::Reference(_) => None,
        }
    }
}

/// Non-functional annotation carried alongside a node. Ignored by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(default)]
    pub title: String,
}

/// A single operation in the execution graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionNode {
    #[serde(rename = "class_type")]
    pub operation_type: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, InputValue>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<NodeMeta>,
}

impl ExecutionNode {
    pub fn new(operation_type: impl Into<String>) -> Self {
        Self {
            operation_type: operation_type.into(),
            inputs: BTreeMap::new(),
            meta: None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.meta.as_ref().map(|m| m.title.as_str())
    }

    pub fn set_literal(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.inputs.insert(name.into(), InputValue::Literal(value));
    }

    pub fn set_reference(&mut self, name: impl Into<String>, node_ref: NodeRef) {
        self.inputs.insert(name.into(), InputValue::Reference(node_ref));
    }

    /// All `(input name, reference)` pairs of this node.
    pub fn references(&self) -> impl Iterator<Item = (&str, &NodeRef)> {
        self.inputs
            .iter()
            .filter_map(|(name, value)| value.as_reference().map(|r| (name.as_str(), r)))
    }
}

/// Mapping from node id to operation, in the order nodes were inserted.
///
/// The order is the editor's node order after conversion, or document order
/// when deserialized, so iteration is deterministic for a given input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionGraph {
    nodes: Vec<(String, ExecutionNode)>,
    index: AHashMap<String, usize>,
}

impl ExecutionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, replacing (in place) any node already stored under `id`.
    pub fn insert(&mut self, id: impl Into<String>, node: ExecutionNode) -> Option<ExecutionNode> {
        let id = id.into();
        if let Some(&position) = self.index.get(&id) {
            return Some(std::mem::replace(&mut self.nodes[position].1, node));
        }
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push((id, node));
        None
    }

    pub fn get(&self, id: &str) -> Option<&ExecutionNode> {
        self.index.get(id).map(|&i| &self.nodes[i].1)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ExecutionNode> {
        self.index.get(id).map(|&i| &mut self.nodes[i].1)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExecutionNode)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|(id, _)| id.as_str())
    }

    /// References whose target node is not part of this graph, as `(node id, input, reference)`.
    pub fn dangling_references(&self) -> Vec<(&str, &str, &NodeRef)> {
        self.iter()
            .flat_map(|(id, node)| node.references().map(move |(input, r)| (id, input, r)))
            .filter(|(_, _, r)| !self.contains(&r.source_node_id))
            .collect()
    }

    /// Serializes the graph to the service's JSON wire form.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for ExecutionGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.nodes.len()))?;
        for (id, node) in &self.nodes {
            map.serialize_entry(id, node)?;
        }
        map.end()
    }
}

struct ExecutionGraphVisitor;

impl<'de> Visitor<'de> for ExecutionGraphVisitor {
    type Value = ExecutionGraph;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping from node id to execution node")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ExecutionGraph, A::Error> {
        let mut graph = ExecutionGraph::new();
        while let Some((id, node)) = access.next_entry::<String, ExecutionNode>()? {
            graph.insert(id, node);
        }
        Ok(graph)
    }
}

impl<'de> Deserialize<'de> for ExecutionGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ExecutionGraphVisitor)
    }
}
