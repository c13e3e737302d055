use crate::editor::{EditorGraph, EditorNode, WidgetValues};
use crate::error::ConversionWarning;
use crate::workflow::{ExecutionGraph, ExecutionNode, NodeMeta, NodeRef};
use ahash::AHashSet;

mod links;
pub mod widgets;

use links::LinkIndex;
pub use widgets::{WidgetMapping, WidgetRegistry};

/// The result of converting an editor graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub graph: ExecutionGraph,
    /// Inputs that could not be resolved and were left out of `graph`.
    pub warnings: Vec<ConversionWarning>,
}

/// Converts editor graphs into execution graphs.
#[derive(Debug, Clone)]
pub struct Converter {
    registry: WidgetRegistry,
}

pub struct ConverterBuilder {
    registry: WidgetRegistry,
}

impl ConverterBuilder {
    pub fn new() -> Self {
        Self {
            registry: WidgetRegistry::with_defaults(),
        }
    }

    /// Starts from an empty widget table instead of the stock one.
    pub fn without_defaults(mut self) -> Self {
        self.registry = WidgetRegistry::empty();
        self
    }

    /// Maps the widgets of `operation_type` to `names` by position (`"_"` skips a slot).
    pub fn with_widget_mapping<S: AsRef<str>>(mut self, operation_type: &str, names: &[S]) -> Self {
        self.registry
            .insert(WidgetMapping::from_names(operation_type, names));
        self
    }

    pub fn with_mapping(mut self, mapping: WidgetMapping) -> Self {
        self.registry.insert(mapping);
        self
    }

    /// Treats `user_type` like the already registered `known_type`.
    pub fn with_type_alias(mut self, user_type: &str, known_type: &str) -> Self {
        if !self.registry.alias(user_type, known_type) {
            tracing::warn!(
                user_type,
                known_type,
                "Cannot alias to an operation type without a widget mapping"
            );
        }
        self
    }

    pub fn build(self) -> Converter {
        Converter {
            registry: self.registry,
        }
    }
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Converter {
    fn default() -> Self {
        ConverterBuilder::new().build()
    }
}

impl Converter {
    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::new()
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    /// Converts `editor` into an execution graph with one node per distinct editor node id.
    ///
    /// Inputs whose link cannot be resolved, or whose source node is not in the
    /// graph, are skipped and reported in [`Conversion::warnings`]. The
    /// resulting graph therefore never holds a dangling reference.
    pub fn convert(&self, editor: &EditorGraph) -> Conversion {
        let node_ids: AHashSet<i64> = editor.nodes.iter().map(|n| n.id).collect();
        let links = LinkIndex::new(&editor.links);

        let mut graph = ExecutionGraph::new();
        let mut warnings = Vec::new();

        for node in &editor.nodes {
            let key = node.id.to_string();
            if graph.contains(&key) {
                warnings.push(ConversionWarning::DuplicateNode { node_id: key });
                continue;
            }

            let mut exec_node = ExecutionNode::new(&node.node_type);
            if let Some(title) = &node.title {
                exec_node.meta = Some(NodeMeta {
                    title: title.clone(),
                });
            }
            self.resolve_literals(node, &mut exec_node);
            Self::resolve_references(node, &links, &node_ids, &mut exec_node, &mut warnings);

            graph.insert(key, exec_node);
        }

        for warning in &warnings {
            tracing::warn!(%warning, "Skipped unresolvable input during conversion");
        }
        tracing::debug!(
            nodes = graph.len(),
            links = editor.links.len(),
            warnings = warnings.len(),
            "Converted editor graph"
        );

        Conversion { graph, warnings }
    }

    fn resolve_literals(&self, node: &EditorNode, exec_node: &mut ExecutionNode) {
        match &node.widgets_values {
            Some(WidgetValues::Positional(values)) => {
                if let Some(mapping) = self.registry.get(&node.node_type) {
                    for (name, value) in mapping.apply(values) {
                        exec_node.set_literal(name, value.clone());
                    }
                }
            }
            Some(WidgetValues::Named(values)) => {
                for (name, value) in values {
                    exec_node.set_literal(name.as_str(), value.clone());
                }
            }
            None => {}
        }
    }

    fn resolve_references(
        node: &EditorNode,
        links: &LinkIndex<'_>,
        node_ids: &AHashSet<i64>,
        exec_node: &mut ExecutionNode,
        warnings: &mut Vec<ConversionWarning>,
    ) {
        for input in &node.inputs {
            let Some(link_id) = input.link else {
                continue;
            };

            let Some(link) = links.resolve(link_id) else {
                warnings.push(ConversionWarning::MissingLink {
                    node_id: node.id.to_string(),
                    input: input.name.clone(),
                    link_id,
                });
                continue;
            };

            if !node_ids.contains(&link.source_node_id) {
                warnings.push(ConversionWarning::DanglingSource {
                    node_id: node.id.to_string(),
                    input: input.name.clone(),
                    source_node_id: link.source_node_id.to_string(),
                });
                continue;
            }

            exec_node.set_reference(
                input.name.as_str(),
                NodeRef::new(link.source_node_id.to_string(), link.source_output_slot),
            );
        }
    }
}

/// Converts `editor` with the stock widget table, discarding warnings.
pub fn convert(editor: &EditorGraph) -> ExecutionGraph {
    Converter::default().convert(editor).graph
}
