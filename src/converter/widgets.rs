use ahash::AHashMap;

/// Maps the positional `widgets_values` of one operation type to named inputs.
///
/// A `None` slot is an editor-only widget that has no counterpart in the
/// execution format and is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetMapping {
    operation_type: String,
    slots: Vec<Option<String>>,
}

impl WidgetMapping {
    pub fn new(operation_type: impl Into<String>, slots: Vec<Option<String>>) -> Self {
        Self {
            operation_type: operation_type.into(),
            slots,
        }
    }

    /// Builds a mapping from input names, where `"_"` marks a skipped slot.
    pub fn from_names<S: AsRef<str>>(operation_type: impl Into<String>, names: &[S]) -> Self {
        let slots = names
            .iter()
            .map(|name| match name.as_ref() {
                "_" | "" => None,
                other => Some(other.to_string()),
            })
            .collect();
        Self::new(operation_type, slots)
    }

    pub fn operation_type(&self) -> &str {
        &self.operation_type
    }

    pub fn slots(&self) -> &[Option<String>] {
        &self.slots
    }

    /// Pairs each named slot with the widget value at the same position.
    /// Extra widget values and missing trailing values are ignored.
    pub fn apply<'v>(
        &'v self,
        values: &'v [serde_json::Value],
    ) -> impl Iterator<Item = (&'v str, &'v serde_json::Value)> {
        self.slots
            .iter()
            .zip(values)
            .filter_map(|(slot, value)| slot.as_deref().map(|name| (name, value)))
    }

    fn renamed(&self, operation_type: &str) -> Self {
        Self::new(operation_type, self.slots.clone())
    }
}

/// Lookup table from operation type to its widget mapping.
///
/// Operation types without an entry simply get no literal inputs from widgets.
#[derive(Debug, Clone, Default)]
pub struct WidgetRegistry {
    mappings: AHashMap<String, WidgetMapping>,
}

impl WidgetRegistry {
    /// An empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table pre-populated with the stock operation types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        register_default_mappings(&mut registry);
        registry
    }

    /// Registers a mapping, replacing any existing one for the same operation type.
    pub fn insert(&mut self, mapping: WidgetMapping) {
        self.mappings
            .insert(mapping.operation_type().to_string(), mapping);
    }

    /// Reuses the mapping of `known_type` for `user_type`. Returns `false` if `known_type` is unknown.
    pub fn alias(&mut self, user_type: &str, known_type: &str) -> bool {
        match self.mappings.get(known_type).map(|m| m.renamed(user_type)) {
            Some(mapping) => {
                self.insert(mapping);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, operation_type: &str) -> Option<&WidgetMapping> {
        self.mappings.get(operation_type)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

macro_rules! widget_slot {
    (_) => {
        None
    };
    ($name:literal) => {
        Some($name.to_string())
    };
}

/// Defines the stock widget mappings and the function that registers them.
macro_rules! define_widget_mappings {
    ( $( ($operation_type:literal, [ $( $slot:tt ),* $(,)? ]) ),* $(,)? ) => {
        pub(super) fn register_default_mappings(registry: &mut WidgetRegistry) {
            $(
                registry.insert(WidgetMapping::new(
                    $operation_type,
                    vec![ $( widget_slot!($slot) ),* ],
                ));
            )*
        }
    };
}

define_widget_mappings! {
    ("CLIPTextEncode", ["text"]),
    ("CheckpointLoaderSimple", ["ckpt_name"]),
    ("EmptyLatentImage", ["width", "height", "batch_size"]),
    // The second KSampler widget is the editor's "control after generate" toggle.
    ("KSampler", ["seed", _, "steps", "cfg", "sampler_name", "scheduler", "denoise"]),
    ("VAELoader", ["vae_name"]),
    ("LoraLoader", ["lora_name", "strength_model", "strength_clip"]),
    ("SaveImage", ["filename_prefix"]),
    ("LoadImage", ["image"]),
}
