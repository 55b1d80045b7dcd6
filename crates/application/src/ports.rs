use std::collections::HashMap;

use formloom_domain::FieldOption;
use uuid::Uuid;

/// Supplies option lists of externally managed CodeSets.
///
/// Implementations fetch and cache CodeSet data themselves; the engine only reads
/// already-resolved lists.
pub trait CodeSetProvider: Send + Sync {
    /// Returns the ordered options of a CodeSet, or `None` when it is unknown.
    fn options_for(&self, code_set_id: &str) -> Option<Vec<FieldOption>>;
}

/// CodeSet provider backed by a map of preloaded option lists.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCodeSetProvider {
    code_sets: HashMap<String, Vec<FieldOption>>,
}

impl InMemoryCodeSetProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces the options of a CodeSet.
    pub fn insert(&mut self, code_set_id: impl Into<String>, options: Vec<FieldOption>) {
        self.code_sets.insert(code_set_id.into(), options);
    }
}

impl CodeSetProvider for InMemoryCodeSetProvider {
    fn options_for(&self, code_set_id: &str) -> Option<Vec<FieldOption>> {
        self.code_sets.get(code_set_id).cloned()
    }
}

/// Produces fresh field identifiers for cloned fields.
pub trait FieldIdGenerator: Send + Sync {
    /// Returns a candidate identifier derived from the source identifier.
    fn generate(&self, source_id: &str) -> String;
}

/// Identifier generator appending a random UUID fragment to the source identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidFieldIdGenerator;

impl FieldIdGenerator for UuidFieldIdGenerator {
    fn generate(&self, source_id: &str) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{source_id}_{}", &suffix[..8])
    }
}
