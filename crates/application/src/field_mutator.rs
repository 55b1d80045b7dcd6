use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use formloom_core::{AppError, AppResult, NonEmptyString};
use formloom_domain::{
    FieldDefinition, HierarchyIssue, IssueKind, ModuleHierarchy, NodeKey, PATH_SEPARATOR,
    RelationshipType,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::HierarchyConfig;
use crate::parent_graph::{ParentGraph, is_on_cycle};
use crate::ports::{FieldIdGenerator, UuidFieldIdGenerator};

mod clone;
mod fix;
mod move_field;

/// Outcome of moving a field to a new parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveResult {
    /// Reasons the move was rejected.
    pub errors: Vec<HierarchyIssue>,
    /// Advisory findings of an accepted move.
    pub warnings: Vec<HierarchyIssue>,
    /// Parent before the move.
    pub old_parent_id: Option<String>,
    /// Parent after the move.
    pub new_parent_id: Option<String>,
}

impl MoveResult {
    /// Returns whether the move was applied.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }

    fn rejected(issue: HierarchyIssue) -> Self {
        Self {
            errors: vec![issue],
            ..Self::default()
        }
    }
}

/// Options of a subtree clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneOptions {
    /// Whether every cloned field receives a fresh identifier.
    pub generate_new_ids: bool,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            generate_new_ids: true,
        }
    }
}

/// Detached copy of a subtree ready to be pasted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClonedSubtree {
    /// Identifier of the cloned root.
    pub root_id: String,
    /// Cloned definitions in pre-order, root first.
    pub fields: Vec<FieldDefinition>,
    /// Source identifier to clone identifier.
    pub id_map: BTreeMap<String, String>,
}

/// Outcome of the automatic repair of a flat field list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixReport {
    /// Repaired field list in input order.
    pub fields: Vec<FieldDefinition>,
    /// Parent references to missing fields that were cleared.
    pub orphans_cleared: usize,
    /// Parent references cleared to break circular chains.
    pub cycles_broken: usize,
    /// Relationship tags replaced by the suggested type.
    pub relationship_types_corrected: usize,
    /// One entry per applied fix.
    pub fixes: Vec<HierarchyIssue>,
}

impl FixReport {
    /// Returns the number of applied fixes.
    #[must_use]
    pub fn total_fixes(&self) -> usize {
        self.orphans_cleared + self.cycles_broken + self.relationship_types_corrected
    }
}

/// Safe structural edits of field hierarchies.
#[derive(Clone)]
pub struct FieldMutator {
    config: HierarchyConfig,
    id_generator: Arc<dyn FieldIdGenerator>,
}

impl Default for FieldMutator {
    fn default() -> Self {
        Self::new(HierarchyConfig::default(), Arc::new(UuidFieldIdGenerator))
    }
}

impl FieldMutator {
    /// Creates a mutator from its configuration and identifier source.
    #[must_use]
    pub fn new(config: HierarchyConfig, id_generator: Arc<dyn FieldIdGenerator>) -> Self {
        Self {
            config,
            id_generator,
        }
    }
}
