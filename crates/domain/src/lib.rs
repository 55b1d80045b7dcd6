//! Domain entities and invariants of form field hierarchies.

#![forbid(unsafe_code)]

mod field;
mod field_option;
mod fingerprint;
mod hierarchy;
mod issue;
mod metrics;
mod relationship;
mod schema;

pub use field::{
    AccessibilityMetadata, ConditionOperator, FieldDefinition, FieldDefinitionInput, FieldType,
    ValidationConstraints, VisibilityCondition,
};
pub use field_option::{DEFAULT_LANGUAGE, FieldOption, resolve_options};
pub use fingerprint::structural_fingerprint;
pub use hierarchy::{FieldNode, ModuleHierarchy, NodeKey, PATH_SEPARATOR};
pub use issue::{HierarchyIssue, IssueKind};
pub use metrics::{ComplexityWeights, HierarchyMetrics};
pub use relationship::RelationshipType;
pub use schema::ModuleSchema;
