use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Category of a structural hierarchy problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Parent identifier does not resolve to a field of the module.
    MissingParent,
    /// Field is its own ancestor.
    CircularReference,
    /// Identifier is used by more than one field.
    DuplicateIdentifier,
    /// Parent field type cannot host children.
    ParentCannotHaveChildren,
    /// Relationship type does not fit the parent/child field types.
    IncompatibleRelationship,
    /// Navigational parent differs from the stored parent identifier.
    StaleParentReference,
    /// Nesting exceeds the configured depth budget.
    DepthLimitExceeded,
    /// CodeSet reference could not be resolved.
    UnresolvedCodeSet,
    /// Request referenced an unknown field or was otherwise invalid.
    InvalidRequest,
    /// Unexpected internal fault converted into a report entry.
    Internal,
}

impl IssueKind {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingParent => "missing_parent",
            Self::CircularReference => "circular_reference",
            Self::DuplicateIdentifier => "duplicate_identifier",
            Self::ParentCannotHaveChildren => "parent_cannot_have_children",
            Self::IncompatibleRelationship => "incompatible_relationship",
            Self::StaleParentReference => "stale_parent_reference",
            Self::DepthLimitExceeded => "depth_limit_exceeded",
            Self::UnresolvedCodeSet => "unresolved_code_set",
            Self::InvalidRequest => "invalid_request",
            Self::Internal => "internal",
        }
    }
}

/// One typed error or warning entry of a hierarchy report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyIssue {
    kind: IssueKind,
    field_id: String,
    message: String,
}

impl HierarchyIssue {
    /// Creates an issue attached to a field.
    #[must_use]
    pub fn for_field(
        kind: IssueKind,
        field_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field_id: field_id.into(),
            message: message.into(),
        }
    }

    /// Returns the issue category.
    #[must_use]
    pub fn kind(&self) -> IssueKind {
        self.kind
    }

    /// Returns the affected field identifier.
    #[must_use]
    pub fn field_id(&self) -> &str {
        self.field_id.as_str()
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl Display for HierarchyIssue {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "[{}] {}", self.kind.as_str(), self.message)
    }
}
