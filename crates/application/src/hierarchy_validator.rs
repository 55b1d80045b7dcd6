use formloom_domain::{FieldDefinition, HierarchyIssue, IssueKind, ModuleHierarchy};
use serde::{Deserialize, Serialize};

use crate::parent_graph::ParentGraph;

/// Read-only structural findings for a field list or hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Problems that make the structure invalid.
    pub errors: Vec<HierarchyIssue>,
    /// Advisory findings.
    pub warnings: Vec<HierarchyIssue>,
}

impl ValidationReport {
    /// Returns whether no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Inspects field structures without mutating them.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyValidator;

impl HierarchyValidator {
    /// Validates the parent links stored in a flat field list.
    #[must_use]
    pub fn validate(&self, fields: &[FieldDefinition]) -> ValidationReport {
        let mut report = ValidationReport::default();
        let graph = ParentGraph::new(fields);
        let cycle_members = graph.cycle_members();

        for position in graph.duplicates() {
            let id = fields[*position].id();
            report.errors.push(HierarchyIssue::for_field(
                IssueKind::DuplicateIdentifier,
                id,
                format!("field '{id}' is defined more than once"),
            ));
        }

        for position in graph.owners() {
            let field = &fields[position];

            if cycle_members.contains(&position) {
                report.errors.push(HierarchyIssue::for_field(
                    IssueKind::CircularReference,
                    field.id(),
                    format!(
                        "field '{}' is its own ancestor ({})",
                        field.id(),
                        graph.cycle_path(position)
                    ),
                ));
                continue;
            }

            if graph.has_missing_parent(position) {
                report.warnings.push(HierarchyIssue::for_field(
                    IssueKind::MissingParent,
                    field.id(),
                    format!(
                        "field '{}' references missing parent '{}'",
                        field.id(),
                        field.parent_id().unwrap_or_default()
                    ),
                ));
                continue;
            }

            let Some(parent) = graph.parent_of(position).map(|parent| &fields[parent]) else {
                continue;
            };

            if !parent.field_type().can_have_children() {
                report.errors.push(HierarchyIssue::for_field(
                    IssueKind::ParentCannotHaveChildren,
                    field.id(),
                    format!(
                        "parent '{}' of field '{}' has type '{}' which cannot have children",
                        parent.id(),
                        field.id(),
                        parent.field_type().as_str()
                    ),
                ));
                continue;
            }

            if let Some(relationship) = field.relationship_type()
                && !relationship.is_compatible_with(parent.field_type(), field.field_type())
            {
                report.warnings.push(HierarchyIssue::for_field(
                    IssueKind::IncompatibleRelationship,
                    field.id(),
                    format!(
                        "relationship '{}' of field '{}' does not fit parent type '{}'",
                        relationship.as_str(),
                        field.id(),
                        parent.field_type().as_str()
                    ),
                ));
            }
        }

        report
    }

    /// Validates a built hierarchy, including navigation links that disagree with
    /// the stored parent identifiers.
    #[must_use]
    pub fn validate_hierarchy(&self, hierarchy: &ModuleHierarchy) -> ValidationReport {
        let definitions: Vec<FieldDefinition> = hierarchy
            .nodes()
            .map(|(_, node)| node.definition().clone())
            .collect();
        let mut report = self.validate(&definitions);

        for (_, node) in hierarchy.nodes() {
            let navigational = node
                .parent()
                .and_then(|parent| hierarchy.node(parent))
                .map(|parent| parent.id());
            let stored = node.definition().parent_id();
            if navigational != stored {
                report.warnings.push(HierarchyIssue::for_field(
                    IssueKind::StaleParentReference,
                    node.id(),
                    format!(
                        "field '{}' is displayed under '{}' but its parent identifier is '{}'",
                        node.id(),
                        navigational.unwrap_or("(root)"),
                        stored.unwrap_or("(none)")
                    ),
                ));
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use formloom_core::ModuleName;
    use formloom_domain::{
        FieldDefinition, FieldDefinitionInput, FieldType, IssueKind, RelationshipType,
    };

    use super::HierarchyValidator;
    use crate::HierarchyBuilder;

    fn field(id: &str, parent_id: Option<&str>, field_type: FieldType) -> FieldDefinition {
        let mut input = FieldDefinitionInput::new(id, field_type);
        input.parent_id = parent_id.map(str::to_owned);
        FieldDefinition::new(input).unwrap_or_else(|_| unreachable!())
    }

    fn kinds(issues: &[formloom_domain::HierarchyIssue]) -> Vec<IssueKind> {
        issues.iter().map(|issue| issue.kind()).collect()
    }

    #[test]
    fn valid_tree_has_no_findings() {
        let fields = vec![
            field("contact", None, FieldType::Section),
            field("email", Some("contact"), FieldType::TextBox),
        ];
        let report = HierarchyValidator.validate(&fields);
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn reports_cycles_as_errors_and_orphans_as_warnings() {
        let fields = vec![
            field("x", Some("y"), FieldType::Group),
            field("y", Some("x"), FieldType::Group),
            field("lost", Some("gone"), FieldType::TextBox),
        ];
        let report = HierarchyValidator.validate(&fields);

        assert!(!report.is_valid());
        assert_eq!(
            kinds(&report.errors),
            vec![IssueKind::CircularReference, IssueKind::CircularReference]
        );
        assert_eq!(kinds(&report.warnings), vec![IssueKind::MissingParent]);
    }

    #[test]
    fn plain_input_as_parent_is_an_error() {
        let fields = vec![
            field("name", None, FieldType::TextBox),
            field("nickname", Some("name"), FieldType::TextBox),
        ];
        let report = HierarchyValidator.validate(&fields);
        assert_eq!(kinds(&report.errors), vec![IssueKind::ParentCannotHaveChildren]);
    }

    #[test]
    fn incompatible_relationship_is_a_warning() {
        let mut input = FieldDefinitionInput::new("email", FieldType::TextBox);
        input.parent_id = Some("contact".to_owned());
        input.relationship_type = Some(RelationshipType::Cascade);
        let fields = vec![
            field("contact", None, FieldType::Section),
            FieldDefinition::new(input).unwrap_or_else(|_| unreachable!()),
        ];
        let report = HierarchyValidator.validate(&fields);
        assert!(report.is_valid());
        assert_eq!(kinds(&report.warnings), vec![IssueKind::IncompatibleRelationship]);
    }

    #[test]
    fn validation_does_not_mutate_input() {
        let fields = vec![
            field("x", Some("y"), FieldType::Group),
            field("y", Some("x"), FieldType::Group),
        ];
        let before = fields.clone();
        let _ = HierarchyValidator.validate(&fields);
        assert_eq!(fields, before);
    }

    #[test]
    fn stale_parent_identifier_is_reported_for_built_hierarchy() {
        let fields = vec![
            field("contact", None, FieldType::Section),
            field("address", None, FieldType::Section),
            field("email", Some("contact"), FieldType::TextBox),
        ];
        let (mut hierarchy, _) = HierarchyBuilder::default().build(
            ModuleName::new("intake").unwrap_or_else(|_| unreachable!()),
            &fields,
        );
        assert!(HierarchyValidator.validate_hierarchy(&hierarchy).warnings.is_empty());

        let edited = field("email", Some("address"), FieldType::TextBox);
        hierarchy
            .replace_definition(edited)
            .unwrap_or_else(|_| unreachable!());

        let report = HierarchyValidator.validate_hierarchy(&hierarchy);
        assert!(report.is_valid());
        assert_eq!(kinds(&report.warnings), vec![IssueKind::StaleParentReference]);
        assert!(report.warnings[0].message().contains("'contact'"));
    }
}
