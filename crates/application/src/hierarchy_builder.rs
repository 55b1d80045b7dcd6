use formloom_core::ModuleName;
use formloom_domain::{
    FieldDefinition, HierarchyIssue, HierarchyMetrics, IssueKind, ModuleHierarchy,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::HierarchyConfig;
use crate::parent_graph::ParentGraph;

/// Outcome of building a hierarchy from a flat field list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Defects that forced an edge or field to be dropped.
    pub errors: Vec<HierarchyIssue>,
    /// Advisory findings.
    pub warnings: Vec<HierarchyIssue>,
    /// Number of automatic repairs applied while building.
    pub fixed_count: usize,
    /// Metrics of the resulting hierarchy.
    pub metrics: HierarchyMetrics,
}

impl BuildReport {
    /// Returns whether the build recorded no errors.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the deepest node depth of the built hierarchy.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.metrics.max_depth
    }
}

/// Builds navigable hierarchies from flat field lists.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    config: HierarchyConfig,
}

impl HierarchyBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new(config: HierarchyConfig) -> Self {
        Self { config }
    }

    /// Builds a fresh hierarchy, detaching every invalid parent link.
    ///
    /// Duplicate identifiers keep their first occurrence. Missing parents produce a
    /// warning and circular references an error; in both cases the field becomes a
    /// root. Every input yields a valid forest.
    pub fn build(
        &self,
        module_name: ModuleName,
        fields: &[FieldDefinition],
    ) -> (ModuleHierarchy, BuildReport) {
        let mut report = BuildReport::default();
        let mut hierarchy = ModuleHierarchy::new(module_name);
        let graph = ParentGraph::new(fields);
        let cycle_members = graph.cycle_members();

        for position in graph.duplicates() {
            let id = fields[*position].id();
            report.errors.push(HierarchyIssue::for_field(
                IssueKind::DuplicateIdentifier,
                id,
                format!("field '{id}' is defined more than once; later definitions are ignored"),
            ));
            report.fixed_count += 1;
        }

        let mut links = Vec::new();
        for position in graph.owners() {
            let field = &fields[position];
            let mut parent = graph.parent_of(position);

            if graph.has_missing_parent(position) {
                let parent_id = field.parent_id().unwrap_or_default();
                warn!(
                    module = %hierarchy.module_name(),
                    field_id = field.id(),
                    parent_id,
                    "detached field from missing parent"
                );
                report.warnings.push(HierarchyIssue::for_field(
                    IssueKind::MissingParent,
                    field.id(),
                    format!(
                        "field '{}' references missing parent '{parent_id}' and was made a root",
                        field.id()
                    ),
                ));
                report.fixed_count += 1;
            } else if cycle_members.contains(&position) {
                warn!(
                    module = %hierarchy.module_name(),
                    field_id = field.id(),
                    "detached field from circular parent chain"
                );
                report.errors.push(HierarchyIssue::for_field(
                    IssueKind::CircularReference,
                    field.id(),
                    format!(
                        "field '{}' is part of a circular reference ({}) and was made a root",
                        field.id(),
                        graph.cycle_path(position)
                    ),
                ));
                report.fixed_count += 1;
                parent = None;
            }

            let definition = if parent.is_some() {
                field.clone()
            } else {
                field.with_parent_id(None)
            };
            match hierarchy.insert(definition) {
                Ok(key) => links.push((key, parent)),
                Err(error) => report.errors.push(HierarchyIssue::for_field(
                    IssueKind::Internal,
                    field.id(),
                    error.to_string(),
                )),
            }
        }

        for (key, parent) in links {
            let Some(parent_position) = parent else {
                continue;
            };
            let Some(parent_key) = hierarchy.key_of(fields[parent_position].id()) else {
                continue;
            };
            if let Err(error) = hierarchy.attach(key, parent_key) {
                let id = hierarchy
                    .node(key)
                    .map(|node| node.id().to_owned())
                    .unwrap_or_default();
                hierarchy.detach(key);
                report.errors.push(HierarchyIssue::for_field(
                    IssueKind::Internal,
                    id,
                    error.to_string(),
                ));
                report.fixed_count += 1;
            }
        }

        report
            .warnings
            .extend(relationship_warnings(&hierarchy));
        report.metrics = HierarchyMetrics::compute(&hierarchy, &self.config.complexity_weights);

        debug!(
            module = %hierarchy.module_name(),
            fields = report.metrics.total_fields,
            roots = report.metrics.root_count,
            max_depth = report.metrics.max_depth,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            fixed = report.fixed_count,
            "built field hierarchy"
        );

        (hierarchy, report)
    }
}

/// Soft checks of every attached parent/child pair.
pub(crate) fn relationship_warnings(hierarchy: &ModuleHierarchy) -> Vec<HierarchyIssue> {
    let mut warnings = Vec::new();
    for key in hierarchy.pre_order() {
        let Some(node) = hierarchy.node(key) else {
            continue;
        };
        let Some(parent) = node.parent().and_then(|parent| hierarchy.node(parent)) else {
            continue;
        };
        let parent = parent.definition();
        let child = node.definition();

        if !parent.field_type().can_have_children() {
            warnings.push(HierarchyIssue::for_field(
                IssueKind::ParentCannotHaveChildren,
                child.id(),
                format!(
                    "field '{}' is nested under '{}' whose type '{}' cannot have children",
                    child.id(),
                    parent.id(),
                    parent.field_type().as_str()
                ),
            ));
            continue;
        }

        if let Some(relationship) = child.relationship_type()
            && !relationship.is_compatible_with(parent.field_type(), child.field_type())
        {
            warnings.push(HierarchyIssue::for_field(
                IssueKind::IncompatibleRelationship,
                child.id(),
                format!(
                    "relationship '{}' of field '{}' does not fit parent type '{}'",
                    relationship.as_str(),
                    child.id(),
                    parent.field_type().as_str()
                ),
            ));
        }
    }
    warnings
}

#[cfg(test)]
mod tests;
