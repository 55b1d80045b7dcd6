use super::*;

impl FieldMutator {
    /// Repairs orphaned parents, circular chains and implausible relationship tags.
    ///
    /// Cycles are broken minimally: walking the list in order, a field that is still
    /// part of a cycle loses its parent. Relationship tags are only corrected under
    /// parents that can have children, and untagged fields are left as they are.
    #[must_use]
    pub fn fix_common_issues(&self, fields: &[FieldDefinition]) -> FixReport {
        let mut report = FixReport {
            fields: fields.to_vec(),
            ..FixReport::default()
        };
        let graph = ParentGraph::new(fields);

        let mut links: Vec<Option<usize>> = (0..fields.len())
            .map(|position| graph.parent_of(position))
            .collect();

        for position in graph.owners() {
            if graph.has_missing_parent(position) {
                let field = &report.fields[position];
                report.fixes.push(HierarchyIssue::for_field(
                    IssueKind::MissingParent,
                    field.id(),
                    format!(
                        "cleared missing parent '{}' of field '{}'",
                        field.parent_id().unwrap_or_default(),
                        field.id()
                    ),
                ));
                report.fields[position] = field.with_parent_id(None);
                report.orphans_cleared += 1;
            }
        }

        for position in graph.owners() {
            if is_on_cycle(&links, position) {
                let field = &report.fields[position];
                report.fixes.push(HierarchyIssue::for_field(
                    IssueKind::CircularReference,
                    field.id(),
                    format!(
                        "detached field '{}' from parent '{}' to break a circular reference",
                        field.id(),
                        field.parent_id().unwrap_or_default()
                    ),
                ));
                report.fields[position] = field.with_parent_id(None);
                links[position] = None;
                report.cycles_broken += 1;
            }
        }

        for position in graph.owners() {
            let Some(parent_position) = links[position] else {
                continue;
            };
            let parent_type = report.fields[parent_position].field_type();
            if !parent_type.can_have_children() {
                continue;
            }

            let field = &report.fields[position];
            let Some(current) = field.relationship_type() else {
                continue;
            };
            if current.is_compatible_with(parent_type, field.field_type()) {
                continue;
            }
            let suggested = RelationshipType::suggest(
                parent_type,
                field.field_type(),
                field.visibility_condition().is_some(),
            );

            report.fixes.push(HierarchyIssue::for_field(
                IssueKind::IncompatibleRelationship,
                field.id(),
                format!(
                    "set relationship of field '{}' to '{}' (was '{}')",
                    field.id(),
                    suggested.as_str(),
                    current.as_str()
                ),
            ));
            report.fields[position] = field.with_relationship_type(Some(suggested));
            report.relationship_types_corrected += 1;
        }

        if report.total_fixes() > 0 {
            info!(
                orphans = report.orphans_cleared,
                cycles = report.cycles_broken,
                relationships = report.relationship_types_corrected,
                "fixed common hierarchy issues"
            );
        }

        report
    }
}
