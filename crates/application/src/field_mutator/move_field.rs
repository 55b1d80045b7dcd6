use super::*;

impl FieldMutator {
    /// Moves a field and its subtree under a new parent, or to the root level.
    ///
    /// The hierarchy is left untouched when the move is rejected.
    pub fn move_to_parent(
        &self,
        hierarchy: &mut ModuleHierarchy,
        field_id: &str,
        new_parent_id: Option<&str>,
    ) -> MoveResult {
        let Some(field) = hierarchy.key_of(field_id) else {
            return MoveResult::rejected(HierarchyIssue::for_field(
                IssueKind::InvalidRequest,
                field_id,
                format!("field '{field_id}' does not exist"),
            ));
        };

        let new_parent = match new_parent_id {
            Some(parent_id) => match hierarchy.key_of(parent_id) {
                Some(parent) => Some(parent),
                None => {
                    return MoveResult::rejected(HierarchyIssue::for_field(
                        IssueKind::InvalidRequest,
                        field_id,
                        format!("target parent '{parent_id}' does not exist"),
                    ));
                }
            },
            None => None,
        };

        let old_parent_id = hierarchy
            .parent_of(field)
            .and_then(|parent| hierarchy.node(parent))
            .map(|parent| parent.id().to_owned());

        let mut result = match new_parent {
            Some(parent) => match self.check_move(hierarchy, field_id, field, parent) {
                Ok(warnings) => MoveResult {
                    warnings,
                    ..MoveResult::default()
                },
                Err(issue) => {
                    warn!(
                        module = %hierarchy.module_name(),
                        field_id,
                        reason = issue.message(),
                        "rejected field move"
                    );
                    return MoveResult::rejected(issue);
                }
            },
            None => MoveResult {
                warnings: self
                    .depth_warning(hierarchy, field_id, field, None)
                    .into_iter()
                    .collect(),
                ..MoveResult::default()
            },
        };

        match new_parent {
            Some(parent) => {
                if let Err(error) = hierarchy.attach(field, parent) {
                    return MoveResult::rejected(HierarchyIssue::for_field(
                        IssueKind::Internal,
                        field_id,
                        error.to_string(),
                    ));
                }
            }
            None => hierarchy.detach(field),
        }

        info!(
            module = %hierarchy.module_name(),
            field_id,
            old_parent = old_parent_id.as_deref().unwrap_or("(root)"),
            new_parent = new_parent_id.unwrap_or("(root)"),
            "moved field"
        );

        result.old_parent_id = old_parent_id;
        result.new_parent_id = new_parent_id.map(str::to_owned);
        result
    }

    fn check_move(
        &self,
        hierarchy: &ModuleHierarchy,
        field_id: &str,
        field: NodeKey,
        parent: NodeKey,
    ) -> Result<Vec<HierarchyIssue>, HierarchyIssue> {
        let (Some(field_node), Some(parent_node)) = (hierarchy.node(field), hierarchy.node(parent))
        else {
            return Err(HierarchyIssue::for_field(
                IssueKind::Internal,
                field_id,
                format!(
                    "field '{field_id}' or its target parent is not part of module '{}'",
                    hierarchy.module_name()
                ),
            ));
        };
        let field_definition = field_node.definition();
        let parent_definition = parent_node.definition();

        if !parent_definition.field_type().can_have_children() {
            return Err(HierarchyIssue::for_field(
                IssueKind::ParentCannotHaveChildren,
                field_definition.id(),
                format!(
                    "field '{}' of type '{}' cannot have children",
                    parent_definition.id(),
                    parent_definition.field_type().as_str()
                ),
            ));
        }

        if field == parent || hierarchy.is_ancestor(field, parent) {
            return Err(HierarchyIssue::for_field(
                IssueKind::CircularReference,
                field_definition.id(),
                format!(
                    "moving '{}' under '{}' would create a circular reference",
                    field_definition.id(),
                    parent_definition.id()
                ),
            ));
        }

        let mut warnings: Vec<HierarchyIssue> =
            self.depth_warning(hierarchy, field_id, field, Some(parent)).into_iter().collect();

        if let Some(relationship) = field_definition.relationship_type()
            && !relationship
                .is_compatible_with(parent_definition.field_type(), field_definition.field_type())
        {
            warnings.push(HierarchyIssue::for_field(
                IssueKind::IncompatibleRelationship,
                field_definition.id(),
                format!(
                    "relationship '{}' of field '{}' does not fit new parent type '{}'",
                    relationship.as_str(),
                    field_definition.id(),
                    parent_definition.field_type().as_str()
                ),
            ));
        }

        Ok(warnings)
    }

    fn depth_warning(
        &self,
        hierarchy: &ModuleHierarchy,
        field_id: &str,
        field: NodeKey,
        parent: Option<NodeKey>,
    ) -> Option<HierarchyIssue> {
        let base = parent.map_or(0, |parent| hierarchy.depth(parent) + 1);
        let deepest = base + hierarchy.subtree_height(field);
        (deepest > self.config.max_depth).then(|| {
            HierarchyIssue::for_field(
                IssueKind::DepthLimitExceeded,
                field_id,
                format!(
                    "moving '{field_id}' nests fields {deepest} levels deep, beyond the limit of {}",
                    self.config.max_depth
                ),
            )
        })
    }
}
