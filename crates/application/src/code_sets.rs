use formloom_domain::{HierarchyIssue, IssueKind, ModuleHierarchy};
use tracing::{debug, warn};

use crate::ports::CodeSetProvider;

/// Caches provider options on every node whose definition references a CodeSet.
///
/// Unknown CodeSets clear any previously cached options, so the node falls back
/// to its static options, and are returned as warnings.
pub fn apply_code_sets(
    hierarchy: &mut ModuleHierarchy,
    provider: &dyn CodeSetProvider,
) -> Vec<HierarchyIssue> {
    let mut warnings = Vec::new();
    let mut resolved = 0_usize;

    for key in hierarchy.pre_order() {
        let Some(node) = hierarchy.node(key) else {
            continue;
        };
        let Some(code_set_id) = node.definition().code_set_id() else {
            continue;
        };

        match provider.options_for(code_set_id) {
            Some(options) => {
                resolved += 1;
                hierarchy.set_resolved_options(key, Some(options));
            }
            None => {
                let field_id = node.id().to_owned();
                warn!(
                    module = %hierarchy.module_name(),
                    field_id = %field_id,
                    code_set_id,
                    "code set could not be resolved"
                );
                warnings.push(HierarchyIssue::for_field(
                    IssueKind::UnresolvedCodeSet,
                    &field_id,
                    format!("code set '{code_set_id}' of field '{field_id}' could not be resolved"),
                ));
                hierarchy.set_resolved_options(key, None);
            }
        }
    }

    debug!(
        module = %hierarchy.module_name(),
        resolved,
        unresolved = warnings.len(),
        "applied code sets"
    );

    warnings
}
