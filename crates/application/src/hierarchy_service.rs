use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use formloom_core::{AppError, AppResult, ModuleName};
use formloom_domain::{
    FieldDefinition, HierarchyIssue, IssueKind, ModuleHierarchy, structural_fingerprint,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::field_mutator::{CloneOptions, FieldMutator, FixReport, MoveResult};
use crate::hierarchy_analyzer::{AnalysisResult, HierarchyAnalyzer};
use crate::hierarchy_builder::{BuildReport, HierarchyBuilder};
use crate::hierarchy_validator::{HierarchyValidator, ValidationReport};
use crate::ports::{CodeSetProvider, FieldIdGenerator};
use crate::{HierarchyConfig, code_sets};

/// Outcome of synchronizing the active hierarchy with an edited field list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Whether the structure changed and the hierarchy was rebuilt.
    pub rebuilt: bool,
    /// Definitions swapped in place when no rebuild was needed.
    pub updated_fields: usize,
    /// Definitions that could not be applied.
    pub errors: Vec<HierarchyIssue>,
}

/// Outcome of duplicating a field next to its source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloneFieldResult {
    /// Reasons the clone was not inserted.
    pub errors: Vec<HierarchyIssue>,
    /// Identifier of the inserted copy.
    pub root_id: Option<String>,
    /// Source identifier to clone identifier.
    pub id_map: BTreeMap<String, String>,
}

impl CloneFieldResult {
    /// Returns whether the copy was inserted.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Stateful entry point owning the hierarchy of one open module.
pub struct HierarchyService {
    config: HierarchyConfig,
    mutator: FieldMutator,
    hierarchy: ModuleHierarchy,
    last_build_report: BuildReport,
    fingerprint: String,
}

impl HierarchyService {
    /// Creates a service with an empty hierarchy.
    pub fn new(
        module_name: ModuleName,
        config: HierarchyConfig,
        id_generator: Arc<dyn FieldIdGenerator>,
    ) -> AppResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            mutator: FieldMutator::new(config, id_generator),
            hierarchy: ModuleHierarchy::new(module_name),
            last_build_report: BuildReport::default(),
            fingerprint: structural_fingerprint(&[]),
        })
    }

    /// Returns the active hierarchy.
    #[must_use]
    pub fn hierarchy(&self) -> &ModuleHierarchy {
        &self.hierarchy
    }

    /// Returns the report of the most recent build.
    #[must_use]
    pub fn last_build_report(&self) -> &BuildReport {
        &self.last_build_report
    }

    /// Returns the fingerprint of the active structure.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Builds a fresh hierarchy from `fields` and swaps it in.
    pub fn load(&mut self, fields: &[FieldDefinition]) -> &BuildReport {
        let (hierarchy, report) = HierarchyBuilder::new(self.config)
            .build(self.hierarchy.module_name().clone(), fields);
        self.hierarchy = hierarchy;
        self.last_build_report = report;
        self.refresh_fingerprint();

        info!(
            module = %self.hierarchy.module_name(),
            fields = self.hierarchy.len(),
            errors = self.last_build_report.errors.len(),
            warnings = self.last_build_report.warnings.len(),
            "loaded field hierarchy"
        );

        &self.last_build_report
    }

    /// Applies an edited field list, rebuilding only when the structure changed.
    ///
    /// The list is compared with the repaired structure, so input that the builder
    /// had to fix is always rebuilt. Display-only edits are swapped into the
    /// existing nodes, which keeps cached CodeSet options.
    pub fn sync(&mut self, fields: &[FieldDefinition]) -> SyncReport {
        if structural_fingerprint(fields) != self.fingerprint {
            self.load(fields);
            return SyncReport {
                rebuilt: true,
                ..SyncReport::default()
            };
        }

        let mut report = SyncReport::default();
        let mut seen = HashSet::new();
        for field in fields {
            if !seen.insert(field.id()) {
                continue;
            }
            match self.hierarchy.replace_definition(field.clone()) {
                Ok(()) => report.updated_fields += 1,
                Err(error) => report
                    .errors
                    .push(self.issue_from_error(field.id(), &error)),
            }
        }

        report
    }

    /// Moves a field under a new parent, or to the root level with `None`.
    pub fn move_field(&mut self, field_id: &str, new_parent_id: Option<&str>) -> MoveResult {
        let result = self
            .mutator
            .move_to_parent(&mut self.hierarchy, field_id, new_parent_id);
        if result.is_successful() {
            self.refresh_fingerprint();
        }
        result
    }

    /// Clones a field with its subtree and inserts the copy as its sibling.
    pub fn clone_field(&mut self, source_id: &str, options: CloneOptions) -> CloneFieldResult {
        let pasted = self
            .mutator
            .clone_subtree(&self.hierarchy, source_id, options)
            .and_then(|cloned| {
                self.mutator
                    .paste_subtree(&mut self.hierarchy, &cloned)
                    .map(|_| cloned)
            });

        match pasted {
            Ok(cloned) => {
                self.refresh_fingerprint();
                CloneFieldResult {
                    errors: Vec::new(),
                    root_id: Some(cloned.root_id),
                    id_map: cloned.id_map,
                }
            }
            Err(error) => CloneFieldResult {
                errors: vec![self.issue_from_error(source_id, &error)],
                ..CloneFieldResult::default()
            },
        }
    }

    /// Repairs a raw field list and loads the repaired result.
    pub fn fix_and_rebuild(&mut self, fields: &[FieldDefinition]) -> FixReport {
        let report = self.mutator.fix_common_issues(fields);
        self.load(&report.fields);
        report
    }

    /// Validates the active hierarchy.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        HierarchyValidator.validate_hierarchy(&self.hierarchy)
    }

    /// Analyzes the active hierarchy.
    #[must_use]
    pub fn analyze(&self) -> AnalysisResult {
        HierarchyAnalyzer::new(self.config).analyze_hierarchy(&self.hierarchy)
    }

    /// Resolves CodeSet options for every field that references one.
    pub fn apply_code_sets(&mut self, provider: &dyn CodeSetProvider) -> Vec<HierarchyIssue> {
        code_sets::apply_code_sets(&mut self.hierarchy, provider)
    }

    /// Returns the flat storage form of the active hierarchy.
    #[must_use]
    pub fn snapshot(&self) -> Vec<FieldDefinition> {
        self.hierarchy.flatten()
    }

    fn refresh_fingerprint(&mut self) {
        self.fingerprint = structural_fingerprint(&self.hierarchy.flatten());
    }

    fn issue_from_error(&self, field_id: &str, error: &AppError) -> HierarchyIssue {
        let kind = match error {
            AppError::Internal(_) => {
                error!(
                    module = %self.hierarchy.module_name(),
                    field_id,
                    error = %error,
                    "hierarchy operation failed"
                );
                IssueKind::Internal
            }
            AppError::Validation(_) | AppError::NotFound(_) | AppError::Conflict(_) => {
                warn!(
                    module = %self.hierarchy.module_name(),
                    field_id,
                    error = %error,
                    "rejected hierarchy request"
                );
                IssueKind::InvalidRequest
            }
        };

        HierarchyIssue::for_field(kind, field_id, error.to_string())
    }
}
