use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use formloom_core::ModuleName;
use formloom_domain::{
    FieldDefinition, HierarchyMetrics, ModuleHierarchy, structural_fingerprint,
};
use serde::{Deserialize, Serialize};

use crate::parent_graph::ParentGraph;
use crate::{HierarchyBuilder, HierarchyConfig};

/// Distribution key used for parented fields without a relationship tag.
pub const UNSPECIFIED_RELATIONSHIP: &str = "unspecified";

/// Aggregate statistics of a module hierarchy for monitoring and dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Module the analysis belongs to.
    pub module_name: ModuleName,
    /// When the analysis ran.
    pub analyzed_at: DateTime<Utc>,
    /// Structural metrics.
    pub metrics: HierarchyMetrics,
    /// Parented field counts keyed by relationship type.
    pub relationship_distribution: BTreeMap<String, usize>,
    /// Field counts keyed by field type.
    pub field_type_distribution: BTreeMap<String, usize>,
    /// Fields that are their own ancestor.
    pub circular_field_ids: Vec<String>,
    /// Fields whose parent identifier resolves to nothing.
    pub orphaned_field_ids: Vec<String>,
    /// Fingerprint of the analyzed structure.
    pub structural_fingerprint: String,
}

/// Computes structural statistics.
#[derive(Debug, Clone, Default)]
pub struct HierarchyAnalyzer {
    config: HierarchyConfig,
}

impl HierarchyAnalyzer {
    /// Creates an analyzer.
    #[must_use]
    pub fn new(config: HierarchyConfig) -> Self {
        Self { config }
    }

    /// Analyzes a flat field list.
    ///
    /// Depth figures describe the repaired forest the builder produces, while the
    /// circular and orphaned lists describe the raw input.
    #[must_use]
    pub fn analyze(&self, module_name: ModuleName, fields: &[FieldDefinition]) -> AnalysisResult {
        let (hierarchy, _) = HierarchyBuilder::new(self.config).build(module_name, fields);
        self.assemble(&hierarchy, fields)
    }

    /// Analyzes the current state of a built hierarchy.
    #[must_use]
    pub fn analyze_hierarchy(&self, hierarchy: &ModuleHierarchy) -> AnalysisResult {
        let definitions: Vec<FieldDefinition> = hierarchy
            .nodes()
            .map(|(_, node)| node.definition().clone())
            .collect();
        self.assemble(hierarchy, &definitions)
    }

    fn assemble(&self, hierarchy: &ModuleHierarchy, fields: &[FieldDefinition]) -> AnalysisResult {
        let mut relationship_distribution = BTreeMap::new();
        let mut field_type_distribution = BTreeMap::new();
        for (_, node) in hierarchy.nodes() {
            let definition = node.definition();
            *field_type_distribution
                .entry(definition.field_type().as_str().to_owned())
                .or_insert(0) += 1;

            if node.parent().is_some() {
                let relationship = definition
                    .relationship_type()
                    .map_or(UNSPECIFIED_RELATIONSHIP, |relationship| relationship.as_str());
                *relationship_distribution
                    .entry(relationship.to_owned())
                    .or_insert(0) += 1;
            }
        }

        let graph = ParentGraph::new(fields);
        let cycle_members = graph.cycle_members();
        let circular_field_ids = graph
            .owners()
            .filter(|position| cycle_members.contains(position))
            .map(|position| fields[position].id().to_owned())
            .collect();
        let orphaned_field_ids = graph
            .owners()
            .filter(|position| graph.has_missing_parent(*position))
            .map(|position| fields[position].id().to_owned())
            .collect();

        AnalysisResult {
            module_name: hierarchy.module_name().clone(),
            analyzed_at: Utc::now(),
            metrics: HierarchyMetrics::compute(hierarchy, &self.config.complexity_weights),
            relationship_distribution,
            field_type_distribution,
            circular_field_ids,
            orphaned_field_ids,
            structural_fingerprint: structural_fingerprint(fields),
        }
    }
}
