use formloom_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::hierarchy::ModuleHierarchy;

/// Weights of the complexity score terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityWeights {
    /// Weight per field.
    pub field: f64,
    /// Weight per field with a parent.
    pub parented: f64,
    /// Weight per conditional field.
    pub conditional: f64,
    /// Weight of the squared maximum depth.
    pub depth_squared: f64,
}

impl Default for ComplexityWeights {
    fn default() -> Self {
        Self {
            field: 1.0,
            parented: 2.0,
            conditional: 3.0,
            depth_squared: 1.5,
        }
    }
}

impl ComplexityWeights {
    /// Rejects negative or non-finite weights.
    pub fn validate(&self) -> AppResult<()> {
        let weights = [
            ("field", self.field),
            ("parented", self.parented),
            ("conditional", self.conditional),
            ("depth_squared", self.depth_squared),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AppError::Validation(format!(
                    "complexity weight '{name}' must be a non-negative number"
                )));
            }
        }

        Ok(())
    }

    /// Computes the complexity score from raw counts.
    #[must_use]
    pub fn score(
        &self,
        total_fields: usize,
        parented_fields: usize,
        conditional_fields: usize,
        max_depth: usize,
    ) -> f64 {
        let max_depth = max_depth as f64;
        total_fields as f64 * self.field
            + parented_fields as f64 * self.parented
            + conditional_fields as f64 * self.conditional
            + max_depth * max_depth * self.depth_squared
    }
}

/// Derived structural statistics of one module hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchyMetrics {
    /// Number of fields.
    pub total_fields: usize,
    /// Number of root fields.
    pub root_count: usize,
    /// Number of fields attached to a parent.
    pub parented_fields: usize,
    /// Deepest node depth.
    pub max_depth: usize,
    /// Mean node depth.
    pub average_depth: f64,
    /// Number of conditional fields.
    pub conditional_fields: usize,
    /// Weighted complexity estimate.
    pub complexity_score: f64,
}

impl HierarchyMetrics {
    /// Computes metrics for the current state of a hierarchy.
    #[must_use]
    pub fn compute(hierarchy: &ModuleHierarchy, weights: &ComplexityWeights) -> Self {
        let depths: Vec<usize> = hierarchy.keys().map(|key| hierarchy.depth(key)).collect();
        let total_fields = depths.len();
        let max_depth = depths.iter().copied().max().unwrap_or(0);
        let average_depth = if total_fields == 0 {
            0.0
        } else {
            depths.iter().sum::<usize>() as f64 / total_fields as f64
        };
        let root_count = hierarchy.roots().len();
        let parented_fields = total_fields - root_count;
        let conditional_fields = hierarchy
            .nodes()
            .filter(|(_, node)| node.definition().is_conditional())
            .count();

        Self {
            total_fields,
            root_count,
            parented_fields,
            max_depth,
            average_depth,
            conditional_fields,
            complexity_score: weights.score(
                total_fields,
                parented_fields,
                conditional_fields,
                max_depth,
            ),
        }
    }
}
