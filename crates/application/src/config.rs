use formloom_core::{AppError, AppResult};
use formloom_domain::ComplexityWeights;
use serde::{Deserialize, Serialize};

/// Default nesting budget checked when fields are moved.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Tunables shared by the hierarchy services.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Deepest level a move may produce without a warning.
    pub max_depth: usize,
    /// Weights of the complexity score.
    pub complexity_weights: ComplexityWeights,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            complexity_weights: ComplexityWeights::default(),
        }
    }
}

impl HierarchyConfig {
    /// Rejects settings the services cannot work with.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_depth == 0 {
            return Err(AppError::Validation(
                "max_depth must be greater than zero".to_owned(),
            ));
        }

        self.complexity_weights.validate()
    }
}
