use formloom_core::ModuleName;
use serde::{Deserialize, Serialize};

use crate::field::FieldDefinition;

/// Flat interchange document holding every field of one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSchema {
    /// Module the fields belong to.
    pub module_name: ModuleName,
    /// Field definitions in storage order.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}
