//! Field hierarchy services: building, validation, analysis and structural edits.

#![forbid(unsafe_code)]

mod code_sets;
mod config;
mod field_mutator;
mod hierarchy_analyzer;
mod hierarchy_builder;
mod hierarchy_service;
mod hierarchy_validator;
mod parent_graph;
mod ports;

pub use code_sets::apply_code_sets;
pub use config::{DEFAULT_MAX_DEPTH, HierarchyConfig};
pub use field_mutator::{ClonedSubtree, CloneOptions, FieldMutator, FixReport, MoveResult};
pub use hierarchy_analyzer::{AnalysisResult, HierarchyAnalyzer, UNSPECIFIED_RELATIONSHIP};
pub use hierarchy_builder::{BuildReport, HierarchyBuilder};
pub use hierarchy_service::{CloneFieldResult, HierarchyService, SyncReport};
pub use hierarchy_validator::{HierarchyValidator, ValidationReport};
pub use ports::{CodeSetProvider, FieldIdGenerator, InMemoryCodeSetProvider, UuidFieldIdGenerator};
