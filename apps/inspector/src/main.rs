//! Formloom schema inspector.
//!
//! Loads a module schema document, builds its field hierarchy and prints the
//! build, validation and analysis reports as JSON.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::env;
use std::fs;
use std::sync::Arc;

use formloom_application::{
    AnalysisResult, BuildReport, DEFAULT_MAX_DEPTH, FixReport, HierarchyConfig, HierarchyService,
    InMemoryCodeSetProvider, UuidFieldIdGenerator, ValidationReport,
};
use formloom_core::{AppError, AppResult};
use formloom_domain::{FieldOption, HierarchyIssue, ModuleSchema};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct InspectorConfig {
    schema_path: String,
    code_sets_path: Option<String>,
    apply_fixes: bool,
    hierarchy: HierarchyConfig,
}

#[derive(Debug, Serialize)]
struct InspectionReport<'a> {
    fixes: Option<FixReport>,
    build: &'a BuildReport,
    code_set_warnings: Vec<HierarchyIssue>,
    validation: ValidationReport,
    analysis: AnalysisResult,
}

fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = InspectorConfig::load()?;
    let schema = read_schema(config.schema_path.as_str())?;
    let module_name = schema.module_name.clone();

    info!(
        module = %module_name,
        fields = schema.fields.len(),
        apply_fixes = config.apply_fixes,
        max_depth = config.hierarchy.max_depth,
        "formloom-inspector started"
    );

    let mut service = HierarchyService::new(
        module_name.clone(),
        config.hierarchy,
        Arc::new(UuidFieldIdGenerator),
    )?;

    let fixes = if config.apply_fixes {
        let report = service.fix_and_rebuild(&schema.fields);
        info!(
            module = %module_name,
            orphans = report.orphans_cleared,
            cycles = report.cycles_broken,
            relationships = report.relationship_types_corrected,
            "applied automatic fixes"
        );
        Some(report)
    } else {
        service.load(&schema.fields);
        None
    };

    let code_set_warnings = match config.code_sets_path.as_deref() {
        Some(path) => service.apply_code_sets(&read_code_sets(path)?),
        None => Vec::new(),
    };

    let validation = service.validate();
    for issue in validation.errors.iter().chain(&validation.warnings) {
        warn!(
            module = %module_name,
            kind = issue.kind().as_str(),
            field_id = issue.field_id(),
            "{}",
            issue.message()
        );
    }

    let report = InspectionReport {
        fixes,
        build: service.last_build_report(),
        code_set_warnings,
        validation,
        analysis: service.analyze(),
    };
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|error| AppError::Internal(format!("failed to render report: {error}")))?;
    println!("{rendered}");

    if !report.validation.is_valid() {
        return Err(AppError::Validation(format!(
            "module '{module_name}' has {} structural errors",
            report.validation.errors.len()
        )));
    }

    Ok(())
}

impl InspectorConfig {
    fn load() -> AppResult<Self> {
        let schema_path = required_env("FORMLOOM_SCHEMA_PATH")?;
        let code_sets_path = env::var("FORMLOOM_CODE_SETS_PATH")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let apply_fixes = env::var("FORMLOOM_APPLY_FIXES")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");
        let hierarchy = HierarchyConfig {
            max_depth: parse_env_usize("FORMLOOM_MAX_DEPTH", DEFAULT_MAX_DEPTH)?,
            ..HierarchyConfig::default()
        };
        hierarchy.validate()?;

        Ok(Self {
            schema_path,
            code_sets_path,
            apply_fixes,
            hierarchy,
        })
    }
}

fn read_schema(path: &str) -> AppResult<ModuleSchema> {
    let raw = fs::read_to_string(path)
        .map_err(|error| AppError::NotFound(format!("failed to read schema '{path}': {error}")))?;
    serde_json::from_str(&raw)
        .map_err(|error| AppError::Validation(format!("invalid schema '{path}': {error}")))
}

fn read_code_sets(path: &str) -> AppResult<InMemoryCodeSetProvider> {
    let raw = fs::read_to_string(path).map_err(|error| {
        AppError::NotFound(format!("failed to read code sets '{path}': {error}"))
    })?;
    let code_sets: HashMap<String, Vec<FieldOption>> = serde_json::from_str(&raw)
        .map_err(|error| AppError::Validation(format!("invalid code sets '{path}': {error}")))?;

    let mut provider = InMemoryCodeSetProvider::new();
    for (code_set_id, options) in code_sets {
        provider.insert(code_set_id, options);
    }
    Ok(provider)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_usize(name: &str, default: usize) -> AppResult<usize> {
    match env::var(name) {
        Ok(value) => value.parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
