use std::{fs, path::Path};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

use super::schema::{SchemaViolation, csr_schema};
use super::types::CsrDescriptor;

/// The document does not satisfy the CSR schema. Never transient: the
/// input has to be corrected.
#[derive(Debug, Error)]
#[error("{}", describe(.violations))]
pub struct ValidationError {
    violations: Vec<SchemaViolation>,
}

impl ValidationError {
    /// All violations found, first one first. Never empty.
    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }

    pub fn first(&self) -> &SchemaViolation {
        &self.violations[0]
    }

    fn binding() -> Self {
        Self {
            violations: vec![SchemaViolation {
                path: "<document>".to_string(),
                expected: "CSR descriptor",
                found: "unbindable value",
            }],
        }
    }
}

fn describe(violations: &[SchemaViolation]) -> String {
    match violations {
        [] => "invalid CSR document".to_string(),
        [only] => format!("invalid CSR document: {only}"),
        [first, rest @ ..] => format!(
            "invalid CSR document: {first} (and {} more violation{})",
            rest.len(),
            if rest.len() == 1 { "" } else { "s" }
        ),
    }
}

/// Checks a decoded JSON document against the CSR schema and binds it
/// into a [`CsrDescriptor`]. Pure: no I/O, the input is not modified.
pub fn validate(document: &Value) -> Result<CsrDescriptor, ValidationError> {
    let violations = csr_schema().check(document);
    if !violations.is_empty() {
        warn!(
            "[csr] document rejected with {} violation(s); first: {}",
            violations.len(),
            violations[0]
        );
        return Err(ValidationError { violations });
    }

    let descriptor: CsrDescriptor = serde_json::from_value(document.clone())
        .map_err(|err| {
            warn!("[csr] schema-valid document failed to bind: {err}");
            ValidationError::binding()
        })?;
    debug!(
        "[csr] validated descriptor CN={} names={} hosts={}",
        descriptor.common_name,
        descriptor.names.len(),
        descriptor.hosts.len()
    );
    Ok(descriptor)
}

/// Reads a UTF-8 JSON document from disk without interpreting it.
pub fn load_document(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read CSR file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse CSR file {} as JSON", path.display()))
}
