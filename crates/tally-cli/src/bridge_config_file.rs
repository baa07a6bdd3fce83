//! Rules-file loading for the tally binary.

use std::path::Path;

use anyhow::{Context, Result};

use tally_core::RulesDocument;

pub(crate) fn load_rules_document(path: &Path) -> Result<RulesDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file {}", path.display()))?;
    let document: RulesDocument = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse rules file {}", path.display()))?;
    document
        .validate()
        .with_context(|| format!("invalid rules file {}", path.display()))?;
    Ok(document)
}
