use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::partner::PartnerRecord;
use crate::ConfigError;

#[derive(Debug, Deserialize)]
pub struct PartnersFile {
    pub partners: Vec<PartnerRecord>,
}

/// Load and validate a partners seed file (YAML).
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_partners_file(path: &Path) -> Result<PartnersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PartnersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_partners_file(&content)
}

fn parse_partners_file(content: &str) -> Result<PartnersFile, ConfigError> {
    let partners_file: PartnersFile = serde_yaml::from_str(content)?;
    validate_partners(&partners_file)?;
    Ok(partners_file)
}

fn validate_partners(partners_file: &PartnersFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();
    let mut seen_documents = HashSet::new();

    for partner in &partners_file.partners {
        partner.validate().map_err(|e| {
            ConfigError::Validation(format!("partner '{}': {e}", partner.id))
        })?;

        if !seen_ids.insert(partner.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate partner id: '{}'",
                partner.id
            )));
        }

        if !seen_documents.insert(partner.document.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate partner document: '{}' (from partner '{}')",
                partner.document, partner.id
            )));
        }
    }

    Ok(())
}
