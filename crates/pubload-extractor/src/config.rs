//! Configuration for the Extractor

use serde::{Deserialize, Serialize};

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Attribute holding the publication key
    pub key_attribute: String,

    /// Child tag that carries one author name
    pub author_tag: String,

    /// Strip surrounding whitespace from field values and author names
    pub trim_values: bool,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !is_xml_name(&self.key_attribute) {
            return Err(format!(
                "key_attribute '{}' is not a valid attribute name",
                self.key_attribute
            ));
        }
        if !is_xml_name(&self.author_tag) {
            return Err(format!("author_tag '{}' is not a valid tag name", self.author_tag));
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// DBLP layout, values stored exactly as extracted
    fn default() -> Self {
        Self {
            key_attribute: "key".to_string(),
            author_tag: "author".to_string(),
            trim_values: false,
        }
    }
}

impl ExtractorConfig {
    /// Trimmed preset: DBLP layout with whitespace stripped from values
    pub fn trimmed() -> Self {
        Self {
            trim_values: true,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}
