//! Engine configuration
//!
//! Loaded from a TOML file; any key left out falls back to the built-in
//! defaults below.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Built-in configuration
const DEFAULT_CONFIG: &str = r#"
[hierarchy]
# Extension that replaces the schematic file's extension to find its room
template_extension = "kicad_pcb.json"

[placement]
# Prefix of the group holding everything generated for one scope
group_prefix = "subpcb_"
# Map unmatched global template nets to same-named target nets
match_global_nets = true
"#;

/// Settings for discovering rooms
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HierarchyConfig {
    pub template_extension: String,
}

/// Settings for synthesis
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlacementConfig {
    pub group_prefix: String,
    pub match_global_nets: bool,
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub hierarchy: HierarchyConfig,
    pub placement: PlacementConfig,
}

/// TOML structure for deserializing partial configuration files
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    hierarchy: Option<TomlHierarchy>,
    placement: Option<TomlPlacement>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlHierarchy {
    template_extension: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlPlacement {
    group_prefix: Option<String>,
    match_global_nets: Option<bool>,
}

impl Config {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string, filling gaps from the defaults
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(h) = parsed.hierarchy {
            if let Some(ext) = h.template_extension {
                config.hierarchy.template_extension = ext;
            }
        }
        if let Some(p) = parsed.placement {
            if let Some(prefix) = p.group_prefix {
                config.placement.group_prefix = prefix;
            }
            if let Some(global) = p.match_global_nets {
                config.placement.match_global_nets = global;
            }
        }
        Ok(config)
    }

    /// Set the room file extension
    pub fn with_template_extension(mut self, extension: impl Into<String>) -> Self {
        self.hierarchy.template_extension = extension.into();
        self
    }

    /// Set the generated group name prefix
    pub fn with_group_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.placement.group_prefix = prefix.into();
        self
    }

    /// Enable or disable name matching of global nets
    pub fn with_match_global_nets(mut self, enabled: bool) -> Self {
        self.placement.match_global_nets = enabled;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        #[derive(Deserialize)]
        struct Full {
            hierarchy: HierarchyConfig,
            placement: PlacementConfig,
        }
        let full: Full = toml::from_str(DEFAULT_CONFIG).expect("Default config should be valid TOML");
        Self {
            hierarchy: full.hierarchy,
            placement: full.placement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hierarchy.template_extension, "kicad_pcb.json");
        assert_eq!(config.placement.group_prefix, "subpcb_");
        assert!(config.placement.match_global_nets);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_str(
            r#"
[placement]
group_prefix = "room:"
"#,
        )
        .expect("Should parse");
        assert_eq!(config.placement.group_prefix, "room:");
        assert!(config.placement.match_global_nets);
        assert_eq!(config.hierarchy.template_extension, "kicad_pcb.json");
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_key_is_error() {
        let result = Config::from_str("[placement]\ngroup_prefx = \"x\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_builder_pattern() {
        let config = Config::new()
            .with_template_extension("layout.json")
            .with_group_prefix("g_")
            .with_match_global_nets(false);
        assert_eq!(config.hierarchy.template_extension, "layout.json");
        assert_eq!(config.placement.group_prefix, "g_");
        assert!(!config.placement.match_global_nets);
    }
}
