// File: src/config.rs
// Purpose: Router configuration parsing from route-tree.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::pattern::CompileOptions;

/// Router configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RouterConfig {
    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,
}

/// Pattern matching configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Whether routes are case-insensitive (default: true)
    #[serde(default = "default_true")]
    pub case_insensitive: bool,

    /// Reject a trailing delimiter the pattern does not spell out
    #[serde(default = "default_false")]
    pub strict: bool,

    /// Require every pattern to match the whole path instead of a prefix
    #[serde(default = "default_false")]
    pub end: bool,

    /// Prefix prepended to every top-level pattern (e.g., "/app")
    #[serde(default)]
    pub base_path: Option<String>,
}

/// Navigation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// History event observed for external path changes; empty disables it
    #[serde(default = "default_change_event")]
    pub change_event: String,

    /// Starting path of the default in-memory history
    #[serde(default = "default_initial_path")]
    pub initial_path: String,
}

// Default values
fn default_change_event() -> String {
    crate::navigation::POPSTATE.to_string()
}

fn default_initial_path() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            strict: false,
            end: false,
            base_path: None,
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            change_event: default_change_event(),
            initial_path: default_initial_path(),
        }
    }
}

impl From<&RoutingConfig> for CompileOptions {
    fn from(config: &RoutingConfig) -> Self {
        CompileOptions::default()
            .with_sensitive(!config.case_insensitive)
            .with_strict(config.strict)
            .with_end(config.end)
    }
}

impl RouterConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read router config file: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse router config file: {:?}", path))
    }

    /// Load configuration from default path (./route-tree.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("route-tree.toml")
    }

    /// Parse configuration from TOML text; blank text yields defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: RouterConfig = toml::from_str(content).context("Invalid router configuration")?;
        Ok(config)
    }

    /// Compile options derived from the routing section
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions::from(&self.routing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert!(config.routing.case_insensitive);
        assert!(!config.routing.strict);
        assert!(!config.routing.end);
        assert_eq!(config.navigation.change_event, "popstate");
        assert_eq!(config.navigation.initial_path, "/");
    }

    #[test]
    fn test_empty_config() {
        let config = RouterConfig::from_toml_str("  \n").unwrap();
        assert_eq!(config, RouterConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let toml = r#"
            [routing]
            case_insensitive = false
            base_path = "/app"

            [navigation]
            change_event = ""
        "#;
        let config = RouterConfig::from_toml_str(toml).unwrap();
        assert!(!config.routing.case_insensitive);
        assert_eq!(config.routing.base_path.as_deref(), Some("/app"));
        assert_eq!(config.navigation.change_event, "");
        assert_eq!(config.navigation.initial_path, "/");
    }

    #[test]
    fn test_compile_options_from_routing() {
        let routing = RoutingConfig {
            case_insensitive: false,
            strict: true,
            ..RoutingConfig::default()
        };
        let options = CompileOptions::from(&routing);
        assert!(options.sensitive);
        assert!(options.strict);
        assert!(!options.end);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = RouterConfig::from_toml_str("[routing]\nstrict = \"yes\"").unwrap_err();
        assert!(err.to_string().contains("Invalid router configuration"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = RouterConfig::load("/definitely/not/here/route-tree.toml").unwrap();
        assert_eq!(config, RouterConfig::default());
    }
}
