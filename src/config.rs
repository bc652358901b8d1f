//! Configuration for the envbind tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (envbind.toml)
//! - Environment variables (ENVBIND__*)
//!
//! ## Example config file (envbind.toml):
//! ```toml
//! [output]
//! format = "text"
//! show_kinds = true
//!
//! [[vars]]
//! name = "PORT"
//! description = "TCP port to listen on"
//! kind = "u16"
//! default = "8080"
//!
//! [[vars]]
//! name = "DATABASE_URL"
//! description = "Postgres connection string"
//! kind = "string"
//! required = true
//! ```

use std::collections::BTreeMap;

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::binding::Registration;
use crate::error::{EnvError, Result};
use crate::registry::EnvRegistry;
use crate::value::{Target, Value, ValueKind};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvbindConfig {
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Declared variables
    #[serde(default)]
    pub vars: Vec<VarDecl>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Print each variable's kind in text output
    #[serde(default = "default_true")]
    pub show_kinds: bool,
}

/// Output format for usage and check reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A variable declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub kind: ValueKind,

    /// Default in textual form, converted with the kind's default converter.
    /// The kind's zero value when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default)]
    pub required: bool,
}

impl VarDecl {
    /// Initial value for the declared storage location
    pub fn initial_value(&self) -> Result<Value> {
        match &self.default {
            Some(raw) => Value::parse(self.kind, raw.trim()).map_err(|source| {
                EnvError::InvalidDefault {
                    name: self.name.clone(),
                    value: raw.clone(),
                    source,
                }
            }),
            None => Ok(self.kind.zero()),
        }
    }
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            show_kinds: true,
        }
    }
}

impl EnvbindConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["envbind.toml", ".envbind.toml", "config/envbind.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "envbind") {
            let xdg_config = config_dir.config_dir().join("envbind.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // ENVBIND__OUTPUT__FORMAT=json
        builder = builder.add_source(
            Environment::with_prefix("ENVBIND")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Register every declared variable
    ///
    /// Each declaration gets fresh storage holding its default. Returns the
    /// targets by name so callers can read them after parsing.
    pub fn declare(&self, registry: &mut EnvRegistry) -> Result<BTreeMap<String, Target>> {
        let mut targets = BTreeMap::new();
        for decl in &self.vars {
            let target = Target::from(decl.initial_value()?);
            registry.register(
                Registration::new(&decl.name, &decl.description, target.clone())
                    .required(decl.required),
            )?;
            targets.insert(decl.name.clone(), target);
        }
        Ok(targets)
    }

    /// A starter configuration for `init`
    pub fn sample() -> Self {
        Self {
            output: OutputConfig::default(),
            vars: vec![
                VarDecl {
                    name: "PORT".to_string(),
                    description: "TCP port to listen on".to_string(),
                    kind: ValueKind::U16,
                    default: Some("8080".to_string()),
                    required: false,
                },
                VarDecl {
                    name: "LOG_JSON".to_string(),
                    description: "Emit logs as JSON".to_string(),
                    kind: ValueKind::Bool,
                    default: Some("false".to_string()),
                    required: false,
                },
                VarDecl {
                    name: "DATABASE_URL".to_string(),
                    description: "Database connection string".to_string(),
                    kind: ValueKind::String,
                    default: None,
                    required: true,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MapEnv;

    #[test]
    fn test_default_config() {
        let config = EnvbindConfig::default();
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(config.output.show_kinds);
        assert!(config.vars.is_empty());
    }

    #[test]
    fn test_serialize_config() {
        let config = EnvbindConfig::sample();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[[vars]]"));
        assert!(toml_str.contains("kind = \"u16\""));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[output]
format = "json"

[[vars]]
name = "WORKERS"
kind = "usize"
default = "4"

[[vars]]
name = "API_KEY"
description = "secret"
kind = "string"
required = true
"#,
        )
        .unwrap();

        let config = EnvbindConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.vars.len(), 2);
        assert_eq!(config.vars[0].kind, ValueKind::Usize);
        assert!(config.vars[1].required);
    }

    #[test]
    fn test_declare_and_parse() {
        let config = EnvbindConfig::sample();
        let mut registry = EnvRegistry::new();
        let targets = config.declare(&mut registry).unwrap();

        assert_eq!(registry.names(), vec!["DATABASE_URL", "LOG_JSON", "PORT"]);
        assert_eq!(targets["PORT"].current(), Value::U16(8080));
        assert_eq!(
            registry.get("DATABASE_URL").unwrap().default_value(),
            &Value::String(String::new())
        );

        let env = MapEnv::new()
            .with("DATABASE_URL", "postgres://db")
            .with("PORT", "9090");
        registry.parse_from(&env).unwrap();
        assert_eq!(targets["PORT"].current(), Value::U16(9090));
        assert_eq!(targets["LOG_JSON"].current(), Value::Bool(false));
    }

    #[test]
    fn test_invalid_default() {
        let config = EnvbindConfig {
            output: OutputConfig::default(),
            vars: vec![VarDecl {
                name: "RETRIES".to_string(),
                description: String::new(),
                kind: ValueKind::U8,
                default: Some("many".to_string()),
                required: false,
            }],
        };
        let err = config.declare(&mut EnvRegistry::new()).unwrap_err();
        assert!(matches!(err, EnvError::InvalidDefault { .. }));
        assert!(err.to_string().contains("RETRIES"));
    }
}
