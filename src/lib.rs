//! BDD Context
//!
//! Context model builder and change-impact engine for Java web applications:
//! - Tree-sitter parsing of Java sources into classes, endpoints and dependencies
//! - A petgraph context graph with a durable JSON context map
//! - Reverse-dependency impact propagation from changed files to endpoints
//! - Selection of the BDD feature files that need regenerating

pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod extract;
pub mod graph;
pub mod impact;
pub mod parser;

pub use engine::{ImpactEngine, ImpactReport};
pub use error::{EngineError, Result};

use graph::HttpMethod;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub scan: ScanYamlConfig,
    pub output: OutputYamlConfig,
    pub artifacts: ArtifactsYamlConfig,
}

/// Source scanning section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanYamlConfig {
    pub root: String,
    pub include_tests: bool,
    pub follow_links: bool,
    pub parallel: bool,
}

impl Default for ScanYamlConfig {
    fn default() -> Self {
        Self {
            root: ".".into(),
            include_tests: false,
            follow_links: false,
            parallel: false,
        }
    }
}

/// Output section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputYamlConfig {
    pub context_map: String,
}

impl Default for OutputYamlConfig {
    fn default() -> Self {
        Self {
            context_map: "output/api_flow.json".into(),
        }
    }
}

/// Artifact key section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsYamlConfig {
    /// Verbs an unspecified endpoint expands to
    pub verbs: Vec<String>,
    /// Group prefixes stripped from artifact keys
    pub strip_prefixes: Vec<String>,
}

impl Default for ArtifactsYamlConfig {
    fn default() -> Self {
        Self {
            verbs: HttpMethod::CONCRETE.iter().map(|m| m.as_str().to_string()).collect(),
            strip_prefixes: impact::artifacts::DEFAULT_STRIP_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

// ============================================================================
// Runtime config (what the engine actually uses)
// ============================================================================

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub source_root: PathBuf,
    pub context_map: PathBuf,
    pub include_tests: bool,
    pub follow_links: bool,
    pub parallel: bool,
    pub artifact_verbs: Vec<HttpMethod>,
    pub strip_prefixes: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> anyhow::Result<Self> {
        let yaml = Self::load_yaml(yaml_path);
        Ok(Self::resolve(yaml, |name| std::env::var(name).ok()))
    }

    /// Merge a YAML config with variables looked up through `env`
    fn resolve(yaml: YamlConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str, default: bool| env(name).and_then(|v| parse_flag(&v)).unwrap_or(default);

        let artifact_verbs = yaml
            .artifacts
            .verbs
            .iter()
            .filter_map(|name| {
                let verb = HttpMethod::from_name(name);
                if verb.is_none() {
                    tracing::warn!("Ignoring unknown artifact verb '{}'", name);
                }
                verb
            })
            .collect();

        Self {
            source_root: env("BDD_SOURCE_ROOT").unwrap_or(yaml.scan.root).into(),
            context_map: env("BDD_CONTEXT_MAP")
                .unwrap_or(yaml.output.context_map)
                .into(),
            include_tests: flag("BDD_INCLUDE_TESTS", yaml.scan.include_tests),
            follow_links: yaml.scan.follow_links,
            parallel: flag("BDD_PARALLEL", yaml.scan.parallel),
            artifact_verbs,
            strip_prefixes: yaml.artifacts.strip_prefixes,
        }
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
scan:
  root: /srv/bank-app
  include_tests: true
  parallel: true

output:
  context_map: /tmp/out/api_flow.json

artifacts:
  verbs: [GET, post]
  strip_prefixes: ["api/v2"]
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.scan.root, "/srv/bank-app");
        assert!(config.scan.include_tests);
        assert!(!config.scan.follow_links);
        assert_eq!(config.output.context_map, "/tmp/out/api_flow.json");

        let config = Config::resolve(config, no_env);
        assert_eq!(config.source_root, PathBuf::from("/srv/bank-app"));
        assert!(config.parallel);
        assert_eq!(config.artifact_verbs, [HttpMethod::Get, HttpMethod::Post]);
        assert_eq!(config.strip_prefixes, ["api/v2"]);
    }

    #[test]
    fn test_yaml_defaults() {
        let config = Config::resolve(YamlConfig::default(), no_env);
        assert_eq!(config.source_root, PathBuf::from("."));
        assert_eq!(config.context_map, PathBuf::from("output/api_flow.json"));
        assert!(!config.include_tests);
        assert!(!config.parallel);
        assert_eq!(config.artifact_verbs, HttpMethod::CONCRETE);
        assert_eq!(config.strip_prefixes, ["api/v1"]);
    }

    #[test]
    fn test_env_overrides_yaml() {
        let yaml: YamlConfig = serde_yaml::from_str(
            r#"
scan:
  root: /from/yaml
  include_tests: true
output:
  context_map: yaml.json
"#,
        )
        .unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            ("BDD_SOURCE_ROOT", "/from/env"),
            ("BDD_INCLUDE_TESTS", "false"),
            ("BDD_PARALLEL", "1"),
        ]);

        let config = Config::resolve(yaml, |name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.source_root, PathBuf::from("/from/env"));
        assert_eq!(config.context_map, PathBuf::from("yaml.json"));
        assert!(!config.include_tests);
        assert!(config.parallel);
    }

    #[test]
    fn test_unparsable_flag_keeps_yaml_value() {
        let mut yaml = YamlConfig::default();
        yaml.scan.parallel = true;
        let config = Config::resolve(yaml, |name| {
            (name == "BDD_PARALLEL").then(|| "maybe".to_string())
        });
        assert!(config.parallel);
    }

    #[test]
    fn test_unknown_verbs_are_dropped() {
        let yaml: YamlConfig = serde_yaml::from_str("artifacts:\n  verbs: [GET, TRACE]\n").unwrap();
        let config = Config::resolve(yaml, no_env);
        assert_eq!(config.artifact_verbs, [HttpMethod::Get]);
    }

    #[test]
    fn test_malformed_yaml_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scan: [this is not a mapping").unwrap();
        let yaml = Config::load_yaml(Some(file.path()));
        assert_eq!(yaml.scan.root, ".");
    }

    #[test]
    fn test_missing_yaml_file_falls_back_to_defaults() {
        let yaml = Config::load_yaml(Some(Path::new("/definitely/not/config.yaml")));
        assert_eq!(yaml.output.context_map, "output/api_flow.json");
    }
}
