//! Generation configuration.
//!
//! Loaded from TOML by whatever bootstraps generation; every key has a
//! default so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

///
/// GenerateConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    /// Root for the schema manifest and the OpenAPI document.
    pub output_dir: PathBuf,

    /// Root for generated source subpaths (`controllers/`, `entities/`, ...).
    pub source_root: PathBuf,

    /// Rust path generated files use to reach each other.
    pub generated_module: String,

    pub schema: SchemaConfig,
    pub repository: RepositoryConfig,
    pub migrations: MigrationConfig,

    /// Forced module flags, keyed by module name.
    pub modules: BTreeMap<String, bool>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(".generated"),
            source_root: PathBuf::from("src/generated"),
            generated_module: "crate::generated".to_string(),
            schema: SchemaConfig::default(),
            repository: RepositoryConfig::default(),
            migrations: MigrationConfig::default(),
            modules: BTreeMap::new(),
        }
    }
}

impl GenerateConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&text)
    }

    /// Same configuration rooted somewhere else; used by tests and tooling
    /// that generate into scratch directories.
    #[must_use]
    pub fn rooted_at(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        self.output_dir = root.join(&self.output_dir);
        self.source_root = root.join(&self.source_root);
        self
    }

    #[must_use]
    pub fn migrations_dir(&self) -> PathBuf {
        self.source_root.join(&self.migrations.dir)
    }

    /// Forced value for a module flag, if configured.
    #[must_use]
    pub fn module_override(&self, name: &str) -> Option<bool> {
        self.modules.get(name).copied()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if syn::parse_str::<syn::Path>(&self.generated_module).is_err() {
            return Err(ConfigError::Invalid(format!(
                "generated_module '{}' is not a Rust path",
                self.generated_module
            )));
        }
        if self.schema.file_stem.is_empty() || self.schema.file_stem.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "schema.file_stem '{}' must be a plain file name",
                self.schema.file_stem
            )));
        }
        if self.migrations.dir.is_absolute() {
            return Err(ConfigError::Invalid(
                "migrations.dir must be relative to source_root".to_string(),
            ));
        }

        Ok(())
    }
}

///
/// SchemaConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    pub enabled: bool,
    pub file_stem: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file_stem: "schema".to_string(),
        }
    }
}

///
/// RepositoryConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    pub backend: RepositoryBackend,
}

///
/// RepositoryBackend
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryBackend {
    Document,
    #[default]
    Relational,
}

impl RepositoryBackend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Relational => "relational",
        }
    }
}

impl fmt::Display for RepositoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// MigrationConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("migrations"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = GenerateConfig::from_toml_str("").unwrap();

        assert_eq!(config, GenerateConfig::default());
        assert_eq!(
            config.migrations_dir(),
            PathBuf::from("src/generated/migrations")
        );
    }

    #[test]
    fn parses_overrides() {
        let config = GenerateConfig::from_toml_str(
            r#"
            output_dir = "out"

            [repository]
            backend = "document"

            [schema]
            file_stem = "contracts"

            [modules]
            graphql = false
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.repository.backend, RepositoryBackend::Document);
        assert_eq!(config.schema.file_stem, "contracts");
        assert!(config.schema.enabled);
        assert_eq!(config.module_override("graphql"), Some(false));
        assert_eq!(config.module_override("rpc"), None);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_paths() {
        assert!(matches!(
            GenerateConfig::from_toml_str("outputdir = \"x\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            GenerateConfig::from_toml_str("generated_module = \"not a path\""),
            Err(ConfigError::Invalid(_))
        ));
    }
}
