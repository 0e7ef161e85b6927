//! Schema manifest.
//!
//! One document holding every contract plus the module flags, written as
//! JSON and YAML side by side. The JSON copy is written first; if the YAML
//! copy then fails the JSON stays in place and the error says so.

use crate::{ModuleFlags, output};
use pactum_schema::node::Contract;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

///
/// ManifestError
///

#[derive(Debug, ThisError)]
pub enum ManifestError {
    #[error("manifest i/o failed at '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("manifest json at '{path}' is invalid: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("manifest yaml at '{path}' is invalid: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("manifest written to '{json}' but its yaml copy failed: {source}")]
    PartialWrite {
        json: PathBuf,
        source: Box<ManifestError>,
    },
}

///
/// Manifest
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Manifest {
    pub contracts: BTreeMap<String, Contract>,
    pub modules: ModuleFlags,
}

impl Manifest {
    #[must_use]
    pub fn new<'a>(contracts: impl IntoIterator<Item = &'a Contract>, modules: ModuleFlags) -> Self {
        Self {
            contracts: contracts
                .into_iter()
                .map(|c| (c.name().to_string(), c.clone()))
                .collect(),
            modules,
        }
    }

    /// Read a manifest, JSON or YAML by extension.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if is_yaml {
            serde_yaml::from_str(&text).map_err(|source| ManifestError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_json::from_str(&text).map_err(|source| ManifestError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    /// The last manifest written to `dir`, if there is one.
    pub fn load_previous(dir: &Path, file_stem: &str) -> Result<Option<Self>, ManifestError> {
        let path = dir.join(format!("{file_stem}.json"));
        if !path.exists() {
            return Ok(None);
        }

        Self::read(path).map(Some)
    }

    #[must_use]
    pub fn contract(&self, name: &str) -> Option<&Contract> {
        self.contracts.get(name)
    }
}

///
/// ManifestWriter
///

#[derive(Clone, Debug)]
pub struct ManifestWriter {
    dir: PathBuf,
    file_stem: String,
}

impl ManifestWriter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, file_stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_stem: file_stem.into(),
        }
    }

    #[must_use]
    pub fn json_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.file_stem))
    }

    #[must_use]
    pub fn yaml_path(&self) -> PathBuf {
        self.dir.join(format!("{}.yaml", self.file_stem))
    }

    /// Write both copies, creating the directory if needed. Returns the
    /// JSON path.
    pub fn write<'a>(
        &self,
        contracts: impl IntoIterator<Item = &'a Contract>,
        modules: ModuleFlags,
    ) -> Result<PathBuf, ManifestError> {
        self.write_manifest(&Manifest::new(contracts, modules))
    }

    pub fn write_manifest(&self, manifest: &Manifest) -> Result<PathBuf, ManifestError> {
        fs::create_dir_all(&self.dir).map_err(|source| ManifestError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json_path = self.json_path();
        let json = serde_json::to_string_pretty(manifest).map_err(|source| ManifestError::Json {
            path: json_path.clone(),
            source,
        })?;
        output::write_atomic(&json_path, &format!("{json}\n")).map_err(|source| {
            ManifestError::Io {
                path: json_path.clone(),
                source,
            }
        })?;
        tracing::debug!(path = %json_path.display(), "manifest written");

        self.write_yaml(manifest)
            .map_err(|source| ManifestError::PartialWrite {
                json: json_path.clone(),
                source: Box::new(source),
            })?;

        Ok(json_path)
    }

    fn write_yaml(&self, manifest: &Manifest) -> Result<(), ManifestError> {
        let yaml_path = self.yaml_path();
        let yaml = serde_yaml::to_string(manifest).map_err(|source| ManifestError::Yaml {
            path: yaml_path.clone(),
            source,
        })?;
        output::write_atomic(&yaml_path, &yaml).map_err(|source| ManifestError::Io {
            path: yaml_path.clone(),
            source,
        })?;
        tracing::debug!(path = %yaml_path.display(), "manifest written");

        Ok(())
    }
}
