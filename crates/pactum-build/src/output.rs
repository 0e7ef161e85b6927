//! Artifact output.
//!
//! Every file lands through a temp file in the destination directory and a
//! rename, so readers never observe a half-written artifact.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// Write `contents` to `path`, replacing any existing file atomically.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = temp_in_parent(path)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// Like [`write_atomic`] but fails with `AlreadyExists` instead of replacing.
pub fn write_atomic_new(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = temp_in_parent(path)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist_noclobber(path).map_err(|e| e.error)?;

    Ok(())
}

fn temp_in_parent(path: &Path) -> io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    NamedTempFile::new_in(dir)
}

///
/// ArtifactWriter
///
/// Records every path written during a run, in write order.
///

#[derive(Debug, Default)]
pub struct ArtifactWriter {
    written: Vec<PathBuf>,
}

impl ArtifactWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        write_atomic(path, contents)?;
        tracing::debug!(path = %path.display(), "artifact written");
        self.written.push(path.to_path_buf());

        Ok(())
    }

    /// Record a path written through some other route, such as a
    /// no-clobber migration write.
    pub fn record(&mut self, path: PathBuf) {
        tracing::debug!(path = %path.display(), "artifact created");
        self.written.push(path);
    }

    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    #[must_use]
    pub fn into_written(self) -> Vec<PathBuf> {
        self.written
    }
}
