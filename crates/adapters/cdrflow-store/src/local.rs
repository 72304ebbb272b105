//! Filesystem-rooted object store.

use crate::ObjectStore;
use cdrflow_error::{Result, StoreError};
use rand::distr::Alphanumeric;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An [`ObjectStore`] rooted at a local directory.
///
/// Object locations and put paths are slash-separated paths relative to
/// the root. Used for local runs and as the storage fake in tests.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Creates a store rooted at `root`. The directory itself is created
    /// lazily on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

impl ObjectStore for LocalStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = self.absolute(prefix);
        let entries = fs::read_dir(&dir).map_err(|e| StoreError::List {
            prefix: prefix.to_string(),
            reason: e.to_string(),
        })?;

        let mut locations = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::List {
                prefix: prefix.to_string(),
                reason: e.to_string(),
            })?;
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                let name = entry.file_name();
                locations.push(format!("{}/{}", prefix, name.to_string_lossy()));
            }
        }
        // Stable order so catalogs are reproducible across runs
        locations.sort();
        debug!(prefix, count = locations.len(), "Listed prefix");
        Ok(locations)
    }

    fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        let path = self.absolute(location);
        if !path.exists() {
            return Err(StoreError::NotFound(location.to_string()).into());
        }
        fs::read(&path)
            .map_err(|e| {
                StoreError::Fetch {
                    location: location.to_string(),
                    reason: e.to_string(),
                }
                .into()
            })
    }

    fn put(&self, path: &str, bytes: &[u8]) -> Result<String> {
        let (dir_rel, file_name) = match path.rsplit_once('/') {
            Some((dir, name)) => (dir.to_string(), name.to_string()),
            None => (String::new(), path.to_string()),
        };

        let actual_dir_rel = make_safe_dir(&self.root, &dir_rel)?;
        let dir_abs = self.root.join(&actual_dir_rel);

        // Write to a temp name in the target directory, then rename: a
        // partial file is never visible under the final name.
        let tmp_name = format!(".tmp-{}", random_suffix());
        let tmp_path = dir_abs.join(&tmp_name);
        let final_path = dir_abs.join(&file_name);

        let write = || -> std::io::Result<()> {
            fs::write(&tmp_path, bytes)?;
            fs::rename(&tmp_path, &final_path)
        };
        write().map_err(|e| {
            // Best-effort cleanup of the temp file on failure
            let _ = fs::remove_file(&tmp_path);
            StoreError::Write {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })?;

        let actual = if actual_dir_rel.is_empty() {
            file_name
        } else {
            format!("{actual_dir_rel}/{file_name}")
        };
        debug!(path = %actual, bytes = bytes.len(), "Wrote object");
        Ok(actual)
    }
}

/// Creates `relative` (and its ancestors) under `root`, falling back to a
/// randomized sibling name whenever a component exists as a regular file.
///
/// Returns the relative directory actually usable, which differs from the
/// requested one only when a collision forced a fallback. A
/// directory-vs-file collision must never be fatal to the run.
fn make_safe_dir(root: &Path, relative: &str) -> Result<String> {
    if relative.is_empty() {
        fs::create_dir_all(root).map_err(StoreError::from)?;
        return Ok(String::new());
    }

    let mut resolved: Vec<String> = Vec::new();
    let mut current = root.to_path_buf();
    for component in relative.split('/') {
        let mut name = component.to_string();
        let candidate = current.join(&name);
        if candidate.exists() && !candidate.is_dir() {
            let alternate = format!("{name}_{}", random_suffix());
            warn!(
                collided = %candidate.display(),
                alternate = %alternate,
                "Path component exists as a file, using randomized alternate"
            );
            name = alternate;
        }
        current = current.join(&name);
        fs::create_dir_all(&current).map_err(StoreError::from)?;
        resolved.push(name);
    }
    Ok(resolved.join("/"))
}

/// Eight random alphanumerics, lowercased.
fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}
