use crate::models::error::SError;
use crate::utils::file::ArchiveFile;
use crate::utils::hash::file_fingerprint;
use crate::utils::toml::Toml;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct IndexedFile {
    pub mtime: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Fingerprints keyed by archive file name, invalidated per file when its mtime moves.
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
pub struct FileIndex {
    pub files: BTreeMap<String, IndexedFile>,
    #[serde(skip)]
    dirty: bool,
}

impl FileIndex {
    pub fn load(path: &Utf8Path) -> Self {
        Toml::read_or_default(path)
    }

    pub fn persist(&mut self, path: &Utf8Path) -> Result<(), SError> {
        if !self.dirty {
            return Ok(());
        }
        Toml::write(path, self)?;
        self.dirty = false;
        Ok(())
    }

    /// Returns the cached fingerprint when the mtime still matches, otherwise rehashes.
    /// `None` means the file could not be read.
    pub fn fingerprint(&mut self, file: &ArchiveFile, force: bool) -> Option<String> {
        if !force {
            if let Some(cached) = self.files.get(&file.name) {
                if cached.mtime == file.mtime {
                    return cached.fingerprint.clone();
                }
            }
        }

        let fingerprint = match file_fingerprint(&file.path) {
            Ok(f) => Some(f),
            Err(e) => {
                warn!("Failed to hash {}: {e}", file.path);
                None
            }
        };

        self.files.insert(
            file.name.clone(),
            IndexedFile {
                mtime: file.mtime,
                fingerprint: fingerprint.clone(),
            },
        );
        self.dirty = true;
        fingerprint
    }

    /// Drops entries for files that no longer exist in either directory.
    pub fn retain_names<'a>(&mut self, names: impl IntoIterator<Item = &'a String>) {
        let keep: std::collections::BTreeSet<&String> = names.into_iter().collect();
        let before = self.files.len();
        self.files.retain(|name, _| keep.contains(name));
        self.dirty |= before != self.files.len();
    }
}
