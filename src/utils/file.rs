use crate::models::error::SError;
use crate::models::paths::is_mod_archive;
use camino::{Utf8Path, Utf8PathBuf};
use std::time::UNIX_EPOCH;

pub struct FileUtils;

/// A mod archive found while listing a mod directory.
#[derive(Debug, Clone)]
pub struct ArchiveFile {
    pub name: String,
    pub path: Utf8PathBuf,
    pub mtime: i64,
}

impl FileUtils {
    /// Moves a file, falling back to copy + delete when a rename crosses devices.
    pub fn move_file(src: &Utf8Path, dst: &Utf8Path) -> Result<(), SError> {
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if std::fs::rename(src, dst).is_ok() {
            return Ok(());
        }

        std::fs::copy(src, dst)?;
        std::fs::remove_file(src)?;
        Ok(())
    }

    /// Lists the mod archives directly inside `dir` (no recursion).
    pub fn list_mod_archives(dir: &Utf8Path) -> Result<Vec<ArchiveFile>, SError> {
        Self::list_archives_matching(dir, is_mod_archive)
    }

    /// Lists regular files directly inside `dir` whose name passes `filter`.
    pub fn list_archives_matching(
        dir: &Utf8Path,
        filter: fn(&str) -> bool,
    ) -> Result<Vec<ArchiveFile>, SError> {
        let mut found = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !filter(&name) {
                continue;
            }

            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }

            found.push(ArchiveFile {
                path: dir.join(&name),
                mtime: Self::mtime_nanos(&meta),
                name,
            });
        }

        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    pub fn mtime_nanos(meta: &std::fs::Metadata) -> i64 {
        meta.modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as i64)
            .unwrap_or_default()
    }
}
