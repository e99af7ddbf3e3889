use crate::models::error::SError;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, File};
use std::io::{self, Read};
use zip::ZipArchive;

const README_PREVIEW_CHARS: usize = 2000;

/// One member of a mod archive as listed in its central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub size: u64,
    pub compressed_size: u64,
    pub is_dir: bool,
}

impl ArchiveEntry {
    pub fn is_markup(&self) -> bool {
        !self.is_dir && is_markup_path(&self.name)
    }
}

pub fn is_markup_path(name: &str) -> bool {
    name.to_lowercase().ends_with(".xml")
}

/// Read-only view over a `.z2f` container.
pub struct ArchiveInspector {
    path: Utf8PathBuf,
    archive: ZipArchive<File>,
}

impl ArchiveInspector {
    /// Opens `path` as a zip container. Anything that is not one is `InvalidArchive`.
    pub fn open(path: &Utf8Path) -> Result<Self, SError> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file).map_err(|_| {
            SError::InvalidArchive(path.file_name().unwrap_or(path.as_str()).to_string())
        })?;

        Ok(Self {
            path: path.to_owned(),
            archive,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    pub fn entries(&mut self) -> Result<Vec<ArchiveEntry>, SError> {
        (0..self.archive.len())
            .map(|i| {
                let file = self.archive.by_index(i)?;
                Ok(ArchiveEntry {
                    name: file.name().to_string(),
                    size: file.size(),
                    compressed_size: file.compressed_size(),
                    is_dir: file.is_dir(),
                })
            })
            .collect()
    }

    pub fn read(&mut self, name: &str) -> Result<Vec<u8>, SError> {
        let mut file = self.archive.by_name(name)?;
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Every embedded markup document as `(member name, bytes)`.
    /// Members that fail to decompress are skipped.
    pub fn markup_documents(&mut self) -> Result<Vec<(String, Vec<u8>)>, SError> {
        let names: Vec<String> = self
            .entries()?
            .into_iter()
            .filter(ArchiveEntry::is_markup)
            .map(|e| e.name)
            .collect();

        Ok(names
            .into_iter()
            .filter_map(|name| self.read(&name).ok().map(|bytes| (name, bytes)))
            .collect())
    }

    /// First `readme*.txt|md` member, decoded lossily and cut to a preview.
    pub fn readme(&mut self) -> Option<String> {
        let name = self.entries().ok()?.into_iter().find_map(|e| {
            let lower = e.name.to_lowercase();
            (!e.is_dir && lower.contains("readme") && (lower.ends_with(".txt") || lower.ends_with(".md")))
                .then_some(e.name)
        })?;

        let bytes = self.read(&name).ok()?;
        Some(
            String::from_utf8_lossy(&bytes)
                .chars()
                .take(README_PREVIEW_CHARS)
                .collect(),
        )
    }

    /// Extracts members into `destination`, optionally limited to `include`.
    /// Member names that would escape `destination` are skipped.
    pub fn extract_to(&mut self, destination: &Utf8Path, include: Option<&[String]>) -> Result<usize, SError> {
        let mut written = 0;

        for i in 0..self.archive.len() {
            let mut file = self.archive.by_index(i)?;

            if let Some(include) = include {
                if !include.iter().any(|n| n == file.name()) {
                    continue;
                }
            }

            // enclosed_name() rejects absolute paths and `..` components
            let Some(safe_path) = file.enclosed_name() else {
                continue;
            };

            let output_path = destination.as_std_path().join(&safe_path);

            if file.is_dir() {
                fs::create_dir_all(&output_path)?;
                continue;
            }

            if let Some(parent) = output_path.parent() {
                if !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }

            let mut outfile = File::create(&output_path)?;
            io::copy(&mut file, &mut outfile)?;
            written += 1;
        }

        Ok(written)
    }
}
