use camino::Utf8PathBuf;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One row of the `mods` table. `name` is the archive file name.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ModRecord {
    pub name: String,
    pub enabled: bool,
    pub category: String,
    pub tags: BTreeSet<String>,
    pub fingerprint: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum ModStatus {
    Enabled,
    Disabled,
    Missing,
}

/// Where the archive for a mod physically lives right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModLocation {
    Active(Utf8PathBuf),
    Disabled(Utf8PathBuf),
    Missing,
}

impl ModLocation {
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            ModLocation::Active(p) | ModLocation::Disabled(p) => Some(p),
            ModLocation::Missing => None,
        }
    }

    pub fn status(&self) -> ModStatus {
        match self {
            ModLocation::Active(_) => ModStatus::Enabled,
            ModLocation::Disabled(_) => ModStatus::Disabled,
            ModLocation::Missing => ModStatus::Missing,
        }
    }
}

/// A record joined with what is on disk, ready for a table row.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModView {
    pub record: ModRecord,
    pub status: ModStatus,
    pub size: Option<u64>,
    pub modified: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModDetails {
    pub name: String,
    pub path: Utf8PathBuf,
    pub size: u64,
    pub modified: i64,
    pub bundles: Vec<String>,
    pub readme: Option<String>,
}
