use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityCategory {
    Animal,
    Building,
    Scenery,
    Fence,
    Path,
    Foliage,
    Guest,
    Staff,
    Object,
}

/// A game entity defined by one markup document inside an archive.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EntityInfo {
    pub source_filename: String,
    pub category: EntityCategory,
    pub codename: String,
    pub display_name: String,
    pub description: Option<String>,
}

/// Everything classified inside a single archive.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ArchiveContents {
    pub mod_name: String,
    pub entities: Vec<EntityInfo>,
}

impl ArchiveContents {
    pub fn counts(&self) -> BTreeMap<EntityCategory, usize> {
        self.entities.iter().fold(BTreeMap::new(), |mut acc, e| {
            *acc.entry(e.category).or_insert(0) += 1;
            acc
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ContentsReport {
    pub archives: Vec<ArchiveContents>,
    pub invalid: Vec<String>,
}
