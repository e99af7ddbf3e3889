use serde::{Deserialize, Serialize};

/// One mod's claim on an in-archive path.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConflictContributor {
    pub mod_name: String,
    pub size: u64,
    pub enabled: bool,
}

/// A normalized path claimed by more than one mod.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub path: String,
    pub contributors: Vec<ConflictContributor>,
}

impl Conflict {
    pub fn mod_names(&self) -> Vec<&str> {
        self.contributors.iter().map(|c| c.mod_name.as_str()).collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConflictView {
    /// Every path with more than one contributor.
    #[default]
    All,
    /// Conflicts where every contributor is enabled.
    BothEnabled,
    /// Disabled contributors are dropped first; what remains must still collide.
    OnlyEnabled,
    /// Markup documents only; these redefine game entities.
    Critical,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
    pub scanned: usize,
    /// Mods whose archive could not be opened.
    pub invalid: Vec<String>,
    pub warnings: Vec<String>,
}
