use camino::Utf8PathBuf;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A reversible registry mutation, kept in insertion order by the action history.
#[derive(Serialize, Deserialize, Clone, Debug, Display, PartialEq, Eq)]
pub enum ActionHistoryEntry {
    #[display("enable {mod_name}")]
    Enable { mod_name: String },
    #[display("disable {mod_name}")]
    Disable { mod_name: String },
    #[display("uninstall {mod_name}")]
    Uninstall {
        mod_name: String,
        trash_path: Utf8PathBuf,
        was_enabled: bool,
    },
    #[display("install {} mod(s)", mod_names.len())]
    Install { mod_names: Vec<String> },
}

impl ActionHistoryEntry {
    /// The trash file this entry owns, if any.
    pub fn trash_path(&self) -> Option<&Utf8PathBuf> {
        match self {
            ActionHistoryEntry::Uninstall { trash_path, .. } => Some(trash_path),
            _ => None,
        }
    }
}
