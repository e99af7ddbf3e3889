use serde::{Deserialize, Serialize};

/// A named set of mods that can be enabled together.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Bundle {
    pub name: String,
    pub mods: Vec<String>,
}

/// On-disk JSON form used by bundle export and import.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BundlePayload {
    pub name: Option<String>,
    #[serde(default)]
    pub mods: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BundleImport {
    pub name: String,
    pub added: Vec<String>,
    pub missing: Vec<String>,
}
