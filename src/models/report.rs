use serde::{Deserialize, Serialize};

/// What a command hands back to the GUI.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CommandReport {
    pub message: String,
    pub affected: Vec<String>,
    pub warnings: Vec<String>,
}

impl CommandReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_affected(mut self, affected: Vec<String>) -> Self {
        self.affected = affected;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

/// Result of moving one archive between the active and disabled directories.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    Moved,
    /// The archive was already where it needed to be; only the flag was written.
    AlreadySatisfied,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub fingerprint: String,
    pub mods: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    pub duplicates: Vec<DuplicateGroup>,
    pub warnings: Vec<String>,
}

impl ReconcileReport {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
}

impl InstallReport {
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.installed.is_empty() {
            parts.push(format!("Installed: {} mod(s)", self.installed.len()));
        }
        if !self.skipped.is_empty() {
            parts.push(format!("Skipped: {}", self.skipped.len()));
        }
        if !self.errors.is_empty() {
            parts.push(format!("Errors: {}", self.errors.len()));
        }
        if parts.is_empty() {
            return "Nothing to install".to_string();
        }
        parts.join(", ")
    }
}
