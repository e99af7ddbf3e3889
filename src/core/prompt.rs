use camino::Utf8PathBuf;

/// User interaction the engine needs from its host.
pub trait Prompt {
    /// Asks a yes/no question. `false` aborts the pending operation.
    fn confirm(&self, title: &str, message: &str) -> bool;

    fn pick_directory(&self, title: &str) -> Option<Utf8PathBuf>;
}

/// Answers yes to everything. Used for headless runs and undo.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Prompt for AutoConfirm {
    fn confirm(&self, _title: &str, _message: &str) -> bool {
        true
    }

    fn pick_directory(&self, _title: &str) -> Option<Utf8PathBuf> {
        None
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysDecline;

impl Prompt for AlwaysDecline {
    fn confirm(&self, _title: &str, _message: &str) -> bool {
        false
    }

    fn pick_directory(&self, _title: &str) -> Option<Utf8PathBuf> {
        None
    }
}
