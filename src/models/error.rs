use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Display, Clone, PartialEq)]
pub enum SError {
    #[display("Mod file for '{_0}' not found on disk")]
    NotFound(String),
    #[display("'{_0}' is not a valid mod file")]
    InvalidArchive(String),
    #[display("Disabling '{_0}' was cancelled")]
    ConfirmationDeclined(String),
    #[display("Backup file not found: {_0}")]
    RestoreTargetMissing(String),
    #[display("Database write failed: {_0}")]
    StoreWriteFailure(String),
    #[display("Cyclic dependency: {}", _0.join(" -> "))]
    CyclicDependency(Vec<String>),
    #[display("Nothing to undo")]
    NothingToUndo,
    #[display("Game path not set")]
    GamePathUnset,
    #[display("Zoo Tycoon 1 mod folder not set")]
    Zt1PathUnset,
    #[display("Bundle '{_0}' not found or empty")]
    BundleNotFound(String),
    #[display("Bundle '{_0}' already exists or is invalid")]
    BundleExists(String),
    #[display("IO error: {_0}")]
    IOError(String),
    #[display("Parse error: {_0}")]
    ParseError(String),
    #[display("Unexpected error: {}", _0.as_deref().unwrap_or("unknown"))]
    Unexpected(Option<String>),
}

impl std::error::Error for SError {}

impl From<std::io::Error> for SError {
    fn from(e: std::io::Error) -> Self {
        SError::IOError(e.to_string())
    }
}

impl From<rusqlite::Error> for SError {
    fn from(e: rusqlite::Error) -> Self {
        SError::StoreWriteFailure(e.to_string())
    }
}

impl From<zip::result::ZipError> for SError {
    fn from(e: zip::result::ZipError) -> Self {
        SError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for SError {
    fn from(e: serde_json::Error) -> Self {
        SError::ParseError(e.to_string())
    }
}

impl From<walkdir::Error> for SError {
    fn from(e: walkdir::Error) -> Self {
        SError::IOError(e.to_string())
    }
}

impl From<camino::FromPathBufError> for SError {
    fn from(e: camino::FromPathBufError) -> Self {
        SError::ParseError(e.to_string())
    }
}

impl From<std::path::StripPrefixError> for SError {
    fn from(e: std::path::StripPrefixError) -> Self {
        SError::ParseError(e.to_string())
    }
}

impl From<confy::ConfyError> for SError {
    fn from(e: confy::ConfyError) -> Self {
        SError::ParseError(e.to_string())
    }
}
