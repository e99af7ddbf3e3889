pub mod archive;
pub mod backup;
pub mod bundle;
pub mod classifier;
pub mod conflicts;
pub mod engine;
pub mod file_index;
pub mod history;
pub mod locator;
pub mod mod_manager;
pub mod prompt;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod trash;
pub mod watcher;
pub mod zt1;
