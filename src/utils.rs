pub mod file;
pub mod hash;
pub mod time;
pub mod toml;
