#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;
use z2f_keeper_lib::core::engine::Engine;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub struct TestEnv {
    _tmp: TempDir,
    pub root: Utf8PathBuf,
    pub engine: Engine,
}

impl TestEnv {
    pub fn active(&self) -> &Utf8Path {
        &self.engine.registry.paths.active
    }

    pub fn disabled(&self) -> &Utf8Path {
        &self.engine.registry.paths.disabled
    }

    pub fn trash(&self) -> &Utf8Path {
        &self.engine.registry.data.trash
    }

    /// Writes a small archive into the active or disabled directory.
    pub fn add_mod(&self, name: &str, enabled: bool) -> Utf8PathBuf {
        let dir = if enabled { self.active() } else { self.disabled() };
        let path = dir.join(name);
        write_archive(&path, &[("readme.txt", name)]);
        path
    }

    pub fn add_mod_with(&self, name: &str, enabled: bool, members: &[(&str, &str)]) -> Utf8PathBuf {
        let dir = if enabled { self.active() } else { self.disabled() };
        let path = dir.join(name);
        write_archive(&path, members);
        path
    }

    pub fn is_enabled_on_disk(&self, name: &str) -> bool {
        self.active().join(name).is_file() && !self.disabled().join(name).exists()
    }

    pub fn is_disabled_on_disk(&self, name: &str) -> bool {
        self.disabled().join(name).is_file() && !self.active().join(name).exists()
    }

    pub fn stored_enabled(&self, name: &str) -> Option<bool> {
        self.engine
            .registry
            .store
            .get_mod(name)
            .unwrap()
            .map(|m| m.enabled)
    }

    pub fn trash_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.trash())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }
}

/// Fresh game and data directories with an opened engine.
pub fn setup_engine() -> TestEnv {
    let tmp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();

    let game_root = root.join("game");
    let data_root = root.join("data");
    std::fs::create_dir_all(&game_root).unwrap();

    let engine = Engine::open(&game_root, &data_root).expect("engine opens");
    TestEnv {
        _tmp: tmp,
        root,
        engine,
    }
}

pub fn write_archive(path: &Utf8Path, members: &[(&str, &str)]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, body) in members {
        zip.start_file(*name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

pub fn names(list: &[String]) -> Vec<&str> {
    list.iter().map(String::as_str).collect()
}
