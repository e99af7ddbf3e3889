use crate::core::locator::GameLocator;
use crate::core::prompt::Prompt;
use crate::models::error::SError;
use crate::models::paths::DEFAULT_HISTORY_CAPACITY;
use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

const APP_NAME: &str = "z2f_keeper";
const DEFAULT_WATCH_INTERVAL_SECS: u64 = 5;
const ZT1_EXECUTABLE: &str = "zoo.exe";
const ZT1_DEFAULT_MOD_DIR: &str = "dlupdates";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub version: u8,
    /// The game folder, which is also the active mod directory.
    pub game_path: Option<Utf8PathBuf>,
    /// Where the database, trash and caches live.
    pub data_dir: Option<Utf8PathBuf>,
    pub watch_interval_secs: u64,
    pub history_capacity: usize,
    /// Zoo Tycoon 1 install folder (holds `zoo.exe`).
    pub zt1_path: Option<Utf8PathBuf>,
    /// Zoo Tycoon 1 mod folder; `<zt1_path>/dlupdates` when unset.
    pub zt1_mod_dir: Option<Utf8PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: 0,
            game_path: None,
            data_dir: None,
            watch_interval_secs: DEFAULT_WATCH_INTERVAL_SECS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            zt1_path: None,
            zt1_mod_dir: None,
        }
    }
}

impl AppSettings {
    pub fn load() -> Result<AppSettings, SError> {
        Ok(confy::load(APP_NAME, None)?)
    }

    pub fn save(&self) -> Result<(), SError> {
        Ok(confy::store(APP_NAME, None, self)?)
    }

    pub fn load_from(path: &Utf8Path) -> Result<AppSettings, SError> {
        Ok(confy::load_path(path)?)
    }

    pub fn save_to(&self, path: &Utf8Path) -> Result<(), SError> {
        Ok(confy::store_path(path, self)?)
    }

    pub fn data_dir(&self) -> Utf8PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn resolve_game_path(&mut self, prompt: &dyn Prompt) -> Result<Utf8PathBuf, SError> {
        self.resolve_game_path_with(prompt, &GameLocator::zt2())
    }

    /// Returns the stored game path if it still exists, else a detected install,
    /// else asks for one. The folder is canonicalized and kept in `game_path`;
    /// saving is up to the caller.
    pub fn resolve_game_path_with(
        &mut self,
        prompt: &dyn Prompt,
        locator: &GameLocator,
    ) -> Result<Utf8PathBuf, SError> {
        if let Some(path) = self.game_path.as_ref().filter(|p| p.is_dir()) {
            return Ok(path.clone());
        }

        let picked = match locator.locate() {
            Some(found) => found,
            None => prompt
                .pick_directory("Select your Zoo Tycoon 2 folder")
                .ok_or(SError::GamePathUnset)?,
        };
        if !picked.is_dir() {
            return Err(SError::NotFound(picked.to_string()));
        }

        let canonical = Utf8PathBuf::try_from(dunce::canonicalize(&picked)?)?;
        info!("Game path set to {canonical}");
        self.game_path = Some(canonical.clone());
        Ok(canonical)
    }

    /// The Zoo Tycoon 1 mod folder, detecting the install when none is stored.
    /// `None` when Zoo Tycoon 1 is not around; its mods are optional.
    pub fn resolve_zt1_mod_dir(&mut self, locator: &GameLocator) -> Option<Utf8PathBuf> {
        if let Some(dir) = self.zt1_mod_dir.as_ref().filter(|d| d.is_dir()) {
            return Some(dir.clone());
        }

        let install = match self.zt1_path.as_ref().filter(|p| p.is_dir()) {
            Some(path) => path.clone(),
            None => {
                let found = locator.locate()?;
                self.zt1_path = Some(found.clone());
                found
            }
        };

        let dir = install.join(ZT1_DEFAULT_MOD_DIR);
        dir.is_dir().then_some(dir)
    }

    /// Stores explicit Zoo Tycoon 1 folders. The install must hold `zoo.exe`.
    pub fn set_zt1_paths(
        &mut self,
        install: &Utf8Path,
        mod_dir: Option<&Utf8Path>,
    ) -> Result<Utf8PathBuf, SError> {
        if !install.join(ZT1_EXECUTABLE).is_file() {
            return Err(SError::NotFound(install.join(ZT1_EXECUTABLE).to_string()));
        }
        let mod_dir = mod_dir
            .map(Utf8Path::to_owned)
            .unwrap_or_else(|| install.join(ZT1_DEFAULT_MOD_DIR));

        info!("Zoo Tycoon 1 paths set: install {install}, mods {mod_dir}");
        self.zt1_path = Some(install.to_owned());
        self.zt1_mod_dir = Some(mod_dir.clone());
        Ok(mod_dir)
    }
}

fn default_data_dir() -> Utf8PathBuf {
    let base = ProjectDirs::from("com", "z2f", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|exe_path| exe_path.parent().map(|p| p.to_path_buf()))
        })
        .unwrap_or_else(|| PathBuf::from("."));

    Utf8PathBuf::from_path_buf(base).unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prompt::{AlwaysDecline, AutoConfirm};

    struct PickDir(Utf8PathBuf);

    impl Prompt for PickDir {
        fn confirm(&self, _title: &str, _message: &str) -> bool {
            true
        }

        fn pick_directory(&self, _title: &str) -> Option<Utf8PathBuf> {
            Some(self.0.clone())
        }
    }

    #[test]
    fn round_trips_through_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = Utf8PathBuf::try_from(tmp.path().join("settings.toml")).unwrap();

        let settings = AppSettings {
            game_path: Some("/games/zt2".into()),
            watch_interval_secs: 9,
            ..Default::default()
        };
        settings.save_to(&file).unwrap();
        assert_eq!(AppSettings::load_from(&file).unwrap(), settings);
    }

    #[test]
    fn game_path_comes_from_prompt_when_unset() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();

        let none = GameLocator::disabled();
        let mut settings = AppSettings::default();
        assert_eq!(
            settings.resolve_game_path_with(&AutoConfirm, &none),
            Err(SError::GamePathUnset)
        );
        assert_eq!(
            settings.resolve_game_path_with(&AlwaysDecline, &none),
            Err(SError::GamePathUnset)
        );

        let resolved = settings.resolve_game_path_with(&PickDir(dir), &none).unwrap();
        assert_eq!(settings.game_path, Some(resolved));
    }

    #[test]
    fn detected_install_is_used_before_asking() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        std::fs::write(dir.join("zt.exe"), b"").unwrap();

        let locator = GameLocator {
            candidates: vec![dir],
            ..GameLocator::disabled()
        };
        let mut settings = AppSettings::default();
        let resolved = settings.resolve_game_path_with(&AlwaysDecline, &locator).unwrap();
        assert!(resolved.join("zt.exe").is_file());
        assert_eq!(settings.game_path, Some(resolved));
    }

    #[test]
    fn zt1_mod_dir_defaults_to_dlupdates() {
        let tmp = tempfile::tempdir().unwrap();
        let install = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let mut settings = AppSettings::default();

        assert!(settings.set_zt1_paths(&install, None).is_err());
        assert_eq!(settings.resolve_zt1_mod_dir(&GameLocator::disabled()), None);

        std::fs::write(install.join("zoo.exe"), b"").unwrap();
        std::fs::create_dir_all(install.join("dlupdates")).unwrap();
        let locator = GameLocator {
            marker: "zoo.exe".into(),
            candidates: vec![install.clone()],
            ..GameLocator::disabled()
        };
        assert_eq!(
            settings.resolve_zt1_mod_dir(&locator),
            Some(install.join("dlupdates"))
        );
        assert_eq!(settings.zt1_path, Some(install.clone()));

        let custom = install.join("custom");
        assert_eq!(settings.set_zt1_paths(&install, Some(&custom)).unwrap(), custom);
        assert_eq!(settings.zt1_mod_dir, Some(custom));
    }
}
