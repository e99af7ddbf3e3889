use crate::config::AppSettings;
use crate::core::conflicts;
use crate::core::history::ActionHistory;
use crate::core::locator::GameLocator;
use crate::core::mod_manager;
use crate::core::prompt::Prompt;
use crate::core::registry::ModRegistry;
use crate::core::watcher::{ModWatcher, WatchEvent};
use crate::core::zt1::Zt1Registry;
use crate::models::conflict::{ConflictReport, ConflictView};
use crate::models::entity::ContentsReport;
use crate::models::error::SError;
use crate::models::paths::{DataPathRules, GamePaths, DEFAULT_HISTORY_CAPACITY};
use crate::models::report::{CommandReport, InstallReport, ReconcileReport};
use camino::Utf8Path;
use std::time::Duration;
use tracing::info;

/// Everything a session needs: the registry and its undo history.
/// Built once the game path is known and passed to every operation.
pub struct Engine {
    pub registry: ModRegistry,
    pub history: ActionHistory,
    /// Present once a Zoo Tycoon 1 mod folder is known.
    pub zt1: Option<Zt1Registry>,
}

impl Engine {
    pub fn open(game_root: &Utf8Path, data_root: &Utf8Path) -> Result<Self, SError> {
        Self::with_capacity(game_root, data_root, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(
        game_root: &Utf8Path,
        data_root: &Utf8Path,
        history_capacity: usize,
    ) -> Result<Self, SError> {
        if !game_root.is_dir() {
            return Err(SError::NotFound(game_root.to_string()));
        }
        std::fs::create_dir_all(data_root)?;

        let paths = GamePaths::canonical(game_root)?;
        let data = DataPathRules::new(data_root);
        info!("Opening engine: mods at {}, data at {}", paths.active, data_root);

        Ok(Self {
            registry: ModRegistry::open(paths, data)?,
            history: ActionHistory::new(history_capacity),
            zt1: None,
        })
    }

    /// Resolves the game path through `prompt` when unset, then opens.
    pub fn from_settings(settings: &mut AppSettings, prompt: &dyn Prompt) -> Result<Self, SError> {
        let game_root = settings.resolve_game_path(prompt)?;
        let mut engine =
            Self::with_capacity(&game_root, &settings.data_dir(), settings.history_capacity)?;

        if let Some(mod_dir) = settings.resolve_zt1_mod_dir(&GameLocator::zt1()) {
            engine.attach_zt1(&mod_dir)?;
        }
        Ok(engine)
    }

    /// Starts managing Zoo Tycoon 1 mods in `mod_dir`, sharing the database.
    pub fn attach_zt1(&mut self, mod_dir: &Utf8Path) -> Result<&Zt1Registry, SError> {
        let zt1 = Zt1Registry::open(mod_dir, self.registry.store.clone())?;
        info!("Managing Zoo Tycoon 1 mods at {}", zt1.paths.active);
        let zt1 = self.zt1.insert(zt1);
        Ok(&*zt1)
    }

    pub fn zt1(&self) -> Result<&Zt1Registry, SError> {
        self.zt1.as_ref().ok_or(SError::Zt1PathUnset)
    }

    pub fn reconcile(&self) -> Result<ReconcileReport, SError> {
        self.registry.reconcile()
    }

    pub fn enable(&mut self, name: &str) -> Result<CommandReport, SError> {
        mod_manager::enable(self, name)
    }

    pub fn disable(&mut self, name: &str, prompt: &dyn Prompt) -> Result<CommandReport, SError> {
        mod_manager::disable(self, name, prompt)
    }

    pub fn uninstall(&mut self, name: &str) -> Result<CommandReport, SError> {
        mod_manager::uninstall(self, name)
    }

    pub fn install<S: AsRef<str>>(&mut self, paths: &[S], prompt: &dyn Prompt) -> Result<InstallReport, SError> {
        mod_manager::install(self, paths, prompt)
    }

    pub fn undo(&mut self) -> Result<CommandReport, SError> {
        mod_manager::undo(self)
    }

    pub fn commit_history(&mut self) -> Result<CommandReport, SError> {
        mod_manager::commit_history(self)
    }

    pub fn scan_conflicts(&self, view: ConflictView) -> Result<ConflictReport, SError> {
        conflicts::scan_conflicts(&self.registry, view)
    }

    pub fn classify_mods(&self) -> Result<ContentsReport, SError> {
        conflicts::classify_mods(&self.registry)
    }

    pub fn watch(&self, interval: Duration) -> Result<ModWatcher, SError> {
        ModWatcher::spawn(self.registry.paths.clone(), interval)
    }

    pub fn apply_watch_event(&self, event: &WatchEvent) -> Result<ReconcileReport, SError> {
        mod_manager::apply_watch_event(self, event)
    }
}
