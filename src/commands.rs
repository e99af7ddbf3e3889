//! Entry points for the GUI shell. Every command returns a value or a typed
//! [`SError`]; failures are logged here before they cross the boundary.

use crate::config::AppSettings;
use crate::core::engine::Engine;
use crate::core::prompt::Prompt;
use crate::core::watcher::ModWatcher;
use crate::core::{backup, bundle};
use crate::models::bundle::{Bundle, BundleImport};
use crate::models::conflict::{ConflictReport, ConflictView};
use crate::models::entity::ContentsReport;
use crate::models::error::SError;
use crate::models::mod_dto::{ModDetails, ModView};
use crate::models::report::{CommandReport, InstallReport, ReconcileReport};
use camino::Utf8PathBuf;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Shared state handed to every command.
pub struct AppState {
    pub engine: Arc<Mutex<Option<Engine>>>,
    pub settings: Arc<Mutex<AppSettings>>,
    watcher: Mutex<Option<ModWatcher>>,
}

impl AppState {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            engine: Arc::new(Mutex::new(None)),
            settings: Arc::new(Mutex::new(settings)),
            watcher: Mutex::new(None),
        }
    }

    fn with_engine<T>(&self, f: impl FnOnce(&mut Engine) -> Result<T, SError>) -> Result<T, SError> {
        let mut guard = self.engine.lock();
        let engine = guard.as_mut().ok_or(SError::GamePathUnset)?;
        f(engine)
    }
}

fn logged<T>(what: &str, result: Result<T, SError>) -> Result<T, SError> {
    if let Err(e) = &result {
        error!("{what} failed: {e}");
    }
    result
}

/// Opens the engine for the configured game folder, asking for it if needed,
/// reconciles, and starts the directory watcher.
#[instrument(skip(state, prompt))]
pub fn init(state: &AppState, prompt: &dyn Prompt) -> Result<ReconcileReport, SError> {
    logged("init", open_engine(state, prompt))
}

fn open_engine(state: &AppState, prompt: &dyn Prompt) -> Result<ReconcileReport, SError> {
    let (engine, interval) = {
        let mut settings = state.settings.lock();
        let engine = Engine::from_settings(&mut settings, prompt)?;
        if let Err(e) = settings.save() {
            error!("Could not save settings: {e}");
        }
        (engine, Duration::from_secs(settings.watch_interval_secs.max(1)))
    };

    let report = engine.reconcile()?;
    if let Some(zt1) = &engine.zt1 {
        if let Err(e) = zt1.reconcile() {
            error!("ZT1 reconcile failed: {e}");
        }
    }
    *state.watcher.lock() = Some(engine.watch(interval)?);
    *state.engine.lock() = Some(engine);
    info!("Engine ready");
    Ok(report)
}

/// Drains watcher events on the caller's thread. `None` when nothing changed.
pub fn poll_watcher(state: &AppState) -> Result<Option<ReconcileReport>, SError> {
    let Some(event) = state.watcher.lock().as_ref().and_then(ModWatcher::try_next) else {
        return Ok(None);
    };
    while state.watcher.lock().as_ref().and_then(ModWatcher::try_next).is_some() {}

    logged("watcher refresh", state.with_engine(|e| e.apply_watch_event(&event)).map(Some))
}

pub fn shutdown(state: &AppState) {
    if let Some(watcher) = state.watcher.lock().take() {
        watcher.stop();
    }
    state.engine.lock().take();
}

#[instrument(skip(state))]
pub fn reconcile(state: &AppState) -> Result<ReconcileReport, SError> {
    logged("reconcile", state.with_engine(|e| e.reconcile()))
}

pub fn list_mods(state: &AppState) -> Result<Vec<ModView>, SError> {
    logged("list mods", state.with_engine(|e| e.registry.list_mods()))
}

pub fn mod_details(state: &AppState, name: String) -> Result<ModDetails, SError> {
    logged("mod details", state.with_engine(|e| e.registry.mod_details(&name)))
}

#[instrument(skip(state))]
pub fn enable_mod(state: &AppState, name: String) -> Result<CommandReport, SError> {
    logged("enable", state.with_engine(|e| e.enable(&name)))
}

#[instrument(skip(state, prompt))]
pub fn disable_mod(state: &AppState, name: String, prompt: &dyn Prompt) -> Result<CommandReport, SError> {
    logged("disable", state.with_engine(|e| e.disable(&name, prompt)))
}

#[instrument(skip(state))]
pub fn uninstall_mod(state: &AppState, name: String) -> Result<CommandReport, SError> {
    logged("uninstall", state.with_engine(|e| e.uninstall(&name)))
}

#[instrument(skip(state, prompt))]
pub fn install_mods(state: &AppState, paths: Vec<String>, prompt: &dyn Prompt) -> Result<InstallReport, SError> {
    logged("install", state.with_engine(|e| e.install(&paths, prompt)))
}

#[instrument(skip(state))]
pub fn undo(state: &AppState) -> Result<CommandReport, SError> {
    logged("undo", state.with_engine(|e| e.undo()))
}

/// Asks first: committing permanently deletes trashed archives.
#[instrument(skip(state, prompt))]
pub fn commit_history(state: &AppState, prompt: &dyn Prompt) -> Result<CommandReport, SError> {
    if !prompt.confirm(
        "Clear history?",
        "Uninstalled mods in the trash will be deleted permanently.",
    ) {
        return Err(SError::ConfirmationDeclined("history".to_string()));
    }
    logged("commit history", state.with_engine(|e| e.commit_history()))
}

#[instrument(skip(state))]
pub fn scan_conflicts(state: &AppState, view: ConflictView) -> Result<ConflictReport, SError> {
    logged("conflict scan", state.with_engine(|e| e.scan_conflicts(view)))
}

#[instrument(skip(state))]
pub fn classify_mods(state: &AppState) -> Result<ContentsReport, SError> {
    logged("classify", state.with_engine(|e| e.classify_mods()))
}

pub fn set_category(state: &AppState, name: String, category: String) -> Result<(), SError> {
    logged("set category", state.with_engine(|e| e.registry.set_category(&name, &category)))
}

pub fn set_tags(state: &AppState, name: String, tags: Vec<String>) -> Result<(), SError> {
    logged("set tags", state.with_engine(|e| e.registry.set_tags(&name, &tags)))
}

pub fn set_dependencies(state: &AppState, name: String, dependencies: Vec<String>) -> Result<(), SError> {
    logged(
        "set dependencies",
        state.with_engine(|e| e.registry.set_dependencies(&name, &dependencies)),
    )
}

pub fn export_load_order(state: &AppState) -> Result<Utf8PathBuf, SError> {
    logged("export load order", state.with_engine(|e| e.registry.export_load_order()))
}

pub fn find_duplicates(state: &AppState) -> Result<ReconcileReport, SError> {
    logged(
        "find duplicates",
        state.with_engine(|e| {
            let warnings = e.registry.index_mod_files(true)?;
            Ok(ReconcileReport {
                duplicates: e.registry.store.duplicate_groups()?,
                warnings,
                ..Default::default()
            })
        }),
    )
}

// --- Bundles ---

#[instrument(skip(state))]
pub fn create_bundle(state: &AppState, name: String, mods: Vec<String>) -> Result<CommandReport, SError> {
    logged("create bundle", state.with_engine(|e| bundle::create_bundle(e, &name, &mods)))
}

#[instrument(skip(state))]
pub fn delete_bundle(state: &AppState, name: String) -> Result<CommandReport, SError> {
    logged("delete bundle", state.with_engine(|e| bundle::delete_bundle(e, &name)))
}

pub fn list_bundles(state: &AppState) -> Result<Vec<Bundle>, SError> {
    logged("list bundles", state.with_engine(|e| bundle::list_bundles(e)))
}

#[instrument(skip(state, prompt))]
pub fn apply_bundle(
    state: &AppState,
    name: String,
    exclusive: bool,
    prompt: &dyn Prompt,
) -> Result<CommandReport, SError> {
    logged(
        "apply bundle",
        state.with_engine(|e| bundle::apply_bundle(e, &name, exclusive, prompt)),
    )
}

#[instrument(skip(state))]
pub fn export_bundle(state: &AppState, name: String, output: Utf8PathBuf) -> Result<CommandReport, SError> {
    logged("export bundle", state.with_engine(|e| bundle::export_bundle_json(e, &name, &output)))
}

#[instrument(skip(state))]
pub fn import_bundle(state: &AppState, input: Utf8PathBuf) -> Result<BundleImport, SError> {
    logged("import bundle", state.with_engine(|e| bundle::import_bundle_json(e, &input)))
}

#[instrument(skip(state))]
pub fn export_bundle_archive(
    state: &AppState,
    name: String,
    include: Option<Vec<String>>,
    output: Utf8PathBuf,
) -> Result<CommandReport, SError> {
    logged(
        "export bundle archive",
        state.with_engine(|e| bundle::export_bundle_archive(e, &name, include.as_deref(), &output)),
    )
}

// --- Backups ---

#[instrument(skip(state))]
pub fn backup_mods(state: &AppState, dest_dir: Utf8PathBuf) -> Result<Utf8PathBuf, SError> {
    logged("backup", state.with_engine(|e| backup::backup_mods(&e.registry, &dest_dir)))
}

#[instrument(skip(state))]
pub fn restore_mods(state: &AppState, backup_zip: Utf8PathBuf) -> Result<ReconcileReport, SError> {
    logged("restore", state.with_engine(|e| backup::restore_mods(&e.registry, &backup_zip)))
}

// --- Zoo Tycoon 1 ---

/// Stores the Zoo Tycoon 1 folders and starts managing its mods.
#[instrument(skip(state))]
pub fn set_zt1_paths(
    state: &AppState,
    install: Utf8PathBuf,
    mod_dir: Option<Utf8PathBuf>,
) -> Result<ReconcileReport, SError> {
    let mod_dir = {
        let mut settings = state.settings.lock();
        let mod_dir = logged("set ZT1 paths", settings.set_zt1_paths(&install, mod_dir.as_deref()))?;
        if let Err(e) = settings.save() {
            error!("Could not save settings: {e}");
        }
        mod_dir
    };
    logged(
        "attach ZT1",
        state.with_engine(|e| e.attach_zt1(&mod_dir)?.reconcile()),
    )
}

pub fn reconcile_zt1(state: &AppState) -> Result<ReconcileReport, SError> {
    logged("ZT1 reconcile", state.with_engine(|e| e.zt1()?.reconcile()))
}

pub fn list_zt1_mods(state: &AppState) -> Result<Vec<ModView>, SError> {
    logged("list ZT1 mods", state.with_engine(|e| e.zt1()?.list_mods()))
}

#[instrument(skip(state))]
pub fn enable_zt1_mod(state: &AppState, name: String) -> Result<CommandReport, SError> {
    logged("ZT1 enable", state.with_engine(|e| e.zt1()?.enable(&name)))
}

#[instrument(skip(state))]
pub fn disable_zt1_mod(state: &AppState, name: String) -> Result<CommandReport, SError> {
    logged("ZT1 disable", state.with_engine(|e| e.zt1()?.disable(&name)))
}

pub fn set_zt1_category(state: &AppState, name: String, category: String) -> Result<(), SError> {
    logged("ZT1 set category", state.with_engine(|e| e.zt1()?.set_category(&name, &category)))
}

pub fn set_zt1_tags(state: &AppState, name: String, tags: Vec<String>) -> Result<(), SError> {
    logged("ZT1 set tags", state.with_engine(|e| e.zt1()?.set_tags(&name, &tags)))
}
