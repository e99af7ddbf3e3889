use crate::core::engine::Engine;
use crate::core::prompt::{AutoConfirm, Prompt};
use crate::core::registry::ModRegistry;
use crate::core::watcher::WatchEvent;
use crate::core::{resolver, trash};
use crate::models::error::SError;
use crate::models::history::ActionHistoryEntry;
use crate::models::mod_dto::ModLocation;
use crate::models::paths::is_mod_archive;
use crate::models::report::{CommandReport, InstallReport, ReconcileReport, ToggleOutcome};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

/// Enables a mod and whatever it depends on. Only the request is recorded.
pub fn enable(engine: &mut Engine, name: &str) -> Result<CommandReport, SError> {
    let (plan, outcome) = resolver::enable(&engine.registry, name)?;
    engine.history.push(ActionHistoryEntry::Enable {
        mod_name: name.to_string(),
    });

    let mut message = match outcome {
        ToggleOutcome::Moved => format!("Enabled {name}"),
        ToggleOutcome::AlreadySatisfied => format!("{name} was already enabled"),
    };
    if !plan.cascaded().is_empty() {
        message.push_str(&format!(" (also enabled: {})", plan.cascaded().join(", ")));
    }
    Ok(CommandReport::new(message).with_affected(plan.steps))
}

/// Disables a mod, asking before its dependents are disabled with it.
pub fn disable(engine: &mut Engine, name: &str, prompt: &dyn Prompt) -> Result<CommandReport, SError> {
    let (plan, outcome) = resolver::disable(&engine.registry, name, prompt)?;
    engine.history.push(ActionHistoryEntry::Disable {
        mod_name: name.to_string(),
    });

    let mut message = match outcome {
        ToggleOutcome::Moved => format!("Disabled {name}"),
        ToggleOutcome::AlreadySatisfied => format!("{name} was already disabled"),
    };
    if !plan.cascaded().is_empty() {
        message.push_str(&format!(" (also disabled: {})", plan.cascaded().join(", ")));
    }

    let warnings = plan
        .skipped
        .iter()
        .map(|m| format!("Dependent {m} is missing on disk"))
        .collect();
    Ok(CommandReport::new(message)
        .with_affected(plan.steps)
        .with_warnings(warnings))
}

/// Archive moved to trash and record dropped. `None` when there was no file.
struct Trashed {
    trash_path: Utf8PathBuf,
    was_enabled: bool,
}

fn remove_to_trash(registry: &ModRegistry, name: &str) -> Result<Option<Trashed>, SError> {
    let trashed = match registry.find_mod_file(name) {
        ModLocation::Active(path) => Some(Trashed {
            trash_path: trash::move_to_trash(&registry.data.trash, &path)?,
            was_enabled: true,
        }),
        ModLocation::Disabled(path) => Some(Trashed {
            trash_path: trash::move_to_trash(&registry.data.trash, &path)?,
            was_enabled: false,
        }),
        ModLocation::Missing => None,
    };

    registry.store.delete_mod(name)?;
    Ok(trashed)
}

/// Moves a mod's archive to the trash so the removal can be undone.
pub fn uninstall(engine: &mut Engine, name: &str) -> Result<CommandReport, SError> {
    let known = engine.registry.store.contains(name)?;

    match remove_to_trash(&engine.registry, name)? {
        Some(Trashed {
            trash_path,
            was_enabled,
        }) => {
            info!("Uninstalled {name} to {trash_path}");
            engine.history.push(ActionHistoryEntry::Uninstall {
                mod_name: name.to_string(),
                trash_path,
                was_enabled,
            });
            Ok(CommandReport::new(format!("Uninstalled {name}")).with_affected(vec![name.to_string()]))
        }
        None if known => {
            warn!("Uninstall of {name}: no archive on disk, record removed");
            Ok(CommandReport::new(format!("{name} was not on disk; removed from the list"))
                .with_affected(vec![name.to_string()]))
        }
        None => Err(SError::NotFound(name.to_string())),
    }
}

/// True when both paths resolve to the same file on disk.
fn is_same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    match (dunce::canonicalize(a), dunce::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Drag-and-drop payloads can arrive wrapped in braces.
fn clean_input_path(raw: &str) -> &str {
    raw.trim().trim_start_matches('{').trim_end_matches('}').trim()
}

/// Copies archives into the active directory and records one history entry.
pub fn install<S: AsRef<str>>(
    engine: &mut Engine,
    paths: &[S],
    prompt: &dyn Prompt,
) -> Result<InstallReport, SError> {
    let mut report = InstallReport::default();

    for raw in paths {
        let cleaned = clean_input_path(raw.as_ref());
        if cleaned.is_empty() {
            continue;
        }

        let src = Utf8Path::new(cleaned);
        if !src.is_file() {
            report.errors.push(format!("{cleaned}: file not found"));
            continue;
        }

        let Some(name) = src.file_name() else {
            report.errors.push(format!("{cleaned}: not a file name"));
            continue;
        };
        if !is_mod_archive(name) {
            debug!("Skipping non-mod file {cleaned}");
            report.skipped.push(name.to_string());
            continue;
        }

        let dst = engine.registry.paths.active.join(name);
        if is_same_file(src, &dst) {
            report.errors.push(format!("{name}: already installed from this location"));
            continue;
        }

        let existing = engine.registry.find_mod_file(name);
        if existing != ModLocation::Missing
            && !prompt.confirm(
                "Overwrite mod?",
                &format!("'{name}' is already installed. Replace it?"),
            )
        {
            report.skipped.push(name.to_string());
            continue;
        }

        if let Err(e) = std::fs::copy(src, &dst) {
            report.errors.push(format!("{name}: {e}"));
            continue;
        }
        info!("Installed {name}");
        report.installed.push(name.to_string());

        if let ModLocation::Disabled(stale) = existing {
            if let Err(e) = std::fs::remove_file(&stale) {
                warn!("Failed to remove disabled copy {stale}: {e}");
                report.errors.push(format!("{name}: disabled copy left in place: {e}"));
            }
        }
    }

    info!("{}", report.summary());
    if !report.installed.is_empty() {
        let reconciled = engine.registry.reconcile()?;
        report.errors.extend(reconciled.warnings);
        engine.history.push(ActionHistoryEntry::Install {
            mod_names: report.installed.clone(),
        });
    }

    Ok(report)
}

/// Reverts the most recent action. On failure the entry goes back on the stack.
pub fn undo(engine: &mut Engine) -> Result<CommandReport, SError> {
    let entry = engine.history.pop().ok_or(SError::NothingToUndo)?;

    match invert(&engine.registry, &entry) {
        Ok(report) => {
            info!("Undid {entry}");
            Ok(report)
        }
        Err(e) => {
            warn!("Undo of {entry} failed: {e}");
            engine.history.restore(entry);
            Err(e)
        }
    }
}

fn invert(registry: &ModRegistry, entry: &ActionHistoryEntry) -> Result<CommandReport, SError> {
    match entry {
        ActionHistoryEntry::Enable { mod_name } => {
            let (plan, _) = resolver::disable(registry, mod_name, &AutoConfirm)?;
            Ok(CommandReport::new(format!("Undid enable of {mod_name}")).with_affected(plan.steps))
        }
        ActionHistoryEntry::Disable { mod_name } => {
            let (plan, _) = resolver::enable(registry, mod_name)?;
            Ok(CommandReport::new(format!("Undid disable of {mod_name}")).with_affected(plan.steps))
        }
        ActionHistoryEntry::Uninstall {
            mod_name,
            trash_path,
            was_enabled,
        } => {
            let dst = registry.paths.dir_for(*was_enabled).join(mod_name);
            trash::restore(trash_path, &dst)?;
            registry.store.set_enabled(mod_name, *was_enabled)?;
            Ok(CommandReport::new(format!("Restored {mod_name}")).with_affected(vec![mod_name.clone()]))
        }
        ActionHistoryEntry::Install { mod_names } => {
            let mut warnings = Vec::new();
            let mut moved: Vec<(String, Utf8PathBuf, Utf8PathBuf)> = Vec::new();

            for name in mod_names {
                let src = match registry.find_mod_file(name) {
                    ModLocation::Active(path) | ModLocation::Disabled(path) => path,
                    ModLocation::Missing => {
                        warnings.push(format!("{name} was already gone"));
                        continue;
                    }
                };
                match trash::move_to_trash(&registry.data.trash, &src) {
                    Ok(trash_path) => moved.push((name.clone(), src, trash_path)),
                    Err(e) => {
                        roll_back_trashed(&moved);
                        return Err(e);
                    }
                }
            }

            for name in mod_names {
                registry.store.delete_mod(name)?;
            }
            Ok(CommandReport::new(format!("Undid install of {} mod(s)", mod_names.len()))
                .with_affected(mod_names.clone())
                .with_warnings(warnings))
        }
    }
}

/// Puts archives trashed by a failed batch back where they were.
fn roll_back_trashed(moved: &[(String, Utf8PathBuf, Utf8PathBuf)]) {
    for (name, original, trash_path) in moved.iter().rev() {
        if let Err(e) = trash::restore(trash_path, original) {
            warn!("Could not put {name} back from {trash_path}: {e}");
        }
    }
}

/// Forgets all history and permanently deletes what is in the trash.
pub fn commit_history(engine: &mut Engine) -> Result<CommandReport, SError> {
    let entries = engine.history.clear();
    let purged = trash::empty(&engine.registry.data.trash)?;
    info!("Committed {entries} history entries, purged {purged} trash file(s)");
    Ok(CommandReport::new(format!(
        "Cleared {entries} action(s); {purged} file(s) permanently deleted"
    )))
}

/// Applies a change seen by the watcher by reconciling against disk.
pub fn apply_watch_event(engine: &Engine, event: &WatchEvent) -> Result<ReconcileReport, SError> {
    let WatchEvent::Changed(snapshot) = event;
    debug!("Watcher saw {} archive(s)", snapshot.len());
    engine.registry.reconcile()
}
