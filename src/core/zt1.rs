use crate::core::store::ModStore;
use crate::models::error::SError;
use crate::models::mod_dto::{ModLocation, ModView};
use crate::models::paths::{is_zt1_archive, GamePaths};
use crate::models::report::{CommandReport, ReconcileReport, ToggleOutcome};
use crate::utils::file::FileUtils;
use camino::Utf8Path;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Zoo Tycoon 1 `.ztd` mods: the mod folder and its `_disabled` subfolder,
/// mirrored into the `zt1_mods` table the same way the main registry mirrors `.z2f` files.
///
/// These mods carry no dependencies, fingerprints or undo history.
pub struct Zt1Registry {
    pub paths: GamePaths,
    pub store: ModStore,
}

impl Zt1Registry {
    pub fn open(mod_dir: &Utf8Path, store: ModStore) -> Result<Self, SError> {
        if !mod_dir.is_dir() {
            return Err(SError::NotFound(mod_dir.to_string()));
        }
        let paths = GamePaths::zt1(mod_dir);
        std::fs::create_dir_all(&paths.disabled)?;
        Ok(Self { paths, store })
    }

    pub fn find_mod_file(&self, name: &str) -> ModLocation {
        if name.is_empty() || name.contains(['/', '\\']) || !is_zt1_archive(name) {
            return ModLocation::Missing;
        }

        let active = self.paths.active.join(name);
        if active.is_file() {
            return ModLocation::Active(active);
        }
        let disabled = self.paths.disabled.join(name);
        if disabled.is_file() {
            return ModLocation::Disabled(disabled);
        }
        ModLocation::Missing
    }

    /// Makes the `zt1_mods` table mirror both folders. Disk always wins.
    pub fn reconcile(&self) -> Result<ReconcileReport, SError> {
        let mut report = ReconcileReport::default();
        let mut scanned: BTreeMap<String, bool> = BTreeMap::new();

        for enabled in [true, false] {
            let dir = self.paths.dir_for(enabled);
            match FileUtils::list_archives_matching(dir, is_zt1_archive) {
                Ok(files) => {
                    for file in files {
                        if scanned.contains_key(&file.name) {
                            report
                                .warnings
                                .push(format!("{} exists in both mod directories", file.name));
                            continue;
                        }
                        scanned.insert(file.name, enabled);
                    }
                }
                Err(e) => {
                    warn!("Skipping unreadable ZT1 mod directory {dir}: {e}");
                    report.warnings.push(format!("Could not read {dir}: {e}"));
                }
            }
        }

        for (name, &enabled) in &scanned {
            match self.store.get_zt1_mod(name)? {
                None => {
                    self.store.set_zt1_enabled(name, enabled)?;
                    report.added.push(name.clone());
                }
                Some(record) if record.enabled != enabled => {
                    self.store.set_zt1_enabled(name, enabled)?;
                    report.updated.push(name.clone());
                }
                Some(_) => {}
            }
        }

        for record in self.store.list_zt1_mods()? {
            if !scanned.contains_key(&record.name) {
                debug!("Dropping record for vanished ZT1 mod {}", record.name);
                self.store.delete_zt1_mod(&record.name)?;
                report.removed.push(record.name);
            }
        }

        if !report.is_unchanged() {
            info!(
                "Reconciled ZT1 mods: {} added, {} updated, {} removed",
                report.added.len(),
                report.updated.len(),
                report.removed.len()
            );
        }
        Ok(report)
    }

    fn set_location(&self, name: &str, enabled: bool) -> Result<ToggleOutcome, SError> {
        let outcome = match self.find_mod_file(name) {
            ModLocation::Active(_) if enabled => ToggleOutcome::AlreadySatisfied,
            ModLocation::Disabled(_) if !enabled => ToggleOutcome::AlreadySatisfied,
            ModLocation::Active(src) | ModLocation::Disabled(src) => {
                FileUtils::move_file(&src, &self.paths.dir_for(enabled).join(name))?;
                ToggleOutcome::Moved
            }
            ModLocation::Missing => return Err(SError::NotFound(name.to_string())),
        };

        self.store.set_zt1_enabled(name, enabled)?;
        Ok(outcome)
    }

    pub fn enable(&self, name: &str) -> Result<CommandReport, SError> {
        let message = match self.set_location(name, true)? {
            ToggleOutcome::Moved => format!("Enabled ZT1 mod {name}"),
            ToggleOutcome::AlreadySatisfied => format!("{name} was already enabled"),
        };
        Ok(CommandReport::new(message).with_affected(vec![name.to_string()]))
    }

    pub fn disable(&self, name: &str) -> Result<CommandReport, SError> {
        let message = match self.set_location(name, false)? {
            ToggleOutcome::Moved => format!("Disabled ZT1 mod {name}"),
            ToggleOutcome::AlreadySatisfied => format!("{name} was already disabled"),
        };
        Ok(CommandReport::new(message).with_affected(vec![name.to_string()]))
    }

    pub fn list_mods(&self) -> Result<Vec<ModView>, SError> {
        Ok(self
            .store
            .list_zt1_mods()?
            .into_iter()
            .map(|record| {
                let location = self.find_mod_file(&record.name);
                let meta = location.path().and_then(|p| std::fs::metadata(p).ok());
                ModView {
                    status: location.status(),
                    size: meta.as_ref().map(|m| m.len()),
                    modified: meta
                        .as_ref()
                        .map(|m| FileUtils::mtime_nanos(m) / 1_000_000_000),
                    record,
                }
            })
            .collect())
    }

    pub fn set_category(&self, name: &str, category: &str) -> Result<(), SError> {
        self.require_record(name)?;
        self.store.set_zt1_category(name, category.trim())
    }

    pub fn set_tags<I, S>(&self, name: &str, tags: I) -> Result<(), SError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.require_record(name)?;
        self.store.set_zt1_tags(name, tags)
    }

    fn require_record(&self, name: &str) -> Result<(), SError> {
        match self.store.get_zt1_mod(name)? {
            Some(_) => Ok(()),
            None => Err(SError::NotFound(name.to_string())),
        }
    }
}
