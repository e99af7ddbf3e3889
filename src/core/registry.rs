use crate::core::archive::ArchiveInspector;
use crate::core::file_index::FileIndex;
use crate::core::store::ModStore;
use crate::models::error::SError;
use crate::models::mod_dto::{ModDetails, ModLocation, ModRecord, ModView};
use crate::models::paths::{DataPathRules, GamePaths};
use crate::models::report::{ReconcileReport, ToggleOutcome};
use crate::utils::file::{ArchiveFile, FileUtils};
use camino::Utf8PathBuf;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// What a directory scan found for one archive name.
#[derive(Debug, Clone)]
struct ScannedMod {
    enabled: bool,
    file: ArchiveFile,
}

/// The authoritative view of installed mods.
///
/// The filesystem is the source of truth: reconciliation always overwrites
/// stored existence and `enabled` flags from what is on disk, never the reverse.
pub struct ModRegistry {
    pub paths: GamePaths,
    pub data: DataPathRules,
    pub store: ModStore,
}

impl ModRegistry {
    pub fn open(paths: GamePaths, data: DataPathRules) -> Result<Self, SError> {
        for dir in [&paths.active, &paths.disabled, &data.trash, &data.staging] {
            std::fs::create_dir_all(dir)?;
        }
        if let Some(parent) = data.database.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = ModStore::open(&data.database)?;
        Ok(Self { paths, data, store })
    }

    pub fn find_mod_file(&self, name: &str) -> ModLocation {
        if !is_plain_name(name) {
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

    /// Reconciles the store with disk, refreshes fingerprints and reports duplicates.
    pub fn reconcile(&self) -> Result<ReconcileReport, SError> {
        let mut report = self.detect_existing_mods()?;
        report.warnings.extend(self.index_mod_files(false)?);
        report.duplicates = self.store.duplicate_groups()?;

        for group in &report.duplicates {
            warn!(
                "Identical content in {} mods: {}",
                group.mods.len(),
                group.mods.join(", ")
            );
        }

        if !report.is_unchanged() {
            info!(
                "Reconciled mods: {} added, {} updated, {} removed",
                report.added.len(),
                report.updated.len(),
                report.removed.len()
            );
        }
        Ok(report)
    }

    /// Makes the `mods` table mirror both mod directories.
    pub fn detect_existing_mods(&self) -> Result<ReconcileReport, SError> {
        let mut report = ReconcileReport::default();
        let scanned = self.scan(&mut report.warnings);

        for (name, found) in &scanned {
            match self.store.get_mod(name)? {
                None => {
                    self.store.set_enabled(name, found.enabled)?;
                    report.added.push(name.clone());
                }
                Some(record) if record.enabled != found.enabled => {
                    self.store.set_enabled(name, found.enabled)?;
                    report.updated.push(name.clone());
                }
                Some(_) => {}
            }
        }

        for record in self.store.list_mods()? {
            if !scanned.contains_key(&record.name) {
                debug!("Dropping record for vanished mod {}", record.name);
                self.store.delete_mod(&record.name)?;
                report.removed.push(record.name);
            }
        }

        Ok(report)
    }

    /// Hashes every archive on disk, reusing cached fingerprints for unchanged files.
    /// Returns per-file warnings.
    pub fn index_mod_files(&self, force: bool) -> Result<Vec<String>, SError> {
        let mut warnings = Vec::new();
        let scanned = self.scan(&mut warnings);
        let mut index = FileIndex::load(&self.data.file_index);

        for (name, found) in &scanned {
            let fingerprint = index.fingerprint(&found.file, force);
            if fingerprint.is_none() {
                warnings.push(format!("Could not fingerprint {name}"));
            }
            self.store.set_fingerprint(name, fingerprint.as_deref())?;
        }

        index.retain_names(scanned.keys());
        if let Err(e) = index.persist(&self.data.file_index) {
            warn!("Failed to write file index: {e}");
            warnings.push(format!("File index not saved: {e}"));
        }

        Ok(warnings)
    }

    /// Moves the archive into the directory matching `enabled`, then writes the flag.
    pub fn set_location(&self, name: &str, enabled: bool) -> Result<ToggleOutcome, SError> {
        if !is_plain_name(name) {
            return Err(SError::NotFound(name.to_string()));
        }

        let src = self.paths.dir_for(!enabled).join(name);
        let dst = self.paths.dir_for(enabled).join(name);

        let outcome = if src.is_file() {
            FileUtils::move_file(&src, &dst)?;
            ToggleOutcome::Moved
        } else if dst.is_file() {
            ToggleOutcome::AlreadySatisfied
        } else {
            return Err(SError::NotFound(name.to_string()));
        };

        self.store.set_enabled(name, enabled)?;
        debug!("{name}: enabled={enabled} ({outcome:?})");
        Ok(outcome)
    }

    pub fn is_active(&self, name: &str) -> bool {
        matches!(self.find_mod_file(name), ModLocation::Active(_))
    }

    pub fn list_mods(&self) -> Result<Vec<ModView>, SError> {
        Ok(self
            .store
            .list_mods()?
            .into_iter()
            .map(|record| self.view(record))
            .collect())
    }

    fn view(&self, record: ModRecord) -> ModView {
        let location = self.find_mod_file(&record.name);
        let meta = location.path().and_then(|p| std::fs::metadata(p).ok());
        ModView {
            status: location.status(),
            size: meta.as_ref().map(|m| m.len()),
            modified: meta.as_ref().map(unix_seconds),
            record,
        }
    }

    pub fn mod_details(&self, name: &str) -> Result<ModDetails, SError> {
        let path = self
            .find_mod_file(name)
            .path()
            .cloned()
            .ok_or_else(|| SError::NotFound(name.to_string()))?;
        let meta = std::fs::metadata(&path)?;

        let readme = match ArchiveInspector::open(&path) {
            Ok(mut archive) => archive.readme(),
            Err(e) => {
                debug!("No readme for {name}: {e}");
                None
            }
        };

        Ok(ModDetails {
            name: name.to_string(),
            size: meta.len(),
            modified: unix_seconds(&meta),
            bundles: self.store.bundles_containing(name)?,
            readme,
            path,
        })
    }

    pub fn set_category(&self, name: &str, category: &str) -> Result<(), SError> {
        self.require_record(name)?;
        self.store.set_category(name, category.trim())
    }

    pub fn set_tags<I, S>(&self, name: &str, tags: I) -> Result<(), SError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.require_record(name)?;
        self.store.set_tags(name, tags)
    }

    pub fn set_dependencies(&self, name: &str, dependencies: &[String]) -> Result<(), SError> {
        let deps: Vec<String> = dependencies
            .iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty() && d != name)
            .collect();
        self.store.set_dependencies(name, &deps)
    }

    pub fn dependencies_of(&self, name: &str) -> Result<Vec<String>, SError> {
        self.store.dependencies_of(name)
    }

    pub fn dependents_of(&self, name: &str) -> Result<Vec<String>, SError> {
        self.store.dependents_of(name)
    }

    /// Writes `name: Enabled|Disabled` per mod to the load order file.
    pub fn export_load_order(&self) -> Result<Utf8PathBuf, SError> {
        let out: String = self
            .store
            .list_mods()?
            .iter()
            .map(|record| {
                let state = if record.enabled { "Enabled" } else { "Disabled" };
                format!("{}: {state}\n", record.name)
            })
            .collect();

        std::fs::write(&self.data.load_order, out)?;
        info!("Load order exported to {}", self.data.load_order);
        Ok(self.data.load_order.clone())
    }

    fn require_record(&self, name: &str) -> Result<(), SError> {
        if self.store.contains(name)? {
            Ok(())
        } else {
            Err(SError::NotFound(name.to_string()))
        }
    }

    /// Lists both directories. An unreadable directory is skipped with a warning.
    /// A name present in both directories counts as active.
    fn scan(&self, warnings: &mut Vec<String>) -> BTreeMap<String, ScannedMod> {
        let mut scanned = BTreeMap::new();

        for enabled in [true, false] {
            let dir = self.paths.dir_for(enabled);
            let files = match FileUtils::list_mod_archives(dir) {
                Ok(files) => files,
                Err(e) => {
                    warn!("Skipping unreadable mod directory {dir}: {e}");
                    warnings.push(format!("Could not read {dir}: {e}"));
                    continue;
                }
            };

            for file in files {
                if scanned.contains_key(&file.name) {
                    warnings.push(format!("{} exists in both mod directories", file.name));
                    continue;
                }
                scanned.insert(file.name.clone(), ScannedMod { enabled, file });
            }
        }

        scanned
    }
}

/// Rejects names that would resolve outside the mod directories.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn unix_seconds(meta: &std::fs::Metadata) -> i64 {
    FileUtils::mtime_nanos(meta) / 1_000_000_000
}
