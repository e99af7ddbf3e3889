use crate::core::archive::{is_markup_path, ArchiveEntry, ArchiveInspector};
use crate::core::classifier;
use crate::core::registry::ModRegistry;
use crate::models::conflict::{Conflict, ConflictContributor, ConflictReport, ConflictView};
use crate::models::entity::{ArchiveContents, ContentsReport, EntityInfo};
use crate::models::error::SError;
use crate::models::mod_dto::ModLocation;
use camino::Utf8PathBuf;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Case-folded, `/`-separated, without a leading separator.
pub fn normalize_member_path(name: &str) -> String {
    name.replace('\\', "/")
        .trim_start_matches('/')
        .to_lowercase()
}

/// In-archive path -> every mod that ships it. Rebuilt per scan.
#[derive(Debug, Default)]
pub struct ConflictIndex {
    paths: BTreeMap<String, Vec<ConflictContributor>>,
}

impl ConflictIndex {
    pub fn add(&mut self, mod_name: &str, enabled: bool, entries: &[ArchiveEntry]) {
        let mut seen = BTreeSet::new();
        for entry in entries.iter().filter(|e| !e.is_dir) {
            let path = normalize_member_path(&entry.name);
            if path.is_empty() || !seen.insert(path.clone()) {
                continue;
            }
            self.paths.entry(path).or_default().push(ConflictContributor {
                mod_name: mod_name.to_string(),
                size: entry.size,
                enabled,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn conflicts(&self, view: ConflictView) -> Vec<Conflict> {
        self.paths
            .iter()
            .filter_map(|(path, contributors)| {
                let contributors = match view {
                    ConflictView::All => contributors.clone(),
                    ConflictView::BothEnabled => {
                        if !contributors.iter().all(|c| c.enabled) {
                            return None;
                        }
                        contributors.clone()
                    }
                    ConflictView::OnlyEnabled => {
                        contributors.iter().filter(|c| c.enabled).cloned().collect()
                    }
                    ConflictView::Critical => {
                        if !is_markup_path(path) {
                            return None;
                        }
                        contributors.clone()
                    }
                };

                (contributors.len() > 1).then(|| Conflict {
                    path: path.clone(),
                    contributors,
                })
            })
            .collect()
    }
}

/// Archive paths for every mod the registry knows, with their enabled state.
/// Records without a file are reported as warnings.
fn known_archives(
    registry: &ModRegistry,
    warnings: &mut Vec<String>,
) -> Result<Vec<(String, Utf8PathBuf, bool)>, SError> {
    let mut archives = Vec::new();
    for record in registry.store.list_mods()? {
        match registry.find_mod_file(&record.name) {
            ModLocation::Active(path) => archives.push((record.name, path, true)),
            ModLocation::Disabled(path) => archives.push((record.name, path, false)),
            ModLocation::Missing => warnings.push(format!("{} is missing on disk", record.name)),
        }
    }
    Ok(archives)
}

/// Indexes every known archive and returns the conflicts visible in `view`.
/// Archives that fail to open are listed as invalid; the scan carries on.
pub fn scan_conflicts(registry: &ModRegistry, view: ConflictView) -> Result<ConflictReport, SError> {
    let mut report = ConflictReport::default();
    let mut index = ConflictIndex::default();

    for (name, path, enabled) in known_archives(registry, &mut report.warnings)? {
        let entries = ArchiveInspector::open(&path).and_then(|mut a| a.entries());
        match entries {
            Ok(entries) => {
                index.add(&name, enabled, &entries);
                report.scanned += 1;
            }
            Err(e) => {
                warn!("Skipping {name} in conflict scan: {e}");
                report.invalid.push(name);
            }
        }
    }

    report.conflicts = index.conflicts(view);
    info!(
        "Conflict scan: {} archives, {} paths, {} conflicts ({view:?})",
        report.scanned,
        index.len(),
        report.conflicts.len()
    );
    Ok(report)
}

/// Classifies every markup document in one archive.
pub fn classify_archive(archive: &mut ArchiveInspector) -> Result<Vec<EntityInfo>, SError> {
    Ok(archive
        .markup_documents()?
        .into_iter()
        .filter_map(|(member, bytes)| classifier::classify(&member, &bytes))
        .collect())
}

/// What each known archive contributes, by entity category.
pub fn classify_mods(registry: &ModRegistry) -> Result<ContentsReport, SError> {
    let mut report = ContentsReport::default();
    let mut warnings = Vec::new();

    for (name, path, _) in known_archives(registry, &mut warnings)? {
        let entities = ArchiveInspector::open(&path).and_then(|mut a| classify_archive(&mut a));
        match entities {
            Ok(entities) => report.archives.push(ArchiveContents {
                mod_name: name,
                entities,
            }),
            Err(e) => {
                warn!("Skipping {name} in classification: {e}");
                report.invalid.push(name);
            }
        }
    }

    for w in warnings {
        warn!("{w}");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ArchiveEntry {
        ArchiveEntry {
            name: name.to_string(),
            size: 10,
            compressed_size: 5,
            is_dir: name.ends_with('/'),
        }
    }

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(normalize_member_path("\\Models\\X.NIF"), "models/x.nif");
        assert_eq!(normalize_member_path("/ui/a.xml"), "ui/a.xml");
    }

    #[test]
    fn views_filter_contributors() {
        let mut index = ConflictIndex::default();
        index.add("a.z2f", true, &[entry("models/x.nif"), entry("data/x.xml"), entry("models/")]);
        index.add("b.z2f", false, &[entry("Models/X.nif"), entry("data/x.xml")]);
        index.add("c.z2f", true, &[entry("data/X.XML")]);

        let all = index.conflicts(ConflictView::All);
        assert_eq!(all.len(), 2);

        let critical = index.conflicts(ConflictView::Critical);
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].mod_names(), vec!["a.z2f", "b.z2f", "c.z2f"]);

        assert!(index.conflicts(ConflictView::BothEnabled).is_empty());

        let only = index.conflicts(ConflictView::OnlyEnabled);
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].mod_names(), vec!["a.z2f", "c.z2f"]);
    }

    #[test]
    fn same_mod_twice_is_not_a_conflict() {
        let mut index = ConflictIndex::default();
        index.add("a.z2f", true, &[entry("x.xml"), entry("X.xml")]);
        assert!(index.conflicts(ConflictView::All).is_empty());
    }
}
