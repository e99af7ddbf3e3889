use crate::core::archive::ArchiveInspector;
use crate::core::registry::ModRegistry;
use crate::models::error::SError;
use crate::models::report::ReconcileReport;
use crate::utils::file::FileUtils;
use crate::utils::time::file_stamp;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::{self, Write};
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const ENABLED_PREFIX: &str = "Enabled";
const DISABLED_PREFIX: &str = "Disabled";

/// Zips every archive of both directories into `dest_dir`.
/// Returns the path of the new backup.
pub fn backup_mods(registry: &ModRegistry, dest_dir: &Utf8Path) -> Result<Utf8PathBuf, SError> {
    std::fs::create_dir_all(dest_dir)?;
    let output = dest_dir.join(format!("ZT2_ModBackup_{}.zip", file_stamp()));

    let mut zip = ZipWriter::new(File::create(&output)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut count = 0;

    for (prefix, enabled) in [(ENABLED_PREFIX, true), (DISABLED_PREFIX, false)] {
        let dir = registry.paths.dir_for(enabled);
        let files = match FileUtils::list_mod_archives(dir) {
            Ok(files) => files,
            Err(e) => {
                warn!("Backup skipped {dir}: {e}");
                continue;
            }
        };

        for file in files {
            zip.start_file(format!("{prefix}/{}", file.name), options)?;
            io::copy(&mut File::open(&file.path)?, &mut zip)?;
            count += 1;
        }
    }

    zip.finish()?.flush()?;
    info!("Backed up {count} mod(s) to {output}");
    Ok(output)
}

/// Unpacks a backup over both directories, then reconciles.
pub fn restore_mods(registry: &ModRegistry, backup: &Utf8Path) -> Result<ReconcileReport, SError> {
    let staging = registry
        .data
        .staging
        .join(uuid::Uuid::new_v4().to_string());
    std::fs::create_dir_all(&staging)?;

    let result = restore_from_staging(registry, backup, &staging);
    if let Err(e) = std::fs::remove_dir_all(&staging) {
        warn!("Failed to clean staging {staging}: {e}");
    }
    result?;

    info!("Restored mods from {backup}");
    registry.reconcile()
}

fn restore_from_staging(registry: &ModRegistry, backup: &Utf8Path, staging: &Utf8Path) -> Result<(), SError> {
    ArchiveInspector::open(backup)?.extract_to(staging, None)?;

    for (prefix, enabled) in [(ENABLED_PREFIX, true), (DISABLED_PREFIX, false)] {
        let src = staging.join(prefix);
        if !src.is_dir() {
            continue;
        }

        let target = registry.paths.dir_for(enabled);
        let opposite = registry.paths.dir_for(!enabled);
        std::fs::create_dir_all(target)?;

        for file in FileUtils::list_mod_archives(&src)? {
            // A mod lives in exactly one of the two directories.
            let stale = opposite.join(&file.name);
            if stale.is_file() {
                std::fs::remove_file(&stale)?;
                info!("Removed {stale} in favour of the backed up copy");
            }
            std::fs::copy(&file.path, target.join(&file.name))?;
        }
    }
    Ok(())
}
