use crate::core::archive::ArchiveInspector;
use crate::core::engine::Engine;
use crate::core::mod_manager;
use crate::core::prompt::Prompt;
use crate::models::bundle::{Bundle, BundleImport, BundlePayload};
use crate::models::error::SError;
use crate::models::mod_dto::ModLocation;
use crate::models::report::CommandReport;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Write};
use tracing::{info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub fn create_bundle(engine: &Engine, name: &str, mods: &[String]) -> Result<CommandReport, SError> {
    let name = name.trim();
    let mods: Vec<String> = mods
        .iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if name.is_empty() || mods.is_empty() {
        return Err(SError::BundleExists(name.to_string()));
    }
    if !engine.registry.store.create_bundle(name, &mods)? {
        return Err(SError::BundleExists(name.to_string()));
    }

    info!("Created bundle {name} with {} mod(s)", mods.len());
    Ok(CommandReport::new(format!("Bundle '{name}' created with {} mod(s)", mods.len())).with_affected(mods))
}

pub fn delete_bundle(engine: &Engine, name: &str) -> Result<CommandReport, SError> {
    if !engine.registry.store.delete_bundle(name)? {
        return Err(SError::BundleNotFound(name.to_string()));
    }
    Ok(CommandReport::new(format!("Bundle '{name}' deleted")))
}

pub fn list_bundles(engine: &Engine) -> Result<Vec<Bundle>, SError> {
    engine.registry.store.list_bundles()
}

pub fn bundle_mods(engine: &Engine, name: &str) -> Result<Vec<String>, SError> {
    let mods = engine.registry.store.bundle_mods(name)?;
    if mods.is_empty() {
        return Err(SError::BundleNotFound(name.to_string()));
    }
    Ok(mods)
}

/// Enables every member. With `exclusive`, everything else is disabled first.
pub fn apply_bundle(
    engine: &mut Engine,
    name: &str,
    exclusive: bool,
    prompt: &dyn Prompt,
) -> Result<CommandReport, SError> {
    let members = bundle_mods(engine, name)?;
    let mut affected = Vec::new();
    let mut warnings = Vec::new();

    if exclusive {
        let others: Vec<String> = engine
            .registry
            .list_mods()?
            .into_iter()
            .filter(|v| v.record.enabled && !members.contains(&v.record.name))
            .map(|v| v.record.name)
            .collect();

        for other in others {
            if !engine.registry.is_active(&other) {
                continue;
            }
            match mod_manager::disable(engine, &other, prompt) {
                Ok(report) => affected.extend(report.affected),
                Err(e) => warnings.push(format!("{other}: {e}")),
            }
        }
    }

    for member in &members {
        if engine.registry.find_mod_file(member) == ModLocation::Missing {
            warnings.push(format!("{member} is not installed"));
            continue;
        }
        match mod_manager::enable(engine, member) {
            Ok(report) => affected.extend(report.affected),
            Err(e) => warnings.push(format!("{member}: {e}")),
        }
    }

    for w in &warnings {
        warn!("Bundle {name}: {w}");
    }
    Ok(CommandReport::new(format!("Applied bundle '{name}'"))
        .with_affected(affected)
        .with_warnings(warnings))
}

pub fn export_bundle_json(engine: &Engine, name: &str, output: &Utf8Path) -> Result<CommandReport, SError> {
    let payload = BundlePayload {
        name: Some(name.to_string()),
        mods: bundle_mods(engine, name)?,
    };
    std::fs::write(output, serde_json::to_string_pretty(&payload)?)?;
    Ok(CommandReport::new(format!("Bundle '{name}' exported to {output}")))
}

/// Creates a bundle from a JSON payload, keeping only mods the registry knows.
pub fn import_bundle_json(engine: &Engine, input: &Utf8Path) -> Result<BundleImport, SError> {
    let payload: BundlePayload = serde_json::from_str(&std::fs::read_to_string(input)?)?;
    let name = payload
        .name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| input.file_stem().map(str::to_string))
        .ok_or_else(|| SError::ParseError(format!("{input}: bundle has no name")))?;

    let mut import = BundleImport {
        name,
        ..Default::default()
    };
    for m in payload.mods {
        if engine.registry.store.contains(&m)? {
            import.added.push(m);
        } else {
            import.missing.push(m);
        }
    }

    if import.added.is_empty() {
        return Err(SError::BundleNotFound(import.name));
    }
    if !engine.registry.store.create_bundle(&import.name, &import.added)? {
        return Err(SError::BundleExists(import.name));
    }

    info!(
        "Imported bundle {} ({} added, {} missing)",
        import.name,
        import.added.len(),
        import.missing.len()
    );
    Ok(import)
}

/// Merges the members of every archive in the bundle into a single archive.
/// Later archives overwrite earlier ones on the same path.
pub fn export_bundle_archive(
    engine: &Engine,
    name: &str,
    include: Option<&[String]>,
    output: &Utf8Path,
) -> Result<CommandReport, SError> {
    let mods = bundle_mods(engine, name)?;
    let staging = engine
        .registry
        .data
        .staging
        .join(uuid::Uuid::new_v4().to_string());
    std::fs::create_dir_all(&staging)?;

    let result = merge_into(engine, &mods, include, &staging, output);
    if let Err(e) = std::fs::remove_dir_all(&staging) {
        warn!("Failed to clean staging {staging}: {e}");
    }

    let (merged, warnings) = result?;
    Ok(CommandReport::new(format!("Exported {merged} mod(s) of '{name}' to {output}"))
        .with_warnings(warnings))
}

fn merge_into(
    engine: &Engine,
    mods: &[String],
    include: Option<&[String]>,
    staging: &Utf8Path,
    output: &Utf8Path,
) -> Result<(usize, Vec<String>), SError> {
    let mut merged = 0;
    let mut warnings = Vec::new();

    for m in mods {
        let Some(path) = engine.registry.find_mod_file(m).path().cloned() else {
            warnings.push(format!("{m} is not installed"));
            continue;
        };
        match ArchiveInspector::open(&path).and_then(|mut a| a.extract_to(staging, include)) {
            Ok(_) => merged += 1,
            Err(e) => {
                warn!("Skipping {m} in bundle export: {e}");
                warnings.push(format!("{m}: {e}"));
            }
        }
    }

    write_zip_from_dir(staging, output)?;
    Ok((merged, warnings))
}

/// Zips the tree under `root`, members named relative to it with `/` separators.
pub(crate) fn write_zip_from_dir(root: &Utf8Path, output: &Utf8Path) -> Result<(), SError> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut zip = ZipWriter::new(File::create(output)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = Utf8PathBuf::try_from(entry.path().to_path_buf())?;
        let member = path.strip_prefix(root)?.as_str().replace('\\', "/");

        zip.start_file(member, options)?;
        io::copy(&mut File::open(&path)?, &mut zip)?;
    }

    zip.finish()?.flush()?;
    Ok(())
}
