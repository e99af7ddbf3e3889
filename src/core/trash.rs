use crate::models::error::SError;
use crate::utils::file::FileUtils;
use crate::utils::time::get_unix_timestamp;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

/// Picks a free name in `trash_dir`: `<name>`, else `<base>_<unix ts><ext>`.
pub fn trash_destination(trash_dir: &Utf8Path, name: &str) -> Utf8PathBuf {
    let plain = trash_dir.join(name);
    if !plain.exists() {
        return plain;
    }

    let file = Utf8Path::new(name);
    let base = file.file_stem().unwrap_or(name);
    let ext = file.extension().map(|e| format!(".{e}")).unwrap_or_default();
    let stamp = get_unix_timestamp();

    let mut candidate = trash_dir.join(format!("{base}_{stamp}{ext}"));
    let mut n = 1;
    while candidate.exists() {
        candidate = trash_dir.join(format!("{base}_{stamp}_{n}{ext}"));
        n += 1;
    }
    candidate
}

/// Moves `src` into the trash and returns where it landed.
pub fn move_to_trash(trash_dir: &Utf8Path, src: &Utf8Path) -> Result<Utf8PathBuf, SError> {
    let name = src
        .file_name()
        .ok_or_else(|| SError::NotFound(src.to_string()))?;
    std::fs::create_dir_all(trash_dir)?;

    let dst = trash_destination(trash_dir, name);
    FileUtils::move_file(src, &dst)?;
    debug!("Trashed {src} -> {dst}");
    Ok(dst)
}

/// Moves a trashed archive back. Fails if the trash copy is gone or `dst` is taken.
pub fn restore(trash_path: &Utf8Path, dst: &Utf8Path) -> Result<(), SError> {
    if !trash_path.is_file() {
        return Err(SError::RestoreTargetMissing(trash_path.to_string()));
    }
    if dst.exists() {
        return Err(SError::IOError(format!("{dst} already exists")));
    }
    FileUtils::move_file(trash_path, dst)
}

/// Permanently deletes one trash file. A file that is already gone is fine.
pub fn purge(trash_path: &Utf8Path) {
    match std::fs::remove_file(trash_path) {
        Ok(()) => debug!("Purged {trash_path}"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to purge {trash_path}: {e}"),
    }
}

/// Deletes every file left in the trash directory. Returns how many went.
pub fn empty(trash_dir: &Utf8Path) -> Result<usize, SError> {
    if !trash_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(trash_dir)? {
        let path = entry?.path();
        if path.is_file() {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
