use crate::models::error::SError;
use camino::Utf8Path;
use std::fs::File;
use std::io;

/// Hashes a file's bytes with Blake3 and returns the hex digest.
/// Byte-identical archives under different names share a fingerprint.
pub fn file_fingerprint(path: &Utf8Path) -> Result<String, SError> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn identical_bytes_share_fingerprint() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        std::fs::write(root.join("a.z2f"), b"same bytes").unwrap();
        std::fs::write(root.join("b.z2f"), b"same bytes").unwrap();
        std::fs::write(root.join("c.z2f"), b"other bytes").unwrap();

        let a = file_fingerprint(&root.join("a.z2f")).unwrap();
        let b = file_fingerprint(&root.join("b.z2f")).unwrap();
        let c = file_fingerprint(&root.join("c.z2f")).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
