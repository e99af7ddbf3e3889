use camino::{Utf8Path, Utf8PathBuf};
use directories::UserDirs;
use tracing::{debug, info};
use walkdir::WalkDir;

const ZT2_MARKER: &str = "zt.exe";
const ZT1_MARKER: &str = "zoo.exe";
const ZT2_COMMON_PATHS: &[&str] = &[
    r"C:\Program Files (x86)\Microsoft Games\Zoo Tycoon 2",
    r"C:\Program Files\Microsoft Games\Zoo Tycoon 2",
];
const ZT1_COMMON_PATHS: &[&str] = &[
    r"C:\Program Files (x86)\Microsoft Games\Zoo Tycoon",
    r"C:\Program Files\Microsoft Games\Zoo Tycoon",
];
#[cfg(windows)]
const ZT2_REGISTRY_KEYS: &[&str] = &[
    r"SOFTWARE\Microsoft\Microsoft Games\Zoo Tycoon 2",
    r"SOFTWARE\WOW6432Node\Microsoft\Microsoft Games\Zoo Tycoon 2",
];
#[cfg(windows)]
const ZT1_REGISTRY_KEYS: &[&str] = &[
    r"SOFTWARE\Microsoft\Microsoft Games\Zoo Tycoon",
    r"SOFTWARE\WOW6432Node\Microsoft\Microsoft Games\Zoo Tycoon",
];
const SEARCH_DEPTH: usize = 6;

/// Finds a game install by looking for its executable.
///
/// Order: the well-known install folders, then the install keys in
/// the Windows registry, then a bounded walk of the user's Desktop and Documents.
#[derive(Clone, Debug)]
pub struct GameLocator {
    pub marker: String,
    pub candidates: Vec<Utf8PathBuf>,
    pub registry_keys: Vec<String>,
    pub search_roots: Vec<Utf8PathBuf>,
    pub max_depth: usize,
}

impl GameLocator {
    pub fn zt2() -> Self {
        Self::for_game(ZT2_MARKER, ZT2_COMMON_PATHS, registry_keys(true))
    }

    pub fn zt1() -> Self {
        Self::for_game(ZT1_MARKER, ZT1_COMMON_PATHS, registry_keys(false))
    }

    /// A locator that never finds anything; the caller falls through to asking.
    pub fn disabled() -> Self {
        Self {
            marker: ZT2_MARKER.to_string(),
            candidates: Vec::new(),
            registry_keys: Vec::new(),
            search_roots: Vec::new(),
            max_depth: 0,
        }
    }

    fn for_game(marker: &str, common: &[&str], registry_keys: Vec<String>) -> Self {
        Self {
            marker: marker.to_string(),
            candidates: common.iter().map(Utf8PathBuf::from).collect(),
            registry_keys,
            search_roots: user_search_roots(),
            max_depth: SEARCH_DEPTH,
        }
    }

    pub fn locate(&self) -> Option<Utf8PathBuf> {
        let found = self
            .candidates
            .iter()
            .find(|dir| self.has_marker(dir))
            .cloned()
            .or_else(|| self.from_registry())
            .or_else(|| self.search());

        if let Some(dir) = &found {
            info!("Detected game install at {dir}");
        }
        found
    }

    fn has_marker(&self, dir: &Utf8Path) -> bool {
        dir.join(&self.marker).is_file()
    }

    fn search(&self) -> Option<Utf8PathBuf> {
        for root in self.search_roots.iter().filter(|r| r.is_dir()) {
            debug!("Searching {root} for {}", self.marker);
            let hit = WalkDir::new(root)
                .max_depth(self.max_depth)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .find(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(&self.marker));

            if let Some(entry) = hit {
                let parent = entry.path().parent().map(|p| p.to_path_buf());
                if let Some(dir) = parent.and_then(|p| Utf8PathBuf::try_from(p).ok()) {
                    return Some(dir);
                }
            }
        }
        None
    }

    #[cfg(windows)]
    fn from_registry(&self) -> Option<Utf8PathBuf> {
        use winreg::enums::HKEY_LOCAL_MACHINE;
        use winreg::RegKey;

        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        self.registry_keys.iter().find_map(|key| {
            let install_dir: String = hklm
                .open_subkey(key)
                .ok()?
                .get_value("InstallationDirectory")
                .ok()?;
            let dir = Utf8PathBuf::from(install_dir);
            self.has_marker(&dir).then_some(dir)
        })
    }

    #[cfg(not(windows))]
    fn from_registry(&self) -> Option<Utf8PathBuf> {
        None
    }
}

#[cfg(windows)]
fn registry_keys(zt2: bool) -> Vec<String> {
    let keys = if zt2 { ZT2_REGISTRY_KEYS } else { ZT1_REGISTRY_KEYS };
    keys.iter().map(|k| k.to_string()).collect()
}

#[cfg(not(windows))]
fn registry_keys(_zt2: bool) -> Vec<String> {
    Vec::new()
}

fn user_search_roots() -> Vec<Utf8PathBuf> {
    let Some(dirs) = UserDirs::new() else {
        return Vec::new();
    };

    [dirs.desktop_dir(), dirs.document_dir()]
        .into_iter()
        .flatten()
        .filter_map(|p| Utf8PathBuf::try_from(p.to_path_buf()).ok())
        .collect()
}
