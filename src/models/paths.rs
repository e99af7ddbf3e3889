use crate::models::error::SError;
use camino::{Utf8Path, Utf8PathBuf};
use dunce::canonicalize;

/// Extension carried by every mod archive.
pub const MOD_EXTENSION: &str = "z2f";
/// Packed sub-archives share the mod folders but are never mods themselves.
pub const PACKED_EXTENSION: &str = "pac";
/// Extension of Zoo Tycoon 1 mod archives.
pub const ZT1_MOD_EXTENSION: &str = "ztd";
pub const DEFAULT_CATEGORY: &str = "Uncategorized";
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

macro_rules! define_paths {
    ($name:ident { $($field:ident : $default:expr),* $(,)? }) => {
        #[derive(Clone, Debug)]
        pub struct $name {
            $(pub $field: Utf8PathBuf,)*
        }

        impl $name {
            pub fn to_absolute(mut self, base: &Utf8Path) -> Self {
                $(self.$field = base.join(self.$field);)*
                self
            }

            pub fn new(base: &Utf8Path) -> Self {
                Self::default().to_absolute(base)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $($field: $default.into(),)*
                }
            }
        }
    };
}

define_paths!(GamePathRules {
    disabled: "Mods/Disabled",
});

define_paths!(Zt1PathRules {
    disabled: "_disabled",
});

define_paths!(DataPathRules {
    database: "mods.db",
    trash: "trash",
    file_index: "file_index.toml",
    staging: "staging",
    logs: "logs",
    load_order: "load_order.txt",
});

/// The two directories a mod archive can live in.
#[derive(Clone, Debug)]
pub struct GamePaths {
    pub active: Utf8PathBuf,
    pub disabled: Utf8PathBuf,
}

impl GamePaths {
    pub fn new(game_root: &Utf8Path) -> Self {
        Self {
            active: game_root.to_owned(),
            disabled: GamePathRules::new(game_root).disabled,
        }
    }

    /// Zoo Tycoon 1 keeps disabled mods in a subfolder of its mod folder.
    pub fn zt1(mod_dir: &Utf8Path) -> Self {
        Self {
            active: mod_dir.to_owned(),
            disabled: Zt1PathRules::new(mod_dir).disabled,
        }
    }

    /// Resolves the game root through symlinks before building the rules.
    pub fn canonical(game_root: &Utf8Path) -> Result<Self, SError> {
        let root = Utf8PathBuf::try_from(canonicalize(game_root)?)?;
        Ok(Self::new(&root))
    }

    pub fn dir_for(&self, enabled: bool) -> &Utf8Path {
        if enabled {
            &self.active
        } else {
            &self.disabled
        }
    }
}

/// True for `*.z2f` files that are not packed sub-archives (`*.pac.z2f`).
pub fn is_mod_archive(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    let Some(stem) = lower.strip_suffix(&format!(".{MOD_EXTENSION}")) else {
        return false;
    };
    !stem.is_empty() && !stem.ends_with(&format!(".{PACKED_EXTENSION}"))
}

pub fn is_zt1_archive(file_name: &str) -> bool {
    file_name
        .to_lowercase()
        .strip_suffix(&format!(".{ZT1_MOD_EXTENSION}"))
        .is_some_and(|stem| !stem.is_empty())
}
