use crate::models::bundle::Bundle;
use crate::models::error::SError;
use crate::models::mod_dto::ModRecord;
use crate::models::paths::DEFAULT_CATEGORY;
use crate::models::report::DuplicateGroup;
use camino::Utf8Path;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS mods (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE,
    enabled INTEGER DEFAULT 0
);
CREATE TABLE IF NOT EXISTS zt1_mods (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE,
    enabled INTEGER DEFAULT 0
);
CREATE TABLE IF NOT EXISTS mod_dependencies (
    mod_name TEXT NOT NULL,
    depends_on TEXT NOT NULL,
    UNIQUE(mod_name, depends_on)
);
CREATE TABLE IF NOT EXISTS bundles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE
);
CREATE TABLE IF NOT EXISTS bundle_mods (
    bundle_id INTEGER,
    mod_name TEXT,
    UNIQUE(bundle_id, mod_name)
);
";

/// Columns added after the first schema; older databases get them on open.
const MIGRATIONS: &[(&str, &str)] = &[
    ("category", "ALTER TABLE mods ADD COLUMN category TEXT DEFAULT 'Uncategorized'"),
    ("tags", "ALTER TABLE mods ADD COLUMN tags TEXT DEFAULT ''"),
    ("hash", "ALTER TABLE mods ADD COLUMN hash TEXT"),
];

const ZT1_MIGRATIONS: &[(&str, &str)] = &[
    ("category", "ALTER TABLE zt1_mods ADD COLUMN category TEXT DEFAULT 'Uncategorized'"),
    ("tags", "ALTER TABLE zt1_mods ADD COLUMN tags TEXT DEFAULT ''"),
];

/// SQLite-backed record of mods, dependency edges and bundles.
/// Cloning shares the connection; every statement runs under its lock.
#[derive(Clone)]
pub struct ModStore {
    conn: Arc<Mutex<Connection>>,
}

impl ModStore {
    pub fn open(path: &Utf8Path) -> Result<Self, SError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, SError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SError> {
        conn.execute_batch(SCHEMA)?;
        Self::migrate(&conn, "mods", MIGRATIONS)?;
        Self::migrate(&conn, "zt1_mods", ZT1_MIGRATIONS)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate(conn: &Connection, table: &str, migrations: &[(&str, &str)]) -> Result<(), SError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        for (column, sql) in migrations {
            if !columns.iter().any(|c| c == column) {
                debug!("migrating {table} table: adding column {column}");
                conn.execute(sql, [])?;
            }
        }
        Ok(())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    // --- Mods ---

    pub fn list_mods(&self) -> Result<Vec<ModRecord>, SError> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT name, enabled, category, tags, hash FROM mods ORDER BY name")?;
        let rows = stmt.query_map([], read_record)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn get_mod(&self, name: &str) -> Result<Option<ModRecord>, SError> {
        let conn = self.lock();
        Ok(conn
            .query_row(
                "SELECT name, enabled, category, tags, hash FROM mods WHERE name=?1",
                params![name],
                read_record,
            )
            .optional()?)
    }

    pub fn contains(&self, name: &str) -> Result<bool, SError> {
        Ok(self.get_mod(name)?.is_some())
    }

    /// Writes the enabled flag, creating the row if it does not exist yet.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), SError> {
        self.lock().execute(
            "INSERT INTO mods (name, enabled) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET enabled=excluded.enabled",
            params![name, enabled],
        )?;
        Ok(())
    }

    pub fn delete_mod(&self, name: &str) -> Result<(), SError> {
        self.lock()
            .execute("DELETE FROM mods WHERE name=?1", params![name])?;
        Ok(())
    }

    pub fn set_category(&self, name: &str, category: &str) -> Result<(), SError> {
        self.lock().execute(
            "UPDATE mods SET category=?1 WHERE name=?2",
            params![category, name],
        )?;
        Ok(())
    }

    pub fn set_tags<I, S>(&self, name: &str, tags: I) -> Result<(), SError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.lock().execute(
            "UPDATE mods SET tags=?1 WHERE name=?2",
            params![join_tags(tags), name],
        )?;
        Ok(())
    }

    pub fn set_fingerprint(&self, name: &str, fingerprint: Option<&str>) -> Result<(), SError> {
        self.lock().execute(
            "UPDATE mods SET hash=?1 WHERE name=?2",
            params![fingerprint, name],
        )?;
        Ok(())
    }

    /// Groups of mods sharing a fingerprint, largest first.
    pub fn duplicate_groups(&self) -> Result<Vec<DuplicateGroup>, SError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT hash, name FROM mods
             WHERE hash IN (
                 SELECT hash FROM mods WHERE hash IS NOT NULL
                 GROUP BY hash HAVING COUNT(*) > 1
             )
             ORDER BY hash, name",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut groups: Vec<DuplicateGroup> = Vec::new();
        for (fingerprint, name) in rows {
            match groups.last_mut() {
                Some(group) if group.fingerprint == fingerprint => group.mods.push(name),
                _ => groups.push(DuplicateGroup {
                    fingerprint,
                    mods: vec![name],
                }),
            }
        }
        groups.sort_by(|a, b| b.mods.len().cmp(&a.mods.len()));
        Ok(groups)
    }

    // --- Zoo Tycoon 1 mods ---

    pub fn list_zt1_mods(&self) -> Result<Vec<ModRecord>, SError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT name, enabled, category, tags, NULL FROM zt1_mods ORDER BY name")?;
        let rows = stmt.query_map([], read_record)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn get_zt1_mod(&self, name: &str) -> Result<Option<ModRecord>, SError> {
        let conn = self.lock();
        Ok(conn
            .query_row(
                "SELECT name, enabled, category, tags, NULL FROM zt1_mods WHERE name=?1",
                params![name],
                read_record,
            )
            .optional()?)
    }

    pub fn set_zt1_enabled(&self, name: &str, enabled: bool) -> Result<(), SError> {
        self.lock().execute(
            "INSERT INTO zt1_mods (name, enabled) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET enabled=excluded.enabled",
            params![name, enabled],
        )?;
        Ok(())
    }

    pub fn delete_zt1_mod(&self, name: &str) -> Result<(), SError> {
        self.lock()
            .execute("DELETE FROM zt1_mods WHERE name=?1", params![name])?;
        Ok(())
    }

    pub fn set_zt1_category(&self, name: &str, category: &str) -> Result<(), SError> {
        self.lock().execute(
            "UPDATE zt1_mods SET category=?1 WHERE name=?2",
            params![category, name],
        )?;
        Ok(())
    }

    pub fn set_zt1_tags<I, S>(&self, name: &str, tags: I) -> Result<(), SError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.lock().execute(
            "UPDATE zt1_mods SET tags=?1 WHERE name=?2",
            params![join_tags(tags), name],
        )?;
        Ok(())
    }

    // --- Dependencies ---

    /// Replaces the full dependency list of `name`.
    pub fn set_dependencies(&self, name: &str, dependencies: &[String]) -> Result<(), SError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM mod_dependencies WHERE mod_name=?1", params![name])?;
        for dep in dependencies {
            tx.execute(
                "INSERT OR IGNORE INTO mod_dependencies (mod_name, depends_on) VALUES (?1, ?2)",
                params![name, dep],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn dependencies_of(&self, name: &str) -> Result<Vec<String>, SError> {
        self.query_names(
            "SELECT depends_on FROM mod_dependencies WHERE mod_name=?1 ORDER BY rowid",
            name,
        )
    }

    pub fn dependents_of(&self, name: &str) -> Result<Vec<String>, SError> {
        self.query_names(
            "SELECT mod_name FROM mod_dependencies WHERE depends_on=?1 ORDER BY rowid",
            name,
        )
    }

    // --- Bundles ---

    /// Returns false when the bundle already exists.
    pub fn create_bundle(&self, name: &str, mods: &[String]) -> Result<bool, SError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO bundles (name) VALUES (?1)",
            params![name],
        )?;
        if inserted == 0 {
            return Ok(false);
        }
        let bundle_id = tx.last_insert_rowid();
        for m in mods {
            tx.execute(
                "INSERT OR IGNORE INTO bundle_mods (bundle_id, mod_name) VALUES (?1, ?2)",
                params![bundle_id, m],
            )?;
        }
        tx.commit()?;
        Ok(true)
    }

    /// Returns false when no such bundle exists.
    pub fn delete_bundle(&self, name: &str) -> Result<bool, SError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let Some(bundle_id) = tx
            .query_row("SELECT id FROM bundles WHERE name=?1", params![name], |r| {
                r.get::<_, i64>(0)
            })
            .optional()?
        else {
            return Ok(false);
        };
        tx.execute("DELETE FROM bundle_mods WHERE bundle_id=?1", params![bundle_id])?;
        tx.execute("DELETE FROM bundles WHERE id=?1", params![bundle_id])?;
        tx.commit()?;
        Ok(true)
    }

    pub fn list_bundles(&self) -> Result<Vec<Bundle>, SError> {
        let names = {
            let conn = self.lock();
            let mut stmt = conn.prepare("SELECT name FROM bundles ORDER BY name")?;
            let names = stmt
                .query_map([], |r| r.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            names
        };

        names
            .into_iter()
            .map(|name| {
                let mods = self.bundle_mods(&name)?;
                Ok(Bundle { name, mods })
            })
            .collect()
    }

    pub fn bundle_mods(&self, name: &str) -> Result<Vec<String>, SError> {
        self.query_names(
            "SELECT bm.mod_name FROM bundle_mods bm
             JOIN bundles b ON b.id = bm.bundle_id
             WHERE b.name=?1 ORDER BY bm.mod_name",
            name,
        )
    }

    pub fn bundles_containing(&self, mod_name: &str) -> Result<Vec<String>, SError> {
        self.query_names(
            "SELECT b.name FROM bundles b
             JOIN bundle_mods bm ON b.id = bm.bundle_id
             WHERE bm.mod_name=?1 ORDER BY b.name",
            mod_name,
        )
    }

    fn query_names(&self, sql: &str, arg: &str) -> Result<Vec<String>, SError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql)?;
        let names = stmt
            .query_map(params![arg], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<ModRecord> {
    let category: Option<String> = row.get(2)?;
    let tags: Option<String> = row.get(3)?;
    Ok(ModRecord {
        name: row.get(0)?,
        enabled: row.get::<_, i64>(1)? != 0,
        category: category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        tags: split_tags(tags.as_deref().unwrap_or_default()),
        fingerprint: row.get(4)?,
    })
}

/// Trims, drops empties, de-duplicates and sorts before joining with ", ".
pub fn join_tags<I, S>(tags: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn split_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_normalized() {
        assert_eq!(join_tags([" zoo", "", "animals ", "zoo"]), "animals, zoo");
        let split = split_tags("animals, zoo,,  ");
        assert_eq!(split.len(), 2);
        assert!(split.contains("animals"));
    }

    #[test]
    fn set_enabled_upserts() {
        let store = ModStore::open_in_memory().unwrap();
        store.set_enabled("lions.z2f", true).unwrap();
        store.set_enabled("lions.z2f", false).unwrap();

        let record = store.get_mod("lions.z2f").unwrap().unwrap();
        assert!(!record.enabled);
        assert_eq!(record.category, DEFAULT_CATEGORY);
        assert!(record.tags.is_empty());
    }

    #[test]
    fn legacy_table_is_migrated() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE mods (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT UNIQUE, enabled INTEGER DEFAULT 0);
             INSERT INTO mods (name, enabled) VALUES ('old.z2f', 1);",
        )
        .unwrap();

        let store = ModStore::init(conn).unwrap();
        store.set_tags("old.z2f", ["legacy"]).unwrap();
        let record = store.get_mod("old.z2f").unwrap().unwrap();
        assert!(record.enabled);
        assert_eq!(record.category, DEFAULT_CATEGORY);
        assert!(record.tags.contains("legacy"));
    }

    #[test]
    fn zt1_mods_live_in_their_own_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE zt1_mods (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT UNIQUE, enabled INTEGER DEFAULT 0);
             INSERT INTO zt1_mods (name, enabled) VALUES ('zebra.ztd', 1);",
        )
        .unwrap();

        let store = ModStore::init(conn).unwrap();
        store.set_zt1_category("zebra.ztd", "Animals").unwrap();
        store.set_zt1_tags("zebra.ztd", ["savanna"]).unwrap();

        let record = store.get_zt1_mod("zebra.ztd").unwrap().unwrap();
        assert!(record.enabled);
        assert_eq!(record.category, "Animals");
        assert!(record.tags.contains("savanna"));
        assert_eq!(record.fingerprint, None);
        assert!(store.get_mod("zebra.ztd").unwrap().is_none());

        store.delete_zt1_mod("zebra.ztd").unwrap();
        assert!(store.list_zt1_mods().unwrap().is_empty());
    }

    #[test]
    fn duplicate_groups_only_report_shared_fingerprints() {
        let store = ModStore::open_in_memory().unwrap();
        for name in ["a.z2f", "b.z2f", "c.z2f"] {
            store.set_enabled(name, true).unwrap();
        }
        store.set_fingerprint("a.z2f", Some("abc")).unwrap();
        store.set_fingerprint("b.z2f", Some("abc")).unwrap();
        store.set_fingerprint("c.z2f", Some("xyz")).unwrap();

        let groups = store.duplicate_groups().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].mods, vec!["a.z2f", "b.z2f"]);
    }

    #[test]
    fn bundle_round_trip() {
        let store = ModStore::open_in_memory().unwrap();
        let mods = vec!["b.z2f".to_string(), "a.z2f".to_string()];
        assert!(store.create_bundle("Savanna", &mods).unwrap());
        assert!(!store.create_bundle("Savanna", &mods).unwrap());

        assert_eq!(store.bundle_mods("Savanna").unwrap(), vec!["a.z2f", "b.z2f"]);
        assert_eq!(store.bundles_containing("a.z2f").unwrap(), vec!["Savanna"]);
        assert!(store.delete_bundle("Savanna").unwrap());
        assert!(store.list_bundles().unwrap().is_empty());
    }
}
