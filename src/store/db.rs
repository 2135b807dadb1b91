//! SQLite catalog store
//!
//! Tracks the last downloaded state of each configured package, plus the
//! persisted auth token. One connection is held for the whole run;
//! multi-row mutations run inside a transaction.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, params};
use thiserror::Error;

use crate::types::{ApkRecord, DownloadTicket, PackageName};

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Catalog store for package records and the auth token.
#[derive(Debug)]
pub struct CatalogDb {
    conn: Connection,
}

impl CatalogDb {
    /// Open the store at `path`, creating the schema when missing.
    /// `recreate` drops any existing file first.
    pub fn open_at(path: &Path, recreate: bool) -> Result<Self, DbError> {
        if recreate && path.is_file() {
            std::fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS apk (
                name TEXT PRIMARY KEY,
                code INTEGER NOT NULL,
                version TEXT NOT NULL,
                offer INTEGER NOT NULL,
                size INTEGER NOT NULL,
                updated INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS token (
                token TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Insert or fully overwrite the record for a package.
    pub fn upsert(&self, ticket: &DownloadTicket) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO apk (name, code, version, offer, size, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                ticket.name.as_str(),
                ticket.code,
                ticket.version,
                ticket.offer,
                ticket.size as i64,
                unix_now(),
            ],
        )?;
        Ok(())
    }

    /// Snapshot of every record, keyed by name.
    pub fn get_all(&self) -> Result<BTreeMap<PackageName, ApkRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, code, version, offer, size, updated FROM apk ORDER BY name",
        )?;

        let records = stmt.query_map([], |row| {
            let name: String = row.get(0)?;
            let size: i64 = row.get(4)?;
            Ok(ApkRecord {
                name: PackageName::new(&name),
                code: row.get(1)?,
                version: row.get(2)?,
                offer: row.get(3)?,
                size: size.max(0) as u64,
                updated: row.get(5)?,
            })
        })?;

        let mut all = BTreeMap::new();
        for record in records {
            let record = record?;
            all.insert(record.name.clone(), record);
        }
        Ok(all)
    }

    /// Delete the named records in one transaction.
    pub fn delete_many(&mut self, names: &[PackageName]) -> Result<(), DbError> {
        if names.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM apk WHERE name = ?1")?;
            for name in names {
                stmt.execute(params![name.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// The persisted auth token, if an earlier run stored one.
    pub fn get_token(&self) -> Result<Option<String>, DbError> {
        let mut stmt = self.conn.prepare("SELECT token FROM token")?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    /// Store (or replace) the persisted auth token.
    pub fn set_token(&mut self, token: &str) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM token", [], |row| row.get(0))?;
        if existing == 0 {
            tx.execute("INSERT INTO token (token) VALUES (?1)", params![token])?;
        } else {
            tx.execute("UPDATE token SET token = ?1", params![token])?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ticket(name: &str, code: i32) -> DownloadTicket {
        DownloadTicket {
            name: PackageName::new(name),
            code,
            version: format!("{code}.0"),
            offer: 1,
            size: 2048,
        }
    }

    #[test]
    fn upsert_and_get_all() {
        let dir = tempdir().unwrap();
        let db = CatalogDb::open_at(&dir.path().join("apks.db"), false).unwrap();

        db.upsert(&ticket("com.b", 2)).unwrap();
        db.upsert(&ticket("com.a", 1)).unwrap();

        let all = db.get_all().unwrap();
        assert_eq!(all.len(), 2);
        let names: Vec<&str> = all.keys().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["com.a", "com.b"]);
        assert_eq!(all["com.b"].code, 2);
    }

    #[test]
    fn upsert_replaces_instead_of_duplicating() {
        let dir = tempdir().unwrap();
        let db = CatalogDb::open_at(&dir.path().join("apks.db"), false).unwrap();

        db.upsert(&ticket("com.a", 1)).unwrap();
        db.upsert(&ticket("com.a", 5)).unwrap();

        let all = db.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["com.a"].code, 5);
        assert_eq!(all["com.a"].version, "5.0");
    }

    #[test]
    fn delete_many_removes_records() {
        let dir = tempdir().unwrap();
        let mut db = CatalogDb::open_at(&dir.path().join("apks.db"), false).unwrap();

        db.upsert(&ticket("com.a", 1)).unwrap();
        db.upsert(&ticket("com.b", 2)).unwrap();
        db.upsert(&ticket("com.c", 3)).unwrap();

        db.delete_many(&[PackageName::new("com.a"), PackageName::new("com.c")])
            .unwrap();

        let all = db.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.contains_key("com.b"));
    }

    #[test]
    fn token_slot_round_trips() {
        let dir = tempdir().unwrap();
        let mut db = CatalogDb::open_at(&dir.path().join("apks.db"), false).unwrap();

        assert_eq!(db.get_token().unwrap(), None);
        db.set_token("first").unwrap();
        assert_eq!(db.get_token().unwrap(), Some("first".to_string()));
        db.set_token("second").unwrap();
        assert_eq!(db.get_token().unwrap(), Some("second".to_string()));
    }

    #[test]
    fn recreate_drops_existing_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apks.db");

        let db = CatalogDb::open_at(&path, false).unwrap();
        db.upsert(&ticket("com.a", 1)).unwrap();
        drop(db);

        let db = CatalogDb::open_at(&path, true).unwrap();
        assert!(db.get_all().unwrap().is_empty());
    }
}
