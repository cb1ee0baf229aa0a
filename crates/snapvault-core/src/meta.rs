use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::digest::Digest;
use crate::error::{Result, VaultError};

/// A snapshot record: one full enumeration of a directory's files at a
/// point in time. Immutable once committed; destroyed only by prune.
#[derive(Debug, Clone)]
pub struct SnapshotRecord {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub target_path: String,
}

/// One file recorded in a snapshot: relative path plus the digest of its
/// content. `(snapshot id, path)` is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub digest: Digest,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS snapshots (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  TEXT NOT NULL,
    target_path TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS files (
    snapshot_id INTEGER NOT NULL,
    path        TEXT NOT NULL,
    digest      TEXT NOT NULL,
    PRIMARY KEY (snapshot_id, path)
);
CREATE INDEX IF NOT EXISTS idx_files_digest ON files (digest);
";

/// Transactional store of snapshot records and their file entries, backed
/// by an embedded SQLite database at the repository root.
///
/// Multi-record writes (`create_snapshot`, `delete_snapshot`) run inside a
/// single transaction: on any failure the transaction rolls back on drop
/// and no partial snapshot is ever visible.
pub struct MetadataStore {
    conn: Connection,
}

impl MetadataStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        // The prune sweep deletes blobs only after the metadata commit is
        // durable, so the commit itself must be synchronous.
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Allocate the next snapshot identifier and write the snapshot record
    /// plus all file entries as one atomic transaction.
    pub fn create_snapshot(&mut self, target_path: &str, entries: &[FileEntry]) -> Result<u64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO snapshots (created_at, target_path) VALUES (?1, ?2)",
            params![Utc::now().to_rfc3339(), target_path],
        )?;
        let id = tx.last_insert_rowid() as u64;
        {
            let mut stmt =
                tx.prepare("INSERT INTO files (snapshot_id, path, digest) VALUES (?1, ?2, ?3)")?;
            for entry in entries {
                stmt.execute(params![id, entry.path, entry.digest.to_hex()])?;
            }
        }
        tx.commit()?;
        debug!(snapshot_id = id, files = entries.len(), "snapshot committed");
        Ok(id)
    }

    /// All snapshots in creation order (ascending identifier).
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, created_at, target_path FROM snapshots ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, created_at, target_path) = row?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| {
                    VaultError::InvalidFormat(format!(
                        "snapshot {id} has unparseable timestamp '{created_at}': {e}"
                    ))
                })?
                .with_timezone(&Utc);
            out.push(SnapshotRecord {
                id: id as u64,
                created_at,
                target_path,
            });
        }
        Ok(out)
    }

    pub fn snapshot_exists(&self, id: u64) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM snapshots WHERE id = ?1",
                params![id as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// File entries of one snapshot, ordered by path.
    pub fn file_entries(&self, id: u64) -> Result<Vec<FileEntry>> {
        if !self.snapshot_exists(id)? {
            return Err(VaultError::SnapshotNotFound(id));
        }
        let mut stmt = self
            .conn
            .prepare("SELECT path, digest FROM files WHERE snapshot_id = ?1 ORDER BY path")?;
        let rows = stmt.query_map(params![id as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (path, digest) = row?;
            out.push(FileEntry {
                path,
                digest: Digest::from_hex(&digest)?,
            });
        }
        Ok(out)
    }

    /// Atomically remove a snapshot record and all of its file entries.
    pub fn delete_snapshot(&mut self, id: u64) -> Result<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM snapshots WHERE id = ?1", params![id as i64])?;
        if removed == 0 {
            return Err(VaultError::SnapshotNotFound(id));
        }
        tx.execute(
            "DELETE FROM files WHERE snapshot_id = ?1",
            params![id as i64],
        )?;
        tx.commit()?;
        debug!(snapshot_id = id, "snapshot metadata deleted");
        Ok(())
    }

    /// Union of the digest column across every surviving file entry.
    /// This is the prune sweep's live set.
    pub fn digests_in_use(&self) -> Result<HashSet<Digest>> {
        let mut stmt = self.conn.prepare("SELECT DISTINCT digest FROM files")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = HashSet::new();
        for row in rows {
            out.insert(Digest::from_hex(&row?)?);
        }
        Ok(out)
    }
}
