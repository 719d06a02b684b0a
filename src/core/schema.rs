//! SchemaManager - on-disk schema creation and versioned migration
//!
//! Owns the schema version the running code expects and brings a store file
//! up to it before anything else touches the connection. Every pending
//! migration step runs inside one transaction; a failure rolls the whole
//! sequence back, so a partially migrated store never exists on disk.
//!
//! Steps are additive only. There are no down-migrations, and a store
//! written by newer code is refused rather than guessed at.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, Transaction};

use super::error::{Result, StoreError};

/// Schema version the running code expects
pub const SCHEMA_VERSION: i64 = 3;

/// Creates and migrates the SQLite schema for the board graph
pub struct SchemaManager;

impl SchemaManager {
    /// Open the store at `path`, creating it if absent, and bring the schema
    /// up to [`SCHEMA_VERSION`]
    ///
    /// `key` is the externally supplied encryption key, applied via
    /// `PRAGMA key` before anything else touches the file. Stock SQLite
    /// ignores the pragma; an SEE/sqlcipher build honors it.
    pub fn open_or_initialize(path: &Path, key: Option<&str>) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::prepare(conn, key)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Connection> {
        Self::prepare(Connection::open_in_memory()?, None)
    }

    fn prepare(mut conn: Connection, key: Option<&str>) -> Result<Connection> {
        if let Some(key) = key {
            conn.pragma_update(None, "key", key)?;
        }

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
        // Cascade deletion of nodes and relations relies on FK enforcement
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        Self::migrate(&mut conn)?;
        Ok(conn)
    }

    /// Apply every migration step above the persisted version, in ascending
    /// order, inside a single transaction
    fn migrate(conn: &mut Connection) -> Result<()> {
        let current = Self::current_version(conn)?;

        if current > SCHEMA_VERSION {
            return Err(StoreError::integrity(format!(
                "store schema version {} is newer than supported version {}",
                current, SCHEMA_VERSION
            )));
        }
        if current == SCHEMA_VERSION {
            return Ok(());
        }

        let tx = conn.transaction()?;
        for version in (current + 1)..=SCHEMA_VERSION {
            Self::apply_step(&tx, version)?;
        }
        tx.execute("DELETE FROM schema_version", [])?;
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
        tx.commit()?;

        tracing::info!(from = current, to = SCHEMA_VERSION, "schema migrated");
        Ok(())
    }

    /// Read the persisted schema version; 0 means a fresh store
    pub fn current_version(conn: &Connection) -> Result<i64> {
        let has_table: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |row| row.get(0),
        )?;
        if has_table == 0 {
            return Ok(0);
        }

        match conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0)) {
            Ok(version) => Ok(version),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn apply_step(tx: &Transaction, version: i64) -> Result<()> {
        match version {
            1 => tx.execute_batch(
                r#"
                CREATE TABLE schema_version (
                    version INTEGER NOT NULL
                );

                CREATE TABLE boards (
                    id TEXT PRIMARY KEY,
                    owner_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    visibility TEXT NOT NULL DEFAULT 'private',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE nodes (
                    id TEXT PRIMARY KEY,
                    board_id TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
                    owner_id TEXT NOT NULL,
                    node_type TEXT NOT NULL DEFAULT 'file',
                    name TEXT NOT NULL,
                    description TEXT,
                    visibility TEXT NOT NULL DEFAULT 'private',
                    position TEXT NOT NULL,
                    payload TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE relations (
                    id TEXT PRIMARY KEY,
                    board_id TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
                    source_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                    target_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                    direction TEXT NOT NULL DEFAULT 'forward',
                    definition TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX idx_boards_owner ON boards(owner_id);
                CREATE INDEX idx_nodes_board ON nodes(board_id);
                CREATE INDEX idx_relations_board ON relations(board_id);
                CREATE INDEX idx_relations_source ON relations(source_id);
                CREATE INDEX idx_relations_target ON relations(target_id);
                "#,
            )?,
            2 => tx.execute_batch("ALTER TABLE nodes ADD COLUMN metadata TEXT;")?,
            3 => tx.execute_batch("ALTER TABLE relations ADD COLUMN metadata TEXT;")?,
            other => {
                return Err(StoreError::integrity(format!(
                    "no migration step defined for version {}",
                    other
                )))
            }
        }
        Ok(())
    }
}
