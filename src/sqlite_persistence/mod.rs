//! Shared SQLite plumbing: versioned schemas with `PRAGMA user_version`
//! bookkeeping, used by both the library store and the user store.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// Offset applied to `user_version` so a plain sqlite file is never mistaken
/// for one of ours.
pub const BASE_DB_VERSION: usize = 7000;

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub indices: &'static [&'static str],
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        for table in self.tables {
            conn.execute(table.schema, [])
                .with_context(|| format!("Failed to create table {}", table.name))?;
            for index in table.indices {
                conn.execute(index, [])?;
            }
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }
}

/// Opens (or creates) a database file and brings it to the latest of the
/// given schemas.
pub fn open_versioned<P: AsRef<Path>>(
    db_path: P,
    schemas: &[VersionedSchema],
) -> Result<Connection> {
    let path = db_path.as_ref();
    let conn = if path.exists() {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let raw_version: usize = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .context("Failed to read database version")?;
        if raw_version < BASE_DB_VERSION {
            bail!("Database at {:?} does not look like one of ours", path);
        }
        let version = raw_version - BASE_DB_VERSION;
        if version >= schemas.len() {
            bail!("Database version {} is too new", version);
        }
        migrate_if_needed(&conn, schemas, version)?;
        conn
    } else {
        let conn = Connection::open(path)?;
        schemas
            .last()
            .context("No schema versions defined")?
            .create(&conn)?;
        conn
    };
    Ok(conn)
}

fn migrate_if_needed(conn: &Connection, schemas: &[VersionedSchema], version: usize) -> Result<()> {
    let mut latest = version;
    for schema in schemas.iter().skip(version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!("Migrating db from version {} to {}", latest, schema.version);
            migration_fn(conn)
                .with_context(|| format!("Failed migration to version {}", schema.version))?;
        }
        latest = schema.version;
    }
    if latest != version {
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest),
            [],
        )?;
    }
    Ok(())
}
