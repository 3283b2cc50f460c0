//! The on-disk pair container: a thin adapter over a local SQLite file
//! holding a single `pairs(key, value)` table.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, Statement};

use crate::error::{Error, Result};
use crate::record_types::Pair;

// Durability is traded for speed: containers are written once and
// re-created from scratch rather than recovered after a crash.
const SPEED_PRAGMAS: &str = "pragma synchronous = off; pragma journal_mode = off;";
const SCHEMA: &str = "create table pairs (key text, value text);";
const INSERT: &str = "insert into pairs (key, value) values (?1, ?2);";

/// A container of pairs, owned by one task while writable and served
/// read-only to peers afterwards. Duplicate pairs are permitted; the
/// container is a multiset.
#[derive(Debug)]
pub struct Container {
    path: PathBuf,
    conn: Connection,
}

impl Container {
    /// Creates a fresh container at `path`, removing any existing file
    /// there first.
    pub fn create(path: impl AsRef<Path>) -> Result<Container> {
        let path = path.as_ref();
        if path.exists() {
            fs::remove_file(path)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SPEED_PRAGMAS)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Container {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Opens an existing container.
    pub fn open(path: impl AsRef<Path>) -> Result<Container> {
        let path = path.as_ref();
        fs::metadata(path)?;
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;
        conn.execute_batch(SPEED_PRAGMAS)?;
        Ok(Container {
            path: path.to_path_buf(),
            conn,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pairs stored.
    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("select count(1) from pairs", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Appends one pair. The prepared insert is cached per container.
    pub fn insert(&self, key: &str, value: &str) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(INSERT)?;
        stmt.execute((key, value))?;
        Ok(())
    }

    /// Cursor over all pairs, in storage order.
    pub fn scan(&self) -> Result<Scan<'_>> {
        Ok(Scan {
            stmt: self.conn.prepare("select key, value from pairs")?,
        })
    }

    /// Cursor over all pairs, in ascending (key, value) order.
    pub fn scan_ordered(&self) -> Result<Scan<'_>> {
        Ok(Scan {
            stmt: self
                .conn
                .prepare("select key, value from pairs order by key, value")?,
        })
    }

    /// Bulk-copies every pair of the container at `other` into this one
    /// via attach-and-copy. The attach is released even when the copy
    /// fails, leaving this container's rows unchanged.
    pub fn merge_from(&self, other: impl AsRef<Path>) -> Result<()> {
        let other = other.as_ref().to_string_lossy().into_owned();
        self.conn
            .execute("attach database ?1 as merge", [other.as_str()])?;
        let copied = self
            .conn
            .execute("insert into pairs select key, value from merge.pairs", []);
        let detached = self.conn.execute_batch("detach database merge");
        copied?;
        detached?;
        Ok(())
    }
}

/// A lazy cursor over a container's pairs; restartable by asking the
/// container for a fresh one.
pub struct Scan<'c> {
    stmt: Statement<'c>,
}

impl Scan<'_> {
    /// Iterates the cursor once from the start.
    pub fn rows(&mut self) -> Result<impl Iterator<Item = Result<Pair>> + '_> {
        let rows = self.stmt.query_map([], |row| {
            Ok(Pair {
                key: row.get(0)?,
                value: row.get(1)?,
            })
        })?;
        Ok(rows.map(|r| r.map_err(Error::from)))
    }
}
