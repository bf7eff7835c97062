//! Shared handle to the in-memory relational store.
//!
//! A [`Store`] is created once and cloned into whatever needs it. All clones
//! share one SQLite connection guarded by a mutex; the connection is held only
//! for the duration of a [`Store::with_connection`] call.

use std::sync::{Arc, Mutex, PoisonError};

use log::debug;
use rusqlite::{Connection, OptionalExtension, params};

#[derive(Debug, Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        debug!("Opened in-memory store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with exclusive access to the connection.
    ///
    /// A lock poisoned by a panicking caller is recovered: the connection
    /// itself is still valid, and one failed request must not take the
    /// store down for everyone else.
    pub fn with_connection<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&mut Connection) -> T,
    {
        let mut guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn table_exists(&self, name: &str) -> rusqlite::Result<bool> {
        self.with_connection(|conn| table_exists(conn, name))
    }

    /// User tables in creation order.
    pub fn table_names(&self) -> rusqlite::Result<Vec<String>> {
        self.with_connection(|conn| table_names(conn))
    }
}

pub(crate) fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}

pub(crate) fn table_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY rowid",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_database() {
        let store = Store::open_in_memory().unwrap();
        let other = store.clone();
        store
            .with_connection(|conn| conn.execute_batch("CREATE TABLE t (id INTEGER)"))
            .unwrap();
        assert!(other.table_exists("t").unwrap());
        assert!(!other.table_exists("missing").unwrap());
    }

    #[test]
    fn table_names_follow_creation_order() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_connection(|conn| {
                conn.execute_batch("CREATE TABLE zeta (a); CREATE TABLE alpha (b);")
            })
            .unwrap();
        assert_eq!(store.table_names().unwrap(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let store = Store::open_in_memory().unwrap();
        let cloned = store.clone();
        let _ = std::thread::spawn(move || {
            cloned.with_connection(|_| panic!("boom"));
        })
        .join();
        assert!(store.table_names().unwrap().is_empty());
    }
}
