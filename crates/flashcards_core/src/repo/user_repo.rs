//! User registry repository.
//!
//! # Responsibility
//! - Register identity-provider user ids so owned rows can reference them.
//! - Delete a user, letting `ON DELETE CASCADE` remove owned rows.
//!
//! # Invariants
//! - Deletion of a user and of all its sessions/flashcards happens in one
//!   statement, so no partial cascade is observable.

use crate::db::ensure_connection_ready;
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::model::principal::UserId;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Row counts owned by one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnedCounts {
    pub sessions: u64,
    pub flashcards: u64,
}

pub trait UserRepository {
    /// Inserts `user_id` if absent. Returns `true` when a row was created.
    fn register_user(&self, user_id: UserId) -> StoreResult<bool>;
    fn user_exists(&self, user_id: UserId) -> StoreResult<bool>;
    /// Deletes the user and, through cascades, every row it owns.
    fn delete_user(&self, user_id: UserId) -> StoreResult<OwnedCounts>;
    fn owned_counts(&self, user_id: UserId) -> StoreResult<OwnedCounts>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn register_user(&self, user_id: UserId) -> StoreResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO users (id) VALUES (?1);",
            [user_id.to_string()],
        )?;
        Ok(inserted == 1)
    }

    fn user_exists(&self, user_id: UserId) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete_user(&self, user_id: UserId) -> StoreResult<OwnedCounts> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let removed = counts_in(&tx, user_id)?;
        let changed = tx.execute("DELETE FROM users WHERE id = ?1;", [user_id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::not_found(EntityKind::User, user_id));
        }
        tx.commit()?;
        Ok(removed)
    }

    fn owned_counts(&self, user_id: UserId) -> StoreResult<OwnedCounts> {
        counts_in(self.conn, user_id)
    }
}

fn counts_in(conn: &Connection, user_id: UserId) -> StoreResult<OwnedCounts> {
    let (sessions, flashcards): (i64, i64) = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM flashcards_gen_sessions WHERE user_id = ?1),
            (SELECT COUNT(*) FROM flashcards WHERE user_id = ?1);",
        params![user_id.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(OwnedCounts {
        sessions: u64::try_from(sessions).unwrap_or(0),
        flashcards: u64::try_from(flashcards).unwrap_or(0),
    })
}
