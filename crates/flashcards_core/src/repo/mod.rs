//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define data access contracts for users, sessions and flashcards.
//! - Keep SQL details out of the service layer.
//!
//! # Invariants
//! - Write paths validate the model before any SQL mutation.
//! - Bulk reads always take an owner and filter by `user_id` in SQL.
//! - Single-row reads return the row regardless of owner so the access
//!   policy can tell "missing" apart from "not yours"; they are crate-private
//!   to the service layer, which guards every result.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod flashcard_repo;
pub mod session_repo;
pub mod user_repo;

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;

const LIST_DEFAULT_LIMIT: u32 = 20;
const LIST_LIMIT_MAX: u32 = 100;

/// Normalizes a list page size: `None`/`0` -> 20, clamped to 100.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => LIST_DEFAULT_LIMIT,
        Some(value) if value > LIST_LIMIT_MAX => LIST_LIMIT_MAX,
        Some(value) => value,
    }
}

pub(crate) fn parse_uuid_column(row: &Row<'_>, table: &str, column: &str) -> StoreResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}

pub(crate) fn parse_optional_uuid_column(
    row: &Row<'_>,
    table: &str,
    column: &str,
) -> StoreResult<Option<Uuid>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => Uuid::parse_str(&text).map(Some).map_err(|_| {
            StoreError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
        }),
        None => Ok(None),
    }
}

pub(crate) fn parse_timestamp_column(
    row: &Row<'_>,
    table: &str,
    column: &str,
) -> StoreResult<DateTime<Utc>> {
    row.get::<_, DateTime<Utc>>(column).map_err(|err| {
        StoreError::InvalidData(format!("invalid timestamp in {table}.{column}: {err}"))
    })
}

pub(crate) fn parse_count_column(row: &Row<'_>, table: &str, column: &str) -> StoreResult<u32> {
    let value: i64 = row.get(column)?;
    u32::try_from(value).map_err(|_| {
        StoreError::InvalidData(format!("invalid counter `{value}` in {table}.{column}"))
    })
}

#[cfg(test)]
mod tests {
    use super::normalize_list_limit;

    #[test]
    fn list_limit_defaults_and_clamps() {
        assert_eq!(normalize_list_limit(None), 20);
        assert_eq!(normalize_list_limit(Some(0)), 20);
        assert_eq!(normalize_list_limit(Some(7)), 7);
        assert_eq!(normalize_list_limit(Some(100)), 100);
        assert_eq!(normalize_list_limit(Some(5000)), 100);
    }
}
