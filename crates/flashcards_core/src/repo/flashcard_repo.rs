//! Flashcard repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist `flashcards` rows.
//! - Provide owner-scoped list queries with source/session filters.
//!
//! # Invariants
//! - `Flashcard::validate()` runs before every write.
//! - `source` and `generation_id` are never rewritten by updates.
//! - List results are ordered `updated_at DESC, id ASC`.

use crate::db::ensure_connection_ready;
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::model::flashcard::{Flashcard, FlashcardId, FlashcardSource};
use crate::model::principal::UserId;
use crate::model::session::SessionId;
use crate::repo::{
    normalize_list_limit, parse_optional_uuid_column, parse_timestamp_column, parse_uuid_column,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TABLE: &str = "flashcards";

const FLASHCARD_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    front,
    back,
    source,
    generation_id,
    created_at,
    updated_at
FROM flashcards";

/// Filter and paging options for owner-scoped flashcard listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlashcardListQuery {
    pub source: Option<FlashcardSource>,
    /// Only cards that still reference this session.
    pub generation_id: Option<SessionId>,
    /// Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    pub offset: u32,
}

pub trait FlashcardRepository {
    fn insert_flashcard(&self, card: &Flashcard) -> StoreResult<()>;
    /// Loads one card by id regardless of owner; callers must guard it.
    fn find_flashcard(&self, id: FlashcardId) -> StoreResult<Option<Flashcard>>;
    fn list_flashcards(
        &self,
        owner: UserId,
        query: &FlashcardListQuery,
    ) -> StoreResult<Vec<Flashcard>>;
    /// Rewrites `front`, `back` and `updated_at`.
    fn update_flashcard(&self, card: &Flashcard) -> StoreResult<()>;
    fn delete_flashcard(&self, owner: UserId, id: FlashcardId) -> StoreResult<()>;
}

pub struct SqliteFlashcardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFlashcardRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl FlashcardRepository for SqliteFlashcardRepository<'_> {
    fn insert_flashcard(&self, card: &Flashcard) -> StoreResult<()> {
        insert_flashcard(self.conn, card)
    }

    fn find_flashcard(&self, id: FlashcardId) -> StoreResult<Option<Flashcard>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{FLASHCARD_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_flashcard_row(row)?));
        }
        Ok(None)
    }

    fn list_flashcards(
        &self,
        owner: UserId,
        query: &FlashcardListQuery,
    ) -> StoreResult<Vec<Flashcard>> {
        let mut sql = format!("{FLASHCARD_SELECT_SQL} WHERE user_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(owner.to_string())];

        if let Some(source) = query.source {
            sql.push_str(" AND source = ?");
            bind_values.push(Value::Text(source.as_str().to_string()));
        }

        if let Some(generation_id) = query.generation_id {
            sql.push_str(" AND generation_id = ?");
            bind_values.push(Value::Text(generation_id.to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_list_limit(query.limit))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(parse_flashcard_row(row)?);
        }
        Ok(cards)
    }

    fn update_flashcard(&self, card: &Flashcard) -> StoreResult<()> {
        card.validate()?;

        let changed = self.conn.execute(
            "UPDATE flashcards
             SET
                front = ?1,
                back = ?2,
                updated_at = ?3
             WHERE id = ?4
               AND user_id = ?5;",
            params![
                card.front.as_str(),
                card.back.as_str(),
                card.updated_at,
                card.id.to_string(),
                card.owner.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(EntityKind::Flashcard, card.id));
        }
        Ok(())
    }

    fn delete_flashcard(&self, owner: UserId, id: FlashcardId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM flashcards WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), owner.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(EntityKind::Flashcard, id));
        }
        Ok(())
    }
}

/// Inserts one card on `conn`, which may be an open transaction.
pub(crate) fn insert_flashcard(conn: &Connection, card: &Flashcard) -> StoreResult<()> {
    card.validate()?;

    conn.execute(
        "INSERT INTO flashcards (
            id,
            user_id,
            front,
            back,
            source,
            generation_id,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            card.id.to_string(),
            card.owner.to_string(),
            card.front.as_str(),
            card.back.as_str(),
            card.source.as_str(),
            card.generation_id.map(|id| id.to_string()),
            card.created_at,
            card.updated_at,
        ],
    )?;
    Ok(())
}

pub(crate) fn flashcard_exists(conn: &Connection, id: FlashcardId) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM flashcards WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_flashcard_row(row: &Row<'_>) -> StoreResult<Flashcard> {
    let source_text: String = row.get("source")?;
    let source = source_text.parse::<FlashcardSource>().map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid source `{source_text}` in flashcards.source"
        ))
    })?;

    let card = Flashcard {
        id: parse_uuid_column(row, TABLE, "id")?,
        owner: parse_uuid_column(row, TABLE, "user_id")?,
        front: row.get("front")?,
        back: row.get("back")?,
        source,
        generation_id: parse_optional_uuid_column(row, TABLE, "generation_id")?,
        created_at: parse_timestamp_column(row, TABLE, "created_at")?,
        updated_at: parse_timestamp_column(row, TABLE, "updated_at")?,
    };
    card.validate().map_err(|err| {
        StoreError::InvalidData(format!("flashcard {} failed validation: {err}", card.id))
    })?;
    Ok(card)
}
