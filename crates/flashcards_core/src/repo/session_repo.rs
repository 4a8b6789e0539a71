//! Generation session repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist `flashcards_gen_sessions` rows, with `proposals` as a JSON array.
//! - Apply every edit of an existing session as one load-modify-write
//!   transaction, together with any flashcards the edit promotes.
//!
//! # Invariants
//! - `GenerationSession::validate()` runs before every write.
//! - Edits run under `BEGIN IMMEDIATE`, so concurrent writers to the same
//!   database serialize instead of overwriting each other.
//! - A promoted card reuses its proposal id; a second promotion of the same
//!   proposal is rejected while the first card exists.
//! - Updates and deletes match on `id` and `user_id` together.
//! - Deleting a session nulls `flashcards.generation_id` through
//!   `ON DELETE SET NULL` inside the same statement.

use crate::db::ensure_connection_ready;
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::model::flashcard::Flashcard;
use crate::model::principal::UserId;
use crate::model::session::{GenerationSession, Proposal, SessionId};
use crate::model::ValidationError;
use crate::repo::flashcard_repo::{flashcard_exists, insert_flashcard};
use crate::repo::{
    normalize_list_limit, parse_count_column, parse_timestamp_column, parse_uuid_column,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const TABLE: &str = "flashcards_gen_sessions";

const SESSION_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    source_text,
    proposals,
    generated_count,
    accepted_count,
    created_at,
    updated_at
FROM flashcards_gen_sessions";

/// Paging options for owner-scoped session listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionListQuery {
    /// Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    pub offset: u32,
}

pub trait SessionRepository {
    fn insert_session(&self, session: &GenerationSession) -> StoreResult<()>;
    /// Loads one session by id regardless of owner; callers must guard it.
    fn find_session(&self, id: SessionId) -> StoreResult<Option<GenerationSession>>;
    /// Lists sessions owned by `owner`, newest first.
    fn list_sessions(
        &self,
        owner: UserId,
        query: &SessionListQuery,
    ) -> StoreResult<Vec<GenerationSession>>;
    /// Loads session `id` and hands it to `apply` inside one IMMEDIATE
    /// transaction. A `Changed` edit writes proposals, counters and
    /// `updated_at` back and inserts its cards; any error rolls back.
    fn modify_session<F>(&self, id: SessionId, apply: F) -> StoreResult<SessionEdit>
    where
        F: FnOnce(Option<GenerationSession>) -> StoreResult<SessionEdit>;
    fn delete_session(&self, owner: UserId, id: SessionId) -> StoreResult<()>;
}

/// Outcome of a [`SessionRepository::modify_session`] callback.
#[derive(Debug)]
pub enum SessionEdit {
    Unchanged(GenerationSession),
    Changed {
        session: GenerationSession,
        cards: Vec<Flashcard>,
    },
}

pub struct SqliteSessionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn insert_session(&self, session: &GenerationSession) -> StoreResult<()> {
        session.validate()?;
        let proposals_json = serde_json::to_string(&session.proposals)?;

        self.conn.execute(
            "INSERT INTO flashcards_gen_sessions (
                id,
                user_id,
                source_text,
                proposals,
                generated_count,
                accepted_count,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                session.id.to_string(),
                session.owner.to_string(),
                session.source_text.as_str(),
                proposals_json,
                i64::from(session.generated_count),
                i64::from(session.accepted_count),
                session.created_at,
                session.updated_at,
            ],
        )?;
        Ok(())
    }

    fn find_session(&self, id: SessionId) -> StoreResult<Option<GenerationSession>> {
        find_session_in(self.conn, id)
    }

    fn list_sessions(
        &self,
        owner: UserId,
        query: &SessionListQuery,
    ) -> StoreResult<Vec<GenerationSession>> {
        let limit = normalize_list_limit(query.limit);
        let mut stmt = self.conn.prepare(&format!(
            "{SESSION_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, id ASC
             LIMIT ?2 OFFSET ?3;"
        ))?;
        let mut rows = stmt.query(params![
            owner.to_string(),
            i64::from(limit),
            i64::from(query.offset)
        ])?;

        let mut sessions = Vec::new();
        while let Some(row) = rows.next()? {
            sessions.push(parse_session_row(row)?);
        }
        Ok(sessions)
    }

    fn modify_session<F>(&self, id: SessionId, apply: F) -> StoreResult<SessionEdit>
    where
        F: FnOnce(Option<GenerationSession>) -> StoreResult<SessionEdit>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let edit = apply(find_session_in(&tx, id)?)?;
        if let SessionEdit::Changed { session, cards } = &edit {
            write_session(&tx, session)?;
            for card in cards {
                if flashcard_exists(&tx, card.id)? {
                    return Err(ValidationError::ProposalAlreadyPromoted(card.id).into());
                }
                insert_flashcard(&tx, card)?;
            }
        }
        tx.commit()?;
        Ok(edit)
    }

    fn delete_session(&self, owner: UserId, id: SessionId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM flashcards_gen_sessions WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), owner.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(EntityKind::GenerationSession, id));
        }
        Ok(())
    }
}

fn find_session_in(conn: &Connection, id: SessionId) -> StoreResult<Option<GenerationSession>> {
    let mut stmt = conn.prepare(&format!("{SESSION_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_session_row(row)?));
    }
    Ok(None)
}

fn write_session(conn: &Connection, session: &GenerationSession) -> StoreResult<()> {
    session.validate()?;
    let proposals_json = serde_json::to_string(&session.proposals)?;

    // source_text, user_id and created_at are immutable after insert.
    let changed = conn.execute(
        "UPDATE flashcards_gen_sessions
         SET
            proposals = ?1,
            generated_count = ?2,
            accepted_count = ?3,
            updated_at = ?4
         WHERE id = ?5
           AND user_id = ?6;",
        params![
            proposals_json,
            i64::from(session.generated_count),
            i64::from(session.accepted_count),
            session.updated_at,
            session.id.to_string(),
            session.owner.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::not_found(
            EntityKind::GenerationSession,
            session.id,
        ));
    }
    Ok(())
}

fn parse_session_row(row: &Row<'_>) -> StoreResult<GenerationSession> {
    let proposals_json: String = row.get("proposals")?;
    let proposals: Vec<Proposal> = serde_json::from_str(&proposals_json)?;

    let session = GenerationSession {
        id: parse_uuid_column(row, TABLE, "id")?,
        owner: parse_uuid_column(row, TABLE, "user_id")?,
        source_text: row.get("source_text")?,
        proposals,
        generated_count: parse_count_column(row, TABLE, "generated_count")?,
        accepted_count: parse_count_column(row, TABLE, "accepted_count")?,
        created_at: parse_timestamp_column(row, TABLE, "created_at")?,
        updated_at: parse_timestamp_column(row, TABLE, "updated_at")?,
    };
    session.validate().map_err(|err| {
        StoreError::InvalidData(format!("session {} failed validation: {err}", session.id))
    })?;
    Ok(session)
}
