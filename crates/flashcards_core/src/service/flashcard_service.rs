//! Flashcard use-case service.
//!
//! # Responsibility
//! - Create, read, list, update and delete flashcards on behalf of a
//!   principal.
//! - Resolve the optional `generation_id` reference before insert.
//!
//! # Invariants
//! - A `generation_id` must name an existing session owned by the caller;
//!   another owner's session is treated as nonexistent.
//! - Updates replace `front`/`back` only; `source` and `generation_id` are
//!   fixed at creation.

use crate::error::{EntityKind, StoreError, StoreResult};
use crate::model::flashcard::{validate_card_text, Flashcard, FlashcardId, NewFlashcard};
use crate::model::principal::Principal;
use crate::model::session::SessionId;
use crate::policy::{authorize, guard, owns};
use crate::repo::flashcard_repo::{
    FlashcardListQuery, FlashcardRepository, SqliteFlashcardRepository,
};
use crate::repo::session_repo::{SessionRepository, SqliteSessionRepository};
use log::{info, warn};
use rusqlite::Connection;

/// Full-replacement edit of a card's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardUpdate {
    pub front: String,
    pub back: String,
}

impl FlashcardUpdate {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }
}

/// Flashcard service over a migrated connection.
pub struct FlashcardService<'conn> {
    cards: SqliteFlashcardRepository<'conn>,
    sessions: SqliteSessionRepository<'conn>,
}

impl<'conn> FlashcardService<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        Ok(Self {
            cards: SqliteFlashcardRepository::try_new(conn)?,
            sessions: SqliteSessionRepository::try_new(conn)?,
        })
    }

    /// Creates one card owned by the principal.
    ///
    /// # Errors
    /// - `Authorization` for anonymous principals.
    /// - `Validation` for text limits or a manual card with a reference.
    /// - `Reference` when `generation_id` does not resolve for the caller, or
    ///   the caller is not a registered user.
    pub fn create_flashcard(
        &self,
        principal: &Principal,
        request: NewFlashcard,
    ) -> StoreResult<Flashcard> {
        let owner = authorize(principal)?;
        request.validate()?;
        if let Some(generation_id) = request.generation_id {
            self.resolve_generation_ref(principal, generation_id)?;
        }

        let card = Flashcard::create(owner, request)?;
        self.cards.insert_flashcard(&card)?;
        info!(
            "event=flashcard_create module=service status=ok card_id={} source={} has_generation_ref={}",
            card.id,
            card.source,
            card.generation_id.is_some()
        );
        Ok(card)
    }

    pub fn get_flashcard(&self, principal: &Principal, id: FlashcardId) -> StoreResult<Flashcard> {
        authorize(principal)?;
        guard(principal, id, self.cards.find_flashcard(id)?)
    }

    /// Lists the caller's cards; never returns another owner's rows.
    pub fn list_flashcards(
        &self,
        principal: &Principal,
        query: &FlashcardListQuery,
    ) -> StoreResult<Vec<Flashcard>> {
        let owner = authorize(principal)?;
        self.cards.list_flashcards(owner, query)
    }

    pub fn update_flashcard(
        &self,
        principal: &Principal,
        id: FlashcardId,
        update: FlashcardUpdate,
    ) -> StoreResult<Flashcard> {
        let mut card = self.get_flashcard(principal, id)?;
        validate_card_text(&update.front, &update.back)?;

        card.front = update.front;
        card.back = update.back;
        card.updated_at = chrono::Utc::now();
        self.cards.update_flashcard(&card)?;
        info!(
            "event=flashcard_update module=service status=ok card_id={}",
            card.id
        );
        Ok(card)
    }

    pub fn delete_flashcard(&self, principal: &Principal, id: FlashcardId) -> StoreResult<()> {
        let card = self.get_flashcard(principal, id)?;
        self.cards.delete_flashcard(card.owner, card.id)?;
        info!(
            "event=flashcard_delete module=service status=ok card_id={}",
            card.id
        );
        Ok(())
    }

    fn resolve_generation_ref(
        &self,
        principal: &Principal,
        generation_id: SessionId,
    ) -> StoreResult<()> {
        match self.sessions.find_session(generation_id)? {
            Some(session) if owns(principal, session.owner) => Ok(()),
            Some(_) => {
                warn!(
                    "event=reference_denied module=service reason=cross_owner session_id={}",
                    generation_id
                );
                Err(StoreError::missing_reference(
                    EntityKind::GenerationSession,
                    generation_id,
                ))
            }
            None => Err(StoreError::missing_reference(
                EntityKind::GenerationSession,
                generation_id,
            )),
        }
    }
}
