//! Flashcard domain model.
//!
//! # Responsibility
//! - Define the durable user-owned study item.
//! - Validate text length limits and the `source`/`generation_id` pairing.
//!
//! # Invariants
//! - `front` is at most 500 characters, `back` at most 2000.
//! - `source = manual` implies `generation_id = None`.
//! - `generation_id` is a weak reference: it never keeps a session alive and
//!   becomes `None` when the session is deleted.

use super::principal::UserId;
use super::session::{Proposal, SessionId};
use super::{char_len, reject_nul, ValidationError, BACK_MAX_CHARS, FRONT_MAX_CHARS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type FlashcardId = Uuid;

/// Where a flashcard came from. Semantically immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashcardSource {
    Manual,
    AiGenerated,
}

impl FlashcardSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::AiGenerated => "ai_generated",
        }
    }
}

impl Display for FlashcardSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlashcardSource {
    type Err = ValidationError;

    /// Exact, case-sensitive match against the stored tags.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "manual" => Ok(Self::Manual),
            "ai_generated" => Ok(Self::AiGenerated),
            other => Err(ValidationError::UnknownSource(other.to_string())),
        }
    }
}

/// Create request for one flashcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFlashcard {
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
    pub generation_id: Option<SessionId>,
}

impl NewFlashcard {
    /// A user-authored card with no generation reference.
    pub fn manual(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            source: FlashcardSource::Manual,
            generation_id: None,
        }
    }

    /// A card promoted from a session proposal.
    pub fn ai_generated(
        front: impl Into<String>,
        back: impl Into<String>,
        generation_id: Option<SessionId>,
    ) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            source: FlashcardSource::AiGenerated,
            generation_id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_card_text(&self.front, &self.back)?;
        validate_source_ref(self.source, self.generation_id)
    }
}

/// Persisted flashcard row (`flashcards`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: FlashcardId,
    #[serde(rename = "user_id")]
    pub owner: UserId,
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
    pub generation_id: Option<SessionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flashcard {
    /// Builds a new row for `owner` from a validated create request.
    pub fn create(owner: UserId, request: NewFlashcard) -> Result<Self, ValidationError> {
        request.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            owner,
            front: request.front,
            back: request.back,
            source: request.source,
            generation_id: request.generation_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Builds the `ai_generated` card for an accepted proposal.
    ///
    /// The card takes the proposal's id, so one proposal maps to at most one
    /// stored card.
    pub fn promote(
        owner: UserId,
        session_id: SessionId,
        proposal: &Proposal,
    ) -> Result<Self, ValidationError> {
        let mut card = Self::create(
            owner,
            NewFlashcard::ai_generated(
                proposal.front.clone(),
                proposal.back.clone(),
                Some(session_id),
            ),
        )?;
        card.id = proposal.id;
        Ok(card)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_card_text(&self.front, &self.back)?;
        validate_source_ref(self.source, self.generation_id)
    }
}

/// Validates flashcard text limits.
pub fn validate_card_text(front: &str, back: &str) -> Result<(), ValidationError> {
    reject_nul("front", front)?;
    reject_nul("back", back)?;
    let front_len = char_len(front);
    if front_len > FRONT_MAX_CHARS {
        return Err(ValidationError::FrontTooLong { actual: front_len });
    }
    let back_len = char_len(back);
    if back_len > BACK_MAX_CHARS {
        return Err(ValidationError::BackTooLong { actual: back_len });
    }
    Ok(())
}

fn validate_source_ref(
    source: FlashcardSource,
    generation_id: Option<SessionId>,
) -> Result<(), ValidationError> {
    if source == FlashcardSource::Manual && generation_id.is_some() {
        return Err(ValidationError::ManualWithGenerationRef);
    }
    Ok(())
}
