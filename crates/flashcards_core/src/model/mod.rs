//! Domain model for generation sessions and flashcards.
//!
//! # Responsibility
//! - Define the canonical records persisted by the store.
//! - Own the write-time length/enum constraints so they are checked before
//!   any SQL runs (storage CHECK constraints mirror them).
//!
//! # Invariants
//! - Every record is identified by a stable UUID and carries an immutable
//!   owner.
//! - Text lengths are counted in Unicode scalar values, matching SQLite's
//!   `length()` on TEXT for NUL-free strings.
//! - Stored text never contains NUL; SQLite `length()` stops at the first
//!   one, so storage checks would miscount it.

pub mod flashcard;
pub mod principal;
pub mod session;

use uuid::Uuid;

/// Inclusive lower bound for `source_text` length.
pub const SOURCE_TEXT_MIN_CHARS: usize = 1000;
/// Inclusive upper bound for `source_text` length.
pub const SOURCE_TEXT_MAX_CHARS: usize = 10000;
/// Maximum flashcard `front` length.
pub const FRONT_MAX_CHARS: usize = 500;
/// Maximum flashcard `back` length.
pub const BACK_MAX_CHARS: usize = 2000;

/// Write-time constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("source_text must be between 1000 and 10000 characters, got {actual}")]
    SourceTextLength { actual: usize },
    #[error("front must be at most 500 characters, got {actual}")]
    FrontTooLong { actual: usize },
    #[error("back must be at most 2000 characters, got {actual}")]
    BackTooLong { actual: usize },
    #[error("unknown flashcard source `{0}`; expected manual|ai_generated")]
    UnknownSource(String),
    #[error("unknown proposal status `{0}`; expected pending|accepted|rejected")]
    UnknownProposalStatus(String),
    #[error("manual flashcards cannot reference a generation session")]
    ManualWithGenerationRef,
    #[error("duplicate proposal id {0} in session")]
    DuplicateProposalId(Uuid),
    #[error("proposal {0} does not exist in session")]
    UnknownProposal(Uuid),
    #[error("proposal {0} was already promoted to a flashcard")]
    ProposalAlreadyPromoted(Uuid),
    #[error("{field} must not contain NUL characters")]
    NulCharacter { field: &'static str },
    #[error("proposal {proposal_id} is `{status}`, only accepted proposals can be promoted")]
    ProposalNotAccepted { proposal_id: Uuid, status: String },
    /// Storage-level CHECK/NOT NULL failure that slipped past model checks.
    #[error("constraint violated: {0}")]
    Constraint(String),
}

pub(crate) fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub(crate) fn reject_nul(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        return Err(ValidationError::NulCharacter { field });
    }
    Ok(())
}
