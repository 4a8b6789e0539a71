//! Generation session domain model.
//!
//! # Responsibility
//! - Define one LLM-assisted proposal request and its candidate outputs.
//! - Validate `source_text` bounds and proposal id uniqueness.
//!
//! # Invariants
//! - `source_text` length is within `[1000, 10000]` characters.
//! - Proposal ids are unique within one session.
//! - `generated_count`/`accepted_count` are never derived from `proposals`;
//!   writers maintain them explicitly.

use super::principal::UserId;
use super::{char_len, reject_nul, ValidationError, SOURCE_TEXT_MAX_CHARS, SOURCE_TEXT_MIN_CHARS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type SessionId = Uuid;
pub type ProposalId = Uuid;

/// Review state of one candidate flashcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl Display for ProposalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(ValidationError::UnknownProposalStatus(other.to_string())),
        }
    }
}

/// Candidate flashcard stored inside a session's `proposals` JSON array.
///
/// Wire keys are exactly `id`, `front`, `back`, `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub front: String,
    pub back: String,
    pub status: ProposalStatus,
}

impl Proposal {
    /// Creates a fresh `pending` proposal with a generated id.
    pub fn pending(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            front: front.into(),
            back: back.into(),
            status: ProposalStatus::Pending,
        }
    }
}

/// Front/back pair produced by the external generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalDraft {
    pub front: String,
    pub back: String,
}

impl ProposalDraft {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }
}

/// Persisted generation session row (`flashcards_gen_sessions`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSession {
    pub id: SessionId,
    #[serde(rename = "user_id")]
    pub owner: UserId,
    pub source_text: String,
    pub proposals: Vec<Proposal>,
    pub generated_count: u32,
    pub accepted_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationSession {
    /// Creates a new session with empty proposals and zero counters.
    ///
    /// # Errors
    /// - `SourceTextLength` when `source_text` is outside `[1000, 10000]`.
    pub fn new(owner: UserId, source_text: impl Into<String>) -> Result<Self, ValidationError> {
        let source_text = source_text.into();
        validate_source_text(&source_text)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            owner,
            source_text,
            proposals: Vec::new(),
            generated_count: 0,
            accepted_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Checks all write-time invariants of this session.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_source_text(&self.source_text)?;
        validate_proposals(&self.proposals)
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.iter().find(|proposal| proposal.id == id)
    }

    pub fn proposal_mut(&mut self, id: ProposalId) -> Option<&mut Proposal> {
        self.proposals.iter_mut().find(|proposal| proposal.id == id)
    }

    /// Number of proposals currently in `status`.
    pub fn count_with_status(&self, status: ProposalStatus) -> usize {
        self.proposals
            .iter()
            .filter(|proposal| proposal.status == status)
            .count()
    }

    /// Refreshes `updated_at`; writers call this before persisting a mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Validates `source_text` length bounds (inclusive).
pub fn validate_source_text(source_text: &str) -> Result<(), ValidationError> {
    reject_nul("source_text", source_text)?;
    let actual = char_len(source_text);
    if !(SOURCE_TEXT_MIN_CHARS..=SOURCE_TEXT_MAX_CHARS).contains(&actual) {
        return Err(ValidationError::SourceTextLength { actual });
    }
    Ok(())
}

/// Rejects proposal lists with repeated ids.
pub fn validate_proposals(proposals: &[Proposal]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(proposals.len());
    for proposal in proposals {
        if !seen.insert(proposal.id) {
            return Err(ValidationError::DuplicateProposalId(proposal.id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_source_text, GenerationSession, Proposal, ProposalStatus};
    use crate::model::ValidationError;
    use uuid::Uuid;

    #[test]
    fn source_text_bounds_are_inclusive() {
        assert!(validate_source_text(&"a".repeat(1000)).is_ok());
        assert!(validate_source_text(&"a".repeat(10000)).is_ok());
        assert_eq!(
            validate_source_text(&"a".repeat(999)),
            Err(ValidationError::SourceTextLength { actual: 999 })
        );
        assert_eq!(
            validate_source_text(&"a".repeat(10001)),
            Err(ValidationError::SourceTextLength { actual: 10001 })
        );
    }

    #[test]
    fn source_text_counts_characters_not_bytes() {
        // 1000 chars, 3000 bytes.
        assert!(validate_source_text(&"語".repeat(1000)).is_ok());
        assert!(validate_source_text(&"語".repeat(999)).is_err());
    }

    #[test]
    fn source_text_with_nul_is_rejected() {
        let mut text = "a".repeat(999);
        text.insert(500, '\0');
        assert_eq!(
            validate_source_text(&text),
            Err(ValidationError::NulCharacter {
                field: "source_text"
            })
        );
    }

    #[test]
    fn new_session_starts_empty() {
        let session = GenerationSession::new(Uuid::new_v4(), "x".repeat(1000)).unwrap();
        assert!(session.proposals.is_empty());
        assert_eq!(session.generated_count, 0);
        assert_eq!(session.accepted_count, 0);
        assert_eq!(session.created_at, session.updated_at);
    }

    #[test]
    fn validate_rejects_duplicate_proposal_ids() {
        let mut session = GenerationSession::new(Uuid::new_v4(), "x".repeat(1000)).unwrap();
        let proposal = Proposal::pending("q", "a");
        session.proposals = vec![proposal.clone(), proposal.clone()];
        assert_eq!(
            session.validate(),
            Err(ValidationError::DuplicateProposalId(proposal.id))
        );
    }

    #[test]
    fn proposal_status_parses_only_known_values() {
        assert_eq!("accepted".parse::<ProposalStatus>(), Ok(ProposalStatus::Accepted));
        assert_eq!(
            "Accepted".parse::<ProposalStatus>(),
            Err(ValidationError::UnknownProposalStatus("Accepted".to_string()))
        );
    }
}
