//! Generation session use-case service.
//!
//! # Responsibility
//! - Create sessions and record the proposals an external generator returns.
//! - Track proposal review state and promote accepted proposals to cards.
//!
//! # Invariants
//! - `generated_count` grows by exactly the number of proposals appended.
//! - `accepted_count` grows by exactly the number of proposals promoted.
//! - Neither counter is recomputed from `proposals`; `update_session` writes
//!   them only when the caller supplies values.
//! - Every edit reloads, checks and rewrites the row in one IMMEDIATE
//!   transaction; promotion inserts its cards in that same transaction.
//! - A proposal is promoted at most once while its card exists.

use crate::error::StoreResult;
use crate::model::flashcard::Flashcard;
use crate::model::principal::Principal;
use crate::model::session::{
    GenerationSession, Proposal, ProposalDraft, ProposalId, ProposalStatus, SessionId,
};
use crate::model::ValidationError;
use crate::policy::{authorize, guard};
use crate::repo::session_repo::{
    SessionEdit, SessionListQuery, SessionRepository, SqliteSessionRepository,
};
use log::info;
use rusqlite::Connection;
use std::collections::HashSet;

/// Patch applied by [`GenerationSessionService::update_session`].
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    pub proposals: Option<Vec<Proposal>>,
    pub generated_count: Option<u32>,
    pub accepted_count: Option<u32>,
}

impl SessionUpdate {
    pub fn is_empty(&self) -> bool {
        self.proposals.is_none() && self.generated_count.is_none() && self.accepted_count.is_none()
    }
}

pub struct GenerationSessionService<'conn> {
    sessions: SqliteSessionRepository<'conn>,
}

impl<'conn> GenerationSessionService<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        Ok(Self {
            sessions: SqliteSessionRepository::try_new(conn)?,
        })
    }

    /// Starts a session for `source_text`.
    ///
    /// # Errors
    /// - `Authorization` for anonymous principals.
    /// - `Validation` when `source_text` is outside `[1000, 10000]` characters.
    /// - `Reference` when the caller is not a registered user.
    pub fn create_session(
        &self,
        principal: &Principal,
        source_text: impl Into<String>,
    ) -> StoreResult<GenerationSession> {
        let owner = authorize(principal)?;
        let session = GenerationSession::new(owner, source_text)?;
        self.sessions.insert_session(&session)?;
        info!(
            "event=session_create module=service status=ok session_id={} source_chars={}",
            session.id,
            session.source_text.chars().count()
        );
        Ok(session)
    }

    pub fn get_session(
        &self,
        principal: &Principal,
        id: SessionId,
    ) -> StoreResult<GenerationSession> {
        authorize(principal)?;
        guard(principal, id, self.sessions.find_session(id)?)
    }

    /// Lists the caller's sessions, newest first.
    pub fn list_sessions(
        &self,
        principal: &Principal,
        query: &SessionListQuery,
    ) -> StoreResult<Vec<GenerationSession>> {
        let owner = authorize(principal)?;
        self.sessions.list_sessions(owner, query)
    }

    /// Applies a proposals/counters patch.
    pub fn update_session(
        &self,
        principal: &Principal,
        id: SessionId,
        update: SessionUpdate,
    ) -> StoreResult<GenerationSession> {
        let (session, _) = self.modify(principal, id, "session_update", |session| {
            if update.is_empty() {
                return Ok(None);
            }
            if let Some(proposals) = update.proposals {
                session.proposals = proposals;
            }
            if let Some(generated_count) = update.generated_count {
                session.generated_count = generated_count;
            }
            if let Some(accepted_count) = update.accepted_count {
                session.accepted_count = accepted_count;
            }
            Ok(Some(Vec::new()))
        })?;
        Ok(session)
    }

    /// Appends generator output as `pending` proposals.
    pub fn append_proposals(
        &self,
        principal: &Principal,
        id: SessionId,
        drafts: Vec<ProposalDraft>,
    ) -> StoreResult<GenerationSession> {
        let (session, _) = self.modify(principal, id, "session_append_proposals", |session| {
            let appended = u32::try_from(drafts.len()).unwrap_or(u32::MAX);
            session.proposals.extend(
                drafts
                    .into_iter()
                    .map(|draft| Proposal::pending(draft.front, draft.back)),
            );
            session.generated_count = session.generated_count.saturating_add(appended);
            Ok(Some(Vec::new()))
        })?;
        Ok(session)
    }

    /// Moves one proposal to `status`.
    pub fn set_proposal_status(
        &self,
        principal: &Principal,
        id: SessionId,
        proposal_id: ProposalId,
        status: ProposalStatus,
    ) -> StoreResult<GenerationSession> {
        let (session, _) = self.modify(principal, id, "session_set_proposal_status", |session| {
            let proposal = session
                .proposal_mut(proposal_id)
                .ok_or(ValidationError::UnknownProposal(proposal_id))?;
            if proposal.status == status {
                return Ok(None);
            }
            proposal.status = status;
            Ok(Some(Vec::new()))
        })?;
        Ok(session)
    }

    /// Turns accepted proposals into `ai_generated` flashcards.
    ///
    /// Every id must name an `accepted` proposal of this session that has no
    /// card yet; otherwise nothing is written. Each card takes its
    /// proposal's id.
    pub fn promote_accepted(
        &self,
        principal: &Principal,
        id: SessionId,
        proposal_ids: &[ProposalId],
    ) -> StoreResult<Vec<Flashcard>> {
        let (_, cards) = self.modify(principal, id, "session_promote", |session| {
            let mut seen = HashSet::with_capacity(proposal_ids.len());
            let mut cards = Vec::with_capacity(proposal_ids.len());

            for proposal_id in proposal_ids {
                if !seen.insert(*proposal_id) {
                    return Err(ValidationError::DuplicateProposalId(*proposal_id).into());
                }
                let proposal = session
                    .proposal(*proposal_id)
                    .ok_or(ValidationError::UnknownProposal(*proposal_id))?;
                if proposal.status != ProposalStatus::Accepted {
                    return Err(ValidationError::ProposalNotAccepted {
                        proposal_id: *proposal_id,
                        status: proposal.status.to_string(),
                    }
                    .into());
                }
                cards.push(Flashcard::promote(session.owner, session.id, proposal)?);
            }

            if cards.is_empty() {
                return Ok(None);
            }
            let promoted = u32::try_from(cards.len()).unwrap_or(u32::MAX);
            session.accepted_count = session.accepted_count.saturating_add(promoted);
            Ok(Some(cards))
        })?;
        Ok(cards)
    }

    /// Deletes the session; cards that referenced it keep living with a
    /// cleared `generation_id`.
    pub fn delete_session(&self, principal: &Principal, id: SessionId) -> StoreResult<()> {
        let session = self.get_session(principal, id)?;
        self.sessions.delete_session(session.owner, session.id)?;
        info!(
            "event=session_delete module=service status=ok session_id={}",
            session.id
        );
        Ok(())
    }

    /// Runs `edit` on the freshly locked row after the ownership check.
    ///
    /// `edit` returns `None` to leave the row untouched, or the cards to
    /// insert alongside the rewritten session.
    fn modify<F>(
        &self,
        principal: &Principal,
        id: SessionId,
        event: &'static str,
        edit: F,
    ) -> StoreResult<(GenerationSession, Vec<Flashcard>)>
    where
        F: FnOnce(&mut GenerationSession) -> StoreResult<Option<Vec<Flashcard>>>,
    {
        authorize(principal)?;
        let outcome = self.sessions.modify_session(id, |row| {
            let mut session = guard(principal, id, row)?;
            match edit(&mut session)? {
                None => Ok(SessionEdit::Unchanged(session)),
                Some(cards) => {
                    session.touch();
                    Ok(SessionEdit::Changed { session, cards })
                }
            }
        })?;

        match outcome {
            SessionEdit::Unchanged(session) => Ok((session, Vec::new())),
            SessionEdit::Changed { session, cards } => {
                info!(
                    "event={} module=service status=ok session_id={} proposals={} generated_count={} accepted_count={} cards_created={}",
                    event,
                    session.id,
                    session.proposals.len(),
                    session.generated_count,
                    session.accepted_count,
                    cards.len()
                );
                Ok((session, cards))
            }
        }
    }
}
