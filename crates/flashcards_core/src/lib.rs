//! Core data layer for the flashcards application.
//!
//! Owns the schema, write-time constraints and the per-row ownership gate
//! for generation sessions and flashcards. Callers reach rows only through
//! the services re-exported here.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod policy;
pub(crate) mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use error::{
    AuthorizationError, EntityKind, ReferenceError, StoreError, StoreResult,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::flashcard::{Flashcard, FlashcardId, FlashcardSource, NewFlashcard};
pub use model::principal::{Principal, UserId};
pub use model::session::{
    GenerationSession, Proposal, ProposalDraft, ProposalId, ProposalStatus, SessionId,
};
pub use model::ValidationError;
pub use policy::owns;
pub use repo::flashcard_repo::FlashcardListQuery;
pub use repo::normalize_list_limit;
pub use repo::session_repo::SessionListQuery;
pub use repo::user_repo::OwnedCounts;
pub use service::account_service::AccountService;
pub use service::flashcard_service::{FlashcardService, FlashcardUpdate};
pub use service::session_service::{GenerationSessionService, SessionUpdate};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
