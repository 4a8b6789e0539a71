//! Use-case services: the only public entry points for entity access.
//!
//! # Responsibility
//! - Run the access policy before every read or write.
//! - Orchestrate repository calls into use-case level APIs.
//! - Maintain session counters explicitly on the write paths that change them.
//!
//! # Invariants
//! - No service method touches a row before `policy::authorize` succeeds.
//! - Single-row targets pass through `policy::guard`; bulk reads are scoped
//!   to the authorized owner in SQL.

pub mod account_service;
pub mod flashcard_service;
pub mod session_service;
