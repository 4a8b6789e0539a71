//! Row ownership policy.
//!
//! # Responsibility
//! - Decide whether a principal may touch a row, in one place.
//! - Emit metadata-only `access_denied` events.
//!
//! # Invariants
//! - Anonymous principals are denied unconditionally.
//! - A principal may only access rows whose `owner` equals its user id.
//! - There is no bypass: every service entry point goes through
//!   [`authorize`] and, for single-row targets, [`guard`].

use crate::error::{AuthorizationError, EntityKind, StoreError, StoreResult};
use crate::model::flashcard::Flashcard;
use crate::model::principal::{Principal, UserId};
use crate::model::session::GenerationSession;
use log::warn;
use uuid::Uuid;

/// Row carrying an immutable owner.
pub trait Owned {
    const KIND: EntityKind;

    fn owner(&self) -> UserId;
    fn row_id(&self) -> Uuid;
}

impl Owned for GenerationSession {
    const KIND: EntityKind = EntityKind::GenerationSession;

    fn owner(&self) -> UserId {
        self.owner
    }

    fn row_id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Flashcard {
    const KIND: EntityKind = EntityKind::Flashcard;

    fn owner(&self) -> UserId {
        self.owner
    }

    fn row_id(&self) -> Uuid {
        self.id
    }
}

/// The isolation predicate: does `principal` own a row owned by `owner`?
pub fn owns(principal: &Principal, owner: UserId) -> bool {
    principal.user_id() == Some(owner)
}

/// Resolves the acting user id, denying anonymous principals.
pub fn authorize(principal: &Principal) -> Result<UserId, AuthorizationError> {
    principal.user_id().ok_or_else(|| {
        warn!("event=access_denied module=policy reason=anonymous");
        AuthorizationError::Anonymous
    })
}

/// Checks `principal` against a loaded row.
///
/// `None` means the row does not exist at all and yields `NotFound`; a row
/// owned by someone else yields `AuthorizationError::NotOwner`.
pub fn guard<T: Owned>(principal: &Principal, id: Uuid, row: Option<T>) -> StoreResult<T> {
    authorize(principal)?;
    let row = row.ok_or_else(|| StoreError::not_found(T::KIND, id))?;
    if !owns(principal, row.owner()) {
        warn!(
            "event=access_denied module=policy reason=not_owner entity={} row_id={}",
            T::KIND.as_str(),
            row.row_id()
        );
        return Err(AuthorizationError::NotOwner { entity: T::KIND }.into());
    }
    Ok(row)
}
