//! Account lifecycle service.
//!
//! Registration of identity-provider users and the account-deletion trigger
//! that cascades to every session and flashcard the user owns.

use crate::error::{AuthorizationError, EntityKind, StoreResult};
use crate::model::principal::{Principal, UserId};
use crate::policy::{authorize, owns};
use crate::repo::user_repo::{OwnedCounts, SqliteUserRepository, UserRepository};
use log::{info, warn};
use rusqlite::Connection;

pub struct AccountService<'conn> {
    users: SqliteUserRepository<'conn>,
}

impl<'conn> AccountService<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        Ok(Self {
            users: SqliteUserRepository::try_new(conn)?,
        })
    }

    /// Registers the principal's user id. Idempotent.
    ///
    /// Returns `true` when the user row was created by this call.
    pub fn register_user(&self, principal: &Principal) -> StoreResult<bool> {
        let user_id = authorize(principal)?;
        let created = self.users.register_user(user_id)?;
        if created {
            info!(
                "event=user_register module=service status=ok user_id={}",
                user_id
            );
        }
        Ok(created)
    }

    /// Deletes `user_id` and everything it owns in one transaction.
    ///
    /// Only the user itself may trigger this.
    pub fn delete_account(
        &self,
        principal: &Principal,
        user_id: UserId,
    ) -> StoreResult<OwnedCounts> {
        authorize(principal)?;
        if !owns(principal, user_id) {
            warn!("event=access_denied module=service reason=not_owner entity=user");
            return Err(AuthorizationError::NotOwner {
                entity: EntityKind::User,
            }
            .into());
        }

        let removed = self.users.delete_user(user_id)?;
        info!(
            "event=account_delete module=service status=ok user_id={} sessions_removed={} flashcards_removed={}",
            user_id, removed.sessions, removed.flashcards
        );
        Ok(removed)
    }

    /// Counts the principal's sessions and flashcards.
    pub fn owned_counts(&self, principal: &Principal) -> StoreResult<OwnedCounts> {
        let user_id = authorize(principal)?;
        self.users.owned_counts(user_id)
    }

    pub fn is_registered(&self, principal: &Principal) -> StoreResult<bool> {
        let user_id = authorize(principal)?;
        self.users.user_exists(user_id)
    }
}
