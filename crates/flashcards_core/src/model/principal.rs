//! Acting principal supplied by the identity provider.

use uuid::Uuid;

/// Identity-provider user id; the value every row's `owner` is checked against.
pub type UserId = Uuid;

/// Caller identity for one store operation.
///
/// `Anonymous` is denied every operation by the access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Principal {
    Anonymous,
    User(UserId),
}

impl Principal {
    pub fn user(id: UserId) -> Self {
        Self::User(id)
    }

    /// Returns the authenticated user id, if any.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(*id),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl From<Option<UserId>> for Principal {
    fn from(value: Option<UserId>) -> Self {
        value.map_or(Self::Anonymous, Self::User)
    }
}
