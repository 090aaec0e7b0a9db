use serde::Serialize;
use super::id::UserId;

/// An account resolved from the trusted identity header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl User {
    pub const fn new(id: UserId, username: String) -> User {
        User { id, username }
    }
}
