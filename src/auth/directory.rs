//! Capabilities the session core needs from persistence.
//!
//! The core never talks to a database directly. Whatever backs these traits
//! must make every refresh-token write atomic per user: concurrent writers for
//! the same user may race, but exactly one record has to survive.

use async_trait::async_trait;

use crate::db::models::User;
use crate::error::DatabaseError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Exact, case-sensitive match on the stored email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// The user whose current refresh token equals `token`, if any.
    async fn find_owner_of_refresh_token(&self, token: &str) -> Result<Option<User>, DatabaseError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Insert or replace the user's refresh token in a single operation.
    async fn upsert(&self, user_id: i32, token: &str) -> Result<(), DatabaseError>;

    /// Replace `current` with `next` only if `current` is still the user's token.
    ///
    /// Returns `false` when another login or refresh got there first.
    async fn rotate(&self, user_id: i32, current: &str, next: &str) -> Result<bool, DatabaseError>;

    /// Drop the user's refresh token. Deleting a missing record is not an error.
    async fn revoke(&self, user_id: i32) -> Result<(), DatabaseError>;
}
