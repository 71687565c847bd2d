//! The `Store` trait and its error type.
//!
//! The directory, match engine and conversation store only talk to
//! persistence through this trait. `PostgresClient` is the production
//! backend, `MemoryStore` the in-process one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Match, MatchStatus, Message, NewUser, ProfileUpdate, User, UserId};

/// Errors that can occur in a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Duplicate: {0}")]
    Duplicate(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for users, matches and messages.
///
/// Pair lookups consider both orderings. The store guarantees at most one
/// match per unordered pair: `insert_pending_match` reports a lost race as
/// `None` rather than creating a second record.
#[async_trait]
pub trait Store: Send + Sync {
    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    /// Persist a newly registered user
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Fetch several users at once; unknown ids are skipped
    async fn find_users(&self, ids: &[UserId]) -> StoreResult<Vec<User>>;

    /// Replace the editable profile fields. `None` if the user does not exist.
    async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> StoreResult<Option<User>>;

    /// Active users, other than `viewer`, whose gender is in the viewer's
    /// interests and whose department equals the viewer's, ordered by id
    async fn find_potential_matches(&self, viewer: &User) -> StoreResult<Vec<User>>;

    // ------------------------------------------------------------------------
    // Matches
    // ------------------------------------------------------------------------

    /// The match record for the unordered pair, if any
    async fn find_match_between(&self, a: UserId, b: UserId) -> StoreResult<Option<Match>>;

    /// Create a PENDING record. `None` if the pair already has a record.
    async fn insert_pending_match(&self, initiator: UserId, recipient: UserId) -> StoreResult<Option<Match>>;

    /// Compare-and-set the status of a match.
    ///
    /// Returns `None` when the record is no longer in `from`. Moving to
    /// MATCHED stamps `matched_at`.
    async fn transition_match(&self, id: i64, from: MatchStatus, to: MatchStatus) -> StoreResult<Option<Match>>;

    /// MATCHED records involving the user, oldest first
    async fn find_matched_for_user(&self, user_id: UserId) -> StoreResult<Vec<Match>>;

    /// PENDING records where the user is the recipient, oldest first
    async fn find_pending_for_recipient(&self, user_id: UserId) -> StoreResult<Vec<Match>>;

    // ------------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------------

    async fn insert_message(&self, sender: UserId, recipient: UserId, content: &str) -> StoreResult<Message>;

    /// All messages between the pair, ascending by send time then id
    async fn find_messages_between(&self, a: UserId, b: UserId) -> StoreResult<Vec<Message>>;

    /// Stamp `read_at` on the given messages addressed to `recipient` that
    /// are still unread. Returns the number of rows stamped.
    async fn mark_read(&self, recipient: UserId, ids: &[i64], read_at: DateTime<Utc>) -> StoreResult<u64>;

    /// Unread messages addressed to the user, by id
    async fn find_unread_for(&self, user_id: UserId) -> StoreResult<Vec<Message>>;

    // ------------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------------

    async fn health_check(&self) -> StoreResult<bool>;
}
