use std::sync::Arc;

use crate::core::directory::Directory;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Match, MatchStatus, MatchView, UserId};
use crate::services::Store;

/// How many times a like re-reads the pair after losing a race
pub const MAX_LIKE_ATTEMPTS: usize = 3;

/// What a like should do, given the pair's current record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeDecision {
    /// No record yet: create a PENDING one with the actor as initiator
    Create,
    /// The other party liked the actor first: move the record to MATCHED
    Complete { match_id: i64 },
    /// The actor already liked the target and is still waiting
    AlreadyLiked,
    AlreadyMatched,
    AlreadyRejected,
}

/// Decide how `actor`'s like applies to the pair's existing record.
///
/// MATCHED and REJECTED are terminal: any further like is refused.
pub fn decide_like(existing: Option<&Match>, actor: UserId) -> LikeDecision {
    let Some(record) = existing else {
        return LikeDecision::Create;
    };

    if record.status.is_terminal() {
        return match record.status {
            MatchStatus::Matched => LikeDecision::AlreadyMatched,
            _ => LikeDecision::AlreadyRejected,
        };
    }

    if record.recipient_id == actor {
        LikeDecision::Complete { match_id: record.id }
    } else {
        LikeDecision::AlreadyLiked
    }
}

/// Result of a successful like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// Recorded, waiting for the other party
    Liked,
    /// Mutual like
    Matched,
}

impl LikeOutcome {
    pub fn is_match(self) -> bool {
        matches!(self, LikeOutcome::Matched)
    }

    pub fn message(self) -> &'static str {
        match self {
            LikeOutcome::Liked => "Like sent successfully",
            LikeOutcome::Matched => "It's a match!",
        }
    }
}

/// Result of a reject. Both variants are successes for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectOutcome {
    Rejected,
    /// No incoming pending like from the target; nothing changed
    NothingToReject,
}

/// Governs the like/reject/match lifecycle for every pair of users
///
/// # States
/// NONE → PENDING → MATCHED | REJECTED
///
/// Only the engine creates or mutates match records. Races between the two
/// members of a pair are settled by the store's unordered-pair uniqueness and
/// compare-and-set transitions; the engine re-reads and re-decides on a lost
/// race.
#[derive(Clone)]
pub struct MatchEngine {
    store: Arc<dyn Store>,
    directory: Directory,
}

impl MatchEngine {
    pub fn new(store: Arc<dyn Store>, directory: Directory) -> Self {
        Self { store, directory }
    }

    /// Record `actor`'s like of `target`
    pub async fn like(&self, actor: UserId, target: UserId) -> ServiceResult<LikeOutcome> {
        if actor == target {
            return Err(ServiceError::InvalidOperation("Cannot like yourself".to_string()));
        }

        self.directory.resolve(actor).await?;
        self.directory.resolve(target).await?;

        for attempt in 1..=MAX_LIKE_ATTEMPTS {
            let existing = self.store.find_match_between(actor, target).await?;

            match decide_like(existing.as_ref(), actor) {
                LikeDecision::Create => {
                    if let Some(record) = self.store.insert_pending_match(actor, target).await? {
                        tracing::info!("User {} liked user {} (match {})", actor, target, record.id);
                        return Ok(LikeOutcome::Liked);
                    }
                }
                LikeDecision::Complete { match_id } => {
                    if self
                        .store
                        .transition_match(match_id, MatchStatus::Pending, MatchStatus::Matched)
                        .await?
                        .is_some()
                    {
                        tracing::info!("Users {} and {} matched (match {})", actor, target, match_id);
                        return Ok(LikeOutcome::Matched);
                    }
                }
                LikeDecision::AlreadyLiked => {
                    return Err(ServiceError::Conflict("Already liked this user".to_string()));
                }
                LikeDecision::AlreadyMatched => {
                    return Err(ServiceError::Conflict("Users are already matched".to_string()));
                }
                LikeDecision::AlreadyRejected => {
                    return Err(ServiceError::Conflict("This like was already declined".to_string()));
                }
            }

            tracing::warn!(
                "Lost like race between {} and {} (attempt {}/{}), re-reading",
                actor,
                target,
                attempt,
                MAX_LIKE_ATTEMPTS
            );
        }

        Err(ServiceError::Conflict("Like could not be applied, please retry".to_string()))
    }

    /// Decline an incoming pending like from `target`.
    ///
    /// Anything else (no record, actor is the initiator, record already
    /// MATCHED or REJECTED) is a no-op reported as [`RejectOutcome::NothingToReject`],
    /// never as an error.
    pub async fn reject(&self, actor: UserId, target: UserId) -> ServiceResult<RejectOutcome> {
        let existing = self.store.find_match_between(actor, target).await?;

        let Some(record) = existing.filter(|m| m.recipient_id == actor && m.status == MatchStatus::Pending) else {
            tracing::debug!("User {} has no pending like from {} to reject", actor, target);
            return Ok(RejectOutcome::NothingToReject);
        };

        let transitioned = self
            .store
            .transition_match(record.id, MatchStatus::Pending, MatchStatus::Rejected)
            .await?;

        if transitioned.is_some() {
            tracing::info!("User {} rejected user {} (match {})", actor, target, record.id);
            Ok(RejectOutcome::Rejected)
        } else {
            Ok(RejectOutcome::NothingToReject)
        }
    }

    /// MATCHED records involving the user
    pub async fn list_matches(&self, user_id: UserId) -> ServiceResult<Vec<MatchView>> {
        let records = self.store.find_matched_for_user(user_id).await?;
        self.hydrate(records).await
    }

    /// Incoming likes awaiting the user's response
    pub async fn list_pending(&self, user_id: UserId) -> ServiceResult<Vec<MatchView>> {
        let records = self.store.find_pending_for_recipient(user_id).await?;
        self.hydrate(records).await
    }

    async fn hydrate(&self, records: Vec<Match>) -> ServiceResult<Vec<MatchView>> {
        let ids: Vec<UserId> = records
            .iter()
            .flat_map(|m| [m.initiator_id, m.recipient_id])
            .collect();
        let profiles = self.directory.public_profiles(&ids).await?;

        let views = records
            .into_iter()
            .filter_map(|m| {
                let initiator = profiles.get(&m.initiator_id)?.clone();
                let recipient = profiles.get(&m.recipient_id)?.clone();
                Some(MatchView {
                    id: m.id,
                    initiator,
                    recipient,
                    status: m.status,
                    created_at: m.created_at,
                    matched_at: m.matched_at,
                })
            })
            .collect();

        Ok(views)
    }
}
