use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{ProfileUpdate, PublicUser, User, UserId};
use crate::services::Store;

/// Whether `candidate` belongs in `viewer`'s potential matches.
///
/// The candidate must be active, someone other than the viewer, share at
/// least one gender-interest tag with the viewer, and share the viewer's
/// department. A viewer without a department or without interest tags has
/// no candidates. Users the viewer has already liked, matched or rejected
/// are not excluded.
#[inline]
pub fn is_potential_match(viewer: &User, candidate: &User) -> bool {
    if candidate.id == viewer.id || !candidate.active {
        return false;
    }

    let shares_interest = candidate
        .interested_in_genders
        .iter()
        .any(|g| viewer.interested_in_genders.contains(g));
    if !shares_interest {
        return false;
    }

    match (&viewer.department, &candidate.department) {
        (Some(mine), Some(theirs)) => mine == theirs,
        _ => false,
    }
}

/// User directory: identity resolution, own profile and discovery
#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn Store>,
}

impl Directory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resolve an identity, failing with `NotFound` if it is unknown
    pub async fn resolve(&self, id: UserId) -> ServiceResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))
    }

    pub async fn profile(&self, id: UserId) -> ServiceResult<PublicUser> {
        self.resolve(id).await.map(PublicUser::from)
    }

    /// Replace the caller's editable profile fields
    pub async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> ServiceResult<PublicUser> {
        update.validate()?;

        let user = self
            .store
            .update_profile(id, &update)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))?;

        tracing::info!("Updated profile for user {}", id);

        Ok(PublicUser::from(user))
    }

    pub async fn potential_matches(&self, id: UserId) -> ServiceResult<Vec<PublicUser>> {
        let viewer = self.resolve(id).await?;
        let candidates = self.store.find_potential_matches(&viewer).await?;

        tracing::debug!("User {} has {} potential matches", id, candidates.len());

        Ok(candidates.iter().map(PublicUser::from).collect())
    }

    /// Public profiles for a set of ids, keyed by id
    pub async fn public_profiles(&self, ids: &[UserId]) -> ServiceResult<HashMap<UserId, PublicUser>> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let users = self.store.find_users(&unique).await?;

        Ok(users.iter().map(|u| (u.id, PublicUser::from(u))).collect())
    }
}
