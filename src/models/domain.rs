use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a user in the directory
pub type UserId = i64;

/// Gender tag, used both for a user's own gender and their interests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "gender", rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// A user as held by the directory.
///
/// Has no `Serialize` impl. The wire representation is [`PublicUser`],
/// which carries no credential.
#[derive(Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub gender: Gender,
    pub interested_in_genders: Vec<Gender>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("department", &self.department)
            .field("gender", &self.gender)
            .field("interested_in_genders", &self.interested_in_genders)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Public view of a user, safe to put on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub gender: Gender,
    pub interested_in_genders: Vec<Gender>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            birth_date: user.birth_date,
            department: user.department.clone(),
            job_title: user.job_title.clone(),
            bio: user.bio.clone(),
            profile_image_url: user.profile_image_url.clone(),
            gender: user.gender,
            interested_in_genders: user.interested_in_genders.clone(),
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

/// Registration data handed to the directory by the identity provider
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub gender: Gender,
    pub interested_in_genders: Vec<Gender>,
}

/// Lifecycle state of a like between two users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "match_status", rename_all = "UPPERCASE")]
pub enum MatchStatus {
    Pending,
    Matched,
    Rejected,
}

impl MatchStatus {
    /// MATCHED and REJECTED accept no further transitions
    pub fn is_terminal(self) -> bool {
        !matches!(self, MatchStatus::Pending)
    }
}

/// Relationship record for an unordered pair of users
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Match {
    pub id: i64,
    pub initiator_id: UserId,
    pub recipient_id: UserId,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub matched_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn involves(&self, user_id: UserId) -> bool {
        self.initiator_id == user_id || self.recipient_id == user_id
    }
}

/// A message between two matched users
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_unread_by(&self, user_id: UserId) -> bool {
        self.recipient_id == user_id && self.read_at.is_none()
    }
}
