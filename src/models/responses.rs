use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::models::domain::{MatchStatus, PublicUser};

/// Response for like and reject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub message: String,
    #[serde(rename = "isMatch")]
    pub is_match: bool,
}

/// A match with both participants' public profiles.
///
/// `user1` is the initiator of the like, `user2` its recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub id: i64,
    #[serde(rename = "user1")]
    pub initiator: PublicUser,
    #[serde(rename = "user2")]
    pub recipient: PublicUser,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub matched_at: Option<DateTime<Utc>>,
}

/// A message with both participants' public profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: i64,
    pub sender: PublicUser,
    pub recipient: PublicUser,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
