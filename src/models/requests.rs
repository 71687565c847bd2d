use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{Gender, UserId};

/// Request to send a message to a matched user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub recipient_id: UserId,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Full replacement of the editable profile fields.
///
/// Optional fields that are absent in the request are cleared.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub job_title: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub interested_in_genders: Vec<Gender>,
}
