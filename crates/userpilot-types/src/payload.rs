//! Body of a Userpilot `identify` call.
//!
//! Every metadata value is text; the engine flattens source values before
//! building this.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyPayload {
    pub user_id: String,
    pub metadata: IdentifyMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyMetadata {
    /// `"{first_name} {last_name}"`.
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub orga_creation_date: String,
    pub is_email_campaign_validated: String,
    pub is_transactional_email_validated: String,
    pub is_profile_completed: String,
    pub enabled_internal_apps: String,
    pub is_bot: String,
    pub is_receive_newsletter: String,
}
