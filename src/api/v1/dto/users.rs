/*
 * Responsibility
 * - user profile response DTO
 */
use serde::Serialize;

use crate::services::profile::UserProfile;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl From<UserProfile> for UserProfileResponse {
    fn from(p: UserProfile) -> Self {
        Self {
            username: p.username,
            first_name: p.given_name,
            last_name: p.surname,
            email: p.email,
            roles: p.roles,
        }
    }
}
