use serde::{Deserialize, Serialize};
use shelf_db::{Address, RecordId};
use time::OffsetDateTime;

/// Registration payload. Every field is optional here so that missing fields
/// are reported together as one validation error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUser {
    pub title: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: RecordId,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}
