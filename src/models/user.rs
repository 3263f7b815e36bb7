use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLE_LAB_INCHARGE: &str = "lab_incharge";
pub const ROLE_LAB_PROGRAMMER: &str = "lab_programmer";

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub role: String,
    /// Lab id a programmer operates; NULL for in-charges.
    pub lab_managed: Option<String>,
    pub secret_code: Option<String>,
    pub session_token: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInchargeRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterProgrammerRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub lab_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    #[serde(rename = "secretCode")]
    pub secret_code: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Public view of a user, as returned by login.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub labs_managed: Vec<String>,
}
