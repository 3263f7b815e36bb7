use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Salted SHA-256 digest of a password, hex-encoded for storage.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    hash_password(password, salt) == expected_hash
}

pub fn generate_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Opaque bearer token issued at login.
pub fn generate_session_token() -> String {
    Uuid::new_v4().to_string()
}

/// Six-digit password-reset code.
pub fn generate_reset_code() -> String {
    let n = (Uuid::new_v4().as_u128() % 900_000) as u32;
    (100_000 + n).to_string()
}
