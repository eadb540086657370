use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString},
};

use crate::error::ApiError;

/// hash_password
///
/// Hashes a plaintext password with Argon2id and a fresh random salt.
/// The returned PHC string encodes the salt and parameters alongside the
/// digest, so nothing besides this single value needs to be stored.
pub fn hash_password(plaintext: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(rand::thread_rng());

    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|err| {
            tracing::error!("password hashing failed: {err}");
            ApiError::Internal
        })?;

    Ok(hash.to_string())
}

/// verify_password
///
/// Recomputes the hash for `plaintext` using the salt and parameters encoded
/// in `stored` and compares the digests. Returns false for a mismatch and
/// also for a stored value that is not a parseable PHC string; it never
/// errors or panics.
pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}
