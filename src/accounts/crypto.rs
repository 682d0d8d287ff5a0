//! # Password Hashing
//!
//! Passwords are only ever stored as Argon2id PHC strings.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::errors::{AccountError, AccountResult};

/// Hash a password using Argon2id with a fresh random salt
pub fn hash_password(password: &str) -> AccountResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AccountError::HashingFailed)
}

/// Verify a password against a stored hash.
///
/// A malformed hash and a wrong password both fail with
/// `CredentialMismatch`.
pub fn verify_password(password: &str, hash: &str) -> AccountResult<()> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AccountError::CredentialMismatch)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AccountError::CredentialMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let password = "secure_password_123";
        let hash = hash_password(password).unwrap();

        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_password(password, &hash).is_ok());
        assert_eq!(
            verify_password("wrong_password", &hash).unwrap_err(),
            AccountError::CredentialMismatch
        );
    }

    #[test]
    fn test_password_hash_produces_unique_hashes() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        // Salted
        assert_ne!(hash1, hash2);
        assert!(verify_password("same_password", &hash1).is_ok());
        assert!(verify_password("same_password", &hash2).is_ok());
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        assert_eq!(
            verify_password("anything", "not a phc string").unwrap_err(),
            AccountError::CredentialMismatch
        );
        assert_eq!(
            verify_password("anything", "").unwrap_err(),
            AccountError::CredentialMismatch
        );
    }
}
