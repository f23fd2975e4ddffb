//! Password hashing

use aequora_common::{AequoraError, MIN_PASSWORD_LENGTH};

use crate::model::MAX_PASSWORD_LENGTH;

/// bcrypt cost used for every stored hash
const BCRYPT_COST: u32 = 10;

/// Check the password policy: 6 to 72 characters, not only whitespace
pub fn check_password_policy(password: &str) -> Result<(), AequoraError> {
    if password.trim().is_empty() || password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AequoraError::ValidationFailed(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AequoraError::ValidationFailed(format!(
            "password must be at most {} bytes",
            MAX_PASSWORD_LENGTH
        )));
    }

    Ok(())
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

/// Verify a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert_ne!(hash, "s3cret-pass");
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong-pass", &hash));
    }

    #[test]
    fn test_malformed_hash_does_not_match() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_password_policy() {
        assert!(check_password_policy("abcdef").is_ok());
        assert!(check_password_policy("abcde").is_err());
        assert!(check_password_policy("      ").is_err());
        assert!(check_password_policy(&"x".repeat(73)).is_err());
    }
}
