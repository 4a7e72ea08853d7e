//! Password hashing and verification with bcrypt.
//!
//! Both operations are CPU-bound. Async callers run them through
//! `tokio::task::spawn_blocking`.

use crate::error::AuthError;

/// bcrypt only reads this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash with a fresh random salt embedded in the output.
    ///
    /// Inputs longer than [`MAX_PASSWORD_BYTES`] are rejected instead of being
    /// silently truncated.
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::Hashing(format!(
                "password length exceeds {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        bcrypt::hash(plaintext, self.cost).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// A malformed or stale hash reads as a wrong password, never as an error.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return false;
        }
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_password_hashing() {
        let hasher = PasswordHasher::new(TEST_COST);
        let hash = hasher.hash("secret123").unwrap();

        assert!(!hash.is_empty());
        assert_ne!(hash, "secret123");
        assert!(hasher.verify("secret123", &hash));
        assert!(!hasher.verify("secret124", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = PasswordHasher::new(TEST_COST);
        let first = hasher.hash("secret123").unwrap();
        let second = hasher.hash("secret123").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("secret123", &first));
        assert!(hasher.verify("secret123", &second));
    }

    #[test]
    fn test_overlong_password_is_rejected() {
        let hasher = PasswordHasher::new(TEST_COST);

        let at_limit = "a".repeat(MAX_PASSWORD_BYTES);
        assert!(hasher.hash(&at_limit).is_ok());

        let too_long = "a".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(hasher.hash(&too_long), Err(AuthError::Hashing(_))));
    }

    #[test]
    fn test_malformed_hash_reads_as_mismatch() {
        let hasher = PasswordHasher::new(TEST_COST);

        assert!(!hasher.verify("secret123", ""));
        assert!(!hasher.verify("secret123", "not-a-bcrypt-hash"));
        assert!(!hasher.verify("secret123", "$2b$04$truncated"));
    }
}
