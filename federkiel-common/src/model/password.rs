use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing password failed: {0}")]
pub struct PasswordHashError(argon2::password_hash::Error);

/// An argon2 hash of an account password in PHC string format.
///
/// The plaintext never leaves the call sites of [`HashedPassword::hash`] and
/// [`HashedPassword::verify`]; the hash itself is redacted from `Debug`
/// output.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Hashes with a freshly generated salt, so hashing the same plaintext
    /// twice yields different strings.
    pub fn hash(plaintext: &str) -> Result<Self, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(PasswordHashError)?;

        Ok(Self(hash.to_string()))
    }

    /// A stored hash that fails to parse counts as a mismatch, never a fault.
    #[must_use]
    pub fn verify(&self, plaintext: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.0) else {
            return false;
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    #[must_use]
    pub fn from_stored(phc_string: String) -> Self {
        Self(phc_string)
    }

    /// For persistence only.
    #[must_use]
    pub fn as_phc_str(&self) -> &str {
        &self.0
    }
}

impl Debug for HashedPassword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HashedPassword").field(&"[redacted]").finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::password::HashedPassword;

    #[test]
    fn hash_differs_from_plaintext_and_verifies() {
        let hashed = HashedPassword::hash("secret1").unwrap();

        assert_ne!(hashed.as_phc_str(), "secret1");
        assert!(hashed.verify("secret1"));
        assert!(!hashed.verify("secret2"));
        assert!(!hashed.verify(""));
    }

    #[test]
    fn same_plaintext_hashes_differently() {
        let first = HashedPassword::hash("secret1").unwrap();
        let second = HashedPassword::hash("secret1").unwrap();

        assert_ne!(first, second);
        assert!(first.verify("secret1"));
        assert!(second.verify("secret1"));
    }

    #[test]
    fn malformed_stored_hash_never_matches() {
        let malformed = HashedPassword::from_stored("not-a-phc-string".to_owned());

        assert!(!malformed.verify("secret1"));
        assert!(!malformed.verify("not-a-phc-string"));
    }

    #[test]
    fn debug_output_is_redacted() {
        let hashed = HashedPassword::hash("secret1").unwrap();
        assert_eq!(format!("{hashed:?}"), "HashedPassword(\"[redacted]\")");
    }
}
