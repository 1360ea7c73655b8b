//! Password hashing and verification using Argon2id.
//!
//! Seed loading hashes plain passwords once; login flows only ever verify
//! through the [`PasswordVerifier`] trait.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::error::{AuthError, AuthResult};

/// Checks a submitted password against a stored hash.
///
/// Protocol flows hold this as `&dyn PasswordVerifier` so the hashing
/// scheme stays outside of them.
pub trait PasswordVerifier: Send + Sync {
    /// Verifies `password` against the stored `hash`.
    ///
    /// ## Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on mismatch and
    /// [`AuthError::MalformedHash`] if `hash` cannot be parsed.
    fn verify(&self, password: &str, hash: &str) -> AuthResult<()>;
}

/// Password hashing configuration.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
        }
    }
}

impl PasswordPolicy {
    /// Creates a new password policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cheap parameters for test fixtures.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            hash_length: 32,
        }
    }

    /// Sets the memory cost in KiB.
    #[must_use]
    pub const fn memory_cost(mut self, kib: u32) -> Self {
        self.memory_cost = kib;
        self
    }

    /// Sets the time cost (iterations).
    #[must_use]
    pub const fn time_cost(mut self, iterations: u32) -> Self {
        self.time_cost = iterations;
        self
    }

    fn build_params(&self) -> Result<Params, argon2::Error> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.hash_length as usize),
        )
    }
}

/// Argon2id hasher and verifier.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasherService {
    policy: PasswordPolicy,
}

impl PasswordHasherService {
    /// Creates a hasher with the given policy.
    #[must_use]
    pub const fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }

    /// Hashes a password into a PHC string.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy parameters are rejected by Argon2.
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let params = self
            .policy
            .build_params()
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

impl PasswordVerifier for PasswordHasherService {
    fn verify(&self, password: &str, hash: &str) -> AuthResult<()> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::MalformedHash(e.to_string()))?;

        // Parameters come from the PHC string, so any Argon2 variant verifies.
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasherService {
        PasswordHasherService::new(PasswordPolicy::for_testing())
    }

    #[test]
    fn hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("hunter2").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("hunter2", &hash).is_ok());
        assert!(matches!(
            hasher.verify("hunter3", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn salts_differ() {
        let hasher = hasher();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn garbage_hash_is_malformed() {
        assert!(matches!(
            hasher().verify("pw", "not-a-phc-string"),
            Err(AuthError::MalformedHash(_))
        ));
    }

    #[test]
    fn usable_as_trait_object() {
        let hasher = hasher();
        let hash = hasher.hash("pw").unwrap();
        let verifier: &dyn PasswordVerifier = &hasher;
        assert!(verifier.verify("pw", &hash).is_ok());
    }
}
