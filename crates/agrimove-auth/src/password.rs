use std::num::NonZeroU32;

use agrimove_core::{Error, Result};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use ring::digest::SHA256_OUTPUT_LEN;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const DUMMY_PASSWORD: &str = "agrimove-dummy-password";
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Salted PBKDF2-HMAC-SHA256 password hashing.
///
/// Material is encoded as `$pbkdf2-sha256$i=<iterations>$<salt>$<hash>`
/// so that the iteration count travels with each stored hash.
pub struct PasswordHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
    dummy: String,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Result<Self> {
        let iterations = NonZeroU32::new(iterations)
            .ok_or_else(|| Error::Config("pbkdf2 iterations must be positive".into()))?;
        let rng = SystemRandom::new();
        let dummy = encode(iterations, &rng, DUMMY_PASSWORD)?;
        Ok(Self {
            iterations,
            rng,
            dummy,
        })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        encode(self.iterations, &self.rng, password)
    }

    pub fn verify(&self, password: &str, material: &str) -> bool {
        let Some(parsed) = ParsedHash::parse(material) else {
            return false;
        };
        let mut derived = [0u8; SHA256_OUTPUT_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            parsed.iterations,
            &parsed.salt,
            password.as_bytes(),
            &mut derived,
        );
        derived.as_slice().ct_eq(parsed.hash.as_slice()).into()
    }

    /// Burns the same work as a real verification. Used when the user does
    /// not exist so both login failure paths take comparable time.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(password, &self.dummy);
    }
}

fn encode(iterations: NonZeroU32, rng: &SystemRandom, password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| Error::Internal("rng failed".into()))?;
    let mut derived = [0u8; SHA256_OUTPUT_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &mut derived,
    );
    Ok(format!(
        "${}$i={}${}${}",
        SCHEME,
        iterations,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(derived)
    ))
}

struct ParsedHash {
    iterations: NonZeroU32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl ParsedHash {
    fn parse(material: &str) -> Option<Self> {
        let mut parts = material.split('$');
        if !parts.next()?.is_empty() || parts.next()? != SCHEME {
            return None;
        }
        let iterations = parts
            .next()?
            .strip_prefix("i=")?
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)?;
        let salt = STANDARD_NO_PAD.decode(parts.next()?).ok()?;
        let hash = STANDARD_NO_PAD.decode(parts.next()?).ok()?;
        if parts.next().is_some() || salt.is_empty() || hash.len() != SHA256_OUTPUT_LEN {
            return None;
        }
        Some(Self {
            iterations,
            salt,
            hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(1_000).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let material = hasher.hash("password").unwrap();
        assert!(material.starts_with("$pbkdf2-sha256$i=1000$"));
        assert!(!material.contains("password"));
        assert!(hasher.verify("password", &material));
        assert!(!hasher.verify("Password", &material));
        assert!(!hasher.verify("", &material));
    }

    #[test]
    fn test_salt_is_random() {
        let hasher = hasher();
        let first = hasher.hash("password").unwrap();
        let second = hasher.hash("password").unwrap();
        assert_ne!(first, second);
        assert!(hasher.verify("password", &first));
        assert!(hasher.verify("password", &second));
    }

    #[test]
    fn test_iterations_come_from_material() {
        let strong = PasswordHasher::new(2_000).unwrap();
        let material = strong.hash("wheat").unwrap();
        assert!(hasher().verify("wheat", &material));
    }

    #[test]
    fn test_garbage_material_never_verifies() {
        let hasher = hasher();
        for material in [
            "",
            "password",
            "$pbkdf2-sha256$i=0$c2FsdA$aGFzaA",
            "$bcrypt$i=1000$c2FsdA$aGFzaA",
            "$pbkdf2-sha256$i=1000$c2FsdA$aGFzaA",
            "$pbkdf2-sha256$i=1000$!!!$aGFzaA",
        ] {
            assert!(!hasher.verify("password", material), "{material}");
        }
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(matches!(PasswordHasher::new(0), Err(Error::Config(_))));
    }
}
