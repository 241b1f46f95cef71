use sha2::{Digest, Sha256};
use thiserror::Error;

/// Default bcrypt work factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("Failed to hash password: {0}")]
    Hash(String),
    #[error("Failed to verify password: {0}")]
    Verify(String),
}

/// One-way password digest.
///
/// `Sha256` is the legacy scheme: an unsalted hex SHA-256, deterministic for a
/// given password. Stored digests created by earlier deployments use it, so it
/// stays the default; it is a fast general-purpose hash and leaks equal
/// passwords as equal digests. `Bcrypt` is salted and slow and should be used
/// for production deployments without legacy digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hasher {
    Sha256,
    Bcrypt { cost: u32 },
}

impl Default for Hasher {
    fn default() -> Self {
        Hasher::Sha256
    }
}

impl Hasher {
    pub fn name(&self) -> &'static str {
        match self {
            Hasher::Sha256 => "sha256",
            Hasher::Bcrypt { .. } => "bcrypt",
        }
    }

    /// Whether equal passwords always yield equal digests.
    pub fn is_salted(&self) -> bool {
        matches!(self, Hasher::Bcrypt { .. })
    }

    pub fn digest(&self, password: &str) -> Result<String, HashError> {
        match self {
            Hasher::Sha256 => Ok(sha256_hex(password)),
            Hasher::Bcrypt { cost } => {
                bcrypt::hash(password, *cost).map_err(|e| HashError::Hash(e.to_string()))
            }
        }
    }

    /// Checks `password` against a stored digest produced by the same scheme.
    pub fn verify(&self, password: &str, digest: &str) -> Result<bool, HashError> {
        match self {
            Hasher::Sha256 => Ok(constant_time_eq(
                sha256_hex(password).as_bytes(),
                digest.as_bytes(),
            )),
            Hasher::Bcrypt { .. } => {
                bcrypt::verify(password, digest).map_err(|e| HashError::Verify(e.to_string()))
            }
        }
    }
}

fn sha256_hex(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the bcrypt tests fast.
    const TEST_BCRYPT: Hasher = Hasher::Bcrypt { cost: 4 };

    #[test]
    fn test_sha256_digest_is_deterministic() {
        let hasher = Hasher::Sha256;
        let first = hasher.digest("test_password123").unwrap();
        let second = hasher.digest("test_password123").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        // sha256("password")
        assert_eq!(
            hasher.digest("password").unwrap(),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn test_password_hashing_and_verification() {
        for hasher in [Hasher::Sha256, TEST_BCRYPT] {
            let digest = hasher.digest("test_password123").unwrap();
            assert!(hasher.verify("test_password123", &digest).unwrap());
            assert!(!hasher.verify("wrong_password", &digest).unwrap());
        }
    }

    #[test]
    fn test_bcrypt_digest_is_salted() {
        let first = TEST_BCRYPT.digest("same").unwrap();
        let second = TEST_BCRYPT.digest("same").unwrap();
        assert_ne!(first, second);
        assert!(TEST_BCRYPT.is_salted());
        assert!(!Hasher::Sha256.is_salted());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"digest", b"digest"));
        assert!(!constant_time_eq(b"digest", b"digesT"));
        assert!(!constant_time_eq(b"short", b"longer"));

        let digest = Hasher::Sha256.digest("password").unwrap();
        assert!(!Hasher::Sha256.verify("password", &digest[..63]).unwrap());
        assert!(!Hasher::Sha256.verify("password", &digest.to_uppercase()).unwrap());
    }

    #[test]
    fn test_verify_with_invalid_hash() {
        assert!(!Hasher::Sha256.verify("pw", "invalidhashformat").unwrap());
        match TEST_BCRYPT.verify("pw", "invalidhashformat") {
            Err(HashError::Verify(_)) | Ok(false) => {}
            other => panic!("unexpected result for malformed bcrypt hash: {:?}", other),
        }
    }
}
