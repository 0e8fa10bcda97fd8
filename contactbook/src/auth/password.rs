//! Password hashing and verification.
//!
//! Credentials are stored as `sha256:<iterations>:<base64 salt>:<base64 digest>`, where the
//! digest is PBKDF2-HMAC-SHA256 over the password. The iteration count travels with each record,
//! so raising [`DEFAULT_ITERATIONS`] never invalidates existing hashes.

use std::fmt;
use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::Hmac;
use rand::prelude::RngExt;
use rand::rng;
use sha2::Sha256;
use thiserror::Error;

/// Algorithm tag, the first field of every stored credential.
pub const ALGORITHM: &str = "sha256";

/// Iteration count used when the caller does not pick one.
pub const DEFAULT_ITERATIONS: u32 = 1000;

/// Length of freshly generated salts, in bytes.
pub const SALT_LEN: usize = 16;

/// Length of a PBKDF2-HMAC-SHA256 digest, in bytes.
pub const DIGEST_LEN: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Iteration count must be strictly positive
    #[error("number of iterations must be greater than 0")]
    InvalidIterations,

    /// Stored credential does not match `sha256:<iterations>:<salt>:<digest>`
    #[error("hash string is not in the correct format: {reason}")]
    MalformedHash { reason: String },

    /// The key derivation primitive itself failed
    #[error("password hashing failed: {0}")]
    Crypto(String),
}

/// A decoded credential record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashInfo {
    pub digest: Vec<u8>,
    pub salt: Vec<u8>,
    pub iterations: u32,
}

impl fmt::Display for HashInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ALGORITHM}:{}:{}:{}",
            self.iterations,
            STANDARD.encode(&self.salt),
            STANDARD.encode(&self.digest)
        )
    }
}

impl FromStr for HashInfo {
    type Err = PasswordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hash(s)
    }
}

/// Derive a digest for `password`.
///
/// A fresh random salt of [`SALT_LEN`] bytes is drawn when `salt` is `None`.
pub fn generate_hash(password: &str, iterations: u32, salt: Option<&[u8]>) -> Result<HashInfo, PasswordError> {
    if iterations == 0 {
        return Err(PasswordError::InvalidIterations);
    }

    let salt = match salt {
        Some(salt) => salt.to_vec(),
        None => {
            let mut salt = [0u8; SALT_LEN];
            rng().fill(&mut salt);
            salt.to_vec()
        }
    };

    let mut digest = [0u8; DIGEST_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), &salt, iterations, &mut digest).map_err(|e| {
        tracing::error!("An error occurred while hashing the password: {e}");
        PasswordError::Crypto(e.to_string())
    })?;

    Ok(HashInfo {
        digest: digest.to_vec(),
        salt,
        iterations,
    })
}

/// Hash a password with [`DEFAULT_ITERATIONS`].
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_iterations(password, DEFAULT_ITERATIONS)
}

/// Hash a password with a fresh salt, returning the storage string.
pub fn hash_password_with_iterations(password: &str, iterations: u32) -> Result<String, PasswordError> {
    Ok(generate_hash(password, iterations, None)?.to_string())
}

/// Decode a storage string back into its parts.
///
/// Anything other than exactly four `:`-separated fields, tagged `sha256`, with a positive
/// decimal iteration count and non-empty standard base64 salt and digest, is rejected.
pub fn parse_hash(hash_string: &str) -> Result<HashInfo, PasswordError> {
    parse_fields(hash_string).inspect_err(|e| {
        tracing::error!("An error occurred while parsing the hash: {e}");
    })
}

fn parse_fields(hash_string: &str) -> Result<HashInfo, PasswordError> {
    let fields: Vec<&str> = hash_string.split(':').collect();
    let [tag, iterations, salt, digest] = fields.as_slice() else {
        return Err(malformed(format!("expected 4 fields, found {}", fields.len())));
    };

    if *tag != ALGORITHM {
        return Err(malformed(format!("unsupported algorithm tag '{tag}'")));
    }

    let iterations: u32 = iterations
        .parse()
        .map_err(|_| malformed(format!("iteration count '{iterations}' is not a positive integer")))?;
    if iterations == 0 {
        return Err(malformed("iteration count must be greater than 0".to_string()));
    }

    Ok(HashInfo {
        digest: decode_field("digest", digest)?,
        salt: decode_field("salt", salt)?,
        iterations,
    })
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, PasswordError> {
    if value.is_empty() {
        return Err(malformed(format!("{name} is empty")));
    }
    STANDARD
        .decode(value)
        .map_err(|e| malformed(format!("{name} is not valid base64: {e}")))
}

fn malformed(reason: String) -> PasswordError {
    PasswordError::MalformedHash { reason }
}

/// A well-formed credential that no password verifies against, for spending the same work on
/// logins with an unknown email as on ones with a wrong password.
pub fn placeholder_hash(iterations: u32) -> String {
    HashInfo {
        digest: vec![0; DIGEST_LEN],
        salt: vec![0; SALT_LEN],
        iterations: iterations.max(1),
    }
    .to_string()
}

/// Check `password` against a stored credential.
///
/// The digest is recomputed with the salt and iteration count recorded in `hash_string`, not the
/// current defaults.
pub fn verify_password(password: &str, hash_string: &str) -> Result<bool, PasswordError> {
    let stored = parse_hash(hash_string)?;
    let attempt = generate_hash(password, stored.iterations, Some(&stored.salt))?;

    Ok(constant_time_eq(&stored.digest, &attempt.digest))
}

/// Compare two byte slices without short-circuiting on the first difference.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_password_round_trip() {
        for password in ["hunter2", "", "correct horse battery staple", "pässwörd✓"] {
            let hash = hash_password(password).unwrap();
            assert!(verify_password(password, &hash).unwrap(), "failed for {password:?}");
        }
    }

    #[test]
    fn test_wrong_password_does_not_verify() {
        let hash = hash_password("password1").unwrap();

        assert!(!verify_password("password2", &hash).unwrap());
        assert!(!verify_password("Password1", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_stored_format() {
        let hash = hash_password_with_iterations("hunter2", 1234).unwrap();
        let format = Regex::new(r"^sha256:\d+:[A-Za-z0-9+/=]+:[A-Za-z0-9+/=]+$").unwrap();
        assert!(format.is_match(&hash), "unexpected format: {hash}");

        let info = parse_hash(&hash).unwrap();
        assert_eq!(info.iterations, 1234);
        assert_eq!(info.salt.len(), SALT_LEN);
        assert_eq!(info.digest.len(), DIGEST_LEN);
        assert_eq!(info.to_string(), hash);
    }

    #[test]
    fn test_iteration_count_changes_digest() {
        let salt = [7u8; SALT_LEN];
        let low = generate_hash("same_password", 1000, Some(&salt)).unwrap();
        let high = generate_hash("same_password", 1001, Some(&salt)).unwrap();
        assert_ne!(low.digest, high.digest);

        let low_hash = hash_password_with_iterations("same_password", 1000).unwrap();
        let high_hash = hash_password_with_iterations("same_password", 2000).unwrap();
        assert!(verify_password("same_password", &low_hash).unwrap());
        assert!(verify_password("same_password", &high_hash).unwrap());
    }

    #[test]
    fn test_same_input_different_hashes() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        // Fresh salts
        assert_ne!(hash1, hash2);
        assert!(verify_password("same_password", &hash1).unwrap());
        assert!(verify_password("same_password", &hash2).unwrap());
    }

    #[test]
    fn test_explicit_salt_is_deterministic() {
        let a = generate_hash("pw", 10, Some(b"fixed-salt")).unwrap();
        let b = generate_hash("pw", 10, Some(b"fixed-salt")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.salt, b"fixed-salt".to_vec());
    }

    #[test]
    fn test_known_pbkdf2_vector() {
        // RFC 7914 section 11, PBKDF2-HMAC-SHA256 with P="passwd", S="salt", c=1
        let info = generate_hash("passwd", 1, Some(b"salt")).unwrap();
        assert_eq!(
            info.digest[..16],
            [
                0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f, 0xec, 0x16, 0x91, 0xc2, 0x25, 0x44, 0xb6, 0x05
            ]
        );
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert_eq!(generate_hash("pw", 0, None), Err(PasswordError::InvalidIterations));
        assert_eq!(
            hash_password_with_iterations("pw", 0),
            Err(PasswordError::InvalidIterations)
        );
    }

    #[test]
    fn test_parse_rejects_malformed_strings() {
        let malformed = [
            "",
            "sha256",
            "sha256:1000:Zm9v",
            "sha256:1000:Zm9v:YmFy:extra",
            "md5:1000:abc:def",
            "SHA256:1000:Zm9v:YmFy",
            "sha256:abc:Zm9v:YmFy",
            "sha256:-5:Zm9v:YmFy",
            "sha256:1.5:Zm9v:YmFy",
            "sha256:0:Zm9v:YmFy",
            "sha256:1000:not base64!:YmFy",
            "sha256:1000:Zm9v:Y",
            "sha256:1000::YmFy",
            "sha256:1000:Zm9v:",
        ];

        for hash in malformed {
            assert!(
                matches!(parse_hash(hash), Err(PasswordError::MalformedHash { .. })),
                "expected {hash:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_parse_accepts_foreign_well_formed_record() {
        let info: HashInfo = "sha256:1000:Zm9v:YmFy".parse().unwrap();
        assert_eq!(info.iterations, 1000);
        assert_eq!(info.salt, b"foo".to_vec());
        assert_eq!(info.digest, b"bar".to_vec());
    }

    #[test]
    fn test_verify_malformed_hash_is_error_not_false() {
        let result = verify_password("hunter2", "md5:1000:abc:def");
        assert!(matches!(result, Err(PasswordError::MalformedHash { .. })));
    }

    #[test]
    fn test_truncated_digest_never_verifies() {
        let hash = hash_password("hunter2").unwrap();
        let mut info = parse_hash(&hash).unwrap();
        info.digest.truncate(16);

        assert!(!verify_password("hunter2", &info.to_string()).unwrap());
    }

    #[test]
    fn test_constant_time_eq() {
        let digest = generate_hash("hunter2", 10, Some(&[7; SALT_LEN])).unwrap().digest;
        assert!(constant_time_eq(&digest, &digest.clone()));

        let mut last_byte_differs = digest.clone();
        last_byte_differs[DIGEST_LEN - 1] ^= 1;
        assert!(!constant_time_eq(&digest, &last_byte_differs));

        let mut first_byte_differs = digest.clone();
        first_byte_differs[0] ^= 0x80;
        assert!(!constant_time_eq(&digest, &first_byte_differs));

        assert!(!constant_time_eq(&digest, &digest[..16]));
        assert!(!constant_time_eq(&digest, &[]));
    }

    #[test]
    fn test_placeholder_hash_parses_and_never_verifies() {
        let placeholder = placeholder_hash(2500);
        let info = parse_hash(&placeholder).unwrap();
        assert_eq!(info.iterations, 2500);
        assert_eq!(info.digest.len(), DIGEST_LEN);
        assert_eq!(info.salt.len(), SALT_LEN);

        for password in ["", "hunter2", "password"] {
            assert!(!verify_password(password, &placeholder).unwrap());
        }

        assert_eq!(parse_hash(&placeholder_hash(0)).unwrap().iterations, 1);
    }
}
