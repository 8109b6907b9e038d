use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum KdfError {
    #[error("invalid kdf parameters")]
    InvalidParams(argon2::Error),
    #[error("key derivation failed")]
    DerivationFailed(argon2::Error),
}

const MIB: u32 = 1024;
const MEMORY_COST_KIB: u32 = 19 * MIB;
const TIME_COST: u32 = 2;

/// Random bytes in a credential key (hex encoded to 40 characters).
pub const CREDENTIAL_KEY_BYTES: usize = 20;

/// Length of a password salt in bytes.
pub const SALT_LEN: usize = 16;

/// Opaque bearer key handed to a principal at login.
///
/// Not `Debug`, so a key never ends up in a log line:
///
/// ```compile_fail
/// fn assert_debug<T: std::fmt::Debug>() {}
/// assert_debug::<prontuario_crypto::CredentialKey>();
/// ```
#[derive(Clone)]
pub struct CredentialKey(Zeroizing<String>);

impl CredentialKey {
    pub fn from_string(key: String) -> Self {
        Self(Zeroizing::new(key))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Fingerprint under which the credential is persisted.
    pub fn fingerprint(&self) -> String {
        fingerprint(self.as_str())
    }
}

/// Generate a fresh credential key from the OS-seeded thread RNG.
pub fn generate_credential_key() -> CredentialKey {
    let bytes = Zeroizing::new(rand::random::<[u8; CREDENTIAL_KEY_BYTES]>());
    CredentialKey(Zeroizing::new(hex::encode(bytes.as_ref())))
}

/// Hex-encoded SHA-256 of a credential key.
pub fn fingerprint(key: &str) -> String {
    hex::encode(hash_sha256(key.as_bytes()))
}

pub fn hash_sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Generate a random password salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    rand::random()
}

/// Hash a password using Argon2id with a salt.
/// Returns hex-encoded 32-byte hash.
pub fn hash_password(password: &str, salt: &[u8]) -> Result<String, KdfError> {
    let params = argon2::Params::new(MEMORY_COST_KIB, TIME_COST, 1, Some(32))
        .map_err(KdfError::InvalidParams)?;

    let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut hash = Zeroizing::new([0u8; 32]);

    argon2
        .hash_password_into(password.as_bytes(), salt, hash.as_mut())
        .map_err(KdfError::DerivationFailed)?;

    Ok(hex::encode(hash.as_ref()))
}

/// Check a password against a stored hash. Comparison time does not depend on
/// where the hashes first differ.
pub fn verify_password(password: &str, salt: &[u8], expected_hex: &str) -> Result<bool, KdfError> {
    let actual = hash_password(password, salt)?;
    if actual.len() != expected_hex.len() {
        return Ok(false);
    }
    let diff = actual
        .bytes()
        .zip(expected_hex.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    Ok(diff == 0)
}
