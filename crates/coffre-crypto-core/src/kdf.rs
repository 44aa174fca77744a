//! Argon2id key derivation with the vault's fixed parameter profile.
//!
//! The profile is burned in: 5 iterations over 256 MiB with 4 lanes,
//! producing 32-byte keys. On desktop hardware an unlock derivation takes
//! roughly one to three seconds, which prices out GPU/ASIC guessing while
//! staying interactive. Run derivations off the UI thread.
//!
//! The persisted [`KdfConfig`] record carries the same values alongside
//! the key bundle so a future build can harden parameters without a
//! migration tool. Readers refuse records naming an algorithm they do not
//! recognize.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::error::CryptoError;
use crate::memory::{self, SecretBytes};

/// Argon2id iteration count (time cost).
pub const ARGON2_ITERATIONS: u32 = 5;

/// Argon2id memory cost in KiB (256 MiB).
pub const ARGON2_MEMORY_KIB: u32 = 262_144;

/// Argon2id degree of parallelism.
pub const ARGON2_PARALLELISM: u8 = 4;

/// Derived key length in bytes.
pub const DERIVED_KEY_LEN: usize = 32;

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// The only KDF algorithm this build writes or reads.
pub const KDF_ALGORITHM: &str = "argon2id";

// ---------------------------------------------------------------------------
// Parameter record
// ---------------------------------------------------------------------------

/// Argon2id cost parameters, as persisted next to the key bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory: u32,
    /// Iteration count (time cost).
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u8,
}

/// Algorithm name plus parameters, persisted so legacy vaults stay
/// decryptable after the defaults change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfConfig {
    /// Algorithm identifier; `"argon2id"` in every record this build writes.
    pub algorithm: String,
    /// Cost parameters for the named algorithm.
    pub params: KdfParams,
}

impl KdfConfig {
    /// The record written by the current build.
    #[must_use]
    pub fn current() -> Self {
        Self {
            algorithm: KDF_ALGORITHM.to_owned(),
            params: KdfParams {
                memory: ARGON2_MEMORY_KIB,
                iterations: ARGON2_ITERATIONS,
                parallelism: ARGON2_PARALLELISM,
            },
        }
    }

    /// Refuse records naming an algorithm this build does not implement.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedKdf`] with the offending name.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.algorithm != KDF_ALGORITHM {
            return Err(CryptoError::UnsupportedKdf(self.algorithm.clone()));
        }
        Ok(())
    }
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self::current()
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Generate a fresh 32-byte salt from the OS CSPRNG.
///
/// # Errors
///
/// Returns [`CryptoError::EntropySource`] if the CSPRNG fails.
pub fn generate_salt() -> Result<[u8; SALT_LEN], CryptoError> {
    memory::random_array::<SALT_LEN>()
}

/// Derive a 32-byte key from a password and salt with the fixed profile.
///
/// Deterministic: the same password and salt always produce the same key.
/// Any password length is accepted, including empty — strength policy
/// belongs to the caller.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivation`] if the parameters are rejected
/// or the derivation itself fails (e.g. memory allocation).
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
) -> Result<SecretBytes<DERIVED_KEY_LEN>, CryptoError> {
    derive_with_params(password, salt, &KdfConfig::current().params)
}

/// Derive a 32-byte key from `password || keyring_secret` and a salt.
///
/// The concatenated buffer is zeroized on every exit path. An empty
/// keyring secret makes the input collapse to the password alone, matching
/// [`derive_key`]; an empty password is likewise accepted.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivation`] as [`derive_key`] does.
pub fn derive_key_with_keyring(
    password: &[u8],
    salt: &[u8],
    keyring_secret: &[u8],
) -> Result<SecretBytes<DERIVED_KEY_LEN>, CryptoError> {
    let combined = combine(password, keyring_secret);
    derive_with_params(&combined, salt, &KdfConfig::current().params)
}

/// [`derive_key`] driven by a persisted [`KdfConfig`] record.
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedKdf`] for unknown algorithms, or
/// [`CryptoError::KeyDerivation`] for parameter/derivation failures.
pub fn derive_key_with_config(
    password: &[u8],
    salt: &[u8],
    config: &KdfConfig,
) -> Result<SecretBytes<DERIVED_KEY_LEN>, CryptoError> {
    config.validate()?;
    derive_with_params(password, salt, &config.params)
}

/// [`derive_key_with_keyring`] driven by a persisted [`KdfConfig`] record.
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedKdf`] for unknown algorithms, or
/// [`CryptoError::KeyDerivation`] for parameter/derivation failures.
pub fn derive_key_with_keyring_config(
    password: &[u8],
    salt: &[u8],
    keyring_secret: &[u8],
    config: &KdfConfig,
) -> Result<SecretBytes<DERIVED_KEY_LEN>, CryptoError> {
    config.validate()?;
    let combined = combine(password, keyring_secret);
    derive_with_params(&combined, salt, &config.params)
}

/// Concatenate password and keyring secret into a self-zeroizing buffer.
fn combine(password: &[u8], keyring_secret: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut combined = Zeroizing::new(Vec::with_capacity(
        password.len().saturating_add(keyring_secret.len()),
    ));
    combined.extend_from_slice(password);
    combined.extend_from_slice(keyring_secret);
    combined
}

fn derive_with_params(
    material: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<SecretBytes<DERIVED_KEY_LEN>, CryptoError> {
    let argon2_params = argon2::Params::new(
        params.memory,
        params.iterations,
        u32::from(params.parallelism),
        Some(DERIVED_KEY_LEN),
    )
    .map_err(|e| CryptoError::KeyDerivation(format!("invalid argon2 parameters: {e}")))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut output = [0u8; DERIVED_KEY_LEN];
    argon2
        .hash_password_into(material, salt, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(format!("argon2id derivation failed: {e}")))?;

    let key = SecretBytes::new(output);
    output.zeroize();
    Ok(key)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
