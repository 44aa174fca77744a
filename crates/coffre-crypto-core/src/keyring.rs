//! OS credential store bridge.
//!
//! The vault keeps a 32-byte secret in the platform keyring and mixes it
//! into the password-derived key, so a copied vault file cannot be opened
//! by password alone on another machine. Access goes through the
//! [`KeyringProvider`] capability, passed into each operation: tests and
//! headless environments substitute [`MemoryKeyring`], production code
//! passes [`OsKeyring`]. There is no process-global provider.
//!
//! Stored values are standard padded base64 of the 32 raw bytes.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::memory::{self, SecretBytes};

/// Service name for vault keyring entries.
pub const KEYRING_SERVICE: &str = "coffre";

/// Account name for vault keyring entries.
pub const KEYRING_ACCOUNT: &str = "vault-secret";

/// Length of the keyring secret in bytes.
pub const KEYRING_SECRET_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Provider capability
// ---------------------------------------------------------------------------

/// Minimal credential-store capability.
///
/// Implementations map their backend's "no such entry" condition to
/// [`CryptoError::SecretNotFound`] and every other failure to
/// [`CryptoError::KeyringUnavailable`].
pub trait KeyringProvider: Send + Sync {
    /// Fetch the stored value for `service`/`account`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::SecretNotFound`] when no entry exists,
    /// [`CryptoError::KeyringUnavailable`] when the store cannot be reached.
    fn get(&self, service: &str, account: &str) -> Result<String, CryptoError>;

    /// Store `value` under `service`/`account`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KeyringUnavailable`] when the store cannot be reached.
    fn set(&self, service: &str, account: &str, value: &str) -> Result<(), CryptoError>;

    /// Remove the entry under `service`/`account`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::SecretNotFound`] when no entry exists,
    /// [`CryptoError::KeyringUnavailable`] when the store cannot be reached.
    fn delete(&self, service: &str, account: &str) -> Result<(), CryptoError>;
}

/// Provider backed by the real OS credential store
/// (Keychain / Credential Manager / Secret Service).
#[derive(Clone, Copy, Debug, Default)]
pub struct OsKeyring;

impl OsKeyring {
    fn entry(service: &str, account: &str) -> Result<keyring::Entry, CryptoError> {
        keyring::Entry::new(service, account)
            .map_err(|e| CryptoError::KeyringUnavailable(e.to_string()))
    }
}

impl KeyringProvider for OsKeyring {
    fn get(&self, service: &str, account: &str) -> Result<String, CryptoError> {
        match Self::entry(service, account)?.get_password() {
            Ok(value) => Ok(value),
            Err(keyring::Error::NoEntry) => Err(CryptoError::SecretNotFound),
            Err(e) => Err(CryptoError::KeyringUnavailable(e.to_string())),
        }
    }

    fn set(&self, service: &str, account: &str, value: &str) -> Result<(), CryptoError> {
        Self::entry(service, account)?
            .set_password(value)
            .map_err(|e| CryptoError::KeyringUnavailable(e.to_string()))
    }

    fn delete(&self, service: &str, account: &str) -> Result<(), CryptoError> {
        match Self::entry(service, account)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Err(CryptoError::SecretNotFound),
            Err(e) => Err(CryptoError::KeyringUnavailable(e.to_string())),
        }
    }
}

/// In-memory provider for tests and keyring-less environments.
#[derive(Debug, Default)]
pub struct MemoryKeyring {
    entries: Mutex<HashMap<(String, String), String>>,
    unavailable: bool,
}

impl MemoryKeyring {
    /// An empty, working in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every call, for unavailable-keyring paths.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            unavailable: true,
        }
    }

    fn check_available(&self) -> Result<(), CryptoError> {
        if self.unavailable {
            return Err(CryptoError::KeyringUnavailable(
                "simulated keyring outage".into(),
            ));
        }
        Ok(())
    }
}

impl KeyringProvider for MemoryKeyring {
    fn get(&self, service: &str, account: &str) -> Result<String, CryptoError> {
        self.check_available()?;
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&(service.to_owned(), account.to_owned()))
            .cloned()
            .ok_or(CryptoError::SecretNotFound)
    }

    fn set(&self, service: &str, account: &str, value: &str) -> Result<(), CryptoError> {
        self.check_available()?;
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert((service.to_owned(), account.to_owned()), value.to_owned());
        Ok(())
    }

    fn delete(&self, service: &str, account: &str) -> Result<(), CryptoError> {
        self.check_available()?;
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries
            .remove(&(service.to_owned(), account.to_owned()))
            .map(|_| ())
            .ok_or(CryptoError::SecretNotFound)
    }
}

// ---------------------------------------------------------------------------
// Secret lifecycle
// ---------------------------------------------------------------------------

/// Fetch and decode the vault secret.
///
/// # Errors
///
/// [`CryptoError::SecretNotFound`] when no entry exists;
/// [`CryptoError::KeyringUnavailable`] when the store cannot be reached or
/// the stored value is not valid base64 of exactly 32 bytes — a malformed
/// store is unusable, which is distinct from absent.
pub fn get_secret(
    provider: &dyn KeyringProvider,
) -> Result<SecretBytes<KEYRING_SECRET_LEN>, CryptoError> {
    let encoded = provider.get(KEYRING_SERVICE, KEYRING_ACCOUNT)?;
    let mut decoded = BASE64
        .decode(&encoded)
        .map_err(|e| CryptoError::KeyringUnavailable(format!("stored secret is not base64: {e}")))?;

    if decoded.len() != KEYRING_SECRET_LEN {
        let actual = decoded.len();
        decoded.zeroize();
        return Err(CryptoError::KeyringUnavailable(format!(
            "stored secret has {actual} bytes (expected {KEYRING_SECRET_LEN})"
        )));
    }

    let mut raw = [0u8; KEYRING_SECRET_LEN];
    raw.copy_from_slice(&decoded);
    decoded.zeroize();

    let secret = SecretBytes::new(raw);
    raw.zeroize();
    Ok(secret)
}

/// Generate a fresh 32-byte secret and store it, replacing any previous one.
///
/// # Errors
///
/// [`CryptoError::EntropySource`] if the CSPRNG fails,
/// [`CryptoError::KeyringUnavailable`] if the store rejects the write.
pub fn create_secret(
    provider: &dyn KeyringProvider,
) -> Result<SecretBytes<KEYRING_SECRET_LEN>, CryptoError> {
    let mut raw = memory::random_array::<KEYRING_SECRET_LEN>()?;
    let mut encoded = BASE64.encode(raw);

    let stored = provider.set(KEYRING_SERVICE, KEYRING_ACCOUNT, &encoded);
    encoded.zeroize();

    match stored {
        Ok(()) => {
            let secret = SecretBytes::new(raw);
            raw.zeroize();
            Ok(secret)
        }
        Err(e) => {
            raw.zeroize();
            Err(e)
        }
    }
}

/// Fetch the vault secret, creating one if none exists yet.
///
/// # Errors
///
/// Propagates [`get_secret`] / [`create_secret`] failures; absence alone is
/// handled here and never surfaced.
pub fn get_or_create_secret(
    provider: &dyn KeyringProvider,
) -> Result<SecretBytes<KEYRING_SECRET_LEN>, CryptoError> {
    match get_secret(provider) {
        Ok(secret) => Ok(secret),
        Err(CryptoError::SecretNotFound) => create_secret(provider),
        Err(e) => Err(e),
    }
}

/// Lowercase-hex SHA-256 fingerprint of a secret, for display and
/// identification only.
#[must_use]
pub fn fingerprint(secret: &[u8]) -> String {
    hex::encode(ring::digest::digest(&ring::digest::SHA256, secret).as_ref())
}

/// Fingerprint of the currently stored secret; empty when none is readable.
#[must_use]
pub fn provider_fingerprint(provider: &dyn KeyringProvider) -> String {
    get_secret(provider)
        .map(|secret| fingerprint(secret.expose()))
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
