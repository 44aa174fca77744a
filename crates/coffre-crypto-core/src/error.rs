//! Error types for the coffre cryptographic core.

use thiserror::Error;

/// Errors produced by cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key material has the wrong length for the requested operation.
    /// Programmer error; surfaced unchanged.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Ciphertext blob is structurally malformed (shorter than nonce + tag).
    /// Points at disk corruption rather than a bad credential.
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Authenticated decryption failed. Carries no detail: wrong key,
    /// tampered ciphertext, and AAD mismatch are indistinguishable here.
    #[error("decryption failed: authentication error")]
    DecryptionFailed,

    /// Recovery phrase is not a checksum-valid BIP-39 mnemonic.
    #[error("invalid recovery phrase")]
    InvalidMnemonic,

    /// Unlock failed. The only credential error the envelope surfaces,
    /// whatever branch or failure mode was actually at fault.
    #[error("wrong password or recovery phrase")]
    WrongCredential,

    /// The OS credential store could not be reached, or its stored value
    /// is unusable.
    #[error("OS keyring not available: {0}")]
    KeyringUnavailable(String),

    /// No vault secret exists in the OS credential store.
    #[error("keyring secret not found")]
    SecretNotFound,

    /// The OS entropy source failed. Fatal; no partial output is returned.
    #[error("entropy source failure: {0}")]
    EntropySource(String),

    /// A persisted KDF record names an algorithm this build does not know.
    #[error("unsupported KDF algorithm: {0}")]
    UnsupportedKdf(String),

    /// Argon2id parameter validation or derivation failure.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Process-hardening failure (core-dump disabling).
    #[error("secure memory error: {0}")]
    SecureMemory(String),
}
