//! `coffre-crypto-core` — the cryptographic spine of the coffre vault.
//!
//! Everything the vault trusts with key material lives here: the MEK
//! envelope and its two unlock branches, Argon2id derivation, BIP-39
//! recovery phrases, the OS keyring bridge, AES-256-GCM sealing, and the
//! secret-memory wrappers. No UI, no storage, no async — this crate is the
//! audit target.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod aead;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod keyring;
pub mod memory;
pub mod password;
pub mod phrase;

pub use aead::{open, seal, KEY_LEN, MIN_BLOB_LEN, NONCE_LEN, TAG_LEN};
pub use envelope::{
    create_bundle, create_bundle_with_config, open_with_password, open_with_phrase,
    rotate_password, MekBundle, PasswordUnlock, MEK_LEN,
};
pub use error::CryptoError;
pub use kdf::{
    derive_key, derive_key_with_config, derive_key_with_keyring, derive_key_with_keyring_config,
    generate_salt, KdfConfig, KdfParams, DERIVED_KEY_LEN, SALT_LEN,
};
pub use keyring::{
    create_secret, fingerprint, get_or_create_secret, get_secret, provider_fingerprint,
    KeyringProvider, MemoryKeyring, OsKeyring, KEYRING_ACCOUNT, KEYRING_SECRET_LEN,
    KEYRING_SERVICE,
};
pub use memory::{
    disable_core_dumps, random_array, random_bytes, LockedRegion, SecretBuffer, SecretBytes,
};
pub use password::{generate_password, score_strength, GeneratorOptions, PasswordStrength};
pub use phrase::{
    generate_phrase, normalize_phrase, phrase_to_key, phrase_words, validate_phrase, word_list,
    PHRASE_WORD_COUNT,
};
