//! BIP-39 recovery phrases and the deterministic phrase→key path.
//!
//! A vault's recovery phrase is a 12-word English mnemonic (128 bits of
//! entropy plus the 4-bit checksum), shown once at creation and never
//! stored. [`phrase_to_key`] turns it into the 32-byte wrapping key for the
//! recovery branch: normalize, checksum-validate, expand to the standard
//! BIP-39 seed (PBKDF2-HMAC-SHA512, 2048 iterations, empty passphrase),
//! then hash the seed with SHA-256.
//!
//! Input is case-insensitive and whitespace-tolerant; normalization never
//! reorders words, so any such variant of a phrase derives the same key.

use bip39::{Language, Mnemonic};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::memory::{self, SecretBytes};

/// Words in a recovery phrase.
pub const PHRASE_WORD_COUNT: usize = 12;

/// Entropy behind a 12-word mnemonic, in bytes (128 bits).
pub const PHRASE_ENTROPY_LEN: usize = 16;

/// Length of the key derived from a phrase, in bytes.
pub const PHRASE_KEY_LEN: usize = 32;

/// Generate a fresh 12-word recovery phrase.
///
/// Words are lowercase, drawn from the standard 2048-word English list,
/// and joined by single ASCII spaces.
///
/// # Errors
///
/// Returns [`CryptoError::EntropySource`] if the CSPRNG fails or the
/// entropy cannot be encoded as a mnemonic.
pub fn generate_phrase() -> Result<String, CryptoError> {
    let mut entropy = memory::random_array::<PHRASE_ENTROPY_LEN>()?;
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| CryptoError::EntropySource(format!("mnemonic encoding failed: {e}")));
    entropy.zeroize();
    Ok(mnemonic?.to_string())
}

/// Normalize a phrase: lowercase, trim, collapse whitespace runs to single
/// spaces. Idempotent; word order is preserved.
#[must_use]
pub fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Returns `true` if the phrase is a checksum-valid BIP-39 mnemonic after
/// normalization.
#[must_use]
pub fn validate_phrase(phrase: &str) -> bool {
    parse(phrase).is_ok()
}

/// Derive the 32-byte recovery-branch key from a phrase.
///
/// Deterministic across case and whitespace variants of the same words.
/// The intermediate 64-byte seed is zeroized before return.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidMnemonic`] if the normalized phrase fails
/// BIP-39 validation.
pub fn phrase_to_key(phrase: &str) -> Result<SecretBytes<PHRASE_KEY_LEN>, CryptoError> {
    let mnemonic = parse(phrase)?;

    let mut seed = mnemonic.to_seed("");
    let digest = ring::digest::digest(&ring::digest::SHA256, &seed);
    seed.zeroize();

    let mut key = [0u8; PHRASE_KEY_LEN];
    key.copy_from_slice(digest.as_ref());
    let secret = SecretBytes::new(key);
    key.zeroize();
    Ok(secret)
}

/// The 2048-word English BIP-39 list, for word-by-word entry UIs.
#[must_use]
pub fn word_list() -> &'static [&'static str] {
    Language::English.word_list()
}

/// Split a phrase into its normalized words.
#[must_use]
pub fn phrase_words(phrase: &str) -> Vec<String> {
    let normalized = normalize_phrase(phrase);
    if normalized.is_empty() {
        return Vec::new();
    }
    normalized.split(' ').map(str::to_owned).collect()
}

fn parse(phrase: &str) -> Result<Mnemonic, CryptoError> {
    let normalized = normalize_phrase(phrase);
    Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|_| CryptoError::InvalidMnemonic)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
