//! The MEK envelope: one random Master Encryption Key, wrapped twice.
//!
//! ```text
//! password ⊕ keyring secret ──Argon2id──► Kp ──wraps──► MEK
//! recovery phrase ──BIP-39 seed, SHA-256──► Kr ──wraps──► MEK (same key)
//! ```
//!
//! Either branch alone recovers the MEK. [`rotate_password`] replaces only
//! the password branch, so the phrase printed at vault creation keeps
//! working for the lifetime of the vault.
//!
//! Each branch seals under its own AAD tag; a ciphertext moved to the other
//! branch fails authentication. At this boundary every credential failure —
//! bad password, bad phrase, tampered wrap — surfaces as the single
//! [`CryptoError::WrongCredential`] so callers cannot probe which it was.
//! Structural corruption ([`CryptoError::InvalidCiphertext`]) and an
//! unrecognized KDF record ([`CryptoError::UnsupportedKdf`]) are different
//! problems and surface unchanged.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::aead;
use crate::error::CryptoError;
use crate::kdf::{self, KdfConfig};
use crate::keyring::{self, KeyringProvider};
use crate::memory::SecretBytes;
use crate::phrase;

/// Master Encryption Key length in bytes.
pub const MEK_LEN: usize = 32;

/// AAD tag binding a ciphertext to the password branch.
const AAD_MEK_PASSWORD: &[u8] = b"coffre-mek-password";

/// AAD tag binding a ciphertext to the phrase branch.
const AAD_MEK_PHRASE: &[u8] = b"coffre-mek-phrase";

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// The persisted key envelope: two salts and two wrapped copies of the MEK.
///
/// Storage treats every field as opaque. The wrapped fields are 60-byte
/// blobs (32-byte MEK plus the 28-byte nonce/tag overhead of the wire
/// format). Invariant: both wraps decrypt to the same MEK.
#[must_use = "losing the bundle makes the vault unrecoverable"]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MekBundle {
    /// KDF record for the password branch. Bundles persisted before the
    /// record existed deserialize to the current profile.
    #[serde(default)]
    pub kdf: KdfConfig,
    /// Salt for the password-branch derivation. Replaced on rotation.
    pub salt_password: Vec<u8>,
    /// Salt drawn at creation for the phrase branch. The phrase derivation
    /// is salt-free (fixed BIP-39 salt); the value is persisted for format
    /// stability and never regenerated.
    pub salt_phrase: Vec<u8>,
    /// MEK wrapped under the password-derived key.
    pub encrypted_mek_password: Vec<u8>,
    /// MEK wrapped under the phrase-derived key.
    pub encrypted_mek_phrase: Vec<u8>,
}

/// Result of a password unlock.
pub struct PasswordUnlock {
    /// The recovered Master Encryption Key.
    pub mek: SecretBytes<MEK_LEN>,
    /// True when the bundle predates keyring support and was opened with
    /// the password-only derivation. Reported so the product layer can
    /// observe the condition and decide an upgrade policy; the core never
    /// re-wraps on its own.
    pub legacy_fallback: bool,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Create a vault key envelope with the current KDF profile.
///
/// Returns the bundle to persist and the recovery phrase, which must be
/// shown to the user now — it is not stored anywhere.
///
/// # Errors
///
/// The keyring is required at creation: any [`CryptoError::KeyringUnavailable`]
/// aborts. [`CryptoError::EntropySource`] aborts without partial state.
pub fn create_bundle(
    password: &str,
    provider: &dyn KeyringProvider,
) -> Result<(MekBundle, String), CryptoError> {
    create_bundle_with_config(password, provider, KdfConfig::current())
}

/// [`create_bundle`] with an explicit KDF record, chosen at vault creation.
///
/// # Errors
///
/// As [`create_bundle`], plus [`CryptoError::UnsupportedKdf`] if the record
/// names an algorithm this build cannot run.
pub fn create_bundle_with_config(
    password: &str,
    provider: &dyn KeyringProvider,
    config: KdfConfig,
) -> Result<(MekBundle, String), CryptoError> {
    config.validate()?;

    let mek = SecretBytes::<MEK_LEN>::random()?;
    let recovery_phrase = phrase::generate_phrase()?;

    let salt_password = kdf::generate_salt()?;
    let salt_phrase = kdf::generate_salt()?;

    // New vaults always mix in the keyring secret; there is no
    // password-only wrap at creation time.
    let keyring_secret = keyring::get_or_create_secret(provider)?;

    let password_key = kdf::derive_key_with_keyring_config(
        password.as_bytes(),
        &salt_password,
        keyring_secret.expose(),
        &config,
    )?;
    let phrase_key = phrase::phrase_to_key(&recovery_phrase)?;

    let encrypted_mek_password = aead::seal(mek.expose(), password_key.expose(), AAD_MEK_PASSWORD)?;
    let encrypted_mek_phrase = aead::seal(mek.expose(), phrase_key.expose(), AAD_MEK_PHRASE)?;

    let bundle = MekBundle {
        kdf: config,
        salt_password: salt_password.to_vec(),
        salt_phrase: salt_phrase.to_vec(),
        encrypted_mek_password,
        encrypted_mek_phrase,
    };

    Ok((bundle, recovery_phrase))
}

// ---------------------------------------------------------------------------
// Unlock
// ---------------------------------------------------------------------------

/// Recover the MEK from the password branch.
///
/// When the keyring secret exists it is mixed into the derivation. When the
/// store reports the secret *absent*, the bundle is assumed to predate
/// keyring support and the password-only derivation is tried once — the
/// one permitted fallback, flagged on the result. A store that is present
/// but unreachable surfaces [`CryptoError::KeyringUnavailable`]; the core
/// never silently derives without an existing secret.
///
/// # Errors
///
/// [`CryptoError::WrongCredential`] for any authentication failure;
/// [`CryptoError::InvalidCiphertext`] for structural corruption;
/// [`CryptoError::UnsupportedKdf`] when the bundle's KDF record is unknown.
pub fn open_with_password(
    bundle: &MekBundle,
    password: &str,
    provider: &dyn KeyringProvider,
) -> Result<PasswordUnlock, CryptoError> {
    bundle.kdf.validate()?;

    let (key, legacy_fallback) = match keyring::get_secret(provider) {
        Ok(secret) => {
            let key = kdf::derive_key_with_keyring_config(
                password.as_bytes(),
                &bundle.salt_password,
                secret.expose(),
                &bundle.kdf,
            )?;
            (key, false)
        }
        Err(CryptoError::SecretNotFound) => {
            let key = kdf::derive_key_with_config(
                password.as_bytes(),
                &bundle.salt_password,
                &bundle.kdf,
            )?;
            (key, true)
        }
        Err(e) => return Err(e),
    };

    let mek = open_branch(&bundle.encrypted_mek_password, &key, AAD_MEK_PASSWORD)?;
    Ok(PasswordUnlock {
        mek,
        legacy_fallback,
    })
}

/// Recover the MEK from the recovery phrase.
///
/// # Errors
///
/// [`CryptoError::WrongCredential`] for an invalid mnemonic or any
/// authentication failure; [`CryptoError::InvalidCiphertext`] for
/// structural corruption.
pub fn open_with_phrase(
    bundle: &MekBundle,
    recovery_phrase: &str,
) -> Result<SecretBytes<MEK_LEN>, CryptoError> {
    let key = match phrase::phrase_to_key(recovery_phrase) {
        Ok(key) => key,
        Err(CryptoError::InvalidMnemonic) => return Err(CryptoError::WrongCredential),
        Err(e) => return Err(e),
    };

    open_branch(&bundle.encrypted_mek_phrase, &key, AAD_MEK_PHRASE)
}

fn open_branch(
    blob: &[u8],
    key: &SecretBytes<MEK_LEN>,
    aad: &'static [u8],
) -> Result<SecretBytes<MEK_LEN>, CryptoError> {
    let buffer = match aead::open(blob, key.expose(), aad) {
        Ok(buffer) => buffer,
        Err(CryptoError::DecryptionFailed) => return Err(CryptoError::WrongCredential),
        Err(e) => return Err(e),
    };

    if buffer.len() != MEK_LEN {
        return Err(CryptoError::InvalidCiphertext(format!(
            "wrapped key decrypted to {} bytes (expected {MEK_LEN})",
            buffer.len()
        )));
    }

    let mut raw = [0u8; MEK_LEN];
    raw.copy_from_slice(buffer.expose());
    let mek = SecretBytes::new(raw);
    raw.zeroize();
    Ok(mek)
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// Re-wrap the MEK under a new password, replacing only the password branch.
///
/// The caller must already hold the MEK — possession is the authorization
/// proof. A fresh salt is drawn; `salt_password` and
/// `encrypted_mek_password` are replaced together; `salt_phrase` and
/// `encrypted_mek_phrase` are never touched.
///
/// The keyring-combined derivation is preferred. On a machine with no
/// usable credential store the new wrap falls back to password-only, which
/// keeps a legacy vault rotatable.
///
/// # Errors
///
/// [`CryptoError::InvalidKey`] unless the MEK is 32 bytes;
/// [`CryptoError::UnsupportedKdf`] when the bundle's KDF record is unknown;
/// otherwise derivation and entropy failures propagate. The bundle is
/// unchanged on every error path.
pub fn rotate_password(
    bundle: &mut MekBundle,
    mek: &[u8],
    new_password: &str,
    provider: &dyn KeyringProvider,
) -> Result<(), CryptoError> {
    if mek.len() != MEK_LEN {
        return Err(CryptoError::InvalidKey(format!(
            "expected {MEK_LEN}-byte MEK, got {} bytes",
            mek.len()
        )));
    }
    bundle.kdf.validate()?;

    let new_salt = kdf::generate_salt()?;

    let new_key = match keyring::get_or_create_secret(provider) {
        Ok(secret) => kdf::derive_key_with_keyring_config(
            new_password.as_bytes(),
            &new_salt,
            secret.expose(),
            &bundle.kdf,
        )?,
        Err(CryptoError::KeyringUnavailable(_)) => {
            kdf::derive_key_with_config(new_password.as_bytes(), &new_salt, &bundle.kdf)?
        }
        Err(e) => return Err(e),
    };

    let new_encrypted = aead::seal(mek, new_key.expose(), AAD_MEK_PASSWORD)?;

    // Both password fields replace together or not at all.
    bundle.salt_password = new_salt.to_vec();
    bundle.encrypted_mek_password = new_encrypted;
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
