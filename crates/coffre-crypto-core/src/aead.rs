//! AES-256-GCM authenticated encryption over the vault wire format.
//!
//! Ciphertext blobs are the byte-exact concatenation
//! `nonce (12) || ciphertext || tag (16)` with no framing. [`seal`] draws a
//! fresh random nonce per call; [`open`] authenticates and returns the
//! plaintext in a [`SecretBuffer`].
//!
//! All GCM-level failures collapse into the single
//! [`CryptoError::DecryptionFailed`] variant: a caller cannot tell a wrong
//! key from a tampered blob from an AAD mismatch through this interface.

use rand::rngs::OsRng;
use rand::RngCore;
use ring::aead;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::memory::SecretBuffer;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// GCM nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// Minimum blob length: nonce + empty ciphertext + tag.
pub const MIN_BLOB_LEN: usize = NONCE_LEN + TAG_LEN;

fn gcm_key(key: &[u8]) -> Result<aead::LessSafeKey, CryptoError> {
    if key.len() != KEY_LEN {
        return Err(CryptoError::InvalidKey(format!(
            "expected {KEY_LEN}-byte key, got {} bytes",
            key.len()
        )));
    }
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, key)
        .map_err(|_| CryptoError::InvalidKey("failed to initialize AES-256-GCM".into()))?;
    Ok(aead::LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under `key`, authenticating `aad` alongside it.
///
/// The nonce is drawn from the OS CSPRNG per call, so two invocations with
/// identical inputs yield distinct blobs. Empty plaintext is legal and
/// produces a 28-byte blob. `aad` is authenticated but not encrypted and
/// must be presented unchanged to [`open`]; pass `&[]` for none.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKey`] unless the key is exactly 32 bytes,
/// [`CryptoError::EntropySource`] if the nonce cannot be drawn.
pub fn seal(plaintext: &[u8], key: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let sealing_key = gcm_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| CryptoError::EntropySource(format!("nonce generation failed: {e}")))?;
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    // Encrypt in place: the blob starts as nonce || plaintext and the
    // plaintext region is overwritten with ciphertext.
    let mut blob = Vec::with_capacity(MIN_BLOB_LEN.saturating_add(plaintext.len()));
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(plaintext);

    let Ok(tag) =
        sealing_key.seal_in_place_separate_tag(nonce, aead::Aad::from(aad), &mut blob[NONCE_LEN..])
    else {
        blob.zeroize();
        return Err(CryptoError::InvalidCiphertext(
            "plaintext exceeds the AES-GCM length limit".into(),
        ));
    };
    blob.extend_from_slice(tag.as_ref());

    Ok(blob)
}

/// Decrypt and authenticate a blob produced by [`seal`].
///
/// The plaintext comes back in a [`SecretBuffer`]; the intermediate
/// decryption buffer is zeroized before return on every path.
///
/// # Errors
///
/// - [`CryptoError::InvalidKey`] unless the key is exactly 32 bytes.
/// - [`CryptoError::InvalidCiphertext`] if the blob is shorter than the
///   28-byte minimum (nonce + tag).
/// - [`CryptoError::DecryptionFailed`] when authentication fails, for any
///   reason.
pub fn open(blob: &[u8], key: &[u8], aad: &[u8]) -> Result<SecretBuffer, CryptoError> {
    let opening_key = gcm_key(key)?;

    if blob.len() < MIN_BLOB_LEN {
        return Err(CryptoError::InvalidCiphertext(format!(
            "blob too short: {} bytes (minimum {MIN_BLOB_LEN})",
            blob.len()
        )));
    }

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&blob[..NONCE_LEN]);
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    // open_in_place wants ciphertext || tag in one mutable buffer.
    let mut in_out = blob[NONCE_LEN..].to_vec();
    let result = match opening_key.open_in_place(nonce, aead::Aad::from(aad), &mut in_out) {
        Ok(plaintext) => Ok(SecretBuffer::new(plaintext)),
        Err(_) => Err(CryptoError::DecryptionFailed),
    };
    in_out.zeroize();
    result
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: [u8; KEY_LEN] = [0xA5; KEY_LEN];
    const WRONG_KEY: [u8; KEY_LEN] = [0x5A; KEY_LEN];

    #[test]
    fn seal_open_roundtrip() {
        let blob = seal(b"vault record", &TEST_KEY, &[]).expect("seal should succeed");
        let plaintext = open(&blob, &TEST_KEY, &[]).expect("open should succeed");
        assert_eq!(plaintext.expose(), b"vault record");
    }

    #[test]
    fn blob_layout_is_plaintext_plus_overhead() {
        let blob = seal(b"12345", &TEST_KEY, &[]).expect("seal should succeed");
        assert_eq!(blob.len(), MIN_BLOB_LEN + 5);
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let blob = seal(&[], &TEST_KEY, &[]).expect("seal should succeed");
        assert_eq!(blob.len(), MIN_BLOB_LEN);
        let plaintext = open(&blob, &TEST_KEY, &[]).expect("open should succeed");
        assert!(plaintext.expose().is_empty());
    }

    #[test]
    fn wrong_key_collapses_to_decryption_failed() {
        let blob = seal(b"secret", &TEST_KEY, &[]).expect("seal should succeed");
        assert!(matches!(
            open(&blob, &WRONG_KEY, &[]),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn tampered_ciphertext_collapses_to_decryption_failed() {
        let mut blob = seal(b"secret", &TEST_KEY, &[]).expect("seal should succeed");
        let last = blob.len() - 1;
        blob[last] ^= 0xFF;
        assert!(matches!(
            open(&blob, &TEST_KEY, &[]),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn tampered_nonce_collapses_to_decryption_failed() {
        let mut blob = seal(b"secret", &TEST_KEY, &[]).expect("seal should succeed");
        blob[0] ^= 0x01;
        assert!(matches!(
            open(&blob, &TEST_KEY, &[]),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn aad_mismatch_collapses_to_decryption_failed() {
        let blob = seal(b"secret", &TEST_KEY, b"branch-a").expect("seal should succeed");
        assert!(matches!(
            open(&blob, &TEST_KEY, b"branch-b"),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn aad_roundtrip() {
        let blob = seal(b"secret", &TEST_KEY, b"entry-7").expect("seal should succeed");
        let plaintext = open(&blob, &TEST_KEY, b"entry-7").expect("open should succeed");
        assert_eq!(plaintext.expose(), b"secret");
    }

    #[test]
    fn short_blob_is_invalid_ciphertext() {
        let result = open(&[0u8; MIN_BLOB_LEN - 1], &TEST_KEY, &[]);
        assert!(matches!(result, Err(CryptoError::InvalidCiphertext(_))));
    }

    #[test]
    fn seal_rejects_wrong_key_length() {
        assert!(matches!(
            seal(b"x", &[0u8; 31], &[]),
            Err(CryptoError::InvalidKey(_))
        ));
        assert!(matches!(
            seal(b"x", &[0u8; 33], &[]),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn open_rejects_wrong_key_length() {
        let blob = seal(b"x", &TEST_KEY, &[]).expect("seal should succeed");
        assert!(matches!(
            open(&blob, &[0u8; 16], &[]),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn repeated_seals_produce_distinct_blobs() {
        let a = seal(b"same input", &TEST_KEY, &[]).expect("seal should succeed");
        let b = seal(b"same input", &TEST_KEY, &[]).expect("seal should succeed");
        assert_ne!(a, b, "fresh nonce must make blobs distinct");
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN], "nonces must differ");
    }
}
