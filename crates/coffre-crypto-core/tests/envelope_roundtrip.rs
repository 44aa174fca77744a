#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! End-to-end tests for the MEK envelope: create, unlock by both branches,
//! rotate, tamper.
//!
//! All bundles here use a cheap Argon2id profile via
//! `create_bundle_with_config`; the production profile is covered in
//! `kdf_production_params.rs`.

use coffre_crypto_core::envelope::{
    create_bundle_with_config, open_with_password, open_with_phrase, rotate_password,
};
use coffre_crypto_core::keyring::MemoryKeyring;
use coffre_crypto_core::{validate_phrase, CryptoError, KdfConfig, KdfParams, MekBundle};

fn fast_config() -> KdfConfig {
    KdfConfig {
        algorithm: "argon2id".to_owned(),
        params: KdfParams {
            memory: 64,
            iterations: 1,
            parallelism: 1,
        },
    }
}

const MASTER_PASSWORD: &str = "correct horse battery staple";

fn create(provider: &MemoryKeyring) -> (MekBundle, String) {
    create_bundle_with_config(MASTER_PASSWORD, provider, fast_config())
        .expect("bundle creation should succeed")
}

#[test]
fn create_and_reopen_by_both_paths() {
    let provider = MemoryKeyring::new();
    let (bundle, recovery_phrase) = create(&provider);

    assert!(validate_phrase(&recovery_phrase));

    let by_password =
        open_with_password(&bundle, MASTER_PASSWORD, &provider).expect("password unlock");
    let by_phrase = open_with_phrase(&bundle, &recovery_phrase).expect("phrase unlock");

    assert_eq!(by_password.mek.expose().len(), 32);
    assert_eq!(by_password.mek.expose(), by_phrase.expose());
    assert!(!by_password.legacy_fallback);
}

#[test]
fn wrong_password_is_wrong_credential() {
    let provider = MemoryKeyring::new();
    let (bundle, _) = create(&provider);

    assert!(matches!(
        open_with_password(&bundle, "wrong", &provider),
        Err(CryptoError::WrongCredential)
    ));
}

#[test]
fn phrase_input_is_case_and_whitespace_insensitive() {
    let provider = MemoryKeyring::new();
    let (bundle, recovery_phrase) = create(&provider);

    let canonical = open_with_phrase(&bundle, &recovery_phrase).expect("canonical unlock");

    let shouted = recovery_phrase.to_uppercase();
    let from_shouted = open_with_phrase(&bundle, &shouted).expect("uppercase unlock");
    assert_eq!(canonical.expose(), from_shouted.expose());

    let padded = format!("  {}  ", recovery_phrase.replace(' ', "\t "));
    let from_padded = open_with_phrase(&bundle, &padded).expect("padded unlock");
    assert_eq!(canonical.expose(), from_padded.expose());
}

#[test]
fn rotation_preserves_the_phrase_branch() {
    let provider = MemoryKeyring::new();
    let (mut bundle, recovery_phrase) = create(&provider);

    let original = open_with_password(&bundle, MASTER_PASSWORD, &provider).expect("unlock");

    rotate_password(&mut bundle, original.mek.expose(), "new-pw", &provider)
        .expect("rotation should succeed");

    let by_new = open_with_password(&bundle, "new-pw", &provider).expect("new password");
    assert_eq!(by_new.mek.expose(), original.mek.expose());

    let by_phrase = open_with_phrase(&bundle, &recovery_phrase).expect("phrase still works");
    assert_eq!(by_phrase.expose(), original.mek.expose());

    assert!(matches!(
        open_with_password(&bundle, MASTER_PASSWORD, &provider),
        Err(CryptoError::WrongCredential)
    ));
}

#[test]
fn double_rotation_keeps_the_original_mek() {
    let provider = MemoryKeyring::new();
    let (mut bundle, recovery_phrase) = create(&provider);
    let original = open_with_phrase(&bundle, &recovery_phrase).expect("unlock");

    rotate_password(&mut bundle, original.expose(), "second", &provider).expect("rotate");
    rotate_password(&mut bundle, original.expose(), "third", &provider).expect("rotate again");

    let unlocked = open_with_password(&bundle, "third", &provider).expect("latest password");
    assert_eq!(unlocked.mek.expose(), original.expose());
    assert!(matches!(
        open_with_password(&bundle, "second", &provider),
        Err(CryptoError::WrongCredential)
    ));
}

#[test]
fn tampered_wrap_collapses_to_wrong_credential() {
    let provider = MemoryKeyring::new();
    let (mut bundle, _) = create(&provider);

    let last = bundle.encrypted_mek_password.len() - 1;
    bundle.encrypted_mek_password[last] ^= 0x01;

    assert!(matches!(
        open_with_password(&bundle, MASTER_PASSWORD, &provider),
        Err(CryptoError::WrongCredential)
    ));
}

#[test]
fn tampered_phrase_wrap_collapses_to_wrong_credential() {
    let provider = MemoryKeyring::new();
    let (mut bundle, recovery_phrase) = create(&provider);

    bundle.encrypted_mek_phrase[0] ^= 0x01;

    assert!(matches!(
        open_with_phrase(&bundle, &recovery_phrase),
        Err(CryptoError::WrongCredential)
    ));
}

#[test]
fn keyring_secret_is_required_material() {
    // The same password with a different keyring secret must not unlock.
    let provider = MemoryKeyring::new();
    let (bundle, _) = create(&provider);

    let other_machine = MemoryKeyring::new();
    coffre_crypto_core::create_secret(&other_machine).expect("foreign secret");

    assert!(matches!(
        open_with_password(&bundle, MASTER_PASSWORD, &other_machine),
        Err(CryptoError::WrongCredential)
    ));
}

#[test]
fn bundle_survives_json_persistence() {
    let provider = MemoryKeyring::new();
    let (bundle, recovery_phrase) = create(&provider);

    let json = serde_json::to_string(&bundle).expect("serialize");
    let restored: MekBundle = serde_json::from_str(&json).expect("deserialize");

    let a = open_with_phrase(&bundle, &recovery_phrase).expect("original");
    let b = open_with_phrase(&restored, &recovery_phrase).expect("restored");
    assert_eq!(a.expose(), b.expose());
}
