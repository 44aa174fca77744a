#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for the password generator.

use coffre_crypto_core::{generate_password, score_strength, GeneratorOptions, PasswordStrength};
use proptest::prelude::*;

const AMBIGUOUS: &[u8] = b"0O1lI";

fn pool_for(options: &GeneratorOptions) -> Vec<u8> {
    let mut pool = Vec::new();
    if options.include_lowercase {
        pool.extend_from_slice(b"abcdefghijklmnopqrstuvwxyz");
    }
    if options.include_uppercase {
        pool.extend_from_slice(b"ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    }
    if options.include_digits {
        pool.extend_from_slice(b"0123456789");
    }
    if options.include_symbols {
        pool.extend_from_slice(b"!@#$%^&*()_+-=[]{}|;:,.<>?");
    }
    if pool.is_empty() {
        pool.extend_from_slice(b"abcdefghijklmnopqrstuvwxyz0123456789");
    }
    if options.exclude_ambiguous {
        pool.retain(|c| !AMBIGUOUS.contains(c));
    }
    pool
}

prop_compose! {
    fn arbitrary_options()(
        length in 0usize..256,
        include_uppercase in any::<bool>(),
        include_lowercase in any::<bool>(),
        include_digits in any::<bool>(),
        include_symbols in any::<bool>(),
        exclude_ambiguous in any::<bool>(),
    ) -> GeneratorOptions {
        GeneratorOptions {
            length,
            include_uppercase,
            include_lowercase,
            include_digits,
            include_symbols,
            exclude_ambiguous,
        }
    }
}

proptest! {
    /// Output length equals the clamped requested length.
    #[test]
    fn length_is_clamped(options in arbitrary_options()) {
        let password = generate_password(&options);
        prop_assert_eq!(password.len(), options.length.clamp(1, 128));
    }

    /// Every output character belongs to the configured pool.
    #[test]
    fn characters_stay_in_the_pool(options in arbitrary_options()) {
        let pool = pool_for(&options);
        let password = generate_password(&options);
        for byte in password.bytes() {
            prop_assert!(pool.contains(&byte), "unexpected character {byte:#04x}");
        }
    }

    /// The ambiguous set never appears when excluded.
    #[test]
    fn ambiguous_exclusion_holds(mut options in arbitrary_options()) {
        options.exclude_ambiguous = true;
        options.length = 128;
        let password = generate_password(&options);
        prop_assert!(!password.bytes().any(|b| AMBIGUOUS.contains(&b)));
    }

    /// Scoring never panics and stays within the five levels.
    #[test]
    fn scoring_total_function(password in ".{0,64}") {
        let strength = score_strength(&password);
        prop_assert!(strength >= PasswordStrength::Weak);
        prop_assert!(strength <= PasswordStrength::VeryStrong);
    }
}
