//! Password generation and strength scoring.
//!
//! The generator draws every character independently from the OS CSPRNG
//! against the configured character pool. The strength score is a coarse
//! heuristic for a meter widget, not an entropy estimate.

use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Smallest generated password length.
pub const MIN_PASSWORD_LENGTH: usize = 1;

/// Largest generated password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Default generated password length.
pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Characters easily misread for each other across fonts.
const AMBIGUOUS: &[u8] = b"0O1lI";

/// Substrings that mark a password as practically guessable.
const WEAK_PATTERNS: [&str; 5] = ["password", "123456", "qwerty", "abc123", "letmein"];

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Character-class configuration for the generator.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorOptions {
    /// Requested length; clamped to `[1, 128]` at generation time.
    pub length: usize,
    /// Include uppercase letters (A-Z).
    pub include_uppercase: bool,
    /// Include lowercase letters (a-z).
    pub include_lowercase: bool,
    /// Include digits (0-9).
    pub include_digits: bool,
    /// Include symbols.
    pub include_symbols: bool,
    /// Drop `0O1lI` from the pool.
    pub exclude_ambiguous: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: DEFAULT_PASSWORD_LENGTH,
            include_uppercase: true,
            include_lowercase: true,
            include_digits: true,
            include_symbols: true,
            exclude_ambiguous: false,
        }
    }
}

/// Generate a random password.
///
/// The length is clamped to `[1, 128]`. Disabling every class falls back
/// to lowercase + digits, so the pool is never empty. Each position is an
/// independent uniform draw from the pool.
///
/// # Panics
///
/// Panics only if the generated bytes are not UTF-8, which cannot happen —
/// every pool is ASCII.
#[must_use]
pub fn generate_password(options: &GeneratorOptions) -> String {
    let length = options
        .length
        .clamp(MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH);

    let mut pool: Vec<u8> = Vec::new();
    if options.include_lowercase {
        pool.extend_from_slice(LOWERCASE);
    }
    if options.include_uppercase {
        pool.extend_from_slice(UPPERCASE);
    }
    if options.include_digits {
        pool.extend_from_slice(DIGITS);
    }
    if options.include_symbols {
        pool.extend_from_slice(SYMBOLS);
    }

    if pool.is_empty() {
        pool.extend_from_slice(LOWERCASE);
        pool.extend_from_slice(DIGITS);
    }

    if options.exclude_ambiguous {
        pool.retain(|c| !AMBIGUOUS.contains(c));
    }

    let mut rng = OsRng;
    let bytes: Vec<u8> = (0..length)
        .map(|_| pool[rng.gen_range(0..pool.len())])
        .collect();

    String::from_utf8(bytes).expect("password pool is ASCII")
}

// ---------------------------------------------------------------------------
// Strength
// ---------------------------------------------------------------------------

/// Coarse strength classification for a meter widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PasswordStrength {
    /// Trivially guessable.
    Weak,
    /// Below recommended strength.
    Fair,
    /// Acceptable.
    Good,
    /// Recommended.
    Strong,
    /// Long and varied.
    VeryStrong,
}

impl PasswordStrength {
    /// Human-readable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weak => "Weak",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Strong => "Strong",
            Self::VeryStrong => "Very Strong",
        }
    }

    /// Fill percentage for a strength meter.
    #[must_use]
    pub const fn percentage(self) -> u8 {
        match self {
            Self::Weak => 20,
            Self::Fair => 40,
            Self::Good => 60,
            Self::Strong => 80,
            Self::VeryStrong => 100,
        }
    }
}

/// Score a password.
///
/// Length: +2 at ≥16, +1 at ≥12, −1 below 8. +1 per character class
/// present (upper, lower, digit, symbol). −2 once if any known weak
/// substring appears in the lowercased password. Thresholds: ≤1 Weak,
/// 2 Fair, 3 Good, 4 Strong, ≥5 Very Strong.
#[must_use]
pub fn score_strength(password: &str) -> PasswordStrength {
    if password.is_empty() {
        return PasswordStrength::Weak;
    }

    let mut score: i32 = 0;

    let length = password.len();
    if length >= 16 {
        score = score.saturating_add(2);
    } else if length >= 12 {
        score = score.saturating_add(1);
    } else if length < 8 {
        score = score.saturating_sub(1);
    }

    let classes = [
        password.bytes().any(|b| b.is_ascii_lowercase()),
        password.bytes().any(|b| b.is_ascii_uppercase()),
        password.bytes().any(|b| b.is_ascii_digit()),
        password.bytes().any(|b| SYMBOLS.contains(&b)),
    ];
    for present in classes {
        if present {
            score = score.saturating_add(1);
        }
    }

    let lowered = password.to_lowercase();
    if WEAK_PATTERNS.iter().any(|p| lowered.contains(p)) {
        score = score.saturating_sub(2);
    }

    match score {
        i32::MIN..=1 => PasswordStrength::Weak,
        2 => PasswordStrength::Fair,
        3 => PasswordStrength::Good,
        4 => PasswordStrength::Strong,
        _ => PasswordStrength::VeryStrong,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_options_produce_default_length() {
        let password = generate_password(&GeneratorOptions::default());
        assert_eq!(password.len(), DEFAULT_PASSWORD_LENGTH);
    }

    #[test]
    fn length_clamps_low_and_high() {
        let tiny = GeneratorOptions {
            length: 0,
            ..GeneratorOptions::default()
        };
        assert_eq!(generate_password(&tiny).len(), MIN_PASSWORD_LENGTH);

        let huge = GeneratorOptions {
            length: 1000,
            ..GeneratorOptions::default()
        };
        assert_eq!(generate_password(&huge).len(), MAX_PASSWORD_LENGTH);
    }

    #[test]
    fn all_classes_disabled_falls_back_to_lowercase_digits() {
        let options = GeneratorOptions {
            length: 64,
            include_uppercase: false,
            include_lowercase: false,
            include_digits: false,
            include_symbols: false,
            exclude_ambiguous: false,
        };
        let password = generate_password(&options);
        assert!(password
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    }

    #[test]
    fn single_class_pools_are_respected() {
        let options = GeneratorOptions {
            length: 64,
            include_uppercase: false,
            include_lowercase: false,
            include_digits: true,
            include_symbols: false,
            exclude_ambiguous: false,
        };
        let password = generate_password(&options);
        assert!(password.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn excluded_ambiguous_characters_never_appear() {
        let options = GeneratorOptions {
            length: 128,
            exclude_ambiguous: true,
            ..GeneratorOptions::default()
        };
        // 128 chars x 20 runs: every ambiguous glyph would show up with
        // overwhelming probability if the filter were broken.
        for _ in 0..20 {
            let password = generate_password(&options);
            assert!(!password.bytes().any(|b| AMBIGUOUS.contains(&b)));
        }
    }

    #[test]
    fn output_stays_within_the_configured_pool() {
        let options = GeneratorOptions {
            length: 128,
            include_uppercase: true,
            include_lowercase: false,
            include_digits: false,
            include_symbols: true,
            exclude_ambiguous: false,
        };
        let allowed: HashSet<u8> = UPPERCASE.iter().chain(SYMBOLS.iter()).copied().collect();
        let password = generate_password(&options);
        assert!(password.bytes().all(|b| allowed.contains(&b)));
    }

    #[test]
    fn generated_passwords_are_unique() {
        let passwords: HashSet<String> = (0..100)
            .map(|_| generate_password(&GeneratorOptions::default()))
            .collect();
        assert_eq!(passwords.len(), 100);
    }

    #[test]
    fn strength_empty_and_short_are_weak() {
        assert_eq!(score_strength(""), PasswordStrength::Weak);
        // len < 8 (−1) + lowercase (+1) = 0.
        assert_eq!(score_strength("abc"), PasswordStrength::Weak);
    }

    #[test]
    fn strength_penalizes_known_patterns() {
        // 11 chars (+0), lower + digit (+2), pattern (−2) = 0.
        assert_eq!(score_strength("password123"), PasswordStrength::Weak);
        // 13 chars (+1), lower + digit (+2), pattern (−2) = 1.
        assert_eq!(score_strength("letmein123456"), PasswordStrength::Weak);
    }

    #[test]
    fn strength_ladder() {
        // 9 chars (+0), lower + digit (+2) = 2.
        assert_eq!(score_strength("abcdefg12"), PasswordStrength::Fair);
        // 9 chars (+0), lower + upper + digit (+3) = 3.
        assert_eq!(score_strength("Abcdefg12"), PasswordStrength::Good);
        // 11 chars (+0), all four classes (+4) = 4.
        assert_eq!(score_strength("Tr0ub4dor&3"), PasswordStrength::Strong);
        // 16 chars (+2), all four classes (+4) = 6.
        assert_eq!(score_strength("aB3$aB3$aB3$aB3$"), PasswordStrength::VeryStrong);
    }

    #[test]
    fn strength_long_single_class() {
        // 28 chars (+2), lowercase only (+1) = 3. Spaces are not symbols.
        assert_eq!(
            score_strength("correct horse battery staple"),
            PasswordStrength::Good
        );
    }

    #[test]
    fn labels_and_percentages_are_monotonic() {
        let levels = [
            PasswordStrength::Weak,
            PasswordStrength::Fair,
            PasswordStrength::Good,
            PasswordStrength::Strong,
            PasswordStrength::VeryStrong,
        ];
        let mut last = 0;
        for level in levels {
            assert!(!level.as_str().is_empty());
            assert!(level.percentage() > last);
            last = level.percentage();
        }
    }

    #[test]
    fn generated_passwords_score_well() {
        let password = generate_password(&GeneratorOptions::default());
        assert!(score_strength(&password) >= PasswordStrength::Good);
    }
}
