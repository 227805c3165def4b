use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::warn;

use crate::shared::AppError;

/// Hashes a secret with Argon2id (random salt, default parameters) into a
/// PHC-formatted string suitable for storage.
///
/// Used both for account passwords and for refresh-token fingerprints, so a
/// leaked column value can never be replayed as a literal token.
pub fn hash(plaintext: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            warn!(error = %e, "Failed to hash secret");
            AppError::Internal
        })
}

/// Verifies a secret against a stored PHC hash.
///
/// Never raises on mismatch: a wrong secret and an unparseable digest both
/// come back `false`, so callers map every failure to the same error.
pub fn verify(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        warn!("Stored digest is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Password strength policy: minimum 8 characters plus at least one
/// uppercase letter, one lowercase letter, one digit, and one special
/// character.
pub fn meets_policy(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let digest = hash("Passw0rd!").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(verify("Passw0rd!", &digest));
        assert!(!verify("Passw0rd!x", &digest));
    }

    #[test]
    fn test_same_password_different_salts() {
        let first = hash("Passw0rd!").unwrap();
        let second = hash("Passw0rd!").unwrap();

        assert_ne!(first, second);
        assert!(verify("Passw0rd!", &first));
        assert!(verify("Passw0rd!", &second));
    }

    #[test]
    fn test_verify_invalid_digest_is_false_not_error() {
        assert!(!verify("anything", "not-a-phc-string"));
        assert!(!verify("anything", ""));
    }

    #[rstest]
    #[case::all_rules_min_length("Aa1!aaaa", true)]
    #[case::too_short("Aa1!aaa", false)]
    #[case::no_uppercase("aa1!aaaa", false)]
    #[case::no_lowercase("AA1!AAAA", false)]
    #[case::no_digit("Aab!aaaa", false)]
    #[case::no_special("Aa1aaaaa", false)]
    #[case::typical("Passw0rd!", true)]
    fn test_password_policy(#[case] password: &str, #[case] expected: bool) {
        assert_eq!(meets_policy(password), expected);
    }
}
