//! Normalizations
//!
//! Applied to stored field values only after every constraint and invariant
//! of the record has passed.
//!
//! ## Secrets
//! - `one_way_hash` stores an Argon2id PHC string with a fresh random salt
//! - The raw value never leaves the validator once hashed
//! - Verification goes through the hash, never a comparison of raw values

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use serde_json::Value;

use super::errors::{ValidationError, ValidationResult};
use super::value::json_type_name;
use crate::schema::Transform;

/// Applies `transform` to the value of field `field`.
pub fn apply(field: &str, value: Value, transform: Transform) -> ValidationResult<Value> {
    let Value::String(s) = value else {
        return Err(ValidationError::type_mismatch(
            field,
            "string",
            json_type_name(&value),
        ));
    };

    let out = match transform {
        Transform::Uppercase => s.to_uppercase(),
        Transform::Lowercase => s.to_lowercase(),
        Transform::Trim => s.trim().to_string(),
        Transform::OneWayHash => hash_secret(&s).map_err(|reason| {
            ValidationError::TransformFailed {
                field: field.to_string(),
                reason,
            }
        })?,
    };

    Ok(Value::String(out))
}

/// Applies `transforms` in order.
pub fn apply_all(field: &str, value: Value, transforms: &[Transform]) -> ValidationResult<Value> {
    transforms
        .iter()
        .try_fold(value, |v, t| apply(field, v, *t))
}

/// Hashes a secret with Argon2id and a fresh salt.
pub fn hash_secret(secret: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| e.to_string())
}

/// Checks a raw secret against a stored hash.
///
/// A stored value that is not a hash never verifies.
pub fn verify_secret(secret: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_and_trim() {
        assert_eq!(
            apply("name", json!("John Doe"), Transform::Uppercase).unwrap(),
            json!("JOHN DOE")
        );
        assert_eq!(
            apply("email", json!("John@Example.COM"), Transform::Lowercase).unwrap(),
            json!("john@example.com")
        );
        assert_eq!(
            apply_all(
                "name",
                json!("  jane  "),
                &[Transform::Trim, Transform::Uppercase]
            )
            .unwrap(),
            json!("JANE")
        );
    }

    #[test]
    fn test_idempotent_transforms() {
        for t in [Transform::Uppercase, Transform::Lowercase, Transform::Trim] {
            let once = apply("f", json!(" MiXeD "), t).unwrap();
            let twice = apply("f", once.clone(), t).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_hash_is_salted_and_verifiable() {
        let a = apply("password", json!("password123"), Transform::OneWayHash).unwrap();
        let b = apply("password", json!("password123"), Transform::OneWayHash).unwrap();

        let a = a.as_str().unwrap();
        let b = b.as_str().unwrap();
        assert_ne!(a, "password123");
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(verify_secret("password123", a));
        assert!(verify_secret("password123", b));
        assert!(!verify_secret("password124", a));
    }

    #[test]
    fn test_verify_rejects_plain_value() {
        assert!(!verify_secret("password123", "password123"));
    }

    #[test]
    fn test_non_string_rejected() {
        let err = apply("age", json!(5), Transform::Trim).unwrap_err();
        assert_eq!(err.code(), "RECORD_TYPE_MISMATCH");
    }
}
