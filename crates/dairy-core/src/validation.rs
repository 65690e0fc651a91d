//! # Validation Module
//!
//! Input rules checked before any storage write or network call.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Screen (mobile shell)                                        │
//! │  ├── Field presence while typing                                       │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service call (Rust)                                          │
//! │  ├── THIS MODULE: email, phone, password, role rules                   │
//! │  └── A failure here means ZERO requests were sent                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: REST API                                                     │
//! │  └── Business errors returned as { status, message }                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dairy_core::validation::{validate_email, validate_phone_number};
//!
//! validate_email("jane@example.co.ke").unwrap();
//! validate_phone_number("0712345678").unwrap();
//! assert!(validate_phone_number("0812345678").is_err());
//! ```

use crate::error::ValidationError;
use crate::{MIN_PASSWORD_LENGTH, SIGN_UP_ROLES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest display name accepted on sign-up.
const MAX_NAME_LENGTH: usize = 100;

// =============================================================================
// Generic Validators
// =============================================================================

/// Rejects empty or whitespace-only values.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Account Validators
// =============================================================================

/// Validates an email address.
///
/// ## Rules
/// ```text
///   local-part  @  domain
///   ──────────     ──────────────────────────────
///   "anything"     [1.2.3.4]
///   atom.atom      label.label.tld   (tld: 2+ letters)
/// ```
/// Atoms exclude `< > ( ) [ ] \ . , ; : @ "` and whitespace. Labels allow
/// letters, digits, `-` and `_`.
///
/// ## Example
/// ```rust
/// use dairy_core::validation::validate_email;
///
/// assert!(validate_email("mama.mboga@shamba.co.ke").is_ok());
/// assert!(validate_email("no-at-sign").is_err());
/// assert!(validate_email("user@localhost").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    validate_required("email", email)?;

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    let (local, domain) = email
        .rsplit_once('@')
        .ok_or_else(|| invalid("missing @"))?;

    if !is_valid_local_part(local) {
        return Err(invalid("invalid name before @"));
    }
    if !is_valid_domain(domain) {
        return Err(invalid("invalid domain"));
    }

    Ok(())
}

fn is_valid_local_part(local: &str) -> bool {
    if local.len() >= 3 && local.starts_with('"') && local.ends_with('"') {
        return true;
    }
    !local.is_empty()
        && local.split('.').all(|atom| {
            !atom.is_empty()
                && atom.chars().all(|c| {
                    !c.is_whitespace() && !matches!(c, '<' | '>' | '(' | ')' | '[' | ']' | '\\' | ',' | ';' | ':' | '@' | '"')
                })
        })
}

fn is_valid_domain(domain: &str) -> bool {
    if let Some(ip) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        let octets: Vec<&str> = ip.split('.').collect();
        return octets.len() == 4
            && octets
                .iter()
                .all(|o| (1..=3).contains(&o.len()) && o.chars().all(|c| c.is_ascii_digit()));
    }

    let Some((labels, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
        && labels.split('.').all(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

/// Validates a Kenyan mobile number as accepted by the M-Pesa request.
///
/// ## Accepted Forms
/// - `07XXXXXXXX` (10 digits, local)
/// - `+2547XXXXXXXX` (international)
///
/// No whitespace or separators are tolerated.
pub fn validate_phone_number(phone: &str) -> ValidationResult<()> {
    validate_required("phone", phone)?;

    let digits_after = |prefix: &str| {
        phone
            .strip_prefix(prefix)
            .map(|rest| rest.len() == 8 && rest.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
    };

    if digits_after("07") || digits_after("+2547") {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "expected 07XXXXXXXX or +2547XXXXXXXX".to_string(),
        })
    }
}

/// Sign-in only requires a password to be present.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    Ok(())
}

/// Validates a password chosen on sign-up.
///
/// ## Rules
/// - Must be present
/// - At least [`MIN_PASSWORD_LENGTH`] characters
pub fn validate_new_password(password: &str) -> ValidationResult<()> {
    validate_password(password)?;

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Validates the display name entered on sign-up.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    validate_required("name", name)?;

    if name.trim().chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(())
}

/// Validates the role picked on sign-up against [`SIGN_UP_ROLES`].
pub fn validate_role(role: &str) -> ValidationResult<()> {
    validate_required("role", role)?;

    if !SIGN_UP_ROLES.contains(&role) {
        return Err(ValidationError::NotAllowed {
            field: "role".to_string(),
            allowed: SIGN_UP_ROLES.iter().map(|r| r.to_string()).collect(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        // Valid addresses
        assert!(validate_email("jane@example.com").is_ok());
        assert!(validate_email("first.last@shamba.co.ke").is_ok());
        assert!(validate_email("\"odd name\"@example.com").is_ok());
        assert!(validate_email("ops@[10.0.0.1]").is_ok());
        assert!(validate_email("dairy_ops@my-farm.org").is_ok());

        // Invalid addresses
        assert!(validate_email("").is_err());
        assert!(validate_email("plainaddress").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jane@example").is_err());
        assert!(validate_email("jane@example.c").is_err());
        assert!(validate_email("jane..doe@example.com").is_err());
        assert!(validate_email("jane doe@example.com").is_err());
        assert!(validate_email("jane@exa mple.com").is_err());
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("0712345678").is_ok());
        assert!(validate_phone_number("+254712345678").is_ok());

        assert!(validate_phone_number("").is_err());
        assert!(validate_phone_number("071234567").is_err());
        assert!(validate_phone_number("07123456789").is_err());
        assert!(validate_phone_number("0112345678").is_err());
        assert!(validate_phone_number("254712345678").is_err());
        assert!(validate_phone_number("+254112345678").is_err());
        assert!(validate_phone_number("07 12345678").is_err());
        assert!(validate_phone_number("07abcdefgh").is_err());
    }

    #[test]
    fn test_validate_passwords() {
        assert!(validate_password("x").is_ok());
        assert!(validate_password("").is_err());

        assert!(validate_new_password("secret").is_ok());
        assert_eq!(
            validate_new_password("short"),
            Err(ValidationError::TooShort {
                field: "password".to_string(),
                min: 6
            })
        );
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Achieng Otieno").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_role() {
        assert!(validate_role("customer").is_ok());
        assert!(validate_role("supplier").is_ok());
        assert!(validate_role("driver").is_ok());

        assert!(matches!(
            validate_role("admin"),
            Err(ValidationError::NotAllowed { .. })
        ));
        assert!(matches!(
            validate_role(""),
            Err(ValidationError::Required { .. })
        ));
    }
}
