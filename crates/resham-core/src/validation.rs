//! # Validation Module
//!
//! Input validation for catalog records and checkout contact details.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end form                                               │
//! │  ├── Required fields, input masks                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Command functions (Rust)                                     │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: contact + catalog field rules                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite (NOT NULL, UNIQUE, CHECK stock >= 0)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use resham_core::validation::{validate_email, validate_phone};
//!
//! assert!(validate_email("meera@example.in").is_ok());
//! assert!(validate_phone("+91 98765-43210").is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 120;
const MAX_EMAIL_LEN: usize = 254;
const MAX_SLUG_LEN: usize = 160;

// =============================================================================
// Contact Validators
// =============================================================================

/// Validates a shopper's name.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Not empty, at most 254 characters
/// - Exactly one `@` with something on each side
/// - Domain part contains a dot
///
/// Deliverability is the gateway's problem; this only rejects obvious typos.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(invalid("must contain exactly one '@'")),
    };

    if local.is_empty() || domain.is_empty() {
        return Err(invalid("missing local part or domain"));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must contain a dot"));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    Ok(())
}

/// Validates a phone number.
///
/// Spaces, dashes, parentheses and a leading `+` are accepted as separators;
/// what remains must be 10 to 15 digits.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let mut digits = 0usize;
    for (i, c) in phone.chars().enumerate() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' | '(' | ')' => {}
            '+' if i == 0 => {}
            _ => {
                return Err(ValidationError::InvalidFormat {
                    field: "phone".to_string(),
                    reason: format!("unexpected character '{}'", c),
                })
            }
        }
    }

    if !(10..=15).contains(&digits) {
        return Err(ValidationError::OutOfRange {
            field: "phone digits".to_string(),
            min: 10,
            max: 15,
        });
    }

    Ok(())
}

/// Strips separators, leaving the digits (and a leading `+`).
pub fn normalize_phone(phone: &str) -> String {
    let phone = phone.trim();
    let mut out = String::with_capacity(phone.len());
    if phone.starts_with('+') {
        out.push('+');
    }
    out.extend(phone.chars().filter(char::is_ascii_digit));
    out
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a product or category id (non-empty, no whitespace).
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Validates a URL slug: lowercase ASCII letters, digits and single dashes.
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    if slug.is_empty() {
        return Err(ValidationError::Required {
            field: "slug".to_string(),
        });
    }

    if slug.len() > MAX_SLUG_LEN {
        return Err(ValidationError::TooLong {
            field: "slug".to_string(),
            max: MAX_SLUG_LEN,
        });
    }

    let well_formed = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            reason: "use lowercase letters, digits and single dashes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }
    Ok(())
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
