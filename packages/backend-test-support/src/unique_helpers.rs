//! Unique test data generation.
//!
//! ULID-based so that tests sharing a database never collide on unique
//! columns (users.email, contacts per-owner email/phone).

use ulid::Ulid;

/// Unique string in the format `{prefix}-{ulid}`.
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// Unique email in the format `{prefix}-{ulid}@example.test`.
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.test", prefix, Ulid::new())
}

/// Unique digit-only phone number (unique per call, fits a phone column).
pub fn unique_phone() -> String {
    let ulid = Ulid::new().0;
    format!("+380{:012}", ulid % 1_000_000_000_000)
}
