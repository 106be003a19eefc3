//! Redacting wrapper for credentials and key material
//!
//! Store passwords and master keys travel through configuration structs that
//! are routinely printed with `{:?}`. Wrapping them in `Sensitive<T>` keeps the
//! value out of logs while still deserializing transparently from config files.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Wrapper that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use folio_core_types::Sensitive;
///
/// let password = Sensitive::new("hunter2");
/// assert_eq!(format!("{:?}", password), "***REDACTED***");
/// assert_eq!(password.expose(), &"hunter2");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying value
    ///
    /// Call this only at the point where the secret is consumed (opening a
    /// connection, unwrapping a key).
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Sensitive)
    }
}

// Serializing redacts: configs written back out never carry the secret.
impl<T> Serialize for Sensitive<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("***REDACTED***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_redact() {
        let secret = Sensitive::new("db-password");
        assert_eq!(format!("{:?}", secret), "***REDACTED***");
        assert_eq!(format!("{}", secret), "***REDACTED***");
    }

    #[test]
    fn test_expose_and_into_inner() {
        let secret = Sensitive::new(String::from("key"));
        assert_eq!(secret.expose(), "key");
        assert_eq!(secret.into_inner(), "key");
    }

    #[test]
    fn test_deserializes_transparently() {
        let secret: Sensitive<String> = serde_json::from_str("\"s3cret\"").unwrap();
        assert_eq!(secret.expose(), "s3cret");
    }

    #[test]
    fn test_serialize_redacts() {
        let secret = Sensitive::new(String::from("s3cret"));
        let json = serde_json::to_string(&secret).unwrap();
        assert!(!json.contains("s3cret"));
    }
}
