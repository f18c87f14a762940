//! Credential validation shared by the external client constructors.

use thiserror::Error;

/// A required credential was absent or blank when a client was constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing credential for {client}: `{field}` must be set")]
pub struct MissingCredentialError {
    pub client: &'static str,
    pub field: &'static str,
}

/// Returns the trimmed credential, or an error naming the client and field.
pub fn require(
    value: Option<&str>,
    client: &'static str,
    field: &'static str,
) -> Result<String, MissingCredentialError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(MissingCredentialError { client, field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_present() {
        assert_eq!(require(Some(" key "), "gemini", "api_key").unwrap(), "key");
    }

    #[test]
    fn test_require_missing_or_blank() {
        let err = require(None, "spotify", "client_id").unwrap_err();
        assert_eq!(err.client, "spotify");
        assert_eq!(err.field, "client_id");
        assert!(err.to_string().contains("client_id"));

        assert!(require(Some("   "), "spotify", "client_secret").is_err());
    }
}
