//! The opaque subject identifier.

use std::fmt;

use thiserror::Error;

/// Error returned for empty or whitespace-only identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identity token must not be empty")]
pub struct EmptyToken;

/// Opaque string identifying the subject to the remote collector.
///
/// Always non-empty and trimmed. Immutable once constructed; a session
/// captures one at start and keeps it for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityToken(String);

impl IdentityToken {
    /// Parse a user-supplied identifier, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, EmptyToken> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmptyToken);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdentityToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let token = IdentityToken::parse("  TID-2024-0042 \n").unwrap();
        assert_eq!(token.as_str(), "TID-2024-0042");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(IdentityToken::parse(""), Err(EmptyToken));
        assert_eq!(IdentityToken::parse("   \t "), Err(EmptyToken));
    }
}
