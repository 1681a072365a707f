//! Device positioning permissions.
//!
//! Activation requests foreground permission first and background permission
//! second. Both must be granted before any tracking session starts. The
//! platform prompt (or, on a host, a fixed policy) sits behind
//! [`PermissionGateway`].

use std::fmt;
use std::future::Future;

use thiserror::Error;

/// Which positioning permission is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionScope {
    /// Positioning while the app is in the foreground.
    Foreground,
    /// Positioning while the app is backgrounded or suspended.
    Background,
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Foreground => write!(f, "foreground"),
            Self::Background => write!(f, "background"),
        }
    }
}

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user has not answered yet (treated as not granted).
    #[default]
    Undetermined,
}

impl PermissionStatus {
    /// Returns true only for an explicit grant.
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// The platform could not answer a permission request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Permission request for {scope} location failed: {reason}")]
pub struct PermissionError {
    pub scope: PermissionScope,
    pub reason: String,
}

/// Access to the platform's permission prompts.
pub trait PermissionGateway: Send + Sync {
    /// Request (or re-check) the given permission.
    ///
    /// Requesting an already granted permission must return `Granted`
    /// without prompting again.
    fn request(
        &self,
        scope: PermissionScope,
    ) -> impl Future<Output = Result<PermissionStatus, PermissionError>> + Send;
}

/// Fixed permission policy.
///
/// Used by hosts that have no interactive prompt (desktop, CI) and by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPermissions {
    pub foreground: PermissionStatus,
    pub background: PermissionStatus,
}

impl StaticPermissions {
    /// Grant both scopes.
    pub fn granted() -> Self {
        Self {
            foreground: PermissionStatus::Granted,
            background: PermissionStatus::Granted,
        }
    }

    /// Grant foreground only; background is denied.
    pub fn foreground_only() -> Self {
        Self {
            foreground: PermissionStatus::Granted,
            background: PermissionStatus::Denied,
        }
    }

    /// Deny both scopes.
    pub fn denied() -> Self {
        Self {
            foreground: PermissionStatus::Denied,
            background: PermissionStatus::Denied,
        }
    }
}

impl PermissionGateway for StaticPermissions {
    async fn request(&self, scope: PermissionScope) -> Result<PermissionStatus, PermissionError> {
        let status = match scope {
            PermissionScope::Foreground => self.foreground,
            PermissionScope::Background => self.background,
        };
        tracing::debug!(%scope, ?status, "Permission requested");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_permissions() {
        let perms = StaticPermissions::foreground_only();
        assert_eq!(
            perms.request(PermissionScope::Foreground).await,
            Ok(PermissionStatus::Granted)
        );
        assert_eq!(
            perms.request(PermissionScope::Background).await,
            Ok(PermissionStatus::Denied)
        );
    }

    #[test]
    fn test_undetermined_is_not_granted() {
        assert!(!PermissionStatus::Undetermined.is_granted());
        assert!(!PermissionStatus::Denied.is_granted());
        assert!(PermissionStatus::Granted.is_granted());
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(PermissionScope::Background.to_string(), "background");
    }
}
