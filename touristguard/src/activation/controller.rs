//! Permission & Activation Controller.
//!
//! Owns the one-time activation transition and the single active session.
//!
//! # Activation Order
//!
//! 1. Parse the identifier (`InvalidInput`)
//! 2. Optionally validate it remotely (`UnknownIdentity`, `ValidationUnavailable`)
//! 3. Foreground permission, then background permission (`PermissionDenied`)
//! 4. Stop any previous session
//! 5. Persist the token
//! 6. Start tracking (`TrackingStartFailed`, previous token restored)
//!
//! Steps 1-3 leave no trace: no token is written and no session started.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::error::ActivationError;
use super::validator::{IdentityValidator, TouristProfile, ValidationError};
use crate::delivery::LocationUplink;
use crate::identity::{IdentityStore, IdentityToken};
use crate::location::LocationSource;
use crate::permissions::{PermissionGateway, PermissionScope};
use crate::session::{SessionError, SessionHandle, SessionSummary, TrackingSessionController};

/// Result of [`ActivationController::resume`].
#[derive(Debug)]
pub enum ResumeOutcome {
    /// A session was started for the stored identity.
    Resumed(SessionHandle),
    /// A session for the stored identity was already running.
    AlreadyRunning(SessionHandle),
    /// No identity is stored; activation is required.
    NotActivated,
}

/// Activation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationOptions {
    /// Look the identifier up remotely before accepting it.
    pub validate_identity: bool,
}

impl Default for ActivationOptions {
    fn default() -> Self {
        Self {
            validate_identity: true,
        }
    }
}

/// Gatekeeper for tracking sessions.
///
/// At most one session exists at a time. Activating a new identity stops
/// the previous session before the new token is installed.
pub struct ActivationController<V, P, S, U> {
    validator: V,
    permissions: P,
    store: Arc<dyn IdentityStore>,
    sessions: TrackingSessionController<S, U>,
    options: ActivationOptions,
    active: Mutex<Option<SessionHandle>>,
}

impl<V, P, S, U> ActivationController<V, P, S, U>
where
    V: IdentityValidator,
    P: PermissionGateway,
    S: LocationSource + 'static,
    U: LocationUplink + 'static,
{
    pub fn new(
        validator: V,
        permissions: P,
        store: Arc<dyn IdentityStore>,
        sessions: TrackingSessionController<S, U>,
        options: ActivationOptions,
    ) -> Self {
        Self {
            validator,
            permissions,
            store,
            sessions,
            options,
            active: Mutex::new(None),
        }
    }

    /// Activate tracking for `raw_id`.
    pub async fn activate(&self, raw_id: &str) -> Result<SessionHandle, ActivationError> {
        let token = IdentityToken::parse(raw_id).map_err(|_| ActivationError::InvalidInput)?;

        let profile = if self.options.validate_identity {
            Some(self.validate(&token).await?)
        } else {
            None
        };

        self.ensure_permissions().await?;

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            tracing::info!(
                previous = %previous.identity(),
                next = %token,
                "Re-activation, stopping previous session"
            );
            stop_session(&previous).await;
        }

        let previous_token = match self.store.load() {
            Ok(previous) => previous,
            Err(e) => {
                tracing::warn!(error = %e, "Stored identity unreadable, replacing it");
                None
            }
        };
        self.store.save(&token)?;

        let handle = match self.sessions.start(token.clone()).await {
            Ok(handle) => handle.with_profile(profile),
            Err(e) => {
                self.roll_back(previous_token.as_ref());
                return Err(ActivationError::TrackingStartFailed(e));
            }
        };

        tracing::info!(identity = %token, "Activation complete");
        *active = Some(handle.clone());
        Ok(handle)
    }

    /// Start tracking for the stored identity, if there is one.
    ///
    /// The identity is not re-validated remotely, but permissions are checked
    /// again since they may have been revoked while the process was not running.
    pub async fn resume(&self) -> Result<ResumeOutcome, ActivationError> {
        let Some(token) = self.store.load()? else {
            tracing::debug!("No stored identity, activation required");
            return Ok(ResumeOutcome::NotActivated);
        };

        let mut active = self.active.lock().await;
        if let Some(handle) = active.as_ref() {
            if handle.identity() == &token && handle.state().is_tracking() {
                return Ok(ResumeOutcome::AlreadyRunning(handle.clone()));
            }
        }

        self.ensure_permissions().await?;

        if let Some(previous) = active.take() {
            stop_session(&previous).await;
        }

        let handle = self
            .sessions
            .start(token.clone())
            .await
            .map_err(ActivationError::TrackingStartFailed)?;

        tracing::info!(identity = %token, "Tracking resumed for stored identity");
        *active = Some(handle.clone());
        Ok(ResumeOutcome::Resumed(handle))
    }

    /// Stop the active session, keeping the stored identity.
    pub async fn stop(&self) -> Result<Option<SessionSummary>, SessionError> {
        let handle = self.active.lock().await.take();
        match handle {
            Some(handle) => handle.stop().await.map(Some),
            None => Ok(None),
        }
    }

    /// Stop any session and delete the stored identity.
    pub async fn reset(&self) -> Result<Option<SessionSummary>, ActivationError> {
        let mut active = self.active.lock().await;
        let summary = match active.take() {
            Some(handle) => stop_session(&handle).await,
            None => None,
        };

        self.store.clear()?;
        tracing::info!("Identity reset, tracking disabled");
        Ok(summary)
    }

    /// The running session, if any.
    pub async fn active_session(&self) -> Option<SessionHandle> {
        self.active.lock().await.clone()
    }

    /// The durably stored identity.
    pub fn stored_identity(&self) -> Result<Option<IdentityToken>, ActivationError> {
        Ok(self.store.load()?)
    }

    async fn validate(&self, token: &IdentityToken) -> Result<TouristProfile, ActivationError> {
        match self.validator.validate(token).await {
            Ok(profile) => {
                tracing::debug!(identity = %token, name = ?profile.display_name, "Identity validated");
                Ok(profile)
            }
            Err(ValidationError::Unknown) => Err(ActivationError::UnknownIdentity(token.clone())),
            Err(ValidationError::Unavailable(reason)) => {
                Err(ActivationError::ValidationUnavailable(reason))
            }
        }
    }

    /// Put the store back the way it was before a failed activation.
    fn roll_back(&self, previous: Option<&IdentityToken>) {
        let restored = match previous {
            Some(previous) => self.store.save(previous),
            None => self.store.clear(),
        };
        if let Err(e) = restored {
            tracing::warn!(error = %e, "Failed to roll back stored identity");
        }
    }

    /// Foreground first, then background. Stops at the first refusal.
    async fn ensure_permissions(&self) -> Result<(), ActivationError> {
        for scope in [PermissionScope::Foreground, PermissionScope::Background] {
            let granted = match self.permissions.request(scope).await {
                Ok(status) => status.is_granted(),
                Err(e) => {
                    tracing::warn!(error = %e, "Permission request failed");
                    false
                }
            };
            if !granted {
                tracing::warn!(%scope, "Location permission denied");
                return Err(ActivationError::PermissionDenied { scope });
            }
        }
        Ok(())
    }
}

/// Stop a session, logging rather than propagating failures.
async fn stop_session(handle: &SessionHandle) -> Option<SessionSummary> {
    match handle.stop().await {
        Ok(summary) => Some(summary),
        Err(e) => {
            tracing::warn!(identity = %handle.identity(), error = %e, "Failed to stop session cleanly");
            None
        }
    }
}
