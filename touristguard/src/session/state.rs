//! Tracking session state machine.
//!
//! ```text
//! Idle --Activate--> Starting --SourceReady--> Running
//!                    Starting --StartFailed--> Idle
//! Running --PermissionRevoked--> Degraded --PermissionRestored--> Running
//! Running | Degraded --Stop--> Stopping --Drained--> Idle
//! ```

use std::fmt;

/// Lifecycle state of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Running,
    /// Running, but the source cannot guarantee background sampling.
    Degraded,
    Stopping,
}

impl SessionState {
    /// Returns true while samples are being forwarded.
    pub fn is_tracking(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::Degraded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Running => "running",
            SessionState::Degraded => "degraded",
            SessionState::Stopping => "stopping",
        }
    }

    /// The state reached from `self` on `event`, or `None` if the event does
    /// not apply in this state.
    pub fn next(self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent as E;
        use SessionState as S;

        match (self, event) {
            (S::Idle, E::Activate) => Some(S::Starting),
            (S::Starting, E::SourceReady) => Some(S::Running),
            (S::Starting, E::StartFailed) => Some(S::Idle),
            (S::Running, E::PermissionRevoked) => Some(S::Degraded),
            (S::Degraded, E::PermissionRestored) => Some(S::Running),
            (S::Running | S::Degraded, E::Stop) => Some(S::Stopping),
            (S::Stopping, E::Drained) => Some(S::Idle),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Activate,
    SourceReady,
    StartFailed,
    /// Permission revoked or any other loss of background capability.
    PermissionRevoked,
    PermissionRestored,
    Stop,
    Drained,
}
