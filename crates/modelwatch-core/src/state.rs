//! Session lifecycle states.

/// The closed set of states a session can be in.
///
/// A session is created in `Initializing`, reaches `Anonymous` or
/// `Authenticated` after the one-time restore step, and afterwards moves
/// only through the session manager's operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// Restoring a persisted credential at startup.
    Initializing,
    /// No credential held.
    Anonymous,
    /// A login attempt is in flight.
    Authenticating,
    /// Identity and credential are both present.
    Authenticated,
}

impl SessionStatus {
    /// True while the session outcome is not yet known: during the initial
    /// restore and while a login attempt is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionStatus::Initializing | SessionStatus::Authenticating)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated)
    }
}
