use std::fmt;

/// Why an authorization or pipeline run ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    StateMismatch,
    MissingCredential,
    Denied(String),
    TokenInvalid,
    AuthExpired,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::StateMismatch => f.write_str("state mismatch"),
            FailureReason::MissingCredential => f.write_str("missing credential"),
            FailureReason::Denied(reason) => write!(f, "denied ({})", reason),
            FailureReason::TokenInvalid => f.write_str("token invalid"),
            FailureReason::AuthExpired => f.write_str("token expired"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    AwaitingRedirect,
    Validating,
    Authenticated,
    Failed(FailureReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// The user was sent to the authorization server.
    RedirectStarted,
    /// A token was committed (or loaded) and is about to be probed.
    TokenReceived,
    ProbeSucceeded,
    Failed(FailureReason),
    /// Acknowledges a failure; the only way out of `Failed`.
    Reset,
    Logout,
}

/// Authorization lifecycle.
///
/// `Failed` only leaves through `Reset` (or `Logout`), and always lands in
/// `Unauthenticated`: nothing retries on the user's behalf.
#[derive(Debug, Clone, Default)]
pub struct AuthMachine {
    state: AuthState,
}

impl AuthMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AuthState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Applies `event` and returns the new state. Events that make no sense
    /// in the current state leave it unchanged.
    pub fn apply(&mut self, event: AuthEvent) -> &AuthState {
        let next = match (&self.state, event) {
            (_, AuthEvent::Logout) => AuthState::Unauthenticated,
            (AuthState::Failed(_), AuthEvent::Reset) => AuthState::Unauthenticated,
            (AuthState::Failed(_), _) => return &self.state,
            (_, AuthEvent::Failed(reason)) => AuthState::Failed(reason),
            (AuthState::Unauthenticated, AuthEvent::RedirectStarted)
            | (AuthState::AwaitingRedirect, AuthEvent::RedirectStarted)
            | (AuthState::Authenticated, AuthEvent::RedirectStarted) => {
                AuthState::AwaitingRedirect
            }
            (_, AuthEvent::TokenReceived) => AuthState::Validating,
            (AuthState::Validating, AuthEvent::ProbeSucceeded) => AuthState::Authenticated,
            _ => return &self.state,
        };

        log::debug!("auth state {:?} -> {:?}", self.state, next);
        self.state = next;
        &self.state
    }

    /// Records a failure and immediately resets, returning the reason.
    pub fn fail(&mut self, reason: FailureReason) -> FailureReason {
        self.apply(AuthEvent::Failed(reason.clone()));
        self.apply(AuthEvent::Reset);
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut m = AuthMachine::new();
        assert_eq!(m.apply(AuthEvent::RedirectStarted), &AuthState::AwaitingRedirect);
        assert_eq!(m.apply(AuthEvent::TokenReceived), &AuthState::Validating);
        assert_eq!(m.apply(AuthEvent::ProbeSucceeded), &AuthState::Authenticated);
    }

    #[test]
    fn test_failed_only_leaves_through_reset() {
        let mut m = AuthMachine::with_state(AuthState::AwaitingRedirect);
        m.apply(AuthEvent::Failed(FailureReason::StateMismatch));
        assert_eq!(m.state(), &AuthState::Failed(FailureReason::StateMismatch));

        assert_eq!(
            m.apply(AuthEvent::RedirectStarted),
            &AuthState::Failed(FailureReason::StateMismatch)
        );
        assert_eq!(
            m.apply(AuthEvent::TokenReceived),
            &AuthState::Failed(FailureReason::StateMismatch)
        );
        assert_eq!(m.apply(AuthEvent::Reset), &AuthState::Unauthenticated);
    }

    #[test]
    fn test_probe_without_validation_is_ignored() {
        let mut m = AuthMachine::new();
        assert_eq!(m.apply(AuthEvent::ProbeSucceeded), &AuthState::Unauthenticated);
    }

    #[test]
    fn test_fail_resets() {
        let mut m = AuthMachine::with_state(AuthState::Authenticated);
        let reason = m.fail(FailureReason::AuthExpired);
        assert_eq!(reason, FailureReason::AuthExpired);
        assert_eq!(m.state(), &AuthState::Unauthenticated);
    }

    #[test]
    fn test_logout_from_anywhere() {
        for state in [
            AuthState::AwaitingRedirect,
            AuthState::Validating,
            AuthState::Authenticated,
            AuthState::Failed(FailureReason::TokenInvalid),
        ] {
            let mut m = AuthMachine::with_state(state);
            assert_eq!(m.apply(AuthEvent::Logout), &AuthState::Unauthenticated);
        }
    }
}
