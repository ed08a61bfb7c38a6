/*
 * Responsibility
 * - React to authentication outcomes reported by the login service
 * - The only path from the login flow that writes into AttemptThrottle
 */
use std::sync::Arc;

use crate::services::auth::principal::UserPrincipal;
use crate::services::auth::throttle::AttemptThrottle;

/// What the authentication step knew about the caller when it finished.
///
/// Failures carry the raw identifier that was typed in; successes carry the
/// resolved principal. Anything else is ignored.
#[derive(Debug, Clone)]
pub enum AuthSubject {
    Identifier(String),
    Resolved(UserPrincipal),
    Anonymous,
}

#[derive(Debug, Clone)]
pub struct AuthEventBridge {
    throttle: Arc<AttemptThrottle>,
}

impl AuthEventBridge {
    pub fn new(throttle: Arc<AttemptThrottle>) -> Self {
        Self { throttle }
    }

    pub fn on_failure(&self, subject: &AuthSubject) {
        match subject {
            AuthSubject::Identifier(username) => {
                self.throttle.record_failure(username);
            }
            other => tracing::debug!(?other, "ignoring failure event with unexpected subject"),
        }
    }

    pub fn on_success(&self, subject: &AuthSubject) {
        match subject {
            AuthSubject::Resolved(principal) => self.throttle.record_success(&principal.username),
            other => tracing::debug!(?other, "ignoring success event with unexpected subject"),
        }
    }

    /// An already-locked account was matched: its counter is no longer needed.
    pub fn on_locked_account(&self, principal: &UserPrincipal) {
        self.throttle.record_success(&principal.username);
    }
}
