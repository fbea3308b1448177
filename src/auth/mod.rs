//! Admin access gating.
//!
//! Identity (who is signed in) comes from password sessions in `api::auth`.
//! Authorization (who may administer the catalog) is a separate
//! case-insensitive allow-list check, so "not signed in" and "signed in but
//! not permitted" stay distinct all the way to the HTTP layer.

use serde::Serialize;
use std::sync::RwLock;

/// Case-insensitive exact membership test. No wildcards, no domain matching.
pub fn is_allowed(allow_list: &[String], email: &str) -> bool {
    allow_list
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(email))
}

/// Resolved admin access for one identity observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccessState {
    /// No check has resolved yet.
    Unknown,
    /// No authenticated identity.
    Anonymous,
    /// Authenticated, but the email is not on the allow-list.
    Unauthorized { email: String },
    /// Authenticated and allow-listed.
    Authorized { email: String },
}

impl AccessState {
    /// Classify an optional signed-in email against the allow-list.
    pub fn resolve(allow_list: &[String], email: Option<&str>) -> Self {
        match email {
            None => Self::Anonymous,
            Some(email) if is_allowed(allow_list, email) => Self::Authorized {
                email: email.to_string(),
            },
            Some(email) => Self::Unauthorized {
                email: email.to_string(),
            },
        }
    }
}

/// Shared view of the most recently resolved admin access.
///
/// Two independent paths feed it: sign-in/sign-out events as they happen, and
/// a one-time session sweep at startup. Either may resolve first; whichever
/// result arrives later wins, so a slow-resolving stale check cannot clobber
/// a fresher anonymous observation with an outdated authorized one.
#[derive(Debug)]
pub struct AccessGate {
    state: RwLock<AccessState>,
}

impl AccessGate {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(AccessState::Unknown),
        }
    }

    /// Record a resolved observation. Last applied wins.
    pub fn observe(&self, state: AccessState) {
        let mut current = self.state.write().expect("gate lock poisoned");
        if *current != state {
            tracing::debug!(from = ?*current, to = ?state, "Admin access state changed");
        }
        *current = state;
    }

    pub fn state(&self) -> AccessState {
        self.state.read().expect("gate lock poisoned").clone()
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_list() -> Vec<String> {
        vec!["a@x.com".to_string()]
    }

    #[test]
    fn allow_list_match_is_case_insensitive() {
        assert!(is_allowed(&allow_list(), "A@X.com"));
        assert!(is_allowed(&allow_list(), "a@x.com"));
        assert!(!is_allowed(&allow_list(), "b@x.com"));
        // Exact match only: no domain-wide grants
        assert!(!is_allowed(&allow_list(), "other@x.com"));
    }

    #[test]
    fn resolve_classifies_identity() {
        assert_eq!(
            AccessState::resolve(&allow_list(), None),
            AccessState::Anonymous
        );
        assert_eq!(
            AccessState::resolve(&allow_list(), Some("A@X.com")),
            AccessState::Authorized {
                email: "A@X.com".to_string()
            }
        );
        assert_eq!(
            AccessState::resolve(&allow_list(), Some("b@x.com")),
            AccessState::Unauthorized {
                email: "b@x.com".to_string()
            }
        );
    }

    #[test]
    fn gate_starts_unknown() {
        let gate = AccessGate::new();
        assert_eq!(gate.state(), AccessState::Unknown);
    }

    #[test]
    fn later_observation_wins_either_order() {
        // Startup sweep resolves first, sign-out event second
        let gate = AccessGate::new();
        gate.observe(AccessState::Authorized {
            email: "a@x.com".to_string(),
        });
        gate.observe(AccessState::Anonymous);
        assert_eq!(gate.state(), AccessState::Anonymous);

        // Event lands first, stale sweep result must still overwrite only
        // because it resolved later in wall-clock order
        let gate = AccessGate::new();
        gate.observe(AccessState::Anonymous);
        gate.observe(AccessState::Authorized {
            email: "a@x.com".to_string(),
        });
        assert_eq!(
            gate.state(),
            AccessState::Authorized {
                email: "a@x.com".to_string()
            }
        );
    }
}
