/// Access gate for the admin API.
///
/// Reads are open to everyone. Writes are granted to exactly one
/// configured identity; any other caller, signed in or not, is read-only.
use std::fmt;

use tracing::warn;

use crate::error::{AdminError, Result};

/// Verified identity of the caller, or none for anonymous visitors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    email: Option<String>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self { email: None }
    }

    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
}

/// Why a write was refused. Only ever surfaced in logs; callers see one
/// uniform rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    Unauthorized,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Unauthenticated => f.write_str("unauthenticated"),
            DenyReason::Unauthorized => f.write_str("unauthorized"),
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub granted: bool,
    pub reason: Option<DenyReason>,
}

impl Decision {
    fn grant() -> Self {
        Self {
            granted: true,
            reason: None,
        }
    }

    fn deny(reason: DenyReason) -> Self {
        Self {
            granted: false,
            reason: Some(reason),
        }
    }
}

/// Single-address allow-list. Swapping this for a role model would mean
/// replacing the gate, not extending it.
#[derive(Debug, Clone)]
pub struct AccessGate {
    allowed_email: String,
}

impl AccessGate {
    pub fn new(allowed_email: impl Into<String>) -> Self {
        Self {
            allowed_email: allowed_email.into(),
        }
    }

    pub fn allowed_email(&self) -> &str {
        &self.allowed_email
    }

    pub fn authorize(&self, principal: &Principal, capability: Capability) -> Decision {
        match (capability, principal.email()) {
            (Capability::Read, _) => Decision::grant(),
            (Capability::Write, None) => Decision::deny(DenyReason::Unauthenticated),
            (Capability::Write, Some(email)) if email == self.allowed_email => Decision::grant(),
            (Capability::Write, Some(_)) => Decision::deny(DenyReason::Unauthorized),
        }
    }

    /// Like [`authorize`](Self::authorize) but turns a denial into an
    /// `AdminError::Auth`, logging the reason.
    pub fn check(&self, principal: &Principal, capability: Capability) -> Result<()> {
        let decision = self.authorize(principal, capability);
        match decision.reason {
            None => Ok(()),
            Some(reason) => {
                warn!(
                    reason = %reason,
                    email = principal.email().unwrap_or("-"),
                    "Write access denied"
                );
                Err(AdminError::Auth(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "owner@example.com";

    #[test]
    fn test_read_always_granted() {
        let gate = AccessGate::new(OWNER);
        assert!(gate.authorize(&Principal::anonymous(), Capability::Read).granted);
        assert!(
            gate.authorize(&Principal::with_email("someone@else.org"), Capability::Read)
                .granted
        );
    }

    #[test]
    fn test_write_requires_exact_match() {
        let gate = AccessGate::new(OWNER);
        assert!(gate.authorize(&Principal::with_email(OWNER), Capability::Write).granted);

        let upper = gate.authorize(&Principal::with_email("OWNER@example.com"), Capability::Write);
        assert_eq!(upper.reason, Some(DenyReason::Unauthorized));
    }

    #[test]
    fn test_deny_reasons() {
        let gate = AccessGate::new(OWNER);
        assert_eq!(
            gate.authorize(&Principal::anonymous(), Capability::Write),
            Decision::deny(DenyReason::Unauthenticated)
        );
        assert_eq!(
            gate.authorize(&Principal::with_email("x@y.z"), Capability::Write),
            Decision::deny(DenyReason::Unauthorized)
        );
    }

    #[test]
    fn test_check_maps_to_auth_error() {
        let gate = AccessGate::new(OWNER);
        let err = gate
            .check(&Principal::anonymous(), Capability::Write)
            .unwrap_err();
        assert!(matches!(err, AdminError::Auth(DenyReason::Unauthenticated)));
        assert!(gate.check(&Principal::with_email(OWNER), Capability::Write).is_ok());
    }
}
