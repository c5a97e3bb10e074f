//! The access gate, applied before any file is downloaded.

use {
    printrelay_common::types::Principal,
    tracing::{debug, error, info, warn},
};

pub use printrelay_config::AuthorizationPolicy;

/// Reason a principal was turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("user not on allowlist")]
    NotOnAllowlist,
    /// The configured policy could not be understood; nobody is admitted.
    #[error("authorization policy is malformed")]
    PolicyIntegrity,
}

/// Decide whether `principal` may use the relay.
pub fn authorize(principal: Principal, policy: &AuthorizationPolicy) -> Result<(), AccessDenied> {
    match policy {
        AuthorizationPolicy::Unrestricted => {
            info!(%principal, "no allowlist configured, access granted");
            Ok(())
        },
        AuthorizationPolicy::Allowlist(ids) => {
            if ids.contains(&principal) {
                debug!(%principal, "access granted");
                Ok(())
            } else {
                warn!(%principal, "access denied: not on allowlist");
                Err(AccessDenied::NotOnAllowlist)
            }
        },
        AuthorizationPolicy::Malformed { invalid } => {
            error!(%principal, ?invalid, "access denied: allowlist contains invalid ids");
            Err(AccessDenied::PolicyIntegrity)
        },
    }
}
