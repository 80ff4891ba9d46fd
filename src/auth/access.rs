//! Superuser / resource-owner authorization decision.

use chrono::{DateTime, Utc};

/// Claims of an already verified credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub account_identity: String,
    /// `None` when the credential carries no superuser claim at all.
    pub super_user: Option<bool>,
    pub expires_at: DateTime<Utc>,
}

impl AccessClaims {
    pub fn is_super_user(&self) -> bool {
        self.super_user == Some(true)
    }
}

/// Which gates an endpoint opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    pub allow_super_user: bool,
    pub allow_own_resource: bool,
}

impl AccessPolicy {
    pub const OWN_RESOURCE_OR_SUPER_USER: AccessPolicy = AccessPolicy {
        allow_super_user: true,
        allow_own_resource: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    SuperUser,
    OwnResource,
    Denied,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, AccessDecision::Denied)
    }
}

/// Decide whether `claims` may act on resources owned by `resource_owner`.
pub fn decide(policy: AccessPolicy, claims: &AccessClaims, resource_owner: &str) -> AccessDecision {
    if policy.allow_super_user && claims.is_super_user() {
        return AccessDecision::SuperUser;
    }
    if policy.allow_own_resource && claims.account_identity == resource_owner {
        return AccessDecision::OwnResource;
    }

    if policy.allow_super_user {
        match claims.super_user {
            None => tracing::debug!(
                account = %claims.account_identity,
                "superuser claim absent"
            ),
            Some(false) => tracing::debug!(
                account = %claims.account_identity,
                "superuser claim is false"
            ),
            Some(true) => {}
        }
    }
    tracing::info!(
        account = %claims.account_identity,
        resource_owner,
        "access denied"
    );
    AccessDecision::Denied
}
