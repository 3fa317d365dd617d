//! Explicit per-request context.
//!
//! Authorization and audit calls never reach into a framework-global request
//! state; callers resolve identity once at the boundary and pass it down.

use crate::id::{TenantId, UserId};

/// Identity and client metadata for one inbound request or action.
///
/// `user_id`/`tenant_id` are optional: system-initiated work runs without an
/// authenticated user, and a user browsing their personal workspace has no
/// active organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Option<UserId>,
    pub tenant_id: Option<TenantId>,
    pub client_ip: String,
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Context with no authenticated identity (system/background work).
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            tenant_id: None,
            client_ip: "unknown".to_string(),
            user_agent: None,
        }
    }

    /// Context for a user acting within an organization.
    pub fn authenticated(user_id: UserId, tenant_id: TenantId) -> Self {
        Self {
            user_id: Some(user_id),
            tenant_id: Some(tenant_id),
            ..Self::anonymous()
        }
    }

    /// Context for a user acting outside any organization (personal workspace).
    pub fn personal(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::anonymous()
        }
    }

    pub fn with_client(mut self, client_ip: impl Into<String>, user_agent: Option<String>) -> Self {
        self.client_ip = client_ip.into();
        self.user_agent = user_agent;
        self
    }
}

/// Resolve the client IP from proxy headers.
///
/// Precedence: first entry of `X-Forwarded-For`, then `X-Real-IP`, then the
/// CDN connecting-ip header. Empty values are skipped; `"unknown"` otherwise.
pub fn resolve_client_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    connecting_ip: Option<&str>,
) -> String {
    if let Some(list) = forwarded_for {
        // Forwarded-for is a comma-separated chain; the first hop is the client.
        if let Some(first) = list.split(',').map(str::trim).find(|part| !part.is_empty()) {
            return first.to_string();
        }
    }

    for candidate in [real_ip, connecting_ip].into_iter().flatten() {
        let candidate = candidate.trim();
        if !candidate.is_empty() {
            return candidate.to_string();
        }
    }

    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let ip = resolve_client_ip(Some("203.0.113.7, 10.0.0.1"), Some("10.0.0.2"), None);
        assert_eq!(ip, "203.0.113.7");
    }

    #[test]
    fn empty_forwarded_for_falls_through() {
        let ip = resolve_client_ip(Some("  "), Some("198.51.100.4"), None);
        assert_eq!(ip, "198.51.100.4");

        let ip = resolve_client_ip(None, None, Some("192.0.2.9"));
        assert_eq!(ip, "192.0.2.9");
    }

    #[test]
    fn no_headers_resolves_unknown() {
        assert_eq!(resolve_client_ip(None, None, None), "unknown");
    }

    #[test]
    fn anonymous_context_has_no_identity() {
        let ctx = RequestContext::anonymous();
        assert!(ctx.user_id.is_none());
        assert!(ctx.tenant_id.is_none());
        assert_eq!(ctx.client_ip, "unknown");
    }
}
