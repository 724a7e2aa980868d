//! Tenant context resolution
//!
//! Every scoped repository and service function takes an explicit `TenantId`.
//! There is no ambient tenant state: a query cannot be expressed without one,
//! so "no tenant bound" is a construction-time error rather than a silent
//! empty result set.

use axum::http::HeaderMap;
use thiserror::Error;

/// Header carrying the tenant identifier on every scoped route
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Errors that can occur while resolving the tenant context
#[derive(Debug, Error, PartialEq)]
pub enum TenantError {
    #[error("Tenant is required: missing {TENANT_HEADER} header")]
    Missing,

    #[error("Tenant is required: tenant id cannot be empty")]
    Empty,
}

/// Validated tenant identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    /// Construct a tenant id, rejecting empty or whitespace-only values
    pub fn new(raw: &str) -> Result<Self, TenantError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TenantError::Empty);
        }
        Ok(TenantId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolve the tenant from the request headers
///
/// Reads the `X-Tenant-ID` header. Missing or empty values are errors; there
/// is no fallback tenant.
pub fn resolve_tenant(headers: &HeaderMap) -> Result<TenantId, TenantError> {
    let value = headers
        .get(TENANT_HEADER)
        .ok_or(TenantError::Missing)?
        .to_str()
        .map_err(|_| TenantError::Empty)?;

    TenantId::new(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_tenant_id_rejects_empty() {
        assert_eq!(TenantId::new(""), Err(TenantError::Empty));
        assert_eq!(TenantId::new("   "), Err(TenantError::Empty));
    }

    #[test]
    fn test_tenant_id_trims_whitespace() {
        let tenant = TenantId::new("  acme ").unwrap();
        assert_eq!(tenant.as_str(), "acme");
    }

    #[test]
    fn test_resolve_tenant_missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(resolve_tenant(&headers), Err(TenantError::Missing));
    }

    #[test]
    fn test_resolve_tenant_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, HeaderValue::from_static("acme"));
        let tenant = resolve_tenant(&headers).unwrap();
        assert_eq!(tenant.as_str(), "acme");
    }

    #[test]
    fn test_resolve_tenant_empty_header() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, HeaderValue::from_static(""));
        assert_eq!(resolve_tenant(&headers), Err(TenantError::Empty));
    }
}
