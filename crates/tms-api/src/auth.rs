//! # Authentication Middleware
//!
//! Static bearer-token authentication with tenant scoping.
//!
//! ## Token Format
//!
//! ```text
//! Bearer operator:{tenant_uuid}:{secret}   — tenant-scoped operator
//! Bearer admin::{secret}                   — cross-tenant administrator
//! Bearer {secret}                          — legacy format (treated as admin)
//! ```
//!
//! The secret is compared in constant time. Every authenticated request
//! gets a [`CallerIdentity`] injected into the request extensions;
//! handlers extract it via `FromRequestParts`. When no token is
//! configured, authentication is disabled and every caller is an
//! unscoped admin — the mode integration tests and local development
//! run in.
//!
//! The inbound SMS webhook and health probes are mounted outside this
//! middleware; an SMS provider cannot hold credentials.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use tms_core::TenantId;

use crate::error::{AppError, ErrorBody, ErrorDetail};

// ── SecretToken ─────────────────────────────────────────────────────────────

/// A bearer secret with constant-time comparison and redacted `Debug`.
#[derive(Clone)]
pub struct SecretToken(String);

impl SecretToken {
    /// Wrap a secret string.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Constant-time equality against a presented secret.
    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretToken([REDACTED])")
    }
}

// ── Role ────────────────────────────────────────────────────────────────────

/// Caller roles, ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Brokerage operator scoped to one tenant.
    Operator,
    /// Cross-tenant administrator.
    Admin,
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The caller's role.
    pub role: Role,
    /// The caller's tenant, for operator-scoped access. `None` for
    /// admins, who operate across tenants.
    pub tenant_id: Option<TenantId>,
}

impl CallerIdentity {
    /// An unscoped admin, used when authentication is disabled.
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            tenant_id: None,
        }
    }

    /// Whether the caller may see resources owned by `tenant`.
    /// Cross-tenant visibility is never granted to operators.
    pub fn can_access_tenant(&self, tenant: TenantId) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Operator => self.tenant_id == Some(tenant),
        }
    }

    /// The tenant new resources are created under. Operators always
    /// create into their own tenant; admins must name one explicitly.
    pub fn creation_tenant(&self, requested: Option<Uuid>) -> Result<TenantId, AppError> {
        match self.role {
            Role::Operator => self
                .tenant_id
                .ok_or_else(|| AppError::Internal("operator token without tenant".to_string())),
            Role::Admin => match self.tenant_id.or(requested.map(TenantId::from_uuid)) {
                Some(tenant) => Ok(tenant),
                None => Err(AppError::Validation(
                    "tenant_id is required for admin-created resources".to_string(),
                )),
            },
        }
    }
}

// ── Token parsing ───────────────────────────────────────────────────────────

/// Auth configuration injected as an extension by the router assembly.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// The configured secret. `None` disables authentication.
    pub token: Option<SecretToken>,
}

/// Parse and verify a presented bearer token against the configured
/// secret, producing the caller identity.
fn verify_bearer(config: &AuthConfig, presented: &str) -> Option<CallerIdentity> {
    let secret = config.token.as_ref()?;

    // New format: {role}:{tenant}:{secret}. Legacy: bare secret.
    let mut parts = presented.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("operator"), Some(tenant), Some(rest)) if secret.matches(rest) => {
            let tenant = Uuid::parse_str(tenant).ok()?;
            Some(CallerIdentity {
                role: Role::Operator,
                tenant_id: Some(TenantId::from_uuid(tenant)),
            })
        }
        (Some("admin"), Some(_), Some(rest)) if secret.matches(rest) => {
            Some(CallerIdentity::admin())
        }
        _ if secret.matches(presented) => Some(CallerIdentity::admin()),
        _ => None,
    }
}

/// Bearer-token middleware for the authenticated API surface.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let config = request.extensions().get::<AuthConfig>().cloned();

    let identity = match config {
        // Authentication disabled.
        None | Some(AuthConfig { token: None }) => Some(CallerIdentity::admin()),
        Some(config) => request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|presented| verify_bearer(&config, presented)),
    };

    match identity {
        Some(identity) => {
            let mut request = request;
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        None => {
            let body = ErrorBody {
                error: ErrorDetail {
                    code: "UNAUTHORIZED".to_string(),
                    message: "missing or invalid bearer token".to_string(),
                    details: None,
                },
            };
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
    }
}

/// Extract the caller identity injected by [`auth_middleware`].
#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("caller identity missing".to_string()))
    }
}
