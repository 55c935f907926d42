//! Identity service port

use async_trait::async_trait;
use shared::{Credentials, Identity, IdentityId, Result};

/// The external identity/authorization service the session consumes.
///
/// Transport failures must surface as `AccessError::Network`; rejected
/// credentials as `AccessError::Authentication`.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Identity behind a previously established credential, if any
    async fn current_identity(&self) -> Result<Option<Identity>>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity>;

    async fn sign_out(&self) -> Result<()>;

    /// Re-fetch an identity with its current role
    async fn identity(&self, id: &IdentityId) -> Result<Identity>;
}
