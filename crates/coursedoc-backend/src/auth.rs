//! Auth-provider seam
//!
//! Email/password sign-in against the hosted provider. Authentication alone
//! does not authorize console access; the session layer additionally checks
//! the directory role.

use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identity returned by the auth provider on successful sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// Platform identifier
    pub uid: String,
    /// Email the session signed in with
    pub email: String,
    /// Display name, if the provider has one
    #[serde(default)]
    pub display_name: Option<String>,
}

/// The platform auth provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Sign in with email and password
    ///
    /// # Errors
    /// [`BackendError::InvalidCredentials`] on a rejected password, distinct
    /// from transport failure.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, BackendError>;

    /// Sign the session out
    ///
    /// Also used by the session layer to force-revoke an authenticated but
    /// unauthorized sign-in.
    async fn sign_out(&self, user: &AuthUser) -> Result<(), BackendError>;
}
