//! Session authorization
//!
//! Authentication success alone is not sufficient: the console additionally
//! requires a directory record with a teacher or admin role. Anything less
//! signs the freshly-created platform session back out before returning.

use crate::error::ConsoleError;
use coursedoc_backend::{AuthProvider, AuthUser, BackendError, DataStore};
use coursedoc_model::Role;
use std::sync::Arc;

/// An authenticated and authorized console operator
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    /// Platform identifier
    pub uid: String,
    /// Sign-in email
    pub email: String,
    /// Display name after directory fallback resolution
    pub display_name: String,
    /// Directory role (always teacher or admin here)
    pub role: Role,
}

/// Sign-in and sign-out against the provider plus the directory role check
#[derive(Clone)]
pub struct SessionService {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DataStore>,
}

impl SessionService {
    /// Create the service
    #[inline]
    #[must_use]
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn DataStore>) -> Self {
        Self { auth, store }
    }

    /// Sign in and authorize a console operator
    ///
    /// The directory record is located by email first (directory keys are
    /// conventionally email-based), then by platform uid.
    ///
    /// # Errors
    /// - [`ConsoleError::InvalidCredentials`] on a rejected password
    /// - [`ConsoleError::UnknownUser`] when no directory record matches;
    ///   the platform session is signed out first
    /// - [`ConsoleError::NotAuthorized`] when the role is not staff; the
    ///   platform session is signed out first
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthorizedUser, ConsoleError> {
        let user = self.auth.sign_in(email, password).await.map_err(|e| match e {
            BackendError::InvalidCredentials => ConsoleError::InvalidCredentials,
            other => ConsoleError::Backend(other),
        })?;

        let users = self.store.list_users().await?;
        let record = users
            .iter()
            .find(|u| u.email.as_deref() == Some(user.email.as_str()))
            .or_else(|| users.iter().find(|u| u.uid.as_deref() == Some(user.uid.as_str())))
            .cloned();

        let Some(record) = record else {
            tracing::warn!(email = %user.email, "sign-in without directory record");
            self.force_sign_out(&user).await;
            return Err(ConsoleError::UnknownUser(user.email));
        };

        let normalized = record.normalize();
        if !normalized.role.is_staff() {
            tracing::warn!(email = %user.email, role = ?normalized.role, "sign-in denied");
            self.force_sign_out(&user).await;
            return Err(ConsoleError::NotAuthorized);
        }

        tracing::info!(email = %user.email, role = ?normalized.role, "operator signed in");
        Ok(AuthorizedUser {
            uid: user.uid,
            email: user.email,
            display_name: normalized.name,
            role: normalized.role,
        })
    }

    /// Sign the operator out
    ///
    /// # Errors
    /// Propagates backend failure from the provider.
    pub async fn sign_out(&self, user: &AuthorizedUser) -> Result<(), ConsoleError> {
        let auth_user = AuthUser {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: Some(user.display_name.clone()),
        };
        self.auth.sign_out(&auth_user).await?;
        tracing::info!(email = %user.email, "operator signed out");
        Ok(())
    }

    async fn force_sign_out(&self, user: &AuthUser) {
        if let Err(e) = self.auth.sign_out(user).await {
            tracing::warn!("forced sign-out failed: {e}");
        }
    }
}
