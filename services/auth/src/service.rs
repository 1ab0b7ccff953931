//! Session management against the identity store

use std::sync::Arc;

use common::identity::{Identity, IdentityProvider, IdentityUpdate, Session, SignUp, USERNAME_KEY};
use common::store::Record;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::error::{AuthError, AuthResult};
use crate::validation::{
    email_local_part, validate_credentials, validate_email, validate_password, validate_username,
};

/// Authentication service for login, registration and session lookups
#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
}

fn rejected(message: String) -> AuthError {
    error!("Rejected auth request: {}", message);
    AuthError::Validation(message)
}

impl AuthService {
    /// Create a new auth service
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    /// Underlying identity provider
    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    /// Sign in with email and password; the session becomes the active one
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<Session> {
        validate_credentials(email, password).map_err(rejected)?;

        match self.identity.sign_in_with_password(email, password).await {
            Ok(session) => {
                info!("Login successful: {}", email);
                Ok(session)
            }
            Err(e) => {
                error!("Login failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Create an account; the username defaults to the email's local part
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> AuthResult<SignUp> {
        validate_email(email).map_err(rejected)?;
        validate_password(password).map_err(rejected)?;

        let username = match username.filter(|u| !u.trim().is_empty()) {
            Some(name) => {
                validate_username(name).map_err(rejected)?;
                name.to_string()
            }
            None => email_local_part(email).to_string(),
        };

        let mut metadata = Record::new();
        metadata.insert(USERNAME_KEY.to_string(), Value::String(username));

        match self.identity.sign_up(email, password, metadata).await {
            Ok(signed_up) => {
                info!(
                    "Registration successful: {}",
                    signed_up
                        .user
                        .as_ref()
                        .and_then(|u| u.email.as_deref())
                        .unwrap_or(email)
                );
                Ok(signed_up)
            }
            Err(e) => {
                error!("Registration failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// End the active session
    pub async fn logout(&self) -> AuthResult<()> {
        match self.identity.sign_out().await {
            Ok(()) => {
                info!("Logout successful");
                Ok(())
            }
            Err(e) => {
                error!("Logout failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Identity behind the active session; lookup failures degrade to `None`
    pub async fn get_current_user(&self) -> Option<Identity> {
        match self.identity.user().await {
            Ok(user) => user,
            Err(e) => {
                error!("Failed to get current user: {}", e);
                None
            }
        }
    }

    /// Active session, refreshed if expired; lookup failures degrade to `None`
    pub async fn check_session(&self) -> Option<Session> {
        match self.identity.session().await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to check session: {}", e);
                None
            }
        }
    }

    /// Update the signed-in identity
    #[instrument(skip_all)]
    pub async fn update_user(&self, update: IdentityUpdate) -> AuthResult<Identity> {
        if let Some(email) = &update.email {
            validate_email(email).map_err(rejected)?;
        }
        if let Some(password) = &update.password {
            validate_password(password).map_err(rejected)?;
        }

        match self.identity.update_user(update).await {
            Ok(user) => {
                info!("User updated: {}", user.id);
                Ok(user)
            }
            Err(e) => {
                error!("Failed to update user: {}", e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::StoreError;
    use common::identity::memory::MemoryIdentity;
    use common::store::disconnected::Disconnected;
    use tokio_test::{assert_err, assert_ok};

    const PASSWORD: &str = "TestPassword123!";

    fn service() -> (AuthService, Arc<MemoryIdentity>) {
        let identity = Arc::new(MemoryIdentity::new());
        (AuthService::new(identity.clone()), identity)
    }

    #[tokio::test]
    async fn register_defaults_username_to_email_local_part() {
        let (auth, _) = service();
        let signed_up = auth
            .register("moviebuff@example.com", PASSWORD, None)
            .await
            .unwrap();

        let user = signed_up.user.unwrap();
        assert_eq!(user.username(), Some("moviebuff"));
    }

    #[tokio::test]
    async fn register_keeps_explicit_username() {
        let (auth, _) = service();
        let signed_up = auth
            .register("test@example.com", PASSWORD, Some("TestUser"))
            .await
            .unwrap();
        assert_eq!(signed_up.user.unwrap().username(), Some("TestUser"));
    }

    #[tokio::test]
    async fn register_accepts_display_names_and_plain_passwords() {
        let (auth, _) = service();
        let signed_up = auth
            .register("quick@example.com", PASSWORD, Some("Test User"))
            .await
            .unwrap();
        assert_eq!(signed_up.user.unwrap().username(), Some("Test User"));

        let signed_up = auth
            .register("plain@example.com", "password123", Some("  "))
            .await
            .unwrap();
        assert_eq!(signed_up.user.unwrap().username(), Some("plain"));
    }

    #[tokio::test]
    async fn invalid_registration_never_reaches_identity_store() {
        let (auth, identity) = service();

        let err = auth.register("nope", PASSWORD, None).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        let err = auth
            .register("test@example.com", "", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        assert_eq!(identity.calls(), 0);
    }

    #[tokio::test]
    async fn login_logout_cycle() {
        let (auth, _) = service();
        assert_ok!(auth.register("test@example.com", PASSWORD, None).await);
        assert_ok!(auth.logout().await);
        assert!(auth.get_current_user().await.is_none());
        assert!(auth.check_session().await.is_none());

        let session = auth.login("test@example.com", PASSWORD).await.unwrap();
        let current = auth.get_current_user().await.unwrap();
        assert_eq!(current.id, session.user.id);
        assert!(auth.check_session().await.is_some());
    }

    #[tokio::test]
    async fn bad_credentials_propagate_backend_message() {
        let (auth, _) = service();
        let err = auth
            .login("ghost@example.com", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Remote(StoreError::Remote { status: 400, .. })));
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn identity_lookups_are_soft() {
        let auth = AuthService::new(Arc::new(Disconnected::new("missing config")));
        assert!(auth.get_current_user().await.is_none());
        assert!(auth.check_session().await.is_none());
        assert_err!(auth.logout().await);
    }

    #[tokio::test]
    async fn update_user_validates_email() {
        let (auth, identity) = service();
        let update = IdentityUpdate {
            email: Some("broken".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            auth.update_user(update).await,
            Err(AuthError::Validation(_))
        ));
        assert_eq!(identity.calls(), 0);
    }
}
