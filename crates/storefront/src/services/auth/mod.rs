//! Authentication service.
//!
//! Wraps the identity provider with the storefront's form checks and keeps
//! the `userprofiles/{uid}` mirror document up to date after each auth event.

mod error;

pub use error::{AuthError, AuthFlow};

use chrono::Utc;
use elida_core::ProfileMirror;
use elida_core::validation::{
    validate_display_name, validate_reset, validate_sign_in, validate_sign_up,
};
use secrecy::SecretString;
use tracing::instrument;

use crate::firebase::{DocumentStore, GoogleAuthStart, IdentityProvider};
use crate::models::CurrentUser;

/// Collection holding the profile mirror documents.
pub const PROFILES: &str = "userprofiles";

/// Authentication service.
pub struct AuthService<'a> {
    identity: &'a dyn IdentityProvider,
    store: &'a dyn DocumentStore,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(identity: &'a dyn IdentityProvider, store: &'a dyn DocumentStore) -> Self {
        Self { identity, store }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Validation errors for blank fields, otherwise the provider's answer.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let email = email.trim();
        validate_sign_in(email, password)?;

        let session = self
            .identity
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| AuthError::from_identity(AuthFlow::SignIn, e))?;
        let user = CurrentUser::from_auth(session, Utc::now());

        self.mirror(&user, ProfileMirror::signed_in(&user.email, Utc::now()))
            .await;
        Ok(user)
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Validation errors (blank fields, short password, mismatch) before any
    /// network call, otherwise the provider's answer.
    #[instrument(skip(self, password, confirm))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<CurrentUser, AuthError> {
        let email = email.trim();
        validate_sign_up(email, password, confirm)?;

        let session = self
            .identity
            .sign_up(email, password)
            .await
            .map_err(|e| AuthError::from_identity(AuthFlow::SignUp, e))?;
        let user = CurrentUser::from_auth(session, Utc::now());

        self.mirror(&user, ProfileMirror::signed_up(&user.email, Utc::now()))
            .await;
        Ok(user)
    }

    /// Begin a Google sign-in returning to `continue_uri`.
    ///
    /// # Errors
    ///
    /// Fails if the provider rejects the return URL's domain or is down.
    #[instrument(skip(self))]
    pub async fn start_google(&self, continue_uri: &str) -> Result<GoogleAuthStart, AuthError> {
        self.identity
            .start_google_sign_in(continue_uri)
            .await
            .map_err(|e| AuthError::from_identity(AuthFlow::Google, e))
    }

    /// Complete a Google sign-in from the callback URL.
    ///
    /// # Errors
    ///
    /// Fails if the provider rejects the callback.
    #[instrument(skip(self, request_uri, session_id))]
    pub async fn finish_google(
        &self,
        request_uri: &str,
        session_id: &str,
    ) -> Result<CurrentUser, AuthError> {
        let session = self
            .identity
            .finish_google_sign_in(request_uri, session_id)
            .await
            .map_err(|e| AuthError::from_identity(AuthFlow::Google, e))?;
        let user = CurrentUser::from_auth(session, Utc::now());

        let mirror = ProfileMirror::google(&user.email, user.display_name.as_deref(), Utc::now());
        self.mirror(&user, mirror).await;
        Ok(user)
    }

    /// Send a password reset email.
    ///
    /// # Errors
    ///
    /// Validation error for a blank email, otherwise the provider's answer.
    #[instrument(skip(self))]
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim();
        validate_reset(email)?;

        self.identity
            .send_password_reset(email)
            .await
            .map_err(|e| AuthError::from_identity(AuthFlow::PasswordReset, e))
    }

    /// Change the signed-in user's display name.
    ///
    /// # Errors
    ///
    /// Validation error for a blank name, otherwise the provider's answer.
    #[instrument(skip(self, user), fields(uid = %user.uid))]
    pub async fn update_profile(
        &self,
        user: &mut CurrentUser,
        display_name: &str,
    ) -> Result<(), AuthError> {
        let display_name = display_name.trim();
        validate_display_name(display_name)?;

        self.identity
            .update_display_name(&user.id_token(), display_name)
            .await
            .map_err(|e| AuthError::from_identity(AuthFlow::Profile, e))?;
        user.display_name = Some(display_name.to_owned());

        self.mirror(user, ProfileMirror::renamed(display_name, Utc::now()))
            .await;
        Ok(())
    }

    /// Replace an expired ID token.
    ///
    /// # Errors
    ///
    /// Fails when the refresh token is no longer accepted.
    #[instrument(skip(self, user), fields(uid = %user.uid))]
    pub async fn refresh(&self, user: &mut CurrentUser) -> Result<(), AuthError> {
        let tokens = self
            .identity
            .refresh(&user.refresh_token())
            .await
            .map_err(|e| AuthError::from_identity(AuthFlow::Refresh, e))?;
        user.apply_refresh(tokens, Utc::now());
        Ok(())
    }

    /// Merge fields into the user's profile mirror. Failures are logged only.
    async fn mirror(&self, user: &CurrentUser, mirror: ProfileMirror) {
        let token: SecretString = user.id_token();
        let fields = mirror.field_paths().join(",");
        if let Err(e) = self
            .store
            .merge(PROFILES, user.uid.as_str(), mirror.into_fields(), Some(&token))
            .await
        {
            tracing::warn!(uid = %user.uid, fields, error = %e, "Profile mirror write failed");
        }
    }
}
