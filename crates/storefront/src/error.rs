//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::firebase::BackendError;
use crate::messages::Notice;
use crate::services::{AuthError, OrderError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Backend(_) | Self::Session(_) | Self::Template(_) | Self::Internal(_) => true,
            Self::Auth(err) => err.is_server_error(),
            Self::Order(err) => matches!(err, OrderError::Backend(_)),
            Self::NotFound(_) | Self::BadRequest(_) | Self::RateLimited => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Session(_) | Self::Template(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) if err.is_server_error() => StatusCode::BAD_GATEWAY,
            Self::Auth(AuthError::InvalidSessionState) => StatusCode::UNAUTHORIZED,
            Self::Auth(_) => StatusCode::BAD_REQUEST,
            Self::Order(err) => match err {
                OrderError::Validation(_) => StatusCode::BAD_REQUEST,
                OrderError::Backend(_) => StatusCode::BAD_GATEWAY,
                OrderError::NotFound => StatusCode::NOT_FOUND,
                OrderError::NotCancellable(_) => StatusCode::CONFLICT,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Text shown to the customer. Internal details never leave the server.
    fn public_message(&self) -> String {
        match self {
            Self::Backend(_) | Self::Order(OrderError::Backend(_)) => {
                Notice::CatalogUnavailable.message().to_string()
            }
            Self::Session(_) | Self::Template(_) | Self::Internal(_) => {
                "Įvyko serverio klaida".to_string()
            }
            Self::Auth(err) => err.notice().message().to_string(),
            Self::Order(OrderError::Validation(err)) => err.to_string(),
            Self::Order(OrderError::NotFound) => "Užsakymas nerastas".to_string(),
            Self::Order(OrderError::NotCancellable(_)) => {
                Notice::OrderNotCancellable.message().to_string()
            }
            Self::NotFound(_) => "Puslapis nerastas".to_string(),
            Self::BadRequest(_) => "Neteisinga užklausa".to_string(),
            Self::RateLimited => "Per daug užklausų. Bandykite vėliau.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a customer action.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use elida_core::{OrderStatus, ValidationError};

    use super::*;
    use crate::firebase::{IdentityError, ProviderErrorCode};
    use crate::services::AuthFlow;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status(AppError::NotFound("x".to_string())), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::BadRequest("x".to_string())), StatusCode::BAD_REQUEST);
        assert_eq!(status(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(AppError::Backend(BackendError::Decode("x".to_string()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(AppError::Order(OrderError::NotCancellable(OrderStatus::Completed))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AppError::Order(OrderError::Validation(ValidationError::EmptyCart))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_refusals_are_client_errors() {
        let err = AppError::Auth(AuthError::from_identity(
            AuthFlow::SignIn,
            IdentityError::Provider(ProviderErrorCode::InvalidLoginCredentials),
        ));
        assert!(!err.is_server_error());
        assert_eq!(err.public_message(), Notice::SignInFailed.message());
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Backend(BackendError::Status {
            status: 403,
            message: "Missing or insufficient permissions.".to_string(),
        });
        assert!(!err.public_message().contains("permissions"));
    }
}
