//! Errors returned by the Firebase clients.

use std::fmt;

use thiserror::Error;

/// A request to a backend service failed.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The response did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Error code reported by the identity provider.
///
/// The REST API reports failures as `{"error": {"message": "CODE : detail"}}`.
/// Only the code is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorCode {
    EmailExists,
    EmailNotFound,
    InvalidPassword,
    InvalidLoginCredentials,
    InvalidEmail,
    WeakPassword,
    UserDisabled,
    UserNotFound,
    TooManyAttempts,
    UnauthorizedDomain,
    InvalidIdpResponse,
    InvalidIdToken,
    TokenExpired,
    InvalidRefreshToken,
    OperationNotAllowed,
    /// Any code not listed above.
    Other(String),
}

impl ProviderErrorCode {
    /// Parse the `message` field of an identity error body.
    #[must_use]
    pub fn parse(message: &str) -> Self {
        let code = message
            .split(':')
            .next()
            .unwrap_or_default()
            .trim();
        match code {
            "EMAIL_EXISTS" => Self::EmailExists,
            "EMAIL_NOT_FOUND" => Self::EmailNotFound,
            "INVALID_PASSWORD" => Self::InvalidPassword,
            "INVALID_LOGIN_CREDENTIALS" => Self::InvalidLoginCredentials,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "USER_DISABLED" => Self::UserDisabled,
            "USER_NOT_FOUND" => Self::UserNotFound,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "UNAUTHORIZED_DOMAIN" | "INVALID_CONTINUE_URI" => Self::UnauthorizedDomain,
            "INVALID_IDP_RESPONSE" => Self::InvalidIdpResponse,
            "INVALID_ID_TOKEN" => Self::InvalidIdToken,
            "TOKEN_EXPIRED" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => Self::TokenExpired,
            "INVALID_REFRESH_TOKEN" | "INVALID_GRANT_TYPE" | "MISSING_REFRESH_TOKEN" => {
                Self::InvalidRefreshToken
            }
            "OPERATION_NOT_ALLOWED" => Self::OperationNotAllowed,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire form of the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::EmailExists => "EMAIL_EXISTS",
            Self::EmailNotFound => "EMAIL_NOT_FOUND",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::InvalidLoginCredentials => "INVALID_LOGIN_CREDENTIALS",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::UserDisabled => "USER_DISABLED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::TooManyAttempts => "TOO_MANY_ATTEMPTS_TRY_LATER",
            Self::UnauthorizedDomain => "UNAUTHORIZED_DOMAIN",
            Self::InvalidIdpResponse => "INVALID_IDP_RESPONSE",
            Self::InvalidIdToken => "INVALID_ID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::OperationNotAllowed => "OPERATION_NOT_ALLOWED",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An identity operation failed.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider refused the request.
    #[error("identity provider refused: {0}")]
    Provider(ProviderErrorCode),

    /// The provider could not be reached or answered garbage.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl IdentityError {
    /// The provider's error code, if the provider refused the request.
    #[must_use]
    pub const fn code(&self) -> Option<&ProviderErrorCode> {
        match self {
            Self::Provider(code) => Some(code),
            Self::Backend(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_detail() {
        assert_eq!(
            ProviderErrorCode::parse("WEAK_PASSWORD : Password should be at least 6 characters"),
            ProviderErrorCode::WeakPassword
        );
        assert_eq!(
            ProviderErrorCode::parse("INVALID_LOGIN_CREDENTIALS"),
            ProviderErrorCode::InvalidLoginCredentials
        );
    }

    #[test]
    fn test_parse_unknown_code_is_kept() {
        let code = ProviderErrorCode::parse("QUOTA_EXCEEDED : try later");
        assert_eq!(code, ProviderErrorCode::Other("QUOTA_EXCEEDED".to_string()));
        assert_eq!(code.to_string(), "QUOTA_EXCEEDED");
    }

    #[test]
    fn test_continue_uri_counts_as_unauthorized_domain() {
        assert_eq!(
            ProviderErrorCode::parse("INVALID_CONTINUE_URI"),
            ProviderErrorCode::UnauthorizedDomain
        );
    }
}
