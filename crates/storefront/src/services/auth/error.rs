//! Authentication error types.

use std::fmt;

use elida_core::ValidationError;
use thiserror::Error;

use crate::firebase::{BackendError, IdentityError, ProviderErrorCode};
use crate::messages::Notice;

/// Which customer action an auth error came from. Decides the wording the
/// customer sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    SignIn,
    SignUp,
    Google,
    PasswordReset,
    Profile,
    Refresh,
}

impl fmt::Display for AuthFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SignIn => "sign-in",
            Self::SignUp => "sign-up",
            Self::Google => "google sign-in",
            Self::PasswordReset => "password reset",
            Self::Profile => "profile update",
            Self::Refresh => "token refresh",
        })
    }
}

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Form input rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The identity provider refused the request.
    #[error("{flow} refused: {code}")]
    Refused {
        flow: AuthFlow,
        code: ProviderErrorCode,
    },

    /// The identity provider could not be reached.
    #[error("{flow} failed: {source}")]
    Backend {
        flow: AuthFlow,
        #[source]
        source: BackendError,
    },

    /// OAuth flow state missing from the session or not matching.
    #[error("invalid session state")]
    InvalidSessionState,
}

impl AuthError {
    /// Attach the flow to an identity error.
    #[must_use]
    pub fn from_identity(flow: AuthFlow, err: IdentityError) -> Self {
        match err {
            IdentityError::Provider(code) => Self::Refused { flow, code },
            IdentityError::Backend(source) => Self::Backend { flow, source },
        }
    }

    /// The notice shown to the customer.
    ///
    /// An unauthorized domain gets its own message in every flow; anything
    /// else the provider says collapses into one message per flow.
    #[must_use]
    pub fn notice(&self) -> Notice {
        let flow = match self {
            Self::Validation(err) => return Notice::from(*err),
            Self::InvalidSessionState => return Notice::GoogleFailed,
            Self::Refused {
                code: ProviderErrorCode::UnauthorizedDomain,
                ..
            } => return Notice::UnauthorizedDomain,
            Self::Refused { flow, .. } | Self::Backend { flow, .. } => *flow,
        };

        match flow {
            AuthFlow::SignIn => Notice::SignInFailed,
            AuthFlow::SignUp => Notice::SignUpFailed,
            AuthFlow::Google => Notice::GoogleFailed,
            AuthFlow::PasswordReset => Notice::ResetFailed,
            AuthFlow::Profile => Notice::ProfileFailed,
            AuthFlow::Refresh => Notice::SessionExpired,
        }
    }

    /// Whether this is our fault rather than the customer's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}
