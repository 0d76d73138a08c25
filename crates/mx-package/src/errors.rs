use mx_auth::AuthError;
use thiserror::Error;

/// Package lookup error types
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Invalid content id: {0}")]
    InvalidArgument(String),

    #[error("Authentication required - no usable credentials and sign-in was not completed")]
    AuthenticationRequired,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(#[source] AuthError),

    #[error("Package service returned HTTP {status}")]
    RemoteError { status: reqwest::StatusCode },

    #[error("Malformed package service response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("Server did not find requested package")]
    PackageNotFound { content_id: Option<String> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl From<AuthError> for PackageError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::AuthenticationRequired => Self::AuthenticationRequired,
            other => Self::AuthenticationFailed(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, PackageError>;
