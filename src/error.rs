//! Error taxonomy for the authorization and recommendation pipeline.
//!
//! Every failure a pipeline stage can produce is a variant of [`Error`]. The
//! [`ErrorCategory`] of a variant decides what the controller does with it:
//! authentication failures wipe the credential store, data-availability
//! failures keep the user signed in, transport failures are retryable.

/// Coarse classification used by the controller and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The stored credential (or the attempt to obtain one) is unusable.
    Authentication,
    /// The service answered, but there was nothing to work with.
    DataAvailability,
    /// Network or unexpected upstream failure. Retry by running again.
    Transport,
    /// Local problems: configuration, storage, concurrent runs, bad input.
    Local,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("authorization state does not match the stored nonce")]
    StateMismatch,
    #[error("redirect carried neither an access token nor an authorization code")]
    MissingCredential,
    #[error("authorization server rejected the request: {0}")]
    AuthorizationDenied(String),
    #[error("no access token stored")]
    TokenAbsent,
    #[error("access token is invalid or expired")]
    TokenInvalid,
    #[error("access token was rejected while fetching {0}")]
    AuthExpired(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {status} from {endpoint}")]
    Api { status: u16, endpoint: String },
    #[error("no listening history for the requested window")]
    EmptyHistory,
    #[error("no seed tracks to build a recommendation from")]
    InsufficientSeeds,
    #[error("recommendation response contained no tracks")]
    NoRecommendation,
    #[error("another run is already in progress")]
    Busy,
    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(String),
    #[error("credential store error: {0}")]
    Store(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::StateMismatch
            | Error::MissingCredential
            | Error::AuthorizationDenied(_)
            | Error::TokenInvalid
            | Error::AuthExpired(_) => ErrorCategory::Authentication,
            Error::EmptyHistory | Error::InsufficientSeeds | Error::NoRecommendation => {
                ErrorCategory::DataAvailability
            }
            Error::Transport(_) | Error::Api { .. } => ErrorCategory::Transport,
            Error::TokenAbsent
            | Error::Busy
            | Error::InvalidPhoneNumber(_)
            | Error::Store(_)
            | Error::Config(_) => ErrorCategory::Local,
        }
    }

    /// Whether this failure must wipe stored credentials.
    pub fn is_auth_failure(&self) -> bool {
        self.category() == ErrorCategory::Authentication
    }

    /// The single notification shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Error::StateMismatch => {
                "There was a security issue with your Spotify login. Please run `dailysong auth` again.".into()
            }
            Error::MissingCredential | Error::AuthorizationDenied(_) => {
                "Spotify did not grant access. Please run `dailysong auth` again.".into()
            }
            Error::TokenAbsent => "You are not connected to Spotify. Run `dailysong auth` first.".into(),
            Error::TokenInvalid | Error::AuthExpired(_) => {
                "Your Spotify session has expired. Please run `dailysong auth` again.".into()
            }
            Error::Transport(_) | Error::Api { .. } => {
                "Could not reach Spotify. Please try again.".into()
            }
            Error::EmptyHistory => {
                "Not enough listening history yet. Listen to some more music and try again.".into()
            }
            Error::InsufficientSeeds => {
                "Your listening history has no usable tracks to base a recommendation on.".into()
            }
            Error::NoRecommendation => "Spotify had no recommendation for you right now. Try again.".into(),
            Error::Busy => "A recommendation is already being prepared.".into(),
            Error::InvalidPhoneNumber(reason) => format!("Invalid phone number: {}", reason),
            Error::Store(e) => format!("Cannot access local credential storage: {}", e),
            Error::Config(e) => format!("Configuration problem: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
