use derive_more::{Display, Error};
use reqwest::StatusCode;
use serde::Deserialize;

const MAX_MESSAGE_LENGTH: usize = 300;

#[derive(Debug, Display, Error)]
pub enum ApiError {
    #[display("Request failed: {_0}")]
    Transport(reqwest_middleware::Error),
    #[display("Unable to read response: {_0}")]
    Body(reqwest::Error),
    Unauthorized,
    Forbidden,
    NotFound,
    #[display("API responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[display("Unable to decode response: {_0}")]
    Decode(serde_json::Error),
    #[display("Invalid API url: {_0}")]
    InvalidUrl(url::ParseError),
}

impl From<reqwest_middleware::Error> for ApiError {
    fn from(err: reqwest_middleware::Error) -> Self {
        Self::Transport(err)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Body(err)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    /// Maps a non-success response onto the error taxonomy. JSON bodies of
    /// the form `{"message": ...}` provide the message.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            _ => {
                let message = serde_json::from_str::<ErrorBody>(body)
                    .map(|b| b.message)
                    .unwrap_or_else(|_| body.trim().chars().take(MAX_MESSAGE_LENGTH).collect());
                Self::Status {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }

    /// The API understood the request and refused it, as opposed to the
    /// call failing on the way or the server erroring out.
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Unauthorized | Self::Forbidden | Self::NotFound => true,
            Self::Status { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }

    /// Message the API attached to the failure, if any.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}
