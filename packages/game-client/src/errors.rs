#[derive(Debug)]
pub enum ClientError {
    /// Transport-level failure talking to the session API.
    Http(String),
    /// The session API rejected the request.
    Api { status: u16, message: String },
    /// The relay websocket could not be reached. Non-fatal: the
    /// synchronizer degrades to polling until the relay returns.
    RelayUnavailable(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Http(msg) => write!(f, "HTTP error: {}", msg),
            ClientError::Api { status, message } => {
                write!(f, "API error ({}): {}", status, message)
            }
            ClientError::RelayUnavailable(msg) => {
                write!(f, "Relay unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err.to_string())
    }
}
