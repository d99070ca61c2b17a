use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    ValidationGap(String),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationGap(message.into())
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => format!("Could not reach the server ({self})"),
            Self::Server { message, .. } => message.clone(),
            Self::MalformedResponse(_) => format!("Unexpected server reply ({self})"),
            Self::ValidationGap(message) => message.clone(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_keeps_server_text_verbatim() {
        let err = ClientError::server(404, "Template not found");
        assert_eq!(err.user_message(), "Template not found");
        assert_eq!(err.to_string(), "server error (404): Template not found");
    }

    #[test]
    fn validation_gap_reads_as_plain_sentence() {
        let err = ClientError::validation("Select a template first");
        assert_eq!(err.user_message(), "Select a template first");
    }
}
