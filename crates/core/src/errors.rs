use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("label must not be empty")]
    EmptyLabel,
    #[error("confidence must be a finite value in [0, 1], got {0}")]
    InvalidConfidence(f64),
    #[error("malformed request body: {0}")]
    MalformedRequest(String),
}

/// Client-facing rejection: the internal message plus the correlation id
/// that ties it to the request's log events.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("bad request: {message}")]
pub struct InterfaceError {
    message: String,
    correlation_id: String,
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        "The request could not be processed. Check inputs and try again."
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

impl DomainError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        InterfaceError { message: self.to_string(), correlation_id: correlation_id.into() }
    }
}
