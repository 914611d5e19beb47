//! Typed OData failure raised by handlers and turned into the error envelope

use http::StatusCode;

use crate::content::ODataErrorContent;
use crate::error::NegotiationError;

/// An error carrying the status code it must be reported with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
#[must_use]
pub struct ODataException {
    status: StatusCode,
    message: String,
    target: Option<String>,
}

impl ODataException {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            target: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PRECONDITION_FAILED, message)
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    #[must_use]
    pub fn to_error_content(&self) -> ODataErrorContent {
        let content = ODataErrorContent::new(self.status, self.message.clone());
        match &self.target {
            Some(target) => content.with_target(target.clone()),
            None => content,
        }
    }
}

impl From<NegotiationError> for ODataException {
    fn from(err: NegotiationError) -> Self {
        Self::new(err.status(), err.to_string())
    }
}

/// Axum integration: status code plus JSON envelope
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ODataException {
    fn into_response(self) -> axum::response::Response {
        let status = self.status;
        let mut resp = axum::Json(self.to_error_content()).into_response();
        *resp.status_mut() = status;
        resp
    }
}
