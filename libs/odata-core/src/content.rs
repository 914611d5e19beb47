//! OData JSON error envelope (pure data model, no HTTP framework dependencies)

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// `{"error": {...}}` body returned for every OData failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ODataErrorContent {
    pub error: ODataError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ODataError {
    /// HTTP status code as a decimal string, e.g. `"415"`.
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ODataErrorDetail>>,
}

/// Additional error item listed under `details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ODataErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ODataErrorContent {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: ODataError {
                code: status.as_u16().to_string(),
                message: message.into(),
                target: None,
                details: None,
            },
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.error.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Vec<ODataErrorDetail>) -> Self {
        self.error.details = Some(details);
        self
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn omits_absent_fields() {
        let content = ODataErrorContent::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, "nope");
        assert_eq!(
            serde_json::to_string(&content).unwrap(),
            r#"{"error":{"code":"415","message":"nope"}}"#
        );
    }

    #[test]
    fn renders_target_and_details() {
        let content = ODataErrorContent::new(StatusCode::BAD_REQUEST, "Invalid request")
            .with_target("OData-Version")
            .with_details(vec![ODataErrorDetail {
                code: "400".to_owned(),
                message: "must be 4.0".to_owned(),
                target: None,
            }]);
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["error"]["target"], "OData-Version");
        assert_eq!(json["error"]["details"][0]["message"], "must be 4.0");
        assert!(json["error"]["details"][0].get("target").is_none());
    }
}
