//! Negotiated per-request options

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::ODataVersion;

/// Read-consistency requested through the `OData-Isolation` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationLevel {
    #[default]
    None,
    Snapshot,
}

impl IsolationLevel {
    /// Header literal for the level (`Snapshot`), as clients send it.
    #[must_use]
    pub fn as_header_value(self) -> &'static str {
        match self {
            IsolationLevel::None => "None",
            IsolationLevel::Snapshot => "Snapshot",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_header_value())
    }
}

/// Verbosity of control information in a response (`odata.metadata`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataLevel {
    None,
    #[default]
    Minimal,
    Full,
}

impl MetadataLevel {
    /// Media type parameter name carrying the metadata level.
    pub const PARAMETER_NAME: &'static str = "odata.metadata";

    /// Lower-case token used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataLevel::None => "none",
            MetadataLevel::Minimal => "minimal",
            MetadataLevel::Full => "full",
        }
    }

    /// Recognize a wire token; comparison is ASCII case-insensitive.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        [MetadataLevel::None, MetadataLevel::Minimal, MetadataLevel::Full]
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(token.trim()))
    }
}

impl fmt::Display for MetadataLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options resolved for a single OData request.
///
/// Built once by [`crate::negotiate`] and never mutated afterwards.
/// `max_version` is always greater than or equal to `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    service_root_uri: String,
    isolation_level: IsolationLevel,
    metadata_level: MetadataLevel,
    version: ODataVersion,
    max_version: ODataVersion,
}

impl RequestOptions {
    #[must_use]
    pub fn new(
        service_root_uri: impl Into<String>,
        isolation_level: IsolationLevel,
        metadata_level: MetadataLevel,
        version: ODataVersion,
        max_version: ODataVersion,
    ) -> Self {
        Self {
            service_root_uri: service_root_uri.into(),
            isolation_level,
            metadata_level,
            version,
            max_version: max_version.max(version),
        }
    }

    /// `scheme://host/base/` of the OData service, always ending in `/`.
    #[must_use]
    pub fn service_root_uri(&self) -> &str {
        &self.service_root_uri
    }

    #[must_use]
    pub fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    #[must_use]
    pub fn metadata_level(&self) -> MetadataLevel {
        self.metadata_level
    }

    /// Version governing how the request is interpreted.
    #[must_use]
    pub fn version(&self) -> ODataVersion {
        self.version
    }

    /// Version governing how the response is rendered.
    #[must_use]
    pub fn max_version(&self) -> ODataVersion {
        self.max_version
    }
}

/// Axum integration: read the options stored by the OData middleware
#[cfg(feature = "axum")]
impl<S> axum::extract::FromRequestParts<S> for RequestOptions
where
    S: Send + Sync,
{
    type Rejection = crate::exception::ODataException;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestOptions>().cloned().ok_or_else(|| {
            crate::exception::ODataException::internal(
                "OData request options not found - OData middleware not configured for this route",
            )
        })
    }
}
