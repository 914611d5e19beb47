//! Negotiation and configuration errors

use std::fmt;

use http::StatusCode;

use crate::headers::ODATA_ISOLATION;
use crate::options::{IsolationLevel, MetadataLevel};
use crate::version::{ODataVersion, VersionParseError};

/// Where a requested metadata level was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    /// The `odata.metadata` parameter of the `$format` query option.
    FormatQueryOption,
    /// The `odata.metadata` parameter of the `Accept` header.
    AcceptHeader,
}

impl fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataSource::FormatQueryOption => f.write_str("$format query option"),
            MetadataSource::AcceptHeader => f.write_str("Accept header"),
        }
    }
}

/// Stable discriminant of a [`NegotiationError`], for logging and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationErrorKind {
    InvalidIsolationLevel,
    IsolationNotSupported,
    InvalidMetadataLevel,
    MetadataLevelNotSupported,
    UnsupportedMediaType,
    InvalidVersionFormat,
    VersionNotSupported,
}

/// A request whose OData preferences cannot be honoured.
///
/// The `Display` output is the client-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    #[error("If specified, the {header} must be 'Snapshot'.", header = ODATA_ISOLATION)]
    InvalidIsolationLevel { value: String },

    #[error("{header} '{level}' is not supported by this service.", header = ODATA_ISOLATION)]
    IsolationNotSupported { level: IsolationLevel },

    #[error(
        "If specified, the {param} value in the {origin} must be 'none', 'minimal' or 'full'.",
        param = MetadataLevel::PARAMETER_NAME
    )]
    InvalidMetadataLevel {
        origin: MetadataSource,
        value: String,
    },

    #[error(
        "{param} '{level}' is not supported by this service, the metadata levels supported by this service are '{supported}'.",
        param = MetadataLevel::PARAMETER_NAME
    )]
    MetadataLevelNotSupported {
        level: MetadataLevel,
        supported: String,
    },

    #[error(
        "A supported MIME type could not be found that matches the acceptable MIME types for the request. The supported type(s) '{supported}' do not match any of the acceptable MIME types '{media_type}'."
    )]
    UnsupportedMediaType {
        media_type: String,
        supported: String,
    },

    #[error(
        "If specified, the {header} header must be a valid OData version supported by this service between version {min} and {max}."
    )]
    InvalidVersionFormat {
        header: &'static str,
        value: String,
        min: ODataVersion,
        max: ODataVersion,
    },

    #[error(
        "If specified, the {header} header must be a valid OData version supported by this service between version {min} and {max}."
    )]
    VersionNotSupported {
        header: &'static str,
        version: ODataVersion,
        min: ODataVersion,
        max: ODataVersion,
    },
}

impl NegotiationError {
    #[must_use]
    pub fn kind(&self) -> NegotiationErrorKind {
        match self {
            NegotiationError::InvalidIsolationLevel { .. } => {
                NegotiationErrorKind::InvalidIsolationLevel
            }
            NegotiationError::IsolationNotSupported { .. } => {
                NegotiationErrorKind::IsolationNotSupported
            }
            NegotiationError::InvalidMetadataLevel { .. } => {
                NegotiationErrorKind::InvalidMetadataLevel
            }
            NegotiationError::MetadataLevelNotSupported { .. } => {
                NegotiationErrorKind::MetadataLevelNotSupported
            }
            NegotiationError::UnsupportedMediaType { .. } => {
                NegotiationErrorKind::UnsupportedMediaType
            }
            NegotiationError::InvalidVersionFormat { .. } => {
                NegotiationErrorKind::InvalidVersionFormat
            }
            NegotiationError::VersionNotSupported { .. } => {
                NegotiationErrorKind::VersionNotSupported
            }
        }
    }

    /// HTTP status the failure is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            NegotiationErrorKind::IsolationNotSupported => StatusCode::PRECONDITION_FAILED,
            NegotiationErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            NegotiationErrorKind::InvalidIsolationLevel
            | NegotiationErrorKind::InvalidMetadataLevel
            | NegotiationErrorKind::MetadataLevelNotSupported
            | NegotiationErrorKind::InvalidVersionFormat
            | NegotiationErrorKind::VersionNotSupported => StatusCode::BAD_REQUEST,
        }
    }

    /// Name of the request header (or query option) the failure relates to.
    #[must_use]
    pub fn target(&self) -> &'static str {
        match self {
            NegotiationError::InvalidIsolationLevel { .. }
            | NegotiationError::IsolationNotSupported { .. } => ODATA_ISOLATION,
            NegotiationError::InvalidMetadataLevel { origin, .. } => match origin {
                MetadataSource::FormatQueryOption => "$format",
                MetadataSource::AcceptHeader => "Accept",
            },
            NegotiationError::MetadataLevelNotSupported { .. }
            | NegotiationError::UnsupportedMediaType { .. } => "Accept",
            NegotiationError::InvalidVersionFormat { header, .. }
            | NegotiationError::VersionNotSupported { header, .. } => *header,
        }
    }
}

/// Invalid service capability configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilitiesError {
    #[error("at least one isolation level must be supported")]
    NoIsolationLevels,
    #[error("at least one metadata level must be supported")]
    NoMetadataLevels,
    #[error("at least one media type must be supported")]
    NoMediaTypes,
    #[error("route prefix must not be empty")]
    EmptyRoutePrefix,
    #[error("minimum version {min} is greater than maximum version {max}")]
    InvertedVersionRange { min: ODataVersion, max: ODataVersion },
    #[error(transparent)]
    InvalidVersion(#[from] VersionParseError),
}
