//! Per-request OData negotiation
//!
//! Steps run in a fixed order and the first failure wins: isolation, metadata
//! level, media types, versions, service root.

use http::HeaderMap;
use http::header::ACCEPT;

use crate::capabilities::ServiceCapabilities;
use crate::error::{MetadataSource, NegotiationError};
use crate::headers::{ODATA_ISOLATION, ODATA_MAX_VERSION, ODATA_VERSION, read_header};
use crate::media_type::MediaType;
use crate::options::{IsolationLevel, MetadataLevel, RequestOptions};
use crate::query::RawQueryOptions;
use crate::url::{CanonicalUrls, DEFAULT_ROUTE_PREFIX, is_metadata_request};
use crate::version::ODataVersion;

/// The parts of an HTTP request that negotiation looks at.
#[derive(Debug, Clone, Copy)]
pub struct NegotiationRequest<'a> {
    pub scheme: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub headers: &'a HeaderMap,
    pub route_prefix: &'a str,
}

impl<'a> NegotiationRequest<'a> {
    #[must_use]
    pub fn new(scheme: &'a str, host: &'a str, path: &'a str, headers: &'a HeaderMap) -> Self {
        Self {
            scheme,
            host,
            path,
            query: None,
            headers,
            route_prefix: DEFAULT_ROUTE_PREFIX,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: Option<&'a str>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_route_prefix(mut self, route_prefix: &'a str) -> Self {
        self.route_prefix = route_prefix;
        self
    }
}

/// Resolve the [`RequestOptions`] for one OData request.
///
/// Requests for the metadata document are not subject to media type checks,
/// and an unusable `odata.metadata` value on them falls back to `minimal`.
///
/// # Errors
/// Returns the first [`NegotiationError`] encountered.
pub fn negotiate(
    capabilities: &ServiceCapabilities,
    request: &NegotiationRequest<'_>,
) -> Result<RequestOptions, NegotiationError> {
    let metadata_request = is_metadata_request(request.path);

    let isolation_level = resolve_isolation_level(capabilities, request.headers)?;

    let accept = read_header(request.headers, ACCEPT.as_str())
        .map(MediaType::parse_list)
        .unwrap_or_default();
    let query = request.query.map(RawQueryOptions::parse).unwrap_or_default();

    let metadata_level = if metadata_request {
        resolve_metadata_level(capabilities, &query, &accept)
            .unwrap_or_else(|_| fallback_metadata_level(capabilities))
    } else {
        resolve_metadata_level(capabilities, &query, &accept)?
    };

    if !metadata_request {
        capabilities.validate_media_types(&accept)?;
    }

    let (version, max_version) = resolve_versions(capabilities, request.headers)?;

    let service_root = CanonicalUrls::new(request.scheme, request.host, request.path)
        .with_route_prefix(request.route_prefix)
        .service_root();

    let options = RequestOptions::new(
        service_root,
        isolation_level,
        metadata_level,
        version,
        max_version,
    );

    tracing::debug!(
        path = request.path,
        service_root = options.service_root_uri(),
        isolation = %options.isolation_level(),
        metadata = %options.metadata_level(),
        version = %options.version(),
        max_version = %options.max_version(),
        "OData request negotiated"
    );

    Ok(options)
}

fn resolve_isolation_level(
    capabilities: &ServiceCapabilities,
    headers: &HeaderMap,
) -> Result<IsolationLevel, NegotiationError> {
    let level = match read_header(headers, ODATA_ISOLATION) {
        None => IsolationLevel::None,
        Some(value) if value == IsolationLevel::Snapshot.as_header_value() => {
            IsolationLevel::Snapshot
        }
        Some(value) => {
            return Err(NegotiationError::InvalidIsolationLevel {
                value: value.to_owned(),
            });
        }
    };

    if capabilities.supports_isolation_level(level) {
        Ok(level)
    } else {
        Err(NegotiationError::IsolationNotSupported { level })
    }
}

fn resolve_metadata_level(
    capabilities: &ServiceCapabilities,
    query: &RawQueryOptions,
    accept: &[MediaType],
) -> Result<MetadataLevel, NegotiationError> {
    let format = query.format_value().map(|value| MediaType::parse(&value));

    let requested = format
        .as_ref()
        .and_then(MediaType::metadata_parameter)
        .map(|value| (MetadataSource::FormatQueryOption, value))
        .or_else(|| {
            accept
                .iter()
                .find_map(MediaType::metadata_parameter)
                .map(|value| (MetadataSource::AcceptHeader, value))
        });

    let level = match requested {
        None => MetadataLevel::Minimal,
        Some((origin, value)) => MetadataLevel::from_token(value).ok_or_else(|| {
            NegotiationError::InvalidMetadataLevel {
                origin,
                value: value.to_owned(),
            }
        })?,
    };

    if capabilities.supports_metadata_level(level) {
        Ok(level)
    } else {
        Err(NegotiationError::MetadataLevelNotSupported {
            level,
            supported: capabilities.metadata_levels_description(),
        })
    }
}

/// Level used for `$metadata` requests whose own level cannot be honored:
/// `minimal` when supported, else the first supported level.
fn fallback_metadata_level(capabilities: &ServiceCapabilities) -> MetadataLevel {
    if capabilities.supports_metadata_level(MetadataLevel::Minimal) {
        MetadataLevel::Minimal
    } else {
        capabilities
            .metadata_levels()
            .first()
            .copied()
            .unwrap_or_default()
    }
}

fn resolve_versions(
    capabilities: &ServiceCapabilities,
    headers: &HeaderMap,
) -> Result<(ODataVersion, ODataVersion), NegotiationError> {
    let version = read_header(headers, ODATA_VERSION)
        .map(|value| capabilities.resolve_version(ODATA_VERSION, value))
        .transpose()?;
    let max_version = read_header(headers, ODATA_MAX_VERSION)
        .map(|value| capabilities.resolve_version(ODATA_MAX_VERSION, value))
        .transpose()?;

    Ok(match (version, max_version) {
        (Some(version), Some(max_version)) => (version, max_version),
        (Some(version), None) => (version, version),
        (None, Some(max_version)) => (max_version, max_version),
        (None, None) => (capabilities.max_version(), capabilities.max_version()),
    })
}
