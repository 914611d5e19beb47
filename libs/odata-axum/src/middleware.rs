//! OData negotiation middleware.
//!
//! # Behavior
//!
//! - Path outside the OData route: pass through untouched
//! - Negotiation fails: error envelope with the failure status, handler not called
//! - Negotiation succeeds: `RequestOptions` stored in request extensions, then
//!   the response gets `odata.metadata` appended to its `Content-Type` (except
//!   for `$metadata`, or when the handler already set the parameter) and an
//!   `OData-Version` header

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue};

use odata_core::{
    CapabilitiesError, DEFAULT_ROUTE_PREFIX, MetadataLevel, NegotiationRequest, ODataException,
    ODataVersion, ServiceCapabilities, ServiceCapabilitiesConfig, is_metadata_request,
    is_odata_request, negotiate,
};

use crate::origin::RequestOrigin;

static ODATA_VERSION_HEADER: HeaderName = HeaderName::from_static("odata-version");

/// Route prefix the middleware matched on, stored next to `RequestOptions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePrefix(pub Arc<str>);

impl RoutePrefix {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoutePrefix {
    fn default() -> Self {
        Self(Arc::from(DEFAULT_ROUTE_PREFIX))
    }
}

/// State for the OData middleware. Immutable after construction.
#[derive(Debug, Clone)]
pub struct ODataState {
    capabilities: Arc<ServiceCapabilities>,
    route_prefix: RoutePrefix,
}

impl ODataState {
    #[must_use]
    pub fn new(capabilities: ServiceCapabilities) -> Self {
        Self {
            capabilities: Arc::new(capabilities),
            route_prefix: RoutePrefix::default(),
        }
    }

    /// Build the state from configuration.
    ///
    /// # Errors
    /// Returns `CapabilitiesError` if the configured capabilities are invalid.
    pub fn from_config(config: &ServiceCapabilitiesConfig) -> Result<Self, CapabilitiesError> {
        let capabilities = ServiceCapabilities::try_from(config)?;
        Ok(Self::new(capabilities).with_route_prefix(&config.route_prefix))
    }

    #[must_use]
    pub fn with_route_prefix(mut self, route_prefix: &str) -> Self {
        self.route_prefix = RoutePrefix(Arc::from(route_prefix));
        self
    }

    #[must_use]
    pub fn capabilities(&self) -> &ServiceCapabilities {
        &self.capabilities
    }

    #[must_use]
    pub fn route_prefix(&self) -> &str {
        self.route_prefix.as_str()
    }
}

impl Default for ODataState {
    fn default() -> Self {
        Self::new(ServiceCapabilities::default())
    }
}

/// OData negotiation middleware, for use with `axum::middleware::from_fn_with_state`.
pub async fn odata_middleware(
    State(state): State<ODataState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if !is_odata_request(&path, state.route_prefix()) {
        return next.run(request).await;
    }

    let origin = RequestOrigin::from_request(request.uri(), request.headers());
    let negotiated = {
        let negotiation = NegotiationRequest::new(
            &origin.scheme,
            &origin.host,
            &path,
            request.headers(),
        )
        .with_query(request.uri().query())
        .with_route_prefix(state.route_prefix());
        negotiate(&state.capabilities, &negotiation)
    };

    let options = match negotiated {
        Ok(options) => options,
        Err(err) => {
            tracing::warn!(
                method = %request.method(),
                path = %path,
                kind = ?err.kind(),
                status = err.status().as_u16(),
                header = err.target(),
                error = %err,
                "OData request rejected"
            );
            return ODataException::from(err).into_response();
        }
    };

    let metadata_level = options.metadata_level();
    let max_version = options.max_version();

    request.extensions_mut().insert(options);
    request.extensions_mut().insert(state.route_prefix.clone());

    let mut response = next.run(request).await;
    decorate_response(
        &mut response,
        (!is_metadata_request(&path)).then_some(metadata_level),
        max_version,
    );
    response
}

fn decorate_response(
    response: &mut Response,
    metadata_level: Option<MetadataLevel>,
    max_version: ODataVersion,
) {
    let headers = response.headers_mut();

    if let Some(level) = metadata_level
        && let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
        && !content_type
            .to_ascii_lowercase()
            .contains(MetadataLevel::PARAMETER_NAME)
    {
        let value = format!(
            "{content_type};{}={}",
            MetadataLevel::PARAMETER_NAME,
            level.as_str()
        );
        if let Ok(value) = HeaderValue::try_from(value) {
            headers.insert(CONTENT_TYPE, value);
        }
    }

    if let Ok(value) = HeaderValue::try_from(max_version.to_string()) {
        headers.insert(ODATA_VERSION_HEADER.clone(), value);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn response_with(content_type: Option<&'static str>) -> Response {
        let mut response = "ok".into_response();
        match content_type {
            Some(ct) => {
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(ct));
            }
            None => {
                response.headers_mut().remove(CONTENT_TYPE);
            }
        }
        response
    }

    fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
        response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn appends_metadata_level_once() {
        let mut response = response_with(Some("application/json"));
        decorate_response(&mut response, Some(MetadataLevel::None), ODataVersion::V4_0);
        assert_eq!(
            header(&response, "content-type"),
            Some("application/json;odata.metadata=none")
        );
        assert_eq!(header(&response, "odata-version"), Some("4.0"));

        let mut response = response_with(Some("application/json;odata.metadata=full"));
        decorate_response(&mut response, Some(MetadataLevel::Minimal), ODataVersion::V4_0);
        assert_eq!(
            header(&response, "content-type"),
            Some("application/json;odata.metadata=full")
        );
    }

    #[test]
    fn metadata_document_keeps_content_type() {
        let mut response = response_with(Some("application/xml"));
        decorate_response(&mut response, None, ODataVersion::new(4, 1));
        assert_eq!(header(&response, "content-type"), Some("application/xml"));
        assert_eq!(header(&response, "odata-version"), Some("4.1"));
    }

    #[test]
    fn no_content_type_is_not_invented() {
        let mut response = response_with(None);
        decorate_response(&mut response, Some(MetadataLevel::Minimal), ODataVersion::V4_0);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn state_from_config_keeps_route_prefix() {
        let config = ServiceCapabilitiesConfig {
            route_prefix: "api".to_owned(),
            ..ServiceCapabilitiesConfig::default()
        };
        let state = ODataState::from_config(&config).unwrap();
        assert_eq!(state.route_prefix(), "api");
        assert_eq!(state.capabilities(), &ServiceCapabilities::default());
    }

    #[test]
    fn state_from_config_rejects_empty_route_prefix() {
        let config = ServiceCapabilitiesConfig {
            route_prefix: String::new(),
            ..ServiceCapabilitiesConfig::default()
        };
        assert_eq!(
            ODataState::from_config(&config).unwrap_err(),
            CapabilitiesError::EmptyRoutePrefix
        );
    }
}
