//! OData v4 request negotiation and canonical URL building
//!
//! This crate has no dependency on an HTTP framework (the optional `axum`
//! feature only adds `IntoResponse` for [`ODataException`]). It provides:
//! - Version, isolation and metadata level negotiation (`negotiate`)
//! - Service capability declaration and its serde configuration
//! - Context, id and next link URLs (`CanonicalUrls`)
//! - The OData JSON error envelope (`ODataErrorContent`)
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod capabilities;
pub mod config;
pub mod content;
pub mod error;
pub mod exception;
pub mod headers;
pub mod media_type;
pub mod model;
pub mod negotiation;
pub mod options;
pub mod query;
pub mod url;
pub mod version;

pub use capabilities::ServiceCapabilities;
pub use config::ServiceCapabilitiesConfig;
pub use content::{ODataError, ODataErrorContent, ODataErrorDetail};
pub use error::{CapabilitiesError, MetadataSource, NegotiationError, NegotiationErrorKind};
pub use exception::ODataException;
pub use headers::{ODATA_ISOLATION, ODATA_MAX_VERSION, ODATA_VERSION};
pub use media_type::{APPLICATION_JSON, MediaType};
pub use model::{EntityDataModel, EntityKeyType, EntitySet, KeyLiteral};
pub use negotiation::{NegotiationRequest, negotiate};
pub use options::{IsolationLevel, MetadataLevel, RequestOptions};
pub use query::{RawQueryOptions, SelectOption};
pub use url::{CanonicalUrls, DEFAULT_ROUTE_PREFIX, is_metadata_request, is_odata_request};
pub use version::{ODataVersion, VersionParseError};
