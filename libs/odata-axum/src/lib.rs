//! Axum integration for OData v4 request negotiation
//!
//! Install [`odata_middleware`] (or call [`ODataRouterExt::with_odata`]) and
//! read the negotiated [`odata_core::RequestOptions`] or an [`ODataRequest`]
//! from handlers.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod extract;
pub mod middleware;
pub mod origin;
pub mod router_ext;
pub mod service_document;

pub use extract::ODataRequest;
pub use middleware::{ODataState, RoutePrefix, odata_middleware};
pub use origin::RequestOrigin;
pub use router_ext::ODataRouterExt;
pub use service_document::{ServiceDocument, ServiceDocumentItem, service_document};
