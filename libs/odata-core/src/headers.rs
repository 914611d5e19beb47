//! OData header names and a minimal header reader

use http::HeaderMap;

pub const ODATA_ISOLATION: &str = "OData-Isolation";
pub const ODATA_VERSION: &str = "OData-Version";
pub const ODATA_MAX_VERSION: &str = "OData-MaxVersion";

/// Returns the first value of the named header.
///
/// Values that are not visible ASCII are treated as absent.
#[must_use]
pub fn read_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
