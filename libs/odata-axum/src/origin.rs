//! Scheme and host of an incoming request

use http::{HeaderMap, Uri, header::HOST};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const DEFAULT_SCHEME: &str = "http";

/// Where the client sent the request: the `scheme://host` part of canonical URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    /// Scheme from the absolute URI, else `X-Forwarded-Proto`, else `http`.
    /// Host from the URI authority, else the `Host` header.
    #[must_use]
    pub fn from_request(uri: &Uri, headers: &HeaderMap) -> Self {
        let scheme = uri
            .scheme_str()
            .map(str::to_owned)
            .or_else(|| {
                header_str(headers, X_FORWARDED_PROTO)
                    .and_then(|v| v.split(',').next())
                    .map(|v| v.trim().to_ascii_lowercase())
                    .filter(|v| !v.is_empty())
            })
            .unwrap_or_else(|| DEFAULT_SCHEME.to_owned());

        let host = uri
            .authority()
            .map(|a| a.as_str().to_owned())
            .or_else(|| header_str(headers, HOST.as_str()).map(|v| v.trim().to_owned()))
            .unwrap_or_default();

        Self { scheme, host }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn absolute_uri_wins() {
        let uri: Uri = "https://services.odata.org/OData/Products".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("internal:8080"));
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));

        let origin = RequestOrigin::from_request(&uri, &headers);
        assert_eq!(origin.scheme, "https");
        assert_eq!(origin.host, "services.odata.org");
    }

    #[test]
    fn origin_form_uses_headers() {
        let uri: Uri = "/OData/Products".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("services.odata.org"));
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("HTTPS, http"));

        let origin = RequestOrigin::from_request(&uri, &headers);
        assert_eq!(origin.scheme, "https");
        assert_eq!(origin.host, "services.odata.org");
    }

    #[test]
    fn defaults_to_http() {
        let uri: Uri = "/OData".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("localhost:8087"));

        let origin = RequestOrigin::from_request(&uri, &headers);
        assert_eq!(origin.scheme, "http");
        assert_eq!(origin.host, "localhost:8087");
    }
}
