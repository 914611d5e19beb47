//! Server-declared OData capabilities
//!
//! A `ServiceCapabilities` value is built once at startup and shared read-only
//! by every request (typically behind an `Arc`).

use crate::error::{CapabilitiesError, NegotiationError};
use crate::headers::{ODATA_MAX_VERSION, ODATA_VERSION};
use crate::media_type::{APPLICATION_JSON, MediaType};
use crate::options::{IsolationLevel, MetadataLevel, RequestOptions};
use crate::version::ODataVersion;

pub const TEXT_PLAIN: &str = "text/plain";

/// What the service supports; the reference point for every negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCapabilities {
    min_version: ODataVersion,
    max_version: ODataVersion,
    isolation_levels: Vec<IsolationLevel>,
    metadata_levels: Vec<MetadataLevel>,
    media_types: Vec<String>,
}

impl ServiceCapabilities {
    /// Create a validated capability set.
    ///
    /// Duplicate entries are dropped, keeping the first occurrence, and media
    /// types are lower-cased.
    ///
    /// # Errors
    /// Returns `CapabilitiesError` if any set is empty or `min_version > max_version`.
    pub fn new(
        min_version: ODataVersion,
        max_version: ODataVersion,
        isolation_levels: impl IntoIterator<Item = IsolationLevel>,
        metadata_levels: impl IntoIterator<Item = MetadataLevel>,
        media_types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, CapabilitiesError> {
        if min_version > max_version {
            return Err(CapabilitiesError::InvertedVersionRange {
                min: min_version,
                max: max_version,
            });
        }

        let isolation_levels = dedup(isolation_levels);
        if isolation_levels.is_empty() {
            return Err(CapabilitiesError::NoIsolationLevels);
        }

        let metadata_levels = dedup(metadata_levels);
        if metadata_levels.is_empty() {
            return Err(CapabilitiesError::NoMetadataLevels);
        }

        let media_types = dedup(
            media_types
                .into_iter()
                .map(|m| m.into().trim().to_ascii_lowercase())
                .filter(|m| !m.is_empty()),
        );
        if media_types.is_empty() {
            return Err(CapabilitiesError::NoMediaTypes);
        }

        Ok(Self {
            min_version,
            max_version,
            isolation_levels,
            metadata_levels,
            media_types,
        })
    }

    #[must_use]
    pub fn min_version(&self) -> ODataVersion {
        self.min_version
    }

    #[must_use]
    pub fn max_version(&self) -> ODataVersion {
        self.max_version
    }

    #[must_use]
    pub fn isolation_levels(&self) -> &[IsolationLevel] {
        &self.isolation_levels
    }

    #[must_use]
    pub fn metadata_levels(&self) -> &[MetadataLevel] {
        &self.metadata_levels
    }

    #[must_use]
    pub fn media_types(&self) -> &[String] {
        &self.media_types
    }

    #[must_use]
    pub fn supports_isolation_level(&self, level: IsolationLevel) -> bool {
        self.isolation_levels.contains(&level)
    }

    #[must_use]
    pub fn supports_metadata_level(&self, level: MetadataLevel) -> bool {
        self.metadata_levels.contains(&level)
    }

    #[must_use]
    pub fn supports_version(&self, version: ODataVersion) -> bool {
        version.is_within(self.min_version, self.max_version)
    }

    #[must_use]
    pub fn supports_media_type(&self, essence: &str) -> bool {
        self.media_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(essence.trim()))
    }

    /// Supported metadata levels as shown to clients: `none, minimal`.
    #[must_use]
    pub fn metadata_levels_description(&self) -> String {
        self.metadata_levels
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Supported media types as shown to clients.
    ///
    /// JSON is listed once per supported metadata level before the plain list,
    /// e.g. `application/json;odata.metadata=none, application/json, text/plain`.
    #[must_use]
    pub fn media_types_description(&self) -> String {
        let mut out = Vec::new();
        if self.supports_media_type(APPLICATION_JSON) {
            out.extend(self.metadata_levels.iter().map(|level| {
                format!(
                    "{APPLICATION_JSON};{}={}",
                    MetadataLevel::PARAMETER_NAME,
                    level.as_str()
                )
            }));
        }
        out.extend(self.media_types.iter().cloned());
        out.join(", ")
    }

    /// Check requested media types in client preference order.
    ///
    /// Parameters (including `odata.metadata`) are ignored; the first entry
    /// whose essence is not supported is reported.
    ///
    /// # Errors
    /// Returns `NegotiationError::UnsupportedMediaType` naming that entry.
    pub fn validate_media_types<'a>(
        &self,
        requested: impl IntoIterator<Item = &'a MediaType>,
    ) -> Result<(), NegotiationError> {
        match requested
            .into_iter()
            .find(|mt| !self.supports_media_type(mt.essence()))
        {
            Some(unsupported) => Err(NegotiationError::UnsupportedMediaType {
                media_type: unsupported.essence().to_owned(),
                supported: self.media_types_description(),
            }),
            None => Ok(()),
        }
    }

    /// Parse a version header value and check it against the supported range.
    ///
    /// # Errors
    /// `InvalidVersionFormat` for unparsable values, `VersionNotSupported`
    /// for versions outside `[min_version, max_version]`.
    pub fn resolve_version(
        &self,
        header: &'static str,
        value: &str,
    ) -> Result<ODataVersion, NegotiationError> {
        let version =
            ODataVersion::parse(value.trim()).map_err(|_| NegotiationError::InvalidVersionFormat {
                header,
                value: value.to_owned(),
                min: self.min_version,
                max: self.max_version,
            })?;
        self.check_version(header, version)
    }

    fn check_version(
        &self,
        header: &'static str,
        version: ODataVersion,
    ) -> Result<ODataVersion, NegotiationError> {
        if self.supports_version(version) {
            Ok(version)
        } else {
            Err(NegotiationError::VersionNotSupported {
                header,
                version,
                min: self.min_version,
                max: self.max_version,
            })
        }
    }

    /// Check resolved options against the capability set.
    ///
    /// # Errors
    /// The first of `IsolationNotSupported`, `MetadataLevelNotSupported` or
    /// `VersionNotSupported` that applies.
    pub fn validate_options(&self, options: &RequestOptions) -> Result<(), NegotiationError> {
        if !self.supports_isolation_level(options.isolation_level()) {
            return Err(NegotiationError::IsolationNotSupported {
                level: options.isolation_level(),
            });
        }
        if !self.supports_metadata_level(options.metadata_level()) {
            return Err(NegotiationError::MetadataLevelNotSupported {
                level: options.metadata_level(),
                supported: self.metadata_levels_description(),
            });
        }
        self.check_version(ODATA_VERSION, options.version())?;
        self.check_version(ODATA_MAX_VERSION, options.max_version())?;
        Ok(())
    }
}

impl Default for ServiceCapabilities {
    /// OData 4.0 only, no snapshot isolation, `none`/`minimal` metadata,
    /// JSON and plain text.
    fn default() -> Self {
        Self {
            min_version: ODataVersion::V4_0,
            max_version: ODataVersion::V4_0,
            isolation_levels: vec![IsolationLevel::None],
            metadata_levels: vec![MetadataLevel::None, MetadataLevel::Minimal],
            media_types: vec![APPLICATION_JSON.to_owned(), TEXT_PLAIN.to_owned()],
        }
    }
}

fn dedup<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::StatusCode;

    fn options(
        isolation: IsolationLevel,
        metadata: MetadataLevel,
        version: ODataVersion,
    ) -> RequestOptions {
        RequestOptions::new(
            "https://services.odata.org/OData/",
            isolation,
            metadata,
            version,
            version,
        )
    }

    #[test]
    fn rejects_empty_sets_and_inverted_range() {
        let v4 = ODataVersion::V4_0;
        assert_eq!(
            ServiceCapabilities::new(
                v4,
                v4,
                Vec::new(),
                [MetadataLevel::Minimal],
                [APPLICATION_JSON]
            ),
            Err(CapabilitiesError::NoIsolationLevels)
        );
        assert_eq!(
            ServiceCapabilities::new(
                v4,
                v4,
                [IsolationLevel::None],
                Vec::new(),
                [APPLICATION_JSON]
            ),
            Err(CapabilitiesError::NoMetadataLevels)
        );
        assert_eq!(
            ServiceCapabilities::new(
                v4,
                v4,
                [IsolationLevel::None],
                [MetadataLevel::Minimal],
                ["  "]
            ),
            Err(CapabilitiesError::NoMediaTypes)
        );
        assert_eq!(
            ServiceCapabilities::new(
                ODataVersion::new(4, 1),
                v4,
                [IsolationLevel::None],
                [MetadataLevel::Minimal],
                [APPLICATION_JSON]
            ),
            Err(CapabilitiesError::InvertedVersionRange {
                min: ODataVersion::new(4, 1),
                max: v4
            })
        );
    }

    #[test]
    fn normalizes_media_types_and_dedups() {
        let caps = ServiceCapabilities::new(
            ODataVersion::V4_0,
            ODataVersion::V4_0,
            [IsolationLevel::None, IsolationLevel::None],
            [MetadataLevel::Minimal],
            ["Application/JSON", "application/json", "text/plain"],
        )
        .unwrap();
        assert_eq!(caps.media_types(), ["application/json", "text/plain"]);
        assert_eq!(caps.isolation_levels(), [IsolationLevel::None]);
    }

    #[test]
    fn media_type_validation_reports_first_unsupported() {
        let caps = ServiceCapabilities::default();
        let requested =
            MediaType::parse_list("application/json;odata.metadata=none, application/xml, text/html");
        let err = caps.validate_media_types(&requested).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            err.to_string(),
            "A supported MIME type could not be found that matches the acceptable MIME types for the request. The supported type(s) 'application/json;odata.metadata=none, application/json;odata.metadata=minimal, application/json, text/plain' do not match any of the acceptable MIME types 'application/xml'."
        );

        let ok = MediaType::parse_list("text/plain, application/json;odata.metadata=full");
        assert!(caps.validate_media_types(&ok).is_ok());
    }

    #[test]
    fn validate_options_checks_each_dimension() {
        let caps = ServiceCapabilities::default();
        let v4 = ODataVersion::V4_0;

        assert!(
            caps.validate_options(&options(IsolationLevel::None, MetadataLevel::Minimal, v4))
                .is_ok()
        );

        let err = caps
            .validate_options(&options(IsolationLevel::Snapshot, MetadataLevel::Minimal, v4))
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::PRECONDITION_FAILED);

        let err = caps
            .validate_options(&options(IsolationLevel::None, MetadataLevel::Full, v4))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "odata.metadata 'full' is not supported by this service, the metadata levels supported by this service are 'none, minimal'."
        );

        let err = caps
            .validate_options(&options(
                IsolationLevel::None,
                MetadataLevel::Minimal,
                ODataVersion::new(4, 1),
            ))
            .unwrap_err();
        assert!(matches!(
            err,
            NegotiationError::VersionNotSupported {
                header: ODATA_VERSION,
                ..
            }
        ));
    }

    #[test]
    fn resolve_version_distinguishes_format_from_range() {
        let caps = ServiceCapabilities::default();
        assert_eq!(
            caps.resolve_version(ODATA_VERSION, "4.0"),
            Ok(ODataVersion::V4_0)
        );
        assert!(matches!(
            caps.resolve_version(ODATA_VERSION, "four"),
            Err(NegotiationError::InvalidVersionFormat { .. })
        ));
        assert!(matches!(
            caps.resolve_version(ODATA_MAX_VERSION, "3.0"),
            Err(NegotiationError::VersionNotSupported { .. })
        ));
    }
}
