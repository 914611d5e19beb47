//! Serde-facing service configuration
//!
//! Versions are kept as text and validated when converted into
//! [`ServiceCapabilities`]. Numeric values are accepted for them too, since
//! layered config sources such as environment variables type `4.0` as a float.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::capabilities::{ServiceCapabilities, TEXT_PLAIN};
use crate::error::CapabilitiesError;
use crate::media_type::APPLICATION_JSON;
use crate::options::{IsolationLevel, MetadataLevel};
use crate::url::DEFAULT_ROUTE_PREFIX;
use crate::version::ODataVersion;

/// OData service configuration as read from YAML or the environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCapabilitiesConfig {
    /// Path segment that marks OData routes (matched case-insensitively)
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// Lowest accepted `OData-Version` / `OData-MaxVersion`
    #[serde(default = "default_version", deserialize_with = "version_text")]
    pub min_version: String,

    /// Highest accepted version; also the default when the client sends none
    #[serde(default = "default_version", deserialize_with = "version_text")]
    pub max_version: String,

    #[serde(default = "default_isolation_levels")]
    pub isolation_levels: Vec<IsolationLevel>,

    /// Levels in the order they are listed to clients
    #[serde(default = "default_metadata_levels")]
    pub metadata_levels: Vec<MetadataLevel>,

    #[serde(default = "default_media_types")]
    pub media_types: Vec<String>,
}

fn default_route_prefix() -> String {
    DEFAULT_ROUTE_PREFIX.to_owned()
}

fn default_version() -> String {
    ODataVersion::V4_0.to_string()
}

fn default_isolation_levels() -> Vec<IsolationLevel> {
    vec![IsolationLevel::None]
}

fn default_metadata_levels() -> Vec<MetadataLevel> {
    vec![MetadataLevel::None, MetadataLevel::Minimal]
}

fn default_media_types() -> Vec<String> {
    vec![APPLICATION_JSON.to_owned(), TEXT_PLAIN.to_owned()]
}

fn version_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct VersionText;

    impl Visitor<'_> for VersionText {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an OData version such as \"4.0\"")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_owned())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            // `4.0_f64` displays as "4"
            let text = v.to_string();
            Ok(if text.contains('.') {
                text
            } else {
                format!("{text}.0")
            })
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(VersionText)
}

impl Default for ServiceCapabilitiesConfig {
    fn default() -> Self {
        Self {
            route_prefix: default_route_prefix(),
            min_version: default_version(),
            max_version: default_version(),
            isolation_levels: default_isolation_levels(),
            metadata_levels: default_metadata_levels(),
            media_types: default_media_types(),
        }
    }
}

impl TryFrom<&ServiceCapabilitiesConfig> for ServiceCapabilities {
    type Error = CapabilitiesError;

    fn try_from(config: &ServiceCapabilitiesConfig) -> Result<Self, Self::Error> {
        if config.route_prefix.trim().is_empty() {
            return Err(CapabilitiesError::EmptyRoutePrefix);
        }
        ServiceCapabilities::new(
            ODataVersion::parse(config.min_version.trim())?,
            ODataVersion::parse(config.max_version.trim())?,
            config.isolation_levels.iter().copied(),
            config.metadata_levels.iter().copied(),
            config.media_types.iter().map(String::as_str),
        )
    }
}

impl TryFrom<ServiceCapabilitiesConfig> for ServiceCapabilities {
    type Error = CapabilitiesError;

    fn try_from(config: ServiceCapabilitiesConfig) -> Result<Self, Self::Error> {
        ServiceCapabilities::try_from(&config)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_default_capabilities() {
        let caps = ServiceCapabilities::try_from(ServiceCapabilitiesConfig::default()).unwrap();
        assert_eq!(caps, ServiceCapabilities::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: ServiceCapabilitiesConfig = serde_json::from_str(
            r#"{"max_version":"4.1","metadata_levels":["minimal","full","none"]}"#,
        )
        .unwrap();
        assert_eq!(config.route_prefix, "odata");
        assert_eq!(config.min_version, "4.0");

        let caps = ServiceCapabilities::try_from(&config).unwrap();
        assert_eq!(caps.max_version(), ODataVersion::new(4, 1));
        assert_eq!(caps.metadata_levels_description(), "minimal, full, none");
    }

    #[test]
    fn rejects_bad_versions_and_empty_sets() {
        let config = ServiceCapabilitiesConfig {
            max_version: "latest".to_owned(),
            ..ServiceCapabilitiesConfig::default()
        };
        assert!(matches!(
            ServiceCapabilities::try_from(&config),
            Err(CapabilitiesError::InvalidVersion(_))
        ));

        let config = ServiceCapabilitiesConfig {
            media_types: Vec::new(),
            ..ServiceCapabilitiesConfig::default()
        };
        assert_eq!(
            ServiceCapabilities::try_from(&config),
            Err(CapabilitiesError::NoMediaTypes)
        );
    }

    #[test]
    fn rejects_empty_route_prefix() {
        let config = ServiceCapabilitiesConfig {
            route_prefix: " ".to_owned(),
            ..ServiceCapabilitiesConfig::default()
        };
        assert_eq!(
            ServiceCapabilities::try_from(&config),
            Err(CapabilitiesError::EmptyRoutePrefix)
        );
    }

    #[test]
    fn numeric_versions_are_accepted() {
        let config: ServiceCapabilitiesConfig =
            serde_json::from_str(r#"{"min_version":4.0,"max_version":4.01}"#).unwrap();
        assert_eq!(config.min_version, "4.0");
        assert_eq!(config.max_version, "4.01");

        let caps = ServiceCapabilities::try_from(&config).unwrap();
        assert_eq!(caps.min_version(), ODataVersion::V4_0);
        assert_eq!(caps.max_version(), ODataVersion::new(4, 1));

        let config: ServiceCapabilitiesConfig =
            serde_json::from_str(r#"{"max_version":4}"#).unwrap();
        assert!(matches!(
            ServiceCapabilities::try_from(&config),
            Err(CapabilitiesError::InvalidVersion(_))
        ));
    }
}
