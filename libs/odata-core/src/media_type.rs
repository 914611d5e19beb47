//! Minimal media type parsing for `Accept` and `$format`
//!
//! Splits on `,` and `;`, trims, and lower-cases names. Quoted values are
//! unquoted; nothing else of RFC 9110 is interpreted.

use crate::options::MetadataLevel;

pub const APPLICATION_JSON: &str = "application/json";

/// One media range with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    essence: String,
    parameters: Vec<(String, String)>,
}

impl MediaType {
    /// Parse a single media type such as `application/json;odata.metadata=none`.
    ///
    /// The `$format` shorthand `json` is expanded to `application/json`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut parts = value.split(';');
        let essence = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let essence = if essence == "json" {
            APPLICATION_JSON.to_owned()
        } else {
            essence
        };

        let parameters = parts
            .filter_map(|part| {
                let (name, value) = part.split_once('=')?;
                let name = name.trim().to_ascii_lowercase();
                if name.is_empty() {
                    return None;
                }
                let value = value.trim().trim_matches('"').to_owned();
                Some((name, value))
            })
            .collect();

        Self {
            essence,
            parameters,
        }
    }

    /// Parse a comma-separated list, preserving client order and skipping
    /// empty entries.
    #[must_use]
    pub fn parse_list(value: &str) -> Vec<Self> {
        value
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Lower-case `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// Value of a parameter; names compare case-insensitively.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Raw `odata.metadata` parameter, if present.
    #[must_use]
    pub fn metadata_parameter(&self) -> Option<&str> {
        self.parameter(MetadataLevel::PARAMETER_NAME)
    }
}
