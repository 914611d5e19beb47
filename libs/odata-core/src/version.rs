//! OData protocol versions
//!
//! Versions are `major.minor` pairs parsed from the `OData-Version` and
//! `OData-MaxVersion` headers. Ordering is lexicographic on `(major, minor)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a version token does not match `^\d+\.\d+$`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid OData version '{token}': expected '<major>.<minor>'")]
pub struct VersionParseError {
    pub token: String,
}

/// An OData protocol version such as `4.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ODataVersion {
    major: u32,
    minor: u32,
}

impl ODataVersion {
    /// OData version 4.0
    pub const V4_0: ODataVersion = ODataVersion::new(4, 0);

    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    #[must_use]
    pub const fn major(self) -> u32 {
        self.major
    }

    #[must_use]
    pub const fn minor(self) -> u32 {
        self.minor
    }

    /// Parse a version token.
    ///
    /// # Errors
    /// Returns `VersionParseError` if the token is not two dot-separated
    /// decimal numbers, or a component overflows.
    pub fn parse(token: &str) -> Result<Self, VersionParseError> {
        let invalid = || VersionParseError {
            token: token.to_owned(),
        };

        let (major, minor) = token.split_once('.').ok_or_else(invalid)?;
        let component = |s: &str| -> Option<u32> {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            s.parse().ok()
        };

        match (component(major), component(minor)) {
            (Some(major), Some(minor)) => Ok(Self::new(major, minor)),
            _ => Err(invalid()),
        }
    }

    /// Whether this version lies within `[min, max]`, inclusive.
    #[must_use]
    pub fn is_within(self, min: ODataVersion, max: ODataVersion) -> bool {
        min <= self && self <= max
    }
}

impl Default for ODataVersion {
    fn default() -> Self {
        Self::V4_0
    }
}

impl fmt::Display for ODataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ODataVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ODataVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ODataVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        Self::parse(&token).map_err(serde::de::Error::custom)
    }
}
