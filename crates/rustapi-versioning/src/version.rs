//! API version type and comparison
//!
//! An API version is made of an optional group version (a calendar date),
//! an optional `major.minor` pair and an optional status tag:
//!
//! - `1`, `1.1` (numeric)
//! - `1.1-Alpha`, `2.0-RC.1` (numeric with status)
//! - `2013-08-06` (group version)
//! - `2013-08-06.1.1-Beta` (group version, numeric and status)
//!
//! At least one of the group version and the major version is always present.

use crate::error::ApiVersionParseError;
use crate::format;
use crate::parser::ApiVersionParser;
use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A single API version
///
/// Equality, ordering and hashing treat a missing minor version as `0`
/// (`1` equals `1.0`) and compare the status case-insensitively. The text
/// form keeps whatever was written, so `1` and `1.0` still format differently.
#[derive(Debug, Clone)]
pub struct ApiVersion {
    group_version: Option<NaiveDate>,
    major_version: Option<u32>,
    minor_version: Option<u32>,
    status: Option<String>,
}

impl ApiVersion {
    /// Create a `major.minor` version
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            group_version: None,
            major_version: Some(major),
            minor_version: Some(minor),
            status: None,
        }
    }

    /// Create a version with only a major number
    pub fn major(major: u32) -> Self {
        Self {
            group_version: None,
            major_version: Some(major),
            minor_version: None,
            status: None,
        }
    }

    /// Create a date-only version
    pub fn group(date: NaiveDate) -> Self {
        Self {
            group_version: Some(date),
            major_version: None,
            minor_version: None,
            status: None,
        }
    }

    /// Create a version combining a date with a `major(.minor)` pair
    pub fn group_with_version(date: NaiveDate, major: u32, minor: Option<u32>) -> Self {
        Self {
            group_version: Some(date),
            major_version: Some(major),
            minor_version: minor,
            status: None,
        }
    }

    /// Create a date-only version from its calendar parts
    ///
    /// Fails with [`ApiVersionParseError::InvalidGroupVersion`] for dates that
    /// do not exist, such as February 29th of a common year.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, ApiVersionParseError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self::group)
            .ok_or_else(|| ApiVersionParseError::InvalidGroupVersion {
                text: format!("{:04}-{:02}-{:02}", year, month, day),
            })
    }

    /// Create a version from loosely-typed components
    ///
    /// Rejects negative numbers, a minor version without a major version,
    /// a malformed status and a version with neither a date nor a major number.
    pub fn try_from_parts(
        group_version: Option<NaiveDate>,
        major_version: Option<i64>,
        minor_version: Option<i64>,
        status: Option<&str>,
    ) -> Result<Self, ApiVersionParseError> {
        let major_version = major_version.map(|v| component("major", v)).transpose()?;
        let minor_version = minor_version.map(|v| component("minor", v)).transpose()?;

        if major_version.is_none() && minor_version.is_some() {
            return Err(ApiVersionParseError::InvalidComponents {
                reason: "a minor version requires a major version".to_string(),
            });
        }
        if group_version.is_none() && major_version.is_none() {
            return Err(ApiVersionParseError::InvalidComponents {
                reason: "either a group version or a major version is required".to_string(),
            });
        }

        let version = Self {
            group_version,
            major_version,
            minor_version,
            status: None,
        };

        match status {
            Some(status) => version.with_status(status),
            None => Ok(version),
        }
    }

    /// Attach a status tag, replacing any existing one
    pub fn with_status(mut self, status: impl Into<String>) -> Result<Self, ApiVersionParseError> {
        let status = status.into();
        if !is_valid_status(&status) {
            return Err(ApiVersionParseError::InvalidStatus {
                text: self.to_string(),
                status,
            });
        }
        self.status = Some(status);
        Ok(self)
    }

    /// Parse a version with the shared parser
    pub fn parse(text: &str) -> Result<Self, ApiVersionParseError> {
        ApiVersionParser::shared().parse(text)
    }

    /// Parse a version, discarding the reason on failure
    pub fn try_parse(text: &str) -> Option<Self> {
        ApiVersionParser::shared().try_parse(text)
    }

    /// The calendar date component
    pub fn group_version(&self) -> Option<NaiveDate> {
        self.group_version
    }

    /// The major version number
    pub fn major_version(&self) -> Option<u32> {
        self.major_version
    }

    /// The minor version number, as written
    pub fn minor_version(&self) -> Option<u32> {
        self.minor_version
    }

    /// The status tag, as written
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Whether the version carries a status tag
    pub fn is_prerelease(&self) -> bool {
        self.status.is_some()
    }

    /// Render with a format string
    ///
    /// See the crate documentation for the token language. An empty format
    /// is the same as `"F"`.
    pub fn format(&self, format: &str) -> String {
        format::render(self, format)
    }

    fn implied_minor(&self) -> u32 {
        self.minor_version.unwrap_or(0)
    }

    pub(crate) fn from_validated(
        group_version: Option<NaiveDate>,
        major_version: Option<u32>,
        minor_version: Option<u32>,
        status: Option<String>,
    ) -> Self {
        Self {
            group_version,
            major_version,
            minor_version,
            status,
        }
    }
}

fn component(name: &str, value: i64) -> Result<u32, ApiVersionParseError> {
    u32::try_from(value).map_err(|_| ApiVersionParseError::InvalidComponents {
        reason: format!("the {} version must be between 0 and {}, got {}", name, u32::MAX, value),
    })
}

/// `token ("." token)*` where a token is one or more ASCII letters or digits
pub(crate) fn is_valid_status(status: &str) -> bool {
    !status.is_empty()
        && status
            .split('.')
            .all(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_alphanumeric()))
}

fn compare_status(left: Option<&str>, right: Option<&str>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        // a release outranks any pre-release of the same number
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => left
            .bytes()
            .map(|b| b.to_ascii_lowercase())
            .cmp(right.bytes().map(|b| b.to_ascii_lowercase())),
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl PartialEq for ApiVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ApiVersion {}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.group_version
            .cmp(&other.group_version)
            .then_with(|| self.major_version.cmp(&other.major_version))
            .then_with(|| self.implied_minor().cmp(&other.implied_minor()))
            .then_with(|| compare_status(self.status(), other.status()))
    }
}

impl Hash for ApiVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.group_version.hash(state);
        self.major_version.hash(state);
        self.implied_minor().hash(state);
        match &self.status {
            Some(status) => {
                state.write_u8(1);
                state.write_usize(status.len());
                for b in status.bytes() {
                    state.write_u8(b.to_ascii_lowercase());
                }
            }
            None => state.write_u8(0),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format::full(self))
    }
}

impl FromStr for ApiVersion {
    type Err = ApiVersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn v(text: &str) -> ApiVersion {
        text.parse().unwrap()
    }

    fn hash_of(version: &ApiVersion) -> u64 {
        let mut hasher = DefaultHasher::new();
        version.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_missing_minor_equals_zero() {
        assert_eq!(v("1"), v("1.0"));
        assert_eq!(hash_of(&v("1")), hash_of(&v("1.0")));
        assert_eq!(ApiVersion::major(3), ApiVersion::new(3, 0));
    }

    #[test]
    fn test_status_is_case_insensitive() {
        assert_eq!(v("1.1-alpha"), v("1.1-ALPHA"));
        assert_eq!(hash_of(&v("1.1-alpha")), hash_of(&v("1.1-ALPHA")));
        assert_eq!(v("1.1-alpha").status(), Some("alpha"));
    }

    #[test]
    fn test_release_outranks_prerelease() {
        assert!(v("1.1") > v("1.1-Beta"));
        assert!(v("1.1-Beta") > v("1.1-Alpha"));
        assert!(v("1.0") < v("1.1-Alpha"));
    }

    #[test]
    fn test_ordering_by_component() {
        assert!(v("2.0") > v("1.9"));
        assert!(v("1.10") > v("1.9"));
        assert!(v("2013-08-06") < v("2014-01-01"));
        assert!(v("2013-08-06.1.0") < v("2013-08-06.2.0"));
        assert!(v("2013-08-06") < v("2013-08-06.0"));
    }

    #[test]
    fn test_date_only_differs_from_zero_major() {
        assert_ne!(v("2013-08-06"), v("2013-08-06.0"));
    }

    #[test]
    fn test_default_is_one_dot_zero() {
        assert_eq!(ApiVersion::default(), ApiVersion::new(1, 0));
        assert_eq!(ApiVersion::default().to_string(), "1.0");
    }

    #[test]
    fn test_from_ymd_rejects_invalid_dates() {
        assert!(ApiVersion::from_ymd(2013, 2, 29).is_err());
        assert!(ApiVersion::from_ymd(2012, 2, 29).is_ok());
        assert!(matches!(
            ApiVersion::from_ymd(2013, 13, 1),
            Err(ApiVersionParseError::InvalidGroupVersion { .. })
        ));
    }

    #[test]
    fn test_try_from_parts() {
        assert_eq!(
            ApiVersion::try_from_parts(None, Some(1), Some(2), Some("Beta")).unwrap(),
            v("1.2-Beta")
        );
        assert!(ApiVersion::try_from_parts(None, Some(-1), None, None).is_err());
        assert!(ApiVersion::try_from_parts(None, Some(1), Some(-3), None).is_err());
        assert!(ApiVersion::try_from_parts(None, None, Some(1), None).is_err());
        assert!(ApiVersion::try_from_parts(None, None, None, None).is_err());
        assert!(ApiVersion::try_from_parts(None, Some(1), None, Some("a-b")).is_err());
    }

    #[test]
    fn test_with_status_validates() {
        assert!(ApiVersion::new(1, 0).with_status("RC.1").is_ok());
        assert!(ApiVersion::new(1, 0).with_status("").is_err());
        assert!(ApiVersion::new(1, 0).with_status("RC..1").is_err());
        assert!(ApiVersion::new(1, 0).with_status("RC-1").is_err());
    }

    #[test]
    fn test_serde_uses_text_form() {
        let version = v("2013-08-06.1.1-Beta");
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"2013-08-06.1.1-Beta\"");

        let back: ApiVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, version);

        assert!(serde_json::from_str::<ApiVersion>("\"1.1-Alpha-1\"").is_err());
    }
}
