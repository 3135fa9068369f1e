//! Versioning options

use crate::selector::SelectorPolicy;
use crate::version::ApiVersion;
use serde::{Deserialize, Serialize};

/// Options steering candidate selection
///
/// Every field has a default, so partial configuration deserializes:
///
/// ```rust
/// use rustapi_versioning::{ApiVersion, ApiVersioningOptions, SelectorPolicy};
///
/// let options: ApiVersioningOptions = serde_json::from_str(
///     r#"{ "assume_default_version_when_unspecified": true, "selector": "current-implementation" }"#,
/// ).unwrap();
///
/// assert_eq!(options.default_api_version, ApiVersion::new(1, 0));
/// assert_eq!(options.selector, SelectorPolicy::CurrentImplementation);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiVersioningOptions {
    /// Version the default selector policy assumes
    pub default_api_version: ApiVersion,
    /// Assume a version through the selector policy when none is requested
    pub assume_default_version_when_unspecified: bool,
    /// Advertise supported and deprecated versions in responses
    pub report_api_versions: bool,
    /// Policy used when a version must be assumed
    pub selector: SelectorPolicy,
}

impl Default for ApiVersioningOptions {
    fn default() -> Self {
        Self {
            default_api_version: ApiVersion::default(),
            assume_default_version_when_unspecified: false,
            report_api_versions: false,
            selector: SelectorPolicy::Default,
        }
    }
}

impl ApiVersioningOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default version
    pub fn default_version(mut self, version: ApiVersion) -> Self {
        self.default_api_version = version;
        self
    }

    /// Assume a version when the request has none
    pub fn assume_default_when_unspecified(mut self, assume: bool) -> Self {
        self.assume_default_version_when_unspecified = assume;
        self
    }

    /// Advertise supported and deprecated versions
    pub fn report_versions(mut self, report: bool) -> Self {
        self.report_api_versions = report;
        self
    }

    /// Choose the selector policy
    pub fn selector(mut self, selector: SelectorPolicy) -> Self {
        self.selector = selector;
        self
    }
}
