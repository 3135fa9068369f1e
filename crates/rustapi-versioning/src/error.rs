//! Error types for API version parsing and candidate selection

use crate::version::ApiVersion;
use thiserror::Error;

/// Result type alias for versioning operations
pub type Result<T, E = SelectionError> = std::result::Result<T, E>;

/// Error produced when text or components cannot form an [`ApiVersion`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiVersionParseError {
    /// The text does not follow the API version grammar
    #[error("the value '{text}' is not a valid API version")]
    Invalid {
        /// The offending text
        text: String,
    },
    /// The text starts with a date that does not exist on the calendar
    #[error("the value '{text}' does not contain a valid group version date")]
    InvalidGroupVersion {
        /// The offending text
        text: String,
    },
    /// The status suffix contains characters outside `token ("." token)*`
    #[error("the value '{text}' contains an invalid API version status '{status}'")]
    InvalidStatus {
        /// The offending text
        text: String,
        /// The status portion that was rejected
        status: String,
    },
    /// Components passed to a constructor cannot form a version
    #[error("invalid API version components: {reason}")]
    InvalidComponents {
        /// Why the components were rejected
        reason: String,
    },
}

impl ApiVersionParseError {
    pub(crate) fn invalid(text: &str) -> Self {
        Self::Invalid {
            text: text.to_string(),
        }
    }

    /// The text that failed to parse, if the error came from parsing
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Invalid { text }
            | Self::InvalidGroupVersion { text }
            | Self::InvalidStatus { text, .. } => Some(text),
            Self::InvalidComponents { .. } => None,
        }
    }
}

/// More than one distinct API version was supplied in a single request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("the request specified more than one API version: {}", .values.join(", "))]
pub struct AmbiguousApiVersionError {
    /// The distinct raw values, in the order they were read
    pub values: Vec<String>,
}

/// Failure to turn the raw values read from a request into one version
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestVersionError {
    /// The single supplied value is not a valid API version
    #[error(transparent)]
    Invalid(#[from] ApiVersionParseError),
    /// Several distinct values were supplied
    #[error(transparent)]
    Ambiguous(#[from] AmbiguousApiVersionError),
}

/// Terminal outcome of candidate selection other than a match
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// No version was requested and none may be assumed
    #[error("an API version is required, but was not specified")]
    Unspecified {
        /// Versions advertised as supported by the route
        supported: Vec<ApiVersion>,
        /// Versions advertised as deprecated by the route
        deprecated: Vec<ApiVersion>,
    },
    /// Two or more candidates tie for the best match
    #[error(
        "the request matched multiple candidates for API version {}: {}",
        describe(.version),
        .candidates.join(", ")
    )]
    AmbiguousCandidates {
        /// The effective version, absent when none was requested
        version: Option<ApiVersion>,
        /// Names of every tied candidate
        candidates: Vec<String>,
    },
    /// The version is implemented by the route group, but no candidate maps to it
    #[error("no candidate on this route maps to API version {version}")]
    NotFound {
        /// The effective version
        version: ApiVersion,
    },
    /// The version is not implemented anywhere in the route group
    #[error("API version {version} is not supported")]
    Unsupported {
        /// The effective version
        version: ApiVersion,
        /// Versions advertised as supported by the route
        supported: Vec<ApiVersion>,
        /// Versions advertised as deprecated by the route
        deprecated: Vec<ApiVersion>,
    },
}

fn describe(version: &Option<ApiVersion>) -> String {
    match version {
        Some(version) => version.to_string(),
        None => "(unspecified)".to_string(),
    }
}
