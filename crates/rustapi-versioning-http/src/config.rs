//! Configuration from environment variables
//!
//! Every setting is read from a variable prefixed with `API_VERSIONING_`:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `API_VERSIONING_DEFAULT_VERSION` | `1.0` |
//! | `API_VERSIONING_ASSUME_DEFAULT` | `false` |
//! | `API_VERSIONING_REPORT_VERSIONS` | `false` |
//! | `API_VERSIONING_SELECTOR` | `default` |
//! | `API_VERSIONING_QUERY_PARAMETERS` | `api-version` |
//! | `API_VERSIONING_HEADERS` | none |
//! | `API_VERSIONING_MEDIA_TYPE_PARAMETER` | none |
//! | `API_VERSIONING_URL_PATTERN` | `/v{version}/` |
//! | `API_VERSIONING_LENIENT` | `false` |
//!
//! List values are comma-separated. An empty `API_VERSIONING_URL_PATTERN`
//! disables URL segment versioning.

use crate::reader::{
    ApiVersionReader, CombinedReader, HeaderReader, MediaTypeReader, QueryStringReader,
    UrlSegmentReader, DEFAULT_PARAMETER, DEFAULT_URL_PATTERN,
};
use crate::routes::VersionedRoutes;
use http::HeaderName;
use rustapi_versioning::{ApiVersion, ApiVersionParser, ApiVersioningOptions, SelectorPolicy};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Prefix of every configuration variable
pub const ENV_PREFIX: &str = "API_VERSIONING_";

/// Failure to load or apply configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable could not be deserialized
    #[error("configuration error: {0}")]
    Env(#[from] envy::Error),
    /// A configured header name is not a valid HTTP header name
    #[error("invalid header name in API_VERSIONING_HEADERS: {name}")]
    InvalidHeaderName {
        /// The offending name
        name: String,
    },
}

/// Versioning settings for an HTTP service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Version assumed by the default selector policy
    pub default_version: ApiVersion,
    /// Assume a version when the request has none
    pub assume_default: bool,
    /// Advertise supported and deprecated versions
    pub report_versions: bool,
    /// Policy choosing the assumed version
    pub selector: SelectorPolicy,
    /// Query parameters carrying the version
    pub query_parameters: Vec<String>,
    /// Headers carrying the version
    pub headers: Vec<String>,
    /// Media type parameter carrying the version
    pub media_type_parameter: Option<String>,
    /// URL segment pattern, empty to disable
    pub url_pattern: String,
    /// Accept a `v` prefix on version text
    pub lenient: bool,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            default_version: ApiVersion::default(),
            assume_default: false,
            report_versions: false,
            selector: SelectorPolicy::Default,
            query_parameters: vec![DEFAULT_PARAMETER.to_string()],
            headers: Vec::new(),
            media_type_parameter: None,
            url_pattern: DEFAULT_URL_PATTERN.to_string(),
            lenient: false,
        }
    }
}

impl VersioningConfig {
    /// Load from `API_VERSIONING_*` variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Self = envy::prefixed(ENV_PREFIX).from_env()?;
        tracing::debug!(?config, "loaded API versioning configuration");
        Ok(config)
    }

    /// Load a `.env` file if present, then read the environment
    ///
    /// Variables already set take precedence over the file.
    pub fn from_env_with_dotenv() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            tracing::debug!(error = %err, "no .env file loaded");
        }
        Self::from_env()
    }

    /// Selection options
    pub fn options(&self) -> ApiVersioningOptions {
        ApiVersioningOptions::new()
            .default_version(self.default_version.clone())
            .assume_default_when_unspecified(self.assume_default)
            .report_versions(self.report_versions)
            .selector(self.selector)
    }

    /// Parser for raw values
    pub fn parser(&self) -> ApiVersionParser {
        if self.lenient {
            ApiVersionParser::lenient()
        } else {
            ApiVersionParser::new()
        }
    }

    /// The configured readers, in the order query, header, media type, URL segment
    pub fn reader(&self) -> Result<Arc<dyn ApiVersionReader>, ConfigError> {
        let mut reader = CombinedReader::new();

        let mut names = self.query_parameters.iter().filter(|n| !n.is_empty());
        if let Some(first) = names.next() {
            reader = reader.with(names.fold(QueryStringReader::new(first.as_str()), |r, n| {
                r.or(n.as_str())
            }));
        }

        let mut headers = Vec::new();
        for name in self.headers.iter().filter(|n| !n.is_empty()) {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConfigError::InvalidHeaderName { name: name.clone() })?;
            headers.push(header);
        }
        let mut headers = headers.into_iter();
        if let Some(first) = headers.next() {
            reader = reader.with(headers.fold(HeaderReader::new(first), HeaderReader::or));
        }

        if let Some(parameter) = self.media_type_parameter.as_deref().filter(|p| !p.is_empty()) {
            reader = reader.with(MediaTypeReader::new(parameter));
        }

        if !self.url_pattern.is_empty() {
            reader = reader.with(UrlSegmentReader::new(&self.url_pattern));
        }

        Ok(Arc::new(reader))
    }

    /// An empty route table wired with this configuration
    pub fn routes<H>(&self) -> Result<VersionedRoutes<H>, ConfigError> {
        Ok(VersionedRoutes::with_options(self.options())
            .shared_reader(self.reader()?)
            .parser(self.parser()))
    }
}
