//! Version readers
//!
//! Readers collect the raw version values a request carries. They never
//! parse; reducing the values to one version is left to
//! [`ApiVersionParser::resolve_requested`](rustapi_versioning::ApiVersionParser::resolve_requested).

use http::header::{ACCEPT, CONTENT_TYPE};
use http::request::Parts;
use http::HeaderName;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Default query parameter and header name
pub const DEFAULT_PARAMETER: &str = "api-version";

/// Default media type parameter
pub const DEFAULT_MEDIA_TYPE_PARAMETER: &str = "v";

/// Default URL segment pattern
pub const DEFAULT_URL_PATTERN: &str = "/v{version}/";

static DEFAULT_READER: OnceLock<CombinedReader> = OnceLock::new();

/// Reads raw API version values from a request
pub trait ApiVersionReader: Send + Sync + fmt::Debug {
    /// Every raw value found, in the order encountered
    fn read(&self, parts: &Parts) -> Vec<String>;

    /// The path used for route matching
    ///
    /// Readers that embed the version in the path strip it here.
    fn route_path<'a>(&self, path: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(path)
    }
}

/// The shared query string plus URL segment reader
pub fn default_reader() -> &'static CombinedReader {
    DEFAULT_READER.get_or_init(|| {
        CombinedReader::new()
            .with(QueryStringReader::default())
            .with(UrlSegmentReader::default())
    })
}

/// Reads `?api-version=1.0`
#[derive(Debug, Clone)]
pub struct QueryStringReader {
    names: Vec<String>,
}

impl QueryStringReader {
    /// Read the given parameter, compared case-insensitively
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
        }
    }

    /// Also read `name`
    pub fn or(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }
}

impl Default for QueryStringReader {
    fn default() -> Self {
        Self::new(DEFAULT_PARAMETER)
    }
}

impl ApiVersionReader for QueryStringReader {
    fn read(&self, parts: &Parts) -> Vec<String> {
        let Some(query) = parts.uri.query() else {
            return Vec::new();
        };
        let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
            Ok(pairs) => pairs,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring malformed query string");
                return Vec::new();
            }
        };
        pairs
            .into_iter()
            .filter(|(key, _)| self.names.iter().any(|n| n.eq_ignore_ascii_case(key)))
            .map(|(_, value)| value)
            .collect()
    }
}

/// Reads `api-version: 1.0`
///
/// A header holding a comma-separated list contributes every item.
#[derive(Debug, Clone)]
pub struct HeaderReader {
    names: Vec<HeaderName>,
}

impl HeaderReader {
    /// Read the given header
    pub fn new(name: HeaderName) -> Self {
        Self { names: vec![name] }
    }

    /// Also read `name`
    pub fn or(mut self, name: HeaderName) -> Self {
        self.names.push(name);
        self
    }
}

impl Default for HeaderReader {
    fn default() -> Self {
        Self::new(HeaderName::from_static(DEFAULT_PARAMETER))
    }
}

impl ApiVersionReader for HeaderReader {
    fn read(&self, parts: &Parts) -> Vec<String> {
        let mut values = Vec::new();
        for name in &self.names {
            for value in parts.headers.get_all(name) {
                match value.to_str() {
                    Ok(text) => values.extend(
                        text.split(',')
                            .map(str::trim)
                            .filter(|v| !v.is_empty())
                            .map(str::to_string),
                    ),
                    Err(_) => tracing::debug!(header = %name, "ignoring non-ASCII header value"),
                }
            }
        }
        values
    }
}

/// Reads a media type parameter: `Accept: application/json; v=2.0`
///
/// Both `Accept` and `Content-Type` are inspected.
#[derive(Debug, Clone)]
pub struct MediaTypeReader {
    parameter: String,
}

impl MediaTypeReader {
    /// Read the given media type parameter
    pub fn new(parameter: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
        }
    }
}

impl Default for MediaTypeReader {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIA_TYPE_PARAMETER)
    }
}

impl ApiVersionReader for MediaTypeReader {
    fn read(&self, parts: &Parts) -> Vec<String> {
        let mut values = Vec::new();
        for header in [ACCEPT, CONTENT_TYPE] {
            for value in parts.headers.get_all(&header) {
                let Ok(text) = value.to_str() else {
                    continue;
                };
                for media_type in text.split(',') {
                    let parameters = media_type.split(';').skip(1);
                    for parameter in parameters {
                        let Some((key, value)) = parameter.split_once('=') else {
                            continue;
                        };
                        if key.trim().eq_ignore_ascii_case(&self.parameter) {
                            values.push(value.trim().trim_matches('"').to_string());
                        }
                    }
                }
            }
        }
        values
    }
}

/// Reads the version embedded in the path: `/v2.0/orders`
///
/// The pattern is matched segment by segment from the start of the path, so
/// a version only counts at the position the pattern puts it:
/// `/v{version}/` reads `/v2/items/v8` as `2` and `/items/v8` as nothing.
/// The segment holding `{version}` must start with a digit once its literal
/// text is removed, so `/values/` does not match `/v{version}/`.
///
/// For route matching only the version segment is removed; literal segments
/// around it stay. `/api/{version}/` turns `/api/2013-08-06/orders` into
/// `/api/orders`, and `/v{version}/` turns `/v1/orders` into `/orders`.
#[derive(Debug, Clone)]
pub struct UrlSegmentReader {
    pattern: Option<SegmentPattern>,
}

#[derive(Debug, Clone)]
struct SegmentPattern {
    leading: Vec<String>,
    prefix: String,
    suffix: String,
    trailing: Vec<String>,
}

impl UrlSegmentReader {
    /// Create a reader for `pattern`
    ///
    /// A pattern without `{version}` never matches.
    pub fn new(pattern: &str) -> Self {
        let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let pattern = segments
            .iter()
            .position(|s| s.contains("{version}"))
            .and_then(|index| {
                let (prefix, suffix) = segments[index].split_once("{version}")?;
                Some(SegmentPattern {
                    leading: segments[..index].iter().map(|s| s.to_string()).collect(),
                    prefix: prefix.to_string(),
                    suffix: suffix.to_string(),
                    trailing: segments[index + 1..].iter().map(|s| s.to_string()).collect(),
                })
            });
        if pattern.is_none() {
            tracing::warn!("URL segment pattern has no {{version}} placeholder");
        }
        Self { pattern }
    }

    /// Locate the version segment within `path`: (segment start, version, segment end)
    fn locate<'a>(&self, path: &'a str) -> Option<(usize, &'a str, usize)> {
        let pattern = self.pattern.as_ref()?;

        let mut segments = Vec::new();
        let mut offset = 0;
        for segment in path.split('/') {
            if !segment.is_empty() {
                segments.push((offset, segment));
            }
            offset += segment.len() + 1;
        }

        let index = pattern.leading.len();
        if segments.len() < index + 1 + pattern.trailing.len() {
            return None;
        }
        let literals_match = |expected: &[String], actual: &[(usize, &str)]| {
            expected.iter().zip(actual).all(|(e, (_, a))| e == a)
        };
        if !literals_match(&pattern.leading, &segments[..index])
            || !literals_match(&pattern.trailing, &segments[index + 1..])
        {
            return None;
        }

        let (start, segment) = segments[index];
        let version = segment
            .strip_prefix(pattern.prefix.as_str())?
            .strip_suffix(pattern.suffix.as_str())?;
        if !version.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        Some((start, version, start + segment.len()))
    }
}

impl Default for UrlSegmentReader {
    fn default() -> Self {
        Self::new(DEFAULT_URL_PATTERN)
    }
}

impl ApiVersionReader for UrlSegmentReader {
    fn read(&self, parts: &Parts) -> Vec<String> {
        self.locate(parts.uri.path())
            .map(|(_, version, _)| vec![version.to_string()])
            .unwrap_or_default()
    }

    fn route_path<'a>(&self, path: &'a str) -> Cow<'a, str> {
        let Some((start, _, end)) = self.locate(path) else {
            return Cow::Borrowed(path);
        };
        let before = &path[..start];
        match path[end..].strip_prefix('/') {
            Some(rest) if !rest.is_empty() => Cow::Owned(format!("{}{}", before, rest)),
            _ => match before.trim_end_matches('/') {
                "" => Cow::Borrowed("/"),
                trimmed => Cow::Borrowed(trimmed),
            },
        }
    }
}

/// Every value from several readers, in reader order
#[derive(Debug, Clone, Default)]
pub struct CombinedReader {
    readers: Vec<Arc<dyn ApiVersionReader>>,
}

impl CombinedReader {
    /// An empty combination
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reader
    pub fn with(mut self, reader: impl ApiVersionReader + 'static) -> Self {
        self.readers.push(Arc::new(reader));
        self
    }

    /// Append a shared reader
    pub fn with_shared(mut self, reader: Arc<dyn ApiVersionReader>) -> Self {
        self.readers.push(reader);
        self
    }
}

impl ApiVersionReader for CombinedReader {
    fn read(&self, parts: &Parts) -> Vec<String> {
        self.readers.iter().flat_map(|r| r.read(parts)).collect()
    }

    fn route_path<'a>(&self, path: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(path);
        for reader in &self.readers {
            let stripped = match reader.route_path(&current) {
                Cow::Owned(stripped) => Some(stripped),
                Cow::Borrowed(_) => None,
            };
            if let Some(stripped) = stripped {
                current = Cow::Owned(stripped);
            }
        }
        current
    }
}

impl ApiVersionReader for &'static CombinedReader {
    fn read(&self, parts: &Parts) -> Vec<String> {
        (**self).read(parts)
    }

    fn route_path<'a>(&self, path: &'a str) -> Cow<'a, str> {
        (**self).route_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    fn parts(uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_query_string() {
        let reader = QueryStringReader::default();
        assert_eq!(reader.read(&parts("/orders?api-version=2.0", &[])), vec!["2.0"]);
        assert_eq!(
            reader.read(&parts("/orders?API-Version=1.0&x=1&api-version=2013-08-06", &[])),
            vec!["1.0", "2013-08-06"]
        );
        assert!(reader.read(&parts("/orders", &[])).is_empty());

        let reader = QueryStringReader::new("v").or("version");
        assert_eq!(reader.read(&parts("/orders?version=3.0", &[])), vec!["3.0"]);
    }

    #[test]
    fn test_header() {
        let reader = HeaderReader::default();
        assert_eq!(
            reader.read(&parts("/", &[("api-version", "1.0, 2.0"), ("api-version", "3.0")])),
            vec!["1.0", "2.0", "3.0"]
        );

        let reader = HeaderReader::new(HeaderName::from_static("x-ms-version"));
        assert_eq!(reader.read(&parts("/", &[("x-ms-version", "2013-08-06")])), vec!["2013-08-06"]);
    }

    #[test]
    fn test_media_type() {
        let reader = MediaTypeReader::default();
        assert_eq!(
            reader.read(&parts("/", &[("accept", "text/plain, application/json; q=0.9; v=\"2.0\"")])),
            vec!["2.0"]
        );
        assert_eq!(
            reader.read(&parts("/", &[("content-type", "application/json;V=1.1-beta")])),
            vec!["1.1-beta"]
        );
        assert!(reader.read(&parts("/", &[("accept", "application/json")])).is_empty());
    }

    #[test]
    fn test_url_segment() {
        let reader = UrlSegmentReader::default();
        assert_eq!(reader.read(&parts("/v2.0/orders", &[])), vec!["2.0"]);
        assert_eq!(reader.read(&parts("/v1", &[])), vec!["1"]);
        assert!(reader.read(&parts("/values/orders", &[])).is_empty());

        assert_eq!(reader.route_path("/v2.0/orders"), "/orders");
        assert_eq!(reader.route_path("/v1/orders/42"), "/orders/42");
        assert_eq!(reader.route_path("/v1"), "/");
        assert_eq!(reader.route_path("/values"), "/values");

        let reader = UrlSegmentReader::new("/api/{version}/");
        assert_eq!(reader.read(&parts("/api/2013-08-06/orders", &[])), vec!["2013-08-06"]);
        assert_eq!(reader.route_path("/api/2013-08-06/orders"), "/api/orders");
        assert_eq!(reader.route_path("/api/2013-08-06"), "/api");

        let reader = UrlSegmentReader::new("/static/");
        assert!(reader.read(&parts("/static/1/orders", &[])).is_empty());
    }

    #[test]
    fn test_url_segment_only_matches_at_pattern_position() {
        let reader = UrlSegmentReader::default();
        for path in ["/items/v8engine", "/items/v2", "/api/v1/orders/42", "/values/v3"] {
            assert!(reader.read(&parts(path, &[])).is_empty(), "{}", path);
            assert_eq!(reader.route_path(path), path);
        }
        assert_eq!(reader.read(&parts("/v2/items/v8", &[])), vec!["2"]);
        assert_eq!(reader.route_path("/v2/items/v8"), "/items/v8");

        let reader = UrlSegmentReader::new("/api/v{version}/");
        assert_eq!(reader.route_path("/api/v3/orders"), "/api/orders");
        assert!(reader.read(&parts("/v3/api/orders", &[])).is_empty());
    }

    #[test]
    fn test_combined_keeps_reader_order() {
        let reader = CombinedReader::new()
            .with(HeaderReader::default())
            .with(QueryStringReader::default());
        assert_eq!(
            reader.read(&parts("/?api-version=2.0", &[("api-version", "1.0")])),
            vec!["1.0", "2.0"]
        );
    }

    #[test]
    fn test_default_reader() {
        let reader = default_reader();
        assert_eq!(reader.read(&parts("/v1/orders?api-version=1", &[])), vec!["1", "1"]);
        assert_eq!(reader.route_path("/v1/orders"), "/orders");
        assert!(std::ptr::eq(reader, default_reader()));
    }
}
