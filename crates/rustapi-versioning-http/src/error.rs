//! Error responses for versioned dispatch

use crate::report::report_versions;
use bytes::Bytes;
use http::{header, Method, StatusCode};
use http_body_util::Full;
use rustapi_versioning::{ApiVersion, RequestVersionError, SelectionError};
use serde::Serialize;
use thiserror::Error;

/// Response type produced for dispatch failures
pub type Response = http::Response<Full<Bytes>>;

/// Result type alias for dispatch
pub type Result<T, E = VersioningError> = std::result::Result<T, E>;

/// Everything that can stop a request from reaching a versioned handler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersioningError {
    /// No route matches the path
    #[error("no route matches {path}")]
    RouteNotFound {
        /// The path after version stripping
        path: String,
    },
    /// The route exists but not for this method
    #[error("method {method} is not allowed")]
    MethodNotAllowed {
        /// The request method
        method: Method,
        /// Methods registered on the route
        allowed: Vec<Method>,
    },
    /// The request carries an invalid or more than one version
    #[error(transparent)]
    Request(#[from] RequestVersionError),
    /// No unique candidate serves the version
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

impl VersioningError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Request(_) => StatusCode::BAD_REQUEST,
            Self::Selection(err) => match err {
                SelectionError::Unspecified { .. } | SelectionError::Unsupported { .. } => {
                    StatusCode::BAD_REQUEST
                }
                SelectionError::NotFound { .. } => StatusCode::NOT_FOUND,
                SelectionError::AmbiguousCandidates { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Error type identifier used in the JSON body
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => "not_found",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::Request(RequestVersionError::Invalid(_)) => "invalid_api_version",
            Self::Request(RequestVersionError::Ambiguous(_)) => "ambiguous_api_version",
            Self::Selection(SelectionError::Unspecified { .. }) => "api_version_unspecified",
            Self::Selection(SelectionError::Unsupported { .. }) => "unsupported_api_version",
            Self::Selection(SelectionError::NotFound { .. }) => "api_version_not_found",
            Self::Selection(SelectionError::AmbiguousCandidates { .. }) => "ambiguous_candidates",
        }
    }

    /// Versions to advertise alongside the error, if any
    fn reported(&self) -> Option<(&[ApiVersion], &[ApiVersion])> {
        match self {
            Self::Selection(SelectionError::Unspecified {
                supported,
                deprecated,
            })
            | Self::Selection(SelectionError::Unsupported {
                supported,
                deprecated,
                ..
            }) => Some((supported.as_slice(), deprecated.as_slice())),
            _ => None,
        }
    }

    /// Build the JSON error response
    ///
    /// With `report` set, unspecified and unsupported errors also carry the
    /// version advertisement headers.
    pub fn into_response(self, report: bool) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "versioned dispatch failed");
        } else {
            tracing::debug!(error = %self, status = %status, "versioned dispatch rejected request");
        }

        let body = serde_json::to_vec(&ErrorResponse::from(&self)).unwrap_or_else(|_| {
            br#"{"error":{"type":"internal_error","message":"Failed to serialize error"}}"#.to_vec()
        });

        let mut response = http::Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = status;
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Self::MethodNotAllowed { allowed, .. } = &self {
            let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
            if let Ok(value) = header::HeaderValue::from_str(&allow) {
                headers.insert(header::ALLOW, value);
            }
        }
        if report {
            if let Some((supported, deprecated)) = self.reported() {
                report_versions(supported, deprecated, headers);
            }
        }
        response
    }
}

/// JSON representation of a versioning error
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_versions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated_versions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<String>>,
}

impl From<&VersioningError> for ErrorResponse {
    fn from(err: &VersioningError) -> Self {
        let mut body = ErrorBody {
            error_type: err.error_type(),
            message: err.to_string(),
            requested_version: None,
            supported_versions: None,
            deprecated_versions: None,
            candidates: None,
        };

        match err {
            VersioningError::Request(RequestVersionError::Invalid(parse)) => {
                body.requested_version = parse.text().map(str::to_string);
            }
            VersioningError::Selection(SelectionError::Unspecified {
                supported,
                deprecated,
            }) => {
                body.supported_versions = Some(texts(supported));
                body.deprecated_versions = Some(texts(deprecated));
            }
            VersioningError::Selection(SelectionError::Unsupported {
                version,
                supported,
                deprecated,
            }) => {
                body.requested_version = Some(version.to_string());
                body.supported_versions = Some(texts(supported));
                body.deprecated_versions = Some(texts(deprecated));
            }
            VersioningError::Selection(SelectionError::NotFound { version }) => {
                body.requested_version = Some(version.to_string());
            }
            VersioningError::Selection(SelectionError::AmbiguousCandidates {
                version,
                candidates,
            }) => {
                body.requested_version = version.as_ref().map(ToString::to_string);
                body.candidates = Some(candidates.clone());
            }
            _ => {}
        }

        Self { error: body }
    }
}

fn texts(versions: &[ApiVersion]) -> Vec<String> {
    versions.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{API_DEPRECATED_VERSIONS, API_SUPPORTED_VERSIONS};
    use rustapi_versioning::{resolve_requested_version, AmbiguousApiVersionError};

    fn v(text: &str) -> ApiVersion {
        text.parse().unwrap()
    }

    fn unsupported() -> VersioningError {
        SelectionError::Unsupported {
            version: v("4.0"),
            supported: vec![v("1.0"), v("2.0")],
            deprecated: vec![v("0.9")],
        }
        .into()
    }

    #[test]
    fn test_status_mapping() {
        let invalid = resolve_requested_version(["abc"]).unwrap_err();
        assert_eq!(VersioningError::from(invalid).status(), StatusCode::BAD_REQUEST);

        let ambiguous = RequestVersionError::from(AmbiguousApiVersionError {
            values: vec!["1.0".into(), "2.0".into()],
        });
        assert_eq!(VersioningError::from(ambiguous).status(), StatusCode::BAD_REQUEST);

        assert_eq!(unsupported().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            VersioningError::from(SelectionError::NotFound { version: v("1.0") }).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            VersioningError::from(SelectionError::AmbiguousCandidates {
                version: None,
                candidates: vec!["a".into(), "b".into()],
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_json_body() {
        let body = serde_json::to_value(ErrorResponse::from(&unsupported())).unwrap();
        assert_eq!(body["error"]["type"], "unsupported_api_version");
        assert_eq!(body["error"]["requested_version"], "4.0");
        assert_eq!(body["error"]["supported_versions"], serde_json::json!(["1.0", "2.0"]));
        assert_eq!(body["error"]["deprecated_versions"], serde_json::json!(["0.9"]));
        assert!(body["error"].get("candidates").is_none());
    }

    #[test]
    fn test_response_reports_versions_when_enabled() {
        let response = unsupported().into_response(true);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[API_SUPPORTED_VERSIONS], "1.0, 2.0");
        assert_eq!(response.headers()[API_DEPRECATED_VERSIONS], "0.9");

        let response = unsupported().into_response(false);
        assert!(!response.headers().contains_key(API_SUPPORTED_VERSIONS));
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let err = VersioningError::MethodNotAllowed {
            method: Method::DELETE,
            allowed: vec![Method::GET, Method::POST],
        };
        let response = err.into_response(false);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, POST");
    }
}
