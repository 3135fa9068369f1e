//! HTTP integration for RustAPI versioning
//!
//! This crate connects [`rustapi_versioning`] to `http` requests: it reads
//! raw versions from a request, dispatches to the handler revision the
//! candidate selector picks, advertises supported versions and turns
//! failures into JSON error responses.
//!
//! # Features
//!
//! - Query string, header, media type and URL segment readers
//! - `matchit`-backed route table holding every revision of an endpoint
//! - `api-supported-versions` / `api-deprecated-versions` headers
//! - Environment configuration via `API_VERSIONING_*` variables
//!
//! # Usage
//!
//! ```rust
//! use http::{Method, Request, StatusCode};
//! use rustapi_versioning::{ApiVersion, ApiVersionMetadata, VersionDeclarationBuilder, VersionedHandler};
//! use rustapi_versioning_http::VersionedRoutes;
//!
//! let v1 = VersionDeclarationBuilder::endpoint().supports(ApiVersion::new(1, 0)).build();
//! let routes = VersionedRoutes::new().route(
//!     Method::GET,
//!     "/orders",
//!     VersionedHandler::new("list_orders", ApiVersionMetadata::new(Default::default(), v1), ()),
//! );
//!
//! let (parts, _) = Request::get("/orders?api-version=3.0").body(()).unwrap().into_parts();
//! let err = routes.dispatch(&parts).unwrap_err();
//! assert_eq!(routes.error_response(err).status(), StatusCode::BAD_REQUEST);
//! ```

mod config;
mod error;
mod reader;
mod report;
mod routes;

pub use config::{ConfigError, VersioningConfig, ENV_PREFIX};
pub use error::{Response, Result, VersioningError};
pub use reader::{
    default_reader, ApiVersionReader, CombinedReader, HeaderReader, MediaTypeReader,
    QueryStringReader, UrlSegmentReader, DEFAULT_MEDIA_TYPE_PARAMETER, DEFAULT_PARAMETER,
    DEFAULT_URL_PATTERN,
};
pub use report::{report_api_versions, report_versions, API_DEPRECATED_VERSIONS, API_SUPPORTED_VERSIONS};
pub use routes::{Dispatch, RouteConflictError, VersionedRoutes};
