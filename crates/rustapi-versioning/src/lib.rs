//! API versioning for RustAPI
//!
//! This crate provides the transport-independent half of API versioning:
//! the version value type, version models attached to groups and endpoints,
//! and the selector that picks one handler per request.
//!
//! # Features
//!
//! - `ApiVersion` parsing, formatting and total ordering
//! - Declaration builders for groups, endpoints and actions
//! - Model aggregation for version advertisement
//! - Explicit-over-implicit candidate selection with ambiguity detection
//! - Pluggable policies for requests that carry no version
//!
//! # Version text
//!
//! A version is a group date, a numeric `major[.minor]`, or both, optionally
//! followed by a status: `2013-08-06`, `1.0`, `2013-08-06.1.0-Beta`.
//!
//! [`ApiVersion::format`] renders a version from a format string:
//!
//! | Token | Output |
//! |-------|--------|
//! | empty or `F` | full text |
//! | `G` | group date |
//! | `GG` | group date and status |
//! | `V` | major (empty when alone) |
//! | `VV` | `major.minor` |
//! | `VVV` | `major.minor` and status |
//! | `S` | status |
//! | `%V` / `%v` | major / minor |
//! | `'text'` | literal text |
//!
//! # Usage
//!
//! ```rust
//! use rustapi_versioning::{
//!     ApiVersion, ApiVersionMetadata, CandidateSelector, VersionDeclarationBuilder,
//!     VersionedHandler,
//! };
//!
//! let group = VersionDeclarationBuilder::group()
//!     .supports(ApiVersion::new(1, 0))
//!     .supports(ApiVersion::new(2, 0))
//!     .build();
//! let v2 = VersionDeclarationBuilder::action()
//!     .maps_to(ApiVersion::new(2, 0))
//!     .build();
//!
//! let candidates = vec![
//!     VersionedHandler::new("list_orders", ApiVersionMetadata::new(group.clone(), Default::default()), "v1"),
//!     VersionedHandler::new("list_orders_v2", ApiVersionMetadata::new(group, v2), "v2"),
//! ];
//!
//! let selector = CandidateSelector::default();
//! let selected = selector
//!     .select(Some(&ApiVersion::new(2, 0)), &candidates)
//!     .unwrap();
//! assert_eq!(*selected.candidate.handler(), "v2");
//! ```

#[macro_use]
mod tracing_macros;

mod builder;
mod error;
mod format;
mod metadata;
mod model;
mod options;
mod parser;
mod request;
mod selection;
mod selector;
mod version;

pub use builder::{ActionScope, EndpointScope, GroupScope, Scope, VersionDeclarationBuilder};
pub use error::{
    AmbiguousApiVersionError, ApiVersionParseError, RequestVersionError, Result, SelectionError,
};
pub use metadata::{ApiVersionMapping, ApiVersionMetadata};
pub use model::{format_versions, ApiVersionModel, ApiVersionSet};
pub use options::ApiVersioningOptions;
pub use parser::ApiVersionParser;
pub use request::resolve_requested_version;
pub use selection::{Candidate, CandidateSelector, Selected, VersionOrigin, VersionedHandler};
pub use selector::{
    ApiVersionSelector, ConstantApiVersionSelector, CurrentImplementationApiVersionSelector,
    DefaultApiVersionSelector, LowestImplementedApiVersionSelector, SelectionContext,
    SelectorPolicy,
};
pub use version::ApiVersion;

/// Re-exported so callers can build group versions without a direct dependency
pub use chrono::NaiveDate;
