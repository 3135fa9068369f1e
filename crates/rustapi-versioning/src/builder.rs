//! Declaring versions without attributes
//!
//! A host framework describes each declaration level with a
//! [`VersionDeclarationBuilder`] and composes the resulting models through
//! [`ApiVersionModel::aggregate`] or [`ApiVersionMetadata::layered`].
//!
//! ```rust
//! use rustapi_versioning::{ApiVersion, ApiVersionMetadata, VersionDeclarationBuilder};
//!
//! let group = VersionDeclarationBuilder::group()
//!     .supports(ApiVersion::new(2, 0))
//!     .deprecates(ApiVersion::new(1, 0))
//!     .build();
//! let endpoint = VersionDeclarationBuilder::endpoint().build();
//! let action = VersionDeclarationBuilder::action()
//!     .maps_to(ApiVersion::new(2, 0))
//!     .build();
//!
//! let metadata = ApiVersionMetadata::layered(&group, &endpoint, action);
//! assert!(metadata.is_mapped_to(&ApiVersion::new(2, 0)));
//! ```

use crate::model::{ApiVersionModel, ApiVersionSet};
use crate::version::ApiVersion;
use std::fmt;
use std::marker::PhantomData;

mod sealed {
    pub trait Sealed {}
}

/// The declaration level a builder describes
pub trait Scope: sealed::Sealed {
    /// Name used in diagnostics
    const NAME: &'static str;
}

/// A group of endpoints sharing a version set
#[derive(Debug, Clone, Copy)]
pub enum GroupScope {}

/// A single endpoint (controller)
#[derive(Debug, Clone, Copy)]
pub enum EndpointScope {}

/// A single action on an endpoint
#[derive(Debug, Clone, Copy)]
pub enum ActionScope {}

impl sealed::Sealed for GroupScope {}
impl sealed::Sealed for EndpointScope {}
impl sealed::Sealed for ActionScope {}

impl Scope for GroupScope {
    const NAME: &'static str = "group";
}

impl Scope for EndpointScope {
    const NAME: &'static str = "endpoint";
}

impl Scope for ActionScope {
    const NAME: &'static str = "action";
}

/// Collects the version declarations of one level
pub struct VersionDeclarationBuilder<S: Scope> {
    supported: ApiVersionSet,
    deprecated: ApiVersionSet,
    mapped: ApiVersionSet,
    advertised: ApiVersionSet,
    advertised_deprecated: ApiVersionSet,
    neutral: bool,
    _scope: PhantomData<fn() -> S>,
}

impl VersionDeclarationBuilder<GroupScope> {
    /// Start declaring a group
    pub fn group() -> Self {
        Self::new()
    }
}

impl VersionDeclarationBuilder<EndpointScope> {
    /// Start declaring an endpoint
    pub fn endpoint() -> Self {
        Self::new()
    }
}

impl VersionDeclarationBuilder<ActionScope> {
    /// Start declaring an action
    pub fn action() -> Self {
        Self::new()
    }

    /// Map the action to a version implemented by its endpoint or group
    ///
    /// The version becomes declared (and therefore explicit) without the
    /// action claiming to implement it.
    pub fn maps_to(mut self, version: ApiVersion) -> Self {
        self.mapped.insert(version);
        self
    }
}

impl<S: Scope> VersionDeclarationBuilder<S> {
    /// Start an empty declaration
    pub fn new() -> Self {
        Self {
            supported: ApiVersionSet::new(),
            deprecated: ApiVersionSet::new(),
            mapped: ApiVersionSet::new(),
            advertised: ApiVersionSet::new(),
            advertised_deprecated: ApiVersionSet::new(),
            neutral: false,
            _scope: PhantomData,
        }
    }

    /// Declare a supported version
    pub fn supports(mut self, version: ApiVersion) -> Self {
        self.supported.insert(version);
        self
    }

    /// Declare several supported versions
    pub fn supports_all(mut self, versions: impl IntoIterator<Item = ApiVersion>) -> Self {
        self.supported.extend(versions);
        self
    }

    /// Declare a deprecated version
    pub fn deprecates(mut self, version: ApiVersion) -> Self {
        self.deprecated.insert(version);
        self
    }

    /// Advertise a version supported elsewhere
    pub fn advertises(mut self, version: ApiVersion) -> Self {
        self.advertised.insert(version);
        self
    }

    /// Advertise a version deprecated elsewhere
    pub fn advertises_deprecated(mut self, version: ApiVersion) -> Self {
        self.advertised_deprecated.insert(version);
        self
    }

    /// Mark the level as ignoring versioning
    pub fn version_neutral(mut self) -> Self {
        self.neutral = true;
        self
    }

    /// Produce the model
    ///
    /// A neutral declaration discards every listed version.
    pub fn build(self) -> ApiVersionModel {
        if self.neutral {
            if self.has_versions() {
                trace_warn!(
                    scope = S::NAME,
                    "version-neutral declaration also lists versions; they are ignored"
                );
            }
            return ApiVersionModel::neutral();
        }

        let declared: ApiVersionSet = self
            .supported
            .iter()
            .chain(&self.deprecated)
            .chain(&self.mapped)
            .cloned()
            .collect();

        ApiVersionModel::new(
            declared,
            self.supported,
            self.deprecated,
            self.advertised,
            self.advertised_deprecated,
        )
    }

    fn has_versions(&self) -> bool {
        !(self.supported.is_empty()
            && self.deprecated.is_empty()
            && self.mapped.is_empty()
            && self.advertised.is_empty()
            && self.advertised_deprecated.is_empty())
    }
}

impl<S: Scope> Default for VersionDeclarationBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scope> fmt::Debug for VersionDeclarationBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionDeclarationBuilder")
            .field("scope", &S::NAME)
            .field("supported", &self.supported)
            .field("deprecated", &self.deprecated)
            .field("mapped", &self.mapped)
            .field("advertised", &self.advertised)
            .field("advertised_deprecated", &self.advertised_deprecated)
            .field("neutral", &self.neutral)
            .finish()
    }
}
