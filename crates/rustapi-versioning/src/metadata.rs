//! Per-candidate version metadata
//!
//! Pairs the model of the enclosing group (implicit versions) with the model
//! declared on the candidate itself (explicit versions).

use crate::model::{ApiVersionModel, ApiVersionSet, EMPTY_MODEL};
use crate::version::ApiVersion;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

/// How a candidate relates to a version
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ApiVersionMapping(u8);

impl ApiVersionMapping {
    /// Not mapped
    pub const NONE: Self = Self(0);
    /// Declared directly on the candidate
    pub const EXPLICIT: Self = Self(0b01);
    /// Inherited from the enclosing group
    pub const IMPLICIT: Self = Self(0b10);

    /// Whether every flag in `other` is set
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ApiVersionMapping {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ApiVersionMapping {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for ApiVersionMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NONE => f.write_str("None"),
            Self::EXPLICIT => f.write_str("Explicit"),
            Self::IMPLICIT => f.write_str("Implicit"),
            _ => f.write_str("Explicit | Implicit"),
        }
    }
}

/// Version metadata attached to one candidate handler
///
/// Built once while the route table is assembled and shared read-only
/// afterwards; cloning only bumps a reference count.
#[derive(Clone)]
pub struct ApiVersionMetadata {
    inner: Arc<MetadataInner>,
}

struct MetadataInner {
    api_model: ApiVersionModel,
    endpoint_model: ApiVersionModel,
    merged: ApiVersionModel,
    name: Option<String>,
}

impl ApiVersionMetadata {
    /// Create metadata from the group model and the candidate's own model
    pub fn new(api_model: ApiVersionModel, endpoint_model: ApiVersionModel) -> Self {
        Self::build(api_model, endpoint_model, None)
    }

    /// Create metadata carrying a name used for deprecation policy lookups
    pub fn named(
        api_model: ApiVersionModel,
        endpoint_model: ApiVersionModel,
        name: impl Into<String>,
    ) -> Self {
        Self::build(api_model, endpoint_model, Some(name.into()))
    }

    /// Create metadata for a three-level declaration
    ///
    /// The group and endpoint models are aggregated into the implicit side,
    /// the action model is the explicit side.
    pub fn layered(
        group_model: &ApiVersionModel,
        endpoint_model: &ApiVersionModel,
        action_model: ApiVersionModel,
    ) -> Self {
        Self::new(group_model.aggregate(endpoint_model), action_model)
    }

    /// Metadata for a candidate that ignores versioning
    pub fn neutral() -> Self {
        Self::new(ApiVersionModel::neutral(), ApiVersionModel::neutral())
    }

    /// Metadata for a candidate without any version information
    pub fn empty() -> Self {
        Self::new(ApiVersionModel::empty(), ApiVersionModel::empty())
    }

    fn build(api_model: ApiVersionModel, endpoint_model: ApiVersionModel, name: Option<String>) -> Self {
        let merged = merge(&api_model, &endpoint_model);
        Self {
            inner: Arc::new(MetadataInner {
                api_model,
                endpoint_model,
                merged,
                name,
            }),
        }
    }

    /// The name used for deprecation policy lookups
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// The group (implicit) model
    pub fn api_model(&self) -> &ApiVersionModel {
        &self.inner.api_model
    }

    /// The candidate's own (explicit) model
    pub fn endpoint_model(&self) -> &ApiVersionModel {
        &self.inner.endpoint_model
    }

    /// Whether either level ignores versioning
    pub fn is_api_version_neutral(&self) -> bool {
        self.inner.api_model.is_api_version_neutral()
            || self.inner.endpoint_model.is_api_version_neutral()
    }

    /// Project the metadata onto one model
    ///
    /// `EXPLICIT` yields the endpoint model, `IMPLICIT` the group model and
    /// `EXPLICIT | IMPLICIT` their merge. `NONE` yields an empty model.
    pub fn map(&self, mapping: ApiVersionMapping) -> &ApiVersionModel {
        match mapping {
            ApiVersionMapping::NONE => &EMPTY_MODEL,
            ApiVersionMapping::EXPLICIT => &self.inner.endpoint_model,
            ApiVersionMapping::IMPLICIT => &self.inner.api_model,
            _ => &self.inner.merged,
        }
    }

    /// How the candidate maps to `version`
    ///
    /// Explicit when the endpoint declares the version; implicit when the
    /// endpoint declares nothing and defers to its group; none otherwise.
    pub fn mapping_to(&self, version: &ApiVersion) -> ApiVersionMapping {
        let declared = self.inner.endpoint_model.declared_api_versions();
        if declared.contains(version) {
            ApiVersionMapping::EXPLICIT
        } else if declared.is_empty() {
            ApiVersionMapping::IMPLICIT
        } else {
            ApiVersionMapping::NONE
        }
    }

    /// Whether either level implements `version`, or the candidate is neutral
    pub fn is_mapped_to(&self, version: &ApiVersion) -> bool {
        self.is_api_version_neutral()
            || self.inner.endpoint_model.implements(version)
            || self.inner.api_model.implements(version)
    }
}

impl fmt::Debug for ApiVersionMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiVersionMetadata")
            .field("name", &self.inner.name)
            .field("api_model", &self.inner.api_model)
            .field("endpoint_model", &self.inner.endpoint_model)
            .finish()
    }
}

impl Default for ApiVersionMetadata {
    fn default() -> Self {
        Self::empty()
    }
}

/// Endpoint sets merged with the group's implemented sets; advertised
/// versions come from the endpoint only.
fn merge(api: &ApiVersionModel, endpoint: &ApiVersionModel) -> ApiVersionModel {
    let declared = if endpoint.declared_api_versions().is_empty() {
        api.implemented_api_versions()
    } else {
        endpoint.declared_api_versions().clone()
    };
    let union = |a: &ApiVersionSet, b: &ApiVersionSet| -> ApiVersionSet { a.union(b).cloned().collect() };

    ApiVersionModel::normalized(
        declared,
        union(endpoint.supported_api_versions(), api.supported_api_versions()),
        union(endpoint.deprecated_api_versions(), api.deprecated_api_versions()),
        endpoint.advertised_supported_api_versions().clone(),
        endpoint.advertised_deprecated_api_versions().clone(),
        api.is_api_version_neutral() || endpoint.is_api_version_neutral(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> ApiVersion {
        text.parse().unwrap()
    }

    fn group() -> ApiVersionModel {
        ApiVersionModel::new([v("1.0"), v("2.0")], [v("2.0")], [v("1.0")], [v("3.0")], [])
    }

    #[test]
    fn test_map_projects_each_level() {
        let endpoint = ApiVersionModel::implemented([v("2.0")], []);
        let metadata = ApiVersionMetadata::new(group(), endpoint.clone());

        assert_eq!(metadata.map(ApiVersionMapping::EXPLICIT), &endpoint);
        assert_eq!(metadata.map(ApiVersionMapping::IMPLICIT), &group());
        assert!(metadata.map(ApiVersionMapping::NONE).is_empty());
    }

    #[test]
    fn test_merged_model() {
        let endpoint = ApiVersionModel::new([v("1.0")], [v("1.0")], [], [v("4.0")], []);
        let metadata = ApiVersionMetadata::new(group(), endpoint);
        let merged = metadata.map(ApiVersionMapping::EXPLICIT | ApiVersionMapping::IMPLICIT);

        assert_eq!(merged.declared_api_versions().len(), 1);
        assert!(merged.supported_api_versions().contains(&v("1.0")));
        assert!(merged.supported_api_versions().contains(&v("2.0")));
        // supported on the endpoint beats deprecated on the group
        assert!(merged.deprecated_api_versions().is_empty());
        assert!(merged.advertised_supported_api_versions().contains(&v("4.0")));
        assert!(!merged.advertised_supported_api_versions().contains(&v("3.0")));
    }

    #[test]
    fn test_merged_declared_falls_back_to_group() {
        let metadata = ApiVersionMetadata::new(group(), ApiVersionModel::empty());
        let merged = metadata.map(ApiVersionMapping::EXPLICIT | ApiVersionMapping::IMPLICIT);
        assert_eq!(merged.declared_api_versions(), &group().implemented_api_versions());
    }

    #[test]
    fn test_mapping_to() {
        let explicit = ApiVersionMetadata::new(group(), ApiVersionModel::implemented([v("2.0")], []));
        assert_eq!(explicit.mapping_to(&v("2.0")), ApiVersionMapping::EXPLICIT);
        assert_eq!(explicit.mapping_to(&v("1.0")), ApiVersionMapping::NONE);

        let implicit = ApiVersionMetadata::new(group(), ApiVersionModel::empty());
        assert_eq!(implicit.mapping_to(&v("1.0")), ApiVersionMapping::IMPLICIT);
    }

    #[test]
    fn test_is_mapped_to() {
        let metadata = ApiVersionMetadata::new(group(), ApiVersionModel::implemented([v("5.0")], []));
        assert!(metadata.is_mapped_to(&v("1.0")));
        assert!(metadata.is_mapped_to(&v("5.0")));
        // advertised only
        assert!(!metadata.is_mapped_to(&v("3.0")));

        assert!(ApiVersionMetadata::neutral().is_mapped_to(&v("42.0")));
        assert!(!ApiVersionMetadata::empty().is_mapped_to(&v("1.0")));
    }

    #[test]
    fn test_layered_metadata() {
        let group = ApiVersionModel::implemented([v("1.0")], []);
        let endpoint = ApiVersionModel::implemented([v("2.0")], []);
        let action = ApiVersionModel::implemented([v("2.0")], []);

        let metadata = ApiVersionMetadata::layered(&group, &endpoint, action);
        assert!(metadata.api_model().implements(&v("1.0")));
        assert!(metadata.api_model().implements(&v("2.0")));
        assert_eq!(metadata.mapping_to(&v("2.0")), ApiVersionMapping::EXPLICIT);
    }

    #[test]
    fn test_mapping_flags() {
        let both = ApiVersionMapping::EXPLICIT | ApiVersionMapping::IMPLICIT;
        assert!(both.contains(ApiVersionMapping::EXPLICIT));
        assert!(both.contains(ApiVersionMapping::IMPLICIT));
        assert!(!ApiVersionMapping::EXPLICIT.contains(ApiVersionMapping::IMPLICIT));
        assert!(ApiVersionMapping::NONE.is_none());
        assert_eq!(format!("{:?}", both), "Explicit | Implicit");
    }

    #[test]
    fn test_metadata_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiVersionMetadata>();

        let metadata = ApiVersionMetadata::named(group(), ApiVersionModel::empty(), "orders");
        let copy = metadata.clone();
        assert_eq!(copy.name(), Some("orders"));
        assert!(Arc::ptr_eq(&metadata.inner, &copy.inner));
    }
}
