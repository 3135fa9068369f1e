//! API version models
//!
//! An [`ApiVersionModel`] describes the versions one declaration level
//! (a group, an endpoint or an action) knows about. Models are immutable and
//! are combined with [`ApiVersionModel::aggregate`].

use crate::version::ApiVersion;
use std::collections::BTreeSet;

/// Sorted, de-duplicated set of versions
pub type ApiVersionSet = BTreeSet<ApiVersion>;

pub(crate) static EMPTY_MODEL: ApiVersionModel = ApiVersionModel {
    declared: BTreeSet::new(),
    supported: BTreeSet::new(),
    deprecated: BTreeSet::new(),
    advertised_supported: BTreeSet::new(),
    advertised_deprecated: BTreeSet::new(),
    neutral: false,
};

/// The versions declared, implemented and advertised by one entity
///
/// Invariants held by every constructor:
///
/// - `declared` covers `supported` and `deprecated`
/// - `supported` and `deprecated` never overlap, supported wins
/// - advertised versions never overlap the implemented ones
/// - the advertised sets never overlap each other, supported wins
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiVersionModel {
    declared: ApiVersionSet,
    supported: ApiVersionSet,
    deprecated: ApiVersionSet,
    advertised_supported: ApiVersionSet,
    advertised_deprecated: ApiVersionSet,
    neutral: bool,
}

impl ApiVersionModel {
    /// Create a model, normalizing overlapping sets
    ///
    /// Every supported or deprecated version is declared as well; `declared`
    /// only needs to name versions mapped without being implemented.
    pub fn new(
        declared: impl IntoIterator<Item = ApiVersion>,
        supported: impl IntoIterator<Item = ApiVersion>,
        deprecated: impl IntoIterator<Item = ApiVersion>,
        advertised_supported: impl IntoIterator<Item = ApiVersion>,
        advertised_deprecated: impl IntoIterator<Item = ApiVersion>,
    ) -> Self {
        let supported: ApiVersionSet = supported.into_iter().collect();
        let deprecated: ApiVersionSet = deprecated.into_iter().collect();
        let declared = declared
            .into_iter()
            .chain(supported.iter().cloned())
            .chain(deprecated.iter().cloned())
            .collect();
        Self::normalized(
            declared,
            supported,
            deprecated,
            advertised_supported.into_iter().collect(),
            advertised_deprecated.into_iter().collect(),
            false,
        )
    }

    /// A model whose declared versions are exactly the implemented ones
    pub fn implemented(
        supported: impl IntoIterator<Item = ApiVersion>,
        deprecated: impl IntoIterator<Item = ApiVersion>,
    ) -> Self {
        let supported: ApiVersionSet = supported.into_iter().collect();
        let deprecated: ApiVersionSet = deprecated.into_iter().collect();
        let declared = supported.union(&deprecated).cloned().collect();
        Self::normalized(
            declared,
            supported,
            deprecated,
            ApiVersionSet::new(),
            ApiVersionSet::new(),
            false,
        )
    }

    /// A model with no versions
    pub fn empty() -> Self {
        Self::default()
    }

    /// A model for an entity that ignores versioning and matches every request
    pub fn neutral() -> Self {
        Self {
            neutral: true,
            ..Self::default()
        }
    }

    pub(crate) fn normalized(
        declared: ApiVersionSet,
        supported: ApiVersionSet,
        mut deprecated: ApiVersionSet,
        mut advertised_supported: ApiVersionSet,
        mut advertised_deprecated: ApiVersionSet,
        neutral: bool,
    ) -> Self {
        deprecated.retain(|v| !supported.contains(v));
        advertised_supported.retain(|v| !supported.contains(v) && !deprecated.contains(v));
        advertised_deprecated.retain(|v| {
            !supported.contains(v) && !deprecated.contains(v) && !advertised_supported.contains(v)
        });
        Self {
            declared,
            supported,
            deprecated,
            advertised_supported,
            advertised_deprecated,
            neutral,
        }
    }

    /// Whether the entity ignores versioning
    pub fn is_api_version_neutral(&self) -> bool {
        self.neutral
    }

    /// Every version explicitly mentioned at this level
    pub fn declared_api_versions(&self) -> &ApiVersionSet {
        &self.declared
    }

    /// Versions handled and not deprecated
    pub fn supported_api_versions(&self) -> &ApiVersionSet {
        &self.supported
    }

    /// Versions handled but deprecated
    pub fn deprecated_api_versions(&self) -> &ApiVersionSet {
        &self.deprecated
    }

    /// Versions claimed as supported elsewhere
    pub fn advertised_supported_api_versions(&self) -> &ApiVersionSet {
        &self.advertised_supported
    }

    /// Versions claimed as deprecated elsewhere
    pub fn advertised_deprecated_api_versions(&self) -> &ApiVersionSet {
        &self.advertised_deprecated
    }

    /// Supported and deprecated versions together
    pub fn implemented_api_versions(&self) -> ApiVersionSet {
        self.supported.union(&self.deprecated).cloned().collect()
    }

    /// Whether the entity itself handles `version`
    pub fn implements(&self, version: &ApiVersion) -> bool {
        self.supported.contains(version) || self.deprecated.contains(version)
    }

    /// Whether the model holds no versions at all
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
            && self.supported.is_empty()
            && self.deprecated.is_empty()
            && self.advertised_supported.is_empty()
            && self.advertised_deprecated.is_empty()
    }

    /// Merge two models
    ///
    /// Sets are unioned; a version supported by either side is never
    /// deprecated in the result, and a version implemented by either side is
    /// never merely advertised. The result is neutral only if both are.
    pub fn aggregate(&self, other: &ApiVersionModel) -> ApiVersionModel {
        Self::normalized(
            self.declared.union(&other.declared).cloned().collect(),
            self.supported.union(&other.supported).cloned().collect(),
            self.deprecated.union(&other.deprecated).cloned().collect(),
            self.advertised_supported
                .union(&other.advertised_supported)
                .cloned()
                .collect(),
            self.advertised_deprecated
                .union(&other.advertised_deprecated)
                .cloned()
                .collect(),
            self.neutral && other.neutral,
        )
    }

    /// Fold any number of models with [`aggregate`](Self::aggregate)
    ///
    /// No models yields the empty, non-neutral model.
    pub fn aggregate_all<'a>(models: impl IntoIterator<Item = &'a ApiVersionModel>) -> Self {
        let mut models = models.into_iter();
        let Some(first) = models.next() else {
            return Self::empty();
        };
        models.fold(first.clone(), |acc, model| acc.aggregate(model))
    }

    /// Versions to report as supported: implemented plus advertised
    pub fn reported_supported(&self) -> Vec<ApiVersion> {
        self.supported
            .union(&self.advertised_supported)
            .cloned()
            .collect()
    }

    /// Versions to report as deprecated, excluding anything reported as supported
    pub fn reported_deprecated(&self) -> Vec<ApiVersion> {
        self.deprecated
            .union(&self.advertised_deprecated)
            .filter(|v| !self.supported.contains(v) && !self.advertised_supported.contains(v))
            .cloned()
            .collect()
    }
}

/// Render versions the way advertisement headers carry them: `1.0, 2.0`
pub fn format_versions<'a>(versions: impl IntoIterator<Item = &'a ApiVersion>) -> String {
    versions
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
