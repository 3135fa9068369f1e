//! Candidate selection
//!
//! Given the candidates registered for one route and the requested version,
//! [`CandidateSelector`] picks the single handler that serves the request or
//! reports why none can.
//!
//! Candidates that declare the version themselves (explicit) beat candidates
//! inheriting it from their group (implicit). Two candidates left in the same
//! tier are ambiguous; the selector never breaks a tie on its own.

use crate::error::{Result, SelectionError};
use crate::metadata::{ApiVersionMapping, ApiVersionMetadata};
use crate::model::ApiVersionModel;
use crate::options::ApiVersioningOptions;
use crate::selector::{ApiVersionSelector, SelectionContext};
use crate::version::ApiVersion;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A handler competing for a request
pub trait Candidate {
    /// Identifier reported when candidates are ambiguous
    fn name(&self) -> Cow<'_, str>;

    /// The candidate's version metadata
    fn metadata(&self) -> &ApiVersionMetadata;
}

/// A handler paired with its version metadata
#[derive(Debug, Clone)]
pub struct VersionedHandler<H> {
    name: String,
    metadata: ApiVersionMetadata,
    handler: H,
}

impl<H> VersionedHandler<H> {
    /// Pair `handler` with its metadata
    pub fn new(name: impl Into<String>, metadata: ApiVersionMetadata, handler: H) -> Self {
        Self {
            name: name.into(),
            metadata,
            handler,
        }
    }

    /// The wrapped handler
    pub fn handler(&self) -> &H {
        &self.handler
    }
}

impl<H> Candidate for VersionedHandler<H> {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn metadata(&self) -> &ApiVersionMetadata {
        &self.metadata
    }
}

/// Where the effective version of a selection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOrigin {
    /// Supplied by the request
    Requested,
    /// Chosen by the selector policy because the request had none
    Assumed,
    /// No version involved; a version-neutral candidate matched
    Neutral,
}

/// A successful selection
#[derive(Debug)]
pub struct Selected<'a, C> {
    /// The chosen candidate
    pub candidate: &'a C,
    /// The effective version, absent for a neutral match without one
    pub version: Option<ApiVersion>,
    /// Where the version came from
    pub origin: VersionOrigin,
    /// Aggregate of every candidate on the route, for reporting
    pub route_model: ApiVersionModel,
}

impl<C> Selected<'_, C> {
    /// Whether the version was assumed rather than requested
    pub fn is_assumed(&self) -> bool {
        self.origin == VersionOrigin::Assumed
    }
}

/// Chooses one candidate per request
///
/// Selection is a pure function of the requested version and the candidate
/// slice; the selector holds no per-request state and can be shared freely.
#[derive(Clone)]
pub struct CandidateSelector {
    options: ApiVersioningOptions,
    policy: Arc<dyn ApiVersionSelector>,
}

impl CandidateSelector {
    /// Create a selector using the policy named in `options`
    pub fn new(options: ApiVersioningOptions) -> Self {
        let policy = options.selector.build();
        Self { options, policy }
    }

    /// Replace the policy with a custom one
    pub fn with_policy(mut self, policy: impl ApiVersionSelector + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// The options in effect
    pub fn options(&self) -> &ApiVersioningOptions {
        &self.options
    }

    /// Aggregate of the merged models of every candidate
    pub fn route_model<C: Candidate>(candidates: &[C]) -> ApiVersionModel {
        ApiVersionModel::aggregate_all(candidates.iter().map(|c| {
            c.metadata()
                .map(ApiVersionMapping::EXPLICIT | ApiVersionMapping::IMPLICIT)
        }))
    }

    /// Select a candidate without route information
    pub fn select<'a, C: Candidate>(
        &self,
        requested: Option<&ApiVersion>,
        candidates: &'a [C],
    ) -> Result<Selected<'a, C>> {
        self.select_route(None, requested, candidates)
    }

    /// Select a candidate for `route`
    ///
    /// The route name is only passed on to the selector policy.
    pub fn select_route<'a, C: Candidate>(
        &self,
        route: Option<&str>,
        requested: Option<&ApiVersion>,
        candidates: &'a [C],
    ) -> Result<Selected<'a, C>> {
        let route_model = Self::route_model(candidates);

        let (version, origin) = match requested {
            Some(version) => (version.clone(), VersionOrigin::Requested),
            None if self.options.assume_default_version_when_unspecified => {
                let context = SelectionContext {
                    route,
                    default_version: &self.options.default_api_version,
                };
                let version = self.policy.select_version(&context, &route_model);
                trace_debug!(route = ?route, version = %version, "assuming API version");
                (version, VersionOrigin::Assumed)
            }
            None => return select_neutral(candidates, route_model),
        };

        let mut explicit = Vec::new();
        let mut implicit = Vec::new();
        for candidate in candidates {
            let metadata = candidate.metadata();
            if !metadata.is_mapped_to(&version) {
                continue;
            }
            match metadata.mapping_to(&version) {
                ApiVersionMapping::EXPLICIT => explicit.push(candidate),
                ApiVersionMapping::IMPLICIT => implicit.push(candidate),
                _ => {}
            }
        }

        let tier = if explicit.is_empty() { implicit } else { explicit };

        match tier.as_slice() {
            [] if route_model.implements(&version) => {
                trace_debug!(route = ?route, version = %version, "no candidate maps to API version");
                Err(SelectionError::NotFound { version })
            }
            [] => {
                trace_debug!(route = ?route, version = %version, "API version is not supported");
                Err(SelectionError::Unsupported {
                    version,
                    supported: route_model.reported_supported(),
                    deprecated: route_model.reported_deprecated(),
                })
            }
            [candidate] => {
                trace_debug!(
                    route = ?route,
                    version = %version,
                    candidate = %candidate.name(),
                    "selected candidate"
                );
                Ok(Selected {
                    candidate: *candidate,
                    version: Some(version),
                    origin,
                    route_model,
                })
            }
            tied => Err(ambiguous(Some(version), tied)),
        }
    }
}

/// No version requested and none assumed: only neutral candidates can match
fn select_neutral<'a, C: Candidate>(
    candidates: &'a [C],
    route_model: ApiVersionModel,
) -> Result<Selected<'a, C>> {
    let neutral: Vec<&C> = candidates
        .iter()
        .filter(|c| c.metadata().is_api_version_neutral())
        .collect();

    match neutral.as_slice() {
        [] => Err(SelectionError::Unspecified {
            supported: route_model.reported_supported(),
            deprecated: route_model.reported_deprecated(),
        }),
        [candidate] => Ok(Selected {
            candidate: *candidate,
            version: None,
            origin: VersionOrigin::Neutral,
            route_model,
        }),
        tied => Err(ambiguous(None, tied)),
    }
}

fn ambiguous<C: Candidate>(version: Option<ApiVersion>, tied: &[&C]) -> SelectionError {
    let candidates: Vec<String> = tied.iter().map(|c| c.name().into_owned()).collect();
    trace_warn!(candidates = ?candidates, "ambiguous candidates for API version");
    SelectionError::AmbiguousCandidates {
        version,
        candidates,
    }
}

impl Default for CandidateSelector {
    fn default() -> Self {
        Self::new(ApiVersioningOptions::default())
    }
}

impl fmt::Debug for CandidateSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateSelector")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::VersionDeclarationBuilder;
    use crate::selector::ConstantApiVersionSelector;

    fn v(text: &str) -> ApiVersion {
        text.parse().unwrap()
    }

    fn explicit(name: &str, versions: &[&str]) -> VersionedHandler<()> {
        let model = ApiVersionModel::implemented(versions.iter().map(|t| v(t)), []);
        VersionedHandler::new(name, ApiVersionMetadata::new(ApiVersionModel::empty(), model), ())
    }

    fn implicit(name: &str, group: &[&str]) -> VersionedHandler<()> {
        let model = ApiVersionModel::implemented(group.iter().map(|t| v(t)), []);
        VersionedHandler::new(name, ApiVersionMetadata::new(model, ApiVersionModel::empty()), ())
    }

    #[test]
    fn test_single_match() {
        let candidates = vec![explicit("v1", &["1.0"]), explicit("v2", &["2.0"])];
        let selected = CandidateSelector::default()
            .select(Some(&v("2.0")), &candidates)
            .unwrap();
        assert_eq!(selected.candidate.name(), "v2");
        assert_eq!(selected.version, Some(v("2.0")));
        assert_eq!(selected.origin, VersionOrigin::Requested);
    }

    #[test]
    fn test_explicit_beats_implicit() {
        let candidates = vec![implicit("group", &["1.0", "2.0"]), explicit("pinned", &["2.0"])];
        let selected = CandidateSelector::default()
            .select(Some(&v("2.0")), &candidates)
            .unwrap();
        assert_eq!(selected.candidate.name(), "pinned");

        let selected = CandidateSelector::default()
            .select(Some(&v("1.0")), &candidates)
            .unwrap();
        assert_eq!(selected.candidate.name(), "group");
    }

    #[test]
    fn test_supported_versions_map_explicitly() {
        let endpoint = ApiVersionModel::new([v("1.0")], [v("1.0"), v("2.0")], [], [], []);
        let candidates = vec![VersionedHandler::new(
            "orders",
            ApiVersionMetadata::new(ApiVersionModel::empty(), endpoint),
            (),
        )];
        let selected = CandidateSelector::default()
            .select(Some(&v("2.0")), &candidates)
            .unwrap();
        assert_eq!(selected.candidate.name(), "orders");

        let group = ApiVersionModel::implemented([v("5.0")], []);
        let endpoint = ApiVersionModel::new([], [v("1.0")], [], [], []);
        let metadata = ApiVersionMetadata::new(group, endpoint);
        assert_eq!(metadata.mapping_to(&v("1.0")), ApiVersionMapping::EXPLICIT);
        assert_eq!(metadata.mapping_to(&v("5.0")), ApiVersionMapping::NONE);
    }

    #[test]
    fn test_tie_is_ambiguous() {
        let candidates = vec![explicit("a", &["1.0"]), explicit("b", &["1.0"])];
        let err = CandidateSelector::default()
            .select(Some(&v("1.0")), &candidates)
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::AmbiguousCandidates {
                version: Some(v("1.0")),
                candidates: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn test_unsupported_reports_versions() {
        let deprecated = VersionedHandler::new(
            "old",
            ApiVersionMetadata::new(
                ApiVersionModel::empty(),
                ApiVersionModel::implemented([], [v("0.9")]),
            ),
            (),
        );
        let candidates = vec![explicit("v1", &["1.0"]), deprecated];
        let err = CandidateSelector::default()
            .select(Some(&v("5.0")), &candidates)
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::Unsupported {
                version: v("5.0"),
                supported: vec![v("1.0")],
                deprecated: vec![v("0.9")],
            }
        );
    }

    #[test]
    fn test_known_version_without_mapping_is_not_found() {
        let group = VersionDeclarationBuilder::group()
            .supports(v("1.0"))
            .supports(v("2.0"))
            .build();
        let action = VersionDeclarationBuilder::action().maps_to(v("1.0")).build();
        let candidates = vec![VersionedHandler::new(
            "only-v1",
            ApiVersionMetadata::new(group, action),
            (),
        )];

        let err = CandidateSelector::default()
            .select(Some(&v("2.0")), &candidates)
            .unwrap_err();
        assert_eq!(err, SelectionError::NotFound { version: v("2.0") });
    }

    #[test]
    fn test_unspecified_without_assumption() {
        let candidates = vec![explicit("v1", &["1.0"])];
        let err = CandidateSelector::default()
            .select(None, &candidates)
            .unwrap_err();
        assert!(matches!(err, SelectionError::Unspecified { ref supported, .. } if supported == &vec![v("1.0")]));
    }

    #[test]
    fn test_assumed_version() {
        let options = ApiVersioningOptions::new().assume_default_when_unspecified(true);
        let candidates = vec![explicit("v1", &["1.0"]), explicit("v2", &["2.0"])];

        let selected = CandidateSelector::new(options.clone())
            .select(None, &candidates)
            .unwrap();
        assert_eq!(selected.candidate.name(), "v1");
        assert!(selected.is_assumed());

        let selected = CandidateSelector::new(options)
            .with_policy(ConstantApiVersionSelector::new(v("2.0")))
            .select(None, &candidates)
            .unwrap();
        assert_eq!(selected.candidate.name(), "v2");
    }

    #[test]
    fn test_neutral_candidate_matches_anything() {
        let neutral = VersionedHandler::new("health", ApiVersionMetadata::neutral(), ());
        let candidates = vec![neutral];

        let selected = CandidateSelector::default().select(None, &candidates).unwrap();
        assert_eq!(selected.origin, VersionOrigin::Neutral);
        assert_eq!(selected.version, None);

        let selected = CandidateSelector::default()
            .select(Some(&v("7.0")), &candidates)
            .unwrap();
        assert_eq!(selected.candidate.name(), "health");
    }

    #[test]
    fn test_explicit_beats_neutral() {
        let candidates = vec![
            VersionedHandler::new("neutral", ApiVersionMetadata::neutral(), ()),
            explicit("v1", &["1.0"]),
        ];
        let selected = CandidateSelector::default()
            .select(Some(&v("1.0")), &candidates)
            .unwrap();
        assert_eq!(selected.candidate.name(), "v1");
    }

    #[test]
    fn test_selection_is_repeatable() {
        let candidates = vec![explicit("a", &["1.0"]), explicit("b", &["1.0"])];
        let selector = CandidateSelector::default();
        let first = selector.select(Some(&v("1.0")), &candidates).unwrap_err();
        for _ in 0..10 {
            assert_eq!(selector.select(Some(&v("1.0")), &candidates).unwrap_err(), first);
        }
    }
}
