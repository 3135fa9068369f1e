//! Policies choosing a version when the request does not specify one

use crate::model::ApiVersionModel;
use crate::version::ApiVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What a policy knows about the request it selects for
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    /// The route being resolved, when known
    pub route: Option<&'a str>,
    /// The configured default version
    pub default_version: &'a ApiVersion,
}

/// Chooses the version to assume for a request without one
///
/// The model is the aggregate of every candidate on the route. Closures of
/// the form `Fn(&SelectionContext, &ApiVersionModel) -> ApiVersion` implement
/// this trait.
pub trait ApiVersionSelector: Send + Sync {
    /// Pick a version
    fn select_version(&self, context: &SelectionContext<'_>, model: &ApiVersionModel) -> ApiVersion;
}

impl<F> ApiVersionSelector for F
where
    F: Fn(&SelectionContext<'_>, &ApiVersionModel) -> ApiVersion + Send + Sync,
{
    fn select_version(&self, context: &SelectionContext<'_>, model: &ApiVersionModel) -> ApiVersion {
        self(context, model)
    }
}

/// Always the configured default version
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultApiVersionSelector;

impl ApiVersionSelector for DefaultApiVersionSelector {
    fn select_version(&self, context: &SelectionContext<'_>, _model: &ApiVersionModel) -> ApiVersion {
        context.default_version.clone()
    }
}

/// Always the same version, regardless of configuration
#[derive(Debug, Clone)]
pub struct ConstantApiVersionSelector {
    version: ApiVersion,
}

impl ConstantApiVersionSelector {
    /// Create a selector returning `version`
    pub fn new(version: ApiVersion) -> Self {
        Self { version }
    }
}

impl ApiVersionSelector for ConstantApiVersionSelector {
    fn select_version(&self, _context: &SelectionContext<'_>, _model: &ApiVersionModel) -> ApiVersion {
        self.version.clone()
    }
}

/// The lowest implemented version, or the default when nothing is implemented
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestImplementedApiVersionSelector;

impl ApiVersionSelector for LowestImplementedApiVersionSelector {
    fn select_version(&self, context: &SelectionContext<'_>, model: &ApiVersionModel) -> ApiVersion {
        let lowest = match (
            model.supported_api_versions().first(),
            model.deprecated_api_versions().first(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        lowest.unwrap_or(context.default_version).clone()
    }
}

/// The highest implemented release version
///
/// Pre-release versions are skipped; the default is used when no release
/// version is implemented.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentImplementationApiVersionSelector;

impl ApiVersionSelector for CurrentImplementationApiVersionSelector {
    fn select_version(&self, context: &SelectionContext<'_>, model: &ApiVersionModel) -> ApiVersion {
        model
            .implemented_api_versions()
            .into_iter()
            .rev()
            .find(|v| !v.is_prerelease())
            .unwrap_or_else(|| context.default_version.clone())
    }
}

/// Built-in selector policies, as named in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorPolicy {
    /// [`DefaultApiVersionSelector`]
    #[default]
    Default,
    /// [`LowestImplementedApiVersionSelector`]
    LowestImplemented,
    /// [`CurrentImplementationApiVersionSelector`]
    CurrentImplementation,
}

impl SelectorPolicy {
    /// Instantiate the policy
    pub fn build(self) -> Arc<dyn ApiVersionSelector> {
        match self {
            Self::Default => Arc::new(DefaultApiVersionSelector),
            Self::LowestImplemented => Arc::new(LowestImplementedApiVersionSelector),
            Self::CurrentImplementation => Arc::new(CurrentImplementationApiVersionSelector),
        }
    }
}

impl fmt::Display for SelectorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::LowestImplemented => "lowest-implemented",
            Self::CurrentImplementation => "current-implementation",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> ApiVersion {
        text.parse().unwrap()
    }

    fn model() -> ApiVersionModel {
        ApiVersionModel::implemented([v("2.0"), v("3.0-Beta")], [v("1.0")])
    }

    fn select(selector: &dyn ApiVersionSelector, model: &ApiVersionModel) -> ApiVersion {
        let default = v("9.0");
        let context = SelectionContext {
            route: Some("/orders"),
            default_version: &default,
        };
        selector.select_version(&context, model)
    }

    #[test]
    fn test_default_selector() {
        assert_eq!(select(&DefaultApiVersionSelector, &model()), v("9.0"));
    }

    #[test]
    fn test_constant_selector() {
        let selector = ConstantApiVersionSelector::new(v("2013-08-06"));
        assert_eq!(select(&selector, &model()), v("2013-08-06"));
    }

    #[test]
    fn test_lowest_implemented_selector() {
        assert_eq!(select(&LowestImplementedApiVersionSelector, &model()), v("1.0"));
        assert_eq!(
            select(&LowestImplementedApiVersionSelector, &ApiVersionModel::empty()),
            v("9.0")
        );
    }

    #[test]
    fn test_current_implementation_skips_prerelease() {
        assert_eq!(select(&CurrentImplementationApiVersionSelector, &model()), v("2.0"));

        let only_beta = ApiVersionModel::implemented([v("1.0-Beta")], []);
        assert_eq!(select(&CurrentImplementationApiVersionSelector, &only_beta), v("9.0"));
    }

    #[test]
    fn test_closure_selector() {
        let selector = |context: &SelectionContext<'_>, _: &ApiVersionModel| {
            if context.route == Some("/orders") {
                v("4.0")
            } else {
                v("0.1")
            }
        };
        assert_eq!(select(&selector, &model()), v("4.0"));
    }

    #[test]
    fn test_policy_names() {
        let policy: SelectorPolicy = serde_json::from_str("\"lowest-implemented\"").unwrap();
        assert_eq!(policy, SelectorPolicy::LowestImplemented);
        assert_eq!(SelectorPolicy::CurrentImplementation.to_string(), "current-implementation");
        assert_eq!(select(SelectorPolicy::Default.build().as_ref(), &model()), v("9.0"));
    }
}
