//! Version advertisement headers

use http::{HeaderMap, HeaderName, HeaderValue};
use rustapi_versioning::{format_versions, ApiVersion, ApiVersionModel};

/// Lists the versions a route supports
pub const API_SUPPORTED_VERSIONS: HeaderName = HeaderName::from_static("api-supported-versions");

/// Lists the versions a route still serves but plans to retire
pub const API_DEPRECATED_VERSIONS: HeaderName = HeaderName::from_static("api-deprecated-versions");

/// Write the reported versions of `model` into `headers`
///
/// Empty lists are omitted. Existing values are replaced.
pub fn report_api_versions(model: &ApiVersionModel, headers: &mut HeaderMap) {
    report_versions(
        &model.reported_supported(),
        &model.reported_deprecated(),
        headers,
    );
}

/// Write already-computed version lists into `headers`
pub fn report_versions(supported: &[ApiVersion], deprecated: &[ApiVersion], headers: &mut HeaderMap) {
    write(headers, API_SUPPORTED_VERSIONS, supported);
    write(headers, API_DEPRECATED_VERSIONS, deprecated);
}

fn write(headers: &mut HeaderMap, name: HeaderName, versions: &[ApiVersion]) {
    if versions.is_empty() {
        return;
    }
    match HeaderValue::from_str(&format_versions(versions)) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(err) => tracing::warn!(header = %name, error = %err, "cannot report API versions"),
    }
}
