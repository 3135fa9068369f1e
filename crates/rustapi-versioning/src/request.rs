//! Reducing the raw values read from a request to one version

use crate::error::{AmbiguousApiVersionError, RequestVersionError};
use crate::parser::ApiVersionParser;
use crate::version::ApiVersion;

/// Resolve raw request values with the shared parser
///
/// Values are trimmed and empty ones skipped. Values differing only in case
/// count once. No value yields `Ok(None)`; more than one distinct value is an
/// [`AmbiguousApiVersionError`], even when the values would parse to equal
/// versions.
pub fn resolve_requested_version<I, S>(values: I) -> Result<Option<ApiVersion>, RequestVersionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ApiVersionParser::shared().resolve_requested(values)
}

impl ApiVersionParser {
    /// Resolve raw request values with this parser
    ///
    /// See [`resolve_requested_version`].
    pub fn resolve_requested<I, S>(&self, values: I) -> Result<Option<ApiVersion>, RequestVersionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut distinct: Vec<String> = Vec::new();
        for value in values {
            let value = value.as_ref().trim();
            if value.is_empty() || distinct.iter().any(|d| d.eq_ignore_ascii_case(value)) {
                continue;
            }
            distinct.push(value.to_string());
        }

        match distinct.as_slice() {
            [] => Ok(None),
            [single] => {
                let version = self.parse(single).map_err(|err| {
                    trace_debug!(value = %single, error = %err, "requested API version is invalid");
                    err
                })?;
                Ok(Some(version))
            }
            _ => {
                trace_debug!(values = ?distinct, "request carries more than one API version");
                Err(AmbiguousApiVersionError { values: distinct }.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiVersionParseError;

    #[test]
    fn test_no_values() {
        let values: [&str; 0] = [];
        assert_eq!(resolve_requested_version(values), Ok(None));
        assert_eq!(resolve_requested_version(["", "  "]), Ok(None));
    }

    #[test]
    fn test_single_value() {
        assert_eq!(
            resolve_requested_version(["2.0"]),
            Ok(Some(ApiVersion::new(2, 0)))
        );
    }

    #[test]
    fn test_repeated_value_is_not_ambiguous() {
        assert_eq!(
            resolve_requested_version(["1.0-beta", " 1.0-BETA ", "1.0-Beta"]),
            Ok(Some("1.0-beta".parse().unwrap()))
        );
    }

    #[test]
    fn test_distinct_values_are_ambiguous() {
        let err = resolve_requested_version(vec!["1.0".to_string(), "2.0".to_string()]).unwrap_err();
        assert_eq!(
            err,
            RequestVersionError::Ambiguous(AmbiguousApiVersionError {
                values: vec!["1.0".to_string(), "2.0".to_string()],
            })
        );

        assert!(matches!(
            resolve_requested_version(["1", "1.0"]),
            Err(RequestVersionError::Ambiguous(_))
        ));
    }

    #[test]
    fn test_invalid_value() {
        assert!(matches!(
            resolve_requested_version(["Alpha1"]),
            Err(RequestVersionError::Invalid(ApiVersionParseError::Invalid { .. }))
        ));
    }

    #[test]
    fn test_lenient_parser() {
        assert_eq!(
            ApiVersionParser::lenient().resolve_requested(["v3"]),
            Ok(Some(ApiVersion::major(3)))
        );
    }
}
