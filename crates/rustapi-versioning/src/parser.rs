//! API version text parsing
//!
//! Grammar:
//!
//! ```text
//! version      := (group | numeric) ("-" status)?
//! group        := date ("." numeric)?
//! numeric      := major ("." minor)?
//! date         := YYYY "-" MM "-" DD
//! major, minor := digit+
//! status       := token ("." token)*      ; token = [A-Za-z0-9]+
//! ```

use crate::error::ApiVersionParseError;
use crate::version::{is_valid_status, ApiVersion};
use chrono::NaiveDate;
use std::sync::OnceLock;

static SHARED_PARSER: OnceLock<ApiVersionParser> = OnceLock::new();

/// Parser turning text into [`ApiVersion`] values
///
/// The default parser follows the grammar strictly. [`ApiVersionParser::lenient`]
/// also accepts a leading `v` or `V` in front of a numeric version, the way
/// versions usually appear in URL segments (`v1.1`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApiVersionParser {
    allow_v_prefix: bool,
}

impl ApiVersionParser {
    /// Create a strict parser
    pub const fn new() -> Self {
        Self {
            allow_v_prefix: false,
        }
    }

    /// Create a parser that tolerates a `v` prefix
    pub const fn lenient() -> Self {
        Self {
            allow_v_prefix: true,
        }
    }

    /// The process-wide strict parser
    pub fn shared() -> &'static ApiVersionParser {
        SHARED_PARSER.get_or_init(ApiVersionParser::new)
    }

    /// Parse text into a version
    pub fn parse(&self, text: &str) -> Result<ApiVersion, ApiVersionParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ApiVersionParseError::invalid(text));
        }

        let mut rest = trimmed;
        if self.allow_v_prefix {
            if let Some(stripped) = rest.strip_prefix(['v', 'V']) {
                if stripped.starts_with(|c: char| c.is_ascii_digit()) {
                    rest = stripped;
                }
            }
        }

        let group_version = if has_date_shape(rest) {
            let date = parse_date(&rest[..10])
                .ok_or_else(|| ApiVersionParseError::InvalidGroupVersion {
                    text: text.to_string(),
                })?;
            rest = &rest[10..];
            Some(date)
        } else {
            None
        };

        let (numeric, status) = match rest.split_once('-') {
            Some((numeric, status)) => (numeric, Some(status)),
            None => (rest, None),
        };

        let (major_version, minor_version) = match group_version {
            Some(_) if numeric.is_empty() => (None, None),
            Some(_) => {
                let tail = numeric
                    .strip_prefix('.')
                    .ok_or_else(|| ApiVersionParseError::invalid(text))?;
                let (major, minor) = parse_numeric(tail).ok_or_else(|| ApiVersionParseError::invalid(text))?;
                (Some(major), minor)
            }
            None => {
                let (major, minor) =
                    parse_numeric(numeric).ok_or_else(|| ApiVersionParseError::invalid(text))?;
                (Some(major), minor)
            }
        };

        let status = match status {
            Some(status) if is_valid_status(status) => Some(status.to_string()),
            Some(status) => {
                return Err(ApiVersionParseError::InvalidStatus {
                    text: text.to_string(),
                    status: status.to_string(),
                })
            }
            None => None,
        };

        Ok(ApiVersion::from_validated(
            group_version,
            major_version,
            minor_version,
            status,
        ))
    }

    /// Parse text into a version, returning `None` on any failure
    pub fn try_parse(&self, text: &str) -> Option<ApiVersion> {
        self.parse(text).ok()
    }
}

/// `DDDD-DD-DD` followed by nothing, a `.` or a `-`
fn has_date_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() < 10 {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    digits(0..4)
        && bytes[4] == b'-'
        && digits(5..7)
        && bytes[7] == b'-'
        && digits(8..10)
        && matches!(bytes.get(10), None | Some(b'.') | Some(b'-'))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let year = text[0..4].parse().ok()?;
    let month = text[5..7].parse().ok()?;
    let day = text[8..10].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_numeric(text: &str) -> Option<(u32, Option<u32>)> {
    let (major, minor) = match text.split_once('.') {
        Some((major, minor)) => (major, Some(minor)),
        None => (text, None),
    };
    let major = parse_number(major)?;
    let minor = match minor {
        Some(minor) => Some(parse_number(minor)?),
        None => None,
    };
    Some((major, minor))
}

fn parse_number(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
