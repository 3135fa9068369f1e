//! Format strings for [`ApiVersion`]
//!
//! | token      | output                                                   |
//! |------------|----------------------------------------------------------|
//! | `F`        | full text, e.g. `2013-08-06.1.1-Beta` (also the default) |
//! | `G`        | group version date, e.g. `2013-08-06`                    |
//! | `GG`       | group version with status, e.g. `2013-08-06-Beta`        |
//! | `V`        | major version (not valid on its own, renders nothing)    |
//! | `VV`       | major and minor, e.g. `1.0`                              |
//! | `VVV`      | major, minor and status, e.g. `1.0-Beta`                 |
//! | `S`        | status                                                   |
//! | `%V`, `%v` | major, minor                                             |
//! | `'text'`   | literal text                                             |
//!
//! Runs longer than the table shows render like the longest listed form.
//! Any other character is copied to the output.

use crate::version::ApiVersion;
use chrono::Datelike;
use std::fmt::Write;

pub(crate) fn render(version: &ApiVersion, format: &str) -> String {
    match format {
        "" | "F" => return full(version),
        "V" => return String::new(),
        _ => {}
    }

    let chars: Vec<char> = format.chars().collect();
    let mut out = String::with_capacity(format.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\'' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&c| c == '\'')
                    .map_or(chars.len(), |p| start + p);
                out.extend(&chars[start..end]);
                i = end + 1;
            }
            '%' if matches!(chars.get(i + 1), Some('V')) => {
                push_major(version, &mut out);
                i += 2;
            }
            '%' if matches!(chars.get(i + 1), Some('v')) => {
                push_minor(version, &mut out);
                i += 2;
            }
            'F' => {
                out.push_str(&full(version));
                i += 1;
            }
            'S' => {
                if let Some(status) = version.status() {
                    out.push_str(status);
                }
                i += 1;
            }
            token @ ('G' | 'V') => {
                let run = chars[i..].iter().take_while(|&&c| c == token).count();
                if token == 'G' {
                    push_group(version, run, &mut out);
                } else {
                    push_numeric(version, run, &mut out);
                }
                i += run;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    out
}

/// Canonical text: `[date][.]major[.minor][-status]`
pub(crate) fn full(version: &ApiVersion) -> String {
    let mut out = String::new();
    if let Some(date) = version.group_version() {
        push_date(date, &mut out);
    }
    if let Some(major) = version.major_version() {
        if !out.is_empty() {
            out.push('.');
        }
        let _ = write!(out, "{}", major);
        if let Some(minor) = version.minor_version() {
            let _ = write!(out, ".{}", minor);
        }
    }
    push_status(version, &mut out);
    out
}

fn push_date(date: chrono::NaiveDate, out: &mut String) {
    let _ = write!(out, "{:04}-{:02}-{:02}", date.year(), date.month(), date.day());
}

fn push_status(version: &ApiVersion, out: &mut String) {
    if let Some(status) = version.status() {
        out.push('-');
        out.push_str(status);
    }
}

fn push_group(version: &ApiVersion, run: usize, out: &mut String) {
    let Some(date) = version.group_version() else {
        return;
    };
    push_date(date, out);
    if run >= 2 {
        push_status(version, out);
    }
}

fn push_numeric(version: &ApiVersion, run: usize, out: &mut String) {
    let Some(major) = version.major_version() else {
        return;
    };
    let _ = write!(out, "{}", major);
    if run >= 2 {
        let _ = write!(out, ".{}", version.minor_version().unwrap_or(0));
    }
    if run >= 3 {
        push_status(version, out);
    }
}

fn push_major(version: &ApiVersion, out: &mut String) {
    if let Some(major) = version.major_version() {
        let _ = write!(out, "{}", major);
    }
}

fn push_minor(version: &ApiVersion, out: &mut String) {
    if version.major_version().is_some() {
        let _ = write!(out, "{}", version.minor_version().unwrap_or(0));
    }
}
