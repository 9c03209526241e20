//! Verification helpers shared by the suites.
//!
//! Cell typing, currency parsing, the apology-banner text decoder and the
//! timestamp-tolerance comparison all live here, so assertions across the
//! suites agree on what "equal" means.

use std::collections::HashMap;

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

/// Escape mapping of the apology-banner image URLs, applied in order.
///
/// The app encodes error messages into image file names with this
/// reversible scheme; the decode path must replay it exactly, including
/// ordering, or messages with `_`/`?`/`%` in them come out mangled.
const ESCAPES: [(&str, &str); 8] = [
    ("-", "--"),
    (" ", "-"),
    ("_", "__"),
    ("?", "~q"),
    ("%", "~p"),
    ("#", "~h"),
    ("/", "~s"),
    ("\"", "''"),
];

static IMAGE_EXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(?:jpe?g|png)$").unwrap());
static CURRENCY_STRICT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$(\d{1,3})(,\d{3})*(\.\d{2})$").unwrap());
static CURRENCY_LENIENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$(\d{0,3})(,\d{3})*(\.\d{2})$").unwrap());
static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d*$").unwrap());

/// Apply the forward escape mapping (plain text -> file-name form).
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = text.to_string();
    for (plain, escaped) in ESCAPES {
        out = out.replace(plain, escaped);
    }
    out
}

/// Reverse the escape mapping (file-name form -> plain text).
///
/// Replacements run in declaration order; `"--"` must collapse before
/// single `"-"` turns into a space.
#[must_use]
pub fn unescape(text: &str) -> String {
    let mut out = text.to_string();
    for (plain, escaped) in ESCAPES {
        out = out.replace(escaped, plain);
    }
    out
}

/// Decode the error message encoded in an apology image's `src` URL.
///
/// Pipeline: take the final path segment, percent-decode it, strip the
/// image extension, replace literal hyphens with spaces, reverse the
/// escape mapping, uppercase. `None` when `src` is not a parseable URL.
#[must_use]
pub fn decode_error_src(src: &str) -> Option<String> {
    let path = Url::parse(src).map(|u| u.path().to_string()).ok()?;
    let filename = path.rsplit('/').next().unwrap_or_default().to_string();
    let filename = percent_decode_str(&filename).decode_utf8_lossy().to_string();
    let name = IMAGE_EXT.replace(&filename, "").to_string();
    // hyphens encode spaces; this runs before the full reverse mapping,
    // exactly as the suite has always decoded these URLs
    let name = name.replace('-', " ");
    let name = unescape(&name);
    Some(name.to_uppercase())
}

/// Currency pattern variants.
///
/// Historical versions of the suite disagreed on the leading group
/// width; both are kept as named variants rather than guessing which is
/// authoritative. `Strict` is what cell typing uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurrencyPattern {
    /// Leading group of 1-3 digits: `$0.00` .. `$999,999.99`
    #[default]
    Strict,
    /// Leading group may be empty: also accepts `$.99`
    Lenient,
}

/// True when `text` is a currency rendering under the given pattern.
#[must_use]
pub fn is_currency(text: &str, pattern: CurrencyPattern) -> bool {
    match pattern {
        CurrencyPattern::Strict => CURRENCY_STRICT.is_match(text),
        CurrencyPattern::Lenient => CURRENCY_LENIENT.is_match(text),
    }
}

/// True when `text` is an optional `-` followed by zero or more digits.
///
/// Deliberately matches the empty string; callers that need a value must
/// also check parseability.
#[must_use]
pub fn is_integer(text: &str) -> bool {
    INTEGER.is_match(text)
}

/// Parse a currency string into a number rounded to 2 decimal places.
///
/// Strips `$` and thousands separators; `None` when the remainder is not
/// a number.
#[must_use]
pub fn currency_to_number(text: &str) -> Option<f64> {
    let stripped = text.replace(['$', ','], "");
    let value: f64 = stripped.parse().ok()?;
    Some(round2(value))
}

/// Round to 2 decimal places, half away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compare a recorded `YYYY-MM-DD HH:MM:SS` timestamp against `now`.
///
/// Year, month, day and minute must match exactly; the hour must match
/// exactly once the fixed timezone offset is applied (the app server's
/// clock may live in a different timezone than the runner); seconds may
/// differ by up to `tolerance_seconds`. Everything else (weekday,
/// ordinal day, DST flags) is ignored.
#[must_use]
pub fn compare_time(
    recorded: &str,
    now: NaiveDateTime,
    tz_offset_hours: i64,
    tolerance_seconds: i64,
) -> bool {
    let Ok(rec) = NaiveDateTime::parse_from_str(recorded, "%Y-%m-%d %H:%M:%S") else {
        return false;
    };
    let shifted_hour = (i64::from(rec.hour()) + tz_offset_hours).rem_euclid(24);
    rec.year() == now.year()
        && rec.month() == now.month()
        && rec.day() == now.day()
        && shifted_hour == i64::from(now.hour())
        && rec.minute() == now.minute()
        && (i64::from(rec.second()) - i64::from(now.second())).abs() <= tolerance_seconds
}

/// [`compare_time`] against the local clock.
#[must_use]
pub fn compare_time_now(recorded: &str, tz_offset_hours: i64, tolerance_seconds: i64) -> bool {
    compare_time(
        recorded,
        Local::now().naive_local(),
        tz_offset_hours,
        tolerance_seconds,
    )
}

/// Pair actual and expected values for every key present in both maps.
///
/// Keys only in `expected` are silently dropped; use [`subset_match`]
/// when missing keys must be reported. Output is ordered by key so
/// assertion messages are stable.
#[must_use]
pub fn zip_by_key<V: Clone>(
    actual: &HashMap<String, V>,
    expected: &HashMap<String, V>,
) -> Vec<(String, V, V)> {
    let mut keys: Vec<&String> = expected.keys().collect();
    keys.sort();
    keys.into_iter()
        .filter_map(|k| {
            actual
                .get(k)
                .map(|a| (k.clone(), a.clone(), expected[k].clone()))
        })
        .collect()
}

/// Result of a subset comparison between an actual and an expected map.
#[derive(Debug, Clone)]
pub struct SubsetReport<V> {
    /// (key, actual, expected) for keys present in both
    pub pairs: Vec<(String, V, V)>,
    /// Expected keys absent from actual, ordered
    pub missing: Vec<String>,
}

impl<V: PartialEq + std::fmt::Debug> SubsetReport<V> {
    /// True when no expected key was missing.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Keys whose paired values differ, rendered with both sides.
    #[must_use]
    pub fn mismatches(&self) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(_, a, e)| a != e)
            .map(|(k, a, e)| format!("{k}: actual {a:?}, expected {e:?}"))
            .collect()
    }

    /// True when complete and every pair agrees.
    #[must_use]
    pub fn matches(&self) -> bool {
        self.is_complete() && self.pairs.iter().all(|(_, a, e)| a == e)
    }
}

/// Subset comparison with explicit missing-key reporting.
///
/// The centralized replacement for the zip-then-count-check idiom: one
/// call yields both the value pairs and the expected keys that actual
/// lacked.
#[must_use]
pub fn subset_match<V: Clone>(
    actual: &HashMap<String, V>,
    expected: &HashMap<String, V>,
) -> SubsetReport<V> {
    let pairs = zip_by_key(actual, expected);
    let mut missing: Vec<String> = expected
        .keys()
        .filter(|k| !actual.contains_key(*k))
        .cloned()
        .collect();
    missing.sort();
    SubsetReport { pairs, missing }
}
