//! Property tests for the verification helpers.

use bolsa::verify::{
    compare_time, currency_to_number, escape, is_currency, round2, unescape, CurrencyPattern,
};
use chrono::NaiveDate;
use proptest::prelude::*;

proptest! {
    /// Decoding an encoded message recovers it, for messages without
    /// literal hyphens (a hyphen round-trips as two spaces because the
    /// decode path turns every hyphen into a space before reversing the
    /// token mapping).
    // apostrophes are excluded: two adjacent ones are indistinguishable
    // from an escaped double quote on the decode path
    #[test]
    fn escape_unescape_roundtrip(message in r"[A-Z0-9 _?%#/]{0,40}") {
        let encoded = escape(&message);
        // the hyphen-to-space step only sees hyphens introduced by the
        // space escape, so it undoes exactly that
        let decoded = unescape(&encoded.replace('-', " "));
        prop_assert_eq!(decoded, message.to_uppercase());
    }

    /// The forward escape never emits a space: spaces are what hyphens
    /// encode.
    #[test]
    fn escape_output_has_no_spaces(message in r"[A-Za-z ]{0,40}") {
        prop_assert!(!escape(&message).contains(' '));
    }

    /// Formatting a 2-decimal value as currency and parsing it back is
    /// the identity (bounded by grouping support).
    #[test]
    fn currency_parse_formats_roundtrip(cents in 0_i64..100_000_000) {
        let value = cents as f64 / 100.0;
        let rendered = render_currency(value);
        prop_assert!(is_currency(&rendered, CurrencyPattern::Strict), "{rendered}");
        prop_assert_eq!(currency_to_number(&rendered), Some(round2(value)));
    }

    /// The lenient pattern accepts everything the strict one does.
    #[test]
    fn lenient_currency_is_a_superset(cents in 0_i64..100_000_000) {
        let rendered = render_currency(cents as f64 / 100.0);
        prop_assert!(is_currency(&rendered, CurrencyPattern::Lenient));
    }

    /// Within the tolerance window the comparison holds; one second past
    /// it, it does not.
    #[test]
    fn timestamp_tolerance_window(drift in -5_i64..=5, offset in -12_i64..=12) {
        let now = NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(14, 30, 30)
            .unwrap();
        let recorded_hour = (14 - offset).rem_euclid(24);
        let recorded = format!("2024-05-17 {recorded_hour:02}:30:{:02}", 30 + drift);
        prop_assert!(compare_time(&recorded, now, offset, 5));

        let outside = format!("2024-05-17 {recorded_hour:02}:30:{:02}", 30 + 6);
        prop_assert!(!compare_time(&outside, now, offset, 5));
    }
}

/// The app's currency rendering: `$` + comma-grouped dollars + exactly
/// two decimals.
fn render_currency(value: f64) -> String {
    let cents = (round2(value) * 100.0).round() as i64;
    let dollars = cents / 100;
    let fraction = cents % 100;
    let digits = dollars.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${grouped}.{fraction:02}")
}
