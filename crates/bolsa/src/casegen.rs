//! Data-driven case expansion.
//!
//! A [`CaseTable`] is a declared parameter list plus rows of values; each
//! row carries a human-readable label as its final value. [`expand`]
//! turns a table into one independent [`GeneratedCase`] per row at
//! suite-build time, with the row's values baked in as named bindings —
//! so per-case setup/teardown runs once per case instead of once for the
//! whole sweep.
//!
//! Mismatched arity and colliding generated names abort expansion
//! outright: both mean the suite definition itself is broken.

use std::collections::HashSet;
use std::fmt;

use crate::result::{BolsaError, BolsaResult};

/// One case parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseValue {
    /// Whole-number input
    Int(i64),
    /// Fractional input
    Float(f64),
    /// Text input
    Text(String),
}

impl CaseValue {
    /// The value as typed into an input field.
    #[must_use]
    pub fn as_input(&self) -> String {
        self.to_string()
    }

    /// Integer view, when the value is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CaseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            // a fractionless float still types a decimal point
            Self::Float(x) if x.fract() == 0.0 => write!(f, "{x:.1}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(t) => write!(f, "{t}"),
        }
    }
}

impl From<i64> for CaseValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for CaseValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for CaseValue {
    fn from(t: &str) -> Self {
        Self::Text(t.to_string())
    }
}

impl From<String> for CaseValue {
    fn from(t: String) -> Self {
        Self::Text(t)
    }
}

/// One row of a case table: input values plus, by convention, the
/// human-readable case label as the final value.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRow {
    values: Vec<CaseValue>,
}

impl CaseRow {
    /// Create a row from its values.
    #[must_use]
    pub fn new(values: Vec<CaseValue>) -> Self {
        Self { values }
    }

    /// Value count.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.values.len()
    }

    /// The row's values, in declaration order.
    #[must_use]
    pub fn values(&self) -> &[CaseValue] {
        &self.values
    }

    /// The final value rendered as text — the case label.
    #[must_use]
    pub fn label(&self) -> String {
        self.values.last().map(ToString::to_string).unwrap_or_default()
    }
}

/// Build a row from heterogeneous values: `row!["", "Empty username"]`.
#[macro_export]
macro_rules! row {
    ($($value:expr),+ $(,)?) => {
        $crate::casegen::CaseRow::new(vec![$($crate::casegen::CaseValue::from($value)),+])
    };
}

/// A declared parameter list plus its value rows. Pure data.
#[derive(Debug, Clone)]
pub struct CaseTable {
    params: Vec<String>,
    params_decl: String,
    rows: Vec<CaseRow>,
}

impl CaseTable {
    /// Create a table from a comma-separated parameter declaration
    /// (`"username, case"`) and its rows.
    #[must_use]
    pub fn new(params_decl: &str, rows: Vec<CaseRow>) -> Self {
        Self {
            params: params_decl
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            params_decl: params_decl.to_string(),
            rows,
        }
    }

    /// Declared parameter names.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Value rows.
    #[must_use]
    pub fn rows(&self) -> &[CaseRow] {
        &self.rows
    }
}

/// One expanded case: a unique generated name plus the fixed parameter
/// bindings of exactly one table row.
#[derive(Debug, Clone)]
pub struct GeneratedCase {
    name: String,
    bindings: Vec<(String, CaseValue)>,
}

impl GeneratedCase {
    /// Generated name, e.g. `InvalidLogin[-Empty username]`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binding for a parameter.
    #[must_use]
    pub fn get(&self, param: &str) -> Option<&CaseValue> {
        self.bindings
            .iter()
            .find(|(p, _)| p == param)
            .map(|(_, v)| v)
    }

    /// Binding rendered as input text; empty when absent.
    #[must_use]
    pub fn input(&self, param: &str) -> String {
        self.get(param).map(CaseValue::as_input).unwrap_or_default()
    }

    /// The case label (final binding).
    #[must_use]
    pub fn label(&self) -> String {
        self.bindings
            .last()
            .map(|(_, v)| v.to_string())
            .unwrap_or_default()
    }

    /// All bindings in declaration order.
    #[must_use]
    pub fn bindings(&self) -> &[(String, CaseValue)] {
        &self.bindings
    }
}

/// Derive the generated name for one row.
fn case_name(template: &str, strip_prefix: &str, row: &CaseRow) -> String {
    let base = template.strip_prefix(strip_prefix).unwrap_or(template);
    let suffix = row
        .values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("-");
    format!("{base}[{suffix}]")
}

/// Expand a case table into independent generated cases.
///
/// One case per row, in row order. Fails fast on the first arity
/// mismatch or generated-name collision — suite construction aborts,
/// nothing runs.
pub fn expand(
    template: &str,
    strip_prefix: &str,
    table: &CaseTable,
) -> BolsaResult<Vec<GeneratedCase>> {
    let mut seen = HashSet::new();
    let mut cases = Vec::with_capacity(table.rows.len());
    for (index, row) in table.rows.iter().enumerate() {
        if row.arity() != table.params.len() {
            return Err(BolsaError::CaseArity {
                row: index,
                expected: table.params.len(),
                got: row.arity(),
                params: table.params_decl.clone(),
            });
        }
        let name = case_name(template, strip_prefix, row);
        if !seen.insert(name.clone()) {
            return Err(BolsaError::DuplicateCase { name });
        }
        cases.push(GeneratedCase {
            name,
            bindings: table
                .params
                .iter()
                .cloned()
                .zip(row.values.iter().cloned())
                .collect(),
        });
    }
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_table() -> CaseTable {
        CaseTable::new(
            "username, case",
            vec![
                row!["", "Empty username"],
                row!["non-existent-username", "Non-existent username"],
            ],
        )
    }

    mod table_tests {
        use super::*;

        #[test]
        fn test_param_parsing() {
            let table = login_table();
            assert_eq!(table.params(), ["username", "case"]);
        }

        #[test]
        fn test_row_macro_mixes_types() {
            let row = row![0, "Zero amount"];
            assert_eq!(row.arity(), 2);
            assert_eq!(row.label(), "Zero amount");
        }

        #[test]
        fn test_float_values_render_plainly() {
            let row = row![3.5, "Float amount (period)"];
            assert_eq!(row.values[0].to_string(), "3.5");
        }

        #[test]
        fn test_fractionless_float_keeps_decimal_point() {
            let row = row![7.0, "Fractionless float"];
            assert_eq!(row.values[0].to_string(), "7.0");
        }
    }

    mod expand_tests {
        use super::*;

        #[test]
        fn test_bijection() {
            let table = login_table();
            let cases = expand("InvalidLogin", "Test", &table).unwrap();
            assert_eq!(cases.len(), table.rows().len());
            for (case, table_row) in cases.iter().zip(table.rows()) {
                assert_eq!(
                    case.get("username").unwrap().to_string(),
                    table_row.values[0].to_string()
                );
                assert_eq!(case.label(), table_row.label());
            }
        }

        #[test]
        fn test_name_derivation_strips_prefix() {
            let table = login_table();
            let cases = expand("TestInvalidLogin", "Test", &table).unwrap();
            assert_eq!(cases[0].name(), "InvalidLogin[-Empty username]");
            assert_eq!(
                cases[1].name(),
                "InvalidLogin[non-existent-username-Non-existent username]"
            );
        }

        #[test]
        fn test_missing_prefix_leaves_name() {
            let table = login_table();
            let cases = expand("InvalidLogin", "Test", &table).unwrap();
            assert!(cases[0].name().starts_with("InvalidLogin["));
        }

        #[test]
        fn test_arity_mismatch_fails_fast() {
            let table = CaseTable::new(
                "username, case",
                vec![row!["ok", "fine"], row!["only-one-value"]],
            );
            let err = expand("T", "", &table).unwrap_err();
            match err {
                BolsaError::CaseArity { row, expected, got, .. } => {
                    assert_eq!(row, 1);
                    assert_eq!(expected, 2);
                    assert_eq!(got, 1);
                }
                other => panic!("expected CaseArity, got {other}"),
            }
        }

        #[test]
        fn test_duplicate_names_fail_fast() {
            let table = CaseTable::new(
                "amount, case",
                vec![row![0, "Zero amount"], row![0, "Zero amount"]],
            );
            let err = expand("InvalidAmount", "", &table).unwrap_err();
            assert!(matches!(err, BolsaError::DuplicateCase { .. }));
        }

        #[test]
        fn test_bindings_are_per_case() {
            let table = CaseTable::new(
                "amount, case",
                vec![row![1, "one"], row![2, "two"], row![3, "three"]],
            );
            let cases = expand("Amounts", "", &table).unwrap();
            let values: Vec<i64> = cases
                .iter()
                .map(|c| c.get("amount").unwrap().as_int().unwrap())
                .collect();
            assert_eq!(values, [1, 2, 3]);
        }

        #[test]
        fn test_input_rendering() {
            let table = CaseTable::new("amount, case", vec![row![-9500, "Negative amount"]]);
            let cases = expand("Amounts", "", &table).unwrap();
            assert_eq!(cases[0].input("amount"), "-9500");
            assert_eq!(cases[0].input("missing"), "");
        }
    }
}
