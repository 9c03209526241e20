//! Table scraping: flattened cell text -> typed rows keyed by header.

use std::collections::HashMap;
use std::fmt;

use crate::verify::{currency_to_number, is_currency, is_integer, CurrencyPattern};

/// A typed table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Whole number (share counts)
    Int(i64),
    /// Currency amount, rounded to 2 decimals
    Currency(f64),
    /// Anything else, verbatim
    Text(String),
}

impl CellValue {
    /// Coerce raw cell text into a typed value.
    ///
    /// Integer pattern wins first, then the strict currency pattern,
    /// else the text stays a string. The integer pattern alone matches
    /// the empty string, so parseability decides.
    #[must_use]
    pub fn coerce(text: &str) -> Self {
        if is_integer(text) {
            if let Ok(n) = text.parse::<i64>() {
                return Self::Int(n);
            }
        }
        if is_currency(text, CurrencyPattern::Strict) {
            if let Some(amount) = currency_to_number(text) {
                return Self::Currency(amount);
            }
        }
        Self::Text(text.to_string())
    }

    /// Numeric view of the cell, when it has one.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Currency(c) => Some(*c),
            Self::Text(_) => None,
        }
    }

    /// Integer view of the cell, when it is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Currency(c) => write!(f, "{c:.2}"),
            Self::Text(t) => write!(f, "{t}"),
        }
    }
}

/// One scraped table row: header text -> typed cell, in header order.
///
/// A read-only snapshot; built fresh on each scrape and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    cells: Vec<(String, CellValue)>,
}

impl TableRow {
    fn new(cells: Vec<(String, CellValue)>) -> Self {
        Self { cells }
    }

    /// Cell under a header.
    #[must_use]
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(h, _)| h == header).map(|(_, v)| v)
    }

    /// Number of cells (equals the header count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True for a row with no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate (header, value) pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, CellValue)> {
        self.cells.iter()
    }

    /// Copy into a map for [`crate::verify::zip_by_key`] /
    /// [`crate::verify::subset_match`].
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, CellValue> {
        self.cells.iter().cloned().collect()
    }
}

/// Outcome of a table scrape.
///
/// "No rows" and "geometry is broken" are different observations and
/// must stay distinguishable: an empty portfolio is a legitimate page
/// state, a cell count that does not divide by the header count is a
/// malformed table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableScrape {
    /// Headers present, zero data cells
    Empty,
    /// Cell count not divisible by header count (or no headers at all)
    Malformed {
        /// Number of data cells seen
        cells: usize,
        /// Number of headers seen
        headers: usize,
    },
    /// One row dictionary per table row
    Rows(Vec<TableRow>),
}

impl TableScrape {
    /// Rows, when the scrape produced any.
    #[must_use]
    pub fn rows(&self) -> Option<&[TableRow]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// The single row of a one-row table.
    #[must_use]
    pub fn single(&self) -> Option<&TableRow> {
        match self {
            Self::Rows(rows) if rows.len() == 1 => rows.first(),
            _ => None,
        }
    }

    /// Row count; zero for empty or malformed scrapes.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows().map_or(0, <[TableRow]>::len)
    }
}

/// Zip flattened cell text into per-row dictionaries keyed by header.
///
/// Cells are consumed in reading order, wrapping every
/// `cells.len() / headers.len()` entries; each cell is coerced through
/// [`CellValue::coerce`].
#[must_use]
pub fn organize_cells(cell_texts: &[String], header_texts: &[String]) -> TableScrape {
    if header_texts.is_empty() {
        return TableScrape::Malformed {
            cells: cell_texts.len(),
            headers: 0,
        };
    }
    if cell_texts.is_empty() {
        return TableScrape::Empty;
    }
    if cell_texts.len() % header_texts.len() != 0 {
        return TableScrape::Malformed {
            cells: cell_texts.len(),
            headers: header_texts.len(),
        };
    }

    let rows = cell_texts
        .chunks(header_texts.len())
        .map(|chunk| {
            TableRow::new(
                header_texts
                    .iter()
                    .zip(chunk)
                    .map(|(h, c)| (h.clone(), CellValue::coerce(c)))
                    .collect(),
            )
        })
        .collect();
    TableScrape::Rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    mod cell_tests {
        use super::*;

        #[test]
        fn test_coerce_integer() {
            assert_eq!(CellValue::coerce("15"), CellValue::Int(15));
            assert_eq!(CellValue::coerce("-3"), CellValue::Int(-3));
        }

        #[test]
        fn test_coerce_currency() {
            assert_eq!(CellValue::coerce("$777.77"), CellValue::Currency(777.77));
            assert_eq!(
                CellValue::coerce("$10,000.00"),
                CellValue::Currency(10000.0)
            );
        }

        #[test]
        fn test_coerce_text_fallbacks() {
            assert_eq!(
                CellValue::coerce("AAPL"),
                CellValue::Text("AAPL".to_string())
            );
            // integer pattern matches but nothing parses
            assert_eq!(CellValue::coerce(""), CellValue::Text(String::new()));
            assert_eq!(CellValue::coerce("-"), CellValue::Text("-".to_string()));
            // timestamps stay text
            assert_eq!(
                CellValue::coerce("2024-05-17 12:30:10"),
                CellValue::Text("2024-05-17 12:30:10".to_string())
            );
        }

        #[test]
        fn test_numeric_views() {
            assert_eq!(CellValue::Int(3).as_number(), Some(3.0));
            assert_eq!(CellValue::Currency(7.5).as_number(), Some(7.5));
            assert_eq!(CellValue::Text("x".into()).as_number(), None);
            assert_eq!(CellValue::Int(3).as_int(), Some(3));
            assert_eq!(CellValue::Currency(7.5).as_int(), None);
        }
    }

    mod organize_tests {
        use super::*;

        #[test]
        fn test_row_count_is_cells_over_headers() {
            let headers = texts(&["Symbol", "Shares", "Price"]);
            let cells = texts(&["AAPL", "2", "$150.00", "MSFT", "1", "$300.10"]);
            let scrape = organize_cells(&cells, &headers);
            assert_eq!(scrape.row_count(), 2);
            let rows = scrape.rows().unwrap();
            assert_eq!(rows[0].get("Symbol"), Some(&CellValue::Text("AAPL".into())));
            assert_eq!(rows[0].get("Shares"), Some(&CellValue::Int(2)));
            assert_eq!(rows[1].get("Price"), Some(&CellValue::Currency(300.10)));
        }

        #[test]
        fn test_every_row_has_all_headers() {
            let headers = texts(&["Symbol", "Shares"]);
            let cells = texts(&["AAPL", "2", "MSFT", "1", "NFLX", "9"]);
            let scrape = organize_cells(&cells, &headers);
            for row in scrape.rows().unwrap() {
                assert_eq!(row.len(), 2);
                assert!(row.get("Symbol").is_some());
                assert!(row.get("Shares").is_some());
            }
        }

        #[test]
        fn test_indivisible_is_malformed() {
            let headers = texts(&["Symbol", "Shares", "Price"]);
            let cells = texts(&["AAPL", "2", "$150.00", "MSFT"]);
            assert_eq!(
                organize_cells(&cells, &headers),
                TableScrape::Malformed {
                    cells: 4,
                    headers: 3
                }
            );
        }

        #[test]
        fn test_no_cells_is_empty_not_malformed() {
            let headers = texts(&["Symbol", "Shares"]);
            assert_eq!(organize_cells(&[], &headers), TableScrape::Empty);
        }

        #[test]
        fn test_no_headers_is_malformed() {
            let cells = texts(&["AAPL"]);
            assert_eq!(
                organize_cells(&cells, &[]),
                TableScrape::Malformed {
                    cells: 1,
                    headers: 0
                }
            );
        }

        #[test]
        fn test_single_row_accessor() {
            let headers = texts(&["Symbol", "Shares"]);
            let one = texts(&["AAPL", "2"]);
            let scrape = organize_cells(&one, &headers);
            assert!(scrape.single().is_some());

            let two = texts(&["AAPL", "2", "MSFT", "1"]);
            let scrape = organize_cells(&two, &headers);
            assert!(scrape.single().is_none());
        }
    }
}
