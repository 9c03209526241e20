//! End-to-end scenarios through the public API, driven by the scripted
//! mock driver and an in-memory database.

use std::collections::HashMap;

use bolsa::db::DbQueries;
use bolsa::driver::into_handle;
use bolsa::mock::{MockDriver, MockElement, MockPage};
use bolsa::pages::{PortfolioPage, Urls};
use bolsa::scrape::CellValue;
use bolsa::verify::{round2, subset_match};

const BASE: &str = "https://app";

fn seeded_db(username: &str) -> DbQueries {
    let db = DbQueries::open_in_memory().unwrap();
    db.ensure_schema().unwrap();
    db.add_user(username, "sha256$00$stub").unwrap();
    db
}

#[test]
fn successful_purchase_updates_position_and_cash() {
    let db = seeded_db("ana");
    let price = 777.77;

    db.add_transaction("ana", "AAPL", 1, price).unwrap();
    db.change_cash_by("ana", -price).unwrap();

    let stocks = db.possessed_stocks("ana").unwrap();
    assert_eq!(stocks.len(), 1);
    assert_eq!(stocks[0].int("amount"), Some(1));
    assert_eq!(db.user_cash("ana").unwrap(), round2(10000.0 - price));
}

#[test]
fn rejected_purchase_leaves_no_trace() {
    let db = seeded_db("ana");
    // the app rejected the symbol, so nothing was written
    assert!(db.transactions("ana").unwrap().is_empty());
    assert_eq!(db.user_cash("ana").unwrap(), 10000.0);
}

#[test]
fn selling_more_than_held_changes_nothing() {
    let db = seeded_db("ana");
    db.add_transaction("ana", "NFLX", 2, 100.0).unwrap();

    // the app refused the oversized sale; the position still stands
    let stocks = db.possessed_stocks("ana").unwrap();
    assert_eq!(stocks[0].int("amount"), Some(2));
    assert_eq!(db.transactions("ana").unwrap().len(), 1);
}

#[test]
fn net_position_follows_buys_and_sells() {
    let db = seeded_db("ana");
    db.add_transaction("ana", "MCD", 5, 50.0).unwrap();
    db.add_transaction("ana", "MCD", -3, 55.0).unwrap();
    db.add_transaction("ana", "MCD", -2, 60.0).unwrap();

    assert!(db.possessed_stocks("ana").unwrap().is_empty());
    assert_eq!(db.transactions("ana").unwrap().len(), 3);
}

/// Build a scripted portfolio page with the given holdings and footer.
fn portfolio_page(rows: &[(&str, &str, i64, f64)], cash: f64, total: f64) -> MockDriver {
    let urls = Urls::new(BASE);
    let mut driver = MockDriver::new();
    let mut page = MockPage::new("C$50 Finance: Portfolio");
    page.push(MockElement::matching(&PortfolioPage::HOLDINGS_TABLE));
    for header in ["Symbol", "Name", "Shares", "Price", "TOTAL"] {
        page.push(MockElement::matching(&PortfolioPage::TABLE_HEADERS).text(header));
    }
    for (symbol, name, amount, price) in rows {
        let row_total = round2(*amount as f64 * price);
        for cell in [
            (*symbol).to_string(),
            (*name).to_string(),
            amount.to_string(),
            format!("${price:.2}"),
            format!("${row_total:.2}"),
        ] {
            page.push(MockElement::matching(&PortfolioPage::TABLE_CELLS).text(cell));
        }
        page.push(MockElement::matching(&PortfolioPage::TABLE_ROWS));
    }
    page.push(MockElement::matching(&PortfolioPage::CASH_CELL).text(as_currency(cash)));
    page.push(MockElement::matching(&PortfolioPage::TOTAL_CELL).text(as_currency(total)));
    driver.install(urls.default_page(), page);
    driver
}

/// Render a value the way the app does: `$` plus comma-grouped dollars
/// and two decimal digits.
fn as_currency(value: f64) -> String {
    let cents = (round2(value) * 100.0).round() as i64;
    let dollars = cents / 100;
    let fraction = (cents % 100).abs();
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

#[tokio::test]
async fn portfolio_total_invariant_holds_on_scraped_state() {
    let rows = [("AAPL", "Apple, Inc.", 2, 150.0), ("MSFT", "Microsoft", 1, 300.5)];
    let cash = 9399.5;
    let total = round2(cash + 2.0 * 150.0 + 300.5);
    let driver = portfolio_page(&rows, cash, total);

    let urls = Urls::new(BASE);
    let portfolio = PortfolioPage::new(into_handle(driver), &urls);
    portfolio.open().await.unwrap();

    let scraped_cash = portfolio.cash_value().await.unwrap().unwrap();
    let mut computed = scraped_cash;
    let scrape = portfolio.scrape_holdings().await.unwrap();
    for row in scrape.rows().unwrap() {
        let price = row.get("Price").and_then(CellValue::as_number).unwrap();
        let amount = row.get("Shares").and_then(CellValue::as_number).unwrap();
        computed += round2(price * amount);
    }
    assert_eq!(
        portfolio.total_value().await.unwrap(),
        Some(round2(computed))
    );
}

#[tokio::test]
async fn scraped_rows_agree_with_database_positions() {
    let db = seeded_db("ana");
    db.add_transaction("ana", "AAPL", 2, 150.0).unwrap();
    db.add_transaction("ana", "MSFT", 1, 300.5).unwrap();

    let rows = [("AAPL", "Apple, Inc.", 2, 150.0), ("MSFT", "Microsoft", 1, 300.5)];
    let driver = portfolio_page(&rows, 9399.5, 10000.0);
    let urls = Urls::new(BASE);
    let portfolio = PortfolioPage::new(into_handle(driver), &urls);
    portfolio.open().await.unwrap();

    let scrape = portfolio.scrape_holdings().await.unwrap();
    let table_rows = scrape.rows().unwrap();
    let db_rows = db.possessed_stocks("ana").unwrap();
    assert_eq!(table_rows.len(), db_rows.len());

    for (db_row, table_row) in db_rows.iter().zip(table_rows) {
        let mut expected: HashMap<String, CellValue> = HashMap::new();
        expected.insert(
            "Symbol".to_string(),
            CellValue::Text(db_row.text("stockname").unwrap()),
        );
        expected.insert(
            "Shares".to_string(),
            CellValue::Int(db_row.int("amount").unwrap()),
        );
        expected.insert(
            "Price".to_string(),
            CellValue::Currency(db_row.number("price").unwrap()),
        );
        let report = subset_match(&table_row.to_map(), &expected);
        assert!(report.matches(), "mismatches: {:?}", report.mismatches());
    }
}
