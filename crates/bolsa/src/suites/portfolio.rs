//! Portfolio (default route) suites.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{portfolio as pc, INITIAL_CASH, MOCK_PRICE, TEST_SYMBOLS};
use crate::harness::{check, Suite, Tag};
use crate::page::Page;
use crate::result::{ensure, BolsaError, BolsaResult};
use crate::scrape::{CellValue, TableScrape};
use crate::session::seed_position;
use crate::verify::{round2, subset_match};

use super::with_new_user;

fn pick_two(rng: &mut impl Rng) -> (String, String) {
    let mut symbols = TEST_SYMBOLS.to_vec();
    symbols.shuffle(rng);
    (symbols[0].to_string(), symbols[1].to_string())
}

/// Structure and fresh-user defaults.
fn basics() -> Suite {
    with_new_user(
        Suite::new("PortfolioPageBasics")
            .check(check("has stock table", |cx| {
                Box::pin(async move {
                    let portfolio = cx.session.portfolio_page();
                    portfolio.open().await?;
                    ensure(
                        portfolio.holdings_table().await?.is_some(),
                        "Expected Default page to have stock table",
                    )
                })
            }))
            .check(check("stock table is unique", |cx| {
                Box::pin(async move {
                    let portfolio = cx.session.portfolio_page();
                    portfolio.open().await?;
                    ensure(
                        Page::is_unique(&portfolio.holdings_tables_all().await?),
                        "Expected to find only one stock table on Default page",
                    )
                })
            }))
            .check(check("header count", |cx| {
                Box::pin(async move {
                    let portfolio = cx.session.portfolio_page();
                    portfolio.open().await?;
                    let names = portfolio.header_names().await?;
                    ensure(
                        names.len() == pc::EXPECTED_HEADERS.len(),
                        format!(
                            "Expected stock table to have {} headers: {:?}; actual: {names:?}",
                            pc::EXPECTED_HEADERS.len(),
                            pc::EXPECTED_HEADERS
                        ),
                    )
                })
            }))
            .check(check("expected header titles", |cx| {
                Box::pin(async move {
                    let portfolio = cx.session.portfolio_page();
                    portfolio.open().await?;
                    let names = portfolio.header_names().await?;
                    for expected in pc::EXPECTED_HEADERS {
                        ensure(
                            names.iter().any(|n| n == expected),
                            format!("Expected default table to have header named {expected}"),
                        )?;
                    }
                    Ok(())
                })
            }))
            .check(check("has cash element", |cx| {
                Box::pin(async move {
                    let portfolio = cx.session.portfolio_page();
                    portfolio.open().await?;
                    ensure(
                        portfolio.cash_cell().await?.is_some(),
                        "Expected an element displaying user's current Cash amount",
                    )
                })
            }))
            .check(check("cash element is unique", |cx| {
                Box::pin(async move {
                    let portfolio = cx.session.portfolio_page();
                    portfolio.open().await?;
                    ensure(
                        Page::is_unique(&portfolio.cash_cells_all().await?),
                        "Expected to find only one Cash element on Default page",
                    )
                })
            }))
            .check(check("has total element", |cx| {
                Box::pin(async move {
                    let portfolio = cx.session.portfolio_page();
                    portfolio.open().await?;
                    ensure(
                        portfolio.total_cell().await?.is_some(),
                        "Expected an element displaying user's TOTAL amount of money",
                    )
                })
            }))
            .check(check("new user table has no data rows", |cx| {
                Box::pin(async move {
                    let portfolio = cx.session.portfolio_page();
                    portfolio.open().await?;
                    ensure(
                        portfolio.table_rows().await?.is_none(),
                        "Expected stock table to have no rows for newly registered user",
                    )
                })
            }))
            .check(check("initial cash value", |cx| {
                Box::pin(async move {
                    let portfolio = cx.session.portfolio_page();
                    portfolio.open().await?;
                    let cash = portfolio.cash_value().await?;
                    ensure(
                        cash == Some(INITIAL_CASH),
                        format!("Expected cash value to be {INITIAL_CASH}, actual value: {cash:?}"),
                    )
                })
            }))
            .check(check("initial total value", |cx| {
                Box::pin(async move {
                    let portfolio = cx.session.portfolio_page();
                    portfolio.open().await?;
                    let total = portfolio.total_value().await?;
                    ensure(
                        total == Some(INITIAL_CASH),
                        format!("Expected TOTAL value to be {INITIAL_CASH}, actual value: {total:?}"),
                    )
                })
            })),
    )
}

/// Displayed table data must agree with the database.
fn table_db_agreement(rng: &mut impl Rng) -> Suite {
    let (first, second) = pick_two(rng);
    let seeded = [(first, 1_i64), (second, 2_i64)];
    let setup_seeded = seeded.clone();
    let suite = with_new_user(Suite::new("PortfolioTableMatchesDb").tag(Tag::DbReliant)).setup(
        move |cx| {
            let seeded = setup_seeded.clone();
            Box::pin(async move {
                let creds = cx.creds()?.clone();
                for (symbol, amount) in &seeded {
                    seed_position(&cx.session, &creds, symbol, *amount, MOCK_PRICE).await?;
                }
                Ok(())
            })
        },
    );

    suite
        .check(check("cash is read from the database", |cx| {
            Box::pin(async move {
                let creds = cx.creds()?.clone();
                let db = cx
                    .session
                    .db
                    .as_ref()
                    .ok_or_else(|| BolsaError::check("database access required"))?;
                let expected = db.user_cash(&creds.username)?;
                let portfolio = cx.session.portfolio_page();
                portfolio.open().await?;
                let cash = portfolio.cash_value().await?;
                ensure(
                    cash == Some(expected),
                    format!("Expected cash element value to be {expected}, actual: {cash:?}"),
                )
            })
        }))
        .check(check("total equals db cash plus stock value", |cx| {
            Box::pin(async move {
                let creds = cx.creds()?.clone();
                let db = cx
                    .session
                    .db
                    .as_ref()
                    .ok_or_else(|| BolsaError::check("database access required"))?;
                let mut expected = db.user_cash(&creds.username)?;
                let portfolio = cx.session.portfolio_page();
                portfolio.open().await?;
                let scrape = portfolio.scrape_holdings().await?;
                let rows = match &scrape {
                    TableScrape::Rows(rows) => rows.as_slice(),
                    TableScrape::Empty => &[],
                    TableScrape::Malformed { cells, headers } => {
                        return ensure(
                            false,
                            format!("Malformed holdings table: {cells} cells over {headers} headers"),
                        );
                    }
                };
                for row in rows {
                    let price = row
                        .get(pc::HEADER_PRICE)
                        .and_then(CellValue::as_number)
                        .unwrap_or(0.0);
                    let amount = row
                        .get(pc::HEADER_AMOUNT)
                        .and_then(CellValue::as_number)
                        .unwrap_or(0.0);
                    expected += round2(price * amount);
                }
                let expected = round2(expected);
                let total = portfolio.total_value().await?;
                ensure(
                    total == Some(expected),
                    format!(
                        "Expected total to equal db cash plus stock value ({expected}); \
                         actual value: {total:?}"
                    ),
                )
            })
        }))
        .check(check("table rows match possessed stocks", |cx| {
            Box::pin(async move {
                let creds = cx.creds()?.clone();
                let db = cx
                    .session
                    .db
                    .as_ref()
                    .ok_or_else(|| BolsaError::check("database access required"))?;
                let db_rows = db.possessed_stocks(&creds.username)?;
                let portfolio = cx.session.portfolio_page();
                portfolio.open().await?;
                let scrape = portfolio.scrape_holdings().await?;
                let rows = scrape.rows().unwrap_or(&[]);
                ensure(
                    rows.len() == db_rows.len(),
                    format!(
                        "Expected {} rows in the holdings table, found {}",
                        db_rows.len(),
                        rows.len()
                    ),
                )?;
                for (db_row, table_row) in db_rows.iter().zip(rows) {
                    let mut expected: HashMap<String, CellValue> = HashMap::new();
                    let symbol = db_row.text("stockname").unwrap_or_default();
                    let _ = expected.insert(
                        pc::HEADER_SYMBOL.to_string(),
                        CellValue::Text(symbol.clone()),
                    );
                    let _ = expected.insert(
                        pc::HEADER_AMOUNT.to_string(),
                        CellValue::Int(db_row.int("amount").unwrap_or_default()),
                    );
                    let report = subset_match(&table_row.to_map(), &expected);
                    ensure(
                        report.is_complete(),
                        format!("Missing table columns: {:?}", report.missing),
                    )?;
                    let mismatches = report.mismatches();
                    ensure(
                        mismatches.is_empty(),
                        format!("Table/database disagreement: {mismatches:?}"),
                    )?;
                }
                Ok(())
            })
        }))
        .check(check("per-stock total is amount times price", |cx| {
            Box::pin(async move {
                let portfolio = cx.session.portfolio_page();
                portfolio.open().await?;
                let scrape = portfolio.scrape_holdings().await?;
                for row in scrape.rows().unwrap_or(&[]) {
                    let price = row
                        .get(pc::HEADER_PRICE)
                        .and_then(CellValue::as_number)
                        .unwrap_or(0.0);
                    let amount = row
                        .get(pc::HEADER_AMOUNT)
                        .and_then(CellValue::as_number)
                        .unwrap_or(0.0);
                    let expected = round2(amount * price);
                    let actual = row.get(pc::HEADER_TOTAL).and_then(CellValue::as_number);
                    ensure(
                        actual == Some(expected),
                        format!(
                            "Expected stock total to equal {expected}, actual value: {actual:?}"
                        ),
                    )?;
                }
                Ok(())
            })
        }))
}

/// Selling everything empties the table again.
fn empty_after_selling(rng: &mut impl Rng) -> Suite {
    let (symbol, _) = pick_two(rng);
    let setup_symbol = symbol.clone();
    with_new_user(Suite::new(format!("PortfolioEmptyAfterSelling[{symbol}]")).tag(Tag::DbReliant))
        .setup(move |cx| {
            let symbol = setup_symbol.clone();
            Box::pin(async move {
                let creds = cx.creds()?.clone();
                seed_position(&cx.session, &creds, &symbol, 2, MOCK_PRICE).await?;
                // the matching sale at the same price
                if let Some(db) = &cx.session.db {
                    db.add_transaction(&creds.username, &symbol, -2, MOCK_PRICE)?;
                    db.change_cash_by(&creds.username, 2.0 * MOCK_PRICE)?;
                }
                Ok(())
            })
        })
        .check(check("table has no rows after selling", |cx| {
            Box::pin(async move {
                let portfolio = cx.session.portfolio_page();
                portfolio.open().await?;
                ensure(
                    portfolio.table_rows().await?.is_none(),
                    "Expected stock table to have no rows after selling possessed stocks",
                )
            })
        }))
}

/// UI-only variant: buy through the browser, then hold the TOTAL
/// invariant without consulting the database.
fn ui_total_invariant(rng: &mut impl Rng) -> Suite {
    let (symbol, _) = pick_two(rng);
    let setup_symbol = symbol.clone();
    with_new_user(Suite::new(format!("PortfolioTotalInvariant[{symbol}]")))
        .setup(move |cx| {
            let symbol = setup_symbol.clone();
            Box::pin(async move {
                let buy = cx.session.buy_page();
                buy.open().await?;
                buy.buy_stock(&symbol, "1").await
            })
        })
        .check(check("table displays data after purchase", |cx| {
            Box::pin(async move {
                let portfolio = cx.session.portfolio_page();
                portfolio.open().await?;
                ensure(
                    portfolio.table_rows().await?.is_some(),
                    "Expected stock table to have rows after purchasing stocks",
                )
            })
        }))
        .check(check("total equals cash plus stock value", |cx| {
            Box::pin(async move {
                let portfolio = cx.session.portfolio_page();
                portfolio.open().await?;
                let mut expected = portfolio.cash_value().await?.unwrap_or_default();
                let scrape = portfolio.scrape_holdings().await?;
                for row in scrape.rows().unwrap_or(&[]) {
                    let price = row
                        .get(pc::HEADER_PRICE)
                        .and_then(CellValue::as_number)
                        .unwrap_or(0.0);
                    let amount = row
                        .get(pc::HEADER_AMOUNT)
                        .and_then(CellValue::as_number)
                        .unwrap_or(0.0);
                    expected += round2(price * amount);
                }
                let expected = round2(expected);
                let total = portfolio.total_value().await?;
                ensure(
                    total == Some(expected),
                    format!(
                        "Expected total to equal leftover cash plus stock value ({expected}); \
                         actual value: {total:?}"
                    ),
                )
            })
        }))
}

/// All Portfolio suites.
pub fn suites(rng: &mut impl Rng) -> BolsaResult<Vec<Suite>> {
    Ok(vec![
        basics(),
        table_db_agreement(rng),
        empty_after_selling(rng),
        ui_total_invariant(rng),
    ])
}
