//! History page suites.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{history as hc, MOCK_PRICE, TEST_SYMBOLS};
use crate::harness::{check, Suite, Tag};
use crate::page::Page;
use crate::result::{ensure, BolsaError, BolsaResult};
use crate::scrape::CellValue;
use crate::session::seed_position;
use crate::verify::compare_time_now;

use super::with_new_user;

/// Offset between the app server's clock and the runner's, in hours.
const SERVER_TZ_OFFSET_HOURS: i64 = 2;

/// Allowed drift between a displayed timestamp and "now", in seconds.
const TIMESTAMP_TOLERANCE_SECS: i64 = 5;

fn pick(rng: &mut impl Rng) -> String {
    (*TEST_SYMBOLS.choose(rng).unwrap_or(&"AAPL")).to_string()
}

/// Structure checks for a fresh user.
fn basics() -> Suite {
    with_new_user(
        Suite::new("HistoryPageBasics")
            .check(check("has history table", |cx| {
                Box::pin(async move {
                    let history = cx.session.history_page();
                    history.open().await?;
                    ensure(
                        history.history_table().await?.is_some(),
                        "Expected History page to have transactions table",
                    )
                })
            }))
            .check(check("history table is unique", |cx| {
                Box::pin(async move {
                    let history = cx.session.history_page();
                    history.open().await?;
                    ensure(
                        Page::is_unique(&history.history_tables_all().await?),
                        "Expected to find only one transactions table on History page",
                    )
                })
            }))
            .check(check("header count", |cx| {
                Box::pin(async move {
                    let history = cx.session.history_page();
                    history.open().await?;
                    let names = history.header_names().await?;
                    ensure(
                        names.len() == hc::EXPECTED_HEADERS.len(),
                        format!(
                            "Expected history table to have {} headers: {:?}; actual: {names:?}",
                            hc::EXPECTED_HEADERS.len(),
                            hc::EXPECTED_HEADERS
                        ),
                    )
                })
            }))
            .check(check("expected header titles", |cx| {
                Box::pin(async move {
                    let history = cx.session.history_page();
                    history.open().await?;
                    let names = history.header_names().await?;
                    for expected in hc::EXPECTED_HEADERS {
                        ensure(
                            names.iter().any(|n| n == expected),
                            format!("Expected history table to have header named {expected}"),
                        )?;
                    }
                    Ok(())
                })
            }))
            .check(check("new user history has no rows", |cx| {
                Box::pin(async move {
                    let history = cx.session.history_page();
                    history.open().await?;
                    ensure(
                        history.table_rows().await?.is_none(),
                        "Expected transaction history to be empty for newly registered user",
                    )
                })
            })),
    )
}

/// History rows reflect every transaction, sales included.
fn rows_match_transactions(rng: &mut impl Rng) -> Suite {
    let symbol = pick(rng);
    let setup_symbol = symbol.clone();
    with_new_user(Suite::new(format!("HistoryRowsMatchTransactions[{symbol}]")).tag(Tag::DbReliant))
        .setup(move |cx| {
            let symbol = setup_symbol.clone();
            Box::pin(async move {
                let creds = cx.creds()?.clone();
                seed_position(&cx.session, &creds, &symbol, 2, MOCK_PRICE).await?;
                if let Some(db) = &cx.session.db {
                    db.add_transaction(&creds.username, &symbol, -1, MOCK_PRICE)?;
                    db.change_cash_by(&creds.username, MOCK_PRICE)?;
                }
                Ok(())
            })
        })
        .check(check("row count equals transaction count", |cx| {
            Box::pin(async move {
                let creds = cx.creds()?.clone();
                let db = cx
                    .session
                    .db
                    .as_ref()
                    .ok_or_else(|| BolsaError::check("database access required"))?;
                let transactions = db.transactions(&creds.username)?;
                let history = cx.session.history_page();
                history.open().await?;
                let scrape = history.scrape_history().await?;
                ensure(
                    scrape.row_count() == transactions.len(),
                    format!(
                        "Expected {} history rows, found {}",
                        transactions.len(),
                        scrape.row_count()
                    ),
                )
            })
        }))
        .check(check("rows carry the transaction data", |cx| {
            Box::pin(async move {
                let creds = cx.creds()?.clone();
                let db = cx
                    .session
                    .db
                    .as_ref()
                    .ok_or_else(|| BolsaError::check("database access required"))?;
                let transactions = db.transactions(&creds.username)?;
                let history = cx.session.history_page();
                history.open().await?;
                let scrape = history.scrape_history().await?;
                let rows = scrape.rows().unwrap_or(&[]);
                for (tran, row) in transactions.iter().zip(rows) {
                    let symbol = tran.text("stockname").unwrap_or_default();
                    ensure(
                        row.get("Symbol") == Some(&CellValue::Text(symbol.clone())),
                        format!("Expected a history row for {symbol}"),
                    )?;
                    // selling shows as a negative share count
                    let amount = tran.int("amount").unwrap_or_default();
                    ensure(
                        row.get(hc::HEADER_AMOUNT) == Some(&CellValue::Int(amount)),
                        format!(
                            "Expected history row share count {amount}, actual: {:?}",
                            row.get(hc::HEADER_AMOUNT)
                        ),
                    )?;
                }
                Ok(())
            })
        }))
        .check(check("timestamps are fresh", |cx| {
            Box::pin(async move {
                let history = cx.session.history_page();
                history.open().await?;
                let scrape = history.scrape_history().await?;
                for row in scrape.rows().unwrap_or(&[]) {
                    let Some(CellValue::Text(stamp)) = row.get(hc::HEADER_DATETIME) else {
                        return ensure(false, "history row has no timestamp cell");
                    };
                    ensure(
                        compare_time_now(stamp, SERVER_TZ_OFFSET_HOURS, TIMESTAMP_TOLERANCE_SECS),
                        format!("Expected a just-recorded timestamp, actual: {stamp}"),
                    )?;
                }
                Ok(())
            })
        }))
}

/// All History suites.
pub fn suites(rng: &mut impl Rng) -> BolsaResult<Vec<Suite>> {
    Ok(vec![basics(), rows_match_transactions(rng)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_suite_counts() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(suites(&mut rng).unwrap().len(), 2);
    }
}
