//! Buy page suites.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{
    buy as bc, invalid_symbol_cases, typable_amount_cases, untypable_amount_cases, INITIAL_CASH,
    MOCK_PRICE, TEST_SYMBOLS,
};
use crate::harness::{check, expand_suites, Suite, Tag};
use crate::result::{ensure, BolsaError, BolsaResult};
use crate::verify::round2;

use super::with_new_user;

fn pick(rng: &mut impl Rng) -> String {
    (*TEST_SYMBOLS.choose(rng).unwrap_or(&"AAPL")).to_string()
}

/// Element presence and input metadata.
fn basics() -> Suite {
    with_new_user(
        Suite::new("BuyPageBasics")
            .check(check("has stock symbol input", |cx| {
                Box::pin(async move {
                    let buy = cx.session.buy_page();
                    buy.open().await?;
                    ensure(
                        buy.symbol_input().await?.is_some(),
                        "Expected Buy page to have stock symbol input field",
                    )
                })
            }))
            .check(check("has stock amount input", |cx| {
                Box::pin(async move {
                    let buy = cx.session.buy_page();
                    buy.open().await?;
                    ensure(
                        buy.amount_input().await?.is_some(),
                        "Expected Buy page to have stock amount input field",
                    )
                })
            }))
            .check(check("has buy button", |cx| {
                Box::pin(async move {
                    let buy = cx.session.buy_page();
                    buy.open().await?;
                    ensure(
                        buy.buy_button().await?.is_some(),
                        "Expected Buy page to have buy button",
                    )
                })
            }))
            .check(check("symbol input placeholder", |cx| {
                Box::pin(async move {
                    let buy = cx.session.buy_page();
                    buy.open().await?;
                    let input = buy
                        .require(&crate::pages::BuyPage::SYMBOL_INPUT, "symbol input")
                        .await?;
                    let placeholder = buy.placeholder_of(&input).await?;
                    ensure(
                        placeholder == bc::EX_SYMBOL_PLACEHOLDER,
                        format!(
                            "Expected symbol placeholder to be {}, actual value: {placeholder}",
                            bc::EX_SYMBOL_PLACEHOLDER
                        ),
                    )
                })
            }))
            .check(check("amount input placeholder", |cx| {
                Box::pin(async move {
                    let buy = cx.session.buy_page();
                    buy.open().await?;
                    let input = buy
                        .require(&crate::pages::BuyPage::AMOUNT_INPUT, "amount input")
                        .await?;
                    let placeholder = buy.placeholder_of(&input).await?;
                    ensure(
                        placeholder == bc::EX_AMOUNT_PLACEHOLDER,
                        format!(
                            "Expected amount placeholder to be {}, actual value: {placeholder}",
                            bc::EX_AMOUNT_PLACEHOLDER
                        ),
                    )
                })
            })),
    )
}

/// Successful purchases; the mock database mirrors each one so the
/// cross-checks have rows to look at.
fn successful_purchase_suites(rng: &mut impl Rng) -> BolsaResult<Vec<Suite>> {
    expand_suites(
        "TestSuccessfulPurchase",
        "Test",
        &bc::successful_purchase_cases(rng),
        |_case| {
            with_new_user(Suite::new("placeholder"))
                .setup(|cx| {
                    Box::pin(async move {
                        let symbol = cx.case_input("symbol");
                        let amount = cx.case_input("amount");
                        let buy = cx.session.buy_page();
                        buy.open().await?;
                        buy.buy_stock(&symbol, &amount).await?;
                        // mirror the purchase into the mock database
                        if let Some(db) = &cx.session.db {
                            let creds = cx.creds()?;
                            let shares: i64 = amount.parse().map_err(|_| {
                                BolsaError::check(format!("unparseable amount: {amount}"))
                            })?;
                            db.add_transaction(&creds.username, &symbol, shares, MOCK_PRICE)?;
                            db.change_cash_by(&creds.username, -(MOCK_PRICE * shares as f64))?;
                        }
                        Ok(())
                    })
                })
                .check(check("redirects to default page", |cx| {
                    Box::pin(async move {
                        let buy = cx.session.buy_page();
                        ensure(
                            buy.wait_for_url(&cx.session.urls.default_page()).await?,
                            format!(
                                "Expected redirection to Default page after purchase ({}), \
                                 actual URL: {}",
                                cx.case_label(),
                                buy.current_url().await?
                            ),
                        )
                    })
                }))
                .check(check("success alert appears", |cx| {
                    Box::pin(async move {
                        let page = cx.session.page_at(cx.session.urls.default_page());
                        let text = page.flash_text().await?.unwrap_or_default();
                        ensure(
                            text == bc::SUCCESS_MSG,
                            format!(
                                "Expected {} alert after purchasing, actual text: {text}",
                                bc::SUCCESS_MSG
                            ),
                        )
                    })
                }))
                .check(
                    check("db has the purchase row", |cx| {
                        Box::pin(async move {
                            let creds = cx.creds()?.clone();
                            let symbol = cx.case_input("symbol").to_uppercase();
                            let amount = cx.case_input("amount");
                            let db = cx.session.db.as_ref().ok_or_else(|| {
                                BolsaError::check("database access required")
                            })?;
                            let last = db.last_transaction(&creds.username)?.ok_or_else(|| {
                                BolsaError::check(
                                    "Expected to find a new purchase row for current user",
                                )
                            })?;
                            ensure(
                                last.text("stockname").as_deref() == Some(symbol.as_str()),
                                format!(
                                    "Expected the purchase row to carry symbol {symbol}, \
                                     actual: {:?}",
                                    last.text("stockname")
                                ),
                            )?;
                            ensure(
                                last.int("amount").map(|a| a.to_string()).as_deref()
                                    == Some(amount.as_str()),
                                format!(
                                    "Expected the purchase row to carry amount {amount}, \
                                     actual: {:?}",
                                    last.int("amount")
                                ),
                            )
                        })
                    })
                    .tag(Tag::DbReliant),
                )
                .check(
                    check("cash decreases by price times amount", |cx| {
                        Box::pin(async move {
                            let creds = cx.creds()?.clone();
                            let amount: f64 = cx.case_input("amount").parse().unwrap_or(0.0);
                            let db = cx.session.db.as_ref().ok_or_else(|| {
                                BolsaError::check("database access required")
                            })?;
                            let cash = db.user_cash(&creds.username)?;
                            let expected = round2(INITIAL_CASH - MOCK_PRICE * amount);
                            ensure(
                                cash == expected,
                                format!("Expected cash to be {expected}, actual value: {cash}"),
                            )
                        })
                    })
                    .tag(Tag::DbReliant),
                )
        },
    )
}

/// Invalid symbol sweeps: nothing is persisted, cash stays untouched.
fn invalid_symbol_suites(rng: &mut impl Rng) -> BolsaResult<Vec<Suite>> {
    expand_suites(
        "TestInvalidSymbolPurchase",
        "Test",
        &invalid_symbol_cases(rng),
        |_case| {
            with_new_user(Suite::new("placeholder"))
                .setup(|cx| {
                    Box::pin(async move {
                        let symbol = cx.case_input("symbol");
                        let buy = cx.session.buy_page();
                        buy.open().await?;
                        buy.buy_stock(&symbol, "1").await
                    })
                })
                .check(check("error image appears", |cx| {
                    Box::pin(async move {
                        let buy = cx.session.buy_page();
                        ensure(
                            buy.error_banner().await?.is_some(),
                            format!(
                                "Expected an error image when buying with: {}",
                                cx.case_label()
                            ),
                        )
                    })
                }))
                .check(check("error message", |cx| {
                    Box::pin(async move {
                        let buy = cx.session.buy_page();
                        let expected = if cx.case_label() == "Empty stock symbol" {
                            bc::EMPTY_SYMBOL
                        } else {
                            bc::INVALID_SYMBOL
                        };
                        let actual = buy.error_banner_text().await?.unwrap_or_default();
                        ensure(
                            actual == expected,
                            format!(
                                "Expected error image to have text {expected}, actual text: {actual}"
                            ),
                        )
                    })
                }))
                .check(
                    check("nothing was persisted", |cx| {
                        Box::pin(async move {
                            let creds = cx.creds()?.clone();
                            let db = cx.session.db.as_ref().ok_or_else(|| {
                                BolsaError::check("database access required")
                            })?;
                            ensure(
                                db.transactions(&creds.username)?.is_empty(),
                                "Expected no purchase rows after a rejected symbol",
                            )?;
                            let cash = db.user_cash(&creds.username)?;
                            ensure(
                                cash == INITIAL_CASH,
                                format!("Expected cash to stay {INITIAL_CASH}, actual: {cash}"),
                            )
                        })
                    })
                    .tag(Tag::DbReliant),
                )
        },
    )
}

/// Amounts the browser lets through but the backend must treat as
/// missing shares.
fn untypable_amount_suites(rng: &mut impl Rng) -> BolsaResult<Vec<Suite>> {
    let symbol = pick(rng);
    expand_suites(
        "TestUntypableAmountPurchase",
        "Test",
        &untypable_amount_cases(),
        move |_case| {
            let symbol = symbol.clone();
            with_new_user(Suite::new("placeholder"))
                .setup(move |cx| {
                    let symbol = symbol.clone();
                    Box::pin(async move {
                        let amount = cx.case_input("amount");
                        let buy = cx.session.buy_page();
                        buy.open().await?;
                        buy.buy_stock(&symbol, &amount).await
                    })
                })
                .check(check("error image appears with missing-shares text", |cx| {
                    Box::pin(async move {
                        let buy = cx.session.buy_page();
                        ensure(
                            buy.error_banner().await?.is_some(),
                            format!(
                                "Expected an error image when buying with: {}",
                                cx.case_label()
                            ),
                        )?;
                        let actual = buy.error_banner_text().await?.unwrap_or_default();
                        ensure(
                            actual == bc::EMPTY_AMOUNT,
                            format!(
                                "Expected error image to have text {}, actual text: {actual}",
                                bc::EMPTY_AMOUNT
                            ),
                        )
                    })
                }))
        },
    )
}

/// Amounts the native number input accepts; only the unaffordable one
/// reaches the backend, the rest die in the browser.
fn typable_amount_suites(rng: &mut impl Rng) -> BolsaResult<Vec<Suite>> {
    let symbol = pick(rng);
    expand_suites(
        "TestTypableAmountPurchase",
        "Test",
        &typable_amount_cases(rng),
        move |_case| {
            let symbol = symbol.clone();
            with_new_user(Suite::new("placeholder"))
                .setup(move |cx| {
                    let symbol = symbol.clone();
                    Box::pin(async move {
                        let amount = cx.case_input("amount");
                        let buy = cx.session.buy_page();
                        buy.open().await?;
                        buy.buy_stock(&symbol, &amount).await
                    })
                })
                .check(check("outcome matches native validation", |cx| {
                    Box::pin(async move {
                        let buy = cx.session.buy_page();
                        let banner = buy.error_banner().await?;
                        if cx.case_label() == "Buying more than affordable" {
                            ensure(
                                banner.is_some(),
                                "Expected the backend to reject an unaffordable purchase",
                            )?;
                            let actual = buy.error_banner_text().await?.unwrap_or_default();
                            ensure(
                                actual == bc::EXCEED_CASH,
                                format!(
                                    "Expected error image to have text {}, actual text: {actual}",
                                    bc::EXCEED_CASH
                                ),
                            )
                        } else {
                            ensure(
                                banner.is_none(),
                                format!(
                                    "Expected the browser to block the purchase outright: {}",
                                    cx.case_label()
                                ),
                            )
                        }
                    })
                }))
        },
    )
}

/// The same amounts with native validation stripped, so the backend's
/// own checks answer.
fn backend_amount_suites(rng: &mut impl Rng) -> BolsaResult<Vec<Suite>> {
    let symbol = pick(rng);
    expand_suites(
        "TestBackendAmountValidation",
        "Test",
        &typable_amount_cases(rng),
        move |_case| {
            let symbol = symbol.clone();
            with_new_user(Suite::new("placeholder"))
                .setup(move |cx| {
                    let symbol = symbol.clone();
                    Box::pin(async move {
                        let amount = cx.case_input("amount");
                        let buy = cx.session.buy_page();
                        buy.open().await?;
                        buy.buy_stock_forced(&symbol, &amount).await
                    })
                })
                .check(check("backend rejects with the right message", |cx| {
                    Box::pin(async move {
                        let buy = cx.session.buy_page();
                        ensure(
                            buy.error_banner().await?.is_some(),
                            format!(
                                "Expected an error image when buying with: {}",
                                cx.case_label()
                            ),
                        )?;
                        let expected = match cx.case_label().as_str() {
                            "Zero amount" => bc::ZERO_AMOUNT,
                            "Buying more than affordable" => bc::EXCEED_CASH,
                            _ => bc::INVALID_AMOUNT,
                        };
                        let actual = buy.error_banner_text().await?.unwrap_or_default();
                        ensure(
                            actual == expected,
                            format!(
                                "Expected error image to have text {expected}, actual text: {actual}"
                            ),
                        )
                    })
                }))
        },
    )
}

/// All Buy suites.
pub fn suites(rng: &mut impl Rng) -> BolsaResult<Vec<Suite>> {
    let mut suites = vec![basics()];
    suites.extend(successful_purchase_suites(rng)?);
    suites.extend(invalid_symbol_suites(rng)?);
    suites.extend(untypable_amount_suites(rng)?);
    suites.extend(typable_amount_suites(rng)?);
    suites.extend(backend_amount_suites(rng)?);
    Ok(suites)
}
