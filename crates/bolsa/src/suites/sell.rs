//! Sell page suites.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{sell as sc, MOCK_PRICE, TEST_SYMBOLS};
use crate::harness::{check, expand_suites, Suite, Tag};
use crate::page::Page;
use crate::result::{ensure, BolsaError, BolsaResult};

use super::with_new_user;

fn pick(rng: &mut impl Rng) -> String {
    (*TEST_SYMBOLS.choose(rng).unwrap_or(&"AAPL")).to_string()
}

/// Element presence and select metadata.
fn basics() -> Suite {
    with_new_user(
        Suite::new("SellPageBasics")
            .check(check("has symbol select", |cx| {
                Box::pin(async move {
                    let sell = cx.session.sell_page();
                    sell.open().await?;
                    ensure(
                        sell.symbol_select().await?.is_some(),
                        "Expected Sell page to have stock symbol select",
                    )
                })
            }))
            .check(check("symbol select is unique", |cx| {
                Box::pin(async move {
                    let sell = cx.session.sell_page();
                    sell.open().await?;
                    ensure(
                        Page::is_unique(&sell.symbol_selects_all().await?),
                        "Expected to find only one symbol select on Sell page",
                    )
                })
            }))
            .check(check("select default option name", |cx| {
                Box::pin(async move {
                    let sell = cx.session.sell_page();
                    sell.open().await?;
                    let option = sell
                        .require(&crate::pages::SellPage::SELECT_DEFAULT_OPTION, "default option")
                        .await?;
                    let text = sell.text_of(&option).await?;
                    ensure(
                        text == sc::EX_SELECT_DEFAULT,
                        format!(
                            "Expected the select's default option to be {}, actual text: {text}",
                            sc::EX_SELECT_DEFAULT
                        ),
                    )
                })
            }))
            .check(check("has amount input with placeholder", |cx| {
                Box::pin(async move {
                    let sell = cx.session.sell_page();
                    sell.open().await?;
                    let input = sell
                        .require(&crate::pages::SellPage::AMOUNT_INPUT, "amount input")
                        .await?;
                    let placeholder = sell.placeholder_of(&input).await?;
                    ensure(
                        placeholder == sc::EX_AMOUNT_PLACEHOLDER,
                        format!(
                            "Expected amount placeholder to be {}, actual value: {placeholder}",
                            sc::EX_AMOUNT_PLACEHOLDER
                        ),
                    )
                })
            }))
            .check(check("has sell button", |cx| {
                Box::pin(async move {
                    let sell = cx.session.sell_page();
                    sell.open().await?;
                    ensure(
                        sell.sell_button().await?.is_some(),
                        "Expected Sell page to have sell button",
                    )
                })
            })),
    )
}

/// Successful sales of previously bought stock.
fn successful_sell_suites(rng: &mut impl Rng) -> BolsaResult<Vec<Suite>> {
    expand_suites(
        "TestSuccessfulSell",
        "Test",
        &sc::successful_sell_cases(rng),
        |_case| {
            with_new_user(Suite::new("placeholder"))
                .setup(|cx| {
                    Box::pin(async move {
                        let symbol = cx.case_input("symbol");
                        let amount = cx.case_input("amount");
                        // own the stock first
                        let buy = cx.session.buy_page();
                        buy.open().await?;
                        buy.buy_stock(&symbol, &amount).await?;
                        let sell = cx.session.sell_page();
                        sell.open().await?;
                        sell.sell_stock(&symbol, &amount).await?;
                        // mirror both transactions into the mock database
                        if let Some(db) = &cx.session.db {
                            let creds = cx.creds()?;
                            let shares: i64 = amount.parse().map_err(|_| {
                                BolsaError::check(format!("unparseable amount: {amount}"))
                            })?;
                            db.add_transaction(&creds.username, &symbol, shares, MOCK_PRICE)?;
                            db.add_transaction(&creds.username, &symbol, -shares, MOCK_PRICE)?;
                        }
                        Ok(())
                    })
                })
                .check(check("redirects to default page", |cx| {
                    Box::pin(async move {
                        let sell = cx.session.sell_page();
                        ensure(
                            sell.wait_for_url(&cx.session.urls.default_page()).await?,
                            "Expected redirection to Default page after selling",
                        )
                    })
                }))
                .check(check("success alert appears", |cx| {
                    Box::pin(async move {
                        let page = cx.session.page_at(cx.session.urls.default_page());
                        let text = page.flash_text().await?.unwrap_or_default();
                        ensure(
                            text == sc::SUCCESS_MSG,
                            format!(
                                "Expected {} alert after selling, actual text: {text}",
                                sc::SUCCESS_MSG
                            ),
                        )
                    })
                }))
                .check(
                    check("net position is zero", |cx| {
                        Box::pin(async move {
                            let creds = cx.creds()?.clone();
                            let symbol = cx.case_input("symbol").to_uppercase();
                            let db = cx.session.db.as_ref().ok_or_else(|| {
                                BolsaError::check("database access required")
                            })?;
                            let held = db.possessed_stock_names(&creds.username)?;
                            ensure(
                                !held.contains(&symbol),
                                format!("Expected no remaining position in {symbol}, held: {held:?}"),
                            )
                        })
                    })
                    .tag(Tag::DbReliant),
                )
        },
    )
}

/// Selling more shares than held is rejected and changes nothing.
fn sell_exceeding_holdings(rng: &mut impl Rng) -> Suite {
    let symbol = pick(rng);
    let setup_symbol = symbol.clone();
    with_new_user(Suite::new(format!("SellExceedingHoldings[{symbol}]")))
        .setup(move |cx| {
            let symbol = setup_symbol.clone();
            Box::pin(async move {
                let buy = cx.session.buy_page();
                buy.open().await?;
                buy.buy_stock(&symbol, "1").await?;
                if let Some(db) = &cx.session.db {
                    let creds = cx.creds()?;
                    db.add_transaction(&creds.username, &symbol, 1, MOCK_PRICE)?;
                }
                let sell = cx.session.sell_page();
                sell.open().await?;
                sell.sell_stock(&symbol, "5").await
            })
        })
        .check(check("error image with too-many-shares text", |cx| {
            Box::pin(async move {
                let sell = cx.session.sell_page();
                ensure(
                    sell.error_banner().await?.is_some(),
                    "Expected an error image when selling more shares than held",
                )?;
                let actual = sell.error_banner_text().await?.unwrap_or_default();
                ensure(
                    actual == sc::EXCEED_AMOUNT,
                    format!(
                        "Expected error image to have text {}, actual text: {actual}",
                        sc::EXCEED_AMOUNT
                    ),
                )
            })
        }))
        .check(
            check("position is unchanged", move |cx| {
                let symbol = symbol.clone();
                Box::pin(async move {
                    let creds = cx.creds()?.clone();
                    let db = cx
                        .session
                        .db
                        .as_ref()
                        .ok_or_else(|| BolsaError::check("database access required"))?;
                    let stocks = db.possessed_stocks(&creds.username)?;
                    let held = stocks
                        .iter()
                        .find(|row| row.text("stockname").as_deref() == Some(symbol.to_uppercase().as_str()))
                        .and_then(|row| row.int("amount"));
                    ensure(
                        held == Some(1),
                        format!("Expected the 1-share position to survive, actual: {held:?}"),
                    )
                })
            })
            .tag(Tag::DbReliant),
        )
}

/// Submitting the re-enabled placeholder option: empty and unowned
/// symbols reach the backend.
fn forbidden_symbol_suite() -> Suite {
    with_new_user(
        Suite::new("SellForbiddenSymbols")
            .check(check("empty symbol is rejected", |cx| {
                Box::pin(async move {
                    let sell = cx.session.sell_page();
                    sell.open().await?;
                    sell.enable_default_option("").await?;
                    sell.sell_stock("", "1").await?;
                    let actual = sell.error_banner_text().await?.unwrap_or_default();
                    ensure(
                        actual == sc::EMPTY_SYMBOL,
                        format!(
                            "Expected error image to have text {}, actual text: {actual}",
                            sc::EMPTY_SYMBOL
                        ),
                    )
                })
            }))
            .check(check("unowned symbol is rejected", |cx| {
                Box::pin(async move {
                    let sell = cx.session.sell_page();
                    sell.open().await?;
                    sell.enable_default_option("zyzx").await?;
                    sell.sell_stock("zyzx", "1").await?;
                    let actual = sell.error_banner_text().await?.unwrap_or_default();
                    ensure(
                        actual == sc::UNOWNED_SYMBOL,
                        format!(
                            "Expected error image to have text {}, actual text: {actual}",
                            sc::UNOWNED_SYMBOL
                        ),
                    )
                })
            })),
    )
}

/// All Sell suites.
pub fn suites(rng: &mut impl Rng) -> BolsaResult<Vec<Suite>> {
    let mut suites = vec![basics()];
    suites.extend(successful_sell_suites(rng)?);
    suites.push(sell_exceeding_holdings(rng));
    suites.push(forbidden_symbol_suite());
    Ok(suites)
}
