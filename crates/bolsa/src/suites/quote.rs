//! Quote page suites.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{invalid_symbol_cases, quote as qc, TEST_SYMBOLS};
use crate::harness::{check, expand_suites, Suite};
use crate::page::Page;
use crate::result::{ensure, BolsaResult};
use crate::verify::{is_currency, CurrencyPattern};

use super::with_new_user;

/// Element presence, uniqueness, placeholder and default value.
fn basics() -> Suite {
    with_new_user(
        Suite::new("QuotePageBasics")
            .check(check("has symbol input", |cx| {
                Box::pin(async move {
                    let quote = cx.session.quote_page();
                    quote.open().await?;
                    ensure(
                        quote.symbol_input().await?.is_some(),
                        "Expected Quote page to have stock symbol input field",
                    )
                })
            }))
            .check(check("symbol input is unique", |cx| {
                Box::pin(async move {
                    let quote = cx.session.quote_page();
                    quote.open().await?;
                    ensure(
                        Page::is_unique(&quote.symbol_inputs_all().await?),
                        "Expected to find only one symbol input field on Quote page",
                    )
                })
            }))
            .check(check("symbol input placeholder", |cx| {
                Box::pin(async move {
                    let quote = cx.session.quote_page();
                    quote.open().await?;
                    let input = quote
                        .require(&crate::pages::QuotePage::SYMBOL_INPUT, "symbol input")
                        .await?;
                    let placeholder = quote.placeholder_of(&input).await?;
                    ensure(
                        placeholder == qc::EX_SYMBOL_PLACEHOLDER,
                        format!(
                            "Expected symbol placeholder to be {}, actual value: {placeholder}",
                            qc::EX_SYMBOL_PLACEHOLDER
                        ),
                    )
                })
            }))
            .check(check("symbol input default value", |cx| {
                Box::pin(async move {
                    let quote = cx.session.quote_page();
                    quote.open().await?;
                    let input = quote
                        .require(&crate::pages::QuotePage::SYMBOL_INPUT, "symbol input")
                        .await?;
                    let value = quote.value_of(&input).await?;
                    ensure(
                        value == qc::EX_INPUT_VALUE,
                        format!("Expected symbol input field to be empty, actual value: {value}"),
                    )
                })
            }))
            .check(check("has quote button", |cx| {
                Box::pin(async move {
                    let quote = cx.session.quote_page();
                    quote.open().await?;
                    ensure(
                        quote.quote_button().await?.is_some(),
                        "Expected Quote page to have Quote button",
                    )
                })
            }))
            .check(check("no result paragraph before querying", |cx| {
                Box::pin(async move {
                    let quote = cx.session.quote_page();
                    quote.open().await?;
                    ensure(
                        quote.quote_result().await?.is_none(),
                        "Expected no quote result before requesting one",
                    )
                })
            })),
    )
}

/// A valid symbol yields a result line with the symbol and a price.
fn successful_quote(rng: &mut impl Rng) -> Suite {
    let symbol = (*TEST_SYMBOLS.choose(rng).unwrap_or(&"AAPL")).to_string();
    let act_symbol = symbol.clone();
    with_new_user(Suite::new(format!("SuccessfulQuote[{symbol}]")))
        .setup(move |cx| {
            let symbol = act_symbol.clone();
            Box::pin(async move {
                let quote = cx.session.quote_page();
                quote.open().await?;
                quote.request_quote(&symbol).await
            })
        })
        .check(check("result paragraph appears", |cx| {
            Box::pin(async move {
                let quote = cx.session.quote_page();
                ensure(
                    quote.quote_result().await?.is_some(),
                    "Expected a result line after quoting a valid symbol",
                )
            })
        }))
        .check(check("result names the symbol", move |cx| {
            let symbol = symbol.clone();
            Box::pin(async move {
                let quote = cx.session.quote_page();
                let text = quote.quote_result_text().await?.unwrap_or_default();
                ensure(
                    text.contains(&symbol.to_uppercase()),
                    format!("Expected the result line to name {symbol}, actual text: {text}"),
                )
            })
        }))
        .check(check("result carries a well-formed price", |cx| {
            Box::pin(async move {
                let quote = cx.session.quote_page();
                let text = quote.quote_result_text().await?.unwrap_or_default();
                let priced = text
                    .split_whitespace()
                    .map(|w| w.trim_end_matches('.'))
                    .any(|w| is_currency(w, CurrencyPattern::Strict));
                ensure(
                    priced,
                    format!("Expected a $-prefixed 2-decimal price in the result, actual text: {text}"),
                )
            })
        }))
}

/// Invalid symbol sweeps.
fn invalid_symbol_suites(rng: &mut impl Rng) -> BolsaResult<Vec<Suite>> {
    expand_suites(
        "TestInvalidSymbolQuote",
        "Test",
        &invalid_symbol_cases(rng),
        |_case| {
            with_new_user(Suite::new("placeholder"))
                .setup(|cx| {
                    Box::pin(async move {
                        let symbol = cx.case_input("symbol");
                        let quote = cx.session.quote_page();
                        quote.open().await?;
                        quote.request_quote(&symbol).await
                    })
                })
                .check(check("error image appears", |cx| {
                    Box::pin(async move {
                        let quote = cx.session.quote_page();
                        ensure(
                            quote.error_banner().await?.is_some(),
                            format!(
                                "Expected an error image when quoting: {}",
                                cx.case_label()
                            ),
                        )
                    })
                }))
                .check(check("error message", |cx| {
                    Box::pin(async move {
                        let quote = cx.session.quote_page();
                        let expected = if cx.case_label() == "Empty stock symbol" {
                            qc::EMPTY_SYMBOL
                        } else {
                            qc::INVALID_SYMBOL
                        };
                        let actual = quote.error_banner_text().await?.unwrap_or_default();
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

/// All Quote suites.
pub fn suites(rng: &mut impl Rng) -> BolsaResult<Vec<Suite>> {
    let mut suites = vec![basics(), successful_quote(rng)];
    suites.extend(invalid_symbol_suites(rng)?);
    Ok(suites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_one_suite_per_invalid_symbol_case() {
        let mut rng = StdRng::seed_from_u64(0);
        let suites = suites(&mut rng).unwrap();
        // basics + successful + 15 invalid symbol cases
        assert_eq!(suites.len(), 17);
    }
}
