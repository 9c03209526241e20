//! Buy page object.

use std::ops::Deref;

use crate::driver::{DriverHandle, ElementHandle};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::BolsaResult;

use super::Urls;

/// The Buy page: symbol input, share-count input, buy button.
#[derive(Debug, Clone)]
pub struct BuyPage {
    page: Page,
}

impl BuyPage {
    /// Symbol input
    pub const SYMBOL_INPUT: Locator = Locator::name("symbol");
    /// Share-count input
    pub const AMOUNT_INPUT: Locator = Locator::name("shares");
    /// Buy button
    pub const BUY_BUTTON: Locator = Locator::xpath("//button[text()='Buy']");

    /// Bind the page to a session.
    #[must_use]
    pub fn new(driver: DriverHandle, urls: &Urls) -> Self {
        Self {
            page: Page::new(driver, urls.buy()),
        }
    }

    /// Symbol input, when present.
    pub async fn symbol_input(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::SYMBOL_INPUT).await
    }

    /// Share-count input, when present.
    pub async fn amount_input(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::AMOUNT_INPUT).await
    }

    /// Buy button, when present.
    pub async fn buy_button(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::BUY_BUTTON).await
    }

    /// Fill both inputs and press the button.
    pub async fn buy_stock(&self, symbol: &str, amount: &str) -> BolsaResult<()> {
        let symbol_input = self.page.require(&Self::SYMBOL_INPUT, "symbol input").await?;
        self.page.fill(&symbol_input, symbol).await?;
        let amount_input = self.page.require(&Self::AMOUNT_INPUT, "amount input").await?;
        self.page.fill(&amount_input, amount).await?;
        let button = self.page.require(&Self::BUY_BUTTON, "buy button").await?;
        self.page.click(&button).await
    }

    /// Like [`Self::buy_stock`], but first strips the amount input's
    /// native numeric constraints so the backend sees the raw value.
    pub async fn buy_stock_forced(&self, symbol: &str, amount: &str) -> BolsaResult<()> {
        let amount_input = self.page.require(&Self::AMOUNT_INPUT, "amount input").await?;
        self.page.force_text_mode(&amount_input).await?;
        self.buy_stock(symbol, amount).await
    }

    /// All elements matching the symbol-input locator.
    pub async fn symbol_inputs_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::SYMBOL_INPUT)
            .await?
            .unwrap_or_default())
    }

    /// All elements matching the amount-input locator.
    pub async fn amount_inputs_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::AMOUNT_INPUT)
            .await?
            .unwrap_or_default())
    }

    /// All elements matching the buy-button locator.
    pub async fn buy_buttons_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::BUY_BUTTON)
            .await?
            .unwrap_or_default())
    }
}

impl Deref for BuyPage {
    type Target = Page;

    fn deref(&self) -> &Self::Target {
        &self.page
    }
}
