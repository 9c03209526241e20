//! Sell page object.

use std::ops::Deref;

use crate::driver::{Driver as _, DriverHandle, ElementHandle};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::BolsaResult;

use super::Urls;

/// The Sell page: a symbol `<select>`, a share-count input, a button.
#[derive(Debug, Clone)]
pub struct SellPage {
    page: Page,
}

impl SellPage {
    /// Symbol select listing held stocks
    pub const SYMBOL_SELECT: Locator = Locator::css("select[name='symbol']");
    /// The select's disabled placeholder option (first child)
    pub const SELECT_DEFAULT_OPTION: Locator =
        Locator::css("select[name='symbol'] option:first-child");
    /// Share-count input
    pub const AMOUNT_INPUT: Locator = Locator::name("shares");
    /// Sell button
    pub const SELL_BUTTON: Locator = Locator::xpath("//button[text()='Sell']");

    /// Bind the page to a session.
    #[must_use]
    pub fn new(driver: DriverHandle, urls: &Urls) -> Self {
        Self {
            page: Page::new(driver, urls.sell()),
        }
    }

    /// Symbol select, when present.
    pub async fn symbol_select(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::SYMBOL_SELECT).await
    }

    /// The select's placeholder option, when present.
    pub async fn select_default_option(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::SELECT_DEFAULT_OPTION).await
    }

    /// Share-count input, when present.
    pub async fn amount_input(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::AMOUNT_INPUT).await
    }

    /// Sell button, when present.
    pub async fn sell_button(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::SELL_BUTTON).await
    }

    /// Pick a symbol, fill the amount and press the button.
    ///
    /// The symbol is selected by value: the select's value is set
    /// directly and a change event dispatched, which is how a dropdown
    /// choice looks to the app.
    pub async fn sell_stock(&self, symbol: &str, amount: &str) -> BolsaResult<()> {
        let select = self.page.require(&Self::SYMBOL_SELECT, "symbol select").await?;
        self.page.driver().lock().await.inject_value(&select, symbol).await?;
        let amount_input = self.page.require(&Self::AMOUNT_INPUT, "amount input").await?;
        self.page.fill(&amount_input, amount).await?;
        let button = self.page.require(&Self::SELL_BUTTON, "sell button").await?;
        self.page.click(&button).await
    }

    /// Re-enable the disabled placeholder option and give it a value,
    /// so a symbol the UI would forbid can be submitted anyway.
    pub async fn enable_default_option(&self, value: &str) -> BolsaResult<()> {
        let Some(option) = self.select_default_option().await? else {
            return Ok(());
        };
        let escaped = value.replace('\'', "\\'");
        self.page
            .driver()
            .lock()
            .await
            .call_on(
                &option,
                &format!(
                    "function() {{ \
                       if (this.hasAttribute('disabled')) {{ this.removeAttribute('disabled'); }} \
                       this.setAttribute('value', '{escaped}'); \
                     }}"
                ),
            )
            .await
    }

    /// All elements matching the symbol-select locator.
    pub async fn symbol_selects_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::SYMBOL_SELECT)
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

    /// All elements matching the sell-button locator.
    pub async fn sell_buttons_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::SELL_BUTTON)
            .await?
            .unwrap_or_default())
    }
}

impl Deref for SellPage {
    type Target = Page;

    fn deref(&self) -> &Self::Target {
        &self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::into_handle;
    use crate::mock::{MockDriver, MockElement, MockPage};
    use std::time::Duration;

    fn session() -> (DriverHandle, Urls) {
        let urls = Urls::new("https://app");
        let mut driver = MockDriver::new();
        driver.install(
            urls.sell(),
            MockPage::new("C$50 Finance: Sell")
                .with(MockElement::matching(&SellPage::SYMBOL_SELECT))
                .with(
                    MockElement::matching(&SellPage::SELECT_DEFAULT_OPTION)
                        .attr("disabled", "")
                        .text("Symbol"),
                )
                .with(MockElement::matching(&SellPage::AMOUNT_INPUT).attr("placeholder", "Shares"))
                .with(MockElement::matching(&SellPage::SELL_BUTTON)),
        );
        (into_handle(driver), urls)
    }

    fn bind(driver: DriverHandle, urls: &Urls) -> SellPage {
        SellPage {
            page: Page::new(driver, urls.sell())
                .with_element_timeout(Duration::from_millis(50))
                .with_url_timeout(Duration::from_millis(50)),
        }
    }

    #[tokio::test]
    async fn test_sell_selects_by_value() {
        let (driver, urls) = session();
        let sell = bind(driver, &urls);
        sell.open().await.unwrap();
        sell.sell_stock("AAPL", "1").await.unwrap();
        let select = sell.symbol_select().await.unwrap().unwrap();
        assert_eq!(sell.value_of(&select).await.unwrap(), "AAPL");
        let amount = sell.amount_input().await.unwrap().unwrap();
        assert_eq!(sell.value_of(&amount).await.unwrap(), "1");
    }

    #[tokio::test]
    async fn test_enable_default_option() {
        let (driver, urls) = session();
        let sell = bind(driver, &urls);
        sell.open().await.unwrap();
        sell.enable_default_option("zyzx").await.unwrap();
        let option = sell.select_default_option().await.unwrap().unwrap();
        assert_eq!(sell.attribute_of(&option, "disabled").await.unwrap(), None);
        assert_eq!(
            sell.attribute_of(&option, "value").await.unwrap().as_deref(),
            Some("zyzx")
        );
    }

    #[tokio::test]
    async fn test_default_option_text() {
        let (driver, urls) = session();
        let sell = bind(driver, &urls);
        sell.open().await.unwrap();
        let option = sell.select_default_option().await.unwrap().unwrap();
        assert_eq!(sell.text_of(&option).await.unwrap(), "Symbol");
    }
}
