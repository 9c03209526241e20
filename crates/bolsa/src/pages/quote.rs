//! Quote page object.

use std::ops::Deref;

use crate::driver::{DriverHandle, ElementHandle};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::BolsaResult;

use super::Urls;

/// The Quote page: a symbol input, a button, a result paragraph.
#[derive(Debug, Clone)]
pub struct QuotePage {
    page: Page,
}

impl QuotePage {
    /// Symbol input
    pub const SYMBOL_INPUT: Locator = Locator::name("symbol");
    /// Quote button
    pub const QUOTE_BUTTON: Locator = Locator::xpath("//button[text()='Quote']");
    /// Result paragraph with the quoted price
    pub const QUOTE_RESULT: Locator = Locator::css("main p");

    /// Bind the page to a session.
    #[must_use]
    pub fn new(driver: DriverHandle, urls: &Urls) -> Self {
        Self {
            page: Page::new(driver, urls.quote()),
        }
    }

    /// Symbol input, when present.
    pub async fn symbol_input(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::SYMBOL_INPUT).await
    }

    /// Quote button, when present.
    pub async fn quote_button(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::QUOTE_BUTTON).await
    }

    /// Result paragraph, when present.
    pub async fn quote_result(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::QUOTE_RESULT).await
    }

    /// Text of the result paragraph, when present.
    pub async fn quote_result_text(&self) -> BolsaResult<Option<String>> {
        match self.quote_result().await? {
            Some(el) => Ok(Some(self.page.text_of(&el).await?.trim().to_string())),
            None => Ok(None),
        }
    }

    /// Fill the symbol input and press the button.
    pub async fn request_quote(&self, symbol: &str) -> BolsaResult<()> {
        let input = self.page.require(&Self::SYMBOL_INPUT, "symbol input").await?;
        self.page.fill(&input, symbol).await?;
        let button = self.page.require(&Self::QUOTE_BUTTON, "quote button").await?;
        self.page.click(&button).await
    }

    /// All elements matching the symbol-input locator.
    pub async fn symbol_inputs_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::SYMBOL_INPUT)
            .await?
            .unwrap_or_default())
    }

    /// All elements matching the quote-button locator.
    pub async fn quote_buttons_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::QUOTE_BUTTON)
            .await?
            .unwrap_or_default())
    }
}

impl Deref for QuotePage {
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

    fn bind(driver: DriverHandle, urls: &Urls) -> QuotePage {
        QuotePage {
            page: Page::new(driver, urls.quote())
                .with_element_timeout(Duration::from_millis(50))
                .with_url_timeout(Duration::from_millis(50)),
        }
    }

    #[tokio::test]
    async fn test_request_quote_and_read_result() {
        let urls = Urls::new("https://app");
        let mut driver = MockDriver::new();
        let quoted = urls.join("/quote?done");
        driver.install(
            urls.quote(),
            MockPage::new("C$50 Finance: Quote")
                .with(MockElement::matching(&QuotePage::SYMBOL_INPUT).attr("placeholder", "Symbol"))
                .with(MockElement::matching(&QuotePage::QUOTE_BUTTON).clicks_to(quoted.clone())),
        );
        driver.install(
            quoted,
            MockPage::new("C$50 Finance: Quote")
                .with(MockElement::matching(&QuotePage::QUOTE_RESULT).text("A share of Apple, Inc. (AAPL) costs $777.77.")),
        );

        let quote = bind(into_handle(driver), &urls);
        quote.open().await.unwrap();
        assert!(quote.quote_result().await.unwrap().is_none());
        quote.request_quote("AAPL").await.unwrap();
        let text = quote.quote_result_text().await.unwrap().unwrap();
        assert!(text.contains("$777.77"));
    }
}
