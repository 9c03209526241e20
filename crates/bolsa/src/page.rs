//! Page-object base: timeout-safe DOM queries and typed readbacks.
//!
//! Every concrete page wraps [`Page`]. The contract of the "maybe"
//! accessors is central: a lookup that times out yields `None`/`false`,
//! never an error — "should NOT be present" is an assertable outcome,
//! not an exception to catch. Driver-level failures (lost session and
//! the like) still propagate as errors.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::{ELEMENT_TIMEOUT_MS, POLL_INTERVAL_MS, URL_TIMEOUT_MS};
use crate::driver::{Dialog, Driver as _, DriverHandle, ElementHandle};
use crate::locator::Locator;
use crate::result::{BolsaError, BolsaResult};
use crate::scrape::{organize_cells, TableScrape};
use crate::verify::decode_error_src;

/// Elements common to every page of the app.
pub mod nav {
    use crate::locator::Locator;

    /// Clickable brand logo linking to the default page
    pub const DEFAULT_LINK: Locator = Locator::css("a[href='/']");
    /// Spans whose concatenation spells the brand logo
    pub const LOGO_PART: Locator = Locator::css(".navbar-brand span");
    /// Quote navigation item
    pub const QUOTE_LINK: Locator = Locator::css("[id='navbar'] a[href='/quote']");
    /// Buy navigation item
    pub const BUY_LINK: Locator = Locator::css("[id='navbar'] a[href='/buy']");
    /// Sell navigation item
    pub const SELL_LINK: Locator = Locator::css("[id='navbar'] a[href='/sell']");
    /// History navigation item
    pub const HISTORY_LINK: Locator = Locator::css("[id='navbar'] a[href='/history']");
    /// Register navigation item
    pub const REGISTER_LINK: Locator = Locator::css("a[href='/register']");
    /// Log in navigation item
    pub const LOGIN_LINK: Locator = Locator::css("a[href='/login']");
    /// Log out navigation item
    pub const LOGOUT_LINK: Locator = Locator::css("[id='navbar'] a[href='/logout']");
    /// The apology image carrying an encoded error message
    pub const ERROR_IMAGE: Locator = Locator::tag("img");
    /// One-shot flash notification banner
    pub const ALERT_MESSAGE: Locator = Locator::css(".alert");
}

/// Base page object: a driver handle bound to one URL.
///
/// Lifetime is one logical page visit; page objects are cheap and
/// re-instantiated per navigation while the underlying driver is shared
/// across the whole session.
#[derive(Clone)]
pub struct Page {
    driver: DriverHandle,
    url: String,
    element_timeout: Duration,
    url_timeout: Duration,
    poll: Duration,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page").field("url", &self.url).finish_non_exhaustive()
    }
}

impl Page {
    /// Bind a driver to a page URL with the default timeouts.
    #[must_use]
    pub fn new(driver: DriverHandle, url: impl Into<String>) -> Self {
        Self {
            driver,
            url: url.into(),
            element_timeout: Duration::from_millis(ELEMENT_TIMEOUT_MS),
            url_timeout: Duration::from_millis(URL_TIMEOUT_MS),
            poll: Duration::from_millis(POLL_INTERVAL_MS),
        }
    }

    /// Override the element-lookup timeout.
    #[must_use]
    pub const fn with_element_timeout(mut self, timeout: Duration) -> Self {
        self.element_timeout = timeout;
        self
    }

    /// Override the URL-transition timeout.
    #[must_use]
    pub const fn with_url_timeout(mut self, timeout: Duration) -> Self {
        self.url_timeout = timeout;
        self
    }

    /// The page's own URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The shared driver handle.
    #[must_use]
    pub fn driver(&self) -> DriverHandle {
        self.driver.clone()
    }

    /// Navigate the session to this page's URL.
    pub async fn open(&self) -> BolsaResult<()> {
        self.driver.lock().await.navigate(&self.url).await
    }

    /// Navigate to an arbitrary URL (access-control probes).
    pub async fn navigate(&self, url: &str) -> BolsaResult<()> {
        self.driver.lock().await.navigate(url).await
    }

    /// Current URL of the session.
    pub async fn current_url(&self) -> BolsaResult<String> {
        self.driver.lock().await.current_url().await
    }

    /// Current page title.
    pub async fn title(&self) -> BolsaResult<String> {
        self.driver.lock().await.title().await
    }

    /// Bounded poll for one element; `None` on timeout.
    pub async fn find_one(&self, locator: &Locator) -> BolsaResult<Option<ElementHandle>> {
        let deadline = Instant::now() + self.element_timeout;
        loop {
            let found = self.driver.lock().await.find(locator).await?;
            if found.is_some() {
                return Ok(found);
            }
            if Instant::now() >= deadline {
                tracing::trace!(%locator, "element not found within timeout");
                return Ok(None);
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    /// Bounded poll for all matching elements; `None` when none showed
    /// up before the timeout.
    pub async fn find_many(&self, locator: &Locator) -> BolsaResult<Option<Vec<ElementHandle>>> {
        let deadline = Instant::now() + self.element_timeout;
        loop {
            let found = self.driver.lock().await.find_all(locator).await?;
            if !found.is_empty() {
                return Ok(Some(found));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    /// Poll (on the shorter transition timeout) for the URL to equal
    /// `expected`; `false` on expiry. Used both to assert navigation
    /// happened and to assert it was blocked.
    pub async fn wait_for_url(&self, expected: &str) -> BolsaResult<bool> {
        let deadline = Instant::now() + self.url_timeout;
        loop {
            let current = self.driver.lock().await.current_url().await?;
            if current == expected {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                tracing::trace!(expected, %current, "url did not change in time");
                return Ok(false);
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    /// Click an element.
    pub async fn click(&self, element: &ElementHandle) -> BolsaResult<()> {
        self.driver.lock().await.click(element).await
    }

    /// Type into an input, with the capability-level emoji fallback.
    pub async fn fill(&self, element: &ElementHandle, text: &str) -> BolsaResult<()> {
        self.driver.lock().await.fill(element, text).await
    }

    /// Visible text of an element.
    pub async fn text_of(&self, element: &ElementHandle) -> BolsaResult<String> {
        self.driver.lock().await.text(element).await
    }

    /// Attribute of an element; `None` when absent.
    pub async fn attribute_of(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> BolsaResult<Option<String>> {
        self.driver.lock().await.attribute(element, name).await
    }

    /// The element's `value` attribute, empty when absent.
    pub async fn value_of(&self, element: &ElementHandle) -> BolsaResult<String> {
        Ok(self.attribute_of(element, "value").await?.unwrap_or_default())
    }

    /// The element's `placeholder` attribute, empty when absent.
    pub async fn placeholder_of(&self, element: &ElementHandle) -> BolsaResult<String> {
        Ok(self
            .attribute_of(element, "placeholder")
            .await?
            .unwrap_or_default())
    }

    /// Strip `min`/`max` and force a plain-text input type, so the
    /// backend's validation is exercised instead of the browser's.
    pub async fn force_text_mode(&self, element: &ElementHandle) -> BolsaResult<()> {
        self.driver
            .lock()
            .await
            .call_on(
                element,
                "function() { \
                   this.removeAttribute('min'); \
                   this.removeAttribute('max'); \
                   this.setAttribute('type', 'text'); \
                 }",
            )
            .await
    }

    /// The one-shot flash banner, when present.
    pub async fn flash_message(&self) -> BolsaResult<Option<ElementHandle>> {
        self.find_one(&nav::ALERT_MESSAGE).await
    }

    /// Text of the flash banner, when present.
    pub async fn flash_text(&self) -> BolsaResult<Option<String>> {
        match self.flash_message().await? {
            Some(el) => Ok(Some(self.text_of(&el).await?.trim().to_string())),
            None => Ok(None),
        }
    }

    /// Bounded wait for a browser-level dialog.
    pub async fn native_dialog(&self) -> BolsaResult<Option<Dialog>> {
        let timeout = self.element_timeout;
        self.driver.lock().await.wait_for_dialog(timeout).await
    }

    /// The apology image, when present.
    pub async fn error_banner(&self) -> BolsaResult<Option<ElementHandle>> {
        self.find_one(&nav::ERROR_IMAGE).await
    }

    /// Decoded error message of the apology image, when present.
    pub async fn error_banner_text(&self) -> BolsaResult<Option<String>> {
        let Some(image) = self.error_banner().await? else {
            return Ok(None);
        };
        let Some(src) = self.attribute_of(&image, "src").await? else {
            return Ok(None);
        };
        Ok(decode_error_src(&src))
    }

    /// Scrape a table: read all cell and header texts, then zip them
    /// into typed rows. Geometry problems surface as
    /// [`TableScrape::Malformed`], distinct from an empty table.
    pub async fn scrape_table(
        &self,
        cells: &Locator,
        headers: &Locator,
    ) -> BolsaResult<TableScrape> {
        let header_handles = self.find_many(headers).await?.unwrap_or_default();
        let cell_handles = self.find_many(cells).await?.unwrap_or_default();

        let mut header_texts = Vec::with_capacity(header_handles.len());
        for handle in &header_handles {
            header_texts.push(self.text_of(handle).await?.trim().to_string());
        }
        let mut cell_texts = Vec::with_capacity(cell_handles.len());
        for handle in &cell_handles {
            cell_texts.push(self.text_of(handle).await?.trim().to_string());
        }
        Ok(organize_cells(&cell_texts, &header_texts))
    }

    /// True iff the lookup produced exactly one element.
    #[must_use]
    pub fn is_unique(handles: &[ElementHandle]) -> bool {
        handles.len() == 1
    }

    //
    // Navigation accessors shared by every page
    //

    /// Link to the default page (the clickable brand logo).
    pub async fn default_link(&self) -> BolsaResult<Option<ElementHandle>> {
        self.find_one(&nav::DEFAULT_LINK).await
    }

    /// Concatenated text of the brand-logo spans.
    pub async fn logo_text(&self) -> BolsaResult<String> {
        let parts = self.find_many(&nav::LOGO_PART).await?.unwrap_or_default();
        let mut text = String::new();
        for part in &parts {
            text.push_str(&self.text_of(part).await?);
        }
        Ok(text)
    }

    /// Quote navigation item.
    pub async fn quote_nav(&self) -> BolsaResult<Option<ElementHandle>> {
        self.find_one(&nav::QUOTE_LINK).await
    }

    /// Buy navigation item.
    pub async fn buy_nav(&self) -> BolsaResult<Option<ElementHandle>> {
        self.find_one(&nav::BUY_LINK).await
    }

    /// Sell navigation item.
    pub async fn sell_nav(&self) -> BolsaResult<Option<ElementHandle>> {
        self.find_one(&nav::SELL_LINK).await
    }

    /// History navigation item.
    pub async fn history_nav(&self) -> BolsaResult<Option<ElementHandle>> {
        self.find_one(&nav::HISTORY_LINK).await
    }

    /// Register navigation item.
    pub async fn register_link(&self) -> BolsaResult<Option<ElementHandle>> {
        self.find_one(&nav::REGISTER_LINK).await
    }

    /// Log in navigation item.
    pub async fn login_link(&self) -> BolsaResult<Option<ElementHandle>> {
        self.find_one(&nav::LOGIN_LINK).await
    }

    /// Log out navigation item.
    pub async fn logout_link(&self) -> BolsaResult<Option<ElementHandle>> {
        self.find_one(&nav::LOGOUT_LINK).await
    }

    /// Names of authed-navigation items absent from the page.
    pub async fn missing_nav_items(&self) -> BolsaResult<Vec<&'static str>> {
        let mut missing = Vec::new();
        if self.quote_nav().await?.is_none() {
            missing.push("Quote");
        }
        if self.buy_nav().await?.is_none() {
            missing.push("Buy");
        }
        if self.sell_nav().await?.is_none() {
            missing.push("Sell");
        }
        if self.history_nav().await?.is_none() {
            missing.push("History");
        }
        Ok(missing)
    }

    /// Names of authed-navigation items present on the page.
    pub async fn present_nav_items(&self) -> BolsaResult<Vec<&'static str>> {
        let mut present = Vec::new();
        if self.quote_nav().await?.is_some() {
            present.push("Quote");
        }
        if self.buy_nav().await?.is_some() {
            present.push("Buy");
        }
        if self.sell_nav().await?.is_some() {
            present.push("Sell");
        }
        if self.history_nav().await?.is_some() {
            present.push("History");
        }
        Ok(present)
    }

    /// Resolve a required element or fail with a descriptive error.
    /// For compound actions that cannot proceed on a broken page.
    pub async fn require(&self, locator: &Locator, what: &str) -> BolsaResult<ElementHandle> {
        self.find_one(locator)
            .await?
            .ok_or_else(|| BolsaError::driver(format!("{what} not found ({locator})")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::into_handle;
    use crate::mock::{MockDriver, MockElement, MockPage};

    fn app() -> DriverHandle {
        let mut driver = MockDriver::new();
        let login = MockPage::new("C$50 Finance: Log In")
            .with(MockElement::matching(&nav::DEFAULT_LINK))
            .with(MockElement::matching(&nav::LOGO_PART).text("C"))
            .with(MockElement::matching(&nav::LOGO_PART).text("$50"))
            .with(MockElement::matching(&nav::LOGO_PART).text("Finance"))
            .with(MockElement::matching(&nav::LOGIN_LINK))
            .with(MockElement::matching(&nav::REGISTER_LINK));
        driver.install("https://app/login", login);

        let portfolio = MockPage::new("C$50 Finance: Portfolio")
            .with(MockElement::matching(&nav::QUOTE_LINK))
            .with(MockElement::matching(&nav::BUY_LINK))
            .with(MockElement::matching(&nav::SELL_LINK))
            .with(MockElement::matching(&nav::HISTORY_LINK))
            .with(MockElement::matching(&nav::LOGOUT_LINK))
            .with(MockElement::matching(&nav::ALERT_MESSAGE).text(" Bought! "))
            .with(
                MockElement::matching(&nav::ERROR_IMAGE)
                    .attr("src", "https://host/images/missing-symbol.jpg"),
            );
        driver.install("https://app/", portfolio);
        into_handle(driver)
    }

    fn quick(page: Page) -> Page {
        page.with_element_timeout(Duration::from_millis(50))
            .with_url_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_open_and_title() {
        let page = quick(Page::new(app(), "https://app/login"));
        page.open().await.unwrap();
        assert_eq!(page.title().await.unwrap(), "C$50 Finance: Log In");
        assert_eq!(page.current_url().await.unwrap(), "https://app/login");
    }

    #[tokio::test]
    async fn test_absent_element_is_none_not_error() {
        let page = quick(Page::new(app(), "https://app/login"));
        page.open().await.unwrap();
        assert!(page.logout_link().await.unwrap().is_none());
        assert!(page.find_many(&nav::QUOTE_LINK).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_nav_item_presence_by_auth_state() {
        let page = quick(Page::new(app(), "https://app/login"));
        page.open().await.unwrap();
        assert_eq!(
            page.missing_nav_items().await.unwrap(),
            ["Quote", "Buy", "Sell", "History"]
        );

        let page = quick(Page::new(page.driver(), "https://app/"));
        page.open().await.unwrap();
        assert!(page.missing_nav_items().await.unwrap().is_empty());
        assert_eq!(
            page.present_nav_items().await.unwrap(),
            ["Quote", "Buy", "Sell", "History"]
        );
    }

    #[tokio::test]
    async fn test_logo_concatenation() {
        let page = quick(Page::new(app(), "https://app/login"));
        page.open().await.unwrap();
        assert_eq!(page.logo_text().await.unwrap(), "C$50Finance");
    }

    #[tokio::test]
    async fn test_flash_text_is_trimmed() {
        let page = quick(Page::new(app(), "https://app/"));
        page.open().await.unwrap();
        assert_eq!(page.flash_text().await.unwrap().as_deref(), Some("Bought!"));
    }

    #[tokio::test]
    async fn test_error_banner_decoding() {
        let page = quick(Page::new(app(), "https://app/"));
        page.open().await.unwrap();
        assert_eq!(
            page.error_banner_text().await.unwrap().as_deref(),
            Some("MISSING SYMBOL")
        );
    }

    #[tokio::test]
    async fn test_wait_for_url_false_on_expiry() {
        let page = quick(Page::new(app(), "https://app/login"));
        page.open().await.unwrap();
        assert!(page.wait_for_url("https://app/login").await.unwrap());
        assert!(!page.wait_for_url("https://app/other").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_unique() {
        assert!(Page::is_unique(&[ElementHandle::new("a")]));
        assert!(!Page::is_unique(&[]));
        assert!(!Page::is_unique(&[
            ElementHandle::new("a"),
            ElementHandle::new("b")
        ]));
    }

    #[tokio::test]
    async fn test_require_reports_what_is_missing() {
        let page = quick(Page::new(app(), "https://app/login"));
        page.open().await.unwrap();
        let err = page
            .require(&nav::LOGOUT_LINK, "log out link")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("log out link"));
    }
}
