//! History page object.

use std::ops::Deref;

use crate::driver::{DriverHandle, ElementHandle};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::BolsaResult;
use crate::scrape::TableScrape;

use super::Urls;

/// The History page: one table of all transactions.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    page: Page,
}

impl HistoryPage {
    /// The transactions table
    pub const HISTORY_TABLE: Locator = Locator::tag("table");
    /// Transactions table headers
    pub const TABLE_HEADERS: Locator = Locator::css("table th");
    /// Transactions table body rows
    pub const TABLE_ROWS: Locator = Locator::css("tbody tr");
    /// Transactions table body cells, flattened in reading order
    pub const TABLE_CELLS: Locator = Locator::css("tbody tr td");

    /// Bind the page to a session.
    #[must_use]
    pub fn new(driver: DriverHandle, urls: &Urls) -> Self {
        Self {
            page: Page::new(driver, urls.history()),
        }
    }

    /// The transactions table, when present.
    pub async fn history_table(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::HISTORY_TABLE).await
    }

    /// Header cells, when present.
    pub async fn table_headers(&self) -> BolsaResult<Option<Vec<ElementHandle>>> {
        self.page.find_many(&Self::TABLE_HEADERS).await
    }

    /// Header names, in order.
    pub async fn header_names(&self) -> BolsaResult<Vec<String>> {
        let headers = self.table_headers().await?.unwrap_or_default();
        let mut names = Vec::with_capacity(headers.len());
        for header in &headers {
            names.push(self.page.text_of(header).await?.trim().to_string());
        }
        Ok(names)
    }

    /// Body rows, when present.
    pub async fn table_rows(&self) -> BolsaResult<Option<Vec<ElementHandle>>> {
        self.page.find_many(&Self::TABLE_ROWS).await
    }

    /// Scrape the transactions table into typed rows.
    pub async fn scrape_history(&self) -> BolsaResult<TableScrape> {
        self.page
            .scrape_table(&Self::TABLE_CELLS, &Self::TABLE_HEADERS)
            .await
    }

    /// All elements matching the history-table locator.
    pub async fn history_tables_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::HISTORY_TABLE)
            .await?
            .unwrap_or_default())
    }
}

impl Deref for HistoryPage {
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
    use crate::scrape::CellValue;
    use std::time::Duration;

    fn bind(driver: DriverHandle, urls: &Urls) -> HistoryPage {
        HistoryPage {
            page: Page::new(driver, urls.history())
                .with_element_timeout(Duration::from_millis(50))
                .with_url_timeout(Duration::from_millis(50)),
        }
    }

    #[tokio::test]
    async fn test_scrape_history_rows() {
        let urls = Urls::new("https://app");
        let mut driver = MockDriver::new();
        let mut page = MockPage::new("C$50 Finance: History");
        page.push(MockElement::matching(&HistoryPage::HISTORY_TABLE));
        for header in ["Symbol", "Shares", "Price", "Transacted"] {
            page.push(MockElement::matching(&HistoryPage::TABLE_HEADERS).text(header));
        }
        for cell in ["AAPL", "2", "$150.00", "2024-05-17 12:30:10"] {
            page.push(MockElement::matching(&HistoryPage::TABLE_CELLS).text(cell));
        }
        for cell in ["AAPL", "-1", "$155.00", "2024-05-17 12:31:02"] {
            page.push(MockElement::matching(&HistoryPage::TABLE_CELLS).text(cell));
        }
        driver.install(urls.history(), page);

        let history = bind(into_handle(driver), &urls);
        history.open().await.unwrap();
        let scrape = history.scrape_history().await.unwrap();
        assert_eq!(scrape.row_count(), 2);
        let rows = scrape.rows().unwrap();
        // selling shows as a negative share count
        assert_eq!(rows[1].get("Shares"), Some(&CellValue::Int(-1)));
        assert_eq!(
            rows[1].get("Transacted"),
            Some(&CellValue::Text("2024-05-17 12:31:02".into()))
        );
    }

    #[tokio::test]
    async fn test_empty_history_scrapes_empty() {
        let urls = Urls::new("https://app");
        let mut driver = MockDriver::new();
        let mut page = MockPage::new("C$50 Finance: History");
        page.push(MockElement::matching(&HistoryPage::HISTORY_TABLE));
        for header in ["Symbol", "Shares", "Price", "Transacted"] {
            page.push(MockElement::matching(&HistoryPage::TABLE_HEADERS).text(header));
        }
        driver.install(urls.history(), page);

        let history = bind(into_handle(driver), &urls);
        history.open().await.unwrap();
        let scrape = history.scrape_history().await.unwrap();
        assert_eq!(scrape, crate::scrape::TableScrape::Empty);
    }
}
