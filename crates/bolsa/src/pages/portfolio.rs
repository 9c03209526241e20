//! Portfolio (default route) page object.

use std::ops::Deref;

use crate::driver::{DriverHandle, ElementHandle};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::BolsaResult;
use crate::scrape::TableScrape;
use crate::verify::currency_to_number;

use super::Urls;

/// The default route: holdings table plus cash and TOTAL footer cells.
#[derive(Debug, Clone)]
pub struct PortfolioPage {
    page: Page,
}

impl PortfolioPage {
    /// The holdings table
    pub const HOLDINGS_TABLE: Locator = Locator::tag("table");
    /// Holdings table headers
    pub const TABLE_HEADERS: Locator = Locator::css("table th");
    /// Holdings table body rows
    pub const TABLE_ROWS: Locator = Locator::css("tbody tr");
    /// Holdings table body cells, flattened in reading order
    pub const TABLE_CELLS: Locator = Locator::css("tbody tr td");
    /// Footer cell with the user's cash
    pub const CASH_CELL: Locator = Locator::css("tfoot tr:nth-child(1) td:nth-child(2)");
    /// Footer cell with the user's TOTAL
    pub const TOTAL_CELL: Locator = Locator::css("tfoot tr:nth-child(2) td:nth-child(2)");

    /// Bind the page to a session.
    #[must_use]
    pub fn new(driver: DriverHandle, urls: &Urls) -> Self {
        Self {
            page: Page::new(driver, urls.default_page()),
        }
    }

    /// The holdings table, when present.
    pub async fn holdings_table(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::HOLDINGS_TABLE).await
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

    /// Scrape the holdings table into typed rows.
    pub async fn scrape_holdings(&self) -> BolsaResult<TableScrape> {
        self.page
            .scrape_table(&Self::TABLE_CELLS, &Self::TABLE_HEADERS)
            .await
    }

    /// Footer cash cell, when present.
    pub async fn cash_cell(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::CASH_CELL).await
    }

    /// Footer TOTAL cell, when present.
    pub async fn total_cell(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::TOTAL_CELL).await
    }

    /// Cash value parsed from the footer, when present and well-formed.
    pub async fn cash_value(&self) -> BolsaResult<Option<f64>> {
        match self.cash_cell().await? {
            Some(cell) => {
                let text = self.page.text_of(&cell).await?;
                Ok(currency_to_number(text.trim()))
            }
            None => Ok(None),
        }
    }

    /// TOTAL value parsed from the footer, when present and well-formed.
    pub async fn total_value(&self) -> BolsaResult<Option<f64>> {
        match self.total_cell().await? {
            Some(cell) => {
                let text = self.page.text_of(&cell).await?;
                Ok(currency_to_number(text.trim()))
            }
            None => Ok(None),
        }
    }

    /// All elements matching the holdings-table locator.
    pub async fn holdings_tables_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::HOLDINGS_TABLE)
            .await?
            .unwrap_or_default())
    }

    /// All elements matching the cash-cell locator.
    pub async fn cash_cells_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::CASH_CELL)
            .await?
            .unwrap_or_default())
    }

    /// All elements matching the TOTAL-cell locator.
    pub async fn total_cells_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::TOTAL_CELL)
            .await?
            .unwrap_or_default())
    }
}

impl Deref for PortfolioPage {
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

    fn session_with_holdings() -> (DriverHandle, Urls) {
        let urls = Urls::new("https://app");
        let mut driver = MockDriver::new();
        let mut page = MockPage::new("C$50 Finance: Portfolio");
        page.push(MockElement::matching(&PortfolioPage::HOLDINGS_TABLE));
        for header in ["Symbol", "Name", "Shares", "Price", "TOTAL"] {
            page.push(MockElement::matching(&PortfolioPage::TABLE_HEADERS).text(header));
        }
        for cell in ["AAPL", "Apple, Inc.", "2", "$150.00", "$300.00"] {
            page.push(MockElement::matching(&PortfolioPage::TABLE_CELLS).text(cell));
        }
        page.push(MockElement::matching(&PortfolioPage::TABLE_ROWS));
        page.push(MockElement::matching(&PortfolioPage::CASH_CELL).text("$9,700.00"));
        page.push(MockElement::matching(&PortfolioPage::TOTAL_CELL).text("$10,000.00"));
        driver.install(urls.default_page(), page);
        (into_handle(driver), urls)
    }

    fn bind(driver: DriverHandle, urls: &Urls) -> PortfolioPage {
        PortfolioPage {
            page: Page::new(driver, urls.default_page())
                .with_element_timeout(Duration::from_millis(50))
                .with_url_timeout(Duration::from_millis(50)),
        }
    }

    #[tokio::test]
    async fn test_header_names() {
        let (driver, urls) = session_with_holdings();
        let portfolio = bind(driver, &urls);
        portfolio.open().await.unwrap();
        assert_eq!(
            portfolio.header_names().await.unwrap(),
            ["Symbol", "Name", "Shares", "Price", "TOTAL"]
        );
    }

    #[tokio::test]
    async fn test_scrape_holdings_types_cells() {
        let (driver, urls) = session_with_holdings();
        let portfolio = bind(driver, &urls);
        portfolio.open().await.unwrap();
        let scrape = portfolio.scrape_holdings().await.unwrap();
        let row = scrape.single().unwrap();
        assert_eq!(row.get("Symbol"), Some(&CellValue::Text("AAPL".into())));
        assert_eq!(row.get("Shares"), Some(&CellValue::Int(2)));
        assert_eq!(row.get("Price"), Some(&CellValue::Currency(150.0)));
        assert_eq!(row.get("TOTAL"), Some(&CellValue::Currency(300.0)));
    }

    #[tokio::test]
    async fn test_footer_values() {
        let (driver, urls) = session_with_holdings();
        let portfolio = bind(driver, &urls);
        portfolio.open().await.unwrap();
        assert_eq!(portfolio.cash_value().await.unwrap(), Some(9700.0));
        assert_eq!(portfolio.total_value().await.unwrap(), Some(10000.0));
        assert!(Page::is_unique(&portfolio.cash_cells_all().await.unwrap()));
    }
}
