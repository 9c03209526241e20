//! Log in page object.

use std::ops::Deref;

use crate::driver::{DriverHandle, ElementHandle};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::BolsaResult;

use super::Urls;

/// The Log in page: two inputs and a button.
#[derive(Debug, Clone)]
pub struct LoginPage {
    page: Page,
}

impl LoginPage {
    /// Username input
    pub const USERNAME_INPUT: Locator = Locator::name("username");
    /// Password input
    pub const PASSWORD_INPUT: Locator = Locator::name("password");
    /// Log in button
    pub const LOGIN_BUTTON: Locator = Locator::xpath("//button[text()='Log In']");

    /// Bind the page to a session.
    #[must_use]
    pub fn new(driver: DriverHandle, urls: &Urls) -> Self {
        Self {
            page: Page::new(driver, urls.login()),
        }
    }

    /// Username input, when present.
    pub async fn username_input(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::USERNAME_INPUT).await
    }

    /// Password input, when present.
    pub async fn password_input(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::PASSWORD_INPUT).await
    }

    /// Log in button, when present.
    pub async fn login_button(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::LOGIN_BUTTON).await
    }

    /// Fill both inputs and press the button.
    pub async fn log_in_with(&self, username: &str, password: &str) -> BolsaResult<()> {
        let username_input = self.page.require(&Self::USERNAME_INPUT, "username input").await?;
        self.page.fill(&username_input, username).await?;
        let password_input = self.page.require(&Self::PASSWORD_INPUT, "password input").await?;
        self.page.fill(&password_input, password).await?;
        let button = self.page.require(&Self::LOGIN_BUTTON, "log in button").await?;
        self.page.click(&button).await
    }

    /// All elements matching the username-input locator.
    pub async fn username_inputs_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::USERNAME_INPUT)
            .await?
            .unwrap_or_default())
    }

    /// All elements matching the password-input locator.
    pub async fn password_inputs_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::PASSWORD_INPUT)
            .await?
            .unwrap_or_default())
    }

    /// All elements matching the log-in-button locator.
    pub async fn login_buttons_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::LOGIN_BUTTON)
            .await?
            .unwrap_or_default())
    }
}

impl Deref for LoginPage {
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
            urls.login(),
            MockPage::new("C$50 Finance: Log In")
                .with(
                    MockElement::matching(&LoginPage::USERNAME_INPUT)
                        .attr("placeholder", "Username"),
                )
                .with(
                    MockElement::matching(&LoginPage::PASSWORD_INPUT)
                        .attr("placeholder", "Password"),
                )
                .with(MockElement::matching(&LoginPage::LOGIN_BUTTON).clicks_to(urls.default_page())),
        );
        driver.install(urls.default_page(), MockPage::new("C$50 Finance: Portfolio"));
        (into_handle(driver), urls)
    }

    fn bind(driver: DriverHandle, urls: &Urls) -> LoginPage {
        LoginPage {
            page: Page::new(driver, urls.login())
                .with_element_timeout(Duration::from_millis(50))
                .with_url_timeout(Duration::from_millis(50)),
        }
    }

    #[tokio::test]
    async fn test_elements_present_and_unique() {
        let (driver, urls) = session();
        let login = bind(driver, &urls);
        login.open().await.unwrap();
        assert!(login.username_input().await.unwrap().is_some());
        assert!(Page::is_unique(&login.username_inputs_all().await.unwrap()));
        assert!(Page::is_unique(&login.password_inputs_all().await.unwrap()));
        assert!(Page::is_unique(&login.login_buttons_all().await.unwrap()));
    }

    #[tokio::test]
    async fn test_placeholders_and_default_values() {
        let (driver, urls) = session();
        let login = bind(driver, &urls);
        login.open().await.unwrap();
        let input = login.username_input().await.unwrap().unwrap();
        assert_eq!(login.placeholder_of(&input).await.unwrap(), "Username");
        assert_eq!(login.value_of(&input).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_log_in_with_redirects() {
        let (driver, urls) = session();
        let login = bind(driver, &urls);
        login.open().await.unwrap();
        login.log_in_with("ana", "P4$$word").await.unwrap();
        assert!(login.wait_for_url(&urls.default_page()).await.unwrap());
    }
}
