//! Register page object.

use std::ops::Deref;

use crate::driver::{DriverHandle, ElementHandle};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::BolsaResult;

use super::Urls;

/// The Register page: username, password, confirmation, button.
#[derive(Debug, Clone)]
pub struct RegisterPage {
    page: Page,
}

impl RegisterPage {
    /// Username input
    pub const USERNAME_INPUT: Locator = Locator::name("username");
    /// Password input
    pub const PASSWORD_INPUT: Locator = Locator::name("password");
    /// Password confirmation input
    pub const CONFIRM_INPUT: Locator = Locator::name("confirmation");
    /// Register button
    pub const REGISTER_BUTTON: Locator = Locator::xpath("//button[text()='Register']");

    /// Bind the page to a session.
    #[must_use]
    pub fn new(driver: DriverHandle, urls: &Urls) -> Self {
        Self {
            page: Page::new(driver, urls.register()),
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

    /// Confirmation input, when present.
    pub async fn confirm_input(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::CONFIRM_INPUT).await
    }

    /// Register button, when present.
    pub async fn register_button(&self) -> BolsaResult<Option<ElementHandle>> {
        self.page.find_one(&Self::REGISTER_BUTTON).await
    }

    /// Fill the three inputs and press the button. A `None` confirmation
    /// repeats the password, which is the usual successful path.
    pub async fn register_new_user(
        &self,
        username: &str,
        password: &str,
        confirm: Option<&str>,
    ) -> BolsaResult<()> {
        let confirm = confirm.unwrap_or(password);
        let username_input = self.page.require(&Self::USERNAME_INPUT, "username input").await?;
        self.page.fill(&username_input, username).await?;
        let password_input = self.page.require(&Self::PASSWORD_INPUT, "password input").await?;
        self.page.fill(&password_input, password).await?;
        let confirm_input = self.page.require(&Self::CONFIRM_INPUT, "confirmation input").await?;
        self.page.fill(&confirm_input, confirm).await?;
        let button = self.page.require(&Self::REGISTER_BUTTON, "register button").await?;
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

    /// All elements matching the confirmation-input locator.
    pub async fn confirm_inputs_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::CONFIRM_INPUT)
            .await?
            .unwrap_or_default())
    }

    /// All elements matching the register-button locator.
    pub async fn register_buttons_all(&self) -> BolsaResult<Vec<ElementHandle>> {
        Ok(self
            .page
            .find_many(&Self::REGISTER_BUTTON)
            .await?
            .unwrap_or_default())
    }
}

impl Deref for RegisterPage {
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
            urls.register(),
            MockPage::new("C$50 Finance: Register")
                .with(MockElement::matching(&RegisterPage::USERNAME_INPUT))
                .with(MockElement::matching(&RegisterPage::PASSWORD_INPUT))
                .with(
                    MockElement::matching(&RegisterPage::CONFIRM_INPUT)
                        .attr("placeholder", "Password (again)"),
                )
                .with(
                    MockElement::matching(&RegisterPage::REGISTER_BUTTON)
                        .clicks_to(urls.default_page()),
                ),
        );
        driver.install(urls.default_page(), MockPage::new("C$50 Finance: Portfolio"));
        (into_handle(driver), urls)
    }

    fn bind(driver: DriverHandle, urls: &Urls) -> RegisterPage {
        RegisterPage {
            page: Page::new(driver, urls.register())
                .with_element_timeout(Duration::from_millis(50))
                .with_url_timeout(Duration::from_millis(50)),
        }
    }

    #[tokio::test]
    async fn test_form_elements_present() {
        let (driver, urls) = session();
        let register = bind(driver, &urls);
        register.open().await.unwrap();
        assert!(register.username_input().await.unwrap().is_some());
        assert!(register.password_input().await.unwrap().is_some());
        assert!(register.confirm_input().await.unwrap().is_some());
        assert!(register.register_button().await.unwrap().is_some());
        assert!(Page::is_unique(
            &register.register_buttons_all().await.unwrap()
        ));
    }

    #[tokio::test]
    async fn test_register_defaults_confirmation_to_password() {
        // button with no effect so handles stay valid for readback
        let urls = Urls::new("https://app");
        let mut driver = MockDriver::new();
        driver.install(
            urls.register(),
            MockPage::new("C$50 Finance: Register")
                .with(MockElement::matching(&RegisterPage::USERNAME_INPUT))
                .with(MockElement::matching(&RegisterPage::PASSWORD_INPUT))
                .with(MockElement::matching(&RegisterPage::CONFIRM_INPUT))
                .with(MockElement::matching(&RegisterPage::REGISTER_BUTTON)),
        );
        let register = bind(into_handle(driver), &urls);
        register.open().await.unwrap();
        register
            .register_new_user("ana", "P4$$word", None)
            .await
            .unwrap();
        let confirm = register.confirm_input().await.unwrap().unwrap();
        assert_eq!(register.value_of(&confirm).await.unwrap(), "P4$$word");
    }

    #[tokio::test]
    async fn test_register_with_explicit_confirmation() {
        let (driver, urls) = session();
        let register = bind(driver, &urls);
        register.open().await.unwrap();
        register
            .register_new_user("ana", "P4$$word", Some("different"))
            .await
            .unwrap();
        assert!(register.wait_for_url(&urls.default_page()).await.unwrap());
    }
}
