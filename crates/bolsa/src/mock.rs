//! Scripted in-memory driver for unit testing.
//!
//! [`MockDriver`] holds a set of fake pages keyed by URL. Each page is a
//! flat list of [`MockElement`]s that declare which locators they match,
//! their attributes and text, and an optional click effect (navigation).
//! Interactions are recorded in a call history so tests can verify what
//! the page objects actually did.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::driver::{Dialog, Driver, ElementHandle};
use crate::locator::Locator;
use crate::result::{BolsaError, BolsaResult};

static REMOVE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"removeAttribute\('([^']+)'\)").unwrap());
static SET_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"setAttribute\('([^']+)',\s*'([^']*)'\)").unwrap());

/// Effect of clicking a scripted element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    /// No observable effect
    None,
    /// Navigate to a URL (the scripted equivalent of a form submit or link)
    Navigate(String),
}

/// One scripted DOM element.
#[derive(Debug, Clone)]
pub struct MockElement {
    matches: Vec<String>,
    attributes: HashMap<String, String>,
    text: String,
    on_click: ClickEffect,
}

impl MockElement {
    /// Create an element matched by `locator`.
    #[must_use]
    pub fn matching(locator: &Locator) -> Self {
        Self {
            matches: vec![locator.key()],
            attributes: HashMap::new(),
            text: String::new(),
            on_click: ClickEffect::None,
        }
    }

    /// Also match a second locator (e.g. both a name and a css lookup).
    #[must_use]
    pub fn also_matching(mut self, locator: &Locator) -> Self {
        self.matches.push(locator.key());
        self
    }

    /// Set an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the visible text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Clicking this element navigates to `url`.
    #[must_use]
    pub fn clicks_to(mut self, url: impl Into<String>) -> Self {
        self.on_click = ClickEffect::Navigate(url.into());
        self
    }

    fn matches_key(&self, key: &str) -> bool {
        self.matches.iter().any(|m| m == key)
    }
}

/// One scripted page.
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    title: String,
    elements: Vec<MockElement>,
}

impl MockPage {
    /// Create a page with a title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
        }
    }

    /// Add an element.
    #[must_use]
    pub fn with(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Add an element in place.
    pub fn push(&mut self, element: MockElement) {
        self.elements.push(element);
    }
}

/// Scripted driver implementation.
#[derive(Debug, Default)]
pub struct MockDriver {
    pages: HashMap<String, MockPage>,
    current: String,
    /// handle id -> element index in the current page
    handles: HashMap<String, usize>,
    next_handle: u64,
    dialogs: VecDeque<Dialog>,
    eval_results: VecDeque<serde_json::Value>,
    history: Vec<String>,
    closed: bool,
}

impl MockDriver {
    /// Create an empty driver with no pages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a scripted page at a URL.
    pub fn install(&mut self, url: impl Into<String>, page: MockPage) {
        let _ = self.pages.insert(url.into(), page);
    }

    /// Queue a native dialog to be "opened" on the next wait.
    pub fn push_dialog(&mut self, message: impl Into<String>) {
        self.dialogs.push_back(Dialog {
            message: message.into(),
        });
    }

    /// Queue a scripted `eval` result.
    pub fn push_eval_result(&mut self, value: serde_json::Value) {
        self.eval_results.push_back(value);
    }

    /// Recorded call history.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// True once `close` was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// True when any recorded call starts with `prefix`.
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.history.iter().any(|h| h.starts_with(prefix))
    }

    /// Current value attribute of the element behind `handle`, for
    /// asserting what got typed.
    #[must_use]
    pub fn value_of(&self, handle: &ElementHandle) -> Option<String> {
        let idx = *self.handles.get(&handle.id)?;
        let page = self.pages.get(&self.current)?;
        page.elements
            .get(idx)
            .map(|e| e.attributes.get("value").cloned().unwrap_or_default())
    }

    fn record(&mut self, entry: String) {
        self.history.push(entry);
    }

    fn element(&self, handle: &ElementHandle) -> BolsaResult<(usize, &MockElement)> {
        let idx = *self
            .handles
            .get(&handle.id)
            .ok_or_else(|| BolsaError::StaleHandle {
                id: handle.id.clone(),
            })?;
        let page = self
            .pages
            .get(&self.current)
            .ok_or_else(|| BolsaError::driver(format!("no page installed at {}", self.current)))?;
        let element = page
            .elements
            .get(idx)
            .ok_or_else(|| BolsaError::StaleHandle {
                id: handle.id.clone(),
            })?;
        Ok((idx, element))
    }

    fn element_mut(&mut self, handle: &ElementHandle) -> BolsaResult<&mut MockElement> {
        let idx = *self
            .handles
            .get(&handle.id)
            .ok_or_else(|| BolsaError::StaleHandle {
                id: handle.id.clone(),
            })?;
        let current = self.current.clone();
        self.pages
            .get_mut(&current)
            .and_then(|p| p.elements.get_mut(idx))
            .ok_or_else(|| BolsaError::StaleHandle {
                id: handle.id.clone(),
            })
    }

    fn new_handle(&mut self, idx: usize) -> ElementHandle {
        self.next_handle += 1;
        let id = format!("el-{}", self.next_handle);
        let _ = self.handles.insert(id.clone(), idx);
        ElementHandle::new(id)
    }

    fn goto(&mut self, url: &str) {
        self.current = url.to_string();
        // navigation invalidates every outstanding handle
        self.handles.clear();
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn navigate(&mut self, url: &str) -> BolsaResult<()> {
        self.record(format!("navigate:{url}"));
        self.goto(url);
        Ok(())
    }

    async fn current_url(&mut self) -> BolsaResult<String> {
        Ok(self.current.clone())
    }

    async fn title(&mut self) -> BolsaResult<String> {
        Ok(self
            .pages
            .get(&self.current)
            .map(|p| p.title.clone())
            .unwrap_or_default())
    }

    async fn find(&mut self, locator: &Locator) -> BolsaResult<Option<ElementHandle>> {
        let key = locator.key();
        let idx = self
            .pages
            .get(&self.current)
            .and_then(|p| p.elements.iter().position(|e| e.matches_key(&key)));
        Ok(idx.map(|i| self.new_handle(i)))
    }

    async fn find_all(&mut self, locator: &Locator) -> BolsaResult<Vec<ElementHandle>> {
        let key = locator.key();
        let indices: Vec<usize> = self
            .pages
            .get(&self.current)
            .map(|p| {
                p.elements
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.matches_key(&key))
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default();
        Ok(indices.into_iter().map(|i| self.new_handle(i)).collect())
    }

    async fn click(&mut self, element: &ElementHandle) -> BolsaResult<()> {
        let (_, el) = self.element(element)?;
        let effect = el.on_click.clone();
        self.record(format!("click:{}", element.id));
        if let ClickEffect::Navigate(url) = effect {
            self.goto(&url);
        }
        Ok(())
    }

    async fn type_text(&mut self, element: &ElementHandle, text: &str) -> BolsaResult<()> {
        self.record(format!("type:{}:{}", element.id, text));
        let el = self.element_mut(element)?;
        // keystrokes append, like send_keys
        el.attributes
            .entry("value".to_string())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn inject_value(&mut self, element: &ElementHandle, text: &str) -> BolsaResult<()> {
        self.record(format!("inject:{}:{}", element.id, text));
        let el = self.element_mut(element)?;
        let _ = el.attributes.insert("value".to_string(), text.to_string());
        Ok(())
    }

    async fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> BolsaResult<Option<String>> {
        let (_, el) = self.element(element)?;
        Ok(el.attributes.get(name).cloned())
    }

    async fn text(&mut self, element: &ElementHandle) -> BolsaResult<String> {
        let (_, el) = self.element(element)?;
        Ok(el.text.clone())
    }

    async fn eval(&mut self, script: &str) -> BolsaResult<serde_json::Value> {
        self.record(format!("eval:{script}"));
        Ok(self
            .eval_results
            .pop_front()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn call_on(&mut self, element: &ElementHandle, function: &str) -> BolsaResult<()> {
        self.record(format!("call_on:{}:{function}", element.id));
        // emulate the attribute mutations the suite's scripts perform
        let removals: Vec<String> = REMOVE_ATTR
            .captures_iter(function)
            .map(|c| c[1].to_string())
            .collect();
        let sets: Vec<(String, String)> = SET_ATTR
            .captures_iter(function)
            .map(|c| (c[1].to_string(), c[2].to_string()))
            .collect();
        let el = self.element_mut(element)?;
        for name in removals {
            let _ = el.attributes.remove(&name);
        }
        for (name, value) in sets {
            let _ = el.attributes.insert(name, value);
        }
        Ok(())
    }

    async fn wait_for_dialog(&mut self, _timeout: Duration) -> BolsaResult<Option<Dialog>> {
        self.record("wait_for_dialog".to_string());
        Ok(self.dialogs.pop_front())
    }

    async fn accept_dialog(&mut self) -> BolsaResult<()> {
        self.record("accept_dialog".to_string());
        Ok(())
    }

    async fn maximize(&mut self) -> BolsaResult<()> {
        self.record("maximize".to_string());
        Ok(())
    }

    async fn close(&mut self) -> BolsaResult<()> {
        self.record("close".to_string());
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERNAME: Locator = Locator::name("username");
    const BUTTON: Locator = Locator::xpath("//button[text()='Log In']");

    fn scripted() -> MockDriver {
        let mut driver = MockDriver::new();
        driver.install(
            "https://app/login",
            MockPage::new("Log In")
                .with(MockElement::matching(&USERNAME).attr("placeholder", "Username"))
                .with(MockElement::matching(&BUTTON).clicks_to("https://app/")),
        );
        driver.install("https://app/", MockPage::new("Portfolio"));
        driver
    }

    #[tokio::test]
    async fn test_navigate_and_title() {
        let mut driver = scripted();
        driver.navigate("https://app/login").await.unwrap();
        assert_eq!(driver.current_url().await.unwrap(), "https://app/login");
        assert_eq!(driver.title().await.unwrap(), "Log In");
        assert!(driver.was_called("navigate:"));
    }

    #[tokio::test]
    async fn test_find_and_attributes() {
        let mut driver = scripted();
        driver.navigate("https://app/login").await.unwrap();
        let input = driver.find(&USERNAME).await.unwrap().unwrap();
        assert_eq!(
            driver.attribute(&input, "placeholder").await.unwrap(),
            Some("Username".to_string())
        );
        assert_eq!(driver.attribute(&input, "min").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_missing_is_none_not_error() {
        let mut driver = scripted();
        driver.navigate("https://app/").await.unwrap();
        assert!(driver.find(&USERNAME).await.unwrap().is_none());
        assert!(driver.find_all(&USERNAME).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_typing_appends_and_injection_replaces() {
        let mut driver = scripted();
        driver.navigate("https://app/login").await.unwrap();
        let input = driver.find(&USERNAME).await.unwrap().unwrap();
        driver.type_text(&input, "te").await.unwrap();
        driver.type_text(&input, "st").await.unwrap();
        assert_eq!(driver.value_of(&input).as_deref(), Some("test"));
        driver.inject_value(&input, "other").await.unwrap();
        assert_eq!(driver.value_of(&input).as_deref(), Some("other"));
    }

    #[tokio::test]
    async fn test_fill_picks_injection_for_emoji() {
        let mut driver = scripted();
        driver.navigate("https://app/login").await.unwrap();
        let input = driver.find(&USERNAME).await.unwrap().unwrap();
        driver.fill(&input, "😍😍😍").await.unwrap();
        assert!(driver.was_called(&format!("inject:{}", input.id)));
        driver.fill(&input, "plain").await.unwrap();
        assert!(driver.was_called(&format!("type:{}", input.id)));
    }

    #[tokio::test]
    async fn test_click_navigates_and_invalidates_handles() {
        let mut driver = scripted();
        driver.navigate("https://app/login").await.unwrap();
        let button = driver.find(&BUTTON).await.unwrap().unwrap();
        driver.click(&button).await.unwrap();
        assert_eq!(driver.current_url().await.unwrap(), "https://app/");
        let err = driver.click(&button).await.unwrap_err();
        assert!(matches!(err, BolsaError::StaleHandle { .. }));
    }

    #[tokio::test]
    async fn test_close_is_recorded() {
        let mut driver = scripted();
        assert!(!driver.is_closed());
        driver.close().await.unwrap();
        assert!(driver.is_closed());
        assert!(driver.was_called("close"));
    }

    #[tokio::test]
    async fn test_call_on_applies_attribute_scripts() {
        let mut driver = scripted();
        driver.navigate("https://app/login").await.unwrap();
        let input = driver.find(&USERNAME).await.unwrap().unwrap();
        driver
            .call_on(
                &input,
                "function() { this.removeAttribute('placeholder'); \
                 this.setAttribute('type', 'text'); }",
            )
            .await
            .unwrap();
        assert_eq!(driver.attribute(&input, "placeholder").await.unwrap(), None);
        assert_eq!(
            driver.attribute(&input, "type").await.unwrap().as_deref(),
            Some("text")
        );
    }

    #[tokio::test]
    async fn test_dialog_queue() {
        let mut driver = scripted();
        driver.push_dialog("You must provide a symbol");
        let dialog = driver
            .wait_for_dialog(Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(
            dialog.map(|d| d.message).as_deref(),
            Some("You must provide a symbol")
        );
        assert!(driver
            .wait_for_dialog(Duration::from_millis(10))
            .await
            .unwrap()
            .is_none());
    }
}
