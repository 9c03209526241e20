//! CDP-backed driver implementation.
//!
//! Compiled only with the `browser` feature. Drives a chromium-family
//! binary over the Chrome DevTools Protocol via chromiumoxide; a Gecko
//! binary can be substituted through [`DriverConfig::executable`] as long
//! as it speaks the remote protocol.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;

use crate::driver::{Dialog, Driver, DriverConfig, ElementHandle};
use crate::locator::{Locator, Strategy};
use crate::result::{BolsaError, BolsaResult};

/// Marker attribute used to bridge XPath matches back into CSS lookups.
const XPATH_MARK: &str = "data-bolsa-mark";

/// Driver over a real browser via CDP.
pub struct CdpDriver {
    config: DriverConfig,
    browser: CdpBrowser,
    page: CdpPage,
    #[allow(dead_code)]
    handler_task: tokio::task::JoinHandle<()>,
    /// Live element registry; cleared on every navigation so stale
    /// handles fail instead of acting on the wrong document.
    elements: HashMap<String, Element>,
    next_handle: u64,
    mark_nonce: u64,
}

impl std::fmt::Debug for CdpDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpDriver")
            .field("config", &self.config)
            .field("live_handles", &self.elements.len())
            .finish_non_exhaustive()
    }
}

impl CdpDriver {
    /// Launch a browser according to `config` and open a blank page.
    pub async fn launch(config: DriverConfig) -> BolsaResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.window_width, config.window_height);

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.executable {
            builder = builder.chrome_executable(path);
        }
        for flag in config.kind.launch_flags() {
            builder = builder.arg(*flag);
        }

        let cdp_config = builder.build().map_err(|e| BolsaError::BrowserLaunch {
            message: e.to_string(),
        })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| BolsaError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BolsaError::BrowserLaunch {
                message: e.to_string(),
            })?;

        tracing::debug!(kind = config.kind.as_str(), headless = config.headless, "browser launched");

        Ok(Self {
            config,
            browser,
            page,
            handler_task,
            elements: HashMap::new(),
            next_handle: 0,
            mark_nonce: 0,
        })
    }

    fn register(&mut self, element: Element) -> ElementHandle {
        self.next_handle += 1;
        let id = format!("el-{}", self.next_handle);
        let _ = self.elements.insert(id.clone(), element);
        ElementHandle::new(id)
    }

    fn resolve(&self, handle: &ElementHandle) -> BolsaResult<&Element> {
        self.elements
            .get(&handle.id)
            .ok_or_else(|| BolsaError::StaleHandle {
                id: handle.id.clone(),
            })
    }

    /// Raw element lookup for one locator, no waiting.
    async fn lookup(&mut self, locator: &Locator) -> BolsaResult<Vec<Element>> {
        match locator.strategy {
            Strategy::XPath => self.lookup_xpath(locator.selector).await,
            _ => {
                let css = locator
                    .as_css()
                    .ok_or_else(|| BolsaError::driver(format!("unresolvable locator {locator}")))?;
                self.page
                    .find_elements(css)
                    .await
                    .or_else(|_| Ok(Vec::new()))
            }
        }
    }

    /// XPath matches are tagged with a marker attribute and re-queried
    /// through CSS, since node lookups over CDP are selector-based.
    async fn lookup_xpath(&mut self, xpath: &str) -> BolsaResult<Vec<Element>> {
        self.mark_nonce += 1;
        let nonce = format!("m{}", self.mark_nonce);
        let tag_script = format!(
            "(function() {{ \
               const res = document.evaluate({xpath}, document, null, \
                   XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
               let n = 0; \
               for (let i = 0; i < res.snapshotLength; i++) {{ \
                 const node = res.snapshotItem(i); \
                 if (node && node.setAttribute) {{ node.setAttribute('{XPATH_MARK}', '{nonce}'); n++; }} \
               }} \
               return n; \
             }})()",
            xpath = serde_json::Value::from(xpath),
        );
        let _ = self
            .page
            .evaluate(tag_script)
            .await
            .map_err(|e| BolsaError::script(e.to_string()))?;

        let found = self
            .page
            .find_elements(format!("[{XPATH_MARK}='{nonce}']"))
            .await
            .unwrap_or_default();

        let cleanup = format!(
            "document.querySelectorAll('[{XPATH_MARK}]')\
             .forEach(el => el.removeAttribute('{XPATH_MARK}'))"
        );
        let _ = self.page.evaluate(cleanup).await;

        Ok(found)
    }
}

#[async_trait]
impl Driver for CdpDriver {
    async fn navigate(&mut self, url: &str) -> BolsaResult<()> {
        tracing::trace!(url, "navigate");
        self.elements.clear();
        self.page
            .goto(url)
            .await
            .map_err(|e| BolsaError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    async fn current_url(&mut self) -> BolsaResult<String> {
        self.page
            .url()
            .await
            .map_err(|e| BolsaError::driver(e.to_string()))?
            .ok_or_else(|| BolsaError::driver("page has no URL"))
    }

    async fn title(&mut self) -> BolsaResult<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(|e| BolsaError::driver(e.to_string()))?
            .unwrap_or_default())
    }

    async fn find(&mut self, locator: &Locator) -> BolsaResult<Option<ElementHandle>> {
        let mut found = self.lookup(locator).await?;
        if found.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.register(found.remove(0))))
    }

    async fn find_all(&mut self, locator: &Locator) -> BolsaResult<Vec<ElementHandle>> {
        let found = self.lookup(locator).await?;
        Ok(found.into_iter().map(|e| self.register(e)).collect())
    }

    async fn click(&mut self, element: &ElementHandle) -> BolsaResult<()> {
        let el = self.resolve(element)?;
        el.click()
            .await
            .map_err(|e| BolsaError::Input {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn type_text(&mut self, element: &ElementHandle, text: &str) -> BolsaResult<()> {
        let el = self.resolve(element)?;
        el.click()
            .await
            .map_err(|e| BolsaError::Input {
                message: e.to_string(),
            })?;
        el.type_str(text)
            .await
            .map_err(|e| BolsaError::Input {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn inject_value(&mut self, element: &ElementHandle, text: &str) -> BolsaResult<()> {
        let el = self.resolve(element)?;
        let function = format!(
            "function() {{ \
               this.value = {value}; \
               this.dispatchEvent(new Event('change', {{bubbles: true}})); \
             }}",
            value = serde_json::Value::from(text),
        );
        let _ = el
            .call_js_fn(function, false)
            .await
            .map_err(|e| BolsaError::Input {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> BolsaResult<Option<String>> {
        let el = self.resolve(element)?;
        el.attribute(name)
            .await
            .map_err(|e| BolsaError::driver(e.to_string()))
    }

    async fn text(&mut self, element: &ElementHandle) -> BolsaResult<String> {
        let el = self.resolve(element)?;
        Ok(el
            .inner_text()
            .await
            .map_err(|e| BolsaError::driver(e.to_string()))?
            .unwrap_or_default())
    }

    async fn eval(&mut self, script: &str) -> BolsaResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BolsaError::script(e.to_string()))?;
        Ok(result.into_value().unwrap_or(serde_json::Value::Null))
    }

    async fn call_on(&mut self, element: &ElementHandle, function: &str) -> BolsaResult<()> {
        let el = self.resolve(element)?;
        let _ = el
            .call_js_fn(function, false)
            .await
            .map_err(|e| BolsaError::script(e.to_string()))?;
        Ok(())
    }

    async fn wait_for_dialog(&mut self, timeout: Duration) -> BolsaResult<Option<Dialog>> {
        let mut events = self
            .page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| BolsaError::driver(e.to_string()))?;
        match tokio::time::timeout(timeout, events.next()).await {
            Ok(Some(event)) => Ok(Some(Dialog {
                message: event.message.clone(),
            })),
            Ok(None) | Err(_) => Ok(None),
        }
    }

    async fn accept_dialog(&mut self) -> BolsaResult<()> {
        let params = HandleJavaScriptDialogParams::builder()
            .accept(true)
            .build()
            .map_err(|e| BolsaError::driver(e))?;
        self.page
            .execute(params)
            .await
            .map_err(|e| BolsaError::driver(e.to_string()))?;
        Ok(())
    }

    async fn maximize(&mut self) -> BolsaResult<()> {
        // window size is fixed at launch; nothing to do over CDP
        tracing::trace!(
            width = self.config.window_width,
            height = self.config.window_height,
            "maximize is a launch-time concern under CDP"
        );
        Ok(())
    }

    async fn close(&mut self) -> BolsaResult<()> {
        self.elements.clear();
        self.browser
            .close()
            .await
            .map_err(|e| BolsaError::driver(e.to_string()))?;
        Ok(())
    }
}
