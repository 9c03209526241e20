//! Abstract browser-automation capability.
//!
//! The suite never talks to a browser directly; it talks to [`Driver`].
//! Two implementations exist: a CDP-backed one (`browser` feature, see
//! `browser.rs`) and a scripted in-memory one for unit testing (`mock.rs`).
//!
//! All waits live *above* this trait: a `find` call is a single attempt,
//! and the page layer turns attempts into bounded polls. The one
//! exception is the native-dialog wait, which is event-driven in CDP and
//! therefore carries its own bound.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::locator::Locator;
use crate::result::BolsaResult;

/// Shared handle to a driver, cloned into every page object.
///
/// The session is single-threaded in practice; the mutex exists so page
/// objects can share one browser the way the suite shares one WebDriver.
pub type DriverHandle = Arc<Mutex<Box<dyn Driver + Send>>>;

/// Wrap a driver implementation into a shareable handle.
pub fn into_handle<D: Driver + Send + 'static>(driver: D) -> DriverHandle {
    Arc::new(Mutex::new(Box::new(driver)))
}

/// Opaque reference to a located DOM element.
///
/// Valid only until the next navigation; drivers invalidate their
/// element registries when the page changes, and using a stale handle
/// yields [`crate::BolsaError::StaleHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// Driver-internal identifier
    pub id: String,
}

impl ElementHandle {
    /// Create a handle from a driver-internal id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A browser-level (non-DOM) dialog: `alert`, `confirm`, `prompt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    /// Message text shown by the dialog
    pub message: String,
}

/// Supported browser engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BrowserKind {
    /// Chromium-family engine
    Chrome,
    /// Gecko engine
    Firefox,
}

impl BrowserKind {
    /// Engine-specific launch flags.
    #[must_use]
    pub fn launch_flags(&self) -> &'static [&'static str] {
        match self {
            // GPU init is flaky under Xvfb; quote pages do not need it.
            Self::Chrome => &["--disable-gpu"],
            Self::Firefox => &[],
        }
    }

    /// Lowercase engine name as used by the CLI.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
        }
    }
}

/// Launch configuration for a driver.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Engine to launch
    pub kind: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Explicit browser binary (None = auto-detect)
    pub executable: Option<String>,
    /// Sandbox mode (disable only when running as root)
    pub sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            kind: BrowserKind::Chrome,
            headless: true,
            window_width: 1920,
            window_height: 1080,
            executable: None,
            sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create a config for the given engine.
    #[must_use]
    pub fn new(kind: BrowserKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Set headless mode.
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the browser binary path.
    #[must_use]
    pub fn executable(mut self, path: impl Into<String>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Disable the sandbox (containers, root).
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// True when `text` contains a code point outside the Basic Multilingual
/// Plane (emoji and friends).
///
/// Keystroke simulation in at least one supported engine cannot encode
/// such code points, so [`Driver::fill`] falls back to DOM value
/// injection for them.
#[must_use]
pub fn contains_non_bmp(text: &str) -> bool {
    text.chars().any(|c| c as u32 > 0xFFFF)
}

/// Abstract browser automation capability.
///
/// Synchronous in spirit: every method is awaited to completion before
/// the next is issued; implementations are not used concurrently.
#[async_trait]
pub trait Driver {
    /// Navigate to a URL. Invalidates all outstanding element handles.
    async fn navigate(&mut self, url: &str) -> BolsaResult<()>;

    /// Current page URL.
    async fn current_url(&mut self) -> BolsaResult<String>;

    /// Current page title.
    async fn title(&mut self) -> BolsaResult<String>;

    /// Single lookup attempt for the first element matching `locator`.
    async fn find(&mut self, locator: &Locator) -> BolsaResult<Option<ElementHandle>>;

    /// Single lookup attempt for all elements matching `locator`.
    async fn find_all(&mut self, locator: &Locator) -> BolsaResult<Vec<ElementHandle>>;

    /// Click an element.
    async fn click(&mut self, element: &ElementHandle) -> BolsaResult<()>;

    /// Type text into an element via keystroke simulation.
    async fn type_text(&mut self, element: &ElementHandle, text: &str) -> BolsaResult<()>;

    /// Set an element's value directly and dispatch a bubbling `change`
    /// event, bypassing keystroke simulation.
    async fn inject_value(&mut self, element: &ElementHandle, text: &str) -> BolsaResult<()>;

    /// Read an attribute; `None` when the attribute is absent.
    async fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> BolsaResult<Option<String>>;

    /// Visible text of an element.
    async fn text(&mut self, element: &ElementHandle) -> BolsaResult<String>;

    /// Evaluate a script in page context.
    async fn eval(&mut self, script: &str) -> BolsaResult<serde_json::Value>;

    /// Call a JS function with the element bound as `this`.
    async fn call_on(&mut self, element: &ElementHandle, function: &str) -> BolsaResult<()>;

    /// Bounded wait for a native dialog; `None` when none opened in time.
    async fn wait_for_dialog(&mut self, timeout: Duration) -> BolsaResult<Option<Dialog>>;

    /// Accept the currently open native dialog.
    async fn accept_dialog(&mut self) -> BolsaResult<()>;

    /// Maximize the browser window (no-op for headless engines).
    async fn maximize(&mut self) -> BolsaResult<()>;

    /// Quit the browser and release its resources.
    async fn close(&mut self) -> BolsaResult<()>;

    /// Type text into an input, falling back to DOM value injection when
    /// the text cannot be expressed as keystrokes (non-BMP code points).
    async fn fill(&mut self, element: &ElementHandle, text: &str) -> BolsaResult<()> {
        if contains_non_bmp(text) {
            self.inject_value(element, text).await
        } else {
            self.type_text(element, text).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod non_bmp_tests {
        use super::*;

        #[test]
        fn test_ascii_is_bmp() {
            assert!(!contains_non_bmp("AAPL"));
            assert!(!contains_non_bmp(""));
            assert!(!contains_non_bmp("-10 000,50 $@%"));
        }

        #[test]
        fn test_cyrillic_and_cjk_are_bmp() {
            assert!(!contains_non_bmp("тест"));
            assert!(!contains_non_bmp("片仮名"));
        }

        #[test]
        fn test_emoji_is_non_bmp() {
            assert!(contains_non_bmp("😍😍😍"));
            assert!(contains_non_bmp("💵💵💵"));
            assert!(contains_non_bmp("AAPL💵"));
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_default_config() {
            let config = DriverConfig::default();
            assert_eq!(config.kind, BrowserKind::Chrome);
            assert!(config.headless);
            assert!(config.sandbox);
            assert!(config.executable.is_none());
        }

        #[test]
        fn test_builder() {
            let config = DriverConfig::new(BrowserKind::Firefox)
                .headless(false)
                .executable("/usr/bin/firefox")
                .no_sandbox();
            assert_eq!(config.kind, BrowserKind::Firefox);
            assert!(!config.headless);
            assert!(!config.sandbox);
            assert_eq!(config.executable.as_deref(), Some("/usr/bin/firefox"));
        }

        #[test]
        fn test_engine_launch_flags() {
            assert!(BrowserKind::Chrome.launch_flags().contains(&"--disable-gpu"));
            assert!(BrowserKind::Firefox.launch_flags().is_empty());
        }

        #[test]
        fn test_engine_names() {
            assert_eq!(BrowserKind::Chrome.as_str(), "chrome");
            assert_eq!(BrowserKind::Firefox.as_str(), "firefox");
        }
    }
}
