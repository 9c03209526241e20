//! Endpoint table of the app under test.

/// Typed URL endpoints built from one base URL.
#[derive(Debug, Clone)]
pub struct Urls {
    base: String,
}

impl Urls {
    /// Create an endpoint table over a base URL (trailing slash ignored).
    #[must_use]
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Join an absolute path onto the base URL.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Default route (the portfolio).
    #[must_use]
    pub fn default_page(&self) -> String {
        self.join("/")
    }

    /// Log in page.
    #[must_use]
    pub fn login(&self) -> String {
        self.join("/login")
    }

    /// Log out route.
    #[must_use]
    pub fn logout(&self) -> String {
        self.join("/logout")
    }

    /// Register page.
    #[must_use]
    pub fn register(&self) -> String {
        self.join("/register")
    }

    /// Quote page.
    #[must_use]
    pub fn quote(&self) -> String {
        self.join("/quote")
    }

    /// Buy page.
    #[must_use]
    pub fn buy(&self) -> String {
        self.join("/buy")
    }

    /// Sell page.
    #[must_use]
    pub fn sell(&self) -> String {
        self.join("/sell")
    }

    /// History page.
    #[must_use]
    pub fn history(&self) -> String {
        self.join("/history")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let urls = Urls::new("https://finance.example.net/");
        assert_eq!(urls.default_page(), "https://finance.example.net/");
        assert_eq!(urls.login(), "https://finance.example.net/login");
        assert_eq!(urls.history(), "https://finance.example.net/history");
        assert_eq!(urls.join("/quote"), urls.quote());
    }
}
