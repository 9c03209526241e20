//! Locators: (strategy, selector) pairs identifying DOM elements.
//!
//! Every page module declares its controls as named `Locator` constants;
//! nothing else in the crate hard-codes a selector string.

use std::fmt;

/// Lookup strategy for a locator.
///
/// A small closed enumeration, mirroring the strategies the suite
/// actually uses. CSS covers the bulk; XPath exists for text-anchored
/// buttons that CSS cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Element id attribute
    Id,
    /// Form control name attribute
    Name,
    /// CSS selector
    Css,
    /// XPath expression
    XPath,
    /// Bare tag name
    Tag,
}

impl Strategy {
    /// Short wire name, used in logs and mock-driver keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Tag => "tag",
        }
    }
}

/// A (strategy, selector) pair identifying zero or more DOM nodes.
///
/// Immutable and `const`-constructible so pages can declare their
/// controls as associated constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locator {
    /// Lookup strategy
    pub strategy: Strategy,
    /// Selector string interpreted under the strategy
    pub selector: &'static str,
}

impl Locator {
    /// Create a locator.
    #[must_use]
    pub const fn new(strategy: Strategy, selector: &'static str) -> Self {
        Self { strategy, selector }
    }

    /// Create a CSS locator.
    #[must_use]
    pub const fn css(selector: &'static str) -> Self {
        Self::new(Strategy::Css, selector)
    }

    /// Create a name-attribute locator.
    #[must_use]
    pub const fn name(selector: &'static str) -> Self {
        Self::new(Strategy::Name, selector)
    }

    /// Create an id locator.
    #[must_use]
    pub const fn id(selector: &'static str) -> Self {
        Self::new(Strategy::Id, selector)
    }

    /// Create an XPath locator.
    #[must_use]
    pub const fn xpath(selector: &'static str) -> Self {
        Self::new(Strategy::XPath, selector)
    }

    /// Create a tag-name locator.
    #[must_use]
    pub const fn tag(selector: &'static str) -> Self {
        Self::new(Strategy::Tag, selector)
    }

    /// CSS equivalent of this locator, if one exists.
    ///
    /// XPath has no CSS rendering and returns `None`; drivers resolve it
    /// through `document.evaluate` instead.
    #[must_use]
    pub fn as_css(&self) -> Option<String> {
        match self.strategy {
            Strategy::Id => Some(format!("[id='{}']", self.selector)),
            Strategy::Name => Some(format!("[name='{}']", self.selector)),
            Strategy::Css => Some(self.selector.to_string()),
            Strategy::Tag => Some(self.selector.to_string()),
            Strategy::XPath => None,
        }
    }

    /// Stable key for mock-driver matching and tracing.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.strategy.as_str(), self.selector)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.as_str(), self.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod strategy_tests {
        use super::*;

        #[test]
        fn test_strategy_names() {
            assert_eq!(Strategy::Id.as_str(), "id");
            assert_eq!(Strategy::Name.as_str(), "name");
            assert_eq!(Strategy::Css.as_str(), "css");
            assert_eq!(Strategy::XPath.as_str(), "xpath");
            assert_eq!(Strategy::Tag.as_str(), "tag");
        }
    }

    mod locator_tests {
        use super::*;

        const SYMBOL_INPUT: Locator = Locator::name("symbol");

        #[test]
        fn test_const_declaration() {
            assert_eq!(SYMBOL_INPUT.strategy, Strategy::Name);
            assert_eq!(SYMBOL_INPUT.selector, "symbol");
        }

        #[test]
        fn test_css_equivalents() {
            assert_eq!(
                Locator::id("navbar").as_css().as_deref(),
                Some("[id='navbar']")
            );
            assert_eq!(
                Locator::name("shares").as_css().as_deref(),
                Some("[name='shares']")
            );
            assert_eq!(
                Locator::css("tbody tr td").as_css().as_deref(),
                Some("tbody tr td")
            );
            assert_eq!(Locator::tag("img").as_css().as_deref(), Some("img"));
        }

        #[test]
        fn test_xpath_has_no_css_equivalent() {
            assert!(Locator::xpath("//button[text()='Buy']").as_css().is_none());
        }

        #[test]
        fn test_key_and_display() {
            let loc = Locator::css(".alert");
            assert_eq!(loc.key(), "css:.alert");
            assert_eq!(loc.to_string(), "css=.alert");
        }
    }
}
