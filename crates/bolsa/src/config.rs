//! Suite configuration and the CLI surface.
//!
//! The clap types live in the library so the binary stays a thin shell;
//! invalid flag values are usage errors at startup, before any browser
//! or database is touched.

use clap::Parser;

use crate::driver::BrowserKind;
use crate::result::{BolsaError, BolsaResult};

/// Default element-lookup timeout (milliseconds).
pub const ELEMENT_TIMEOUT_MS: u64 = 6000;

/// Shorter timeout governing URL-transition waits (milliseconds).
pub const URL_TIMEOUT_MS: u64 = 3000;

/// Polling interval for bounded waits (milliseconds).
pub const POLL_INTERVAL_MS: u64 = 100;

/// Whether database-reliant assertions run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DbUsage {
    /// Cross-check page state against the database
    Yes,
    /// Skip database-reliant checks
    No,
}

/// Command-line interface of the suite runner.
#[derive(Debug, Parser)]
#[command(name = "bolsa", about = "End-to-end UI test suite for the stock-trading app")]
pub struct Cli {
    /// Browser engine to run the suite with
    #[arg(long, value_enum, default_value = "chrome")]
    pub browser: BrowserKind,

    /// Run the browser without a visible window
    #[arg(long)]
    pub headless: bool,

    /// Gate database-dependent assertions
    #[arg(long, value_enum, default_value = "yes")]
    pub db_usage: DbUsage,

    /// Base URL of the app under test
    #[arg(long, env = "BOLSA_BASE_URL", default_value = "https://finance.cs50.net")]
    pub base_url: String,

    /// Path to the app's (or the mock) sqlite database
    #[arg(long, env = "BOLSA_DB_PATH", default_value = "mock.db")]
    pub db_path: String,

    /// Only run suites whose name contains this substring
    #[arg(long)]
    pub filter: Option<String>,

    /// Seed for the randomized case tables (reproducible runs)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Explicit browser binary path
    #[arg(long)]
    pub browser_binary: Option<String>,

    /// Disable the browser sandbox (unsafe; containers/root only)
    #[arg(long)]
    pub no_sandbox: bool,
}

/// Validated runtime configuration shared by every suite.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Engine in use (drives `firefox_only`/`chrome_only` skips)
    pub browser: BrowserKind,
    /// Headless mode
    pub headless: bool,
    /// Database-reliant checks enabled
    pub db_usage: bool,
    /// Base URL of the app under test
    pub base_url: String,
    /// Database path
    pub db_path: String,
    /// Suite-name filter
    pub filter: Option<String>,
    /// Case-table seed
    pub seed: Option<u64>,
    /// Browser binary override
    pub browser_binary: Option<String>,
    /// Sandbox disabled
    pub no_sandbox: bool,
}

impl SuiteConfig {
    /// Build and validate a config from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> BolsaResult<Self> {
        let config = Self {
            browser: cli.browser,
            headless: cli.headless,
            db_usage: cli.db_usage == DbUsage::Yes,
            base_url: cli.base_url.trim_end_matches('/').to_string(),
            db_path: cli.db_path.clone(),
            filter: cli.filter.clone(),
            seed: cli.seed,
            browser_binary: cli.browser_binary.clone(),
            no_sandbox: cli.no_sandbox,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot possibly run.
    pub fn validate(&self) -> BolsaResult<()> {
        let _ = url::Url::parse(&self.base_url).map_err(|e| BolsaError::Config {
            message: format!("invalid base URL '{}': {e}", self.base_url),
        })?;
        if self.db_usage && self.db_path.trim().is_empty() {
            return Err(BolsaError::Config {
                message: "database usage requested but no database path given".to_string(),
            });
        }
        Ok(())
    }

    /// Config for mock-driven tests: localhost app, no database.
    #[must_use]
    pub fn for_tests(base_url: &str) -> Self {
        Self {
            browser: BrowserKind::Chrome,
            headless: true,
            db_usage: false,
            base_url: base_url.trim_end_matches('/').to_string(),
            db_path: String::new(),
            filter: None,
            seed: Some(0),
            browser_binary: None,
            no_sandbox: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["bolsa"]);
        assert_eq!(cli.browser, BrowserKind::Chrome);
        assert!(!cli.headless);
        assert_eq!(cli.db_usage, DbUsage::Yes);
        assert_eq!(cli.db_path, "mock.db");
    }

    #[test]
    fn test_browser_flag_values() {
        let cli = Cli::parse_from(["bolsa", "--browser", "firefox"]);
        assert_eq!(cli.browser, BrowserKind::Firefox);
        // unknown engines are a usage error, not a fallback
        assert!(Cli::try_parse_from(["bolsa", "--browser", "safari"]).is_err());
    }

    #[test]
    fn test_db_usage_flag_values() {
        let cli = Cli::parse_from(["bolsa", "--db-usage", "no"]);
        assert_eq!(cli.db_usage, DbUsage::No);
        assert!(Cli::try_parse_from(["bolsa", "--db-usage", "maybe"]).is_err());
    }

    #[test]
    fn test_config_validation() {
        let cli = Cli::parse_from(["bolsa", "--base-url", "http://localhost:5000/"]);
        let config = SuiteConfig::from_cli(&cli).unwrap();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert!(config.db_usage);

        let cli = Cli::parse_from(["bolsa", "--base-url", "not a url"]);
        assert!(SuiteConfig::from_cli(&cli).is_err());
    }

    #[test]
    fn test_db_usage_requires_path() {
        let cli = Cli::parse_from(["bolsa", "--db-path", ""]);
        assert!(SuiteConfig::from_cli(&cli).is_err());
        let cli = Cli::parse_from(["bolsa", "--db-path", "", "--db-usage", "no"]);
        assert!(SuiteConfig::from_cli(&cli).is_ok());
    }
}
