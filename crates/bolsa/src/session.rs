//! Session: the scoped browser + database pair one suite runs against.
//!
//! One driver and (optionally) one database connection are acquired per
//! suite and released on every exit path; the harness owns the
//! guaranteed-release part, this module owns the resources and the
//! user-isolation fixtures.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::SuiteConfig;
use crate::db::DbQueries;
use crate::driver::{Driver as _, DriverHandle};
use crate::pages::{LoginPage, RegisterPage, Urls};
use crate::result::{BolsaError, BolsaResult};

/// A fresh (username, password) pair for one isolated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Unique username
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Generate credentials with a unique username.
    ///
    /// The uuid suffix keeps concurrent runs against a shared deployment
    /// from colliding on the users table.
    #[must_use]
    pub fn fresh() -> Self {
        Self {
            username: format!("test-user-{}", Uuid::new_v4()),
            password: "P4$$word".to_string(),
        }
    }
}

/// Salted sha256 hash in the mock users table format.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("sha256${salt}${}", hex::encode(hasher.finalize()))
}

/// The resources one suite runs against.
pub struct Session {
    /// Shared browser driver
    pub driver: DriverHandle,
    /// Database façade, when DB usage is configured
    pub db: Option<DbQueries>,
    /// Endpoint table of the app under test
    pub urls: Urls,
    /// Active configuration
    pub config: SuiteConfig,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("urls", &self.urls)
            .field("db", &self.db.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Assemble a session from its parts.
    #[must_use]
    pub fn new(driver: DriverHandle, db: Option<DbQueries>, config: SuiteConfig) -> Self {
        let urls = Urls::new(&config.base_url);
        Self {
            driver,
            db,
            urls,
            config,
        }
    }

    /// Quit the browser and drop the database connection.
    pub async fn close(&mut self) -> BolsaResult<()> {
        let result = self.driver.lock().await.close().await;
        self.db = None;
        result
    }

    /// A base page bound to an arbitrary URL.
    #[must_use]
    pub fn page_at(&self, url: impl Into<String>) -> crate::page::Page {
        crate::page::Page::new(self.driver.clone(), url)
    }

    /// The Log in page.
    #[must_use]
    pub fn login_page(&self) -> LoginPage {
        LoginPage::new(self.driver.clone(), &self.urls)
    }

    /// The Register page.
    #[must_use]
    pub fn register_page(&self) -> RegisterPage {
        RegisterPage::new(self.driver.clone(), &self.urls)
    }

    /// The Quote page.
    #[must_use]
    pub fn quote_page(&self) -> crate::pages::QuotePage {
        crate::pages::QuotePage::new(self.driver.clone(), &self.urls)
    }

    /// The Buy page.
    #[must_use]
    pub fn buy_page(&self) -> crate::pages::BuyPage {
        crate::pages::BuyPage::new(self.driver.clone(), &self.urls)
    }

    /// The Sell page.
    #[must_use]
    pub fn sell_page(&self) -> crate::pages::SellPage {
        crate::pages::SellPage::new(self.driver.clone(), &self.urls)
    }

    /// The Portfolio (default route) page.
    #[must_use]
    pub fn portfolio_page(&self) -> crate::pages::PortfolioPage {
        crate::pages::PortfolioPage::new(self.driver.clone(), &self.urls)
    }

    /// The History page.
    #[must_use]
    pub fn history_page(&self) -> crate::pages::HistoryPage {
        crate::pages::HistoryPage::new(self.driver.clone(), &self.urls)
    }
}

/// Register a brand-new user through the UI and mirror it into the mock
/// database when one is attached. Fails when the app does not redirect
/// to the default page afterwards.
pub async fn register_new_user(session: &Session) -> BolsaResult<Credentials> {
    let creds = Credentials::fresh();
    let register = RegisterPage::new(session.driver.clone(), &session.urls);
    register.open().await?;
    register
        .register_new_user(&creds.username, &creds.password, None)
        .await?;

    if let Some(db) = &session.db {
        db.add_user(&creds.username, &hash_password(&creds.password))?;
    }

    if !register.wait_for_url(&session.urls.default_page()).await? {
        return Err(BolsaError::driver(
            "something went wrong during the registration process",
        ));
    }
    tracing::debug!(username = %creds.username, "registered isolated user");
    Ok(creds)
}

/// Delete every database row associated with a user: transactions
/// first, then the user row.
pub async fn remove_user(session: &Session, creds: &Credentials) -> BolsaResult<()> {
    if let Some(db) = &session.db {
        db.delete_transactions(&creds.username)?;
        db.delete_user(&creds.username)?;
    }
    Ok(())
}

/// Log a user in through the UI.
pub async fn log_in(session: &Session, creds: &Credentials) -> BolsaResult<()> {
    let login = LoginPage::new(session.driver.clone(), &session.urls);
    login.open().await?;
    login.log_in_with(&creds.username, &creds.password).await
}

/// Log out by navigating the logout route.
pub async fn log_out(session: &Session) -> BolsaResult<()> {
    session
        .driver
        .lock()
        .await
        .navigate(&session.urls.logout())
        .await
}

/// Seed a position directly in the database: a purchase transaction
/// plus the matching cash decrease.
pub async fn seed_position(
    session: &Session,
    creds: &Credentials,
    symbol: &str,
    amount: i64,
    price: f64,
) -> BolsaResult<()> {
    let Some(db) = &session.db else {
        return Err(BolsaError::Database {
            message: "seeding a position requires database access".to_string(),
        });
    };
    db.add_transaction(&creds.username, symbol, amount, price)?;
    db.change_cash_by(&creds.username, -(amount as f64 * price))?;
    Ok(())
}
