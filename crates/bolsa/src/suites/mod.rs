//! Suite definitions, one module per page of the app.
//!
//! Every suite here is pure data over the page objects: setup steps,
//! named checks, teardown steps. [`all`] assembles them with a seeded
//! random source so a run's case tables are reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::SuiteConfig;
use crate::harness::Suite;
use crate::result::BolsaResult;
use crate::session::{register_new_user, remove_user};

pub mod buy;
pub mod common;
pub mod history;
pub mod login;
pub mod portfolio;
pub mod quote;
pub mod register;
pub mod sell;

/// Attach the isolated-user fixture: setup registers a fresh user (and
/// leaves them logged in), teardown deletes their database rows.
pub(crate) fn with_new_user(suite: Suite) -> Suite {
    suite
        .setup(|cx| {
            Box::pin(async move {
                cx.creds = Some(register_new_user(&cx.session).await?);
                Ok(())
            })
        })
        .teardown(|cx| {
            Box::pin(async move {
                if let Some(creds) = cx.creds.clone() {
                    remove_user(&cx.session, &creds).await?;
                }
                Ok(())
            })
        })
}

/// Build every suite of the run, honoring the configured seed and
/// suite-name filter.
pub fn all(config: &SuiteConfig) -> BolsaResult<Vec<Suite>> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut suites = Vec::new();
    suites.extend(common::suites()?);
    suites.extend(login::suites()?);
    suites.extend(register::suites()?);
    suites.extend(quote::suites(&mut rng)?);
    suites.extend(buy::suites(&mut rng)?);
    suites.extend(sell::suites(&mut rng)?);
    suites.extend(portfolio::suites(&mut rng)?);
    suites.extend(history::suites(&mut rng)?);

    if let Some(filter) = &config.filter {
        suites.retain(|s| s.name().contains(filter.as_str()));
    }
    Ok(suites)
}
