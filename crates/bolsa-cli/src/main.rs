//! Suite runner binary.
//!
//! ```bash
//! bolsa --browser=chrome --headless --db-usage=yes --base-url=http://localhost:5000
//! ```
//!
//! Each suite gets its own browser session (and database connection,
//! when enabled), released when the suite finishes regardless of
//! outcome. The exit code reflects whether every suite passed.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bolsa::db::DbQueries;
use bolsa::driver::{into_handle, Driver as _, DriverConfig};
use bolsa::{run_suite, CdpDriver, Cli, Session, SuiteConfig};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = match SuiteConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: SuiteConfig) -> bolsa::BolsaResult<bool> {
    let suites = bolsa::suites::all(&config)?;
    tracing::info!(count = suites.len(), "collected suites");

    let mut all_passed = true;
    let total = suites.len();
    for (index, suite) in suites.into_iter().enumerate() {
        let session = open_session(&config).await?;
        let name = suite.name().to_string();
        tracing::info!("[{}/{total}] {name}", index + 1);
        let report = run_suite(suite, session).await;
        print!("{}", report.render());
        if report.failed() {
            all_passed = false;
        }
    }
    Ok(all_passed)
}

/// One browser session and (optionally) one database connection per
/// suite.
async fn open_session(config: &SuiteConfig) -> bolsa::BolsaResult<Session> {
    let mut driver_config = DriverConfig::new(config.browser).headless(config.headless);
    if let Some(ref binary) = config.browser_binary {
        driver_config = driver_config.executable(binary.clone());
    }
    if config.no_sandbox {
        driver_config = driver_config.no_sandbox();
    }

    let mut driver = CdpDriver::launch(driver_config).await?;
    driver.maximize().await?;
    let db = if config.db_usage {
        let db = DbQueries::open(&config.db_path)?;
        db.ensure_schema()?;
        Some(db)
    } else {
        None
    };
    Ok(Session::new(into_handle(driver), db, config.clone()))
}
