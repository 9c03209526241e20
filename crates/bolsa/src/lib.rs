//! Bolsa: end-to-end UI test suite for a stock-trading web app.
//!
//! The suite drives a browser through page objects, reads rendered DOM
//! state back out through typed table scraping, and cross-checks it
//! against the app's relational store.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  suites (data: setup / checks / teardown)                     │
//! │     │                                                         │
//! │  harness ──► pages (LoginPage, BuyPage, ...) ──► page (base)  │
//! │     │                                             │           │
//! │     └──► db façade (sqlite)          driver capability (CDP   │
//! │                                      or scripted mock)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Absence is never an exception here: a lookup that times out is
//! `None`, a URL that never changes is `false`, and the suites assert
//! on those outcomes directly.

#![warn(missing_docs)]

/// Data-driven case expansion: tables of values into independent,
/// per-case-fixtured suites.
pub mod casegen;
/// Runtime configuration and the CLI surface.
pub mod config;
/// Expected values and case-table factories.
pub mod constants;
/// Database query façade over sqlite.
pub mod db;
/// Abstract browser capability and its configuration.
pub mod driver;
/// Suite harness: checks, tags, skipping, guaranteed teardown.
pub mod harness;
/// Locator types.
pub mod locator;
/// Scripted in-memory driver for unit testing.
pub mod mock;
/// Page-object base.
pub mod page;
/// Page objects for every screen of the app.
pub mod pages;
mod result;
/// Table scraping into typed rows.
pub mod scrape;
/// Browser/database session and user-isolation fixtures.
pub mod session;
/// The suite definitions themselves.
pub mod suites;
/// Verification helpers: parsing, decoding, comparing.
pub mod verify;

/// CDP driver implementation (requires the `browser` feature).
#[cfg(feature = "browser")]
pub mod browser;

pub use config::{Cli, SuiteConfig};
pub use driver::{BrowserKind, Driver, DriverConfig, DriverHandle, ElementHandle};
pub use harness::{run_suite, Suite, SuiteReport, Tag};
pub use page::Page;
pub use result::{ensure, BolsaError, BolsaResult};
pub use session::{Credentials, Session};

#[cfg(feature = "browser")]
pub use browser::CdpDriver;
