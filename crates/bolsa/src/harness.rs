//! Suite harness: named checks with per-suite setup/teardown, tag-based
//! skipping, and guaranteed resource release.
//!
//! A [`Suite`] is built once (possibly one per generated case, see
//! [`expand_suites`]) and run against a fresh [`Session`]. Teardown
//! steps run on every exit path, including setup failure — the browser
//! and database are scoped acquisitions, not leaks waiting to happen.

use std::time::{Duration, Instant};

use futures::future::LocalBoxFuture;
use serde::Serialize;

use crate::casegen::{expand, CaseTable, GeneratedCase};
use crate::config::SuiteConfig;
use crate::driver::BrowserKind;
use crate::result::BolsaResult;
use crate::session::{Credentials, Session};

/// Suite/check tags consumed by the skip logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Run only under the Gecko engine
    FirefoxOnly,
    /// Run only under the Chromium engine
    ChromeOnly,
    /// Requires database access
    DbReliant,
}

/// Mutable context threaded through every step of a suite run.
pub struct RunCx {
    /// The suite's session
    pub session: Session,
    /// Bound case values, for generated suites
    pub case: Option<GeneratedCase>,
    /// Credentials of the suite's isolated user, once a setup step
    /// created one
    pub creds: Option<Credentials>,
}

impl std::fmt::Debug for RunCx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunCx")
            .field("session", &self.session)
            .field("case", &self.case)
            .finish_non_exhaustive()
    }
}

impl RunCx {
    /// Case binding rendered as input text; empty when the suite is not
    /// case-generated or the parameter is unknown.
    #[must_use]
    pub fn case_input(&self, param: &str) -> String {
        self.case.as_ref().map(|c| c.input(param)).unwrap_or_default()
    }

    /// The case label, when case-generated.
    #[must_use]
    pub fn case_label(&self) -> String {
        self.case.as_ref().map(GeneratedCase::label).unwrap_or_default()
    }

    /// Credentials of the isolated user; fails the check when no setup
    /// step created one.
    pub fn creds(&self) -> BolsaResult<&Credentials> {
        self.creds
            .as_ref()
            .ok_or_else(|| crate::result::BolsaError::check("no user was set up for this suite"))
    }
}

type StepFn = Box<dyn for<'a> FnMut(&'a mut RunCx) -> LocalBoxFuture<'a, BolsaResult<()>>>;

/// Wrap an async closure into a boxed step.
fn boxed<F>(f: F) -> StepFn
where
    F: for<'a> FnMut(&'a mut RunCx) -> LocalBoxFuture<'a, BolsaResult<()>> + 'static,
{
    Box::new(f)
}

/// One named check.
pub struct Check {
    name: String,
    tags: Vec<Tag>,
    xfail: Option<String>,
    run: StepFn,
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("xfail", &self.xfail)
            .finish_non_exhaustive()
    }
}

impl Check {
    /// Create a check from a name and an async closure.
    ///
    /// Call sites box the future: `check("x", |cx| Box::pin(async move { .. }))`.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: for<'a> FnMut(&'a mut RunCx) -> LocalBoxFuture<'a, BolsaResult<()>> + 'static,
    {
        Self {
            name: name.into(),
            tags: Vec::new(),
            xfail: None,
            run: boxed(f),
        }
    }

    /// Add a tag.
    #[must_use]
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Mark the check as expected to fail, with a reason.
    #[must_use]
    pub fn xfail(mut self, reason: impl Into<String>) -> Self {
        self.xfail = Some(reason.into());
        self
    }
}

/// Shorthand for [`Check::new`].
pub fn check<F>(name: impl Into<String>, f: F) -> Check
where
    F: for<'a> FnMut(&'a mut RunCx) -> LocalBoxFuture<'a, BolsaResult<()>> + 'static,
{
    Check::new(name, f)
}

/// A named suite: setup steps, checks, teardown steps, tags.
pub struct Suite {
    name: String,
    tags: Vec<Tag>,
    setup: Vec<StepFn>,
    teardown: Vec<StepFn>,
    checks: Vec<Check>,
    case: Option<GeneratedCase>,
}

impl std::fmt::Debug for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("checks", &self.checks.len())
            .finish_non_exhaustive()
    }
}

impl Suite {
    /// Create an empty suite.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            setup: Vec::new(),
            teardown: Vec::new(),
            checks: Vec::new(),
            case: None,
        }
    }

    /// Suite name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound case, for generated suites.
    #[must_use]
    pub fn case(&self) -> Option<&GeneratedCase> {
        self.case.as_ref()
    }

    /// Add a tag.
    #[must_use]
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Add a setup step; steps run in order, once per suite run.
    #[must_use]
    pub fn setup<F>(mut self, f: F) -> Self
    where
        F: for<'a> FnMut(&'a mut RunCx) -> LocalBoxFuture<'a, BolsaResult<()>> + 'static,
    {
        self.setup.push(boxed(f));
        self
    }

    /// Add a teardown step; teardown runs on every exit path.
    #[must_use]
    pub fn teardown<F>(mut self, f: F) -> Self
    where
        F: for<'a> FnMut(&'a mut RunCx) -> LocalBoxFuture<'a, BolsaResult<()>> + 'static,
    {
        self.teardown.push(boxed(f));
        self
    }

    /// Add a check.
    #[must_use]
    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    /// Number of checks.
    #[must_use]
    pub fn check_count(&self) -> usize {
        self.checks.len()
    }
}

/// Expand a case table into one independent suite per row.
///
/// `build` receives each generated case and produces the suite body;
/// the harness renames the suite to the generated case name and bakes
/// the case into its run context, so per-case setup/teardown runs once
/// per case.
pub fn expand_suites<F>(
    template: &str,
    strip_prefix: &str,
    table: &CaseTable,
    build: F,
) -> BolsaResult<Vec<Suite>>
where
    F: Fn(&GeneratedCase) -> Suite,
{
    let cases = expand(template, strip_prefix, table)?;
    Ok(cases
        .into_iter()
        .map(|case| {
            let mut suite = build(&case);
            suite.name = case.name().to_string();
            suite.case = Some(case);
            suite
        })
        .collect())
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Status {
    /// Check passed
    Passed,
    /// Check failed (assertion)
    Failed(String),
    /// Skipped, with a reason
    Skipped(String),
    /// Failed as expected
    Xfailed(String),
    /// Passed although marked as expected to fail
    Xpassed,
}

/// Result of one check run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Check name
    pub name: String,
    /// Outcome
    pub status: Status,
    /// Wall-clock duration
    pub duration: Duration,
}

/// Result of one suite run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// Suite name
    pub suite: String,
    /// Per-check results
    pub results: Vec<CheckResult>,
    /// Setup failure, when the suite never got to its checks
    pub setup_error: Option<String>,
    /// Teardown failures (the run still counts, but these are reported)
    pub teardown_errors: Vec<String>,
}

impl SuiteReport {
    /// True when anything went wrong.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.setup_error.is_some()
            || self
                .results
                .iter()
                .any(|r| matches!(r.status, Status::Failed(_)))
    }

    /// (passed, failed, skipped, xfailed, xpassed) counts.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0, 0);
        for result in &self.results {
            match result.status {
                Status::Passed => counts.0 += 1,
                Status::Failed(_) => counts.1 += 1,
                Status::Skipped(_) => counts.2 += 1,
                Status::Xfailed(_) => counts.3 += 1,
                Status::Xpassed => counts.4 += 1,
            }
        }
        counts
    }

    /// Plain-text rendering.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("suite {}\n", self.suite);
        if let Some(ref error) = self.setup_error {
            out.push_str(&format!("  SETUP FAILED: {error}\n"));
        }
        for result in &self.results {
            let line = match &result.status {
                Status::Passed => format!("  ok      {}", result.name),
                Status::Failed(msg) => format!("  FAILED  {} - {msg}", result.name),
                Status::Skipped(reason) => format!("  skipped {} ({reason})", result.name),
                Status::Xfailed(reason) => format!("  xfail   {} ({reason})", result.name),
                Status::Xpassed => format!("  XPASS   {}", result.name),
            };
            out.push_str(&line);
            out.push('\n');
        }
        for error in &self.teardown_errors {
            out.push_str(&format!("  teardown error: {error}\n"));
        }
        out
    }

    /// Machine-readable rendering, for report files.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Skip reason for a tag set under the active config, when one applies.
#[must_use]
pub fn skip_reason(tags: &[Tag], config: &SuiteConfig) -> Option<String> {
    for tag in tags {
        match tag {
            Tag::FirefoxOnly if config.browser != BrowserKind::Firefox => {
                return Some("this check is for the Firefox browser".to_string());
            }
            Tag::ChromeOnly if config.browser != BrowserKind::Chrome => {
                return Some("this check is for the Chrome browser".to_string());
            }
            Tag::DbReliant if !config.db_usage => {
                return Some("database access is disabled (--db-usage=no)".to_string());
            }
            _ => {}
        }
    }
    None
}

/// Run one suite against a session. Consumes the session and closes it
/// on every exit path.
pub async fn run_suite(mut suite: Suite, session: Session) -> SuiteReport {
    let config = session.config.clone();
    let mut cx = RunCx {
        session,
        case: suite.case.clone(),
        creds: None,
    };
    let mut report = SuiteReport {
        suite: suite.name.clone(),
        results: Vec::new(),
        setup_error: None,
        teardown_errors: Vec::new(),
    };

    let suite_skip = skip_reason(&suite.tags, &config);
    if let Some(reason) = suite_skip {
        for check in &suite.checks {
            report.results.push(CheckResult {
                name: check.name.clone(),
                status: Status::Skipped(reason.clone()),
                duration: Duration::ZERO,
            });
        }
    } else {
        tracing::info!(suite = %suite.name, "running suite");
        let mut setup_ok = true;
        for step in &mut suite.setup {
            if let Err(e) = step(&mut cx).await {
                report.setup_error = Some(e.to_string());
                setup_ok = false;
                break;
            }
        }

        if setup_ok {
            for check in &mut suite.checks {
                if let Some(reason) = skip_reason(&check.tags, &config) {
                    report.results.push(CheckResult {
                        name: check.name.clone(),
                        status: Status::Skipped(reason),
                        duration: Duration::ZERO,
                    });
                    continue;
                }
                let start = Instant::now();
                let outcome = (check.run)(&mut cx).await;
                let status = match (outcome, &check.xfail) {
                    (Ok(()), None) => Status::Passed,
                    (Ok(()), Some(_)) => Status::Xpassed,
                    (Err(e), None) => Status::Failed(e.to_string()),
                    (Err(_), Some(reason)) => Status::Xfailed(reason.clone()),
                };
                if let Status::Failed(ref msg) = status {
                    tracing::warn!(suite = %suite.name, check = %check.name, %msg, "check failed");
                }
                report.results.push(CheckResult {
                    name: check.name.clone(),
                    status,
                    duration: start.elapsed(),
                });
            }
        }

        // teardown runs even after a setup failure: whatever was
        // acquired must be released
        for step in &mut suite.teardown {
            if let Err(e) = step(&mut cx).await {
                tracing::warn!(suite = %suite.name, error = %e, "teardown step failed");
                report.teardown_errors.push(e.to_string());
            }
        }
    }

    if let Err(e) = cx.session.close().await {
        tracing::warn!(suite = %suite.name, error = %e, "session close failed");
        report.teardown_errors.push(e.to_string());
    }
    report
}
