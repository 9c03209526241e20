//! Result and error types for Bolsa.

use thiserror::Error;

/// Result type for Bolsa operations
pub type BolsaResult<T> = Result<T, BolsaError>;

/// Errors that can occur in Bolsa.
///
/// Expected absence (an element or row not appearing within its bounded
/// wait) is **not** an error anywhere in this crate; it is modelled as
/// `None`/`false` at the page-object boundary. These variants cover
/// infrastructure failures and broken suite definitions only.
#[derive(Debug, Error)]
pub enum BolsaError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Driver-level failure (lost session, protocol error, ...)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Script evaluation failure
    #[error("Script evaluation failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Input simulation failure
    #[error("Input simulation failed: {message}")]
    Input {
        /// Error message
        message: String,
    },

    /// A stale handle was used after navigation invalidated it
    #[error("Stale element handle: {id}")]
    StaleHandle {
        /// Handle id
        id: String,
    },

    /// Database connectivity failure when DB usage was requested
    #[error(
        "Database unavailable at {path}: {message}. \
         Check database access or rerun with --db-usage=no"
    )]
    DatabaseUnavailable {
        /// Database path
        path: String,
        /// Error message
        message: String,
    },

    /// Database query failure
    #[error("Database query failed: {message}")]
    Database {
        /// Error message
        message: String,
    },

    /// Case expansion arity mismatch: a row's value count does not match
    /// the declared parameter list. A broken suite definition, not a
    /// runtime condition; fails suite construction outright.
    #[error(
        "Case table arity mismatch in row {row}: expected {expected} values \
         for parameters ({params}), got {got}"
    )]
    CaseArity {
        /// Row index in the case table
        row: usize,
        /// Declared parameter count
        expected: usize,
        /// Actual value count
        got: usize,
        /// Parameter list as declared
        params: String,
    },

    /// Two case rows expanded to the same generated name; one would
    /// silently shadow the other.
    #[error("Duplicate generated case name: {name}")]
    DuplicateCase {
        /// Colliding name
        name: String,
    },

    /// Configuration error (bad flag value, missing base URL, ...)
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A suite check failed; the message embeds expected and actual.
    #[error("{message}")]
    Check {
        /// Failure description
        message: String,
    },
}

impl BolsaError {
    /// Shorthand for a driver error with a message.
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Shorthand for a script error with a message.
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Shorthand for a failed check.
    pub fn check(message: impl Into<String>) -> Self {
        Self::Check {
            message: message.into(),
        }
    }
}

/// Fail a check unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> BolsaResult<()> {
    if condition {
        Ok(())
    } else {
        Err(BolsaError::check(message))
    }
}
