//! Database query façade.
//!
//! Wraps a single-thread-owned sqlite connection (autocommit, as the
//! suite has always run it) and normalizes query results into
//! zero/one/many. Carries the named queries the suites cross-check
//! scraped page state against.
//!
//! A user's net position in a symbol is `SUM(amount)` grouped by symbol;
//! selling records a negative amount at the sale price.

use std::collections::HashMap;

use rusqlite::types::{ToSql, Value};
use rusqlite::Connection;

use crate::result::{BolsaError, BolsaResult};
use crate::scrape::CellValue;
use crate::verify::round2;

/// One result row, addressable by column name.
#[derive(Debug, Clone)]
pub struct DbRow {
    columns: HashMap<String, Value>,
}

impl DbRow {
    /// Raw value of a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Column as text.
    #[must_use]
    pub fn text(&self, column: &str) -> Option<String> {
        match self.columns.get(column)? {
            Value::Text(t) => Some(t.clone()),
            _ => None,
        }
    }

    /// Column as integer.
    #[must_use]
    pub fn int(&self, column: &str) -> Option<i64> {
        match self.columns.get(column)? {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Column as float (integers widen).
    #[must_use]
    pub fn number(&self, column: &str) -> Option<f64> {
        match self.columns.get(column)? {
            Value::Integer(n) => Some(*n as f64),
            Value::Real(x) => Some(*x),
            _ => None,
        }
    }

    /// Render the row as typed cells for comparison against a scraped
    /// table row: integers stay integers, reals become 2-decimal
    /// currency amounts, text stays text.
    #[must_use]
    pub fn to_cells(&self) -> HashMap<String, CellValue> {
        self.columns
            .iter()
            .map(|(k, v)| {
                let cell = match v {
                    Value::Integer(n) => CellValue::Int(*n),
                    Value::Real(x) => CellValue::Currency(round2(*x)),
                    Value::Text(t) => CellValue::Text(t.clone()),
                    Value::Null => CellValue::Text(String::new()),
                    Value::Blob(b) => CellValue::Text(format!("<{} bytes>", b.len())),
                };
                (k.clone(), cell)
            })
            .collect()
    }
}

/// Normalized query result: zero rows, exactly one, or many.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// No rows matched
    Empty,
    /// Exactly one row
    One(DbRow),
    /// More than one row
    Many(Vec<DbRow>),
}

impl QueryOutcome {
    /// The single row, when there is exactly one.
    #[must_use]
    pub fn row(&self) -> Option<&DbRow> {
        match self {
            Self::One(row) => Some(row),
            _ => None,
        }
    }

    /// All rows, empty for `Empty`.
    #[must_use]
    pub fn rows(&self) -> Vec<&DbRow> {
        match self {
            Self::Empty => Vec::new(),
            Self::One(row) => vec![row],
            Self::Many(rows) => rows.iter().collect(),
        }
    }

    /// True when no rows matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Row count.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::Many(rows) => rows.len(),
        }
    }
}

/// Query façade over the app's (or the mock) database.
#[derive(Debug)]
pub struct DbQueries {
    conn: Connection,
}

impl DbQueries {
    /// Open the database at `path`.
    ///
    /// Fails immediately with a remediation hint when the file cannot be
    /// opened — the caller asked for DB-reliant assertions, so a missing
    /// database is a setup error, not something to limp past.
    pub fn open(path: &str) -> BolsaResult<Self> {
        let conn = Connection::open(path).map_err(|e| BolsaError::DatabaseUnavailable {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { conn })
    }

    /// In-memory database, for tests.
    pub fn open_in_memory() -> BolsaResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| BolsaError::Database {
            message: e.to_string(),
        })?;
        Ok(Self { conn })
    }

    /// Create the mock schema when absent.
    pub fn ensure_schema(&self) -> BolsaResult<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                     id INTEGER PRIMARY KEY AUTOINCREMENT,
                     username TEXT NOT NULL UNIQUE,
                     password_hash TEXT NOT NULL,
                     cash NUMERIC NOT NULL DEFAULT 10000.00
                 );
                 CREATE TABLE IF NOT EXISTS purchases (
                     id INTEGER PRIMARY KEY AUTOINCREMENT,
                     user_id INTEGER NOT NULL,
                     stockname TEXT NOT NULL,
                     amount INTEGER NOT NULL,
                     price NUMERIC NOT NULL,
                     timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
                     FOREIGN KEY (user_id) REFERENCES users (id)
                 );",
            )
            .map_err(|e| BolsaError::Database {
                message: e.to_string(),
            })
    }

    /// Execute a parameterized query, normalizing the result set.
    pub fn query(&self, sql: &str, params: &[&dyn ToSql]) -> BolsaResult<QueryOutcome> {
        let mut stmt = self.conn.prepare(sql).map_err(|e| BolsaError::Database {
            message: e.to_string(),
        })?;
        let names: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();
        let mut rows = stmt.query(params).map_err(|e| BolsaError::Database {
            message: e.to_string(),
        })?;

        let mut collected = Vec::new();
        loop {
            let row = rows.next().map_err(|e| BolsaError::Database {
                message: e.to_string(),
            })?;
            let Some(row) = row else { break };
            let mut columns = HashMap::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                let value: Value = row.get(i).map_err(|e| BolsaError::Database {
                    message: e.to_string(),
                })?;
                let _ = columns.insert(name.clone(), value);
            }
            collected.push(DbRow { columns });
        }

        Ok(match collected.len() {
            0 => QueryOutcome::Empty,
            1 => QueryOutcome::One(collected.remove(0)),
            _ => QueryOutcome::Many(collected),
        })
    }

    //
    // Named queries used across the suites
    //

    /// Insert a user with a hashed password into the mock users table.
    pub fn add_user(&self, username: &str, password_hash: &str) -> BolsaResult<()> {
        let _ = self.query(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2);",
            &[&username, &password_hash],
        )?;
        Ok(())
    }

    /// Record a transaction for a user. Symbols are stored uppercase.
    pub fn add_transaction(
        &self,
        username: &str,
        symbol: &str,
        amount: i64,
        price: f64,
    ) -> BolsaResult<()> {
        let symbol = symbol.to_uppercase();
        let _ = self.query(
            "INSERT INTO purchases (user_id, stockname, amount, price)
             VALUES ((SELECT id FROM users WHERE username = ?1), ?2, ?3, ?4);",
            &[&username, &symbol, &amount, &price],
        )?;
        Ok(())
    }

    /// Adjust a user's cash by `delta`.
    pub fn change_cash_by(&self, username: &str, delta: f64) -> BolsaResult<()> {
        let cash = self.user_cash(username)?;
        let updated = round2(cash + delta);
        let _ = self.query(
            "UPDATE users SET cash = ?1 WHERE username = ?2;",
            &[&updated, &username],
        )?;
        Ok(())
    }

    /// Delete every transaction of a user (teardown).
    pub fn delete_transactions(&self, username: &str) -> BolsaResult<()> {
        let _ = self.query(
            "DELETE FROM purchases
             WHERE user_id IN (SELECT id FROM users WHERE username = ?1);",
            &[&username],
        )?;
        Ok(())
    }

    /// Delete a user's row (teardown).
    pub fn delete_user(&self, username: &str) -> BolsaResult<()> {
        let _ = self.query("DELETE FROM users WHERE username = ?1;", &[&username])?;
        Ok(())
    }

    /// The user's row, when present.
    pub fn user_row(&self, username: &str) -> BolsaResult<Option<DbRow>> {
        Ok(self
            .query("SELECT * FROM users WHERE username = ?1;", &[&username])?
            .row()
            .cloned())
    }

    /// Net positions: symbol, summed amount, weighted average price,
    /// for symbols still held.
    pub fn possessed_stocks(&self, username: &str) -> BolsaResult<Vec<DbRow>> {
        Ok(self
            .query(
                "SELECT stockname,
                        SUM(amount) AS amount,
                        ROUND(SUM(price * amount) / SUM(amount), 2) AS price
                 FROM purchases p JOIN users u ON u.id = p.user_id
                 WHERE u.username = ?1
                 GROUP BY stockname HAVING SUM(amount) > 0;",
                &[&username],
            )?
            .rows()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Symbols of currently held stocks.
    pub fn possessed_stock_names(&self, username: &str) -> BolsaResult<Vec<String>> {
        Ok(self
            .query(
                "SELECT DISTINCT stockname
                 FROM purchases p JOIN users u ON p.user_id = u.id
                 WHERE u.username = ?1
                 GROUP BY p.stockname HAVING SUM(p.amount) > 0;",
                &[&username],
            )?
            .rows()
            .into_iter()
            .filter_map(|r| r.text("stockname"))
            .collect())
    }

    /// Every transaction of a user, oldest first.
    pub fn transactions(&self, username: &str) -> BolsaResult<Vec<DbRow>> {
        Ok(self
            .query(
                "SELECT stockname, amount, price, timestamp
                 FROM purchases p JOIN users u ON u.id = p.user_id
                 WHERE u.username = ?1
                 ORDER BY timestamp;",
                &[&username],
            )?
            .rows()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Most recent transaction of a user.
    pub fn last_transaction(&self, username: &str) -> BolsaResult<Option<DbRow>> {
        Ok(self
            .query(
                "SELECT stockname, amount, price, timestamp
                 FROM purchases p JOIN users u ON u.id = p.user_id
                 WHERE u.username = ?1
                 ORDER BY timestamp DESC, id DESC LIMIT 1;",
                &[&username],
            )?
            .row()
            .cloned())
    }

    /// Total spent across all of a user's transactions, or `None` when
    /// there are none.
    pub fn stock_total(&self, username: &str) -> BolsaResult<Option<f64>> {
        let outcome = self.query(
            "SELECT ROUND(SUM(amount * price), 2) AS amount_x_price
             FROM purchases p JOIN users u ON u.id = p.user_id
             WHERE u.username = ?1;",
            &[&username],
        )?;
        Ok(outcome.row().and_then(|r| r.number("amount_x_price")))
    }

    /// Current cash, rounded to 2 decimals.
    pub fn user_cash(&self, username: &str) -> BolsaResult<f64> {
        self.query(
            "SELECT cash FROM users WHERE username = ?1;",
            &[&username],
        )?
        .row()
        .and_then(|r| r.number("cash"))
        .map(round2)
        .ok_or_else(|| BolsaError::Database {
            message: format!("no such user: {username}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_user(username: &str) -> DbQueries {
        let db = DbQueries::open_in_memory().unwrap();
        db.ensure_schema().unwrap();
        db.add_user(username, "sha256$00$stub").unwrap();
        db
    }

    mod open_tests {
        use super::*;

        #[test]
        fn test_open_creates_file_database() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("mock.db");
            let db = DbQueries::open(path.to_str().unwrap()).unwrap();
            db.ensure_schema().unwrap();
            db.add_user("ana", "sha256$00$stub").unwrap();
            assert!(db.user_row("ana").unwrap().is_some());
        }

        #[test]
        fn test_unopenable_path_carries_remediation_hint() {
            let err = DbQueries::open("/definitely/missing/dir/mock.db").unwrap_err();
            let rendered = err.to_string();
            assert!(rendered.contains("/definitely/missing/dir/mock.db"));
            assert!(rendered.contains("--db-usage=no"));
        }
    }

    mod normalization_tests {
        use super::*;

        #[test]
        fn test_zero_one_many() {
            let db = db_with_user("ana");
            db.add_transaction("ana", "AAPL", 1, 100.0).unwrap();
            db.add_transaction("ana", "MSFT", 2, 200.0).unwrap();

            let none = db
                .query("SELECT * FROM users WHERE username = 'nobody';", &[])
                .unwrap();
            assert!(none.is_empty());
            assert_eq!(none.len(), 0);

            let one = db
                .query("SELECT * FROM users WHERE username = 'ana';", &[])
                .unwrap();
            assert!(one.row().is_some());
            assert_eq!(one.len(), 1);

            let many = db.query("SELECT * FROM purchases;", &[]).unwrap();
            assert_eq!(many.len(), 2);
            assert!(many.row().is_none());
        }
    }

    mod position_tests {
        use super::*;

        #[test]
        fn test_net_position_sums_signed_amounts() {
            let db = db_with_user("ana");
            db.add_transaction("ana", "AAPL", 5, 100.0).unwrap();
            db.add_transaction("ana", "AAPL", -2, 110.0).unwrap();

            let stocks = db.possessed_stocks("ana").unwrap();
            assert_eq!(stocks.len(), 1);
            assert_eq!(stocks[0].text("stockname").as_deref(), Some("AAPL"));
            assert_eq!(stocks[0].int("amount"), Some(3));
        }

        #[test]
        fn test_sold_out_position_disappears() {
            let db = db_with_user("ana");
            db.add_transaction("ana", "NFLX", 4, 50.0).unwrap();
            db.add_transaction("ana", "NFLX", -4, 55.0).unwrap();
            assert!(db.possessed_stocks("ana").unwrap().is_empty());
            assert!(db.possessed_stock_names("ana").unwrap().is_empty());
        }

        #[test]
        fn test_symbols_stored_uppercase() {
            let db = db_with_user("ana");
            db.add_transaction("ana", "aapl", 1, 100.0).unwrap();
            assert_eq!(db.possessed_stock_names("ana").unwrap(), ["AAPL"]);
        }
    }

    mod cash_tests {
        use super::*;

        #[test]
        fn test_initial_cash_default() {
            let db = db_with_user("ana");
            assert_eq!(db.user_cash("ana").unwrap(), 10000.0);
        }

        #[test]
        fn test_change_cash_by() {
            let db = db_with_user("ana");
            db.change_cash_by("ana", -777.77).unwrap();
            assert_eq!(db.user_cash("ana").unwrap(), 9222.23);
        }

        #[test]
        fn test_unknown_user_cash_is_error() {
            let db = db_with_user("ana");
            assert!(db.user_cash("nobody").is_err());
        }
    }

    mod history_tests {
        use super::*;

        #[test]
        fn test_stock_total() {
            let db = db_with_user("ana");
            db.add_transaction("ana", "AAPL", 2, 100.50).unwrap();
            db.add_transaction("ana", "MSFT", 1, 10.25).unwrap();
            assert_eq!(db.stock_total("ana").unwrap(), Some(211.25));
            assert_eq!(db.stock_total("nobody").unwrap(), None);
        }

        #[test]
        fn test_last_transaction() {
            let db = db_with_user("ana");
            db.add_transaction("ana", "AAPL", 1, 100.0).unwrap();
            db.add_transaction("ana", "MSFT", 2, 200.0).unwrap();
            let last = db.last_transaction("ana").unwrap().unwrap();
            assert_eq!(last.text("stockname").as_deref(), Some("MSFT"));
        }

        #[test]
        fn test_teardown_removes_everything() {
            let db = db_with_user("ana");
            db.add_transaction("ana", "AAPL", 1, 100.0).unwrap();
            db.delete_transactions("ana").unwrap();
            db.delete_user("ana").unwrap();
            assert!(db.user_row("ana").unwrap().is_none());
            assert!(db.transactions("ana").unwrap().is_empty());
        }
    }

    mod cell_conversion_tests {
        use super::*;
        use crate::scrape::CellValue;

        #[test]
        fn test_to_cells_typing() {
            let db = db_with_user("ana");
            db.add_transaction("ana", "AAPL", 3, 150.456).unwrap();
            let stocks = db.possessed_stocks("ana").unwrap();
            let cells = stocks[0].to_cells();
            assert_eq!(cells["stockname"], CellValue::Text("AAPL".to_string()));
            assert_eq!(cells["amount"], CellValue::Int(3));
            assert_eq!(cells["price"], CellValue::Currency(150.46));
        }
    }
}
