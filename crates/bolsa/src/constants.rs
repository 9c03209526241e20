//! Expected values and case tables shared among the suites.
//!
//! Tables whose rows embed randomness are factory functions taking an
//! injected `Rng`, so a run is reproducible from its seed instead of
//! depending on ambient module-load randomness.
//!
//! Some checks reference specific rows by position, so new cases go to
//! the END of each table.

use chrono::Local;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::casegen::CaseTable;
use crate::row;

/// Small list of valid stock symbols the app always quotes.
pub const TEST_SYMBOLS: [&str; 4] = ["AAPL", "MSFT", "NFLX", "MCD"];

/// Initial cash value for a newly registered user.
pub const INITIAL_CASH: f64 = 10000.00;

/// Mock value for a stock price.
pub const MOCK_PRICE: f64 = 777.77;

fn pick_symbol(rng: &mut impl Rng) -> &'static str {
    TEST_SYMBOLS.choose(rng).copied().unwrap_or("AAPL")
}

/// Invalid stock-symbol inputs (quote and buy pages).
pub fn invalid_symbol_cases(rng: &mut impl Rng) -> CaseTable {
    let digits = rng.gen_range(1..=999_i64);
    let float_symbol = f64::from(rng.gen_range(1..=99_i32)) / 10.0 + 0.1;
    let comma_symbol = format!("{float_symbol:.1}").replace('.', ",");
    let date = Local::now().format("%d.%m.%Y").to_string();
    CaseTable::new(
        "symbol, case",
        vec![
            row!["", "Empty stock symbol"],
            row![" ", "White-space stock symbol (one)"],
            row!["   ", "White-space stock symbol (few)"],
            row![digits, "Digits only stock symbol"],
            row![0, "Zero stock symbol"],
            row![format!("{float_symbol:.1}"), "Floating point number stock symbol"],
            row![comma_symbol, "Floating point number (comma) stock symbol"],
            row![date, "Date stock symbol"],
            row!["NULL", "NULL stock symbol"],
            row!["$@%?", "Special characters only stock symbol"],
            row!["zyzx", "Non-existent stock symbol (only letters)"],
            row!["$A23", "Non-existent stock symbol (combination)"],
            row!["тест", "Other alphabets stock symbol #1"],
            row!["片仮名", "Other alphabets stock symbol #2"],
            row!["😍😍😍", "Emoji stock symbol"],
        ],
    )
}

/// Invalid amount inputs the browser lets you type into a number field.
pub fn untypable_amount_cases() -> CaseTable {
    CaseTable::new(
        "amount, case",
        vec![
            row!["", "Empty stock amount"],
            row![" ", "White-space stock amount (one)"],
            row!["   ", "White-space stock amount (few)"],
            row!["two", "Letters in amount"],
            row!["$@%", "Special characters amount"],
            row!["пять", "Other alphabets amount #1"],
            row!["片仮名", "Other alphabets amount #2"],
            row!["💵💵💵", "Emoji stock amount"],
            row![",", "Comma"],
        ],
    )
}

/// Invalid amount inputs that survive native input validation, so the
/// backend must reject them.
pub fn typable_amount_cases(rng: &mut impl Rng) -> CaseTable {
    let negative = rng.gen_range(-10000..=-1_i64);
    let float_amount =
        f64::from(rng.gen_range(0..10_i32)) + f64::from(rng.gen_range(1..=9_i32)) / 10.0;
    let unaffordable = rng.gen_range(1000..=10000_i64);
    let fractionless = f64::from(rng.gen_range(0..=9_i32));
    CaseTable::new(
        "amount, case",
        vec![
            row![0, "Zero amount"],
            row![negative, "Negative amount"],
            row![float_amount, "Float amount (period)"],
            row![unaffordable, "Buying more than affordable"],
            row![fractionless, "Fractionless float"],
        ],
    )
}

/// Constants for the Buy page suites.
pub mod buy {
    use super::{pick_symbol, CaseTable, Rng};
    use crate::row;

    /// Expected stock symbol input placeholder value
    pub const EX_SYMBOL_PLACEHOLDER: &str = "Symbol";
    /// Expected stock amount input placeholder value
    pub const EX_AMOUNT_PLACEHOLDER: &str = "Shares";
    /// Expected input default value (both fields start empty)
    pub const EX_INPUT_VALUE: &str = "";

    /// Flash alert after a successful purchase
    pub const SUCCESS_MSG: &str = "Bought!";

    /// Error for an empty stock symbol
    pub const EMPTY_SYMBOL: &str = "MISSING SYMBOL";
    /// Error for an invalid stock symbol
    pub const INVALID_SYMBOL: &str = "INVALID SYMBOL";
    /// Error for an empty amount
    pub const EMPTY_AMOUNT: &str = "MISSING SHARES";
    /// Error for an invalid amount
    pub const INVALID_AMOUNT: &str = "INVALID SHARES";
    /// Error for a zero amount
    pub const ZERO_AMOUNT: &str = "TOO FEW SHARES";
    /// Error for a purchase exceeding available cash
    pub const EXCEED_CASH: &str = "CAN'T AFFORD";

    /// Successful purchase cases: (symbol, amount, label).
    pub fn successful_purchase_cases(rng: &mut impl Rng) -> CaseTable {
        CaseTable::new(
            "symbol, amount, case",
            vec![
                row![pick_symbol(rng), 1, "Single share, uppercase symbol"],
                row![pick_symbol(rng).to_lowercase(), 10, "Ten shares, lowercase symbol"],
            ],
        )
    }
}

/// Constants for the suites shared across pages.
pub mod common {
    /// Expected logo text on every page
    pub const LOGO: &str = "C$50Finance";

    /// (path, expected title) for pages of an authenticated user.
    pub const AUTHED_PAGES: [(&str, &str); 5] = [
        ("/", "C$50 Finance: Portfolio"),
        ("/quote", "C$50 Finance: Quote"),
        ("/buy", "C$50 Finance: Buy"),
        ("/sell", "C$50 Finance: Sell"),
        ("/history", "C$50 Finance: History"),
    ];

    /// (path, expected title) for pages of an unauthenticated visitor.
    pub const UNAUTHED_PAGES: [(&str, &str); 2] = [
        ("/login", "C$50 Finance: Log In"),
        ("/register", "C$50 Finance: Register"),
    ];
}

/// Constants for the Portfolio (default route) suites.
pub mod portfolio {
    /// Expected holdings-table headers, in order.
    pub const EXPECTED_HEADERS: [&str; 5] = ["Symbol", "Name", "Shares", "Price", "TOTAL"];
    /// Header of the symbol column
    pub const HEADER_SYMBOL: &str = "Symbol";
    /// Header of the share-count column
    pub const HEADER_AMOUNT: &str = "Shares";
    /// Header of the price column
    pub const HEADER_PRICE: &str = "Price";
    /// Header of the per-stock total column
    pub const HEADER_TOTAL: &str = "TOTAL";
}

/// Constants for the History page suites.
pub mod history {
    /// Expected transactions-table headers, in order.
    pub const EXPECTED_HEADERS: [&str; 4] = ["Symbol", "Shares", "Price", "Transacted"];
    /// Header of the timestamp column
    pub const HEADER_DATETIME: &str = "Transacted";
    /// Header of the share-count column
    pub const HEADER_AMOUNT: &str = "Shares";
}

/// Constants for the Log in page suites.
pub mod login {
    use super::CaseTable;
    use crate::row;

    /// Expected username input placeholder value
    pub const EX_USERNAME_PLACEHOLDER: &str = "Username";
    /// Expected password input placeholder value
    pub const EX_PASSWORD_PLACEHOLDER: &str = "Password";
    /// Expected input default value (both fields start empty)
    pub const EX_INPUT_VALUE: &str = "";

    /// Error for an empty username
    pub const EMPTY_USERNAME: &str = "MUST PROVIDE USERNAME";
    /// Error for an empty password
    pub const EMPTY_PASSWORD: &str = "MUST PROVIDE PASSWORD";
    /// Error for wrong credentials
    pub const INVALID_CREDS: &str = "INVALID USERNAME AND/OR PASSWORD";

    /// Invalid username log-in attempts.
    pub fn invalid_login_cases() -> CaseTable {
        CaseTable::new(
            "username, case",
            vec![
                row!["", "Empty username"],
                row!["non-existent-username", "Non-existent username"],
            ],
        )
    }

    /// Invalid password log-in attempts.
    pub fn invalid_password_cases() -> CaseTable {
        CaseTable::new(
            "password, case",
            vec![
                row!["", "Empty password"],
                row!["non-existent-password", "Wrong password"],
            ],
        )
    }
}

/// Constants for the Quote page suites.
pub mod quote {
    /// Expected symbol input placeholder value
    pub const EX_SYMBOL_PLACEHOLDER: &str = "Symbol";
    /// Expected symbol input default value
    pub const EX_INPUT_VALUE: &str = "";

    /// Error for an empty symbol
    pub const EMPTY_SYMBOL: &str = "MISSING SYMBOL";
    /// Error for an invalid symbol
    pub const INVALID_SYMBOL: &str = "INVALID SYMBOL";
}

/// Constants for the Register page suites.
pub mod register {
    use super::CaseTable;
    use crate::row;

    /// Expected username input placeholder value
    pub const EX_USERNAME_PLACEHOLDER: &str = "Username";
    /// Expected password input placeholder value
    pub const EX_PASSWORD_PLACEHOLDER: &str = "Password";
    /// Expected confirmation input placeholder value
    pub const EX_CONFIRM_PLACEHOLDER: &str = "Password (again)";
    /// Expected input default value (all three fields start empty)
    pub const EX_INPUT_VALUE: &str = "";

    /// Flash alert after a successful registration
    pub const SUCCESS_MSG: &str = "Registered!";

    /// Error for a missing password
    pub const MISSING_PASSWORD: &str = "MISSING PASSWORD";
    /// Error for a password/confirmation mismatch
    pub const PASSWORDS_DONT_MATCH: &str = "PASSWORDS DON'T MATCH";
    /// Error for a taken username
    pub const USERNAME_TAKEN: &str = "Username is not available";

    /// Sentinel value meaning "reuse the fixture user's name".
    pub const PLACEHOLDER_USERNAME: &str = "placeholder_value";

    /// Invalid username registration attempts.
    pub fn invalid_username_cases() -> CaseTable {
        CaseTable::new(
            "username, case",
            vec![
                row!["", "Empty username"],
                row![" ", "Whitespaces only username (one)"],
                row!["              ", "Whitespaces only username (few)"],
                row![PLACEHOLDER_USERNAME, "Registering with the same username twice"],
            ],
        )
    }

    /// Invalid password-confirmation registration attempts.
    pub fn invalid_confirm_cases() -> CaseTable {
        CaseTable::new(
            "confirm, case",
            vec![
                row!["", "Empty confirm"],
                row!["drow$$4P", "Valid confirm but mismatch with password"],
            ],
        )
    }

    /// Invalid password registration attempts.
    ///
    /// Most of these are known to pass registration on the reference
    /// deployment; [`password_case_xfail`] carries the reasons.
    pub fn invalid_password_cases() -> CaseTable {
        CaseTable::new(
            "password, case",
            vec![
                row!["", "Empty password"],
                row![" ", "White-space password (one)"],
                row!["   ", "White-space password (few)"],
                row!["1234567890", "Numbers only pasword"],
                row!["abcdefgh", "Letters only pasword"],
                row!["!@#$%^&*()", "Special characters only pasword"],
                row!["1qaz@wsx", "No uppercase letter pasword"],
                row!["a", "Less than 8 characters PW (border case 1)"],
                row!["1qaz@ws", "Less than 8 characters PW (border case 2)"],
            ],
        )
    }

    /// Expected-failure reason for a password case, when it has one.
    #[must_use]
    pub fn password_case_xfail(label: &str) -> Option<&'static str> {
        match label {
            "White-space password (one)" | "White-space password (few)" => {
                Some("reference deployment allows passwords made of white spaces")
            }
            "Numbers only pasword" => Some("reference deployment allows numbers-only passwords"),
            "Letters only pasword" => Some("reference deployment allows letters-only passwords"),
            "Special characters only pasword" => {
                Some("reference deployment allows typographical-only passwords")
            }
            "No uppercase letter pasword" => {
                Some("reference deployment does not require uppercase letters")
            }
            "Less than 8 characters PW (border case 1)"
            | "Less than 8 characters PW (border case 2)" => {
                Some("reference deployment allows passwords shorter than 8 characters")
            }
            _ => None,
        }
    }
}

/// Constants for the Sell page suites.
pub mod sell {
    use super::{pick_symbol, CaseTable, Rng};
    use crate::row;

    /// Expected default option name of the symbol select
    pub const EX_SELECT_DEFAULT: &str = "Symbol";
    /// Expected amount input placeholder value
    pub const EX_AMOUNT_PLACEHOLDER: &str = "Shares";
    /// Expected amount input default value
    pub const EX_INPUT_VALUE: &str = "";

    /// Flash alert after a successful sale
    pub const SUCCESS_MSG: &str = "Sold!";

    /// Error for an empty symbol
    pub const EMPTY_SYMBOL: &str = "MISSING SYMBOL";
    /// Error for a symbol the user does not hold
    pub const UNOWNED_SYMBOL: &str = "SYMBOL NOT OWNED";
    /// Error for an empty amount
    pub const EMPTY_AMOUNT: &str = "MISSING SHARES";
    /// Error for an invalid amount
    pub const INVALID_AMOUNT: &str = "INVALID SHARES";
    /// Error for a non-positive amount
    pub const ZERO_AMOUNT: &str = "SHARES MUST BE POSITIVE";
    /// Error for selling more than the held amount
    pub const EXCEED_AMOUNT: &str = "TOO MANY SHARES";

    /// Successful sell cases: (symbol, amount, label).
    pub fn successful_sell_cases(rng: &mut impl Rng) -> CaseTable {
        CaseTable::new(
            "symbol, amount, case",
            vec![row![pick_symbol(rng), 1, "Single share sale"]],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seeded_tables_are_reproducible() {
        let a = invalid_symbol_cases(&mut StdRng::seed_from_u64(7));
        let b = invalid_symbol_cases(&mut StdRng::seed_from_u64(7));
        assert_eq!(a.rows(), b.rows());
    }

    #[test]
    fn test_invalid_symbol_table_shape() {
        let table = invalid_symbol_cases(&mut StdRng::seed_from_u64(1));
        assert_eq!(table.params(), ["symbol", "case"]);
        assert_eq!(table.rows().len(), 15);
        // checks reference rows by position; the emoji case stays last
        assert_eq!(table.rows()[14].label(), "Emoji stock symbol");
    }

    #[test]
    fn test_typable_amounts_are_in_range() {
        let table = typable_amount_cases(&mut StdRng::seed_from_u64(3));
        let negative = table.rows()[1].values()[0].as_int().unwrap();
        assert!((-10000..=-1).contains(&negative));
        let unaffordable = table.rows()[3].values()[0].as_int().unwrap();
        assert!((1000..=10000).contains(&unaffordable));
    }

    #[test]
    fn test_password_xfail_lookup() {
        assert!(register::password_case_xfail("Empty password").is_none());
        assert!(register::password_case_xfail("Numbers only pasword").is_some());
    }

    #[test]
    fn test_purchase_cases_use_known_symbols() {
        let table = buy::successful_purchase_cases(&mut StdRng::seed_from_u64(9));
        let cases = crate::casegen::expand("Purchases", "", &table).unwrap();
        let first = cases[0].input("symbol");
        assert!(TEST_SYMBOLS.contains(&first.as_str()));
        let second = cases[1].input("symbol");
        assert!(TEST_SYMBOLS.contains(&second.to_uppercase().as_str()));
    }
}
