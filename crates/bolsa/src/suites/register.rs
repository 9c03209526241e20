//! Register page suites.

use crate::constants::register as rc;
use crate::constants::INITIAL_CASH;
use crate::harness::{check, expand_suites, Check, Suite, Tag};
use crate::page::Page;
use crate::result::{ensure, BolsaResult};
use crate::session::{hash_password, remove_user, Credentials};

/// Element presence, uniqueness, placeholders and default values.
fn basics() -> Suite {
    let mut suite = Suite::new("RegisterPageBasics");
    let fields: [(&str, crate::locator::Locator, &str); 3] = [
        ("username", crate::pages::RegisterPage::USERNAME_INPUT, rc::EX_USERNAME_PLACEHOLDER),
        ("password", crate::pages::RegisterPage::PASSWORD_INPUT, rc::EX_PASSWORD_PLACEHOLDER),
        ("confirmation", crate::pages::RegisterPage::CONFIRM_INPUT, rc::EX_CONFIRM_PLACEHOLDER),
    ];
    for (field, locator, placeholder) in fields {
        suite = suite
            .check(check(format!("has {field} input"), move |cx| {
                Box::pin(async move {
                    let register = cx.session.register_page();
                    register.open().await?;
                    ensure(
                        register.find_one(&locator).await?.is_some(),
                        format!("Expected {field} input field to be present on Register page"),
                    )
                })
            }))
            .check(check(format!("{field} input is unique"), move |cx| {
                Box::pin(async move {
                    let register = cx.session.register_page();
                    register.open().await?;
                    let all = register.find_many(&locator).await?.unwrap_or_default();
                    ensure(
                        Page::is_unique(&all),
                        format!(
                            "Expected to find only one {field} input field on Register page; found {}",
                            all.len()
                        ),
                    )
                })
            }))
            .check(check(format!("{field} input default value"), move |cx| {
                Box::pin(async move {
                    let register = cx.session.register_page();
                    register.open().await?;
                    let input = register.require(&locator, "input").await?;
                    let value = register.value_of(&input).await?;
                    ensure(
                        value == rc::EX_INPUT_VALUE,
                        format!("Expected {field} input field to be empty, actual value: {value}"),
                    )
                })
            }))
            .check(check(format!("{field} input placeholder"), move |cx| {
                Box::pin(async move {
                    let register = cx.session.register_page();
                    register.open().await?;
                    let input = register.require(&locator, "input").await?;
                    let actual = register.placeholder_of(&input).await?;
                    ensure(
                        actual == placeholder,
                        format!(
                            "Expected {field} placeholder text to be {placeholder}, \
                             actual value: {actual}"
                        ),
                    )
                })
            }));
    }
    suite
        .check(check("has register button", |cx| {
            Box::pin(async move {
                let register = cx.session.register_page();
                register.open().await?;
                ensure(
                    register.register_button().await?.is_some(),
                    "Expected Register page to have register button",
                )
            })
        }))
        .check(check("register button is unique", |cx| {
            Box::pin(async move {
                let register = cx.session.register_page();
                register.open().await?;
                ensure(
                    Page::is_unique(&register.register_buttons_all().await?),
                    "Expected to find only one Register button on Register page",
                )
            })
        }))
}

/// The happy path: register, get redirected, see the flash, find the
/// user row with the initial cash and no transactions.
fn successful_registration() -> Suite {
    Suite::new("SuccessfulRegistration")
        .setup(|cx| {
            Box::pin(async move {
                let creds = Credentials::fresh();
                let register = cx.session.register_page();
                register.open().await?;
                register
                    .register_new_user(&creds.username, &creds.password, None)
                    .await?;
                if let Some(db) = &cx.session.db {
                    db.add_user(&creds.username, &hash_password(&creds.password))?;
                }
                cx.creds = Some(creds);
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
        .check(check("correct redirection", |cx| {
            Box::pin(async move {
                let register = cx.session.register_page();
                ensure(
                    register.wait_for_url(&cx.session.urls.default_page()).await?,
                    "Expected successfully registered user to get redirected to Default page",
                )
            })
        }))
        .check(check("has success alert", |cx| {
            Box::pin(async move {
                let page = cx.session.page_at(cx.session.urls.default_page());
                ensure(
                    page.flash_message().await?.is_some(),
                    "Couldn't find registration alert after successful registration",
                )
            })
        }))
        .check(check("alert message", |cx| {
            Box::pin(async move {
                let page = cx.session.page_at(cx.session.urls.default_page());
                let text = page.flash_text().await?.unwrap_or_default();
                ensure(
                    text == rc::SUCCESS_MSG,
                    format!(
                        "Expected successfully registered user to see {} alert, actual text: {text}",
                        rc::SUCCESS_MSG
                    ),
                )
            })
        }))
        .check(
            check("db has new user row", |cx| {
                Box::pin(async move {
                    let creds = cx.creds()?.clone();
                    let db = cx.session.db.as_ref().ok_or_else(|| {
                        crate::result::BolsaError::check("database access required")
                    })?;
                    ensure(
                        db.user_row(&creds.username)?.is_some(),
                        "Couldn't find a new user row in database",
                    )
                })
            })
            .tag(Tag::DbReliant),
        )
        .check(
            check("db new user cash value", |cx| {
                Box::pin(async move {
                    let creds = cx.creds()?.clone();
                    let db = cx.session.db.as_ref().ok_or_else(|| {
                        crate::result::BolsaError::check("database access required")
                    })?;
                    let cash = db.user_cash(&creds.username)?;
                    ensure(
                        cash == INITIAL_CASH,
                        format!(
                            "Expected new user to have {INITIAL_CASH} amount of cash, \
                             actual amount: {cash}"
                        ),
                    )
                })
            })
            .tag(Tag::DbReliant),
        )
        .check(
            check("db has no transaction history", |cx| {
                Box::pin(async move {
                    let creds = cx.creds()?.clone();
                    let db = cx.session.db.as_ref().ok_or_else(|| {
                        crate::result::BolsaError::check("database access required")
                    })?;
                    ensure(
                        db.transactions(&creds.username)?.is_empty(),
                        "Expected new user's transaction history to be empty",
                    )
                })
            })
            .tag(Tag::DbReliant),
        )
}

/// Invalid username sweeps, including registering the same name twice.
fn invalid_username_suites() -> BolsaResult<Vec<Suite>> {
    expand_suites(
        "TestInvalidUsernameRegistration",
        "Test",
        &rc::invalid_username_cases(),
        |case| {
            let duplicate = case.input("username") == rc::PLACEHOLDER_USERNAME;
            let mut suite = Suite::new("placeholder").setup(move |cx| {
                Box::pin(async move {
                    let creds = Credentials::fresh();
                    let register = cx.session.register_page();
                    if duplicate {
                        // register once for real, then collide on purpose
                        register.open().await?;
                        register
                            .register_new_user(&creds.username, &creds.password, None)
                            .await?;
                        if let Some(db) = &cx.session.db {
                            db.add_user(&creds.username, &hash_password(&creds.password))?;
                        }
                        register.wait_for_url(&cx.session.urls.default_page()).await?;
                        register.open().await?;
                        register
                            .register_new_user(&creds.username, &creds.password, None)
                            .await?;
                        cx.creds = Some(creds);
                    } else {
                        let username = cx.case_input("username");
                        register.open().await?;
                        register
                            .register_new_user(&username, &creds.password, None)
                            .await?;
                        cx.creds = Some(creds);
                    }
                    Ok(())
                })
            });
            suite = suite
                .check(check("browser alert pops up", |cx| {
                    Box::pin(async move {
                        let register = cx.session.register_page();
                        ensure(
                            register.native_dialog().await?.is_some(),
                            format!(
                                "Expected a browser alert to pop up in case of invalid input: {}",
                                cx.case_label()
                            ),
                        )
                    })
                }))
                .check(check("browser alert text", |cx| {
                    Box::pin(async move {
                        let register = cx.session.register_page();
                        let Some(dialog) = register.native_dialog().await? else {
                            return ensure(false, "no browser alert to read");
                        };
                        ensure(
                            dialog.message == rc::USERNAME_TAKEN,
                            format!(
                                "Expected the alert to say {}, actual message: {}",
                                rc::USERNAME_TAKEN,
                                dialog.message
                            ),
                        )
                    })
                }));
            if duplicate {
                suite = suite.check(
                    check("db has exactly one user row", |cx| {
                        Box::pin(async move {
                            let creds = cx.creds()?.clone();
                            let db = cx.session.db.as_ref().ok_or_else(|| {
                                crate::result::BolsaError::check("database access required")
                            })?;
                            let rows = db.query(
                                "SELECT id FROM users WHERE username = ?1;",
                                &[&creds.username.as_str()],
                            )?;
                            ensure(
                                rows.len() == 1,
                                format!(
                                    "Expected the duplicate registration to add no second row; \
                                     found {} rows",
                                    rows.len()
                                ),
                            )
                        })
                    })
                    .tag(Tag::DbReliant),
                );
            } else {
                suite = suite.check(
                    check("db has no new user", |cx| {
                        Box::pin(async move {
                            let username = cx.case_input("username");
                            let db = cx.session.db.as_ref().ok_or_else(|| {
                                crate::result::BolsaError::check("database access required")
                            })?;
                            ensure(
                                db.user_row(&username)?.is_none(),
                                "Expected no new users to be added to database",
                            )
                        })
                    })
                    .tag(Tag::DbReliant),
                );
            }
            suite.teardown(|cx| {
                Box::pin(async move {
                    if let Some(creds) = cx.creds.clone() {
                        remove_user(&cx.session, &creds).await?;
                    }
                    Ok(())
                })
            })
        },
    )
}

/// Invalid confirmation sweeps.
fn invalid_confirm_suites() -> BolsaResult<Vec<Suite>> {
    expand_suites(
        "TestInvalidConfirmRegistration",
        "Test",
        &rc::invalid_confirm_cases(),
        |_case| {
            Suite::new("placeholder")
                .setup(|cx| {
                    Box::pin(async move {
                        let creds = Credentials::fresh();
                        let confirm = cx.case_input("confirm");
                        let register = cx.session.register_page();
                        register.open().await?;
                        register
                            .register_new_user(&creds.username, &creds.password, Some(&confirm))
                            .await?;
                        cx.creds = Some(creds);
                        Ok(())
                    })
                })
                .check(check("error image appears", |cx| {
                    Box::pin(async move {
                        let register = cx.session.register_page();
                        ensure(
                            register.error_banner().await?.is_some(),
                            format!(
                                "Expected an error image in case of invalid input: {}",
                                cx.case_label()
                            ),
                        )
                    })
                }))
                .check(check("error message", |cx| {
                    Box::pin(async move {
                        let register = cx.session.register_page();
                        let actual = register.error_banner_text().await?.unwrap_or_default();
                        ensure(
                            actual == rc::PASSWORDS_DONT_MATCH,
                            format!(
                                "Expected error image to have text {}, actual text: {actual}",
                                rc::PASSWORDS_DONT_MATCH
                            ),
                        )
                    })
                }))
                .check(
                    check("db has no new user", |cx| {
                        Box::pin(async move {
                            let creds = cx.creds()?.clone();
                            let db = cx.session.db.as_ref().ok_or_else(|| {
                                crate::result::BolsaError::check("database access required")
                            })?;
                            ensure(
                                db.user_row(&creds.username)?.is_none(),
                                "Expected no new users to be added to database",
                            )
                        })
                    })
                    .tag(Tag::DbReliant),
                )
        },
    )
}

/// Invalid password sweep. Expected-failure knowledge lives in the
/// constants table, so each row becomes one (possibly xfail) check.
fn invalid_password_suite() -> Suite {
    let mut suite = Suite::new("InvalidPasswordRegistration");
    let table = rc::invalid_password_cases();
    for case_row in table.rows() {
        let password = case_row.values()[0].to_string();
        let label = case_row.label();
        let mut check_unit = Check::new(label.clone(), move |cx| {
            let password = password.clone();
            let label = label.clone();
            Box::pin(async move {
                let creds = Credentials::fresh();
                let register = cx.session.register_page();
                register.open().await?;
                register
                    .register_new_user(&creds.username, &password, None)
                    .await?;
                let banner = register.error_banner().await?;
                ensure(
                    banner.is_some(),
                    format!("Expected an error image in case of invalid input: {label}"),
                )?;
                let expected = if label == "Empty password" {
                    rc::MISSING_PASSWORD
                } else {
                    rc::PASSWORDS_DONT_MATCH
                };
                let actual = register.error_banner_text().await?.unwrap_or_default();
                ensure(
                    actual == expected,
                    format!("Expected error image to have text {expected}, actual text: {actual}"),
                )?;
                if let Some(db) = &cx.session.db {
                    ensure(
                        db.user_row(&creds.username)?.is_none(),
                        "Expected no new users to be added to database",
                    )?;
                }
                Ok(())
            })
        });
        if let Some(reason) = rc::password_case_xfail(&case_row.label()) {
            check_unit = check_unit.xfail(reason);
        }
        suite = suite.check(check_unit);
    }
    suite
}

/// All Register suites.
pub fn suites() -> BolsaResult<Vec<Suite>> {
    let mut suites = vec![basics(), successful_registration()];
    suites.extend(invalid_username_suites()?);
    suites.extend(invalid_confirm_suites()?);
    suites.push(invalid_password_suite());
    Ok(suites)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_counts() {
        let suites = suites().unwrap();
        // basics + success + 4 invalid-username + 2 invalid-confirm + password sweep
        assert_eq!(suites.len(), 9);
    }

    #[test]
    fn test_password_sweep_has_one_check_per_case() {
        let suites = suites().unwrap();
        let sweep = suites
            .iter()
            .find(|s| s.name() == "InvalidPasswordRegistration")
            .unwrap();
        assert_eq!(
            sweep.check_count(),
            rc::invalid_password_cases().rows().len()
        );
    }
}
