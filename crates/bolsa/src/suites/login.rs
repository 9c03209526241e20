//! Log in page suites.

use crate::constants::login as lc;
use crate::harness::{check, expand_suites, Suite};
use crate::page::Page;
use crate::result::{ensure, BolsaResult};
use crate::session::{log_out, Credentials};

use super::with_new_user;

/// Element presence, uniqueness, placeholders and default values.
fn basics() -> Suite {
    Suite::new("LoginPageBasics")
        .check(check("has username input", |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                login.open().await?;
                ensure(
                    login.username_input().await?.is_some(),
                    "Expected Log in page to have username input field",
                )
            })
        }))
        .check(check("username input is unique", |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                login.open().await?;
                let all = login.username_inputs_all().await?;
                ensure(
                    Page::is_unique(&all),
                    format!(
                        "Expected to find only one username input field on Log in page; found {}",
                        all.len()
                    ),
                )
            })
        }))
        .check(check("username input default value", |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                login.open().await?;
                let input = login.require(&crate::pages::LoginPage::USERNAME_INPUT, "username input").await?;
                let value = login.value_of(&input).await?;
                ensure(
                    value == lc::EX_INPUT_VALUE,
                    format!("Expected username input field to be empty, actual value: {value}"),
                )
            })
        }))
        .check(check("username input placeholder", |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                login.open().await?;
                let input = login.require(&crate::pages::LoginPage::USERNAME_INPUT, "username input").await?;
                let placeholder = login.placeholder_of(&input).await?;
                ensure(
                    placeholder == lc::EX_USERNAME_PLACEHOLDER,
                    format!(
                        "Expected username placeholder to be {}, actual value: {placeholder}",
                        lc::EX_USERNAME_PLACEHOLDER
                    ),
                )
            })
        }))
        .check(check("has password input", |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                login.open().await?;
                ensure(
                    login.password_input().await?.is_some(),
                    "Expected Log in page to have password input field",
                )
            })
        }))
        .check(check("password input is unique", |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                login.open().await?;
                ensure(
                    Page::is_unique(&login.password_inputs_all().await?),
                    "Expected to find only one password input field on Log in page",
                )
            })
        }))
        .check(check("password input placeholder", |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                login.open().await?;
                let input = login.require(&crate::pages::LoginPage::PASSWORD_INPUT, "password input").await?;
                let placeholder = login.placeholder_of(&input).await?;
                ensure(
                    placeholder == lc::EX_PASSWORD_PLACEHOLDER,
                    format!(
                        "Expected password placeholder to be {}, actual value: {placeholder}",
                        lc::EX_PASSWORD_PLACEHOLDER
                    ),
                )
            })
        }))
        .check(check("has login button", |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                login.open().await?;
                ensure(
                    login.login_button().await?.is_some(),
                    "Expected Log in page to have Log in button",
                )
            })
        }))
        .check(check("login button is unique", |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                login.open().await?;
                ensure(
                    Page::is_unique(&login.login_buttons_all().await?),
                    "Expected to find only one Log in button on Log in page",
                )
            })
        }))
}

/// Successful log in with a freshly registered user.
fn successful_login() -> Suite {
    with_new_user(Suite::new("SuccessfulLogin"))
        .setup(|cx| {
            Box::pin(async move {
                log_out(&cx.session).await?;
                let creds = cx.creds()?.clone();
                let login = cx.session.login_page();
                login.open().await?;
                login.log_in_with(&creds.username, &creds.password).await
            })
        })
        .check(check("correct redirection", |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                ensure(
                    login.wait_for_url(&cx.session.urls.default_page()).await?,
                    "Expected for successfully logged in user to be redirected to default page",
                )
            })
        }))
        .check(check("no error image", |cx| {
            Box::pin(async move {
                let page = cx.session.page_at(cx.session.urls.default_page());
                ensure(
                    page.error_banner().await?.is_none(),
                    "Expected no error image in case of successful log in attempt",
                )
            })
        }))
}

/// Shared body of the invalid-credentials suites: the act happens in
/// setup (once per generated case), checks only observe.
fn invalid_creds_suite(empty_label: &'static str, empty_message: &'static str) -> Suite {
    Suite::new("placeholder")
        .setup(move |cx| {
            Box::pin(async move {
                let creds = Credentials::fresh();
                // the username sweep binds "username", the password
                // sweep binds "password"; the other half comes from the
                // (unregistered) fresh credentials
                let username = cx
                    .case
                    .as_ref()
                    .and_then(|c| c.get("username"))
                    .map_or_else(|| creds.username.clone(), |v| v.as_input());
                let password = cx
                    .case
                    .as_ref()
                    .and_then(|c| c.get("password"))
                    .map_or_else(|| creds.password.clone(), |v| v.as_input());
                let login = cx.session.login_page();
                login.open().await?;
                login.log_in_with(&username, &password).await
            })
        })
        .check(check("no redirection", |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                let current = login.current_url().await?;
                ensure(
                    current == cx.session.urls.login(),
                    format!(
                        "Expected for user with invalid credentials to stay on log in page; \
                         actual page: {current}"
                    ),
                )
            })
        }))
        .check(check("error image appears", |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                ensure(
                    login.error_banner().await?.is_some(),
                    format!(
                        "Expected an error image in case of invalid input: {}",
                        cx.case_label()
                    ),
                )
            })
        }))
        .check(check("error message", move |cx| {
            Box::pin(async move {
                let login = cx.session.login_page();
                let expected = if cx.case_label() == empty_label {
                    empty_message
                } else {
                    lc::INVALID_CREDS
                };
                let actual = login.error_banner_text().await?.unwrap_or_default();
                ensure(
                    actual == expected,
                    format!("Expected error image to have text {expected}, actual text: {actual}"),
                )
            })
        }))
}

/// All Log in suites.
pub fn suites() -> BolsaResult<Vec<Suite>> {
    let mut suites = vec![basics(), successful_login()];
    suites.extend(expand_suites(
        "TestInvalidLogin",
        "Test",
        &lc::invalid_login_cases(),
        |_case| invalid_creds_suite("Empty username", lc::EMPTY_USERNAME),
    )?);
    suites.extend(expand_suites(
        "TestInvalidPassword",
        "Test",
        &lc::invalid_password_cases(),
        |_case| invalid_creds_suite("Empty password", lc::EMPTY_PASSWORD),
    )?);
    Ok(suites)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_expansion_counts() {
        let suites = suites().unwrap();
        // basics + successful + 2 invalid-login + 2 invalid-password
        assert_eq!(suites.len(), 6);
        assert!(suites
            .iter()
            .any(|s| s.name() == "InvalidLogin[-Empty username]"));
        assert!(suites
            .iter()
            .any(|s| s.name() == "InvalidPassword[-Empty password]"));
    }
}
