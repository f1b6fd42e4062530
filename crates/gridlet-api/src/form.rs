//! HTML login-form scraping.
//!
//! The portal's login form carries hidden anti-CSRF fields that must be
//! echoed back with the credentials. This module is independent of the
//! HTTP layer so it can be exercised against plain HTML strings.

use scraper::{Html, Selector};
use tracing::{trace, warn};

/// Collect the `hidden` and `submit` inputs of the form posting to `action`.
///
/// Returns `None` when the document has no such form. Inputs without a
/// `name` are skipped and a missing `value` becomes the empty string.
/// Fields come back in document order, so a later duplicate name should
/// overwrite an earlier one when the caller builds its field map.
pub fn scrape_form_fields(html: &str, action: &str) -> Option<Vec<(String, String)>> {
    let form_selector = Selector::parse("form").expect("static form selector");
    let input_selector = Selector::parse("input").expect("static input selector");

    let document = Html::parse_document(html);
    let forms: Vec<_> = document
        .select(&form_selector)
        .filter(|form| form.value().attr("action") == Some(action))
        .collect();

    if forms.is_empty() {
        trace!(action, "no form with matching action");
        return None;
    }
    if forms.len() > 1 {
        warn!(action, count = forms.len(), "multiple forms share the login action");
    }

    let fields = forms
        .iter()
        .flat_map(|form| form.select(&input_selector))
        .filter(|input| {
            input.value().attr("type").is_some_and(|t| {
                t.eq_ignore_ascii_case("hidden") || t.eq_ignore_ascii_case("submit")
            })
        })
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_owned(), value.to_owned()))
        })
        .collect();

    Some(fields)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const LOGIN_PAGE: &str = r#"
        <html><body>
          <form action="/search" method="get">
            <input type="hidden" name="q" value="ignored">
          </form>
          <form action="/login/login" method="post">
            <input type="hidden" name="authenticity_token" value="tok123">
            <input type="text" name="user[email]" value="">
            <input type="password" name="user[password]">
            <input type="HIDDEN" name="utf8" value="&#x2713;">
            <input type="hidden" value="no-name">
            <input type="submit" name="commit" value="Sign In">
            <input type="hidden" name="authenticity_token" value="tok456">
          </form>
        </body></html>
    "#;

    fn pairs(fields: &[(String, String)]) -> Vec<(&str, &str)> {
        fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn collects_hidden_and_submit_inputs() {
        let fields = scrape_form_fields(LOGIN_PAGE, "/login/login").expect("form present");
        assert_eq!(
            pairs(&fields),
            vec![
                ("authenticity_token", "tok123"),
                ("utf8", "\u{2713}"),
                ("commit", "Sign In"),
                ("authenticity_token", "tok456"),
            ]
        );
    }

    #[test]
    fn missing_form_is_none() {
        assert!(scrape_form_fields(LOGIN_PAGE, "/logout").is_none());
        assert!(scrape_form_fields("<html></html>", "/login/login").is_none());
    }

    #[test]
    fn form_without_inputs_is_empty() {
        let html = r#"<form action="/login/login"></form>"#;
        assert_eq!(scrape_form_fields(html, "/login/login"), Some(vec![]));
    }

    #[test]
    fn missing_value_becomes_empty() {
        let html = r#"<form action="/login/login"><input type="hidden" name="nonce"></form>"#;
        let fields = scrape_form_fields(html, "/login/login").expect("form present");
        assert_eq!(pairs(&fields), vec![("nonce", "")]);
    }
}
