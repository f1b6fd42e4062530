//! Session cookie tracking.
//!
//! The portal sets its session cookies across several responses (bootstrap
//! page, login redirect). [`CookieJar`] keeps the latest value for each
//! cookie name and renders the `Cookie` request header. Attributes such as
//! `Path` or `Expires` are dropped: cookies live only for one run.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, SET_COOKIE};
use tracing::trace;

/// Name → value map of session cookies.
///
/// Updates never mutate an existing jar; they return a new one seeded from
/// the previous jar, so a cookie is only replaced when a response re-sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `prev` (if any) and apply each raw `Set-Cookie` value on top.
    ///
    /// Every raw value must hold exactly one cookie; use
    /// [`split_set_cookie_header`] on concatenated headers first.
    pub fn update<'a, I>(prev: Option<&CookieJar>, raw_values: I) -> CookieJar
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut next = prev.cloned().unwrap_or_default();
        for raw in raw_values {
            match parse_set_cookie(raw) {
                Some((name, value)) => {
                    next.cookies.insert(name.to_owned(), value.to_owned());
                }
                None => trace!(raw, "ignoring malformed Set-Cookie value"),
            }
        }
        next
    }

    /// Copy `prev` and apply every `Set-Cookie` header of a response.
    ///
    /// Handles both one-header-per-cookie responses and headers that were
    /// folded into a single comma-separated value.
    pub fn from_response(prev: Option<&CookieJar>, headers: &HeaderMap) -> CookieJar {
        let raw: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(split_set_cookie_header)
            .collect();

        trace!(count = raw.len(), "merging response cookies");
        Self::update(prev, raw)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Render the `Cookie` request header (`a=1; b=2`), or `None` if empty.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Split a folded `Set-Cookie` header into one string per cookie.
///
/// A comma only starts a new cookie when the text after it reaches `=`
/// before any `;` or `,`. This keeps `Expires=Wed, 21 Oct 2015 07:28:00 GMT`
/// intact while still splitting `a=1, b=2`.
pub fn split_set_cookie_header(header: &str) -> Vec<&str> {
    let bytes = header.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b',' {
            pos += 1;
            continue;
        }

        let comma = pos;
        let mut probe = comma + 1;
        while probe < bytes.len() && bytes[probe].is_ascii_whitespace() {
            probe += 1;
        }
        let token_start = probe;
        while probe < bytes.len() && !matches!(bytes[probe], b'=' | b';' | b',') {
            probe += 1;
        }

        if probe < bytes.len() && bytes[probe] == b'=' && probe > token_start {
            push_trimmed(&mut parts, &header[start..comma]);
            start = token_start;
            pos = token_start;
        } else {
            pos = comma + 1;
        }
    }

    push_trimmed(&mut parts, &header[start..]);
    parts
}

fn push_trimmed<'a>(parts: &mut Vec<&'a str>, part: &'a str) {
    let part = part.trim();
    if !part.is_empty() {
        parts.push(part);
    }
}

/// Extract `(name, value)` from a single `Set-Cookie` value.
fn parse_set_cookie(raw: &str) -> Option<(&str, &str)> {
    let pair = raw.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn splits_plain_cookie_list() {
        assert_eq!(
            split_set_cookie_header("a=1; Path=/, b=2; HttpOnly"),
            vec!["a=1; Path=/", "b=2; HttpOnly"]
        );
    }

    #[test]
    fn keeps_commas_inside_expires() {
        let header = "_enlighten_4_session=abc; Expires=Wed, 21 Oct 2015 07:28:00 GMT; Path=/, \
                      locale=en; expires=Thu, 22 Oct 2015 07:28:00 GMT";
        assert_eq!(
            split_set_cookie_header(header),
            vec![
                "_enlighten_4_session=abc; Expires=Wed, 21 Oct 2015 07:28:00 GMT; Path=/",
                "locale=en; expires=Thu, 22 Oct 2015 07:28:00 GMT",
            ]
        );
    }

    #[test]
    fn single_cookie_is_untouched() {
        assert_eq!(split_set_cookie_header("a=1"), vec!["a=1"]);
        assert!(split_set_cookie_header("").is_empty());
    }

    #[test]
    fn update_overwrites_and_keeps_others() {
        let first = CookieJar::update(None, ["a=1; Path=/", "b=2"]);
        let second = CookieJar::update(Some(&first), ["b=3; HttpOnly"]);

        assert_eq!(second.get("a"), Some("1"));
        assert_eq!(second.get("b"), Some("3"));
        // The previous jar is not modified.
        assert_eq!(first.get("b"), Some("2"));
    }

    #[test]
    fn update_is_idempotent() {
        let base = CookieJar::update(None, ["keep=me"]);
        let raw = ["a=1", "b=2; Secure"];
        let once = CookieJar::update(Some(&base), raw);
        let twice = CookieJar::update(Some(&once), raw);

        assert_eq!(once, twice);
        assert_eq!(twice.get("keep"), Some("me"));
    }

    #[test]
    fn ignores_malformed_values() {
        let jar = CookieJar::update(None, ["novalue", "=orphan", "ok=yes"]);
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("ok"), Some("yes"));
    }

    #[test]
    fn value_may_contain_equals() {
        let jar = CookieJar::update(None, ["token=abc==; Path=/"]);
        assert_eq!(jar.get("token"), Some("abc=="));
    }

    #[test]
    fn reads_every_set_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1; Path=/"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("b=2; Expires=Wed, 21 Oct 2015 07:28:00 GMT, c=3"),
        );

        let jar = CookieJar::from_response(None, &headers);
        assert_eq!(jar.header_value().as_deref(), Some("a=1; b=2; c=3"));
    }

    #[test]
    fn empty_jar_has_no_header() {
        assert_eq!(CookieJar::new().header_value(), None);
        assert!(CookieJar::from_response(None, &HeaderMap::new()).is_empty());
    }
}
