//! Path utilities for joining prefixes and encoding variable values
//!
//! All functions are **pure**: given same input, always produce same output
//! with no side effects.

use std::borrow::Cow;

/// Prepends `/` when a template does not start with one
///
/// Returns `Cow::Borrowed` when the path is already rooted.
///
/// # Examples
///
/// ```
/// use routemap::path::ensure_leading_slash;
/// use std::borrow::Cow;
///
/// assert!(matches!(ensure_leading_slash("/about"), Cow::Borrowed("/about")));
/// assert_eq!(ensure_leading_slash("about"), "/about");
/// assert_eq!(ensure_leading_slash(""), "/");
/// ```
pub fn ensure_leading_slash(path: &str) -> Cow<'_, str> {
    if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{}", path))
    }
}

/// Joins a path prefix and a route path
///
/// Slashes at the seam collapse to one; slashes elsewhere (inside a
/// constraint, say) are left alone. An empty prefix returns the path
/// unchanged, and `join_prefix("/messages", "")` stays `/messages`.
///
/// # Examples
///
/// ```
/// use routemap::path::join_prefix;
///
/// assert_eq!(join_prefix("/admin", "/users"), "/admin/users");
/// assert_eq!(join_prefix("/admin/", "/users"), "/admin/users");
/// assert_eq!(join_prefix("/messages", "{.format}"), "/messages{.format}");
/// assert_eq!(join_prefix("", "/users"), "/users");
/// ```
pub fn join_prefix<'a>(prefix: &str, path: &'a str) -> Cow<'a, str> {
    if prefix.is_empty() {
        return Cow::Borrowed(path);
    }
    if prefix.ends_with('/') || path.starts_with('/') {
        Cow::Owned(format!(
            "{}/{}",
            prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    } else {
        Cow::Owned(format!("{}{}", prefix, path))
    }
}

/// Percent-encodes a value for substitution into a path
///
/// With `keep_slashes`, each `/`-separated piece is encoded on its own and
/// the separators survive, which keeps `path` constraints round-trippable.
/// Otherwise a `/` in the value becomes `%2F`.
///
/// ```
/// use routemap::path::encode_value;
///
/// assert_eq!(encode_value("a b/c", false), "a%20b%2Fc");
/// assert_eq!(encode_value("docs/a b", true), "docs/a%20b");
/// ```
pub fn encode_value(value: &str, keep_slashes: bool) -> Cow<'_, str> {
    if !keep_slashes {
        return urlencoding::encode(value);
    }
    if !value.contains('/') {
        return urlencoding::encode(value);
    }
    Cow::Owned(
        value
            .split('/')
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/"),
    )
}

/// Percent-decodes a matched value
///
/// Returns `None` when the decoded bytes are not valid UTF-8.
pub fn decode_value(raw: &str) -> Option<Cow<'_, str>> {
    urlencoding::decode(raw).ok()
}
