// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! HTML character escaping.

use std::borrow::Cow;

/// Escapes `&`, `<`, `>`, `"` and `'`.
///
/// ```rust
/// assert_eq!(wafer_dom::escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#039;");
/// assert_eq!(wafer_dom::escape("plain"), "plain");
/// ```
#[must_use]
pub fn escape(value: &str) -> Cow<'_, str> {
    replace_with(value, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#039;"),
        _ => None,
    })
}

/// Reverses [`escape`].
///
/// Only the five entities produced by [`escape`] (plus `&#39;`) are decoded;
/// any other `&` sequence is left alone.
#[must_use]
pub fn unescape(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }
    const ENTITIES: &[(&str, char)] = &[
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&#039;", '\''),
        ("&#39;", '\''),
    ];
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, c)) => {
                out.push(*c);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Escaping applied to text when serializing raw storage.
pub(crate) fn escape_text(value: &str) -> Cow<'_, str> {
    replace_with(value, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\u{a0}' => Some("&nbsp;"),
        _ => None,
    })
}

/// Escaping applied to attribute values when serializing raw storage.
pub(crate) fn escape_attribute(value: &str) -> Cow<'_, str> {
    replace_with(value, |c| match c {
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\u{a0}' => Some("&nbsp;"),
        _ => None,
    })
}

fn replace_with(value: &str, map: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    let Some(first) = value.char_indices().find(|(_, c)| map(*c).is_some()) else {
        return Cow::Borrowed(value);
    };
    let mut out = String::with_capacity(value.len() + 8);
    out.push_str(&value[..first.0]);
    for c in value[first.0..].chars() {
        match map(c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}
