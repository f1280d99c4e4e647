// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Inline renderer: one plain-text unit (line or table cell) to safe HTML.
//!
//! The order of operations is fixed and load-bearing: the entire input is
//! HTML-escaped first, unconditionally, before any markup substitution.
//! Bold, inline code and links are then rewritten over the escaped text,
//! so no substitution can ever re-open an angle bracket that was already
//! neutralized.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

/// Origin used to resolve relative link targets, mirroring the hosting
/// application's own address.
pub const DEFAULT_ORIGIN: &str = "http://localhost:8080";

/// Escape the five HTML-significant characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whether a link target is allowed to become a clickable anchor.
///
/// The URL is parsed with the given origin as base, so relative paths
/// resolve to the application's own scheme. Only `http` and `https`
/// survive; `javascript:`, `data:` and unparseable input all fail.
pub fn is_safe_url_with_base(raw: &str, origin: &str) -> bool {
    let Ok(base) = Url::parse(origin) else {
        return false;
    };
    match Url::options().base_url(Some(&base)).parse(raw) {
        Ok(u) => matches!(u.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// [`is_safe_url_with_base`] against [`DEFAULT_ORIGIN`].
pub fn is_safe_url(raw: &str) -> bool {
    is_safe_url_with_base(raw, DEFAULT_ORIGIN)
}

static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern is valid"));
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+?)`").expect("code pattern is valid"));
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern is valid"));

/// Render one plain-text unit into an HTML-safe fragment.
///
/// Supported markup: `**bold**`, `` `code` ``, `[label](url)`. Links with
/// a disallowed scheme degrade to the bare label text.
pub fn render_inline(text: &str) -> String {
    render_inline_with_origin(text, DEFAULT_ORIGIN)
}

/// [`render_inline`] with an explicit origin for relative-link resolution.
pub fn render_inline_with_origin(text: &str, origin: &str) -> String {
    let escaped = escape_html(text);
    let bolded = BOLD.replace_all(&escaped, "<strong>$1</strong>");
    let coded = CODE.replace_all(&bolded, "<code>$1</code>");
    let linked = LINK.replace_all(&coded, |caps: &Captures| {
        let label = &caps[1];
        let href = &caps[2];
        if is_safe_url_with_base(href, origin) {
            format!(
                r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                href, label
            )
        } else {
            label.to_string()
        }
    });
    linked.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>&"'"#),
            "&lt;script&gt;&amp;&quot;&#39;"
        );
    }

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(render_inline("just words"), "just words");
    }

    #[test]
    fn test_bold() {
        assert_eq!(render_inline("a **b** c"), "a <strong>b</strong> c");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(render_inline("use `let x` here"), "use <code>let x</code> here");
    }

    #[test]
    fn test_escape_happens_before_markup() {
        // A crafted delimiter must not re-open an escaped bracket.
        assert_eq!(
            render_inline("**<b>**"),
            "<strong>&lt;b&gt;</strong>"
        );
    }

    #[test]
    fn test_safe_link() {
        let html = render_inline("[docs](https://example.com/a)");
        assert_eq!(
            html,
            r#"<a href="https://example.com/a" target="_blank" rel="noopener noreferrer">docs</a>"#
        );
    }

    #[test]
    fn test_javascript_link_degrades_to_label() {
        let html = render_inline("[x](javascript:alert(1))");
        assert!(!html.contains("<a"));
        assert!(html.starts_with('x'));
    }

    #[test]
    fn test_data_link_degrades_to_label() {
        assert_eq!(render_inline("[x](data:text/html;base64,AAAA)"), "x");
    }

    #[test]
    fn test_relative_link_resolves_to_origin_scheme() {
        assert!(is_safe_url("/api/kb/download?file=a.pdf"));
        let html = render_inline("[file](/download)");
        assert!(html.starts_with("<a href=\"/download\""));
    }

    #[test]
    fn test_malformed_url_degrades_to_label() {
        assert!(!is_safe_url("http://"));
    }

    #[test]
    fn test_markup_inside_code_stays_literal_escape() {
        // Escaping happened first, so the angle brackets inside the code
        // span are entities, never tags.
        assert_eq!(
            render_inline("`<div>`"),
            "<code>&lt;div&gt;</code>"
        );
    }
}
