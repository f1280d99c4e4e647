// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Conversation title heuristics.
//!
//! Model-generated titles are unreliable: they arrive wrapped in quotes,
//! prefixed with "Title:", padded with markup, or replaced entirely by a
//! polite refusal. These helpers clean up what the model returns and
//! fall back to a truncated slice of the user's first message when the
//! result is unusable.

use crate::error::StoreError;

use super::storage::HistoryStore;

/// Maximum title length in characters.
const TITLE_MAX_CHARS: usize = 20;

/// Truncate to `n` characters after collapsing all whitespace runs
/// (including newlines) to single spaces.
pub fn truncate_chars(s: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    let cut: String = collapsed.chars().take(n).collect();
    cut.trim_end().to_string()
}

/// Clean up a model-generated title.
///
/// Strips wrapping quote characters, removes any `<...>` tags, drops a
/// "Title:" prefix, then filters to letters, digits, spaces, hyphens and
/// underscores before collapsing whitespace and capping the length.
pub fn sanitize_title(title: &str) -> String {
    let mut title = title
        .trim()
        .trim_matches(|c: char| "\"'\u{201C}\u{201D}\u{2018}\u{2019}\u{300C}\u{300D}`".contains(c))
        .to_string();

    // Remove any <...> tag spans.
    while let Some(start) = title.find('<') {
        match title[start..].find('>') {
            Some(rel_end) => {
                let end = start + rel_end;
                title.replace_range(start..=end, "");
            }
            None => break,
        }
    }

    // Models love prefixing the answer with the word "Title".
    if let Some(i) = title.to_ascii_lowercase().rfind("title") {
        let sub = title[i..]
            .trim_start_matches(|c: char| c.is_alphabetic())
            .trim_start_matches([':', '\u{FF1A}'])
            .trim();
        title = sub.to_string();
    }

    let filtered: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();
    truncate_chars(&filtered, TITLE_MAX_CHARS)
}

/// Derive a title directly from the user's message by stripping leading
/// politeness and imperative boilerplate.
pub fn heuristic_title_from_user(s: &str) -> String {
    let mut s = s.trim().trim_start_matches(|c: char| ",.!? \u{3002}\u{FF0C}\u{FF01}\u{FF1F}".contains(c));
    for prefix in [
        "please ", "could you ", "can you ", "help me ", "i need you to ",
    ] {
        if let Some(rest) = strip_prefix_ignore_case(s, prefix) {
            s = rest.trim_start();
        }
    }
    for prefix in [
        "write a ", "write ", "summarize ", "explain ", "describe ", "give me ", "list ",
    ] {
        if let Some(rest) = strip_prefix_ignore_case(s, prefix) {
            s = rest.trim_start();
        }
    }
    let s = s.trim_start_matches(|c: char| ",.!? ".contains(c));
    truncate_chars(s, TITLE_MAX_CHARS)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    // A multibyte char straddling the prefix length makes the byte slice
    // invalid; get() refuses that instead of panicking.
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// Whether a generated title should be rejected in favor of a fallback.
///
/// Rejects empty titles, titles identical to the fallback, very short
/// ones, and the usual assistant filler openings.
pub fn is_bad_title(title: &str, fallback: &str) -> bool {
    let title = title.trim();
    if title.is_empty() || title == fallback {
        return true;
    }
    if title.chars().count() < 4 {
        return true;
    }
    let lower = title.to_lowercase();
    for prefix in ["okay", "sure", "hello", "hi ", "got it"] {
        if lower.starts_with(prefix) {
            return true;
        }
    }
    for keyword in ["i will", "i'll try", "happy to help", "let me know"] {
        if lower.contains(keyword) {
            return true;
        }
    }
    false
}

/// Give a conversation still named "New chat" (or blank) a title cut
/// from the user's text. Conversations the user already renamed are
/// left alone.
pub fn ensure_fallback_title(
    store: &HistoryStore,
    conversation_id: i64,
    user_text: &str,
) -> Result<(), StoreError> {
    let conversation = match store.get_conversation(conversation_id) {
        Ok(c) => c,
        Err(StoreError::ConversationNotFound(_)) => return Ok(()),
        Err(e) => return Err(e),
    };
    if !conversation.title.trim().is_empty() && conversation.title != "New chat" {
        return Ok(());
    }
    let mut title = truncate_chars(user_text, TITLE_MAX_CHARS);
    if title.is_empty() {
        title = "New chat".to_string();
    }
    store.update_title(conversation_id, &title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_collapses_whitespace() {
        assert_eq!(truncate_chars("a\n b\t\tc", 10), "a b c");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_sanitize_strips_quotes_and_tags() {
        assert_eq!(sanitize_title("\"Project <b>plan</b>\""), "Project plan");
    }

    #[test]
    fn test_sanitize_strips_title_prefix() {
        assert_eq!(sanitize_title("Title: Weekly report"), "Weekly report");
    }

    #[test]
    fn test_sanitize_filters_punctuation() {
        assert_eq!(sanitize_title("Q3! (draft) #2"), "Q3 draft 2");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "word ".repeat(20);
        assert!(sanitize_title(&long).chars().count() <= 20);
    }

    #[test]
    fn test_heuristic_strips_boilerplate() {
        assert_eq!(
            heuristic_title_from_user("Please summarize the quarterly results"),
            "the quarterly result"
        );
    }

    #[test]
    fn test_heuristic_multibyte_at_prefix_boundary() {
        // "pleaseé" puts a two-byte char exactly where "please " ends;
        // the prefix must not match and nothing may panic.
        assert_eq!(
            heuristic_title_from_user("pleaseé tell me more"),
            "pleaseé tell me more"
        );
        assert_eq!(heuristic_title_from_user("écrire un résumé"), "écrire un résumé");
        assert_eq!(heuristic_title_from_user("é"), "é");
    }

    #[test]
    fn test_is_bad_title() {
        assert!(is_bad_title("", "New chat"));
        assert!(is_bad_title("New chat", "New chat"));
        assert!(is_bad_title("abc", "New chat"));
        assert!(is_bad_title("Sure, here you go", "New chat"));
        assert!(is_bad_title("I will do my best", "New chat"));
        assert!(!is_bad_title("Deploy checklist", "New chat"));
    }

    #[test]
    fn test_ensure_fallback_title() {
        let store = HistoryStore::open_in_memory().unwrap();
        let conv = store.create_conversation("New chat").unwrap();
        ensure_fallback_title(&store, conv.id, "how do I bake bread at home").unwrap();
        let updated = store.get_conversation(conv.id).unwrap();
        assert_eq!(updated.title, "how do I bake bread");
    }

    #[test]
    fn test_ensure_fallback_title_keeps_user_named() {
        let store = HistoryStore::open_in_memory().unwrap();
        let conv = store.create_conversation("My project").unwrap();
        ensure_fallback_title(&store, conv.id, "unrelated text").unwrap();
        assert_eq!(store.get_conversation(conv.id).unwrap().title, "My project");
    }
}
