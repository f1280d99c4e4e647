// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Block splitter: partitions accumulated raw text into typed segments.
//!
//! The splitter is a single regex-driven scan over the whole accumulated
//! string. It recognizes four opener patterns in priority order at each
//! scan position - a triple-backtick code fence, `<think>`, `<document
//! index="N">`, and `<knowledge_base>` - and pairs each with its closer.
//! A missing closer means the stream is still arriving; the segment is
//! implicitly closed at end-of-input, which by construction can only
//! happen to the rightmost segment.
//!
//! The splitter is total: any string, including arbitrary truncations of
//! well-formed markup, produces a valid segment sequence. Malformed
//! markup (a document tag without an index attribute, a stray `</think>`)
//! simply stays in a Plain segment.

use once_cell::sync::Lazy;
use regex::Regex;

/// Classification of a raw-text span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Fenced code block (triple backticks).
    CodeBlock,
    /// Collapsible reasoning-trace wrapper.
    Think,
    /// Citation wrapper carrying a document index.
    Document,
    /// Knowledge-base context wrapper.
    KnowledgeBase,
    /// Unmarked text, later scanned for tables, lists and paragraphs.
    Plain,
}

/// A maximal span of raw text classified as one block kind.
///
/// Segments are produced fresh on every render call and never mutated in
/// place. `closed` is false only while streaming is active, and only for
/// the final segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Whether the segment's closer was present in the input.
    pub closed: bool,
    /// Verbatim contents between opener and closer.
    pub body: String,
    /// Language tag for code blocks (may be empty).
    pub lang: Option<String>,
    /// Document index for document blocks.
    pub index: Option<u32>,
}

impl Segment {
    fn plain(body: &str) -> Self {
        Segment {
            kind: SegmentKind::Plain,
            closed: true,
            body: body.to_string(),
            lang: None,
            index: None,
        }
    }
}

/// Opener alternation. Leftmost match wins; the alternation order encodes
/// the priority between patterns starting at the same position.
static OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(```)|(<think>)|(<document\s+index="(\d+)"\s*>)|(<knowledge_base>)"#)
        .expect("opener pattern is valid")
});

static THINK_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</think>").expect("closer pattern is valid"));
static DOCUMENT_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</document>").expect("closer pattern is valid"));
static KNOWLEDGE_BASE_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</knowledge_base>").expect("closer pattern is valid"));

/// Split accumulated raw text into an ordered segment sequence.
///
/// Matching is non-overlapping and leftmost-first. Wrapper contents are
/// captured verbatim here; recursion into think/document/knowledge_base
/// bodies happens when the render tree is built.
pub fn split(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let Some(m) = OPENER.captures(&text[pos..]) else {
            segments.push(Segment::plain(&text[pos..]));
            break;
        };
        let whole = m.get(0).expect("capture 0 always present");
        if whole.start() > 0 {
            segments.push(Segment::plain(&text[pos..pos + whole.start()]));
        }
        let after = pos + whole.end();

        if m.get(1).is_some() {
            let (segment, next) = scan_code_block(text, after);
            segments.push(segment);
            pos = next;
        } else if m.get(2).is_some() {
            let (segment, next) = scan_wrapper(text, after, SegmentKind::Think, &THINK_CLOSE, None);
            segments.push(segment);
            pos = next;
        } else if m.get(3).is_some() {
            // The opener regex guarantees the index digits parse; an
            // out-of-range value still degrades to index 0 rather than
            // aborting the scan.
            let index = m
                .get(4)
                .and_then(|g| g.as_str().parse::<u32>().ok())
                .unwrap_or(0);
            let (segment, next) =
                scan_wrapper(text, after, SegmentKind::Document, &DOCUMENT_CLOSE, Some(index));
            segments.push(segment);
            pos = next;
        } else {
            let (segment, next) = scan_wrapper(
                text,
                after,
                SegmentKind::KnowledgeBase,
                &KNOWLEDGE_BASE_CLOSE,
                None,
            );
            segments.push(segment);
            pos = next;
        }
    }

    segments
}

/// Scan a fenced code block starting just after the opening fence.
///
/// The remainder of the opening line is the language tag; everything up
/// to the closing fence (or end of input) is the body, verbatim.
fn scan_code_block(text: &str, after_fence: usize) -> (Segment, usize) {
    let rest = &text[after_fence..];
    let (lang, body_start) = match rest.find('\n') {
        Some(nl) => (rest[..nl].trim().to_string(), nl + 1),
        None => (rest.trim().to_string(), rest.len()),
    };
    let body_rest = &rest[body_start..];
    let (body, closed, consumed) = match body_rest.find("```") {
        Some(end) => (&body_rest[..end], true, end + 3),
        None => (body_rest, false, body_rest.len()),
    };
    (
        Segment {
            kind: SegmentKind::CodeBlock,
            closed,
            body: body.to_string(),
            lang: Some(lang),
            index: None,
        },
        after_fence + body_start + consumed,
    )
}

/// Scan a tag wrapper body up to its case-insensitive closer.
fn scan_wrapper(
    text: &str,
    after_opener: usize,
    kind: SegmentKind,
    closer: &Regex,
    index: Option<u32>,
) -> (Segment, usize) {
    let rest = &text[after_opener..];
    let (body, closed, consumed) = match closer.find(rest) {
        Some(m) => (&rest[..m.start()], true, m.end()),
        None => (rest, false, rest.len()),
    };
    (
        Segment {
            kind,
            closed,
            body: body.to_string(),
            lang: None,
            index,
        },
        after_opener + consumed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_only() {
        let segments = split("hello world, no markers here");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Plain);
        assert_eq!(segments[0].body, "hello world, no markers here");
    }

    #[test]
    fn test_empty_input() {
        assert!(split("").is_empty());
    }

    #[test]
    fn test_closed_code_block() {
        let segments = split("before\n```rust\nfn main() {}\n```\nafter");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].body, "before\n");
        assert_eq!(segments[1].kind, SegmentKind::CodeBlock);
        assert!(segments[1].closed);
        assert_eq!(segments[1].lang.as_deref(), Some("rust"));
        assert_eq!(segments[1].body, "fn main() {}\n");
        assert_eq!(segments[2].body, "\nafter");
    }

    #[test]
    fn test_unclosed_code_block() {
        let segments = split("```python\nprint(1)");
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].closed);
        assert_eq!(segments[0].lang.as_deref(), Some("python"));
        assert_eq!(segments[0].body, "print(1)");
    }

    #[test]
    fn test_code_block_empty_lang() {
        let segments = split("```\nx\n```");
        assert_eq!(segments[0].lang.as_deref(), Some(""));
        assert_eq!(segments[0].body, "x\n");
    }

    #[test]
    fn test_think_closed() {
        let segments = split("<think>hmm</think>answer");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].kind, SegmentKind::Think);
        assert!(segments[0].closed);
        assert_eq!(segments[0].body, "hmm");
        assert_eq!(segments[1].body, "answer");
    }

    #[test]
    fn test_think_closer_case_insensitive() {
        let segments = split("<think>hmm</THINK>rest");
        assert!(segments[0].closed);
        assert_eq!(segments[1].body, "rest");
    }

    #[test]
    fn test_think_unclosed() {
        let segments = split("<think>still going");
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].closed);
        assert_eq!(segments[0].body, "still going");
    }

    #[test]
    fn test_partial_opener_is_plain() {
        let segments = split("<thi");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Plain);
    }

    #[test]
    fn test_document_with_index() {
        let segments = split(r#"<document index="3">cited text</document>"#);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Document);
        assert_eq!(segments[0].index, Some(3));
        assert_eq!(segments[0].body, "cited text");
    }

    #[test]
    fn test_document_missing_index_falls_through() {
        let segments = split("<document>no index</document>");
        // The malformed tag never matches an opener; the text stays plain.
        assert!(segments.iter().all(|s| s.kind == SegmentKind::Plain));
    }

    #[test]
    fn test_knowledge_base() {
        let segments = split("<knowledge_base>facts</knowledge_base>tail");
        assert_eq!(segments[0].kind, SegmentKind::KnowledgeBase);
        assert!(segments[0].closed);
        assert_eq!(segments[0].body, "facts");
        assert_eq!(segments[1].body, "tail");
    }

    #[test]
    fn test_code_fence_inside_think_body_not_special() {
        // The think closer search is a plain scan; backticks inside the
        // body do not terminate the wrapper.
        let segments = split("<think>use ```code``` blocks</think>");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].body, "use ```code``` blocks");
    }

    #[test]
    fn test_unclosed_only_last() {
        let segments = split("<think>a</think>text```js\nlet x");
        assert_eq!(segments.len(), 3);
        assert!(segments[0].closed);
        assert!(segments[1].closed);
        assert!(!segments[2].closed);
    }
}
