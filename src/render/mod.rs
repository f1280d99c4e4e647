// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Progressive markdown-like renderer for streamed LM output.
//!
//! The core is a single-pass, two-level design:
//!
//! - [`segment`] splits the accumulated raw text into typed segments
//!   (fenced code, think, document, knowledge_base, plain), treating
//!   end-of-input as an implicit closer for the rightmost segment while
//!   the stream is still open.
//! - [`table`] detects GitHub-style pipe tables at any line offset
//!   inside a plain segment; everything else becomes paragraphs and
//!   lists.
//! - [`inline`] converts one plain-text unit into escaped HTML with
//!   bold, inline-code and safe-link substitutions.
//! - [`node`] is the output tree, a pure function of the raw text.
//! - [`reconcile`] preserves collapsible think-block state across
//!   re-renders by ordinal position.
//!
//! Every layer is total over arbitrary strings: partial LM output is
//! adversarial by construction (it can truncate at any byte), so nothing
//! in here panics or returns an error.

pub mod inline;
pub mod node;
pub mod reconcile;
pub mod segment;
pub mod table;

pub use inline::{escape_html, is_safe_url, render_inline, render_inline_with_origin, DEFAULT_ORIGIN};
pub use node::{parse, RenderNode, RenderTree};
pub use reconcile::{apply, capture, CollapsibleState, Renderer};
pub use segment::{split, Segment, SegmentKind};
pub use table::{normalize_pipes, try_table_at, Alignment, TableBlock, TableMatch};

/// One-shot convenience: raw text straight to an HTML fragment.
///
/// Equivalent to `parse(text).to_html()`; used for completed messages
/// where no collapsible state needs to be threaded through.
pub fn render_markdown(text: &str) -> String {
    parse(text).to_html()
}

/// [`render_markdown`] with an explicit origin for relative-link
/// resolution, normally the configured application origin.
pub fn render_markdown_with_origin(text: &str, origin: &str) -> String {
    parse(text).to_html_with_origin(origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_idempotent() {
        let input = "intro\n\n```rust\nfn f() {}\n```\n- a\n- b\n";
        assert_eq!(render_markdown(input), render_markdown(input));
    }

    #[test]
    fn test_empty_input_empty_fragment() {
        assert_eq!(render_markdown(""), "");
    }
}
