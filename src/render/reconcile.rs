// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Render-state reconciler: carries think-block expansion across renders.
//!
//! Expansion flags are keyed by the *ordinal position* of think nodes in
//! document order, not by content hash - content keeps changing while the
//! stream is still arriving, so there is no stable identity to key on.
//! Positional matching is a best-effort heuristic: if the number or order
//! of think blocks changes non-monotonically between renders, a flag can
//! attach to the wrong block. That is a documented limitation, not a bug
//! to engineer around.

use super::inline::DEFAULT_ORIGIN;
use super::node::{parse, RenderNode, RenderTree};

/// Expansion flags for think blocks, in document order.
pub type CollapsibleState = Vec<bool>;

/// Capture the expanded/collapsed flag of every think node in order.
pub fn capture(tree: &RenderTree) -> CollapsibleState {
    let mut flags = Vec::new();
    tree.visit_think(&mut |node| {
        if let RenderNode::Think { expanded, .. } = node {
            flags.push(*expanded);
        }
    });
    flags
}

/// Reapply captured flags by ordinal position. Think nodes beyond the
/// captured count are newly appeared and default to expanded.
pub fn apply(tree: &mut RenderTree, flags: &CollapsibleState) {
    let mut i = 0;
    tree.visit_think_mut(&mut |expanded| {
        *expanded = flags.get(i).copied().unwrap_or(true);
        i += 1;
    });
}

/// Stateful renderer for one message slot.
///
/// Each call to [`Renderer::render`] reprocesses the whole accumulated
/// string (the documented O(n squared)-over-the-stream simplicity trade,
/// bounded in practice by message length) and threads the collapsible
/// state from the previous tree into the new one.
#[derive(Debug)]
pub struct Renderer {
    tree: RenderTree,
    origin: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::with_origin(DEFAULT_ORIGIN)
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer resolving relative link targets against `origin`,
    /// normally the configured application origin.
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            tree: RenderTree::default(),
            origin: origin.into(),
        }
    }

    /// Re-render from the full accumulated raw text, preserving think
    /// expansion by ordinal correspondence with the previous tree.
    pub fn render(&mut self, raw: &str) -> &RenderTree {
        let flags = capture(&self.tree);
        let mut tree = parse(raw);
        apply(&mut tree, &flags);
        self.tree = tree;
        &self.tree
    }

    /// The tree from the most recent render.
    pub fn tree(&self) -> &RenderTree {
        &self.tree
    }

    /// HTML for the most recent render.
    pub fn html(&self) -> String {
        self.tree.to_html_with_origin(&self.origin)
    }

    /// Record a user toggle on the think block at `ordinal`.
    ///
    /// Out-of-range ordinals are ignored; the hosting layer may race a
    /// toggle against a re-render that dropped the block.
    pub fn set_expanded(&mut self, ordinal: usize, value: bool) {
        let mut i = 0;
        self.tree.visit_think_mut(&mut |expanded| {
            if i == ordinal {
                *expanded = value;
            }
            i += 1;
        });
    }

    /// Reset for a new message in the same slot.
    pub fn reset(&mut self) {
        self.tree = RenderTree::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_apply_roundtrip() {
        let mut renderer = Renderer::new();
        renderer.render("<think>a</think><think>b</think>");
        renderer.set_expanded(1, false);

        // Same block count and order: both flags survive the re-render.
        renderer.render("<think>a more</think><think>b more</think>tail");
        assert_eq!(capture(renderer.tree()), vec![true, false]);
    }

    #[test]
    fn test_new_think_defaults_expanded() {
        let mut renderer = Renderer::new();
        renderer.render("<think>a</think>");
        renderer.set_expanded(0, false);

        renderer.render("<think>a</think><think>fresh</think>");
        assert_eq!(capture(renderer.tree()), vec![false, true]);
    }

    #[test]
    fn test_positional_shift_is_accepted_fragility() {
        let mut renderer = Renderer::new();
        renderer.render("<think>a</think><think>b</think>");
        renderer.set_expanded(0, false);

        // The first block disappears; its flag attaches to the survivor.
        renderer.render("<think>b</think>");
        assert_eq!(capture(renderer.tree()), vec![false]);
    }

    #[test]
    fn test_nested_think_counts_in_document_order() {
        let mut renderer = Renderer::new();
        renderer.render(r#"<document index="1"><think>inner</think></document><think>outer</think>"#);
        renderer.set_expanded(0, false);
        assert_eq!(capture(renderer.tree()), vec![false, true]);
    }

    #[test]
    fn test_expanded_reflected_in_html() {
        let mut renderer = Renderer::new();
        renderer.render("<think>a</think>");
        assert!(renderer.html().contains(" open>"));
        renderer.set_expanded(0, false);
        assert!(!renderer.html().contains(" open>"));
    }

    #[test]
    fn test_configured_origin_reaches_links() {
        let mut renderer = Renderer::with_origin("ftp://files.local");
        renderer.render("[report](/q3.pdf)");
        assert!(!renderer.html().contains("<a"));

        let mut renderer = Renderer::with_origin("https://kb.local");
        renderer.render("[report](/q3.pdf)");
        assert!(renderer.html().contains(r#"<a href="/q3.pdf""#));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut renderer = Renderer::new();
        renderer.render("<think>a</think>");
        renderer.set_expanded(0, false);
        renderer.reset();
        renderer.render("<think>a</think>");
        assert_eq!(capture(renderer.tree()), vec![true]);
    }
}
