// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! End-to-end renderer properties over the public API.

use kbchat::render::{parse, render_markdown, split, RenderNode, SegmentKind};

#[test]
fn marker_free_text_is_one_plain_segment() {
    let inputs = [
        "hello world",
        "two\nlines of prose",
        "punctuation !@#$%^&*() but no markers",
    ];
    for input in inputs {
        let segments = split(input);
        assert_eq!(segments.len(), 1, "input: {input:?}");
        assert_eq!(segments[0].kind, SegmentKind::Plain);
        assert_eq!(segments[0].body, input);
    }
}

#[test]
fn completed_message_renders_idempotently() {
    let input = "intro **bold**\n\n<think>reasoning</think>\n```rust\nfn f() {}\n```\nH|I\n-|-\n1|2\n- item\n";
    let first = render_markdown(input);
    let second = render_markdown(input);
    assert_eq!(first, second);
}

#[test]
fn fenced_block_label_and_body() {
    let html = render_markdown("```lang\ncode & more   \n```");
    assert!(html.contains(r#"<span class="code-lang">lang</span>"#));
    assert!(html.contains("<code class=\"language-lang\" data-lang=\"lang\">code &amp; more</code>"));
}

#[test]
fn table_detection_matches_contract() {
    let tree = parse("H1|H2\n---|---\nA|B");
    let RenderNode::Table(table) = &tree.nodes[0] else {
        panic!("expected a table node, got {:?}", tree.nodes[0]);
    };
    assert_eq!(table.headers, vec!["H1", "H2"]);
    assert_eq!(table.rows, vec![vec!["A", "B"]]);
}

#[test]
fn rows_padded_and_truncated_to_header_count() {
    let tree = parse("H1|H2\n---|---\nA|\nX|Y|Z");
    let RenderNode::Table(table) = &tree.nodes[0] else {
        panic!("expected a table node");
    };
    assert_eq!(table.rows[0], vec!["A", ""]);
    assert_eq!(table.rows[1], vec!["X", "Y"]);
}

#[test]
fn javascript_link_never_becomes_anchor() {
    let html = render_markdown("[x](javascript:alert(1))");
    assert!(!html.contains("<a"));
    assert!(html.contains('x'));
}

#[test]
fn unclosed_think_shows_loading_unless_empty() {
    let html = render_markdown("<think>partial reasoning");
    assert!(html.contains("partial reasoning"));
    assert!(html.contains("loading-indicator"));

    assert_eq!(render_markdown("<think>   "), "");
    assert_eq!(render_markdown("<think>"), "");
}

#[test]
fn wrapper_content_is_markdown_too() {
    let html = render_markdown("<knowledge_base>- fact one\n- fact two</knowledge_base>");
    assert!(html.contains("<ul><li>fact one</li><li>fact two</li></ul>"));

    let html = render_markdown(r#"<document index="1">**bold** citation</document>"#);
    assert!(html.contains("<strong>bold</strong>"));
}

#[test]
fn adversarial_truncations_never_panic() {
    let full = "pre <think>a **b** `c`\nH|I\n-|-\n1|2\n</think>```rust\nlet x = [1](http://e);\n``` done";
    for cut in 0..=full.len() {
        if full.is_char_boundary(cut) {
            // Every prefix must render to something without panicking.
            let _ = render_markdown(&full[..cut]);
        }
    }
}

#[test]
fn raw_html_in_plain_text_is_escaped() {
    let html = render_markdown("<script>alert(1)</script>");
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}
