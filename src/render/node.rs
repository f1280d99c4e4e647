// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Render tree: typed nodes mirroring the segment kinds, plus the block
//! structures found inside plain segments (tables, lists, paragraphs).
//!
//! The tree is a pure function of the raw accumulated text - rendering
//! the same string twice yields an identical tree and identical HTML.
//! Interactive state (think-block expansion) is applied afterwards by the
//! reconciler; it is the only mutation the tree ever sees.

use once_cell::sync::Lazy;
use regex::Regex;

use super::inline::{escape_html, render_inline_with_origin, DEFAULT_ORIGIN};
use super::segment::{split, Segment, SegmentKind};
use super::table::{try_table_at, TableBlock};

/// Nesting cap for wrapper recursion. Beyond this depth wrapper bodies
/// are rendered as flat paragraphs, which keeps pathological input from
/// consuming the call stack.
const MAX_DEPTH: usize = 8;

/// One node of the renderer's output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderNode {
    CodeBlock {
        lang: String,
        body: String,
        closed: bool,
    },
    Think {
        children: Vec<RenderNode>,
        closed: bool,
        /// Collapsible UI state, default expanded; reassigned by the
        /// reconciler between renders.
        expanded: bool,
    },
    Document {
        index: u32,
        children: Vec<RenderNode>,
    },
    KnowledgeBase {
        children: Vec<RenderNode>,
    },
    Table(TableBlock),
    List {
        items: Vec<String>,
    },
    Paragraph(String),
    LineBreak,
}

/// The full output tree for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderTree {
    pub nodes: Vec<RenderNode>,
}

/// Parse accumulated raw text into a render tree.
///
/// Total over all inputs; truncated or adversarial markup degrades to
/// plain paragraphs instead of failing.
pub fn parse(text: &str) -> RenderTree {
    RenderTree {
        nodes: build_nodes(text, 0),
    }
}

fn build_nodes(text: &str, depth: usize) -> Vec<RenderNode> {
    let mut nodes = Vec::new();
    for segment in split(text) {
        match segment.kind {
            SegmentKind::CodeBlock => nodes.push(RenderNode::CodeBlock {
                lang: segment.lang.unwrap_or_default(),
                body: segment.body,
                closed: segment.closed,
            }),
            SegmentKind::Think => {
                // Empty reasoning traces produce nothing at all.
                if segment.body.trim().is_empty() {
                    continue;
                }
                nodes.push(RenderNode::Think {
                    children: nested(&segment.body, depth),
                    closed: segment.closed,
                    expanded: true,
                });
            }
            SegmentKind::Document => nodes.push(RenderNode::Document {
                index: segment.index.unwrap_or(0),
                children: nested(&segment.body, depth),
            }),
            SegmentKind::KnowledgeBase => nodes.push(RenderNode::KnowledgeBase {
                children: nested(&segment.body, depth),
            }),
            SegmentKind::Plain => scan_plain(&segment.body, &mut nodes),
        }
    }
    nodes
}

/// Recurse into a wrapper body, flattening to paragraphs at the depth cap.
fn nested(body: &str, depth: usize) -> Vec<RenderNode> {
    if depth >= MAX_DEPTH {
        let mut nodes = Vec::new();
        scan_plain(body, &mut nodes);
        nodes
    } else {
        build_nodes(body, depth + 1)
    }
}

static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*[-*])\s+(.*)$").expect("list pattern is valid"));

/// Scan a plain segment for tables, lists, blank lines and paragraphs.
fn scan_plain(body: &str, nodes: &mut Vec<RenderNode>) {
    let cleaned: Vec<String> = body.lines().map(|l| l.replace('\r', "")).collect();
    let lines: Vec<&str> = cleaned.iter().map(String::as_str).collect();

    let mut i = 0;
    let mut list_items: Vec<String> = Vec::new();
    while i < lines.len() {
        if let Some(m) = try_table_at(&lines, i) {
            flush_list(&mut list_items, nodes);
            if let Some(prose) = m.leading_prose {
                nodes.push(RenderNode::Paragraph(prose));
            }
            nodes.push(RenderNode::Table(m.table));
            i += m.consumed;
            continue;
        }
        let line = lines[i];
        if let Some(caps) = LIST_ITEM.captures(line) {
            list_items.push(caps[2].to_string());
        } else {
            flush_list(&mut list_items, nodes);
            if line.trim().is_empty() {
                nodes.push(RenderNode::LineBreak);
            } else {
                nodes.push(RenderNode::Paragraph(line.to_string()));
            }
        }
        i += 1;
    }
    flush_list(&mut list_items, nodes);
}

fn flush_list(items: &mut Vec<String>, nodes: &mut Vec<RenderNode>) {
    if !items.is_empty() {
        nodes.push(RenderNode::List {
            items: std::mem::take(items),
        });
    }
}

impl RenderTree {
    /// Emit the whole tree as one HTML fragment, resolving relative
    /// link targets against [`DEFAULT_ORIGIN`].
    pub fn to_html(&self) -> String {
        self.to_html_with_origin(DEFAULT_ORIGIN)
    }

    /// Emit the whole tree with an explicit origin for link resolution.
    pub fn to_html_with_origin(&self, origin: &str) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_html(&mut out, origin);
        }
        out
    }

    /// Visit every think node in document order.
    pub fn visit_think<F: FnMut(&RenderNode)>(&self, f: &mut F) {
        for node in &self.nodes {
            node.visit_think(f);
        }
    }

    /// Visit every think node mutably in document order.
    pub fn visit_think_mut<F: FnMut(&mut bool)>(&mut self, f: &mut F) {
        for node in &mut self.nodes {
            node.visit_think_mut(f);
        }
    }
}

impl RenderNode {
    fn visit_think<F: FnMut(&RenderNode)>(&self, f: &mut F) {
        match self {
            RenderNode::Think { children, .. } => {
                f(self);
                for child in children {
                    child.visit_think(f);
                }
            }
            RenderNode::Document { children, .. } | RenderNode::KnowledgeBase { children } => {
                for child in children {
                    child.visit_think(f);
                }
            }
            _ => {}
        }
    }

    fn visit_think_mut<F: FnMut(&mut bool)>(&mut self, f: &mut F) {
        match self {
            RenderNode::Think {
                children, expanded, ..
            } => {
                f(expanded);
                for child in children {
                    child.visit_think_mut(f);
                }
            }
            RenderNode::Document { children, .. } | RenderNode::KnowledgeBase { children } => {
                for child in children {
                    child.visit_think_mut(f);
                }
            }
            _ => {}
        }
    }

    fn write_html(&self, out: &mut String, origin: &str) {
        match self {
            RenderNode::CodeBlock { lang, body, .. } => {
                let label = if lang.is_empty() { "code" } else { lang };
                let attrs = if lang.is_empty() {
                    String::new()
                } else {
                    format!(
                        r#" class="language-{}" data-lang="{}""#,
                        escape_html(lang),
                        escape_html(lang)
                    )
                };
                out.push_str(&format!(
                    concat!(
                        r#"<div class="code-block"><div class="code-block-header">"#,
                        r#"<span class="code-lang">{}</span>"#,
                        r#"<button class="copy-btn" type="button">Copy</button></div>"#,
                        r#"<pre><code{}>{}</code></pre></div>"#
                    ),
                    escape_html(label),
                    attrs,
                    escape_html(body.trim_end())
                ));
            }
            RenderNode::Think {
                children,
                closed,
                expanded,
            } => {
                out.push_str(if *expanded {
                    r#"<details class="think-block" open><summary>Reasoning</summary><div class="think-body">"#
                } else {
                    r#"<details class="think-block"><summary>Reasoning</summary><div class="think-body">"#
                });
                for child in children {
                    child.write_html(out, origin);
                }
                if !closed {
                    out.push_str(r#"<span class="loading-indicator"></span>"#);
                }
                out.push_str("</div></details>");
            }
            RenderNode::Document { index, children } => {
                out.push_str(&format!(
                    r#"<div class="document-block" data-index="{index}"><div class="document-header">Document {index}</div><div class="document-body">"#
                ));
                for child in children {
                    child.write_html(out, origin);
                }
                out.push_str("</div></div>");
            }
            RenderNode::KnowledgeBase { children } => {
                out.push_str(
                    r#"<div class="kb-block"><div class="kb-header">Knowledge base</div><div class="kb-body">"#,
                );
                for child in children {
                    child.write_html(out, origin);
                }
                out.push_str("</div></div>");
            }
            RenderNode::Table(table) => write_table_html(table, out, origin),
            RenderNode::List { items } => {
                out.push_str("<ul>");
                for item in items {
                    out.push_str(&format!("<li>{}</li>", render_inline_with_origin(item, origin)));
                }
                out.push_str("</ul>");
            }
            RenderNode::Paragraph(text) => {
                out.push_str(&format!("<p>{}</p>", render_inline_with_origin(text, origin)));
            }
            RenderNode::LineBreak => out.push_str("<br />"),
        }
    }
}

/// Emit a table inside one scrollable container. Cell content goes
/// through the inline renderer so emphasis, code and links work in cells.
fn write_table_html(table: &TableBlock, out: &mut String, origin: &str) {
    out.push_str(r#"<div class="table-scroll"><table><thead><tr>"#);
    for (header, align) in table.headers.iter().zip(&table.alignments) {
        out.push_str(&format!(
            r#"<th class="{}">{}</th>"#,
            align.css_class(),
            render_inline_with_origin(header, origin)
        ));
    }
    out.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for (cell, align) in row.iter().zip(&table.alignments) {
            out.push_str(&format!(
                r#"<td class="{}">{}</td>"#,
                align.css_class(),
                render_inline_with_origin(cell, origin)
            ));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table></div>");
}
