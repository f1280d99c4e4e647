// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! GitHub-style pipe-table detection inside plain-text segments.
//!
//! A candidate table is a header line containing a pipe, immediately
//! followed by an alignment-separator line whose cells each match
//! `:?-+:?`. The separator is intentionally laxer than CommonMark's
//! three-hyphen minimum: LM-generated tables frequently emit `---|---`
//! or even `-|-`, and rejecting them helps nobody.
//!
//! Detection starts at *any* line offset within a paragraph run, because
//! generated text routinely prefixes a table with an introductory
//! sentence in the same logical block. The separator row disambiguates
//! whether text before the header's first pipe is a header cell or
//! leading prose (see [`try_table_at`]).
//!
//! Full-width punctuation normalization is a heuristic tuned to one
//! model family's output quirks; it lives in [`normalize_pipes`] as an
//! isolated, swappable step rather than inside the grammar itself.

/// Per-column text-justification directive from the separator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    /// CSS class suffix used by the HTML emitter.
    pub fn css_class(self) -> &'static str {
        match self {
            Alignment::Left => "align-left",
            Alignment::Center => "align-center",
            Alignment::Right => "align-right",
        }
    }
}

/// A detected table. Every row has exactly `headers.len()` cells; short
/// rows were padded with empty strings, long rows truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBlock {
    pub headers: Vec<String>,
    pub alignments: Vec<Alignment>,
    pub rows: Vec<Vec<String>>,
}

/// A successful detection at some line offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMatch {
    pub table: TableBlock,
    /// Number of input lines consumed (header + separator + body rows).
    pub consumed: usize,
    /// Prose preceding the header's first pipe, emitted as its own
    /// paragraph before the table.
    pub leading_prose: Option<String>,
}

/// Map full-width punctuation variants to their ASCII equivalents.
///
/// Covers the full-width vertical bar, em and en dashes, the full-width
/// hyphen, and the non-breaking hyphen.
pub fn normalize_pipes(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '\u{FF5C}' => '|', // full-width vertical bar
            '\u{2014}' => '-', // em dash
            '\u{2013}' => '-', // en dash
            '\u{FF0D}' => '-', // full-width hyphen
            '\u{2011}' => '-', // non-breaking hyphen
            other => other,
        })
        .collect()
}

/// Whether one separator cell matches `:?-+:?` (optional colon, one or
/// more hyphens, optional colon).
fn is_separator_cell(cell: &str) -> bool {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return false;
    }
    let without_leading = trimmed.strip_prefix(':').unwrap_or(trimmed);
    let without_ends = without_leading.strip_suffix(':').unwrap_or(without_leading);
    !without_ends.is_empty() && without_ends.chars().all(|c| c == '-')
}

fn cell_alignment(cell: &str) -> Alignment {
    let trimmed = cell.trim();
    let left_colon = trimmed.starts_with(':');
    let right_colon = trimmed.ends_with(':') && trimmed.len() > 1;
    match (left_colon, right_colon) {
        (true, true) => Alignment::Center,
        (false, true) => Alignment::Right,
        _ => Alignment::Left,
    }
}

/// Split a line on pipes, trimming each cell and dropping the edge cells
/// produced by a leading or trailing pipe. Interior empty cells survive.
fn split_cells(line: &str) -> Vec<String> {
    let mut content = line.trim();
    if let Some(rest) = content.strip_prefix('|') {
        content = rest;
    }
    if let Some(rest) = content.strip_suffix('|') {
        content = rest;
    }
    content.split('|').map(|c| c.trim().to_string()).collect()
}

/// Parse the separator line. The portion before its first pipe is itself
/// a separator cell in the common `---|---` form; anything else there
/// means the grammar starts at the first pipe.
fn parse_separator(line: &str) -> Option<Vec<Alignment>> {
    let first_pipe = line.find('|')?;
    let prefix = line[..first_pipe].trim();
    let candidate = if prefix.is_empty() || is_separator_cell(prefix) {
        line
    } else {
        &line[first_pipe..]
    };
    let cells = split_cells(candidate);
    if cells.is_empty() || !cells.iter().all(|c| is_separator_cell(c)) {
        return None;
    }
    Some(cells.iter().map(|c| cell_alignment(c)).collect())
}

/// Try to detect a table whose header is `lines[i]`.
///
/// Returns `None` when the candidate is voided (no pipe, missing or
/// malformed separator), in which case the caller falls back to normal
/// paragraph handling. The separator's column count decides whether text
/// before the header's first pipe is a header cell ("H1|H2") or leading
/// prose ("Results so far |A|B|"); when neither count lines up the full
/// split wins and body rows are padded or truncated to it.
pub fn try_table_at(lines: &[&str], i: usize) -> Option<TableMatch> {
    let header_line = normalize_pipes(lines.get(i)?);
    let first_pipe = header_line.find('|')?;
    let separator_line = normalize_pipes(lines.get(i + 1)?);
    let alignments = parse_separator(&separator_line)?;

    let full_cells = split_cells(&header_line);
    let from_pipe_cells = split_cells(&header_line[first_pipe..]);
    let prefix = header_line[..first_pipe].trim();

    let (headers, leading_prose) = if full_cells.len() == alignments.len() || prefix.is_empty() {
        (full_cells, None)
    } else if from_pipe_cells.len() == alignments.len() {
        (from_pipe_cells, Some(prefix.to_string()))
    } else {
        (full_cells, None)
    };
    if headers.is_empty() {
        return None;
    }

    // Pad or truncate the alignment list to the header count so the
    // emitter can zip them blindly.
    let mut alignments = alignments;
    alignments.resize(headers.len(), Alignment::Left);

    let mut rows = Vec::new();
    let mut consumed = 2;
    for line in lines.iter().skip(i + 2) {
        let normalized = normalize_pipes(line);
        if normalized.trim().is_empty() || !normalized.contains('|') {
            break;
        }
        let mut cells = split_cells(&normalized);
        cells.resize(headers.len(), String::new());
        rows.push(cells);
        consumed += 1;
    }

    Some(TableMatch {
        table: TableBlock {
            headers,
            alignments,
            rows,
        },
        consumed,
        leading_prose,
    })
}
