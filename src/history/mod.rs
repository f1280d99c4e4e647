// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Conversation history: persistence and title heuristics.
//!
//! The store is SQLite-backed and holds conversations, their messages,
//! and a small settings table (knowledge-base folder path). The
//! renderer never touches it; it exists for the surrounding chat UI -
//! list/create/delete conversations, edit a message before a retry,
//! drop everything after the retried message.

mod storage;
mod titles;
mod types;

pub use storage::{HistoryStore, SCHEMA_VERSION};
pub use titles::{
    ensure_fallback_title, heuristic_title_from_user, is_bad_title, sanitize_title, truncate_chars,
};
pub use types::{Conversation, StoredMessage};

use crate::types::ChatMessage;

/// Convert the newest `tail` stored messages into wire-level chat
/// messages for the model transport.
///
/// Keep `tail` modest (10-20); the full history would blow the model's
/// context for long conversations.
pub fn build_chat_history(messages: &[StoredMessage], tail: usize) -> Vec<ChatMessage> {
    let start = messages.len().saturating_sub(tail);
    messages[start..]
        .iter()
        .map(|m| ChatMessage {
            role: m.role,
            content: m.content.clone(),
        })
        .collect()
}
