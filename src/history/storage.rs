// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! SQLite-backed conversation history store.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::StoreError;
use crate::types::Role;

use super::types::{Conversation, StoredMessage};

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Conversation history storage using SQLite.
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open or create a history database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        // WAL for better concurrency with the streaming writer
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an in-memory store, used by tests and the CLI dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_conversations_updated_at ON conversations(updated_at DESC);
            CREATE INDEX IF NOT EXISTS idx_messages_conversation_id ON messages(conversation_id);
            "#,
        )?;

        let current: Option<u32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        if current.is_none() {
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?)",
                params![SCHEMA_VERSION],
            )?;
        }
        Ok(())
    }

    /// Create a new conversation with the given title.
    pub fn create_conversation(&self, title: &str) -> Result<Conversation, StoreError> {
        let now = chrono::Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO conversations (title, created_at, updated_at) VALUES (?, ?, ?)",
            params![title, now, now],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, title, "created conversation");
        Ok(Conversation {
            id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// List conversations, most recently updated first.
    pub fn list_conversations(&self, limit: usize) -> Result<Vec<Conversation>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, created_at, updated_at FROM conversations
             ORDER BY updated_at DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(params![limit as i64], row_to_conversation)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Fetch one conversation by id.
    pub fn get_conversation(&self, id: i64) -> Result<Conversation, StoreError> {
        self.conn
            .query_row(
                "SELECT id, title, created_at, updated_at FROM conversations WHERE id = ?",
                params![id],
                row_to_conversation,
            )
            .optional()?
            .ok_or(StoreError::ConversationNotFound(id))
    }

    /// Update a conversation's title.
    pub fn update_title(&self, id: i64, title: &str) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE conversations SET title = ?, updated_at = ? WHERE id = ?",
            params![title, chrono::Utc::now().timestamp(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::ConversationNotFound(id));
        }
        Ok(())
    }

    /// Delete one conversation and its messages.
    pub fn delete_conversation(&self, id: i64) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM messages WHERE conversation_id = ?", params![id])?;
        let changed = self
            .conn
            .execute("DELETE FROM conversations WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(StoreError::ConversationNotFound(id));
        }
        Ok(())
    }

    /// Delete several conversations at once (batch selection in the UI).
    pub fn delete_conversations(&self, ids: &[i64]) -> Result<(), StoreError> {
        for &id in ids {
            // Missing ids are skipped rather than aborting the batch.
            match self.delete_conversation(id) {
                Ok(()) | Err(StoreError::ConversationNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Append a message and bump the conversation's updated_at.
    pub fn save_message(
        &self,
        conversation_id: i64,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage, StoreError> {
        let now = chrono::Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO messages (conversation_id, role, content, created_at) VALUES (?, ?, ?, ?)",
            params![conversation_id, role.as_str(), content, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn.execute(
            "UPDATE conversations SET updated_at = ? WHERE id = ?",
            params![now, conversation_id],
        )?;
        Ok(StoredMessage {
            id,
            conversation_id,
            role,
            content: content.to_string(),
            created_at: now,
        })
    }

    /// All messages of a conversation in chronological order.
    pub fn list_messages(&self, conversation_id: i64) -> Result<Vec<StoredMessage>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, conversation_id, role, content, created_at FROM messages
             WHERE conversation_id = ? ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![conversation_id], row_to_message)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// The newest `limit` messages, returned in chronological order.
    pub fn history(
        &self,
        conversation_id: i64,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, conversation_id, role, content, created_at FROM messages
             WHERE conversation_id = ? ORDER BY id DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(params![conversation_id, limit as i64], row_to_message)?;
        let mut messages = rows.collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    /// The most recent user message, if any.
    pub fn last_user_message(
        &self,
        conversation_id: i64,
    ) -> Result<Option<StoredMessage>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, conversation_id, role, content, created_at FROM messages
                 WHERE conversation_id = ? AND role = 'user' ORDER BY id DESC LIMIT 1",
                params![conversation_id],
                row_to_message,
            )
            .optional()?)
    }

    /// The first user message, used to seed title generation.
    pub fn first_user_message(
        &self,
        conversation_id: i64,
    ) -> Result<Option<StoredMessage>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, conversation_id, role, content, created_at FROM messages
                 WHERE conversation_id = ? AND role = 'user' ORDER BY id ASC LIMIT 1",
                params![conversation_id],
                row_to_message,
            )
            .optional()?)
    }

    /// Replace the content of one message (user edit before a retry).
    pub fn update_message_content(
        &self,
        conversation_id: i64,
        message_id: i64,
        content: &str,
    ) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE messages SET content = ? WHERE id = ? AND conversation_id = ?",
            params![content, message_id, conversation_id],
        )?;
        if changed == 0 {
            return Err(StoreError::MessageNotFound(message_id));
        }
        Ok(())
    }

    /// Delete every message after the given one, preparing a retry.
    pub fn delete_messages_after(
        &self,
        conversation_id: i64,
        message_id: i64,
    ) -> Result<usize, StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM messages WHERE conversation_id = ? AND id > ?",
            params![conversation_id, message_id],
        )?;
        Ok(deleted)
    }

    /// Read a settings value.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Write a settings value.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Configured knowledge-base folder, if set.
    pub fn kb_folder(&self) -> Result<Option<String>, StoreError> {
        self.get_setting("kb_folder")
    }

    /// Persist the knowledge-base folder path.
    pub fn set_kb_folder(&self, path: &str) -> Result<(), StoreError> {
        self.set_setting("kb_folder", path)
    }
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredMessage> {
    let role: String = row.get(2)?;
    Ok(StoredMessage {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        role: Role::from_str_lossy(&role),
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}
