// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the kbchat core.
//!
//! The renderer itself is a total function and has no error type of its
//! own: parsing-level anomalies are absorbed locally and degrade to
//! plain-text rendering. Errors here cover the surrounding concerns -
//! transport, the conversation store, and configuration - using
//! `thiserror` for the definitions and `anyhow` for propagation.

use thiserror::Error;

/// Errors surfaced by the chunk transport feeding the streaming driver.
///
/// These are the only failures that ever reach the user-visible layer;
/// the driver replaces the in-progress output with a literal error
/// notice and leaves the render pipeline intact for other messages.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Stream cancelled")]
    Cancelled,

    #[error("Stream ended unexpectedly: {0}")]
    Interrupted(String),
}

impl TransportError {
    /// Create a status error from a non-success response.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }
}

/// Errors from the conversation history store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(i64),

    #[error("Message not found: {0}")]
    MessageNotFound(i64),
}

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Convenient result type using anyhow for error propagation.
pub type Result<T> = anyhow::Result<T>;
