// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! kbchat - offline local knowledge-base chat core.
//!
//! The heart of this crate is a progressive markdown-like renderer that
//! converts a possibly-incomplete text stream (as produced token by
//! token by a language model) into structured HTML incrementally,
//! without losing user-visible state such as collapsed reasoning
//! sections. Blocks may be unclosed at any render call because the
//! underlying text is still arriving; rendering is injection-safe and
//! total over arbitrary input.
//!
//! # Architecture
//!
//! - [`render`] - the renderer core: block splitter, table detector,
//!   inline renderer, render tree, and the collapsible-state reconciler
//! - [`stream`] - the streaming driver state machine around one
//!   in-flight assistant reply
//! - [`history`] - SQLite conversation store and title heuristics
//! - [`kb`] - knowledge-base record types for the surrounding UI
//! - [`config`] - configuration loading and merging
//! - [`telemetry`] - tracing initialization
//! - [`error`] - error types and the crate result alias
//! - [`types`] - wire-level message record shapes
//!
//! # Example
//!
//! ```rust
//! use kbchat::stream::StreamDriver;
//!
//! let mut driver = StreamDriver::new();
//! driver.begin();
//! driver.push_chunk("**hello** ");
//! driver.push_chunk("world");
//! assert_eq!(driver.complete(), "<p><strong>hello</strong> world</p>");
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod kb;
pub mod render;
pub mod stream;
pub mod telemetry;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConfigError, Result, StoreError, TransportError};
pub use render::{render_markdown, render_markdown_with_origin, RenderNode, RenderTree, Renderer};
pub use stream::{ChunkSource, StreamDriver, StreamPhase};
pub use types::{ChatMessage, Role};

/// kbchat version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
