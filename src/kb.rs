// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Knowledge-base record types.
//!
//! The renderer never consumes these; they are the JSON shapes the
//! surrounding UI polls while a folder sync is running - per-file
//! processing status plus optional chunk-level progress.

use serde::{Deserialize, Serialize};

/// Processing status of one knowledge-base file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processed,
    Error,
}

/// One file tracked by the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbFile {
    pub id: i64,
    pub path: String,
    pub size: u64,
    pub checksum: String,
    pub status: ProcessingStatus,
}

impl KbFile {
    /// Display name: the final path component.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Chunk-level progress within one file, reported during embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkProgress {
    pub file_id: i64,
    pub current: usize,
    pub total: usize,
}

/// Folder-level sync progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub total_files: usize,
    pub processed_files: usize,
    pub paused: bool,
    pub cancelled: bool,
}

impl SyncProgress {
    /// Whether the UI can stop polling.
    pub fn finished(&self) -> bool {
        self.cancelled || self.processed_files >= self.total_files
    }
}

/// Whether every file in a listing has been processed.
pub fn all_processed(files: &[KbFile]) -> bool {
    files
        .iter()
        .all(|f| f.status == ProcessingStatus::Processed)
}
