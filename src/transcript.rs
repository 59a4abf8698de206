//! Transcript records and the on-disk transcript library.
//!
//! Raw transcripts are plain line-oriented `.txt` files, one per lesson, keyed
//! by video id. Structured records are `.json` files with the same key.
//! Structured records are immutable once written; re-processing a lesson
//! replaces the whole file rather than merging into it.

use crate::error::{CharlaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One question/answer pair from a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// One structured lesson transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Unique lesson identifier, also the storage key.
    pub video_id: String,
    /// Introduction text, if the lesson has one.
    #[serde(default)]
    pub introduction: Option<String>,
    /// The main conversation text, if present.
    #[serde(default)]
    pub conversation: Option<String>,
    /// Ordered question/answer pairs.
    #[serde(default)]
    pub qa_pairs: Vec<QaPair>,
}

impl TranscriptRecord {
    /// True when the record has no introduction, no conversation, and no
    /// Q&A pairs. Structuring must never persist such a record.
    pub fn is_empty(&self) -> bool {
        fn blank(part: &Option<String>) -> bool {
            part.as_deref().map_or(true, |s| s.trim().is_empty())
        }

        blank(&self.introduction) && blank(&self.conversation) && self.qa_pairs.is_empty()
    }
}

/// File-backed library of raw and structured transcripts.
pub struct TranscriptLibrary {
    raw_dir: PathBuf,
    structured_dir: PathBuf,
}

impl TranscriptLibrary {
    /// Open (and create if needed) a library under the given directories.
    pub fn new(raw_dir: &Path, structured_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(raw_dir)?;
        std::fs::create_dir_all(structured_dir)?;

        Ok(Self {
            raw_dir: raw_dir.to_path_buf(),
            structured_dir: structured_dir.to_path_buf(),
        })
    }

    /// List the video ids of all raw transcripts.
    pub fn list_raw(&self) -> Result<Vec<String>> {
        list_ids(&self.raw_dir, "txt")
    }

    /// List the video ids of all structured records.
    pub fn list_structured(&self) -> Result<Vec<String>> {
        list_ids(&self.structured_dir, "json")
    }

    /// Load a raw transcript's text.
    pub fn load_raw(&self, video_id: &str) -> Result<String> {
        let path = self.raw_dir.join(format!("{}.txt", video_id));
        std::fs::read_to_string(&path)
            .map_err(|_| CharlaError::TranscriptNotFound(video_id.to_string()))
    }

    /// Load a structured record.
    pub fn load_structured(&self, video_id: &str) -> Result<TranscriptRecord> {
        let path = self.structured_dir.join(format!("{}.json", video_id));
        let content = std::fs::read_to_string(&path)
            .map_err(|_| CharlaError::TranscriptNotFound(video_id.to_string()))?;
        let record: TranscriptRecord = serde_json::from_str(&content)?;
        Ok(record)
    }

    /// Load all structured records, skipping files that fail to parse.
    pub fn load_all_structured(&self) -> Result<Vec<TranscriptRecord>> {
        let mut records = Vec::new();
        for video_id in self.list_structured()? {
            match self.load_structured(&video_id) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping unreadable record {}: {}", video_id, e);
                }
            }
        }
        Ok(records)
    }

    /// Save a structured record, replacing any previous version.
    pub fn save_structured(&self, record: &TranscriptRecord) -> Result<PathBuf> {
        let path = self.structured_dir.join(format!("{}.json", record.video_id));
        let content = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, content)?;
        info!("Saved structured record to {:?}", path);
        Ok(path)
    }

    /// Whether a structured record exists for this lesson.
    pub fn has_structured(&self, video_id: &str) -> bool {
        self.structured_dir
            .join(format!("{}.json", video_id))
            .exists()
    }
}

fn list_ids(dir: &Path, extension: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
    }
    ids.sort();
    debug!("Found {} .{} files in {:?}", ids.len(), extension, dir);
    Ok(ids)
}
