use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::nzb::{Nzb, NzbFile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub number: u32,
    pub filename: String,
    pub base_filename: String,
    pub subject: String,
    pub segments: usize,
    pub total_segments: u32,
    pub bytes: i64,
    pub complete: bool,
}

impl From<&NzbFile> for FileSummary {
    fn from(file: &NzbFile) -> Self {
        Self {
            number: file.number,
            filename: file.filename.clone(),
            base_filename: file.base_filename.clone(),
            subject: file.subject.clone(),
            segments: file.segments.len(),
            total_segments: file.total_segments,
            bytes: file.bytes,
            complete: file.is_complete(),
        }
    }
}

/// Printable view of a parsed NZB document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NzbSummary {
    pub meta: BTreeMap<String, String>,
    pub file_count: usize,
    pub total_files: u64,
    pub segments: u64,
    pub total_segments: u64,
    pub bytes: i64,
    pub completion: f64,
    pub files: Vec<FileSummary>,
}

impl From<&Nzb> for NzbSummary {
    fn from(nzb: &Nzb) -> Self {
        Self {
            meta: nzb.meta.clone(),
            file_count: nzb.files.len(),
            total_files: nzb.total_files,
            segments: nzb.segments,
            total_segments: nzb.total_segments,
            bytes: nzb.bytes,
            completion: nzb.completion(),
            files: nzb.files.iter().map(FileSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub filename: String,
    pub sha256: String,
    pub title: Option<String>,
    pub file_count: usize,
    pub total_files: u64,
    pub segments: u64,
    pub total_segments: u64,
    pub bytes: i64,
    pub completion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub nzb_count: usize,
    pub nzbs: Vec<InventoryEntry>,
}
