use std::collections::HashSet;

use tracing::{debug, warn};

use super::Nzb;
use crate::subject::SubjectParser;

/// Derives file numbers, names and expected segment counts from the file
/// subjects and recomputes the document totals.
pub fn scan(nzb: &mut Nzb, parser: &SubjectParser) {
    let mut declared_files = 0_u32;
    let mut segments = 0_u64;
    let mut total_segments = 0_u64;
    let mut bytes = 0_i64;
    let multi_file = nzb.files.len() > 1;

    for file in &mut nzb.files {
        let subject = parser.parse(&file.subject);
        if multi_file && subject.file_total <= 1 {
            warn!(subject = %file.subject, "subject carries no file numbering");
        }

        file.number = subject.file_index;
        file.filename = subject.display_name().to_string();
        file.base_filename = subject.base_filename.clone();

        let highest_segment = file
            .segments
            .iter()
            .map(|segment| segment.number)
            .max()
            .unwrap_or(0);
        file.total_segments = subject.segment_total.max(highest_segment);
        file.bytes = file
            .segments
            .iter()
            .map(|segment| segment.bytes)
            .fold(0, i64::saturating_add);

        declared_files = declared_files.max(subject.file_total);
        segments += file.segments.len() as u64;
        total_segments += u64::from(file.total_segments);
        bytes = bytes.saturating_add(file.bytes);

        debug!(
            number = file.number,
            filename = %file.filename,
            segments = file.segments.len(),
            expected_segments = file.total_segments,
            "scanned file entry"
        );
    }

    nzb.total_files = u64::from(declared_files).max(nzb.files.len() as u64);
    nzb.segments = segments;
    nzb.total_segments = total_segments;
    nzb.bytes = bytes;
}

/// Keeps the first file entry per subject and, inside every file, the first
/// segment per message id.
pub fn make_unique(nzb: &mut Nzb) {
    let mut subjects = HashSet::new();
    let before = nzb.files.len();
    nzb.files.retain(|file| subjects.insert(file.subject.clone()));
    if nzb.files.len() < before {
        warn!(
            dropped = before - nzb.files.len(),
            "dropped duplicate file entries"
        );
    }

    for file in &mut nzb.files {
        let mut ids = HashSet::new();
        let before = file.segments.len();
        file.segments.retain(|segment| ids.insert(segment.id.clone()));
        if file.segments.len() < before {
            debug!(
                subject = %file.subject,
                dropped = before - file.segments.len(),
                "dropped duplicate segments"
            );
        }
    }
}
