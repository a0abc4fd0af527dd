//! Heuristic extraction of release header, filename and counters from NZB
//! subject lines.
//!
//! Posting tools never agreed on a subject grammar, so extraction runs as an
//! ordered chain of passes over the same text:
//!
//! 1. counters (`[1/12]`, `(3/140)`, `5 of 12`) are cut out of the subject,
//! 2. the rest is split into header and (quoted or bare) filename,
//! 3. a release-name quote followed by a filename quote is disambiguated,
//! 4. an implausible extension is swapped for a later quote with a real one,
//! 5. subjects made only of counters and a quoted name get a last attempt.
//!
//! Extraction never fails. Anything that cannot be recognised falls back to
//! empty names and `1/1` counters.

use anyhow::Result;
use serde::Serialize;

mod extension;
mod filename;
mod numbering;

pub use extension::{
    DEFAULT_KNOWN_EXTENSIONS, ExtensionPolicy, is_numbered_rar_volume, last_extension,
};
pub use filename::{FilenameMatch, FilenameMatcher, trim_separators};
pub use numbering::{NumberPair, NumberToken, Numbering, NumberingMatcher, assign_roles};

/// Fields extracted from one subject line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedSubject {
    /// The trimmed input.
    pub raw: String,
    pub header: String,
    /// Filename including its extension, when one was recognised.
    pub filename: String,
    pub base_filename: String,
    pub file_index: u32,
    pub file_total: u32,
    pub segment_index: u32,
    pub segment_total: u32,
}

impl ParsedSubject {
    /// Name to show for the file: the filename, else the header.
    pub fn display_name(&self) -> &str {
        if self.filename.is_empty() {
            &self.header
        } else {
            &self.filename
        }
    }
}

/// Compiled subject extractor.
///
/// Holds nothing but compiled patterns and the extension policy, so a single
/// parser can be shared across threads and reused for every subject.
#[derive(Debug)]
pub struct SubjectParser {
    numbering: NumberingMatcher,
    filenames: FilenameMatcher,
    policy: ExtensionPolicy,
}

impl SubjectParser {
    pub fn new() -> Result<Self> {
        Self::with_policy(ExtensionPolicy::default())
    }

    pub fn with_policy(policy: ExtensionPolicy) -> Result<Self> {
        Ok(Self {
            numbering: NumberingMatcher::new()?,
            filenames: FilenameMatcher::new()?,
            policy,
        })
    }

    pub fn policy(&self) -> &ExtensionPolicy {
        &self.policy
    }

    pub fn parse(&self, subject: &str) -> ParsedSubject {
        let raw = subject.trim();
        let Numbering {
            files,
            segments,
            remainder,
        } = self.numbering.extract(raw);

        let mut names = self.filenames.split(&remainder, files.total == 1);
        let quoted = self.filenames.quoted_spans(&remainder);
        self.filenames.promote_quoted_filename(&mut names, &quoted);
        self.filenames.refine_extension(&mut names, &quoted, &self.policy);

        if names.header.is_empty() && !names.base_filename.is_empty() {
            names.header = names.base_filename.clone();
        }

        if names.filename.is_empty() {
            if let Some(fallback) = self.filenames.after_leading_counters(raw) {
                names.filename = fallback.filename;
                names.base_filename = fallback.base_filename;
                if names.header.is_empty() {
                    names.header = names.base_filename.clone();
                }
            }
        }

        ParsedSubject {
            raw: raw.to_string(),
            header: names.header,
            filename: names.filename,
            base_filename: names.base_filename,
            file_index: files.index,
            file_total: files.total,
            segment_index: segments.index,
            segment_total: segments.total,
        }
    }
}
