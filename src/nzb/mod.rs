//! NZB container: the XML index listing files, their segments and metadata.
//!
//! Reading decodes the document, optionally drops duplicate entries, runs
//! every file subject through [`SubjectParser`] to derive file numbers and
//! names, and sorts files and segments. Writing produces the canonical
//! `nzb-1.1` document again.

use std::collections::BTreeMap;
use std::io::BufRead;

use anyhow::Result;
use serde::Serialize;

use crate::subject::SubjectParser;

mod read;
mod scan;
#[cfg(test)]
mod tests;
mod write;

pub use scan::{make_unique, scan};
pub use write::{write, write_string};

/// Declaration and doctype written in front of every NZB document.
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n<!DOCTYPE nzb PUBLIC \"-//newzBin//DTD NZB 1.1//EN\" \"http://www.newzbin.com/DTD/nzb/nzb-1.1.dtd\">\n";

pub const NZB_XMLNS: &str = "http://www.newzbin.com/DTD/2003/nzb";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep only the first file per subject and the first segment per message id.
    pub remove_duplicates: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Nzb {
    pub comment: String,
    pub meta: BTreeMap<String, String>,
    pub files: Vec<NzbFile>,
    /// Files in the set: the largest declared file total, or the number of
    /// file entries if that is larger.
    pub total_files: u64,
    /// Segments present in the document.
    pub segments: u64,
    /// Segments expected from the subjects and segment numbers.
    pub total_segments: u64,
    pub bytes: i64,
}

impl Nzb {
    /// Share of expected segments that are present, in percent.
    pub fn completion(&self) -> f64 {
        if self.total_segments == 0 {
            return 0.0;
        }
        (self.segments as f64 / self.total_segments as f64 * 100.0).min(100.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NzbFile {
    pub poster: String,
    pub date: i64,
    pub subject: String,
    pub bytes: i64,
    pub file_hash: String,
    pub groups: Vec<String>,
    pub segments: Vec<NzbSegment>,
    /// Position in the file set, taken from the subject.
    pub number: u32,
    /// Filename from the subject, or its header when no filename was found.
    pub filename: String,
    pub base_filename: String,
    pub total_segments: u32,
}

impl NzbFile {
    pub fn is_complete(&self) -> bool {
        self.segments.len() as u64 >= u64::from(self.total_segments)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NzbSegment {
    pub bytes: i64,
    pub number: u32,
    /// Message id of the article holding this segment.
    pub id: String,
}

/// Reusable NZB reader holding a compiled [`SubjectParser`].
#[derive(Debug)]
pub struct NzbParser {
    subjects: SubjectParser,
    options: ParseOptions,
}

impl NzbParser {
    pub fn new(options: ParseOptions) -> Result<Self> {
        Ok(Self::with_subject_parser(SubjectParser::new()?, options))
    }

    pub fn with_subject_parser(subjects: SubjectParser, options: ParseOptions) -> Self {
        Self { subjects, options }
    }

    pub fn subjects(&self) -> &SubjectParser {
        &self.subjects
    }

    pub fn parse_reader<R: BufRead>(&self, input: R) -> Result<Nzb> {
        let mut nzb = read::decode(input)?;

        if self.options.remove_duplicates {
            make_unique(&mut nzb);
        }
        scan(&mut nzb, &self.subjects);

        nzb.files.sort_by_key(|file| file.number);
        for file in &mut nzb.files {
            file.segments.sort_by_key(|segment| segment.number);
        }

        Ok(nzb)
    }

    pub fn parse_slice(&self, data: &[u8]) -> Result<Nzb> {
        self.parse_reader(data)
    }

    pub fn parse_str(&self, data: &str) -> Result<Nzb> {
        self.parse_reader(data.as_bytes())
    }
}

pub fn parse_str(data: &str) -> Result<Nzb> {
    parse_str_with_options(data, ParseOptions::default())
}

pub fn parse_str_with_options(data: &str, options: ParseOptions) -> Result<Nzb> {
    NzbParser::new(options)?.parse_str(data)
}

pub fn parse_reader<R: BufRead>(input: R) -> Result<Nzb> {
    parse_reader_with_options(input, ParseOptions::default())
}

pub fn parse_reader_with_options<R: BufRead>(input: R, options: ParseOptions) -> Result<Nzb> {
    NzbParser::new(options)?.parse_reader(input)
}
