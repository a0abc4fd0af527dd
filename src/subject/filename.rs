use anyhow::{Context, Result};
use regex::{Captures, Regex};

use super::extension::{ExtensionPolicy, last_extension};

/// Extension shapes accepted after the final dot of a filename: par2
/// recovery volumes, `partNN.rar` style multi-part archives, `name.7z.001`
/// style split archives and plain single-token extensions.
const EXTENSION_SHAPE: &str =
    r#"(?:7z\.)?(?:vol[0-9]+\+[0-9]+\.par2?|part[0-9]+\.[^ ".]*|[^ ".]*\.[0-9]+|[^ ".]*)"#;

/// Header and filename fields produced by the filename passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameMatch {
    pub header: String,
    pub filename: String,
    pub base_filename: String,
}

impl FilenameMatch {
    fn has_extension(&self) -> bool {
        self.filename != self.base_filename
    }
}

#[derive(Debug)]
pub struct FilenameMatcher {
    quoted: Regex,
    unquoted: Regex,
    quoted_anywhere: Regex,
    quoted_span: Regex,
    with_extension: Regex,
    compound_extension: Regex,
    leading_counters: Regex,
}

impl FilenameMatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            quoted: Regex::new(&format!(
                r#"(?i)^(?P<header>.*?)?[- ]*"+(?P<filename>(?P<base>.*?)(?:\.{EXTENSION_SHAPE})?)"+"#
            ))
            .context("failed to compile quoted filename regex")?,
            unquoted: Regex::new(&format!(
                r#"(?i)^(?P<filename>(?P<base>.*?)\.{EXTENSION_SHAPE})(?:[" ]|$)"#
            ))
            .context("failed to compile unquoted filename regex")?,
            quoted_anywhere: Regex::new(&format!(
                r#"(?i)"+(?P<filename>(?P<base>.*?)(?:\.{EXTENSION_SHAPE})?)"+"#
            ))
            .context("failed to compile embedded quoted filename regex")?,
            quoted_span: Regex::new(r#""([^"]+)""#).context("failed to compile quote regex")?,
            with_extension: Regex::new(&format!(r"(?i)^(?P<base>.*?)\.{EXTENSION_SHAPE}$"))
                .context("failed to compile filename-with-extension regex")?,
            compound_extension: Regex::new(
                r"(?i)^(?P<base>.+?)\.(?:vol[0-9]+\+[0-9]+\.par2|part[0-9]+\.rar)$",
            )
            .context("failed to compile compound extension regex")?,
            leading_counters: Regex::new(
                r#"^(?: *(?:"?\[|[<\[]?)[0-9]+ */ *[0-9]+ *(?:\]"?|[>\]])?)+ *(?P<tail>.*)$"#,
            )
            .context("failed to compile leading counter regex")?,
        })
    }

    /// Splits the numbering remainder into header and filename.
    ///
    /// Tries a quoted filename first, then an unquoted filename at the start
    /// of the text. For single-file posts without either, the whole
    /// remainder is taken as the name.
    pub fn split(&self, remainder: &str, single_file: bool) -> FilenameMatch {
        if let Some(caps) = self.quoted.captures(remainder) {
            return FilenameMatch {
                header: trimmed_group(&caps, "header"),
                filename: trimmed_group(&caps, "filename"),
                base_filename: trimmed_group(&caps, "base"),
            };
        }

        if let Some(caps) = self.unquoted.captures(remainder) {
            return FilenameMatch {
                header: String::new(),
                filename: trimmed_group(&caps, "filename"),
                base_filename: trimmed_group(&caps, "base"),
            };
        }

        if single_file {
            let name = trim_separators(remainder).to_string();
            return FilenameMatch {
                header: String::new(),
                filename: name.clone(),
                base_filename: name,
            };
        }

        FilenameMatch::default()
    }

    /// Interiors of every `"..."` span, in order.
    pub fn quoted_spans<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.quoted_span
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .collect()
    }

    /// `"Release.Name" - "release.name.r00"`: when the first quote carried no
    /// extension, a later quote with one is the actual filename and the first
    /// quote is the release name.
    pub fn promote_quoted_filename(&self, names: &mut FilenameMatch, quoted: &[&str]) {
        if names.filename.is_empty() || names.has_extension() || quoted.len() < 2 {
            return;
        }

        for candidate in quoted.iter().skip(1).map(|span| span.trim()) {
            let Some(caps) = self.with_extension.captures(candidate) else {
                continue;
            };
            names.filename = candidate.to_string();
            names.base_filename = trimmed_group(&caps, "base");
            if names.header.is_empty() {
                names.header = trim_separators(quoted[0]).to_string();
            }
            return;
        }
    }

    /// Replaces a filename whose extension does not look real with a later
    /// quoted span that carries a real one.
    pub fn refine_extension(
        &self,
        names: &mut FilenameMatch,
        quoted: &[&str],
        policy: &ExtensionPolicy,
    ) {
        if names.filename.is_empty() || quoted.len() < 2 {
            return;
        }
        if policy.is_plausible(&last_extension(&names.filename)) {
            return;
        }

        for candidate in quoted.iter().skip(1).map(|span| span.trim()) {
            let Some(base) = self.real_extension_base(candidate, policy) else {
                continue;
            };
            if names.header.is_empty()
                || names.header == names.base_filename
                || names.header.to_lowercase() == names.filename.to_lowercase()
            {
                names.header = trim_separators(quoted[0]).to_string();
            }
            names.filename = candidate.to_string();
            names.base_filename = trim_separators(base).to_string();
            return;
        }
    }

    /// Base name of `candidate` if it ends in a real extension.
    fn real_extension_base<'c>(&self, candidate: &'c str, policy: &ExtensionPolicy) -> Option<&'c str> {
        if let Some(caps) = self.compound_extension.captures(candidate) {
            return caps.name("base").map(|m| m.as_str());
        }

        let dot = candidate.rfind('.')?;
        if dot == 0 || !policy.is_real(&candidate[dot + 1..]) {
            return None;
        }
        Some(&candidate[..dot])
    }

    /// Last resort for subjects that open with counters and carry nothing but
    /// a quoted name afterwards, e.g. `[1/4] "readme"[2/3]`.
    pub fn after_leading_counters(&self, subject: &str) -> Option<FilenameMatch> {
        let tail = self.leading_counters.captures(subject)?.name("tail")?.as_str();
        let caps = self.quoted_anywhere.captures(tail.trim())?;

        Some(FilenameMatch {
            header: String::new(),
            filename: trimmed_group(&caps, "filename"),
            base_filename: trimmed_group(&caps, "base"),
        })
    }
}

fn trimmed_group(caps: &Captures<'_>, name: &str) -> String {
    caps.name(name)
        .map(|m| trim_separators(m.as_str()).to_string())
        .unwrap_or_default()
}

/// Strips the spaces and hyphens posters put around names.
pub fn trim_separators(text: &str) -> &str {
    text.trim_matches([' ', '-'])
}
