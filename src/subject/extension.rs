use std::collections::BTreeSet;

/// Extensions that count as real file extensions without further checks.
pub const DEFAULT_KNOWN_EXTENSIONS: &[&str] = &[
    "rar", "r00", "r01", "r02", "r03", "r04", "r05", "par2", "nfo", "sfv", "zip", "7z", "mp4",
    "mkv", "avi", "mov", "mp3", "flac", "m4a", "jpg", "jpeg", "png", "gif", "pdf", "txt",
];

/// Decides whether an extension looks like a genuine file extension.
///
/// The set is matched case-insensitively. The archive-part predicate covers
/// volume-numbered parts that are not worth enumerating (`r06`, `r57`, ...).
#[derive(Debug, Clone)]
pub struct ExtensionPolicy {
    known: BTreeSet<String>,
    archive_part: fn(&str) -> bool,
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_KNOWN_EXTENSIONS.iter().copied(),
            is_numbered_rar_volume,
        )
    }
}

impl ExtensionPolicy {
    pub fn new<I, S>(known: I, archive_part: fn(&str) -> bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            known: known
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
            archive_part,
        }
    }

    /// Adds more extensions on top of the current set.
    pub fn with_extensions<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known.extend(
            extra
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty()),
        );
        self
    }

    pub fn is_known(&self, extension: &str) -> bool {
        self.known.contains(&extension.to_ascii_lowercase())
    }

    pub fn is_archive_part(&self, extension: &str) -> bool {
        (self.archive_part)(extension)
    }

    pub fn is_plausible(&self, extension: &str) -> bool {
        self.is_known(extension) || self.is_archive_part(extension)
    }

    /// Stricter than [`is_plausible`](Self::is_plausible): an archive part
    /// only counts as the whole extension (`r12`, not `xr12`).
    pub fn is_real(&self, extension: &str) -> bool {
        self.is_known(extension) || (extension.len() == 3 && self.is_archive_part(extension))
    }

    pub fn known_extensions(&self) -> impl Iterator<Item = &str> {
        self.known.iter().map(String::as_str)
    }
}

/// True for extensions ending in `r` followed by exactly two digits, e.g. `r17`.
pub fn is_numbered_rar_volume(extension: &str) -> bool {
    let bytes = extension.as_bytes();
    if bytes.len() < 3 {
        return false;
    }

    let tail = &bytes[bytes.len() - 3..];
    tail[0].eq_ignore_ascii_case(&b'r') && tail[1].is_ascii_digit() && tail[2].is_ascii_digit()
}

/// Text after the last dot of `filename`, lower-cased. Empty when there is no dot.
pub fn last_extension(filename: &str) -> String {
    filename
        .rfind('.')
        .map(|idx| filename[idx + 1..].to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_rar_volume_requires_two_trailing_digits() {
        assert!(is_numbered_rar_volume("r00"));
        assert!(is_numbered_rar_volume("R42"));
        assert!(is_numbered_rar_volume("xr12"));
        assert!(!is_numbered_rar_volume("r1"));
        assert!(!is_numbered_rar_volume("rar"));
        assert!(!is_numbered_rar_volume("r123x"));
    }

    #[test]
    fn default_policy_accepts_known_and_numbered_parts() {
        let policy = ExtensionPolicy::default();
        assert!(policy.is_plausible("MKV"));
        assert!(policy.is_plausible("r17"));
        assert!(!policy.is_plausible("name"));
        assert!(!policy.is_plausible(""));
    }

    #[test]
    fn real_extension_needs_the_whole_archive_part() {
        let policy = ExtensionPolicy::default();
        assert!(policy.is_real("r12"));
        assert!(policy.is_real("nfo"));
        assert!(policy.is_plausible("xr12"));
        assert!(!policy.is_real("xr12"));
    }

    #[test]
    fn policy_can_be_extended_without_touching_defaults() {
        let policy = ExtensionPolicy::default().with_extensions([".EPUB", "cbz"]);
        assert!(policy.is_known("epub"));
        assert!(policy.is_known("CBZ"));
        assert!(policy.is_known("par2"));

        let custom = ExtensionPolicy::new(["iso"], |_| false);
        assert!(custom.is_plausible("iso"));
        assert!(!custom.is_plausible("r00"));
        assert_eq!(custom.known_extensions().collect::<Vec<_>>(), vec!["iso"]);
    }

    #[test]
    fn last_extension_lowercases_text_after_final_dot() {
        assert_eq!(last_extension("Release.Name.R03"), "r03");
        assert_eq!(last_extension("no_dot"), "");
        assert_eq!(last_extension("trailing."), "");
    }
}
