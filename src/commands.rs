pub mod inspect;
pub mod inventory;
pub mod normalize;
pub mod subject;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use nzbparse::nzb::{self, Nzb, ParseOptions};

/// Opens and parses the NZB file at `path`.
pub fn read_nzb(path: &Path, keep_duplicates: bool) -> Result<Nzb> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let options = ParseOptions {
        remove_duplicates: !keep_duplicates,
    };

    nzb::parse_reader_with_options(BufReader::new(file), options)
        .with_context(|| format!("failed to parse {}", path.display()))
}
