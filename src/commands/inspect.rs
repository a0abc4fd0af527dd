use std::io::{self, Write};

use anyhow::{Context, Result};
use nzbparse::model::NzbSummary;
use tracing::info;

use crate::cli::InspectArgs;
use crate::commands::read_nzb;

pub fn run(args: InspectArgs) -> Result<()> {
    let nzb = read_nzb(&args.path, args.keep_duplicates)?;
    let summary = NzbSummary::from(&nzb);

    info!(
        path = %args.path.display(),
        files = summary.file_count,
        total_files = summary.total_files,
        completion = summary.completion,
        "inspected NZB"
    );

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &summary).context("failed to serialize summary")?;
    stdout.write_all(b"\n").context("failed to write output")?;
    Ok(())
}
