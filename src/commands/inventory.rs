use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use nzbparse::model::{InventoryEntry, InventoryManifest};
use nzbparse::nzb::{NzbParser, ParseOptions};
use nzbparse::util::{now_utc_string, sha256_bytes, write_json_pretty};
use tracing::{info, warn};

use crate::cli::InventoryArgs;

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.root)?;

    if args.dry_run {
        info!(
            nzb_count = manifest.nzb_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.root.join("nzb_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(nzb_count = manifest.nzb_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(root: &Path) -> Result<InventoryManifest> {
    let parser = NzbParser::new(ParseOptions::default())?;

    let mut nzb_paths = discover_nzbs(root)?;
    nzb_paths.sort();

    if nzb_paths.is_empty() {
        bail!("no NZB files found in {}", root.display());
    }

    let mut nzbs = Vec::with_capacity(nzb_paths.len());
    for path in nzb_paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let data = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let nzb = match parser.parse_slice(&data) {
            Ok(nzb) => nzb,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable NZB");
                continue;
            }
        };

        nzbs.push(InventoryEntry {
            filename,
            sha256: sha256_bytes(&data),
            title: nzb.meta.get("title").cloned(),
            file_count: nzb.files.len(),
            total_files: nzb.total_files,
            segments: nzb.segments,
            total_segments: nzb.total_segments,
            bytes: nzb.bytes,
            completion: nzb.completion(),
        });
    }

    Ok(InventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: root.display().to_string(),
        nzb_count: nzbs.len(),
        nzbs,
    })
}

fn discover_nzbs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut nzbs = Vec::new();

    let entries = fs::read_dir(root).with_context(|| format!("failed to read {}", root.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", root.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_nzb = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("nzb"))
            .unwrap_or(false);

        if is_nzb {
            nzbs.push(path);
        }
    }

    Ok(nzbs)
}
