use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "nzbparse",
    version,
    about = "Filename and part-number extraction for Usenet subjects and NZB files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse subject lines and print one JSON object per subject.
    Subject(SubjectArgs),
    /// Print a JSON summary of an NZB file.
    Inspect(InspectArgs),
    /// Re-write an NZB file deduplicated and sorted.
    Normalize(NormalizeArgs),
    /// Hash and summarise every NZB file in a directory.
    Inventory(InventoryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SubjectArgs {
    pub subjects: Vec<String>,

    /// Read subjects from stdin, one per line.
    #[arg(long, default_value_t = false)]
    pub stdin: bool,

    #[arg(long, default_value_t = false)]
    pub pretty: bool,

    /// Extra extension accepted as a real file extension.
    #[arg(long = "extension")]
    pub extensions: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    pub path: PathBuf,

    #[arg(long, default_value_t = false)]
    pub keep_duplicates: bool,
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    pub path: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub keep_duplicates: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}
