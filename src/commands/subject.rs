use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use nzbparse::subject::{ExtensionPolicy, SubjectParser};
use tracing::debug;

use crate::cli::SubjectArgs;

pub fn run(args: SubjectArgs) -> Result<()> {
    let policy = ExtensionPolicy::default().with_extensions(&args.extensions);
    let parser = SubjectParser::with_policy(policy)?;

    let mut subjects = args.subjects;
    if args.stdin {
        for line in io::stdin().lock().lines() {
            let line = line.context("failed to read subject from stdin")?;
            if !line.trim().is_empty() {
                subjects.push(line);
            }
        }
    }

    if subjects.is_empty() {
        bail!("no subjects given; pass them as arguments or use --stdin");
    }

    let stdout = io::stdout();
    write_parsed(&mut stdout.lock(), &parser, &subjects, args.pretty)
}

/// Writes one JSON document per subject, each followed by a newline.
pub fn write_parsed<W: Write>(
    out: &mut W,
    parser: &SubjectParser,
    subjects: &[String],
    pretty: bool,
) -> Result<()> {
    for subject in subjects {
        let parsed = parser.parse(subject);
        debug!(
            subject = %parsed.raw,
            filename = %parsed.filename,
            file_index = parsed.file_index,
            segment_index = parsed.segment_index,
            "parsed subject"
        );

        let written = if pretty {
            serde_json::to_writer_pretty(&mut *out, &parsed)
        } else {
            serde_json::to_writer(&mut *out, &parsed)
        };
        written.context("failed to serialize parsed subject")?;
        out.write_all(b"\n").context("failed to write output")?;
    }

    out.flush().context("failed to flush output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_json_line_per_subject() {
        let parser = SubjectParser::new().expect("parser");
        let subjects = vec![
            r#"[1/5] - "Release.Name.part1.rar" yEnc (3/50)"#.to_string(),
            "plain subject".to_string(),
        ];

        let mut out = Vec::new();
        write_parsed(&mut out, &parser, &subjects, false).expect("write");

        let text = String::from_utf8(out).expect("utf-8");
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["filename"], "Release.Name.part1.rar");
        assert_eq!(lines[0]["file_index"], 1);
        assert_eq!(lines[0]["file_total"], 5);
        assert_eq!(lines[0]["segment_index"], 3);
        assert_eq!(lines[0]["segment_total"], 50);
        assert_eq!(lines[1]["raw"], "plain subject");
    }
}
