use std::io::{self, Write};

use anyhow::{Context, Result};
use nzbparse::nzb;
use nzbparse::util::write_file;
use tracing::info;

use crate::cli::NormalizeArgs;
use crate::commands::read_nzb;

pub fn run(args: NormalizeArgs) -> Result<()> {
    let parsed = read_nzb(&args.path, args.keep_duplicates)?;
    let data = nzb::write(&parsed)?;

    match &args.output {
        Some(output) => {
            write_file(output, &data)?;
            info!(
                source = %args.path.display(),
                path = %output.display(),
                files = parsed.files.len(),
                "wrote normalized NZB"
            );
        }
        None => {
            io::stdout()
                .lock()
                .write_all(&data)
                .context("failed to write normalized NZB to stdout")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use nzbparse::nzb::{NZB_XMLNS, XML_HEADER};

    use super::*;

    #[test]
    fn normalized_output_is_deduplicated_and_sorted() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = dir.path().join("in.nzb");
        let output = dir.path().join("out").join("normalized.nzb");

        let entry = |subject: &str, id: &str| {
            format!(
                r#"<file poster="p" date="1" subject="{subject}"><groups><group>alt.test</group></groups><segments><segment bytes="10" number="1">{id}</segment></segments></file>"#
            )
        };
        let body = [
            entry("[2/2] &quot;b.rar&quot; yEnc (1/1)", "b-1"),
            entry("[1/2] &quot;a.rar&quot; yEnc (1/1)", "a-1"),
            entry("[1/2] &quot;a.rar&quot; yEnc (1/1)", "a-1"),
        ]
        .concat();
        fs::write(
            &source,
            format!(r#"{XML_HEADER}<nzb xmlns="{NZB_XMLNS}">{body}</nzb>"#),
        )
        .expect("write source");

        run(NormalizeArgs {
            path: source,
            output: Some(output.clone()),
            keep_duplicates: false,
        })
        .expect("normalize");

        let reparsed = read_nzb(&output, true).expect("normalized NZB parses");
        let names: Vec<&str> = reparsed.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["a.rar", "b.rar"]);

        let text = fs::read_to_string(&output).expect("read output");
        assert!(text.starts_with(XML_HEADER));
        assert_eq!(text.matches("<file ").count(), 2);
    }
}
