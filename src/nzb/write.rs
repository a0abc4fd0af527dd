use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use super::{NZB_XMLNS, Nzb, NzbFile, XML_HEADER};

/// Serializes the NZB to XML text.
pub fn write_string(nzb: &Nzb) -> Result<String> {
    String::from_utf8(write(nzb)?).context("NZB writer produced invalid UTF-8")
}

/// Serializes the NZB to XML bytes, header and doctype included.
///
/// Metadata is written sorted by type. Derived fields (file number,
/// filename, totals) are never written.
pub fn write(nzb: &Nzb) -> Result<Vec<u8>> {
    let mut out = NzbWriter::new();

    let mut root = BytesStart::new("nzb");
    root.push_attribute(("xmlns", NZB_XMLNS));
    out.event(Event::Start(root))?;

    let comment = nzb.comment.trim();
    if !comment.is_empty() {
        let comment = format!(" {} ", comment_safe(comment));
        out.event(Event::Comment(BytesText::from_escaped(comment)))?;
    }

    if !nzb.meta.is_empty() {
        out.event(Event::Start(BytesStart::new("head")))?;
        for (kind, value) in &nzb.meta {
            let mut meta = BytesStart::new("meta");
            meta.push_attribute(("type", kind.as_str()));
            out.text_element(meta, value)?;
        }
        out.event(Event::End(BytesEnd::new("head")))?;
    }

    for file in &nzb.files {
        out.file(file)?;
    }

    out.event(Event::End(BytesEnd::new("nzb")))?;
    Ok(out.finish())
}

/// Breaks up every run of dashes, which XML forbids inside comments.
fn comment_safe(text: &str) -> String {
    let mut text = text.to_string();
    while text.contains("--") {
        text = text.replace("--", "- -");
    }
    text
}

struct NzbWriter {
    writer: Writer<Vec<u8>>,
}

impl NzbWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(XML_HEADER.as_bytes().to_vec(), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .context("failed to write NZB XML")
    }

    fn text_element(&mut self, start: BytesStart<'_>, text: &str) -> Result<()> {
        let end = start.to_end().into_owned();
        self.event(Event::Start(start))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.event(Event::End(end))
    }

    fn file(&mut self, file: &NzbFile) -> Result<()> {
        let date = file.date.to_string();
        let bytes = file.bytes.to_string();

        let mut start = BytesStart::new("file");
        start.push_attribute(("poster", file.poster.as_str()));
        start.push_attribute(("date", date.as_str()));
        start.push_attribute(("subject", file.subject.as_str()));
        if file.bytes != 0 {
            start.push_attribute(("bytes", bytes.as_str()));
        }
        if !file.file_hash.is_empty() {
            start.push_attribute(("filehash", file.file_hash.as_str()));
        }
        self.event(Event::Start(start))?;

        self.event(Event::Start(BytesStart::new("groups")))?;
        for group in &file.groups {
            self.text_element(BytesStart::new("group"), group)?;
        }
        self.event(Event::End(BytesEnd::new("groups")))?;

        self.event(Event::Start(BytesStart::new("segments")))?;
        for segment in &file.segments {
            let bytes = segment.bytes.to_string();
            let number = segment.number.to_string();
            let mut start = BytesStart::new("segment");
            start.push_attribute(("bytes", bytes.as_str()));
            start.push_attribute(("number", number.as_str()));
            self.text_element(start, &segment.id)?;
        }
        self.event(Event::End(BytesEnd::new("segments")))?;

        self.event(Event::End(BytesEnd::new("file")))
    }

    fn finish(self) -> Vec<u8> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        bytes
    }
}
