use std::io::BufRead;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, BytesText, Event};
use tracing::{debug, warn};

use super::{Nzb, NzbFile, NzbSegment};

/// Decodes the XML document into an [`Nzb`] without any post-processing.
pub(super) fn decode<R: BufRead>(input: R) -> Result<Nzb> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut state = DecodeState::default();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .with_context(|| format!("malformed NZB XML near byte {}", reader.buffer_position()))?;

        // Follows the encoding named in the XML declaration.
        let decoder = reader.decoder();

        match event {
            Event::Start(ref e) => state.open(e, decoder)?,
            Event::Empty(ref e) => {
                state.open(e, decoder)?;
                state.close(e.local_name().as_ref());
            }
            Event::End(ref e) => state.close(e.local_name().as_ref()),
            Event::Text(ref e) => state.text(&unescape_text(e, decoder)),
            Event::CData(ref e) => state.text(&decode_lossy(e, decoder)),
            Event::Comment(ref e) => state.comment(&decode_lossy(e, decoder)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    state.finish()
}

#[derive(Debug, Default)]
struct DecodeState {
    depth: usize,
    seen_root: bool,
    nzb: Nzb,
    comments: Vec<String>,
    file: Option<NzbFile>,
    segment: Option<NzbSegment>,
    meta_type: Option<String>,
    collecting: bool,
    text: String,
}

impl DecodeState {
    fn open(&mut self, e: &BytesStart<'_>, decoder: Decoder) -> Result<()> {
        self.depth += 1;

        match e.local_name().as_ref() {
            b"nzb" => self.seen_root = true,
            b"meta" => {
                self.meta_type = Some(attribute(e, b"type", decoder)?.unwrap_or_default());
                self.start_text();
            }
            b"file" => {
                self.file = Some(NzbFile {
                    poster: attribute(e, b"poster", decoder)?.unwrap_or_default(),
                    date: numeric_attribute(e, b"date", decoder)?,
                    subject: attribute(e, b"subject", decoder)?.unwrap_or_default(),
                    bytes: numeric_attribute(e, b"bytes", decoder)?,
                    file_hash: attribute(e, b"filehash", decoder)?.unwrap_or_default(),
                    ..NzbFile::default()
                });
            }
            b"group" => self.start_text(),
            b"segment" => {
                self.segment = Some(NzbSegment {
                    bytes: numeric_attribute(e, b"bytes", decoder)?,
                    number: numeric_attribute(e, b"number", decoder)?,
                    id: String::new(),
                });
                self.start_text();
            }
            _ => {}
        }

        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        self.depth = self.depth.saturating_sub(1);

        match name {
            b"meta" => {
                let value = self.take_text();
                if let Some(kind) = self.meta_type.take() {
                    self.nzb.meta.insert(kind, value);
                }
            }
            b"group" => {
                let group = self.take_text();
                if let Some(file) = self.file.as_mut() {
                    file.groups.push(group);
                }
            }
            b"segment" => {
                let id = self.take_text();
                if let (Some(file), Some(mut segment)) = (self.file.as_mut(), self.segment.take())
                {
                    segment.id = id;
                    file.segments.push(segment);
                }
            }
            b"file" => {
                if let Some(file) = self.file.take() {
                    debug!(
                        subject = %file.subject,
                        segments = file.segments.len(),
                        "decoded file entry"
                    );
                    self.nzb.files.push(file);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.collecting {
            self.text.push_str(text);
        }
    }

    fn comment(&mut self, text: &str) {
        // Only comments directly inside <nzb> belong to the document.
        if self.seen_root && self.depth == 1 {
            self.comments.push(text.trim().to_string());
        }
    }

    fn start_text(&mut self) {
        self.collecting = true;
        self.text.clear();
    }

    fn take_text(&mut self) -> String {
        self.collecting = false;
        std::mem::take(&mut self.text).trim().to_string()
    }

    fn finish(mut self) -> Result<Nzb> {
        if !self.seen_root {
            bail!("not an NZB document: missing <nzb> root element");
        }

        self.nzb.comment = self
            .comments
            .into_iter()
            .filter(|comment| !comment.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(self.nzb)
    }
}

fn attribute(e: &BytesStart<'_>, name: &[u8], decoder: Decoder) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.with_context(|| {
            format!(
                "malformed attribute on <{}>",
                String::from_utf8_lossy(e.name().as_ref())
            )
        })?;
        if attr.key.local_name().as_ref() != name {
            continue;
        }

        let value = match attr.decode_and_unescape_value(decoder) {
            Ok(value) => value.into_owned(),
            Err(err) => {
                warn!(
                    attribute = %String::from_utf8_lossy(name),
                    error = %err,
                    "keeping attribute value unescaped"
                );
                decode_lossy(&attr.value, decoder)
            }
        };
        return Ok(Some(value));
    }

    Ok(None)
}

/// Malformed or missing numbers read as zero.
fn numeric_attribute<T>(e: &BytesStart<'_>, name: &[u8], decoder: Decoder) -> Result<T>
where
    T: std::str::FromStr + Default,
{
    Ok(attribute(e, name, decoder)?
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or_default())
}

/// Decodes raw bytes in the document encoding, replacing what cannot be decoded.
fn decode_lossy(bytes: &[u8], decoder: Decoder) -> String {
    match decoder.decode(bytes) {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn unescape_text(e: &BytesText<'_>, decoder: Decoder) -> String {
    match e.unescape() {
        Ok(text) => text.into_owned(),
        Err(err) => {
            warn!(error = %err, "keeping text unescaped");
            decode_lossy(e, decoder)
        }
    }
}
