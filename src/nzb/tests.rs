use std::io::{BufReader, Read};

use super::*;

fn document(body: &str) -> String {
    format!(r#"{XML_HEADER}<nzb xmlns="{NZB_XMLNS}">{body}</nzb>"#)
}

fn segment(number: u32, bytes: i64, id: &str) -> NzbSegment {
    NzbSegment {
        bytes,
        number,
        id: id.to_string(),
    }
}

fn file(subject: &str, segments: Vec<NzbSegment>) -> NzbFile {
    NzbFile {
        subject: subject.to_string(),
        segments,
        ..NzbFile::default()
    }
}

fn subject_parser() -> SubjectParser {
    SubjectParser::new().expect("subject patterns should compile")
}

#[test]
fn parse_str_decodes_metadata_files_and_segments() {
    let xml = document(
        r#"
  <head>
    <meta type="title">Test Title</meta>
    <meta type="category">Test Category</meta>
  </head>
  <file poster="test@example.com" date="1234567890" subject="[1/2] Test Subject - &quot;test.txt&quot; yEnc (1/2)">
    <groups>
      <group>alt.test</group>
    </groups>
    <segments>
      <segment bytes="1234" number="1">test-segment-1</segment>
      <segment bytes="5678" number="2">test-segment-2</segment>
    </segments>
  </file>
"#,
    );

    let nzb = parse_str(&xml).expect("valid NZB should parse");

    assert_eq!(nzb.meta["title"], "Test Title");
    assert_eq!(nzb.meta["category"], "Test Category");
    assert_eq!(nzb.files.len(), 1);

    let file = &nzb.files[0];
    assert_eq!(file.poster, "test@example.com");
    assert_eq!(file.date, 1_234_567_890);
    assert_eq!(file.subject, r#"[1/2] Test Subject - "test.txt" yEnc (1/2)"#);
    assert_eq!(file.groups, vec!["alt.test".to_string()]);
    assert_eq!(file.segments, vec![
        segment(1, 1234, "test-segment-1"),
        segment(2, 5678, "test-segment-2"),
    ]);

    assert_eq!(file.filename, "test.txt");
    assert_eq!(file.base_filename, "test");
    assert_eq!(file.number, 1);
    assert_eq!(file.total_segments, 2);
    assert_eq!(file.bytes, 6912);
    assert!(file.is_complete());

    assert_eq!(nzb.total_files, 2);
    assert_eq!(nzb.segments, 2);
    assert_eq!(nzb.total_segments, 2);
    assert_eq!(nzb.bytes, 6912);
}

#[test]
fn parse_rejects_documents_without_nzb_root() {
    assert!(parse_str("This is not a valid NZB file").is_err());
    assert!(parse_str("<other><file subject=\"x\"/></other>").is_err());
}

#[test]
fn parse_rejects_mismatched_tags() {
    let xml = document("<file subject=\"x\"><groups></file>");
    assert!(parse_str(&xml).is_err());
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("mock read error"))
    }
}

#[test]
fn parse_reader_reports_io_errors() {
    assert!(parse_reader(BufReader::new(FailingReader)).is_err());
}

#[test]
fn files_and_segments_come_back_sorted_by_number() {
    let xml = document(
        r#"
  <file poster="p" date="1" subject="[2/2] Set - &quot;b.rar&quot; yEnc (1/2)">
    <groups><group>alt.test</group></groups>
    <segments>
      <segment bytes="20" number="2">b-2</segment>
      <segment bytes="10" number="1">b-1</segment>
    </segments>
  </file>
  <file poster="p" date="1" subject="[1/2] Set - &quot;a.rar&quot; yEnc (1/1)">
    <groups><group>alt.test</group></groups>
    <segments>
      <segment bytes="30" number="1">a-1</segment>
    </segments>
  </file>
"#,
    );

    let nzb = parse_str(&xml).expect("valid NZB should parse");

    let names: Vec<&str> = nzb.files.iter().map(|file| file.filename.as_str()).collect();
    assert_eq!(names, vec!["a.rar", "b.rar"]);
    let numbers: Vec<u32> = nzb.files[1]
        .segments
        .iter()
        .map(|segment| segment.number)
        .collect();
    assert_eq!(numbers, vec![1, 2]);
}

#[test]
fn duplicates_are_dropped_unless_asked_to_keep_them() {
    let entry = r#"
  <file poster="p" date="1" subject="Same Subject">
    <segments>
      <segment bytes="10" number="1">seg-1</segment>
      <segment bytes="10" number="1">seg-1</segment>
    </segments>
  </file>"#;
    let xml = document(&format!("{entry}{entry}"));

    let unique = parse_str(&xml).expect("valid NZB should parse");
    assert_eq!(unique.files.len(), 1);
    assert_eq!(unique.files[0].segments.len(), 1);

    let kept = parse_str_with_options(&xml, ParseOptions {
        remove_duplicates: false,
    })
    .expect("valid NZB should parse");
    assert_eq!(kept.files.len(), 2);
    assert_eq!(kept.files[0].segments.len(), 2);
}

#[test]
fn write_string_emits_canonical_elements() {
    let nzb = Nzb {
        comment: "Test Comment".to_string(),
        meta: BTreeMap::from([
            ("title".to_string(), "Test Title".to_string()),
            ("category".to_string(), "Test Category".to_string()),
        ]),
        files: vec![NzbFile {
            poster: "test@example.com".to_string(),
            date: 1_234_567_890,
            groups: vec!["alt.test".to_string()],
            ..file("Test Subject", vec![segment(1, 1234, "test-segment-1")])
        }],
        ..Nzb::default()
    };

    let output = write_string(&nzb).expect("NZB should serialize");

    assert!(output.starts_with(XML_HEADER));
    assert!(output.contains("<!-- Test Comment -->"));
    assert!(output.contains(r#"<nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">"#));
    assert!(output.contains(r#"<meta type="title">Test Title</meta>"#));
    assert!(output.contains(r#"<meta type="category">Test Category</meta>"#));
    assert!(output.contains(r#"poster="test@example.com""#));
    assert!(output.contains("<group>alt.test</group>"));
    assert!(output.contains(r#"<segment bytes="1234" number="1">test-segment-1</segment>"#));
    assert!(output.find("category").unwrap() < output.find("title").unwrap());
}

#[test]
fn written_document_parses_back_to_the_same_entries() {
    let nzb = Nzb {
        meta: BTreeMap::from([("title".to_string(), "Fish & Chips".to_string())]),
        files: vec![NzbFile {
            poster: "poster <p@example.com>".to_string(),
            date: 42,
            groups: vec!["alt.binaries.test".to_string()],
            ..file(r#"[1/1] "fish.nfo" yEnc (1/1)"#, vec![segment(1, 99, "part1@news")])
        }],
        ..Nzb::default()
    };

    let output = write(&nzb).expect("NZB should serialize");
    let parsed = parse_slice(&output);

    assert_eq!(parsed.comment, "");
    assert_eq!(parsed.meta, nzb.meta);
    assert_eq!(parsed.files.len(), 1);
    let file = &parsed.files[0];
    assert_eq!(file.poster, "poster <p@example.com>");
    assert_eq!(file.date, 42);
    assert_eq!(file.subject, nzb.files[0].subject);
    assert_eq!(file.groups, nzb.files[0].groups);
    assert_eq!(file.segments, nzb.files[0].segments);
    assert_eq!(file.filename, "fish.nfo");
}

fn parse_slice(data: &[u8]) -> Nzb {
    NzbParser::new(ParseOptions::default())
        .expect("subject patterns should compile")
        .parse_slice(data)
        .expect("written NZB should parse")
}

#[test]
fn comment_survives_a_round_trip() {
    let nzb = Nzb {
        comment: "posted by a -- tool".to_string(),
        ..Nzb::default()
    };

    let output = write(&nzb).expect("NZB should serialize");
    assert_eq!(parse_slice(&output).comment, "posted by a - - tool");
}

#[test]
fn scan_aggregates_totals_across_files() {
    let mut nzb = Nzb {
        files: vec![
            file(r#"[1/2] Test Subject - "test.txt" yEnc (1/2)"#, vec![
                segment(1, 1000, "a"),
                segment(2, 2000, "b"),
            ]),
            file(r#"[2/2] Test Subject - "test.txt" yEnc (1/1)"#, vec![segment(1, 3000, "c")]),
        ],
        ..Nzb::default()
    };

    scan(&mut nzb, &subject_parser());

    assert_eq!(nzb.total_files, 2);
    assert_eq!(nzb.segments, 3);
    assert_eq!(nzb.total_segments, 3);
    assert_eq!(nzb.bytes, 6000);
    assert_eq!(nzb.completion(), 100.0);

    assert_eq!(nzb.files[0].filename, "test.txt");
    assert_eq!(nzb.files[0].number, 1);
    assert_eq!(nzb.files[0].bytes, 3000);
    assert_eq!(nzb.files[1].number, 2);
}

#[test]
fn scan_handles_empty_and_unparseable_sets() {
    let mut empty = Nzb::default();
    scan(&mut empty, &subject_parser());
    assert_eq!(empty.total_files, 0);
    assert_eq!(empty.completion(), 0.0);

    let mut plain = Nzb {
        files: vec![file("This is not a parseable subject", vec![segment(1, 1000, "a")])],
        ..Nzb::default()
    };
    scan(&mut plain, &subject_parser());
    assert_eq!(plain.total_files, 1);
    assert_eq!(plain.files[0].number, 1);
    assert_eq!(plain.files[0].filename, "This is not a parseable subject");
}

#[test]
fn scan_uses_declared_totals_when_files_are_missing() {
    let mut nzb = Nzb {
        files: vec![file(r#"[1/10] Test Subject - "test.txt" yEnc (1/4)"#, vec![
            segment(1, 1000, "a"),
            segment(3, 1000, "c"),
        ])],
        ..Nzb::default()
    };

    scan(&mut nzb, &subject_parser());

    assert_eq!(nzb.total_files, 10);
    assert_eq!(nzb.total_segments, 4);
    assert_eq!(nzb.completion(), 50.0);
    assert!(!nzb.files[0].is_complete());
}

#[test]
fn scan_trusts_segment_numbers_beyond_the_declared_total() {
    let mut nzb = Nzb {
        files: vec![file(r#""single.bin" yEnc"#, vec![
            segment(1, 10, "a"),
            segment(5, 10, "e"),
        ])],
        ..Nzb::default()
    };

    scan(&mut nzb, &subject_parser());

    assert_eq!(nzb.files[0].total_segments, 5);
    assert_eq!(nzb.total_segments, 5);
}

#[test]
fn make_unique_keeps_first_file_per_subject_and_first_segment_per_id() {
    let mut nzb = Nzb {
        files: vec![
            file("Test Subject", vec![segment(1, 1000, "segment-1"), segment(2, 2000, "segment-2")]),
            file("Test Subject", vec![segment(2, 2000, "segment-2"), segment(3, 3000, "segment-3")]),
            file("Different Subject", vec![
                segment(1, 4000, "segment-4"),
                segment(1, 4000, "segment-4"),
            ]),
        ],
        ..Nzb::default()
    };

    make_unique(&mut nzb);

    assert_eq!(nzb.files.len(), 2);
    let ids: Vec<&str> = nzb.files[0].segments.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["segment-1", "segment-2"]);
    assert_eq!(nzb.files[1].subject, "Different Subject");
    assert_eq!(nzb.files[1].segments.len(), 1);
}

#[test]
fn latin1_documents_are_decoded_by_their_declared_encoding() {
    let xml: &[u8] = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
<nzb xmlns=\"http://www.newzbin.com/DTD/2003/nzb\">\n\
<head><meta type=\"title\">Caf\xe9 Ol\xe9</meta></head>\n\
<file poster=\"J\xfcrgen\" date=\"1\" subject=\"Urlaub - &quot;Stra\xdfe.mkv&quot; yEnc (1/1)\">\n\
<groups><group>alt.binaries.test</group></groups>\n\
<segments><segment bytes=\"10\" number=\"1\">m\xfcnchen@news</segment></segments>\n\
</file>\n\
</nzb>\n";

    let nzb = parse_slice(xml);

    assert_eq!(nzb.meta["title"], "Café Olé");
    let file = &nzb.files[0];
    assert_eq!(file.poster, "Jürgen");
    assert_eq!(file.subject, "Urlaub - \"Straße.mkv\" yEnc (1/1)");
    assert_eq!(file.filename, "Straße.mkv");
    assert_eq!(file.segments[0].id, "münchen@news");
}

#[test]
fn byte_totals_saturate_instead_of_overflowing() {
    let xml = document(
        r#"
  <file poster="p" date="1" subject="huge.bin">
    <segments>
      <segment bytes="9223372036854775807" number="1">a</segment>
      <segment bytes="9223372036854775807" number="2">b</segment>
    </segments>
  </file>
  <file poster="p" date="1" subject="more.bin">
    <segments>
      <segment bytes="1" number="1">c</segment>
    </segments>
  </file>
"#,
    );

    let nzb = parse_str(&xml).expect("valid NZB should parse");

    assert_eq!(nzb.files[0].bytes, i64::MAX);
    assert_eq!(nzb.bytes, i64::MAX);
}

#[test]
fn dash_runs_never_survive_into_the_written_comment() {
    let nzb = Nzb {
        comment: "a---b ---- c".to_string(),
        ..Nzb::default()
    };

    let output = write_string(&nzb).expect("NZB should serialize");
    let start = output.find("<!--").expect("comment written") + "<!--".len();
    let end = output[start..].find("-->").expect("comment closed") + start;

    assert!(!output[start..end].contains("--"), "comment was {:?}", &output[start..end]);
    assert_eq!(parse_slice(output.as_bytes()).comment, "a- - -b - - - - c");
}
