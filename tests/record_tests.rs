// Tests for the record module
// Store line grammar, malformed preservation and formatting

use chrono::NaiveDateTime;

use hashkeep::record::{ChecksumRecord, TIMESTAMP_FORMAT};

#[test]
fn test_parse_full_line() {
    let record =
        ChecksumRecord::parse("SHA1:aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d  2024-01-02T03:04:05  docs/readme.md");

    assert!(!record.is_malformed());
    assert_eq!(record.algorithm, "SHA1");
    assert_eq!(record.digest.len(), 20);
    assert_eq!(record.digest[0], 0xaa);
    assert_eq!(
        record.timestamp,
        NaiveDateTime::parse_from_str("2024-01-02T03:04:05", TIMESTAMP_FORMAT).unwrap()
    );
    assert_eq!(record.path, "docs/readme.md");
    assert_eq!(record.key(), Some("docs/readme.md".to_string()));
}

#[test]
fn test_parse_line_without_algorithm_prefix() {
    let record = ChecksumRecord::parse("d41d8cd98f00b204e9800998ecf8427e  2024-01-02T03:04:05  file.txt");

    assert!(!record.is_malformed());
    assert_eq!(record.algorithm, "");
    assert_eq!(record.digest.len(), 16);
    assert_eq!(record.path, "file.txt");
}

#[test]
fn test_parse_line_without_timestamp() {
    let record = ChecksumRecord::parse("MD5:d41d8cd98f00b204e9800998ecf8427e  some file.txt");

    assert!(!record.is_malformed());
    assert_eq!(record.algorithm, "MD5");
    assert_eq!(record.path, "some file.txt");
}

#[test]
fn test_parse_path_with_spaces() {
    let record = ChecksumRecord::parse("abc123  2024-01-02T03:04:05  my documents/a b.txt");
    assert_eq!(record.path, "my documents/a b.txt");
    assert_eq!(record.key(), Some("my documents/a b.txt".to_string()));
}

#[test]
fn test_parse_timestamp_shaped_path() {
    // A timestamp with nothing after it is the path, not a timestamp
    let record = ChecksumRecord::parse("abc123  2024-01-02T03:04:05");
    assert!(!record.is_malformed());
    assert_eq!(record.path, "2024-01-02T03:04:05");
}

#[test]
fn test_parse_single_space_without_timestamp_is_malformed() {
    let record = ChecksumRecord::parse("abc123 file.txt");
    assert!(record.is_malformed());
    assert_eq!(record.raw.as_deref(), Some("abc123 file.txt"));
}

#[test]
fn test_parse_garbage_is_malformed() {
    for line in ["", "no-whitespace-here", "not hex  file.txt", ":beef  2024-01-02T03:04:05  x"] {
        let record = ChecksumRecord::parse(line);
        assert!(record.is_malformed(), "expected malformed: {:?}", line);
        assert_eq!(record.raw.as_deref(), Some(line));
        assert_eq!(record.key(), None);
    }
}

#[test]
fn test_malformed_round_trips_verbatim() {
    let line = "   this was never a checksum line   ";
    let record = ChecksumRecord::parse(line);
    assert!(record.is_malformed());
    assert_eq!(record.format(), line);
}

#[test]
fn test_key_is_case_folded() {
    let record = ChecksumRecord::parse("abc123  2024-01-02T03:04:05  ./Docs/README.md");
    assert_eq!(record.key(), Some("docs/readme.md".to_string()));
}

#[test]
fn test_format_canonical_line() {
    let mut record = ChecksumRecord::new("./sub/File.txt", "SHA256", vec![0xde, 0xad, 0xbe, 0xef]);
    record.timestamp = NaiveDateTime::parse_from_str("2024-06-07T08:09:10", TIMESTAMP_FORMAT).unwrap();

    assert_eq!(record.format(), "SHA256:deadbeef  2024-06-07T08:09:10  sub/File.txt");
}

#[test]
fn test_format_without_algorithm_omits_colon() {
    let mut record = ChecksumRecord::new("file.txt", "", vec![0xde, 0xad]);
    record.timestamp = NaiveDateTime::parse_from_str("2024-06-07T08:09:10", TIMESTAMP_FORMAT).unwrap();

    assert_eq!(record.format(), "dead  2024-06-07T08:09:10  file.txt");
}

#[test]
fn test_parse_format_round_trip() {
    let line = "SHA1:aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d  2024-01-02T03:04:05  docs/readme.md";
    assert_eq!(ChecksumRecord::parse(line).format(), line);
}
