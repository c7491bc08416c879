//! Tests for source text decoding and addressing.

use super::source::{DecodeError, SourceText};

#[test]
fn lines_and_columns() {
    let source = SourceText::new("Test", "ab\ncde\n\nf");
    assert_eq!(source.line_of(0), 1);
    assert_eq!(source.line_of(2), 1);
    assert_eq!(source.line_of(3), 2);
    assert_eq!(source.line_of(7), 3);
    assert_eq!(source.line_of(8), 4);
    assert_eq!(source.column_of(4), 2);
    assert_eq!(source.column_of(8), 1);
}

#[test]
fn addressing_is_by_code_point() {
    let source = SourceText::new("Test", "α«β»");
    assert_eq!(source.len(), 4);
    assert_eq!(source.char_at(1), Some('«'));
    assert_eq!(source.slice(1, 3), "«β");
}

#[test]
fn chunked_reader_splits_multibyte_sequences() {
    // Read through a 1-byte-at-a-time reader so every multi-byte sequence
    // straddles a chunk boundary.
    struct OneByte<'a>(&'a [u8], usize);
    impl std::io::Read for OneByte<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.1 >= self.0.len() {
                return Ok(0);
            }
            buf[0] = self.0[self.1];
            self.1 += 1;
            Ok(1)
        }
    }
    let text = "«déjà vu»";
    let mut reader = OneByte(text.as_bytes(), 0);
    let source = SourceText::read_from("Test", &mut reader).expect("decodes");
    assert_eq!(source.len(), text.chars().count() as u32);
    assert_eq!(source.slice(0, source.len()), text);
}

#[test]
fn invalid_utf8_is_fatal() {
    let bytes: &[u8] = &[b'a', 0xFF, b'b'];
    let mut reader = bytes;
    let err = SourceText::read_from("Test", &mut reader).expect_err("must fail");
    assert!(matches!(err, DecodeError::InvalidUtf8(1)));
}

#[test]
fn truncated_sequence_is_fatal() {
    let bytes: &[u8] = &[b'a', 0xC3];
    let mut reader = bytes;
    let err = SourceText::read_from("Test", &mut reader).expect_err("must fail");
    assert!(matches!(err, DecodeError::TruncatedSequence));
}
