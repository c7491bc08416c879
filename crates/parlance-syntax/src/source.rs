//! Decoded source text.
//!
//! The scanner addresses source by code point, not by byte, so the text is
//! decoded up front into a char buffer with precomputed line starts. Input
//! arrives as UTF-8, possibly in chunks whose boundaries fall inside a
//! multi-byte sequence; the incremental decoder carries the partial sequence
//! across chunks and flushes at end of input.

use std::io::Read;
use std::sync::Arc;

/// Errors produced while decoding source input.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("source is not valid UTF-8 at byte {0}")]
    InvalidUtf8(usize),

    #[error("source ends inside a multi-byte UTF-8 sequence")]
    TruncatedSequence,

    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),
}

/// Source text addressed by code-point offset.
#[derive(Debug)]
pub struct SourceText {
    module_name: Arc<str>,
    chars: Vec<char>,
    /// Code-point offset of the first character of each line.
    line_starts: Vec<u32>,
}

impl SourceText {
    /// Build from an already decoded string.
    pub fn new(module_name: &str, text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut line_starts = vec![0];
        for (i, &c) in chars.iter().enumerate() {
            if c == '\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self {
            module_name: Arc::from(module_name),
            chars,
            line_starts,
        }
    }

    /// Decode UTF-8 input read in chunks. Invalid input is fatal.
    pub fn read_from(module_name: &str, reader: &mut dyn Read) -> Result<Self, DecodeError> {
        let mut decoder = Utf8Decoder::new();
        let mut text = String::new();
        let mut chunk = [0u8; 8192];
        let mut consumed = 0usize;
        loop {
            let n = reader.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            decoder.push(&chunk[..n], consumed, &mut text)?;
            consumed += n;
        }
        decoder.finish()?;
        Ok(Self::new(module_name, &text))
    }

    /// Name of the module this text belongs to.
    pub fn module_name(&self) -> &Arc<str> {
        &self.module_name
    }

    /// Total length in code points.
    pub fn len(&self) -> u32 {
        self.chars.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Character at a code-point offset, if in range.
    pub fn char_at(&self, position: u32) -> Option<char> {
        self.chars.get(position as usize).copied()
    }

    /// The substring covering `[start, end)` in code points.
    pub fn slice(&self, start: u32, end: u32) -> String {
        self.chars[start as usize..end as usize].iter().collect()
    }

    /// One-based line number containing the offset.
    pub fn line_of(&self, position: u32) -> u32 {
        match self.line_starts.binary_search(&position) {
            Ok(index) => index as u32 + 1,
            Err(index) => index as u32,
        }
    }

    /// One-based column of the offset within its line.
    pub fn column_of(&self, position: u32) -> u32 {
        let line = self.line_of(position);
        position - self.line_starts[line as usize - 1] + 1
    }
}

/// Incremental UTF-8 decoder carrying partial sequences across chunks.
struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    fn new() -> Self {
        Self { carry: Vec::new() }
    }

    /// Decode one chunk, appending complete characters to `out`.
    ///
    /// `base` is the byte offset of the chunk within the whole input, used
    /// only for error reporting.
    fn push(&mut self, chunk: &[u8], base: usize, out: &mut String) -> Result<(), DecodeError> {
        let mut bytes = std::mem::take(&mut self.carry);
        let carried = bytes.len();
        bytes.extend_from_slice(chunk);
        match std::str::from_utf8(&bytes) {
            Ok(s) => out.push_str(s),
            Err(e) => {
                let valid = e.valid_up_to();
                match e.error_len() {
                    // A malformed sequence inside the chunk is fatal.
                    Some(_) => return Err(DecodeError::InvalidUtf8(base - carried + valid)),
                    // The chunk ends mid-sequence; carry the tail.
                    None => {
                        out.push_str(std::str::from_utf8(&bytes[..valid]).expect("validated"));
                        self.carry = bytes[valid..].to_vec();
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        if self.carry.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::TruncatedSequence)
        }
    }
}
