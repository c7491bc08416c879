//! The serialized module stream.
//!
//! Items are postcard-encoded and length-framed; the whole stream is
//! closed with a CRC32 trailer. The layout is: a header-section marker,
//! a body-section marker, one item per executed statement (declarations
//! become synthetic initializations), and finally the publication of the
//! module's public atoms.

use std::sync::Mutex;

use crate::ir::IrPhrase;

/// One record of the module stream.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SerializedItem {
    /// Opens the stream; carries the module name.
    HeaderSection { module: String },
    /// Separates the header from the executed body.
    BodySection,
    /// A top-level statement, compiled as a zero-argument function body.
    Statement { body: IrPhrase },
    /// A synthetic initializing assignment for a module declaration.
    Initialization { name: String, value: IrPhrase },
    /// The module's public atoms, appended at commit.
    Publication { atoms: Vec<(String, u32)> },
}

/// Serialization failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("serialization failed: {message}")]
pub struct SerializeError {
    pub message: String,
}

impl SerializeError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Receives the stream items in execution order. Implementations must
/// tolerate calls from restriction and macro fibers; the provided one
/// serializes under a mutex.
pub trait Serializer: Send + Sync {
    fn serialize(&self, item: &SerializedItem) -> Result<(), SerializeError>;
}

/// The in-memory, checksummed implementation.
#[derive(Default)]
pub struct BinarySerializer {
    buffer: Mutex<Vec<u8>>,
}

impl BinarySerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the stream: payload followed by a little-endian CRC32.
    pub fn finish(&self) -> Vec<u8> {
        let mut bytes = self.buffer.lock().expect("serializer poisoned").clone();
        let checksum = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&checksum.to_le_bytes());
        bytes
    }

    /// Decode and verify a finished stream.
    pub fn read_items(bytes: &[u8]) -> Result<Vec<SerializedItem>, SerializeError> {
        if bytes.len() < 4 {
            return Err(SerializeError::new("stream too short for a checksum"));
        }
        let (payload, trailer) = bytes.split_at(bytes.len() - 4);
        let mut expected = [0u8; 4];
        expected.copy_from_slice(trailer);
        if crc32fast::hash(payload) != u32::from_le_bytes(expected) {
            return Err(SerializeError::new("stream checksum mismatch"));
        }

        let mut items = Vec::new();
        let mut rest = payload;
        while !rest.is_empty() {
            if rest.len() < 4 {
                return Err(SerializeError::new("truncated item frame"));
            }
            let (len_bytes, tail) = rest.split_at(4);
            let mut len = [0u8; 4];
            len.copy_from_slice(len_bytes);
            let len = u32::from_le_bytes(len) as usize;
            if tail.len() < len {
                return Err(SerializeError::new("item frame overruns the stream"));
            }
            let (frame, tail) = tail.split_at(len);
            let item = postcard::from_bytes(frame)
                .map_err(|e| SerializeError::new(format!("bad item encoding: {e}")))?;
            items.push(item);
            rest = tail;
        }
        Ok(items)
    }
}

impl Serializer for BinarySerializer {
    fn serialize(&self, item: &SerializedItem) -> Result<(), SerializeError> {
        let encoded = postcard::to_allocvec(item)
            .map_err(|e| SerializeError::new(format!("encoding failed: {e}")))?;
        let mut buffer = self.buffer.lock().expect("serializer poisoned");
        buffer.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
        buffer.extend_from_slice(&encoded);
        Ok(())
    }
}
