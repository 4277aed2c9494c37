//! Log record definitions and wire codec

use std::io::{ErrorKind, Read};

use crate::error::Result;

use super::{PREFIX_SIZE, TOMBSTONE};

/// A single record in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A live key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// A deletion marker; earlier Put records for the key stay in the log
    /// until compaction drops them
    Tombstone { key: Vec<u8> },
}

/// Outcome of reading one record at the current position
#[derive(Debug)]
pub enum ReadOutcome {
    /// A complete record
    Record(Record),

    /// Clean end of file at a record boundary
    Eof,

    /// The file ends inside a record: the tail of an append interrupted
    /// mid-write
    Truncated,
}

impl Record {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Record::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn tombstone(key: impl Into<Vec<u8>>) -> Self {
        Record::Tombstone { key: key.into() }
    }

    pub fn key(&self) -> &[u8] {
        match self {
            Record::Put { key, .. } => key,
            Record::Tombstone { key } => key,
        }
    }

    /// Size of this record once encoded
    pub fn encoded_len(&self) -> u64 {
        let payload = match self {
            Record::Put { key, value } => key.len() + value.len(),
            Record::Tombstone { key } => key.len(),
        };
        (PREFIX_SIZE + payload) as u64
    }

    /// Encode to the wire format
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Record::Put { key, value } => {
                let mut buf = Vec::with_capacity(PREFIX_SIZE + key.len() + value.len());
                buf.extend_from_slice(&(key.len() as u64).to_le_bytes());
                buf.extend_from_slice(&(value.len() as u64).to_le_bytes());
                buf.extend_from_slice(key);
                buf.extend_from_slice(value);
                buf
            }
            Record::Tombstone { key } => {
                let mut buf = Vec::with_capacity(PREFIX_SIZE + key.len());
                buf.extend_from_slice(&(key.len() as u64).to_le_bytes());
                buf.extend_from_slice(&TOMBSTONE.to_le_bytes());
                buf.extend_from_slice(key);
                buf
            }
        }
    }

    /// Decode one record from the current position of `reader`.
    ///
    /// End of file exactly at a record boundary is [`ReadOutcome::Eof`];
    /// end of file anywhere inside a record is [`ReadOutcome::Truncated`].
    pub fn read_from<R: Read>(reader: &mut R) -> Result<ReadOutcome> {
        let mut prefix = [0u8; 8];

        let n = fill(reader, &mut prefix)?;
        if n == 0 {
            return Ok(ReadOutcome::Eof);
        }
        if n < prefix.len() {
            return Ok(ReadOutcome::Truncated);
        }
        let key_len = u64::from_le_bytes(prefix);

        if fill(reader, &mut prefix)? < prefix.len() {
            return Ok(ReadOutcome::Truncated);
        }
        let value_len = u64::from_le_bytes(prefix);

        let mut key = Vec::new();
        if reader.by_ref().take(key_len).read_to_end(&mut key)? < key_len as usize {
            return Ok(ReadOutcome::Truncated);
        }

        if value_len == TOMBSTONE {
            return Ok(ReadOutcome::Record(Record::Tombstone { key }));
        }
        let mut value = Vec::new();
        if reader.by_ref().take(value_len).read_to_end(&mut value)? < value_len as usize {
            return Ok(ReadOutcome::Truncated);
        }
        Ok(ReadOutcome::Record(Record::Put { key, value }))
    }
}

/// Read until `buf` is full or the source is exhausted; returns the number
/// of bytes actually read.
pub(crate) fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
