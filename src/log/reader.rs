//! Log Reader
//!
//! Positional and sequential reads from the record log.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{EmberError, Result};

use super::record::fill;
use super::{ReadOutcome, Record, PREFIX_SIZE, TOMBSTONE};

/// Reads records from the log file
pub struct LogReader {
    reader: BufReader<File>,
}

impl LogReader {
    /// Open a log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
        })
    }

    /// Read exactly one complete record at `offset`.
    ///
    /// Anything other than a complete record there (end of file, torn
    /// bytes) is reported as corruption: offsets handed to this method come
    /// from the index, which only ever points at fully appended records.
    pub fn read_at(&mut self, offset: u64) -> Result<Record> {
        self.reader.seek(SeekFrom::Start(offset))?;
        match Record::read_from(&mut self.reader)? {
            ReadOutcome::Record(record) => Ok(record),
            ReadOutcome::Eof => Err(EmberError::Corruption(format!(
                "no record at offset {}: end of log",
                offset
            ))),
            ReadOutcome::Truncated => Err(EmberError::Corruption(format!(
                "record at offset {} is cut short",
                offset
            ))),
        }
    }

    /// Read the encoded bytes of the record at `offset` without decoding
    /// the payload (compaction copies records byte for byte)
    pub fn read_raw_at(&mut self, offset: u64) -> Result<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(offset))?;

        let mut prefix = [0u8; PREFIX_SIZE];
        if fill(&mut self.reader, &mut prefix)? < PREFIX_SIZE {
            return Err(EmberError::Corruption(format!(
                "record at offset {} is cut short",
                offset
            )));
        }
        let key_len = u64::from_le_bytes(prefix[..8].try_into().expect("8-byte slice"));
        let value_len = u64::from_le_bytes(prefix[8..].try_into().expect("8-byte slice"));

        let payload_len = if value_len == TOMBSTONE {
            key_len
        } else {
            key_len + value_len
        };
        let mut buf = Vec::with_capacity(PREFIX_SIZE + payload_len as usize);
        buf.extend_from_slice(&prefix);
        let read = (&mut self.reader).take(payload_len).read_to_end(&mut buf)?;
        if (read as u64) < payload_len {
            return Err(EmberError::Corruption(format!(
                "record at offset {} is cut short",
                offset
            )));
        }
        Ok(buf)
    }

    /// Read the next record sequentially from the current position
    /// (recovery replays the log with this)
    pub fn read_next(&mut self) -> Result<ReadOutcome> {
        Record::read_from(&mut self.reader)
    }

    /// Reposition to an absolute offset
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}
