//! Log Writer
//!
//! Buffered appender for the record log. Tracks the byte offset every
//! record lands at; that offset is what the ordered index stores.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::Result;

use super::Record;

/// Appends records to the log file
pub struct LogWriter {
    writer: BufWriter<File>,
    offset: u64,
}

impl LogWriter {
    /// Open an existing log (or create an empty one) and position at its end
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new().create(true).write(true).open(path)?;
        let offset = file.seek(SeekFrom::End(0))?;
        Ok(Self {
            writer: BufWriter::new(file),
            offset,
        })
    }

    /// Create a fresh, empty log, truncating anything already at `path`
    /// (used for the compaction copy)
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            offset: 0,
        })
    }

    /// Append one record; returns the offset it was written at
    pub fn append(&mut self, record: &Record) -> Result<u64> {
        self.append_raw(&record.encode())
    }

    /// Append pre-encoded record bytes; returns the offset they landed at
    pub fn append_raw(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = self.offset;
        self.writer.write_all(bytes)?;
        self.offset += bytes.len() as u64;
        Ok(offset)
    }

    /// Push buffered bytes to the file without forcing them to disk
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Force everything appended so far to durable storage
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// The offset the next append will be written at (equals the byte
    /// length of the log)
    pub fn offset(&self) -> u64 {
        self.offset
    }
}
