//! Append-only output buffer shared by every block of one stream.

use crate::error::{Error, Result};

/// Decoded bytes of one inflate session.
///
/// Back-references read from bytes already written here, including bytes
/// written by earlier blocks.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
    limit: Option<usize>,
}

impl OutputBuffer {
    /// Create a buffer with `capacity` reserved and an optional size limit.
    pub fn new(capacity: usize, limit: Option<usize>) -> Self {
        let capacity = limit.map_or(capacity, |limit| capacity.min(limit));
        Self {
            bytes: Vec::with_capacity(capacity),
            limit,
        }
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// View the decoded bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Append one literal byte.
    #[inline]
    pub fn push(&mut self, byte: u8) -> Result<()> {
        self.reserve_checked(1)?;
        self.bytes.push(byte);
        Ok(())
    }

    /// Append a run of raw bytes (stored block payload).
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve_checked(bytes.len())?;
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    /// Copy `length` bytes starting `distance` bytes behind the end.
    ///
    /// When `distance < length` the source overlaps bytes this copy writes,
    /// so the copy proceeds one byte at a time.
    pub fn copy_match(&mut self, distance: usize, length: usize) -> Result<()> {
        if distance == 0 || distance > self.bytes.len() {
            return Err(Error::DistanceOutOfRange {
                distance,
                available: self.bytes.len(),
            });
        }
        self.reserve_checked(length)?;

        let start = self.bytes.len() - distance;
        for i in 0..length {
            let byte = self.bytes[start + i];
            self.bytes.push(byte);
        }
        Ok(())
    }

    /// Take the decoded bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    fn reserve_checked(&self, additional: usize) -> Result<()> {
        match self.limit {
            Some(limit) if self.bytes.len() + additional > limit => {
                Err(Error::OutputLimitExceeded { limit })
            }
            _ => Ok(()),
        }
    }
}
