//! Opaque identifiers observed from the engine
//!
//! Handles and buffer addresses are only ever used as lookup keys. They are
//! never dereferenced, so plain integers are enough.

use serde::{Deserialize, Serialize};
use std::fmt;

/// File handle returned by the engine's open call
///
/// Negative values signal a failed open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileHandle(pub i64);

impl FileHandle {
    pub fn new(raw: i64) -> Self {
        FileHandle(raw)
    }

    /// True unless the engine reported a failed open
    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }

    pub fn raw(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for FileHandle {
    fn from(raw: i64) -> Self {
        FileHandle(raw)
    }
}

/// Destination address of a read, later echoed back in ramfs mount flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BufferAddr(pub u64);

impl BufferAddr {
    pub fn new(raw: u64) -> Self {
        BufferAddr(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for BufferAddr {
    fn from(raw: u64) -> Self {
        BufferAddr(raw)
    }
}
