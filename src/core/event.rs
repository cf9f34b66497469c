//! Recorded filesystem events
//!
//! Traces are stored as JSON lines, one event per line:
//!
//! ```text
//! {"op":"open","path":"/data/sound/abc.ifs","handle":3}
//! {"op":"read","handle":3,"dest":4096}
//! {"op":"mount","mountpoint":"mnt1","fsroot":"root1","fstype":"ramfs","flags":"base=0x1000"}
//! {"op":"demangle","path":"mnt2/whatever.bin"}
//! ```

use super::ids::{BufferAddr, FileHandle};
use crate::error::{DemanglerError, Result};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// One intercepted filesystem call, or a demangle query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum FsEvent {
    Open {
        path: String,
        handle: FileHandle,
    },
    Read {
        handle: FileHandle,
        dest: BufferAddr,
    },
    Mount {
        mountpoint: String,
        fsroot: String,
        fstype: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flags: Option<String>,
    },
    Demangle {
        path: String,
    },
}

impl FsEvent {
    /// Parse a single JSON line; `line` is the 1-based line number for errors
    pub fn parse_line(text: &str, line: usize) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| DemanglerError::MalformedEvent {
            line,
            reason: e.to_string(),
        })
    }
}

/// Read a whole JSON-lines trace, skipping blank lines and `#` comments
pub fn read_trace<R: BufRead>(reader: R) -> Result<Vec<FsEvent>> {
    let mut events = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        events.push(FsEvent::parse_line(trimmed, idx + 1)?);
    }

    Ok(events)
}
