//! Definition and reference locations.

use serde::{Deserialize, Serialize};

/// A definition location: a file plus a 1-based line and a byte-offset span.
///
/// Invariant: `end_offset - start_offset` equals the byte length of the
/// symbol's `Content`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLine {
    #[serde(rename = "File", default)]
    pub file: String,
    #[serde(rename = "Line", default = "default_line")]
    pub line: u32,
    #[serde(rename = "StartOffset", default)]
    pub start_offset: usize,
    #[serde(rename = "EndOffset", default)]
    pub end_offset: usize,
}

fn default_line() -> u32 {
    1
}

impl FileLine {
    pub fn new(file: impl Into<String>, line: u32, start_offset: usize, end_offset: usize) -> Self {
        Self {
            file: file.into(),
            line,
            start_offset,
            end_offset,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }
}
