//! Splits the first line of a buffer into column keys.
//!
//! Everything here is a pure function of the buffer; the caller decides when to
//! ask for more data.

use thiserror::Error;

pub const DEFAULT_SEPARATOR: u8 = b',';
pub const DEFAULT_TERMINATOR: u8 = b'\n';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header line is not valid UTF-8 (at byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },
}

/// Field separator and line terminator used to recognize the header line.
///
/// Both are single ASCII bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderFormat {
    pub separator: u8,
    pub terminator: u8,
}

impl Default for HeaderFormat {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            terminator: DEFAULT_TERMINATOR,
        }
    }
}

impl HeaderFormat {
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderScan {
    /// No line terminator yet.
    Pending,
    /// The first line was complete; these are its keys.
    Found(Vec<String>),
}

/// Looks for a complete first line in `buf` and splits it if there is one.
pub fn scan_header(buf: &[u8], format: &HeaderFormat) -> Result<HeaderScan, HeaderError> {
    scan_header_from(buf, 0, format)
}

/// Like [`scan_header`], but only searches `buf[from..]` for the terminator.
///
/// `from` must not skip a terminator: callers pass the length of a prefix already
/// known to hold none.
pub fn scan_header_from(
    buf: &[u8],
    from: usize,
    format: &HeaderFormat,
) -> Result<HeaderScan, HeaderError> {
    match find_terminator(buf, from, format) {
        Some(end) => split_line(&buf[..end], format).map(HeaderScan::Found),
        None => Ok(HeaderScan::Pending),
    }
}

fn find_terminator(buf: &[u8], from: usize, format: &HeaderFormat) -> Option<usize> {
    let tail = buf.get(from..)?;
    tail.iter()
        .position(|&b| b == format.terminator)
        .map(|offset| from + offset)
}

/// Treats all of `buf` as the header line. Used once the source has no more data
/// and no terminator was seen. An empty buffer yields `[""]`.
pub fn finish_header(buf: &[u8], format: &HeaderFormat) -> Result<Vec<String>, HeaderError> {
    let line = match find_terminator(buf, 0, format) {
        Some(end) => &buf[..end],
        None => buf,
    };
    split_line(line, format)
}

fn split_line(line: &[u8], format: &HeaderFormat) -> Result<Vec<String>, HeaderError> {
    let text = std::str::from_utf8(line).map_err(|e| HeaderError::InvalidUtf8 {
        valid_up_to: e.valid_up_to(),
    })?;
    Ok(text
        .split(char::from(format.separator))
        .map(str::to_string)
        .collect())
}
