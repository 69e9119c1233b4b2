//! Reading the header line of a delimited text stream.

pub mod parser;
pub mod reader;

pub use parser::{
    HeaderError, HeaderFormat, HeaderScan, finish_header, scan_header, scan_header_from,
};
pub use reader::{DEFAULT_MAX_HEADER_BYTES, HeaderReader};
