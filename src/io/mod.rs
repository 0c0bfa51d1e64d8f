//! Low-level I/O shared by the GeoTIFF reader and writer

use std::io::{Read, Seek};

pub mod byte_order;

pub use byte_order::ByteOrder;

/// Byte source the TIFF reader can seek in: files, buffered files and
/// in-memory cursors.
pub trait SeekableReader: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekableReader for T {}
