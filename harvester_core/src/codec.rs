//! Compression stages
//!
//! Compressors append a fixed suffix to the artifact name. Decompressors strip
//! it again (gzip) or take the name of the single archived entry (zip).
//! All of them buffer their output in memory before forwarding it.

mod gzip;
mod zip;

pub use self::gzip::{GZIP_SUFFIX, GzipCompressor, GzipDecompressor};
pub use self::zip::{ZIP_SUFFIX, ZipCompressor, ZipExtractor};
