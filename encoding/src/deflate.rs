//! Raw deflate adapters, as used by _Deflated Explicit VR Little Endian_.
//!
//! Only the data set is compressed:
//! the file meta group always precedes the compressed stream uncompressed.
//! The stream is raw deflate, without zlib or gzip framing.

use flate2::Compression;
use std::io::{BufRead, Write};

/// Reader adapter inflating a raw deflate stream.
pub type InflateReader<R> = flate2::bufread::DeflateDecoder<R>;

/// Writer adapter deflating into a raw deflate stream.
/// It must be finished to flush the remaining compressed data.
pub type DeflateWriter<W> = flate2::write::DeflateEncoder<W>;

/// Wrap a buffered reader so that reading from it inflates the underlying data.
pub fn inflate_reader<R>(reader: R) -> InflateReader<R>
where
    R: BufRead,
{
    flate2::bufread::DeflateDecoder::new(reader)
}

/// Wrap a writer so that everything written to it is deflated.
pub fn deflate_writer<W>(writer: W) -> DeflateWriter<W>
where
    W: Write,
{
    flate2::write::DeflateEncoder::new(writer, Compression::fast())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn deflate_then_inflate() {
        let data = b"\x08\x00\x60\x00CS\x02\x00MR".repeat(20);
        let mut writer = deflate_writer(Vec::new());
        writer.write_all(&data).unwrap();
        let compressed = writer.finish().unwrap();
        assert!(compressed.len() < data.len());

        let mut out = Vec::new();
        inflate_reader(&compressed[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }
}
