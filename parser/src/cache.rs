//! Incremental buffering of an input stream.
//!
//! The [`MemoryCache`] is an append-only byte buffer
//! fed from a stream on demand,
//! giving random access to any byte already seen
//! and streaming byte ranges out to a sink,
//! optionally with a byte order swap.
//! The [`CachedSource`] is the positioned cursor the parser reads through.
//!
//! Random access reads past the loaded frontier
//! (or before bytes that were released) panic:
//! loading the bytes first is the caller's responsibility.

use byteordered::Endianness;
use dcmcodec_core::{Tag, VR};
use dcmcodec_encoding::byte_order;
use dcmcodec_encoding::deflate::{inflate_reader, InflateReader};
use dcmcodec_encoding::text::{DecodeTextError, SpecificCharacterSet, TextCodec};
use std::io::{self, BufRead, Chain, Cursor, Read, Write};
use std::ops::Range;

/// The number of bytes requested from the stream at a time.
const READ_CHUNK: usize = 8192;

/// Consumed bytes are only released once at least this many accumulate.
const RELEASE_THRESHOLD: u64 = 64 * 1024;

/// The stream type produced by [`MemoryCache::inflate`].
pub type InflatedStream<R> = InflateReader<Chain<Cursor<Vec<u8>>, R>>;

/// An append-only growable byte buffer over a stream.
///
/// Offsets are absolute stream positions.
/// Bytes in `base..loaded()` are available for random access.
#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    base: u64,
    buf: Vec<u8>,
}

impl MemoryCache {
    /// Create an empty cache for a stream starting at offset 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache for a stream whose first byte
    /// is at the given offset.
    pub fn with_base(base: u64) -> Self {
        MemoryCache {
            base,
            buf: Vec::new(),
        }
    }

    /// The offset of the first byte still held.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// The offset right after the last byte loaded so far.
    pub fn loaded(&self) -> u64 {
        self.base + self.buf.len() as u64
    }

    /// Read from `source` until `limit` bytes in total are loaded
    /// or the stream is exhausted.
    ///
    /// Bytes already loaded are never read again,
    /// so repeated calls with a growing limit resume the filling.
    /// Returns the offset of the loaded frontier.
    pub fn load_from_stream<R>(&mut self, limit: u64, source: &mut R) -> io::Result<u64>
    where
        R: ?Sized + Read,
    {
        while self.loaded() < limit {
            let want = (limit - self.loaded()).min(READ_CHUNK as u64) as usize;
            let start = self.buf.len();
            self.buf.resize(start + want, 0);
            match source.read(&mut self.buf[start..]) {
                Ok(0) => {
                    self.buf.truncate(start);
                    break;
                }
                Ok(n) => self.buf.truncate(start + n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => self.buf.truncate(start),
                Err(e) => {
                    self.buf.truncate(start);
                    return Err(e);
                }
            }
        }
        Ok(self.loaded())
    }

    /// Wrap the raw stream in a decompressor from `start_offset` onward.
    ///
    /// Bytes before `start_offset` stay as loaded.
    /// Bytes already loaded past it are compressed data
    /// read ahead from the stream,
    /// so they are taken out of the cache and fed to the decompressor first.
    /// Offsets from `start_offset` onward then refer to inflated bytes.
    ///
    /// # Panics
    ///
    /// Panics if `start_offset` is outside the held bytes.
    pub fn inflate<R>(&mut self, start_offset: u64, stream: R) -> InflatedStream<R>
    where
        R: BufRead,
    {
        let at = self.range(start_offset, 0).start;
        let pending = self.buf.split_off(at);
        inflate_reader(Cursor::new(pending).chain(stream))
    }

    /// Drop all bytes before `offset`.
    ///
    /// Offsets at or before the current base are a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is past the loaded frontier.
    pub fn release(&mut self, offset: u64) {
        if offset <= self.base {
            return;
        }
        assert!(
            offset <= self.loaded(),
            "cannot release up to offset {} past the loaded frontier {}",
            offset,
            self.loaded()
        );
        self.buf.drain(..(offset - self.base) as usize);
        self.base = offset;
    }

    fn range(&self, offset: u64, len: usize) -> Range<usize> {
        assert!(
            offset >= self.base && offset + len as u64 <= self.loaded(),
            "cache read of {} bytes at offset {} outside of loaded range {}..{}",
            len,
            offset,
            self.base,
            self.loaded()
        );
        let start = (offset - self.base) as usize;
        start..start + len
    }

    fn array_at<const N: usize>(&self, offset: u64) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.range(offset, N)]);
        out
    }

    /// Read a signed 16-bit integer at the given offset.
    pub fn i16_at(&self, offset: u64, endianness: Endianness) -> i16 {
        byte_order::i16_from(self.array_at(offset), endianness)
    }

    /// Read an unsigned 16-bit integer at the given offset.
    pub fn u16_at(&self, offset: u64, endianness: Endianness) -> u16 {
        byte_order::u16_from(self.array_at(offset), endianness)
    }

    /// Read a signed 32-bit integer at the given offset.
    pub fn i32_at(&self, offset: u64, endianness: Endianness) -> i32 {
        byte_order::i32_from(self.array_at(offset), endianness)
    }

    /// Read an unsigned 32-bit integer at the given offset.
    pub fn u32_at(&self, offset: u64, endianness: Endianness) -> u32 {
        byte_order::u32_from(self.array_at(offset), endianness)
    }

    /// Read a signed 64-bit integer at the given offset.
    pub fn i64_at(&self, offset: u64, endianness: Endianness) -> i64 {
        byte_order::i64_from(self.array_at(offset), endianness)
    }

    /// Read an unsigned 64-bit integer at the given offset.
    pub fn u64_at(&self, offset: u64, endianness: Endianness) -> u64 {
        byte_order::u64_from(self.array_at(offset), endianness)
    }

    /// Read an attribute tag at the given offset.
    pub fn tag_at(&self, offset: u64, endianness: Endianness) -> Tag {
        byte_order::tag_from(self.array_at(offset), endianness)
    }

    /// Borrow a loaded byte range.
    pub fn bytes_at(&self, offset: u64, len: usize) -> &[u8] {
        &self.buf[self.range(offset, len)]
    }

    /// Decode a loaded byte range as text in the given character set.
    pub fn string_at(
        &self,
        offset: u64,
        len: usize,
        charset: SpecificCharacterSet,
    ) -> Result<String, DecodeTextError> {
        charset.decode(self.bytes_at(offset, len))
    }

    /// Interpret the two bytes at the given offset as a value representation code.
    pub fn vr_code_at(&self, offset: u64) -> Option<VR> {
        VR::from_binary(self.array_at(offset))
    }

    /// Write a loaded byte range to the sink as is.
    pub fn write_bytes_to<W>(&self, offset: u64, len: usize, sink: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        sink.write_all(self.bytes_at(offset, len))
    }

    /// Write a loaded byte range to the sink,
    /// reversing the bytes of every `unit`-sized word on the way.
    ///
    /// `scratch` is working memory, reused across calls by the caller.
    pub fn write_swapped_bytes_to<W>(
        &self,
        offset: u64,
        len: usize,
        sink: &mut W,
        unit: usize,
        scratch: &mut Vec<u8>,
    ) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let bytes = self.bytes_at(offset, len);
        let chunk = if unit > 1 {
            READ_CHUNK - READ_CHUNK % unit
        } else {
            READ_CHUNK
        };
        for part in bytes.chunks(chunk) {
            scratch.clear();
            scratch.extend_from_slice(part);
            byte_order::swap_in_place(scratch, unit);
            sink.write_all(scratch)?;
        }
        Ok(())
    }
}

/// The underlying stream of a cached source,
/// which may switch to inflating its data mid-way.
#[derive(Debug)]
enum Stream<R> {
    Plain(R),
    Inflated(Box<InflatedStream<R>>),
    Detached,
}

impl<R> Read for Stream<R>
where
    R: BufRead,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(r) => r.read(buf),
            Stream::Inflated(r) => r.read(buf),
            Stream::Detached => Ok(0),
        }
    }
}

/// A positioned reader over a stream, buffered through a [`MemoryCache`].
///
/// Bytes behind the position are released as reading goes on,
/// unless the position was pinned,
/// in which case everything from the pinned offset is retained
/// until unpinned.
#[derive(Debug)]
pub struct CachedSource<R> {
    cache: MemoryCache,
    stream: Stream<R>,
    position: u64,
    pins: Vec<u64>,
}

impl<R> CachedSource<R>
where
    R: BufRead,
{
    /// Create a cached source over a stream starting at offset 0.
    pub fn new(stream: R) -> Self {
        Self::with_offset(stream, 0)
    }

    /// Create a cached source over a stream
    /// whose first byte is at the given absolute offset.
    pub fn with_offset(stream: R, offset: u64) -> Self {
        CachedSource {
            cache: MemoryCache::with_base(offset),
            stream: Stream::Plain(stream),
            position: offset,
            pins: Vec::new(),
        }
    }

    /// The absolute offset of the next byte to read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Access the underlying cache.
    pub fn cache(&self) -> &MemoryCache {
        &self.cache
    }

    /// Whether the bytes from here on are being inflated.
    pub fn is_inflated(&self) -> bool {
        matches!(self.stream, Stream::Inflated(_))
    }

    /// Inflate all data from the current position onward.
    pub fn inflate(&mut self) {
        self.stream = match std::mem::replace(&mut self.stream, Stream::Detached) {
            Stream::Plain(r) => {
                tracing::debug!("Inflating data set from position {}", self.position);
                Stream::Inflated(Box::new(self.cache.inflate(self.position, r)))
            }
            other => other,
        };
    }

    /// Make sure that `n` bytes from the current position are loaded.
    /// Returns whether the stream had enough bytes.
    pub fn fill(&mut self, n: usize) -> io::Result<bool> {
        let limit = self.position + n as u64;
        Ok(self.cache.load_from_stream(limit, &mut self.stream)? >= limit)
    }

    /// Look at the next `n` bytes without consuming them.
    /// Returns `None` if the stream ends before that.
    pub fn peek(&mut self, n: usize) -> io::Result<Option<&[u8]>> {
        if self.fill(n)? {
            Ok(Some(self.cache.bytes_at(self.position, n)))
        } else {
            Ok(None)
        }
    }

    /// Look at the tag starting `skip` bytes past the current position.
    pub fn peek_tag_at(&mut self, skip: usize, endianness: Endianness) -> io::Result<Option<Tag>> {
        if self.fill(skip + 4)? {
            Ok(Some(self.cache.tag_at(self.position + skip as u64, endianness)))
        } else {
            Ok(None)
        }
    }

    /// Advance the position by `n` bytes, without keeping them
    /// unless pinned.
    pub fn skip(&mut self, n: u64) -> io::Result<()> {
        let end = self.position + n;
        while self.position < end {
            let step = (end - self.position).min(READ_CHUNK as u64) as usize;
            if !self.fill(step)? {
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
            self.position += step as u64;
            self.compact();
        }
        Ok(())
    }

    /// Stream the next `n` bytes to the sink.
    pub fn copy_to<W>(&mut self, n: u64, sink: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let end = self.position + n;
        while self.position < end {
            let step = (end - self.position).min(READ_CHUNK as u64) as usize;
            if !self.fill(step)? {
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
            self.cache.write_bytes_to(self.position, step, sink)?;
            self.position += step as u64;
            self.compact();
        }
        Ok(())
    }

    /// Stream the next `n` bytes to the sink,
    /// swapping the byte order of each `unit`-sized word.
    pub fn copy_swapped_to<W>(
        &mut self,
        n: u64,
        sink: &mut W,
        unit: usize,
        scratch: &mut Vec<u8>,
    ) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let chunk = (READ_CHUNK - READ_CHUNK % unit.max(1)) as u64;
        let end = self.position + n;
        while self.position < end {
            let step = (end - self.position).min(chunk) as usize;
            if !self.fill(step)? {
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
            self.cache
                .write_swapped_bytes_to(self.position, step, sink, unit, scratch)?;
            self.position += step as u64;
            self.compact();
        }
        Ok(())
    }

    /// Retain every byte from the current position until [`unpin`](Self::unpin).
    /// Pins nest.
    pub fn pin(&mut self) -> u64 {
        self.pins.push(self.position);
        self.position
    }

    /// Remove the innermost pin.
    pub fn unpin(&mut self) {
        self.pins.pop();
        self.compact();
    }

    /// Borrow the bytes read since the given pinned offset.
    pub fn bytes_since(&self, offset: u64) -> &[u8] {
        self.cache
            .bytes_at(offset, (self.position - offset) as usize)
    }

    fn compact(&mut self) {
        let keep_from = self.pins.first().copied().unwrap_or(self.position);
        if keep_from - self.cache.base() >= RELEASE_THRESHOLD {
            self.cache.release(keep_from);
        }
    }
}

impl<R> Read for CachedSource<R>
where
    R: BufRead,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.position >= self.cache.loaded() {
            let limit = self.position + buf.len().max(READ_CHUNK) as u64;
            self.cache.load_from_stream(limit, &mut self.stream)?;
        }
        let available = (self.cache.loaded() - self.position) as usize;
        let n = available.min(buf.len());
        if n == 0 {
            return Ok(0);
        }
        buf[..n].copy_from_slice(self.cache.bytes_at(self.position, n));
        self.position += n as u64;
        self.compact();
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmcodec_encoding::deflate::deflate_writer;

    #[test]
    fn load_incrementally() {
        let data: Vec<u8> = (0..=255).collect();
        let mut source = &data[..];
        let mut cache = MemoryCache::new();
        assert_eq!(cache.load_from_stream(10, &mut source).unwrap(), 10);
        assert_eq!(cache.load_from_stream(4, &mut source).unwrap(), 10);
        assert_eq!(cache.load_from_stream(100, &mut source).unwrap(), 100);
        assert_eq!(cache.bytes_at(8, 4), &[8, 9, 10, 11]);
        // the stream is exhausted before the limit
        assert_eq!(cache.load_from_stream(1000, &mut source).unwrap(), 256);
    }

    #[test]
    fn random_access() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            0x08, 0x00, 0x10, 0x00, // (0008,0010) in LE
            b'C', b'S',
            0xFE, 0xFF, 0xFF, 0xFF, // -2 as i32 LE
        ];
        let mut cache = MemoryCache::new();
        cache.load_from_stream(64, &mut &data[..]).unwrap();
        assert_eq!(cache.tag_at(0, Endianness::Little), Tag(0x0008, 0x0010));
        assert_eq!(cache.tag_at(0, Endianness::Big), Tag(0x0800, 0x1000));
        assert_eq!(cache.u16_at(0, Endianness::Little), 8);
        assert_eq!(cache.vr_code_at(4), Some(VR::CS));
        assert_eq!(cache.vr_code_at(0), None);
        assert_eq!(cache.i32_at(6, Endianness::Little), -2);
        assert_eq!(
            cache
                .string_at(4, 2, SpecificCharacterSet::Default)
                .unwrap(),
            "CS"
        );
    }

    #[test]
    #[should_panic]
    fn read_past_frontier_panics() {
        let mut cache = MemoryCache::new();
        cache.load_from_stream(4, &mut &[1u8, 2, 3, 4, 5, 6][..]).unwrap();
        cache.u64_at(0, Endianness::Little);
    }

    #[test]
    fn release_keeps_offsets() {
        let data: Vec<u8> = (0..64).collect();
        let mut cache = MemoryCache::new();
        cache.load_from_stream(64, &mut &data[..]).unwrap();
        cache.release(32);
        assert_eq!(cache.base(), 32);
        assert_eq!(cache.bytes_at(32, 2), &[32, 33]);
        assert_eq!(cache.loaded(), 64);
    }

    #[test]
    fn swapped_copy() {
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut cache = MemoryCache::new();
        cache.load_from_stream(8, &mut &data[..]).unwrap();
        let mut out = Vec::new();
        let mut scratch = Vec::new();
        cache
            .write_swapped_bytes_to(0, 8, &mut out, 2, &mut scratch)
            .unwrap();
        assert_eq!(out, vec![2, 1, 4, 3, 6, 5, 8, 7]);
        out.clear();
        cache
            .write_swapped_bytes_to(0, 8, &mut out, 4, &mut scratch)
            .unwrap();
        assert_eq!(out, vec![4, 3, 2, 1, 8, 7, 6, 5]);
        out.clear();
        cache.write_bytes_to(2, 3, &mut out).unwrap();
        assert_eq!(out, vec![3, 4, 5]);
    }

    #[test]
    fn inflate_after_plain_prefix() {
        let body = b"compressed part of the stream".repeat(4);
        let mut encoder = deflate_writer(Vec::new());
        encoder.write_all(&body).unwrap();
        let mut data = b"HEAD".to_vec();
        data.extend(encoder.finish().unwrap());

        let mut source = CachedSource::new(&data[..]);
        let mut head = [0u8; 4];
        source.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"HEAD");
        // the read ahead already took compressed bytes into the cache
        assert!(source.cache().loaded() > 4);

        source.inflate();
        assert!(source.is_inflated());
        assert_eq!(source.position(), 4);
        let mut out = Vec::new();
        source.read_to_end(&mut out).unwrap();
        assert_eq!(out, body);
        assert_eq!(source.position(), 4 + body.len() as u64);
    }

    #[test]
    fn cursor_operations() {
        let data: Vec<u8> = (0..100).collect();
        let mut source = CachedSource::with_offset(&data[..], 1000);
        assert_eq!(source.peek(2).unwrap(), Some(&[0u8, 1][..]));
        source.skip(10).unwrap();
        assert_eq!(source.position(), 1010);

        let start = source.pin();
        let mut out = Vec::new();
        source.copy_to(5, &mut out).unwrap();
        assert_eq!(out, vec![10, 11, 12, 13, 14]);
        assert_eq!(source.bytes_since(start), &[10, 11, 12, 13, 14]);
        source.unpin();

        assert!(source.skip(200).is_err());
        assert_eq!(source.position(), 1015);
        source.skip(85).unwrap();
        assert_eq!(source.peek(1).unwrap(), None);
    }

    #[test]
    fn peek_tag_ahead() {
        #[rustfmt::skip]
        let data = [
            0x08, 0x00, 0x60, 0x00,
            0xFE, 0xFF, 0x00, 0xE0,
        ];
        let mut source = CachedSource::new(&data[..]);
        assert_eq!(
            source.peek_tag_at(4, Endianness::Little).unwrap(),
            Some(Tag(0xFFFE, 0xE000))
        );
        assert_eq!(
            source.peek_tag_at(0, Endianness::Big).unwrap(),
            Some(Tag(0x0800, 0x6000))
        );
        assert_eq!(source.peek_tag_at(6, Endianness::Little).unwrap(), None);
        assert_eq!(source.position(), 0);
    }
}
