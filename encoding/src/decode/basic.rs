//! This module provides the primitive decoder of binary numbers,
//! which may be in either Little Endian or Big Endian.

use byteordered::{ByteOrdered, Endianness};
use dcmcodec_core::Tag;
use std::io::Read;

type Result<T> = std::io::Result<T>;

/// A basic decoder of DICOM primitive elements
/// in the byte order chosen at construction.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub struct BasicDecoder(Endianness);

impl Default for BasicDecoder {
    fn default() -> Self {
        BasicDecoder(Endianness::Little)
    }
}

impl From<Endianness> for BasicDecoder {
    fn from(endianness: Endianness) -> Self {
        BasicDecoder(endianness)
    }
}

macro_rules! impl_decode {
    ($single: ident, $multi: ident, $read: ident, $read_into: ident, $t: ty) => {
        #[doc = concat!("Decode a single `", stringify!($t), "` from the given source.")]
        pub fn $single<S>(&self, source: S) -> Result<$t>
        where
            S: Read,
        {
            match self.0 {
                Endianness::Little => ByteOrdered::le(source).$read(),
                Endianness::Big => ByteOrdered::be(source).$read(),
            }
        }

        #[doc = concat!("Decode a sequence of `", stringify!($t), "` from the given source")]
        /// into the target slice.
        pub fn $multi<S>(&self, source: S, target: &mut [$t]) -> Result<()>
        where
            S: Read,
        {
            match self.0 {
                Endianness::Little => ByteOrdered::le(source).$read_into(target),
                Endianness::Big => ByteOrdered::be(source).$read_into(target),
            }
        }
    };
}

impl BasicDecoder {
    /// Create a basic decoder for the given byte order.
    pub fn new(endianness: Endianness) -> Self {
        BasicDecoder(endianness)
    }

    /// Retrieve the source's endianness, as expected by this decoder.
    pub fn endianness(&self) -> Endianness {
        self.0
    }

    impl_decode!(decode_us, decode_us_into, read_u16, read_u16_into, u16);
    impl_decode!(decode_ss, decode_ss_into, read_i16, read_i16_into, i16);
    impl_decode!(decode_ul, decode_ul_into, read_u32, read_u32_into, u32);
    impl_decode!(decode_sl, decode_sl_into, read_i32, read_i32_into, i32);
    impl_decode!(decode_uv, decode_uv_into, read_u64, read_u64_into, u64);
    impl_decode!(decode_sv, decode_sv_into, read_i64, read_i64_into, i64);
    impl_decode!(decode_fl, decode_fl_into, read_f32, read_f32_into, f32);
    impl_decode!(decode_fd, decode_fd_into, read_f64, read_f64_into, f64);

    /// Decode a DICOM attribute tag from the given source.
    pub fn decode_tag<S>(&self, mut source: S) -> Result<Tag>
    where
        S: Read,
    {
        let g = self.decode_us(&mut source)?;
        let e = self.decode_us(source)?;
        Ok(Tag(g, e))
    }
}
