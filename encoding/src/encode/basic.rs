//! This module provides the basic encoder of binary numbers and primitive values,
//! in either Little Endian or Big Endian.

use byteordered::{ByteOrdered, Endianness};
use dcmcodec_core::{PrimitiveValue, Tag};
use std::io::Write;

type Result<T> = std::io::Result<T>;

/// A basic encoder of primitive elements
/// in the byte order chosen at construction.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub struct BasicEncoder(Endianness);

impl Default for BasicEncoder {
    fn default() -> Self {
        BasicEncoder(Endianness::Little)
    }
}

impl From<Endianness> for BasicEncoder {
    fn from(endianness: Endianness) -> Self {
        BasicEncoder(endianness)
    }
}

macro_rules! impl_encode {
    ($name: ident, $write: ident, $t: ty) => {
        #[doc = concat!("Encode a `", stringify!($t), "` value to the given writer.")]
        pub fn $name<W>(&self, to: W, value: $t) -> Result<()>
        where
            W: Write,
        {
            match self.0 {
                Endianness::Little => ByteOrdered::le(to).$write(value),
                Endianness::Big => ByteOrdered::be(to).$write(value),
            }
        }
    };
}

impl BasicEncoder {
    /// Create a basic encoder for the given byte order.
    pub fn new(endianness: Endianness) -> Self {
        BasicEncoder(endianness)
    }

    /// Retrieve the encoder's endianness.
    pub fn endianness(&self) -> Endianness {
        self.0
    }

    impl_encode!(encode_us, write_u16, u16);
    impl_encode!(encode_ss, write_i16, i16);
    impl_encode!(encode_ul, write_u32, u32);
    impl_encode!(encode_sl, write_i32, i32);
    impl_encode!(encode_uv, write_u64, u64);
    impl_encode!(encode_sv, write_i64, i64);
    impl_encode!(encode_fl, write_f32, f32);
    impl_encode!(encode_fd, write_f64, f64);

    /// Encode an attribute tag, group first.
    pub fn encode_tag<W>(&self, mut to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        self.encode_us(&mut to, tag.group())?;
        self.encode_us(to, tag.element())
    }

    /// Encode a primitive value to the given writer, without padding.
    ///
    /// Text is written as UTF-8 with values separated by backslashes.
    /// Text in other character sets should be encoded beforehand.
    pub fn encode_primitive<W>(&self, mut to: W, value: &PrimitiveValue) -> Result<()>
    where
        W: Write,
    {
        use PrimitiveValue::*;
        match value {
            Empty => Ok(()),
            Str(s) => to.write_all(s.as_bytes()),
            Strs(s) => {
                for (i, v) in s.iter().enumerate() {
                    if i > 0 {
                        to.write_all(b"\\")?;
                    }
                    to.write_all(v.as_bytes())?;
                }
                Ok(())
            }
            U8(values) => to.write_all(values),
            I16(values) => values.iter().try_for_each(|v| self.encode_ss(&mut to, *v)),
            U16(values) => values.iter().try_for_each(|v| self.encode_us(&mut to, *v)),
            I32(values) => values.iter().try_for_each(|v| self.encode_sl(&mut to, *v)),
            U32(values) => values.iter().try_for_each(|v| self.encode_ul(&mut to, *v)),
            I64(values) => values.iter().try_for_each(|v| self.encode_sv(&mut to, *v)),
            U64(values) => values.iter().try_for_each(|v| self.encode_uv(&mut to, *v)),
            F32(values) => values.iter().try_for_each(|v| self.encode_fl(&mut to, *v)),
            F64(values) => values.iter().try_for_each(|v| self.encode_fd(&mut to, *v)),
            Tags(tags) => tags.iter().try_for_each(|t| self.encode_tag(&mut to, *t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmcodec_core::dicom_value;

    #[test]
    fn encode_numbers() {
        let le = BasicEncoder::new(Endianness::Little);
        let be = BasicEncoder::new(Endianness::Big);
        let mut out = Vec::new();
        le.encode_us(&mut out, 0x0102).unwrap();
        be.encode_us(&mut out, 0x0102).unwrap();
        be.encode_tag(&mut out, Tag(0x0008, 0x0010)).unwrap();
        assert_eq!(out, vec![0x02, 0x01, 0x01, 0x02, 0x00, 0x08, 0x00, 0x10]);
    }

    #[test]
    fn encode_primitive_values() {
        let be = BasicEncoder::new(Endianness::Big);
        let mut out = Vec::new();
        be.encode_primitive(&mut out, &dicom_value!(U16, [1, 2])).unwrap();
        assert_eq!(out, vec![0, 1, 0, 2]);

        let mut out = Vec::new();
        be.encode_primitive(&mut out, &dicom_value!(Strs, ["ORIGINAL", "PRIMARY"]))
            .unwrap();
        assert_eq!(out, b"ORIGINAL\\PRIMARY");

        let mut out = Vec::new();
        be.encode_primitive(&mut out, &PrimitiveValue::Empty).unwrap();
        assert!(out.is_empty());
    }
}
