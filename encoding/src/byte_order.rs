//! Conversion of fixed-size byte spans to and from numbers,
//! under either little or big endian byte order.
//!
//! These are pure, total functions over fixed-size arrays.
//! An attribute tag is two independent 16-bit words:
//! the group and the element are each subject to the byte order
//! and then combined, group first.
//! So `(0008,0010)` is `08 00 10 00` in little endian
//! and `00 08 00 10` in big endian.

use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use byteordered::Endianness;
use dcmcodec_core::Tag;

macro_rules! impl_read {
    ($name: ident, $t: ty, $n: expr, $read: ident) => {
        #[doc = concat!("Decode a `", stringify!($t), "` from its ", stringify!($n), " bytes.")]
        #[inline]
        pub fn $name(bytes: [u8; $n], endianness: Endianness) -> $t {
            match endianness {
                Endianness::Little => LittleEndian::$read(&bytes),
                Endianness::Big => BigEndian::$read(&bytes),
            }
        }
    };
}

macro_rules! impl_write {
    ($to: ident, $write: ident, $t: ty, $n: expr, $w: ident) => {
        #[doc = concat!("Encode a `", stringify!($t), "` into ", stringify!($n), " bytes.")]
        #[inline]
        pub fn $to(value: $t, endianness: Endianness) -> [u8; $n] {
            let mut out = [0u8; $n];
            match endianness {
                Endianness::Little => LittleEndian::$w(&mut out, value),
                Endianness::Big => BigEndian::$w(&mut out, value),
            }
            out
        }

        #[doc = concat!("Write a `", stringify!($t), "` into `dst` at the given offset.")]
        ///
        /// # Panics
        ///
        /// Panics if the destination does not have enough room.
        #[inline]
        pub fn $write(dst: &mut [u8], offset: usize, value: $t, endianness: Endianness) {
            dst[offset..offset + $n].copy_from_slice(&$to(value, endianness));
        }
    };
}

impl_read!(u16_from, u16, 2, read_u16);
impl_read!(i16_from, i16, 2, read_i16);
impl_read!(u32_from, u32, 4, read_u32);
impl_read!(i32_from, i32, 4, read_i32);
impl_read!(u64_from, u64, 8, read_u64);
impl_read!(i64_from, i64, 8, read_i64);
impl_read!(f32_from, f32, 4, read_f32);
impl_read!(f64_from, f64, 8, read_f64);

impl_write!(u16_to, write_u16, u16, 2, write_u16);
impl_write!(i16_to, write_i16, i16, 2, write_i16);
impl_write!(u32_to, write_u32, u32, 4, write_u32);
impl_write!(i32_to, write_i32, i32, 4, write_i32);
impl_write!(u64_to, write_u64, u64, 8, write_u64);
impl_write!(i64_to, write_i64, i64, 8, write_i64);
impl_write!(f32_to, write_f32, f32, 4, write_f32);
impl_write!(f64_to, write_f64, f64, 8, write_f64);

/// Decode an attribute tag from its 4 bytes.
#[inline]
pub fn tag_from(bytes: [u8; 4], endianness: Endianness) -> Tag {
    let group = u16_from([bytes[0], bytes[1]], endianness);
    let element = u16_from([bytes[2], bytes[3]], endianness);
    Tag(group, element)
}

/// Encode an attribute tag into 4 bytes.
#[inline]
pub fn tag_to(tag: Tag, endianness: Endianness) -> [u8; 4] {
    let g = u16_to(tag.group(), endianness);
    let e = u16_to(tag.element(), endianness);
    [g[0], g[1], e[0], e[1]]
}

/// Write an attribute tag into `dst` at the given offset.
///
/// # Panics
///
/// Panics if the destination does not have enough room.
#[inline]
pub fn write_tag(dst: &mut [u8], offset: usize, tag: Tag, endianness: Endianness) {
    dst[offset..offset + 4].copy_from_slice(&tag_to(tag, endianness));
}

/// Reverse the bytes of every `unit`-sized word in the buffer,
/// converting it between byte orders.
///
/// A trailing partial word is left untouched.
/// Units of 1 byte or less leave the buffer unchanged.
pub fn swap_in_place(buf: &mut [u8], unit: usize) {
    if unit <= 1 {
        return;
    }
    for word in buf.chunks_exact_mut(unit) {
        word.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_byte_order() {
        let tag = Tag(0x0008, 0x0010);
        assert_eq!(tag_to(tag, Endianness::Little), [0x08, 0x00, 0x10, 0x00]);
        assert_eq!(tag_to(tag, Endianness::Big), [0x00, 0x08, 0x00, 0x10]);
        assert_eq!(tag_from([0x08, 0x00, 0x10, 0x00], Endianness::Little), tag);
        assert_eq!(tag_from([0x00, 0x08, 0x00, 0x10], Endianness::Big), tag);
    }

    #[test]
    fn scalars() {
        assert_eq!(u16_from([0x34, 0x12], Endianness::Little), 0x1234);
        assert_eq!(u16_from([0x12, 0x34], Endianness::Big), 0x1234);
        assert_eq!(i16_from([0xFF, 0xFE], Endianness::Big), -2);
        assert_eq!(
            u32_from([0x78, 0x56, 0x34, 0x12], Endianness::Little),
            0x1234_5678
        );
        assert_eq!(i32_from([0xFF, 0xFF, 0xFF, 0xFF], Endianness::Little), -1);
        assert_eq!(
            u64_from([0, 0, 0, 0, 0, 0, 0x01, 0x00], Endianness::Big),
            0x100
        );
        assert_eq!(i64_from([0xFE; 8], Endianness::Little), i64::from_le_bytes([0xFE; 8]));
        assert_eq!(f32_from(1.5f32.to_be_bytes(), Endianness::Big), 1.5);
        assert_eq!(f64_from(0.25f64.to_le_bytes(), Endianness::Little), 0.25);
    }

    #[test]
    fn writers() {
        let mut buf = [0u8; 8];
        write_u16(&mut buf, 0, 0x0102, Endianness::Big);
        write_u16(&mut buf, 2, 0x0102, Endianness::Little);
        write_i32(&mut buf, 4, -2, Endianness::Little);
        assert_eq!(buf, [0x01, 0x02, 0x02, 0x01, 0xFE, 0xFF, 0xFF, 0xFF]);

        let mut buf = [0u8; 6];
        write_tag(&mut buf, 2, Tag(0x7FE0, 0x0010), Endianness::Big);
        assert_eq!(buf, [0, 0, 0x7F, 0xE0, 0x00, 0x10]);
        assert_eq!(u32_to(0xFFFF_FFFF, Endianness::Big), [0xFF; 4]);
    }

    #[test]
    fn swap_words() {
        let mut buf = [1, 2, 3, 4, 5, 6, 7];
        swap_in_place(&mut buf, 2);
        assert_eq!(buf, [2, 1, 4, 3, 6, 5, 7]);
        let mut buf = [1, 2, 3, 4, 5, 6, 7, 8];
        swap_in_place(&mut buf, 4);
        assert_eq!(buf, [4, 3, 2, 1, 8, 7, 6, 5]);
    }
}
