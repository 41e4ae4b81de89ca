//! Explicit VR header decoding, in either byte order.

use crate::decode::basic::BasicDecoder;
use crate::decode::*;
use byteordered::Endianness;
use dcmcodec_core::header::{DataElementHeader, Length, SequenceItemHeader, Tag, VR};
use snafu::ResultExt;
use std::io::Read;
use std::str::FromStr;

/// A data element header decoder for the explicit VR transfer syntaxes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExplicitVRDecoder {
    basic: BasicDecoder,
}

impl ExplicitVRDecoder {
    /// Create an explicit VR header decoder for the given byte order.
    pub fn new(endianness: Endianness) -> Self {
        ExplicitVRDecoder {
            basic: BasicDecoder::new(endianness),
        }
    }

    /// Explicit VR Little Endian
    pub fn little_endian() -> Self {
        Self::new(Endianness::Little)
    }

    /// Explicit VR Big Endian
    pub fn big_endian() -> Self {
        Self::new(Endianness::Big)
    }

    /// The byte order expected by this decoder.
    pub fn endianness(&self) -> Endianness {
        self.basic.endianness()
    }
}

impl Decode for ExplicitVRDecoder {
    fn decode_header<S>(&self, mut source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        let group = self.basic.decode_us(&mut source).context(ReadHeaderTagSnafu)?;
        let element = self.basic.decode_us(&mut source).context(ReadTagSnafu)?;
        let tag = Tag(group, element);

        // items and delimiters never carry a value representation
        if group == 0xFFFE {
            let len = self.basic.decode_ul(&mut source).context(ReadItemLengthSnafu)?;
            return Ok((DataElementHeader::new(tag, VR::UN, Length(len)), 8));
        }

        let mut buf = [0u8; 2];
        source.read_exact(&mut buf).context(ReadVrSnafu)?;
        let vr = match VR::from_binary(buf) {
            Some(vr) => vr,
            None => VR::from_str(&String::from_utf8_lossy(&buf)).context(BadVrSnafu)?,
        };

        let (len, bytes_read) = if vr.has_short_length_field() {
            let len = self.basic.decode_us(&mut source).context(ReadLengthSnafu)?;
            (u32::from(len), 8)
        } else {
            // 2 reserved bytes, then a 4-byte length
            source.read_exact(&mut buf).context(ReadReservedSnafu)?;
            let len = self.basic.decode_ul(&mut source).context(ReadLengthSnafu)?;
            (len, 12)
        };

        Ok((DataElementHeader::new(tag, vr, Length(len)), bytes_read))
    }

    fn decode_item_header<S>(&self, mut source: &mut S) -> Result<SequenceItemHeader>
    where
        S: ?Sized + Read,
    {
        let group = self.basic.decode_us(&mut source).context(ReadItemHeaderSnafu)?;
        let element = self.basic.decode_us(&mut source).context(ReadItemHeaderSnafu)?;
        let len = self.basic.decode_ul(&mut source).context(ReadItemLengthSnafu)?;
        SequenceItemHeader::new((group, element), Length(len)).context(BadSequenceHeaderSnafu)
    }

    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        self.basic.decode_tag(source).context(ReadTagSnafu)
    }
}
