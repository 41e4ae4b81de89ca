//! Implicit VR header encoding.

use crate::encode::basic::BasicEncoder;
use crate::encode::*;
use byteordered::Endianness;
use dcmcodec_core::header::{DataElementHeader, HasLength, Header, Tag, VR};
use snafu::ResultExt;
use std::io::Write;

/// A data element header encoder for implicit VR,
/// where every header is a tag followed by a 4-byte length.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImplicitVREncoder {
    basic: BasicEncoder,
}

impl ImplicitVREncoder {
    /// Create an implicit VR header encoder for the given byte order.
    pub fn new(endianness: Endianness) -> Self {
        ImplicitVREncoder {
            basic: BasicEncoder::new(endianness),
        }
    }

    /// The byte order of the output.
    pub fn endianness(&self) -> Endianness {
        self.basic.endianness()
    }
}

impl Encode for ImplicitVREncoder {
    fn encode_tag<W>(&self, to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        self.basic.encode_tag(to, tag).context(WriteTagSnafu)
    }

    fn encode_element_header<W>(&self, mut to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write,
    {
        self.encode_tag(&mut to, de.tag())?;
        self.basic
            .encode_ul(&mut to, de.length().0)
            .context(WriteLengthSnafu)?;
        Ok(8)
    }

    fn encode_item_header<W>(&self, to: W, len: u32) -> Result<()>
    where
        W: Write,
    {
        write_item_like(self.basic, to, Tag::ITEM, len).context(WriteItemHeaderSnafu)
    }

    fn encode_item_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write,
    {
        write_item_like(self.basic, to, Tag::ITEM_DELIMITER, 0).context(WriteItemDelimiterSnafu)
    }

    fn encode_sequence_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write,
    {
        write_item_like(self.basic, to, Tag::SEQUENCE_DELIMITER, 0)
            .context(WriteSequenceDelimiterSnafu)
    }

    fn header_len(&self, _vr: VR) -> u32 {
        8
    }
}

#[cfg(test)]
mod tests {
    use super::ImplicitVREncoder;
    use crate::encode::Encode;
    use byteordered::Endianness;
    use dcmcodec_core::header::{DataElementHeader, Length, Tag, VR};

    #[test]
    fn encode_implicit_vr_le() {
        let enc = ImplicitVREncoder::new(Endianness::Little);
        let mut out = Vec::new();
        let bytes = enc
            .encode_element_header(
                &mut out,
                DataElementHeader::new(Tag(0x0002, 0x0010), VR::UI, Length(20)),
            )
            .unwrap();
        assert_eq!(bytes, 8);
        assert_eq!(out, vec![0x02, 0x00, 0x10, 0x00, 0x14, 0x00, 0x00, 0x00]);

        let mut out = Vec::new();
        enc.encode_item_header(&mut out, 0xFFFF_FFFF).unwrap();
        assert_eq!(out, vec![0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(enc.header_len(VR::OB), 8);
    }
}
