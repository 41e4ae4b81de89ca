//! Explicit VR header encoding, in either byte order.

use crate::encode::basic::BasicEncoder;
use crate::encode::*;
use byteordered::Endianness;
use dcmcodec_core::header::{DataElementHeader, HasLength, Header, Tag, VR};
use snafu::{ensure, ResultExt};
use std::io::Write;

/// A data element header encoder for the explicit VR transfer syntaxes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExplicitVREncoder {
    basic: BasicEncoder,
}

impl ExplicitVREncoder {
    /// Create an explicit VR header encoder for the given byte order.
    pub fn new(endianness: Endianness) -> Self {
        ExplicitVREncoder {
            basic: BasicEncoder::new(endianness),
        }
    }

    /// The byte order of the output.
    pub fn endianness(&self) -> Endianness {
        self.basic.endianness()
    }
}

impl Encode for ExplicitVREncoder {
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
        let len = de.length().0;
        self.encode_tag(&mut to, de.tag())?;
        to.write_all(&de.vr().to_bytes()).context(WriteVrSnafu)?;
        if de.vr().has_short_length_field() {
            ensure!(
                len <= u32::from(u16::MAX),
                LengthOverflowSnafu {
                    tag: de.tag(),
                    vr: de.vr(),
                    len: de.length(),
                }
            );
            self.basic
                .encode_us(&mut to, len as u16)
                .context(WriteLengthSnafu)?;
            Ok(8)
        } else {
            to.write_all(&[0, 0]).context(WriteReservedSnafu)?;
            self.basic.encode_ul(&mut to, len).context(WriteLengthSnafu)?;
            Ok(12)
        }
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

    fn header_len(&self, vr: VR) -> u32 {
        if vr.has_short_length_field() {
            8
        } else {
            12
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExplicitVREncoder;
    use crate::encode::Encode;
    use byteordered::Endianness;
    use dcmcodec_core::header::{DataElementHeader, Length, Tag, VR};

    #[test]
    fn encode_explicit_vr_le() {
        let enc = ExplicitVREncoder::new(Endianness::Little);
        let mut out = Vec::new();
        let bytes = enc
            .encode_element_header(
                &mut out,
                DataElementHeader::new(Tag(0x0002, 0x0002), VR::UI, Length(26)),
            )
            .unwrap();
        assert_eq!(bytes, 8);
        assert_eq!(out, vec![0x02, 0x00, 0x02, 0x00, b'U', b'I', 0x1A, 0x00]);

        let mut out = Vec::new();
        let bytes = enc
            .encode_element_header(
                &mut out,
                DataElementHeader::new(Tag(0x0008, 0x1140), VR::SQ, Length::UNDEFINED),
            )
            .unwrap();
        assert_eq!(bytes, 12);
        #[rustfmt::skip]
        assert_eq!(out, vec![
            0x08, 0x00, 0x40, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        ]);
    }

    #[test]
    fn encode_explicit_vr_be() {
        let enc = ExplicitVREncoder::new(Endianness::Big);
        let mut out = Vec::new();
        enc.encode_element_header(
            &mut out,
            DataElementHeader::new(Tag::PIXEL_DATA, VR::OW, Length(4)),
        )
        .unwrap();
        #[rustfmt::skip]
        assert_eq!(out, vec![
            0x7F, 0xE0, 0x00, 0x10, b'O', b'W', 0x00, 0x00, 0x00, 0x00, 0x00, 0x04,
        ]);

        let mut out = Vec::new();
        enc.encode_item_header(&mut out, 10).unwrap();
        enc.encode_item_delimiter(&mut out).unwrap();
        enc.encode_sequence_delimiter(&mut out).unwrap();
        #[rustfmt::skip]
        assert_eq!(out, vec![
            0xFF, 0xFE, 0xE0, 0x00, 0x00, 0x00, 0x00, 0x0A,
            0xFF, 0xFE, 0xE0, 0x0D, 0x00, 0x00, 0x00, 0x00,
            0xFF, 0xFE, 0xE0, 0xDD, 0x00, 0x00, 0x00, 0x00,
        ]);
    }

    #[test]
    fn short_length_overflow() {
        let enc = ExplicitVREncoder::new(Endianness::Little);
        let res = enc.encode_element_header(
            Vec::new(),
            DataElementHeader::new(Tag(0x0010, 0x0010), VR::PN, Length(0x1_0000)),
        );
        assert!(res.is_err());
        assert_eq!(enc.header_len(VR::PN), 8);
        assert_eq!(enc.header_len(VR::UN), 12);
    }
}
