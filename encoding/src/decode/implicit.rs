//! Implicit VR header decoding.
//!
//! Value representations are not in the stream,
//! so they are resolved through a data dictionary.

use crate::decode::basic::BasicDecoder;
use crate::decode::*;
use byteordered::Endianness;
use dcmcodec_core::dictionary::DataDictionary;
use dcmcodec_core::header::{DataElementHeader, Length, SequenceItemHeader, Tag, VR};
use snafu::ResultExt;
use std::io::Read;

/// An implicit VR header decoder, backed by a data dictionary.
#[derive(Debug, Clone)]
pub struct ImplicitVRDecoder<D> {
    dict: D,
    basic: BasicDecoder,
}

impl<D> ImplicitVRDecoder<D> {
    /// Create an implicit VR decoder with the given dictionary
    /// and byte order.
    pub fn with_dict(dict: D, endianness: Endianness) -> Self {
        ImplicitVRDecoder {
            dict,
            basic: BasicDecoder::new(endianness),
        }
    }

    /// The byte order expected by this decoder.
    pub fn endianness(&self) -> Endianness {
        self.basic.endianness()
    }

    /// The dictionary used for resolving value representations.
    pub fn dictionary(&self) -> &D {
        &self.dict
    }
}

impl<D> ImplicitVRDecoder<D>
where
    D: DataDictionary,
{
    /// Resolve the value representation of an element in implicit VR.
    pub fn resolve_vr(&self, tag: Tag) -> VR {
        // pixel data and overlay data are always read as words
        if tag == Tag::PIXEL_DATA || (tag.group() & 0xFF00 == 0x6000 && tag.element() == 0x3000)
        {
            return VR::OW;
        }
        self.dict.vr_of(tag).unwrap_or(VR::UN)
    }
}

impl<D> Decode for ImplicitVRDecoder<D>
where
    D: DataDictionary,
{
    fn decode_header<S>(&self, mut source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        let group = self.basic.decode_us(&mut source).context(ReadHeaderTagSnafu)?;
        let element = self.basic.decode_us(&mut source).context(ReadTagSnafu)?;
        let tag = Tag(group, element);
        let len = self.basic.decode_ul(&mut source).context(ReadLengthSnafu)?;

        let vr = if group == 0xFFFE {
            VR::UN
        } else {
            self.resolve_vr(tag)
        };
        Ok((DataElementHeader::new(tag, vr, Length(len)), 8))
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

#[cfg(test)]
mod tests {
    use super::ImplicitVRDecoder;
    use crate::decode::Decode;
    use byteordered::Endianness;
    use dcmcodec_core::dictionary::StubDataDictionary;
    use dcmcodec_core::header::{HasLength, Header, Length, Tag, VR};
    use dcmcodec_dictionary::StandardDataDictionary;
    use std::io::{Cursor, Seek, SeekFrom};

    // manually crafting some DICOM data elements
    //  Tag: (0002,0002) Media Storage SOP Class UID
    //  Length: 26
    //  Value: "1.2.840.10008.5.1.4.1.1.1\0"
    // --
    //  Tag: (0002,0010) Transfer Syntax UID
    //  Length: 20
    //  Value: "1.2.840.10008.1.2.1\0"
    // --
    #[rustfmt::skip]
    const RAW: &[u8] = &[
        0x02, 0x00, 0x02, 0x00, 0x1a, 0x00, 0x00, 0x00, 0x31, 0x2e, 0x32, 0x2e, 0x38, 0x34, 0x30, 0x2e,
        0x31, 0x30, 0x30, 0x30, 0x38, 0x2e, 0x35, 0x2e, 0x31, 0x2e, 0x34, 0x2e, 0x31, 0x2e, 0x31, 0x2e,
        0x31, 0x00,
        0x02, 0x00, 0x10, 0x00, 0x14, 0x00, 0x00, 0x00, 0x31, 0x2e, 0x32, 0x2e, 0x38, 0x34, 0x30, 0x2e,
        0x31, 0x30, 0x30, 0x30, 0x38, 0x2e, 0x31, 0x2e, 0x32, 0x2e, 0x31, 0x00,
    ];

    #[test]
    fn implicit_vr_le_with_standard_dictionary() {
        let dec = ImplicitVRDecoder::with_dict(StandardDataDictionary, Endianness::Little);
        let mut cursor = Cursor::new(RAW);
        let (elem, bytes_read) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag(0x0002, 0x0002));
        assert_eq!(elem.vr(), VR::UI);
        assert_eq!(elem.length(), Length(26));
        assert_eq!(bytes_read, 8);
        cursor.seek(SeekFrom::Current(26)).unwrap();

        let (elem, _) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag(0x0002, 0x0010));
        assert_eq!(elem.vr(), VR::UI);
        assert_eq!(elem.length(), Length(20));
    }

    #[test]
    fn implicit_vr_with_stub_dictionary() {
        let dec = ImplicitVRDecoder::with_dict(StubDataDictionary, Endianness::Little);
        let (elem, _) = dec.decode_header(&mut Cursor::new(RAW)).unwrap();
        assert_eq!(elem.vr(), VR::UN);
        assert_eq!(dec.resolve_vr(Tag::PIXEL_DATA), VR::OW);
        assert_eq!(dec.resolve_vr(Tag(0x6002, 0x3000)), VR::OW);
        assert_eq!(dec.resolve_vr(Tag(0x6002, 0x3001)), VR::UN);
    }

    #[test]
    fn implicit_items() {
        #[rustfmt::skip]
        let raw: &[u8] = &[
            // item, length 8
            0xFE, 0xFF, 0x00, 0xE0, 0x08, 0x00, 0x00, 0x00,
            // (0010,0010) length 0
            0x10, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let dec = ImplicitVRDecoder::with_dict(StandardDataDictionary, Endianness::Little);
        let mut cursor = Cursor::new(raw);
        let item = dec.decode_item_header(&mut cursor).unwrap();
        assert!(item.is_item());
        assert_eq!(item.length(), Length(8));
        let (elem, _) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag(0x0010, 0x0010));
        assert_eq!(elem.vr(), VR::PN);
        assert_eq!(elem.length(), Length(0));
    }
}
