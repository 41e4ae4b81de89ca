//! Module holding a stateful DICOM data encoding abstraction.
//!
//! The [`StatefulEncoder`] supports encoding of binary data and text
//! while applying the necessary padding to conform to DICOM encoding rules.

use dcmcodec_core::{value::PrimitiveValue, DataElementHeader, Length, Tag, VR};
use dcmcodec_encoding::encode::{self, Encode};
use dcmcodec_encoding::text::{EncodeTextError, SpecificCharacterSet, TextCodec};
use dcmcodec_encoding::{BasicEncoder, DynEncoder};
use snafu::{Backtrace, ResultExt, Snafu};
use std::convert::TryFrom;
use std::io::Write;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Failed to encode a data piece at position {}", position))]
    EncodeData {
        position: u64,
        #[snafu(backtrace)]
        source: encode::Error,
    },

    #[snafu(display("Could not encode text at position {}", position))]
    EncodeText {
        position: u64,
        #[snafu(backtrace)]
        source: EncodeTextError,
    },

    #[snafu(display("Could not write value data at position {}", position))]
    WriteValueData {
        position: u64,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Value of element {} is too long ({} bytes)", tag, len))]
    ValueTooLong {
        tag: Tag,
        len: usize,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error raised when encoding a primitive value into bytes.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum EncodeValueError {
    #[snafu(display("Could not encode text"))]
    Text {
        #[snafu(backtrace)]
        source: EncodeTextError,
    },
    #[snafu(display("Could not write binary value"))]
    Binary {
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

/// Encode a primitive value into `out` exactly as it should appear
/// in the value field of an element with the given value representation,
/// including the trailing padding byte needed for an even length.
///
/// Text is encoded in `charset` for the value representations
/// affected by the specific character set, and in the default
/// character repertoire for the others.
pub fn encode_value(
    vr: VR,
    value: &PrimitiveValue,
    charset: SpecificCharacterSet,
    basic: BasicEncoder,
    out: &mut Vec<u8>,
) -> Result<(), EncodeValueError> {
    let start = out.len();
    match value {
        PrimitiveValue::Str(_) | PrimitiveValue::Strs(_) => {
            let charset = match vr {
                VR::SH | VR::LO | VR::ST | VR::LT | VR::UC | VR::UT | VR::PN => charset,
                _ => SpecificCharacterSet::Default,
            };
            let text = value.to_str();
            let bytes = charset.encode(&text).context(TextSnafu)?;
            out.extend_from_slice(&bytes);
        }
        _ => {
            basic.encode_primitive(&mut *out, value).context(BinarySnafu)?;
        }
    }
    if (out.len() - start) % 2 != 0 {
        out.push(vr.padding_byte());
    }
    Ok(())
}

/// Also called a printer, this encoder type provides a stateful mid-level
/// abstraction for writing DICOM content. Unlike `Encode`,
/// the stateful encoder knows how to write text values and keeps track
/// of how many bytes were written.
#[derive(Debug)]
pub struct StatefulEncoder<W> {
    to: W,
    encoder: DynEncoder,
    charset: SpecificCharacterSet,
    bytes_written: u64,
    buffer: Vec<u8>,
}

impl<W> StatefulEncoder<W> {
    pub fn new(to: W, encoder: DynEncoder, charset: SpecificCharacterSet) -> Self {
        StatefulEncoder {
            to,
            encoder,
            charset,
            bytes_written: 0,
            buffer: Vec::with_capacity(128),
        }
    }

    /// The number of bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// The header encoder in use.
    pub fn encoder(&self) -> DynEncoder {
        self.encoder
    }

    /// The character set used for text values.
    pub fn charset(&self) -> SpecificCharacterSet {
        self.charset
    }

    pub fn set_charset(&mut self, charset: SpecificCharacterSet) {
        self.charset = charset;
    }

    /// Borrow the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.to
    }

    /// Retrieve the underlying writer.
    pub fn into_inner(self) -> W {
        self.to
    }
}

impl<W> StatefulEncoder<W>
where
    W: Write,
{
    /// Encode and write a data element header.
    pub fn encode_element_header(&mut self, header: DataElementHeader) -> Result<()> {
        let bytes = self
            .encoder
            .encode_element_header(&mut self.to, header)
            .context(EncodeDataSnafu {
                position: self.bytes_written,
            })?;
        self.bytes_written += bytes as u64;
        Ok(())
    }

    /// Encode and write an item header.
    pub fn encode_item_header(&mut self, len: u32) -> Result<()> {
        self.encoder
            .encode_item_header(&mut self.to, len)
            .context(EncodeDataSnafu {
                position: self.bytes_written,
            })?;
        self.bytes_written += 8;
        Ok(())
    }

    /// Encode and write an item delimiter.
    pub fn encode_item_delimiter(&mut self) -> Result<()> {
        self.encoder
            .encode_item_delimiter(&mut self.to)
            .context(EncodeDataSnafu {
                position: self.bytes_written,
            })?;
        self.bytes_written += 8;
        Ok(())
    }

    /// Encode and write a sequence delimiter.
    pub fn encode_sequence_delimiter(&mut self) -> Result<()> {
        self.encoder
            .encode_sequence_delimiter(&mut self.to)
            .context(EncodeDataSnafu {
                position: self.bytes_written,
            })?;
        self.bytes_written += 8;
        Ok(())
    }

    /// Encode and write a full primitive data element.
    ///
    /// The length in the given header is ignored:
    /// the written header has the length of the encoded and padded value.
    /// Writing the Specific Character Set element switches
    /// the character set for the text values that follow.
    pub fn encode_primitive_element(
        &mut self,
        header: &DataElementHeader,
        value: &PrimitiveValue,
    ) -> Result<()> {
        self.buffer.clear();
        match encode_value(
            header.vr,
            value,
            self.charset,
            self.encoder.basic(),
            &mut self.buffer,
        ) {
            Ok(()) => {}
            Err(EncodeValueError::Text { source }) => {
                return Err(source).context(EncodeTextSnafu {
                    position: self.bytes_written,
                })
            }
            Err(EncodeValueError::Binary { source, .. }) => {
                return Err(source).context(WriteValueDataSnafu {
                    position: self.bytes_written,
                })
            }
        }
        let len = u32::try_from(self.buffer.len())
            .ok()
            .filter(|len| *len != Length::UNDEFINED.0)
            .ok_or_else(|| {
                ValueTooLongSnafu {
                    tag: header.tag,
                    len: self.buffer.len(),
                }
                .build()
            })?;

        self.encode_element_header(DataElementHeader::new(header.tag, header.vr, Length(len)))?;
        self.to
            .write_all(&self.buffer)
            .context(WriteValueDataSnafu {
                position: self.bytes_written,
            })?;
        self.bytes_written += len as u64;

        if header.tag == Tag::SPECIFIC_CHARACTER_SET {
            let code = value.to_str();
            match SpecificCharacterSet::from_code(&code) {
                Some(charset) => self.charset = charset,
                None => tracing::warn!("Unsupported character set `{}`, ignoring", code),
            }
        }
        Ok(())
    }

    /// Write raw value bytes as they are.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.to.write_all(bytes).context(WriteValueDataSnafu {
            position: self.bytes_written,
        })?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Let `f` write `len` raw value bytes straight into the writer,
    /// for values streamed from elsewhere.
    pub fn write_raw_with<F>(&mut self, len: u64, f: F) -> Result<()>
    where
        F: FnOnce(&mut W) -> std::io::Result<()>,
    {
        f(&mut self.to).context(WriteValueDataSnafu {
            position: self.bytes_written,
        })?;
        self.bytes_written += len;
        Ok(())
    }

    /// Write the basic offset table of encapsulated pixel data,
    /// item header included.
    pub fn encode_offset_table(&mut self, table: &[u32]) -> Result<()> {
        self.encode_item_header(table.len() as u32 * 4)?;
        let basic = self.encoder.basic();
        for offset in table {
            basic
                .encode_ul(&mut self.to, *offset)
                .context(WriteValueDataSnafu {
                    position: self.bytes_written,
                })?;
            self.bytes_written += 4;
        }
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.to.flush().context(WriteValueDataSnafu {
            position: self.bytes_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{encode_value, StatefulEncoder};
    use dcmcodec_core::{dicom_value, value::PrimitiveValue, DataElementHeader, Length, Tag, VR};
    use dcmcodec_encoding::text::SpecificCharacterSet;
    use dcmcodec_encoding::{BasicEncoder, DynEncoder};

    #[test]
    fn encode_text_with_padding() {
        let mut out = Vec::new();
        let mut encoder = StatefulEncoder::new(
            &mut out,
            DynEncoder::explicit_vr_le(),
            SpecificCharacterSet::Default,
        );
        encoder
            .encode_primitive_element(
                &DataElementHeader::new(Tag(0x0010, 0x0010), VR::PN, Length::UNDEFINED),
                &dicom_value!(Strs, ["Doe^John"]),
            )
            .unwrap();
        encoder
            .encode_primitive_element(
                &DataElementHeader::new(Tag(0x0008, 0x0018), VR::UI, Length(0)),
                &dicom_value!(Strs, ["1.2.3"]),
            )
            .unwrap();
        assert_eq!(encoder.bytes_written(), 8 + 8 + 8 + 6);

        #[rustfmt::skip]
        let expected: &[u8] = &[
            // (0010,0010) PN 8 "Doe^John"
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x08, 0x00,
            b'D', b'o', b'e', b'^', b'J', b'o', b'h', b'n',
            // (0008,0018) UI 6 "1.2.3\0"
            0x08, 0x00, 0x18, 0x00, b'U', b'I', 0x06, 0x00,
            b'1', b'.', b'2', b'.', b'3', 0x00,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn encode_text_in_character_set() {
        let mut out = Vec::new();
        let mut encoder = StatefulEncoder::new(
            &mut out,
            DynEncoder::implicit_vr_le(),
            SpecificCharacterSet::Default,
        );
        encoder
            .encode_primitive_element(
                &DataElementHeader::new(Tag::SPECIFIC_CHARACTER_SET, VR::CS, Length(0)),
                &dicom_value!(Strs, ["ISO_IR 192"]),
            )
            .unwrap();
        assert_eq!(encoder.charset(), SpecificCharacterSet::IsoIr192);
        encoder
            .encode_primitive_element(
                &DataElementHeader::new(Tag(0x0010, 0x0010), VR::PN, Length(0)),
                &dicom_value!(Strs, ["Simões"]),
            )
            .unwrap();

        #[rustfmt::skip]
        let expected: &[u8] = &[
            0x08, 0x00, 0x05, 0x00, 0x0A, 0x00, 0x00, 0x00,
            b'I', b'S', b'O', b'_', b'I', b'R', b' ', b'1', b'9', b'2',
            0x10, 0x00, 0x10, 0x00, 0x08, 0x00, 0x00, 0x00,
            b'S', b'i', b'm', 0xC3, 0xB5, b'e', b's', b' ',
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn encode_binary_values() {
        let mut out = Vec::new();
        encode_value(
            VR::OB,
            &dicom_value!(U8, [1, 2, 3]),
            SpecificCharacterSet::Default,
            BasicEncoder::default(),
            &mut out,
        )
        .unwrap();
        assert_eq!(out, vec![1, 2, 3, 0]);

        let mut out = Vec::new();
        encode_value(
            VR::US,
            &dicom_value!(U16, [0x0102]),
            SpecificCharacterSet::Default,
            BasicEncoder::new(dcmcodec_encoding::Endianness::Big),
            &mut out,
        )
        .unwrap();
        assert_eq!(out, vec![0x01, 0x02]);

        let mut out = Vec::new();
        encode_value(
            VR::SH,
            &PrimitiveValue::Empty,
            SpecificCharacterSet::Default,
            BasicEncoder::default(),
            &mut out,
        )
        .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn encode_offset_table_and_fragments() {
        let mut out = Vec::new();
        let mut encoder = StatefulEncoder::new(
            &mut out,
            DynEncoder::explicit_vr_le(),
            SpecificCharacterSet::Default,
        );
        encoder.encode_offset_table(&[0, 10]).unwrap();
        encoder.encode_item_header(2).unwrap();
        encoder.write_bytes(&[0xAA, 0xBB]).unwrap();
        encoder.encode_sequence_delimiter().unwrap();
        assert_eq!(encoder.bytes_written(), 16 + 10 + 8);

        #[rustfmt::skip]
        let expected: &[u8] = &[
            0xFE, 0xFF, 0x00, 0xE0, 0x08, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0x00, 0xE0, 0x02, 0x00, 0x00, 0x00, 0xAA, 0xBB,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(out, expected);
    }
}
