//! This module provides a higher level abstraction for reading DICOM data.
//! The stateful decoder reads element headers and values
//! from a [`CachedSource`], keeping track of the current position,
//! the character set in effect, and the header decoder in use.

use crate::cache::CachedSource;
use dcmcodec_core::dictionary::DataDictionary;
use dcmcodec_core::header::{DataElementHeader, SequenceItemHeader, Tag, VrCategory, VR};
use dcmcodec_core::value::{PrimitiveValue, C};
use dcmcodec_encoding::byte_order;
use dcmcodec_encoding::decode::{self, Decode, DynDecoder};
use dcmcodec_encoding::text::{DecodeTextError, SpecificCharacterSet, TextCodec};
use dcmcodec_encoding::transfer_syntax::TransferSyntax;
use dcmcodec_encoding::Endianness;
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::io::{self, BufRead, Read, Write};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not decode element header at position {}", position))]
    DecodeElementHeader {
        position: u64,
        #[snafu(backtrace)]
        source: decode::Error,
    },

    #[snafu(display("Could not decode item header at position {}", position))]
    DecodeItemHeader {
        position: u64,
        #[snafu(backtrace)]
        source: decode::Error,
    },

    #[snafu(display("Could not read value from source at position {}", position))]
    ReadValueData {
        position: u64,
        source: io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Could not skip value data at position {}", position))]
    SkipValueData {
        position: u64,
        source: io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Could not copy value data at position {}", position))]
    CopyValueData {
        position: u64,
        source: io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Could not decode text at position {}", position))]
    DecodeText {
        position: u64,
        #[snafu(backtrace)]
        source: DecodeTextError,
    },

    #[snafu(display(
        "Undefined value length of element tagged {} at position {}",
        tag,
        position
    ))]
    UndefinedValueLength {
        tag: Tag,
        position: u64,
        backtrace: Backtrace,
    },
}

impl Error {
    /// Whether the source ended right where an element header should begin.
    pub fn is_eof_at_header_start(&self) -> bool {
        matches!(self, Error::DecodeElementHeader { source, .. } if source.is_eof_at_header_start())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A stateful abstraction for the full DICOM content reading process.
///
/// `R` is the underlying stream and `D` the dictionary
/// used for resolving value representations in implicit VR.
#[derive(Debug)]
pub struct StatefulDecoder<R, D> {
    source: CachedSource<R>,
    decoder: DynDecoder<D>,
    /// decoder for sequences of unknown VR,
    /// which are always in implicit VR little endian
    un_decoder: DynDecoder<D>,
    implicit_vr_le: bool,
    charset: SpecificCharacterSet,
    buffer: Vec<u8>,
}

impl<R, D> StatefulDecoder<R, D>
where
    R: BufRead,
    D: DataDictionary + Clone,
{
    /// Create a stateful decoder reading from the given source
    /// in the given transfer syntax.
    pub fn new(
        source: CachedSource<R>,
        ts: &TransferSyntax,
        dict: D,
        charset: SpecificCharacterSet,
    ) -> Self {
        StatefulDecoder {
            source,
            decoder: DynDecoder::for_transfer_syntax(ts, dict.clone()),
            un_decoder: DynDecoder::implicit_vr_le(dict),
            implicit_vr_le: false,
            charset,
            buffer: Vec::with_capacity(128),
        }
    }
}

impl<R, D> StatefulDecoder<R, D>
where
    R: BufRead,
    D: DataDictionary,
{
    /// The absolute position of the next byte to read.
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    /// The character set currently used for decoding text.
    pub fn charset(&self) -> SpecificCharacterSet {
        self.charset
    }

    /// Replace the character set used for decoding text.
    pub fn set_charset(&mut self, charset: SpecificCharacterSet) {
        self.charset = charset;
    }

    /// Switch header and value decoding to implicit VR little endian
    /// (when `on` is true) or back to the data set's transfer syntax.
    pub fn set_implicit_vr_le(&mut self, on: bool) {
        self.implicit_vr_le = on;
    }

    /// Whether decoding is currently forced to implicit VR little endian.
    pub fn is_implicit_vr_le(&self) -> bool {
        self.implicit_vr_le
    }

    fn active(&self) -> &DynDecoder<D> {
        if self.implicit_vr_le {
            &self.un_decoder
        } else {
            &self.decoder
        }
    }

    /// The byte order of the data currently being read.
    pub fn endianness(&self) -> Endianness {
        self.active().endianness()
    }

    /// Whether the data currently being read has explicit value representations.
    pub fn is_explicit_vr(&self) -> bool {
        self.active().is_explicit_vr()
    }

    /// Access the underlying source.
    pub fn source(&self) -> &CachedSource<R> {
        &self.source
    }

    /// Retrieve the underlying source.
    pub fn into_source(self) -> CachedSource<R> {
        self.source
    }

    /// Decode the next data element header.
    pub fn decode_header(&mut self) -> Result<DataElementHeader> {
        let position = self.source.position();
        let decoder = if self.implicit_vr_le {
            &self.un_decoder
        } else {
            &self.decoder
        };
        decoder
            .decode_header(&mut self.source)
            .map(|(header, _)| header)
            .context(DecodeElementHeaderSnafu { position })
    }

    /// Decode the next item header or delimiter.
    pub fn decode_item_header(&mut self) -> Result<SequenceItemHeader> {
        let position = self.source.position();
        let decoder = if self.implicit_vr_le {
            &self.un_decoder
        } else {
            &self.decoder
        };
        decoder
            .decode_item_header(&mut self.source)
            .context(DecodeItemHeaderSnafu { position })
    }

    /// Check whether the next 4 bytes are an item tag in little endian,
    /// without consuming them.
    pub fn peek_item_tag(&mut self) -> Result<bool> {
        let position = self.source.position();
        let tag = self
            .source
            .peek_tag_at(0, Endianness::Little)
            .context(ReadValueDataSnafu { position })?;
        Ok(tag == Some(Tag(0xFFFE, 0xE000)))
    }

    /// Read `len` value bytes into a new vector.
    pub fn read_bytes(&mut self, len: u32) -> Result<Vec<u8>> {
        let position = self.source.position();
        let mut out = vec![0u8; len as usize];
        self.source
            .read_exact(&mut out)
            .context(ReadValueDataSnafu { position })?;
        Ok(out)
    }

    /// Read `len` bytes as a sequence of 32-bit unsigned integers,
    /// as found in the basic offset table of encapsulated pixel data.
    pub fn read_u32_vec(&mut self, len: u32) -> Result<Vec<u32>> {
        let endianness = self.endianness();
        self.fill_buffer(len)?;
        Ok(self
            .buffer
            .chunks_exact(4)
            .map(|c| byte_order::u32_from([c[0], c[1], c[2], c[3]], endianness))
            .collect())
    }

    /// Skip `len` bytes of value data.
    pub fn skip_bytes(&mut self, len: u64) -> Result<()> {
        let position = self.source.position();
        self.source
            .skip(len)
            .context(SkipValueDataSnafu { position })
    }

    /// Stream `len` bytes of value data to the given sink.
    pub fn copy_bytes_to<W>(&mut self, len: u64, sink: &mut W) -> Result<()>
    where
        W: ?Sized + Write,
    {
        let position = self.source.position();
        self.source
            .copy_to(len, sink)
            .context(CopyValueDataSnafu { position })
    }

    /// Retain all bytes from the current position
    /// until [`unpin`](Self::unpin) is called.
    pub fn pin(&mut self) -> u64 {
        self.source.pin()
    }

    /// Release the innermost pin.
    pub fn unpin(&mut self) {
        self.source.unpin()
    }

    /// Borrow the bytes read since a pinned position.
    pub fn bytes_since(&self, offset: u64) -> &[u8] {
        self.source.bytes_since(offset)
    }

    fn fill_buffer(&mut self, len: u32) -> Result<()> {
        let position = self.source.position();
        self.buffer.resize(len as usize, 0);
        self.source
            .read_exact(&mut self.buffer)
            .context(ReadValueDataSnafu { position })
    }

    /// Read the value of a primitive data element,
    /// interpreted according to its value representation.
    ///
    /// Text is decoded with the character set in effect,
    /// trailing padding is trimmed,
    /// and multi-valued text is split on backslashes.
    /// Binary values are read as words in the source byte order.
    /// Reading the Specific Character Set element
    /// switches the character set for the text that follows.
    pub fn read_value(&mut self, header: &DataElementHeader) -> Result<PrimitiveValue> {
        let position = self.source.position();
        let len = header.len.get().context(UndefinedValueLengthSnafu {
            tag: header.tag,
            position,
        })?;
        if len == 0 {
            return Ok(PrimitiveValue::Empty);
        }
        if len & 1 != 0 && header.vr != VR::UN {
            tracing::warn!(
                "Odd value length {} of element {} at position {}",
                len,
                header.tag,
                position
            );
        }

        let endianness = self.endianness();
        self.fill_buffer(len)?;

        let unit = match header.vr.category() {
            VrCategory::AttributeTag => 4,
            _ => u32::from(header.vr.word_size()),
        };
        let value = if len % unit != 0 {
            // not a whole number of words, keep every byte
            PrimitiveValue::U8(C::from_slice(&self.buffer))
        } else {
            match header.vr.category() {
                VrCategory::StringMultiValued | VrCategory::PersonName => {
                    let text = self.decode_text(header.vr, position)?;
                    let trimmed = trim_padding(&text);
                    if trimmed.is_empty() {
                        PrimitiveValue::Empty
                    } else {
                        PrimitiveValue::Strs(
                            trimmed
                                .split('\\')
                                .map(|s| trim_padding(s).to_owned())
                                .collect(),
                        )
                    }
                }
                VrCategory::StringSingleValued => {
                    let text = self.decode_text(header.vr, position)?;
                    let trimmed = trim_padding(&text);
                    if trimmed.is_empty() {
                        PrimitiveValue::Empty
                    } else {
                        PrimitiveValue::Str(trimmed.to_owned())
                    }
                }
                VrCategory::AttributeTag => PrimitiveValue::Tags(
                    self.buffer
                        .chunks_exact(4)
                        .map(|c| byte_order::tag_from([c[0], c[1], c[2], c[3]], endianness))
                        .collect(),
                ),
                VrCategory::SignedInt16 => PrimitiveValue::I16(words(&self.buffer, |c| {
                    byte_order::i16_from(c, endianness)
                })),
                VrCategory::UnsignedInt16 | VrCategory::Binary { word_size: 2 } => {
                    PrimitiveValue::U16(words(&self.buffer, |c| byte_order::u16_from(c, endianness)))
                }
                VrCategory::SignedInt32 => PrimitiveValue::I32(words(&self.buffer, |c| {
                    byte_order::i32_from(c, endianness)
                })),
                VrCategory::UnsignedInt32 => {
                    PrimitiveValue::U32(words(&self.buffer, |c| byte_order::u32_from(c, endianness)))
                }
                VrCategory::SignedInt64 => PrimitiveValue::I64(words(&self.buffer, |c| {
                    byte_order::i64_from(c, endianness)
                })),
                VrCategory::UnsignedInt64 => {
                    PrimitiveValue::U64(words(&self.buffer, |c| byte_order::u64_from(c, endianness)))
                }
                VrCategory::Float32 => {
                    PrimitiveValue::F32(words(&self.buffer, |c| byte_order::f32_from(c, endianness)))
                }
                VrCategory::Float64 => {
                    PrimitiveValue::F64(words(&self.buffer, |c| byte_order::f64_from(c, endianness)))
                }
                VrCategory::Binary { word_size: 4 } if header.vr == VR::OF => {
                    PrimitiveValue::F32(words(&self.buffer, |c| byte_order::f32_from(c, endianness)))
                }
                VrCategory::Binary { word_size: 4 } => {
                    PrimitiveValue::U32(words(&self.buffer, |c| byte_order::u32_from(c, endianness)))
                }
                VrCategory::Binary { word_size: 8 } if header.vr == VR::OD => {
                    PrimitiveValue::F64(words(&self.buffer, |c| byte_order::f64_from(c, endianness)))
                }
                VrCategory::Binary { word_size: 8 } => {
                    PrimitiveValue::U64(words(&self.buffer, |c| byte_order::u64_from(c, endianness)))
                }
                VrCategory::Binary { .. } | VrCategory::Sequence | VrCategory::Unknown => {
                    PrimitiveValue::U8(C::from_slice(&self.buffer))
                }
            }
        };

        if header.tag == Tag::SPECIFIC_CHARACTER_SET {
            let code = value.to_str();
            match SpecificCharacterSet::from_code(&code) {
                Some(charset) => self.charset = charset,
                None => tracing::warn!("Unsupported character set `{}`, ignoring", code),
            }
        }

        Ok(value)
    }

    fn decode_text(&self, vr: VR, position: u64) -> Result<String> {
        // only these value representations are affected by
        // the specific character set
        let charset = match vr {
            VR::SH | VR::LO | VR::ST | VR::LT | VR::UC | VR::UT | VR::PN => self.charset,
            _ => SpecificCharacterSet::Default,
        };
        charset
            .decode(&self.buffer)
            .context(DecodeTextSnafu { position })
    }
}

/// Convert a byte buffer into words of `N` bytes each.
/// The buffer must hold a whole number of words.
fn words<T, const N: usize>(buf: &[u8], f: impl Fn([u8; N]) -> T) -> C<T> {
    buf.chunks_exact(N)
        .map(|c| {
            let mut word = [0u8; N];
            word.copy_from_slice(c);
            f(word)
        })
        .collect()
}

/// Remove trailing padding (spaces and null characters) from text.
fn trim_padding(text: &str) -> &str {
    text.trim_end_matches(|c: char| c == ' ' || c == '\0')
}

#[cfg(test)]
mod tests {
    use super::StatefulDecoder;
    use crate::cache::CachedSource;
    use dcmcodec_core::dicom_value;
    use dcmcodec_core::header::{DataElementHeader, HasLength, Header, Length, Tag, VR};
    use dcmcodec_core::value::PrimitiveValue;
    use dcmcodec_dictionary::StandardDataDictionary;
    use dcmcodec_encoding::text::SpecificCharacterSet;
    use dcmcodec_encoding::transfer_syntax::entries::{
        EXPLICIT_VR_BIG_ENDIAN, EXPLICIT_VR_LITTLE_ENDIAN,
    };

    fn decoder_for(
        data: &[u8],
        big_endian: bool,
    ) -> StatefulDecoder<&[u8], StandardDataDictionary> {
        let ts = if big_endian {
            &EXPLICIT_VR_BIG_ENDIAN
        } else {
            &EXPLICIT_VR_LITTLE_ENDIAN
        };
        StatefulDecoder::new(
            CachedSource::new(data),
            ts,
            StandardDataDictionary,
            SpecificCharacterSet::Default,
        )
    }

    #[test]
    fn read_text_values() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            // (0008,0008) CS 16 "ORIGINAL\PRIMARY"
            0x08, 0x00, 0x08, 0x00, b'C', b'S', 0x10, 0x00,
            b'O', b'R', b'I', b'G', b'I', b'N', b'A', b'L', b'\\',
            b'P', b'R', b'I', b'M', b'A', b'R', b'Y',
            // (0008,0018) UI 4 "1.2\0"
            0x08, 0x00, 0x18, 0x00, b'U', b'I', 0x04, 0x00, b'1', b'.', b'2', 0x00,
            // (0020,4000) LT 6 "A\B C "
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x06, 0x00, b'A', b'\\', b'B', b' ', b'C', b' ',
        ];
        let mut decoder = decoder_for(data, false);

        let header = decoder.decode_header().unwrap();
        assert_eq!(header.tag(), Tag(0x0008, 0x0008));
        assert_eq!(header.length(), Length(16));
        assert_eq!(
            decoder.read_value(&header).unwrap(),
            dicom_value!(Strs, ["ORIGINAL", "PRIMARY"])
        );
        assert_eq!(decoder.position(), 24);

        let header = decoder.decode_header().unwrap();
        assert_eq!(
            decoder.read_value(&header).unwrap(),
            dicom_value!(Strs, ["1.2"])
        );

        let header = decoder.decode_header().unwrap();
        assert_eq!(header.vr(), VR::LT);
        // single valued text keeps backslashes
        assert_eq!(
            decoder.read_value(&header).unwrap(),
            PrimitiveValue::Str("A\\B C".to_owned())
        );
    }

    #[test]
    fn read_binary_values_in_both_byte_orders() {
        #[rustfmt::skip]
        let data_le: &[u8] = &[
            // (0028,0010) US 2 512
            0x28, 0x00, 0x10, 0x00, b'U', b'S', 0x02, 0x00, 0x00, 0x02,
            // (7FE0,0010) OW 4 [1, 2]
            0xE0, 0x7F, 0x10, 0x00, b'O', b'W', 0x00, 0x00, 0x04, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x02, 0x00,
        ];
        #[rustfmt::skip]
        let data_be: &[u8] = &[
            0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02, 0x02, 0x00,
            0x7F, 0xE0, 0x00, 0x10, b'O', b'W', 0x00, 0x00, 0x00, 0x00, 0x00, 0x04,
            0x00, 0x01, 0x00, 0x02,
        ];

        for (data, big_endian) in [(data_le, false), (data_be, true)] {
            let mut decoder = decoder_for(data, big_endian);
            let header = decoder.decode_header().unwrap();
            assert_eq!(
                decoder.read_value(&header).unwrap(),
                dicom_value!(U16, [512])
            );
            let header = decoder.decode_header().unwrap();
            assert_eq!(header.tag(), Tag::PIXEL_DATA);
            assert_eq!(
                decoder.read_value(&header).unwrap(),
                dicom_value!(U16, [1, 2])
            );
        }
    }

    #[test]
    fn partial_words_are_kept_as_bytes() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            // (7FE0,0010) OW 3 [1, 2, 3]
            0xE0, 0x7F, 0x10, 0x00, b'O', b'W', 0x00, 0x00, 0x03, 0x00, 0x00, 0x00,
            0x01, 0x02, 0x03,
            // (0018,6012) US 2 [4]
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x04, 0x00,
        ];
        let mut decoder = decoder_for(data, false);
        let header = decoder.decode_header().unwrap();
        assert_eq!(
            decoder.read_value(&header).unwrap(),
            dicom_value!(U8, [1, 2, 3])
        );
        assert_eq!(decoder.position(), 15);

        let header = decoder.decode_header().unwrap();
        assert_eq!(
            decoder.read_value(&header).unwrap(),
            dicom_value!(U16, [4])
        );
    }

    #[test]
    fn charset_switches_when_read() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            // (0008,0005) CS 10 "ISO_IR 192"
            0x08, 0x00, 0x05, 0x00, b'C', b'S', 0x0A, 0x00,
            b'I', b'S', b'O', b'_', b'I', b'R', b' ', b'1', b'9', b'2',
            // (0010,0010) PN 6 "Simões" in UTF-8 is 7 bytes, plus padding
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x08, 0x00,
            b'S', b'i', b'm', 0xC3, 0xB5, b'e', b's', b' ',
        ];
        let mut decoder = decoder_for(data, false);
        let header = decoder.decode_header().unwrap();
        decoder.read_value(&header).unwrap();
        assert_eq!(decoder.charset(), SpecificCharacterSet::IsoIr192);

        let header = decoder.decode_header().unwrap();
        assert_eq!(
            decoder.read_value(&header).unwrap(),
            dicom_value!(Strs, ["Simões"])
        );
    }

    #[test]
    fn undefined_value_length_is_an_error() {
        let mut decoder = decoder_for(&[], false);
        let header = DataElementHeader::new(Tag(0x0010, 0x0010), VR::PN, Length::UNDEFINED);
        assert!(decoder.read_value(&header).is_err());
    }

    #[test]
    fn header_eof() {
        let mut decoder = decoder_for(&[], false);
        let err = decoder.decode_header().unwrap_err();
        assert!(err.is_eof_at_header_start());
    }
}
