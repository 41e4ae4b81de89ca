//! A writer of DICOM data set tokens into bytes.
//!
//! The [`DataSetWriter`] is the counterpart of the data set reader:
//! it takes a stream of [`DataToken`]s and prints them in the encoding
//! of a transfer syntax.
//! Delimiters are only written for sequences and items
//! of undefined length,
//! so the lengths in the start tokens must already be correct.
use super::{DataToken, SeqTokenType};
use crate::stateful::encode::{Error as EncoderError, StatefulEncoder};
use dcmcodec_core::header::{DataElementHeader, Length, Tag, VR};
use dcmcodec_core::value::PrimitiveValue;
use dcmcodec_encoding::text::SpecificCharacterSet;
use dcmcodec_encoding::{DynEncoder, TransferSyntax};
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::convert::TryFrom;
use std::io::Write;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Unexpected token
    #[snafu(display("Unexpected token {}", token))]
    UnexpectedToken {
        token: DataToken,
        backtrace: Backtrace,
    },
    #[snafu(display("Primitive value without a preceding element header"))]
    MissingElementHeader { backtrace: Backtrace },
    #[snafu(display("Item of {} bytes is too long", len))]
    ItemTooLong { len: usize, backtrace: Backtrace },
    #[snafu(display("Could not write element header"))]
    WriteHeader {
        #[snafu(backtrace)]
        source: EncoderError,
    },
    #[snafu(display("Could not write item header"))]
    WriteItemHeader {
        #[snafu(backtrace)]
        source: EncoderError,
    },
    #[snafu(display("Could not write sequence delimiter"))]
    WriteSequenceDelimiter {
        #[snafu(backtrace)]
        source: EncoderError,
    },
    #[snafu(display("Could not write item delimiter"))]
    WriteItemDelimiter {
        #[snafu(backtrace)]
        source: EncoderError,
    },
    #[snafu(display("Could not write element value"))]
    WriteValue {
        #[snafu(backtrace)]
        source: EncoderError,
    },
    #[snafu(display("Could not flush buffer"))]
    FlushBuffer {
        #[snafu(backtrace)]
        source: EncoderError,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A token representing a sequence or item start.
#[derive(Debug, Clone, Copy)]
struct SeqToken {
    /// Whether it is the start of a sequence or the start of an item.
    typ: SeqTokenType,
    /// The length of the value, as indicated by the starting element,
    /// can be unknown.
    len: Length,
    /// Whether this token belongs to encapsulated pixel data.
    pixel_data: bool,
    /// The character set before the token started.
    charset: SpecificCharacterSet,
}

/// A stateful device for printing a DICOM data set in sequential order.
/// This is analogous to the `DataSetReader` type for converting data
/// set tokens to bytes.
#[derive(Debug)]
pub struct DataSetWriter<W> {
    printer: StatefulEncoder<W>,
    seq_tokens: Vec<SeqToken>,
    last_de: Option<DataElementHeader>,
    /// a pixel data item header is awaiting its value
    pending_fragment: bool,
}

impl<W> DataSetWriter<W>
where
    W: Write,
{
    /// Create a data set writer for the given transfer syntax
    /// and specific character set.
    ///
    /// Deflate compression is not applied here:
    /// wrap the writer beforehand.
    pub fn with_ts_cs(to: W, ts: &TransferSyntax, charset: SpecificCharacterSet) -> Self {
        DataSetWriter::new(to, DynEncoder::for_transfer_syntax(ts), charset)
    }

    /// Create a data set writer for the given transfer syntax,
    /// with the default character set.
    pub fn with_ts(to: W, ts: &TransferSyntax) -> Self {
        DataSetWriter::with_ts_cs(to, ts, SpecificCharacterSet::Default)
    }
}

impl<W> DataSetWriter<W> {
    pub fn new(to: W, encoder: DynEncoder, charset: SpecificCharacterSet) -> Self {
        DataSetWriter {
            printer: StatefulEncoder::new(to, encoder, charset),
            seq_tokens: Vec::new(),
            last_de: None,
            pending_fragment: false,
        }
    }

    /// The number of bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.printer.bytes_written()
    }

    /// The header encoder in use.
    pub fn encoder(&self) -> DynEncoder {
        self.printer.encoder()
    }

    /// The character set in effect for the next text value.
    pub fn charset(&self) -> SpecificCharacterSet {
        self.printer.charset()
    }

    /// Retrieve the underlying writer.
    pub fn into_inner(self) -> W {
        self.printer.into_inner()
    }
}

impl<W> DataSetWriter<W>
where
    W: Write,
{
    /// Feed the given sequence of tokens which are part of the same data set.
    pub fn write_sequence<I>(&mut self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = DataToken>,
    {
        for token in tokens {
            self.write(token)?;
        }

        Ok(())
    }

    /// Feed the given data set token for writing the data set.
    pub fn write(&mut self, token: DataToken) -> Result<()> {
        // adjust the logic of sequence printing:
        // explicit length sequences or items should not print
        // the respective delimiter

        match token {
            DataToken::SequenceStart { tag, len, .. } => {
                self.push_token(SeqTokenType::Sequence, len, false);
                // sequences of unknown VR are written as proper sequences
                self.printer
                    .encode_element_header(DataElementHeader::new(tag, VR::SQ, len))
                    .context(WriteHeaderSnafu)
            }
            DataToken::PixelSequenceStart => {
                self.push_token(SeqTokenType::Sequence, Length::UNDEFINED, true);
                self.printer
                    .encode_element_header(DataElementHeader::new(
                        Tag::PIXEL_DATA,
                        VR::OB,
                        Length::UNDEFINED,
                    ))
                    .context(WriteHeaderSnafu)
            }
            DataToken::ItemStart { len } => {
                let pixel_data = self.in_pixel_sequence();
                self.push_token(SeqTokenType::Item, len, pixel_data);
                if pixel_data {
                    // the item header is written along with the fragment
                    self.pending_fragment = true;
                    Ok(())
                } else {
                    self.printer
                        .encode_item_header(len.0)
                        .context(WriteItemHeaderSnafu)
                }
            }
            DataToken::ItemEnd => {
                let token = self.seq_tokens.pop();
                if self.pending_fragment {
                    // empty fragment or offset table
                    self.pending_fragment = false;
                    return self
                        .printer
                        .encode_item_header(0)
                        .context(WriteItemHeaderSnafu);
                }
                match token {
                    Some(SeqToken {
                        typ: SeqTokenType::Item,
                        len,
                        pixel_data: false,
                        charset,
                    }) => {
                        // character sets do not leak out of items
                        self.printer.set_charset(charset);
                        // only write if it's an unknown length item
                        if len.is_undefined() {
                            self.printer
                                .encode_item_delimiter()
                                .context(WriteItemDelimiterSnafu)?;
                        }
                        Ok(())
                    }
                    Some(SeqToken {
                        typ: SeqTokenType::Item,
                        ..
                    }) => Ok(()),
                    _ => UnexpectedTokenSnafu {
                        token: DataToken::ItemEnd,
                    }
                    .fail(),
                }
            }
            DataToken::SequenceEnd => match self.seq_tokens.pop() {
                Some(SeqToken {
                    typ: SeqTokenType::Sequence,
                    len,
                    ..
                }) => {
                    // only write if it's an unknown length sequence
                    if len.is_undefined() {
                        self.printer
                            .encode_sequence_delimiter()
                            .context(WriteSequenceDelimiterSnafu)?;
                    }
                    Ok(())
                }
                _ => UnexpectedTokenSnafu {
                    token: DataToken::SequenceEnd,
                }
                .fail(),
            },
            DataToken::ElementHeader(header) => {
                // the header is written along with the value
                self.last_de = Some(header);
                Ok(())
            }
            DataToken::PrimitiveValue(value) => {
                let header = self.last_de.take().context(MissingElementHeaderSnafu)?;
                self.printer
                    .encode_primitive_element(&header, &value)
                    .context(WriteValueSnafu)
            }
            DataToken::OffsetTable(table) if self.pending_fragment => {
                self.pending_fragment = false;
                self.printer
                    .encode_offset_table(&table)
                    .context(WriteValueSnafu)
            }
            DataToken::ItemValue(data) if self.pending_fragment => {
                self.pending_fragment = false;
                self.printer
                    .encode_item_header(data.len() as u32)
                    .context(WriteItemHeaderSnafu)?;
                self.printer.write_bytes(&data).context(WriteValueSnafu)
            }
            DataToken::LazyItem(item) if !self.in_pixel_sequence() => {
                // the content is copied as is,
                // so it must already be in the output encoding
                if item.len.is_undefined() {
                    self.printer
                        .encode_item_header(Length::UNDEFINED.0)
                        .context(WriteItemHeaderSnafu)?;
                    self.printer.write_bytes(&item.data).context(WriteValueSnafu)?;
                    self.printer
                        .encode_item_delimiter()
                        .context(WriteItemDelimiterSnafu)
                } else {
                    let len = u32::try_from(item.data.len())
                        .ok()
                        .filter(|len| *len != Length::UNDEFINED.0)
                        .context(ItemTooLongSnafu {
                            len: item.data.len(),
                        })?;
                    self.printer
                        .encode_item_header(len)
                        .context(WriteItemHeaderSnafu)?;
                    self.printer.write_bytes(&item.data).context(WriteValueSnafu)
                }
            }
            token @ DataToken::BulkData(_)
            | token @ DataToken::OffsetTable(_)
            | token @ DataToken::ItemValue(_)
            | token @ DataToken::LazyItem(_) => UnexpectedTokenSnafu { token }.fail(),
        }
    }

    /// Write a whole primitive data element,
    /// without going through tokens.
    pub fn write_element(&mut self, header: &DataElementHeader, value: &PrimitiveValue) -> Result<()> {
        self.printer
            .encode_primitive_element(header, value)
            .context(WriteValueSnafu)
    }

    /// Write an element header as is,
    /// for a value then streamed through [`write_raw_with`](Self::write_raw_with).
    pub fn write_element_header(&mut self, header: DataElementHeader) -> Result<()> {
        self.printer
            .encode_element_header(header)
            .context(WriteHeaderSnafu)
    }

    /// Let `f` write `len` raw value bytes into the underlying writer.
    pub fn write_raw_with<F>(&mut self, len: u64, f: F) -> Result<()>
    where
        F: FnOnce(&mut W) -> std::io::Result<()>,
    {
        self.printer.write_raw_with(len, f).context(WriteValueSnafu)
    }

    /// Flush the inner writer.
    pub fn flush(&mut self) -> Result<()> {
        self.printer.flush().context(FlushBufferSnafu)
    }

    fn in_pixel_sequence(&self) -> bool {
        matches!(
            self.seq_tokens.last(),
            Some(SeqToken {
                typ: SeqTokenType::Sequence,
                pixel_data: true,
                ..
            })
        )
    }

    fn push_token(&mut self, typ: SeqTokenType, len: Length, pixel_data: bool) {
        self.seq_tokens.push(SeqToken {
            typ,
            len,
            pixel_data,
            charset: self.printer.charset(),
        });
    }
}
