//! Scanning of data set content without materialising values.
//!
//! These routines walk over element headers and item delimiters
//! only, skipping value bytes.
//! They find the extent of undefined-length items,
//! for reading items lazily,
//! and of encapsulated pixel data, for bulk data.

use super::read::{
    CopyBulkDataSnafu, ReadHeaderSnafu, ReadItemHeaderSnafu, ReadItemValueSnafu, ReadValueSnafu, Result,
    UndefinedItemLengthSnafu, UnexpectedItemTagSnafu,
};
use crate::stateful::decode::StatefulDecoder;
use dcmcodec_core::header::{DataElementHeader, SequenceItemHeader, Tag, VR};
use dcmcodec_core::DataDictionary;
use snafu::ResultExt;
use std::io::{BufRead, Write};

/// Skip the remaining content of an item of undefined length,
/// up to and including its item delimiter.
pub fn skip_item_content<R, D>(parser: &mut StatefulDecoder<R, D>) -> Result<()>
where
    R: BufRead,
    D: DataDictionary,
{
    loop {
        let position = parser.position();
        let header = parser.decode_header().context(ReadHeaderSnafu)?;
        match header.tag {
            Tag::ITEM_DELIMITER => return Ok(()),
            Tag::ITEM | Tag::SEQUENCE_DELIMITER => {
                return UnexpectedItemTagSnafu {
                    tag: header.tag,
                    position,
                }
                .fail()
            }
            _ => skip_value(parser, &header)?,
        }
    }
}

/// Skip the value of an element whose header was just read,
/// nested items included.
pub fn skip_value<R, D>(parser: &mut StatefulDecoder<R, D>, header: &DataElementHeader) -> Result<()>
where
    R: BufRead,
    D: DataDictionary,
{
    match header.len.get() {
        Some(len) => parser.skip_bytes(len.into()).context(ReadValueSnafu {
            len,
            tag: header.tag,
        }),
        None => skip_undefined_sequence(parser, header.vr == VR::UN),
    }
}

/// Skip the items of an undefined-length sequence
/// (or encapsulated pixel data),
/// up to and including the sequence delimiter.
///
/// The items of a sequence of unknown VR are in implicit VR little endian.
fn skip_undefined_sequence<R, D>(parser: &mut StatefulDecoder<R, D>, unknown: bool) -> Result<()>
where
    R: BufRead,
    D: DataDictionary,
{
    let was_implicit = parser.is_implicit_vr_le();
    if unknown {
        parser.set_implicit_vr_le(true);
    }
    let out = skip_items(parser);
    parser.set_implicit_vr_le(was_implicit);
    out
}

fn skip_items<R, D>(parser: &mut StatefulDecoder<R, D>) -> Result<()>
where
    R: BufRead,
    D: DataDictionary,
{
    loop {
        let position = parser.position();
        match parser.decode_item_header().context(ReadItemHeaderSnafu)? {
            SequenceItemHeader::Item { len } => match len.get() {
                Some(len) => parser
                    .skip_bytes(len.into())
                    .context(ReadItemValueSnafu { len })?,
                None => skip_item_content(parser)?,
            },
            SequenceItemHeader::SequenceDelimiter => return Ok(()),
            SequenceItemHeader::ItemDelimiter => {
                return UnexpectedItemTagSnafu {
                    tag: Tag::ITEM_DELIMITER,
                    position,
                }
                .fail()
            }
        }
    }
}

/// Copy the fragments of encapsulated pixel data to the sink,
/// item headers and sequence delimiter included,
/// exactly as they are found in the source.
///
/// Returns the number of bytes copied.
pub fn copy_fragments<R, D, W>(parser: &mut StatefulDecoder<R, D>, sink: &mut W) -> Result<u64>
where
    R: BufRead,
    D: DataDictionary,
    W: ?Sized + Write,
{
    let mut copied = 0;
    loop {
        let position = parser.pin();
        let item = parser.decode_item_header();
        let head = parser.bytes_since(position).to_vec();
        parser.unpin();
        let item = item.context(ReadItemHeaderSnafu)?;

        sink.write_all(&head)
            .context(CopyBulkDataSnafu { position })?;
        copied += head.len() as u64;

        match item {
            SequenceItemHeader::Item { len } => {
                let len = len
                    .get()
                    .ok_or_else(|| UndefinedItemLengthSnafu { position }.build())?;
                parser
                    .copy_bytes_to(len.into(), sink)
                    .context(ReadItemValueSnafu { len })?;
                copied += u64::from(len);
            }
            SequenceItemHeader::SequenceDelimiter => return Ok(copied),
            SequenceItemHeader::ItemDelimiter => {
                return UnexpectedItemTagSnafu {
                    tag: Tag::ITEM_DELIMITER,
                    position,
                }
                .fail()
            }
        }
    }
}
