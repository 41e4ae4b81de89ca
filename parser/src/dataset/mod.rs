//! Interpretation of DICOM data sets as streams of tokens.
use dcmcodec_core::header::{DataElementHeader, Length};
use dcmcodec_core::value::{BulkDataRef, PrimitiveValue};
use dcmcodec_core::{Tag, VR};
use dcmcodec_encoding::text::SpecificCharacterSet;
use std::fmt;

pub mod lazy;
pub mod read;
pub mod write;

pub use self::read::{DataSetReader, DataSetReaderOptions};
pub use self::write::DataSetWriter;

/// A token of a DICOM data set stream. This is part of the interpretation of a
/// data set as a stream of symbols, which may either represent data headers or
/// actual value data.
#[derive(Debug, Clone)]
pub enum DataToken {
    /// A data header of a primitive value.
    ElementHeader(DataElementHeader),
    /// The beginning of a sequence element.
    /// The value representation is `UN` for sequences of unknown type,
    /// whose items are in implicit VR little endian.
    SequenceStart { tag: Tag, vr: VR, len: Length },
    /// The beginning of an encapsulated pixel data element.
    PixelSequenceStart,
    /// The ending delimiter of a sequence or encapsulated pixel data.
    SequenceEnd,
    /// The beginning of a new item in the sequence.
    ItemStart { len: Length },
    /// The ending delimiter of an item.
    ItemEnd,
    /// A primitive data element value.
    PrimitiveValue(PrimitiveValue),
    /// A reference to the value of the preceding element header,
    /// which was not loaded into memory.
    BulkData(BulkDataRef),
    /// The basic offset table of encapsulated pixel data.
    OffsetTable(Vec<u32>),
    /// A pixel data fragment.
    ItemValue(Vec<u8>),
    /// A whole sequence item which was not parsed,
    /// in place of its `ItemStart` to `ItemEnd` tokens.
    LazyItem(LazyItem),
}

/// The undecoded content of a sequence item.
#[derive(Debug, Clone, PartialEq)]
pub struct LazyItem {
    /// the position of the item's first content byte in the source
    pub offset: u64,
    /// the item length as found in the item header
    pub len: Length,
    /// the item content, without the item delimiter
    pub data: Vec<u8>,
    /// whether the content is in implicit VR little endian
    /// regardless of the data set's transfer syntax
    pub implicit_vr_le: bool,
    /// the character set in effect at the start of the item
    pub charset: SpecificCharacterSet,
}

impl fmt::Display for DataToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataToken::PrimitiveValue(ref v) => write!(f, "PrimitiveValue({:?})", v.value_type()),
            DataToken::ItemValue(data) => write!(f, "ItemValue({} bytes)", data.len()),
            DataToken::LazyItem(item) => write!(
                f,
                "LazyItem({} bytes at {})",
                item.data.len(),
                item.offset
            ),
            other => write!(f, "{:?}", other),
        }
    }
}

/// This implementation treats undefined lengths as equal.
impl PartialEq<Self> for DataToken {
    fn eq(&self, other: &Self) -> bool {
        use DataToken::*;
        match (self, other) {
            (
                ElementHeader(DataElementHeader {
                    tag: tag1,
                    vr: vr1,
                    len: len1,
                }),
                ElementHeader(DataElementHeader {
                    tag: tag2,
                    vr: vr2,
                    len: len2,
                }),
            ) => tag1 == tag2 && vr1 == vr2 && len1.inner_eq(*len2),
            (
                SequenceStart {
                    tag: tag1,
                    vr: vr1,
                    len: len1,
                },
                SequenceStart {
                    tag: tag2,
                    vr: vr2,
                    len: len2,
                },
            ) => tag1 == tag2 && vr1 == vr2 && len1.inner_eq(*len2),
            (ItemStart { len: len1 }, ItemStart { len: len2 }) => len1.inner_eq(*len2),
            (PrimitiveValue(v1), PrimitiveValue(v2)) => v1 == v2,
            (BulkData(r1), BulkData(r2)) => r1 == r2,
            (OffsetTable(t1), OffsetTable(t2)) => t1 == t2,
            (ItemValue(v1), ItemValue(v2)) => v1 == v2,
            (LazyItem(i1), LazyItem(i2)) => {
                i1.offset == i2.offset
                    && i1.len.inner_eq(i2.len)
                    && i1.data == i2.data
                    && i1.implicit_vr_le == i2.implicit_vr_le
                    && i1.charset == i2.charset
            }
            (ItemEnd, ItemEnd)
            | (SequenceEnd, SequenceEnd)
            | (PixelSequenceStart, PixelSequenceStart) => true,
            _ => false,
        }
    }
}

/// The type of delimiter: sequence or item.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SeqTokenType {
    Sequence,
    Item,
}
