//! This modules contains an assortment of types required for interpreting DICOM data elements.
//! It comprises a variety of basic data types, such as the DICOM attribute tag, the
//! element header, the value representation catalog, and element composite types.

use crate::value::{BulkDataRef, CastValueError, PrimitiveValue, Value};
use snafu::{Backtrace, Snafu};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::{from_utf8, FromStr};

/// Error type for issues constructing a sequence item header.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum SequenceItemHeaderError {
    /// Unexpected header tag.
    /// Only Item (0xFFFE, 0xE000),
    /// Item Delimiter (0xFFFE, 0xE00D),
    /// or Sequence Delimiter (0xFFFE, 0xE0DD)
    /// are admitted.
    #[snafu(display("Unexpected tag {}", tag))]
    UnexpectedTag { tag: Tag, backtrace: Backtrace },
    /// Unexpected delimiter value length.
    /// Must be zero for item delimiters.
    #[snafu(display("Unexpected delimiter length {}", len))]
    UnexpectedDelimiterLength { len: Length, backtrace: Backtrace },
}

/// The value representation code is not in the catalog.
#[derive(Debug, Snafu)]
#[snafu(display("Invalid value representation `{}`", code))]
pub struct InvalidValueRepresentation {
    code: String,
    backtrace: Backtrace,
}

impl InvalidValueRepresentation {
    /// The offending code, as a lossy string.
    pub fn code(&self) -> &str {
        &self.code
    }
}

type Result<T, E = SequenceItemHeaderError> = std::result::Result<T, E>;

/// Trait for any DICOM entity (element or item) which may have a length.
pub trait HasLength {
    /// Retrieve the value data's length as specified by the data element or
    /// item, in bytes.
    ///
    /// According to the standard, the concrete value size may be undefined,
    /// which can be the case for sequence elements or specific primitive
    /// values.
    fn length(&self) -> Length;

    /// Check whether the value is empty (0 length).
    fn is_empty(&self) -> bool {
        self.length() == Length(0)
    }
}

/// A trait for a data type containing a DICOM header.
#[allow(clippy::len_without_is_empty)]
pub trait Header: HasLength {
    /// Retrieve the element's tag as a `(group, element)` tuple.
    fn tag(&self) -> Tag;

    /// Check whether this is the header of an item.
    fn is_item(&self) -> bool {
        self.tag().is_item()
    }

    /// Check whether this is the header of an item delimiter.
    fn is_item_delimiter(&self) -> bool {
        self.tag().is_item_delimiter()
    }

    /// Check whether this is the header of a sequence delimiter.
    fn is_sequence_delimiter(&self) -> bool {
        self.tag().is_sequence_delimiter()
    }

    /// Check whether this is the header of an encapsulated pixel data.
    fn is_encapsulated_pixeldata(&self) -> bool {
        self.tag() == Tag::PIXEL_DATA && self.length().is_undefined()
    }
}

/// A data type that represents and owns a DICOM data element.
///
/// `I` is the type of the items in a sequence value,
/// typically an in-memory DICOM object.
#[derive(Debug, PartialEq, Clone)]
pub struct DataElement<I> {
    header: DataElementHeader,
    value: Value<I>,
}

impl<I> HasLength for DataElement<I> {
    #[inline]
    fn length(&self) -> Length {
        self.header.length()
    }
}

impl<I> Header for DataElement<I> {
    #[inline]
    fn tag(&self) -> Tag {
        self.header.tag()
    }
}

impl<I> DataElement<I> {
    /// Create an empty data element.
    ///
    /// Any value representation is admitted,
    /// so that null elements can be created regardless of their category.
    pub fn empty(tag: Tag, vr: VR) -> Self {
        DataElement {
            header: DataElementHeader {
                tag,
                vr,
                len: Length(0),
            },
            value: if vr == VR::SQ {
                Value::Sequence(Vec::new())
            } else {
                PrimitiveValue::Empty.into()
            },
        }
    }

    /// Create a data element from the given parts.
    ///
    /// The length is inferred from the value where possible.
    /// Sequences and fragment sequences receive an undefined length,
    /// as their encoded size depends on the encoding.
    pub fn new<T>(tag: Tag, vr: VR, value: T) -> Self
    where
        T: Into<Value<I>>,
    {
        let value = value.into();
        let len = value.length(vr);
        DataElement {
            header: DataElementHeader { tag, vr, len },
            value,
        }
    }

    /// Create a data element with an explicit length.
    /// The length is not checked against the value.
    pub fn new_with_len<T>(tag: Tag, vr: VR, len: Length, value: T) -> Self
    where
        T: Into<Value<I>>,
    {
        DataElement {
            header: DataElementHeader { tag, vr, len },
            value: value.into(),
        }
    }

    /// Retrieve the element header.
    pub fn header(&self) -> &DataElementHeader {
        &self.header
    }

    /// Retrieve the value representation, which may be unknown or not
    /// applicable.
    pub fn vr(&self) -> VR {
        self.header.vr
    }

    /// Retrieve the data value.
    pub fn value(&self) -> &Value<I> {
        &self.value
    }

    /// Retrieve a mutable reference to the data value.
    ///
    /// The header length is not updated by changes made through this reference.
    pub fn value_mut(&mut self) -> &mut Value<I> {
        &mut self.value
    }

    /// Move the data value out of the element, discarding the rest.
    pub fn into_value(self) -> Value<I> {
        self.value
    }

    /// Split the element into its header and value.
    pub fn into_parts(self) -> (DataElementHeader, Value<I>) {
        (self.header, self.value)
    }

    /// Retrieve the items of a sequence element.
    pub fn items(&self) -> Option<&[I]> {
        self.value.items()
    }

    /// Retrieve the items of a sequence element, mutably.
    pub fn items_mut(&mut self) -> Option<&mut Vec<I>> {
        self.value.items_mut()
    }

    /// Retrieve the bulk data reference of this element, if it is one.
    pub fn bulk_data(&self) -> Option<&BulkDataRef> {
        match &self.value {
            Value::BulkData(b) => Some(b),
            _ => None,
        }
    }

    /// Convert the full primitive value into a single string,
    /// where multiple values are joined with a backslash.
    pub fn to_str(&self) -> std::result::Result<Cow<str>, CastValueError> {
        self.value.to_str()
    }

    /// Retrieve the first string of the primitive value.
    pub fn string(&self) -> std::result::Result<&str, CastValueError> {
        self.value.string()
    }

    /// Retrieve all strings of the primitive value.
    pub fn strings(&self) -> std::result::Result<&[String], CastValueError> {
        self.value.strings()
    }

    /// Retrieve the first unsigned 16-bit integer of the primitive value.
    pub fn uint16(&self) -> std::result::Result<u16, CastValueError> {
        self.value.uint16()
    }

    /// Retrieve the first unsigned 32-bit integer of the primitive value.
    pub fn uint32(&self) -> std::result::Result<u32, CastValueError> {
        self.value.uint32()
    }

    /// Retrieve the raw bytes of an `OB`/`UN` primitive value.
    pub fn uint8_slice(&self) -> std::result::Result<&[u8], CastValueError> {
        self.value.uint8_slice()
    }
}

/// A data structure for a data element header, containing
/// a tag, value representation and specified length.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct DataElementHeader {
    /// DICOM tag
    pub tag: Tag,
    /// Value Representation
    pub vr: VR,
    /// Element length
    pub len: Length,
}

impl HasLength for DataElementHeader {
    #[inline]
    fn length(&self) -> Length {
        self.len
    }
}

impl Header for DataElementHeader {
    #[inline]
    fn tag(&self) -> Tag {
        self.tag
    }
}

impl DataElementHeader {
    /// Create a new data element header with the given properties.
    /// This is just a trivial constructor.
    #[inline]
    pub fn new<T: Into<Tag>>(tag: T, vr: VR, len: Length) -> DataElementHeader {
        DataElementHeader {
            tag: tag.into(),
            vr,
            len,
        }
    }

    /// Retrieve the element's value representation, which can be unknown.
    #[inline]
    pub fn vr(&self) -> VR {
        self.vr
    }

    /// Check whether the header suggests the value to be a sequence value:
    /// if the value representation is SQ or the length is undefined.
    #[inline]
    pub fn is_non_primitive(&self) -> bool {
        self.vr == VR::SQ || self.length().is_undefined()
    }
}

impl From<SequenceItemHeader> for DataElementHeader {
    fn from(value: SequenceItemHeader) -> DataElementHeader {
        DataElementHeader {
            tag: value.tag(),
            vr: VR::UN,
            len: value.length(),
        }
    }
}

/// Data type for describing a sequence item data element.
/// If the element represents an item, it will also contain
/// the specified length.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum SequenceItemHeader {
    /// The cursor contains an item.
    Item {
        /// the length of the item in bytes (can be 0xFFFFFFFF if undefined)
        len: Length,
    },
    /// The cursor read an item delimiter.
    /// The element ends here and should not be read any further.
    ItemDelimiter,
    /// The cursor read a sequence delimiter.
    /// The element ends here and should not be read any further.
    SequenceDelimiter,
}

impl SequenceItemHeader {
    /// Create a sequence item header using the element's raw properties.
    /// An error can be raised if the given properties do not relate to a
    /// sequence item, a sequence item delimiter or a sequence delimiter.
    pub fn new<T: Into<Tag>>(tag: T, len: Length) -> Result<SequenceItemHeader> {
        match tag.into() {
            Tag::ITEM => Ok(SequenceItemHeader::Item { len }),
            Tag::ITEM_DELIMITER => {
                // delimiters should not have a positive length
                if len != Length(0) {
                    UnexpectedDelimiterLengthSnafu { len }.fail()
                } else {
                    Ok(SequenceItemHeader::ItemDelimiter)
                }
            }
            Tag::SEQUENCE_DELIMITER => Ok(SequenceItemHeader::SequenceDelimiter),
            tag => UnexpectedTagSnafu { tag }.fail(),
        }
    }
}

impl HasLength for SequenceItemHeader {
    #[inline]
    fn length(&self) -> Length {
        match *self {
            SequenceItemHeader::Item { len } => len,
            SequenceItemHeader::ItemDelimiter | SequenceItemHeader::SequenceDelimiter => Length(0),
        }
    }
}

impl Header for SequenceItemHeader {
    #[inline]
    fn tag(&self) -> Tag {
        match *self {
            SequenceItemHeader::Item { .. } => Tag::ITEM,
            SequenceItemHeader::ItemDelimiter => Tag::ITEM_DELIMITER,
            SequenceItemHeader::SequenceDelimiter => Tag::SEQUENCE_DELIMITER,
        }
    }
}

/// An enum type for a DICOM value representation.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd)]
pub enum VR {
    /// Application Entity
    AE,
    /// Age String
    AS,
    /// Attribute Tag
    AT,
    /// Code String
    CS,
    /// Date
    DA,
    /// Decimal String
    DS,
    /// Date Time
    DT,
    /// Floating Point Single
    FL,
    /// Floating Point Double
    FD,
    /// Integer String
    IS,
    /// Long String
    LO,
    /// Long Text
    LT,
    /// Other Byte
    OB,
    /// Other Double
    OD,
    /// Other Float
    OF,
    /// Other Long
    OL,
    /// Other Very Long
    OV,
    /// Other Word
    OW,
    /// Person Name
    PN,
    /// Short String
    SH,
    /// Signed Long
    SL,
    /// Sequence of Items
    SQ,
    /// Signed Short
    SS,
    /// Short Text
    ST,
    /// Signed Very Long
    SV,
    /// Time
    TM,
    /// Unlimited Characters
    UC,
    /// Unique Identifier (UID)
    UI,
    /// Unsigned Long
    UL,
    /// Unknown
    UN,
    /// Universal Resource Identifier or Universal Resource Locator (URI/URL)
    UR,
    /// Unsigned Short
    US,
    /// Unlimited Text
    UT,
    /// Unsigned Very Long
    UV,
}

/// The category of the values held by elements of a given
/// value representation.
///
/// It determines how value data is decoded from and encoded into bytes.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum VrCategory {
    /// Text where the backslash separates multiple values.
    StringMultiValued,
    /// Text where the backslash is a regular character,
    /// so the value is always a single string.
    StringSingleValued,
    /// Person names. Multi-valued text with component groups.
    PersonName,
    /// 16-bit signed integers.
    SignedInt16,
    /// 16-bit unsigned integers.
    UnsignedInt16,
    /// 32-bit signed integers.
    SignedInt32,
    /// 32-bit unsigned integers.
    UnsignedInt32,
    /// 64-bit signed integers.
    SignedInt64,
    /// 64-bit unsigned integers.
    UnsignedInt64,
    /// 32-bit IEEE floats.
    Float32,
    /// 64-bit IEEE floats.
    Float64,
    /// Pairs of 16-bit words forming attribute tags.
    AttributeTag,
    /// Opaque bytes, interpreted in words of `word_size` bytes
    /// when byte swapping is needed.
    Binary {
        /// the size of a word in bytes (1, 2, 4 or 8)
        word_size: u8,
    },
    /// Nested data sets.
    Sequence,
    /// Unknown content, kept as bytes.
    Unknown,
}

/// The type used to represent values of a given value representation
/// in textual projections of DICOM data (such as the DICOM JSON model).
///
/// The projections themselves live outside of this crate.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum JsonType {
    /// JSON strings
    String,
    /// JSON integer numbers
    Int,
    /// JSON non-negative integer numbers
    UInt,
    /// JSON real numbers
    Double,
    /// base64-encoded binary data
    Base64,
    /// person name objects with alphabetic, ideographic and phonetic groups
    PersonName,
    /// nested data sets
    Sequence,
}

impl VR {
    /// Obtain the value representation corresponding to the given two bytes.
    /// Each byte should represent an alphabetic character in upper case.
    pub fn from_binary(chars: [u8; 2]) -> Option<Self> {
        from_utf8(chars.as_ref())
            .ok()
            .and_then(|s| VR::from_str(s).ok())
    }

    /// Retrieve a string representation of this VR.
    pub fn to_string(self) -> &'static str {
        use VR::*;
        match self {
            AE => "AE",
            AS => "AS",
            AT => "AT",
            CS => "CS",
            DA => "DA",
            DS => "DS",
            DT => "DT",
            FL => "FL",
            FD => "FD",
            IS => "IS",
            LO => "LO",
            LT => "LT",
            OB => "OB",
            OD => "OD",
            OF => "OF",
            OL => "OL",
            OV => "OV",
            OW => "OW",
            PN => "PN",
            SH => "SH",
            SL => "SL",
            SQ => "SQ",
            SS => "SS",
            ST => "ST",
            SV => "SV",
            TM => "TM",
            UC => "UC",
            UI => "UI",
            UL => "UL",
            UN => "UN",
            UR => "UR",
            US => "US",
            UT => "UT",
            UV => "UV",
        }
    }

    /// Retrieve a copy of this VR's byte representation.
    /// The function returns two alphabetic characters in upper case.
    pub fn to_bytes(self) -> [u8; 2] {
        let bytes = self.to_string().as_bytes();
        [bytes[0], bytes[1]]
    }

    /// Classify the value representation into its value category.
    pub fn category(self) -> VrCategory {
        use VR::*;
        match self {
            AE | AS | CS | DA | DS | DT | IS | LO | SH | TM | UC | UI => {
                VrCategory::StringMultiValued
            }
            LT | ST | UR | UT => VrCategory::StringSingleValued,
            PN => VrCategory::PersonName,
            SS => VrCategory::SignedInt16,
            US => VrCategory::UnsignedInt16,
            SL => VrCategory::SignedInt32,
            UL => VrCategory::UnsignedInt32,
            SV => VrCategory::SignedInt64,
            UV => VrCategory::UnsignedInt64,
            FL => VrCategory::Float32,
            FD => VrCategory::Float64,
            AT => VrCategory::AttributeTag,
            OB => VrCategory::Binary { word_size: 1 },
            OW => VrCategory::Binary { word_size: 2 },
            OF | OL => VrCategory::Binary { word_size: 4 },
            OD | OV => VrCategory::Binary { word_size: 8 },
            SQ => VrCategory::Sequence,
            UN => VrCategory::Unknown,
        }
    }

    /// Whether the length field of an element with this VR is 2 bytes wide
    /// in explicit VR encodings.
    ///
    /// All other value representations are encoded with
    /// 2 reserved bytes followed by a 4-byte length field.
    pub fn has_short_length_field(self) -> bool {
        use VR::*;
        matches!(
            self,
            AE | AS
                | AT
                | CS
                | DA
                | DS
                | DT
                | FL
                | FD
                | IS
                | LO
                | LT
                | PN
                | SH
                | SL
                | SS
                | ST
                | TM
                | UI
                | UL
                | US
        )
    }

    /// The type of the value in textual projections of DICOM data.
    pub fn json_type(self) -> JsonType {
        use VR::*;
        match self {
            IS | SL | SS | SV => JsonType::Int,
            UL | US | UV => JsonType::UInt,
            DS | FL | FD => JsonType::Double,
            OB | OD | OF | OL | OV | OW | UN => JsonType::Base64,
            PN => JsonType::PersonName,
            SQ => JsonType::Sequence,
            _ => JsonType::String,
        }
    }

    /// Whether values of this VR are text.
    pub fn is_text(self) -> bool {
        matches!(
            self.category(),
            VrCategory::StringMultiValued
                | VrCategory::StringSingleValued
                | VrCategory::PersonName
        )
    }

    /// Whether values of this VR are opaque binary data
    /// (`OB`, `OW`, `OF`, `OL`, `OD`, `OV` and `UN`).
    pub fn is_binary(self) -> bool {
        matches!(
            self.category(),
            VrCategory::Binary { .. } | VrCategory::Unknown
        )
    }

    /// The byte used to pad values of this VR to an even length.
    pub fn padding_byte(self) -> u8 {
        if self.is_text() && self != VR::UI {
            b' '
        } else {
            0
        }
    }

    /// The size in bytes of a single value word,
    /// for the purpose of byte swapping.
    /// Text and sequences have a word size of 1.
    pub fn word_size(self) -> u8 {
        match self.category() {
            VrCategory::SignedInt16 | VrCategory::UnsignedInt16 | VrCategory::AttributeTag => 2,
            VrCategory::SignedInt32 | VrCategory::UnsignedInt32 | VrCategory::Float32 => 4,
            VrCategory::SignedInt64 | VrCategory::UnsignedInt64 | VrCategory::Float64 => 8,
            VrCategory::Binary { word_size } => word_size,
            _ => 1,
        }
    }
}

/// Obtain the value representation corresponding to the given string.
/// The string should hold exactly two UTF-8 encoded alphabetic characters
/// in upper case, otherwise no match is made.
impl FromStr for VR {
    type Err = InvalidValueRepresentation;

    fn from_str(string: &str) -> std::result::Result<Self, Self::Err> {
        use VR::*;
        match string {
            "AE" => Ok(AE),
            "AS" => Ok(AS),
            "AT" => Ok(AT),
            "CS" => Ok(CS),
            "DA" => Ok(DA),
            "DS" => Ok(DS),
            "DT" => Ok(DT),
            "FL" => Ok(FL),
            "FD" => Ok(FD),
            "IS" => Ok(IS),
            "LO" => Ok(LO),
            "LT" => Ok(LT),
            "OB" => Ok(OB),
            "OD" => Ok(OD),
            "OF" => Ok(OF),
            "OL" => Ok(OL),
            "OV" => Ok(OV),
            "OW" => Ok(OW),
            "PN" => Ok(PN),
            "SH" => Ok(SH),
            "SL" => Ok(SL),
            "SQ" => Ok(SQ),
            "SS" => Ok(SS),
            "ST" => Ok(ST),
            "SV" => Ok(SV),
            "TM" => Ok(TM),
            "UC" => Ok(UC),
            "UI" => Ok(UI),
            "UL" => Ok(UL),
            "UN" => Ok(UN),
            "UR" => Ok(UR),
            "US" => Ok(US),
            "UT" => Ok(UT),
            "UV" => Ok(UV),
            code => InvalidValueRepresentationSnafu { code }.fail(),
        }
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(VR::to_string(*self))
    }
}

/// Idiomatic alias for a tag's group number.
pub type GroupNumber = u16;
/// Idiomatic alias for a tag's element number.
pub type ElementNumber = u16;

/// The data type for DICOM data element tags.
///
/// Both `(u16, u16)` and `[u16; 2]` can be
/// efficiently converted to this type as well.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy)]
pub struct Tag(pub GroupNumber, pub ElementNumber);

impl Tag {
    /// Item
    pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
    /// Item Delimitation Item
    pub const ITEM_DELIMITER: Tag = Tag(0xFFFE, 0xE00D);
    /// Sequence Delimitation Item
    pub const SEQUENCE_DELIMITER: Tag = Tag(0xFFFE, 0xE0DD);
    /// Pixel Data
    pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);
    /// Specific Character Set
    pub const SPECIFIC_CHARACTER_SET: Tag = Tag(0x0008, 0x0005);

    /// Getter for the tag's group value.
    #[inline]
    pub fn group(self) -> GroupNumber {
        self.0
    }

    /// Getter for the tag's element value.
    #[inline]
    pub fn element(self) -> ElementNumber {
        self.1
    }

    /// Whether this is a group length tag `(gggg,0000)`.
    #[inline]
    pub fn is_group_length(self) -> bool {
        self.1 == 0
    }

    /// Whether this tag belongs to a private group (odd group number).
    #[inline]
    pub fn is_private(self) -> bool {
        self.0 & 1 == 1 && self.0 > 0x0008 && self.0 != 0xFFFF
    }

    /// Whether this is a private creator slot `(gggg,0010)` to `(gggg,00FF)`.
    #[inline]
    pub fn is_private_creator(self) -> bool {
        self.is_private() && (0x0010..=0x00FF).contains(&self.1)
    }

    /// For a private data element `(gggg,xxee)`,
    /// obtain the tag of its private creator `(gggg,00xx)`.
    ///
    /// Returns `None` for standard tags, creator slots and group lengths.
    pub fn private_creator_tag(self) -> Option<Tag> {
        let block = self.1 >> 8;
        if self.is_private() && (0x10..=0xFF).contains(&block) {
            Some(Tag(self.0, block))
        } else {
            None
        }
    }

    /// Normalize repeating groups `50xx` and `60xx`
    /// to `5000` and `6000` respectively,
    /// which is how repeating attributes are registered in dictionaries.
    pub fn normalize_repeating_group(self) -> Tag {
        match self.0 & 0xFF00 {
            0x5000 | 0x6000 if self.0 & 1 == 0 => Tag(self.0 & 0xFF00, self.1),
            _ => self,
        }
    }

    /// Whether this is the tag of an item.
    #[inline]
    pub fn is_item(self) -> bool {
        self == Tag::ITEM
    }

    /// Whether this is the tag of an item delimitation item.
    #[inline]
    pub fn is_item_delimiter(self) -> bool {
        self == Tag::ITEM_DELIMITER
    }

    /// Whether this is the tag of a sequence delimitation item.
    #[inline]
    pub fn is_sequence_delimiter(self) -> bool {
        self == Tag::SEQUENCE_DELIMITER
    }

    /// Combine both parts of the tag into a single 32-bit number,
    /// group in the high word.
    #[inline]
    pub fn to_u32(self) -> u32 {
        (u32::from(self.0) << 16) | u32::from(self.1)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({:#06X?}, {:#06X?})", self.0, self.1)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl PartialEq<(u16, u16)> for Tag {
    fn eq(&self, other: &(u16, u16)) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

impl PartialEq<[u16; 2]> for Tag {
    fn eq(&self, other: &[u16; 2]) -> bool {
        self.0 == other[0] && self.1 == other[1]
    }
}

impl From<(u16, u16)> for Tag {
    #[inline]
    fn from(value: (u16, u16)) -> Tag {
        Tag(value.0, value.1)
    }
}

impl From<[u16; 2]> for Tag {
    #[inline]
    fn from(value: [u16; 2]) -> Tag {
        Tag(value[0], value[1])
    }
}

impl From<u32> for Tag {
    #[inline]
    fn from(value: u32) -> Tag {
        Tag((value >> 16) as u16, value as u16)
    }
}

/// A type for representing data set content length, in bytes.
/// An internal value of `0xFFFF_FFFF` represents an undefined
/// (unspecified) length, which would have to be determined
/// with a traversal based on the content's encoding.
///
/// This also means that numeric comparisons and arithmetic
/// do not function the same way as primitive number types:
///
/// Two length of undefined length are not equal.
///
/// ```
/// # use dcmcodec_core::Length;
/// assert_ne!(Length::UNDEFINED, Length::UNDEFINED);
/// ```
///
/// Any addition with at least one undefined
/// length results in an undefined length.
///
/// ```
/// # use dcmcodec_core::Length;
/// assert!((Length::defined(64) + Length::UNDEFINED).is_undefined());
/// ```
#[derive(Clone, Copy)]
pub struct Length(pub u32);

const UNDEFINED_LEN: u32 = 0xFFFF_FFFF;

impl Length {
    /// A length that is undefined.
    pub const UNDEFINED: Self = Length(UNDEFINED_LEN);

    /// Create a new length value from its internal representation.
    /// This is equivalent to `Length(len)`.
    #[inline]
    pub fn new(len: u32) -> Self {
        Length(len)
    }

    /// Create a new length value with the given number of bytes.
    ///
    /// # Panic
    ///
    /// This function will panic if `len` represents an undefined length.
    #[inline]
    pub fn defined(len: u32) -> Self {
        assert_ne!(len, UNDEFINED_LEN);
        Length(len)
    }

    /// Check whether this length is undefined (unknown).
    #[inline]
    pub fn is_undefined(self) -> bool {
        self.0 == UNDEFINED_LEN
    }

    /// Check whether this length is well defined (not undefined).
    #[inline]
    pub fn is_defined(self) -> bool {
        !self.is_undefined()
    }

    /// Fetch the concrete length value, if available.
    /// Returns `None` if it represents an undefined length.
    #[inline]
    pub fn get(self) -> Option<u32> {
        match self.0 {
            UNDEFINED_LEN => None,
            v => Some(v),
        }
    }

    /// Check whether the length is equally specified as another length.
    /// Unlike the implemented `PartialEq`, two undefined lengths are
    /// considered equivalent by this method.
    #[inline]
    pub fn inner_eq(self, other: Length) -> bool {
        self.0 == other.0
    }
}

impl From<u32> for Length {
    #[inline]
    fn from(o: u32) -> Self {
        Length(o)
    }
}

impl PartialEq<Length> for Length {
    fn eq(&self, rhs: &Length) -> bool {
        match (self.0, rhs.0) {
            (UNDEFINED_LEN, _) | (_, UNDEFINED_LEN) => false,
            (l1, l2) => l1 == l2,
        }
    }
}

impl PartialOrd<Length> for Length {
    fn partial_cmp(&self, rhs: &Length) -> Option<Ordering> {
        match (self.0, rhs.0) {
            (UNDEFINED_LEN, _) | (_, UNDEFINED_LEN) => None,
            (l1, l2) => Some(l1.cmp(&l2)),
        }
    }
}

impl std::ops::Add<Length> for Length {
    type Output = Self;

    fn add(self, rhs: Length) -> Self::Output {
        match (self.0, rhs.0) {
            (UNDEFINED_LEN, _) | (_, UNDEFINED_LEN) => Length::UNDEFINED,
            (l1, l2) => {
                let o = l1 + l2;
                debug_assert!(
                    o != UNDEFINED_LEN,
                    "integer overflow (0xFFFF_FFFF reserved for undefined length)"
                );
                Length(o)
            }
        }
    }
}

impl fmt::Debug for Length {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            UNDEFINED_LEN => f.write_str("Length(Undefined)"),
            l => f.debug_tuple("Length").field(&l).finish(),
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            UNDEFINED_LEN => f.write_str("U/L"),
            l => write!(f, "{}", &l),
        }
    }
}
