//! This module includes a high level abstraction over a DICOM data element's value.
//!
//! A value is either primitive (text, numbers, tags or raw bytes),
//! a sequence of nested data set items,
//! a sequence of encapsulated pixel data fragments,
//! or a reference to bulk data kept outside of memory.

use crate::header::{Length, Tag, VrCategory, VR};
use itertools::Itertools;
use smallvec::SmallVec;
use snafu::{Backtrace, OptionExt, Snafu};
use std::borrow::Cow;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// An aggregation of one or more elements in a value.
pub type C<T> = SmallVec<[T; 2]>;

/// Triggered when a value reading attempt fails
/// because the value is of a different type.
#[derive(Debug, Clone, PartialEq)]
pub struct CastValueError {
    /// The value format requested
    pub requested: &'static str,
    /// The value's actual representation
    pub got: ValueType,
}

impl fmt::Display for CastValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "bad value cast: requested {} but value is {:?}",
            self.requested, self.got
        )
    }
}

impl std::error::Error for CastValueError {}

/// An error parsing a textual form of a primitive value.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ParseValueError {
    /// A number could not be parsed
    #[snafu(display("Could not parse `{}` as a number for {}", text, vr))]
    ParseNumber {
        text: String,
        vr: VR,
        backtrace: Backtrace,
    },
    /// An attribute tag could not be parsed
    #[snafu(display("Could not parse `{}` as an attribute tag", text))]
    ParseTag { text: String, backtrace: Backtrace },
    /// Sequences have no textual form
    #[snafu(display("Value representation {} has no primitive textual form", vr))]
    NotPrimitive { vr: VR, backtrace: Backtrace },
}

/// An enum representing an abstraction of a DICOM element's data value type.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ValueType {
    /// No data. Used for any value of length 0.
    Empty,
    /// A sequence of items.
    Item,
    /// A sequence of encapsulated pixel data fragments.
    PixelSequence,
    /// A reference to bulk data outside of memory.
    BulkData,
    /// A sequence of strings.
    Strs,
    /// A single string.
    Str,
    /// A sequence of attribute tags.
    Tags,
    /// A sequence of bytes.
    U8,
    /// A sequence of signed 16-bit integers.
    I16,
    /// A sequence of unsigned 16-bit integers.
    U16,
    /// A sequence of signed 32-bit integers.
    I32,
    /// A sequence of unsigned 32-bit integers.
    U32,
    /// A sequence of signed 64-bit integers.
    I64,
    /// A sequence of unsigned 64-bit integers.
    U64,
    /// A sequence of 32-bit floating point numbers.
    F32,
    /// A sequence of 64-bit floating point numbers.
    F64,
}

/// An enum representing a primitive value from a DICOM element.
/// The result of decoding an element's data value
/// may be one of the enumerated types
/// depending on its content and value representation.
///
/// Multiple elements are contained in a [`smallvec`] vector,
/// conveniently aliased to the type [`C`].
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    /// No data. Usually employed for zero-length values.
    Empty,
    /// A sequence of strings.
    /// Used for AE, AS, PN, SH, CS, LO, UI, UC,
    /// as well as the textual numbers IS and DS
    /// and the date/time representations DA, TM and DT,
    /// kept in their original form.
    Strs(C<String>),
    /// A single string.
    /// Used for ST, LT, UT and UR, which are never multi-valued.
    Str(String),
    /// A sequence of attribute tags.
    /// Used specifically for AT.
    Tags(C<Tag>),
    /// The value is a sequence of bytes.
    /// Used for OB and UN.
    U8(C<u8>),
    /// The value is a sequence of signed 16-bit integers.
    /// Used for SS.
    I16(C<i16>),
    /// A sequence of unsigned 16-bit integers.
    /// Used for US and OW.
    U16(C<u16>),
    /// A sequence of signed 32-bit integers.
    /// Used for SL.
    I32(C<i32>),
    /// A sequence of unsigned 32-bit integers.
    /// Used for UL and OL.
    U32(C<u32>),
    /// A sequence of signed 64-bit integers.
    /// Used for SV.
    I64(C<i64>),
    /// A sequence of unsigned 64-bit integers.
    /// Used for UV and OV.
    U64(C<u64>),
    /// The value is a sequence of 32-bit floating point numbers.
    /// Used for OF and FL.
    F32(C<f32>),
    /// The value is a sequence of 64-bit floating point numbers.
    /// Used for OD and FD.
    F64(C<f64>),
}

/// Construct a DICOM primitive value.
///
/// ```
/// # use dcmcodec_core::{dicom_value, PrimitiveValue};
/// let value = dicom_value!(U16, [256, 0, 16]);
/// assert_eq!(value.multiplicity(), 3);
/// let value = dicom_value!(Strs, ["ORIGINAL", "PRIMARY"]);
/// assert_eq!(value.to_str(), "ORIGINAL\\PRIMARY");
/// ```
#[macro_export]
macro_rules! dicom_value {
    () => {
        $crate::value::PrimitiveValue::Empty
    };
    (Strs, [ $($elem: expr),* $(,)? ]) => {
        $crate::value::PrimitiveValue::Strs(
            $crate::smallvec::smallvec![$(String::from($elem),)*]
        )
    };
    (Str, $elem: expr) => {
        $crate::value::PrimitiveValue::Str(String::from($elem))
    };
    ($typ: ident, [ $($elem: expr),* $(,)? ]) => {
        $crate::value::PrimitiveValue::$typ($crate::smallvec::smallvec![$($elem,)*])
    };
    ($typ: ident, $elem: expr) => {
        $crate::value::PrimitiveValue::$typ($crate::value::C::from_elem($elem, 1))
    };
}

impl From<String> for PrimitiveValue {
    fn from(value: String) -> Self {
        PrimitiveValue::Strs(C::from_elem(value, 1))
    }
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        PrimitiveValue::Strs(C::from_elem(value.to_owned(), 1))
    }
}

macro_rules! impl_from_for_primitive {
    ($typ: ty, $variant: ident) => {
        impl From<$typ> for PrimitiveValue {
            fn from(value: $typ) -> Self {
                PrimitiveValue::$variant(C::from_elem(value, 1))
            }
        }

        impl From<Vec<$typ>> for PrimitiveValue {
            fn from(value: Vec<$typ>) -> Self {
                PrimitiveValue::$variant(C::from_vec(value))
            }
        }
    };
}

impl_from_for_primitive!(Tag, Tags);
impl_from_for_primitive!(u8, U8);
impl_from_for_primitive!(i16, I16);
impl_from_for_primitive!(u16, U16);
impl_from_for_primitive!(i32, I32);
impl_from_for_primitive!(u32, U32);
impl_from_for_primitive!(i64, I64);
impl_from_for_primitive!(u64, U64);
impl_from_for_primitive!(f32, F32);
impl_from_for_primitive!(f64, F64);

impl PrimitiveValue {
    /// Obtain the number of individual elements. This number may not
    /// match the DICOM value multiplicity in some value representations.
    pub fn multiplicity(&self) -> u32 {
        use self::PrimitiveValue::*;
        match self {
            Empty => 0,
            Str(_) => 1,
            Strs(c) => c.len() as u32,
            Tags(c) => c.len() as u32,
            U8(c) => c.len() as u32,
            I16(c) => c.len() as u32,
            U16(c) => c.len() as u32,
            I32(c) => c.len() as u32,
            U32(c) => c.len() as u32,
            I64(c) => c.len() as u32,
            U64(c) => c.len() as u32,
            F32(c) => c.len() as u32,
            F64(c) => c.len() as u32,
        }
    }

    /// Determine the type of the value held.
    pub fn value_type(&self) -> ValueType {
        use self::PrimitiveValue::*;
        match self {
            Empty => ValueType::Empty,
            Str(_) => ValueType::Str,
            Strs(_) => ValueType::Strs,
            Tags(_) => ValueType::Tags,
            U8(_) => ValueType::U8,
            I16(_) => ValueType::I16,
            U16(_) => ValueType::U16,
            I32(_) => ValueType::I32,
            U32(_) => ValueType::U32,
            I64(_) => ValueType::I64,
            U64(_) => ValueType::U64,
            F32(_) => ValueType::F32,
            F64(_) => ValueType::F64,
        }
    }

    /// Whether the value holds no data.
    pub fn is_empty(&self) -> bool {
        self.multiplicity() == 0
    }

    /// The number of bytes of this value in a binary encoding,
    /// assuming text is encoded as UTF-8 and excluding padding.
    pub fn calculate_byte_len(&self) -> usize {
        use self::PrimitiveValue::*;
        match self {
            Empty => 0,
            Str(s) => s.len(),
            Strs(c) if c.is_empty() => 0,
            Strs(c) => c.iter().map(|s| s.len()).sum::<usize>() + c.len() - 1,
            Tags(c) => c.len() * 4,
            U8(c) => c.len(),
            I16(c) => c.len() * 2,
            U16(c) => c.len() * 2,
            I32(c) => c.len() * 4,
            U32(c) => c.len() * 4,
            I64(c) => c.len() * 8,
            U64(c) => c.len() * 8,
            F32(c) => c.len() * 4,
            F64(c) => c.len() * 8,
        }
    }

    /// Convert the primitive value into a string representation.
    ///
    /// String values already encoded with the `Str` and `Strs` variants
    /// are provided as is, with multiple values joined by a backslash.
    /// Other values are formatted with their `Display` representation.
    pub fn to_str(&self) -> Cow<str> {
        use self::PrimitiveValue::*;
        match self {
            Empty => Cow::from(""),
            Str(s) => Cow::from(s.as_str()),
            Strs(c) if c.len() == 1 => Cow::from(c[0].as_str()),
            Strs(c) => Cow::from(c.iter().join("\\")),
            Tags(c) => Cow::from(c.iter().join("\\")),
            U8(c) => Cow::from(c.iter().join("\\")),
            I16(c) => Cow::from(c.iter().join("\\")),
            U16(c) => Cow::from(c.iter().join("\\")),
            I32(c) => Cow::from(c.iter().join("\\")),
            U32(c) => Cow::from(c.iter().join("\\")),
            I64(c) => Cow::from(c.iter().join("\\")),
            U64(c) => Cow::from(c.iter().join("\\")),
            F32(c) => Cow::from(c.iter().join("\\")),
            F64(c) => Cow::from(c.iter().join("\\")),
        }
    }

    /// Parse a primitive value from its textual form,
    /// following the rules of the value representation's category.
    ///
    /// Multi-valued text and numbers are separated by a backslash.
    /// Attribute tags are written as `(gggg,eeee)` or `ggggeeee`.
    /// An empty text produces an empty value.
    pub fn parse_from_str(vr: VR, text: &str) -> Result<Self, ParseValueError> {
        if text.is_empty() {
            return Ok(PrimitiveValue::Empty);
        }
        match vr.category() {
            VrCategory::StringMultiValued | VrCategory::PersonName => Ok(PrimitiveValue::Strs(
                text.split('\\').map(str::to_owned).collect(),
            )),
            VrCategory::StringSingleValued => Ok(PrimitiveValue::Str(text.to_owned())),
            VrCategory::SignedInt16 => parse_numbers(vr, text).map(PrimitiveValue::I16),
            VrCategory::UnsignedInt16 => parse_numbers(vr, text).map(PrimitiveValue::U16),
            VrCategory::SignedInt32 => parse_numbers(vr, text).map(PrimitiveValue::I32),
            VrCategory::UnsignedInt32 => parse_numbers(vr, text).map(PrimitiveValue::U32),
            VrCategory::SignedInt64 => parse_numbers(vr, text).map(PrimitiveValue::I64),
            VrCategory::UnsignedInt64 => parse_numbers(vr, text).map(PrimitiveValue::U64),
            VrCategory::Float32 => parse_numbers(vr, text).map(PrimitiveValue::F32),
            VrCategory::Float64 => parse_numbers(vr, text).map(PrimitiveValue::F64),
            VrCategory::AttributeTag => text
                .split('\\')
                .map(parse_tag)
                .collect::<Result<C<_>, _>>()
                .map(PrimitiveValue::Tags),
            VrCategory::Binary { word_size: 2 } => {
                parse_numbers(vr, text).map(PrimitiveValue::U16)
            }
            VrCategory::Binary { word_size: 4 } if vr == VR::OF => {
                parse_numbers(vr, text).map(PrimitiveValue::F32)
            }
            VrCategory::Binary { word_size: 4 } => {
                parse_numbers(vr, text).map(PrimitiveValue::U32)
            }
            VrCategory::Binary { word_size: 8 } if vr == VR::OD => {
                parse_numbers(vr, text).map(PrimitiveValue::F64)
            }
            VrCategory::Binary { word_size: 8 } => {
                parse_numbers(vr, text).map(PrimitiveValue::U64)
            }
            VrCategory::Binary { .. } | VrCategory::Unknown => {
                parse_numbers(vr, text).map(PrimitiveValue::U8)
            }
            VrCategory::Sequence => NotPrimitiveSnafu { vr }.fail(),
        }
    }

    /// Check whether this value can be held by an element
    /// of the given value representation.
    pub fn is_compatible_with(&self, vr: VR) -> bool {
        use self::PrimitiveValue::*;
        match self {
            Empty => true,
            Strs(_) | Str(_) => vr.is_text(),
            Tags(_) => vr == VR::AT,
            U8(_) => matches!(vr, VR::OB | VR::UN),
            I16(_) => vr == VR::SS,
            U16(_) => matches!(vr, VR::US | VR::OW | VR::UN),
            I32(_) => vr == VR::SL,
            U32(_) => matches!(vr, VR::UL | VR::OL),
            I64(_) => vr == VR::SV,
            U64(_) => matches!(vr, VR::UV | VR::OV),
            F32(_) => matches!(vr, VR::FL | VR::OF),
            F64(_) => matches!(vr, VR::FD | VR::OD),
        }
    }
}

fn parse_numbers<T>(vr: VR, text: &str) -> Result<C<T>, ParseValueError>
where
    T: FromStr,
{
    text.split('\\')
        .map(|part| {
            let part = part.trim();
            part.parse::<T>().ok().context(ParseNumberSnafu { text: part, vr })
        })
        .collect()
}

fn parse_tag(text: &str) -> Result<Tag, ParseValueError> {
    let digits: String = text
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | ',' | ' '))
        .collect();
    if digits.len() != 8 {
        return ParseTagSnafu { text }.fail();
    }
    u32::from_str_radix(&digits, 16)
        .map(Tag::from)
        .ok()
        .context(ParseTagSnafu { text })
}

/// Macro for implementing getters to single and multi-values of each variant.
///
/// Should be placed inside `PrimitiveValue`'s impl block.
macro_rules! impl_primitive_getters {
    ($name_single: ident, $name_multi: ident, $variant: ident, $ret: ty) => {
        /// Get a single value of the requested type.
        /// If it contains multiple values,
        /// only the first one is returned.
        /// An error is returned if the variant is not compatible.
        pub fn $name_single(&self) -> Result<$ret, CastValueError> {
            match self {
                PrimitiveValue::$variant(c) if c.is_empty() => Err(CastValueError {
                    requested: stringify!($name_single),
                    got: ValueType::Empty,
                }),
                PrimitiveValue::$variant(c) => Ok(c[0]),
                value => Err(CastValueError {
                    requested: stringify!($name_single),
                    got: value.value_type(),
                }),
            }
        }

        /// Get a sequence of values of the requested type without copying.
        /// An error is returned if the variant is not compatible.
        pub fn $name_multi(&self) -> Result<&[$ret], CastValueError> {
            match self {
                PrimitiveValue::$variant(c) => Ok(c),
                value => Err(CastValueError {
                    requested: stringify!($name_multi),
                    got: value.value_type(),
                }),
            }
        }
    };
}

/// Per variant, strongly checked getters to DICOM values.
///
/// Conversions from one representation to another do not take place
/// when using these methods.
impl PrimitiveValue {
    /// Get a single string value. If it contains multiple strings,
    /// only the first one is returned.
    /// An error is returned if the variant is not compatible.
    pub fn string(&self) -> Result<&str, CastValueError> {
        use self::PrimitiveValue::*;
        match self {
            Strs(c) if c.is_empty() => Err(CastValueError {
                requested: "Str",
                got: ValueType::Empty,
            }),
            Strs(c) => Ok(&c[0]),
            Str(s) => Ok(s),
            value => Err(CastValueError {
                requested: "Str",
                got: value.value_type(),
            }),
        }
    }

    /// Get the inner sequence of string values
    /// if the variant is either `Str` or `Strs`.
    /// An error is returned if the variant is not compatible.
    pub fn strings(&self) -> Result<&[String], CastValueError> {
        use self::PrimitiveValue::*;
        match self {
            Strs(c) => Ok(c),
            Str(s) => Ok(std::slice::from_ref(s)),
            value => Err(CastValueError {
                requested: "strings",
                got: value.value_type(),
            }),
        }
    }

    impl_primitive_getters!(tag, tags, Tags, Tag);
    impl_primitive_getters!(uint8, uint8_slice, U8, u8);
    impl_primitive_getters!(int16, int16_slice, I16, i16);
    impl_primitive_getters!(uint16, uint16_slice, U16, u16);
    impl_primitive_getters!(int32, int32_slice, I32, i32);
    impl_primitive_getters!(uint32, uint32_slice, U32, u32);
    impl_primitive_getters!(int64, int64_slice, I64, i64);
    impl_primitive_getters!(uint64, uint64_slice, U64, u64);
    impl_primitive_getters!(float32, float32_slice, F32, f32);
    impl_primitive_getters!(float64, float64_slice, F64, f64);
}

/// A sequence of encapsulated pixel data fragments.
///
/// The first item of the encoded sequence is interpreted as a basic offset table,
/// which is kept separately from the fragments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PixelFragmentSequence {
    offset_table: C<u32>,
    fragments: C<Vec<u8>>,
}

impl PixelFragmentSequence {
    /// Construct a pixel sequence from a basic offset table and a list of fragments.
    ///
    /// The offset table is not validated against the fragments.
    pub fn new(offset_table: impl Into<C<u32>>, fragments: impl Into<C<Vec<u8>>>) -> Self {
        PixelFragmentSequence {
            offset_table: offset_table.into(),
            fragments: fragments.into(),
        }
    }

    /// Gets a reference to the basic offset table.
    pub fn offset_table(&self) -> &[u32] {
        &self.offset_table
    }

    /// Gets a reference to the pixel data fragments,
    /// not including the offset table.
    pub fn fragments(&self) -> &[Vec<u8>] {
        &self.fragments
    }

    /// Gets a mutable reference to the pixel data fragments.
    pub fn fragments_mut(&mut self) -> &mut C<Vec<u8>> {
        &mut self.fragments
    }

    /// Decompose into the offset table and the fragments.
    pub fn into_parts(self) -> (C<u32>, C<Vec<u8>>) {
        (self.offset_table, self.fragments)
    }
}

/// A reference to bulk data which is kept outside of the object in memory.
///
/// The URI has the form `<locator>#offset=<uint>&length=<int>`,
/// where a length of `-1` means that the data extends until
/// an undefined-length terminator (encapsulated pixel data).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BulkDataRef {
    uri: String,
    uuid: Option<String>,
    big_endian: bool,
}

impl BulkDataRef {
    /// Create a reference from an existing URI.
    pub fn new(uri: impl Into<String>) -> Self {
        BulkDataRef {
            uri: uri.into(),
            uuid: None,
            big_endian: false,
        }
    }

    /// Create a reference to a byte range of the resource at `locator`.
    /// `None` for the length denotes an undefined length.
    pub fn from_range(locator: &str, offset: u64, length: Option<u32>) -> Self {
        let length = length.map(i64::from).unwrap_or(-1);
        BulkDataRef::new(format!(
            "{}#offset={}&length={}",
            locator, offset, length
        ))
    }

    /// Set the unique identifier of the bulk data.
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Declare whether the referenced bytes are in big endian byte order.
    pub fn with_big_endian(mut self, big_endian: bool) -> Self {
        self.big_endian = big_endian;
        self
    }

    /// The full URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The unique identifier, if any.
    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    /// Whether the referenced bytes are in big endian byte order.
    pub fn big_endian(&self) -> bool {
        self.big_endian
    }

    /// The resource part of the URI, without the fragment.
    pub fn locator(&self) -> &str {
        match self.uri.find('#') {
            Some(i) => &self.uri[..i],
            None => &self.uri,
        }
    }

    fn fragment_param(&self, key: &str) -> Option<&str> {
        let (_, fragment) = self.uri.split_once('#')?;
        fragment.split('&').find_map(|kv| {
            let (k, v) = kv.split_once('=')?;
            if k == key {
                Some(v)
            } else {
                None
            }
        })
    }

    /// The byte offset into the resource, if specified.
    pub fn offset(&self) -> Option<u64> {
        self.fragment_param("offset")?.parse().ok()
    }

    /// The byte length of the referenced range.
    /// `Some(Length::UNDEFINED)` stands for a length of `-1`.
    pub fn length(&self) -> Option<Length> {
        let len: i64 = self.fragment_param("length")?.parse().ok()?;
        match len {
            -1 => Some(Length::UNDEFINED),
            l => u32::try_from(l).ok().map(Length),
        }
    }
}

impl fmt::Display for BulkDataRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Representation of a full DICOM value, which may be primitive,
/// a sequence of items, an encapsulated pixel data sequence,
/// or a reference to bulk data.
///
/// `I` is the item type of sequences.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<I> {
    /// Primitive value.
    Primitive(PrimitiveValue),
    /// A complex sequence of items.
    Sequence(Vec<I>),
    /// An encapsulated pixel data sequence.
    PixelSequence(PixelFragmentSequence),
    /// Bulk data kept outside of memory.
    BulkData(BulkDataRef),
}

impl<I> From<PrimitiveValue> for Value<I> {
    fn from(v: PrimitiveValue) -> Self {
        Value::Primitive(v)
    }
}

impl<I> From<&str> for Value<I> {
    fn from(v: &str) -> Self {
        Value::Primitive(v.into())
    }
}

impl<I> From<String> for Value<I> {
    fn from(v: String) -> Self {
        Value::Primitive(v.into())
    }
}

impl<I> From<PixelFragmentSequence> for Value<I> {
    fn from(v: PixelFragmentSequence) -> Self {
        Value::PixelSequence(v)
    }
}

impl<I> From<BulkDataRef> for Value<I> {
    fn from(v: BulkDataRef) -> Self {
        Value::BulkData(v)
    }
}

impl<I> From<Vec<I>> for Value<I> {
    fn from(v: Vec<I>) -> Self {
        Value::Sequence(v)
    }
}

impl<I> Value<I> {
    /// The value type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Primitive(v) => v.value_type(),
            Value::Sequence(_) => ValueType::Item,
            Value::PixelSequence(_) => ValueType::PixelSequence,
            Value::BulkData(_) => ValueType::BulkData,
        }
    }

    /// The length of the value as it would appear in an element header
    /// before encoding, considering the value representation's padding.
    ///
    /// Sequences are of undefined length at this level.
    pub fn length(&self, vr: VR) -> Length {
        match self {
            Value::Primitive(v) => {
                let len = v.calculate_byte_len() as u32;
                if vr.is_text() || vr == VR::OB || vr == VR::UN {
                    Length(len + (len & 1))
                } else {
                    Length(len)
                }
            }
            Value::Sequence(_) | Value::PixelSequence(_) => Length::UNDEFINED,
            Value::BulkData(b) => b.length().unwrap_or(Length::UNDEFINED),
        }
    }

    /// Check whether this kind of payload is legal
    /// for an element of the given value representation.
    ///
    /// An empty primitive value is legal for any VR.
    pub fn is_compatible_with(&self, vr: VR) -> bool {
        match self {
            Value::Primitive(v) => v.is_compatible_with(vr),
            Value::Sequence(_) => matches!(vr, VR::SQ | VR::UN),
            Value::PixelSequence(_) => matches!(vr, VR::OB | VR::OW | VR::UN),
            Value::BulkData(_) => vr != VR::SQ,
        }
    }

    /// Get the primitive value, if it is one.
    pub fn primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Value::Primitive(v) => Some(v),
            _ => None,
        }
    }

    /// Get the items of a sequence value.
    pub fn items(&self) -> Option<&[I]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Get the items of a sequence value, mutably.
    pub fn items_mut(&mut self) -> Option<&mut Vec<I>> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Get the pixel fragment sequence, if it is one.
    pub fn fragments(&self) -> Option<&PixelFragmentSequence> {
        match self {
            Value::PixelSequence(f) => Some(f),
            _ => None,
        }
    }

    fn primitive_or_fail(&self, requested: &'static str) -> Result<&PrimitiveValue, CastValueError> {
        self.primitive().ok_or_else(|| CastValueError {
            requested,
            got: self.value_type(),
        })
    }

    /// Convert the primitive value into a string,
    /// multiple values joined with a backslash.
    pub fn to_str(&self) -> Result<Cow<str>, CastValueError> {
        Ok(self.primitive_or_fail("string")?.to_str())
    }

    /// Get the first string of a primitive value.
    pub fn string(&self) -> Result<&str, CastValueError> {
        self.primitive_or_fail("Str")?.string()
    }

    /// Get all strings of a primitive value.
    pub fn strings(&self) -> Result<&[String], CastValueError> {
        self.primitive_or_fail("strings")?.strings()
    }

    /// Get the first unsigned 16-bit integer of a primitive value.
    pub fn uint16(&self) -> Result<u16, CastValueError> {
        self.primitive_or_fail("uint16")?.uint16()
    }

    /// Get the first unsigned 32-bit integer of a primitive value.
    pub fn uint32(&self) -> Result<u32, CastValueError> {
        self.primitive_or_fail("uint32")?.uint32()
    }

    /// Get the bytes of an `OB` or `UN` primitive value.
    pub fn uint8_slice(&self) -> Result<&[u8], CastValueError> {
        self.primitive_or_fail("uint8_slice")?.uint8_slice()
    }
}

/// Error returned when parsing a bulk data URI which lacks a locator.
#[derive(Debug, Snafu)]
#[snafu(display("Bulk data URI `{}` has no offset", uri))]
pub struct MissingOffsetError {
    uri: String,
    backtrace: Backtrace,
}

impl FromStr for BulkDataRef {
    type Err = MissingOffsetError;

    /// Parse a bulk data URI, requiring an `offset` parameter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let r = BulkDataRef::new(s);
        r.offset().context(MissingOffsetSnafu { uri: s })?;
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dicom_value;

    #[test]
    fn primitive_to_str() {
        assert_eq!(dicom_value!(U16, [256, 0, 16]).to_str(), "256\\0\\16");
        assert_eq!(dicom_value!(Strs, ["A", "B"]).to_str(), "A\\B");
        assert_eq!(PrimitiveValue::Empty.to_str(), "");
        assert_eq!(dicom_value!(Tags, [Tag(0x0010, 0x0020)]).to_str(), "(0010,0020)");
    }

    #[test]
    fn parse_by_category() {
        assert_eq!(
            PrimitiveValue::parse_from_str(VR::CS, "ORIGINAL\\PRIMARY").unwrap(),
            dicom_value!(Strs, ["ORIGINAL", "PRIMARY"])
        );
        assert_eq!(
            PrimitiveValue::parse_from_str(VR::LT, "a\\b").unwrap(),
            dicom_value!(Str, "a\\b")
        );
        assert_eq!(
            PrimitiveValue::parse_from_str(VR::US, "512\\1").unwrap(),
            dicom_value!(U16, [512, 1])
        );
        assert_eq!(
            PrimitiveValue::parse_from_str(VR::FD, "0.5").unwrap(),
            dicom_value!(F64, [0.5])
        );
        assert_eq!(
            PrimitiveValue::parse_from_str(VR::AT, "(0020,000D)\\00100010").unwrap(),
            dicom_value!(Tags, [Tag(0x0020, 0x000D), Tag(0x0010, 0x0010)])
        );
        assert!(PrimitiveValue::parse_from_str(VR::US, "abc").is_err());
        assert!(PrimitiveValue::parse_from_str(VR::SQ, "x").is_err());
        assert_eq!(
            PrimitiveValue::parse_from_str(VR::US, "").unwrap(),
            PrimitiveValue::Empty
        );
    }

    #[test]
    fn getters() {
        let v = dicom_value!(U32, [7, 8]);
        assert_eq!(v.uint32().unwrap(), 7);
        assert_eq!(v.uint32_slice().unwrap(), &[7, 8]);
        let err = v.string().unwrap_err();
        assert_eq!(err.got, ValueType::U32);
    }

    #[test]
    fn value_compatibility() {
        let v: Value<()> = dicom_value!(U16, [1]).into();
        assert!(v.is_compatible_with(VR::US));
        assert!(v.is_compatible_with(VR::OW));
        assert!(!v.is_compatible_with(VR::UL));
        let empty: Value<()> = PrimitiveValue::Empty.into();
        assert!(empty.is_compatible_with(VR::FD));
        let seq: Value<()> = Value::Sequence(vec![]);
        assert!(seq.is_compatible_with(VR::SQ));
        assert!(!seq.is_compatible_with(VR::LO));
    }

    #[test]
    fn value_length_pads_text() {
        let v: Value<()> = dicom_value!(Strs, ["ABC"]).into();
        assert_eq!(v.length(VR::CS), Length(4));
        let v: Value<()> = dicom_value!(U16, [1, 2, 3]).into();
        assert_eq!(v.length(VR::US), Length(6));
    }

    #[test]
    fn bulk_data_uri() {
        let b = BulkDataRef::from_range("file:///tmp/x.dcm", 1024, Some(512));
        assert_eq!(b.uri(), "file:///tmp/x.dcm#offset=1024&length=512");
        assert_eq!(b.locator(), "file:///tmp/x.dcm");
        assert_eq!(b.offset(), Some(1024));
        assert_eq!(b.length(), Some(Length(512)));

        let b = BulkDataRef::from_range("spool.blk", 0, None);
        assert_eq!(b.uri(), "spool.blk#offset=0&length=-1");
        assert!(b.length().unwrap().is_undefined());

        assert!("abc".parse::<BulkDataRef>().is_err());
        assert!("abc#offset=4&length=2".parse::<BulkDataRef>().is_ok());
    }
}
