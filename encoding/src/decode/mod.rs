//! This module contains all DICOM data element header decoding logic.
//!
//! Value decoding is performed at a higher level,
//! with the help of the [`BasicDecoder`] for binary numbers.

use self::explicit::ExplicitVRDecoder;
use self::implicit::ImplicitVRDecoder;
use crate::transfer_syntax::TransferSyntax;
use byteordered::Endianness;
use dcmcodec_core::dictionary::DataDictionary;
use dcmcodec_core::header::{
    DataElementHeader, InvalidValueRepresentation, SequenceItemHeader, SequenceItemHeaderError,
};
use dcmcodec_core::Tag;
use snafu::{Backtrace, Snafu};
use std::io::{self, Read};

pub mod basic;
pub mod explicit;
pub mod implicit;

pub use self::basic::BasicDecoder;

/// Module-level error type:
/// for errors which may occur while decoding DICOM data.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Failed to read the beginning (tag) of the header"))]
    ReadHeaderTag {
        backtrace: Option<Backtrace>,
        source: io::Error,
    },
    #[snafu(display("Failed to read the item header"))]
    ReadItemHeader {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's item length field"))]
    ReadItemLength {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's tag field"))]
    ReadTag {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's reserved bytes"))]
    ReadReserved {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's element length field"))]
    ReadLength {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's value representation"))]
    ReadVr {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Bad value representation in element header"))]
    BadVr {
        #[snafu(backtrace)]
        source: InvalidValueRepresentation,
    },
    #[snafu(display("Bad sequence item header"))]
    BadSequenceHeader {
        #[snafu(backtrace)]
        source: SequenceItemHeaderError,
    },
}

impl Error {
    /// Whether the error is due to the source ending
    /// before the first byte of an element header.
    ///
    /// This is how the end of a data set without delimiters is detected.
    pub fn is_eof_at_header_start(&self) -> bool {
        matches!(
            self,
            Error::ReadHeaderTag { source, .. } if source.kind() == io::ErrorKind::UnexpectedEof
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Type trait for reading and decoding DICOM data element headers.
///
/// The specific behavior of decoding, even when abstracted from the
/// original source, may depend on the transfer syntax.
pub trait Decode {
    /// Fetch and decode the next data element header from the given source.
    /// This method returns only the header of the element. At the end of this
    /// operation, the source will be pointing at the element's value data,
    /// which should be read or skipped as necessary.
    ///
    /// Decoding an item or sequence delimiter is considered valid, and so
    /// should be properly handled by the decoder. The value representation
    /// in this case should be `UN`.
    ///
    /// Returns the expected header and the exact number of bytes read
    /// from the source.
    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read;

    /// Fetch and decode the next sequence item head from the given source. It
    /// is a separate method because value representation is always implicit
    /// when reading item headers and delimiters.
    /// This method returns only the header of the item. At the end of this
    /// operation, the source will be pointing at the beginning of the item's
    /// data, which should be traversed if necessary.
    fn decode_item_header<S>(&self, source: &mut S) -> Result<SequenceItemHeader>
    where
        S: ?Sized + Read;

    /// Decode a DICOM attribute tag from the given source.
    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read;
}

/// A header decoder chosen at run time.
#[derive(Debug, Clone)]
pub enum DynDecoder<D> {
    /// explicit VR, either byte order
    Explicit(ExplicitVRDecoder),
    /// implicit VR, either byte order
    Implicit(ImplicitVRDecoder<D>),
}

impl<D> DynDecoder<D>
where
    D: DataDictionary,
{
    /// Create the header decoder for the given transfer syntax.
    /// The dictionary is only used for implicit VR transfer syntaxes.
    pub fn for_transfer_syntax(ts: &TransferSyntax, dict: D) -> Self {
        if ts.is_explicit_vr() {
            DynDecoder::Explicit(ExplicitVRDecoder::new(ts.endianness()))
        } else {
            DynDecoder::Implicit(ImplicitVRDecoder::with_dict(dict, ts.endianness()))
        }
    }

    /// The header decoder for implicit VR little endian.
    pub fn implicit_vr_le(dict: D) -> Self {
        DynDecoder::Implicit(ImplicitVRDecoder::with_dict(dict, Endianness::Little))
    }

    /// Whether this decoder expects explicit value representations.
    pub fn is_explicit_vr(&self) -> bool {
        matches!(self, DynDecoder::Explicit(_))
    }

    /// The byte order of the source.
    pub fn endianness(&self) -> Endianness {
        match self {
            DynDecoder::Explicit(d) => d.endianness(),
            DynDecoder::Implicit(d) => d.endianness(),
        }
    }
}

impl<D> Decode for DynDecoder<D>
where
    D: DataDictionary,
{
    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        match self {
            DynDecoder::Explicit(d) => d.decode_header(source),
            DynDecoder::Implicit(d) => d.decode_header(source),
        }
    }

    fn decode_item_header<S>(&self, source: &mut S) -> Result<SequenceItemHeader>
    where
        S: ?Sized + Read,
    {
        match self {
            DynDecoder::Explicit(d) => d.decode_item_header(source),
            DynDecoder::Implicit(d) => d.decode_item_header(source),
        }
    }

    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        match self {
            DynDecoder::Explicit(d) => d.decode_tag(source),
            DynDecoder::Implicit(d) => d.decode_tag(source),
        }
    }
}
