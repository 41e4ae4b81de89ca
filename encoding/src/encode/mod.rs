//! This module contains all DICOM data element header encoding logic.
//!
//! Values are encoded with the [`BasicEncoder`],
//! which writes binary numbers in the chosen byte order.

use crate::transfer_syntax::TransferSyntax;
use byteordered::Endianness;
use dcmcodec_core::header::{DataElementHeader, Length, Tag, VR};
use snafu::{Backtrace, Snafu};
use std::io::{self, Write};

pub mod basic;
pub mod explicit;
pub mod implicit;

pub use self::basic::BasicEncoder;
pub use self::explicit::ExplicitVREncoder;
pub use self::implicit::ImplicitVREncoder;

/// Module-level error type:
/// for errors which may occur while encoding DICOM data.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Failed to write tag"))]
    WriteTag {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write value representation"))]
    WriteVr {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write reserved bytes"))]
    WriteReserved {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write element length"))]
    WriteLength {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write item header"))]
    WriteItemHeader {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write item delimiter"))]
    WriteItemDelimiter {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write sequence delimiter"))]
    WriteSequenceDelimiter {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Length {} of element {} does not fit in the 16-bit length field of {}", len, tag, vr))]
    LengthOverflow {
        tag: Tag,
        vr: VR,
        len: Length,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Type trait for a data element header encoder.
pub trait Encode {
    /// Encode and write an element tag.
    fn encode_tag<W>(&self, to: W, tag: Tag) -> Result<()>
    where
        W: Write;

    /// Encode and write a data element header to the given destination.
    /// Returns the number of bytes effectively written on success.
    fn encode_element_header<W>(&self, to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write;

    /// Encode and write a DICOM sequence item header to the given destination.
    fn encode_item_header<W>(&self, to: W, len: u32) -> Result<()>
    where
        W: Write;

    /// Encode and write a DICOM sequence item delimiter to the given destination.
    fn encode_item_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write;

    /// Encode and write a DICOM sequence delimiter to the given destination.
    fn encode_sequence_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write;

    /// The number of bytes taken by the header of an element
    /// with the given value representation.
    fn header_len(&self, vr: VR) -> u32;
}

/// A header encoder chosen at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynEncoder {
    /// explicit VR, either byte order
    Explicit(ExplicitVREncoder),
    /// implicit VR, either byte order
    Implicit(ImplicitVREncoder),
}

impl DynEncoder {
    /// Create the header encoder for the given transfer syntax.
    pub fn for_transfer_syntax(ts: &TransferSyntax) -> Self {
        if ts.is_explicit_vr() {
            DynEncoder::Explicit(ExplicitVREncoder::new(ts.endianness()))
        } else {
            DynEncoder::Implicit(ImplicitVREncoder::new(ts.endianness()))
        }
    }

    /// The header encoder for explicit VR little endian.
    pub fn explicit_vr_le() -> Self {
        DynEncoder::Explicit(ExplicitVREncoder::new(Endianness::Little))
    }

    /// The header encoder for implicit VR little endian.
    pub fn implicit_vr_le() -> Self {
        DynEncoder::Implicit(ImplicitVREncoder::new(Endianness::Little))
    }

    /// Whether this encoder writes explicit value representations.
    pub fn is_explicit_vr(&self) -> bool {
        matches!(self, DynEncoder::Explicit(_))
    }

    /// The byte order of the output.
    pub fn endianness(&self) -> Endianness {
        match self {
            DynEncoder::Explicit(e) => e.endianness(),
            DynEncoder::Implicit(e) => e.endianness(),
        }
    }

    /// The basic value encoder in the same byte order.
    pub fn basic(&self) -> BasicEncoder {
        BasicEncoder::new(self.endianness())
    }
}

impl Encode for DynEncoder {
    fn encode_tag<W>(&self, to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        match self {
            DynEncoder::Explicit(e) => e.encode_tag(to, tag),
            DynEncoder::Implicit(e) => e.encode_tag(to, tag),
        }
    }

    fn encode_element_header<W>(&self, to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write,
    {
        match self {
            DynEncoder::Explicit(e) => e.encode_element_header(to, de),
            DynEncoder::Implicit(e) => e.encode_element_header(to, de),
        }
    }

    fn encode_item_header<W>(&self, to: W, len: u32) -> Result<()>
    where
        W: Write,
    {
        match self {
            DynEncoder::Explicit(e) => e.encode_item_header(to, len),
            DynEncoder::Implicit(e) => e.encode_item_header(to, len),
        }
    }

    fn encode_item_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write,
    {
        match self {
            DynEncoder::Explicit(e) => e.encode_item_delimiter(to),
            DynEncoder::Implicit(e) => e.encode_item_delimiter(to),
        }
    }

    fn encode_sequence_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write,
    {
        match self {
            DynEncoder::Explicit(e) => e.encode_sequence_delimiter(to),
            DynEncoder::Implicit(e) => e.encode_sequence_delimiter(to),
        }
    }

    fn header_len(&self, vr: VR) -> u32 {
        match self {
            DynEncoder::Explicit(e) => e.header_len(vr),
            DynEncoder::Implicit(e) => e.header_len(vr),
        }
    }
}

/// Write a tag and a 4-byte length,
/// as done by every item header and delimiter.
pub(crate) fn write_item_like<W>(basic: BasicEncoder, mut to: W, tag: Tag, len: u32) -> io::Result<()>
where
    W: Write,
{
    basic.encode_tag(&mut to, tag)?;
    basic.encode_ul(&mut to, len)
}
