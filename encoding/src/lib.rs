#![crate_type = "lib"]
#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]

//! DICOM encoding and decoding primitives.
//!
//! This crate provides interfaces and data structures for reading and writing
//! data in accordance to the DICOM standard at the binary level:
//!
//! - [`byte_order`] converts fixed-size byte spans to numbers and tags;
//! - [`transfer_syntax`] describes the supported transfer syntaxes;
//! - [`decode`] and [`encode`] read and write element headers;
//! - [`text`] handles the specific character sets of text values;
//! - [`deflate`] adapts streams of the deflated transfer syntax.

pub mod byte_order;
pub mod decode;
pub mod deflate;
pub mod encode;
pub mod text;
pub mod transfer_syntax;

pub use byteordered::Endianness;
pub use decode::{BasicDecoder, Decode, DynDecoder};
pub use encode::{BasicEncoder, DynEncoder, Encode};
pub use transfer_syntax::TransferSyntax;

// re-export crates that are part of the public API
pub use snafu;
