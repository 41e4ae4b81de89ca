//! Stateful decoding and encoding of DICOM content.
//!
//! Unlike the header decoders and encoders of `dcmcodec-encoding`,
//! the types in this module know how to read and write whole values,
//! keep track of the stream position,
//! and follow the character set in effect.

pub mod decode;
pub mod encode;

pub use self::decode::StatefulDecoder;
pub use self::encode::StatefulEncoder;
