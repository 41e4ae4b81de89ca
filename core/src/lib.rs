#![crate_type = "lib"]
#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]

//! This is the core library of dcmcodec, containing the data types
//! shared by the DICOM binary reader and writer.
//!
//! - [`header`] comprises various data types for DICOM element headers,
//!   including DICOM tags, lengths, and the catalog of value representations.
//! - [`value`] holds definitions for values in DICOM elements:
//!   primitive values, sequences, pixel fragments and bulk data references.
//! - [`dictionary`] describes the behavior of DICOM data dictionaries,
//!   which translate tags to their value representation and keyword.

pub mod dictionary;
pub mod header;
pub mod value;

pub use dictionary::DataDictionary;
pub use header::{
    DataElement, DataElementHeader, HasLength, Header, JsonType, Length, SequenceItemHeader, Tag,
    VrCategory, VR,
};
pub use value::{BulkDataRef, PixelFragmentSequence, PrimitiveValue, Value as DicomValue};

// re-export crates that are part of the public API
pub use smallvec;
