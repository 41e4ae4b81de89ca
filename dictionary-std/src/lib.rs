//! This crate implements the standard DICOM data element dictionary
//! used by the dcmcodec reader for implicit VR encodings.
//!
//! - [`data_element`]: the attribute registry and the
//!   [`StandardDataDictionary`] unit type which queries it.
//! - [`tags`]: constants mapping attribute keywords to DICOM tags.
//!
//! The registry covers the File Meta Information group, the command group,
//! and the attributes most often found in composite instances.
//! Attributes not present resolve to `UN` in implicit VR data,
//! which the codec handles without loss.
pub mod data_element;
pub mod tags;

pub use data_element::{StandardDataDictionary, StandardDataDictionaryRegistry};
