#![allow(clippy::derive_partial_eq_without_eq)]
//! This crate works on top of the encoding primitives
//! to read and write DICOM data sets at a middle level of abstraction.
//!
//! - The [`cache`] module holds the byte source of the readers:
//!   a buffered stream which tracks its absolute position,
//!   can keep a window of bytes for look-ahead and lazy reading,
//!   and can switch to inflating deflated content.
//! - The [`stateful`] module contains a stateful decoder and encoder,
//!   which read and write headers and values
//!   in a transfer syntax and specific character set
//!   that can change along the way.
//! - In [`dataset`], data sets are interpreted
//!   as streams of [tokens](dataset::DataToken),
//!   through the [`DataSetReader`] and the [`DataSetWriter`].
//! - The [`bulkdata`] module decides which values are bulk data
//!   and what to do with them while reading.
//!
//! For the time being, all APIs are based on synchronous I/O.

pub mod bulkdata;
pub mod cache;
pub mod dataset;
pub mod stateful;

pub use bulkdata::{BulkDataCandidate, BulkDataPolicy, BulkDataPredicate};
pub use cache::{CachedSource, MemoryCache};
pub use dataset::{DataSetReader, DataSetReaderOptions, DataSetWriter, DataToken};
pub use stateful::{StatefulDecoder, StatefulEncoder};
