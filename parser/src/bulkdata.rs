//! Bulk data selection and placement.
//!
//! While reading a data set, each primitive element
//! (and each encapsulated pixel data element)
//! is presented to a [`BulkDataPredicate`] as a [`BulkDataCandidate`].
//! The values selected are then handled according to a [`BulkDataPolicy`]:
//! referenced in place by URI, spooled to a separate file,
//! or dropped altogether.
//!
//! Bulk data URIs take the form `<locator>#offset=<n>&length=<m>`,
//! where a length of `-1` stands for an encapsulated pixel data value
//! which extends until its sequence delimiter.

use dcmcodec_core::header::{Length, Tag, VR};
use dcmcodec_core::value::{BulkDataRef, MissingOffsetError};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Values longer than this many bytes are bulk data by default,
/// for binary value representations.
pub const DEFAULT_BULK_DATA_THRESHOLD: u32 = 64;

/// An element which may be read as bulk data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulkDataCandidate {
    pub tag: Tag,
    pub vr: VR,
    /// the value length, undefined for encapsulated pixel data
    pub len: Length,
    /// the nesting level, 0 for the root data set
    pub level: u32,
    /// whether the value is a sequence of pixel data fragments
    pub in_pixel_sequence: bool,
}

/// A function deciding which elements are bulk data.
pub type BulkDataPredicate = Arc<dyn Fn(&BulkDataCandidate) -> bool + Send + Sync>;

/// A function providing the path of a new spool file.
pub type SpoolSupplier = Arc<dyn Fn() -> io::Result<PathBuf> + Send + Sync>;

/// The default bulk data predicate.
///
/// Pixel data of the root data set (native, float and double float),
/// overlay data, curve data and waveform data are bulk data,
/// as is any other binary value longer than
/// [`DEFAULT_BULK_DATA_THRESHOLD`] bytes.
pub fn default_predicate(candidate: &BulkDataCandidate) -> bool {
    let Tag(group, element) = candidate.tag;
    match (group, element) {
        (0x7FE0, 0x0008) | (0x7FE0, 0x0009) | (0x7FE0, 0x0010) => candidate.level == 0,
        (0x5400, 0x1010) => true,
        (g, 0x3000) if g & 0xFF00 == 0x6000 || g & 0xFF00 == 0x5000 => true,
        _ => {
            matches!(
                candidate.vr,
                VR::OB | VR::OD | VR::OF | VR::OL | VR::OV | VR::OW | VR::UN
            ) && candidate
                .len
                .get()
                .map(|len| len > DEFAULT_BULK_DATA_THRESHOLD)
                .unwrap_or(false)
        }
    }
}

/// Create a shareable predicate out of a function or closure.
pub fn predicate<F>(f: F) -> BulkDataPredicate
where
    F: Fn(&BulkDataCandidate) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What to do with the values of bulk data elements.
#[derive(Clone)]
pub enum BulkDataPolicy {
    /// Skip the value and reference its place in the source
    /// through the given locator.
    Uri { locator: String },
    /// Copy the value to a spool file obtained from the supplier,
    /// and reference its place in that file.
    /// All bulk data of a data set is appended to the same spool file.
    Spool { supplier: SpoolSupplier },
    /// Skip the value, leaving the element empty.
    Suppress,
}

impl fmt::Debug for BulkDataPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulkDataPolicy::Uri { locator } => {
                f.debug_struct("Uri").field("locator", locator).finish()
            }
            BulkDataPolicy::Spool { .. } => f.write_str("Spool"),
            BulkDataPolicy::Suppress => f.write_str("Suppress"),
        }
    }
}

/// Create a reference to a byte range of the resource at `locator`.
/// A length of `None` is written as `-1`.
pub fn format_uri(locator: &str, offset: u64, length: Option<u32>) -> BulkDataRef {
    BulkDataRef::from_range(locator, offset, length)
}

/// Parse a bulk data URI, which must have an offset.
pub fn parse_uri(uri: &str) -> Result<BulkDataRef, MissingOffsetError> {
    uri.parse()
}
