//! Reading DICOM files and raw data sets into in-memory objects.
//!
//! A [`DicomReader`] wraps a byte stream
//! and carries the options of the whole reading process:
//! how to handle the preamble,
//! which elements are bulk data and what to do with them,
//! and whether sequence items are decoded lazily.
use crate::mem::InMemDicomObject;
use crate::meta::FileMetaTable;
use crate::{
    ParseMetaDataSetSnafu, PeekDataSetSnafu, ReadError, ReadPreambleBytesSnafu,
    UndetectedTransferSyntaxSnafu,
};
use dcmcodec_core::DataDictionary;
use dcmcodec_dictionary::StandardDataDictionary;
use dcmcodec_encoding::text::SpecificCharacterSet;
use dcmcodec_encoding::TransferSyntax;
use dcmcodec_parser::bulkdata::{self, BulkDataCandidate, BulkDataPolicy};
use dcmcodec_parser::{CachedSource, DataSetReader, DataSetReaderOptions, StatefulDecoder};
use snafu::{OptionExt, ResultExt};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

pub type Result<T, E = ReadError> = std::result::Result<T, E>;

/// The size of the file preamble, in bytes.
pub const PREAMBLE_LEN: usize = 128;

/// An enumerate of supported options for
/// whether to read the 128-byte DICOM file preamble.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ReadPreamble {
    /// Detect the preamble by looking for the magic code right after it.
    #[default]
    Auto,
    /// Never read the preamble,
    /// thus assuming that the original source does not have it.
    Never,
    /// Always read the preamble first,
    /// thus assuming that the original source always has it.
    Always,
}

/// A reader of DICOM files and raw data sets.
///
/// # Example
///
/// ```no_run
/// # use dcmcodec_object::read::DicomReader;
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let file = std::io::BufReader::new(std::fs::File::open("0001.dcm")?);
/// let mut reader = DicomReader::new(file)
///     .with_bulk_data_uri("0001.dcm")
///     .with_lazy(true);
/// let meta = reader.read_file_meta_information()?;
/// let obj = reader.read_data_set()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DicomReader<S, D = StandardDataDictionary> {
    source: CachedSource<S>,
    dict: D,
    options: DataSetReaderOptions,
    read_preamble: ReadPreamble,
    ts: Option<&'static TransferSyntax>,
}

impl<S> DicomReader<S>
where
    S: BufRead,
{
    /// Create a reader over the given source,
    /// with the standard data dictionary.
    pub fn new(source: S) -> Self {
        DicomReader {
            source: CachedSource::new(source),
            dict: StandardDataDictionary,
            options: DataSetReaderOptions::default(),
            read_preamble: ReadPreamble::Auto,
            ts: None,
        }
    }
}

impl<S, D> DicomReader<S, D>
where
    S: BufRead,
    D: DataDictionary + Clone,
{
    /// Use another data dictionary for resolving
    /// the value representations of implicit VR data sets.
    pub fn with_dictionary<D2>(self, dict: D2) -> DicomReader<S, D2> {
        DicomReader {
            source: self.source,
            dict,
            options: self.options,
            read_preamble: self.read_preamble,
            ts: self.ts,
        }
    }

    /// Decide which elements are bulk data.
    pub fn with_bulk_data<F>(mut self, pred: F) -> Self
    where
        F: Fn(&BulkDataCandidate) -> bool + Send + Sync + 'static,
    {
        self.options = self.options.bulk_data_predicate(bulkdata::predicate(pred));
        self
    }

    /// Keep bulk data out of memory,
    /// referencing it by its position in the source,
    /// which is identified by `locator`.
    pub fn with_bulk_data_uri(mut self, locator: impl Into<String>) -> Self {
        self.options = self
            .options
            .bulk_data_policy(Some(BulkDataPolicy::Uri {
                locator: locator.into(),
            }));
        self
    }

    /// Copy bulk data to a spool file provided by `supplier`,
    /// referencing it by its position in that file.
    pub fn spool_bulk_data_to<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> io::Result<PathBuf> + Send + Sync + 'static,
    {
        self.options = self
            .options
            .bulk_data_policy(Some(BulkDataPolicy::Spool {
                supplier: Arc::new(supplier),
            }));
        self
    }

    /// Drop the values of bulk data elements.
    pub fn suppress_bulk_data(mut self) -> Self {
        self.options = self
            .options
            .bulk_data_policy(Some(BulkDataPolicy::Suppress));
        self
    }

    /// Whether to keep sequence items undecoded until first accessed.
    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.options = self.options.lazy_items(lazy);
        self
    }

    /// Read a raw data set in the given transfer syntax,
    /// without file meta information.
    pub fn with_transfer_syntax(mut self, ts: &'static TransferSyntax) -> Self {
        self.ts = Some(ts);
        self
    }

    /// Set how the file preamble is handled.
    pub fn with_read_preamble(mut self, option: ReadPreamble) -> Self {
        self.read_preamble = option;
        self
    }

    /// The transfer syntax of the data set,
    /// if already known.
    pub fn transfer_syntax(&self) -> Option<&'static TransferSyntax> {
        self.ts
    }

    /// Read the file meta group,
    /// preceded by the preamble (if applicable) and the magic code.
    ///
    /// The transfer syntax declared in the table
    /// is used for the data set which follows,
    /// and deflated data sets are inflated from this point on.
    pub fn read_file_meta_information(&mut self) -> Result<FileMetaTable> {
        if self.has_preamble()? {
            self.source
                .skip(PREAMBLE_LEN as u64)
                .context(ReadPreambleBytesSnafu)?;
        }

        let meta = FileMetaTable::from_reader(&mut self.source).context(ParseMetaDataSetSnafu)?;
        let ts = TransferSyntax::from_uid(&meta.transfer_syntax);
        tracing::debug!(
            "Data set at position {} is in {}",
            self.source.position(),
            ts.name()
        );
        self.ts = Some(ts);
        if ts.is_deflated() {
            self.source.inflate();
        }
        Ok(meta)
    }

    /// Read the data set until the end of the source.
    ///
    /// Without file meta information or a given transfer syntax,
    /// the transfer syntax is detected from the first element header.
    pub fn read_data_set(mut self) -> Result<InMemDicomObject<D>> {
        let ts = match self.ts {
            Some(ts) => ts,
            None => {
                let bytes = self.source.peek(8).context(PeekDataSetSnafu)?;
                let ts = bytes
                    .and_then(TransferSyntax::detect)
                    .context(UndetectedTransferSyntaxSnafu)?;
                tracing::debug!("Detected transfer syntax {}", ts.name());
                ts
            }
        };
        if ts.is_deflated() && !self.source.is_inflated() {
            self.source.inflate();
        }

        let decoder = StatefulDecoder::new(
            self.source,
            ts,
            self.dict.clone(),
            SpecificCharacterSet::default(),
        );
        let mut reader = DataSetReader::new(decoder, self.options);
        InMemDicomObject::read_from(&mut reader, self.dict, ts)
    }

    fn has_preamble(&mut self) -> Result<bool> {
        match self.read_preamble {
            ReadPreamble::Always => Ok(true),
            ReadPreamble::Never => Ok(false),
            ReadPreamble::Auto => {
                let bytes = self
                    .source
                    .peek(PREAMBLE_LEN + 4)
                    .context(ReadPreambleBytesSnafu)?;
                Ok(matches!(bytes, Some(b) if &b[PREAMBLE_LEN..] == b"DICM"))
            }
        }
    }
}
