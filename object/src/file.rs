//! Opening DICOM files.
use crate::mem::InMemDicomObject;
use crate::read::{DicomReader, ReadPreamble};
use crate::{FileDicomObject, OpenFileSnafu, ReadError};
use dcmcodec_core::DataDictionary;
use dcmcodec_dictionary::StandardDataDictionary;
use snafu::ResultExt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

pub type Result<T, E = ReadError> = std::result::Result<T, E>;

/// Create a DICOM object by reading from a byte source.
///
/// The source is expected to start with the file meta group,
/// preceded by the magic code and possibly by the preamble.
pub fn from_reader<F>(file: F) -> Result<FileDicomObject<InMemDicomObject>>
where
    F: Read,
{
    OpenFileOptions::new().from_reader(file)
}

/// Create a DICOM object by reading from a file.
///
/// The file is expected to have the standard file encoding structure:
/// 128-byte preamble, file meta group, and the rest of the data set.
pub fn open_file<P>(path: P) -> Result<FileDicomObject<InMemDicomObject>>
where
    P: AsRef<Path>,
{
    OpenFileOptions::new().open_file(path)
}

/// A builder type for opening a DICOM file with additional options.
///
/// # Example
///
/// Create a `OpenFileOptions`,
/// call adaptor methods in a chain,
/// and finish the operation with [`.open_file()`](OpenFileOptions::open_file).
///
/// ```no_run
/// # use dcmcodec_object::OpenFileOptions;
/// let file = OpenFileOptions::new()
///     .lazy(true)
///     .bulk_data_uri(true)
///     .open_file("path/to/file.dcm")?;
/// # Result::<(), Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Default, Clone)]
#[non_exhaustive]
pub struct OpenFileOptions<D = StandardDataDictionary> {
    data_dictionary: D,
    read_preamble: ReadPreamble,
    lazy: bool,
    bulk_data_uri: bool,
}

impl OpenFileOptions {
    pub fn new() -> Self {
        OpenFileOptions::default()
    }
}

impl<D> OpenFileOptions<D> {
    /// Set whether to read the 128-byte DICOM file preamble.
    pub fn read_preamble(mut self, option: ReadPreamble) -> Self {
        self.read_preamble = option;
        self
    }

    /// Set whether sequence items are decoded on first access.
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Set whether bulk data is left in the file,
    /// referenced by its position in it.
    ///
    /// Only applies when opening a file by path.
    pub fn bulk_data_uri(mut self, bulk_data_uri: bool) -> Self {
        self.bulk_data_uri = bulk_data_uri;
        self
    }

    /// Set the data element dictionary to use when reading the file.
    pub fn dictionary<Di>(self, dict: Di) -> OpenFileOptions<Di>
    where
        Di: DataDictionary,
        Di: Clone,
    {
        OpenFileOptions {
            data_dictionary: dict,
            read_preamble: self.read_preamble,
            lazy: self.lazy,
            bulk_data_uri: self.bulk_data_uri,
        }
    }

    /// Open the file at the given path.
    pub fn open_file<P>(self, path: P) -> Result<FileDicomObject<InMemDicomObject<D>>>
    where
        P: AsRef<Path>,
        D: DataDictionary,
        D: Clone,
    {
        let path = path.as_ref();
        let file = File::open(path).context(OpenFileSnafu { filename: path })?;
        let locator = if self.bulk_data_uri {
            Some(path.to_string_lossy().into_owned())
        } else {
            None
        };
        self.read(BufReader::new(file), locator)
    }

    /// Obtain a DICOM object by reading from a byte source.
    pub fn from_reader<R>(self, from: R) -> Result<FileDicomObject<InMemDicomObject<D>>>
    where
        R: Read,
        D: DataDictionary,
        D: Clone,
    {
        self.read(BufReader::new(from), None)
    }

    fn read<S>(
        self,
        source: S,
        locator: Option<String>,
    ) -> Result<FileDicomObject<InMemDicomObject<D>>>
    where
        S: BufRead,
        D: DataDictionary,
        D: Clone,
    {
        let mut reader = DicomReader::new(source)
            .with_dictionary(self.data_dictionary)
            .with_read_preamble(self.read_preamble)
            .with_lazy(self.lazy);
        if let Some(locator) = locator {
            reader = reader.with_bulk_data_uri(locator);
        }
        let meta = reader.read_file_meta_information()?;
        let obj = reader.read_data_set()?;
        Ok(FileDicomObject::new(meta, obj))
    }
}
