#![allow(clippy::derive_partial_eq_without_eq)]
//! This crate contains a high-level abstraction for reading, manipulating
//! and writing DICOM objects.
//! At this level, objects are comparable to a dictionary of elements,
//! in which some of them can have DICOM objects themselves.
//!
//! Loading a DICOM file can be done with ease via the function [`open_file`].
//! For additional file reading options, use [`OpenFileOptions`],
//! or [`DicomReader`](read::DicomReader) for full control
//! over bulk data and lazy sequence items.
//! New DICOM instances can be built from scratch using [`InMemDicomObject`]
//! (see the [`mem`] module for more details).
//!
//! # Examples
//!
//! Read an object and fetch some attributes:
//!
//! ```no_run
//! use dcmcodec_dictionary::tags;
//! use dcmcodec_object::open_file;
//! # fn foo() -> Result<(), Box<dyn std::error::Error>> {
//! let obj = open_file("0001.dcm")?;
//!
//! let patient_name = obj.element(tags::PATIENT_NAME)?.to_str()?;
//! let modality = obj.element_by_name("Modality")?.to_str()?;
//! # Ok(())
//! # }
//! ```
//!
//! Objects can be serialized back into DICOM encoded bytes
//! with a [`DicomWriter`](write::DicomWriter),
//! which decides how sequence and item lengths are encoded
//! and whether group lengths are included.
//!
//! ```
//! # use dcmcodec_object::InMemDicomObject;
//! # use dcmcodec_object::write::DicomWriter;
//! # use dcmcodec_core::{DataElement, Tag, VR};
//! # use dcmcodec_encoding::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut obj = InMemDicomObject::new_empty();
//! obj.put(DataElement::new(Tag(0x0010, 0x0010), VR::PN, "Doe^John"))?;
//!
//! let mut writer = DicomWriter::new(Vec::new()).with_encoding(&EXPLICIT_VR_LITTLE_ENDIAN)?;
//! writer.write_data_set(&obj)?;
//! let serialized = writer.finish()?;
//! assert_eq!(serialized.len(), 16);
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```

pub mod file;
pub mod mem;
pub mod meta;
pub mod read;
pub mod write;

pub use crate::file::{from_reader, open_file, OpenFileOptions};
pub use crate::mem::{InMemDicomObject, InMemElement, ItemLink};
pub use crate::meta::{FileMetaTable, FileMetaTableBuilder};
pub use crate::read::{DicomReader, ReadPreamble};
pub use crate::write::{DicomWriter, EncodedLengths, LengthEncoding};

pub use dcmcodec_core::Tag;
pub use dcmcodec_dictionary::StandardDataDictionary;

use dcmcodec_core::header::GroupNumber;
use dcmcodec_core::DataDictionary;
use dcmcodec_parser::dataset::DataToken;
use snafu::{Backtrace, ResultExt, Snafu};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// The default file DICOM object,
/// an in-memory object with its file meta table.
pub type DefaultDicomObject<D = StandardDataDictionary> = FileDicomObject<mem::InMemDicomObject<D>>;

/// The implementation class UID written by default
/// in the file meta group of new files.
pub const IMPLEMENTATION_CLASS_UID: &str = "2.25.262046377349410232614883506386914627548";

/// The implementation version name written by default
/// in the file meta group of new files.
pub const IMPLEMENTATION_VERSION_NAME: &str = "DCMCODEC 0.1";

/// An error which may occur when loading a DICOM object
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ReadError {
    #[snafu(display("Could not open file '{}'", filename.display()))]
    OpenFile {
        filename: std::path::PathBuf,
        backtrace: Backtrace,
        source: std::io::Error,
    },
    /// Could not read preamble bytes
    ReadPreambleBytes {
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("Could not parse meta group data set"))]
    ParseMetaDataSet {
        #[snafu(backtrace)]
        source: crate::meta::Error,
    },
    #[snafu(display("Could not look ahead into the data set"))]
    PeekDataSet {
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("Could not determine the transfer syntax of the data set"))]
    UndetectedTransferSyntax { backtrace: Backtrace },
    #[snafu(display("Could not read data set token"))]
    ReadToken {
        #[snafu(backtrace)]
        source: dcmcodec_parser::dataset::read::Error,
    },
    #[snafu(display("Missing element value after header token"))]
    MissingElementValue { backtrace: Backtrace },
    #[snafu(display("Unexpected token {:?}", token))]
    UnexpectedToken {
        token: Box<DataToken>,
        backtrace: Backtrace,
    },
    #[snafu(display("Premature data set end"))]
    PrematureEnd { backtrace: Backtrace },
}

/// An error which may occur when writing a DICOM object
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum WriteError {
    #[snafu(display("Could not write to file '{}'", filename.display()))]
    WriteFile {
        filename: std::path::PathBuf,
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("Could not write object preamble"))]
    WritePreamble {
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("Could not write magic code"))]
    WriteMagicCode {
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("Could not print meta group data set"))]
    PrintMetaDataSet {
        #[snafu(backtrace)]
        source: crate::meta::Error,
    },
    #[snafu(display("Could not print data set"))]
    PrintDataSet {
        #[snafu(backtrace)]
        source: dcmcodec_parser::dataset::write::Error,
    },
    /// The writer was used out of order,
    /// such as writing a data set before establishing its encoding.
    #[snafu(display("Unsupported encoding state: {}", reason))]
    UnsupportedEncodingState {
        reason: &'static str,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not fetch bulk data from `{}`", uri))]
    ResolveBulkData {
        uri: String,
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("Could not parse encapsulated bulk data from `{}`", uri))]
    ParseBulkData {
        uri: String,
        #[snafu(backtrace)]
        source: dcmcodec_parser::stateful::decode::Error,
    },
    #[snafu(display("Bulk data URI `{}` has no offset or length", uri))]
    InvalidBulkDataUri { uri: String, backtrace: Backtrace },
    #[snafu(display("Bulk data at `{}` is not a valid fragment sequence", uri))]
    MalformedBulkData { uri: String, backtrace: Backtrace },
    #[snafu(display("Could not encode the value of {}", tag))]
    EncodeValue {
        tag: Tag,
        #[snafu(backtrace)]
        source: dcmcodec_parser::stateful::encode::EncodeValueError,
    },
    #[snafu(display("Encoded length of {} does not fit in 32 bits", tag))]
    LengthOverflow { tag: Tag, backtrace: Backtrace },
    #[snafu(display("Could not access the content of an item"))]
    AccessItem {
        #[snafu(backtrace)]
        source: AccessError,
    },
    #[snafu(display("Could not finish writing the output"))]
    FinishOutput {
        backtrace: Backtrace,
        source: std::io::Error,
    },
}

/// An error which may occur when looking up a DICOM object's attributes.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum AccessError {
    #[snafu(display("No such data element with tag {}", tag))]
    NoSuchDataElementTag { tag: Tag, backtrace: Backtrace },
    /// A lazily read item could not be parsed.
    #[snafu(display("Could not load item at position {}", offset))]
    LoadItem {
        offset: u64,
        #[snafu(source(from(ReadError, Box::new)))]
        source: Box<ReadError>,
    },
    #[snafu(display("Private creator {} not found in group {:04X}", creator, group))]
    UnresolvedPrivateCreator {
        group: GroupNumber,
        creator: String,
        backtrace: Backtrace,
    },
    #[snafu(display("Group number must be odd, found {:04X}", group))]
    InvalidPrivateGroup {
        group: GroupNumber,
        backtrace: Backtrace,
    },
}

impl AccessError {
    pub fn into_access_by_name(self, alias: impl Into<String>) -> AccessByNameError {
        match self {
            AccessError::NoSuchDataElementTag { tag, backtrace } => {
                AccessByNameError::NoSuchDataElementAlias {
                    tag,
                    alias: alias.into(),
                    backtrace,
                }
            }
            source => AccessByNameError::Access { source },
        }
    }
}

/// An error which may occur when looking up a DICOM object's attributes
/// by a keyword (or alias) instead of by tag.
///
/// These accesses incur a look-up at the data element dictionary,
/// which may fail if no such entry exists.
#[derive(Debug, Snafu)]
pub enum AccessByNameError {
    #[snafu(display("No such data element {} (with tag {})", alias, tag))]
    NoSuchDataElementAlias {
        tag: Tag,
        alias: String,
        backtrace: Backtrace,
    },

    /// Could not resolve attribute name from the data dictionary
    #[snafu(display("Unknown data attribute named `{}`", name))]
    NoSuchAttributeName { name: String, backtrace: Backtrace },

    #[snafu(display("Could not access the object"))]
    Access {
        #[snafu(backtrace)]
        source: AccessError,
    },
}

/// A root DICOM object retrieved from a standard DICOM file,
/// containing additional information from the file meta group
/// in a separate table value.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDicomObject<O> {
    meta: FileMetaTable,
    obj: O,
}

impl<O> FileDicomObject<O> {
    /// Join a file meta table with its data set.
    pub fn new(meta: FileMetaTable, obj: O) -> Self {
        FileDicomObject { meta, obj }
    }

    /// Retrieve the processed meta header table.
    pub fn meta(&self) -> &FileMetaTable {
        &self.meta
    }

    /// Retrieve a mutable reference to the processed meta header table.
    ///
    /// Considerable care should be taken when modifying this table,
    /// as it may influence object reading and writing operations.
    pub fn meta_mut(&mut self) -> &mut FileMetaTable {
        &mut self.meta
    }

    /// Retrieve the inner DICOM object structure, discarding the meta table.
    pub fn into_inner(self) -> O {
        self.obj
    }
}

impl<D> FileDicomObject<InMemDicomObject<D>>
where
    D: DataDictionary + Clone,
{
    /// Write the entire object as a DICOM file
    /// into the given file path.
    /// Preamble, magic code, and file meta group will be included
    /// before the inner object.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WriteError> {
        let path = path.as_ref();
        let file = File::create(path).context(WriteFileSnafu { filename: path })?;
        let to = self.write_all(BufWriter::new(file))?;
        to.into_inner()
            .map_err(|e| e.into_error())
            .context(WriteFileSnafu { filename: path })?;
        Ok(())
    }

    /// Write the entire object as a DICOM file
    /// into the given writer,
    /// returning the writer once the data set is complete.
    /// Preamble, magic code, and file meta group will be included
    /// before the inner object.
    pub fn write_all<W: Write>(&self, to: W) -> Result<W, WriteError> {
        let mut writer = DicomWriter::new(to);
        writer.write_file_meta_information(&self.meta)?;
        writer.write_data_set(&self.obj)?;
        writer.finish()
    }

    /// Write the file meta group set into the given writer.
    ///
    /// This is equivalent to `self.meta().write(to)`.
    pub fn write_meta<W: Write>(&self, to: W) -> Result<(), WriteError> {
        self.meta.write(to).context(PrintMetaDataSetSnafu)
    }
}

impl<O> ::std::ops::Deref for FileDicomObject<O> {
    type Target = O;

    fn deref(&self) -> &Self::Target {
        &self.obj
    }
}

impl<O> ::std::ops::DerefMut for FileDicomObject<O> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.obj
    }
}

#[cfg(test)]
mod tests {
    use dcmcodec_core::{DataElement, PrimitiveValue, VR};
    use dcmcodec_dictionary::tags;

    use crate::meta::FileMetaTableBuilder;
    use crate::{AccessError, FileDicomObject, InMemDicomObject};

    fn assert_type_not_too_large<T>(max_size: usize) {
        let size = std::mem::size_of::<T>();
        if size > max_size {
            panic!(
                "Type {} of byte size {} exceeds acceptable size {}",
                std::any::type_name::<T>(),
                size,
                max_size
            );
        }
    }

    #[test]
    fn errors_not_too_large() {
        assert_type_not_too_large::<AccessError>(96);
    }

    #[test]
    fn smoke_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smoke-test.dcm");

        let meta = FileMetaTableBuilder::new()
            .transfer_syntax("1.2.840.10008.1.2.1")
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.1")
            .media_storage_sop_instance_uid("1.2.3.456")
            .implementation_class_uid("1.2.345.6.7890.1.234")
            .build()
            .unwrap();
        let mut obj = InMemDicomObject::new_empty();
        obj.put(DataElement::new(
            tags::PATIENT_NAME,
            VR::PN,
            PrimitiveValue::from("Doe^John"),
        ))
        .unwrap();
        let obj = FileDicomObject::new(meta, obj);

        obj.write_to_file(&path).unwrap();

        let obj2 = crate::open_file(&path).unwrap();

        assert_eq!(obj.meta(), obj2.meta());
        assert_eq!(&*obj, &*obj2);
    }

    /// A FileDicomObject<InMemDicomObject>
    /// can be used like a DICOM object.
    #[test]
    fn file_dicom_object_can_use_inner() {
        let mut obj = InMemDicomObject::new_empty();

        obj.put(DataElement::new(
            tags::PATIENT_NAME,
            VR::PN,
            PrimitiveValue::from("John Doe"),
        ))
        .unwrap();

        let meta = FileMetaTableBuilder::new()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .media_storage_sop_instance_uid("1.2.23456789")
            .transfer_syntax("1.2.840.10008.1.2.1")
            .implementation_class_uid("1.2.345.6.7890.1.234")
            .build()
            .unwrap();
        let mut obj = FileDicomObject::new(meta, obj);

        // contains patient name
        assert_eq!(
            obj.element(tags::PATIENT_NAME)
                .unwrap()
                .value()
                .to_str()
                .unwrap(),
            "John Doe",
        );

        // can be removed
        assert!(obj.remove_element(tags::PATIENT_NAME).unwrap());

        assert!(matches!(
            obj.element(tags::PATIENT_NAME),
            Err(AccessError::NoSuchDataElementTag { .. }),
        ));
    }
}
