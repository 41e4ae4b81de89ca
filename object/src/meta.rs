//! Module containing data structures and readers of DICOM file meta information tables.
//!
//! The file meta group is always encoded in explicit VR little endian,
//! whatever the transfer syntax of the data set that follows.
use crate::mem::InMemElement;
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmcodec_core::dicom_value;
use dcmcodec_core::header::{DataElementHeader, HasLength, Header, Length, Tag, VR};
use dcmcodec_core::value::{PrimitiveValue, Value};
use dcmcodec_core::DataElement;
use dcmcodec_dictionary::tags;
use dcmcodec_encoding::decode::{self, explicit::ExplicitVRDecoder, Decode};
use dcmcodec_encoding::text::{DecodeTextError, SpecificCharacterSet, TextCodec};
use dcmcodec_encoding::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
use dcmcodec_parser::dataset::DataSetWriter;
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::convert::TryFrom;
use std::io::{Read, Write};

const DICM_MAGIC_CODE: [u8; 4] = [b'D', b'I', b'C', b'M'];

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The file meta group parser could not read
    /// the magic code `DICM` from its source.
    #[snafu(display("Could not start reading DICOM data"))]
    ReadMagicCode {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The file meta group parser could not fetch
    /// the value of a data element from its source.
    #[snafu(display("Could not read data value"))]
    ReadValueData {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The file meta group parser could not decode
    /// the text in one of its data elements.
    #[snafu(display("Could not decode text in {}", tag))]
    DecodeText {
        tag: Tag,
        #[snafu(backtrace)]
        source: DecodeTextError,
    },

    /// Invalid DICOM data, detected from checking the `DICM` code.
    #[snafu(display("Invalid DICOM data"))]
    NotDicom { backtrace: Backtrace },

    /// An issue occurred while decoding the next data element
    /// in the file meta data set.
    #[snafu(display("Could not decode data element"))]
    DecodeElement { source: decode::Error },

    /// A data element with an unexpected tag was retrieved:
    /// the parser was expecting another tag first,
    /// or at least one that is part of the the file meta group.
    #[snafu(display("Unexpected data element tagged {}", tag))]
    UnexpectedTag { tag: Tag, backtrace: Backtrace },

    /// A required file meta data element is missing.
    #[snafu(display("Missing data element `{}`", alias))]
    MissingElement {
        alias: &'static str,
        backtrace: Backtrace,
    },

    /// The value length of a data elements in the file meta group
    /// was unexpected.
    #[snafu(display("Unexpected length {} for data element tagged {}", length, tag))]
    UnexpectedDataValueLength {
        tag: Tag,
        length: Length,
        backtrace: Backtrace,
    },

    /// The value length of a data element is undefined,
    /// but knowing the length is required in its context.
    #[snafu(display("Undefined value length for data element tagged {}", tag))]
    UndefinedValueLength { tag: Tag, backtrace: Backtrace },

    /// The file meta group data set could not be written.
    #[snafu(display("Could not write file meta group data set"))]
    WriteSet {
        #[snafu(backtrace)]
        source: dcmcodec_parser::dataset::write::Error,
    },

    /// The file meta group is too large for its group length.
    #[snafu(display("File meta group of {} bytes is too long", len))]
    GroupTooLong { len: usize, backtrace: Backtrace },
}

type Result<T, E = Error> = std::result::Result<T, E>;

/// DICOM File Meta Information Table.
///
/// This data type contains the relevant parts of the file meta information table, as
/// specified in [1].
///
/// [1]: http://dicom.nema.org/medical/dicom/current/output/chtml/part06/chapter_7.html
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetaTable {
    /// File Meta Information Group Length
    pub information_group_length: u32,
    /// File Meta Information Version
    pub information_version: [u8; 2],
    /// Media Storage SOP Class UID
    pub media_storage_sop_class_uid: String,
    /// Media Storage SOP Instance UID
    pub media_storage_sop_instance_uid: String,
    /// Transfer Syntax UID
    pub transfer_syntax: String,
    /// Implementation Class UID
    pub implementation_class_uid: String,

    /// Implementation Version Name
    pub implementation_version_name: Option<String>,
    /// Source Application Entity Title
    pub source_application_entity_title: Option<String>,
    /// Sending Application Entity Title
    pub sending_application_entity_title: Option<String>,
    /// Receiving Application Entity Title
    pub receiving_application_entity_title: Option<String>,
    /// Private Information Creator UID
    pub private_information_creator_uid: Option<String>,
    /// Private Information
    pub private_information: Option<Vec<u8>>,
}

fn read_value<S>(source: &mut S, len: u32) -> Result<Vec<u8>>
where
    S: ?Sized + Read,
{
    let mut v = vec![0; len as usize];
    source.read_exact(&mut v).context(ReadValueDataSnafu)?;
    Ok(v)
}

/// Read the body of an element as text in the default character repertoire.
fn read_str_body<S>(source: &mut S, tag: Tag, len: u32) -> Result<String>
where
    S: ?Sized + Read,
{
    let v = read_value(source, len)?;
    SpecificCharacterSet::Default
        .decode(&v)
        .context(DecodeTextSnafu { tag })
}

impl FileMetaTable {
    /// Read the table from a source positioned at the `DICM` magic code.
    pub fn from_reader<R: Read>(file: R) -> Result<Self> {
        FileMetaTable::read_from(file)
    }

    fn read_from<S: Read>(mut file: S) -> Result<Self> {
        let mut buff: [u8; 4] = [0; 4];
        file.read_exact(&mut buff).context(ReadMagicCodeSnafu)?;
        if buff != DICM_MAGIC_CODE {
            return NotDicomSnafu.fail();
        }

        let decoder = ExplicitVRDecoder::new(byteordered::Endianness::Little);

        let group_length: u32 = {
            let (elem, _bytes_read) = decoder
                .decode_header(&mut file)
                .context(DecodeElementSnafu)?;
            if elem.tag() != tags::FILE_META_INFORMATION_GROUP_LENGTH {
                return UnexpectedTagSnafu { tag: elem.tag() }.fail();
            }
            if elem.length() != Length(4) {
                return UnexpectedDataValueLengthSnafu {
                    tag: elem.tag(),
                    length: elem.length(),
                }
                .fail();
            }
            let mut buff: [u8; 4] = [0; 4];
            file.read_exact(&mut buff).context(ReadValueDataSnafu)?;
            LittleEndian::read_u32(&buff)
        };

        let mut builder = FileMetaTableBuilder::new().group_length(group_length);
        let mut group_length_read: u32 = 0;

        while group_length_read < group_length {
            let (elem, header_len) = decoder
                .decode_header(&mut file)
                .context(DecodeElementSnafu)?;
            let tag = elem.tag();
            let elem_len = elem
                .length()
                .get()
                .context(UndefinedValueLengthSnafu { tag })?;
            group_length_read = group_length_read
                .saturating_add(header_len as u32)
                .saturating_add(elem_len);

            builder = match tag {
                tags::FILE_META_INFORMATION_VERSION => {
                    if elem_len != 2 {
                        return UnexpectedDataValueLengthSnafu {
                            tag,
                            length: elem.length(),
                        }
                        .fail();
                    }
                    let mut hbuf = [0u8; 2];
                    file.read_exact(&mut hbuf[..]).context(ReadValueDataSnafu)?;
                    builder.information_version(hbuf)
                }
                tags::MEDIA_STORAGE_SOP_CLASS_UID => {
                    builder.media_storage_sop_class_uid(read_str_body(&mut file, tag, elem_len)?)
                }
                tags::MEDIA_STORAGE_SOP_INSTANCE_UID => builder
                    .media_storage_sop_instance_uid(read_str_body(&mut file, tag, elem_len)?),
                tags::TRANSFER_SYNTAX_UID => {
                    builder.transfer_syntax(read_str_body(&mut file, tag, elem_len)?)
                }
                tags::IMPLEMENTATION_CLASS_UID => {
                    builder.implementation_class_uid(read_str_body(&mut file, tag, elem_len)?)
                }
                tags::IMPLEMENTATION_VERSION_NAME => {
                    builder.implementation_version_name(read_str_body(&mut file, tag, elem_len)?)
                }
                tags::SOURCE_APPLICATION_ENTITY_TITLE => builder
                    .source_application_entity_title(read_str_body(&mut file, tag, elem_len)?),
                tags::SENDING_APPLICATION_ENTITY_TITLE => builder
                    .sending_application_entity_title(read_str_body(&mut file, tag, elem_len)?),
                tags::RECEIVING_APPLICATION_ENTITY_TITLE => builder
                    .receiving_application_entity_title(read_str_body(&mut file, tag, elem_len)?),
                tags::PRIVATE_INFORMATION_CREATOR_UID => builder
                    .private_information_creator_uid(read_str_body(&mut file, tag, elem_len)?),
                tags::PRIVATE_INFORMATION => {
                    builder.private_information(read_value(&mut file, elem_len)?)
                }
                Tag(0x0002, _) => {
                    // not kept in the table
                    tracing::debug!("Ignoring file meta element {}", tag);
                    read_value(&mut file, elem_len)?;
                    builder
                }
                _ => return UnexpectedTagSnafu { tag }.fail(),
            }
        }

        builder.build()
    }

    /// The elements of the table after the group length, in tag order.
    fn body_elements(&self) -> Vec<(DataElementHeader, PrimitiveValue)> {
        fn text(tag: Tag, vr: VR, value: &str) -> (DataElementHeader, PrimitiveValue) {
            (
                DataElementHeader::new(tag, vr, Length::UNDEFINED),
                PrimitiveValue::from(value),
            )
        }

        let mut elems = vec![
            (
                DataElementHeader::new(tags::FILE_META_INFORMATION_VERSION, VR::OB, Length(2)),
                dicom_value!(
                    U8,
                    [self.information_version[0], self.information_version[1]]
                ),
            ),
            text(
                tags::MEDIA_STORAGE_SOP_CLASS_UID,
                VR::UI,
                &self.media_storage_sop_class_uid,
            ),
            text(
                tags::MEDIA_STORAGE_SOP_INSTANCE_UID,
                VR::UI,
                &self.media_storage_sop_instance_uid,
            ),
            text(tags::TRANSFER_SYNTAX_UID, VR::UI, &self.transfer_syntax),
            text(
                tags::IMPLEMENTATION_CLASS_UID,
                VR::UI,
                &self.implementation_class_uid,
            ),
        ];
        let optional = [
            (
                tags::IMPLEMENTATION_VERSION_NAME,
                VR::SH,
                &self.implementation_version_name,
            ),
            (
                tags::SOURCE_APPLICATION_ENTITY_TITLE,
                VR::AE,
                &self.source_application_entity_title,
            ),
            (
                tags::SENDING_APPLICATION_ENTITY_TITLE,
                VR::AE,
                &self.sending_application_entity_title,
            ),
            (
                tags::RECEIVING_APPLICATION_ENTITY_TITLE,
                VR::AE,
                &self.receiving_application_entity_title,
            ),
            (
                tags::PRIVATE_INFORMATION_CREATOR_UID,
                VR::UI,
                &self.private_information_creator_uid,
            ),
        ];
        for (tag, vr, value) in optional {
            if let Some(v) = value {
                elems.push(text(tag, vr, v));
            }
        }
        if let Some(v) = &self.private_information {
            elems.push((
                DataElementHeader::new(tags::PRIVATE_INFORMATION, VR::OB, Length::UNDEFINED),
                PrimitiveValue::U8(v.as_slice().into()),
            ));
        }
        elems
    }

    /// Turn the table into data elements,
    /// group length first.
    pub fn into_element_iter(self) -> impl Iterator<Item = InMemElement> {
        let group_length = DataElement::new(
            tags::FILE_META_INFORMATION_GROUP_LENGTH,
            VR::UL,
            Value::Primitive(self.information_group_length.into()),
        );
        std::iter::once(group_length).chain(
            self.body_elements()
                .into_iter()
                .map(|(header, value)| DataElement::new(header.tag, header.vr, value)),
        )
    }

    /// Write the file meta group in explicit VR little endian.
    ///
    /// The group length written is that of the elements actually written,
    /// which may differ from `information_group_length`.
    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        let mut body = Vec::new();
        {
            let mut dset = DataSetWriter::with_ts(&mut body, &EXPLICIT_VR_LITTLE_ENDIAN);
            for (header, value) in self.body_elements() {
                dset.write_element(&header, &value).context(WriteSetSnafu)?;
            }
        }
        let group_length =
            u32::try_from(body.len()).map_err(|_| GroupTooLongSnafu { len: body.len() }.build())?;

        let mut dset = DataSetWriter::with_ts(writer, &EXPLICIT_VR_LITTLE_ENDIAN);
        dset.write_element(
            &DataElementHeader::new(tags::FILE_META_INFORMATION_GROUP_LENGTH, VR::UL, Length(4)),
            &PrimitiveValue::from(group_length),
        )
        .context(WriteSetSnafu)?;
        dset.write_raw_with(body.len() as u64, |to| to.write_all(&body))
            .context(WriteSetSnafu)?;
        dset.flush().context(WriteSetSnafu)
    }
}

/// A builder for DICOM meta information tables.
#[derive(Debug, Default, Clone)]
pub struct FileMetaTableBuilder {
    /// File Meta Information Group Length (UL)
    information_group_length: Option<u32>,
    /// File Meta Information Version (OB)
    information_version: Option<[u8; 2]>,
    /// Media Storage SOP Class UID (UI)
    media_storage_sop_class_uid: Option<String>,
    /// Media Storage SOP Instance UID (UI)
    media_storage_sop_instance_uid: Option<String>,
    /// Transfer Syntax UID (UI)
    transfer_syntax: Option<String>,
    /// Implementation Class UID (UI)
    implementation_class_uid: Option<String>,

    /// Implementation Version Name (SH)
    implementation_version_name: Option<String>,
    /// Source Application Entity Title (AE)
    source_application_entity_title: Option<String>,
    /// Sending Application Entity Title (AE)
    sending_application_entity_title: Option<String>,
    /// Receiving Application Entity Title (AE)
    receiving_application_entity_title: Option<String>,
    /// Private Information Creator UID (UI)
    private_information_creator_uid: Option<String>,
    /// Private Information (OB)
    private_information: Option<Vec<u8>>,
}

/// Ensure that the string is even lengthed, by adding a trailing character
/// if not.
#[inline]
fn padded<T>(s: T, pad: char) -> String
where
    T: Into<String>,
{
    let mut s = s.into();
    if s.len() % 2 == 1 {
        s.push(pad);
    }
    s
}

/// Ensure that the string is even lengthed with trailing '\0's.
fn ui_padded<T>(s: T) -> String
where
    T: Into<String>,
{
    padded(s, '\0')
}

/// Ensure that the string is even lengthed with trailing spaces.
fn txt_padded<T>(s: T) -> String
where
    T: Into<String>,
{
    padded(s, ' ')
}

impl FileMetaTableBuilder {
    /// Create a new, empty builder.
    pub fn new() -> FileMetaTableBuilder {
        FileMetaTableBuilder::default()
    }

    /// Define the meta information group length.
    pub fn group_length(mut self, value: u32) -> FileMetaTableBuilder {
        self.information_group_length = Some(value);
        self
    }

    /// Define the meta information version.
    pub fn information_version(mut self, value: [u8; 2]) -> FileMetaTableBuilder {
        self.information_version = Some(value);
        self
    }

    /// Define the media storage SOP class UID.
    pub fn media_storage_sop_class_uid<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.media_storage_sop_class_uid = Some(ui_padded(value));
        self
    }

    /// Define the media storage SOP instance UID.
    pub fn media_storage_sop_instance_uid<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.media_storage_sop_instance_uid = Some(ui_padded(value));
        self
    }

    /// Define the transfer syntax UID.
    pub fn transfer_syntax<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.transfer_syntax = Some(ui_padded(value));
        self
    }

    /// Define the implementation class UID.
    pub fn implementation_class_uid<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.implementation_class_uid = Some(ui_padded(value));
        self
    }

    /// Define the implementation version name.
    pub fn implementation_version_name<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.implementation_version_name = Some(txt_padded(value));
        self
    }

    /// Define the source application entity title.
    pub fn source_application_entity_title<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.source_application_entity_title = Some(txt_padded(value));
        self
    }

    /// Define the sending application entity title.
    pub fn sending_application_entity_title<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.sending_application_entity_title = Some(txt_padded(value));
        self
    }

    /// Define the receiving application entity title.
    pub fn receiving_application_entity_title<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.receiving_application_entity_title = Some(txt_padded(value));
        self
    }

    /// Define the private information creator UID.
    pub fn private_information_creator_uid<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.private_information_creator_uid = Some(ui_padded(value));
        self
    }

    /// Define the private information as a vector of bytes.
    pub fn private_information<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<Vec<u8>>,
    {
        self.private_information = Some(value.into());
        self
    }

    /// Build the table.
    ///
    /// The group length is calculated from the other fields
    /// unless it was defined.
    pub fn build(self) -> Result<FileMetaTable> {
        // a missing version is assumed to be (00H, 01H)
        let information_version = self.information_version.unwrap_or([0, 1]);
        let media_storage_sop_class_uid =
            self.media_storage_sop_class_uid
                .context(MissingElementSnafu {
                    alias: "MediaStorageSOPClassUID",
                })?;
        let media_storage_sop_instance_uid =
            self.media_storage_sop_instance_uid
                .context(MissingElementSnafu {
                    alias: "MediaStorageSOPInstanceUID",
                })?;
        let transfer_syntax = self.transfer_syntax.context(MissingElementSnafu {
            alias: "TransferSyntax",
        })?;
        let mut implementation_version_name = self.implementation_version_name;
        let implementation_class_uid = match self.implementation_class_uid {
            Some(uid) => uid,
            None => {
                // this implementation identifies itself in new files
                if implementation_version_name.is_none() {
                    implementation_version_name =
                        Some(txt_padded(crate::IMPLEMENTATION_VERSION_NAME));
                }
                ui_padded(crate::IMPLEMENTATION_CLASS_UID)
            }
        };

        fn dicom_len<T: AsRef<[u8]>>(x: T) -> u32 {
            let o = x.as_ref().len() as u32;
            o + (o & 1)
        }

        let information_group_length = match self.information_group_length {
            Some(e) => e,
            None => {
                // File Meta Information Group Length is not included here
                14 + 8
                    + dicom_len(&media_storage_sop_class_uid)
                    + 8
                    + dicom_len(&media_storage_sop_instance_uid)
                    + 8
                    + dicom_len(&transfer_syntax)
                    + 8
                    + dicom_len(&implementation_class_uid)
                    + [
                        &implementation_version_name,
                        &self.source_application_entity_title,
                        &self.sending_application_entity_title,
                        &self.receiving_application_entity_title,
                        &self.private_information_creator_uid,
                    ]
                    .iter()
                    .filter_map(|s| s.as_ref())
                    .map(|s| 8 + dicom_len(s))
                    .sum::<u32>()
                    + self
                        .private_information
                        .as_ref()
                        .map(|x| 12 + dicom_len(x))
                        .unwrap_or(0)
            }
        };

        Ok(FileMetaTable {
            information_group_length,
            information_version,
            media_storage_sop_class_uid,
            media_storage_sop_instance_uid,
            transfer_syntax,
            implementation_class_uid,
            implementation_version_name,
            source_application_entity_title: self.source_application_entity_title,
            sending_application_entity_title: self.sending_application_entity_title,
            receiving_application_entity_title: self.receiving_application_entity_title,
            private_information_creator_uid: self.private_information_creator_uid,
            private_information: self.private_information,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FileMetaTable, FileMetaTableBuilder};
    use dcmcodec_core::header::Header;
    use dcmcodec_core::value::Value;
    use dcmcodec_core::{dicom_value, Tag, VR};

    #[rustfmt::skip]
    const TEST_META_1: &[u8] = &[
        // magic code
        b'D', b'I', b'C', b'M',
        // File Meta Information Group Length: (0000,0002) ; UL ; 4 ; 200
        0x02, 0x00, 0x00, 0x00, b'U', b'L', 0x04, 0x00, 0xc8, 0x00, 0x00, 0x00,
        // File Meta Information Version: (0002, 0001) ; OB ; 2 ; [0x00, 0x01]
        0x02, 0x00, 0x01, 0x00, b'O', b'B', 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x01,
        // Media Storage SOP Class UID (0002, 0002) ; UI ; 26 ; "1.2.840.10008.5.1.4.1.1.1\0" (ComputedRadiographyImageStorage)
        0x02, 0x00, 0x02, 0x00, b'U', b'I', 0x1a, 0x00, 0x31, 0x2e, 0x32, 0x2e, 0x38, 0x34, 0x30,
        0x2e, 0x31, 0x30, 0x30, 0x30, 0x38, 0x2e, 0x35, 0x2e, 0x31, 0x2e, 0x34, 0x2e, 0x31, 0x2e,
        0x31, 0x2e, 0x31, 0x00,
        // Media Storage SOP Instance UID (0002, 0003) ; UI ; 56 ; "1.2.3.4.5.12345678.1234567890.1234567.123456789.1234567\0"
        0x02, 0x00, 0x03, 0x00, b'U', b'I', 0x38, 0x00, 0x31, 0x2e, 0x32, 0x2e, 0x33, 0x2e, 0x34,
        0x2e, 0x35, 0x2e, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x2e, 0x31, 0x32, 0x33,
        0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x30, 0x2e, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37,
        0x2e, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x2e, 0x31, 0x32, 0x33, 0x34,
        0x35, 0x36, 0x37, 0x00,
        // Transfer Syntax UID (0002, 0010) ; UI ; 20 ; "1.2.840.10008.1.2.1\0" (LittleEndianExplicit)
        0x02, 0x00, 0x10, 0x00, b'U', b'I', 0x14, 0x00, 0x31, 0x2e, 0x32, 0x2e, 0x38, 0x34, 0x30,
        0x2e, 0x31, 0x30, 0x30, 0x30, 0x38, 0x2e, 0x31, 0x2e, 0x32, 0x2e, 0x31, 0x00,
        // Implementation Class UID (0002, 0012) ; UI ; 20 ; "1.2.345.6.7890.1.234"
        0x02, 0x00, 0x12, 0x00, b'U', b'I', 0x14, 0x00, 0x31, 0x2e, 0x32, 0x2e, 0x33, 0x34, 0x35,
        0x2e, 0x36, 0x2e, 0x37, 0x38, 0x39, 0x30, 0x2e, 0x31, 0x2e, 0x32, 0x33, 0x34,
        // optional elements:

        // Implementation Version Name (0002,0013) ; SH ; "RUSTY_DICOM_269"
        0x02, 0x00, 0x13, 0x00, b'S', b'H', 0x10, 0x00, 0x52, 0x55, 0x53, 0x54, 0x59, 0x5f, 0x44,
        0x49, 0x43, 0x4f, 0x4d, 0x5f, 0x32, 0x36, 0x39, 0x20,
        // Source Application Entity Title (0002, 0016) ; AE ; 0 (no data)
        0x02, 0x00, 0x16, 0x00, b'A', b'E', 0x00, 0x00,
    ];

    fn ground_truth() -> FileMetaTable {
        FileMetaTable {
            information_group_length: 200,
            information_version: [0u8, 1u8],
            media_storage_sop_class_uid: "1.2.840.10008.5.1.4.1.1.1\0".to_owned(),
            media_storage_sop_instance_uid:
                "1.2.3.4.5.12345678.1234567890.1234567.123456789.1234567\0".to_owned(),
            transfer_syntax: "1.2.840.10008.1.2.1\0".to_owned(),
            implementation_class_uid: "1.2.345.6.7890.1.234".to_owned(),
            implementation_version_name: Some("RUSTY_DICOM_269 ".to_owned()),
            source_application_entity_title: Some("".to_owned()),
            sending_application_entity_title: None,
            receiving_application_entity_title: None,
            private_information_creator_uid: None,
            private_information: None,
        }
    }

    #[test]
    fn read_meta_table_from_reader() {
        let mut source = TEST_META_1;

        let table = FileMetaTable::from_reader(&mut source).unwrap();

        assert_eq!(table.information_group_length, 200);
        assert_eq!(table.transfer_syntax, "1.2.840.10008.1.2.1\0");
        assert_eq!(table.source_application_entity_title, Some("".into()));
        assert_eq!(table, ground_truth());
        // nothing past the group was read
        assert!(source.is_empty());
    }

    #[test]
    fn not_dicom_without_magic_code() {
        let source: &[u8] = b"DICX\x02\x00\x00\x00UL\x04\x00\xc8\x00\x00\x00";
        let res = FileMetaTable::from_reader(source);
        assert!(matches!(res, Err(super::Error::NotDicom { .. })));
    }

    #[test]
    fn create_meta_table_with_builder() {
        let table = FileMetaTableBuilder::new()
            .information_version([0, 1])
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.1")
            .media_storage_sop_instance_uid(
                "1.2.3.4.5.12345678.1234567890.1234567.123456789.1234567",
            )
            .transfer_syntax("1.2.840.10008.1.2.1")
            .implementation_class_uid("1.2.345.6.7890.1.234")
            .implementation_version_name("RUSTY_DICOM_269")
            .source_application_entity_title("")
            .build()
            .unwrap();

        assert_eq!(table, ground_truth());
    }

    #[test]
    fn builder_requires_transfer_syntax() {
        let res = FileMetaTableBuilder::new()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.1")
            .media_storage_sop_instance_uid("1.2.3.4")
            .implementation_class_uid("1.2.345.6.7890.1.234")
            .build();
        assert!(matches!(
            res,
            Err(super::Error::MissingElement {
                alias: "TransferSyntax",
                ..
            })
        ));
    }

    #[test]
    fn write_meta_table_as_read() {
        let mut out = Vec::new();
        ground_truth().write(&mut out).unwrap();
        assert_eq!(out, &TEST_META_1[4..]);
    }

    #[test]
    fn read_meta_table_into_iter() {
        let elems: Vec<_> = ground_truth().into_element_iter().collect();
        assert_eq!(elems.len(), 8);

        assert_eq!(elems[0].tag(), Tag(0x0002, 0x0000));
        assert_eq!(elems[0].vr(), VR::UL);
        assert_eq!(elems[0].value(), &Value::Primitive(dicom_value!(U32, [200])));

        assert_eq!(elems[1].tag(), Tag(0x0002, 0x0001));
        assert_eq!(elems[1].value(), &Value::Primitive(dicom_value!(U8, [0, 1])));

        assert_eq!(elems[4].tag(), Tag(0x0002, 0x0010));
        assert_eq!(elems[4].to_str().unwrap(), "1.2.840.10008.1.2.1\0");

        assert_eq!(elems[7].tag(), Tag(0x0002, 0x0016));
        assert_eq!(elems[7].vr(), VR::AE);
    }
}
