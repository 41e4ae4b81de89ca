//! Attribute tag constants and the entries of the standard dictionary registry.
//!
//! Each constant is named after the attribute keyword in SCREAMING_SNAKE_CASE.
//! Repeating group attributes (`50xx`, `60xx`) are declared with a zeroed `xx` portion.

use dcmcodec_core::dictionary::{DataDictionaryEntryRef, TagRange::*};
use dcmcodec_core::header::{Tag, VR};

type E = DataDictionaryEntryRef<'static>;

pub const COMMAND_GROUP_LENGTH: Tag = Tag(0x0000, 0x0000);
pub const AFFECTED_SOP_CLASS_UID: Tag = Tag(0x0000, 0x0002);
pub const REQUESTED_SOP_CLASS_UID: Tag = Tag(0x0000, 0x0003);
pub const COMMAND_FIELD: Tag = Tag(0x0000, 0x0100);
pub const MESSAGE_ID: Tag = Tag(0x0000, 0x0110);
pub const MESSAGE_ID_BEING_RESPONDED_TO: Tag = Tag(0x0000, 0x0120);
pub const MOVE_DESTINATION: Tag = Tag(0x0000, 0x0600);
pub const PRIORITY: Tag = Tag(0x0000, 0x0700);
pub const COMMAND_DATA_SET_TYPE: Tag = Tag(0x0000, 0x0800);
pub const STATUS: Tag = Tag(0x0000, 0x0900);
pub const AFFECTED_SOP_INSTANCE_UID: Tag = Tag(0x0000, 0x1000);
pub const REQUESTED_SOP_INSTANCE_UID: Tag = Tag(0x0000, 0x1001);
pub const FILE_META_INFORMATION_GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
pub const FILE_META_INFORMATION_VERSION: Tag = Tag(0x0002, 0x0001);
pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag(0x0002, 0x0002);
pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Tag = Tag(0x0002, 0x0003);
pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
pub const IMPLEMENTATION_CLASS_UID: Tag = Tag(0x0002, 0x0012);
pub const IMPLEMENTATION_VERSION_NAME: Tag = Tag(0x0002, 0x0013);
pub const SOURCE_APPLICATION_ENTITY_TITLE: Tag = Tag(0x0002, 0x0016);
pub const SENDING_APPLICATION_ENTITY_TITLE: Tag = Tag(0x0002, 0x0017);
pub const RECEIVING_APPLICATION_ENTITY_TITLE: Tag = Tag(0x0002, 0x0018);
pub const PRIVATE_INFORMATION_CREATOR_UID: Tag = Tag(0x0002, 0x0100);
pub const PRIVATE_INFORMATION: Tag = Tag(0x0002, 0x0102);
pub const SPECIFIC_CHARACTER_SET: Tag = Tag(0x0008, 0x0005);
pub const IMAGE_TYPE: Tag = Tag(0x0008, 0x0008);
pub const INSTANCE_CREATION_DATE: Tag = Tag(0x0008, 0x0012);
pub const INSTANCE_CREATION_TIME: Tag = Tag(0x0008, 0x0013);
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
pub const SERIES_DATE: Tag = Tag(0x0008, 0x0021);
pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);
pub const SERIES_TIME: Tag = Tag(0x0008, 0x0031);
pub const ACCESSION_NUMBER: Tag = Tag(0x0008, 0x0050);
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
pub const MANUFACTURER: Tag = Tag(0x0008, 0x0070);
pub const REFERRING_PHYSICIAN_NAME: Tag = Tag(0x0008, 0x0090);
pub const CODE_VALUE: Tag = Tag(0x0008, 0x0100);
pub const CODING_SCHEME_DESIGNATOR: Tag = Tag(0x0008, 0x0102);
pub const CODE_MEANING: Tag = Tag(0x0008, 0x0104);
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
pub const PROCEDURE_CODE_SEQUENCE: Tag = Tag(0x0008, 0x1032);
pub const SERIES_DESCRIPTION: Tag = Tag(0x0008, 0x103E);
pub const REFERENCED_STUDY_SEQUENCE: Tag = Tag(0x0008, 0x1110);
pub const REFERENCED_SERIES_SEQUENCE: Tag = Tag(0x0008, 0x1115);
pub const REFERENCED_IMAGE_SEQUENCE: Tag = Tag(0x0008, 0x1140);
pub const REFERENCED_SOP_CLASS_UID: Tag = Tag(0x0008, 0x1150);
pub const REFERENCED_SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x1155);
pub const SOURCE_IMAGE_SEQUENCE: Tag = Tag(0x0008, 0x2112);
pub const DERIVATION_CODE_SEQUENCE: Tag = Tag(0x0008, 0x9215);
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);
pub const PATIENT_AGE: Tag = Tag(0x0010, 0x1010);
pub const PATIENT_WEIGHT: Tag = Tag(0x0010, 0x1030);
pub const SLICE_THICKNESS: Tag = Tag(0x0018, 0x0050);
pub const PROTOCOL_NAME: Tag = Tag(0x0018, 0x1030);
pub const SEQUENCE_OF_ULTRASOUND_REGIONS: Tag = Tag(0x0018, 0x6011);
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
pub const STUDY_ID: Tag = Tag(0x0020, 0x0010);
pub const SERIES_NUMBER: Tag = Tag(0x0020, 0x0011);
pub const INSTANCE_NUMBER: Tag = Tag(0x0020, 0x0013);
pub const IMAGE_POSITION_PATIENT: Tag = Tag(0x0020, 0x0032);
pub const IMAGE_ORIENTATION_PATIENT: Tag = Tag(0x0020, 0x0037);
pub const FRAME_OF_REFERENCE_UID: Tag = Tag(0x0020, 0x0052);
pub const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
pub const NUMBER_OF_FRAMES: Tag = Tag(0x0028, 0x0008);
pub const ROWS: Tag = Tag(0x0028, 0x0010);
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
pub const PIXEL_SPACING: Tag = Tag(0x0028, 0x0030);
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
pub const BITS_STORED: Tag = Tag(0x0028, 0x0101);
pub const HIGH_BIT: Tag = Tag(0x0028, 0x0102);
pub const PIXEL_REPRESENTATION: Tag = Tag(0x0028, 0x0103);
pub const WINDOW_CENTER: Tag = Tag(0x0028, 0x1050);
pub const WINDOW_WIDTH: Tag = Tag(0x0028, 0x1051);
pub const RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
pub const RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);
pub const REQUESTED_PROCEDURE_CODE_SEQUENCE: Tag = Tag(0x0032, 0x1064);
pub const PERFORMED_PROTOCOL_CODE_SEQUENCE: Tag = Tag(0x0040, 0x0260);
pub const REQUEST_ATTRIBUTES_SEQUENCE: Tag = Tag(0x0040, 0x0275);
pub const RELATIONSHIP_TYPE: Tag = Tag(0x0040, 0xA010);
pub const VALUE_TYPE: Tag = Tag(0x0040, 0xA040);
pub const CONCEPT_NAME_CODE_SEQUENCE: Tag = Tag(0x0040, 0xA043);
pub const TEXT_VALUE: Tag = Tag(0x0040, 0xA160);
pub const CONTENT_SEQUENCE: Tag = Tag(0x0040, 0xA730);
pub const RADIOPHARMACEUTICAL_INFORMATION_SEQUENCE: Tag = Tag(0x0054, 0x0016);
pub const VIEW_CODE_SEQUENCE: Tag = Tag(0x0054, 0x0220);
pub const ICON_IMAGE_SEQUENCE: Tag = Tag(0x0088, 0x0200);
pub const SHARED_FUNCTIONAL_GROUPS_SEQUENCE: Tag = Tag(0x5200, 0x9229);
pub const PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE: Tag = Tag(0x5200, 0x9230);
pub const WAVEFORM_SEQUENCE: Tag = Tag(0x5400, 0x0100);
pub const WAVEFORM_DATA: Tag = Tag(0x5400, 0x1010);
pub const FLOAT_PIXEL_DATA: Tag = Tag(0x7FE0, 0x0008);
pub const DOUBLE_FLOAT_PIXEL_DATA: Tag = Tag(0x7FE0, 0x0009);
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);
pub const CURVE_DIMENSIONS: Tag = Tag(0x5000, 0x0005);
pub const NUMBER_OF_POINTS: Tag = Tag(0x5000, 0x0010);
pub const CURVE_DATA: Tag = Tag(0x5000, 0x3000);
pub const OVERLAY_ROWS: Tag = Tag(0x6000, 0x0010);
pub const OVERLAY_COLUMNS: Tag = Tag(0x6000, 0x0011);
pub const OVERLAY_TYPE: Tag = Tag(0x6000, 0x0040);
pub const OVERLAY_ORIGIN: Tag = Tag(0x6000, 0x0050);
pub const OVERLAY_BITS_ALLOCATED: Tag = Tag(0x6000, 0x0100);
pub const OVERLAY_BIT_POSITION: Tag = Tag(0x6000, 0x0102);
pub const OVERLAY_DATA: Tag = Tag(0x6000, 0x3000);

/// All entries of the registry.
#[rustfmt::skip]
pub(crate) const ENTRIES: &[E] = &[
    E { tag: Single(COMMAND_GROUP_LENGTH), alias: "CommandGroupLength", vr: VR::UL },
    E { tag: Single(AFFECTED_SOP_CLASS_UID), alias: "AffectedSOPClassUID", vr: VR::UI },
    E { tag: Single(REQUESTED_SOP_CLASS_UID), alias: "RequestedSOPClassUID", vr: VR::UI },
    E { tag: Single(COMMAND_FIELD), alias: "CommandField", vr: VR::US },
    E { tag: Single(MESSAGE_ID), alias: "MessageID", vr: VR::US },
    E { tag: Single(MESSAGE_ID_BEING_RESPONDED_TO), alias: "MessageIDBeingRespondedTo", vr: VR::US },
    E { tag: Single(MOVE_DESTINATION), alias: "MoveDestination", vr: VR::AE },
    E { tag: Single(PRIORITY), alias: "Priority", vr: VR::US },
    E { tag: Single(COMMAND_DATA_SET_TYPE), alias: "CommandDataSetType", vr: VR::US },
    E { tag: Single(STATUS), alias: "Status", vr: VR::US },
    E { tag: Single(AFFECTED_SOP_INSTANCE_UID), alias: "AffectedSOPInstanceUID", vr: VR::UI },
    E { tag: Single(REQUESTED_SOP_INSTANCE_UID), alias: "RequestedSOPInstanceUID", vr: VR::UI },
    E { tag: Single(FILE_META_INFORMATION_GROUP_LENGTH), alias: "FileMetaInformationGroupLength", vr: VR::UL },
    E { tag: Single(FILE_META_INFORMATION_VERSION), alias: "FileMetaInformationVersion", vr: VR::OB },
    E { tag: Single(MEDIA_STORAGE_SOP_CLASS_UID), alias: "MediaStorageSOPClassUID", vr: VR::UI },
    E { tag: Single(MEDIA_STORAGE_SOP_INSTANCE_UID), alias: "MediaStorageSOPInstanceUID", vr: VR::UI },
    E { tag: Single(TRANSFER_SYNTAX_UID), alias: "TransferSyntaxUID", vr: VR::UI },
    E { tag: Single(IMPLEMENTATION_CLASS_UID), alias: "ImplementationClassUID", vr: VR::UI },
    E { tag: Single(IMPLEMENTATION_VERSION_NAME), alias: "ImplementationVersionName", vr: VR::SH },
    E { tag: Single(SOURCE_APPLICATION_ENTITY_TITLE), alias: "SourceApplicationEntityTitle", vr: VR::AE },
    E { tag: Single(SENDING_APPLICATION_ENTITY_TITLE), alias: "SendingApplicationEntityTitle", vr: VR::AE },
    E { tag: Single(RECEIVING_APPLICATION_ENTITY_TITLE), alias: "ReceivingApplicationEntityTitle", vr: VR::AE },
    E { tag: Single(PRIVATE_INFORMATION_CREATOR_UID), alias: "PrivateInformationCreatorUID", vr: VR::UI },
    E { tag: Single(PRIVATE_INFORMATION), alias: "PrivateInformation", vr: VR::OB },
    E { tag: Single(SPECIFIC_CHARACTER_SET), alias: "SpecificCharacterSet", vr: VR::CS },
    E { tag: Single(IMAGE_TYPE), alias: "ImageType", vr: VR::CS },
    E { tag: Single(INSTANCE_CREATION_DATE), alias: "InstanceCreationDate", vr: VR::DA },
    E { tag: Single(INSTANCE_CREATION_TIME), alias: "InstanceCreationTime", vr: VR::TM },
    E { tag: Single(SOP_CLASS_UID), alias: "SOPClassUID", vr: VR::UI },
    E { tag: Single(SOP_INSTANCE_UID), alias: "SOPInstanceUID", vr: VR::UI },
    E { tag: Single(STUDY_DATE), alias: "StudyDate", vr: VR::DA },
    E { tag: Single(SERIES_DATE), alias: "SeriesDate", vr: VR::DA },
    E { tag: Single(STUDY_TIME), alias: "StudyTime", vr: VR::TM },
    E { tag: Single(SERIES_TIME), alias: "SeriesTime", vr: VR::TM },
    E { tag: Single(ACCESSION_NUMBER), alias: "AccessionNumber", vr: VR::SH },
    E { tag: Single(MODALITY), alias: "Modality", vr: VR::CS },
    E { tag: Single(MANUFACTURER), alias: "Manufacturer", vr: VR::LO },
    E { tag: Single(REFERRING_PHYSICIAN_NAME), alias: "ReferringPhysicianName", vr: VR::PN },
    E { tag: Single(CODE_VALUE), alias: "CodeValue", vr: VR::SH },
    E { tag: Single(CODING_SCHEME_DESIGNATOR), alias: "CodingSchemeDesignator", vr: VR::SH },
    E { tag: Single(CODE_MEANING), alias: "CodeMeaning", vr: VR::LO },
    E { tag: Single(STUDY_DESCRIPTION), alias: "StudyDescription", vr: VR::LO },
    E { tag: Single(PROCEDURE_CODE_SEQUENCE), alias: "ProcedureCodeSequence", vr: VR::SQ },
    E { tag: Single(SERIES_DESCRIPTION), alias: "SeriesDescription", vr: VR::LO },
    E { tag: Single(REFERENCED_STUDY_SEQUENCE), alias: "ReferencedStudySequence", vr: VR::SQ },
    E { tag: Single(REFERENCED_SERIES_SEQUENCE), alias: "ReferencedSeriesSequence", vr: VR::SQ },
    E { tag: Single(REFERENCED_IMAGE_SEQUENCE), alias: "ReferencedImageSequence", vr: VR::SQ },
    E { tag: Single(REFERENCED_SOP_CLASS_UID), alias: "ReferencedSOPClassUID", vr: VR::UI },
    E { tag: Single(REFERENCED_SOP_INSTANCE_UID), alias: "ReferencedSOPInstanceUID", vr: VR::UI },
    E { tag: Single(SOURCE_IMAGE_SEQUENCE), alias: "SourceImageSequence", vr: VR::SQ },
    E { tag: Single(DERIVATION_CODE_SEQUENCE), alias: "DerivationCodeSequence", vr: VR::SQ },
    E { tag: Single(PATIENT_NAME), alias: "PatientName", vr: VR::PN },
    E { tag: Single(PATIENT_ID), alias: "PatientID", vr: VR::LO },
    E { tag: Single(PATIENT_BIRTH_DATE), alias: "PatientBirthDate", vr: VR::DA },
    E { tag: Single(PATIENT_SEX), alias: "PatientSex", vr: VR::CS },
    E { tag: Single(PATIENT_AGE), alias: "PatientAge", vr: VR::AS },
    E { tag: Single(PATIENT_WEIGHT), alias: "PatientWeight", vr: VR::DS },
    E { tag: Single(SLICE_THICKNESS), alias: "SliceThickness", vr: VR::DS },
    E { tag: Single(PROTOCOL_NAME), alias: "ProtocolName", vr: VR::LO },
    E { tag: Single(SEQUENCE_OF_ULTRASOUND_REGIONS), alias: "SequenceOfUltrasoundRegions", vr: VR::SQ },
    E { tag: Single(STUDY_INSTANCE_UID), alias: "StudyInstanceUID", vr: VR::UI },
    E { tag: Single(SERIES_INSTANCE_UID), alias: "SeriesInstanceUID", vr: VR::UI },
    E { tag: Single(STUDY_ID), alias: "StudyID", vr: VR::SH },
    E { tag: Single(SERIES_NUMBER), alias: "SeriesNumber", vr: VR::IS },
    E { tag: Single(INSTANCE_NUMBER), alias: "InstanceNumber", vr: VR::IS },
    E { tag: Single(IMAGE_POSITION_PATIENT), alias: "ImagePositionPatient", vr: VR::DS },
    E { tag: Single(IMAGE_ORIENTATION_PATIENT), alias: "ImageOrientationPatient", vr: VR::DS },
    E { tag: Single(FRAME_OF_REFERENCE_UID), alias: "FrameOfReferenceUID", vr: VR::UI },
    E { tag: Single(SAMPLES_PER_PIXEL), alias: "SamplesPerPixel", vr: VR::US },
    E { tag: Single(PHOTOMETRIC_INTERPRETATION), alias: "PhotometricInterpretation", vr: VR::CS },
    E { tag: Single(NUMBER_OF_FRAMES), alias: "NumberOfFrames", vr: VR::IS },
    E { tag: Single(ROWS), alias: "Rows", vr: VR::US },
    E { tag: Single(COLUMNS), alias: "Columns", vr: VR::US },
    E { tag: Single(PIXEL_SPACING), alias: "PixelSpacing", vr: VR::DS },
    E { tag: Single(BITS_ALLOCATED), alias: "BitsAllocated", vr: VR::US },
    E { tag: Single(BITS_STORED), alias: "BitsStored", vr: VR::US },
    E { tag: Single(HIGH_BIT), alias: "HighBit", vr: VR::US },
    E { tag: Single(PIXEL_REPRESENTATION), alias: "PixelRepresentation", vr: VR::US },
    E { tag: Single(WINDOW_CENTER), alias: "WindowCenter", vr: VR::DS },
    E { tag: Single(WINDOW_WIDTH), alias: "WindowWidth", vr: VR::DS },
    E { tag: Single(RESCALE_INTERCEPT), alias: "RescaleIntercept", vr: VR::DS },
    E { tag: Single(RESCALE_SLOPE), alias: "RescaleSlope", vr: VR::DS },
    E { tag: Single(REQUESTED_PROCEDURE_CODE_SEQUENCE), alias: "RequestedProcedureCodeSequence", vr: VR::SQ },
    E { tag: Single(PERFORMED_PROTOCOL_CODE_SEQUENCE), alias: "PerformedProtocolCodeSequence", vr: VR::SQ },
    E { tag: Single(REQUEST_ATTRIBUTES_SEQUENCE), alias: "RequestAttributesSequence", vr: VR::SQ },
    E { tag: Single(RELATIONSHIP_TYPE), alias: "RelationshipType", vr: VR::CS },
    E { tag: Single(VALUE_TYPE), alias: "ValueType", vr: VR::CS },
    E { tag: Single(CONCEPT_NAME_CODE_SEQUENCE), alias: "ConceptNameCodeSequence", vr: VR::SQ },
    E { tag: Single(TEXT_VALUE), alias: "TextValue", vr: VR::UT },
    E { tag: Single(CONTENT_SEQUENCE), alias: "ContentSequence", vr: VR::SQ },
    E { tag: Single(RADIOPHARMACEUTICAL_INFORMATION_SEQUENCE), alias: "RadiopharmaceuticalInformationSequence", vr: VR::SQ },
    E { tag: Single(VIEW_CODE_SEQUENCE), alias: "ViewCodeSequence", vr: VR::SQ },
    E { tag: Single(ICON_IMAGE_SEQUENCE), alias: "IconImageSequence", vr: VR::SQ },
    E { tag: Single(SHARED_FUNCTIONAL_GROUPS_SEQUENCE), alias: "SharedFunctionalGroupsSequence", vr: VR::SQ },
    E { tag: Single(PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE), alias: "PerFrameFunctionalGroupsSequence", vr: VR::SQ },
    E { tag: Single(WAVEFORM_SEQUENCE), alias: "WaveformSequence", vr: VR::SQ },
    E { tag: Single(WAVEFORM_DATA), alias: "WaveformData", vr: VR::OW },
    E { tag: Single(FLOAT_PIXEL_DATA), alias: "FloatPixelData", vr: VR::OF },
    E { tag: Single(DOUBLE_FLOAT_PIXEL_DATA), alias: "DoubleFloatPixelData", vr: VR::OD },
    E { tag: Single(PIXEL_DATA), alias: "PixelData", vr: VR::OW },
    E { tag: Group100(CURVE_DIMENSIONS), alias: "CurveDimensions", vr: VR::US },
    E { tag: Group100(NUMBER_OF_POINTS), alias: "NumberOfPoints", vr: VR::US },
    E { tag: Group100(CURVE_DATA), alias: "CurveData", vr: VR::OB },
    E { tag: Group100(OVERLAY_ROWS), alias: "OverlayRows", vr: VR::US },
    E { tag: Group100(OVERLAY_COLUMNS), alias: "OverlayColumns", vr: VR::US },
    E { tag: Group100(OVERLAY_TYPE), alias: "OverlayType", vr: VR::CS },
    E { tag: Group100(OVERLAY_ORIGIN), alias: "OverlayOrigin", vr: VR::SS },
    E { tag: Group100(OVERLAY_BITS_ALLOCATED), alias: "OverlayBitsAllocated", vr: VR::US },
    E { tag: Group100(OVERLAY_BIT_POSITION), alias: "OverlayBitPosition", vr: VR::US },
    E { tag: Group100(OVERLAY_DATA), alias: "OverlayData", vr: VR::OW },
];
