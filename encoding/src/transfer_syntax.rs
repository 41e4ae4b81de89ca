//! Transfer syntax specifiers.
//!
//! A transfer syntax declares how a data set is encoded:
//! whether value representations are explicit in element headers,
//! the byte order of multi-byte fields,
//! and whether the data set is wrapped in deflate compression.
//! The codec supports the four native transfer syntaxes listed in [`entries`].

use byteordered::Endianness;
use dcmcodec_core::VR;

/// A DICOM transfer syntax specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSyntax {
    uid: &'static str,
    name: &'static str,
    explicit_vr: bool,
    endianness: Endianness,
    deflated: bool,
}

/// Constant declarations of the supported transfer syntaxes.
pub mod entries {
    use super::TransferSyntax;
    use byteordered::Endianness;

    /// Implicit VR Little Endian: the default transfer syntax.
    pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
        "1.2.840.10008.1.2",
        "Implicit VR Little Endian",
        false,
        Endianness::Little,
        false,
    );

    /// Explicit VR Little Endian
    pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
        "1.2.840.10008.1.2.1",
        "Explicit VR Little Endian",
        true,
        Endianness::Little,
        false,
    );

    /// Explicit VR Big Endian (retired, still readable and writable)
    pub const EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = TransferSyntax::new(
        "1.2.840.10008.1.2.2",
        "Explicit VR Big Endian",
        true,
        Endianness::Big,
        false,
    );

    /// Deflated Explicit VR Little Endian
    pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
        "1.2.840.10008.1.2.1.99",
        "Deflated Explicit VR Little Endian",
        true,
        Endianness::Little,
        true,
    );

    pub(crate) static ALL: [&TransferSyntax; 4] = [
        &IMPLICIT_VR_LITTLE_ENDIAN,
        &EXPLICIT_VR_LITTLE_ENDIAN,
        &EXPLICIT_VR_BIG_ENDIAN,
        &DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
    ];
}

impl TransferSyntax {
    /// Create a transfer syntax specifier.
    pub const fn new(
        uid: &'static str,
        name: &'static str,
        explicit_vr: bool,
        endianness: Endianness,
        deflated: bool,
    ) -> Self {
        TransferSyntax {
            uid,
            name,
            explicit_vr,
            endianness,
            deflated,
        }
    }

    /// Find a supported transfer syntax by its UID.
    ///
    /// Trailing null characters and spaces are ignored,
    /// as UIDs in DICOM content are padded to an even length.
    pub fn lookup(uid: &str) -> Option<&'static TransferSyntax> {
        let uid = uid.trim_end_matches(|c: char| c == '\0' || c == ' ');
        entries::ALL.iter().copied().find(|ts| ts.uid == uid)
    }

    /// Obtain the transfer syntax identified by the given UID,
    /// falling back to _Explicit VR Little Endian_ if it is not supported.
    pub fn from_uid(uid: &str) -> &'static TransferSyntax {
        TransferSyntax::lookup(uid).unwrap_or_else(|| {
            tracing::warn!(
                "Unsupported transfer syntax `{}`, assuming Explicit VR Little Endian",
                uid.trim_end_matches('\0')
            );
            &entries::EXPLICIT_VR_LITTLE_ENDIAN
        })
    }

    /// Guess the transfer syntax of a raw data set
    /// from the first bytes of its first element header.
    ///
    /// The byte order is taken from the magnitude of the group number
    /// read in either order, favoring little endian on a tie,
    /// and explicit VR is assumed when a valid value representation
    /// code follows the tag.
    /// Returns `None` if fewer than 8 bytes are available,
    /// or if the data looks like implicit VR big endian,
    /// which is not a supported transfer syntax.
    pub fn detect(bytes: &[u8]) -> Option<&'static TransferSyntax> {
        if bytes.len() < 8 {
            return None;
        }
        let group_le = u16::from_le_bytes([bytes[0], bytes[1]]);
        let group_be = u16::from_be_bytes([bytes[0], bytes[1]]);
        let big_endian = group_be < group_le;
        let explicit_vr = VR::from_binary([bytes[4], bytes[5]]).is_some();
        match (explicit_vr, big_endian) {
            (true, false) => Some(&entries::EXPLICIT_VR_LITTLE_ENDIAN),
            (true, true) => Some(&entries::EXPLICIT_VR_BIG_ENDIAN),
            (false, false) => Some(&entries::IMPLICIT_VR_LITTLE_ENDIAN),
            (false, true) => None,
        }
    }

    /// The UID of this transfer syntax.
    pub const fn uid(&self) -> &'static str {
        self.uid
    }

    /// The name of this transfer syntax.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether value representations are encoded in element headers.
    pub const fn is_explicit_vr(&self) -> bool {
        self.explicit_vr
    }

    /// The byte order of the data set.
    pub const fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Whether the data set is compressed with deflate.
    pub const fn is_deflated(&self) -> bool {
        self.deflated
    }
}
