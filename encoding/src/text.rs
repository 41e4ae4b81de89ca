//! Text encoding under the character repertoires of DICOM.
//!
//! The character set of a data set is declared by
//! the Specific Character Set (0008,0005) element,
//! and nested sequence items inherit it unless they declare their own.
//! Only single-byte repertoires without code extensions,
//! UTF-8 and GB18030 are supported.

use encoding::all::{
    GB18030, ISO_8859_1, ISO_8859_2, ISO_8859_3, ISO_8859_4, ISO_8859_5, UTF_8,
};
use encoding::{DecoderTrap, EncoderTrap, EncodingRef};
use snafu::{Backtrace, Snafu};
use std::borrow::Cow;

/// Text could not be represented in the character set in effect.
#[derive(Debug, Snafu)]
#[snafu(display("Could not encode text as {}: {}", charset, message))]
pub struct EncodeTextError {
    charset: &'static str,
    message: Cow<'static, str>,
    backtrace: Backtrace,
}

/// Bytes could not be read as text in the character set in effect.
#[derive(Debug, Snafu)]
#[snafu(display("Could not decode text as {}: {}", charset, message))]
pub struct DecodeTextError {
    charset: &'static str,
    message: Cow<'static, str>,
    backtrace: Backtrace,
}

/// Conversion between text values and their encoded bytes.
pub trait TextCodec {
    /// The defined term of the character set,
    /// as written in Specific Character Set.
    fn name(&self) -> &'static str;

    /// Decode a whole value. Backslashes separating
    /// multiple values are kept in the output.
    fn decode(&self, text: &[u8]) -> Result<String, DecodeTextError>;

    /// Encode a whole value, backslashes included.
    fn encode(&self, text: &str) -> Result<Vec<u8>, EncodeTextError>;
}

/// The supported character sets.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum SpecificCharacterSet {
    /// ISO-IR 6, the default repertoire (ASCII).
    #[default]
    Default,
    /// ISO-IR 100, Latin alphabet no. 1 (ISO 8859-1).
    IsoIr100,
    /// ISO-IR 101, Latin alphabet no. 2 (ISO 8859-2).
    IsoIr101,
    /// ISO-IR 109, Latin alphabet no. 3 (ISO 8859-3).
    IsoIr109,
    /// ISO-IR 110, Latin alphabet no. 4 (ISO 8859-4).
    IsoIr110,
    /// ISO-IR 144, Latin/Cyrillic (ISO 8859-5).
    IsoIr144,
    /// ISO-IR 192, Unicode in UTF-8.
    IsoIr192,
    /// GB18030, Simplified Chinese.
    Gb18030,
}

impl SpecificCharacterSet {
    /// Resolve the value of a Specific Character Set element.
    ///
    /// Only the first value is considered,
    /// and the `ISO_IR`, `ISO_IR_` and `ISO 2022 IR` spellings are accepted.
    /// An empty value is the default repertoire.
    ///
    /// ```
    /// # use dcmcodec_encoding::text::SpecificCharacterSet;
    /// assert_eq!(
    ///     SpecificCharacterSet::from_code("ISO_IR 100"),
    ///     Some(SpecificCharacterSet::IsoIr100),
    /// );
    /// ```
    pub fn from_code(code: &str) -> Option<Self> {
        use SpecificCharacterSet::*;

        let term = code
            .split('\\')
            .next()
            .unwrap_or_default()
            .trim_matches(|c: char| c == ' ' || c == '\0');
        match term {
            "" | "Default" => return Some(Default),
            "GB18030" => return Some(Gb18030),
            _ => {}
        }
        let number = ["ISO 2022 IR ", "ISO_IR ", "ISO_IR_"]
            .iter()
            .find_map(|prefix| term.strip_prefix(prefix))?;
        match number {
            "6" => Some(Default),
            "100" => Some(IsoIr100),
            "101" => Some(IsoIr101),
            "109" => Some(IsoIr109),
            "110" => Some(IsoIr110),
            "144" => Some(IsoIr144),
            "192" => Some(IsoIr192),
            _ => None,
        }
    }

    fn encoding(self) -> EncodingRef {
        use SpecificCharacterSet::*;
        match self {
            // ISO 8859-1 agrees with ASCII on its lower half
            Default | IsoIr100 => ISO_8859_1,
            IsoIr101 => ISO_8859_2,
            IsoIr109 => ISO_8859_3,
            IsoIr110 => ISO_8859_4,
            IsoIr144 => ISO_8859_5,
            IsoIr192 => UTF_8,
            Gb18030 => GB18030,
        }
    }
}

impl TextCodec for SpecificCharacterSet {
    fn name(&self) -> &'static str {
        use SpecificCharacterSet::*;
        match self {
            Default => "ISO_IR 6",
            IsoIr100 => "ISO_IR 100",
            IsoIr101 => "ISO_IR 101",
            IsoIr109 => "ISO_IR 109",
            IsoIr110 => "ISO_IR 110",
            IsoIr144 => "ISO_IR 144",
            IsoIr192 => "ISO_IR 192",
            Gb18030 => "GB18030",
        }
    }

    /// Malformed byte sequences become U+FFFD.
    fn decode(&self, text: &[u8]) -> Result<String, DecodeTextError> {
        self.encoding()
            .decode(text, DecoderTrap::Replace)
            .map_err(|message| {
                DecodeTextSnafu {
                    charset: self.name(),
                    message,
                }
                .build()
            })
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>, EncodeTextError> {
        self.encoding()
            .encode(text, EncoderTrap::Strict)
            .map_err(|message| {
                EncodeTextSnafu {
                    charset: self.name(),
                    message,
                }
                .build()
            })
    }
}
