//! This module contains the concept of a DICOM data dictionary.
//!
//! A dictionary translates attribute tags to their keyword and
//! value representation, and keywords back to tags.
//! The codec consults a dictionary only for implicit VR encodings,
//! where the value representation is not in the encoded data.
//! Dictionaries are passed explicitly to whoever needs them.

use crate::header::{Tag, VR};
use std::fmt::Debug;

/// The range of tags covered by a dictionary entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagRange {
    /// A single, fixed tag
    Single(Tag),
    /// A tag repeating in groups `ggxx`,
    /// as in the overlay and curve groups.
    /// The `xx` portion is zeroed.
    Group100(Tag),
    /// A tag repeating in elements `eexx`.
    /// The `xx` portion is zeroed.
    Element100(Tag),
    /// Any group length `(gggg,0000)`
    GroupLength,
    /// Any private creator slot `(gggg,00xx)` in an odd group
    PrivateCreator,
}

impl TagRange {
    /// Retrieve the inner tag representation of this range.
    /// Generic ranges produce a tag with zeroed group.
    pub fn inner(self) -> Tag {
        match self {
            TagRange::Single(tag) | TagRange::Group100(tag) | TagRange::Element100(tag) => tag,
            TagRange::GroupLength => Tag(0x0000, 0x0000),
            TagRange::PrivateCreator => Tag(0x0009, 0x0010),
        }
    }

    /// Check whether the given tag is within this range.
    pub fn contains(self, tag: Tag) -> bool {
        match self {
            TagRange::Single(t) => t == tag,
            TagRange::Group100(t) => t.1 == tag.1 && t.0 == tag.0 & 0xFF00,
            TagRange::Element100(t) => t.0 == tag.0 && t.1 == tag.1 & 0xFF00,
            TagRange::GroupLength => tag.is_group_length(),
            TagRange::PrivateCreator => tag.is_private_creator(),
        }
    }
}

/// The information retained by a dictionary about an attribute.
pub trait DataDictionaryEntry {
    /// The attribute tag or tag range.
    fn tag_range(&self) -> TagRange;
    /// The keyword of the attribute, in UpperCamelCase.
    fn alias(&self) -> &str;
    /// The value representation of the attribute.
    fn vr(&self) -> VR;
}

/// A data dictionary entry with borrowed strings.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DataDictionaryEntryRef<'a> {
    /// The attribute tag or tag range
    pub tag: TagRange,
    /// The alias of the attribute
    pub alias: &'a str,
    /// The value representation
    pub vr: VR,
}

impl<'a> DataDictionaryEntry for DataDictionaryEntryRef<'a> {
    fn tag_range(&self) -> TagRange {
        self.tag
    }
    fn alias(&self) -> &str {
        self.alias
    }
    fn vr(&self) -> VR {
        self.vr
    }
}

/// Type trait for a dictionary of DICOM attributes.
///
/// Implementations are expected to resolve group lengths as `UL`,
/// private creators as `LO`,
/// and tags of the repeating groups `50xx` and `60xx`
/// through their normalized form.
pub trait DataDictionary: Debug {
    /// The type of the dictionary entry.
    type Entry: DataDictionaryEntry;

    /// Fetch an entry by its usual alias (e.g. "PatientName" or "SOPInstanceUID").
    fn by_name(&self, name: &str) -> Option<&Self::Entry>;

    /// Fetch an entry by its tag.
    fn by_tag(&self, tag: Tag) -> Option<&Self::Entry>;

    /// Resolve the value representation of an attribute by its tag.
    fn vr_of(&self, tag: Tag) -> Option<VR> {
        self.by_tag(tag).map(|e| e.vr())
    }
}

impl<'d, D> DataDictionary for &'d D
where
    D: DataDictionary,
{
    type Entry = D::Entry;

    fn by_name(&self, name: &str) -> Option<&Self::Entry> {
        (**self).by_name(name)
    }

    fn by_tag(&self, tag: Tag) -> Option<&Self::Entry> {
        (**self).by_tag(tag)
    }
}

/// An empty attribute dictionary. Every lookup fails,
/// so every element read in an implicit VR encoding becomes `UN`.
#[derive(Debug, Default, Eq, PartialEq, Hash, Clone, Copy)]
pub struct StubDataDictionary;

impl DataDictionary for StubDataDictionary {
    type Entry = DataDictionaryEntryRef<'static>;

    fn by_name(&self, _: &str) -> Option<&DataDictionaryEntryRef<'static>> {
        None
    }

    fn by_tag(&self, _: Tag) -> Option<&DataDictionaryEntryRef<'static>> {
        None
    }
}
