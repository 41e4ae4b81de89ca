//! This module contains the implementation for an in-memory DICOM object.
//!
//! An [`InMemDicomObject`] holds its elements in tag order.
//! Items of a sequence are objects themselves,
//! which know their place in the tree through an [`ItemLink`]:
//! the tag of the sequence owning them, their item number and nesting level,
//! and the character set inherited from their parent.
//!
//! Items read lazily keep their undecoded content
//! until one of their elements is first accessed,
//! hence the fallible accessors.

use crate::read::DicomReader;
use crate::write::DicomWriter;
use crate::{
    AccessByNameError, AccessError, InvalidPrivateGroupSnafu, LoadItemSnafu,
    MissingElementValueSnafu, NoSuchAttributeNameSnafu, NoSuchDataElementTagSnafu,
    PrematureEndSnafu, ReadError, ReadTokenSnafu, UnexpectedTokenSnafu,
    UnresolvedPrivateCreatorSnafu, WriteError,
};
use dcmcodec_core::dictionary::{DataDictionary, DataDictionaryEntry};
use dcmcodec_core::header::{GroupNumber, HasLength, Header, Length, Tag, VR};
use dcmcodec_core::value::{PixelFragmentSequence, Value};
use dcmcodec_core::DataElement;
use dcmcodec_dictionary::StandardDataDictionary;
use dcmcodec_encoding::text::SpecificCharacterSet;
use dcmcodec_encoding::transfer_syntax::entries::IMPLICIT_VR_LITTLE_ENDIAN;
use dcmcodec_encoding::TransferSyntax;
use dcmcodec_parser::dataset::{DataSetReader, DataSetReaderOptions, DataToken, LazyItem};
use once_cell::sync::OnceCell;
use snafu::{OptionExt, ResultExt};
use std::collections::{btree_map, BTreeMap};
use std::io::{BufRead, Read, Write};

/// A full in-memory DICOM data element.
pub type InMemElement<D = StandardDataDictionary> = DataElement<InMemDicomObject<D>>;

type Result<T, E = AccessError> = std::result::Result<T, E>;

/// The place of a sequence item in its parent data set.
///
/// This is plain data: it does not keep the parent alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLink {
    /// the tag of the sequence element owning the item
    pub parent_tag: Tag,
    /// the position of the item in the sequence, starting at 1
    pub item_number: u32,
    /// the nesting level of the item, 1 for items of the root data set
    pub nesting_level: u32,
    /// the character set in effect in the parent data set
    pub charset: SpecificCharacterSet,
}

/// The undecoded content of a lazily read item,
/// and what it takes to decode it.
#[derive(Debug, Clone)]
struct LazyContent {
    item: LazyItem,
    ts: &'static TransferSyntax,
    options: DataSetReaderOptions,
}

/// A DICOM object that is fully contained in memory,
/// save for bulk data references and items not yet loaded.
#[derive(Debug, Clone)]
pub struct InMemDicomObject<D = StandardDataDictionary> {
    /// the element map, filled on first access for lazy items
    entries: OnceCell<BTreeMap<Tag, InMemElement<D>>>,
    /// the content to decode on first access
    lazy: Option<Box<LazyContent>>,
    /// the data dictionary
    dict: D,
    /// The length of the DICOM object in bytes.
    /// It is usually undefined, unless it is part of an item
    /// in a sequence with a specified length in its item header.
    len: Length,
    /// the position where the content of the object was read from
    offset: Option<u64>,
    /// the place of this item in its parent, `None` for a root data set
    link: Option<ItemLink>,
}

impl<D> PartialEq for InMemDicomObject<D>
where
    D: DataDictionary + Clone,
{
    /// Objects are equal if their elements have the same tags,
    /// value representations and values.
    /// Lengths, positions and the dictionary are ignored,
    /// and items not yet loaded are loaded for comparison.
    fn eq(&self, other: &Self) -> bool {
        match (self.entries(), other.entries()) {
            (Ok(a), Ok(b)) => {
                a.len() == b.len()
                    && a.values().zip(b.values()).all(|(x, y)| {
                        x.tag() == y.tag() && x.vr() == y.vr() && x.value() == y.value()
                    })
            }
            _ => false,
        }
    }
}

impl<D> HasLength for InMemDicomObject<D> {
    fn length(&self) -> Length {
        self.len
    }
}

impl InMemDicomObject<StandardDataDictionary> {
    /// Create a new empty DICOM object.
    pub fn new_empty() -> Self {
        InMemDicomObject::new_empty_with_dict(StandardDataDictionary)
    }

    /// Construct a DICOM object from a sequence of data elements.
    ///
    /// Elements with a repeated tag replace the earlier ones.
    pub fn from_element_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = InMemElement<StandardDataDictionary>>,
    {
        InMemDicomObject::from_iter_with_dict(iter, StandardDataDictionary)
    }

    /// Read a raw data set in the given transfer syntax,
    /// with the standard data dictionary.
    pub fn read_dataset_with_ts<S>(from: S, ts: &'static TransferSyntax) -> Result<Self, ReadError>
    where
        S: Read,
    {
        DicomReader::new(std::io::BufReader::new(from))
            .with_transfer_syntax(ts)
            .read_data_set()
    }
}

impl<D> InMemDicomObject<D> {
    /// The nesting level of this data set:
    /// 0 for a root data set, 1 for its items, and so on.
    pub fn nesting_level(&self) -> u32 {
        self.link.map(|l| l.nesting_level).unwrap_or(0)
    }

    /// The position of this item in its sequence, starting at 1.
    /// `None` for a root data set.
    pub fn item_number(&self) -> Option<u32> {
        self.link.map(|l| l.item_number)
    }

    /// The tag of the sequence owning this item.
    /// `None` for a root data set.
    pub fn parent_tag(&self) -> Option<Tag> {
        self.link.map(|l| l.parent_tag)
    }

    /// The link of this item to its parent.
    pub fn link(&self) -> Option<ItemLink> {
        self.link
    }

    /// The position in the source where the content of this object starts,
    /// if it was read from one.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// The length of this item as found in its item header,
    /// undefined for root data sets and delimited items.
    pub fn item_length(&self) -> Length {
        self.len
    }

    /// Whether the elements of this object are in memory.
    /// Only lazily read items are ever unloaded.
    pub fn is_loaded(&self) -> bool {
        self.entries.get().is_some() || self.lazy.is_none()
    }

    /// The data dictionary of this object.
    pub fn dictionary(&self) -> &D {
        &self.dict
    }

    fn inherited_charset(&self) -> SpecificCharacterSet {
        self.link.map(|l| l.charset).unwrap_or_default()
    }
}

impl<D> InMemDicomObject<D>
where
    D: DataDictionary + Clone,
{
    /// Create a new empty object, using the given dictionary for name lookup.
    pub fn new_empty_with_dict(dict: D) -> Self {
        InMemDicomObject {
            entries: OnceCell::from(BTreeMap::new()),
            lazy: None,
            dict,
            len: Length::UNDEFINED,
            offset: None,
            link: None,
        }
    }

    /// Construct a DICOM object from a sequence of data elements,
    /// using the given dictionary for name lookup.
    pub fn from_iter_with_dict<I>(iter: I, dict: D) -> Self
    where
        I: IntoIterator<Item = InMemElement<D>>,
    {
        let mut entries: BTreeMap<Tag, InMemElement<D>> =
            iter.into_iter().map(|e| (e.tag(), e)).collect();
        let charset = charset_in(&entries, SpecificCharacterSet::default());
        for elem in entries.values_mut() {
            link_items(elem, 0, charset);
        }
        InMemDicomObject {
            entries: OnceCell::from(entries),
            lazy: None,
            dict,
            len: Length::UNDEFINED,
            offset: None,
            link: None,
        }
    }

    /// Retrieve a particular DICOM element by its tag.
    pub fn element(&self, tag: Tag) -> Result<&InMemElement<D>> {
        self.entries()?
            .get(&tag)
            .context(NoSuchDataElementTagSnafu { tag })
    }

    /// Retrieve a particular DICOM element by its tag,
    /// or `None` if it is not in the object.
    pub fn element_opt(&self, tag: Tag) -> Result<Option<&InMemElement<D>>> {
        Ok(self.entries()?.get(&tag))
    }

    /// Retrieve a particular DICOM element by its keyword,
    /// such as `PatientName`.
    pub fn element_by_name(&self, name: &str) -> Result<&InMemElement<D>, AccessByNameError> {
        let tag = self.lookup_name(name)?;
        self.element(tag).map_err(|e| e.into_access_by_name(name))
    }

    /// Retrieve a private element
    /// by its group, private creator and element byte.
    ///
    /// The private creator is looked up among the slots
    /// `(gggg,0010)` to `(gggg,00FF)` of the group,
    /// and the element is then `(gggg,xxee)`
    /// where `xx` is the slot found and `ee` is `element`.
    pub fn private_element(
        &self,
        group: GroupNumber,
        creator: &str,
        element: u8,
    ) -> Result<&InMemElement<D>> {
        if group % 2 == 0 {
            return InvalidPrivateGroupSnafu { group }.fail();
        }
        let entries = self.entries()?;
        let slot = (0x0010..=0x00FF_u16)
            .find(|slot| {
                entries
                    .get(&Tag(group, *slot))
                    .and_then(|e| e.to_str().ok())
                    .map(|v| v.trim_end_matches(|c: char| c == ' ' || c == '\0') == creator)
                    .unwrap_or(false)
            })
            .context(UnresolvedPrivateCreatorSnafu { group, creator })?;
        let tag = Tag(group, (slot << 8) | u16::from(element));
        entries.get(&tag).context(NoSuchDataElementTagSnafu { tag })
    }

    /// Iterate over the elements of this object, in tag order.
    pub fn iter(&self) -> Result<btree_map::Values<'_, Tag, InMemElement<D>>> {
        Ok(self.entries()?.values())
    }

    /// Iterate over the tags of this object's elements, in order.
    pub fn tags(&self) -> Result<impl Iterator<Item = Tag> + '_> {
        Ok(self.entries()?.keys().copied())
    }

    /// The number of elements in this object.
    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    /// Whether this object has no elements.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.entries()?.is_empty())
    }

    /// The specific character set in effect for the text of this object:
    /// its own Specific Character Set element if present,
    /// otherwise the one inherited from its parent.
    pub fn charset(&self) -> Result<SpecificCharacterSet> {
        Ok(charset_in(self.entries()?, self.inherited_charset()))
    }

    /// Insert a data element into the object,
    /// replacing (and returning) any previous element of the same tag.
    ///
    /// The items of an inserted sequence are linked to this object.
    pub fn put(&mut self, elt: InMemElement<D>) -> Result<Option<InMemElement<D>>> {
        let tag = elt.tag();
        let level = self.nesting_level();
        let inherited = self.inherited_charset();
        self.update(|entries| {
            let old = entries.insert(tag, elt);
            let charset = charset_in(entries, inherited);
            if tag == Tag::SPECIFIC_CHARACTER_SET {
                // every item inherits the new character set
                for elem in entries.values_mut() {
                    link_items(elem, level, charset);
                }
            } else if let Some(elem) = entries.get_mut(&tag) {
                link_items(elem, level, charset);
            }
            old
        })
    }

    /// Remove a DICOM element by its tag,
    /// reporting whether it was present.
    pub fn remove_element(&mut self, tag: Tag) -> Result<bool> {
        self.update(|entries| entries.remove(&tag).is_some())
    }

    /// Remove and return a particular DICOM element by its tag.
    pub fn take_element(&mut self, tag: Tag) -> Result<InMemElement<D>> {
        self.update(|entries| entries.remove(&tag))?
            .context(NoSuchDataElementTagSnafu { tag })
    }

    /// Drop every element before the given tag,
    /// such as those already written out while streaming a large data set.
    pub fn purge_before(&mut self, tag: Tag) -> Result<()> {
        self.update(|entries| {
            let rest = entries.split_off(&tag);
            *entries = rest;
        })
    }

    /// Decode this object and every item within, recursively.
    pub fn load_all(&self) -> Result<()> {
        for elem in self.entries()?.values() {
            if let Some(items) = elem.items() {
                for item in items {
                    item.load_all()?;
                }
            }
        }
        Ok(())
    }

    /// Write this object's data set into the given writer
    /// in the given transfer syntax,
    /// with the default length encoding options.
    pub fn write_dataset_with_ts<W>(&self, to: W, ts: &'static TransferSyntax) -> Result<W, WriteError>
    where
        W: Write,
    {
        let mut writer = DicomWriter::new(to).with_encoding(ts)?;
        writer.write_data_set(self)?;
        writer.finish()
    }

    fn lookup_name(&self, name: &str) -> Result<Tag, AccessByNameError> {
        self.dict
            .by_name(name)
            .context(NoSuchAttributeNameSnafu { name })
            .map(|e| e.tag_range().inner())
    }

    fn entries(&self) -> Result<&BTreeMap<Tag, InMemElement<D>>> {
        self.entries.get_or_try_init(|| self.load_lazy())
    }

    /// Apply a change to the elements,
    /// loading them first if need be.
    fn update<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut BTreeMap<Tag, InMemElement<D>>) -> T,
    {
        let mut entries = match self.entries.take() {
            Some(entries) => entries,
            None => self.load_lazy()?,
        };
        // the original bytes no longer describe the object
        self.lazy = None;
        let out = f(&mut entries);
        self.entries = OnceCell::from(entries);
        Ok(out)
    }

    fn load_lazy(&self) -> Result<BTreeMap<Tag, InMemElement<D>>> {
        let lazy = match &self.lazy {
            Some(lazy) => lazy,
            None => return Ok(BTreeMap::new()),
        };
        let offset = lazy.item.offset;
        tracing::trace!(
            "Loading item #{} of {:?} at position {}",
            self.item_number().unwrap_or(0),
            self.parent_tag(),
            offset
        );
        let ts: &'static TransferSyntax = if lazy.item.implicit_vr_le {
            &IMPLICIT_VR_LITTLE_ENDIAN
        } else {
            lazy.ts
        };
        let level = self.nesting_level();
        let options = lazy.options.clone().base_offset(offset).base_level(level);
        let mut reader = DataSetReader::new_with_ts_cs_options(
            &lazy.item.data[..],
            ts,
            self.dict.clone(),
            lazy.item.charset,
            options,
        );
        Self::build_entries(&mut reader, &self.dict, lazy.ts, level, false)
            .context(LoadItemSnafu { offset })
    }

    /// Build a root object by consuming a data set reader.
    pub(crate) fn read_from<R>(
        reader: &mut DataSetReader<R, D>,
        dict: D,
        ts: &'static TransferSyntax,
    ) -> Result<Self, ReadError>
    where
        R: BufRead,
    {
        let offset = reader.decoder().position();
        let level = reader.options().base_level;
        let entries = Self::build_entries(reader, &dict, ts, level, false)?;
        Ok(InMemDicomObject {
            entries: OnceCell::from(entries),
            lazy: None,
            dict,
            len: Length::UNDEFINED,
            offset: Some(offset),
            link: None,
        })
    }

    /// Collect the elements of a data set at the given nesting level,
    /// until the end of the item if `in_item`,
    /// or else until the tokens run out.
    fn build_entries<R>(
        reader: &mut DataSetReader<R, D>,
        dict: &D,
        ts: &'static TransferSyntax,
        level: u32,
        in_item: bool,
    ) -> Result<BTreeMap<Tag, InMemElement<D>>, ReadError>
    where
        R: BufRead,
    {
        let mut entries: BTreeMap<Tag, InMemElement<D>> = BTreeMap::new();
        // perform a structured parsing of incoming tokens
        while let Some(token) = reader.next() {
            let elem = match token.context(ReadTokenSnafu)? {
                DataToken::ElementHeader(header) => {
                    // fetch respective value, place it in the entries
                    let next_token = reader.next().context(MissingElementValueSnafu)?;
                    match next_token.context(ReadTokenSnafu)? {
                        DataToken::PrimitiveValue(v) => DataElement::new_with_len(
                            header.tag,
                            header.vr,
                            header.len,
                            Value::Primitive(v),
                        ),
                        DataToken::BulkData(b) => DataElement::new_with_len(
                            header.tag,
                            header.vr,
                            header.len,
                            Value::BulkData(b),
                        ),
                        token => {
                            return UnexpectedTokenSnafu { token }.fail();
                        }
                    }
                }
                DataToken::PixelSequenceStart => {
                    let value = Self::build_encapsulated_data(reader)?;
                    DataElement::new(Tag::PIXEL_DATA, VR::OB, value)
                }
                DataToken::SequenceStart { tag, vr, len } => {
                    // sequences of unknown VR keep it
                    let items = Self::build_sequence(reader, dict, ts, tag, level + 1)?;
                    DataElement::new_with_len(tag, vr, len, Value::Sequence(items))
                }
                DataToken::ItemEnd if in_item => {
                    // end of item, leave now
                    return Ok(entries);
                }
                token => return UnexpectedTokenSnafu { token }.fail(),
            };
            entries.insert(elem.tag(), elem);
        }

        if in_item {
            PrematureEndSnafu.fail()
        } else {
            Ok(entries)
        }
    }

    /// Build the items of a sequence by consuming a data set reader.
    fn build_sequence<R>(
        reader: &mut DataSetReader<R, D>,
        dict: &D,
        ts: &'static TransferSyntax,
        parent_tag: Tag,
        level: u32,
    ) -> Result<Vec<Self>, ReadError>
    where
        R: BufRead,
    {
        let mut items = Vec::new();
        while let Some(token) = reader.next() {
            match token.context(ReadTokenSnafu)? {
                DataToken::ItemStart { len } => {
                    let link = ItemLink {
                        parent_tag,
                        item_number: items.len() as u32 + 1,
                        nesting_level: level,
                        charset: reader.decoder().charset(),
                    };
                    let offset = reader.decoder().position();
                    let entries = Self::build_entries(reader, dict, ts, level, true)?;
                    items.push(InMemDicomObject {
                        entries: OnceCell::from(entries),
                        lazy: None,
                        dict: dict.clone(),
                        len,
                        offset: Some(offset),
                        link: Some(link),
                    });
                }
                DataToken::LazyItem(item) => {
                    let link = ItemLink {
                        parent_tag,
                        item_number: items.len() as u32 + 1,
                        nesting_level: level,
                        charset: item.charset,
                    };
                    items.push(InMemDicomObject {
                        entries: OnceCell::new(),
                        dict: dict.clone(),
                        len: item.len,
                        offset: Some(item.offset),
                        link: Some(link),
                        lazy: Some(Box::new(LazyContent {
                            item,
                            ts,
                            options: reader.item_options(),
                        })),
                    });
                }
                DataToken::SequenceEnd => {
                    return Ok(items);
                }
                token => return UnexpectedTokenSnafu { token }.fail(),
            };
        }

        // iterator fully consumed without a sequence delimiter
        PrematureEndSnafu.fail()
    }

    /// Build an encapsulated pixel data value
    /// by collecting the offset table and all fragments.
    fn build_encapsulated_data<R>(
        reader: &mut DataSetReader<R, D>,
    ) -> Result<PixelFragmentSequence, ReadError>
    where
        R: BufRead,
    {
        let mut offset_table = None;
        let mut fragments = Vec::new();
        let mut item_has_value = false;

        while let Some(token) = reader.next() {
            match token.context(ReadTokenSnafu)? {
                DataToken::ItemStart { .. } => item_has_value = false,
                DataToken::OffsetTable(table) => {
                    offset_table = Some(table);
                    item_has_value = true;
                }
                DataToken::ItemValue(data) => {
                    fragments.push(data);
                    item_has_value = true;
                }
                DataToken::ItemEnd => {
                    // the first item is the offset table, even when empty
                    if offset_table.is_none() {
                        offset_table = Some(Vec::new());
                    } else if !item_has_value {
                        fragments.push(Vec::new());
                    }
                }
                DataToken::SequenceEnd => {
                    return Ok(PixelFragmentSequence::new(
                        offset_table.unwrap_or_default(),
                        fragments,
                    ));
                }
                token => return UnexpectedTokenSnafu { token }.fail(),
            }
        }

        PrematureEndSnafu.fail()
    }
}

/// The character set declared in the given elements,
/// or `inherited` if there is none.
fn charset_in<D>(
    entries: &BTreeMap<Tag, InMemElement<D>>,
    inherited: SpecificCharacterSet,
) -> SpecificCharacterSet {
    entries
        .get(&Tag::SPECIFIC_CHARACTER_SET)
        .and_then(|e| e.to_str().ok())
        .and_then(|code| SpecificCharacterSet::from_code(&code))
        .unwrap_or(inherited)
}

/// Link the items of a sequence element to the data set at `level`,
/// and the items of loaded items below them.
fn link_items<D>(elem: &mut InMemElement<D>, level: u32, charset: SpecificCharacterSet) {
    let parent_tag = elem.tag();
    if let Some(items) = elem.items_mut() {
        for (i, item) in items.iter_mut().enumerate() {
            item.link = Some(ItemLink {
                parent_tag,
                item_number: i as u32 + 1,
                nesting_level: level + 1,
                charset,
            });
            if let Some(entries) = item.entries.get_mut() {
                let own = charset_in(entries, charset);
                for e in entries.values_mut() {
                    link_items(e, level + 1, own);
                }
            }
        }
    }
}
