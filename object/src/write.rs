//! Writing in-memory objects as DICOM files and raw data sets.
//!
//! A [`DicomWriter`] establishes the encoding of its output once,
//! either directly with [`with_encoding`](DicomWriter::with_encoding)
//! or from the transfer syntax declared in the file meta group.
//! Data sets are then written in two phases when needed:
//! the encoded lengths of groups, sequences and items
//! are calculated first ([`DicomWriter::calculate_lengths`]),
//! and used while printing the elements afterwards.
use crate::mem::{InMemDicomObject, InMemElement};
use crate::meta::FileMetaTable;
use crate::{
    AccessItemSnafu, EncodeValueSnafu, FinishOutputSnafu, InvalidBulkDataUriSnafu,
    LengthOverflowSnafu, MalformedBulkDataSnafu, ParseBulkDataSnafu, PrintDataSetSnafu,
    PrintMetaDataSetSnafu, ResolveBulkDataSnafu, UnsupportedEncodingStateSnafu,
    WriteError, WriteMagicCodeSnafu, WritePreambleSnafu,
};
use dcmcodec_core::dictionary::StubDataDictionary;
use dcmcodec_core::header::{
    DataElementHeader, GroupNumber, Header, Length, SequenceItemHeader, Tag, VR,
};
use dcmcodec_core::value::{BulkDataRef, PrimitiveValue, Value};
use dcmcodec_core::DataDictionary;
use dcmcodec_encoding::deflate::{deflate_writer, DeflateWriter};
use dcmcodec_encoding::text::SpecificCharacterSet;
use dcmcodec_encoding::transfer_syntax::entries::{
    EXPLICIT_VR_BIG_ENDIAN, EXPLICIT_VR_LITTLE_ENDIAN,
};
use dcmcodec_encoding::{DynEncoder, Encode, Endianness, TransferSyntax};
use dcmcodec_parser::dataset::{DataSetWriter, DataToken};
use dcmcodec_parser::stateful::encode::encode_value;
use dcmcodec_parser::{CachedSource, StatefulDecoder};
use snafu::{ensure, OptionExt, ResultExt};
use std::convert::TryFrom;
use std::fs::File;
use std::io::{self, BufReader, Seek, SeekFrom, Write};

pub type Result<T, E = WriteError> = std::result::Result<T, E>;

/// How the length of a sequence or item is encoded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthEncoding {
    /// Always write the byte count of the content.
    ExplicitAlways,
    /// Always write an undefined length followed by a delimiter,
    /// even when there is no content.
    UndefinedAlways,
    /// Write a zero length when there is no content,
    /// or an undefined length followed by a delimiter otherwise.
    #[default]
    UndefinedUnlessEmpty,
}

impl LengthEncoding {
    /// Whether a delimiter follows the content.
    fn is_undefined(self, empty: bool) -> bool {
        match self {
            LengthEncoding::ExplicitAlways => false,
            LengthEncoding::UndefinedAlways => true,
            LengthEncoding::UndefinedUnlessEmpty => !empty,
        }
    }

    /// The length to write in the header,
    /// given the calculated length of the content if available.
    fn header_length(self, calculated: Option<u32>, empty: bool) -> Length {
        match self {
            LengthEncoding::ExplicitAlways => {
                calculated.map(Length).unwrap_or(Length::UNDEFINED)
            }
            _ if self.is_undefined(empty) => Length::UNDEFINED,
            _ => Length(0),
        }
    }
}

/// The encoded lengths of a data set,
/// as calculated before writing it.
///
/// The lengths are kept in the order in which they are needed:
/// for each element in tag order,
/// the group length when a new group starts (if group lengths are included),
/// then for a sequence, its length followed by,
/// for each item, the item length and the lengths within the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLengths {
    slots: Vec<u32>,
    total: u64,
}

impl EncodedLengths {
    /// The number of bytes of the whole encoded data set.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The calculated lengths, in writing order.
    pub fn slots(&self) -> &[u32] {
        &self.slots
    }
}

/// The destination of the writer,
/// compressed once a deflated transfer syntax is established.
enum Output<W: Write> {
    Plain(W),
    Deflated(DeflateWriter<W>),
    Detached,
}

impl<W: Write> Write for Output<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Plain(w) => w.write(buf),
            Output::Deflated(w) => w.write(buf),
            Output::Detached => Err(io::ErrorKind::BrokenPipe.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Plain(w) => w.flush(),
            Output::Deflated(w) => w.flush(),
            Output::Detached => Ok(()),
        }
    }
}

/// A writer of DICOM files and raw data sets.
///
/// # Example
///
/// ```
/// # use dcmcodec_core::{DataElement, VR};
/// # use dcmcodec_dictionary::tags;
/// # use dcmcodec_encoding::transfer_syntax::entries::IMPLICIT_VR_LITTLE_ENDIAN;
/// # use dcmcodec_object::{InMemDicomObject, LengthEncoding};
/// # use dcmcodec_object::write::DicomWriter;
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let obj = InMemDicomObject::from_element_iter([
///     DataElement::new(tags::MODALITY, VR::CS, "MR"),
/// ]);
/// let mut writer = DicomWriter::new(Vec::new())
///     .with_encoding(&IMPLICIT_VR_LITTLE_ENDIAN)?
///     .with_sequence_length_encoding(LengthEncoding::ExplicitAlways)
///     .with_include_group_length(true);
/// writer.write_data_set(&obj)?;
/// let bytes = writer.finish()?;
/// // group length and modality
/// assert_eq!(bytes.len(), 12 + 10);
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
pub struct DicomWriter<W: Write> {
    out: Output<W>,
    ts: Option<&'static TransferSyntax>,
    include_group_length: bool,
    item_length: LengthEncoding,
    sequence_length: LengthEncoding,
}

impl<W> DicomWriter<W>
where
    W: Write,
{
    /// Create a writer without an established encoding.
    pub fn new(to: W) -> Self {
        DicomWriter {
            out: Output::Plain(to),
            ts: None,
            include_group_length: false,
            item_length: LengthEncoding::default(),
            sequence_length: LengthEncoding::default(),
        }
    }

    /// Establish the transfer syntax of the data set to write.
    ///
    /// Fails if an encoding was already established.
    pub fn with_encoding(mut self, ts: &'static TransferSyntax) -> Result<Self> {
        self.set_encoding(ts)?;
        Ok(self)
    }

    /// Whether to write group length elements
    /// before the elements of each group.
    pub fn with_include_group_length(mut self, include: bool) -> Self {
        self.include_group_length = include;
        self
    }

    /// How to encode the lengths of sequence items.
    pub fn with_item_length_encoding(mut self, encoding: LengthEncoding) -> Self {
        self.item_length = encoding;
        self
    }

    /// How to encode the lengths of sequences.
    pub fn with_sequence_length_encoding(mut self, encoding: LengthEncoding) -> Self {
        self.sequence_length = encoding;
        self
    }

    /// The established transfer syntax, if any.
    pub fn transfer_syntax(&self) -> Option<&'static TransferSyntax> {
        self.ts
    }

    /// Write the preamble, the magic code and the file meta group,
    /// and establish the encoding declared in the table.
    ///
    /// When the transfer syntax is deflated,
    /// everything written after the meta group is compressed.
    pub fn write_file_meta_information(&mut self, meta: &FileMetaTable) -> Result<()> {
        ensure!(
            self.ts.is_none(),
            UnsupportedEncodingStateSnafu {
                reason: "file meta information must precede the data set encoding",
            }
        );
        self.out
            .write_all(&[0; crate::read::PREAMBLE_LEN])
            .context(WritePreambleSnafu)?;
        self.out.write_all(b"DICM").context(WriteMagicCodeSnafu)?;
        meta.write(&mut self.out).context(PrintMetaDataSetSnafu)?;
        self.set_encoding(TransferSyntax::from_uid(&meta.transfer_syntax))
    }

    /// Calculate the encoded lengths of the given data set
    /// in the established encoding.
    pub fn calculate_lengths<D>(&self, obj: &InMemDicomObject<D>) -> Result<EncodedLengths>
    where
        D: DataDictionary + Clone,
    {
        let ts = self.ts.context(UnsupportedEncodingStateSnafu {
            reason: "no encoding was established",
        })?;
        self.layout(DynEncoder::for_transfer_syntax(ts), self.include_group_length)
            .calculate(obj)
    }

    /// Write a data set in the established encoding.
    ///
    /// Lazily read items are loaded as they are written.
    pub fn write_data_set<D>(&mut self, obj: &InMemDicomObject<D>) -> Result<()>
    where
        D: DataDictionary + Clone,
    {
        let ts = self.ts.context(UnsupportedEncodingStateSnafu {
            reason: "no encoding was established",
        })?;
        let layout = self.layout(DynEncoder::for_transfer_syntax(ts), self.include_group_length);
        layout.write(&mut self.out, obj)
    }

    /// Write a command set,
    /// which is always in implicit VR little endian with group length.
    pub fn write_command_set<D>(&mut self, obj: &InMemDicomObject<D>) -> Result<()>
    where
        D: DataDictionary + Clone,
    {
        let layout = self.layout(DynEncoder::implicit_vr_le(), true);
        layout.write(&mut self.out, obj)
    }

    /// Finish writing, completing the compressed stream if applicable,
    /// and retrieve the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        match std::mem::replace(&mut self.out, Output::Detached) {
            Output::Plain(mut w) => {
                w.flush().context(FinishOutputSnafu)?;
                Ok(w)
            }
            Output::Deflated(w) => w.finish().context(FinishOutputSnafu),
            Output::Detached => UnsupportedEncodingStateSnafu {
                reason: "the output was lost",
            }
            .fail(),
        }
    }

    fn set_encoding(&mut self, ts: &'static TransferSyntax) -> Result<()> {
        ensure!(
            self.ts.is_none(),
            UnsupportedEncodingStateSnafu {
                reason: "the encoding was already established",
            }
        );
        if ts.is_deflated() {
            self.out = match std::mem::replace(&mut self.out, Output::Detached) {
                Output::Plain(w) => {
                    tracing::debug!("Deflating output from here on");
                    Output::Deflated(deflate_writer(w))
                }
                other => other,
            };
        }
        self.ts = Some(ts);
        Ok(())
    }

    fn layout(&self, encoder: DynEncoder, include_group_length: bool) -> Layout {
        Layout {
            encoder,
            include_group_length,
            item_length: self.item_length,
            sequence_length: self.sequence_length,
        }
    }
}

/// The encoding options of one data set.
#[derive(Debug, Clone, Copy)]
struct Layout {
    encoder: DynEncoder,
    include_group_length: bool,
    item_length: LengthEncoding,
    sequence_length: LengthEncoding,
}

impl Layout {
    fn needs_lengths(&self) -> bool {
        self.include_group_length
            || self.item_length == LengthEncoding::ExplicitAlways
            || self.sequence_length == LengthEncoding::ExplicitAlways
    }

    fn calculate<D>(&self, obj: &InMemDicomObject<D>) -> Result<EncodedLengths>
    where
        D: DataDictionary + Clone,
    {
        let mut calc = LengthCalculator {
            layout: *self,
            slots: Vec::new(),
            scratch: Vec::new(),
        };
        let total = calc.data_set_len(obj, SpecificCharacterSet::default())?;
        Ok(EncodedLengths {
            slots: calc.slots,
            total,
        })
    }

    fn write<W, D>(&self, out: &mut W, obj: &InMemDicomObject<D>) -> Result<()>
    where
        W: Write,
        D: DataDictionary + Clone,
    {
        let lengths = if self.needs_lengths() {
            Some(self.calculate(obj)?)
        } else {
            None
        };
        let mut printer = DataSetWriter::new(out, self.encoder, SpecificCharacterSet::default());
        let mut emitter = Emitter {
            layout: *self,
            lengths: lengths.as_ref(),
            cursor: 0,
            scratch: Vec::new(),
        };
        emitter.write_data_set(&mut printer, obj)?;
        printer.flush().context(PrintDataSetSnafu)
    }

    /// The size of a group length element.
    fn group_length_element_len(&self) -> u64 {
        u64::from(self.encoder.header_len(VR::UL)) + 4
    }
}

/// Whether an item has no content to write.
fn is_empty_item<D>(item: &InMemDicomObject<D>) -> Result<bool>
where
    D: DataDictionary + Clone,
{
    Ok(item
        .iter()
        .context(AccessItemSnafu)?
        .all(|e| e.tag().is_group_length()))
}

fn to_u32(len: u64, tag: Tag) -> Result<u32> {
    u32::try_from(len)
        .ok()
        .filter(|len| *len != Length::UNDEFINED.0)
        .context(LengthOverflowSnafu { tag })
}

/// The character set switched to by an element, if any.
fn charset_switch<D>(elem: &InMemElement<D>) -> Option<SpecificCharacterSet> {
    if elem.tag() != Tag::SPECIFIC_CHARACTER_SET {
        return None;
    }
    elem.to_str()
        .ok()
        .and_then(|code| SpecificCharacterSet::from_code(&code))
}

struct LengthCalculator {
    layout: Layout,
    slots: Vec<u32>,
    scratch: Vec<u8>,
}

impl LengthCalculator {
    fn reserve(&mut self) -> usize {
        self.slots.push(0);
        self.slots.len() - 1
    }

    fn data_set_len<D>(
        &mut self,
        obj: &InMemDicomObject<D>,
        mut charset: SpecificCharacterSet,
    ) -> Result<u64>
    where
        D: DataDictionary + Clone,
    {
        let mut total = 0;
        // group number, slot and length so far
        let mut group: Option<(GroupNumber, usize, u64)> = None;
        for elem in obj.iter().context(AccessItemSnafu)? {
            let tag = elem.tag();
            if tag.is_group_length() {
                continue;
            }
            if self.layout.include_group_length
                && group.map(|(g, _, _)| g) != Some(tag.group())
            {
                if let Some((g, slot, len)) = group.take() {
                    self.slots[slot] = to_u32(len, Tag(g, 0))?;
                }
                group = Some((tag.group(), self.reserve(), 0));
                total += self.layout.group_length_element_len();
            }
            let len = self.element_len(elem, charset)?;
            if let Some((_, _, group_len)) = group.as_mut() {
                *group_len += len;
            }
            total += len;
            if let Some(cs) = charset_switch(elem) {
                charset = cs;
            }
        }
        if let Some((g, slot, len)) = group {
            self.slots[slot] = to_u32(len, Tag(g, 0))?;
        }
        Ok(total)
    }

    fn element_len<D>(&mut self, elem: &InMemElement<D>, charset: SpecificCharacterSet) -> Result<u64>
    where
        D: DataDictionary + Clone,
    {
        let tag = elem.tag();
        let encoder = self.layout.encoder;
        let len = match elem.value() {
            Value::Primitive(value) => {
                self.scratch.clear();
                encode_value(elem.vr(), value, charset, encoder.basic(), &mut self.scratch)
                    .context(EncodeValueSnafu { tag })?;
                u64::from(encoder.header_len(elem.vr())) + self.scratch.len() as u64
            }
            Value::Sequence(items) => {
                let seq_slot = self.reserve();
                let mut seq_len = 0;
                for item in items {
                    let item_slot = self.reserve();
                    let content = self.data_set_len(item, charset)?;
                    self.slots[item_slot] = to_u32(content, tag)?;
                    seq_len += 8 + content;
                    if self.layout.item_length.is_undefined(is_empty_item(item)?) {
                        seq_len += 8;
                    }
                }
                self.slots[seq_slot] = to_u32(seq_len, tag)?;
                let delimiter = if self.layout.sequence_length.is_undefined(items.is_empty()) {
                    8
                } else {
                    0
                };
                // sequences of unknown VR are written as SQ
                u64::from(encoder.header_len(VR::SQ)) + seq_len + delimiter
            }
            Value::PixelSequence(seq) => {
                let table = 8 + 4 * seq.offset_table().len() as u64;
                let fragments: u64 = seq
                    .fragments()
                    .iter()
                    .map(|f| 8 + f.len() as u64)
                    .sum();
                u64::from(encoder.header_len(VR::OB)) + table + fragments + 8
            }
            Value::BulkData(bulk) => {
                let uri = bulk.uri();
                let len = bulk.length().context(InvalidBulkDataUriSnafu { uri })?;
                match len.get() {
                    Some(len) => {
                        u64::from(encoder.header_len(elem.vr())) + u64::from(len + (len & 1))
                    }
                    None => u64::from(encoder.header_len(VR::OB)) + scan_fragments(bulk)?,
                }
            }
        };
        Ok(len)
    }
}

struct Emitter<'a> {
    layout: Layout,
    lengths: Option<&'a EncodedLengths>,
    cursor: usize,
    scratch: Vec<u8>,
}

impl Emitter<'_> {
    fn next_slot(&mut self) -> Option<u32> {
        let slot = self
            .lengths
            .and_then(|l| l.slots.get(self.cursor))
            .copied();
        self.cursor += 1;
        slot
    }

    fn write_data_set<W, D>(
        &mut self,
        printer: &mut DataSetWriter<W>,
        obj: &InMemDicomObject<D>,
    ) -> Result<()>
    where
        W: Write,
        D: DataDictionary + Clone,
    {
        let mut group = None;
        for elem in obj.iter().context(AccessItemSnafu)? {
            let tag = elem.tag();
            if tag.is_group_length() {
                continue;
            }
            if self.layout.include_group_length && group != Some(tag.group()) {
                group = Some(tag.group());
                let len = self.next_slot().unwrap_or_default();
                printer
                    .write_element(
                        &DataElementHeader::new(Tag(tag.group(), 0), VR::UL, Length(4)),
                        &PrimitiveValue::from(len),
                    )
                    .context(PrintDataSetSnafu)?;
            }
            if let Some(creator) = tag.private_creator_tag() {
                if obj.element_opt(creator).context(AccessItemSnafu)?.is_none() {
                    tracing::warn!("Private element {} has no private creator", tag);
                }
            }
            self.write_element(printer, elem)?;
        }
        Ok(())
    }

    fn write_element<W, D>(
        &mut self,
        printer: &mut DataSetWriter<W>,
        elem: &InMemElement<D>,
    ) -> Result<()>
    where
        W: Write,
        D: DataDictionary + Clone,
    {
        match elem.value() {
            Value::Primitive(value) => printer
                .write_element(elem.header(), value)
                .context(PrintDataSetSnafu),
            Value::Sequence(items) => {
                let len = self
                    .layout
                    .sequence_length
                    .header_length(self.next_slot(), items.is_empty());
                printer
                    .write(DataToken::SequenceStart {
                        tag: elem.tag(),
                        vr: elem.vr(),
                        len,
                    })
                    .context(PrintDataSetSnafu)?;
                for item in items {
                    let len = self
                        .layout
                        .item_length
                        .header_length(self.next_slot(), is_empty_item(item)?);
                    printer
                        .write(DataToken::ItemStart { len })
                        .context(PrintDataSetSnafu)?;
                    self.write_data_set(printer, item)?;
                    printer.write(DataToken::ItemEnd).context(PrintDataSetSnafu)?;
                }
                printer
                    .write(DataToken::SequenceEnd)
                    .context(PrintDataSetSnafu)
            }
            Value::PixelSequence(seq) => {
                let table = seq.offset_table();
                let mut tokens = vec![
                    DataToken::PixelSequenceStart,
                    DataToken::ItemStart {
                        len: Length(4 * table.len() as u32),
                    },
                ];
                if !table.is_empty() {
                    tokens.push(DataToken::OffsetTable(table.to_vec()));
                }
                tokens.push(DataToken::ItemEnd);
                for fragment in seq.fragments() {
                    tokens.push(DataToken::ItemStart {
                        len: Length(fragment.len() as u32),
                    });
                    tokens.push(DataToken::ItemValue(fragment.clone()));
                    tokens.push(DataToken::ItemEnd);
                }
                tokens.push(DataToken::SequenceEnd);
                printer.write_sequence(tokens).context(PrintDataSetSnafu)
            }
            Value::BulkData(bulk) => self.write_bulk_data(printer, elem.header(), bulk),
        }
    }

    /// Stream the value referenced by a bulk data URI,
    /// in the byte order of the output.
    fn write_bulk_data<W>(
        &mut self,
        printer: &mut DataSetWriter<W>,
        header: &DataElementHeader,
        bulk: &BulkDataRef,
    ) -> Result<()>
    where
        W: Write,
    {
        let uri = bulk.uri();
        let len = bulk.length().context(InvalidBulkDataUriSnafu { uri })?;
        let len = match len.get() {
            Some(len) => len,
            None => return write_fragments(printer, bulk),
        };
        let mut source = open_bulk_data(bulk)?;
        let padded = to_u32(u64::from(len) + u64::from(len & 1), header.tag)?;
        printer
            .write_element_header(DataElementHeader::new(header.tag, header.vr, Length(padded)))
            .context(PrintDataSetSnafu)?;

        let source_order = if bulk.big_endian() {
            Endianness::Big
        } else {
            Endianness::Little
        };
        let unit = usize::from(header.vr.word_size());
        let swap = unit > 1 && source_order != self.layout.encoder.endianness();
        let padding = header.vr.padding_byte();
        let scratch = &mut self.scratch;
        printer
            .write_raw_with(u64::from(padded), |to| {
                if swap {
                    source.copy_swapped_to(u64::from(len), to, unit, scratch)?;
                } else {
                    source.copy_to(u64::from(len), to)?;
                }
                if len % 2 == 1 {
                    to.write_all(&[padding])?;
                }
                Ok(())
            })
            .context(PrintDataSetSnafu)
    }
}

/// Open the resource of a bulk data reference at the referenced position.
fn open_bulk_data(bulk: &BulkDataRef) -> Result<CachedSource<BufReader<File>>> {
    let uri = bulk.uri();
    let offset = bulk.offset().context(InvalidBulkDataUriSnafu { uri })?;
    let locator = bulk.locator();
    let path = locator.strip_prefix("file://").unwrap_or(locator);
    let mut file = File::open(path).context(ResolveBulkDataSnafu { uri })?;
    file.seek(SeekFrom::Start(offset))
        .context(ResolveBulkDataSnafu { uri })?;
    Ok(CachedSource::with_offset(BufReader::new(file), offset))
}

/// Create a decoder of the item headers in the referenced fragment sequence.
fn fragment_decoder(
    bulk: &BulkDataRef,
) -> Result<StatefulDecoder<BufReader<File>, StubDataDictionary>> {
    let source = open_bulk_data(bulk)?;
    let ts: &TransferSyntax = if bulk.big_endian() {
        &EXPLICIT_VR_BIG_ENDIAN
    } else {
        &EXPLICIT_VR_LITTLE_ENDIAN
    };
    Ok(StatefulDecoder::new(
        source,
        ts,
        StubDataDictionary,
        SpecificCharacterSet::default(),
    ))
}

/// Measure the referenced fragment sequence,
/// sequence delimiter included.
fn scan_fragments(bulk: &BulkDataRef) -> Result<u64> {
    let uri = bulk.uri();
    let mut decoder = fragment_decoder(bulk)?;
    let mut total = 0;
    loop {
        match decoder
            .decode_item_header()
            .context(ParseBulkDataSnafu { uri })?
        {
            SequenceItemHeader::Item { len } => {
                let len = len.get().context(MalformedBulkDataSnafu { uri })?;
                decoder
                    .skip_bytes(u64::from(len))
                    .context(ParseBulkDataSnafu { uri })?;
                total += 8 + u64::from(len);
            }
            SequenceItemHeader::SequenceDelimiter => return Ok(total + 8),
            SequenceItemHeader::ItemDelimiter => return MalformedBulkDataSnafu { uri }.fail(),
        }
    }
}

/// Copy the referenced fragment sequence as encapsulated pixel data,
/// one fragment at a time.
fn write_fragments<W>(printer: &mut DataSetWriter<W>, bulk: &BulkDataRef) -> Result<()>
where
    W: Write,
{
    let uri = bulk.uri();
    let mut decoder = fragment_decoder(bulk)?;
    printer
        .write(DataToken::PixelSequenceStart)
        .context(PrintDataSetSnafu)?;
    let mut first = true;
    loop {
        match decoder
            .decode_item_header()
            .context(ParseBulkDataSnafu { uri })?
        {
            SequenceItemHeader::Item { len } => {
                let len = len.get().context(MalformedBulkDataSnafu { uri })?;
                printer
                    .write(DataToken::ItemStart { len: Length(len) })
                    .context(PrintDataSetSnafu)?;
                if first {
                    // the basic offset table is in the byte order of the output
                    let table = decoder
                        .read_u32_vec(len)
                        .context(ParseBulkDataSnafu { uri })?;
                    if !table.is_empty() {
                        printer
                            .write(DataToken::OffsetTable(table))
                            .context(PrintDataSetSnafu)?;
                    }
                } else {
                    let data = decoder
                        .read_bytes(len)
                        .context(ParseBulkDataSnafu { uri })?;
                    printer
                        .write(DataToken::ItemValue(data))
                        .context(PrintDataSetSnafu)?;
                }
                printer.write(DataToken::ItemEnd).context(PrintDataSetSnafu)?;
                first = false;
            }
            SequenceItemHeader::SequenceDelimiter => break,
            SequenceItemHeader::ItemDelimiter => return MalformedBulkDataSnafu { uri }.fail(),
        }
    }
    printer
        .write(DataToken::SequenceEnd)
        .context(PrintDataSetSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmcodec_core::DataElement;
    use dcmcodec_dictionary::tags;
    use dcmcodec_encoding::transfer_syntax::entries::{
        DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN,
    };

    fn object_with_sequence() -> InMemDicomObject {
        let item = InMemDicomObject::from_element_iter([DataElement::new(
            tags::REFERENCED_SOP_CLASS_UID,
            VR::UI,
            "1.2",
        )]);
        InMemDicomObject::from_element_iter([DataElement::new(
            tags::REFERENCED_IMAGE_SEQUENCE,
            VR::SQ,
            vec![item],
        )])
    }

    fn write_explicit_le(obj: &InMemDicomObject, writer: DicomWriter<Vec<u8>>) -> Vec<u8> {
        let mut writer = writer.with_encoding(&EXPLICIT_VR_LITTLE_ENDIAN).unwrap();
        writer.write_data_set(obj).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn write_sequence_with_explicit_lengths() {
        let bytes = write_explicit_le(
            &object_with_sequence(),
            DicomWriter::new(Vec::new())
                .with_sequence_length_encoding(LengthEncoding::ExplicitAlways)
                .with_item_length_encoding(LengthEncoding::ExplicitAlways),
        );

        #[rustfmt::skip]
        let expected: &[u8] = &[
            // (0008,1140) SQ 20
            0x08, 0x00, 0x40, 0x11, b'S', b'Q', 0x00, 0x00, 0x14, 0x00, 0x00, 0x00,
            // item of 12 bytes
            0xFE, 0xFF, 0x00, 0xE0, 0x0C, 0x00, 0x00, 0x00,
            // (0008,1150) UI 4 "1.2\0"
            0x08, 0x00, 0x50, 0x11, b'U', b'I', 0x04, 0x00, b'1', b'.', b'2', 0x00,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn write_sequence_with_undefined_lengths() {
        let bytes = write_explicit_le(&object_with_sequence(), DicomWriter::new(Vec::new()));

        #[rustfmt::skip]
        let expected: &[u8] = &[
            // (0008,1140) SQ undefined length
            0x08, 0x00, 0x40, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // item of undefined length
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            // (0008,1150) UI 4 "1.2\0"
            0x08, 0x00, 0x50, 0x11, b'U', b'I', 0x04, 0x00, b'1', b'.', b'2', 0x00,
            // item delimiter
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // sequence delimiter
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn write_empty_sequence() {
        let obj = InMemDicomObject::from_element_iter([DataElement::new(
            tags::REFERENCED_IMAGE_SEQUENCE,
            VR::SQ,
            Vec::<InMemDicomObject>::new(),
        )]);

        let bytes = write_explicit_le(&obj, DicomWriter::new(Vec::new()));
        #[rustfmt::skip]
        let expected: &[u8] = &[
            // (0008,1140) SQ 0
            0x08, 0x00, 0x40, 0x11, b'S', b'Q', 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(bytes, expected);

        let bytes = write_explicit_le(
            &obj,
            DicomWriter::new(Vec::new())
                .with_sequence_length_encoding(LengthEncoding::UndefinedAlways),
        );
        #[rustfmt::skip]
        let expected: &[u8] = &[
            // (0008,1140) SQ undefined length
            0x08, 0x00, 0x40, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // sequence delimiter
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn write_group_lengths() {
        let obj = InMemDicomObject::from_element_iter([
            DataElement::new(tags::MODALITY, VR::CS, "MR"),
            DataElement::new(tags::PATIENT_NAME, VR::PN, "Doe^John"),
            // recalculated on write
            DataElement::new(Tag(0x0010, 0x0000), VR::UL, PrimitiveValue::from(99_u32)),
        ]);
        let bytes = write_explicit_le(
            &obj,
            DicomWriter::new(Vec::new()).with_include_group_length(true),
        );

        #[rustfmt::skip]
        let expected: &[u8] = &[
            // (0008,0000) UL 4 [10]
            0x08, 0x00, 0x00, 0x00, b'U', b'L', 0x04, 0x00, 0x0A, 0x00, 0x00, 0x00,
            // (0008,0060) CS 2 "MR"
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'M', b'R',
            // (0010,0000) UL 4 [16]
            0x10, 0x00, 0x00, 0x00, b'U', b'L', 0x04, 0x00, 0x10, 0x00, 0x00, 0x00,
            // (0010,0010) PN 8 "Doe^John"
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x08, 0x00,
            b'D', b'o', b'e', b'^', b'J', b'o', b'h', b'n',
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn calculate_lengths_in_writing_order() {
        let writer = DicomWriter::new(Vec::new())
            .with_encoding(&EXPLICIT_VR_LITTLE_ENDIAN)
            .unwrap()
            .with_include_group_length(true)
            .with_sequence_length_encoding(LengthEncoding::ExplicitAlways)
            .with_item_length_encoding(LengthEncoding::ExplicitAlways);
        let lengths = writer.calculate_lengths(&object_with_sequence()).unwrap();
        // root group, sequence, item, group within the item
        assert_eq!(lengths.slots(), &[44, 32, 24, 12]);
        assert_eq!(lengths.total(), 56);
    }

    #[test]
    fn write_command_set_in_implicit_vr_le() {
        let obj = InMemDicomObject::from_element_iter([
            DataElement::new(tags::COMMAND_FIELD, VR::US, PrimitiveValue::from(0x0030_u16)),
            DataElement::new(tags::MESSAGE_ID, VR::US, PrimitiveValue::from(1_u16)),
        ]);
        let mut writer = DicomWriter::new(Vec::new());
        writer.write_command_set(&obj).unwrap();
        let bytes = writer.finish().unwrap();

        #[rustfmt::skip]
        let expected: &[u8] = &[
            // (0000,0000) 4 [20]
            0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x14, 0x00, 0x00, 0x00,
            // (0000,0100) 2 [0x0030]
            0x00, 0x00, 0x00, 0x01, 0x02, 0x00, 0x00, 0x00, 0x30, 0x00,
            // (0000,0110) 2 [1]
            0x00, 0x00, 0x10, 0x01, 0x02, 0x00, 0x00, 0x00, 0x01, 0x00,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn tag_byte_order_follows_encoding() {
        let obj = InMemDicomObject::from_element_iter([DataElement::new(
            Tag(0x0008, 0x0010),
            VR::SH,
            "CODE",
        )]);

        let le = obj
            .write_dataset_with_ts(Vec::new(), &EXPLICIT_VR_LITTLE_ENDIAN)
            .unwrap();
        assert_eq!(&le[..4], &[0x08, 0x00, 0x10, 0x00][..]);
        let be = obj
            .write_dataset_with_ts(Vec::new(), &EXPLICIT_VR_BIG_ENDIAN)
            .unwrap();
        assert_eq!(&be[..4], &[0x00, 0x08, 0x00, 0x10][..]);
    }

    #[test]
    fn encoding_is_established_once() {
        let writer = DicomWriter::new(Vec::new())
            .with_encoding(&IMPLICIT_VR_LITTLE_ENDIAN)
            .unwrap();
        assert!(matches!(
            writer.with_encoding(&EXPLICIT_VR_LITTLE_ENDIAN),
            Err(WriteError::UnsupportedEncodingState { .. })
        ));

        let mut writer = DicomWriter::new(Vec::new())
            .with_encoding(&DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN)
            .unwrap();
        let meta = crate::FileMetaTableBuilder::new()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .media_storage_sop_instance_uid("2.25.1")
            .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN.uid())
            .build()
            .unwrap();
        assert!(matches!(
            writer.write_file_meta_information(&meta),
            Err(WriteError::UnsupportedEncodingState { .. })
        ));
    }

    #[test]
    fn data_set_requires_encoding() {
        let mut writer = DicomWriter::new(Vec::new());
        assert!(matches!(
            writer.write_data_set(&object_with_sequence()),
            Err(WriteError::UnsupportedEncodingState { .. })
        ));
        assert!(matches!(
            writer.calculate_lengths(&object_with_sequence()),
            Err(WriteError::UnsupportedEncodingState { .. })
        ));
    }
}
