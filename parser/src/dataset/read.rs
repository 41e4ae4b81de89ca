//! This module contains a mid-level abstraction for reading DICOM content
//! sequentially.
//!
//! The rest of the crate is used to obtain DICOM element headers and values.
//! At this level, headers and values are treated as tokens which can be used
//! to form a syntax tree of a full data set.
use super::lazy;
use super::{DataToken, LazyItem, SeqTokenType};
use crate::bulkdata::{
    self, BulkDataCandidate, BulkDataPolicy, BulkDataPredicate, SpoolSupplier,
};
use crate::cache::CachedSource;
use crate::stateful::decode::{Error as DecoderError, StatefulDecoder};
use dcmcodec_core::header::{DataElementHeader, Header, Length, SequenceItemHeader};
use dcmcodec_core::{DataDictionary, PrimitiveValue, Tag, VR};
use dcmcodec_encoding::text::SpecificCharacterSet;
use dcmcodec_encoding::transfer_syntax::TransferSyntax;
use dcmcodec_encoding::Endianness;
use snafu::{Backtrace, ResultExt, Snafu};
use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::BufRead;
use std::iter::Iterator;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not read item header"))]
    ReadItemHeader {
        #[snafu(backtrace)]
        source: DecoderError,
    },
    #[snafu(display("Could not read element header"))]
    ReadHeader {
        #[snafu(backtrace)]
        source: DecoderError,
    },
    #[snafu(display("Could not read {} value bytes for element tagged {}", len, tag))]
    ReadValue {
        len: u32,
        tag: Tag,
        #[snafu(backtrace)]
        source: DecoderError,
    },
    #[snafu(display("Could not read {} bytes for item value", len))]
    ReadItemValue {
        len: u32,
        #[snafu(backtrace)]
        source: DecoderError,
    },
    #[snafu(display(
        "Inconsistent sequence end: expected end at {} bytes but read {}",
        end_of_sequence,
        bytes_read
    ))]
    InconsistentSequenceEnd {
        end_of_sequence: u64,
        bytes_read: u64,
        backtrace: Backtrace,
    },
    #[snafu(display("Unexpected item tag {} at position {}", tag, position))]
    UnexpectedItemTag {
        tag: Tag,
        position: u64,
        backtrace: Backtrace,
    },
    #[snafu(display("Undefined pixel data item length at position {}", position))]
    UndefinedItemLength { position: u64, backtrace: Backtrace },
    #[snafu(display(
        "Unexpected value length {} for element tagged {} at position {}",
        len,
        tag,
        position
    ))]
    UnexpectedDataValueLength {
        tag: Tag,
        len: u32,
        position: u64,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not obtain a spool file for bulk data"))]
    CreateSpool {
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not write bulk data to spool file {}", path.display()))]
    SpoolBulkData {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not copy bulk data from position {}", position))]
    CopyBulkData {
        position: u64,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A reader-specific token representing a sequence or item start.
#[derive(Debug, Copy, Clone, PartialEq)]
struct SeqToken {
    /// Whether it is the start of a sequence or the start of an item.
    typ: SeqTokenType,
    /// The length of the value, as indicated by the starting element,
    /// can be unknown.
    len: Length,
    /// Whether this sequence token is part of an encapsulated pixel data.
    pixel_data: bool,
    /// The number of bytes the parser has read until it reached the
    /// beginning of the sequence or item value data.
    base_offset: u64,
    /// Whether the content is decoded as implicit VR little endian.
    implicit_vr_le: bool,
    /// The character set in effect before the token started.
    charset: SpecificCharacterSet,
}

/// The set of options for the data set reader.
#[derive(Clone)]
#[non_exhaustive]
pub struct DataSetReaderOptions {
    /// which elements are bulk data
    pub bulk_data_predicate: BulkDataPredicate,
    /// what to do with bulk data,
    /// `None` to read it into memory like any other value
    pub bulk_data_policy: Option<BulkDataPolicy>,
    /// whether to emit whole sequence items as [`DataToken::LazyItem`]s
    pub lazy_items: bool,
    /// the absolute position of the first byte of the source
    pub base_offset: u64,
    /// the nesting level of the data set being read
    pub base_level: u32,
    /// the spool file, shared by all readers using clones of these options
    spool: SharedSpool,
}

impl Default for DataSetReaderOptions {
    fn default() -> Self {
        DataSetReaderOptions {
            bulk_data_predicate: bulkdata::predicate(bulkdata::default_predicate),
            bulk_data_policy: None,
            lazy_items: false,
            base_offset: 0,
            base_level: 0,
            spool: SharedSpool::default(),
        }
    }
}

impl fmt::Debug for DataSetReaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSetReaderOptions")
            .field("bulk_data_policy", &self.bulk_data_policy)
            .field("lazy_items", &self.lazy_items)
            .field("base_offset", &self.base_offset)
            .field("base_level", &self.base_level)
            .finish_non_exhaustive()
    }
}

impl DataSetReaderOptions {
    /// Replace the bulk data predicate of the options.
    pub fn bulk_data_predicate(mut self, predicate: BulkDataPredicate) -> Self {
        self.bulk_data_predicate = predicate;
        self
    }
    /// Replace the bulk data policy of the options.
    pub fn bulk_data_policy(mut self, policy: Option<BulkDataPolicy>) -> Self {
        self.bulk_data_policy = policy;
        self
    }
    /// Enable or disable lazy sequence items.
    pub fn lazy_items(mut self, lazy_items: bool) -> Self {
        self.lazy_items = lazy_items;
        self
    }
    /// Replace the base reader offset of the options.
    pub fn base_offset(mut self, base_offset: u64) -> Self {
        self.base_offset = base_offset;
        self
    }
    /// Replace the base nesting level of the options.
    pub fn base_level(mut self, base_level: u32) -> Self {
        self.base_level = base_level;
        self
    }
}

/// A spool file created on first use.
type SharedSpool = Arc<Mutex<Option<Spool>>>;

/// The file receiving spooled bulk data.
#[derive(Debug)]
struct Spool {
    path: PathBuf,
    file: File,
    written: u64,
}

impl Spool {
    fn create(supplier: &SpoolSupplier) -> Result<Self> {
        let path = supplier().context(CreateSpoolSnafu)?;
        let file = File::create(&path).context(SpoolBulkDataSnafu { path: path.clone() })?;
        tracing::debug!("Spooling bulk data to {}", path.display());
        Ok(Spool {
            path,
            file,
            written: 0,
        })
    }

    /// Append the value of the element just read, returning its offset.
    fn append<R, D>(
        &mut self,
        parser: &mut StatefulDecoder<R, D>,
        header: &DataElementHeader,
    ) -> Result<u64>
    where
        R: BufRead,
        D: DataDictionary,
    {
        let offset = self.written;
        let copied = match header.len.get() {
            Some(len) => {
                parser
                    .copy_bytes_to(len.into(), &mut self.file)
                    .context(ReadValueSnafu {
                        len,
                        tag: header.tag,
                    })?;
                u64::from(len)
            }
            None => lazy::copy_fragments(parser, &mut self.file)?,
        };
        self.written += copied;
        Ok(offset)
    }
}

/// A higher-level reader for retrieving structure in a DICOM data set from an
/// arbitrary data source.
#[derive(Debug)]
pub struct DataSetReader<R, D> {
    /// the stateful decoder
    parser: StatefulDecoder<R, D>,
    /// the options of this reader
    options: DataSetReaderOptions,
    /// whether the reader is expecting an item header next (or a sequence delimiter)
    in_sequence: bool,
    /// whether the reader is expecting the first item value of a pixel sequence next
    /// (offset table)
    offset_table_next: bool,
    /// whether a check for a sequence or item delimitation is pending
    delimiter_check_pending: bool,
    /// a stack of delimiters
    seq_delimiters: Vec<SeqToken>,
    /// fuse the iteration process if true
    hard_break: bool,
    /// last decoded header
    last_header: Option<DataElementHeader>,
    /// the policy to apply to the value of the last decoded header
    pending_bulk: Option<BulkDataPolicy>,
    /// whether the data set itself is in implicit VR little endian
    base_implicit_vr_le: bool,
}

impl<R, D> DataSetReader<R, D>
where
    R: BufRead,
    D: DataDictionary + Clone,
{
    /// Create a new data set reader over the given stream,
    /// in the given transfer syntax and specific character set.
    ///
    /// The stream is expected to be positioned at
    /// `options.base_offset`.
    /// Deflated data is not inflated here:
    /// see [`CachedSource::inflate`].
    pub fn new_with_ts_cs_options(
        source: R,
        ts: &TransferSyntax,
        dict: D,
        cs: SpecificCharacterSet,
        options: DataSetReaderOptions,
    ) -> Self {
        let source = CachedSource::with_offset(source, options.base_offset);
        let parser = StatefulDecoder::new(source, ts, dict, cs);
        DataSetReader::new(parser, options)
    }
}

impl<R, D> DataSetReader<R, D>
where
    R: BufRead,
    D: DataDictionary,
{
    /// Create a new iterator with the given stateful decoder and options.
    pub fn new(decoder: StatefulDecoder<R, D>, options: DataSetReaderOptions) -> Self {
        let base_implicit_vr_le = decoder.is_implicit_vr_le();
        DataSetReader {
            parser: decoder,
            options,
            seq_delimiters: Vec::new(),
            delimiter_check_pending: false,
            offset_table_next: false,
            in_sequence: false,
            hard_break: false,
            last_header: None,
            pending_bulk: None,
            base_implicit_vr_le,
        }
    }

    /// The options for reading the content of a deferred item later on,
    /// from a copy of its bytes.
    ///
    /// Positions in inflated data do not point into the source,
    /// so bulk data by URI is read in memory instead.
    /// A spool file is shared with this reader.
    pub fn item_options(&self) -> DataSetReaderOptions {
        let mut options = self.options.clone();
        if self.parser.source().is_inflated() {
            if let Some(BulkDataPolicy::Uri { .. }) = options.bulk_data_policy {
                options.bulk_data_policy = None;
            }
        }
        options
    }
}

impl<R, D> DataSetReader<R, D> {
    /// Access the underlying stateful decoder.
    pub fn decoder(&self) -> &StatefulDecoder<R, D> {
        &self.parser
    }

    /// Retrieve the underlying stateful decoder.
    pub fn into_decoder(self) -> StatefulDecoder<R, D> {
        self.parser
    }

    /// The options of this reader.
    pub fn options(&self) -> &DataSetReaderOptions {
        &self.options
    }
}

impl<R, D> Iterator for DataSetReader<R, D>
where
    R: BufRead,
    D: DataDictionary,
{
    type Item = Result<DataToken>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.hard_break {
            return None;
        }

        // item or sequence delimitation logic for explicit lengths
        if self.delimiter_check_pending {
            match self.update_seq_delimiters() {
                Err(e) => {
                    self.hard_break = true;
                    return Some(Err(e));
                }
                Ok(Some(token)) => return Some(Ok(token)),
                Ok(None) => { /* no-op */ }
            }
        }

        let out = if self.in_sequence {
            // at sequence level, expecting item header
            self.next_in_sequence()
        } else if let Some(SeqToken {
            typ: SeqTokenType::Item,
            pixel_data: true,
            len,
            ..
        }) = self.seq_delimiters.last()
        {
            let len = *len;
            self.next_pixel_item_value(len)
        } else if let Some(header) = self.last_header.take() {
            self.next_value(header)
        } else {
            // a data element header or item delimiter is expected
            match self.next_header() {
                Ok(Some(token)) => Ok(token),
                Ok(None) => {
                    self.hard_break = true;
                    return None;
                }
                Err(e) => Err(e),
            }
        };

        if out.is_err() {
            self.hard_break = true;
        }
        Some(out)
    }
}

impl<R, D> DataSetReader<R, D>
where
    R: BufRead,
    D: DataDictionary,
{
    fn next_in_sequence(&mut self) -> Result<DataToken> {
        let position = self.parser.position();
        match self.parser.decode_item_header().context(ReadItemHeaderSnafu)? {
            SequenceItemHeader::Item { len } => {
                let pixel_data = self
                    .seq_delimiters
                    .last()
                    .map(|t| t.pixel_data)
                    .unwrap_or(false);
                if self.options.lazy_items && !pixel_data {
                    // the item is consumed as a whole,
                    // so the sequence may end right after
                    self.delimiter_check_pending = true;
                    return self.read_lazy_item(len);
                }
                // entered a new item
                self.in_sequence = false;
                self.push_sequence_token(SeqTokenType::Item, len, pixel_data);
                // items can be empty
                if len == Length(0) {
                    self.delimiter_check_pending = true;
                }
                Ok(DataToken::ItemStart { len })
            }
            SequenceItemHeader::ItemDelimiter => {
                if self.seq_delimiters.last().map(|t| t.typ) != Some(SeqTokenType::Item) {
                    return UnexpectedItemTagSnafu {
                        tag: Tag::ITEM_DELIMITER,
                        position,
                    }
                    .fail();
                }
                // closed an item
                self.pop_sequence_token();
                self.in_sequence = true;
                // sequences can end after an item delimiter
                self.delimiter_check_pending = true;
                Ok(DataToken::ItemEnd)
            }
            SequenceItemHeader::SequenceDelimiter => {
                // closed a sequence
                self.pop_sequence_token();
                self.in_sequence = false;
                // items can end after a nested sequence ends
                self.delimiter_check_pending = true;
                Ok(DataToken::SequenceEnd)
            }
        }
    }

    fn next_pixel_item_value(&mut self, len: Length) -> Result<DataToken> {
        let position = self.parser.position();
        let len = match len.get() {
            Some(len) => len,
            None => return UndefinedItemLengthSnafu { position }.fail(),
        };

        // need to pop item delimiter on the next iteration
        self.delimiter_check_pending = true;

        if self.offset_table_next {
            self.offset_table_next = false;
            if len % 4 != 0 {
                return UnexpectedDataValueLengthSnafu {
                    tag: Tag::ITEM,
                    len,
                    position,
                }
                .fail();
            }
            self.parser
                .read_u32_vec(len)
                .map(DataToken::OffsetTable)
                .context(ReadItemValueSnafu { len })
        } else {
            self.parser
                .read_bytes(len)
                .map(DataToken::ItemValue)
                .context(ReadItemValueSnafu { len })
        }
    }

    fn next_value(&mut self, header: DataElementHeader) -> Result<DataToken> {
        if let Some(policy) = self.pending_bulk.take() {
            // sequences can end after this token
            self.delimiter_check_pending = true;
            return self.read_bulk_data(&header, policy);
        }

        if is_encapsulated_pixel_data(&header) {
            self.push_sequence_token(SeqTokenType::Sequence, Length::UNDEFINED, true);

            // encapsulated pixel data, expecting offset table
            let position = self.parser.position();
            match self.parser.decode_item_header().context(ReadItemHeaderSnafu)? {
                SequenceItemHeader::Item { len } => {
                    // entered a new item
                    self.in_sequence = false;
                    self.push_sequence_token(SeqTokenType::Item, len, true);
                    // items can be empty
                    if len == Length(0) {
                        self.delimiter_check_pending = true;
                    } else {
                        self.offset_table_next = true;
                    }
                    Ok(DataToken::ItemStart { len })
                }
                SequenceItemHeader::SequenceDelimiter => {
                    // empty pixel data
                    self.pop_sequence_token();
                    self.in_sequence = false;
                    self.delimiter_check_pending = true;
                    Ok(DataToken::SequenceEnd)
                }
                item => UnexpectedItemTagSnafu {
                    tag: item.tag(),
                    position,
                }
                .fail(),
            }
        } else {
            // a plain element header was read, so a value is expected
            let value = self.parser.read_value(&header).context(ReadValueSnafu {
                len: header.len.0,
                tag: header.tag,
            })?;

            // sequences can end after this token
            self.delimiter_check_pending = true;

            Ok(DataToken::PrimitiveValue(value))
        }
    }

    /// Read the next element header.
    /// Returns `None` when the data set ended.
    fn next_header(&mut self) -> Result<Option<DataToken>> {
        let position = self.parser.position();
        let header = match self.parser.decode_header() {
            Ok(header) => header,
            Err(e) if e.is_eof_at_header_start() => {
                // Note: if `UnexpectedEof` was reached while trying to read
                // an element tag, then we assume that
                // the end of a DICOM object was reached gracefully.
                // This approach is unlikely to consume trailing bytes,
                // but may ignore the current depth of the data set tree.
                return Ok(None);
            }
            Err(e) => return Err(e).context(ReadHeaderSnafu),
        };

        match header {
            DataElementHeader {
                tag,
                vr: VR::SQ,
                len,
            } => {
                self.in_sequence = true;
                self.push_sequence_token(SeqTokenType::Sequence, len, false);

                // sequences can end right after they start
                if len == Length(0) {
                    self.delimiter_check_pending = true;
                }

                Ok(Some(DataToken::SequenceStart {
                    tag,
                    vr: VR::SQ,
                    len,
                }))
            }
            DataElementHeader {
                tag: Tag::ITEM_DELIMITER,
                ..
            } if self.seq_delimiters.is_empty() => {
                // ignore delimiter, we are not in a sequence
                tracing::warn!(
                    "Item delimitation item outside of a sequence in position {}",
                    position
                );
                // return a new token by calling the method again
                self.next_header()
            }
            DataElementHeader {
                tag: Tag::ITEM_DELIMITER,
                ..
            } => {
                self.in_sequence = true;
                // pop item delimiter
                self.pop_sequence_token();
                // sequences can end after this token
                self.delimiter_check_pending = true;
                Ok(Some(DataToken::ItemEnd))
            }
            DataElementHeader {
                tag: tag @ Tag::ITEM,
                ..
            } => UnexpectedItemTagSnafu { tag, position }.fail(),
            header if is_encapsulated_pixel_data(&header) => {
                // encapsulated pixel data conditions:
                // expect a sequence of pixel data fragments
                self.last_header = Some(header);
                if let Some(policy) = self.bulk_data_policy_for(&header, true) {
                    self.pending_bulk = Some(policy);
                    return Ok(Some(DataToken::ElementHeader(header)));
                }
                Ok(Some(DataToken::PixelSequenceStart))
            }
            header if header.len.is_undefined() => {
                // treat other undefined length elements
                // as data set sequences,
                // items of unknown VR being in implicit VR little endian
                self.start_sequence_of(header);
                Ok(Some(DataToken::SequenceStart {
                    tag: header.tag,
                    vr: header.vr,
                    len: header.len,
                }))
            }
            header if header.vr == VR::UN && header.len.0 >= 8 && self.peek_item_tag()? => {
                // unknown VR, but the value is clearly a sequence of items
                self.start_sequence_of(header);
                Ok(Some(DataToken::SequenceStart {
                    tag: header.tag,
                    vr: VR::UN,
                    len: header.len,
                }))
            }
            header => {
                self.pending_bulk = self.bulk_data_policy_for(&header, false);
                // save it for the next step
                self.last_header = Some(header);
                Ok(Some(DataToken::ElementHeader(header)))
            }
        }
    }

    fn start_sequence_of(&mut self, header: DataElementHeader) {
        self.in_sequence = true;
        let vr = if header.vr == VR::UN { VR::UN } else { VR::SQ };
        let implicit_vr_le = vr == VR::UN || self.parser.is_implicit_vr_le();
        self.seq_delimiters.push(SeqToken {
            typ: SeqTokenType::Sequence,
            pixel_data: false,
            len: header.len,
            base_offset: self.parser.position(),
            implicit_vr_le,
            charset: self.parser.charset(),
        });
        self.parser.set_implicit_vr_le(implicit_vr_le);
        if header.len == Length(0) {
            self.delimiter_check_pending = true;
        }
    }

    fn peek_item_tag(&mut self) -> Result<bool> {
        let position = self.parser.position();
        self.parser
            .peek_item_tag()
            .context(ReadItemHeaderSnafu)
            .map_err(|e| {
                tracing::debug!("Could not look ahead at position {}", position);
                e
            })
    }

    fn update_seq_delimiters(&mut self) -> Result<Option<DataToken>> {
        if let Some(sd) = self.seq_delimiters.last() {
            if let Some(len) = sd.len.get() {
                let end_of_sequence = sd.base_offset + len as u64;
                let bytes_read = self.parser.position();
                match end_of_sequence.cmp(&bytes_read) {
                    Ordering::Equal => {
                        // end of delimiter, as indicated by the element's length
                        let token = match sd.typ {
                            SeqTokenType::Sequence => {
                                self.in_sequence = false;
                                DataToken::SequenceEnd
                            }
                            SeqTokenType::Item => {
                                self.in_sequence = true;
                                DataToken::ItemEnd
                            }
                        };
                        self.pop_sequence_token();
                        return Ok(Some(token));
                    }
                    Ordering::Less => {
                        return InconsistentSequenceEndSnafu {
                            end_of_sequence,
                            bytes_read,
                        }
                        .fail();
                    }
                    Ordering::Greater => {} // continue normally
                }
            }
        }
        self.delimiter_check_pending = false;
        Ok(None)
    }

    #[inline]
    fn push_sequence_token(&mut self, typ: SeqTokenType, len: Length, pixel_data: bool) {
        self.seq_delimiters.push(SeqToken {
            typ,
            pixel_data,
            len,
            base_offset: self.parser.position(),
            implicit_vr_le: self.parser.is_implicit_vr_le(),
            charset: self.parser.charset(),
        })
    }

    /// Pop the innermost sequence token,
    /// restoring the character set at the end of an item
    /// and the encoding at the end of a sequence of unknown VR.
    fn pop_sequence_token(&mut self) -> Option<SeqToken> {
        let token = self.seq_delimiters.pop()?;
        if token.typ == SeqTokenType::Item {
            self.parser.set_charset(token.charset);
        }
        let implicit_vr_le = self
            .seq_delimiters
            .last()
            .map(|t| t.implicit_vr_le)
            .unwrap_or(self.base_implicit_vr_le);
        self.parser.set_implicit_vr_le(implicit_vr_le);
        Some(token)
    }

    /// The nesting level of the element about to be read.
    fn level(&self) -> u32 {
        self.options.base_level
            + self
                .seq_delimiters
                .iter()
                .filter(|t| t.typ == SeqTokenType::Item)
                .count() as u32
    }

    /// Decide whether the element with the given header is bulk data,
    /// and how to handle it.
    fn bulk_data_policy_for(
        &self,
        header: &DataElementHeader,
        in_pixel_sequence: bool,
    ) -> Option<BulkDataPolicy> {
        let policy = self.options.bulk_data_policy.as_ref()?;
        let candidate = BulkDataCandidate {
            tag: header.tag,
            vr: header.vr,
            len: header.len,
            level: self.level(),
            in_pixel_sequence,
        };
        if !(self.options.bulk_data_predicate)(&candidate) {
            return None;
        }
        if let BulkDataPolicy::Uri { .. } = policy {
            if self.parser.source().is_inflated() {
                // positions in inflated data do not point into the source
                tracing::debug!(
                    "Reading bulk data element {} in memory from deflated data set",
                    header.tag
                );
                return None;
            }
        }
        Some(policy.clone())
    }

    fn read_bulk_data(
        &mut self,
        header: &DataElementHeader,
        policy: BulkDataPolicy,
    ) -> Result<DataToken> {
        let position = self.parser.position();
        let big_endian = self.parser.endianness() == Endianness::Big;
        match policy {
            BulkDataPolicy::Suppress => {
                lazy::skip_value(&mut self.parser, header)?;
                Ok(DataToken::PrimitiveValue(PrimitiveValue::Empty))
            }
            BulkDataPolicy::Uri { locator } => {
                lazy::skip_value(&mut self.parser, header)?;
                Ok(DataToken::BulkData(
                    bulkdata::format_uri(&locator, position, header.len.get())
                        .with_big_endian(big_endian),
                ))
            }
            BulkDataPolicy::Spool { supplier } => {
                let shared = Arc::clone(&self.options.spool);
                let mut guard = shared.lock().unwrap_or_else(|e| e.into_inner());
                let spool = match &mut *guard {
                    Some(spool) => spool,
                    empty => empty.insert(Spool::create(&supplier)?),
                };
                let offset = spool.append(&mut self.parser, header)?;
                let locator = spool.path.to_string_lossy().into_owned();
                Ok(DataToken::BulkData(
                    bulkdata::format_uri(&locator, offset, header.len.get())
                        .with_big_endian(big_endian),
                ))
            }
        }
    }

    fn read_lazy_item(&mut self, len: Length) -> Result<DataToken> {
        let offset = self.parser.position();
        let charset = self.parser.charset();
        let implicit_vr_le = self.parser.is_implicit_vr_le();
        let data = match len.get() {
            Some(len) => self
                .parser
                .read_bytes(len)
                .context(ReadItemValueSnafu { len })?,
            None => {
                let start = self.parser.pin();
                let scanned = lazy::skip_item_content(&mut self.parser);
                let data = match scanned {
                    Ok(()) => {
                        let bytes = self.parser.bytes_since(start);
                        // leave out the item delimiter
                        Ok(bytes[..bytes.len() - 8].to_vec())
                    }
                    Err(e) => Err(e),
                };
                self.parser.unpin();
                data?
            }
        };
        tracing::trace!("Deferred item of {} bytes at position {}", data.len(), offset);
        Ok(DataToken::LazyItem(LazyItem {
            offset,
            len,
            data,
            implicit_vr_le,
            charset,
        }))
    }
}

/// Whether the header starts encapsulated pixel data.
fn is_encapsulated_pixel_data(header: &DataElementHeader) -> bool {
    header.tag == Tag::PIXEL_DATA && header.len.is_undefined()
}

#[cfg(test)]
mod tests {
    use super::{DataSetReader, DataSetReaderOptions, DataToken};
    use crate::bulkdata::{self, BulkDataPolicy};
    use crate::dataset::LazyItem;
    use dcmcodec_core::dicom_value;
    use dcmcodec_core::header::{DataElementHeader, Length};
    use dcmcodec_core::value::PrimitiveValue;
    use dcmcodec_core::{Tag, VR};
    use dcmcodec_dictionary::StandardDataDictionary;
    use dcmcodec_encoding::text::SpecificCharacterSet;
    use dcmcodec_encoding::transfer_syntax::entries::{
        EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN,
    };
    use dcmcodec_encoding::TransferSyntax;

    fn validate_dataset_reader_implicit_vr<I>(data: &[u8], ground_truth: I)
    where
        I: IntoIterator<Item = DataToken>,
    {
        validate_dataset_reader(
            data,
            &IMPLICIT_VR_LITTLE_ENDIAN,
            Default::default(),
            ground_truth,
        )
    }

    fn validate_dataset_reader_explicit_vr<I>(data: &[u8], ground_truth: I)
    where
        I: IntoIterator<Item = DataToken>,
    {
        validate_dataset_reader(
            data,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            Default::default(),
            ground_truth,
        )
    }

    fn validate_dataset_reader<I>(
        data: &[u8],
        ts: &TransferSyntax,
        options: DataSetReaderOptions,
        ground_truth: I,
    ) where
        I: IntoIterator<Item = DataToken>,
    {
        let mut dset_reader = DataSetReader::new_with_ts_cs_options(
            data,
            ts,
            StandardDataDictionary,
            SpecificCharacterSet::Default,
            options,
        );

        let iter = (&mut dset_reader).into_iter();
        let mut ground_truth = ground_truth.into_iter();

        while let Some(gt_token) = ground_truth.next() {
            let token = iter
                .next()
                .expect("expecting more tokens from reader")
                .expect("should fetch the next token without an error");
            eprintln!("Next token: {:2?} ; Expected: {:2?}", token, gt_token);
            assert_eq!(
                token, gt_token,
                "Got token {:2?} ; but expected {:2?}",
                token, gt_token
            );
        }

        let extra: Vec<_> = iter.collect();
        assert_eq!(
            extra.len(), // we have already read all of them
            0,
            "extraneous tokens remaining: {:?}",
            extra,
        );
        assert_eq!(
            dset_reader.parser.position(),
            data.len() as u64,
            "Decoder position did not match end of data",
        );
    }

    #[rustfmt::skip]
    static EXPLICIT_SEQUENCE: &[u8] = &[
        0x18, 0x00, 0x11, 0x60, // sequence tag: (0018,6011) SequenceOfUltrasoundRegions
        b'S', b'Q', // VR
        0x00, 0x00, // reserved
        0x2e, 0x00, 0x00, 0x00, // length: 28 + 18 = 46 (#= 2)
        // -- 12 --
        0xfe, 0xff, 0x00, 0xe0, // item start tag
        0x14, 0x00, 0x00, 0x00, // item length: 20 (#= 2)
        // -- 20 --
        0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x01, 0x00, // (0018, 6012) RegionSpatialformat, len = 2, value = 1
        // -- 30 --
        0x18, 0x00, 0x14, 0x60, b'U', b'S', 0x02, 0x00, 0x02, 0x00, // (0018, 6012) RegionDataType, len = 2, value = 2
        // -- 40 --
        0xfe, 0xff, 0x00, 0xe0, // item start tag
        0x0a, 0x00, 0x00, 0x00, // item length: 10 (#= 1)
        // -- 48 --
        0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x04, 0x00, // (0018, 6012) RegionSpatialformat, len = 2, value = 4
        // -- 58 --
        0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x04, 0x00, // (0020,4000) ImageComments, len = 4
        b'T', b'E', b'S', b'T', // value = "TEST"
    ];

    #[test]
    fn read_sequence_explicit() {
        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0018, 0x6011),
                vr: VR::SQ,
                len: Length(46),
            },
            DataToken::ItemStart { len: Length(20) },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6012),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(PrimitiveValue::U16([1].as_ref().into())),
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6014),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(PrimitiveValue::U16([2].as_ref().into())),
            DataToken::ItemEnd,
            DataToken::ItemStart { len: Length(10) },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6012),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(PrimitiveValue::U16([4].as_ref().into())),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0020, 0x4000),
                vr: VR::LT,
                len: Length(4),
            }),
            DataToken::PrimitiveValue(PrimitiveValue::Str("TEST".into())),
        ];

        validate_dataset_reader_explicit_vr(EXPLICIT_SEQUENCE, ground_truth);
    }

    #[test]
    fn read_sequence_explicit_2() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            // SequenceStart: (0008,2218) ; len = 54 (#=3)
            0x08, 0x00, 0x18, 0x22, b'S', b'Q', 0x00, 0x00, 0x36, 0x00, 0x00, 0x00,
            // -- 12, --
            // ItemStart: len = 46
            0xfe, 0xff, 0x00, 0xe0, 0x2e, 0x00, 0x00, 0x00,
            // -- 20, --
            // ElementHeader: (0008,0100) CodeValue; len = 8
            0x08, 0x00, 0x00, 0x01, b'S', b'H', 0x08, 0x00, // PrimitiveValue
            0x54, 0x2d, 0x44, 0x31, 0x32, 0x31, 0x33, b' ',
            // -- 36, --
            // ElementHeader: (0008,0102) CodingSchemeDesignator; len = 4
            0x08, 0x00, 0x02, 0x01, b'S', b'H', 0x04, 0x00, // PrimitiveValue
            0x53, 0x52, 0x54, b' ',
            // -- 48, --
            // (0008,0104) CodeMeaning; len = 10
            0x08, 0x00, 0x04, 0x01, b'L', b'O', 0x0a, 0x00, // PrimitiveValue
            0x4a, 0x61, 0x77, b' ', 0x72, 0x65, 0x67, 0x69, 0x6f, 0x6e,
            // -- 66 --
            // SequenceStart: (0040,0555) AcquisitionContextSequence; len = 0
            0x40, 0x00, 0x55, 0x05, b'S', b'Q', 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // ElementHeader: (2050,0020) PresentationLUTShape; len = 8
            0x50, 0x20, 0x20, 0x00, b'C', b'S', 0x08, 0x00, // PrimitiveValue
            b'I', b'D', b'E', b'N', b'T', b'I', b'T', b'Y',
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0008, 0x2218),
                vr: VR::SQ,
                len: Length(54),
            },
            DataToken::ItemStart { len: Length(46) },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0008, 0x0100),
                vr: VR::SH,
                len: Length(8),
            }),
            // trailing padding is trimmed
            DataToken::PrimitiveValue(dicom_value!(Strs, ["T-D1213"])),
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0008, 0x0102),
                vr: VR::SH,
                len: Length(4),
            }),
            DataToken::PrimitiveValue(dicom_value!(Strs, ["SRT"])),
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0008, 0x0104),
                vr: VR::LO,
                len: Length(10),
            }),
            DataToken::PrimitiveValue(dicom_value!(Strs, ["Jaw region"])),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::SequenceStart {
                tag: Tag(0x0040, 0x0555),
                vr: VR::SQ,
                len: Length(0),
            },
            DataToken::SequenceEnd,
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x2050, 0x0020),
                vr: VR::CS,
                len: Length(8),
            }),
            DataToken::PrimitiveValue(dicom_value!(Strs, ["IDENTITY"])),
        ];

        validate_dataset_reader_explicit_vr(DATA, ground_truth);
    }

    #[test]
    fn read_empty_sequence_explicit() {
        static DATA: &[u8] = &[
            // SequenceStart: (0008,2218) ; len = 0
            0x08, 0x00, 0x18, 0x22, // VR: SQ
            b'S', b'Q', // Reserved
            0x00, 0x00, // Length: 0
            0x00, 0x00, 0x00, 0x00,
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0008, 0x2218),
                vr: VR::SQ,
                len: Length(0),
            },
            DataToken::SequenceEnd,
        ];

        validate_dataset_reader_explicit_vr(DATA, ground_truth);
    }

    /// Gracefully ignore a stray item end tag in the data set.
    #[test]
    fn ignore_trailing_item_delimitation_item() {
        static DATA: &[u8] = &[
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x04,
            0x00, // (0020,4000) ImageComments, len = 4
            b'T', b'E', b'S', b'T', // value = "TEST"
            0xfe, 0xff, 0x0d, 0xe0, 0x00, 0x00, 0x00, 0x00, // item end
        ];

        let ground_truth = vec![
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0020, 0x4000),
                vr: VR::LT,
                len: Length(4),
            }),
            DataToken::PrimitiveValue(PrimitiveValue::Str("TEST".into())),
            // no item end
        ];

        validate_dataset_reader_explicit_vr(DATA, ground_truth);
    }

    #[test]
    fn read_sequence_undefined_lengths() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x18, 0x00, 0x11, 0x60, // sequence tag: (0018,6011) SequenceOfUltrasoundRegions
            b'S', b'Q', // VR
            0x00, 0x00, // reserved
            0xff, 0xff, 0xff, 0xff, // length: undefined
            // -- 12 --
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0xff, 0xff, 0xff, 0xff, // item length: undefined
            // -- 20 --
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x01, 0x00, // (0018, 6012) RegionSpatialformat, len = 2, value = 1
            // -- 30 --
            0x18, 0x00, 0x14, 0x60, b'U', b'S', 0x02, 0x00, 0x02, 0x00, // (0018, 6012) RegionDataType, len = 2, value = 2
            // -- 40 --
            0xfe, 0xff, 0x0d, 0xe0, 0x00, 0x00, 0x00, 0x00, // item end
            // -- 48 --
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0xff, 0xff, 0xff, 0xff, // item length: undefined
            // -- 56 --
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x04, 0x00, // (0018, 6012) RegionSpatialformat, len = 2, value = 4
            // -- 66 --
            0xfe, 0xff, 0x0d, 0xe0, 0x00, 0x00, 0x00, 0x00, // item end
            // -- 74 --
            0xfe, 0xff, 0xdd, 0xe0, 0x00, 0x00, 0x00, 0x00, // sequence end
            // -- 82 --
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x04, 0x00, // (0020,4000) ImageComments, len = 4
            b'T', b'E', b'S', b'T', // value = "TEST"
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0018, 0x6011),
                vr: VR::SQ,
                len: Length::UNDEFINED,
            },
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6012),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(PrimitiveValue::U16([1].as_ref().into())),
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6014),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(PrimitiveValue::U16([2].as_ref().into())),
            DataToken::ItemEnd,
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6012),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(PrimitiveValue::U16([4].as_ref().into())),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0020, 0x4000),
                vr: VR::LT,
                len: Length(4),
            }),
            DataToken::PrimitiveValue(PrimitiveValue::Str("TEST".into())),
        ];

        validate_dataset_reader_explicit_vr(DATA, ground_truth);
    }

    #[test]
    fn read_implicit_len_sequence_implicit_vr_unknown() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x33, 0x55, 0x33, 0x55, // sequence tag: (5533,5533) «private, unknown attribute»
            0xff, 0xff, 0xff, 0xff, // length: undefined
            // -- 8 --
            0xfe, 0xff, 0x00, 0xe0, // item begin
            0xff, 0xff, 0xff, 0xff, // length: undefined
            // -- 16 --
            0xfe, 0xff, 0x0d, 0xe0, // item end
            0x00, 0x00, 0x00, 0x00, // length is always zero
            // -- 24 --
            0xfe, 0xff, 0xdd, 0xe0,
            0x00, 0x00, 0x00, 0x00, // sequence end
            // -- 32 --
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x5533, 0x5533),
                vr: VR::UN,
                len: Length::UNDEFINED,
            },
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
        ];

        validate_dataset_reader_implicit_vr(DATA, ground_truth);
    }

    #[test]
    fn read_unknown_vr_sequence_in_explicit_vr() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            // (0009,1010) UN, defined length 26
            0x09, 0x00, 0x10, 0x10, b'U', b'N', 0x00, 0x00, 0x1A, 0x00, 0x00, 0x00,
            // -- 12 -- item of 18 bytes, implicit VR little endian
            0xFE, 0xFF, 0x00, 0xE0, 0x12, 0x00, 0x00, 0x00,
            // -- 20 -- (0008,0100) CodeValue, len 10
            0x08, 0x00, 0x00, 0x01, 0x0A, 0x00, 0x00, 0x00,
            b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b' ',
            // -- 38 -- back to explicit VR: (0020,4000) LT 4
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x04, 0x00, b'T', b'E', b'S', b'T',
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0009, 0x1010),
                vr: VR::UN,
                len: Length(26),
            },
            DataToken::ItemStart { len: Length(18) },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0008, 0x0100),
                vr: VR::SH,
                len: Length(10),
            }),
            DataToken::PrimitiveValue(dicom_value!(Strs, ["123456789"])),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0020, 0x4000),
                vr: VR::LT,
                len: Length(4),
            }),
            DataToken::PrimitiveValue(PrimitiveValue::Str("TEST".into())),
        ];

        validate_dataset_reader_explicit_vr(DATA, ground_truth);
    }

    #[rustfmt::skip]
    static ENCAPSULATED_PIXEL_DATA: &[u8] = &[
        0xe0, 0x7f, 0x10, 0x00, // (7FE0, 0010) PixelData
        b'O', b'B', // VR
        0x00, 0x00, // reserved
        0xff, 0xff, 0xff, 0xff, // length: undefined
        // -- 12 -- Basic offset table
        0xfe, 0xff, 0x00, 0xe0, // item start tag
        0x04, 0x00, 0x00, 0x00, // item length: 4
        // -- 20 -- item value
        0x10, 0x00, 0x00, 0x00, // 16
        // -- 24 -- First fragment of pixel data
        0xfe, 0xff, 0x00, 0xe0, // item start tag
        0x20, 0x00, 0x00, 0x00, // item length: 32
        // -- 32 -- Compressed Fragment
        0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99,
        0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99,
        0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99,
        0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99,
        // -- 64 -- End of pixel data
        0xfe, 0xff, 0xdd, 0xe0, // sequence end tag
        0x00, 0x00, 0x00, 0x00,
        // -- 72 -- padding
        0xfc, 0xff, 0xfc, 0xff, // (fffc,fffc) DataSetTrailingPadding
        b'O', b'B', // VR
        0x00, 0x00, // reserved
        0x08, 0x00, 0x00, 0x00, // length: 8
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    #[test]
    fn read_encapsulated_pixeldata() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0xe0, 0x7f, 0x10, 0x00, // (7FE0, 0010) PixelData
            b'O', b'B', // VR
            0x00, 0x00, // reserved
            0xff, 0xff, 0xff, 0xff, // length: undefined
            // -- 12 -- Basic offset table
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0x00, 0x00, 0x00, 0x00, // item length: 0
            // -- 20 -- First fragment of pixel data
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0x20, 0x00, 0x00, 0x00, // item length: 32
            // -- 28 -- Compressed Fragment
            0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99,
            0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99,
            0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99,
            0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99,
            // -- 60 -- End of pixel data
            0xfe, 0xff, 0xdd, 0xe0, // sequence end tag
            0x00, 0x00, 0x00, 0x00,
            // -- 68 -- padding
            0xfc, 0xff, 0xfc, 0xff, // (fffc,fffc) DataSetTrailingPadding
            b'O', b'B', // VR
            0x00, 0x00, // reserved
            0x08, 0x00, 0x00, 0x00, // length: 8
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let ground_truth = vec![
            DataToken::PixelSequenceStart,
            DataToken::ItemStart { len: Length(0) },
            DataToken::ItemEnd,
            DataToken::ItemStart { len: Length(32) },
            DataToken::ItemValue(vec![0x99; 32]),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::ElementHeader(DataElementHeader::new(
                Tag(0xfffc, 0xfffc),
                VR::OB,
                Length(8),
            )),
            DataToken::PrimitiveValue(PrimitiveValue::U8([0x00; 8].as_ref().into())),
        ];

        validate_dataset_reader_explicit_vr(DATA, ground_truth);
    }

    #[test]
    fn read_encapsulated_pixeldata_with_offset_table() {
        let ground_truth = vec![
            DataToken::PixelSequenceStart,
            DataToken::ItemStart { len: Length(4) },
            DataToken::OffsetTable(vec![16]),
            DataToken::ItemEnd,
            DataToken::ItemStart { len: Length(32) },
            DataToken::ItemValue(vec![0x99; 32]),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::ElementHeader(DataElementHeader::new(
                Tag(0xfffc, 0xfffc),
                VR::OB,
                Length(8),
            )),
            DataToken::PrimitiveValue(PrimitiveValue::U8([0x00; 8].as_ref().into())),
        ];

        validate_dataset_reader_explicit_vr(ENCAPSULATED_PIXEL_DATA, ground_truth);
    }

    #[test]
    fn encapsulated_pixeldata_as_bulk_data_uri() {
        let options = DataSetReaderOptions::default().bulk_data_policy(Some(BulkDataPolicy::Uri {
            locator: "file.dcm".to_owned(),
        }));
        let ground_truth = vec![
            DataToken::ElementHeader(DataElementHeader::new(
                Tag::PIXEL_DATA,
                VR::OB,
                Length::UNDEFINED,
            )),
            DataToken::BulkData(bulkdata::format_uri("file.dcm", 12, None)),
            DataToken::ElementHeader(DataElementHeader::new(
                Tag(0xfffc, 0xfffc),
                VR::OB,
                Length(8),
            )),
            DataToken::PrimitiveValue(PrimitiveValue::U8([0x00; 8].as_ref().into())),
        ];

        validate_dataset_reader(
            ENCAPSULATED_PIXEL_DATA,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            options,
            ground_truth,
        );
    }

    #[test]
    fn bulk_data_uri_with_custom_predicate() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            // (0008,0060) CS 2 "MR"
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'M', b'R',
            // -- 10 -- (7FE0,0010) OW 8
            0xE0, 0x7F, 0x10, 0x00, b'O', b'W', 0x00, 0x00, 0x08, 0x00, 0x00, 0x00,
            // -- 22 -- value
            0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00,
            // -- 30 -- (0020,4000) LT 4
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x04, 0x00, b'T', b'E', b'S', b'T',
        ];

        let options = DataSetReaderOptions::default()
            .bulk_data_policy(Some(BulkDataPolicy::Uri {
                locator: "in.dcm".to_owned(),
            }))
            .bulk_data_predicate(bulkdata::predicate(|c| c.tag == Tag::PIXEL_DATA));
        let ground_truth = vec![
            DataToken::ElementHeader(DataElementHeader::new(
                Tag(0x0008, 0x0060),
                VR::CS,
                Length(2),
            )),
            DataToken::PrimitiveValue(dicom_value!(Strs, ["MR"])),
            DataToken::ElementHeader(DataElementHeader::new(Tag::PIXEL_DATA, VR::OW, Length(8))),
            DataToken::BulkData(bulkdata::format_uri("in.dcm", 22, Some(8))),
            DataToken::ElementHeader(DataElementHeader::new(
                Tag(0x0020, 0x4000),
                VR::LT,
                Length(4),
            )),
            DataToken::PrimitiveValue(PrimitiveValue::Str("TEST".into())),
        ];
        validate_dataset_reader(DATA, &EXPLICIT_VR_LITTLE_ENDIAN, options, ground_truth);
    }

    #[test]
    fn spooled_bulk_data_share_one_file() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            // (7FE0,0010) OW 8
            0xE0, 0x7F, 0x10, 0x00, b'O', b'W', 0x00, 0x00, 0x08, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00,
            // (7FE1,0010) LT 4
            0xE1, 0x7F, 0x10, 0x00, b'L', b'T', 0x04, 0x00, b'T', b'E', b'S', b'T',
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bulk.spool");
        let supplied = path.clone();
        let options = DataSetReaderOptions::default()
            .bulk_data_policy(Some(BulkDataPolicy::Spool {
                supplier: std::sync::Arc::new(move || Ok(supplied.clone())),
            }))
            .bulk_data_predicate(bulkdata::predicate(|c| c.tag.group() >= 0x7FE0));
        let locator = path.to_string_lossy().into_owned();
        let ground_truth = vec![
            DataToken::ElementHeader(DataElementHeader::new(Tag::PIXEL_DATA, VR::OW, Length(8))),
            DataToken::BulkData(bulkdata::format_uri(&locator, 0, Some(8))),
            DataToken::ElementHeader(DataElementHeader::new(
                Tag(0x7FE1, 0x0010),
                VR::LT,
                Length(4),
            )),
            DataToken::BulkData(bulkdata::format_uri(&locator, 8, Some(4))),
        ];
        validate_dataset_reader(DATA, &EXPLICIT_VR_LITTLE_ENDIAN, options, ground_truth);

        let spooled = std::fs::read(&path).unwrap();
        assert_eq!(spooled, b"\x01\x00\x02\x00\x03\x00\x04\x00TEST");
    }

    #[test]
    fn cloned_options_append_to_the_same_spool() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            // (7FE0,0010) OW 4
            0xE0, 0x7F, 0x10, 0x00, b'O', b'W', 0x00, 0x00, 0x04, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x02, 0x00,
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.spool");
        let supplied = path.clone();
        let options = DataSetReaderOptions::default()
            .bulk_data_policy(Some(BulkDataPolicy::Spool {
                supplier: std::sync::Arc::new(move || Ok(supplied.clone())),
            }))
            .bulk_data_predicate(bulkdata::predicate(|c| c.tag == Tag::PIXEL_DATA));
        let locator = path.to_string_lossy().into_owned();

        for offset in [0, 4] {
            let ground_truth = vec![
                DataToken::ElementHeader(DataElementHeader::new(
                    Tag::PIXEL_DATA,
                    VR::OW,
                    Length(4),
                )),
                DataToken::BulkData(bulkdata::format_uri(&locator, offset, Some(4))),
            ];
            validate_dataset_reader(
                DATA,
                &EXPLICIT_VR_LITTLE_ENDIAN,
                options.clone(),
                ground_truth,
            );
        }

        let spooled = std::fs::read(&path).unwrap();
        assert_eq!(spooled, b"\x01\x00\x02\x00\x01\x00\x02\x00");
    }

    #[test]
    fn suppressed_bulk_data() {
        let options = DataSetReaderOptions::default()
            .bulk_data_policy(Some(BulkDataPolicy::Suppress))
            .bulk_data_predicate(bulkdata::predicate(|c| c.tag == Tag(0xfffc, 0xfffc)));
        let ground_truth = vec![
            DataToken::PixelSequenceStart,
            DataToken::ItemStart { len: Length(4) },
            DataToken::OffsetTable(vec![16]),
            DataToken::ItemEnd,
            DataToken::ItemStart { len: Length(32) },
            DataToken::ItemValue(vec![0x99; 32]),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::ElementHeader(DataElementHeader::new(
                Tag(0xfffc, 0xfffc),
                VR::OB,
                Length(8),
            )),
            DataToken::PrimitiveValue(PrimitiveValue::Empty),
        ];
        validate_dataset_reader(
            ENCAPSULATED_PIXEL_DATA,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            options,
            ground_truth,
        );
    }

    #[test]
    fn read_lazy_items() {
        let options = DataSetReaderOptions::default().lazy_items(true);
        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0018, 0x6011),
                vr: VR::SQ,
                len: Length(46),
            },
            DataToken::LazyItem(LazyItem {
                offset: 20,
                len: Length(20),
                data: EXPLICIT_SEQUENCE[20..40].to_vec(),
                implicit_vr_le: false,
                charset: SpecificCharacterSet::Default,
            }),
            DataToken::LazyItem(LazyItem {
                offset: 48,
                len: Length(10),
                data: EXPLICIT_SEQUENCE[48..58].to_vec(),
                implicit_vr_le: false,
                charset: SpecificCharacterSet::Default,
            }),
            DataToken::SequenceEnd,
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0020, 0x4000),
                vr: VR::LT,
                len: Length(4),
            }),
            DataToken::PrimitiveValue(PrimitiveValue::Str("TEST".into())),
        ];
        validate_dataset_reader(
            EXPLICIT_SEQUENCE,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            options,
            ground_truth,
        );
    }

    #[test]
    fn read_lazy_item_of_undefined_length() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            // (0008,1140) SQ undefined
            0x08, 0x00, 0x40, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // -- 12 -- item, undefined length
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            // -- 20 -- (0008,1150) UI 4
            0x08, 0x00, 0x50, 0x11, b'U', b'I', 0x04, 0x00, b'1', b'.', b'2', 0x00,
            // -- 32 -- item delimiter
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // -- 40 -- sequence delimiter
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        let options = DataSetReaderOptions::default().lazy_items(true);
        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0008, 0x1140),
                vr: VR::SQ,
                len: Length::UNDEFINED,
            },
            DataToken::LazyItem(LazyItem {
                offset: 20,
                len: Length::UNDEFINED,
                data: DATA[20..32].to_vec(),
                implicit_vr_le: false,
                charset: SpecificCharacterSet::Default,
            }),
            DataToken::SequenceEnd,
        ];
        validate_dataset_reader(DATA, &EXPLICIT_VR_LITTLE_ENDIAN, options, ground_truth);
    }

    #[test]
    fn item_character_set_does_not_leak() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            // (0008,1140) SQ 26
            0x08, 0x00, 0x40, 0x11, b'S', b'Q', 0x00, 0x00, 0x1A, 0x00, 0x00, 0x00,
            // -- 12 -- item of 18 bytes
            0xFE, 0xFF, 0x00, 0xE0, 0x12, 0x00, 0x00, 0x00,
            // -- 20 -- (0008,0005) CS 10 "ISO_IR 192"
            0x08, 0x00, 0x05, 0x00, b'C', b'S', 0x0A, 0x00,
            b'I', b'S', b'O', b'_', b'I', b'R', b' ', b'1', b'9', b'2',
            // -- 38 -- (0010,0010) PN 2 "A "
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x02, 0x00, b'A', b' ',
        ];
        let mut reader = DataSetReader::new_with_ts_cs_options(
            DATA,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            StandardDataDictionary,
            SpecificCharacterSet::IsoIr100,
            Default::default(),
        );
        let tokens: Vec<_> = (&mut reader).collect::<Result<_, _>>().unwrap();
        assert_eq!(tokens.len(), 8);
        assert_eq!(tokens[4], DataToken::ItemEnd);
        assert_eq!(tokens[5], DataToken::SequenceEnd);
        assert_eq!(tokens[7], DataToken::PrimitiveValue(dicom_value!(Strs, ["A"])));
        assert_eq!(reader.decoder().charset(), SpecificCharacterSet::IsoIr100);
    }

    #[test]
    fn inconsistent_sequence_end() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            // (0008,1140) SQ 12
            0x08, 0x00, 0x40, 0x11, b'S', b'Q', 0x00, 0x00, 0x0C, 0x00, 0x00, 0x00,
            // -- 12 -- item of 10 bytes, overrunning the sequence
            0xFE, 0xFF, 0x00, 0xE0, 0x0A, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'M', b'R',
        ];
        let reader = DataSetReader::new_with_ts_cs_options(
            DATA,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            StandardDataDictionary,
            SpecificCharacterSet::Default,
            Default::default(),
        );
        let result: Result<Vec<_>, _> = reader.collect();
        assert!(matches!(
            result,
            Err(super::Error::InconsistentSequenceEnd {
                end_of_sequence: 24,
                bytes_read: 30,
                ..
            })
        ));
    }

    #[test]
    fn read_dataset_in_dataset() {
        #[rustfmt::skip]
        const DATA: &'static [u8; 138] = &[
            // 0: (2001, 9000) private sequence
            0x01, 0x20, 0x00, 0x90, //
            // length: undefined
            0xFF, 0xFF, 0xFF, 0xFF, //
            // 8: Item start
            0xFE, 0xFF, 0x00, 0xE0, //
            // Item length explicit (114 bytes)
            0x72, 0x00, 0x00, 0x00, //
            // 16: (0008,1115) ReferencedSeriesSequence
            0x08, 0x00, 0x15, 0x11, //
            // length: undefined
            0xFF, 0xFF, 0xFF, 0xFF, //
            // 24: Item start
            0xFE, 0xFF, 0x00, 0xE0, //
            // Item length undefined
            0xFF, 0xFF, 0xFF, 0xFF, //
            // 32: (0008,1140) ReferencedImageSequence
            0x08, 0x00, 0x40, 0x11, //
            // length: undefined
            0xFF, 0xFF, 0xFF, 0xFF, //
            // 40: Item start
            0xFE, 0xFF, 0x00, 0xE0, //
            // Item length undefined
            0xFF, 0xFF, 0xFF, 0xFF, //
            // 48: (0008,1150) ReferencedSOPClassUID
            0x08, 0x00, 0x50, 0x11, //
            // length: 26
            0x1a, 0x00, 0x00, 0x00, //
            // Value: "1.2.840.10008.5.1.4.1.1.7\0" (SecondaryCaptureImageStorage)
            b'1', b'.', b'2', b'.', b'8', b'4', b'0', b'.', b'1', b'0', b'0', b'0', b'8', b'.',
            b'5', b'.', b'1', b'.', b'4', b'.', b'1', b'.', b'1', b'.', b'7', b'\0',
            // 82: Item End (ReferencedImageSequence)
            0xFE, 0xFF, 0x0D, 0xE0, //
            0x00, 0x00, 0x00, 0x00, //
            // 90: Sequence End (ReferencedImageSequence)
            0xFE, 0xFF, 0xDD, 0xE0, //
            0x00, 0x00, 0x00, 0x00, //
            // 98: Item End (ReferencedSeriesSequence)
            0xFE, 0xFF, 0x0D, 0xE0, //
            0x00, 0x00, 0x00, 0x00, //
            // 106: Sequence End (ReferencedSeriesSequence)
            0xFE, 0xFF, 0xDD, 0xE0, //
            0x00, 0x00, 0x00, 0x00, //
            // 114: (2050,0020) PresentationLUTShape, not in the dictionary
            0x50, 0x20, 0x20, 0x00, //
            // length: 8
            0x08, 0x00, 0x00, 0x00, //
            b'I', b'D', b'E', b'N', b'T', b'I', b'T', b'Y', //
            // 130: Sequence end
            0xFE, 0xFF, 0xDD, 0xE0, //
            0x00, 0x00, 0x00, 0x00, //
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x2001, 0x9000),
                vr: VR::UN,
                len: Length::UNDEFINED,
            },
            DataToken::ItemStart { len: Length(114) },
            DataToken::SequenceStart {
                tag: Tag(0x0008, 0x1115),
                vr: VR::SQ,
                len: Length::UNDEFINED,
            },
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::SequenceStart {
                tag: Tag(0x0008, 0x1140),
                vr: VR::SQ,
                len: Length::UNDEFINED,
            },
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0008, 0x1150),
                vr: VR::UI,
                len: Length(26),
            }),
            DataToken::PrimitiveValue(dicom_value!(Strs, ["1.2.840.10008.5.1.4.1.1.7"])),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x2050, 0x0020),
                vr: VR::UN,
                len: Length(8),
            }),
            DataToken::PrimitiveValue(PrimitiveValue::U8(b"IDENTITY".as_ref().into())),
            DataToken::ItemEnd, // inserted automatically
            DataToken::SequenceEnd,
        ];

        validate_dataset_reader_implicit_vr(DATA, ground_truth);
    }

    #[test]
    fn read_command_group_length_implicit() {
        static DATA: &[u8] = &[0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0];
        let ground_truth = vec![
            DataToken::ElementHeader(DataElementHeader::new(
                Tag(0x0000, 0x0000),
                VR::UL,
                Length(4),
            )),
            DataToken::PrimitiveValue(dicom_value!(U32, [0])),
        ];
        validate_dataset_reader_implicit_vr(DATA, ground_truth);
    }
}
