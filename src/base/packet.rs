//! Building and inspecting DNS messages.
//!
//! A [`Packet`] is a DNS message kept in a buffer of fixed capacity. It
//! serves both for building messages by pushing entries into its four
//! sections and for inspecting received messages through record
//! iteration.
//!
//! When building, domain names are compressed against a small dictionary
//! of offsets of names already present in the message. A received
//! message is placed into a packet via [`Packet::load`] which must be
//! followed by [`Packet::study`]. Studying walks the message once,
//! verifies that the section counts of the header are backed by actual
//! data, and rebuilds the compression dictionary. Only then can records
//! be iterated or more entries be pushed.

use super::header::{Header, HeaderCounts, HeaderSection};
use super::iana::{Class, Rcode, Rtype};
use super::name::{Name, NameError, MAX_POINTER_JUMPS};
use super::question::Question;
use super::record::{HasTtl, Named, Record, Section};
use super::wire::Composer;
use crate::rdata::RecordData;
use bytes::Bytes;
use core::fmt;
use octseq::parse::{Parser, ShortInput};
use smallvec::SmallVec;

//------------ Constants -----------------------------------------------------

/// The number of names remembered for compression.
const DICT_SIZE: usize = 16;

/// Compression pointers can only reach offsets below this value.
const MAX_POINTER_TARGET: usize = 0x4000;

/// The largest possible DNS message.
const MAX_CAPACITY: usize = 65535;

//------------ Packet --------------------------------------------------------

/// A DNS message in a buffer of fixed capacity.
///
/// The packet never grows beyond the capacity given at creation. Its wire
/// data always contains at least the complete header.
#[derive(Clone)]
pub struct Packet {
    /// The wire data. Its length is the end of the message.
    data: Vec<u8>,

    /// The maximum length of `data`.
    capacity: usize,

    /// Offsets of names available for compression.
    dict: [u16; DICT_SIZE],

    /// The number of valid entries in `dict`.
    dict_len: usize,

    /// Whether the section structure is known.
    studied: bool,
}

/// # Creation and Loading
///
impl Packet {
    /// The default capacity for query messages.
    ///
    /// This fits the header, a question with a maximum length name, and an
    /// empty OPT record.
    pub const QBUFSIZ: usize = HeaderSection::LEN + 255 + 4 + 11;

    /// Creates a new, empty packet with the given capacity.
    ///
    /// The packet contains a header with all fields zero. Fails if the
    /// capacity cannot hold a header or exceeds the maximum message size.
    pub fn new(capacity: usize) -> Result<Self, PacketError> {
        if !(HeaderSection::LEN..=MAX_CAPACITY).contains(&capacity) {
            return Err(PacketError::Capacity);
        }
        let mut data = Vec::with_capacity(capacity);
        data.resize(HeaderSection::LEN, 0);
        Ok(Packet {
            data,
            capacity,
            dict: [0; DICT_SIZE],
            dict_len: 0,
            studied: true,
        })
    }

    /// Creates a query for a single question.
    ///
    /// The packet has a capacity of [`QBUFSIZ`][Self::QBUFSIZ] and has
    /// the RD bit set.
    pub fn query(question: &Question) -> Result<Self, PacketError> {
        let mut res = Self::new(Self::QBUFSIZ)?;
        let mut header = res.header();
        header.set_rd(true);
        res.set_header(header);
        res.push(
            Section::Question,
            question.qname(),
            question.qtype(),
            question.qclass(),
        )?;
        Ok(res)
    }

    /// Replaces the content of the packet with a received message.
    ///
    /// If the message is longer than the capacity, only the part that
    /// fits is kept and the TC bit is set. The packet needs to be
    /// [studied][Self::study] before records can be accessed.
    ///
    /// Fails if the message is shorter than a header. The previous content
    /// is kept in this case.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), PacketError> {
        if bytes.len() < HeaderSection::LEN {
            return Err(PacketError::Malformed("message shorter than header"));
        }
        let len = bytes.len().min(self.capacity);
        self.data.clear();
        self.data.extend_from_slice(&bytes[..len]);
        if len < bytes.len() {
            let mut header = self.header();
            header.set_tc(true);
            self.set_header(header);
        }
        self.dict_len = 0;
        self.studied = false;
        Ok(())
    }

    /// Creates a packet from a received message.
    ///
    /// The packet's capacity is the length of the message. The message is
    /// studied right away.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PacketError> {
        let mut res =
            Self::new(bytes.len().clamp(HeaderSection::LEN, MAX_CAPACITY))?;
        res.load(bytes)?;
        res.study()?;
        Ok(res)
    }

    /// Determines the section structure of a loaded message.
    ///
    /// Fails if the section counts claim more entries than there is data
    /// or if an entry is malformed.
    pub fn study(&mut self) -> Result<(), PacketError> {
        let counts = self.counts();
        let mut dict = [0u16; DICT_SIZE];
        let mut dict_len = 0;
        let mut parser = Parser::from_ref(self.data.as_slice());
        parser.advance(HeaderSection::LEN)?;
        for section in Section::ALL {
            for _ in 0..counts.get(section.index()) {
                let pos = parser.pos();
                skip_entry(&mut parser, section).map_err(|err| match err {
                    PacketError::CompressionLoop | PacketError::NameTooLong => {
                        err
                    }
                    _ => PacketError::Malformed(
                        "section counts exceed message",
                    ),
                })?;
                if dict_len < DICT_SIZE && pos < MAX_POINTER_TARGET {
                    dict[dict_len] = pos as u16;
                    dict_len += 1;
                }
            }
        }
        // Trailing data is ignored but new entries go after the last
        // section.
        let end = parser.pos();
        self.data.truncate(end);
        self.dict = dict;
        self.dict_len = dict_len;
        self.studied = true;
        Ok(())
    }

    /// Returns whether the packet has been studied.
    #[must_use]
    pub fn is_studied(&self) -> bool {
        self.studied
    }
}

/// # Header Access
///
impl Packet {
    /// Returns the header.
    #[must_use]
    pub fn header(&self) -> Header {
        self.header_section().header()
    }

    /// Replaces the header.
    pub fn set_header(&mut self, header: Header) {
        self.data[..4].copy_from_slice(header.as_slice())
    }

    /// Returns the section counts.
    #[must_use]
    pub fn counts(&self) -> HeaderCounts {
        self.header_section().counts()
    }

    fn header_section(&self) -> HeaderSection {
        // The data always contains the header.
        HeaderSection::from_message_slice(&self.data).unwrap_or_default()
    }

    /// Returns the query ID.
    #[must_use]
    pub fn qid(&self) -> u16 {
        self.header().id()
    }

    /// Sets the query ID.
    pub fn set_qid(&mut self, id: u16) {
        let mut header = self.header();
        header.set_id(id);
        self.set_header(header)
    }

    /// Returns the response code from the header.
    #[must_use]
    pub fn rcode(&self) -> Rcode {
        self.header().rcode()
    }

    /// Returns the number of entries in the given sections.
    #[must_use]
    pub fn count(&self, sections: &[Section]) -> usize {
        let counts = self.counts();
        sections
            .iter()
            .map(|section| usize::from(counts.get(section.index())))
            .sum()
    }
}

/// # Wire Data
///
impl Packet {
    /// Returns the capacity of the packet.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the length of the message.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the message has no entries in any section.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count(&Section::ALL) == 0
    }

    /// Returns the wire format of the message.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns the wire format as a bytes value.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.data)
    }
}

/// # Building
///
impl Packet {
    /// Appends an entry to a section.
    ///
    /// In the question section, this adds a question. In all other
    /// sections, it adds a record with a TTL of zero and empty record
    /// data.
    ///
    /// Entries can only be added to the last non-empty section or later
    /// sections. If there is not enough space left, the packet remains
    /// unchanged and [`PacketError::BufferFull`] is returned.
    pub fn push(
        &mut self,
        section: Section,
        name: &Name,
        rtype: Rtype,
        class: Class,
    ) -> Result<(), PacketError> {
        self.push_entry(section, |writer| {
            writer.append_compressed_name(name)?;
            writer.append_u16(rtype.to_int())?;
            writer.append_u16(class.to_int())?;
            if section != Section::Question {
                writer.append_u32(0)?;
                writer.append_u16(0)?;
            }
            Ok(())
        })
    }

    /// Appends a complete record to a section.
    ///
    /// The section of the record itself is ignored. Pushing into the
    /// question section only adds the record's question.
    pub fn push_record(
        &mut self,
        section: Section,
        record: &Record,
    ) -> Result<(), PacketError> {
        let data = match (section, record.data()) {
            (Section::Question, _) | (_, None) => {
                return self.push(
                    section,
                    record.owner(),
                    record.rtype(),
                    record.class(),
                )
            }
            (_, Some(data)) => data,
        };
        self.push_entry(section, |writer| {
            writer.append_compressed_name(record.owner())?;
            writer.append_u16(record.rtype().to_int())?;
            writer.append_u16(record.class().to_int())?;
            writer.append_u32(record.ttl())?;
            let len_pos = writer.packet.data.len();
            writer.append_u16(0)?;
            data.compose(writer)?;
            let rdlen = writer.packet.data.len() - len_pos - 2;
            let rdlen =
                u16::try_from(rdlen).map_err(|_| PacketError::BufferFull)?;
            writer.packet.data[len_pos..len_pos + 2]
                .copy_from_slice(&rdlen.to_be_bytes());
            Ok(())
        })
    }

    /// Appends an entry to a section with a closure doing the writing.
    ///
    /// Restores the previous state if the closure fails.
    fn push_entry<F>(
        &mut self,
        section: Section,
        op: F,
    ) -> Result<(), PacketError>
    where
        F: FnOnce(&mut PacketWriter) -> Result<(), PacketError>,
    {
        if !self.studied {
            return Err(PacketError::Unstudied);
        }
        let counts = self.counts();
        if Section::ALL[section.index() + 1..]
            .iter()
            .any(|later| counts.get(later.index()) != 0)
        {
            return Err(PacketError::SectionOrder);
        }
        let count = counts
            .get(section.index())
            .checked_add(1)
            .ok_or(PacketError::BufferFull)?;

        let end = self.data.len();
        let dict = self.dict;
        let dict_len = self.dict_len;
        let res = op(&mut PacketWriter { packet: self });
        if let Err(err) = res {
            self.data.truncate(end);
            self.dict = dict;
            self.dict_len = dict_len;
            return Err(err);
        }

        let mut counts = counts;
        counts.set(section.index(), count);
        self.data[4..12].copy_from_slice(counts.as_slice());
        Ok(())
    }

    /// Appends a name to the end of the message, compressing if possible.
    fn append_compressed_name(
        &mut self,
        name: &Name,
    ) -> Result<(), PacketError> {
        let start = self.data.len();
        let wire = name.as_slice();

        let mut positions = SmallVec::<[usize; 64]>::new();
        for &entry in &self.dict[..self.dict_len] {
            label_positions(&self.data, usize::from(entry), &mut positions);
        }

        let mut offset = 0;
        let mut pointer = None;
        for suffix in name.suffixes() {
            if suffix.len() == 1 {
                // The root label is shorter than a pointer.
                break;
            }
            pointer = positions.iter().copied().find(|&pos| {
                pos < MAX_POINTER_TARGET && name_at_matches(&self.data, pos, suffix)
            });
            if pointer.is_some() {
                break;
            }
            offset += suffix.len() - suffix_tail_len(suffix);
        }

        match pointer {
            Some(pos) => {
                self.append_slice(&wire[..offset])?;
                self.append_slice(&(0xC000 | pos as u16).to_be_bytes())?;
            }
            None => self.append_slice(wire)?,
        }
        if offset > 0 || pointer.is_none() {
            self.remember(start);
        }
        Ok(())
    }

    /// Adds the name at `pos` to the compression dictionary if possible.
    fn remember(&mut self, pos: usize) {
        if self.dict_len < DICT_SIZE && pos < MAX_POINTER_TARGET {
            self.dict[self.dict_len] = pos as u16;
            self.dict_len += 1;
        }
    }

    fn append_slice(&mut self, slice: &[u8]) -> Result<(), PacketError> {
        if self.data.len() + slice.len() > self.capacity {
            return Err(PacketError::BufferFull);
        }
        self.data.extend_from_slice(slice);
        Ok(())
    }
}

/// # Inspecting
///
impl Packet {
    /// Returns the first question of the message.
    ///
    /// This works on unstudied packets, too, and only needs the question
    /// itself to be intact.
    pub fn question(&self) -> Result<Question, PacketError> {
        if self.counts().qdcount() == 0 {
            return Err(PacketError::Malformed("no question"));
        }
        let mut parser = Parser::from_ref(self.data.as_slice());
        parser.advance(HeaderSection::LEN)?;
        Ok(Question::parse(&mut parser)?)
    }

    /// Returns an iterator over the records matching `filter`.
    ///
    /// The iterator yields an error for a malformed record and stops
    /// afterwards.
    pub fn records(
        &self,
        filter: RecordFilter,
    ) -> Result<RecordIter<'_>, PacketError> {
        if !self.studied {
            return Err(PacketError::Unstudied);
        }
        Ok(RecordIter::new(self, filter))
    }

    /// Returns the records of a single section.
    pub fn section(
        &self,
        section: Section,
    ) -> Result<RecordIter<'_>, PacketError> {
        self.records(RecordFilter::new().section(section))
    }
}

//--- Debug and Display

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Packet")
            .field("header", &self.header())
            .field("counts", &self.counts())
            .field("len", &self.data.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Formats the message similar to the output of dig.
impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let header = self.header();
        let counts = self.counts();
        writeln!(
            f,
            ";; ->>HEADER<<- opcode: {}, status: {}, id: {}",
            header.opcode(),
            header.rcode(),
            header.id()
        )?;
        writeln!(
            f,
            ";; flags: {}; QUERY: {}, ANSWER: {}, AUTHORITY: {}, \
             ADDITIONAL: {}",
            header.flags().to_string().to_lowercase(),
            counts.qdcount(),
            counts.ancount(),
            counts.nscount(),
            counts.arcount()
        )?;
        let mut current = None;
        for item in RecordIter::new(self, RecordFilter::new()) {
            match item {
                Ok(record) => {
                    if current != Some(record.section()) {
                        current = Some(record.section());
                        write!(f, "\n;; {} SECTION:\n", record.section())?;
                    }
                    writeln!(f, "{}", record)?;
                }
                Err(err) => {
                    writeln!(f, ";; {}", err)?;
                }
            }
        }
        Ok(())
    }
}

//------------ PacketWriter --------------------------------------------------

/// Writes into a packet during a push operation.
struct PacketWriter<'a> {
    packet: &'a mut Packet,
}

impl Composer for PacketWriter<'_> {
    fn append_slice(&mut self, slice: &[u8]) -> Result<(), PacketError> {
        self.packet.append_slice(slice)
    }

    fn append_name(&mut self, name: &Name) -> Result<(), PacketError> {
        let start = self.packet.data.len();
        self.packet.append_slice(name.as_slice())?;
        self.packet.remember(start);
        Ok(())
    }

    fn append_compressed_name(
        &mut self,
        name: &Name,
    ) -> Result<(), PacketError> {
        self.packet.append_compressed_name(name)
    }
}

//------------ RecordFilter --------------------------------------------------

/// Selects records during iteration.
///
/// An empty filter matches every entry of every section. Each criterion
/// added narrows the selection.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecordFilter {
    sections: u8,
    rtype: Option<Rtype>,
    class: Option<Class>,
    name: Option<Name>,
}

impl RecordFilter {
    /// Creates a filter matching everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a section to the selected sections.
    ///
    /// If no section is added, all sections are selected.
    #[must_use]
    pub fn section(mut self, section: Section) -> Self {
        self.sections |= section.mask();
        self
    }

    /// Selects only records of the given type.
    #[must_use]
    pub fn rtype(mut self, rtype: Rtype) -> Self {
        self.rtype = Some(rtype);
        self
    }

    /// Selects only records of the given class.
    #[must_use]
    pub fn class(mut self, class: Class) -> Self {
        self.class = Some(class);
        self
    }

    /// Selects only records with the given owner name.
    ///
    /// Names are compared ignoring ASCII case.
    #[must_use]
    pub fn name(mut self, name: Name) -> Self {
        self.name = Some(name);
        self
    }

    fn wants_section(&self, section: Section) -> bool {
        self.sections == 0 || self.sections & section.mask() != 0
    }

    fn matches(&self, rtype: Rtype, class: Class, name: &Name) -> bool {
        self.rtype.map_or(true, |want| want == rtype)
            && self.class.map_or(true, |want| want == class)
            && self.name.as_ref().map_or(true, |want| want == name)
    }
}

//------------ RecordIter ----------------------------------------------------

/// An iterator over the records of a packet.
///
/// The iterator is lazy and bounded by the section counts of the header.
/// It can be restarted via [`reset`][Self::reset].
#[derive(Clone, Debug)]
pub struct RecordIter<'a> {
    packet: &'a Packet,
    filter: RecordFilter,
    pos: usize,
    section: usize,
    remaining: u16,
    failed: bool,
}

impl<'a> RecordIter<'a> {
    fn new(packet: &'a Packet, filter: RecordFilter) -> Self {
        let mut res = RecordIter {
            packet,
            filter,
            pos: HeaderSection::LEN,
            section: 0,
            remaining: 0,
            failed: false,
        };
        res.reset();
        res
    }

    /// Restarts iteration at the first record.
    pub fn reset(&mut self) {
        self.pos = HeaderSection::LEN;
        self.section = 0;
        self.remaining = self.packet.counts().get(0);
        self.failed = false;
    }

    /// Parses the entry at the current position and advances.
    fn next_entry(
        &mut self,
        section: Section,
    ) -> Result<Option<Record>, PacketError> {
        let mut parser = Parser::from_ref(self.packet.as_slice());
        parser.seek(self.pos)?;
        if !self.filter.wants_section(section) {
            skip_entry(&mut parser, section)?;
            self.pos = parser.pos();
            return Ok(None);
        }
        let owner = Name::parse(&mut parser)?;
        let rtype = Rtype::from_int(parser.parse_u16_be()?);
        let class = Class::from_int(parser.parse_u16_be()?);
        if section == Section::Question {
            self.pos = parser.pos();
            if !self.filter.matches(rtype, class, &owner) {
                return Ok(None);
            }
            return Ok(Some(Record::from_parts(
                section, owner, rtype, class, 0, None,
            )));
        }
        let ttl = parser.parse_u32_be()?;
        let rdlen = usize::from(parser.parse_u16_be()?);
        if !self.filter.matches(rtype, class, &owner) {
            parser.advance(rdlen)?;
            self.pos = parser.pos();
            return Ok(None);
        }
        let data = RecordData::parse(rtype, class, ttl, &mut parser, rdlen)?;
        self.pos = parser.pos();
        Ok(Some(Record::from_parts(
            section,
            owner,
            rtype,
            class,
            ttl,
            Some(data),
        )))
    }
}

impl Iterator for RecordIter<'_> {
    type Item = Result<Record, PacketError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            while self.remaining == 0 {
                self.section += 1;
                if self.section >= 4 {
                    return None;
                }
                self.remaining = self.packet.counts().get(self.section);
            }
            let section = Section::from_index(self.section)?;
            self.remaining -= 1;
            match self.next_entry(section) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {}
                Err(err) => {
                    self.failed = true;
                    return Some(Err(match err {
                        PacketError::Malformed(_)
                        | PacketError::CompressionLoop
                        | PacketError::NameTooLong => err,
                        _ => PacketError::Malformed("truncated record"),
                    }));
                }
            }
        }
    }
}

//------------ Helpers -------------------------------------------------------

/// Skips over a single entry of the given section.
fn skip_entry(
    parser: &mut Parser<'_, [u8]>,
    section: Section,
) -> Result<(), PacketError> {
    Name::skip(parser)?;
    parser.advance(4)?;
    if section != Section::Question {
        parser.advance(4)?;
        let rdlen = parser.parse_u16_be()?;
        parser.advance(rdlen.into())?;
    }
    Ok(())
}

/// Collects the start positions of all labels of the name at `pos`.
///
/// Compression pointers are followed. The root label is not included.
fn label_positions(
    msg: &[u8],
    mut pos: usize,
    target: &mut SmallVec<[usize; 64]>,
) {
    let mut jumps = 0;
    while let Some(&ltype) = msg.get(pos) {
        match ltype {
            0 => return,
            1..=0x3F => {
                target.push(pos);
                pos += usize::from(ltype) + 1;
            }
            0xC0..=0xFF => {
                let Some(&low) = msg.get(pos + 1) else { return };
                jumps += 1;
                if jumps > MAX_POINTER_JUMPS {
                    return;
                }
                pos = usize::from(ltype & 0x3F) << 8 | usize::from(low);
            }
            _ => return,
        }
    }
}

/// Returns whether the name at `pos` in `msg` equals `wire`.
///
/// The comparison follows compression pointers and ignores ASCII case.
fn name_at_matches(msg: &[u8], mut pos: usize, mut wire: &[u8]) -> bool {
    let mut jumps = 0;
    loop {
        let Some(&ltype) = msg.get(pos) else { return false };
        match ltype {
            0..=0x3F => {
                let len = usize::from(ltype) + 1;
                let Some(label) = msg.get(pos..pos + len) else {
                    return false;
                };
                if wire.len() < len || !label.eq_ignore_ascii_case(&wire[..len]) {
                    return false;
                }
                if ltype == 0 {
                    return true;
                }
                wire = &wire[len..];
                pos += len;
            }
            0xC0..=0xFF => {
                let Some(&low) = msg.get(pos + 1) else { return false };
                jumps += 1;
                if jumps > MAX_POINTER_JUMPS {
                    return false;
                }
                pos = usize::from(ltype & 0x3F) << 8 | usize::from(low);
            }
            _ => return false,
        }
    }
}

/// Returns the length of a suffix without its first label.
fn suffix_tail_len(suffix: &[u8]) -> usize {
    suffix.len() - usize::from(suffix[0]) - 1
}

//------------ PacketError ---------------------------------------------------

/// An error happened while building or inspecting a packet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PacketError {
    /// The requested capacity cannot hold a message.
    Capacity,

    /// There was not enough space left in the packet.
    BufferFull,

    /// A domain name was longer than 255 octets or 127 labels.
    NameTooLong,

    /// Too many compression pointers were followed.
    CompressionLoop,

    /// The message is malformed.
    Malformed(&'static str),

    /// An entry was pushed into a section before a later, non-empty one.
    SectionOrder,

    /// The packet has been loaded but not studied.
    Unstudied,
}

//--- From

impl From<ShortInput> for PacketError {
    fn from(_: ShortInput) -> Self {
        PacketError::Malformed("unexpected end of message")
    }
}

impl From<NameError> for PacketError {
    fn from(err: NameError) -> Self {
        match err {
            NameError::LongLabel | NameError::LongName => {
                PacketError::NameTooLong
            }
            NameError::CompressionLoop => PacketError::CompressionLoop,
            NameError::BadLabel => PacketError::Malformed("invalid label type"),
            NameError::ShortInput => {
                PacketError::Malformed("unexpected end of message")
            }
            NameError::EmptyLabel
            | NameError::BadEscape
            | NameError::TrailingData => {
                PacketError::Malformed("invalid domain name")
            }
        }
    }
}

//--- Display and Error

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PacketError::Capacity => f.write_str("invalid packet capacity"),
            PacketError::BufferFull => f.write_str("packet buffer full"),
            PacketError::NameTooLong => f.write_str("domain name too long"),
            PacketError::CompressionLoop => {
                f.write_str("compression pointer loop")
            }
            PacketError::Malformed(msg) => {
                write!(f, "malformed packet: {}", msg)
            }
            PacketError::SectionOrder => {
                f.write_str("section already finished")
            }
            PacketError::Unstudied => f.write_str("packet not studied"),
        }
    }
}

impl std::error::Error for PacketError {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::rdata::{Cname, A};

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    #[test]
    fn capacity() {
        assert_eq!(Packet::new(11).unwrap_err(), PacketError::Capacity);
        assert_eq!(Packet::new(65536).unwrap_err(), PacketError::Capacity);
        let p = Packet::new(12).unwrap();
        assert_eq!(p.len(), 12);
        assert!(p.is_empty());
    }

    #[test]
    fn compression() {
        let mut p = Packet::new(512).unwrap();
        p.push(Section::Question, &name("www.example.com"), Rtype::A, Class::IN)
            .unwrap();
        let after_question = p.len();
        assert_eq!(after_question, 12 + 17 + 4);

        let rec = Record::new(
            name("WWW.example.com"),
            Class::IN,
            3600,
            Cname::new(name("web.example.com")),
        );
        p.push_record(Section::Answer, &rec).unwrap();
        // owner: pointer (2), header (10), rdata: "web" + pointer (6).
        assert_eq!(p.len(), after_question + 2 + 10 + 6);
        assert_eq!(&p.as_slice()[after_question..after_question + 2], &[0xC0, 12]);

        let parsed = Packet::from_bytes(p.as_slice()).unwrap();
        let answers: Vec<_> = parsed
            .section(Section::Answer)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].owner(), &name("www.example.com"));
        assert_eq!(
            answers[0].target().unwrap().to_string(),
            "web.example.com."
        );
    }

    #[test]
    fn buffer_full_restores() {
        let mut p = Packet::new(12 + 17 + 4 + 5).unwrap();
        p.push(Section::Question, &name("www.example.com"), Rtype::A, Class::IN)
            .unwrap();
        let before = p.as_slice().to_vec();
        let rec = Record::new(
            name("other.example.org"),
            Class::IN,
            60,
            A::from_octets(192, 0, 2, 1),
        );
        assert_eq!(
            p.push_record(Section::Answer, &rec),
            Err(PacketError::BufferFull)
        );
        assert_eq!(p.as_slice(), before.as_slice());
        assert_eq!(p.counts().ancount(), 0);
    }

    #[test]
    fn section_order() {
        let mut p = Packet::new(512).unwrap();
        let rec = Record::new(
            name("example.com"),
            Class::IN,
            60,
            A::from_octets(192, 0, 2, 1),
        );
        p.push_record(Section::Authority, &rec).unwrap();
        assert_eq!(
            p.push_record(Section::Answer, &rec),
            Err(PacketError::SectionOrder)
        );
        p.push_record(Section::Additional, &rec).unwrap();
        assert_eq!(p.count(&[Section::Authority, Section::Additional]), 2);
    }

    #[test]
    fn load_truncates() {
        let mut big = Packet::new(512).unwrap();
        big.set_qid(7);
        for i in 0..10 {
            let rec = Record::new(
                name(&format!("host{}.example.com", i)),
                Class::IN,
                60,
                A::from_octets(192, 0, 2, i),
            );
            big.push_record(Section::Answer, &rec).unwrap();
        }
        let mut small = Packet::new(64).unwrap();
        small.load(big.as_slice()).unwrap();
        assert_eq!(small.len(), 64);
        assert!(small.header().tc());
        assert!(!big.header().tc());
        assert_eq!(small.qid(), 7);
        assert_eq!(
            small.records(RecordFilter::new()).unwrap_err(),
            PacketError::Unstudied
        );
        assert!(matches!(small.study(), Err(PacketError::Malformed(_))));
    }

    #[test]
    fn filter() {
        let mut p = Packet::new(512).unwrap();
        p.push(Section::Question, &name("example.com"), Rtype::A, Class::IN)
            .unwrap();
        for (owner, last) in [("a.example.com", 1), ("b.example.com", 2)] {
            let rec = Record::new(
                name(owner),
                Class::IN,
                60,
                A::from_octets(192, 0, 2, last),
            );
            p.push_record(Section::Answer, &rec).unwrap();
        }
        let filter = RecordFilter::new()
            .section(Section::Answer)
            .name(name("B.EXAMPLE.COM."));
        let mut iter = p.records(filter).unwrap();
        let found = iter.next().unwrap().unwrap();
        assert_eq!(found.addr(), Some("192.0.2.2".parse().unwrap()));
        assert!(iter.next().is_none());
        iter.reset();
        assert!(iter.next().is_some());

        assert_eq!(
            p.records(RecordFilter::new().rtype(Rtype::AAAA))
                .unwrap()
                .count(),
            0
        );
        assert_eq!(p.records(RecordFilter::new()).unwrap().count(), 3);
    }

    #[test]
    fn display() {
        let mut p = Packet::query(&Question::new_in(name("example.com"), Rtype::A)).unwrap();
        p.set_qid(4660);
        let text = p.to_string();
        assert!(text.contains("id: 4660"));
        assert!(text.contains("flags: rd;"));
        assert!(text.contains(";; QUESTION SECTION:\n;example.com.\t\tIN\tA"));
    }
}
