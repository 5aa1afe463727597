//! Resource Records.
//!
//! This module defines [`Record`], an owned resource record taken from or
//! destined for a DNS message, the [`Section`] type naming the four
//! sections of a message, and the capability traits [`Named`] and
//! [`HasTtl`] shared by records and questions.
//!
//! A record does not keep a reference to the message it was parsed from.
//! All its data, including domain names in the record data, is expanded
//! and copied on parsing.

use super::iana::{Class, Rtype};
use super::name::Name;
use super::question::Question;
use crate::rdata::RecordData;
use core::fmt;
use std::net::IpAddr;

//------------ Section -------------------------------------------------------

/// The four sections of a DNS message.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Section {
    Question,
    Answer,
    Authority,
    Additional,
}

impl Section {
    /// All sections in message order.
    pub const ALL: [Section; 4] = [
        Section::Question,
        Section::Answer,
        Section::Authority,
        Section::Additional,
    ];

    /// Returns the index of the section in message order.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Section::Question => 0,
            Section::Answer => 1,
            Section::Authority => 2,
            Section::Additional => 3,
        }
    }

    /// Returns the section with the given index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the bit representing the section in a section mask.
    #[must_use]
    pub fn mask(self) -> u8 {
        1 << self.index()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Section::Question => "QUESTION",
            Section::Answer => "ANSWER",
            Section::Authority => "AUTHORITY",
            Section::Additional => "ADDITIONAL",
        })
    }
}

//------------ Named and HasTtl ----------------------------------------------

/// Something that has an owner name.
pub trait Named {
    /// Returns the owner name.
    fn owner(&self) -> &Name;
}

/// Something that has a time-to-live.
pub trait HasTtl {
    /// Returns the TTL in seconds.
    fn ttl(&self) -> u32;
}

//------------ Record --------------------------------------------------------

/// A resource record or a question entry.
///
/// Entries of the question section have no TTL and no record data. For
/// them, [`ttl`][HasTtl::ttl] returns zero and all data accessors return
/// an empty value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    section: Section,
    owner: Name,
    rtype: Rtype,
    class: Class,
    ttl: u32,
    data: Option<RecordData>,
}

/// # Creation
///
impl Record {
    /// Creates a new answer section record.
    ///
    /// The record type is taken from the data. For OPT data, the class
    /// and TTL arguments are ignored since both fields are encoded from
    /// the data itself.
    #[must_use]
    pub fn new(
        owner: Name,
        class: Class,
        ttl: u32,
        data: impl Into<RecordData>,
    ) -> Self {
        let data = data.into();
        let (class, ttl) = match data {
            RecordData::Opt(ref opt) => (opt.class(), opt.ttl()),
            _ => (class, ttl),
        };
        Record {
            section: Section::Answer,
            owner,
            rtype: data.rtype(),
            class,
            ttl,
            data: Some(data),
        }
    }

    /// Creates a question section entry.
    #[must_use]
    pub fn question(question: Question) -> Self {
        Record {
            section: Section::Question,
            owner: question.qname().clone(),
            rtype: question.qtype(),
            class: question.qclass(),
            ttl: 0,
            data: None,
        }
    }

    pub(crate) fn from_parts(
        section: Section,
        owner: Name,
        rtype: Rtype,
        class: Class,
        ttl: u32,
        data: Option<RecordData>,
    ) -> Self {
        Record {
            section,
            owner,
            rtype,
            class,
            ttl,
            data,
        }
    }

    /// Returns the record moved into the given section.
    ///
    /// Moving a record with data into the question section drops the data.
    #[must_use]
    pub fn with_section(mut self, section: Section) -> Self {
        self.section = section;
        if section == Section::Question {
            self.ttl = 0;
            self.data = None;
        }
        self
    }
}

/// # Field Access
///
impl Record {
    #[must_use]
    pub fn section(&self) -> Section {
        self.section
    }

    #[must_use]
    pub fn rtype(&self) -> Rtype {
        self.rtype
    }

    #[must_use]
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the typed record data.
    ///
    /// Returns `None` for question section entries.
    #[must_use]
    pub fn data(&self) -> Option<&RecordData> {
        self.data.as_ref()
    }

    /// Returns the uncompressed wire format of the record data.
    ///
    /// This is empty for question section entries.
    #[must_use]
    pub fn rdata(&self) -> Vec<u8> {
        self.data.as_ref().map(RecordData::to_vec).unwrap_or_default()
    }

    /// Returns the question this entry or record would answer.
    #[must_use]
    pub fn to_question(&self) -> Question {
        Question::new(self.owner.clone(), self.rtype, self.class)
    }

    /// Returns the address of an A or AAAA record.
    #[must_use]
    pub fn addr(&self) -> Option<IpAddr> {
        match self.data {
            Some(RecordData::A(ref data)) => Some(data.addr().into()),
            Some(RecordData::Aaaa(ref data)) => Some(data.addr().into()),
            _ => None,
        }
    }

    /// Returns the target name of an NS, CNAME, PTR, MX, or SRV record.
    #[must_use]
    pub fn target(&self) -> Option<&Name> {
        match self.data {
            Some(RecordData::Ns(ref data)) => Some(data.nsdname()),
            Some(RecordData::Cname(ref data)) => Some(data.cname()),
            Some(RecordData::Ptr(ref data)) => Some(data.ptrdname()),
            Some(RecordData::Mx(ref data)) => Some(data.exchange()),
            Some(RecordData::Srv(ref data)) => Some(data.target()),
            _ => None,
        }
    }

    /// Returns the concatenated strings of a TXT or SPF record.
    ///
    /// This is empty for all other records.
    #[must_use]
    pub fn text(&self) -> Vec<u8> {
        match self.data {
            Some(RecordData::Txt(ref data)) => data.text(),
            Some(RecordData::Spf(ref data)) => data.text(),
            _ => Vec::new(),
        }
    }
}

//--- Named and HasTtl

impl Named for Record {
    fn owner(&self) -> &Name {
        &self.owner
    }
}

impl HasTtl for Record {
    fn ttl(&self) -> u32 {
        self.ttl
    }
}

//--- Display

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.data {
            None => write!(f, ";{}\t\t{}\t{}", self.owner, self.class, self.rtype),
            Some(RecordData::Opt(ref opt)) => opt.fmt(f),
            Some(ref data) => write!(
                f,
                "{}\t{}\t{}\t{}\t{}",
                self.owner, self.ttl, self.class, self.rtype, data
            ),
        }
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::rdata::{Mx, Opt, A};

    #[test]
    fn opt_fields_come_from_the_data() {
        let mut opt = Opt::new(4096);
        opt.set_version(1);
        opt.set_dnssec_ok(true);
        let rec = Record::new(Name::root(), Class::IN, 3600, opt.clone());
        assert_eq!(rec.class(), Class::from_int(4096));
        assert_eq!(rec.ttl(), 0x0001_8000);
        assert_eq!(rec, opt.into_record().with_section(Section::Answer));
    }

    #[test]
    fn question_entries_are_empty() {
        let q = Question::new_in("example.com".parse().unwrap(), Rtype::MX);
        let rec = Record::question(q.clone());
        assert_eq!(rec.section(), Section::Question);
        assert_eq!(rec.ttl(), 0);
        assert!(rec.data().is_none());
        assert!(rec.rdata().is_empty());
        assert!(rec.target().is_none());
        assert!(rec.text().is_empty());
        assert_eq!(rec.to_question(), q);
        assert_eq!(rec.to_string(), ";example.com.\t\tIN\tMX");
    }

    #[test]
    fn accessors() {
        let owner: Name = "example.com".parse().unwrap();
        let rec = Record::new(
            owner.clone(),
            Class::IN,
            3600,
            Mx::new(10, "mx.example.com".parse().unwrap()),
        );
        assert_eq!(rec.rtype(), Rtype::MX);
        assert_eq!(rec.owner(), &owner);
        assert_eq!(rec.target().unwrap().to_string(), "mx.example.com.");
        assert_eq!(
            rec.to_string(),
            "example.com.\t3600\tIN\tMX\t10 mx.example.com."
        );

        let rec = Record::new(owner, Class::IN, 60, A::from_octets(192, 0, 2, 1))
            .with_section(Section::Additional);
        assert_eq!(rec.section(), Section::Additional);
        assert_eq!(rec.addr(), Some("192.0.2.1".parse().unwrap()));
        assert_eq!(rec.rdata(), [192, 0, 2, 1]);
    }
}
