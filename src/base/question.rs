//! A single question in a DNS message.
//!
//! This module defines the type `Question` which represents an entry in
//! the question section of a DNS message.

use super::iana::{Class, Rtype};
use super::name::{Name, NameError};
use super::record::Named;
use core::fmt;
use core::str::FromStr;
use octseq::parse::Parser;

//------------ Question ------------------------------------------------------

/// A question in a DNS message.
///
/// In DNS, a question describes what is requested in a query. It consists
/// of three elements: a domain name, a record type, and a class.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    /// The domain name of the question.
    qname: Name,

    /// The record type of the question.
    qtype: Rtype,

    /// The class of the quesiton.
    qclass: Class,
}

/// # Creation and Conversion
///
impl Question {
    /// Creates a new question from its three componets.
    #[must_use]
    pub fn new(qname: Name, qtype: Rtype, qclass: Class) -> Self {
        Question {
            qname,
            qtype,
            qclass,
        }
    }

    /// Creates a new question from a name and record type, assuming class IN.
    #[must_use]
    pub fn new_in(qname: Name, qtype: Rtype) -> Self {
        Self::new(qname, qtype, Class::IN)
    }

    /// Creates a question from a name in presentation format.
    pub fn from_text(
        qname: &str,
        qtype: Rtype,
        qclass: Class,
    ) -> Result<Self, NameError> {
        Ok(Self::new(Name::from_str(qname)?, qtype, qclass))
    }
}

/// # Field Access
///
impl Question {
    /// Returns a reference to the domain nmae in the question,
    #[must_use]
    pub fn qname(&self) -> &Name {
        &self.qname
    }

    /// Returns the record type of the question.
    #[must_use]
    pub fn qtype(&self) -> Rtype {
        self.qtype
    }

    /// Returns the class of the question.
    #[must_use]
    pub fn qclass(&self) -> Class {
        self.qclass
    }
}

/// # Parsing and Composing
///
impl Question {
    /// Parses a question from a message.
    ///
    /// The parser must cover the whole message.
    pub fn parse(parser: &mut Parser<'_, [u8]>) -> Result<Self, NameError> {
        let qname = Name::parse(parser)?;
        let qtype = Rtype::from_int(parser.parse_u16_be()?);
        let qclass = Class::from_int(parser.parse_u16_be()?);
        Ok(Question::new(qname, qtype, qclass))
    }

    /// Returns the uncompressed wire format of the question.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut res = Vec::with_capacity(self.qname.len() + 4);
        res.extend_from_slice(self.qname.as_slice());
        self.qtype.compose(&mut res);
        self.qclass.compose(&mut res);
        res
    }
}

//--- Named

impl Named for Question {
    fn owner(&self) -> &Name {
        &self.qname
    }
}

//--- Display

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.qname, self.qclass, self.qtype)
    }
}
