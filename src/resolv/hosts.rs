//! The hosts table.
//!
//! The hosts table contains static mappings between domain names and
//! addresses. It is consulted before going to the network if the lookup
//! order of the configuration says so. A lookup that finds nothing isn't
//! an error but merely means that the network needs to be asked.

use super::addr::{self, InvalidAddress};
use crate::base::header::Header;
use crate::base::iana::{Class, Rtype};
use crate::base::name::{Name, NameError};
use crate::base::packet::{Packet, PacketError};
use crate::base::question::Question;
use crate::base::record::{Record, Section};
use crate::rdata::{Aaaa, Ptr, A};
use core::fmt;
use std::io::{self, BufRead, Read};
use std::net::IpAddr;
use std::path::Path;
use std::{error, fs};
use tracing::trace;

/// The conventional location of the hosts file.
pub const HOSTS_PATH: &str = "/etc/hosts";

//------------ Family --------------------------------------------------------

/// An address family.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Family {
    /// IPv4.
    Inet,

    /// IPv6.
    Inet6,
}

impl Family {
    /// Returns the family of an address.
    #[must_use]
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Family::Inet,
            IpAddr::V6(_) => Family::Inet6,
        }
    }
}

//------------ HostEntry -----------------------------------------------------

/// A single entry of the hosts table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostEntry {
    addr: IpAddr,
    name: Name,
    alias: bool,
}

impl HostEntry {
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns whether the name is an alias rather than a canonical name.
    pub fn is_alias(&self) -> bool {
        self.alias
    }

    pub fn family(&self) -> Family {
        Family::of(&self.addr)
    }
}

//------------ Hosts ---------------------------------------------------------

/// The hosts table.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Hosts {
    entries: Vec<HostEntry>,
}

/// # Creation and Loading
///
impl Hosts {
    /// Creates a new, empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table from the system's hosts file.
    ///
    /// A missing file results in an empty table.
    pub fn local() -> Result<Self, Error> {
        let mut res = Self::new();
        match res.load_path(HOSTS_PATH) {
            Ok(()) => Ok(res),
            Err(Error::Io(ref err)) if err.kind() == io::ErrorKind::NotFound => {
                trace!("{} not found", HOSTS_PATH);
                Ok(res)
            }
            Err(err) => Err(err),
        }
    }

    /// Adds the content of a hosts file to the table.
    pub fn load_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let file = fs::File::open(path)?;
        self.load(file)
    }

    /// Adds hosts file content read from a reader to the table.
    ///
    /// Each line contains an address followed by the canonical name and
    /// any number of aliases. Comments start with `#`.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), Error> {
        let reader = io::BufReader::new(reader);
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = match line.find('#') {
                Some(pos) => &line[..pos],
                None => line.as_str(),
            };
            let mut words = line.split_whitespace();
            let addr = match words.next() {
                Some(addr) => addr,
                None => continue,
            };
            let parse_err = |reason| Error::Parse {
                line: idx + 1,
                reason,
            };
            let addr = addr::parse_ip(addr)
                .map_err(|_| parse_err("invalid address"))?;
            let mut alias = false;
            for name in words {
                let name =
                    name.parse().map_err(|_| parse_err("invalid name"))?;
                self.entries.push(HostEntry { addr, name, alias });
                alias = true;
            }
            if !alias {
                return Err(parse_err("missing host name"));
            }
        }
        Ok(())
    }

    /// Adds a single entry.
    pub fn insert(
        &mut self,
        addr: &str,
        name: &str,
        alias: bool,
    ) -> Result<(), Error> {
        let addr = addr::parse_ip(addr)?;
        let name = name.parse()?;
        self.entries.push(HostEntry { addr, name, alias });
        Ok(())
    }
}

/// # Lookups
///
impl Hosts {
    /// Returns all entries in insertion order.
    pub fn entries(&self) -> &[HostEntry] {
        &self.entries
    }

    /// Returns the first address of the given family for a name.
    #[must_use]
    pub fn lookup(&self, name: &Name, family: Family) -> Option<IpAddr> {
        self.entries
            .iter()
            .find(|entry| entry.family() == family && entry.name == *name)
            .map(|entry| entry.addr)
    }

    /// Returns the canonical name for an address.
    #[must_use]
    pub fn lookup_addr(&self, addr: IpAddr) -> Option<&Name> {
        self.entries
            .iter()
            .find(|entry| !entry.alias && entry.addr == addr)
            .map(|entry| &entry.name)
    }

    /// Produces an answer to a question from the table.
    ///
    /// Only A, AAAA, and PTR questions for class IN or ANY can be
    /// answered. Returns `Ok(None)` if the table has no answer. The answer
    /// has the QR, AA, and RA flags set, echoes the question, and contains
    /// a single record with a TTL of zero.
    pub fn query(
        &self,
        question: &Question,
    ) -> Result<Option<Packet>, PacketError> {
        if !matches!(question.qclass(), Class::IN | Class::ANY) {
            return Ok(None);
        }
        let qname = question.qname().clone();
        let record = match question.qtype() {
            Rtype::A => match self.lookup(&qname, Family::Inet) {
                Some(IpAddr::V4(addr)) => {
                    Record::new(qname, Class::IN, 0, A::new(addr))
                }
                _ => return Ok(None),
            },
            Rtype::AAAA => match self.lookup(&qname, Family::Inet6) {
                Some(IpAddr::V6(addr)) => {
                    Record::new(qname, Class::IN, 0, Aaaa::new(addr))
                }
                _ => return Ok(None),
            },
            Rtype::PTR => {
                let target = addr::from_reverse_name(&qname)
                    .and_then(|addr| self.lookup_addr(addr));
                match target {
                    Some(target) => Record::new(
                        qname,
                        Class::IN,
                        0,
                        Ptr::new(target.clone()),
                    ),
                    None => return Ok(None),
                }
            }
            _ => return Ok(None),
        };
        let mut packet = Packet::new(512)?;
        let mut header = Header::new();
        header.set_qr(true);
        header.set_aa(true);
        header.set_ra(true);
        packet.set_header(header);
        packet.push(
            Section::Question,
            question.qname(),
            question.qtype(),
            question.qclass(),
        )?;
        packet.push_record(Section::Answer, &record)?;
        trace!("hosts answer for {}", question);
        Ok(Some(packet))
    }
}

//--- Display

impl fmt::Display for Hosts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut current: Option<IpAddr> = None;
        for entry in &self.entries {
            if entry.alias && current == Some(entry.addr) {
                write!(f, " {}", entry.name.to_relative_string())?;
                continue;
            }
            if current.is_some() {
                writeln!(f)?;
            }
            write!(f, "{}\t{}", entry.addr, entry.name.to_relative_string())?;
            current = Some(entry.addr);
        }
        if current.is_some() {
            writeln!(f)?;
        }
        Ok(())
    }
}

//------------ Error --------------------------------------------------------

/// An error happened while building a hosts table.
#[derive(Debug)]
pub enum Error {
    /// An address was invalid.
    InvalidAddress(InvalidAddress),

    /// A name was invalid.
    InvalidName(NameError),

    /// A line of a hosts file could not be parsed.
    Parse { line: usize, reason: &'static str },

    /// Reading a hosts file failed.
    Io(io::Error),
}

impl From<InvalidAddress> for Error {
    fn from(err: InvalidAddress) -> Self {
        Error::InvalidAddress(err)
    }
}

impl From<NameError> for Error {
    fn from(err: NameError) -> Self {
        Error::InvalidName(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidAddress(ref err) => err.fmt(f),
            Error::InvalidName(ref err) => err.fmt(f),
            Error::Parse { line, reason } => {
                write!(f, "line {}: {}", line, reason)
            }
            Error::Io(ref err) => err.fmt(f),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::InvalidAddress(ref err) => Some(err),
            Error::InvalidName(ref err) => Some(err),
            Error::Parse { .. } => None,
            Error::Io(ref err) => Some(err),
        }
    }
}

//============ Testing =======================================================
