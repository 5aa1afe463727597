//! The hints table.
//!
//! Hints are the servers to start resolution with. The table maps zones
//! to candidate server addresses with a priority each. For a query name,
//! the candidates of the closest enclosing zone are used.

use super::addr::{self, InvalidAddress, DNS_PORT};
use super::conf::ResolvConf;
use crate::base::name::{Name, NameError};
use core::fmt;
use std::error;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

//------------ Root Servers --------------------------------------------------

/// The IPv4 and IPv6 addresses of the thirteen root servers.
const ROOT_SERVERS: [([u8; 4], [u16; 8]); 13] = [
    ([198, 41, 0, 4], [0x2001, 0x503, 0xba3e, 0, 0, 0, 2, 0x30]),
    ([170, 247, 170, 2], [0x2801, 0x1b8, 0x10, 0, 0, 0, 0, 0xb]),
    ([192, 33, 4, 12], [0x2001, 0x500, 2, 0, 0, 0, 0, 0xc]),
    ([199, 7, 91, 13], [0x2001, 0x500, 0x2d, 0, 0, 0, 0, 0xd]),
    ([192, 203, 230, 10], [0x2001, 0x500, 0xa8, 0, 0, 0, 0, 0xe]),
    ([192, 5, 5, 241], [0x2001, 0x500, 0x2f, 0, 0, 0, 0, 0xf]),
    ([192, 112, 36, 4], [0x2001, 0x500, 0x12, 0, 0, 0, 0, 0xd0d]),
    ([198, 97, 190, 53], [0x2001, 0x500, 1, 0, 0, 0, 0, 0x53]),
    ([192, 36, 148, 17], [0x2001, 0x7fe, 0, 0, 0, 0, 0, 0x53]),
    ([192, 58, 128, 30], [0x2001, 0x503, 0xc27, 0, 0, 0, 2, 0x30]),
    ([193, 0, 14, 129], [0x2001, 0x7fd, 0, 0, 0, 0, 0, 1]),
    ([199, 7, 83, 42], [0x2001, 0x500, 0x9f, 0, 0, 0, 0, 0x42]),
    ([202, 12, 27, 33], [0x2001, 0xdc3, 0, 0, 0, 0, 0, 0x35]),
];

//------------ Hints ---------------------------------------------------------

/// The hints table.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Hints {
    zones: Vec<Zone>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Zone {
    name: Name,

    /// Candidates ordered by ascending priority.
    servers: Vec<Hint>,
}

/// A candidate server.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Hint {
    pub addr: SocketAddr,
    pub priority: u32,
}

impl Hints {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table containing the root servers for the root zone.
    #[must_use]
    pub fn root() -> Self {
        let mut res = Self::new();
        let root = Name::root();
        for (v4, v6) in ROOT_SERVERS {
            let v4 = Ipv4Addr::from(v4);
            let v6 = Ipv6Addr::new(
                v6[0], v6[1], v6[2], v6[3], v6[4], v6[5], v6[6], v6[7],
            );
            res.insert_addr(&root, SocketAddr::new(v4.into(), DNS_PORT), 1);
            res.insert_addr(&root, SocketAddr::new(v6.into(), DNS_PORT), 1);
        }
        res
    }

    /// Creates a stub table with the servers of a configuration.
    ///
    /// The servers are registered for the root zone, so they are used for
    /// all queries.
    #[must_use]
    pub fn local(conf: &ResolvConf) -> Self {
        let mut res = Self::new();
        res.insert_conf(&Name::root(), conf);
        res
    }

    /// Adds a candidate given in text form.
    ///
    /// The server may include a port as accepted by
    /// [`parse_server`][addr::parse_server].
    pub fn insert(
        &mut self,
        zone: &str,
        server: &str,
        priority: u32,
    ) -> Result<(), Error> {
        let zone: Name = zone.parse()?;
        let addr = addr::parse_server(server, DNS_PORT)?;
        self.insert_addr(&zone, addr, priority);
        Ok(())
    }

    /// Adds a candidate for a zone.
    ///
    /// Candidates with the same priority keep their insertion order.
    pub fn insert_addr(&mut self, zone: &Name, addr: SocketAddr, priority: u32) {
        let idx = match self.zones.iter().position(|item| item.name == *zone) {
            Some(idx) => idx,
            None => {
                self.zones.push(Zone {
                    name: zone.clone(),
                    servers: Vec::new(),
                });
                self.zones.len() - 1
            }
        };
        let servers = &mut self.zones[idx].servers;
        let pos = servers.partition_point(|hint| hint.priority <= priority);
        servers.insert(pos, Hint { addr, priority });
    }

    /// Adds all servers of a configuration as candidates for a zone.
    ///
    /// The servers get priorities in configuration order or all the same
    /// priority if the configuration has the `rotate` option set.
    pub fn insert_conf(&mut self, zone: &Name, conf: &ResolvConf) {
        for (idx, addr) in conf.servers.iter().enumerate() {
            let priority = if conf.options.rotate {
                1
            } else {
                u32::try_from(idx + 1).unwrap_or(u32::MAX)
            };
            self.insert_addr(zone, *addr, priority);
        }
    }

    /// Returns the candidates for a query name.
    ///
    /// The candidates are those of the registered zone with the longest
    /// match with the end of `qname`. If no zone matches, the iterator is
    /// empty.
    #[must_use]
    pub fn grep(&self, qname: &Name) -> HintsIter {
        let zone = self
            .zones
            .iter()
            .filter(|zone| qname.ends_with(&zone.name))
            .max_by_key(|zone| zone.name.label_count());
        match zone {
            Some(zone) => HintsIter {
                zone: zone.name.clone(),
                servers: zone.servers.iter().map(|hint| hint.addr).collect(),
                pos: 0,
            },
            None => HintsIter {
                zone: Name::root(),
                servers: Vec::new(),
                pos: 0,
            },
        }
    }

    /// Returns whether there are no candidates at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.iter().all(|zone| zone.servers.is_empty())
    }

    /// Returns an iterator over the zones and their candidates.
    pub fn zones(&self) -> impl Iterator<Item = (&Name, &[Hint])> + '_ {
        self.zones
            .iter()
            .map(|zone| (&zone.name, zone.servers.as_slice()))
    }

    /// Returns whether the table has a candidate with the given address.
    #[must_use]
    pub fn contains(&self, addr: IpAddr) -> bool {
        self.zones
            .iter()
            .flat_map(|zone| zone.servers.iter())
            .any(|hint| hint.addr.ip() == addr)
    }
}

//--- Display

impl fmt::Display for Hints {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for zone in &self.zones {
            writeln!(f, "[{}]", zone.name)?;
            for hint in &zone.servers {
                writeln!(
                    f,
                    "\t{}\tpriority {}",
                    addr::format_server(&hint.addr),
                    hint.priority
                )?;
            }
        }
        Ok(())
    }
}

//------------ HintsIter -----------------------------------------------------

/// The candidate servers for a query.
#[derive(Clone, Debug)]
pub struct HintsIter {
    zone: Name,
    servers: Vec<SocketAddr>,
    pos: usize,
}

impl HintsIter {
    /// Creates an iterator over the given servers.
    #[must_use]
    pub fn from_servers(zone: Name, servers: Vec<SocketAddr>) -> Self {
        HintsIter {
            zone,
            servers,
            pos: 0,
        }
    }

    /// Returns the zone the candidates belong to.
    pub fn zone(&self) -> &Name {
        &self.zone
    }

    /// Returns all candidates.
    pub fn servers(&self) -> &[SocketAddr] {
        &self.servers
    }

    /// Restarts the iteration.
    pub fn reset(&mut self) {
        self.pos = 0;
    }
}

impl Iterator for HintsIter {
    type Item = SocketAddr;

    fn next(&mut self) -> Option<Self::Item> {
        let res = self.servers.get(self.pos).copied()?;
        self.pos += 1;
        Some(res)
    }
}

//------------ Error ---------------------------------------------------------

/// A hint could not be added.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    InvalidZone(NameError),
    InvalidAddress(InvalidAddress),
}

impl From<NameError> for Error {
    fn from(err: NameError) -> Self {
        Error::InvalidZone(err)
    }
}

impl From<InvalidAddress> for Error {
    fn from(err: InvalidAddress) -> Self {
        Error::InvalidAddress(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidZone(ref err) => write!(f, "invalid zone: {}", err),
            Error::InvalidAddress(ref err) => err.fmt(f),
        }
    }
}

impl error::Error for Error {}

//============ Testing =======================================================
