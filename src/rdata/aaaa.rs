//! Record data from [RFC 3596]: AAAA records.
//!
//! [RFC 3596]: https://tools.ietf.org/html/rfc3596

use crate::base::packet::PacketError;
use crate::base::wire::Composer;
use core::fmt;
use core::str::FromStr;
use octseq::parse::Parser;
use std::net::{AddrParseError, Ipv6Addr};

//------------ Aaaa ---------------------------------------------------------

/// AAAA record data.
///
/// AAAA records convey the IPv6 address of a host.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Aaaa {
    addr: Ipv6Addr,
}

impl Aaaa {
    #[must_use]
    pub fn new(addr: Ipv6Addr) -> Aaaa {
        Aaaa { addr }
    }

    #[must_use]
    pub fn addr(&self) -> Ipv6Addr {
        self.addr
    }

    pub(super) fn parse(
        parser: &mut Parser<'_, [u8]>,
        rdlen: usize,
    ) -> Result<Self, PacketError> {
        if rdlen != 16 {
            return Err(PacketError::Malformed("AAAA record of wrong length"));
        }
        let mut buf = [0u8; 16];
        parser.parse_buf(&mut buf)?;
        Ok(Self::new(buf.into()))
    }

    pub(super) fn compose<Target: Composer + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), PacketError> {
        target.append_slice(&self.addr.octets())
    }
}

//--- From and FromStr

impl From<Ipv6Addr> for Aaaa {
    fn from(addr: Ipv6Addr) -> Self {
        Self::new(addr)
    }
}

impl From<Aaaa> for Ipv6Addr {
    fn from(data: Aaaa) -> Self {
        data.addr
    }
}

impl FromStr for Aaaa {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ipv6Addr::from_str(s).map(Aaaa::new)
    }
}

//--- Display

impl fmt::Display for Aaaa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.addr.fmt(f)
    }
}
