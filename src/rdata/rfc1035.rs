//! Record data from [RFC 1035]: initial record types.
//!
//! This RFC defines the initial set of record types. Of those, the types
//! still in common use are A, NS, CNAME, SOA, PTR, MX, and TXT. TXT lives
//! in its own module since it shares its implementation with SPF.
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035

use crate::base::name::Name;
use crate::base::packet::PacketError;
use crate::base::wire::Composer;
use core::fmt;
use core::str::FromStr;
use octseq::parse::Parser;
use std::net::{AddrParseError, Ipv4Addr};

//------------ A ------------------------------------------------------------

/// A record data.
///
/// A records convey the IPv4 address of a host. The wire format is the 32
/// bit IPv4 address in network byte order. The representation file format
/// is the usual dotted notation.
///
/// The A record type is defined in RFC 1035, section 3.4.1.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct A {
    addr: Ipv4Addr,
}

impl A {
    /// Creates a new A record data from an IPv4 address.
    #[must_use]
    pub fn new(addr: Ipv4Addr) -> A {
        A { addr }
    }

    /// Creates a new A record from the IPv4 address components.
    #[must_use]
    pub fn from_octets(a: u8, b: u8, c: u8, d: u8) -> A {
        A::new(Ipv4Addr::new(a, b, c, d))
    }

    #[must_use]
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    pub(super) fn parse(
        parser: &mut Parser<'_, [u8]>,
        rdlen: usize,
    ) -> Result<Self, PacketError> {
        if rdlen != 4 {
            return Err(PacketError::Malformed("A record of wrong length"));
        }
        let mut buf = [0u8; 4];
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

impl From<Ipv4Addr> for A {
    fn from(addr: Ipv4Addr) -> Self {
        Self::new(addr)
    }
}

impl From<A> for Ipv4Addr {
    fn from(data: A) -> Self {
        data.addr
    }
}

impl FromStr for A {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ipv4Addr::from_str(s).map(A::new)
    }
}

//--- Display

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.addr.fmt(f)
    }
}

//------------ Record types consisting of a single domain name --------------

/// Defines a record data type that consists of nothing but a domain name.
macro_rules! name_type {
    ( $(#[$attr:meta])* $target:ident, $field:ident ) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Eq, Hash, PartialEq)]
        pub struct $target {
            $field: Name,
        }

        impl $target {
            #[must_use]
            pub fn new($field: Name) -> Self {
                $target { $field }
            }

            #[must_use]
            pub fn $field(&self) -> &Name {
                &self.$field
            }

            pub(super) fn parse(
                parser: &mut Parser<'_, [u8]>,
            ) -> Result<Self, PacketError> {
                Name::parse(parser).map(Self::new).map_err(Into::into)
            }

            pub(super) fn compose<Target: Composer + ?Sized>(
                &self,
                target: &mut Target,
            ) -> Result<(), PacketError> {
                target.append_compressed_name(&self.$field)
            }
        }

        impl From<Name> for $target {
            fn from(name: Name) -> Self {
                Self::new(name)
            }
        }

        impl fmt::Display for $target {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                self.$field.fmt(f)
            }
        }
    }
}

name_type! {
    /// NS record data.
    ///
    /// NS records specify hosts that are authoritative for a class and
    /// domain.
    ///
    /// The NS record type is defined in RFC 1035, section 3.3.11.
    Ns, nsdname
}

name_type! {
    /// CNAME record data.
    ///
    /// The CNAME record specifies the canonical or primary name for domain
    /// name alias.
    ///
    /// The CNAME type is defined in RFC 1035, section 3.3.1.
    Cname, cname
}

name_type! {
    /// PTR record data.
    ///
    /// PRT records are used in special domains to point to some other
    /// location in the domain space.
    ///
    /// The PTR record type is defined in RFC 1035, section 3.3.12.
    Ptr, ptrdname
}

//------------ Soa ----------------------------------------------------------

/// Soa record data.
///
/// Soa records mark the top of a zone and contain information pertinent to
/// name server maintenance operations.
///
/// The Soa record type is defined in RFC 1035, section 3.3.13.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Soa {
    mname: Name,
    rname: Name,
    serial: u32,
    refresh: u32,
    retry: u32,
    expire: u32,
    minimum: u32,
}

impl Soa {
    /// Creates new Soa record data from content.
    #[must_use]
    pub fn new(
        mname: Name,
        rname: Name,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    ) -> Self {
        Soa {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        }
    }

    /// The primary name server for the zone.
    #[must_use]
    pub fn mname(&self) -> &Name {
        &self.mname
    }

    /// The mailbox for the person responsible for this zone.
    #[must_use]
    pub fn rname(&self) -> &Name {
        &self.rname
    }

    /// The serial number of the original copy of the zone.
    #[must_use]
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// The time interval in seconds before the zone should be refreshed.
    #[must_use]
    pub fn refresh(&self) -> u32 {
        self.refresh
    }

    /// The time in seconds before a failed refresh is retried.
    #[must_use]
    pub fn retry(&self) -> u32 {
        self.retry
    }

    /// The upper limit of time in seconds the zone is authoritative.
    #[must_use]
    pub fn expire(&self) -> u32 {
        self.expire
    }

    /// The minimum TTL to be exported with any RR from this zone.
    #[must_use]
    pub fn minimum(&self) -> u32 {
        self.minimum
    }

    pub(super) fn parse(
        parser: &mut Parser<'_, [u8]>,
    ) -> Result<Self, PacketError> {
        Ok(Self::new(
            Name::parse(parser)?,
            Name::parse(parser)?,
            parser.parse_u32_be()?,
            parser.parse_u32_be()?,
            parser.parse_u32_be()?,
            parser.parse_u32_be()?,
            parser.parse_u32_be()?,
        ))
    }

    pub(super) fn compose<Target: Composer + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), PacketError> {
        target.append_compressed_name(&self.mname)?;
        target.append_compressed_name(&self.rname)?;
        for value in [
            self.serial,
            self.refresh,
            self.retry,
            self.expire,
            self.minimum,
        ] {
            target.append_u32(value)?;
        }
        Ok(())
    }
}

impl fmt::Display for Soa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.mname,
            self.rname,
            self.serial,
            self.refresh,
            self.retry,
            self.expire,
            self.minimum
        )
    }
}

//------------ Mx -----------------------------------------------------------

/// Mx record data.
///
/// The Mx record specifies a host willing to serve as a mail exchange for
/// the owner name.
///
/// The Mx record type is defined in RFC 1035, section 3.3.9.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Mx {
    preference: u16,
    exchange: Name,
}

impl Mx {
    /// Creates a new Mx record data from the components.
    #[must_use]
    pub fn new(preference: u16, exchange: Name) -> Self {
        Mx {
            preference,
            exchange,
        }
    }

    /// The preference for this record.
    ///
    /// Defines an order if there are several Mx records for the same owner.
    /// Lower values are preferred.
    #[must_use]
    pub fn preference(&self) -> u16 {
        self.preference
    }

    /// The name of the host that is the exchange.
    #[must_use]
    pub fn exchange(&self) -> &Name {
        &self.exchange
    }

    pub(super) fn parse(
        parser: &mut Parser<'_, [u8]>,
    ) -> Result<Self, PacketError> {
        let preference = parser.parse_u16_be()?;
        Ok(Self::new(preference, Name::parse(parser)?))
    }

    pub(super) fn compose<Target: Composer + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), PacketError> {
        target.append_u16(self.preference)?;
        target.append_compressed_name(&self.exchange)
    }
}

impl fmt::Display for Mx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.exchange)
    }
}

//============ Testing =======================================================
