//! Record data from [RFC 6891]: OPT records.
//!
//! The OPT pseudo-record is used by EDNS to extend the DNS message header.
//! Its owner is always the root, its CLASS field carries the requestor's
//! UDP payload size and its TTL field carries the upper eight bits of the
//! extended response code, the EDNS version, and the DO flag:
//!
//! ```text
//!             +0 (MSB)                            +1 (LSB)
//!  +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//!  |         EXTENDED-RCODE        |            VERSION            |
//!  +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//!  | DO|                           Z                               |
//!  +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//! ```
//!
//! The RDATA is a sequence of options, each consisting of a 16 bit code,
//! a 16 bit length, and the option data.
//!
//! [RFC 6891]: https://tools.ietf.org/html/rfc6891

use crate::base::iana::{Class, Rcode};
use crate::base::name::Name;
use crate::base::packet::PacketError;
use crate::base::record::{Record, Section};
use crate::base::wire::Composer;
use bytes::Bytes;
use core::fmt;
use octseq::parse::Parser;

//------------ Opt -----------------------------------------------------------

/// OPT record data together with the values kept in CLASS and TTL.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Opt {
    udp_payload_size: u16,
    ext_rcode: u8,
    version: u8,
    dnssec_ok: bool,
    options: Vec<OptOption>,
}

impl Opt {
    /// The minimum UDP payload size; smaller values are treated as this.
    pub const MIN_UDP_PAYLOAD_SIZE: u16 = 512;

    /// Creates a new, empty OPT record advertising the given payload size.
    #[must_use]
    pub fn new(udp_payload_size: u16) -> Self {
        Opt {
            udp_payload_size,
            ext_rcode: 0,
            version: 0,
            dnssec_ok: false,
            options: Vec::new(),
        }
    }

    /// Returns the maximum UDP payload size the sender can receive.
    ///
    /// Values below 512 are treated as 512.
    #[must_use]
    pub fn udp_payload_size(&self) -> u16 {
        self.udp_payload_size.max(Self::MIN_UDP_PAYLOAD_SIZE)
    }

    /// Returns the upper eight bits of the extended response code.
    #[must_use]
    pub fn ext_rcode(&self) -> u8 {
        self.ext_rcode
    }

    /// Returns the complete 12 bit response code.
    ///
    /// The lower four bits are taken from the header's `rcode`.
    #[must_use]
    pub fn full_rcode(&self, rcode: Rcode) -> u16 {
        u16::from(self.ext_rcode) << 4 | u16::from(rcode.to_int())
    }

    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    #[must_use]
    pub fn dnssec_ok(&self) -> bool {
        self.dnssec_ok
    }

    pub fn set_ext_rcode(&mut self, value: u8) {
        self.ext_rcode = value
    }

    pub fn set_version(&mut self, value: u8) {
        self.version = value
    }

    pub fn set_dnssec_ok(&mut self, value: bool) {
        self.dnssec_ok = value
    }

    #[must_use]
    pub fn options(&self) -> &[OptOption] {
        &self.options
    }

    pub fn push_option(&mut self, option: OptOption) {
        self.options.push(option)
    }

    /// Returns the value of the TTL field of the record.
    #[must_use]
    pub fn ttl(&self) -> u32 {
        u32::from(self.ext_rcode) << 24
            | u32::from(self.version) << 16
            | if self.dnssec_ok { 0x8000 } else { 0 }
    }

    /// Returns the value of the CLASS field of the record.
    #[must_use]
    pub fn class(&self) -> Class {
        Class::from_int(self.udp_payload_size)
    }

    /// Converts the data into a complete additional section record.
    #[must_use]
    pub fn into_record(self) -> Record {
        let (class, ttl) = (self.class(), self.ttl());
        Record::new(Name::root(), class, ttl, self)
            .with_section(Section::Additional)
    }

    pub(super) fn parse(
        class: Class,
        ttl: u32,
        parser: &mut Parser<'_, [u8]>,
        rdlen: usize,
    ) -> Result<Self, PacketError> {
        let end = parser.pos() + rdlen;
        let mut res = Opt::new(class.to_int());
        res.ext_rcode = (ttl >> 24) as u8;
        res.version = (ttl >> 16) as u8;
        res.dnssec_ok = ttl & 0x8000 != 0;
        while parser.pos() < end {
            let code = parser.parse_u16_be()?;
            let len = usize::from(parser.parse_u16_be()?);
            if parser.pos() + len > end {
                return Err(PacketError::Malformed("EDNS option exceeds RDATA"));
            }
            let data = Bytes::copy_from_slice(parser.peek(len)?);
            parser.advance(len)?;
            res.options.push(OptOption { code, data });
        }
        Ok(res)
    }

    pub(super) fn compose<Target: Composer + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), PacketError> {
        for option in &self.options {
            let len = u16::try_from(option.data.len())
                .map_err(|_| PacketError::BufferFull)?;
            target.append_u16(option.code)?;
            target.append_u16(len)?;
            target.append_slice(&option.data)?;
        }
        Ok(())
    }
}

//--- Display

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "; EDNS: version {}; flags:{}; udp: {}",
            self.version,
            if self.dnssec_ok { " do" } else { "" },
            self.udp_payload_size
        )?;
        for option in &self.options {
            write!(f, "; {}", option)?;
        }
        Ok(())
    }
}

//------------ OptOption -----------------------------------------------------

/// A single EDNS option.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct OptOption {
    code: u16,
    data: Bytes,
}

impl OptOption {
    #[must_use]
    pub fn new(code: u16, data: impl Into<Bytes>) -> Self {
        OptOption {
            code,
            data: data.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> u16 {
        self.code
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Display for OptOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "OPT{}: ", self.code)?;
        for ch in self.data.iter() {
            write!(f, "{:02x}", ch)?;
        }
        Ok(())
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_fields() {
        let mut opt = Opt::new(4096);
        opt.set_ext_rcode(1);
        opt.set_version(0);
        opt.set_dnssec_ok(true);
        assert_eq!(opt.ttl(), 0x0100_8000);
        assert_eq!(opt.class().to_int(), 4096);
        assert_eq!(opt.full_rcode(Rcode::NOERROR), 16);

        let parsed = {
            let data = b"\x00\x0a\x00\x02\xab\xcd";
            let mut parser = Parser::from_ref(&data[..]);
            Opt::parse(Class::from_int(1232), 0x0001_0000, &mut parser, 6)
                .unwrap()
        };
        assert_eq!(parsed.udp_payload_size(), 1232);
        assert_eq!(parsed.version(), 1);
        assert!(!parsed.dnssec_ok());
        assert_eq!(parsed.options(), &[OptOption::new(10, vec![0xab, 0xcd])]);
    }

    #[test]
    fn small_payload_size() {
        assert_eq!(Opt::new(100).udp_payload_size(), 512);
    }
}
