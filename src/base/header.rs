//! The fixed twelve octet header of a DNS message.
//!
//! The first four octets hold the query ID and the flag word. They are
//! represented by [`Header`] and may be edited freely on a finished
//! message. The remaining eight octets count the
//! entries of each section. [`HeaderCounts`] gives read access to them;
//! the packet keeps them in step with its content. See [RFC 1035], section
//! 4.1.1, for the layout.
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035

use super::iana::{Opcode, Rcode};
use core::fmt;

//------------ Header --------------------------------------------------

/// The query ID and flag word of a message.
///
/// The four octets are kept exactly as they appear on the wire:
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA|Z |AD|CD|   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// AD and CD come from [RFC 4035]; everything else is [RFC 1035].
///
/// [RFC 1035]: https://tools.ietf.org/html/rfc1035
/// [RFC 4035]: https://tools.ietf.org/html/rfc4035
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Header {
    inner: [u8; 4],
}

/// # Creation and Conversion
///
impl Header {
    /// Creates an all-zero header.
    ///
    /// This is a standard query with ID 0 and no flags set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header from the first four octets of a message.
    ///
    /// Returns `None` if the slice is shorter than four octets.
    #[must_use]
    pub fn from_message_slice(s: &[u8]) -> Option<Self> {
        let inner = s.get(..4)?;
        let mut res = Self::new();
        res.inner.copy_from_slice(inner);
        Some(res)
    }

    /// Returns the header in wire format.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }
}

/// # Field Access
///
impl Header {
    /// Returns the query ID.
    ///
    /// Servers copy it from the query, so it pairs answers with queries.
    #[must_use]
    pub fn id(self) -> u16 {
        u16::from_be_bytes([self.inner[0], self.inner[1]])
    }

    /// Sets the query ID.
    pub fn set_id(&mut self, value: u16) {
        self.inner[..2].copy_from_slice(&value.to_be_bytes())
    }

    /// Returns the QR flag.
    #[must_use]
    pub fn qr(self) -> bool {
        self.get_bit(2, 7)
    }

    /// Sets the QR flag.
    pub fn set_qr(&mut self, set: bool) {
        self.set_bit(2, 7, set)
    }

    /// Returns the opcode.
    #[must_use]
    pub fn opcode(self) -> Opcode {
        Opcode::from_int((self.inner[2] >> 3) & 0x0F)
    }

    /// Sets the opcode.
    pub fn set_opcode(&mut self, opcode: Opcode) {
        self.inner[2] = self.inner[2] & 0x87 | ((opcode.to_int() & 0x0F) << 3);
    }

    /// Returns the flag bits as a struct.
    #[must_use]
    pub fn flags(self) -> Flags {
        Flags {
            qr: self.qr(),
            aa: self.aa(),
            tc: self.tc(),
            rd: self.rd(),
            ra: self.ra(),
            z: self.z(),
            ad: self.ad(),
            cd: self.cd(),
        }
    }

    /// Returns octets two and three as a number.
    ///
    /// The bits are `qr<<15 | opcode<<11 | aa<<10 | tc<<9 | rd<<8 | ra<<7 |
    /// z<<6 | ad<<5 | cd<<4 | rcode`.
    #[must_use]
    pub fn flags_word(self) -> u16 {
        u16::from_be_bytes([self.inner[2], self.inner[3]])
    }

    /// Replaces everything but the ID.
    pub fn set_flags_word(&mut self, word: u16) {
        self.inner[2..].copy_from_slice(&word.to_be_bytes())
    }

    /// Returns the AA flag.
    #[must_use]
    pub fn aa(self) -> bool {
        self.get_bit(2, 2)
    }

    /// Sets the AA flag.
    pub fn set_aa(&mut self, set: bool) {
        self.set_bit(2, 2, set)
    }

    /// Returns the TC flag.
    #[must_use]
    pub fn tc(self) -> bool {
        self.get_bit(2, 1)
    }

    /// Sets the TC flag.
    pub fn set_tc(&mut self, set: bool) {
        self.set_bit(2, 1, set)
    }

    /// Returns the RD flag.
    #[must_use]
    pub fn rd(self) -> bool {
        self.get_bit(2, 0)
    }

    /// Sets the RD flag.
    pub fn set_rd(&mut self, set: bool) {
        self.set_bit(2, 0, set)
    }

    /// Returns the RA flag.
    #[must_use]
    pub fn ra(self) -> bool {
        self.get_bit(3, 7)
    }

    /// Sets the RA flag.
    pub fn set_ra(&mut self, set: bool) {
        self.set_bit(3, 7, set)
    }

    /// Returns the reserved Z bit. It should always be clear.
    #[must_use]
    pub fn z(self) -> bool {
        self.get_bit(3, 6)
    }

    /// Sets the Z bit.
    pub fn set_z(&mut self, set: bool) {
        self.set_bit(3, 6, set)
    }

    /// Returns the AD flag.
    #[must_use]
    pub fn ad(self) -> bool {
        self.get_bit(3, 5)
    }

    /// Sets the AD flag.
    pub fn set_ad(&mut self, set: bool) {
        self.set_bit(3, 5, set)
    }

    /// Returns the CD flag.
    #[must_use]
    pub fn cd(self) -> bool {
        self.get_bit(3, 4)
    }

    /// Sets the CD flag.
    pub fn set_cd(&mut self, set: bool) {
        self.set_bit(3, 4, set)
    }

    /// Returns the four bit response code.
    #[must_use]
    pub fn rcode(self) -> Rcode {
        Rcode::from_int(self.inner[3] & 0x0F)
    }

    /// Sets the response code, dropping any extended bits.
    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.inner[3] = self.inner[3] & 0xF0 | (rcode.to_int() & 0x0F);
    }

    /// Bit 7 is the most significant bit of octet `offset`.
    fn get_bit(self, offset: usize, bit: usize) -> bool {
        self.inner[offset] & (1 << bit) != 0
    }

    fn set_bit(&mut self, offset: usize, bit: usize, set: bool) {
        if set {
            self.inner[offset] |= 1 << bit
        } else {
            self.inner[offset] &= !(1 << bit)
        }
    }
}

//------------ Flags ---------------------------------------------------

/// A snapshot of the header's flag bits.
///
/// Displays as the upper-case names of the set flags, e.g. `QR AA RD`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Flags {
    /// Response.
    pub qr: bool,
    /// Authoritative answer.
    pub aa: bool,
    /// Truncated.
    pub tc: bool,
    /// Recursion desired.
    pub rd: bool,
    /// Recursion available.
    pub ra: bool,
    pub z: bool,
    /// Authentic data.
    pub ad: bool,
    /// Checking disabled.
    pub cd: bool,
}

//--- Display

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut sep = "";
        for (set, name) in [
            (self.qr, "QR"),
            (self.aa, "AA"),
            (self.tc, "TC"),
            (self.rd, "RD"),
            (self.ra, "RA"),
            (self.z, "Z"),
            (self.ad, "AD"),
            (self.cd, "CD"),
        ] {
            if set {
                write!(f, "{sep}{name}")?;
                sep = " ";
            }
        }
        Ok(())
    }
}

//------------ HeaderCounts -------------------------------------------------

/// The four section entry counts, octets four to eleven of a message.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HeaderCounts {
    /// The counts in wire representation.
    inner: [u8; 8],
}

impl HeaderCounts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the counts from octets four to eleven of a message.
    #[must_use]
    pub fn from_message_slice(s: &[u8]) -> Option<Self> {
        let inner = s.get(4..12)?;
        let mut res = Self::new();
        res.inner.copy_from_slice(inner);
        Some(res)
    }

    /// Returns the counts in wire format.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    /// Returns a count by section index, question first.
    #[must_use]
    pub fn get(&self, index: usize) -> u16 {
        let pos = index * 2;
        u16::from_be_bytes([self.inner[pos], self.inner[pos + 1]])
    }

    /// Sets a count by section index.
    pub fn set(&mut self, index: usize, value: u16) {
        let pos = index * 2;
        self.inner[pos..pos + 2].copy_from_slice(&value.to_be_bytes())
    }

    /// The number of question entries.
    #[must_use]
    pub fn qdcount(&self) -> u16 {
        self.get(0)
    }

    /// The number of answer entries.
    #[must_use]
    pub fn ancount(&self) -> u16 {
        self.get(1)
    }

    /// The number of authority entries.
    #[must_use]
    pub fn nscount(&self) -> u16 {
        self.get(2)
    }

    /// The number of additional entries.
    #[must_use]
    pub fn arcount(&self) -> u16 {
        self.get(3)
    }
}

//------------ HeaderSection -------------------------------------------------

/// Both parts of the header together.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HeaderSection {
    header: Header,
    counts: HeaderCounts,
}

impl HeaderSection {
    pub const LEN: usize = 12;

    /// Splits off the header of `s`, if it is long enough.
    #[must_use]
    pub fn from_message_slice(s: &[u8]) -> Option<Self> {
        Some(HeaderSection {
            header: Header::from_message_slice(s)?,
            counts: HeaderCounts::from_message_slice(s)?,
        })
    }

    /// Returns the header.
    #[must_use]
    pub fn header(&self) -> Header {
        self.header
    }

    /// Returns the section counts.
    #[must_use]
    pub fn counts(&self) -> HeaderCounts {
        self.counts
    }
}

//============ Testing ======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flag_bits() {
        let mut h = Header::new();
        h.set_id(0xBEEF);
        h.set_qr(true);
        h.set_rd(true);
        h.set_opcode(Opcode::NOTIFY);
        h.set_rcode(Rcode::NXDOMAIN);
        assert_eq!(h.as_slice(), &[0xBE, 0xEF, 0xA1, 0x03]);
        assert_eq!(h.flags_word(), 0xA103);
        assert_eq!(h.opcode(), Opcode::NOTIFY);
        assert_eq!(h.rcode(), Rcode::NXDOMAIN);
        assert!(!h.tc());

        h.set_flags_word(0x0200);
        assert!(h.tc());
        assert!(!h.qr());
        assert_eq!(h.id(), 0xBEEF);
    }

    #[test]
    fn flags_display() {
        let mut h = Header::new();
        h.set_qr(true);
        h.set_rd(true);
        h.set_ra(true);
        let flags = h.flags();
        assert_eq!(
            flags,
            Flags {
                qr: true,
                rd: true,
                ra: true,
                ..Flags::default()
            }
        );
        assert_eq!(flags.to_string(), "QR RD RA");
    }

    #[test]
    fn counts() {
        let mut c = HeaderCounts::new();
        c.set(1, 500);
        assert_eq!(c.ancount(), 500);
        assert_eq!(c.as_slice(), &[0, 0, 0x01, 0xF4, 0, 0, 0, 0]);
    }
}
