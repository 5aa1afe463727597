//! Record data for types this crate doesn't know about.

use crate::base::iana::Rtype;
use crate::base::packet::PacketError;
use crate::base::wire::Composer;
use bytes::Bytes;
use core::fmt;
use octseq::parse::Parser;

//------------ UnknownRecordData ---------------------------------------------

/// Record data of an unknown record type.
///
/// The data is kept as its raw octets. Note that these may contain
/// compressed domain names that cannot be resolved anymore without the
/// original message.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct UnknownRecordData {
    rtype: Rtype,
    data: Bytes,
}

impl UnknownRecordData {
    #[must_use]
    pub fn new(rtype: Rtype, data: impl Into<Bytes>) -> Self {
        UnknownRecordData {
            rtype,
            data: data.into(),
        }
    }

    #[must_use]
    pub fn rtype(&self) -> Rtype {
        self.rtype
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(super) fn parse(
        rtype: Rtype,
        parser: &mut Parser<'_, [u8]>,
        rdlen: usize,
    ) -> Result<Self, PacketError> {
        let data = Bytes::copy_from_slice(parser.peek(rdlen)?);
        parser.advance(rdlen)?;
        Ok(Self::new(rtype, data))
    }

    pub(super) fn compose<Target: Composer + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), PacketError> {
        target.append_slice(&self.data)
    }
}

//--- Display

/// Formats the data in the generic format of [RFC 3597].
///
/// [RFC 3597]: https://tools.ietf.org/html/rfc3597
impl fmt::Display for UnknownRecordData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\\# {}", self.data.len())?;
        if !self.data.is_empty() {
            f.write_str(" ")?;
            for ch in self.data.iter() {
                write!(f, "{:02x}", ch)?;
            }
        }
        Ok(())
    }
}
