//! Resource record data.
//!
//! Each submodule of this module contains the record data types for one
//! record type or a group of closely related types. All of them are
//! re-exported here. The closed enum [`RecordData`] has one variant per
//! type and a fallback variant for all record types this crate does not
//! know about.
//!
//! All types parse themselves from a parser positioned at the start of
//! the RDATA within a complete message, so that compressed names can be
//! resolved, and compose themselves into a [`Composer`].

pub use self::aaaa::Aaaa;
pub use self::opt::{Opt, OptOption};
pub use self::rfc1035::{Cname, Mx, Ns, Ptr, Soa, A};
pub use self::srv::Srv;
pub use self::sshfp::{DigestFormat, Sshfp};
pub use self::txt::{CharStrError, Spf, Txt};
pub use self::unknown::UnknownRecordData;

mod aaaa;
mod opt;
mod rfc1035;
mod srv;
mod sshfp;
mod txt;
mod unknown;

use crate::base::iana::{Class, Rtype};
use crate::base::packet::PacketError;
use crate::base::wire::Composer;
use core::fmt;
use octseq::parse::Parser;

//------------ RecordData ----------------------------------------------------

/// The data of a resource record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecordData {
    A(A),
    Ns(Ns),
    Cname(Cname),
    Soa(Soa),
    Ptr(Ptr),
    Mx(Mx),
    Txt(Txt),
    Aaaa(Aaaa),
    Srv(Srv),
    Opt(Opt),
    Sshfp(Sshfp),
    Spf(Spf),
    Unknown(UnknownRecordData),
}

impl RecordData {
    /// Returns the record type of the data.
    #[must_use]
    pub fn rtype(&self) -> Rtype {
        match *self {
            RecordData::A(_) => Rtype::A,
            RecordData::Ns(_) => Rtype::NS,
            RecordData::Cname(_) => Rtype::CNAME,
            RecordData::Soa(_) => Rtype::SOA,
            RecordData::Ptr(_) => Rtype::PTR,
            RecordData::Mx(_) => Rtype::MX,
            RecordData::Txt(_) => Rtype::TXT,
            RecordData::Aaaa(_) => Rtype::AAAA,
            RecordData::Srv(_) => Rtype::SRV,
            RecordData::Opt(_) => Rtype::OPT,
            RecordData::Sshfp(_) => Rtype::SSHFP,
            RecordData::Spf(_) => Rtype::SPF,
            RecordData::Unknown(ref data) => data.rtype(),
        }
    }

    /// Parses record data of the given type.
    ///
    /// The parser must cover the entire message and be positioned at the
    /// start of the RDATA which is `rdlen` octets long. The `class` and
    /// `ttl` of the record are needed for the OPT record which keeps some
    /// of its data there. On success, the parser is positioned right after
    /// the RDATA. Data that is shorter or longer than `rdlen` is
    /// malformed.
    pub fn parse(
        rtype: Rtype,
        class: Class,
        ttl: u32,
        parser: &mut Parser<'_, [u8]>,
        rdlen: usize,
    ) -> Result<Self, PacketError> {
        let end = parser.pos() + rdlen;
        if rdlen > parser.remaining() {
            return Err(PacketError::Malformed("RDATA exceeds message"));
        }
        let res = match rtype {
            Rtype::A => A::parse(parser, rdlen).map(RecordData::A),
            Rtype::NS => Ns::parse(parser).map(RecordData::Ns),
            Rtype::CNAME => Cname::parse(parser).map(RecordData::Cname),
            Rtype::SOA => Soa::parse(parser).map(RecordData::Soa),
            Rtype::PTR => Ptr::parse(parser).map(RecordData::Ptr),
            Rtype::MX => Mx::parse(parser).map(RecordData::Mx),
            Rtype::TXT => Txt::parse(parser, rdlen).map(RecordData::Txt),
            Rtype::AAAA => Aaaa::parse(parser, rdlen).map(RecordData::Aaaa),
            Rtype::SRV => Srv::parse(parser).map(RecordData::Srv),
            Rtype::OPT => {
                Opt::parse(class, ttl, parser, rdlen).map(RecordData::Opt)
            }
            Rtype::SSHFP => {
                Sshfp::parse(parser, rdlen).map(RecordData::Sshfp)
            }
            Rtype::SPF => Spf::parse(parser, rdlen).map(RecordData::Spf),
            _ => UnknownRecordData::parse(rtype, parser, rdlen)
                .map(RecordData::Unknown),
        }?;
        if parser.pos() != end {
            return Err(PacketError::Malformed("RDATA length mismatch"));
        }
        Ok(res)
    }

    /// Appends the wire format of the data to `target`.
    ///
    /// The RDLENGTH field is not included.
    pub fn compose<Target: Composer + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), PacketError> {
        match *self {
            RecordData::A(ref data) => data.compose(target),
            RecordData::Ns(ref data) => data.compose(target),
            RecordData::Cname(ref data) => data.compose(target),
            RecordData::Soa(ref data) => data.compose(target),
            RecordData::Ptr(ref data) => data.compose(target),
            RecordData::Mx(ref data) => data.compose(target),
            RecordData::Txt(ref data) => data.compose(target),
            RecordData::Aaaa(ref data) => data.compose(target),
            RecordData::Srv(ref data) => data.compose(target),
            RecordData::Opt(ref data) => data.compose(target),
            RecordData::Sshfp(ref data) => data.compose(target),
            RecordData::Spf(ref data) => data.compose(target),
            RecordData::Unknown(ref data) => data.compose(target),
        }
    }

    /// Returns the uncompressed wire format of the data.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut res = Vec::new();
        // Composing into a vec never fails.
        let _ = self.compose(&mut res);
        res
    }
}

//--- From

macro_rules! record_data_from {
    ( $( $variant:ident ),* ) => {
        $(
            impl From<$variant> for RecordData {
                fn from(data: $variant) -> Self {
                    RecordData::$variant(data)
                }
            }
        )*
    }
}

record_data_from!(A, Ns, Cname, Soa, Ptr, Mx, Txt, Aaaa, Srv, Opt, Sshfp, Spf);

impl From<UnknownRecordData> for RecordData {
    fn from(data: UnknownRecordData) -> Self {
        RecordData::Unknown(data)
    }
}

//--- Display

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RecordData::A(ref data) => data.fmt(f),
            RecordData::Ns(ref data) => data.fmt(f),
            RecordData::Cname(ref data) => data.fmt(f),
            RecordData::Soa(ref data) => data.fmt(f),
            RecordData::Ptr(ref data) => data.fmt(f),
            RecordData::Mx(ref data) => data.fmt(f),
            RecordData::Txt(ref data) => data.fmt(f),
            RecordData::Aaaa(ref data) => data.fmt(f),
            RecordData::Srv(ref data) => data.fmt(f),
            RecordData::Opt(ref data) => data.fmt(f),
            RecordData::Sshfp(ref data) => data.fmt(f),
            RecordData::Spf(ref data) => data.fmt(f),
            RecordData::Unknown(ref data) => data.fmt(f),
        }
    }
}
