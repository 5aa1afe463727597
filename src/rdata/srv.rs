//! Record data from [RFC 2782]: SRV records.
//!
//! [RFC 2782]: https://tools.ietf.org/html/rfc2782

use crate::base::name::Name;
use crate::base::packet::PacketError;
use crate::base::wire::Composer;
use core::fmt;
use octseq::parse::Parser;

//------------ Srv ---------------------------------------------------------

/// SRV record data.
///
/// The SRV record specifies the location of the server(s) for a specific
/// protocol and domain. The target name must not be compressed.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Srv {
    priority: u16,
    weight: u16,
    port: u16,
    target: Name,
}

impl Srv {
    #[must_use]
    pub fn new(priority: u16, weight: u16, port: u16, target: Name) -> Self {
        Srv {
            priority,
            weight,
            port,
            target,
        }
    }

    /// The priority of the target host; lower values are preferred.
    #[must_use]
    pub fn priority(&self) -> u16 {
        self.priority
    }

    /// The relative weight among entries with the same priority.
    #[must_use]
    pub fn weight(&self) -> u16 {
        self.weight
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn target(&self) -> &Name {
        &self.target
    }

    pub(super) fn parse(
        parser: &mut Parser<'_, [u8]>,
    ) -> Result<Self, PacketError> {
        Ok(Self::new(
            parser.parse_u16_be()?,
            parser.parse_u16_be()?,
            parser.parse_u16_be()?,
            Name::parse(parser)?,
        ))
    }

    pub(super) fn compose<Target: Composer + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), PacketError> {
        target.append_u16(self.priority)?;
        target.append_u16(self.weight)?;
        target.append_u16(self.port)?;
        target.append_name(&self.target)
    }
}

//--- Display

impl fmt::Display for Srv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.priority, self.weight, self.port, self.target
        )
    }
}
