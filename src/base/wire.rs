//! Creating and consuming data in wire format.

use super::name::Name;
use super::packet::PacketError;

//------------ Composer ------------------------------------------------------

/// A target that record data can be composed into.
///
/// Besides appending plain octets, a composer may be able to compress
/// domain names. Record data types call
/// [`append_compressed_name`][Composer::append_compressed_name] for names
/// that may be compressed and [`append_name`][Composer::append_name] for
/// all others.
pub trait Composer {
    /// Appends a slice of octets.
    fn append_slice(&mut self, slice: &[u8]) -> Result<(), PacketError>;

    /// Appends a domain name without compression.
    fn append_name(&mut self, name: &Name) -> Result<(), PacketError> {
        self.append_slice(name.as_slice())
    }

    /// Appends a domain name using name compression if supported.
    ///
    /// The trait provides a default implementation which simply appends the
    /// name uncompressed.
    fn append_compressed_name(
        &mut self,
        name: &Name,
    ) -> Result<(), PacketError> {
        self.append_name(name)
    }

    /// Appends a 16 bit integer in network byte order.
    fn append_u16(&mut self, value: u16) -> Result<(), PacketError> {
        self.append_slice(&value.to_be_bytes())
    }

    /// Appends a 32 bit integer in network byte order.
    fn append_u32(&mut self, value: u32) -> Result<(), PacketError> {
        self.append_slice(&value.to_be_bytes())
    }
}

impl Composer for Vec<u8> {
    fn append_slice(&mut self, slice: &[u8]) -> Result<(), PacketError> {
        self.extend_from_slice(slice);
        Ok(())
    }
}

impl Composer for bytes::BytesMut {
    fn append_slice(&mut self, slice: &[u8]) -> Result<(), PacketError> {
        self.extend_from_slice(slice);
        Ok(())
    }
}
