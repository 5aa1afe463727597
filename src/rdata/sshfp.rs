//! Record data from [RFC 4255]: SSHFP records.
//!
//! [RFC 4255]: https://tools.ietf.org/html/rfc4255

use crate::base::iana::{SshfpAlgorithm, SshfpType};
use crate::base::packet::PacketError;
use crate::base::wire::Composer;
use bytes::Bytes;
use core::fmt;
use octseq::parse::Parser;

//------------ Sshfp ---------------------------------------------------------

/// SSHFP record data.
///
/// The record holds the fingerprint of an SSH public key of a host: the
/// key algorithm, the digest type used for the fingerprint, and the
/// digest itself.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Sshfp {
    algorithm: SshfpAlgorithm,
    fingerprint_type: SshfpType,
    digest: Bytes,
}

impl Sshfp {
    #[must_use]
    pub fn new(
        algorithm: SshfpAlgorithm,
        fingerprint_type: SshfpType,
        digest: impl Into<Bytes>,
    ) -> Self {
        Sshfp {
            algorithm,
            fingerprint_type,
            digest: digest.into(),
        }
    }

    #[must_use]
    pub fn algorithm(&self) -> SshfpAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn fingerprint_type(&self) -> SshfpType {
        self.fingerprint_type
    }

    /// Returns the raw digest octets.
    #[must_use]
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Returns the digest as lower case hex digits.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        let mut res = String::with_capacity(self.digest.len() * 2);
        for ch in self.digest.iter() {
            res.push_str(&format!("{:02x}", ch));
        }
        res
    }

    /// Returns the digest rendered in the given format.
    #[must_use]
    pub fn render_digest(&self, format: DigestFormat) -> Vec<u8> {
        match format {
            DigestFormat::Hex => self.digest_hex().into_bytes(),
            DigestFormat::Raw => self.digest.to_vec(),
        }
    }

    pub(super) fn parse(
        parser: &mut Parser<'_, [u8]>,
        rdlen: usize,
    ) -> Result<Self, PacketError> {
        if rdlen < 2 {
            return Err(PacketError::Malformed("short SSHFP record"));
        }
        let algorithm = SshfpAlgorithm::from_int(parser.parse_u8()?);
        let fingerprint_type = SshfpType::from_int(parser.parse_u8()?);
        let digest = Bytes::copy_from_slice(parser.peek(rdlen - 2)?);
        parser.advance(rdlen - 2)?;
        Ok(Self::new(algorithm, fingerprint_type, digest))
    }

    pub(super) fn compose<Target: Composer + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), PacketError> {
        target.append_slice(&[
            self.algorithm.to_int(),
            self.fingerprint_type.to_int(),
        ])?;
        target.append_slice(&self.digest)
    }
}

//--- Display

impl fmt::Display for Sshfp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.algorithm,
            self.fingerprint_type,
            self.digest_hex()
        )
    }
}

//------------ DigestFormat --------------------------------------------------

/// How an SSHFP digest should be rendered.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DigestFormat {
    /// Lower case hex digits.
    #[default]
    Hex,

    /// The raw octets.
    Raw,
}

//============ Testing =======================================================
