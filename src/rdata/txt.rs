//! Record data for TXT and SPF records.
//!
//! Both types consist of a sequence of one or more character strings,
//! i.e., octet sequences of up to 255 octets each preceded by a length
//! octet. TXT is defined in [RFC 1035], SPF in [RFC 4408] (since declared
//! historic by [RFC 7208]).
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035
//! [RFC 4408]: https://tools.ietf.org/html/rfc4408
//! [RFC 7208]: https://tools.ietf.org/html/rfc7208

use crate::base::packet::PacketError;
use crate::base::wire::Composer;
use bytes::Bytes;
use core::fmt;
use octseq::parse::Parser;

//------------ CharStrings ---------------------------------------------------

/// A non-empty sequence of character strings.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct CharStrings(Vec<Bytes>);

impl CharStrings {
    fn from_strings<I, T>(iter: I) -> Result<Self, CharStrError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        let res: Vec<Bytes> = iter.into_iter().map(Into::into).collect();
        if res.is_empty() {
            return Err(CharStrError::Empty);
        }
        if res.iter().any(|s| s.len() > 255) {
            return Err(CharStrError::LongString);
        }
        Ok(CharStrings(res))
    }

    fn from_text(text: &[u8]) -> Self {
        if text.is_empty() {
            return CharStrings(vec![Bytes::new()]);
        }
        CharStrings(
            text.chunks(255).map(Bytes::copy_from_slice).collect(),
        )
    }

    fn parse(
        parser: &mut Parser<'_, [u8]>,
        rdlen: usize,
    ) -> Result<Self, PacketError> {
        if rdlen == 0 {
            return Err(PacketError::Malformed("empty character strings"));
        }
        let end = parser.pos() + rdlen;
        let mut res = Vec::new();
        while parser.pos() < end {
            let len = usize::from(parser.parse_u8()?);
            if parser.pos() + len > end {
                return Err(PacketError::Malformed(
                    "character string exceeds RDATA",
                ));
            }
            res.push(Bytes::copy_from_slice(parser.peek(len)?));
            parser.advance(len)?;
        }
        Ok(CharStrings(res))
    }

    fn compose<Target: Composer + ?Sized>(
        &self,
        target: &mut Target,
    ) -> Result<(), PacketError> {
        for s in &self.0 {
            // Length was checked at creation.
            target.append_slice(&[s.len() as u8])?;
            target.append_slice(s)?;
        }
        Ok(())
    }

    fn concat(&self) -> Vec<u8> {
        self.0.iter().flat_map(|s| s.iter().copied()).collect()
    }
}

impl fmt::Display for CharStrings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for s in &self.0 {
            if first {
                first = false;
            } else {
                f.write_str(" ")?;
            }
            f.write_str("\"")?;
            for &ch in s.iter() {
                match ch {
                    b'"' | b'\\' => write!(f, "\\{}", ch as char)?,
                    0x20..=0x7E => write!(f, "{}", ch as char)?,
                    _ => write!(f, "\\{:03}", ch)?,
                }
            }
            f.write_str("\"")?;
        }
        Ok(())
    }
}

//------------ Txt and Spf ---------------------------------------------------

macro_rules! char_strings_type {
    ( $(#[$attr:meta])* $target:ident ) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Eq, Hash, PartialEq)]
        pub struct $target(CharStrings);

        impl $target {
            /// Creates record data from a sequence of character strings.
            ///
            /// Fails if there are no strings or one of them is longer
            /// than 255 octets.
            pub fn from_strings<I, T>(iter: I) -> Result<Self, CharStrError>
            where
                I: IntoIterator<Item = T>,
                T: Into<Bytes>,
            {
                CharStrings::from_strings(iter).map($target)
            }

            /// Creates record data from text, splitting it as necessary.
            #[must_use]
            pub fn from_text(text: impl AsRef<[u8]>) -> Self {
                $target(CharStrings::from_text(text.as_ref()))
            }

            /// Returns an iterator over the raw character strings.
            pub fn strings(&self) -> impl Iterator<Item = &[u8]> + '_ {
                self.0 .0.iter().map(AsRef::as_ref)
            }

            /// Returns the concatenation of all character strings.
            #[must_use]
            pub fn text(&self) -> Vec<u8> {
                self.0.concat()
            }

            pub(super) fn parse(
                parser: &mut Parser<'_, [u8]>,
                rdlen: usize,
            ) -> Result<Self, PacketError> {
                CharStrings::parse(parser, rdlen).map($target)
            }

            pub(super) fn compose<Target: Composer + ?Sized>(
                &self,
                target: &mut Target,
            ) -> Result<(), PacketError> {
                self.0.compose(target)
            }
        }

        impl fmt::Display for $target {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    }
}

char_strings_type! {
    /// TXT record data.
    ///
    /// TXT records hold descriptive text. The data consists of one or
    /// more character strings.
    Txt
}

char_strings_type! {
    /// SPF record data.
    ///
    /// SPF records carry a sender policy in the same format as TXT.
    Spf
}

impl Spf {
    /// Returns the policy text.
    ///
    /// This is the concatenation of all character strings, decoded lossily
    /// as UTF-8.
    #[must_use]
    pub fn policy(&self) -> String {
        String::from_utf8_lossy(&self.text()).into_owned()
    }
}

//------------ CharStrError --------------------------------------------------

/// Character string data could not be created.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CharStrError {
    /// There were no strings at all.
    Empty,

    /// A string was longer than 255 octets.
    LongString,
}

impl fmt::Display for CharStrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            CharStrError::Empty => "no character strings",
            CharStrError::LongString => "character string too long",
        })
    }
}

impl std::error::Error for CharStrError {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn txt_strings() {
        let txt = Txt::from_strings(["v=spf1", " -all"]).unwrap();
        assert_eq!(txt.text(), b"v=spf1 -all");
        assert_eq!(txt.to_string(), "\"v=spf1\" \" -all\"");
        assert_eq!(
            Txt::from_strings(Vec::<Bytes>::new()),
            Err(CharStrError::Empty)
        );
        assert_eq!(
            Txt::from_strings([vec![0u8; 256]]),
            Err(CharStrError::LongString)
        );
        assert_eq!(Txt::from_text(vec![b'x'; 300]).strings().count(), 2);
    }

    #[test]
    fn txt_overrun() {
        let data = b"\x05abc";
        let mut parser = Parser::from_ref(&data[..]);
        assert!(matches!(
            Txt::parse(&mut parser, 4),
            Err(PacketError::Malformed(_))
        ));
    }

    #[test]
    fn spf_policy() {
        let data = b"\x06v=spf1\x05 -all";
        let mut parser = Parser::from_ref(&data[..]);
        let spf = Spf::parse(&mut parser, data.len()).unwrap();
        assert_eq!(spf.policy(), "v=spf1 -all");
        assert_eq!(spf.strings().count(), 2);
    }
}
