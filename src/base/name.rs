//! Domain names.
//!
//! This module provides [`Name`], an owned, absolute domain name kept in
//! uncompressed wire format. Names are created either from their
//! presentation format via `FromStr` or by parsing them from a DNS message
//! via [`Name::parse`] which resolves compression pointers.
//!
//! In the presentation format, labels are separated by dots. A literal dot
//! or backslash inside a label is escaped with a backslash; any octet can be
//! given as `\DDD` with a three digit decimal value. A trailing dot is
//! optional since all names are absolute.

use core::{cmp, fmt, hash, str};
use octseq::parse::{Parser, ShortInput};
use smallvec::SmallVec;

//------------ Constants -----------------------------------------------------

/// The maximum length of a domain name in wire format.
pub const MAX_NAME_LEN: usize = 255;

/// The maximum length of a single label.
pub const MAX_LABEL_LEN: usize = 63;

/// The maximum number of labels in a name, not counting the root label.
pub const MAX_LABELS: usize = 127;

/// The maximum number of compression pointers followed for a single name.
///
/// Each pointer must lead to at least one label before the next one, so a
/// legitimate name can never need more jumps than it has labels.
pub const MAX_POINTER_JUMPS: usize = MAX_LABELS;

//------------ Name ----------------------------------------------------------

/// An owned absolute domain name.
///
/// The name is stored in uncompressed wire format including the final root
/// label. Comparison and hashing ignore ASCII case.
#[derive(Clone)]
pub struct Name {
    octets: SmallVec<[u8; 64]>,
}

/// # Creation
///
impl Name {
    /// Returns the root name.
    #[must_use]
    pub fn root() -> Self {
        let mut octets = SmallVec::new();
        octets.push(0);
        Name { octets }
    }

    /// Creates a name from uncompressed wire format octets.
    ///
    /// The slice must contain exactly one name ending in the root label.
    pub fn from_wire_slice(slice: &[u8]) -> Result<Self, NameError> {
        let mut parser = Parser::from_ref(slice);
        let res = Self::parse(&mut parser)?;
        if parser.remaining() != 0 {
            return Err(NameError::TrailingData);
        }
        Ok(res)
    }

    /// Parses a possibly compressed name from a DNS message.
    ///
    /// The parser must be positioned at the start of the name. It must
    /// cover the entire message since compression pointers are offsets
    /// from the start of the message. On success, the parser is left
    /// right after the name as it appears at the current position, i.e.,
    /// after the root label or after the first compression pointer.
    ///
    /// Following more than [`MAX_POINTER_JUMPS`] pointers fails with
    /// [`NameError::CompressionLoop`].
    pub fn parse(parser: &mut Parser<'_, [u8]>) -> Result<Self, NameError> {
        let mut octets = SmallVec::<[u8; 64]>::new();

        // Phase One: no compression pointers have been found yet and we
        // walk the real parser.
        let ptr = loop {
            match LabelType::parse(parser)? {
                LabelType::Normal(0) => {
                    octets.push(0);
                    return Ok(Name { octets });
                }
                LabelType::Normal(len) => {
                    Self::push_label(&mut octets, parser, len)?;
                }
                LabelType::Compressed(ptr) => break ptr,
            }
        };

        // Phase Two: we follow pointers on a copy of the parser. The
        // actual parser has already reached the end of the name.
        let mut parser = *parser;
        let mut jumps = 1;
        parser.seek(ptr)?;
        loop {
            match LabelType::parse(&mut parser)? {
                LabelType::Normal(0) => {
                    octets.push(0);
                    return Ok(Name { octets });
                }
                LabelType::Normal(len) => {
                    Self::push_label(&mut octets, &mut parser, len)?;
                }
                LabelType::Compressed(ptr) => {
                    jumps += 1;
                    if jumps > MAX_POINTER_JUMPS {
                        return Err(NameError::CompressionLoop);
                    }
                    parser.seek(ptr)?;
                }
            }
        }
    }

    /// Skips over a possibly compressed name.
    pub fn skip(parser: &mut Parser<'_, [u8]>) -> Result<(), NameError> {
        let mut len = 0;
        loop {
            match LabelType::parse(parser)? {
                LabelType::Normal(0) => return Ok(()),
                LabelType::Normal(label_len) => {
                    parser.advance(label_len)?;
                    len += label_len + 1;
                    if len >= MAX_NAME_LEN {
                        return Err(NameError::LongName);
                    }
                }
                LabelType::Compressed(_) => return Ok(()),
            }
        }
    }

    fn push_label(
        octets: &mut SmallVec<[u8; 64]>,
        parser: &mut Parser<'_, [u8]>,
        len: usize,
    ) -> Result<(), NameError> {
        // The root label still needs to fit.
        if octets.len() + len + 2 > MAX_NAME_LEN {
            return Err(NameError::LongName);
        }
        octets.push(len as u8);
        octets.extend_from_slice(parser.peek(len)?);
        parser.advance(len)?;
        Ok(())
    }

    /// Appends `origin` to the relative name given in presentation format.
    ///
    /// A trailing dot in `relative` is ignored.
    pub fn relative_to(
        relative: &str,
        origin: &Name,
    ) -> Result<Self, NameError> {
        let mut res = Name::from_str_inner(relative)?;
        res.octets.pop();
        if res.octets.len() + origin.len() > MAX_NAME_LEN {
            return Err(NameError::LongName);
        }
        res.octets.extend_from_slice(origin.as_slice());
        Ok(res)
    }

    fn from_str_inner(s: &str) -> Result<Self, NameError> {
        if s.is_empty() || s == "." {
            return Ok(Self::root());
        }
        let mut octets = SmallVec::<[u8; 64]>::new();
        let mut chars = s.as_bytes().iter().copied().peekable();
        let mut label_start = 0;
        octets.push(0);
        while let Some(ch) = chars.next() {
            match ch {
                b'.' => {
                    let len = octets.len() - label_start - 1;
                    if len == 0 {
                        return Err(NameError::EmptyLabel);
                    }
                    octets[label_start] = len as u8;
                    if chars.peek().is_none() {
                        // Trailing dot. The root label is added below.
                        label_start = octets.len();
                        break;
                    }
                    label_start = octets.len();
                    octets.push(0);
                }
                b'\\' => {
                    let ch = match chars.next() {
                        Some(ch) if ch.is_ascii_digit() => {
                            let d2 = chars.next().filter(u8::is_ascii_digit);
                            let d3 = chars.next().filter(u8::is_ascii_digit);
                            let (d2, d3) = match (d2, d3) {
                                (Some(d2), Some(d3)) => (d2, d3),
                                _ => return Err(NameError::BadEscape),
                            };
                            let value = u16::from(ch - b'0') * 100
                                + u16::from(d2 - b'0') * 10
                                + u16::from(d3 - b'0');
                            u8::try_from(value)
                                .map_err(|_| NameError::BadEscape)?
                        }
                        Some(ch) => ch,
                        None => return Err(NameError::BadEscape),
                    };
                    octets.push(ch);
                }
                ch => octets.push(ch),
            }
            if octets.len() - label_start - 1 > MAX_LABEL_LEN {
                return Err(NameError::LongLabel);
            }
        }
        if label_start < octets.len() {
            let len = octets.len() - label_start - 1;
            octets[label_start] = len as u8;
        }
        octets.push(0);
        if octets.len() > MAX_NAME_LEN {
            return Err(NameError::LongName);
        }
        Ok(Name { octets })
    }
}

/// # Properties
///
impl Name {
    /// Returns the wire format of the name.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.octets
    }

    /// Returns the length of the name in wire format.
    #[must_use]
    pub fn len(&self) -> usize {
        self.octets.len()
    }

    /// Returns whether this is the root name.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.octets.len() == 1
    }

    /// Returns whether this is the root name.
    ///
    /// This is the same as [`is_root`][Self::is_root] and only here for
    /// symmetry with [`len`][Self::len].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// Returns an iterator over the labels without the root label.
    pub fn labels(&self) -> LabelIter<'_> {
        LabelIter {
            slice: &self.octets,
        }
    }

    /// Returns the number of labels not counting the root label.
    #[must_use]
    pub fn label_count(&self) -> usize {
        self.labels().count()
    }

    /// Returns an iterator over all suffixes of the name.
    ///
    /// The iterator starts with the name itself and ends with the root.
    /// The items are the wire format slices of each suffix.
    pub fn suffixes(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let mut pos = Some(0);
        core::iter::from_fn(move || {
            let start = pos?;
            let len = usize::from(self.octets[start]);
            pos = if len == 0 { None } else { Some(start + len + 1) };
            Some(&self.octets[start..])
        })
    }

    /// Returns whether `self` is equal to or below `base`.
    #[must_use]
    pub fn ends_with(&self, base: &Name) -> bool {
        self.suffixes()
            .any(|suffix| eq_ignore_case(suffix, base.as_slice()))
    }

    /// Returns the name without its leftmost label.
    ///
    /// Returns `None` for the root name.
    #[must_use]
    pub fn parent(&self) -> Option<Name> {
        self.suffixes().nth(1).map(|slice| Name {
            octets: SmallVec::from_slice(slice),
        })
    }

    /// Formats the name without the trailing dot.
    ///
    /// The root name is formatted as a single dot.
    #[must_use]
    pub fn to_relative_string(&self) -> String {
        let mut res = self.to_string();
        if res.len() > 1 {
            res.pop();
        }
        res
    }
}

//--- FromStr

impl str::FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_inner(s)
    }
}

//--- PartialEq, Eq, Hash, Ord

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        eq_ignore_case(&self.octets, &other.octets)
    }
}

impl Eq for Name {}

impl hash::Hash for Name {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        for ch in self.octets.iter() {
            ch.to_ascii_lowercase().hash(state)
        }
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.octets
            .iter()
            .map(u8::to_ascii_lowercase)
            .cmp(other.octets.iter().map(u8::to_ascii_lowercase))
    }
}

//--- Display and Debug

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in self.labels() {
            for &ch in label {
                match ch {
                    b'.' | b'\\' => write!(f, "\\{}", ch as char)?,
                    0x21..=0x7E => write!(f, "{}", ch as char)?,
                    _ => write!(f, "\\{:03}", ch)?,
                }
            }
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

//------------ LabelIter -----------------------------------------------------

/// An iterator over the labels of a name, root label excluded.
#[derive(Clone, Debug)]
pub struct LabelIter<'a> {
    slice: &'a [u8],
}

impl<'a> Iterator for LabelIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, rest) = self.slice.split_first()?;
        let len = usize::from(len);
        if len == 0 || rest.len() < len {
            return None;
        }
        let (label, rest) = rest.split_at(len);
        self.slice = rest;
        Some(label)
    }
}

//------------ LabelType -----------------------------------------------------

/// The type of a label as given by its first octet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum LabelType {
    /// A normal label with the given length.
    Normal(usize),

    /// A compression pointer to the given offset.
    Compressed(usize),
}

impl LabelType {
    pub(crate) fn parse(
        parser: &mut Parser<'_, [u8]>,
    ) -> Result<Self, NameError> {
        let ltype = parser.parse_u8()?;
        match ltype {
            0..=0x3F => Ok(LabelType::Normal(ltype.into())),
            0xC0..=0xFF => {
                let res = usize::from(parser.parse_u8()?);
                let res = res | ((usize::from(ltype) & 0x3F) << 8);
                Ok(LabelType::Compressed(res))
            }
            _ => Err(NameError::BadLabel),
        }
    }
}

//------------ Helpers -------------------------------------------------------

/// Compares two wire format names or labels ignoring ASCII case.
pub(crate) fn eq_ignore_case(left: &[u8], right: &[u8]) -> bool {
    left.eq_ignore_ascii_case(right)
}

/// Compares two names in presentation format.
///
/// Case and a trailing dot are ignored. Names that fail to parse are
/// compared as plain text.
#[must_use]
pub fn text_eq(left: &str, right: &str) -> bool {
    match (left.parse::<Name>(), right.parse::<Name>()) {
        (Ok(left), Ok(right)) => left == right,
        _ => left
            .trim_end_matches('.')
            .eq_ignore_ascii_case(right.trim_end_matches('.')),
    }
}

/// Returns the number of dots separating labels in presentation format.
///
/// Escaped dots and a trailing dot are not counted.
#[must_use]
pub fn count_dots(name: &str) -> usize {
    let mut count = 0;
    let mut escaped = false;
    let bytes = name.as_bytes();
    for (i, &ch) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
        } else if ch == b'\\' {
            escaped = true;
        } else if ch == b'.' && i + 1 < bytes.len() {
            count += 1;
        }
    }
    count
}

//------------ NameError -----------------------------------------------------

/// A domain name could not be created.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NameError {
    /// A label was longer than 63 octets.
    LongLabel,

    /// The name was longer than 255 octets.
    LongName,

    /// Presentation format contained an empty label.
    EmptyLabel,

    /// An escape sequence was malformed.
    BadEscape,

    /// A label type other than normal or compressed was encountered.
    BadLabel,

    /// Too many compression pointers were followed.
    CompressionLoop,

    /// There was data after the end of the name.
    TrailingData,

    /// The name extended beyond the end of the message.
    ShortInput,
}

//--- From

impl From<ShortInput> for NameError {
    fn from(_: ShortInput) -> Self {
        NameError::ShortInput
    }
}

//--- Display and Error

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            NameError::LongLabel => "label exceeds 63 octets",
            NameError::LongName => "domain name exceeds 255 octets",
            NameError::EmptyLabel => "empty label",
            NameError::BadEscape => "illegal escape sequence",
            NameError::BadLabel => "invalid label type",
            NameError::CompressionLoop => "compression pointer loop",
            NameError::TrailingData => "trailing data",
            NameError::ShortInput => "unexpected end of input",
        })
    }
}

impl std::error::Error for NameError {}

//============ Testing =======================================================
