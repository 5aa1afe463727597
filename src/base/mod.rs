//! Basics.
//!
//! This module provides types and traits for working with DNS data. The
//! types allow creating such data from scratch and processing it.
//! Crucially, the module provides means to extract the data from
//! wire-format DNS messages and assemble such messages.
//!
//! ## Parsing and Composing Messages
//!
//! We use the term *parsing* for extracting data from a wire-format
//! representation and *composing* for producing such a representation.
//! Both parsing and composing happen on buffers holding a complete DNS
//! message. This is necessary since domain names in a message may
//! reference other parts of the message through name compression.
//!
//! The [`Packet`] type is there to make both easy. It takes the binary
//! data of a DNS message and allows iterating over its four sections to
//! look at the questions and resource records. It also provides
//! functionality to build the sections of a message step-by-step.
//!
//! # Types for DNS Data
//!
//! * [header] for the header of DNS messages,
//! * [iana] for the various IANA registered parameters,
//! * [name] for domain names,
//! * [packet] for complete messages,
//! * [question] for questions, and
//! * [record] for resource records.

pub use self::header::{Flags, Header, HeaderCounts, HeaderSection};
pub use self::iana::{Class, Opcode, Rcode, Rtype};
pub use self::name::{Name, NameError};
pub use self::packet::{Packet, PacketError, RecordFilter, RecordIter};
pub use self::question::Question;
pub use self::record::{HasTtl, Named, Record, Section};
pub use self::wire::Composer;

pub mod header;
pub mod iana;
pub mod name;
pub mod packet;
pub mod question;
pub mod record;
pub mod wire;
