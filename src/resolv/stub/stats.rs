//! Resolver statistics.

use super::Protocol;
use core::fmt;

//------------ Counter -------------------------------------------------------

/// A count of packets and their octets.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Counter {
    pub count: u64,
    pub bytes: u64,
}

impl Counter {
    fn add(&mut self, len: usize) {
        self.count += 1;
        self.bytes += len as u64;
    }
}

//------------ Traffic -------------------------------------------------------

/// The traffic of one protocol.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Traffic {
    pub sent: Counter,
    pub received: Counter,
}

//------------ Stats ---------------------------------------------------------

/// The statistics of a resolver.
///
/// Stream traffic is counted per complete message including the length
/// prefix.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    /// The number of queries sent, counting every retry.
    pub queries: u64,

    pub udp: Traffic,
    pub tcp: Traffic,
}

impl Stats {
    pub(super) fn sent(&mut self, protocol: Protocol, len: usize) {
        self.traffic_mut(protocol).sent.add(len)
    }

    pub(super) fn received(&mut self, protocol: Protocol, len: usize) {
        self.traffic_mut(protocol).received.add(len)
    }

    /// Returns the traffic for a protocol.
    #[must_use]
    pub fn traffic(&self, protocol: Protocol) -> &Traffic {
        match protocol {
            Protocol::Udp => &self.udp,
            Protocol::Tcp => &self.tcp,
        }
    }

    fn traffic_mut(&mut self, protocol: Protocol) -> &mut Traffic {
        match protocol {
            Protocol::Udp => &mut self.udp,
            Protocol::Tcp => &mut self.tcp,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "queries: {}", self.queries)?;
        for (name, traffic) in [("udp", &self.udp), ("tcp", &self.tcp)] {
            writeln!(
                f,
                "{}: sent {} ({} bytes), received {} ({} bytes)",
                name,
                traffic.sent.count,
                traffic.sent.bytes,
                traffic.received.count,
                traffic.received.bytes
            )?;
        }
        Ok(())
    }
}
