//! Server addresses in text form.
//!
//! Configuration files and the hints table accept server addresses in a
//! number of forms: a plain IPv4 or IPv6 address, an IPv4 address with a
//! port (`192.0.2.1:5353`), or an IPv6 address in brackets with an
//! optional port (`[2001:db8::1]:5353`). The default port is 53.

use crate::base::name::{Name, NameError};
use core::fmt;
use core::str::FromStr;
use std::net::{IpAddr, SocketAddr};

/// The default DNS port.
pub const DNS_PORT: u16 = 53;

//------------ Parsing and Formatting ----------------------------------------

/// Parses an IP address.
pub fn parse_ip(s: &str) -> Result<IpAddr, InvalidAddress> {
    IpAddr::from_str(s.trim()).map_err(|_| InvalidAddress::new(s))
}

/// Parses a server address with an optional port.
///
/// If no port is given, `default_port` is used.
pub fn parse_server(
    s: &str,
    default_port: u16,
) -> Result<SocketAddr, InvalidAddress> {
    let s = s.trim();
    if let Ok(addr) = IpAddr::from_str(s) {
        return Ok(SocketAddr::new(addr, default_port));
    }
    if let Some(rest) = s.strip_prefix('[') {
        if let Some(ip) = rest.strip_suffix(']') {
            return parse_ip(ip)
                .map(|ip| SocketAddr::new(ip, default_port))
                .map_err(|_| InvalidAddress::new(s));
        }
    }
    SocketAddr::from_str(s).map_err(|_| InvalidAddress::new(s))
}

/// Formats a server address the way configuration files expect it.
///
/// The port is left out if it is the default DNS port.
#[must_use]
pub fn format_server(addr: &SocketAddr) -> String {
    match (addr.port() == DNS_PORT, addr.ip()) {
        (true, ip) => ip.to_string(),
        (false, IpAddr::V4(ip)) => format!("{}:{}", ip, addr.port()),
        (false, IpAddr::V6(ip)) => format!("[{}]:{}", ip, addr.port()),
    }
}

/// Returns the name used for reverse lookups of the address.
///
/// This is a name under `in-addr.arpa` for IPv4 and under `ip6.arpa` for
/// IPv6 addresses.
pub fn reverse_name(addr: IpAddr) -> Result<Name, NameError> {
    let text = match addr {
        IpAddr::V4(addr) => {
            let [a, b, c, d] = addr.octets();
            format!("{}.{}.{}.{}.in-addr.arpa.", d, c, b, a)
        }
        IpAddr::V6(addr) => {
            let mut res = String::with_capacity(73);
            for octet in addr.octets().iter().rev() {
                res.push_str(&format!("{:x}.{:x}.", octet & 0x0F, octet >> 4));
            }
            res.push_str("ip6.arpa.");
            res
        }
    };
    Name::from_str(&text)
}

/// Returns the address encoded in a reverse lookup name.
///
/// Returns `None` if the name is not a complete reverse name.
#[must_use]
pub fn from_reverse_name(name: &Name) -> Option<IpAddr> {
    let labels: Vec<&[u8]> = name.labels().collect();
    match labels.as_slice() {
        [d, c, b, a, inaddr, arpa]
            if is_label(inaddr, b"in-addr") && is_label(arpa, b"arpa") =>
        {
            let mut octets = [0u8; 4];
            for (octet, label) in octets.iter_mut().zip([a, b, c, d]) {
                *octet = core::str::from_utf8(label).ok()?.parse().ok()?;
            }
            Some(IpAddr::from(octets))
        }
        [nibbles @ .., ip6, arpa]
            if nibbles.len() == 32
                && is_label(ip6, b"ip6")
                && is_label(arpa, b"arpa") =>
        {
            let mut octets = [0u8; 16];
            for (i, label) in nibbles.iter().rev().enumerate() {
                let nibble = match label {
                    [ch] => (*ch as char).to_digit(16)? as u8,
                    _ => return None,
                };
                octets[i / 2] |= if i % 2 == 0 { nibble << 4 } else { nibble };
            }
            Some(IpAddr::from(octets))
        }
        _ => None,
    }
}

fn is_label(label: &[u8], text: &[u8]) -> bool {
    label.eq_ignore_ascii_case(text)
}

//------------ InvalidAddress ------------------------------------------------

/// The text of an address could not be parsed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidAddress {
    text: String,
}

impl InvalidAddress {
    fn new(text: &str) -> Self {
        InvalidAddress {
            text: text.into(),
        }
    }

    /// Returns the offending text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for InvalidAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid address '{}'", self.text)
    }
}

impl std::error::Error for InvalidAddress {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("192.0.2.1", "192.0.2.1:53")]
    #[case(" 192.0.2.1:5353", "192.0.2.1:5353")]
    #[case("2001:db8::1", "[2001:db8::1]:53")]
    #[case("[2001:db8::1]", "[2001:db8::1]:53")]
    #[case("[2001:db8::1]:5353", "[2001:db8::1]:5353")]
    fn server_addresses(#[case] text: &str, #[case] expected: &str) {
        let expected: SocketAddr = expected.parse().unwrap();
        assert_eq!(parse_server(text, DNS_PORT).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("192.0.2")]
    #[case("example.com")]
    #[case("[192.0.2.1")]
    #[case("2001:db8::1:53:1:2:3:4:5")]
    fn bad_addresses(#[case] text: &str) {
        assert!(parse_server(text, DNS_PORT).is_err());
    }

    #[test]
    fn formatting() {
        let addr: SocketAddr = "[2001:db8::1]:5353".parse().unwrap();
        assert_eq!(format_server(&addr), "[2001:db8::1]:5353");
        let addr: SocketAddr = "192.0.2.1:53".parse().unwrap();
        assert_eq!(format_server(&addr), "192.0.2.1");
    }

    #[test]
    fn reverse() {
        let v4: IpAddr = "192.0.2.10".parse().unwrap();
        let name = reverse_name(v4).unwrap();
        assert_eq!(name.to_string(), "10.2.0.192.in-addr.arpa.");
        assert_eq!(from_reverse_name(&name), Some(v4));

        let v6: IpAddr = "2001:db8::567:89ab".parse().unwrap();
        let name = reverse_name(v6).unwrap();
        assert!(name
            .to_string()
            .starts_with("b.a.9.8.7.6.5.0.0.0.0.0.0.0.0.0."));
        assert_eq!(from_reverse_name(&name), Some(v6));

        let other: Name = "example.com".parse().unwrap();
        assert_eq!(from_reverse_name(&other), None);
    }
}
