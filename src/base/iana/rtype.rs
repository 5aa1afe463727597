//! Resource Record (RR) TYPEs

//------------ Rtype ---------------------------------------------------------

int_enum! {
    /// Resource Record Types.
    ///
    /// Each resource records has a 16 bit type value indicating what kind of
    /// information is represented by the record. Normal query includes the
    /// type of record information is requested for. A few aditional types,
    /// called query types, are defined as well and can only be used in
    /// questions. This type represents both these types.
    ///
    /// The currently assigned values are maintained in an [IANA registry].
    /// Only the values this crate knows something about have constants.
    /// Everything else is displayed in the generic `TYPEnnn` form of
    /// [RFC 3597].
    ///
    /// [IANA registry]: http://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-4
    /// [RFC 3597]: https://tools.ietf.org/html/rfc3597
    =>
    Rtype, u16;

    /// A host address.
    (A => 1, "A")

    /// An authoritative name server.
    (NS => 2, "NS")

    /// The canonical name for an alias.
    (CNAME => 5, "CNAME")

    /// Marks the start of a zone of authority.
    (SOA => 6, "SOA")

    /// A domain name pointer.
    (PTR => 12, "PTR")

    /// Host information.
    (HINFO => 13, "HINFO")

    /// Mail exchange.
    (MX => 15, "MX")

    /// Text strings.
    (TXT => 16, "TXT")

    /// IPv6 address.
    (AAAA =>  28, "AAAA")

    /// Server selection.
    (SRV => 33, "SRV")

    /// Delegation name.
    (DNAME => 39, "DNAME")

    /// OPT pseudo-record.
    ///
    /// See [RFC 6891] for details.
    ///
    /// [RFC 6891]: https://tools.ietf.org/html/rfc6891
    (OPT => 41, "OPT")

    /// Delegation signer.
    (DS => 43, "DS")

    /// SSH key fingerprint.
    ///
    /// See [RFC 4255] for details.
    ///
    /// [RFC 4255]: https://tools.ietf.org/html/rfc4255
    (SSHFP => 44, "SSHFP")

    /// RRSIG.
    (RRSIG => 46, "RRSIG")

    /// DNSKEY.
    (DNSKEY => 48, "DNSKEY")

    /// Sender Policy Framework.
    ///
    /// Historic, see [RFC 7208].
    ///
    /// [RFC 7208]: https://tools.ietf.org/html/rfc7208
    (SPF => 99, "SPF")

    /// Transfer of an entire zone.
    (AXFR => 252, "AXFR")

    /// A request for all records the server/cache has available.
    (ANY => 255, "ANY")

    /// Certification Authority Restriction.
    (CAA => 257, "CAA")
}

int_enum_str_with_prefix!(Rtype, "TYPE", u16, "unknown record type");

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn unknown_types_use_generic_form() {
        assert_eq!(Rtype::from_int(65280).to_string(), "TYPE65280");
        assert_eq!(Rtype::from_str("type28").unwrap(), Rtype::AAAA);
        assert_eq!(Rtype::from_str("sshfp").unwrap(), Rtype::SSHFP);
        assert_eq!(format!("{:?}", Rtype::MX), "Rtype::MX");
        assert_eq!(format!("{:?}", Rtype::from_int(999)), "Rtype(999)");
    }
}
