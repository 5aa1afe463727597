//! DNS response codes.
//!
//! The original DNS specification in [RFC 1035] specified four bits of the
//! message header as response code. [RFC 6891] added eight more bits to be
//! transmitted as part of the OPT pseudo-resource record. The [`Rcode`]
//! type only covers the four header bits; the upper bits are available
//! from [`Opt::ext_rcode`][crate::rdata::Opt::ext_rcode].
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035
//! [RFC 6891]: https://tools.ietf.org/html/rfc6891

//------------ Rcode --------------------------------------------------------

int_enum! {
    /// DNS Response Codes.
    ///
    /// The response code of a response indicates what happend on the server
    /// when trying to answer the query.
    =>
    Rcode, u8;

    /// No error condition.
    (NOERROR => 0, "NOERROR")

    /// Format error.
    ///
    /// The name server was unable to interpret the query.
    (FORMERR => 1, "FORMERR")

    /// Server failure.
    (SERVFAIL => 2, "SERVFAIL")

    /// Name error.
    ///
    /// The domain name given in the query does not exist at the name server.
    (NXDOMAIN => 3, "NXDOMAIN")

    /// Not implemented.
    (NOTIMP => 4, "NOTIMP")

    /// Query refused.
    (REFUSED => 5, "REFUSED")

    /// Name exists when it should not.
    (YXDOMAIN => 6, "YXDOMAIN")

    /// RR set exists when it should not.
    (YXRRSET => 7, "YXRRSET")

    /// RR set that should exist does not.
    (NXRRSET => 8, "NXRRSET")

    /// Server not authoritative for zone or client not authorized.
    (NOTAUTH => 9, "NOTAUTH")

    /// Name not contained in zone.
    (NOTZONE => 10, "NOTZONE")
}

int_enum_str_with_decimal!(Rcode, u8, "unknown rcode");
