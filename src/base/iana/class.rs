//! DNS CLASSes.

//------------ Class ---------------------------------------------------------

int_enum! {
    /// DNS CLASSes.
    ///
    /// The domain name space is partitioned into separate classes for
    /// different network types. That is, each class has its own separate
    /// record tree starting at the root. However, in practice, only the IN
    /// class is really relevant.
    ///
    /// In addition, there are query classes or QCLASSes that are used in
    /// questions, namely NONE and ANY (or *).
    ///
    /// See [RFC 1034] for the introduction of classes and the
    /// [DNS CLASSes IANA registry] for an overview of assigned values.
    ///
    /// [RFC 1034]: https://tools.ietf.org/html/rfc1034
    /// [DNS CLASSes IANA registry]: http://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-2
    =>
    Class, u16;

    /// Internet (IN).
    (IN => 1, "IN")

    /// Chaosnet (CH).
    ///
    /// Reused by BIND for built-in server information zones.
    (CH => 3, "CH")

    /// Hesiod (HS).
    (HS => 4, "HS")

    /// Query class None.
    (NONE => 0xFE, "NONE")

    /// Query class * (ANY).
    (ANY => 0xFF, "ANY")
}

int_enum_str_with_prefix!(Class, "CLASS", u16, "unknown class");

//============ Tests =========================================================
