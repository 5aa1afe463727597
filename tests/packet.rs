//! Wire format properties of packets and record data.

use dns_engine::base::iana::{Class, SshfpAlgorithm, SshfpType};
use dns_engine::base::{
    HasTtl, Named, Name, Packet, PacketError, Question, Record, Rtype,
    Section,
};
use dns_engine::rdata::{
    Aaaa, Cname, Mx, Ns, Opt, Ptr, RecordData, Soa, Spf, Srv, Sshfp, Txt,
    UnknownRecordData, A,
};
use rstest::rstest;

fn name(s: &str) -> Name {
    s.parse().unwrap()
}

/// Writes a name without compression.
fn raw_name(name: &str, target: &mut Vec<u8>) {
    for label in name.split('.').filter(|label| !label.is_empty()) {
        target.push(label.len() as u8);
        target.extend_from_slice(label.as_bytes());
    }
    target.push(0);
}

#[test]
fn overstated_counts_are_malformed() {
    let mut wire = vec![0u8; 12];
    wire[6..8].copy_from_slice(&500u16.to_be_bytes());
    assert!(matches!(
        Packet::from_bytes(&wire),
        Err(PacketError::Malformed(_))
    ));

    let mut packet = Packet::new(512).unwrap();
    packet.load(&wire).unwrap();
    assert!(matches!(packet.study(), Err(PacketError::Malformed(_))));
    assert!(matches!(
        packet.section(Section::Answer),
        Err(PacketError::Unstudied)
    ));
}

#[test]
fn short_messages_are_rejected() {
    assert!(matches!(
        Packet::from_bytes(&[0; 11]),
        Err(PacketError::Malformed(_))
    ));
}

#[test]
fn compressed_names_expand_like_plain_ones() {
    let owner = name("www.example.com");
    let records = [
        Record::new(
            owner.clone(),
            Class::IN,
            300,
            Cname::new(name("web.example.com")),
        ),
        Record::new(
            name("web.example.com"),
            Class::IN,
            300,
            A::from_octets(192, 0, 2, 1),
        ),
    ];

    let mut compressed = Packet::new(512).unwrap();
    compressed
        .push(Section::Question, &owner, Rtype::A, Class::IN)
        .unwrap();
    for record in &records {
        compressed.push_record(Section::Answer, record).unwrap();
    }

    let mut plain = compressed.as_slice()[..12].to_vec();
    raw_name("www.example.com", &mut plain);
    plain.extend_from_slice(&[0, 1, 0, 1]);
    for (owner, rtype, rdata) in [
        ("www.example.com", Rtype::CNAME, {
            let mut rdata = Vec::new();
            raw_name("web.example.com", &mut rdata);
            rdata
        }),
        ("web.example.com", Rtype::A, vec![192, 0, 2, 1]),
    ] {
        raw_name(owner, &mut plain);
        plain.extend_from_slice(&rtype.to_int().to_be_bytes());
        plain.extend_from_slice(&[0, 1, 0, 0, 1, 44]);
        plain.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        plain.extend_from_slice(&rdata);
    }

    assert!(compressed.len() < plain.len());
    let compressed = Packet::from_bytes(compressed.as_slice()).unwrap();
    let plain = Packet::from_bytes(&plain).unwrap();
    assert_eq!(compressed.question().unwrap(), plain.question().unwrap());
    let left: Vec<_> = compressed
        .section(Section::Answer)
        .unwrap()
        .map(Result::unwrap)
        .collect();
    let right: Vec<_> = plain
        .section(Section::Answer)
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(left, right);
    assert_eq!(left, records);
    assert_eq!(
        left[0].target().unwrap().to_string(),
        "web.example.com."
    );
}

#[test]
fn pointer_loops_are_detected() {
    let mut wire = vec![0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0];
    // A name that points at itself.
    wire.extend_from_slice(&[0xC0, 12, 0, 1, 0, 1]);
    let packet = Packet::from_bytes(&wire).unwrap();
    assert_eq!(packet.question(), Err(PacketError::CompressionLoop));
}

#[test]
fn long_names_are_refused() {
    let label = "a".repeat(60);
    let long = vec![label.as_str(); 5].join(".");
    assert!(long.parse::<Name>().is_err());

    let mut wire = vec![0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0];
    raw_name(&long, &mut wire);
    wire.extend_from_slice(&[0, 1, 0, 1]);
    match Packet::from_bytes(&wire) {
        Err(err) => assert_eq!(err, PacketError::NameTooLong),
        Ok(packet) => {
            assert_eq!(packet.question(), Err(PacketError::NameTooLong))
        }
    }
}

#[test]
fn full_buffer() {
    let mut packet = Packet::new(64).unwrap();
    let owner = name("a-rather-long-label.example.com");
    packet
        .push(Section::Question, &owner, Rtype::TXT, Class::IN)
        .unwrap();
    let before = packet.as_slice().to_vec();
    let record = Record::new(
        owner,
        Class::IN,
        3600,
        Txt::from_text("x".repeat(100)),
    );
    assert_eq!(
        packet.push_record(Section::Answer, &record),
        Err(PacketError::BufferFull)
    );
    assert_eq!(packet.as_slice(), before.as_slice());
}

#[rstest]
#[case(A::from_octets(192, 0, 2, 1).into())]
#[case(Aaaa::new("2001:db8::1".parse().unwrap()).into())]
#[case(Ns::new(name("ns1.example.com")).into())]
#[case(Cname::new(name("alias.example.com")).into())]
#[case(Ptr::new(name("host.example.com")).into())]
#[case(Mx::new(10, name("mail.example.com")).into())]
#[case(Soa::new(
    name("ns1.example.com"),
    name("hostmaster.example.com"),
    2024010101,
    7200,
    3600,
    1209600,
    300,
).into())]
#[case(Txt::from_text("v=spf1 -all").into())]
#[case(Spf::from_text("v=spf1 mx -all").into())]
#[case(Srv::new(10, 60, 5060, name("sip.example.com")).into())]
#[case(Sshfp::new(
    SshfpAlgorithm::ED25519,
    SshfpType::SHA256,
    vec![0xAB; 32],
).into())]
#[case(UnknownRecordData::new(Rtype::from_int(65280), vec![1, 2, 3]).into())]
#[case({
    let mut opt = Opt::new(1232);
    opt.set_version(1);
    opt.set_dnssec_ok(true);
    opt.into()
})]
fn typed_records_survive_the_wire(#[case] data: RecordData) {
    let owner = name("example.com");
    let record = Record::new(owner.clone(), Class::IN, 3600, data.clone());
    let mut packet = Packet::new(512).unwrap();
    packet
        .push(Section::Question, &owner, record.rtype(), Class::IN)
        .unwrap();
    packet.push_record(Section::Answer, &record).unwrap();

    let packet = Packet::from_bytes(packet.as_slice()).unwrap();
    let parsed = packet
        .section(Section::Answer)
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(parsed.ttl(), record.ttl());
    assert_eq!(parsed.class(), record.class());
    if !matches!(data, RecordData::Opt(_)) {
        assert_eq!(parsed.ttl(), 3600);
        assert_eq!(parsed.class(), Class::IN);
    }
    assert_eq!(parsed.rtype(), data.rtype());
    assert_eq!(parsed.owner(), &owner);
    assert_eq!(parsed.data(), Some(&data));
}

#[test]
fn header_fields() {
    let question = Question::new_in(name("example.org"), Rtype::MX);
    let mut packet = Packet::query(&question).unwrap();
    let mut header = packet.header();
    header.set_id(0xBEEF);
    header.set_ad(true);
    header.set_cd(true);
    packet.set_header(header);

    let parsed = Packet::from_bytes(packet.as_slice()).unwrap();
    assert_eq!(parsed.header(), header);
    assert_eq!(parsed.qid(), 0xBEEF);
    assert!(parsed.header().rd());
    assert!(!parsed.header().qr());
    assert_eq!(parsed.counts().qdcount(), 1);
    assert_eq!(parsed.question().unwrap(), question);
}
