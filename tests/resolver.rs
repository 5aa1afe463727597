//! Tests of the resolver state machine over an in-memory network.

mod common;

use common::{answer, init_logging, AnswerBuilder, MockNet, Sent};
use dns_engine::base::iana::{Class, Rcode, Rtype};
use dns_engine::base::{HasTtl, Name, Packet, Question, Record, Section};
use dns_engine::rdata::{Ns, RecordData, A};
use dns_engine::resolv::conf::{Lookup, ResolvConf, TcpMode};
use dns_engine::resolv::stub::{Error, FakeClock, Protocol, Resolver, State};
use dns_engine::resolv::{Hints, Hosts};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

//------------ Helpers -------------------------------------------------------

const SERVER1: &str = "192.0.2.1:53";
const SERVER2: &str = "192.0.2.2:53";

fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

fn name(s: &str) -> Name {
    s.parse().unwrap()
}

fn a_record(owner: &Name, ip: [u8; 4]) -> Record {
    Record::new(
        owner.clone(),
        Class::IN,
        3600,
        A::from_octets(ip[0], ip[1], ip[2], ip[3]),
    )
}

/// An answer with an A record for whatever was asked.
fn a_answer(query: &Packet) -> Packet {
    let qname = query.question().unwrap().qname().clone();
    answer(query, Rcode::NOERROR, &[a_record(&qname, [192, 0, 2, 10])])
}

fn conf(f: impl FnOnce(&mut ResolvConf)) -> ResolvConf {
    let mut conf = ResolvConf::new();
    conf.set_servers([SERVER1, SERVER2]).unwrap();
    conf.lookup = vec![Lookup::Bind];
    f(&mut conf);
    conf
}

fn resolver(
    conf: ResolvConf,
    hosts: Hosts,
    net: &MockNet,
    clock: &FakeClock,
) -> Resolver<MockNet, FakeClock> {
    init_logging();
    let hints = Hints::local(&conf);
    Resolver::with_transport(
        Arc::new(conf),
        Arc::new(hosts),
        Arc::new(hints),
        net.clone(),
        clock.clone(),
    )
}

/// Checks until the resolver is no longer pending.
fn run(resolver: &mut Resolver<MockNet, FakeClock>) -> Result<Packet, Error> {
    for _ in 0..10 {
        match resolver.fetch() {
            Err(Error::Pending) => continue,
            res => return res,
        }
    }
    panic!("resolver made no progress");
}

fn first_addr(answer: &Packet) -> Option<std::net::IpAddr> {
    answer
        .section(Section::Answer)
        .unwrap()
        .next()
        .and_then(|record| record.unwrap().addr())
}

//------------ Tests ---------------------------------------------------------

#[test]
fn udp_answer() {
    let net = MockNet::new(|sent: &Sent| vec![a_answer(&sent.packet())]);
    let clock = FakeClock::default();
    let mut resolver = resolver(conf(|_| {}), Hosts::new(), &net, &clock);

    resolver
        .submit("www.example.com.", Rtype::A, Class::IN)
        .unwrap();
    assert_eq!(resolver.state(), State::QuerySent(Protocol::Udp));
    assert!(resolver.events().is_readable());
    assert_eq!(resolver.timeout(), Some(Duration::from_secs(5)));

    let answer = run(&mut resolver).unwrap();
    assert_eq!(first_addr(&answer), Some("192.0.2.10".parse().unwrap()));
    assert_eq!(resolver.state(), State::Idle);

    let sent = net.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].server, addr(SERVER1));
    assert!(sent[0].packet().header().rd());

    let stats = resolver.stats();
    assert_eq!(stats.queries, 1);
    assert_eq!(stats.udp.sent.count, 1);
    assert_eq!(stats.udp.sent.bytes, sent[0].wire.len() as u64);
    assert_eq!(stats.udp.received.count, 1);
    assert_eq!(stats.tcp.sent.count, 0);
}

#[test]
fn truncated_answer_is_retried_over_tcp() {
    let net = MockNet::new(|sent: &Sent| {
        let query = sent.packet();
        match sent.protocol {
            Protocol::Udp => vec![AnswerBuilder::new(&query).tc().finish()],
            Protocol::Tcp => vec![a_answer(&query)],
        }
    });
    let clock = FakeClock::default();
    let mut resolver = resolver(conf(|_| {}), Hosts::new(), &net, &clock);

    resolver.submit("www.example.com.", Rtype::A, Class::IN).unwrap();
    assert!(matches!(resolver.check(), Err(Error::Pending)));
    assert_eq!(resolver.state(), State::QuerySent(Protocol::Tcp));
    let answer = run(&mut resolver).unwrap();
    assert!(!answer.header().tc());
    assert!(first_addr(&answer).is_some());

    let sent = net.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].protocol, Protocol::Udp);
    assert_eq!(sent[1].protocol, Protocol::Tcp);
    assert_eq!(sent[1].server, sent[0].server);
    assert_eq!(sent[0].wire, sent[1].wire);
    assert_eq!(resolver.stats().queries, 2);
    assert_eq!(resolver.stats().tcp.sent.count, 1);
    assert_eq!(
        resolver.stats().tcp.sent.bytes,
        sent[1].wire.len() as u64 + 2
    );
}

#[test]
fn truncated_answer_is_final_without_tcp() {
    let net = MockNet::new(|sent: &Sent| {
        vec![AnswerBuilder::new(&sent.packet()).tc().finish()]
    });
    let clock = FakeClock::default();
    let conf = conf(|conf| conf.options.tcp = TcpMode::Disable);
    let mut resolver = resolver(conf, Hosts::new(), &net, &clock);

    resolver.submit("www.example.com.", Rtype::A, Class::IN).unwrap();
    let answer = run(&mut resolver).unwrap();
    assert!(answer.header().tc());
    assert_eq!(net.sent().len(), 1);
}

#[test]
fn tcp_only() {
    let net = MockNet::new(|sent: &Sent| vec![a_answer(&sent.packet())]);
    let clock = FakeClock::default();
    let conf = conf(|conf| conf.options.tcp = TcpMode::Only);
    let mut resolver = resolver(conf, Hosts::new(), &net, &clock);

    resolver.submit("www.example.com.", Rtype::A, Class::IN).unwrap();
    assert_eq!(resolver.state(), State::QuerySent(Protocol::Tcp));
    assert!(resolver.events().is_writable());
    run(&mut resolver).unwrap();
    let sent = net.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].protocol, Protocol::Tcp);
    assert_eq!(resolver.stats().udp.sent.count, 0);
}

#[test]
fn mismatched_answers_are_discarded() {
    let net = MockNet::new(|sent: &Sent| {
        let query = sent.packet();
        let mut other =
            Packet::query(&Question::new_in(name("other.example."), Rtype::A))
                .unwrap();
        other.set_qid(query.qid());
        vec![
            AnswerBuilder::new(&query)
                .id(query.qid().wrapping_add(1))
                .finish(),
            AnswerBuilder::new(&other).finish(),
        ]
    });
    let clock = FakeClock::default();
    let conf = conf(|conf| conf.options.attempts = 1);
    let mut resolver = resolver(conf, Hosts::new(), &net, &clock);

    resolver.submit("www.example.com.", Rtype::A, Class::IN).unwrap();
    assert!(matches!(resolver.check(), Err(Error::Pending)));
    assert_eq!(resolver.state(), State::QuerySent(Protocol::Udp));
    assert_eq!(net.sent().len(), 1);
    assert_eq!(resolver.stats().udp.received.count, 2);

    // The proper answer still gets through.
    let query = net.sent()[0].packet();
    net.inject(a_answer(&query).as_slice(), addr(SERVER1));
    assert!(first_addr(&run(&mut resolver).unwrap()).is_some());
    assert_eq!(net.sent().len(), 1);
}

#[test]
fn answers_from_elsewhere_are_discarded() {
    let net = MockNet::silent();
    let clock = FakeClock::default();
    let mut resolver = resolver(conf(|_| {}), Hosts::new(), &net, &clock);

    resolver.submit("www.example.com.", Rtype::A, Class::IN).unwrap();
    let query = net.sent()[0].packet();
    net.inject(a_answer(&query).as_slice(), addr("198.51.100.1:53"));
    assert!(matches!(resolver.check(), Err(Error::Pending)));
}

#[test]
fn timeouts_advance_through_servers() {
    let net = MockNet::silent();
    let clock = FakeClock::default();
    let mut resolver = resolver(conf(|_| {}), Hosts::new(), &net, &clock);

    resolver.submit("www.example.com.", Rtype::A, Class::IN).unwrap();
    assert!(matches!(resolver.check(), Err(Error::Pending)));
    clock.adjust_time(Duration::from_secs(2));
    assert_eq!(resolver.timeout(), Some(Duration::from_secs(3)));
    assert!(matches!(resolver.check(), Err(Error::Pending)));
    assert_eq!(net.sent().len(), 1);

    // Two attempts for two servers.
    for _ in 0..3 {
        clock.adjust_time(Duration::from_secs(5));
        assert!(matches!(resolver.check(), Err(Error::Pending)));
    }
    let servers: Vec<_> = net.sent().iter().map(|sent| sent.server).collect();
    assert_eq!(
        servers,
        [addr(SERVER1), addr(SERVER2), addr(SERVER1), addr(SERVER2)]
    );
    let ids: Vec<_> = net.sent().iter().map(|s| s.packet().qid()).collect();
    assert!(ids.windows(2).any(|pair| pair[0] != pair[1]));
    let stats = resolver.stats();
    assert_eq!(stats.queries, stats.udp.sent.count);
    assert_eq!(stats.queries, 4);

    clock.adjust_time(Duration::from_secs(5));
    assert!(matches!(resolver.check(), Err(Error::ResolutionTimeout)));
    assert_eq!(resolver.state(), State::Failed);
    assert!(matches!(resolver.check(), Err(Error::ResolutionTimeout)));
    assert_eq!(resolver.timeout(), None);
    assert!(resolver.pollfd().is_none());
}

#[test]
fn server_failure_moves_on() {
    let net = MockNet::new(|sent: &Sent| {
        let query = sent.packet();
        if sent.server == addr(SERVER1) {
            vec![answer(&query, Rcode::SERVFAIL, &[])]
        } else {
            vec![a_answer(&query)]
        }
    });
    let clock = FakeClock::default();
    let mut resolver = resolver(conf(|_| {}), Hosts::new(), &net, &clock);
    resolver.submit("www.example.com.", Rtype::A, Class::IN).unwrap();
    let answer = run(&mut resolver).unwrap();
    assert_eq!(answer.rcode(), Rcode::NOERROR);
    assert_eq!(net.sent().len(), 2);
}

#[test]
fn server_failure_everywhere_returns_failure() {
    let net = MockNet::new(|sent: &Sent| {
        vec![answer(&sent.packet(), Rcode::REFUSED, &[])]
    });
    let clock = FakeClock::default();
    let mut resolver = resolver(conf(|_| {}), Hosts::new(), &net, &clock);
    resolver.submit("www.example.com.", Rtype::A, Class::IN).unwrap();
    let answer = run(&mut resolver).unwrap();
    assert_eq!(answer.rcode(), Rcode::REFUSED);
    assert_eq!(net.sent().len(), 4);
}

#[test]
fn hosts_answer_without_network() {
    let net = MockNet::silent();
    let clock = FakeClock::default();
    let mut hosts = Hosts::new();
    hosts.insert("192.0.2.77", "gateway.lan", false).unwrap();
    let conf = conf(|conf| conf.lookup = vec![Lookup::File, Lookup::Bind]);
    let mut resolver = resolver(conf, hosts, &net, &clock);

    resolver.submit("gateway.lan", Rtype::A, Class::IN).unwrap();
    assert_eq!(resolver.state(), State::Done);
    let answer = resolver.fetch().unwrap();
    let record = answer.section(Section::Answer).unwrap().next().unwrap();
    let record = record.unwrap();
    assert_eq!(record.ttl(), 0);
    assert_eq!(record.addr(), Some("192.0.2.77".parse().unwrap()));
    assert!(net.sent().is_empty());
    assert_eq!(resolver.stats().queries, 0);

    // Not in the hosts table, so the DNS is asked.
    resolver.submit("other.lan", Rtype::A, Class::IN).unwrap();
    assert_eq!(net.sent().len(), 1);
    assert_eq!(resolver.stats().queries, 1);
}

#[test]
fn search_list_walks_on_nxdomain() {
    let net = MockNet::new(|sent: &Sent| {
        let query = sent.packet();
        if query.question().unwrap().qname() == &name("host.example.com") {
            vec![answer(&query, Rcode::NXDOMAIN, &[])]
        } else {
            vec![a_answer(&query)]
        }
    });
    let clock = FakeClock::default();
    let conf = conf(|conf| {
        conf.search = vec![name("example.com"), name("corp.internal")];
        conf.options.ndots = 1;
    });
    let mut resolver = resolver(conf, Hosts::new(), &net, &clock);

    resolver.submit("host", Rtype::A, Class::IN).unwrap();
    let answer = run(&mut resolver).unwrap();
    assert_eq!(
        answer.question().unwrap().qname(),
        &name("host.corp.internal")
    );
    let asked: Vec<_> = net
        .sent()
        .iter()
        .map(|sent| sent.packet().question().unwrap().qname().to_string())
        .collect();
    assert_eq!(asked, ["host.example.com.", "host.corp.internal."]);
}

#[test]
fn search_list_exhausted_returns_last_nxdomain() {
    let net = MockNet::new(|sent: &Sent| {
        vec![answer(&sent.packet(), Rcode::NXDOMAIN, &[])]
    });
    let clock = FakeClock::default();
    let conf = conf(|conf| conf.search = vec![name("example.com")]);
    let mut resolver = resolver(conf, Hosts::new(), &net, &clock);

    resolver.submit("host", Rtype::A, Class::IN).unwrap();
    let answer = run(&mut resolver).unwrap();
    assert_eq!(answer.rcode(), Rcode::NXDOMAIN);
    assert_eq!(answer.question().unwrap().qname(), &name("host"));
    assert_eq!(net.sent().len(), 2);
}

#[test]
fn root_query_ignores_search_list() {
    let net = MockNet::new(|sent: &Sent| {
        vec![answer(&sent.packet(), Rcode::NOERROR, &[])]
    });
    let clock = FakeClock::default();
    let conf = conf(|conf| conf.search = vec![name("example.com")]);
    let mut resolver = resolver(conf, Hosts::new(), &net, &clock);

    resolver.submit(".", Rtype::NS, Class::IN).unwrap();
    let answer = run(&mut resolver).unwrap();
    assert!(answer.question().unwrap().qname().is_root());
    let sent = net.sent();
    assert_eq!(sent.len(), 1);
    let question = sent[0].packet().question().unwrap();
    assert!(question.qname().is_root());
    assert_eq!(question.qtype(), Rtype::NS);
}

#[test]
fn overlong_search_candidates_are_skipped() {
    let net = MockNet::new(|sent: &Sent| vec![a_answer(&sent.packet())]);
    let clock = FakeClock::default();
    // Fits on its own but not with the search domain appended.
    let qname = [vec!["a".repeat(63); 3].join("."), "b".repeat(60)].join(".");
    let conf = conf(|conf| {
        conf.search = vec![name("example.com")];
        conf.options.ndots = 5;
    });
    let mut resolver = resolver(conf, Hosts::new(), &net, &clock);

    resolver.submit(&qname, Rtype::A, Class::IN).unwrap();
    run(&mut resolver).unwrap();
    let sent = net.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].packet().question().unwrap().qname(), &name(&qname));
}

#[test]
fn rotate_starts_each_query_at_the_next_server() {
    let net = MockNet::new(|sent: &Sent| vec![a_answer(&sent.packet())]);
    let clock = FakeClock::default();
    let conf = conf(|conf| conf.options.rotate = true);
    let mut resolver = resolver(conf, Hosts::new(), &net, &clock);

    for _ in 0..3 {
        resolver.submit("www.example.com.", Rtype::A, Class::IN).unwrap();
        run(&mut resolver).unwrap();
    }
    let servers: Vec<_> = net.sent().iter().map(|sent| sent.server).collect();
    assert_eq!(servers, [addr(SERVER1), addr(SERVER2), addr(SERVER1)]);
}

#[test]
fn submit_while_busy() {
    let net = MockNet::silent();
    let clock = FakeClock::default();
    let mut resolver = resolver(conf(|_| {}), Hosts::new(), &net, &clock);

    assert!(matches!(resolver.check(), Err(Error::Idle)));
    resolver.submit("www.example.com", Rtype::A, Class::IN).unwrap();
    assert!(matches!(
        resolver.submit("www.example.org", Rtype::A, Class::IN),
        Err(Error::AlreadyInProgress)
    ));
    resolver.close();
    resolver.close();
    assert_eq!(resolver.state(), State::Idle);
    assert!(resolver.events().is_empty());
    resolver.submit("www.example.org", Rtype::A, Class::IN).unwrap();
    assert_eq!(resolver.stats().queries, 2);
}

#[test]
fn edns0_query() {
    let net = MockNet::new(|sent: &Sent| vec![a_answer(&sent.packet())]);
    let clock = FakeClock::default();
    let conf = conf(|conf| conf.options.edns0 = true);
    let mut resolver = resolver(conf, Hosts::new(), &net, &clock);

    resolver.submit("www.example.com.", Rtype::A, Class::IN).unwrap();
    run(&mut resolver).unwrap();
    let query = net.sent()[0].packet();
    let opt = query.section(Section::Additional).unwrap().next().unwrap();
    match opt.unwrap().data() {
        Some(RecordData::Opt(opt)) => {
            assert_eq!(opt.udp_payload_size(), 4096)
        }
        other => panic!("expected OPT, got {:?}", other),
    }
}

#[test]
fn recursion_follows_referrals() {
    const ROOT: &str = "192.0.2.100:53";
    const GLUE: &str = "192.0.2.53:53";

    let net = MockNet::new(|sent: &Sent| {
        let query = sent.packet();
        assert!(!query.header().rd());
        if sent.server == addr(ROOT) {
            let ns = name("ns.example.");
            vec![AnswerBuilder::new(&query)
                .records(
                    Section::Authority,
                    &[Record::new(
                        name("example."),
                        Class::IN,
                        86400,
                        Ns::new(ns.clone()),
                    )],
                )
                .records(Section::Additional, &[a_record(&ns, [192, 0, 2, 53])])
                .finish()]
        } else {
            assert_eq!(sent.server, addr(GLUE));
            vec![a_answer(&query)]
        }
    });
    let clock = FakeClock::default();
    let mut conf = ResolvConf::root();
    conf.lookup = vec![Lookup::Bind];
    let mut hints = Hints::new();
    hints.insert(".", ROOT, 1).unwrap();
    init_logging();
    let mut resolver = Resolver::with_transport(
        Arc::new(conf),
        Arc::new(Hosts::new()),
        Arc::new(hints),
        net.clone(),
        clock.clone(),
    );

    resolver.submit("www.example.", Rtype::A, Class::IN).unwrap();
    let answer = run(&mut resolver).unwrap();
    assert!(first_addr(&answer).is_some());
    let servers: Vec<_> = net.sent().iter().map(|sent| sent.server).collect();
    assert_eq!(servers, [addr(ROOT), addr(GLUE)]);
}

#[test]
fn no_servers() {
    let net = MockNet::silent();
    let clock = FakeClock::default();
    init_logging();
    let mut resolver = Resolver::with_transport(
        Arc::new(ResolvConf::new()),
        Arc::new(Hosts::new()),
        Arc::new(Hints::new()),
        net,
        clock,
    );
    assert!(matches!(
        resolver.submit("www.example.com.", Rtype::A, Class::IN),
        Err(Error::NoServers)
    ));
    assert_eq!(resolver.state(), State::Failed);
}
