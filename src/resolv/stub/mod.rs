//! A poll-driven stub and recursive resolver.
//!
//! The [`Resolver`] answers one query at a time. It never blocks and never
//! spawns threads. Instead, it exposes a state machine that is advanced by
//! calling [`check`][Resolver::check] or [`fetch`][Resolver::fetch]
//! whenever its socket, available via [`pollfd`][Resolver::pollfd], becomes
//! ready for the [`events`][Resolver::events] it asks for, or when the
//! [`timeout`][Resolver::timeout] has passed. This makes it possible to
//! drive the resolver from any event loop. The
//! [`query`][Resolver::query] method drives it with `poll(2)` for simple
//! blocking use and, with the `tokio` feature, [`aio::query`] drives it
//! from an async task.
//!
//! A query walks the search list of the configuration. For each candidate
//! name, the sources of the configuration's lookup order are consulted in
//! turn: the hosts table and the DNS. For the DNS, the candidate servers
//! are taken from the hints table. Each server is tried up to `attempts`
//! times. A truncated UDP answer is repeated over TCP with the very same
//! query. In recursive mode, referrals are followed via their glue.

pub use self::clock::{Clock, Elapsed, FakeClock, FakeInstant, SystemClock};
pub use self::net::{
    Connect, DgramSocket, RawDescriptor, StreamSocket, SystemConnect,
};
pub use self::stats::{Counter, Stats, Traffic};

#[cfg(all(feature = "tokio", unix))]
pub mod aio;
pub mod clock;
pub mod net;
pub mod stats;

use super::conf::{self, Lookup, ResolvConf, ResolvOptions, TcpMode};
use super::hints::Hints;
use super::hosts::{self, Hosts};
use super::search::SearchIter;
use crate::base::iana::{Class, Rcode, Rtype};
use crate::base::name::Name;
use crate::base::packet::{Packet, PacketError, RecordFilter};
use crate::base::question::Question;
use crate::base::record::{Named, Section};
use crate::rdata::{Opt, RecordData};
use core::fmt;
use core::ops::BitOr;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

//------------ Constants -----------------------------------------------------

/// The maximum number of referrals followed in recursive mode.
pub const MAX_REFERRALS: usize = 16;

/// The UDP payload size advertised via EDNS.
pub const EDNS_PAYLOAD_SIZE: u16 = 4096;

/// The UDP payload size without EDNS.
const UDP_PAYLOAD_SIZE: usize = 512;

/// The largest possible message.
const MAX_MESSAGE_SIZE: usize = 65535;

/// The lookup order used if the configuration has none.
const DEFAULT_LOOKUP: [Lookup; 1] = [Lookup::Bind];

//------------ Protocol ------------------------------------------------------

/// The transport protocol of a query.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Protocol {
    Udp,
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Protocol::Udp => "UDP",
            Protocol::Tcp => "TCP",
        })
    }
}

//------------ State ---------------------------------------------------------

/// The state of a resolver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// There is no query.
    Idle,

    /// A query is outstanding over the given protocol.
    QuerySent(Protocol),

    /// An answer is ready to be fetched.
    Done,

    /// The query has failed.
    Failed,
}

//------------ Events --------------------------------------------------------

/// The readiness events a resolver waits for.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Events(u8);

impl Events {
    pub const NONE: Self = Events(0);
    pub const READ: Self = Events(1);
    pub const WRITE: Self = Events(2);

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn is_readable(self) -> bool {
        self.0 & Self::READ.0 != 0
    }

    #[must_use]
    pub fn is_writable(self) -> bool {
        self.0 & Self::WRITE.0 != 0
    }

    /// Converts the events into the flags for `poll(2)`.
    #[cfg(unix)]
    #[must_use]
    pub fn to_poll(self) -> libc::c_short {
        let mut res = 0;
        if self.is_readable() {
            res |= libc::POLLIN;
        }
        if self.is_writable() {
            res |= libc::POLLOUT;
        }
        res
    }
}

impl BitOr for Events {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        Events(self.0 | other.0)
    }
}

//------------ Resolver ------------------------------------------------------

/// A resolver answering one query at a time.
///
/// The resolver shares its configuration, hosts table, and hints table
/// with others via `Arc`s. The transport and time source are type
/// parameters with the system's sockets and monotonic clock as defaults.
pub struct Resolver<C: Connect = SystemConnect, K: Clock = SystemClock> {
    conf: Arc<ResolvConf>,
    hosts: Arc<Hosts>,
    hints: Arc<Hints>,
    connect: C,
    clock: K,

    /// The source for query IDs and ports.
    rng: StdRng,

    /// The server to start the next query with if `rotate` is set.
    rotation: usize,

    state: State,

    /// The outstanding query.
    job: Option<Job>,

    /// The socket of the outstanding query.
    transport: Transport<C>,

    /// When the current query was sent.
    started: Option<K::Instant>,

    answer: Option<Packet>,
    error: Option<Error>,
    stats: Stats,
}

/// # Creation
///
impl Resolver {
    /// Creates a resolver from optional parts.
    ///
    /// A missing configuration is loaded from the system. A missing hosts
    /// table is empty when the configuration asks for recursion and is
    /// loaded from the system otherwise. Missing hints are the root
    /// servers when recursing and the configured servers otherwise.
    pub fn open(
        conf: Option<Arc<ResolvConf>>,
        hosts: Option<Arc<Hosts>>,
        hints: Option<Arc<Hints>>,
    ) -> Result<Self, OpenError> {
        let conf = match conf {
            Some(conf) => conf,
            None => Arc::new(ResolvConf::open()?),
        };
        let recurse = conf.options.recurse;
        let hosts = match hosts {
            Some(hosts) => hosts,
            None if recurse => Arc::new(Hosts::new()),
            None => Arc::new(Hosts::local()?),
        };
        let hints = match hints {
            Some(hints) => hints,
            None if recurse => Arc::new(Hints::root()),
            None => Arc::new(Hints::local(&conf)),
        };
        Ok(Self::new(conf, hosts, hints))
    }

    /// Creates a resolver using the system's sockets and clock.
    #[must_use]
    pub fn new(
        conf: Arc<ResolvConf>,
        hosts: Arc<Hosts>,
        hints: Arc<Hints>,
    ) -> Self {
        Self::with_transport(conf, hosts, hints, SystemConnect, SystemClock)
    }
}

impl<C: Connect, K: Clock> Resolver<C, K> {
    /// Creates a resolver with the given transport and clock.
    pub fn with_transport(
        conf: Arc<ResolvConf>,
        hosts: Arc<Hosts>,
        hints: Arc<Hints>,
        connect: C,
        clock: K,
    ) -> Self {
        Resolver {
            conf,
            hosts,
            hints,
            connect,
            clock,
            rng: StdRng::from_entropy(),
            rotation: 0,
            state: State::Idle,
            job: None,
            transport: Transport::None,
            started: None,
            answer: None,
            error: None,
            stats: Stats::default(),
        }
    }
}

/// # Access to Parts
///
impl<C: Connect, K: Clock> Resolver<C, K> {
    pub fn conf(&self) -> &Arc<ResolvConf> {
        &self.conf
    }

    pub fn hosts(&self) -> &Arc<Hosts> {
        &self.hosts
    }

    pub fn hints(&self) -> &Arc<Hints> {
        &self.hints
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

/// # Running Queries
///
impl<C: Connect, K: Clock> Resolver<C, K> {
    /// Starts resolving a question.
    ///
    /// Fails with [`Error::AlreadyInProgress`] if a query is outstanding.
    /// A previous answer or error that hasn't been fetched is dropped.
    ///
    /// If the question can be answered right away, for instance from the
    /// hosts table, the resolver is [`Done`][State::Done] when this
    /// returns.
    pub fn submit(
        &mut self,
        qname: &str,
        qtype: Rtype,
        qclass: Class,
    ) -> Result<(), Error> {
        if let State::QuerySent(_) = self.state {
            return Err(Error::AlreadyInProgress);
        }
        self.close();
        let mut search = self.conf.search(qname);
        let mut err = Error::NoAnswer;
        let first = loop {
            let Some(candidate) = search.next() else {
                return Err(err);
            };
            match candidate.parse::<Name>() {
                Ok(name) => break name,
                Err(parse_err) => {
                    warn!(
                        "skipping search candidate {}: {}",
                        candidate, parse_err
                    );
                    err = PacketError::from(parse_err).into();
                }
            }
        };
        let question = Question::new(first, qtype, qclass);
        debug!("submitting query for {}", question);
        let rotation = self.rotation;
        if self.conf.options.rotate {
            self.rotation = self.rotation.wrapping_add(1);
        }
        self.job = Some(Job::new(question, search, rotation));
        self.state = State::QuerySent(Protocol::Udp);
        let res = self.next_source();
        match self.settle(res) {
            Ok(()) | Err(Error::Pending) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Makes progress on the outstanding query.
    ///
    /// Returns `Ok(())` once the answer is available,
    /// [`Error::Pending`] while the query is still in progress, and
    /// [`Error::Idle`] if there is no query at all. Any other error means
    /// that the query has failed. The error is returned again by later
    /// calls until the next query is submitted.
    pub fn check(&mut self) -> Result<(), Error> {
        match self.state {
            State::Idle => Err(Error::Idle),
            State::Done => Ok(()),
            State::Failed => Err(self.error.clone().unwrap_or(Error::Idle)),
            State::QuerySent(_) => {
                let res = self.progress();
                self.settle(res)
            }
        }
    }

    /// Makes progress and takes the answer if it is available.
    ///
    /// The resolver returns to [`Idle`][State::Idle] once the answer has
    /// been taken.
    pub fn fetch(&mut self) -> Result<Packet, Error> {
        self.check()?;
        let answer = self.answer.take().ok_or(Error::Idle)?;
        self.job = None;
        self.state = State::Idle;
        Ok(answer)
    }

    /// Abandons the outstanding query and releases its socket.
    ///
    /// The resolver returns to [`Idle`][State::Idle]. Closing an idle
    /// resolver does nothing.
    pub fn close(&mut self) {
        if self.state != State::Idle {
            trace!("closing resolver in state {:?}", self.state);
        }
        self.transport = Transport::None;
        self.job = None;
        self.started = None;
        self.answer = None;
        self.error = None;
        self.state = State::Idle;
    }
}

/// # Polling
///
impl<C: Connect, K: Clock> Resolver<C, K> {
    /// Returns the socket to wait on.
    pub fn pollfd(&self) -> Option<RawDescriptor> {
        match self.transport {
            Transport::None => None,
            Transport::Udp { ref sock, .. } => sock.descriptor(),
            Transport::Tcp { ref sock, .. } => sock.descriptor(),
        }
    }

    /// Returns the events to wait for on the socket.
    pub fn events(&self) -> Events {
        match self.transport {
            Transport::None => Events::NONE,
            Transport::Udp { .. } => Events::READ,
            Transport::Tcp { ref stream, .. } => stream.events(),
        }
    }

    /// Returns how long to wait at most before checking again.
    ///
    /// Returns `None` if there is no outstanding query.
    pub fn timeout(&self) -> Option<Duration> {
        match self.state {
            State::QuerySent(_) => self
                .started
                .as_ref()
                .map(|started| started.remaining(self.conf.options.timeout)),
            _ => None,
        }
    }

    /// Resolves a question, waiting for the answer.
    ///
    /// This drives the resolver using `poll(2)` on its socket.
    #[cfg(unix)]
    pub fn query(
        &mut self,
        qname: &str,
        qtype: Rtype,
        qclass: Class,
    ) -> Result<Packet, Error> {
        self.submit(qname, qtype, qclass)?;
        loop {
            match self.check() {
                Ok(()) => return self.fetch(),
                Err(Error::Pending) => {}
                Err(err) => return Err(err),
            }
            let timeout = self.timeout().unwrap_or_default();
            let fd = match self.pollfd() {
                Some(fd) => fd,
                None => {
                    std::thread::sleep(timeout.min(Duration::from_millis(10)));
                    continue;
                }
            };
            let mut pollfd = libc::pollfd {
                fd,
                events: self.events().to_poll(),
                revents: 0,
            };
            let millis = timeout
                .as_millis()
                .saturating_add(1)
                .min(libc::c_int::MAX as u128) as libc::c_int;
            // SAFETY: pollfd is a valid, exclusively borrowed array of one.
            let res = unsafe { libc::poll(&mut pollfd, 1, millis) };
            if res < 0 {
                let err = io::Error::last_os_error();
                if err.kind() != io::ErrorKind::Interrupted {
                    self.close();
                    return Err(err.into());
                }
            }
        }
    }
}

/// # The State Machine
///
impl<C: Connect, K: Clock> Resolver<C, K> {
    /// Updates the state according to the result of a step.
    fn settle(&mut self, res: Result<Step, Error>) -> Result<(), Error> {
        match res {
            Ok(Step::Pending) => {
                self.state = State::QuerySent(
                    self.transport.protocol().unwrap_or(Protocol::Udp),
                );
                Err(Error::Pending)
            }
            Ok(Step::Done(answer)) => {
                debug!("query done: {}", answer.rcode());
                self.transport = Transport::None;
                self.started = None;
                self.answer = Some(answer);
                self.state = State::Done;
                Ok(())
            }
            Err(err) => {
                debug!("query failed: {}", err);
                self.transport = Transport::None;
                self.started = None;
                self.job = None;
                self.error = Some(err.clone());
                self.state = State::Failed;
                Err(err)
            }
        }
    }

    /// Consults the next lookup source or moves on to the next candidate.
    fn next_source(&mut self) -> Result<Step, Error> {
        let order: &[Lookup] = if self.conf.lookup.is_empty() {
            &DEFAULT_LOOKUP
        } else {
            &self.conf.lookup
        };
        loop {
            let job = self.job.as_mut().ok_or(Error::Idle)?;
            let source = match order.get(job.lookup) {
                Some(source) => {
                    job.lookup += 1;
                    *source
                }
                None => match job.search.next() {
                    Some(candidate) => {
                        match candidate.parse::<Name>() {
                            Ok(qname) => {
                                debug!("trying search candidate {}", qname);
                                job.restart(qname);
                            }
                            Err(err) => {
                                warn!(
                                    "skipping search candidate {}: {}",
                                    candidate, err
                                );
                            }
                        }
                        continue;
                    }
                    None => return job.finish(),
                },
            };
            match source {
                Lookup::File => {
                    if let Some(answer) = self.hosts.query(&job.question)? {
                        debug!("answered {} from hosts", job.question);
                        return Ok(Step::Done(answer));
                    }
                }
                Lookup::Bind => {
                    let hints = self.hints.grep(job.question.qname());
                    if hints.servers().is_empty() {
                        debug!("no servers for {}", job.question.qname());
                        job.no_servers = true;
                        continue;
                    }
                    job.servers = hints.servers().to_vec();
                    job.reset_servers(&self.conf.options);
                    return self.send_query();
                }
                Lookup::Cache => trace!("skipping cache lookup"),
            }
        }
    }

    /// Skips the remaining sources of the current candidate.
    fn next_candidate(&mut self) -> Result<Step, Error> {
        if let Some(job) = self.job.as_mut() {
            job.lookup = usize::MAX;
        }
        self.next_source()
    }

    /// Sends the query to the next server.
    fn send_query(&mut self) -> Result<Step, Error> {
        self.transport = Transport::None;
        let options = &self.conf.options;
        let tcp_only = options.tcp == TcpMode::Only;
        let job = self.job.as_mut().ok_or(Error::Idle)?;
        if job.servers.is_empty()
            || job.tries >= options.attempts.max(1) * job.servers.len()
        {
            return match job.fallback.take() {
                Some(answer) => Ok(Step::Done(answer)),
                None => Err(Error::ResolutionTimeout),
            };
        }
        let server = job.servers[(job.offset + job.tries) % job.servers.len()];
        job.tries += 1;
        self.stats.queries += 1;
        job.qid = self.rng.gen();
        job.query = build_query(&job.question, job.qid, options)?
            .as_slice()
            .to_vec();
        debug!(
            "sending query {} for {} to {} (try {})",
            job.qid, job.question, server, job.tries
        );
        self.started = Some(self.clock.now());
        if tcp_only {
            self.start_tcp(server)?;
        } else {
            self.start_udp(server)?;
        }
        Ok(Step::Pending)
    }

    fn start_udp(&mut self, server: SocketAddr) -> Result<(), Error> {
        self.job.as_ref().ok_or(Error::Idle)?;
        let sock = self.bind_dgram(server)?;
        let job = self.job.as_ref().ok_or(Error::Idle)?;
        let len = sock.send_to(job.query.as_slice(), server)?;
        trace!("sent {} octets to {} via UDP", len, server);
        self.stats.sent(Protocol::Udp, len);
        self.transport = Transport::Udp { sock, server };
        Ok(())
    }

    /// Binds a datagram socket to a random port.
    fn bind_dgram(&mut self, server: SocketAddr) -> Result<C::Dgram, Error> {
        let mut local = self.local_addr(server);
        if local.port() != 0 {
            return Ok(self.connect.bind_dgram(local)?);
        }
        for _ in 0..net::RETRY_RANDOM_PORT {
            local.set_port(self.rng.gen_range(1025..=u16::MAX));
            match self.connect.bind_dgram(local) {
                Ok(sock) => return Ok(sock),
                Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
                    trace!("port {} in use", local.port());
                }
                Err(err) => return Err(err.into()),
            }
        }
        local.set_port(0);
        Ok(self.connect.bind_dgram(local)?)
    }

    /// Returns the local address for talking to a server.
    fn local_addr(&self, server: SocketAddr) -> SocketAddr {
        match self.conf.iface {
            Some(iface) if iface.is_ipv4() == server.is_ipv4() => iface,
            _ => {
                let ip: IpAddr = if server.is_ipv4() {
                    Ipv4Addr::UNSPECIFIED.into()
                } else {
                    Ipv6Addr::UNSPECIFIED.into()
                };
                SocketAddr::new(ip, 0)
            }
        }
    }

    fn start_tcp(&mut self, server: SocketAddr) -> Result<(), Error> {
        let job = self.job.as_ref().ok_or(Error::Idle)?;
        let local = match self.conf.iface {
            Some(iface) if iface.is_ipv4() == server.is_ipv4() => {
                Some(SocketAddr::new(iface.ip(), 0))
            }
            _ => None,
        };
        let sock = self.connect.connect_stream(local, server)?;
        trace!("connecting to {} via TCP", server);
        self.transport = Transport::Tcp {
            sock,
            server,
            stream: StreamState::new(job.query.as_slice()),
        };
        Ok(())
    }

    /// Reads what is available and checks the timeout.
    fn progress(&mut self) -> Result<Step, Error> {
        loop {
            let (message, protocol, server) = match self.transport {
                Transport::None => return self.send_query(),
                Transport::Udp { ref sock, server } => {
                    match recv_dgram(sock, server, &mut self.stats)? {
                        Some(message) => (message, Protocol::Udp, server),
                        None => break,
                    }
                }
                Transport::Tcp {
                    ref mut sock,
                    ref mut stream,
                    server,
                } => match stream.progress(sock, &mut self.stats)? {
                    Some(message) => (message, Protocol::Tcp, server),
                    None => break,
                },
            };
            if let Some(step) = self.response(&message, protocol, server)? {
                return Ok(step);
            }
        }
        let timeout = self.conf.options.timeout;
        let expired = self
            .started
            .as_ref()
            .map_or(true, |started| started.elapsed() >= timeout);
        if expired {
            debug!("query timed out after {:?}", timeout);
            return self.send_query();
        }
        Ok(Step::Pending)
    }

    /// Processes a received message.
    ///
    /// Returns `None` if the message was discarded.
    fn response(
        &mut self,
        message: &[u8],
        protocol: Protocol,
        server: SocketAddr,
    ) -> Result<Option<Step>, Error> {
        let job = self.job.as_ref().ok_or(Error::Idle)?;
        let capacity = match protocol {
            Protocol::Udp if self.conf.options.edns0 => {
                usize::from(EDNS_PAYLOAD_SIZE)
            }
            Protocol::Udp => UDP_PAYLOAD_SIZE,
            Protocol::Tcp => MAX_MESSAGE_SIZE,
        };
        let mut answer = Packet::new(capacity)?;
        if let Err(err) = answer.load(message) {
            warn!("discarding message from {}: {}", server, err);
            return Ok(None);
        }
        let header = answer.header();
        if !header.qr() || header.id() != job.qid {
            warn!(
                "discarding message from {} with id {}, expected {}",
                server,
                header.id(),
                job.qid
            );
            return Ok(None);
        }
        match answer.question() {
            Ok(ref question) if *question == job.question => {}
            _ => {
                warn!("discarding message from {}: question mismatch", server);
                return Ok(None);
            }
        }
        if header.tc()
            && protocol == Protocol::Udp
            && self.conf.options.tcp != TcpMode::Disable
        {
            debug!("truncated answer from {}, retrying via TCP", server);
            self.stats.queries += 1;
            self.started = Some(self.clock.now());
            self.start_tcp(server)?;
            return Ok(Some(Step::Pending));
        }
        if let Err(err) = answer.study() {
            warn!("malformed answer from {}: {}", server, err);
            return self.send_query().map(Some);
        }
        self.transport = Transport::None;
        self.accept(answer).map(Some)
    }

    /// Decides what to do with a valid answer.
    fn accept(&mut self, answer: Packet) -> Result<Step, Error> {
        let recurse = self.conf.options.recurse;
        let job = self.job.as_mut().ok_or(Error::Idle)?;
        match answer.rcode() {
            Rcode::SERVFAIL | Rcode::REFUSED | Rcode::NOTIMP => {
                debug!("server failure: {}", answer.rcode());
                job.fallback = Some(answer);
                self.send_query()
            }
            Rcode::NXDOMAIN => {
                debug!("{} does not exist", job.question.qname());
                job.last = Some(answer);
                self.next_candidate()
            }
            Rcode::NOERROR if recurse => match referral(&answer)? {
                Some(servers) if job.referrals < MAX_REFERRALS => {
                    job.referrals += 1;
                    debug!(
                        "following referral {} to {} servers",
                        job.referrals,
                        servers.len()
                    );
                    job.servers = servers;
                    job.reset_servers(&self.conf.options);
                    self.send_query()
                }
                _ => Ok(Step::Done(answer)),
            },
            _ => Ok(Step::Done(answer)),
        }
    }
}

//--- Debug

impl<C: Connect, K: Clock> fmt::Debug for Resolver<C, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}

//------------ Step ----------------------------------------------------------

/// The outcome of making progress.
enum Step {
    Pending,
    Done(Packet),
}

//------------ Job -----------------------------------------------------------

/// An outstanding query.
struct Job {
    /// The question for the current search candidate.
    question: Question,

    /// The remaining search candidates.
    search: SearchIter,

    /// The index of the next lookup source.
    lookup: usize,

    /// The servers to ask.
    servers: Vec<SocketAddr>,

    /// The rotation cursor the query was submitted with.
    rotation: usize,

    /// The index of the first server to ask.
    offset: usize,

    /// The number of queries sent to the current servers.
    tries: usize,

    /// The ID of the current query.
    qid: u16,

    /// The wire format of the current query.
    query: Vec<u8>,

    /// A failure answer to return if no server answers properly.
    fallback: Option<Packet>,

    /// The last NXDOMAIN answer.
    last: Option<Packet>,

    referrals: usize,
    no_servers: bool,
}

impl Job {
    fn new(question: Question, search: SearchIter, rotation: usize) -> Self {
        Job {
            question,
            search,
            lookup: 0,
            servers: Vec::new(),
            rotation,
            offset: 0,
            tries: 0,
            qid: 0,
            query: Vec::new(),
            fallback: None,
            last: None,
            referrals: 0,
            no_servers: false,
        }
    }

    /// Starts over with a new search candidate.
    fn restart(&mut self, qname: Name) {
        self.question = Question::new(
            qname,
            self.question.qtype(),
            self.question.qclass(),
        );
        self.lookup = 0;
        self.servers.clear();
        self.fallback = None;
        self.referrals = 0;
    }

    /// Starts over with a new set of servers.
    fn reset_servers(&mut self, options: &ResolvOptions) {
        self.tries = 0;
        self.fallback = None;
        self.offset = if options.rotate && !self.servers.is_empty() {
            self.rotation % self.servers.len()
        } else {
            0
        };
    }

    /// Finishes after all candidates have been tried.
    fn finish(&mut self) -> Result<Step, Error> {
        match self.last.take() {
            Some(answer) => Ok(Step::Done(answer)),
            None if self.no_servers => Err(Error::NoServers),
            None => Err(Error::NoAnswer),
        }
    }
}

//------------ Transport -----------------------------------------------------

enum Transport<C: Connect> {
    None,
    Udp {
        sock: C::Dgram,
        server: SocketAddr,
    },
    Tcp {
        sock: C::Stream,
        server: SocketAddr,
        stream: StreamState,
    },
}

impl<C: Connect> Transport<C> {
    fn protocol(&self) -> Option<Protocol> {
        match *self {
            Transport::None => None,
            Transport::Udp { .. } => Some(Protocol::Udp),
            Transport::Tcp { .. } => Some(Protocol::Tcp),
        }
    }
}

/// Receives the next datagram from `server`.
///
/// Datagrams from other addresses are dropped.
fn recv_dgram<D: DgramSocket>(
    sock: &D,
    server: SocketAddr,
    stats: &mut Stats,
) -> Result<Option<Vec<u8>>, Error> {
    let mut buf = vec![0; MAX_MESSAGE_SIZE];
    loop {
        let (len, from) = match sock.recv_from(&mut buf) {
            Ok(res) => res,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                return Ok(None)
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        trace!("received {} octets from {} via UDP", len, from);
        stats.received(Protocol::Udp, len);
        if from != server {
            warn!("discarding datagram from unexpected source {}", from);
            continue;
        }
        buf.truncate(len);
        return Ok(Some(buf));
    }
}

//------------ StreamState ---------------------------------------------------

/// The progress of a query over a stream.
struct StreamState {
    connected: bool,

    /// The query with its length prefix.
    output: Vec<u8>,

    written: usize,

    /// What has been received so far.
    input: Vec<u8>,
}

impl StreamState {
    fn new(query: &[u8]) -> Self {
        let mut output = Vec::with_capacity(query.len() + 2);
        // Queries are at most QBUFSIZ long.
        output.extend_from_slice(&(query.len() as u16).to_be_bytes());
        output.extend_from_slice(query);
        StreamState {
            connected: false,
            output,
            written: 0,
            input: Vec::new(),
        }
    }

    fn events(&self) -> Events {
        if !self.connected || self.written < self.output.len() {
            Events::WRITE
        } else {
            Events::READ
        }
    }

    /// Writes and reads as much as possible.
    ///
    /// Returns the response once it is complete.
    fn progress<S: StreamSocket>(
        &mut self,
        sock: &mut S,
        stats: &mut Stats,
    ) -> Result<Option<Vec<u8>>, Error> {
        if !self.connected {
            if !sock.is_connected()? {
                return Ok(None);
            }
            self.connected = true;
        }
        while self.written < self.output.len() {
            match sock.write(&self.output[self.written..]) {
                Ok(0) => {
                    return Err(io::Error::from(io::ErrorKind::WriteZero).into())
                }
                Ok(len) => self.written += len,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(None)
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
            if self.written == self.output.len() {
                trace!("sent {} octets via TCP", self.written);
                stats.sent(Protocol::Tcp, self.written);
            }
        }
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(message) = self.take_message() {
                trace!("received {} octets via TCP", message.len());
                stats.received(Protocol::Tcp, message.len() + 2);
                return Ok(Some(message));
            }
            match sock.read(&mut chunk) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed by server",
                    )
                    .into())
                }
                Ok(len) => self.input.extend_from_slice(&chunk[..len]),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(None)
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn take_message(&mut self) -> Option<Vec<u8>> {
        let len = match self.input.get(..2) {
            Some(prefix) => {
                usize::from(u16::from_be_bytes([prefix[0], prefix[1]]))
            }
            None => return None,
        };
        if self.input.len() < len + 2 {
            return None;
        }
        let message = self.input[2..len + 2].to_vec();
        self.input.drain(..len + 2);
        Some(message)
    }
}

//------------ Helpers -------------------------------------------------------

/// Creates the query message.
fn build_query(
    question: &Question,
    qid: u16,
    options: &ResolvOptions,
) -> Result<Packet, PacketError> {
    let mut query = Packet::query(question)?;
    let mut header = query.header();
    header.set_id(qid);
    header.set_rd(!options.recurse);
    query.set_header(header);
    if options.edns0 {
        query.push_record(
            Section::Additional,
            &Opt::new(EDNS_PAYLOAD_SIZE).into_record(),
        )?;
    }
    Ok(query)
}

/// Returns the glue addresses of a referral.
///
/// An answer is a referral if it has no answers, no SOA record, and NS
/// records in the authority section. Returns `None` if the answer isn't a
/// referral or has no usable glue.
fn referral(answer: &Packet) -> Result<Option<Vec<SocketAddr>>, PacketError> {
    if answer.counts().ancount() != 0 {
        return Ok(None);
    }
    let mut targets = Vec::new();
    for record in answer.section(Section::Authority)? {
        match record?.data() {
            Some(RecordData::Ns(ns)) => targets.push(ns.nsdname().clone()),
            Some(RecordData::Soa(_)) => return Ok(None),
            _ => {}
        }
    }
    if targets.is_empty() {
        return Ok(None);
    }
    let mut servers = Vec::new();
    let additional = RecordFilter::new().section(Section::Additional);
    for record in answer.records(additional)? {
        let record = record?;
        if !targets.contains(record.owner()) {
            continue;
        }
        if let Some(addr) = record.addr() {
            servers.push(SocketAddr::new(addr, super::addr::DNS_PORT));
        }
    }
    Ok(if servers.is_empty() { None } else { Some(servers) })
}

//------------ Error ---------------------------------------------------------

/// A query could not be answered.
#[derive(Clone, Debug)]
pub enum Error {
    /// A query is already outstanding.
    AlreadyInProgress,

    /// No server answered within the configured attempts.
    ResolutionTimeout,

    /// A socket failed.
    Transport(Arc<io::Error>),

    /// A message could not be created or parsed.
    Packet(PacketError),

    /// There are no servers to ask.
    NoServers,

    /// None of the lookup sources had an answer.
    NoAnswer,

    /// The query is still in progress.
    Pending,

    /// There is no query.
    Idle,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Transport(Arc::new(err))
    }
}

impl From<PacketError> for Error {
    fn from(err: PacketError) -> Self {
        Error::Packet(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::AlreadyInProgress => f.write_str("query already in progress"),
            Error::ResolutionTimeout => f.write_str("resolution timed out"),
            Error::Transport(ref err) => write!(f, "transport error: {}", err),
            Error::Packet(ref err) => err.fmt(f),
            Error::NoServers => f.write_str("no servers available"),
            Error::NoAnswer => f.write_str("no answer"),
            Error::Pending => f.write_str("query in progress"),
            Error::Idle => f.write_str("no query"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Transport(ref err) => Some(err.as_ref()),
            Error::Packet(ref err) => Some(err),
            _ => None,
        }
    }
}

//------------ OpenError -----------------------------------------------------

/// A resolver could not be created.
#[derive(Debug)]
pub enum OpenError {
    Conf(conf::Error),
    Hosts(hosts::Error),
}

impl From<conf::Error> for OpenError {
    fn from(err: conf::Error) -> Self {
        OpenError::Conf(err)
    }
}

impl From<hosts::Error> for OpenError {
    fn from(err: hosts::Error) -> Self {
        OpenError::Hosts(err)
    }
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            OpenError::Conf(ref err) => write!(f, "resolv.conf: {}", err),
            OpenError::Hosts(ref err) => write!(f, "hosts: {}", err),
        }
    }
}

impl std::error::Error for OpenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            OpenError::Conf(ref err) => Some(err),
            OpenError::Hosts(ref err) => Some(err),
        }
    }
}

//============ Testing =======================================================
