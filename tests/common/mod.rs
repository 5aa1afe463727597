//! Helpers shared by the integration tests.
#![allow(dead_code)]

use dns_engine::base::iana::Rcode;
use dns_engine::base::{Header, Packet, Record, Section};
use dns_engine::resolv::stub::net::{
    Connect, DgramSocket, RawDescriptor, StreamSocket,
};
use dns_engine::resolv::stub::Protocol;
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Setup logging of events reported by the resolver and the test suite.
///
/// Use the RUST_LOG environment variable to override the defaults, e.g.
/// `RUST_LOG=dns_engine=TRACE`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_thread_ids(true)
        .without_time()
        .try_init()
        .ok();
}

//------------ Building Answers ----------------------------------------------

/// Creates an answer to `query` with the given rcode and answer records.
pub fn answer(query: &Packet, rcode: Rcode, answers: &[Record]) -> Packet {
    AnswerBuilder::new(query).rcode(rcode).answers(answers).finish()
}

/// A builder for answers in all shapes.
pub struct AnswerBuilder {
    packet: Packet,
    header: Header,
    sections: Vec<(Section, Record)>,
}

impl AnswerBuilder {
    pub fn new(query: &Packet) -> Self {
        let mut packet = Packet::new(4096).unwrap();
        let question = query.question().unwrap();
        let mut header = Header::new();
        header.set_id(query.qid());
        header.set_qr(true);
        header.set_rd(query.header().rd());
        header.set_ra(true);
        packet
            .push(
                Section::Question,
                question.qname(),
                question.qtype(),
                question.qclass(),
            )
            .unwrap();
        AnswerBuilder {
            packet,
            header,
            sections: Vec::new(),
        }
    }

    pub fn rcode(mut self, rcode: Rcode) -> Self {
        self.header.set_rcode(rcode);
        self
    }

    pub fn id(mut self, id: u16) -> Self {
        self.header.set_id(id);
        self
    }

    pub fn tc(mut self) -> Self {
        self.header.set_tc(true);
        self
    }

    pub fn answers(self, records: &[Record]) -> Self {
        self.records(Section::Answer, records)
    }

    pub fn records(mut self, section: Section, records: &[Record]) -> Self {
        self.sections
            .extend(records.iter().map(|record| (section, record.clone())));
        self
    }

    pub fn finish(mut self) -> Packet {
        self.packet.set_header(self.header);
        self.sections.sort_by_key(|(section, _)| *section);
        for (section, record) in &self.sections {
            self.packet.push_record(*section, record).unwrap();
        }
        self.packet
    }
}

//------------ MockNet -------------------------------------------------------

/// A query that was sent through the mock network.
#[derive(Clone, Debug)]
pub struct Sent {
    pub protocol: Protocol,
    pub server: SocketAddr,
    pub wire: Vec<u8>,
}

impl Sent {
    pub fn packet(&self) -> Packet {
        Packet::from_bytes(&self.wire).unwrap()
    }
}

type Responder = Box<dyn Fn(&Sent) -> Vec<Vec<u8>> + Send>;

/// An in-memory network.
///
/// Every query sent is recorded and handed to the responder. Whatever the
/// responder returns is delivered to the socket the query was sent from.
#[derive(Clone)]
pub struct MockNet {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    sent: Vec<Sent>,
    responder: Responder,
    last_inbox: Option<Inbox>,
}

#[derive(Clone, Default)]
struct Inbox(Arc<Mutex<VecDeque<(Vec<u8>, SocketAddr)>>>);

impl MockNet {
    /// Creates a network where servers answer via `responder`.
    pub fn new(
        responder: impl Fn(&Sent) -> Vec<Packet> + Send + 'static,
    ) -> Self {
        let responder = move |sent: &Sent| {
            responder(sent)
                .into_iter()
                .map(|packet| packet.as_slice().to_vec())
                .collect()
        };
        Self::with_raw(responder)
    }

    /// Creates a network where servers answer with raw octets.
    pub fn with_raw(
        responder: impl Fn(&Sent) -> Vec<Vec<u8>> + Send + 'static,
    ) -> Self {
        MockNet {
            inner: Arc::new(Mutex::new(Inner {
                sent: Vec::new(),
                responder: Box::new(responder),
                last_inbox: None,
            })),
        }
    }

    /// Creates a network where nobody ever answers.
    pub fn silent() -> Self {
        Self::with_raw(|_| Vec::new())
    }

    /// Returns all queries sent so far.
    pub fn sent(&self) -> Vec<Sent> {
        self.inner.lock().unwrap().sent.clone()
    }

    /// Delivers a datagram to the most recently created datagram socket.
    pub fn inject(&self, message: &[u8], from: SocketAddr) {
        let inner = self.inner.lock().unwrap();
        let inbox = inner.last_inbox.as_ref().unwrap();
        inbox.0.lock().unwrap().push_back((message.into(), from));
    }

    fn send(&self, sent: Sent) -> Vec<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        let replies = (inner.responder)(&sent);
        inner.sent.push(sent);
        replies
    }
}

impl Connect for MockNet {
    type Dgram = MockDgram;
    type Stream = MockStream;

    fn bind_dgram(&self, _local: SocketAddr) -> io::Result<Self::Dgram> {
        let inbox = Inbox::default();
        self.inner.lock().unwrap().last_inbox = Some(inbox.clone());
        Ok(MockDgram {
            net: self.clone(),
            inbox,
        })
    }

    fn connect_stream(
        &self,
        _local: Option<SocketAddr>,
        remote: SocketAddr,
    ) -> io::Result<Self::Stream> {
        Ok(MockStream {
            net: self.clone(),
            server: remote,
            output: Vec::new(),
            input: VecDeque::new(),
        })
    }
}

//------------ MockDgram -----------------------------------------------------

pub struct MockDgram {
    net: MockNet,
    inbox: Inbox,
}

impl DgramSocket for MockDgram {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        let replies = self.net.send(Sent {
            protocol: Protocol::Udp,
            server: addr,
            wire: buf.into(),
        });
        let mut inbox = self.inbox.0.lock().unwrap();
        inbox.extend(replies.into_iter().map(|reply| (reply, addr)));
        Ok(buf.len())
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let (message, from) = self
            .inbox
            .0
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::WouldBlock))?;
        let len = message.len().min(buf.len());
        buf[..len].copy_from_slice(&message[..len]);
        Ok((len, from))
    }

    fn descriptor(&self) -> Option<RawDescriptor> {
        None
    }
}

//------------ MockStream ----------------------------------------------------

pub struct MockStream {
    net: MockNet,
    server: SocketAddr,
    output: Vec<u8>,
    input: VecDeque<u8>,
}

impl io::Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.extend_from_slice(buf);
        if self.output.len() >= 2 {
            let len = usize::from(u16::from_be_bytes([
                self.output[0],
                self.output[1],
            ]));
            if self.output.len() >= len + 2 {
                let wire: Vec<u8> =
                    self.output.drain(..len + 2).skip(2).collect();
                let replies = self.net.send(Sent {
                    protocol: Protocol::Tcp,
                    server: self.server,
                    wire,
                });
                for reply in replies {
                    self.input
                        .extend((reply.len() as u16).to_be_bytes().iter());
                    self.input.extend(reply.iter());
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.input.is_empty() {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let mut len = 0;
        while len < buf.len() {
            match self.input.pop_front() {
                Some(octet) => {
                    buf[len] = octet;
                    len += 1;
                }
                None => break,
            }
        }
        Ok(len)
    }
}

impl StreamSocket for MockStream {
    fn is_connected(&self) -> io::Result<bool> {
        Ok(true)
    }

    fn descriptor(&self) -> Option<RawDescriptor> {
        None
    }
}
