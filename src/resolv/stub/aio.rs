//! Driving the resolver from a Tokio task.
//!
//! The resolver itself stays poll-driven. [`query`] registers the
//! resolver's current socket with the Tokio reactor for the events the
//! resolver asks for and waits for readiness or the resolver's timeout,
//! whichever comes first. Since each try may use a new socket, the
//! registration is renewed every round.

use super::{Error, Resolver, SystemClock, SystemConnect};
use crate::base::iana::{Class, Rtype};
use crate::base::packet::Packet;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::trace;

/// A borrowed descriptor for registration with the reactor.
struct Descriptor(RawFd);

impl AsRawFd for Descriptor {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

/// Resolves a question without blocking the runtime.
pub async fn query(
    resolver: &mut Resolver<SystemConnect, SystemClock>,
    qname: &str,
    qtype: Rtype,
    qclass: Class,
) -> Result<Packet, Error> {
    resolver.submit(qname, qtype, qclass)?;
    loop {
        match resolver.check() {
            Ok(()) => return resolver.fetch(),
            Err(Error::Pending) => {}
            Err(err) => return Err(err),
        }
        let timeout = resolver.timeout().unwrap_or_default();
        let fd = match resolver.pollfd() {
            Some(fd) => fd,
            None => {
                tokio::time::sleep(timeout.min(Duration::from_millis(10)))
                    .await;
                continue;
            }
        };
        let events = resolver.events();
        let interest = if events.is_writable() {
            Interest::WRITABLE
        } else {
            Interest::READABLE
        };
        let registration = AsyncFd::with_interest(Descriptor(fd), interest)?;
        let ready = async {
            if events.is_writable() {
                registration.writable().await.map(drop)
            } else {
                registration.readable().await.map(drop)
            }
        };
        match tokio::time::timeout(timeout, ready).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                resolver.close();
                return Err(err.into());
            }
            Err(_) => trace!("timeout of {:?} passed", timeout),
        }
    }
}
