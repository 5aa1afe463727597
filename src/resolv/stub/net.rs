//! The transport seam of the resolver.
//!
//! The resolver doesn't create sockets itself but asks a [`Connect`]
//! implementation for them. All sockets must be non-blocking: operations
//! that cannot complete right away fail with
//! [`io::ErrorKind::WouldBlock`]. [`SystemConnect`] provides real sockets.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpStream, UdpSocket};

/// How many times we try a new random port if we get ‘address in use.’
pub const RETRY_RANDOM_PORT: usize = 10;

//------------ RawDescriptor -------------------------------------------------

/// The operating system handle of a socket, for use with `poll(2)` and
/// friends.
#[cfg(unix)]
pub type RawDescriptor = std::os::unix::io::RawFd;

/// The operating system handle of a socket.
#[cfg(windows)]
pub type RawDescriptor = std::os::windows::io::RawSocket;

/// The operating system handle of a socket.
#[cfg(not(any(unix, windows)))]
pub type RawDescriptor = i32;

//------------ Connect -------------------------------------------------------

/// A factory for sockets.
pub trait Connect {
    /// The type of a datagram socket.
    type Dgram: DgramSocket;

    /// The type of a stream socket.
    type Stream: StreamSocket;

    /// Creates a datagram socket bound to a local address.
    fn bind_dgram(&self, local: SocketAddr) -> io::Result<Self::Dgram>;

    /// Starts connecting a stream socket to a remote address.
    ///
    /// The connection need not be established when this returns.
    fn connect_stream(
        &self,
        local: Option<SocketAddr>,
        remote: SocketAddr,
    ) -> io::Result<Self::Stream>;
}

//------------ DgramSocket ---------------------------------------------------

/// A non-blocking datagram socket.
pub trait DgramSocket {
    /// Sends a datagram to `addr`.
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;

    /// Receives a datagram and returns its length and sender.
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// Returns the handle for readiness polling if there is one.
    fn descriptor(&self) -> Option<RawDescriptor>;
}

//------------ StreamSocket --------------------------------------------------

/// A non-blocking stream socket.
pub trait StreamSocket: io::Read + io::Write {
    /// Returns whether the connection has been established.
    ///
    /// Returns an error if establishing it failed.
    fn is_connected(&self) -> io::Result<bool>;

    /// Returns the handle for readiness polling if there is one.
    fn descriptor(&self) -> Option<RawDescriptor>;
}

//------------ SystemConnect -------------------------------------------------

/// Creates the operating system's sockets.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemConnect;

impl Connect for SystemConnect {
    type Dgram = UdpSocket;
    type Stream = TcpStream;

    fn bind_dgram(&self, local: SocketAddr) -> io::Result<Self::Dgram> {
        let sock = UdpSocket::bind(local)?;
        sock.set_nonblocking(true)?;
        Ok(sock)
    }

    fn connect_stream(
        &self,
        local: Option<SocketAddr>,
        remote: SocketAddr,
    ) -> io::Result<Self::Stream> {
        let sock = Socket::new(
            Domain::for_address(remote),
            Type::STREAM,
            Some(Protocol::TCP),
        )?;
        sock.set_nonblocking(true)?;
        if let Some(local) = local {
            sock.bind(&local.into())?;
        }
        match sock.connect(&remote.into()) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {}
            #[cfg(unix)]
            Err(err) if err.raw_os_error() == Some(libc::EINPROGRESS) => {}
            Err(err) => return Err(err),
        }
        Ok(sock.into())
    }
}

impl DgramSocket for UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf)
    }

    fn descriptor(&self) -> Option<RawDescriptor> {
        raw_descriptor(self)
    }
}

impl StreamSocket for TcpStream {
    fn is_connected(&self) -> io::Result<bool> {
        if let Some(err) = self.take_error()? {
            return Err(err);
        }
        match self.peer_addr() {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn descriptor(&self) -> Option<RawDescriptor> {
        raw_descriptor(self)
    }
}

#[cfg(unix)]
fn raw_descriptor(sock: &impl std::os::unix::io::AsRawFd) -> Option<RawDescriptor> {
    Some(sock.as_raw_fd())
}

#[cfg(windows)]
fn raw_descriptor(
    sock: &impl std::os::windows::io::AsRawSocket,
) -> Option<RawDescriptor> {
    Some(sock.as_raw_socket())
}

#[cfg(not(any(unix, windows)))]
fn raw_descriptor<T>(_sock: &T) -> Option<RawDescriptor> {
    None
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn dgram_loopback() {
        let connect = SystemConnect;
        let local = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
        let a = connect.bind_dgram(local).unwrap();
        let b = connect.bind_dgram(local).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(
            DgramSocket::recv_from(&a, &mut buf).unwrap_err().kind(),
            io::ErrorKind::WouldBlock
        );
        DgramSocket::send_to(&b, b"ping", a.local_addr().unwrap()).unwrap();
        let mut received = None;
        for _ in 0..100 {
            match DgramSocket::recv_from(&a, &mut buf) {
                Ok(res) => {
                    received = Some(res);
                    break;
                }
                Err(_) => std::thread::sleep(std::time::Duration::from_millis(10)),
            }
        }
        let (len, from) = received.unwrap();
        assert_eq!(&buf[..len], b"ping");
        assert_eq!(from, b.local_addr().unwrap());
        assert!(a.descriptor().is_some() || cfg!(not(any(unix, windows))));
    }
}
