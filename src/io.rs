//! Doing network IO and printing to the terminal.
use crate::{
    dns_types::RecordType,
    error::ResolveError,
    message::{record::Record, Response},
};
use std::{
    io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
    time::Duration,
};

/// Name servers listen here.
pub const DNS_PORT: u16 = 53;

/// Replies can be bigger than what we're allowed to send.
const MAX_RECEIVE_BYTES: usize = 1024;

/// Sends datagrams to name servers and waits for whatever comes back.
/// A receive that runs out of time fails with `ErrorKind::TimedOut` or `ErrorKind::WouldBlock`.
pub trait Transport {
    fn send(&mut self, server: IpAddr, msg: &[u8]) -> io::Result<()>;
    fn recv(&mut self, timeout: Duration) -> io::Result<Vec<u8>>;
}

pub fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

/// One UDP socket, used for every query of a lookup.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Binds an ephemeral port of the same address family as `server`.
    pub fn bind_for(server: IpAddr) -> io::Result<Self> {
        let local_addr = match server {
            IpAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            IpAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let socket = UdpSocket::bind(local_addr)?;
        tracing::debug!(local = %socket.local_addr()?, "bound UDP socket");
        Ok(Self { socket })
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, server: IpAddr, msg: &[u8]) -> io::Result<()> {
        let bytes_sent = self.socket.send_to(msg, (server, DNS_PORT))?;
        if bytes_sent != msg.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("only sent {bytes_sent} of {} bytes", msg.len()),
            ));
        }
        Ok(())
    }

    fn recv(&mut self, timeout: Duration) -> io::Result<Vec<u8>> {
        // A zero timeout means "block forever" to the socket.
        if timeout.is_zero() {
            return Err(io::ErrorKind::TimedOut.into());
        }
        self.socket.set_read_timeout(Some(timeout))?;
        // Note, you have to actually allocate space to write into.
        // Receiving into an empty vector instantly succeeds by writing nothing.
        let mut response_buf = vec![0; MAX_RECEIVE_BYTES];
        let (received, from) = self.socket.recv_from(&mut response_buf)?;
        tracing::trace!(%from, received, "datagram received");
        response_buf.truncate(received);
        Ok(response_buf)
    }
}

/// The trace line written before each query is sent.
pub fn print_query(id: u16, name: &str, record_type: RecordType, server: IpAddr) {
    println!("\n\nQuery ID     {id} {name}  {record_type} --> {server}");
}

/// The trace dump of an accepted response.
pub fn print_response(response: &Response) {
    println!("{response}");
}

/// Formats the result of a lookup: one line per answer, or a single line with
/// the error's code. Answers arrive already filtered to the requested type.
pub fn outcome_lines(fqdn: &str, outcome: &Result<Vec<Record>, ResolveError>) -> Vec<String> {
    let answers = match outcome {
        Ok(answers) => answers
            .iter()
            .map(|r| format!("{fqdn} {}   {} {}", r.ttl, r.record_type, r.data))
            .collect(),
        Err(_) => Vec::new(),
    };
    if !answers.is_empty() {
        return answers;
    }
    let code = match outcome {
        Err(e) => e.code(),
        Ok(_) => ResolveError::NoAnswer.code(),
    };
    vec![format!("{fqdn} {code}   A 0.0.0.0")]
}

pub fn print_outcome(fqdn: &str, outcome: &Result<Vec<Record>, ResolveError>) {
    for line in outcome_lines(fqdn, outcome) {
        println!("{line}");
    }
}
