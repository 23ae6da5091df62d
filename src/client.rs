use crate::common::Result;
use crate::error::HaproxyError;
use crate::logger;
use crate::protocol::Command;
use slog::{debug, o, Logger};
use std::fmt;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const UNIX_SCHEME: &str = "unix://";
const TCP_SCHEME: &str = "tcp://";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Unix,
    Tcp,
}

/// Where the stats socket lives.
///
/// `unix://<path>` and `tcp://<host>:<port>` pick the transport explicitly.
/// Anything else is taken as the path of a Unix socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Unix(PathBuf),
    Tcp { host: String, port: u16 },
}

impl Address {
    pub fn transport(&self) -> Transport {
        match self {
            Address::Unix(_) => Transport::Unix,
            Address::Tcp { .. } => Transport::Tcp,
        }
    }

    /// Socket path or `host:port`.
    pub fn endpoint(&self) -> String {
        match self {
            Address::Unix(path) => path.display().to_string(),
            Address::Tcp { host, port } if host.contains(':') => format!("[{}]:{}", host, port),
            Address::Tcp { host, port } => format!("{}:{}", host, port),
        }
    }
}

impl FromStr for Address {
    type Err = HaproxyError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason| HaproxyError::InvalidAddress {
            address: s.to_string(),
            reason,
        };

        if let Some(rest) = s.strip_prefix(TCP_SCHEME) {
            let (host, port) = rest.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
            let host = host
                .strip_prefix('[')
                .and_then(|h| h.strip_suffix(']'))
                .unwrap_or(host);
            if host.is_empty() {
                return Err(invalid("missing host"));
            }
            let port = port.parse().map_err(|_| invalid("invalid port"))?;
            return Ok(Address::Tcp {
                host: host.to_string(),
                port,
            });
        }

        let path = s.strip_prefix(UNIX_SCHEME).unwrap_or(s);
        if path.is_empty() {
            return Err(invalid("missing socket path"));
        }
        Ok(Address::Unix(PathBuf::from(path)))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Unix(_) => write!(f, "{}{}", UNIX_SCHEME, self.endpoint()),
            Address::Tcp { .. } => write!(f, "{}{}", TCP_SCHEME, self.endpoint()),
        }
    }
}

#[derive(Debug)]
enum Stream {
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl Stream {
    fn connect(address: &Address, timeout: Option<Duration>) -> io::Result<Stream> {
        let stream = match address {
            Address::Unix(path) => Stream::Unix(UnixStream::connect(path)?),
            Address::Tcp { host, port } => Stream::Tcp(connect_tcp(host, *port, timeout)?),
        };
        stream.set_timeout(timeout)?;
        Ok(stream)
    }

    fn set_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Stream::Unix(s) => {
                s.set_read_timeout(timeout)?;
                s.set_write_timeout(timeout)
            }
            Stream::Tcp(s) => {
                s.set_read_timeout(timeout)?;
                s.set_write_timeout(timeout)
            }
        }
    }
}

fn connect_tcp(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let timeout = match timeout {
        Some(timeout) => timeout,
        None => return TcpStream::connect((host, port)),
    };
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
    }))
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Unix(s) => s.read(buf),
            Stream::Tcp(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Unix(s) => s.write(buf),
            Stream::Tcp(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Unix(s) => s.flush(),
            Stream::Tcp(s) => s.flush(),
        }
    }
}

/// An open session with the stats socket.
///
/// HAProxy answers one command per connection and then closes it, so
/// `exchange` consumes the connection and the socket is dropped whether the
/// exchange succeeds or not. Open a new `Connection` for every command.
#[derive(Debug)]
pub struct Connection {
    address: Address,
    stream: Stream,
    logger: Logger,
}

impl Connection {
    /// Parses `address` and connects without a timeout.
    pub fn open(address: &str) -> Result<Connection> {
        Connection::open_with(&address.parse()?, None, &logger::discard())
    }

    /// A zero `timeout` is treated as no timeout.
    pub fn open_with(
        address: &Address,
        timeout: Option<Duration>,
        logger: &Logger,
    ) -> Result<Connection> {
        let logger = logger.new(o!("address" => address.to_string()));
        let timeout = timeout.filter(|t| !t.is_zero());
        debug!(logger, "Connecting"; "timeout" => ?timeout);

        let stream = Stream::connect(address, timeout).map_err(|cause| HaproxyError::Connect {
            endpoint: address.endpoint(),
            cause,
        })?;
        Ok(Connection {
            address: address.clone(),
            stream,
            logger,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn transport(&self) -> Transport {
        self.address.transport()
    }

    pub fn exchange(self, command: &Command) -> Result<String> {
        self.send(&command.render())
    }

    /// Writes `request` as is and reads until the peer closes the socket.
    ///
    /// The reply has no length prefix or terminator, end-of-stream is the
    /// only framing. Bytes that are not valid UTF-8 are replaced.
    pub fn send(mut self, request: &str) -> Result<String> {
        debug!(self.logger, "Sending request"; "request" => request.trim_end());
        self.stream
            .write_all(request.as_bytes())
            .and_then(|_| self.stream.flush())
            .map_err(HaproxyError::Exchange)?;

        let mut reply = Vec::new();
        self.stream
            .read_to_end(&mut reply)
            .map_err(HaproxyError::Exchange)?;
        debug!(self.logger, "Peer closed the connection"; "bytes" => reply.len());

        Ok(String::from_utf8_lossy(&reply).into_owned())
    }
}
