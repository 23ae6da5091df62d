use crate::client::{Address, Connection};
use crate::common::{Params, Result};
use crate::error::HaproxyError;
use crate::protocol::{catalog, Command, CommandKind};
use slog::{debug, Logger};
use std::io::Write;
use std::time::Duration;

pub const DEFAULT_COMMAND: &str = "info";

/// Process exit status of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    InvalidParameters,
    Listed,
    NoSocket,
    ConnectionFailed,
    UnknownCommand,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::InvalidParameters => 1,
            ExitStatus::Listed => 2,
            ExitStatus::NoSocket => 3,
            ExitStatus::ConnectionFailed => 4,
            ExitStatus::UnknownCommand => 5,
        }
    }
}

/// Merged option values for a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: String,
    pub socket: Option<String>,
    pub params: Params,
    pub list_commands: bool,
    pub help_command: bool,
    pub timeout: Option<Duration>,
}

impl Default for Invocation {
    fn default() -> Self {
        Invocation {
            command: DEFAULT_COMMAND.to_string(),
            socket: None,
            params: Params::default(),
            list_commands: false,
            help_command: false,
            timeout: None,
        }
    }
}

/// Opens connections for `run`.
pub trait Connector {
    fn connect(
        &self,
        address: &Address,
        timeout: Option<Duration>,
        logger: &Logger,
    ) -> Result<Connection>;
}

/// Connects to real sockets.
#[derive(Debug, Default, Clone, Copy)]
pub struct SocketConnector;

impl Connector for SocketConnector {
    fn connect(
        &self,
        address: &Address,
        timeout: Option<Duration>,
        logger: &Logger,
    ) -> Result<Connection> {
        Connection::open_with(address, timeout, logger)
    }
}

/// Carries out one invocation, writing replies and listings to `out` and
/// messages to `err`.
pub fn run<O: Write, E: Write>(
    invocation: &Invocation,
    connector: &dyn Connector,
    out: &mut O,
    err: &mut E,
    logger: &Logger,
) -> ExitStatus {
    let result = execute(invocation, connector, out, logger);
    let _ = out.flush();
    match result {
        Ok(status) => status,
        Err(e) => {
            debug!(logger, "Invocation failed"; "error" => ?e);
            let _ = writeln!(err, "{}", e);
            status_of(&e)
        }
    }
}

fn status_of(e: &HaproxyError) -> ExitStatus {
    match e {
        HaproxyError::UnknownCommand { .. } => ExitStatus::UnknownCommand,
        HaproxyError::NoSocket => ExitStatus::NoSocket,
        e if e.is_connection() => ExitStatus::ConnectionFailed,
        _ => ExitStatus::InvalidParameters,
    }
}

fn execute<O: Write>(
    invocation: &Invocation,
    connector: &dyn Connector,
    out: &mut O,
    logger: &Logger,
) -> Result<ExitStatus> {
    let kind: CommandKind = invocation.command.parse()?;

    if invocation.list_commands {
        for (name, help) in catalog() {
            writeln!(out, "{:<14}{}", name, help)?;
        }
        return Ok(ExitStatus::Listed);
    }

    if invocation.help_command {
        writeln!(out, "{}: {}", kind, kind.help())?;
        return Ok(ExitStatus::Success);
    }

    let command = Command::construct(kind, &invocation.params)?;

    let address: Address = match invocation.socket.as_deref() {
        Some(socket) if !socket.is_empty() => socket.parse()?,
        _ => return Err(HaproxyError::NoSocket),
    };

    debug!(logger, "Issuing command"; "command" => %command);
    let reply = connector
        .connect(&address, invocation.timeout, logger)?
        .exchange(&command)?;
    out.write_all(reply.as_bytes())?;
    Ok(ExitStatus::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger;
    use std::cell::Cell;
    use std::io::{BufRead, BufReader};
    use std::os::unix::net::UnixListener;
    use std::thread;
    use tempfile::TempDir;

    /// Counts connection attempts and refuses all of them.
    #[derive(Default)]
    struct Refusing {
        attempts: Cell<usize>,
    }

    impl Connector for Refusing {
        fn connect(
            &self,
            address: &Address,
            _: Option<Duration>,
            _: &Logger,
        ) -> Result<Connection> {
            self.attempts.set(self.attempts.get() + 1);
            Err(HaproxyError::Connect {
                endpoint: address.endpoint(),
                cause: std::io::ErrorKind::ConnectionRefused.into(),
            })
        }
    }

    fn invoke(invocation: &Invocation, connector: &dyn Connector) -> (ExitStatus, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let status = run(invocation, connector, &mut out, &mut err, &logger::discard());
        (
            status,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn list_commands_never_connects() {
        let connector = Refusing::default();
        let invocation = Invocation {
            list_commands: true,
            socket: Some("/var/run/haproxy.sock".to_string()),
            ..Invocation::default()
        };
        let (status, out, _) = invoke(&invocation, &connector);

        assert_eq!(status, ExitStatus::Listed);
        assert_eq!(status.code(), 2);
        assert_eq!(connector.attempts.get(), 0);
        assert_eq!(out.lines().count(), CommandKind::ALL.len());
        for (name, help) in catalog() {
            assert!(!help.is_empty());
            assert!(out.contains(name), "{} missing from listing", name);
        }
    }

    #[test]
    fn unknown_command_never_connects() {
        let connector = Refusing::default();
        let invocation = Invocation {
            command: "bogus".to_string(),
            socket: Some("/var/run/haproxy.sock".to_string()),
            list_commands: true,
            ..Invocation::default()
        };
        let (status, out, err) = invoke(&invocation, &connector);

        assert_eq!(status.code(), 5);
        assert_eq!(connector.attempts.get(), 0);
        assert!(out.is_empty());
        assert!(err.contains("bogus"));
    }

    #[test]
    fn help_command_prints_only_that_command() {
        let connector = Refusing::default();
        let invocation = Invocation {
            command: "set-weight".to_string(),
            help_command: true,
            ..Invocation::default()
        };
        let (status, out, _) = invoke(&invocation, &connector);

        assert_eq!(status, ExitStatus::Success);
        assert_eq!(out, format!("set-weight: {}\n", CommandKind::SetWeight.help()));
        assert_eq!(connector.attempts.get(), 0);
    }

    #[test]
    fn validation_happens_before_connecting() {
        let connector = Refusing::default();
        let invocation = Invocation {
            command: "enable".to_string(),
            socket: Some("/var/run/haproxy.sock".to_string()),
            params: Params::new().backend("web"),
            ..Invocation::default()
        };
        let (status, _, err) = invoke(&invocation, &connector);

        assert_eq!(status, ExitStatus::InvalidParameters);
        assert_eq!(connector.attempts.get(), 0);
        assert_eq!(err, "Command 'enable' requires --server\n");
    }

    #[test]
    fn missing_socket() {
        let connector = Refusing::default();
        for socket in [None, Some(String::new())].iter() {
            let invocation = Invocation {
                socket: socket.clone(),
                ..Invocation::default()
            };
            let (status, _, err) = invoke(&invocation, &connector);
            assert_eq!(status.code(), 3);
            assert!(err.starts_with("No socket address given"));
        }
        assert_eq!(connector.attempts.get(), 0);
    }

    #[test]
    fn connection_failure() {
        let connector = Refusing::default();
        let invocation = Invocation {
            socket: Some("tcp://127.0.0.1:9999".to_string()),
            ..Invocation::default()
        };
        let (status, out, err) = invoke(&invocation, &connector);

        assert_eq!(status.code(), 4);
        assert_eq!(connector.attempts.get(), 1);
        assert!(out.is_empty());
        assert!(err.starts_with("Unable to connect to 127.0.0.1:9999"));
    }

    #[test]
    fn unparseable_address_is_a_connection_failure() {
        let connector = Refusing::default();
        let invocation = Invocation {
            socket: Some("tcp://localhost".to_string()),
            ..Invocation::default()
        };
        let (status, _, _) = invoke(&invocation, &connector);

        assert_eq!(status, ExitStatus::ConnectionFailed);
        assert_eq!(connector.attempts.get(), 0);
    }

    #[test]
    fn enable_against_echoing_peer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("haproxy.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let peer = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = String::new();
            BufReader::new(&stream).read_line(&mut request).unwrap();
            stream.write_all(format!("OK: {}", request).as_bytes()).unwrap();
            request
        });

        let invocation = Invocation {
            command: "enable".to_string(),
            socket: Some(path.display().to_string()),
            params: Params::new().backend("web").server("node1"),
            ..Invocation::default()
        };
        let (status, out, err) = invoke(&invocation, &SocketConnector);

        assert_eq!(status, ExitStatus::Success);
        assert_eq!(out, "OK: enable server web/node1\n");
        assert!(err.is_empty());
        assert_eq!(peer.join().unwrap(), "enable server web/node1\n");
    }
}
