//! Commands understood by the HAProxy stats socket.

use crate::common::{Params, Result};
use crate::error::HaproxyError;
use std::fmt;
use std::str::FromStr;

/// Every administrative operation the client can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Info,
    EnableServer,
    DisableServer,
    GetWeight,
    SetWeight,
    ListServers,
    ShowFrontends,
    ShowBackends,
    ShowSessions,
}

/// A parameter a command may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Backend,
    Server,
    Weight,
}

impl Param {
    pub fn name(self) -> &'static str {
        match self {
            Param::Backend => "backend",
            Param::Server => "server",
            Param::Weight => "weight",
        }
    }
}

const NONE: &[Param] = &[];
const BACKEND: &[Param] = &[Param::Backend];
const BACKEND_SERVER: &[Param] = &[Param::Backend, Param::Server];
const BACKEND_SERVER_WEIGHT: &[Param] = &[Param::Backend, Param::Server, Param::Weight];

impl CommandKind {
    /// Catalog order, as shown by `--list-commands`.
    pub const ALL: [CommandKind; 9] = [
        CommandKind::Info,
        CommandKind::ListServers,
        CommandKind::ShowFrontends,
        CommandKind::ShowBackends,
        CommandKind::ShowSessions,
        CommandKind::EnableServer,
        CommandKind::DisableServer,
        CommandKind::GetWeight,
        CommandKind::SetWeight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Info => "info",
            CommandKind::EnableServer => "enable",
            CommandKind::DisableServer => "disable",
            CommandKind::GetWeight => "get-weight",
            CommandKind::SetWeight => "set-weight",
            CommandKind::ListServers => "list-servers",
            CommandKind::ShowFrontends => "frontends",
            CommandKind::ShowBackends => "backends",
            CommandKind::ShowSessions => "sessions",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            CommandKind::Info => "Show process information and global counters",
            CommandKind::EnableServer => "Put a server back into rotation (--backend, --server)",
            CommandKind::DisableServer => {
                "Take a server out of rotation for maintenance (--backend, --server)"
            }
            CommandKind::GetWeight => {
                "Show the current and initial weight of a server (--backend, --server)"
            }
            CommandKind::SetWeight => {
                "Change the weight of a server, absolute or as a percentage (--backend, --server, --weight)"
            }
            CommandKind::ListServers => "Show the state of every server in a backend (--backend)",
            CommandKind::ShowFrontends => "Show statistics for all frontends",
            CommandKind::ShowBackends => "List the names of all backends",
            CommandKind::ShowSessions => "Dump all known sessions",
        }
    }

    pub fn required(self) -> &'static [Param] {
        match self {
            CommandKind::Info
            | CommandKind::ShowFrontends
            | CommandKind::ShowBackends
            | CommandKind::ShowSessions => NONE,
            CommandKind::ListServers => BACKEND,
            CommandKind::EnableServer | CommandKind::DisableServer | CommandKind::GetWeight => {
                BACKEND_SERVER
            }
            CommandKind::SetWeight => BACKEND_SERVER_WEIGHT,
        }
    }
}

impl FromStr for CommandKind {
    type Err = HaproxyError;

    fn from_str(s: &str) -> Result<Self> {
        CommandKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| HaproxyError::UnknownCommand { name: s.to_string() })
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every known command name paired with its help text.
pub fn catalog() -> impl Iterator<Item = (&'static str, &'static str)> {
    CommandKind::ALL.iter().map(|kind| (kind.name(), kind.help()))
}

/// Server weight as accepted by `set weight`.
///
/// Either an absolute value between 0 and 256, or a percentage of the weight
/// the server was configured with. The text is kept as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weight(String);

const MAX_WEIGHT: u32 = 256;

impl Weight {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_relative(&self) -> bool {
        self.0.ends_with('%')
    }
}

impl FromStr for Weight {
    type Err = HaproxyError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || HaproxyError::InvalidWeight {
            value: s.to_string(),
        };
        let (digits, relative) = match s.strip_suffix('%') {
            Some(digits) => (digits, true),
            None => (s, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: u32 = digits.parse().map_err(|_| invalid())?;
        if !relative && value > MAX_WEIGHT {
            return Err(invalid());
        }
        Ok(Weight(s.to_string()))
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully validated command, ready to be written to the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Info,
    EnableServer { backend: String, server: String },
    DisableServer { backend: String, server: String },
    GetWeight { backend: String, server: String },
    SetWeight {
        backend: String,
        server: String,
        weight: Weight,
    },
    ListServers { backend: String },
    ShowFrontends,
    ShowBackends,
    ShowSessions,
}

impl Command {
    /// Builds a command of the given kind, failing if a required parameter
    /// is absent or empty. Parameters the kind does not use are ignored.
    pub fn construct(kind: CommandKind, params: &Params) -> Result<Command> {
        let missing = |param: Param| HaproxyError::MissingParameter {
            command: kind.name(),
            parameter: param.name(),
        };
        for &param in kind.required() {
            let value = match param {
                Param::Backend => &params.backend,
                Param::Server => &params.server,
                Param::Weight => &params.weight,
            };
            if value.as_deref().map_or(true, str::is_empty) {
                return Err(missing(param));
            }
        }

        let backend = || params.backend.clone().unwrap_or_default();
        let server = || params.server.clone().unwrap_or_default();

        Ok(match kind {
            CommandKind::Info => Command::Info,
            CommandKind::EnableServer => Command::EnableServer {
                backend: backend(),
                server: server(),
            },
            CommandKind::DisableServer => Command::DisableServer {
                backend: backend(),
                server: server(),
            },
            CommandKind::GetWeight => Command::GetWeight {
                backend: backend(),
                server: server(),
            },
            CommandKind::SetWeight => Command::SetWeight {
                backend: backend(),
                server: server(),
                weight: params.weight.as_deref().unwrap_or_default().parse()?,
            },
            CommandKind::ListServers => Command::ListServers { backend: backend() },
            CommandKind::ShowFrontends => Command::ShowFrontends,
            CommandKind::ShowBackends => Command::ShowBackends,
            CommandKind::ShowSessions => Command::ShowSessions,
        })
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Info => CommandKind::Info,
            Command::EnableServer { .. } => CommandKind::EnableServer,
            Command::DisableServer { .. } => CommandKind::DisableServer,
            Command::GetWeight { .. } => CommandKind::GetWeight,
            Command::SetWeight { .. } => CommandKind::SetWeight,
            Command::ListServers { .. } => CommandKind::ListServers,
            Command::ShowFrontends => CommandKind::ShowFrontends,
            Command::ShowBackends => CommandKind::ShowBackends,
            Command::ShowSessions => CommandKind::ShowSessions,
        }
    }

    pub fn help(&self) -> &'static str {
        self.kind().help()
    }

    /// The exact request line, including the terminating newline.
    pub fn render(&self) -> String {
        format!("{}\n", self)
    }
}

/// Writes the request without its line terminator.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Info => f.write_str("show info"),
            Command::EnableServer { backend, server } => {
                write!(f, "enable server {}/{}", backend, server)
            }
            Command::DisableServer { backend, server } => {
                write!(f, "disable server {}/{}", backend, server)
            }
            Command::GetWeight { backend, server } => {
                write!(f, "get weight {}/{}", backend, server)
            }
            Command::SetWeight {
                backend,
                server,
                weight,
            } => write!(f, "set weight {}/{} {}", backend, server, weight),
            Command::ListServers { backend } => write!(f, "show servers state {}", backend),
            // iid -1 (all proxies), type mask 1 (frontends), sid -1 (all)
            Command::ShowFrontends => f.write_str("show stat -1 1 -1"),
            Command::ShowBackends => f.write_str("show backend"),
            Command::ShowSessions => f.write_str("show sess"),
        }
    }
}
