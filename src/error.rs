use failure::Fail;
use std::io;

#[derive(Fail, Debug)]
pub enum HaproxyError {
    #[fail(display = "Command '{}' requires --{}", command, parameter)]
    MissingParameter {
        command: &'static str,
        parameter: &'static str,
    },
    #[fail(
        display = "Invalid weight '{}': expected 0-256 or a percentage such as 50%",
        value
    )]
    InvalidWeight { value: String },
    #[fail(display = "Unknown command '{}', see --list-commands", name)]
    UnknownCommand { name: String },
    #[fail(display = "No socket address given, use --socket or set socket in a configuration file")]
    NoSocket,
    #[fail(display = "Invalid socket address '{}': {}", address, reason)]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },
    #[fail(display = "Unable to connect to {}: {}", endpoint, cause)]
    Connect {
        endpoint: String,
        #[cause]
        cause: io::Error,
    },
    #[fail(display = "Socket exchange failed: {}", _0)]
    Exchange(#[cause] io::Error),
    #[fail(display = "Malformed configuration in {}: {}", path, cause)]
    Config {
        path: String,
        #[cause]
        cause: toml::de::Error,
    },
    #[fail(display = "Problem with IO {}", _0)]
    Io(#[cause] io::Error),
}

impl HaproxyError {
    /// The command was asked for without the parameters it needs.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            HaproxyError::MissingParameter { .. } | HaproxyError::InvalidWeight { .. }
        )
    }

    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            HaproxyError::InvalidAddress { .. }
                | HaproxyError::Connect { .. }
                | HaproxyError::Exchange(_)
        )
    }
}

impl From<io::Error> for HaproxyError {
    fn from(err: io::Error) -> Self {
        HaproxyError::Io(err)
    }
}
