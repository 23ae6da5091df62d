use clap::Parser;
use haproxyctl::app::{self, Invocation, SocketConnector};
use haproxyctl::config::{self, Settings};
use haproxyctl::{logger, Params};
use std::io;
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser, Debug)]
#[clap(
    name = "haproxyctl",
    about = "Issue commands to HAProxy over its stats socket",
    version
)]
struct ApplicationArguments {
    #[clap(
        short,
        long,
        default_value = app::DEFAULT_COMMAND,
        help = "Command to run, see --list-commands"
    )]
    command: String,
    #[clap(
        short,
        long,
        help = "Socket address: unix://PATH, tcp://HOST:PORT or a plain socket path"
    )]
    socket: Option<String>,
    #[clap(short, long, help = "Backend the command applies to")]
    backend: Option<String>,
    #[clap(long, help = "Server within the backend")]
    server: Option<String>,
    #[clap(short, long, help = "New server weight, 0-256 or a percentage")]
    weight: Option<String>,
    #[clap(long, help = "Socket timeout in seconds")]
    timeout: Option<u64>,
    #[clap(
        long,
        value_name = "PATH",
        help = "Read this file instead of the user configuration file"
    )]
    config: Option<PathBuf>,
    #[clap(short, long, help = "Log connection details to stderr")]
    verbose: bool,
    #[clap(long, help = "List every available command and exit")]
    list_commands: bool,
    #[clap(long, help = "Describe the selected command and exit")]
    help_command: bool,
}

impl ApplicationArguments {
    /// The command line as the last configuration layer.
    fn settings(&self) -> Settings {
        Settings {
            socket: self.socket.clone(),
            backend: self.backend.clone(),
            verbose: if self.verbose { Some(true) } else { None },
            timeout: self.timeout,
        }
    }

    fn config_paths(&self) -> Vec<PathBuf> {
        let mut paths = config::default_paths();
        if let Some(path) = &self.config {
            paths.truncate(1);
            paths.push(path.clone());
        }
        paths
    }
}

fn main() {
    let args = ApplicationArguments::parse();

    let settings = match Settings::layered(&args.config_paths()) {
        Ok(settings) => settings.merge(args.settings()),
        Err(err) => {
            eprintln!("{}", err);
            exit(app::ExitStatus::InvalidParameters.code());
        }
    };
    let logger = logger::init(settings.verbose());

    let invocation = Invocation {
        command: args.command.clone(),
        socket: settings.socket.clone(),
        params: Params {
            backend: settings.backend.clone(),
            server: args.server.clone(),
            weight: args.weight.clone(),
        },
        list_commands: args.list_commands,
        help_command: args.help_command,
        timeout: settings.timeout(),
    };

    let status = app::run(
        &invocation,
        &SocketConnector,
        &mut io::stdout(),
        &mut io::stderr(),
        &logger,
    );
    exit(status.code());
}
