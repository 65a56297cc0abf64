use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::dictionary::WordList;
use server::error::ServerError;
use server::network::{ChannelTransport, Server};
use server::session::Session;
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-player word guessing game server")]
struct Args {
    /// Dictionary file, one word per line
    dictionary: PathBuf,

    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Misses allowed per round
    #[arg(short = 'g', long, default_value_t = shared::MAX_GUESSES)]
    max_guesses: u32,

    /// Maximum concurrent connections
    #[arg(short = 'c', long, default_value = "64")]
    max_clients: usize,

    /// Longest accepted input line in bytes
    #[arg(long, default_value_t = shared::MAX_BUF)]
    max_line: usize,

    /// Longest accepted player name
    #[arg(long, default_value_t = shared::MAX_NAME)]
    max_name: usize,

    /// Messages queued per client before a non-reading client is dropped
    #[arg(long, default_value = "128")]
    outbox: usize,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            max_guesses: self.max_guesses,
            max_clients: self.max_clients,
            max_line_len: self.max_line,
            max_name_len: self.max_name,
            outbox_capacity: self.outbox,
            ..ServerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Usage errors exit with 1; --help and --version keep clap's behaviour
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), ServerError> {
    let config = args.server_config();
    config.validate()?;

    let words = WordList::load(&args.dictionary)?;
    let session = Session::new(config, Box::new(words), ChannelTransport::new());

    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, session).await?;

    // Handle shutdown gracefully
    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
