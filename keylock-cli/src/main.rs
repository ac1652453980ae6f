mod config;
mod exec;
mod handlers;
mod server;
mod transport;


use clap::{Parser, Subcommand};

use crate::config::ServeConfig;

#[derive(Parser)]
#[command(
    name = "keylock",
    about = "keylock — keyed mutual exclusion over websockets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the lock server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "KEYLOCK_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "KEYLOCK_HOST")]
        host: String,
    },

    /// Hold a lock while running a command: keylock exec --id KEY -- cmd args...
    Exec {
        /// Lock route of the server
        #[arg(long, default_value = "ws://127.0.0.1:8080/ws", env = "KEYLOCK_SERVER")]
        server: String,

        /// Resource key to lock
        #[arg(long)]
        id: String,

        /// Command to run while the lock is held
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => {
            let config = ServeConfig::new(host, port);
            if let Err(e) = server::run(&config).await {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
        Commands::Exec { server, id, command } => {
            match exec::run(&server, &id, &command).await {
                Ok(code) => std::process::exit(code),
                Err(e) => {
                    tracing::error!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Version => {
            println!("keylock {}", env!("CARGO_PKG_VERSION"));
            println!("Keyed mutual exclusion over websockets");
        }
    }
}
