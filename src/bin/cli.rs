//! minikv CLI Client
//!
//! Command-line interface for interacting with minikv.

use clap::{Parser, Subcommand};
use minikv::protocol::Tlv;
use minikv::{Client, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// minikv CLI
#[derive(Parser, Debug)]
#[command(name = "minikv-cli")]
#[command(about = "CLI for the minikv key-value server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6380")]
    server: String,

    /// Socket timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,

        /// Print the stored bytes instead of decoding them as TLV
        #[arg(long)]
        raw: bool,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set (stored as a TLV string)
        value: String,

        /// Send the value bytes as-is instead of TLV-encoding them
        #[arg(long)]
        raw: bool,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("(error) {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut client = Client::connect(&args.server)?;
    client.set_timeouts(args.timeout_ms, args.timeout_ms)?;

    match args.command {
        Commands::Get { key, raw } => {
            let response = client.get(&key)?;
            if response.body.is_empty() {
                println!("(nil)");
            } else if raw {
                println!("{}", String::from_utf8_lossy(&response.body));
            } else {
                match Tlv::decode(&response.body) {
                    Ok(value) => println!("{}", value),
                    Err(_) => println!("{}", String::from_utf8_lossy(&response.body)),
                }
            }
        }
        Commands::Set { key, value, raw } => {
            let encoded = if raw {
                value.into_bytes().into()
            } else {
                Tlv::from(value.as_str()).encode()
            };
            let response = client.set(&key, encoded)?;
            println!("{}", String::from_utf8_lossy(&response.body));
        }
    }

    client.close()
}
