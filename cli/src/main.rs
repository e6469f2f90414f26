use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod address;
mod keygen;
mod network;
mod tx;

#[derive(Parser)]
#[command(name = "wasm-trp-cli")]
#[command(about = "Resolve, sign and submit TRP transaction templates")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Address encoding and derivation
    Address {
        #[command(subcommand)]
        command: address::AddressCommand,
    },
    /// Generate an admin credential (user.sk / user.addr)
    Keygen(keygen::KeygenArgs),
    /// Resolve a template into an unsigned transaction
    Resolve(tx::ResolveArgs),
    /// Resolve, sign with the admin credential, and submit
    Execute(tx::ExecuteArgs),
    /// Check that the resolver is up
    Health(tx::ResolverArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Address { command } => address::handle_command(command),
        Commands::Keygen(args) => keygen::handle_command(args),
        Commands::Resolve(args) => tx::handle_resolve(args).await,
        Commands::Execute(args) => tx::handle_execute(args).await,
        Commands::Health(args) => tx::handle_health(args).await,
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
