mod args;
mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::component::ComponentArgs;
use commands::fip::FipArgs;
use commands::stack::StackArgs;
use commands::trust::TrustArgs;
use commands::volume::VolumeUploadArgs;
use stackflow_core::Outcome;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackflow")]
#[command(version, about = "Idempotent cloud resource adapters", long_about = None)]
struct Cli {
    /// Report what would change without mutating anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, update or delete a Keycloak component
    KeycloakComponent(ComponentArgs),
    /// Find (or allocate) a floating IP
    FindFip(FipArgs),
    /// Detach a floating IP from its port
    FreeFip(FipArgs),
    /// Create a Keystone trust for the current user and project
    Trust(TrustArgs),
    /// Read the outputs of a Heat stack
    StackOutputs(StackArgs),
    /// Upload a Cinder volume to a new Glance image
    VolumeUpload(VolumeUploadArgs),
}

async fn run(cli: &Cli) -> stackflow_core::Result<Outcome> {
    let dry_run = cli.dry_run;
    match &cli.command {
        Commands::KeycloakComponent(args) => commands::component::handle(args, dry_run).await,
        Commands::FindFip(args) => commands::fip::handle_find(args, dry_run).await,
        Commands::FreeFip(args) => commands::fip::handle_free(args, dry_run).await,
        Commands::Trust(args) => commands::trust::handle(args, dry_run).await,
        Commands::StackOutputs(args) => commands::stack::handle(args).await,
        Commands::VolumeUpload(args) => commands::volume::handle(args, dry_run).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the JSON result, logs go to stderr
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    // RUST_LOG, when set, replaces the default level
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let outcome = Outcome::from_result(run(&cli).await);
    println!("{}", serde_json::to_string(&outcome)?);

    if outcome.failed {
        if let Some(msg) = &outcome.msg {
            eprintln!("{} {}", "Error:".red().bold(), msg);
        }
        std::process::exit(outcome.exit_code());
    }
    Ok(())
}
