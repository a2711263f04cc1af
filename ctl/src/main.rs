use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keystone_auth::{Authority, AuthorityConfig};
use tracing_subscriber::EnvFilter;

use crate::commands::{NewJwtParams, PoolParams, RolesCommand, ValidateParams};

mod commands;

#[derive(Parser)]
#[command(version, about = "Inspect and generate keystone certificate authorities")]
pub struct Args {
    #[clap(subcommand)]
    command: Command,

    /// TOML file with authority settings.
    #[clap(short, long, env = "KEYSTONE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Clone, Subcommand)]
pub enum Command {
    /// Decode and validate a stored certificate authority.
    #[command(name = "validate")]
    Validate(ValidateParams),

    /// Generate a JWT signer certificate authority.
    #[command(name = "new-jwt")]
    NewJwt(NewJwtParams),

    /// Summarize the TLS trust pool built from certificate authorities.
    #[command(name = "pool")]
    Pool(PoolParams),

    /// Encode or decode the cert roles envelope.
    #[command(subcommand)]
    Roles(RolesCommand),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or("keystone_auth=info,keystonectl=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AuthorityConfig::from_file(path)?,
        None => AuthorityConfig::default(),
    };
    let authority = Authority::with_config(config);

    match args.command {
        Command::Validate(params) => commands::validate(&authority, params),
        Command::NewJwt(params) => commands::new_jwt(&authority, params),
        Command::Pool(params) => commands::pool(&authority, params),
        Command::Roles(command) => commands::roles(command),
    }
}
