use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use keystone_auth::{Authority, MarshalOptions, marshal_cert_authority};
use tracing::info;

#[derive(Clone, Parser)]
pub struct NewJwtParams {
    #[clap(short, long)]
    pub cluster_name: String,

    /// Write the authority here instead of stdout.
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

pub fn new_jwt(
    authority: &Authority,
    NewJwtParams {
        cluster_name,
        output,
    }: NewJwtParams,
) -> anyhow::Result<()> {
    let mut ca = authority.new_jwt_authority(&cluster_name)?;
    authority.validate(&mut ca)?;

    let bytes = marshal_cert_authority(&ca, &MarshalOptions::default())?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;
    let pretty = serde_json::to_string_pretty(&value)?;

    match output {
        Some(path) => {
            std::fs::write(&path, pretty)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), ca = %ca.id(), "wrote JWT certificate authority");
        }
        None => println!("{pretty}"),
    }

    Ok(())
}
