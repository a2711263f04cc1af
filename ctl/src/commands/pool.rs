use std::path::PathBuf;

use clap::Parser;
use keystone_auth::{Authority, MarshalOptions};

use super::read_input;

#[derive(Clone, Parser)]
pub struct PoolParams {
    /// JSON encoded certificate authorities.
    #[clap(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn pool(authority: &Authority, PoolParams { files }: PoolParams) -> anyhow::Result<()> {
    let cas = files
        .iter()
        .map(|file| {
            let bytes = read_input(file)?;
            Ok(authority.unmarshal_cert_authority(&bytes, &MarshalOptions::default())?)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let pool = authority.cert_pool_from_cert_authorities(&cas)?;
    let store = pool.to_root_store()?;

    println!("{} trusted certificates ({} trust anchors)", pool.len(), store.len());
    for cert in pool.certificates() {
        let not_after = cert
            .not_after()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unknown".into());
        println!("  {} (expires {not_after})", cert.subject());
    }

    Ok(())
}
