use std::path::PathBuf;

use clap::Parser;
use keystone_auth::{Authority, MarshalOptions, get_tls_certs};
use tracing::info;

use super::read_input;

#[derive(Clone, Parser)]
pub struct ValidateParams {
    /// JSON encoded certificate authority, or `-` for stdin.
    pub file: PathBuf,
}

pub fn validate(authority: &Authority, ValidateParams { file }: ValidateParams) -> anyhow::Result<()> {
    let bytes = read_input(&file)?;
    let ca = authority.unmarshal_cert_authority(&bytes, &MarshalOptions::default())?;

    info!(ca = %ca.id(), "certificate authority is valid");
    println!("{}", ca.id());
    println!("  checking keys: {}", ca.checking_keys().len());
    println!("  signing keys:  {}", ca.signing_keys().len());
    println!("  TLS certs:     {}", get_tls_certs(&ca).len());
    println!("  JWT key pairs: {}", ca.jwt_key_pairs().len());
    if !ca.roles().is_empty() {
        println!("  roles:         {}", ca.roles().join(", "));
    }
    for mapping in ca.role_map() {
        println!("  role map:      {} -> {}", mapping.remote, mapping.local.join(", "));
    }

    Ok(())
}
