//! Keystone trust core.
//!
//! Validates certificate authorities, builds JWT signers and TLS trust pools
//! from them, and encodes versioned resources.
//!
//! # Key material
//!
//! All key parsing goes through the [`keys::KeyMaterial`] capability held by
//! an [`Authority`]. [`keys::StandardKeyMaterial`] handles Ed25519 token keys,
//! X.509 certificates and OpenSSH keys.
//!
//! # Configuration
//!
//! See [`config::AuthorityConfig`] for the JWT algorithm and certificate
//! duration settings.

pub mod authority;
pub mod clock;
pub mod codec;
pub mod config;
pub mod equivalence;
pub mod jwt;
pub mod keys;
pub mod pool;
pub mod rolemap;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
pub mod validation;

pub use authority::Authority;
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{
    MarshalOptions, marshal_cert_authority, marshal_cert_roles, marshal_cluster_name,
    unmarshal_cert_authority, unmarshal_cert_roles, unmarshal_cluster_name,
};
pub use config::AuthorityConfig;
pub use equivalence::cert_authorities_equivalent;
pub use jwt::{Claims, JwtConfig, JwtKey, SignParams, VerifyParams};
pub use keys::{KeyError, KeyMaterial, StandardKeyMaterial};
pub use pool::{CertPool, get_tls_certs};
pub use validation::validate_cert_authority;
