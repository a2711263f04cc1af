//! Resource types for the keystone cluster trust core.
//!
//! Every resource carries a `kind`, a `version` and [`metadata::Metadata`];
//! the concrete type is picked from the version tag by the codec in
//! `keystone-auth`.

pub mod authority;
pub mod cluster_name;
pub mod error;
pub mod metadata;
pub mod params;
pub mod roles;

pub use authority::{
    CertAuthId, CertAuthType, CertAuthoritySpecV2, CertAuthorityV2, JwtKeyPair, SigningAlgType,
    TlsKeyPair,
};
pub use cluster_name::{ClusterNameSpecV2, ClusterNameV2};
pub use error::{Error, Result};
pub use metadata::{Metadata, ResourceHeader, ResourceId};
pub use roles::{CertRoles, RoleMap, RoleMapping, SystemRole};

/// Version tag of the cert roles envelope.
pub const V1: &str = "v1";

/// Version tag of the certificate authority and cluster name resources.
pub const V2: &str = "v2";
