//! Certificate authority resource model.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

use crate::{
    V2,
    error::{Error, Result},
    metadata::{Metadata, ResourceId},
    roles::RoleMap,
};

pub const KIND_CERT_AUTHORITY: &str = "cert_authority";

/// The kind of trust a certificate authority provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum CertAuthType {
    /// Signs host certificates.
    Host,
    /// Signs user certificates.
    User,
    /// Signs application tokens.
    Jwt,
}

impl CertAuthType {
    pub const ALL: [CertAuthType; 3] = [Self::Host, Self::User, Self::Jwt];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::User => "user",
            Self::Jwt => "jwt",
        }
    }
}

impl fmt::Display for CertAuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertAuthType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                Error::unsupported(format!("unsupported certificate authority type {s:?}"))
            })
    }
}

impl TryFrom<String> for CertAuthType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl Serialize for CertAuthType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Signature algorithm used by the legacy SSH signing keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SigningAlgType {
    #[default]
    Unknown,
    RsaSha1,
    RsaSha2_256,
    RsaSha2_512,
}

impl SigningAlgType {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// A PEM encoded TLS certificate and, for local authorities, its private key.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsKeyPair {
    #[serde_as(as = "Base64")]
    pub cert: Vec<u8>,

    #[serde_as(as = "Base64")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key: Vec<u8>,
}

/// A PEM encoded JWT public key and optional private key.
///
/// Pairs without a private key only verify tokens signed before a rotation.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtKeyPair {
    #[serde_as(as = "Base64")]
    pub public_key: Vec<u8>,

    #[serde_as(as = "Base64")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub private_key: Vec<u8>,
}

impl JwtKeyPair {
    pub fn has_private_key(&self) -> bool {
        !self.private_key.is_empty()
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertAuthoritySpecV2 {
    #[serde(rename = "type")]
    pub ca_type: CertAuthType,

    #[serde(default)]
    pub cluster_name: String,

    /// OpenSSH public keys used to verify certificates.
    #[serde_as(as = "Vec<Base64>")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checking_keys: Vec<Vec<u8>>,

    /// OpenSSH private keys used to sign certificates.
    #[serde_as(as = "Vec<Base64>")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signing_keys: Vec<Vec<u8>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_map: RoleMap,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tls_key_pairs: Vec<TlsKeyPair>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jwt_key_pairs: Vec<JwtKeyPair>,

    #[serde(default, skip_serializing_if = "SigningAlgType::is_unknown")]
    pub signing_alg: SigningAlgType,
}

impl CertAuthoritySpecV2 {
    pub fn new(ca_type: CertAuthType, cluster_name: impl Into<String>) -> Self {
        Self {
            ca_type,
            cluster_name: cluster_name.into(),
            checking_keys: Vec::new(),
            signing_keys: Vec::new(),
            roles: Vec::new(),
            role_map: RoleMap::new(),
            tls_key_pairs: Vec::new(),
            jwt_key_pairs: Vec::new(),
            signing_alg: SigningAlgType::Unknown,
        }
    }
}

/// Identifies a certificate authority within the trust store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CertAuthId {
    pub ca_type: CertAuthType,
    pub domain_name: String,
}

impl fmt::Display for CertAuthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CA(type={:?}, domain={:?})", self.ca_type.as_str(), self.domain_name)
    }
}

/// Version 2 of the certificate authority resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertAuthorityV2 {
    #[serde(default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_kind: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub metadata: Metadata,

    pub spec: CertAuthoritySpecV2,
}

impl CertAuthorityV2 {
    /// Builds a certificate authority without validating it, so key material
    /// can still be attached before the resource is checked.
    pub fn new(spec: CertAuthoritySpecV2) -> Self {
        Self {
            kind: KIND_CERT_AUTHORITY.to_string(),
            sub_kind: spec.ca_type.as_str().to_string(),
            version: V2.to_string(),
            metadata: Metadata::named(spec.cluster_name.clone()),
            spec,
        }
    }

    pub fn id(&self) -> CertAuthId {
        CertAuthId {
            ca_type: self.spec.ca_type,
            domain_name: self.spec.cluster_name.clone(),
        }
    }

    pub fn ca_type(&self) -> CertAuthType {
        self.spec.ca_type
    }

    pub fn cluster_name(&self) -> &str {
        &self.spec.cluster_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn checking_keys(&self) -> &[Vec<u8>] {
        &self.spec.checking_keys
    }

    pub fn signing_keys(&self) -> &[Vec<u8>] {
        &self.spec.signing_keys
    }

    pub fn tls_key_pairs(&self) -> &[TlsKeyPair] {
        &self.spec.tls_key_pairs
    }

    pub fn jwt_key_pairs(&self) -> &[JwtKeyPair] {
        &self.spec.jwt_key_pairs
    }

    pub fn roles(&self) -> &[String] {
        &self.spec.roles
    }

    pub fn role_map(&self) -> &RoleMap {
        &self.spec.role_map
    }

    pub fn signing_alg(&self) -> SigningAlgType {
        self.spec.signing_alg
    }

    pub fn resource_id(&self) -> ResourceId {
        self.metadata.id
    }

    pub fn set_resource_id(&mut self, id: ResourceId) {
        self.metadata.id = id;
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.metadata.expires
    }

    pub fn set_expiry(&mut self, expires: DateTime<Utc>) {
        self.metadata.expires = Some(expires);
    }

    /// Fills in static fields and checks the header and required spec fields.
    pub fn check_and_set_defaults(&mut self) -> Result<()> {
        if self.kind.is_empty() {
            self.kind = KIND_CERT_AUTHORITY.to_string();
        }
        if self.kind != KIND_CERT_AUTHORITY {
            return Err(Error::bad_parameter(format!(
                "unexpected resource kind {:?} for a certificate authority",
                self.kind
            )));
        }
        if self.version != V2 {
            return Err(Error::unsupported(format!(
                "certificate authority resource version {:?} is not supported",
                self.version
            )));
        }
        if self.spec.cluster_name.is_empty() {
            return Err(Error::bad_parameter(
                "certificate authority missing cluster name",
            ));
        }
        if self.sub_kind.is_empty() {
            self.sub_kind = self.spec.ca_type.as_str().to_string();
        }
        if self.metadata.name.is_empty() {
            self.metadata.name = self.spec.cluster_name.clone();
        }
        self.metadata.check_and_set_defaults()
    }
}

/// Builds a certificate authority from flat SSH key lists.
#[deprecated(note = "use CertAuthorityV2::new with a CertAuthoritySpecV2")]
pub fn new_cert_authority(
    ca_type: CertAuthType,
    cluster_name: &str,
    signing_keys: Vec<Vec<u8>>,
    checking_keys: Vec<Vec<u8>>,
    roles: Vec<String>,
    signing_alg: SigningAlgType,
) -> CertAuthorityV2 {
    CertAuthorityV2::new(CertAuthoritySpecV2 {
        signing_keys,
        checking_keys,
        roles,
        signing_alg,
        ..CertAuthoritySpecV2::new(ca_type, cluster_name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_header_fields() {
        let ca = CertAuthorityV2::new(CertAuthoritySpecV2::new(CertAuthType::Host, "example.com"));

        assert_eq!(ca.kind, KIND_CERT_AUTHORITY);
        assert_eq!(ca.version(), V2);
        assert_eq!(ca.metadata.name, "example.com");
        assert_eq!(ca.resource_id(), 0);
        assert_eq!(
            ca.id(),
            CertAuthId {
                ca_type: CertAuthType::Host,
                domain_name: "example.com".into(),
            }
        );
    }

    #[test]
    fn test_unknown_type_names_the_offender() {
        let err = serde_json::from_str::<CertAuthType>(r#""pigeon""#).unwrap_err();
        assert!(err.to_string().contains("\"pigeon\""));

        let err = "pigeon".parse::<CertAuthType>().unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_check_rejects_missing_cluster_name() {
        let mut ca = CertAuthorityV2::new(CertAuthoritySpecV2::new(CertAuthType::User, ""));
        assert!(ca.check_and_set_defaults().unwrap_err().is_bad_parameter());
    }

    #[test]
    fn test_check_rejects_unknown_version() {
        let mut ca = CertAuthorityV2::new(CertAuthoritySpecV2::new(CertAuthType::User, "a"));
        ca.version = "v99".into();
        assert!(ca.check_and_set_defaults().unwrap_err().is_unsupported());
    }

    #[test]
    fn test_check_fills_defaults() {
        let mut ca = CertAuthorityV2::new(CertAuthoritySpecV2::new(CertAuthType::Jwt, "a"));
        ca.kind.clear();
        ca.sub_kind.clear();
        ca.metadata.name.clear();
        ca.metadata.namespace.clear();

        ca.check_and_set_defaults().unwrap();

        assert_eq!(ca.kind, KIND_CERT_AUTHORITY);
        assert_eq!(ca.sub_kind, "jwt");
        assert_eq!(ca.metadata.name, "a");
        assert_eq!(ca.metadata.namespace, crate::metadata::DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_key_bytes_serialize_as_base64() {
        let mut spec = CertAuthoritySpecV2::new(CertAuthType::Jwt, "a");
        spec.jwt_key_pairs.push(JwtKeyPair {
            public_key: b"pub".to_vec(),
            private_key: Vec::new(),
        });
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["type"], "jwt");
        assert_eq!(json["jwt_key_pairs"][0]["public_key"], "cHVi");
        assert!(json["jwt_key_pairs"][0].get("private_key").is_none());
        assert!(json.get("roles").is_none());
    }

    #[test]
    #[allow(deprecated)]
    fn test_legacy_constructor() {
        let ca = new_cert_authority(
            CertAuthType::User,
            "example.com",
            vec![b"signing".to_vec()],
            vec![b"checking".to_vec()],
            vec!["admin".into()],
            SigningAlgType::RsaSha2_512,
        );

        assert_eq!(ca.signing_keys(), &[b"signing".to_vec()]);
        assert_eq!(ca.checking_keys(), &[b"checking".to_vec()]);
        assert_eq!(ca.roles(), &["admin".to_string()]);
        assert_eq!(ca.signing_alg(), SigningAlgType::RsaSha2_512);
    }
}
