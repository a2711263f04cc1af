//! Certificate issuance requests handed to an external signer.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    roles::{SystemRole, check_system_roles},
};

/// Claim data used to populate a role at runtime.
pub type Traits = BTreeMap<String, Vec<String>>;

/// Everything needed to issue a host certificate.
#[derive(Debug, Clone, Default)]
pub struct HostCertParams {
    /// Private key of the CA that signs the host's public key.
    pub private_ca_signing_key: Vec<u8>,
    /// Signature algorithm used by the CA private key.
    pub ca_signing_alg: String,
    pub public_host_key: Vec<u8>,
    /// Uniquely identifies a node within a cluster.
    pub host_id: String,
    /// Additional principals to add to the certificate.
    pub principals: Vec<String>,
    /// DNS name of the node.
    pub node_name: String,
    pub cluster_name: String,
    pub roles: Vec<SystemRole>,
    pub ttl: Duration,
}

impl HostCertParams {
    pub fn check(&self) -> Result<()> {
        if self.private_ca_signing_key.is_empty() || self.ca_signing_alg.is_empty() {
            return Err(Error::bad_parameter(
                "private_ca_signing_key and ca_signing_alg are required",
            ));
        }
        if self.host_id.is_empty() && self.principals.is_empty() {
            return Err(Error::bad_parameter(format!(
                "host_id [{:?}] or principals [{:?}] are required",
                self.host_id, self.principals
            )));
        }
        if self.cluster_name.is_empty() {
            return Err(Error::bad_parameter("cluster_name is required"));
        }
        check_system_roles(&self.roles)
    }
}

/// Access requests applied while a certificate was built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIds {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_requests: Vec<String>,
}

impl RequestIds {
    pub fn len(&self) -> usize {
        self.access_requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.access_requests.is_empty()
    }

    pub fn marshal(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::wrap("failed to encode request IDs", e))
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| Error::bad_parameter(e.to_string()))
    }
}

/// Everything needed to issue an OpenSSH user certificate.
#[derive(Debug, Clone, Default)]
pub struct UserCertParams {
    pub private_ca_signing_key: Vec<u8>,
    pub ca_signing_alg: String,
    pub public_user_key: Vec<u8>,
    pub ttl: Duration,
    pub username: String,
    /// Set when a user requests a certificate on behalf of another user.
    pub impersonator: String,
    /// SSH principals.
    pub allowed_logins: Vec<String>,
    pub permit_x11_forwarding: bool,
    pub permit_agent_forwarding: bool,
    pub permit_port_forwarding: bool,
    pub roles: Vec<String>,
    pub certificate_format: String,
    /// Target cluster for request routing.
    pub route_to_cluster: String,
    pub traits: Traits,
    pub active_requests: RequestIds,
    /// Device ID of the MFA check that immediately preceded issuance.
    pub mfa_verified: String,
    /// Client IP to embed in the certificate.
    pub client_ip: String,
}

impl UserCertParams {
    pub fn check_and_set_defaults(&mut self, min_ttl: Duration) -> Result<()> {
        if self.private_ca_signing_key.is_empty() || self.ca_signing_alg.is_empty() {
            return Err(Error::bad_parameter(
                "private_ca_signing_key and ca_signing_alg are required",
            ));
        }
        if self.ttl < min_ttl {
            self.ttl = min_ttl;
        }
        if self.allowed_logins.is_empty() {
            return Err(Error::bad_parameter("allowed_logins are required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_params() -> HostCertParams {
        HostCertParams {
            private_ca_signing_key: b"key".to_vec(),
            ca_signing_alg: "rsa-sha2-512".into(),
            host_id: "5b5c4e2a".into(),
            cluster_name: "example.com".into(),
            roles: vec![SystemRole::Node],
            ttl: Duration::from_secs(3600),
            ..Default::default()
        }
    }

    fn user_params() -> UserCertParams {
        UserCertParams {
            private_ca_signing_key: b"key".to_vec(),
            ca_signing_alg: "rsa-sha2-512".into(),
            username: "alice".into(),
            allowed_logins: vec!["root".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_host_params_valid() {
        assert!(host_params().check().is_ok());
    }

    #[test]
    fn test_host_params_require_signing_key() {
        let mut params = host_params();
        params.ca_signing_alg.clear();
        assert!(params.check().unwrap_err().is_bad_parameter());
    }

    #[test]
    fn test_host_params_accept_principals_instead_of_host_id() {
        let mut params = host_params();
        params.host_id.clear();
        assert!(params.check().is_err());

        params.principals = vec!["node.example.com".into()];
        assert!(params.check().is_ok());
    }

    #[test]
    fn test_host_params_require_cluster_name() {
        let mut params = host_params();
        params.cluster_name.clear();
        assert!(params.check().is_err());
    }

    #[test]
    fn test_host_params_reject_duplicate_roles() {
        let mut params = host_params();
        params.roles = vec![SystemRole::Node, SystemRole::Node];
        assert!(params.check().is_err());
    }

    #[test]
    fn test_user_params_raise_ttl_to_minimum() {
        let mut params = user_params();
        params.ttl = Duration::from_secs(1);
        params
            .check_and_set_defaults(Duration::from_secs(60))
            .unwrap();
        assert_eq!(params.ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_user_params_require_logins() {
        let mut params = user_params();
        params.allowed_logins.clear();
        assert!(
            params
                .check_and_set_defaults(Duration::from_secs(60))
                .unwrap_err()
                .is_bad_parameter()
        );
    }

    #[test]
    fn test_request_ids_json() {
        let ids = RequestIds {
            access_requests: vec!["req-1".into(), "req-2".into()],
        };
        let data = ids.marshal().unwrap();
        assert_eq!(data, br#"{"access_requests":["req-1","req-2"]}"#);
        assert_eq!(RequestIds::unmarshal(&data).unwrap().len(), 2);
        assert!(RequestIds::unmarshal(b"{}").unwrap().is_empty());
        assert!(RequestIds::unmarshal(b"not json").is_err());
    }
}
