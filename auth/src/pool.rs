//! Trust pools assembled from the TLS certificates of certificate
//! authorities.

use rustls::RootCertStore;
use tracing::{debug, instrument};

use keystone_types::{CertAuthorityV2, Error, Result};

use crate::{authority::Authority, keys::Certificate};

/// An ordered, de-duplicated set of trusted certificates.
#[derive(Debug, Clone, Default)]
pub struct CertPool {
    certs: Vec<Certificate>,
}

impl CertPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a certificate unless an identical one is already present.
    pub fn add_cert(&mut self, cert: Certificate) {
        if !self.contains(cert.der()) {
            self.certs.push(cert);
        }
    }

    pub fn contains(&self, der: &[u8]) -> bool {
        self.certs.iter().any(|c| c.der()[..] == der[..])
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.certs
    }

    pub fn subjects(&self) -> Vec<&str> {
        self.certs.iter().map(Certificate::subject).collect()
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Converts the pool into trust anchors for a rustls client or server
    /// configuration.
    pub fn to_root_store(&self) -> Result<RootCertStore> {
        let mut store = RootCertStore::empty();
        for cert in &self.certs {
            store.add(cert.der().clone()).map_err(|e| {
                Error::wrap(
                    format!("failed to add certificate {:?} to root store", cert.subject()),
                    e,
                )
            })?;
        }
        Ok(store)
    }
}

/// Returns the raw PEM certificates of every TLS key pair, in order.
pub fn get_tls_certs(ca: &CertAuthorityV2) -> Vec<Vec<u8>> {
    ca.tls_key_pairs().iter().map(|pair| pair.cert.clone()).collect()
}

impl Authority {
    /// Builds a pool from the TLS certificates of one certificate authority.
    #[instrument(skip(self, ca), fields(ca = %ca.id()))]
    pub fn cert_pool(&self, ca: &CertAuthorityV2) -> Result<CertPool> {
        if ca.tls_key_pairs().is_empty() {
            return Err(Error::bad_parameter(format!(
                "certificate authority {} has no TLS certificates",
                ca.id()
            )));
        }
        let mut pool = CertPool::new();
        self.add_tls_certs(&mut pool, ca)?;
        Ok(pool)
    }

    /// Builds one pool from several certificate authorities. Authorities
    /// without TLS key pairs contribute nothing.
    #[instrument(skip_all, fields(count = cas.len()))]
    pub fn cert_pool_from_cert_authorities(&self, cas: &[CertAuthorityV2]) -> Result<CertPool> {
        let mut pool = CertPool::new();
        for ca in cas {
            if ca.tls_key_pairs().is_empty() {
                debug!(ca = %ca.id(), "skipping certificate authority without TLS key pairs");
                continue;
            }
            self.add_tls_certs(&mut pool, ca)?;
        }
        Ok(pool)
    }

    fn add_tls_certs(&self, pool: &mut CertPool, ca: &CertAuthorityV2) -> Result<()> {
        for (i, pair) in ca.tls_key_pairs().iter().enumerate() {
            let cert = self.keys.parse_certificate_pem(&pair.cert).map_err(|e| {
                Error::wrap(format!("{}: tls_key_pairs[{i}].cert", ca.id()), e)
            })?;
            pool.add_cert(cert);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn test_cert_pool_from_single_ca() {
        let ca = testutil::host_ca("example.com");
        let pool = Authority::default().cert_pool(&ca).unwrap();

        assert_eq!(pool.len(), 1);
        assert!(pool.subjects()[0].contains("example.com"));
        assert_eq!(pool.to_root_store().unwrap().len(), 1);
    }

    #[test]
    fn test_cert_pool_requires_tls_pairs() {
        let mut ca = testutil::host_ca("example.com");
        ca.spec.tls_key_pairs.clear();
        let err = Authority::default().cert_pool(&ca).unwrap_err();
        assert!(err.to_string().contains("no TLS certificates"));
    }

    #[test]
    fn test_pool_from_many_skips_empty_and_dedups() {
        let host = testutil::host_ca("example.com");
        let mut user = testutil::user_ca("example.com");
        user.spec.tls_key_pairs.push(host.spec.tls_key_pairs[0].clone());
        let jwt = testutil::jwt_ca("example.com");

        let pool = Authority::default()
            .cert_pool_from_cert_authorities(&[host, user, jwt])
            .unwrap();
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_pool_from_none_is_empty() {
        let pool = Authority::default().cert_pool_from_cert_authorities(&[]).unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_unparseable_certificate_fails_pool() {
        let mut ca = testutil::user_ca("example.com");
        ca.spec.tls_key_pairs[0].cert = b"garbage".to_vec();
        let err = Authority::default()
            .cert_pool_from_cert_authorities(&[ca])
            .unwrap_err();
        assert!(err.is_wrapped());
    }

    #[test]
    fn test_get_tls_certs_preserves_order() {
        let mut ca = testutil::host_ca("example.com");
        let second = testutil::tls_key_pair("second.example.com");
        ca.spec.tls_key_pairs.push(second.clone());

        let certs = get_tls_certs(&ca);
        assert_eq!(certs.len(), 2);
        assert_eq!(certs[1], second.cert);
    }
}
