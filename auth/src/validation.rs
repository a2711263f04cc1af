//! Certificate authority validation engine.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use keystone_types::{CertAuthType, CertAuthorityV2, Error, Result, params::UserCertParams};

use crate::{
    authority::Authority,
    clock::SystemClock,
    jwt::{JwtConfig, JwtKey},
    keys::{SshChecker, SshSigner},
    rolemap::parse_role_map,
};

/// Prefixes a bad-parameter message with the field it concerns, leaving other
/// kinds untouched.
fn in_field(field: String) -> impl FnOnce(Error) -> Error {
    move |err| match err {
        Error::BadParameter(message) => Error::bad_parameter(format!("{field}: {message}")),
        other => other,
    }
}

/// Rejects authorities that carry both the legacy role list and a role map.
pub fn check_roles_exclusive(ca: &CertAuthorityV2) -> Result<()> {
    if !ca.roles().is_empty() && !ca.role_map().is_empty() {
        return Err(Error::bad_parameter(
            "should set either 'roles' or 'role_map', not both",
        ));
    }
    Ok(())
}

impl Authority {
    /// Validates a certificate authority, filling in defaulted header fields.
    ///
    /// The first failure is returned; nothing is reported partially.
    #[instrument(skip(self, ca), fields(ca_type = %ca.ca_type(), cluster = %ca.cluster_name()))]
    pub fn validate(&self, ca: &mut CertAuthorityV2) -> Result<()> {
        let result = ca
            .check_and_set_defaults()
            .and_then(|()| match ca.ca_type() {
                CertAuthType::Host | CertAuthType::User => self.check_user_or_host_ca(ca),
                CertAuthType::Jwt => self.check_jwt_keys(ca),
            });

        match &result {
            Ok(()) => debug!("certificate authority is valid"),
            Err(e) => warn!(error = %e, "certificate authority rejected"),
        }
        result
    }

    /// Parses every SSH checking key of the authority.
    pub fn ssh_checkers(&self, ca: &CertAuthorityV2) -> Result<Vec<SshChecker>> {
        ca.checking_keys()
            .iter()
            .enumerate()
            .map(|(i, key)| {
                self.keys
                    .parse_ssh_checking_key(key)
                    .map_err(|e| Error::wrap(format!("checking_keys[{i}]"), e))
            })
            .collect()
    }

    /// Parses every SSH signing key of the authority.
    pub fn ssh_signers(&self, ca: &CertAuthorityV2) -> Result<Vec<SshSigner>> {
        ca.signing_keys()
            .iter()
            .enumerate()
            .map(|(i, key)| {
                self.keys
                    .parse_ssh_signing_key(key)
                    .map_err(|e| Error::wrap(format!("signing_keys[{i}]"), e))
            })
            .collect()
    }

    /// Checks a user certificate request, raising its TTL to the configured
    /// minimum certificate duration.
    pub fn check_user_cert_params(&self, params: &mut UserCertParams) -> Result<()> {
        params.check_and_set_defaults(self.config.min_cert_duration())
    }

    fn check_user_or_host_ca(&self, ca: &CertAuthorityV2) -> Result<()> {
        if ca.checking_keys().is_empty() {
            return Err(Error::bad_parameter(
                "certificate authority missing SSH public keys",
            ));
        }
        if ca.tls_key_pairs().is_empty() {
            return Err(Error::bad_parameter(
                "certificate authority missing TLS key pairs",
            ));
        }

        self.ssh_checkers(ca)?;
        self.ssh_signers(ca)?;
        self.check_tls_key_pairs(ca)?;

        check_roles_exclusive(ca)?;
        parse_role_map(ca.role_map())?;
        Ok(())
    }

    fn check_tls_key_pairs(&self, ca: &CertAuthorityV2) -> Result<()> {
        for (i, pair) in ca.tls_key_pairs().iter().enumerate() {
            let cert = self
                .keys
                .parse_certificate_pem(&pair.cert)
                .map_err(|e| Error::wrap(format!("tls_key_pairs[{i}].cert"), e))?;

            // Remote authorities only carry certificates.
            if pair.key.is_empty() {
                continue;
            }
            let key = self
                .keys
                .parse_tls_private_key(&pair.key)
                .map_err(|e| Error::wrap(format!("tls_key_pairs[{i}].key"), e))?;
            if key.public_key_der() != cert.public_key_der() {
                return Err(Error::bad_parameter(format!(
                    "tls_key_pairs[{i}]: private key does not match certificate {:?}",
                    cert.subject()
                )));
            }
        }
        Ok(())
    }

    fn check_jwt_keys(&self, ca: &CertAuthorityV2) -> Result<()> {
        if ca.jwt_key_pairs().is_empty() {
            return Err(Error::bad_parameter(
                "certificate authority missing JWT key pairs",
            ));
        }

        for (i, pair) in ca.jwt_key_pairs().iter().enumerate() {
            let private_key = if pair.has_private_key() {
                let key = self
                    .keys
                    .parse_private_key(&pair.private_key)
                    .map_err(|e| Error::wrap(format!("jwt_key_pairs[{i}].private_key"), e))?;
                Some(key)
            } else {
                None
            };
            let public_key = self
                .keys
                .parse_public_key(&pair.public_key)
                .map_err(|e| Error::wrap(format!("jwt_key_pairs[{i}].public_key"), e))?;

            JwtKey::new(JwtConfig {
                algorithm: self.config.jwt_algorithm,
                cluster_name: ca.cluster_name().to_string(),
                private_key,
                public_key: Some(public_key),
                clock: Arc::new(SystemClock),
            })
            .map_err(in_field(format!("jwt_key_pairs[{i}]")))?;
        }
        Ok(())
    }
}

/// Validates a certificate authority with the standard key material and
/// default configuration.
pub fn validate_cert_authority(ca: &mut CertAuthorityV2) -> Result<()> {
    Authority::default().validate(ca)
}
