//! JWT signing and verification keyed by a JWT signer certificate authority.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use pkcs8::EncodePrivateKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use keystone_types::{CertAuthType, CertAuthoritySpecV2, CertAuthorityV2, Error, JwtKeyPair, Result};

use crate::{
    authority::Authority,
    clock::Clock,
    keys::{KeyAlgorithm, PrivateKey, PublicKey},
};

/// Tolerated clock skew, in seconds, when checking `nbf` and `exp`.
const LEEWAY_SECS: i64 = 60;

/// Inputs to [`JwtKey::new`].
pub struct JwtConfig {
    pub algorithm: Algorithm,
    /// Becomes the `iss` claim of signed tokens.
    pub cluster_name: String,
    pub private_key: Option<PrivateKey>,
    /// Derived from `private_key` when absent.
    pub public_key: Option<PublicKey>,
    pub clock: Arc<dyn Clock>,
}

/// Claims carried by application tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: Vec<String>,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SignParams {
    pub username: String,
    pub roles: Vec<String>,
    /// Application URI the token is issued for.
    pub uri: String,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct VerifyParams {
    pub username: String,
    pub uri: String,
    pub raw_token: String,
}

/// A token signer and verifier bound to one key pair of a JWT signer
/// certificate authority.
///
/// Keys built from a public key alone can only verify.
#[derive(Clone)]
pub struct JwtKey {
    algorithm: Algorithm,
    cluster_name: String,
    public_key: PublicKey,
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

fn check_algorithm(algorithm: Algorithm, key: KeyAlgorithm) -> Result<()> {
    match (algorithm, key) {
        (Algorithm::EdDSA, KeyAlgorithm::Ed25519) => Ok(()),
        (algorithm, key) => Err(Error::bad_parameter(format!(
            "algorithm {algorithm:?} is not compatible with {key} keys"
        ))),
    }
}

fn encoding_key(private_key: &PrivateKey) -> Result<EncodingKey> {
    match private_key {
        PrivateKey::Ed25519(key) => {
            let der = key.to_pkcs8_der().map_err(|e| {
                Error::bad_parameter(format!("failed to encode JWT private key: {e}"))
            })?;
            Ok(EncodingKey::from_ed_der(der.as_bytes()))
        }
    }
}

fn decoding_key(public_key: &PublicKey) -> DecodingKey {
    match public_key {
        PublicKey::Ed25519(key) => DecodingKey::from_ed_der(key.as_bytes()),
    }
}

impl JwtKey {
    pub fn new(config: JwtConfig) -> Result<Self> {
        let JwtConfig {
            algorithm,
            cluster_name,
            private_key,
            public_key,
            clock,
        } = config;

        if cluster_name.is_empty() {
            return Err(Error::bad_parameter("JWT key requires a cluster name"));
        }

        let public_key = match (&private_key, public_key) {
            (None, None) => {
                return Err(Error::bad_parameter(
                    "JWT key requires a public or private key",
                ));
            }
            (Some(private), Some(public)) => {
                if private.public_key() != public {
                    return Err(Error::bad_parameter(
                        "JWT public key does not match private key",
                    ));
                }
                public
            }
            (Some(private), None) => private.public_key(),
            (None, Some(public)) => public,
        };
        check_algorithm(algorithm, public_key.algorithm())?;

        let encoding_key = private_key.as_ref().map(encoding_key).transpose()?;
        let decoding_key = decoding_key(&public_key);

        Ok(Self {
            algorithm,
            cluster_name,
            public_key,
            encoding_key,
            decoding_key,
            clock,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Value of the `kid` header of tokens signed by this key.
    pub fn key_id(&self) -> String {
        self.public_key.key_id()
    }

    pub fn can_sign(&self) -> bool {
        self.encoding_key.is_some()
    }

    /// Signs an application token for `params.username`.
    pub fn sign(&self, params: &SignParams) -> Result<String> {
        let Some(encoding_key) = &self.encoding_key else {
            return Err(Error::bad_parameter(
                "cannot sign tokens without a private key",
            ));
        };
        if params.username.is_empty() {
            return Err(Error::bad_parameter("username is required"));
        }
        if params.uri.is_empty() {
            return Err(Error::bad_parameter("uri is required"));
        }

        let now = self.clock.now();
        if params.expires <= now {
            return Err(Error::bad_parameter("token expiry must be in the future"));
        }

        let claims = Claims {
            iss: self.cluster_name.clone(),
            sub: params.username.clone(),
            aud: vec![params.uri.clone()],
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: params.expires.timestamp(),
            username: params.username.clone(),
            roles: params.roles.clone(),
        };

        let mut header = Header::new(self.algorithm);
        header.kid = Some(self.key_id());

        encode(&header, &claims, encoding_key).map_err(|e| Error::wrap("failed to sign token", e))
    }

    /// Verifies a token's signature, issuer, audience and subject, then
    /// checks its validity window against the injected clock.
    pub fn verify(&self, params: &VerifyParams) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();
        validation.set_issuer(&[&self.cluster_name]);
        validation.set_audience(&[&params.uri]);
        validation.sub = Some(params.username.clone());

        let claims = decode::<Claims>(&params.raw_token, &self.decoding_key, &validation)
            .map_err(|e| Error::wrap("failed to verify token", e))?
            .claims;

        let now = self.clock.now().timestamp();
        if now + LEEWAY_SECS < claims.nbf {
            return Err(Error::bad_parameter("token is not valid yet"));
        }
        if now - LEEWAY_SECS >= claims.exp {
            return Err(Error::bad_parameter("token has expired"));
        }
        Ok(claims)
    }
}

impl fmt::Debug for JwtKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKey")
            .field("algorithm", &self.algorithm)
            .field("cluster_name", &self.cluster_name)
            .field("key_id", &self.key_id())
            .field("can_sign", &self.can_sign())
            .finish()
    }
}

impl Authority {
    /// Creates a JWT signer certificate authority holding one freshly
    /// generated key pair.
    #[instrument(skip(self))]
    pub fn new_jwt_authority(&self, cluster_name: &str) -> Result<CertAuthorityV2> {
        let pair = self
            .keys
            .generate_key_pair()
            .map_err(|e| Error::wrap("failed to generate JWT key pair", e))?;

        let mut spec = CertAuthoritySpecV2::new(CertAuthType::Jwt, cluster_name);
        spec.jwt_key_pairs.push(JwtKeyPair {
            public_key: pair.public_key,
            private_key: pair.private_key,
        });
        debug!("generated JWT signer certificate authority");
        Ok(CertAuthorityV2::new(spec))
    }

    /// Returns a signer for the active (first) key pair of a JWT signer
    /// certificate authority.
    #[instrument(skip(self, ca, clock), fields(cluster = %ca.cluster_name()))]
    pub fn get_jwt_signer(&self, ca: &CertAuthorityV2, clock: Arc<dyn Clock>) -> Result<JwtKey> {
        let Some(active) = ca.jwt_key_pairs().first() else {
            return Err(Error::bad_parameter("no JWT key pairs found"));
        };
        let private_key = self
            .keys
            .parse_private_key(&active.private_key)
            .map_err(|e| Error::wrap("failed to parse active JWT private key", e))?;

        JwtKey::new(JwtConfig {
            algorithm: self.config.jwt_algorithm,
            cluster_name: ca.cluster_name().to_string(),
            private_key: Some(private_key),
            public_key: None,
            clock,
        })
    }

    /// Returns verify-capable keys for every key pair, active one first, so
    /// tokens signed before a rotation still verify.
    pub fn get_jwt_verifiers(
        &self,
        ca: &CertAuthorityV2,
        clock: Arc<dyn Clock>,
    ) -> Result<Vec<JwtKey>> {
        ca.jwt_key_pairs()
            .iter()
            .enumerate()
            .map(|(i, pair)| {
                let public_key = self
                    .keys
                    .parse_public_key(&pair.public_key)
                    .map_err(|e| Error::wrap(format!("jwt_key_pairs[{i}].public_key"), e))?;
                JwtKey::new(JwtConfig {
                    algorithm: self.config.jwt_algorithm,
                    cluster_name: ca.cluster_name().to_string(),
                    private_key: None,
                    public_key: Some(public_key),
                    clock: clock.clone(),
                })
            })
            .collect()
    }
}
