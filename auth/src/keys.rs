//! Key-material capability: turns raw key bytes into signer and verifier
//! handles.
//!
//! The rest of the crate only talks to [`KeyMaterial`]; [`StandardKeyMaterial`]
//! is the implementation used outside of tests.

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use ed25519_dalek::{SigningKey, VerifyingKey};
use pkcs8::{
    DecodePrivateKey, EncodePrivateKey, LineEnding, ObjectIdentifier, PrivateKeyInfo,
    spki::{DecodePublicKey, EncodePublicKey, SubjectPublicKeyInfoRef},
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use thiserror::Error;
use x509_parser::pem::{Pem, parse_x509_pem};

const ED25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

const PEM_PRIVATE_KEY: &str = "PRIVATE KEY";
const PEM_PUBLIC_KEY: &str = "PUBLIC KEY";
const PEM_CERTIFICATE: &str = "CERTIFICATE";

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid PEM: {0}")]
    InvalidPem(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("invalid SSH key: {0}")]
    InvalidSshKey(String),

    #[error("unsupported key algorithm {0}")]
    UnsupportedAlgorithm(String),

    #[error("key generation failed: {0}")]
    Generation(String),
}

/// Asymmetric key families understood by the JWT operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Ed25519,
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519 => f.write_str("Ed25519"),
        }
    }
}

#[derive(Clone)]
pub enum PrivateKey {
    Ed25519(SigningKey),
}

impl PrivateKey {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Ed25519(key) => PublicKey::Ed25519(key.verifying_key()),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({}, <redacted>)", self.algorithm())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Ed25519(VerifyingKey),
}

impl PublicKey {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }

    /// Raw key bytes (32 bytes for Ed25519).
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Ed25519(key) => key.as_bytes(),
        }
    }

    /// Short identifier derived from the first 8 bytes of the key.
    pub fn key_id(&self) -> String {
        let bytes = self.as_bytes();
        URL_SAFE_NO_PAD.encode(&bytes[..bytes.len().min(8)])
    }
}

/// A parsed X.509 certificate.
#[derive(Debug, Clone)]
pub struct Certificate {
    der: CertificateDer<'static>,
    subject: String,
    issuer: String,
    not_before: Option<DateTime<Utc>>,
    not_after: Option<DateTime<Utc>>,
    is_ca: bool,
    public_key_der: Vec<u8>,
}

impl Certificate {
    pub fn der(&self) -> &CertificateDer<'static> {
        &self.der
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.not_before
    }

    pub fn not_after(&self) -> Option<DateTime<Utc>> {
        self.not_after
    }

    pub fn is_ca(&self) -> bool {
        self.is_ca
    }

    /// DER encoded SubjectPublicKeyInfo.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }
}

/// PEM encodings accepted for the private half of a TLS key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsKeyFormat {
    /// `RSA PRIVATE KEY`
    Pkcs1,
    /// `EC PRIVATE KEY`
    Sec1,
    /// `PRIVATE KEY`
    Pkcs8,
}

/// Private half of a TLS key pair.
///
/// Only the derived public key is retained, which is all that is needed to
/// check the key against its certificate.
#[derive(Clone)]
pub struct TlsPrivateKey {
    format: TlsKeyFormat,
    public_key_der: Vec<u8>,
}

impl TlsPrivateKey {
    pub fn format(&self) -> TlsKeyFormat {
        self.format
    }

    /// DER encoded SubjectPublicKeyInfo of the matching public key.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }
}

impl fmt::Debug for TlsPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TlsPrivateKey({:?}, <redacted>)", self.format)
    }
}

fn rsa_public_key_der(pkcs1: &[u8]) -> Result<Vec<u8>, KeyError> {
    use rsa::pkcs1::DecodeRsaPrivateKey;

    let key = rsa::RsaPrivateKey::from_pkcs1_der(pkcs1)
        .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
    let spki = key
        .to_public_key()
        .to_public_key_der()
        .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
    Ok(spki.as_bytes().to_vec())
}

fn ec_public_key_der(sec1: &[u8]) -> Result<Vec<u8>, KeyError> {
    let key = p256::SecretKey::from_sec1_der(sec1).map_err(|_| {
        KeyError::UnsupportedAlgorithm("EC private key on a curve other than P-256".into())
    })?;
    let spki = key
        .public_key()
        .to_public_key_der()
        .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
    Ok(spki.as_bytes().to_vec())
}

/// Verifies SSH certificates issued by a certificate authority.
#[derive(Debug, Clone)]
pub struct SshChecker(ssh_key::PublicKey);

impl SshChecker {
    pub fn public_key(&self) -> &ssh_key::PublicKey {
        &self.0
    }

    pub fn fingerprint(&self) -> String {
        self.0.fingerprint(ssh_key::HashAlg::Sha256).to_string()
    }
}

/// Signs SSH certificates on behalf of a certificate authority.
#[derive(Clone)]
pub struct SshSigner(ssh_key::PrivateKey);

impl SshSigner {
    pub fn private_key(&self) -> &ssh_key::PrivateKey {
        &self.0
    }

    pub fn public_key(&self) -> &ssh_key::PublicKey {
        self.0.public_key()
    }
}

impl fmt::Debug for SshSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SshSigner({}, <redacted>)", self.0.algorithm())
    }
}

/// PEM encoded key pair produced by [`KeyMaterial::generate_key_pair`].
#[derive(Clone)]
pub struct GeneratedKeyPair {
    pub public_key: Vec<u8>,
    pub private_key: Vec<u8>,
}

impl fmt::Debug for GeneratedKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedKeyPair")
            .field("public_key", &String::from_utf8_lossy(&self.public_key))
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Parses and generates the key material carried by certificate authorities.
pub trait KeyMaterial: Send + Sync {
    /// Parses a PEM encoded PKCS#8 private key used to sign tokens.
    fn parse_private_key(&self, data: &[u8]) -> Result<PrivateKey, KeyError>;

    /// Parses a PEM encoded SubjectPublicKeyInfo used to verify tokens.
    fn parse_public_key(&self, data: &[u8]) -> Result<PublicKey, KeyError>;

    /// Parses a PEM encoded X.509 certificate.
    fn parse_certificate_pem(&self, data: &[u8]) -> Result<Certificate, KeyError>;

    /// Parses the PEM encoded private key of a TLS key pair (PKCS#1, SEC1 or
    /// PKCS#8).
    fn parse_tls_private_key(&self, data: &[u8]) -> Result<TlsPrivateKey, KeyError>;

    /// Parses an OpenSSH `authorized_keys` style public key.
    fn parse_ssh_checking_key(&self, data: &[u8]) -> Result<SshChecker, KeyError>;

    /// Parses an unencrypted OpenSSH private key.
    fn parse_ssh_signing_key(&self, data: &[u8]) -> Result<SshSigner, KeyError>;

    /// Generates a fresh token-signing key pair.
    fn generate_key_pair(&self) -> Result<GeneratedKeyPair, KeyError>;
}

/// Default key material: Ed25519 token keys, X.509 certificates and OpenSSH
/// keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardKeyMaterial;

fn decode_pem(data: &[u8], expected_label: &str) -> Result<Pem, KeyError> {
    let (_, pem) = parse_x509_pem(data).map_err(|e| KeyError::InvalidPem(e.to_string()))?;
    if pem.label != expected_label {
        return Err(KeyError::InvalidPem(format!(
            "expected {expected_label:?} block, found {:?}",
            pem.label
        )));
    }
    Ok(pem)
}

impl KeyMaterial for StandardKeyMaterial {
    fn parse_private_key(&self, data: &[u8]) -> Result<PrivateKey, KeyError> {
        let pem = decode_pem(data, PEM_PRIVATE_KEY)?;
        let info = PrivateKeyInfo::try_from(pem.contents.as_slice())
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
        if info.algorithm.oid != ED25519_OID {
            return Err(KeyError::UnsupportedAlgorithm(info.algorithm.oid.to_string()));
        }

        SigningKey::from_pkcs8_der(&pem.contents)
            .map(PrivateKey::Ed25519)
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))
    }

    fn parse_public_key(&self, data: &[u8]) -> Result<PublicKey, KeyError> {
        let pem = decode_pem(data, PEM_PUBLIC_KEY)?;
        let info = SubjectPublicKeyInfoRef::try_from(pem.contents.as_slice())
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        if info.algorithm.oid != ED25519_OID {
            return Err(KeyError::UnsupportedAlgorithm(info.algorithm.oid.to_string()));
        }

        VerifyingKey::from_public_key_der(&pem.contents)
            .map(PublicKey::Ed25519)
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))
    }

    fn parse_certificate_pem(&self, data: &[u8]) -> Result<Certificate, KeyError> {
        let pem = decode_pem(data, PEM_CERTIFICATE)?;

        let (subject, issuer, not_before, not_after, is_ca, public_key_der) = {
            let cert = pem
                .parse_x509()
                .map_err(|e| KeyError::InvalidCertificate(e.to_string()))?;
            let validity = cert.validity();
            (
                cert.subject().to_string(),
                cert.issuer().to_string(),
                DateTime::from_timestamp(validity.not_before.timestamp(), 0),
                DateTime::from_timestamp(validity.not_after.timestamp(), 0),
                cert.is_ca(),
                cert.public_key().raw.to_vec(),
            )
        };

        Ok(Certificate {
            der: CertificateDer::from(pem.contents),
            subject,
            issuer,
            not_before,
            not_after,
            is_ca,
            public_key_der,
        })
    }

    fn parse_tls_private_key(&self, data: &[u8]) -> Result<TlsPrivateKey, KeyError> {
        let key = rustls_pemfile::private_key(&mut &data[..])
            .map_err(|e| KeyError::InvalidPem(e.to_string()))?
            .ok_or_else(|| KeyError::InvalidPem("no private key block found".into()))?;

        let (format, public_key_der) = match key {
            PrivateKeyDer::Pkcs1(key) => (
                TlsKeyFormat::Pkcs1,
                rsa_public_key_der(key.secret_pkcs1_der())?,
            ),
            PrivateKeyDer::Sec1(key) => (
                TlsKeyFormat::Sec1,
                ec_public_key_der(key.secret_sec1_der())?,
            ),
            PrivateKeyDer::Pkcs8(key) => {
                let pair = rcgen::KeyPair::try_from(&key)
                    .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
                (TlsKeyFormat::Pkcs8, pair.public_key_der())
            }
            _ => {
                return Err(KeyError::UnsupportedAlgorithm(
                    "unrecognized private key encoding".into(),
                ));
            }
        };

        Ok(TlsPrivateKey {
            format,
            public_key_der,
        })
    }

    fn parse_ssh_checking_key(&self, data: &[u8]) -> Result<SshChecker, KeyError> {
        let text =
            std::str::from_utf8(data).map_err(|e| KeyError::InvalidSshKey(e.to_string()))?;
        ssh_key::PublicKey::from_openssh(text.trim())
            .map(SshChecker)
            .map_err(|e| KeyError::InvalidSshKey(e.to_string()))
    }

    fn parse_ssh_signing_key(&self, data: &[u8]) -> Result<SshSigner, KeyError> {
        let key = ssh_key::PrivateKey::from_openssh(data)
            .map_err(|e| KeyError::InvalidSshKey(e.to_string()))?;
        if key.is_encrypted() {
            return Err(KeyError::InvalidSshKey(
                "encrypted signing keys are not supported".into(),
            ));
        }
        Ok(SshSigner(key))
    }

    fn generate_key_pair(&self) -> Result<GeneratedKeyPair, KeyError> {
        let mut seed = [0u8; 32];
        getrandom::getrandom(&mut seed).map_err(|e| KeyError::Generation(e.to_string()))?;
        let signing_key = SigningKey::from_bytes(&seed);
        seed.fill(0);

        let private_key = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyError::Generation(e.to_string()))?;
        let public_key = signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::Generation(e.to_string()))?;

        Ok(GeneratedKeyPair {
            public_key: public_key.into_bytes(),
            private_key: private_key.as_bytes().to_vec(),
        })
    }
}
