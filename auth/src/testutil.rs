//! Fixtures for tests: freshly generated key material and certificate
//! authorities that pass validation.

use keystone_types::{CertAuthType, CertAuthoritySpecV2, CertAuthorityV2, TlsKeyPair};
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, PKCS_ED25519};
use ssh_key::{
    LineEnding,
    private::{Ed25519Keypair, KeypairData},
};

use crate::authority::Authority;

/// A self-signed CA certificate for `common_name` with its private key.
pub fn tls_key_pair(common_name: &str) -> TlsKeyPair {
    let key_pair = KeyPair::generate_for(&PKCS_ED25519).expect("generate TLS key");
    let mut params =
        CertificateParams::new(vec![common_name.to_string()]).expect("certificate params");
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let cert = params.self_signed(&key_pair).expect("self-sign certificate");

    TlsKeyPair {
        cert: cert.pem().into_bytes(),
        key: key_pair.serialize_pem().into_bytes(),
    }
}

/// An OpenSSH Ed25519 key pair as `(private key, authorized_keys line)`.
pub fn ssh_key_pair() -> (Vec<u8>, Vec<u8>) {
    let mut seed = [0u8; 32];
    getrandom::getrandom(&mut seed).expect("random seed");
    let keypair = Ed25519Keypair::from_seed(&seed);
    let private = ssh_key::PrivateKey::new(KeypairData::from(keypair), "keystone-test")
        .expect("SSH private key");

    let signing = private
        .to_openssh(LineEnding::LF)
        .expect("encode SSH private key")
        .as_bytes()
        .to_vec();
    let checking = private
        .public_key()
        .to_openssh()
        .expect("encode SSH public key")
        .into_bytes();
    (signing, checking)
}

fn ssh_ca(ca_type: CertAuthType, cluster_name: &str) -> CertAuthorityV2 {
    let (signing, checking) = ssh_key_pair();
    let mut spec = CertAuthoritySpecV2::new(ca_type, cluster_name);
    spec.checking_keys.push(checking);
    spec.signing_keys.push(signing);
    spec.tls_key_pairs.push(tls_key_pair(cluster_name));
    CertAuthorityV2::new(spec)
}

pub fn host_ca(cluster_name: &str) -> CertAuthorityV2 {
    ssh_ca(CertAuthType::Host, cluster_name)
}

pub fn user_ca(cluster_name: &str) -> CertAuthorityV2 {
    ssh_ca(CertAuthType::User, cluster_name)
}

pub fn jwt_ca(cluster_name: &str) -> CertAuthorityV2 {
    Authority::default()
        .new_jwt_authority(cluster_name)
        .expect("generate JWT authority")
}
