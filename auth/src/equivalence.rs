use keystone_types::{CertAuthorityV2, Metadata};

/// Reports whether two certificate authorities hold the same content,
/// ignoring the storage-assigned resource ID.
pub fn cert_authorities_equivalent(lhs: &CertAuthorityV2, rhs: &CertAuthorityV2) -> bool {
    let CertAuthorityV2 {
        kind,
        sub_kind,
        version,
        metadata,
        spec,
    } = lhs;

    *kind == rhs.kind
        && *sub_kind == rhs.sub_kind
        && *version == rhs.version
        && metadata_equivalent(metadata, &rhs.metadata)
        && *spec == rhs.spec
}

fn metadata_equivalent(lhs: &Metadata, rhs: &Metadata) -> bool {
    let Metadata {
        name,
        namespace,
        description,
        labels,
        expires,
        id: _,
    } = lhs;

    *name == rhs.name
        && *namespace == rhs.namespace
        && *description == rhs.description
        && *labels == rhs.labels
        && *expires == rhs.expires
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn test_resource_id_is_ignored() {
        let ca = testutil::host_ca("example.com");
        let mut stored = ca.clone();
        stored.set_resource_id(1234);

        assert!(cert_authorities_equivalent(&ca, &stored));
        assert!(cert_authorities_equivalent(&stored, &ca));
    }

    #[test]
    fn test_content_differences_detected() {
        let ca = testutil::host_ca("example.com");

        let mut rotated = ca.clone();
        rotated.spec.tls_key_pairs.push(testutil::tls_key_pair("next.example.com"));
        assert!(!cert_authorities_equivalent(&ca, &rotated));

        let mut labeled = ca.clone();
        labeled.metadata.labels.insert("env".into(), "prod".into());
        assert!(!cert_authorities_equivalent(&ca, &labeled));

        let mut expiring = ca.clone();
        expiring.set_expiry(chrono::DateTime::from_timestamp(1_900_000_000, 0).unwrap());
        assert!(!cert_authorities_equivalent(&ca, &expiring));
    }

    #[test]
    fn test_independent_authorities_differ() {
        assert!(!cert_authorities_equivalent(
            &testutil::jwt_ca("example.com"),
            &testutil::jwt_ca("example.com"),
        ));
    }
}
