use std::sync::Arc;

use chrono::{DateTime, Duration};
use keystone_auth::{
    Authority, FixedClock, MarshalOptions, SignParams, VerifyParams, cert_authorities_equivalent,
    marshal_cert_authority, marshal_cert_roles, testutil, unmarshal_cert_authority,
    unmarshal_cert_roles, unmarshal_cluster_name,
};
use keystone_types::{CertAuthType, RoleMapping};

#[test]
fn test_host_and_user_cas_need_tls_and_checking_keys() {
    let authority = Authority::default();

    for ca_type in [CertAuthType::Host, CertAuthType::User] {
        let template = match ca_type {
            CertAuthType::Host => testutil::host_ca("example.com"),
            _ => testutil::user_ca("example.com"),
        };

        let mut bare = template.clone();
        bare.spec.tls_key_pairs.clear();
        bare.spec.checking_keys.clear();
        assert!(authority.validate(&mut bare).unwrap_err().is_bad_parameter());

        bare.spec.tls_key_pairs.push(testutil::tls_key_pair("example.com"));
        bare.spec.checking_keys.push(testutil::ssh_key_pair().1);
        authority.validate(&mut bare).unwrap();
    }
}

#[test]
fn test_roles_exclude_role_map() {
    let authority = Authority::default();
    let mut ca = testutil::host_ca("example.com");
    ca.spec.roles = vec!["node".into()];
    ca.spec.role_map = vec![RoleMapping::new("^dev-(.*)$", vec!["dev".into()])];
    assert!(authority.validate(&mut ca).is_err());

    let mut roles_only = ca.clone();
    roles_only.spec.role_map.clear();
    authority.validate(&mut roles_only).unwrap();

    let mut map_only = ca.clone();
    map_only.spec.roles.clear();
    authority.validate(&mut map_only).unwrap();

    map_only.spec.role_map[0].remote = "^dev-($".into();
    assert!(authority.validate(&mut map_only).is_err());
}

#[test]
fn test_generated_jwt_authority_signs_for_its_cluster() {
    let authority = Authority::default();
    let mut ca = authority.new_jwt_authority("cluster-x").unwrap();
    assert_eq!(ca.ca_type(), CertAuthType::Jwt);
    assert_eq!(ca.jwt_key_pairs().len(), 1);
    authority.validate(&mut ca).unwrap();

    let clock = Arc::new(FixedClock::new(
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    ));
    let signer = authority.get_jwt_signer(&ca, clock.clone()).unwrap();
    assert_eq!(signer.cluster_name(), "cluster-x");

    let token = signer
        .sign(&SignParams {
            username: "bob".into(),
            roles: vec!["access".into()],
            uri: "https://grafana.example.com".into(),
            expires: DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::hours(1),
        })
        .unwrap();
    let claims = signer
        .verify(&VerifyParams {
            username: "bob".into(),
            uri: "https://grafana.example.com".into(),
            raw_token: token,
        })
        .unwrap();
    assert_eq!(claims.iss, "cluster-x");
}

#[test]
fn test_marshal_round_trip_and_resource_ids() {
    let authority = Authority::default();
    let mut ca = testutil::user_ca("example.com");
    authority.validate(&mut ca).unwrap();
    ca.set_resource_id(501);

    let preserved = marshal_cert_authority(&ca, &MarshalOptions::default().preserve_resource_id())
        .unwrap();
    let decoded = unmarshal_cert_authority(&preserved, &MarshalOptions::default()).unwrap();
    assert_eq!(decoded, ca);
    assert_eq!(decoded.resource_id(), 501);

    let anonymous = marshal_cert_authority(&ca, &MarshalOptions::default()).unwrap();
    assert_eq!(ca.resource_id(), 501);
    let decoded = unmarshal_cert_authority(&anonymous, &MarshalOptions::default()).unwrap();
    assert_eq!(decoded.resource_id(), 0);
    assert!(cert_authorities_equivalent(&decoded, &ca));
}

#[test]
fn test_equivalence_ignores_only_resource_id() {
    let ca = testutil::host_ca("example.com");

    let mut stored = ca.clone();
    stored.set_resource_id(9);
    assert!(cert_authorities_equivalent(&ca, &stored));

    let mut renamed = ca.clone();
    renamed.spec.cluster_name = "other.com".into();
    assert!(!cert_authorities_equivalent(&ca, &renamed));

    let mut with_roles = ca.clone();
    with_roles.spec.roles.push("node".into());
    assert!(!cert_authorities_equivalent(&ca, &with_roles));

    let mut rekeyed = ca.clone();
    rekeyed.spec.tls_key_pairs[0] = testutil::tls_key_pair("example.com");
    assert!(!cert_authorities_equivalent(&ca, &rekeyed));
}

#[test]
fn test_pool_from_authorities() {
    let authority = Authority::default();
    let mut with_tls = testutil::host_ca("example.com");
    with_tls
        .spec
        .tls_key_pairs
        .push(testutil::tls_key_pair("next.example.com"));
    let mut without_tls = testutil::user_ca("example.com");
    without_tls.spec.tls_key_pairs.clear();

    let pool = authority
        .cert_pool_from_cert_authorities(&[with_tls, without_tls.clone()])
        .unwrap();
    assert_eq!(pool.len(), 2);
    assert!(authority.cert_pool(&without_tls).is_err());
}

#[test]
fn test_cert_roles_round_trip() {
    let roles = vec!["admin".to_string(), "auditor".to_string()];
    let encoded = marshal_cert_roles(&roles).unwrap();
    assert_eq!(unmarshal_cert_roles(&encoded).unwrap(), roles);
}

#[test]
fn test_unsupported_versions_rejected() {
    for version in ["99", "v99", "v1"] {
        let ca = format!(
            r#"{{"kind":"cert_authority","version":"{version}","metadata":{{"name":"example.com"}},"spec":{{"type":"host","cluster_name":"example.com"}}}}"#
        );
        let err = unmarshal_cert_authority(ca.as_bytes(), &MarshalOptions::default()).unwrap_err();
        assert!(err.is_unsupported(), "{version}: {err}");
        assert!(err.to_string().contains(version));

        let cluster_name = format!(
            r#"{{"kind":"cluster_name","version":"{version}","metadata":{{"name":"cluster-name"}},"spec":{{"cluster_name":"example.com","cluster_id":"abc"}}}}"#
        );
        let err = unmarshal_cluster_name(cluster_name.as_bytes(), &MarshalOptions::default())
            .unwrap_err();
        assert!(err.is_unsupported(), "{version}: {err}");
    }
}

#[test]
fn test_unknown_ca_type_rejected() {
    let ca = r#"{"kind":"cert_authority","version":"v2","metadata":{"name":"example.com"},"spec":{"type":"database","cluster_name":"example.com"}}"#;
    let err = unmarshal_cert_authority(ca.as_bytes(), &MarshalOptions::default()).unwrap_err();
    assert!(err.to_string().contains("database"));
}
