//! Versioned resource codec.
//!
//! Decoding peeks the generic [`ResourceHeader`] to pick a decoder for the
//! declared version, validates the result, and then applies caller supplied
//! overrides. Encoding never touches the caller's value: the resource ID is
//! cleared on an owned copy unless it is explicitly preserved.

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use keystone_types::{
    CertAuthorityV2, CertRoles, ClusterNameV2, Error, Metadata, ResourceHeader, ResourceId,
    Result, V1, V2,
};

use crate::authority::Authority;

/// Options recognized by the marshal and unmarshal functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarshalOptions {
    /// Stamped onto decoded resources when non-zero.
    pub resource_id: ResourceId,
    /// Stamped onto decoded resources when set.
    pub expires: Option<DateTime<Utc>>,
    /// Keep the resource ID when encoding instead of clearing it.
    pub preserve_resource_id: bool,
}

impl MarshalOptions {
    pub fn with_resource_id(mut self, id: ResourceId) -> Self {
        self.resource_id = id;
        self
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn preserve_resource_id(mut self) -> Self {
        self.preserve_resource_id = true;
        self
    }
}

/// A resource type handled by the generic codec.
pub trait VersionedResource: Clone + Serialize + DeserializeOwned {
    /// Used in error messages.
    const DESCRIPTION: &'static str;

    /// Version tag this type encodes.
    const VERSION: &'static str;

    fn version(&self) -> &str;

    fn metadata_mut(&mut self) -> &mut Metadata;
}

impl VersionedResource for CertAuthorityV2 {
    const DESCRIPTION: &'static str = "cert authority";
    const VERSION: &'static str = V2;

    fn version(&self) -> &str {
        &self.version
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

impl VersionedResource for ClusterNameV2 {
    const DESCRIPTION: &'static str = "cluster name";
    const VERSION: &'static str = V2;

    fn version(&self) -> &str {
        &self.version
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// Decodes a resource of type `R`, runs `check` on it and applies the
/// overrides in `opts`.
pub fn unmarshal_resource<R, F>(bytes: &[u8], opts: &MarshalOptions, check: F) -> Result<R>
where
    R: VersionedResource,
    F: FnOnce(&mut R) -> Result<()>,
{
    if bytes.is_empty() {
        return Err(Error::bad_parameter("missing resource data"));
    }

    let header: ResourceHeader =
        serde_json::from_slice(bytes).map_err(|e| Error::bad_parameter(e.to_string()))?;
    if header.version != R::VERSION {
        return Err(Error::unsupported(format!(
            "{} resource version {:?} is not supported",
            R::DESCRIPTION,
            header.version
        )));
    }

    let mut resource: R =
        serde_json::from_slice(bytes).map_err(|e| Error::bad_parameter(e.to_string()))?;
    check(&mut resource)?;

    let metadata = resource.metadata_mut();
    if opts.resource_id != 0 {
        metadata.id = opts.resource_id;
    }
    if let Some(expires) = opts.expires {
        metadata.expires = Some(expires);
    }
    Ok(resource)
}

/// Encodes a resource of type `R`.
///
/// The resource ID is cleared on a private copy unless
/// [`MarshalOptions::preserve_resource_id`] is set.
pub fn marshal_resource<R: VersionedResource>(resource: &R, opts: &MarshalOptions) -> Result<Vec<u8>> {
    if resource.version() != R::VERSION {
        return Err(Error::bad_parameter(format!(
            "unrecognized {} version {:?} for {}",
            R::DESCRIPTION,
            resource.version(),
            std::any::type_name::<R>()
        )));
    }

    let encoded = if opts.preserve_resource_id {
        serde_json::to_vec(resource)
    } else {
        let mut copy = resource.clone();
        copy.metadata_mut().id = 0;
        serde_json::to_vec(&copy)
    };
    encoded.map_err(|e| Error::wrap(format!("failed to encode {}", R::DESCRIPTION), e))
}

impl Authority {
    /// Decodes and validates a certificate authority.
    #[instrument(skip_all, fields(len = bytes.len()))]
    pub fn unmarshal_cert_authority(
        &self,
        bytes: &[u8],
        opts: &MarshalOptions,
    ) -> Result<CertAuthorityV2> {
        let ca = unmarshal_resource(bytes, opts, |ca: &mut CertAuthorityV2| self.validate(ca))?;
        debug!(ca = %ca.id(), "decoded certificate authority");
        Ok(ca)
    }
}

/// Decodes and validates a certificate authority with the default
/// [`Authority`].
pub fn unmarshal_cert_authority(bytes: &[u8], opts: &MarshalOptions) -> Result<CertAuthorityV2> {
    Authority::default().unmarshal_cert_authority(bytes, opts)
}

#[instrument(skip_all, fields(ca = %ca.id()))]
pub fn marshal_cert_authority(ca: &CertAuthorityV2, opts: &MarshalOptions) -> Result<Vec<u8>> {
    marshal_resource(ca, opts)
}

#[instrument(skip_all, fields(len = bytes.len()))]
pub fn unmarshal_cluster_name(bytes: &[u8], opts: &MarshalOptions) -> Result<ClusterNameV2> {
    unmarshal_resource(bytes, opts, ClusterNameV2::check_and_set_defaults)
}

#[instrument(skip_all)]
pub fn marshal_cluster_name(cluster_name: &ClusterNameV2, opts: &MarshalOptions) -> Result<Vec<u8>> {
    marshal_resource(cluster_name, opts)
}

/// Encodes a role list as the versioned envelope embedded in certificates.
pub fn marshal_cert_roles(roles: &[String]) -> Result<String> {
    let envelope = CertRoles {
        version: V1.to_string(),
        roles: roles.to_vec(),
    };
    serde_json::to_string(&envelope).map_err(|e| Error::wrap("failed to encode cert roles", e))
}

/// Decodes a role list envelope, preserving role order.
pub fn unmarshal_cert_roles(data: &str) -> Result<Vec<String>> {
    let envelope: CertRoles =
        serde_json::from_str(data).map_err(|e| Error::bad_parameter(e.to_string()))?;
    if envelope.version != V1 {
        return Err(Error::unsupported(format!(
            "cert roles version {:?} is not supported",
            envelope.version
        )));
    }
    Ok(envelope.roles)
}
