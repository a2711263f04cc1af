use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    V2,
    error::{Error, Result},
    metadata::{Metadata, ResourceId},
};

pub const KIND_CLUSTER_NAME: &str = "cluster_name";

/// Metadata name under which the singleton cluster name resource is stored.
pub const META_NAME_CLUSTER_NAME: &str = "cluster-name";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNameSpecV2 {
    #[serde(default)]
    pub cluster_name: String,

    /// Unique identifier generated when the cluster is first started.
    #[serde(default)]
    pub cluster_id: String,
}

/// Version 2 of the cluster name resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNameV2 {
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub spec: ClusterNameSpecV2,
}

impl ClusterNameV2 {
    pub fn new(spec: ClusterNameSpecV2) -> Self {
        Self {
            kind: KIND_CLUSTER_NAME.to_string(),
            version: V2.to_string(),
            metadata: Metadata::named(META_NAME_CLUSTER_NAME),
            spec,
        }
    }

    pub fn cluster_name(&self) -> &str {
        &self.spec.cluster_name
    }

    pub fn cluster_id(&self) -> &str {
        &self.spec.cluster_id
    }

    pub fn version(&self) -> &str {
        &self.version
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

    pub fn check_and_set_defaults(&mut self) -> Result<()> {
        if self.kind.is_empty() {
            self.kind = KIND_CLUSTER_NAME.to_string();
        }
        if self.kind != KIND_CLUSTER_NAME {
            return Err(Error::bad_parameter(format!(
                "unexpected resource kind {:?} for a cluster name",
                self.kind
            )));
        }
        if self.version != V2 {
            return Err(Error::unsupported(format!(
                "cluster name resource version {:?} is not supported",
                self.version
            )));
        }
        if self.metadata.name.is_empty() {
            self.metadata.name = META_NAME_CLUSTER_NAME.to_string();
        }
        self.metadata.check_and_set_defaults()?;

        if self.spec.cluster_name.is_empty() {
            return Err(Error::bad_parameter("cluster name is required"));
        }
        if self.spec.cluster_id.is_empty() {
            return Err(Error::bad_parameter("cluster ID is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_name() -> ClusterNameV2 {
        ClusterNameV2::new(ClusterNameSpecV2 {
            cluster_name: "example.com".into(),
            cluster_id: "0f3f9a5e-cluster".into(),
        })
    }

    #[test]
    fn test_valid_cluster_name() {
        let mut cn = cluster_name();
        cn.check_and_set_defaults().unwrap();
        assert_eq!(cn.metadata.name, META_NAME_CLUSTER_NAME);
        assert_eq!(cn.cluster_name(), "example.com");
    }

    #[test]
    fn test_missing_cluster_name_rejected() {
        let mut cn = cluster_name();
        cn.spec.cluster_name.clear();
        let err = cn.check_and_set_defaults().unwrap_err();
        assert!(err.is_bad_parameter());
        assert_eq!(err.to_string(), "cluster name is required");
    }

    #[test]
    fn test_missing_cluster_id_rejected() {
        let mut cn = cluster_name();
        cn.spec.cluster_id.clear();
        assert!(cn.check_and_set_defaults().unwrap_err().is_bad_parameter());
    }
}
