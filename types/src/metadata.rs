use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Namespace assigned to resources that do not declare one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Storage-assigned identifier of a stored resource instance. Zero means
/// "not assigned".
pub type ResourceId = i64;

fn is_zero(id: &ResourceId) -> bool {
    *id == 0
}

/// Common resource header metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// When set, the resource is expected to be removed by storage after this
    /// instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,

    /// Assigned by the storage layer only.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: ResourceId,
}

impl Metadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            ..Default::default()
        }
    }

    pub fn check_and_set_defaults(&mut self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::bad_parameter("missing parameter metadata.name"));
        }
        if self.namespace.is_empty() {
            self.namespace = DEFAULT_NAMESPACE.to_string();
        }
        Ok(())
    }
}

/// The generic envelope shared by every versioned resource. Decoding only the
/// header is enough to pick the concrete decoder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceHeader {
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub sub_kind: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_id_and_missing_expiry_are_omitted() {
        let json = serde_json::to_value(Metadata::named("example")).unwrap();

        assert_eq!(json["name"], "example");
        assert!(json.get("id").is_none());
        assert!(json.get("expires").is_none());
    }

    #[test]
    fn test_namespace_defaulted() {
        let mut metadata = Metadata {
            name: "example".into(),
            ..Default::default()
        };
        metadata.check_and_set_defaults().unwrap();
        assert_eq!(metadata.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_missing_name_rejected() {
        let mut metadata = Metadata::default();
        assert!(metadata.check_and_set_defaults().unwrap_err().is_bad_parameter());
    }

    #[test]
    fn test_header_tolerates_unknown_fields() {
        let header: ResourceHeader =
            serde_json::from_str(r#"{"kind":"cert_authority","version":"v2","spec":{"x":1}}"#)
                .unwrap();
        assert_eq!(header.kind, "cert_authority");
        assert_eq!(header.version, "v2");
    }
}
