use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Wildcard accepted as a remote role pattern.
pub const WILDCARD: &str = "*";

/// A single rule mapping an external party's role name (or pattern) to local
/// roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    /// Literal name, glob with `*`, or an anchored `^...$` regular expression.
    #[serde(default)]
    pub remote: String,

    #[serde(default)]
    pub local: Vec<String>,
}

impl RoleMapping {
    pub fn new(remote: impl Into<String>, local: Vec<String>) -> Self {
        Self {
            remote: remote.into(),
            local,
        }
    }
}

/// Ordered role mapping rules.
pub type RoleMap = Vec<RoleMapping>;

/// Role list envelope embedded in legacy certificate extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertRoles {
    pub version: String,

    #[serde(default)]
    pub roles: Vec<String>,
}

/// Roles a cluster component can hold in a host certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemRole {
    Auth,
    Node,
    Proxy,
    Admin,
    ProvisionToken,
    TrustedCluster,
    Signup,
    Nop,
    RemoteProxy,
    Kube,
    App,
    Database,
    WindowsDesktop,
}

impl SystemRole {
    pub const ALL: [SystemRole; 13] = [
        Self::Auth,
        Self::Node,
        Self::Proxy,
        Self::Admin,
        Self::ProvisionToken,
        Self::TrustedCluster,
        Self::Signup,
        Self::Nop,
        Self::RemoteProxy,
        Self::Kube,
        Self::App,
        Self::Database,
        Self::WindowsDesktop,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "Auth",
            Self::Node => "Node",
            Self::Proxy => "Proxy",
            Self::Admin => "Admin",
            Self::ProvisionToken => "ProvisionToken",
            Self::TrustedCluster => "Trusted_cluster",
            Self::Signup => "Signup",
            Self::Nop => "Nop",
            Self::RemoteProxy => "RemoteProxy",
            Self::Kube => "Kube",
            Self::App => "App",
            Self::Database => "Db",
            Self::WindowsDesktop => "WindowsDesktop",
        }
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemRole {
    type Err = Error;

    /// Matching ignores ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::bad_parameter(format!("role {s:?} is not registered")))
    }
}

impl Serialize for SystemRole {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SystemRole {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Checks a set of system roles for duplicates.
pub fn check_system_roles(roles: &[SystemRole]) -> Result<(), Error> {
    for (i, role) in roles.iter().enumerate() {
        if roles[..i].contains(role) {
            return Err(Error::bad_parameter(format!("duplicate role {role}")));
        }
    }
    Ok(())
}
