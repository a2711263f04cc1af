use std::{fmt, sync::Arc};

use crate::{
    config::AuthorityConfig,
    keys::{KeyMaterial, StandardKeyMaterial},
};

/// Entry point for certificate authority validation, JWT operations and
/// TLS pool construction.
///
/// Holds the injected key-material capability and the configuration threaded
/// into every operation. Cheap to clone.
#[derive(Clone)]
pub struct Authority {
    pub(crate) keys: Arc<dyn KeyMaterial>,
    pub(crate) config: AuthorityConfig,
}

impl Authority {
    pub fn new(keys: Arc<dyn KeyMaterial>, config: AuthorityConfig) -> Self {
        Self { keys, config }
    }

    pub fn with_config(config: AuthorityConfig) -> Self {
        Self::new(Arc::new(StandardKeyMaterial), config)
    }

    pub fn keys(&self) -> &dyn KeyMaterial {
        self.keys.as_ref()
    }

    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }
}

impl Default for Authority {
    fn default() -> Self {
        Self::with_config(AuthorityConfig::default())
    }
}

impl fmt::Debug for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authority")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
