use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure kinds surfaced by the trust core.
#[derive(Debug, Error)]
pub enum Error {
    /// A field is missing, malformed, or conflicts with another field.
    #[error("{0}")]
    BadParameter(String),

    /// An unknown certificate authority type or resource version.
    #[error("{0}")]
    Unsupported(String),

    /// An underlying key-material, crypto or codec error, with context.
    #[error("{context}: {source}")]
    Wrapped {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    pub fn bad_parameter(message: impl Into<String>) -> Self {
        Self::BadParameter(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub fn wrap<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Wrapped {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn is_bad_parameter(&self) -> bool {
        matches!(self, Self::BadParameter(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self, Self::Wrapped { .. })
    }
}
