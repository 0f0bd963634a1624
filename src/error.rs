use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    InvalidVariants,
    MalformedIdentifier,
    InvalidAttribute,
    MissingAttribute,
    Configuration,
    Remote,
    Protocol,
}

/// Failure of a lifecycle operation or of provider setup.
///
/// Validation kinds are raised before any remote call; `Remote` wraps a failed
/// transport call verbatim and is never retried here.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_context(mut self, context: impl AsRef<str>) -> Self {
        self.message = format!("{}: {}", context.as_ref(), self.message);
        self
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::InvalidVariants
                | ProviderErrorKind::MalformedIdentifier
                | ProviderErrorKind::InvalidAttribute
                | ProviderErrorKind::MissingAttribute
        )
    }

    pub fn is_remote(&self) -> bool {
        self.kind == ProviderErrorKind::Remote
    }
}

pub fn invalid_variants(message: impl Into<String>) -> ProviderError {
    ProviderError::new(ProviderErrorKind::InvalidVariants, message)
}

pub fn malformed_identifier(message: impl Into<String>) -> ProviderError {
    ProviderError::new(ProviderErrorKind::MalformedIdentifier, message)
}

pub fn invalid_attribute(message: impl Into<String>) -> ProviderError {
    ProviderError::new(ProviderErrorKind::InvalidAttribute, message)
}

pub fn missing_attribute(attribute: &str) -> ProviderError {
    ProviderError::new(
        ProviderErrorKind::MissingAttribute,
        format!("attribute '{attribute}' must be known for this operation"),
    )
}

pub fn configuration_error(message: impl Into<String>) -> ProviderError {
    ProviderError::new(ProviderErrorKind::Configuration, message)
}

pub fn remote_error(message: impl Into<String>) -> ProviderError {
    ProviderError::new(ProviderErrorKind::Remote, message)
}

pub fn protocol_error(message: impl Into<String>) -> ProviderError {
    ProviderError::new(ProviderErrorKind::Protocol, message)
}
