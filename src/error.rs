/// Failures callers may want to tell apart. Carried inside `anyhow::Error`;
/// recover with `err.downcast_ref::<EmbedError>()`.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("{message}")]
    TypeNotAllowed { message: String },
    #[error("a source URL is required")]
    MissingSourceUrl,
    #[error("embed {id} not found")]
    NotFound { id: i64 },
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl EmbedError {
    #[must_use]
    pub fn type_not_allowed(message: impl Into<String>) -> Self {
        Self::TypeNotAllowed { message: message.into() }
    }
}
