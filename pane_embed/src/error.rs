use pane_links::LinkError;
use pane_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbedError {
    /// A sampled value was rejected by its widget.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error("could not write {path}: {message}")]
    Io { path: String, message: String },
    #[error("could not serialize the recorded states: {0}")]
    Serialize(String),
}

impl From<ModelError> for EmbedError {
    fn from(value: ModelError) -> Self {
        EmbedError::Validation(value.to_string())
    }
}

impl From<serde_json::Error> for EmbedError {
    fn from(value: serde_json::Error) -> Self {
        EmbedError::Serialize(value.to_string())
    }
}
