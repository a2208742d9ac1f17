use pane_model::{ModelError, ObjectId};
use thiserror::Error;

/// A reference could not be turned into a concrete model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("{type_name} is not rendered under root {root}")]
    NotRendered { type_name: String, root: ObjectId },
    #[error("could not resolve a model for {type_name}, it is no longer alive")]
    UnresolvedReference { type_name: String },
    #[error("{model} model has no attribute {attribute:?}")]
    MissingAttribute { model: String, attribute: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Generation(String),
    #[error("{0}")]
    Configuration(String),
}

impl From<ModelError> for LinkError {
    fn from(value: ModelError) -> Self {
        LinkError::Validation(value.to_string())
    }
}
